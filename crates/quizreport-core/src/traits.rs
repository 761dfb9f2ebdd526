//! Collaborator trait definitions.
//!
//! The engine never talks to storage directly. These async traits are
//! implemented by the backends in `quizreport-store`.

use async_trait::async_trait;

use crate::error::Result;
use crate::model::{Attempt, Packet, Quiz, ScoreScale, User};
use crate::template::ReportTemplate;

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// Read access to the records a report is built from.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Human-readable backend name (e.g. "http").
    fn name(&self) -> &str;

    async fn quiz(&self, quiz_id: &str) -> Result<Quiz>;

    async fn attempt(&self, attempt_id: &str) -> Result<Attempt>;

    /// Packets assigned to a quiz, in quiz order, questions included.
    async fn quiz_packets(&self, quiz_id: &str) -> Result<Vec<Packet>>;

    async fn user(&self, user_id: &str) -> Result<User>;
}

// ---------------------------------------------------------------------------
// Writes
// ---------------------------------------------------------------------------

/// Per-quiz template persistence. Saves overwrite the whole template.
#[async_trait]
pub trait TemplateStore: Send + Sync {
    /// Load the template for a quiz, `None` if none was ever saved.
    async fn load_template(&self, quiz_id: &str) -> Result<Option<ReportTemplate>>;

    async fn save_template(&self, quiz_id: &str, template: &ReportTemplate) -> Result<()>;
}

/// Persistence of a packet's custom scale.
#[async_trait]
pub trait PacketStore: Send + Sync {
    async fn save_packet_scale(
        &self,
        packet_id: &str,
        scale: &ScoreScale,
        enabled: bool,
    ) -> Result<()>;
}

/// A backend that serves every collaborator role.
pub trait Backend: DataSource + TemplateStore + PacketStore {}

impl<T: DataSource + TemplateStore + PacketStore + ?Sized> Backend for T {}
