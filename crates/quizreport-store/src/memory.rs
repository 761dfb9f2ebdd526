//! In-memory backend for testing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use quizreport_core::error::{ReportError, Result};
use quizreport_core::model::{Attempt, Packet, Quiz, ScoreScale, User};
use quizreport_core::template::ReportTemplate;
use quizreport_core::traits::{DataSource, PacketStore, TemplateStore};

/// A backend holding every record in memory.
///
/// Records are added with the `with_*` builders. Writes update the held
/// records and bump counters so tests can assert on persistence.
#[derive(Default)]
pub struct MemoryBackend {
    quizzes: HashMap<String, Quiz>,
    attempts: HashMap<String, Attempt>,
    users: HashMap<String, User>,
    /// Packet ids per quiz, in quiz order.
    quiz_packets: HashMap<String, Vec<String>>,
    packets: Mutex<HashMap<String, Packet>>,
    templates: Mutex<HashMap<String, ReportTemplate>>,
    template_saves: AtomicU32,
    scale_saves: AtomicU32,
    read_count: AtomicU32,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quiz(mut self, quiz: Quiz, packets: Vec<Packet>) -> Self {
        let ids = packets.iter().map(|p| p.id.clone()).collect();
        self.quiz_packets.insert(quiz.id.clone(), ids);
        if let Ok(held) = self.packets.get_mut() {
            held.extend(packets.into_iter().map(|p| (p.id.clone(), p)));
        }
        self.quizzes.insert(quiz.id.clone(), quiz);
        self
    }

    pub fn with_attempt(mut self, attempt: Attempt) -> Self {
        self.attempts.insert(attempt.id.clone(), attempt);
        self
    }

    pub fn with_user(mut self, id: &str, user: User) -> Self {
        self.users.insert(id.to_string(), user);
        self
    }

    pub fn with_template(mut self, quiz_id: &str, template: ReportTemplate) -> Self {
        if let Ok(held) = self.templates.get_mut() {
            held.insert(quiz_id.to_string(), template);
        }
        self
    }

    /// Number of template saves.
    pub fn template_saves(&self) -> u32 {
        self.template_saves.load(Ordering::Relaxed)
    }

    /// Number of packet scale saves.
    pub fn scale_saves(&self) -> u32 {
        self.scale_saves.load(Ordering::Relaxed)
    }

    /// Number of record reads of any kind.
    pub fn read_count(&self) -> u32 {
        self.read_count.load(Ordering::Relaxed)
    }

    pub fn packet(&self, packet_id: &str) -> Option<Packet> {
        self.packets.lock().ok()?.get(packet_id).cloned()
    }

    pub fn template(&self, quiz_id: &str) -> Option<ReportTemplate> {
        self.templates.lock().ok()?.get(quiz_id).cloned()
    }

    fn not_found(resource: String) -> ReportError {
        ReportError::data_fetch(resource, Some(404), "not found")
    }

    fn count_read(&self) {
        self.read_count.fetch_add(1, Ordering::Relaxed);
    }
}

#[async_trait]
impl DataSource for MemoryBackend {
    fn name(&self) -> &str {
        "memory"
    }

    async fn quiz(&self, quiz_id: &str) -> Result<Quiz> {
        self.count_read();
        self.quizzes
            .get(quiz_id)
            .cloned()
            .ok_or_else(|| Self::not_found(format!("quiz {quiz_id}")))
    }

    async fn attempt(&self, attempt_id: &str) -> Result<Attempt> {
        self.count_read();
        self.attempts
            .get(attempt_id)
            .cloned()
            .ok_or_else(|| Self::not_found(format!("attempt {attempt_id}")))
    }

    async fn quiz_packets(&self, quiz_id: &str) -> Result<Vec<Packet>> {
        self.count_read();
        let ids = self
            .quiz_packets
            .get(quiz_id)
            .ok_or_else(|| Self::not_found(format!("packets of quiz {quiz_id}")))?;
        let packets = self
            .packets
            .lock()
            .map_err(|_| ReportError::data_fetch("packets", None, "lock poisoned"))?;
        ids.iter()
            .map(|id| {
                packets
                    .get(id)
                    .cloned()
                    .ok_or_else(|| Self::not_found(format!("packet {id}")))
            })
            .collect()
    }

    async fn user(&self, user_id: &str) -> Result<User> {
        self.count_read();
        self.users
            .get(user_id)
            .cloned()
            .ok_or_else(|| Self::not_found(format!("user {user_id}")))
    }
}

#[async_trait]
impl TemplateStore for MemoryBackend {
    async fn load_template(&self, quiz_id: &str) -> Result<Option<ReportTemplate>> {
        self.count_read();
        Ok(self.template(quiz_id))
    }

    async fn save_template(&self, quiz_id: &str, template: &ReportTemplate) -> Result<()> {
        self.template_saves.fetch_add(1, Ordering::Relaxed);
        self.templates
            .lock()
            .map_err(|_| ReportError::persist("template", "lock poisoned"))?
            .insert(quiz_id.to_string(), template.clone());
        Ok(())
    }
}

#[async_trait]
impl PacketStore for MemoryBackend {
    async fn save_packet_scale(
        &self,
        packet_id: &str,
        scale: &ScoreScale,
        enabled: bool,
    ) -> Result<()> {
        let mut packets = self
            .packets
            .lock()
            .map_err(|_| ReportError::persist("packet", "lock poisoned"))?;
        let packet = packets.get_mut(packet_id).ok_or_else(|| {
            ReportError::persist(format!("scale of packet {packet_id}"), "packet not found")
        })?;
        packet.scoring_scale = Some(scale.clone());
        packet.enable_scoring_scale = enabled;
        self.scale_saves.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}
