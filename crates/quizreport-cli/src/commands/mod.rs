pub mod generate;
pub mod init;
pub mod marks;
pub mod scale;
pub mod template;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use quizreport_core::model::Packet;
use quizreport_core::traits::{Backend, DataSource};
use quizreport_store::{create_backend, load_config_from, QuizreportConfig};

/// Load config and build the backend it names.
pub(crate) fn open_backend(
    config_path: Option<&Path>,
) -> Result<(QuizreportConfig, Arc<dyn Backend>)> {
    let config = load_config_from(config_path)?;
    let backend = create_backend(&config.backend)?;
    tracing::debug!(backend = backend.name(), "backend ready");
    Ok((config, backend))
}

/// All packets of `quiz_id`, in quiz order.
pub(crate) async fn quiz_packets(backend: &dyn Backend, quiz_id: &str) -> Result<Vec<Packet>> {
    backend
        .quiz_packets(quiz_id)
        .await
        .with_context(|| format!("failed to load packets of quiz {quiz_id}"))
}

/// Find a packet by id, falling back to an exact name match.
pub(crate) fn find_packet<'a>(packets: &'a [Packet], key: &str) -> Result<&'a Packet> {
    packets
        .iter()
        .find(|p| p.id == key)
        .or_else(|| packets.iter().find(|p| p.name == key))
        .ok_or_else(|| anyhow::anyhow!("no packet '{key}' in this quiz"))
}
