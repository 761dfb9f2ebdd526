//! JSON-file backend.
//!
//! Layout under the data root, one record per file:
//!
//! ```text
//! quizzes/<quiz id>.json      quiz record plus "packet_ids"
//! packets/<packet id>.json    packet with its questions
//! attempts/<attempt id>.json
//! users/<user id>.json
//! templates/<quiz id>.json    saved report template
//! ```

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use quizreport_core::error::{ReportError, Result};
use quizreport_core::model::{Attempt, Packet, Quiz, ScoreScale, User};
use quizreport_core::template::ReportTemplate;
use quizreport_core::traits::{DataSource, PacketStore, TemplateStore};

use crate::error::StoreError;

/// Record kinds and the subdirectory each lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Quiz,
    Packet,
    Attempt,
    User,
    Template,
}

impl RecordKind {
    pub fn dir(self) -> &'static str {
        match self {
            RecordKind::Quiz => "quizzes",
            RecordKind::Packet => "packets",
            RecordKind::Attempt => "attempts",
            RecordKind::User => "users",
            RecordKind::Template => "templates",
        }
    }
}

/// The quiz file's packet membership, read alongside the quiz itself.
#[derive(Deserialize)]
struct QuizPackets {
    #[serde(default)]
    packet_ids: Vec<String>,
}

pub struct DirectoryBackend {
    root: PathBuf,
}

impl DirectoryBackend {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path(&self, kind: RecordKind, id: &str) -> std::result::Result<PathBuf, StoreError> {
        if id.is_empty() || id == ".." || id.contains(['/', '\\']) {
            return Err(StoreError::Decode(format!("invalid record id {id:?}")));
        }
        Ok(self.root.join(kind.dir()).join(format!("{id}.json")))
    }

    async fn read<T: DeserializeOwned>(
        &self,
        kind: RecordKind,
        id: &str,
    ) -> std::result::Result<T, StoreError> {
        let path = self.path(kind, id)?;
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StoreError::NotFound(path.display().to_string()))
            }
            Err(e) => return Err(e.into()),
        };
        serde_json::from_str(&content)
            .map_err(|e| StoreError::Decode(format!("{}: {e}", path.display())))
    }

    /// Write a record, creating its directory as needed.
    pub async fn put_record<T: Serialize + ?Sized>(
        &self,
        kind: RecordKind,
        id: &str,
        value: &T,
    ) -> std::result::Result<(), StoreError> {
        let path = self.path(kind, id)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(value)
            .map_err(|e| StoreError::Decode(e.to_string()))?;
        tokio::fs::write(&path, json).await?;
        tracing::debug!(path = %path.display(), "wrote record");
        Ok(())
    }
}

#[async_trait]
impl DataSource for DirectoryBackend {
    fn name(&self) -> &str {
        "directory"
    }

    #[instrument(skip(self))]
    async fn quiz(&self, quiz_id: &str) -> Result<Quiz> {
        self.read(RecordKind::Quiz, quiz_id)
            .await
            .map_err(|e| e.into_fetch(format!("quiz {quiz_id}")))
    }

    #[instrument(skip(self))]
    async fn attempt(&self, attempt_id: &str) -> Result<Attempt> {
        self.read(RecordKind::Attempt, attempt_id)
            .await
            .map_err(|e| e.into_fetch(format!("attempt {attempt_id}")))
    }

    #[instrument(skip(self))]
    async fn quiz_packets(&self, quiz_id: &str) -> Result<Vec<Packet>> {
        let membership: QuizPackets = self
            .read(RecordKind::Quiz, quiz_id)
            .await
            .map_err(|e| e.into_fetch(format!("packets of quiz {quiz_id}")))?;

        let mut packets = Vec::with_capacity(membership.packet_ids.len());
        for packet_id in &membership.packet_ids {
            let packet: Packet = self
                .read(RecordKind::Packet, packet_id)
                .await
                .map_err(|e| e.into_fetch(format!("packet {packet_id}")))?;
            packets.push(packet);
        }
        Ok(packets)
    }

    #[instrument(skip(self))]
    async fn user(&self, user_id: &str) -> Result<User> {
        self.read(RecordKind::User, user_id)
            .await
            .map_err(|e| e.into_fetch(format!("user {user_id}")))
    }
}

#[async_trait]
impl TemplateStore for DirectoryBackend {
    #[instrument(skip(self))]
    async fn load_template(&self, quiz_id: &str) -> Result<Option<ReportTemplate>> {
        match self.read(RecordKind::Template, quiz_id).await {
            Ok(template) => Ok(Some(template)),
            Err(StoreError::NotFound(_)) => Ok(None),
            Err(e) => Err(e.into_fetch(format!("template of quiz {quiz_id}"))),
        }
    }

    #[instrument(skip(self, template))]
    async fn save_template(&self, quiz_id: &str, template: &ReportTemplate) -> Result<()> {
        self.put_record(RecordKind::Template, quiz_id, template)
            .await
            .map_err(|e| e.into_persist(format!("template of quiz {quiz_id}")))
    }
}

#[async_trait]
impl PacketStore for DirectoryBackend {
    /// Updates the two scale fields in place; other fields of the packet file
    /// are kept as they are.
    #[instrument(skip(self, scale))]
    async fn save_packet_scale(
        &self,
        packet_id: &str,
        scale: &ScoreScale,
        enabled: bool,
    ) -> Result<()> {
        let resource = format!("scale of packet {packet_id}");
        let mut record: serde_json::Value = self
            .read(RecordKind::Packet, packet_id)
            .await
            .map_err(|e| e.into_persist(resource.clone()))?;
        let Some(fields) = record.as_object_mut() else {
            return Err(ReportError::persist(resource, "packet file is not a JSON object"));
        };
        fields.remove("scoring_scale");
        fields.remove("enable_scoring_scale");
        fields.insert(
            "scoringScale".into(),
            serde_json::to_value(scale).map_err(|e| ReportError::persist(&resource, e.to_string()))?,
        );
        fields.insert("enableScoringScale".into(), serde_json::Value::Bool(enabled));

        self.put_record(RecordKind::Packet, packet_id, &record)
            .await
            .map_err(|e| e.into_persist(resource))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quizreport_core::model::ScoreRange;

    async fn seeded() -> (tempfile::TempDir, DirectoryBackend) {
        let dir = tempfile::tempdir().unwrap();
        let backend = DirectoryBackend::new(dir.path());
        backend
            .put_record(
                RecordKind::Quiz,
                "q1",
                &serde_json::json!({"id": "q1", "name": "Wellbeing", "packet_ids": ["p2", "p1"]}),
            )
            .await
            .unwrap();
        for (id, name) in [("p1", "Stress"), ("p2", "Sleep")] {
            backend
                .put_record(
                    RecordKind::Packet,
                    id,
                    &serde_json::json!({"id": id, "name": name, "created_by": "admin"}),
                )
                .await
                .unwrap();
        }
        (dir, backend)
    }

    #[tokio::test]
    async fn packets_follow_quiz_order() {
        let (_dir, backend) = seeded().await;
        let packets = backend.quiz_packets("q1").await.unwrap();
        let names: Vec<_> = packets.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["Sleep", "Stress"]);
    }

    #[tokio::test]
    async fn missing_records() {
        let (_dir, backend) = seeded().await;
        assert!(backend.attempt("a1").await.unwrap_err().is_not_found());
        assert!(backend.load_template("q1").await.unwrap().is_none());
        assert!(backend.quiz("../etc").await.is_err());
    }

    #[tokio::test]
    async fn template_save_then_load() {
        let (_dir, backend) = seeded().await;
        let mut template = ReportTemplate::default();
        template.charts.enabled = false;
        backend.save_template("q1", &template).await.unwrap();
        assert_eq!(backend.load_template("q1").await.unwrap(), Some(template));
    }

    #[tokio::test]
    async fn scale_save_keeps_other_fields() {
        let (dir, backend) = seeded().await;
        let scale = ScoreScale::new(vec![ScoreRange::new(0, 4, "Low", "#ff6b6b", "📚", "")]);
        backend.save_packet_scale("p1", &scale, true).await.unwrap();

        let packets = backend.quiz_packets("q1").await.unwrap();
        let stress = packets.iter().find(|p| p.id == "p1").unwrap();
        assert_eq!(stress.active_scale(), Some(&scale));

        let raw = std::fs::read_to_string(dir.path().join("packets/p1.json")).unwrap();
        assert!(raw.contains("\"created_by\": \"admin\""));
    }

    #[tokio::test]
    async fn scale_save_for_unknown_packet_fails() {
        let (_dir, backend) = seeded().await;
        let err = backend
            .save_packet_scale("p9", &ScoreScale::default(), false)
            .await
            .unwrap_err();
        assert!(matches!(err, ReportError::Persist { .. }));
    }
}
