//! Template editing session with debounced auto-save.
//!
//! Each mutation publishes a new `(version, template)` snapshot on a
//! `tokio::sync::watch` channel. A background task persists the latest
//! snapshot once no mutation has arrived for the debounce window. An explicit
//! [`TemplateEditor::save`] writes immediately. Writes are serialized and a
//! write never goes out for a version older than the last one persisted.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::error::{ReportError, Result};
use crate::template::{ReportTemplate, TemplateHistory, TemplateVersion};
use crate::template_edit::TemplateEdit;
use crate::traits::TemplateStore;

/// Quiet window before an automatic save.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(2000);

/// A published template state.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub version: u64,
    pub template: Arc<ReportTemplate>,
}

/// Shared write path used by both the debounce task and explicit saves.
struct Writer<S: ?Sized> {
    quiz_id: String,
    store: Arc<S>,
    /// Held for the duration of a write; holds the last persisted version.
    lock: Mutex<u64>,
    persisted: AtomicU64,
}

impl<S: TemplateStore + ?Sized> Writer<S> {
    /// Persist `snapshot` unless something at least as new already was.
    async fn write(&self, snapshot: &Snapshot) -> Result<bool> {
        let mut last = self.lock.lock().await;
        if snapshot.version <= *last {
            return Ok(false);
        }
        self.store
            .save_template(&self.quiz_id, &snapshot.template)
            .await?;
        *last = snapshot.version;
        self.persisted.store(snapshot.version, Ordering::SeqCst);
        tracing::info!(quiz = %self.quiz_id, version = snapshot.version, "saved report template");
        Ok(true)
    }
}

/// An editing session over one quiz's template.
pub struct TemplateEditor<S: ?Sized> {
    tx: watch::Sender<Snapshot>,
    writer: Arc<Writer<S>>,
    history: StdMutex<TemplateHistory>,
    autosave: Option<JoinHandle<()>>,
}

impl<S: TemplateStore + ?Sized + 'static> TemplateEditor<S> {
    /// Start a session on `template`, treated as already persisted.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(
        quiz_id: impl Into<String>,
        template: ReportTemplate,
        store: Arc<S>,
        debounce: Duration,
    ) -> Self {
        let (tx, rx) = watch::channel(Snapshot {
            version: 0,
            template: Arc::new(template),
        });
        let writer = Arc::new(Writer {
            quiz_id: quiz_id.into(),
            store,
            lock: Mutex::new(0),
            persisted: AtomicU64::new(0),
        });
        let autosave = tokio::spawn(autosave_loop(rx, Arc::clone(&writer), debounce));
        Self {
            tx,
            writer,
            history: StdMutex::new(TemplateHistory::default()),
            autosave: Some(autosave),
        }
    }

    pub fn quiz_id(&self) -> &str {
        &self.writer.quiz_id
    }

    pub fn current(&self) -> Arc<ReportTemplate> {
        Arc::clone(&self.tx.borrow().template)
    }

    pub fn version(&self) -> u64 {
        self.tx.borrow().version
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.version() > self.writer.persisted.load(Ordering::SeqCst)
    }

    /// Replace the template with `f(current)` and publish it.
    pub fn update<F>(&self, f: F) -> u64
    where
        F: FnOnce(&ReportTemplate) -> ReportTemplate,
    {
        let mut version = 0;
        self.tx.send_modify(|snap| {
            let next = f(&snap.template);
            snap.version += 1;
            snap.template = Arc::new(next);
            version = snap.version;
        });
        version
    }

    /// Clone the current template, mutate the clone, and publish it.
    pub fn modify<F>(&self, f: F) -> u64
    where
        F: FnOnce(&mut ReportTemplate),
    {
        self.update(|current| {
            let mut next = current.clone();
            f(&mut next);
            next
        })
    }

    /// Apply a typed edit. A rejected edit publishes nothing.
    pub fn apply(&self, edit: &TemplateEdit) -> Result<u64> {
        let mut outcome = Ok(0);
        self.tx.send_if_modified(|snap| match snap.template.apply(edit) {
            Ok(next) => {
                snap.version += 1;
                snap.template = Arc::new(next);
                outcome = Ok(snap.version);
                true
            }
            Err(e) => {
                outcome = Err(ReportError::from(e));
                false
            }
        });
        outcome
    }

    /// Persist the current template now and record it in the history.
    pub async fn save(&self) -> Result<TemplateVersion> {
        let snapshot = self.tx.borrow().clone();
        self.writer.write(&snapshot).await?;
        let mut history = self
            .history
            .lock()
            .map_err(|_| ReportError::persist("template history", "history lock poisoned"))?;
        Ok(history.record(&snapshot.template).clone())
    }

    /// Saved versions, newest first.
    pub fn history(&self) -> Vec<TemplateVersion> {
        self.history
            .lock()
            .map(|h| h.versions().cloned().collect())
            .unwrap_or_default()
    }

    /// Replace the current template with a saved version.
    pub fn restore(&self, id: Uuid) -> Result<u64> {
        let template = {
            let history = self
                .history
                .lock()
                .map_err(|_| ReportError::persist("template history", "history lock poisoned"))?;
            history.get(id)?.clone()
        };
        Ok(self.update(|_| template))
    }

    /// Write any unsaved change and stop the auto-save task.
    pub async fn close(mut self) -> Result<()> {
        if let Some(task) = self.autosave.take() {
            task.abort();
        }
        let snapshot = self.tx.borrow().clone();
        self.writer.write(&snapshot).await?;
        Ok(())
    }
}

impl<S: ?Sized> Drop for TemplateEditor<S> {
    fn drop(&mut self) {
        if let Some(task) = self.autosave.take() {
            task.abort();
        }
    }
}

async fn autosave_loop<S: TemplateStore + ?Sized>(
    mut rx: watch::Receiver<Snapshot>,
    writer: Arc<Writer<S>>,
    debounce: Duration,
) {
    loop {
        if rx.changed().await.is_err() {
            return;
        }
        // Restart the window on every change until it elapses quietly.
        loop {
            match tokio::time::timeout(debounce, rx.changed()).await {
                Ok(Ok(())) => continue,
                Ok(Err(_)) => return,
                Err(_) => break,
            }
        }
        let snapshot = rx.borrow_and_update().clone();
        if let Err(e) = writer.write(&snapshot).await {
            tracing::warn!(
                quiz = %writer.quiz_id,
                version = snapshot.version,
                error = %e,
                "auto-save failed"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::{Direction, SectionId};
    use async_trait::async_trait;

    #[derive(Default)]
    struct RecordingStore {
        saves: StdMutex<Vec<ReportTemplate>>,
    }

    impl RecordingStore {
        fn count(&self) -> usize {
            self.saves.lock().unwrap().len()
        }

        fn last_title(&self) -> Option<String> {
            self.saves.lock().unwrap().last().map(|t| t.header.title.clone())
        }
    }

    #[async_trait]
    impl TemplateStore for RecordingStore {
        async fn load_template(&self, _quiz_id: &str) -> Result<Option<ReportTemplate>> {
            Ok(self.saves.lock().unwrap().last().cloned())
        }

        async fn save_template(&self, _quiz_id: &str, template: &ReportTemplate) -> Result<()> {
            self.saves.lock().unwrap().push(template.clone());
            Ok(())
        }
    }

    fn editor(store: &Arc<RecordingStore>) -> TemplateEditor<RecordingStore> {
        TemplateEditor::new("q1", ReportTemplate::default(), Arc::clone(store), DEFAULT_DEBOUNCE)
    }

    fn retitle(editor: &TemplateEditor<RecordingStore>, title: &str) {
        let title = title.to_string();
        editor.modify(move |t| t.header.title = title);
    }

    #[tokio::test(start_paused = true)]
    async fn saves_once_after_quiet_window() {
        let store = Arc::new(RecordingStore::default());
        let editor = editor(&store);

        retitle(&editor, "first");
        tokio::time::sleep(Duration::from_millis(1000)).await;
        retitle(&editor, "second");
        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(store.count(), 0);
        assert!(editor.has_unsaved_changes());

        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert_eq!(store.count(), 1);
        assert_eq!(store.last_title().as_deref(), Some("second"));
        assert!(!editor.has_unsaved_changes());
    }

    #[tokio::test(start_paused = true)]
    async fn explicit_save_preempts_autosave() {
        let store = Arc::new(RecordingStore::default());
        let editor = editor(&store);

        editor.modify(|t| {
            t.move_section(SectionId::Footer, Direction::Up);
        });
        let saved = editor.save().await.unwrap();
        assert_eq!(saved.version, 1);
        assert_eq!(store.count(), 1);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(store.count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn rejected_edit_publishes_nothing() {
        let store = Arc::new(RecordingStore::default());
        let editor = editor(&store);

        let edit = TemplateEdit::parse("packet.missing.title=X").unwrap();
        assert!(editor.apply(&edit).is_err());
        assert_eq!(editor.version(), 0);

        let edit = TemplateEdit::parse("charts.enabled=false").unwrap();
        assert_eq!(editor.apply(&edit).unwrap(), 1);
        assert!(!editor.current().charts.enabled);
    }

    #[tokio::test(start_paused = true)]
    async fn restore_from_history() {
        let store = Arc::new(RecordingStore::default());
        let editor = editor(&store);

        retitle(&editor, "draft one");
        let first = editor.save().await.unwrap();
        retitle(&editor, "draft two");
        editor.save().await.unwrap();

        let history = editor.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].template.header.title, "draft two");

        editor.restore(first.id).unwrap();
        assert_eq!(editor.current().header.title, "draft one");
        assert!(editor.has_unsaved_changes());
        assert!(editor.restore(Uuid::new_v4()).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn close_flushes_pending_change() {
        let store = Arc::new(RecordingStore::default());
        let editor = editor(&store);

        retitle(&editor, "unsaved");
        editor.close().await.unwrap();
        assert_eq!(store.last_title().as_deref(), Some("unsaved"));
    }
}
