//! Report generation orchestrator.
//!
//! Fetches the records for one attempt concurrently, assembles
//! [`ReportData`], and runs batches of attempts with bounded parallelism.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::Semaphore;

use crate::error::{ReportError, Result};
use crate::model::User;
use crate::report::ReportData;
use crate::traits::{DataSource, TemplateStore};

/// Configuration for the report engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Maximum reports fetched at once in a batch.
    pub parallelism: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { parallelism: 4 }
    }
}

/// Progress reporting for batches.
pub trait ProgressReporter: Send + Sync {
    fn on_report_complete(&self, data: &ReportData);
    fn on_report_error(&self, attempt_id: &str, error: &ReportError);
    fn on_batch_complete(&self, total: usize, completed: usize, failed: usize, elapsed: Duration);
}

/// No-op progress reporter.
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn on_report_complete(&self, _: &ReportData) {}
    fn on_report_error(&self, _: &str, _: &ReportError) {}
    fn on_batch_complete(&self, _: usize, _: usize, _: usize, _: Duration) {}
}

/// A report that could not be produced.
#[derive(Debug)]
pub struct BatchFailure {
    pub attempt_id: String,
    pub error: ReportError,
}

/// Outcome of a batch. Reports are in completion order.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub reports: Vec<ReportData>,
    pub failures: Vec<BatchFailure>,
}

pub struct ReportEngine<B: ?Sized> {
    backend: Arc<B>,
    config: EngineConfig,
}

impl<B> ReportEngine<B>
where
    B: DataSource + TemplateStore + ?Sized + 'static,
{
    pub fn new(backend: Arc<B>, config: EngineConfig) -> Self {
        Self { backend, config }
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    /// Fetch and assemble the report for one attempt.
    ///
    /// Quiz, attempt, packets and template are read concurrently; the user is
    /// read once the attempt names one. Any failed read aborts the report.
    #[tracing::instrument(skip(self), fields(backend = self.backend.name()))]
    pub async fn fetch(&self, quiz_id: &str, attempt_id: &str) -> Result<ReportData> {
        fetch_report(self.backend.as_ref(), quiz_id, attempt_id).await
    }

    /// Produce reports for several attempts of one quiz.
    ///
    /// Each attempt is independent: a failure is logged and recorded without
    /// affecting the others.
    pub async fn fetch_batch(
        &self,
        quiz_id: &str,
        attempt_ids: &[String],
        progress: &dyn ProgressReporter,
    ) -> BatchOutcome {
        let start = Instant::now();
        let semaphore = Arc::new(Semaphore::new(self.config.parallelism.max(1)));
        let mut futures = FuturesUnordered::new();

        for attempt_id in attempt_ids {
            let backend = Arc::clone(&self.backend);
            let semaphore = Arc::clone(&semaphore);
            let quiz_id = quiz_id.to_string();
            let attempt_id = attempt_id.clone();

            futures.push(async move {
                let result = match semaphore.acquire_owned().await {
                    Ok(_permit) => fetch_report(backend.as_ref(), &quiz_id, &attempt_id).await,
                    Err(_) => Err(ReportError::data_fetch(
                        format!("attempt {attempt_id}"),
                        None,
                        "semaphore closed",
                    )),
                };
                (attempt_id, result)
            });
        }

        let total = futures.len();
        let mut outcome = BatchOutcome::default();
        while let Some((attempt_id, result)) = futures.next().await {
            match result {
                Ok(data) => {
                    progress.on_report_complete(&data);
                    outcome.reports.push(data);
                }
                Err(error) => {
                    tracing::error!("report failed for attempt {attempt_id}: {error}");
                    progress.on_report_error(&attempt_id, &error);
                    outcome.failures.push(BatchFailure { attempt_id, error });
                }
            }
        }

        progress.on_batch_complete(
            total,
            outcome.reports.len(),
            outcome.failures.len(),
            start.elapsed(),
        );
        outcome
    }
}

async fn fetch_report<B>(backend: &B, quiz_id: &str, attempt_id: &str) -> Result<ReportData>
where
    B: DataSource + TemplateStore + ?Sized,
{
    let (quiz, attempt, packets, template) = tokio::try_join!(
        backend.quiz(quiz_id),
        backend.attempt(attempt_id),
        backend.quiz_packets(quiz_id),
        backend.load_template(quiz_id),
    )?;

    let user = match attempt.user_id.as_deref() {
        Some(user_id) => backend.user(user_id).await?,
        None => User::default(),
    };

    tracing::debug!(
        quiz = %quiz.id,
        attempt = %attempt.id,
        packets = packets.len(),
        custom_template = template.is_some(),
        "fetched report inputs"
    );

    Ok(ReportData::assemble(
        quiz,
        attempt,
        user,
        packets,
        template.unwrap_or_default(),
    ))
}
