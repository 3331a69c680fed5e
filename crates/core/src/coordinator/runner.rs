//! Job coordinator implementation.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::metrics::{JOBS_ACTIVE, JOBS_SUBMITTED, JOB_DURATION, JOB_RESULTS};
use crate::notify::ObserverRegistry;
use crate::worker::{JobResult, TranscodeWorker, UploadDescriptor, WorkerMessage};

use super::types::{CoordinatorStats, CoordinatorStatus};

/// Dispatches one worker per accepted upload and relays its messages.
///
/// There is no queue or admission limit: every submission starts
/// immediately.
pub struct JobCoordinator {
    worker: TranscodeWorker,
    registry: Arc<ObserverRegistry>,
    stats: Arc<CoordinatorStats>,
}

impl JobCoordinator {
    pub fn new(worker: TranscodeWorker, registry: Arc<ObserverRegistry>) -> Self {
        Self {
            worker,
            registry,
            stats: Arc::new(CoordinatorStats::default()),
        }
    }

    /// Starts a job for `descriptor`. Must be called from within a tokio runtime.
    ///
    /// The outcome is only observable through the observer registry.
    pub fn submit(&self, descriptor: UploadDescriptor) {
        let filename = descriptor.filename.clone();
        info!(filename = %filename, size = descriptor.size, mime = %descriptor.mime_type, "Submitting transcode job");

        self.stats.job_started();
        JOBS_SUBMITTED.inc();
        JOBS_ACTIVE.inc();

        let mut messages = self.worker.spawn(descriptor);
        let registry = Arc::clone(&self.registry);
        let stats = Arc::clone(&self.stats);

        tokio::spawn(async move {
            let mut finished = false;
            while let Some(message) = messages.recv().await {
                if let WorkerMessage::Result(result) = &message {
                    record_result(&stats, result);
                    finished = true;
                } else if let WorkerMessage::Policy(announcement) = &message {
                    info!(filename = %announcement.filename, command = %announcement.command, "Encoder command");
                }
                registry.broadcast(&message).await;
            }

            if !finished {
                // Runtime shut down mid-job.
                warn!(filename = %filename, "Worker stream closed without a result");
                stats.job_abandoned();
                JOBS_ACTIVE.dec();
            }
        });
    }

    pub fn status(&self) -> CoordinatorStatus {
        self.stats.snapshot()
    }

    pub fn registry(&self) -> &Arc<ObserverRegistry> {
        &self.registry
    }
}

fn record_result(stats: &CoordinatorStats, result: &JobResult) {
    stats.job_finished(result);
    JOBS_ACTIVE.dec();
    JOB_RESULTS.with_label_values(&[result.status()]).inc();
    if let Some(ms) = result.elapsed_ms() {
        JOB_DURATION
            .with_label_values(&[result.status()])
            .observe(ms as f64 / 1000.0);
    }

    match result {
        JobResult::Compressed {
            filename,
            elapsed_ms,
        } => info!(filename = %filename, elapsed_ms, "Compressed"),
        JobResult::Skipped { filename } => info!(filename = %filename, "Skipped"),
        JobResult::Failed {
            filename,
            elapsed_ms,
            reason,
        } => error!(filename = %filename, elapsed_ms, "Transcode failed: {}", reason),
    }
}
