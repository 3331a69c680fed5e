//! Types for the job coordinator.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::worker::JobResult;

/// Counters since process start.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoordinatorStatus {
    /// Jobs whose terminal result has not been relayed yet.
    pub active_jobs: u64,
    pub submitted: u64,
    pub compressed: u64,
    pub skipped: u64,
    pub failed: u64,
}

#[derive(Debug, Default)]
pub(crate) struct CoordinatorStats {
    active: AtomicU64,
    submitted: AtomicU64,
    compressed: AtomicU64,
    skipped: AtomicU64,
    failed: AtomicU64,
}

impl CoordinatorStats {
    pub(crate) fn job_started(&self) {
        self.submitted.fetch_add(1, Ordering::Relaxed);
        self.active.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn job_finished(&self, result: &JobResult) {
        let counter = match result {
            JobResult::Compressed { .. } => &self.compressed,
            JobResult::Skipped { .. } => &self.skipped,
            JobResult::Failed { .. } => &self.failed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        self.active.fetch_sub(1, Ordering::Relaxed);
    }

    /// A job whose worker stream closed without a terminal result.
    pub(crate) fn job_abandoned(&self) {
        self.active.fetch_sub(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> CoordinatorStatus {
        CoordinatorStatus {
            active_jobs: self.active.load(Ordering::Relaxed),
            submitted: self.submitted.load(Ordering::Relaxed),
            compressed: self.compressed.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}
