//! Transcode worker implementation.
//!
//! Each job runs on its own tokio task. A supervising task awaits it, so a
//! panic inside the job is turned into a `failed` result instead of a silent
//! channel close.

use std::any::Any;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::fs;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::converter::{ConversionJob, Converter};
use crate::policy::{PolicyConfig, PolicyDecision};

use super::error::JobError;
use super::types::{elapsed_ms_since, JobResult, PolicyAnnouncement, UploadDescriptor, WorkerMessage};

/// A job emits at most two messages.
const WORKER_CHANNEL_CAPACITY: usize = 2;

enum Outcome {
    Skipped,
    Compressed,
}

/// Runs one upload through policy selection, encoding and replacement.
#[derive(Clone)]
pub struct TranscodeWorker {
    converter: Arc<dyn Converter>,
    policy: PolicyConfig,
    temp_dir: PathBuf,
}

impl TranscodeWorker {
    pub fn new(converter: Arc<dyn Converter>, policy: PolicyConfig, temp_dir: PathBuf) -> Self {
        Self {
            converter,
            policy,
            temp_dir,
        }
    }

    /// Starts the job and returns its message stream.
    ///
    /// The stream yields an optional `Policy` message followed by exactly one
    /// `Result`, then closes.
    pub fn spawn(&self, descriptor: UploadDescriptor) -> mpsc::Receiver<WorkerMessage> {
        let (tx, rx) = mpsc::channel(WORKER_CHANNEL_CAPACITY);

        let filename = descriptor.filename.clone();
        let submitted_at = descriptor.submitted_at;
        let worker = self.clone();
        let job_tx = tx.clone();
        let job = tokio::spawn(async move { worker.run(descriptor, &job_tx).await });

        tokio::spawn(async move {
            let result = match job.await {
                Ok(result) => result,
                Err(e) => {
                    let detail = if e.is_panic() {
                        panic_message(e.into_panic())
                    } else {
                        "task cancelled".to_string()
                    };
                    warn!(filename = %filename, "Transcode job aborted: {}", detail);
                    JobResult::Failed {
                        filename,
                        elapsed_ms: elapsed_ms_since(submitted_at),
                        reason: JobError::Aborted(detail).to_string(),
                    }
                }
            };
            // Receiver gone means nobody is listening; nothing left to do.
            let _ = tx.send(WorkerMessage::Result(result)).await;
        });

        rx
    }

    /// Runs the job to its terminal result. Never fails; errors become `Failed`.
    pub async fn run(
        &self,
        descriptor: UploadDescriptor,
        tx: &mpsc::Sender<WorkerMessage>,
    ) -> JobResult {
        let outcome = self.execute(&descriptor, tx).await;
        let elapsed_ms = elapsed_ms_since(descriptor.submitted_at);
        let filename = descriptor.filename;

        match outcome {
            Ok(Outcome::Skipped) => {
                debug!(filename = %filename, size = descriptor.size, "Below minimum threshold, skipping");
                JobResult::Skipped { filename }
            }
            Ok(Outcome::Compressed) => JobResult::Compressed {
                filename,
                elapsed_ms,
            },
            Err(e) => JobResult::Failed {
                filename,
                elapsed_ms,
                reason: e.to_string(),
            },
        }
    }

    async fn execute(
        &self,
        descriptor: &UploadDescriptor,
        tx: &mpsc::Sender<WorkerMessage>,
    ) -> Result<Outcome, JobError> {
        let policy = match self.policy.select(descriptor.size)? {
            PolicyDecision::Skip => return Ok(Outcome::Skipped),
            PolicyDecision::Encode(policy) => policy,
        };

        let job_id = Uuid::new_v4().to_string();
        let output_path = self
            .temp_dir
            .join(format!("compressed-{}-{}", job_id, descriptor.filename));
        let job = ConversionJob {
            job_id,
            input_path: descriptor.path.clone(),
            output_path: output_path.clone(),
            policy: policy.clone(),
        };

        let command = self.converter.command_line(&job);
        info!(
            filename = %descriptor.filename,
            size = descriptor.size,
            codec = %policy.codec,
            crf = policy.crf,
            preset = %policy.preset,
            "Starting transcode"
        );
        let _ = tx
            .send(WorkerMessage::Policy(PolicyAnnouncement::new(
                descriptor.filename.as_str(),
                &policy,
                command,
            )))
            .await;

        let result = match self.converter.convert(job).await {
            Ok(converted) => replace_original(&converted.output_path, &descriptor.path).await,
            Err(e) => Err(e.into()),
        };

        remove_if_exists(&output_path).await;
        result.map(|()| Outcome::Compressed)
    }
}

/// Swaps `original`'s content for `transcoded`.
///
/// The transcoded bytes are copied to a hidden sibling of `original`, the copy
/// is checked against the source length, and only then renamed over the
/// original. The rename stays within one directory, so it never crosses a
/// filesystem. On any error the sibling is removed and `original` is untouched.
pub async fn replace_original(transcoded: &Path, original: &Path) -> Result<(), JobError> {
    let staging = staging_path(original)?;

    let result = async {
        let expected = fs::metadata(transcoded)
            .await
            .map_err(|e| JobError::io("read transcoded output", e))?
            .len();
        let copied = fs::copy(transcoded, &staging)
            .await
            .map_err(|e| JobError::io("copy transcoded output", e))?;
        if copied != expected {
            return Err(JobError::io(
                "verify staged copy",
                io::Error::new(
                    io::ErrorKind::Other,
                    format!("copied {} of {} bytes", copied, expected),
                ),
            ));
        }
        fs::rename(&staging, original)
            .await
            .map_err(|e| JobError::io("replace original", e))
    }
    .await;

    if result.is_err() {
        remove_if_exists(&staging).await;
    }
    result
}

fn staging_path(original: &Path) -> Result<PathBuf, JobError> {
    let name = original.file_name().ok_or_else(|| {
        JobError::io(
            "stage transcoded output",
            io::Error::new(io::ErrorKind::InvalidInput, "upload path has no file name"),
        )
    })?;
    Ok(original.with_file_name(format!(".{}.partial", name.to_string_lossy())))
}

async fn remove_if_exists(path: &Path) {
    if let Err(e) = fs::remove_file(path).await {
        if e.kind() != io::ErrorKind::NotFound {
            warn!("Failed to remove {}: {}", path.display(), e);
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic".to_string()
    }
}
