//! Types for the worker module.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::policy::{EncodingPolicy, VideoCodec};

/// An accepted, already-stored upload.
///
/// Not `Clone`: submitting a descriptor moves it into exactly one worker.
#[derive(Debug)]
pub struct UploadDescriptor {
    /// Absolute location of the stored file.
    pub path: PathBuf,
    /// Storage name, `<sha256>.<ext>`.
    pub filename: String,
    /// Size in bytes as received.
    pub size: u64,
    pub mime_type: String,
    /// When ingress accepted the upload; job timing starts here.
    pub submitted_at: DateTime<Utc>,
}

/// Informational message sent when a file is about to be re-encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyAnnouncement {
    pub filename: String,
    pub codec: VideoCodec,
    pub crf: u8,
    pub preset: String,
    pub threads: u32,
    /// Encoder command line as executed.
    pub command: String,
}

impl PolicyAnnouncement {
    pub fn new(filename: impl Into<String>, policy: &EncodingPolicy, command: String) -> Self {
        Self {
            filename: filename.into(),
            codec: policy.codec,
            crf: policy.crf,
            preset: policy.preset.clone(),
            threads: policy.threads,
            command,
        }
    }
}

/// Terminal outcome of one job. Exactly one is produced per job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum JobResult {
    /// The stored file now holds the re-encoded bytes.
    Compressed {
        filename: String,
        #[serde(rename = "timing")]
        elapsed_ms: u64,
    },
    /// The file was below the minimum threshold and left alone.
    Skipped { filename: String },
    /// Nothing was replaced; the original upload is still served.
    Failed {
        filename: String,
        #[serde(rename = "timing")]
        elapsed_ms: u64,
        reason: String,
    },
}

impl JobResult {
    pub fn filename(&self) -> &str {
        match self {
            Self::Compressed { filename, .. }
            | Self::Skipped { filename }
            | Self::Failed { filename, .. } => filename,
        }
    }

    /// Wire value of the `status` tag.
    pub fn status(&self) -> &'static str {
        match self {
            Self::Compressed { .. } => "compressed",
            Self::Skipped { .. } => "skipped",
            Self::Failed { .. } => "failed",
        }
    }

    pub fn elapsed_ms(&self) -> Option<u64> {
        match self {
            Self::Compressed { elapsed_ms, .. } | Self::Failed { elapsed_ms, .. } => {
                Some(*elapsed_ms)
            }
            Self::Skipped { .. } => None,
        }
    }
}

/// Everything a worker sends to its coordinator, in order:
/// at most one `Policy`, then exactly one `Result`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WorkerMessage {
    Policy(PolicyAnnouncement),
    Result(JobResult),
}

impl WorkerMessage {
    pub fn filename(&self) -> &str {
        match self {
            Self::Policy(announcement) => &announcement.filename,
            Self::Result(result) => result.filename(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Result(_))
    }
}

impl From<JobResult> for WorkerMessage {
    fn from(result: JobResult) -> Self {
        Self::Result(result)
    }
}

/// Milliseconds elapsed since `since`, clamped at zero.
pub(crate) fn elapsed_ms_since(since: DateTime<Utc>) -> u64 {
    (Utc::now() - since).num_milliseconds().max(0) as u64
}
