//! Transcode worker.
//!
//! A worker owns one [`UploadDescriptor`], picks an encoding policy from its
//! size, runs the converter off the request path and replaces the stored file
//! with the smaller output. Progress is reported as [`WorkerMessage`]s:
//! - at most one `policy` announcement, only when the file is re-encoded
//! - exactly one terminal `result`, even when the job fails or panics

mod error;
mod runner;
mod types;

pub use error::JobError;
pub use runner::{replace_original, TranscodeWorker};
pub use types::{JobResult, PolicyAnnouncement, UploadDescriptor, WorkerMessage};
