//! Types for the converter module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::policy::EncodingPolicy;

/// A single conversion job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionJob {
    /// Unique job ID.
    pub job_id: String,
    /// Input file path. Never modified by the converter.
    pub input_path: PathBuf,
    /// Output file path; must differ from `input_path`.
    pub output_path: PathBuf,
    /// Encoding parameters.
    pub policy: EncodingPolicy,
}

/// Result of a successful conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionResult {
    /// Job ID.
    pub job_id: String,
    /// Output file path.
    pub output_path: PathBuf,
    /// Output file size in bytes.
    pub output_size_bytes: u64,
    /// Conversion duration in milliseconds.
    pub duration_ms: u64,
}
