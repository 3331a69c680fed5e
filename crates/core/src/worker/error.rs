//! Error types for the worker module.

use thiserror::Error;

use crate::converter::ConverterError;
use crate::policy::PolicyError;

/// Why a job ended in `failed`. The `Display` text becomes the result's `reason`.
#[derive(Debug, Error)]
pub enum JobError {
    #[error("file too large: {size} bytes exceeds the {max} byte limit")]
    FileTooLarge { size: u64, max: u64 },

    #[error("encoder failed: {reason}")]
    EncoderFailure { reason: String },

    #[error("failed to {action}: {source}")]
    IoFailure {
        action: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("worker aborted: {0}")]
    Aborted(String),
}

impl JobError {
    pub(crate) fn io(action: &'static str, source: std::io::Error) -> Self {
        Self::IoFailure { action, source }
    }
}

impl From<PolicyError> for JobError {
    fn from(err: PolicyError) -> Self {
        match err {
            PolicyError::FileTooLarge { size, max } => Self::FileTooLarge { size, max },
        }
    }
}

impl From<ConverterError> for JobError {
    fn from(err: ConverterError) -> Self {
        Self::EncoderFailure {
            reason: err.diagnostic(),
        }
    }
}
