use thiserror::Error;

/// Reasons an upload is refused before it reaches a worker.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("invalid file type: {0}")]
    UnsupportedMimeType(String),

    #[error("max file size reached: {size} bytes exceeds the {max} byte limit")]
    PayloadTooLarge { size: u64, max: u64 },
}
