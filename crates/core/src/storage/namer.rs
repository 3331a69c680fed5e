//! Content-derived storage names and ingress admission.

use chrono::Utc;
use once_cell::sync::Lazy;
use regex_lite::Regex;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

use crate::config::StorageConfig;

use super::error::StorageError;

static STORAGE_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9a-f]{64}\.[A-Za-z0-9]+$").expect("valid storage name regex"));

/// Derives storage names for uploads and decides which uploads are admitted.
///
/// A storage name is `<sha256(original_name + millis)>.<ext>`. Two uploads with
/// the same original name in the same millisecond get the same name; that
/// collision is accepted.
#[derive(Debug, Clone)]
pub struct StorageNamer {
    mime_types: BTreeMap<String, String>,
    max_upload_bytes: u64,
}

impl StorageNamer {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            mime_types: config
                .mime_types
                .iter()
                .map(|(mime, ext)| (mime.to_ascii_lowercase(), ext.clone()))
                .collect(),
            max_upload_bytes: config.max_upload_bytes,
        }
    }

    /// Upload ceiling in bytes.
    pub fn max_upload_bytes(&self) -> u64 {
        self.max_upload_bytes
    }

    /// Extension for an allowed MIME type (case-insensitive).
    pub fn extension_for(&self, mime_type: &str) -> Result<&str, StorageError> {
        self.mime_types
            .get(&mime_type.trim().to_ascii_lowercase())
            .map(String::as_str)
            .ok_or_else(|| StorageError::UnsupportedMimeType(mime_type.to_string()))
    }

    /// Reverse lookup used when serving a stored file.
    pub fn mime_for_extension(&self, ext: &str) -> Option<&str> {
        self.mime_types
            .iter()
            .find(|(_, e)| e.eq_ignore_ascii_case(ext))
            .map(|(mime, _)| mime.as_str())
    }

    /// Rejects payloads above the ingress ceiling.
    pub fn check_size(&self, size: u64) -> Result<(), StorageError> {
        if size > self.max_upload_bytes {
            return Err(StorageError::PayloadTooLarge {
                size,
                max: self.max_upload_bytes,
            });
        }
        Ok(())
    }

    /// Storage name for `original_name` uploaded at `timestamp_millis`.
    pub fn storage_name(
        &self,
        original_name: &str,
        mime_type: &str,
        timestamp_millis: i64,
    ) -> Result<String, StorageError> {
        let ext = self.extension_for(mime_type)?;
        let digest = Sha256::digest(format!("{}{}", original_name, timestamp_millis).as_bytes());
        Ok(format!("{:x}.{}", digest, ext))
    }

    /// Storage name using the current wall-clock millisecond.
    pub fn storage_name_now(
        &self,
        original_name: &str,
        mime_type: &str,
    ) -> Result<String, StorageError> {
        self.storage_name(original_name, mime_type, Utc::now().timestamp_millis())
    }
}

/// Whether `name` has the shape of a name produced by [`StorageNamer`].
///
/// Used to keep download requests inside the upload directory.
pub fn is_storage_name(name: &str) -> bool {
    STORAGE_NAME.is_match(name)
}
