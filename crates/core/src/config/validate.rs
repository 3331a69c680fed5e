use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Policy thresholds are ordered and tiers use at least one thread
/// - The MIME allow-list is non-empty and maps to bare extensions
/// - Upload ceiling and observer buffer are non-zero
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    let policy = &config.policy;
    if policy.min_threshold_bytes >= policy.medium_threshold_bytes {
        return Err(ConfigError::ValidationError(format!(
            "policy.min_threshold_bytes ({}) must be below policy.medium_threshold_bytes ({})",
            policy.min_threshold_bytes, policy.medium_threshold_bytes
        )));
    }
    if policy.medium_threshold_bytes > policy.max_threshold_bytes {
        return Err(ConfigError::ValidationError(format!(
            "policy.medium_threshold_bytes ({}) cannot exceed policy.max_threshold_bytes ({})",
            policy.medium_threshold_bytes, policy.max_threshold_bytes
        )));
    }
    for (name, tier) in [("standard", &policy.standard), ("aggressive", &policy.aggressive)] {
        if tier.threads == 0 {
            return Err(ConfigError::ValidationError(format!(
                "policy.{}.threads cannot be 0",
                name
            )));
        }
        if tier.preset.trim().is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "policy.{}.preset cannot be empty",
                name
            )));
        }
    }

    let storage = &config.storage;
    if storage.mime_types.is_empty() {
        return Err(ConfigError::ValidationError(
            "storage.mime_types cannot be empty".to_string(),
        ));
    }
    for (mime, ext) in &storage.mime_types {
        let bare = !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric());
        if !bare {
            return Err(ConfigError::ValidationError(format!(
                "storage.mime_types: extension {:?} for {} must be alphanumeric",
                ext, mime
            )));
        }
    }
    if storage.max_upload_bytes == 0 {
        return Err(ConfigError::ValidationError(
            "storage.max_upload_bytes cannot be 0".to_string(),
        ));
    }

    if config.notify.observer_buffer == 0 {
        return Err(ConfigError::ValidationError(
            "notify.observer_buffer cannot be 0".to_string(),
        ));
    }

    Ok(())
}
