use thiserror::Error;

use super::types::{PolicyConfig, PolicyDecision};

/// Sizes the selector refuses to produce a policy for.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    #[error("file too large: {size} bytes exceeds the {max} byte limit")]
    FileTooLarge { size: u64, max: u64 },
}

/// Picks the encoding tier for a file of `size` bytes.
///
/// Pure and deterministic; every band is inclusive on its upper bound.
pub fn select_policy(size: u64, config: &PolicyConfig) -> Result<PolicyDecision, PolicyError> {
    if size > config.max_threshold_bytes {
        return Err(PolicyError::FileTooLarge {
            size,
            max: config.max_threshold_bytes,
        });
    }

    if size < config.min_threshold_bytes {
        Ok(PolicyDecision::Skip)
    } else if size <= config.medium_threshold_bytes {
        Ok(PolicyDecision::Encode(config.standard.clone()))
    } else {
        Ok(PolicyDecision::Encode(config.aggressive.clone()))
    }
}

impl PolicyConfig {
    /// Convenience wrapper around [`select_policy`].
    pub fn select(&self, size: u64) -> Result<PolicyDecision, PolicyError> {
        select_policy(size, self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::types::{EncodingPolicy, MIB};

    fn config() -> PolicyConfig {
        PolicyConfig::default()
    }

    #[test]
    fn test_below_min_skips() {
        for size in [0, 1, 10 * MIB, 16 * MIB - 1] {
            assert_eq!(select_policy(size, &config()), Ok(PolicyDecision::Skip));
        }
    }

    #[test]
    fn test_min_boundary_is_standard() {
        assert_eq!(
            select_policy(16 * MIB, &config()),
            Ok(PolicyDecision::Encode(EncodingPolicy::standard()))
        );
    }

    #[test]
    fn test_medium_boundary_is_standard() {
        assert_eq!(
            select_policy(64 * MIB, &config()),
            Ok(PolicyDecision::Encode(EncodingPolicy::standard()))
        );
    }

    #[test]
    fn test_just_above_medium_is_aggressive() {
        assert_eq!(
            select_policy(64 * MIB + 1, &config()),
            Ok(PolicyDecision::Encode(EncodingPolicy::aggressive()))
        );
    }

    #[test]
    fn test_max_boundary_is_aggressive() {
        assert_eq!(
            select_policy(100 * MIB, &config()),
            Ok(PolicyDecision::Encode(EncodingPolicy::aggressive()))
        );
    }

    #[test]
    fn test_above_max_is_too_large() {
        let err = select_policy(100 * MIB + 1, &config()).unwrap_err();
        assert_eq!(
            err,
            PolicyError::FileTooLarge {
                size: 100 * MIB + 1,
                max: 100 * MIB
            }
        );
        assert!(err.to_string().contains("too large"));
    }

    #[test]
    fn test_tier_parameters() {
        let a = EncodingPolicy::standard();
        assert_eq!((a.crf, a.preset.as_str(), a.threads), (35, "superfast", 3));
        let b = EncodingPolicy::aggressive();
        assert_eq!((b.crf, b.preset.as_str(), b.threads), (40, "ultrafast", 3));
    }

    #[test]
    fn test_custom_thresholds() {
        let config = PolicyConfig {
            min_threshold_bytes: 10,
            medium_threshold_bytes: 20,
            max_threshold_bytes: 30,
            ..Default::default()
        };
        assert_eq!(config.select(9), Ok(PolicyDecision::Skip));
        assert!(matches!(config.select(20), Ok(PolicyDecision::Encode(p)) if p.crf == 35));
        assert!(matches!(config.select(21), Ok(PolicyDecision::Encode(p)) if p.crf == 40));
        assert!(config.select(31).is_err());
    }
}
