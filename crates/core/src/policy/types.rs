//! Types for the policy module.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One mebibyte.
pub const MIB: u64 = 1024 * 1024;

/// Files smaller than this are served as uploaded.
pub const MIN_THRESHOLD_BYTES: u64 = 16 * MIB;

/// Upper bound (inclusive) of the standard tier.
pub const MEDIUM_THRESHOLD_BYTES: u64 = 64 * MIB;

/// Upper bound (inclusive) of the aggressive tier. Anything larger is refused.
pub const MAX_THRESHOLD_BYTES: u64 = 100 * MIB;

/// Video codec used for re-encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoCodec {
    /// H.264 / AVC
    H264,
    /// H.265 / HEVC
    H265,
}

impl VideoCodec {
    /// Returns the ffmpeg encoder name for this codec.
    pub fn ffmpeg_codec(&self) -> &'static str {
        match self {
            Self::H264 => "libx264",
            Self::H265 => "libx265",
        }
    }
}

impl fmt::Display for VideoCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::H264 => write!(f, "h264"),
            Self::H265 => write!(f, "h265"),
        }
    }
}

/// Parameters handed to the encoder for one job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodingPolicy {
    pub codec: VideoCodec,
    /// Constant rate factor; higher means smaller and lossier.
    pub crf: u8,
    pub preset: String,
    pub threads: u32,
}

impl EncodingPolicy {
    /// Tier A: files between the minimum and medium thresholds.
    pub fn standard() -> Self {
        Self {
            codec: VideoCodec::H265,
            crf: 35,
            preset: "superfast".to_string(),
            threads: 3,
        }
    }

    /// Tier B: files between the medium and maximum thresholds.
    pub fn aggressive() -> Self {
        Self {
            codec: VideoCodec::H265,
            crf: 40,
            preset: "ultrafast".to_string(),
            threads: 3,
        }
    }
}

/// Outcome of policy selection for an admissible size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyDecision {
    /// Small enough to keep as-is.
    Skip,
    /// Re-encode with the given parameters.
    Encode(EncodingPolicy),
}

/// Size thresholds and the tier used inside each band.
///
/// Bands are inclusive on their upper bound:
/// `[0, min)` skips, `[min, medium]` uses `standard`,
/// `(medium, max]` uses `aggressive`, and `> max` is refused.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyConfig {
    #[serde(default = "default_min_threshold")]
    pub min_threshold_bytes: u64,

    #[serde(default = "default_medium_threshold")]
    pub medium_threshold_bytes: u64,

    #[serde(default = "default_max_threshold")]
    pub max_threshold_bytes: u64,

    #[serde(default = "EncodingPolicy::standard")]
    pub standard: EncodingPolicy,

    #[serde(default = "EncodingPolicy::aggressive")]
    pub aggressive: EncodingPolicy,
}

fn default_min_threshold() -> u64 {
    MIN_THRESHOLD_BYTES
}

fn default_medium_threshold() -> u64 {
    MEDIUM_THRESHOLD_BYTES
}

fn default_max_threshold() -> u64 {
    MAX_THRESHOLD_BYTES
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            min_threshold_bytes: default_min_threshold(),
            medium_threshold_bytes: default_medium_threshold(),
            max_threshold_bytes: default_max_threshold(),
            standard: EncodingPolicy::standard(),
            aggressive: EncodingPolicy::aggressive(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codec_names() {
        assert_eq!(VideoCodec::H265.ffmpeg_codec(), "libx265");
        assert_eq!(VideoCodec::H264.ffmpeg_codec(), "libx264");
        assert_eq!(VideoCodec::H265.to_string(), "h265");
    }

    #[test]
    fn test_policy_config_partial_toml() {
        let toml = r#"
min_threshold_bytes = 1024

[aggressive]
codec = "h264"
crf = 30
preset = "veryfast"
threads = 2
"#;
        let config: PolicyConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.min_threshold_bytes, 1024);
        assert_eq!(config.medium_threshold_bytes, MEDIUM_THRESHOLD_BYTES);
        assert_eq!(config.standard, EncodingPolicy::standard());
        assert_eq!(config.aggressive.codec, VideoCodec::H264);
        assert_eq!(config.aggressive.threads, 2);
    }
}
