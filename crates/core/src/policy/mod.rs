//! Encoding policy selection.
//!
//! Maps a file size onto one of three outcomes: keep the file as-is,
//! re-encode with a size tier, or refuse because the file is too large.

mod selector;
mod types;

pub use selector::{select_policy, PolicyError};
pub use types::{
    EncodingPolicy, PolicyConfig, PolicyDecision, VideoCodec, MAX_THRESHOLD_BYTES,
    MEDIUM_THRESHOLD_BYTES, MIB, MIN_THRESHOLD_BYTES,
};
