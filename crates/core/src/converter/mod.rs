//! Converter module for re-encoding uploaded media.
//!
//! This module provides the `Converter` trait, the seam between a transcode
//! worker and the external encoder, and an FFmpeg implementation that runs
//! the encoder as a child process.
//!
//! # Example
//!
//! ```ignore
//! use mediashrink_core::converter::{ConversionJob, Converter, ConverterConfig, FfmpegConverter};
//! use mediashrink_core::policy::EncodingPolicy;
//!
//! let converter = FfmpegConverter::new(ConverterConfig::default());
//! converter.validate().await?;
//!
//! let job = ConversionJob {
//!     job_id: "job-1".to_string(),
//!     input_path: PathBuf::from("/tmp/uploads/ab12.mp4"),
//!     output_path: PathBuf::from("/tmp/mediashrink/compressed-ab12.mp4"),
//!     policy: EncodingPolicy::standard(),
//! };
//!
//! let result = converter.convert(job).await?;
//! println!("Converted in {} ms", result.duration_ms);
//! ```

mod config;
mod error;
mod ffmpeg;
mod traits;
mod types;

pub use config::ConverterConfig;
pub use error::ConverterError;
pub use ffmpeg::FfmpegConverter;
pub use traits::Converter;
pub use types::{ConversionJob, ConversionResult};
