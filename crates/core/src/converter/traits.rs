//! Trait definitions for the converter module.

use async_trait::async_trait;

use super::error::ConverterError;
use super::types::{ConversionJob, ConversionResult};

/// An external encoder that can transcode one media file into another.
#[async_trait]
pub trait Converter: Send + Sync {
    /// Returns the name of this converter implementation.
    fn name(&self) -> &str;

    /// Converts `job.input_path` into `job.output_path`.
    ///
    /// Implementations must leave the input file untouched, whether they
    /// succeed or fail.
    async fn convert(&self, job: ConversionJob) -> Result<ConversionResult, ConverterError>;

    /// Validates that the converter is properly configured and ready.
    async fn validate(&self) -> Result<(), ConverterError>;

    /// Renders the command that `convert` would run for this job.
    fn command_line(&self, job: &ConversionJob) -> String {
        format!(
            "{} codec={} crf={} preset={} threads={} {} -> {}",
            self.name(),
            job.policy.codec,
            job.policy.crf,
            job.policy.preset,
            job.policy.threads,
            job.input_path.display(),
            job.output_path.display()
        )
    }
}
