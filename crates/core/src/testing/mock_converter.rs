//! Mock converter for testing.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::converter::{ConversionJob, ConversionResult, Converter, ConverterError};

/// Bytes written to the output path by default.
pub const MOCK_OUTPUT: &[u8] = b"transcoded";

/// A recorded conversion job for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedConversion {
    /// The job that was submitted.
    pub job: ConversionJob,
    /// Whether the conversion succeeded.
    pub success: bool,
}

/// Mock implementation of the Converter trait.
///
/// Provides controllable behavior for testing:
/// - Track conversion jobs for assertions
/// - Simulate success, failure or a panic
/// - Control how long an encode takes and what it writes
///
/// Clones share state, so a test can keep one handle while the worker owns
/// another.
///
/// # Example
///
/// ```rust,ignore
/// use mediashrink_core::testing::MockConverter;
///
/// let converter = MockConverter::new();
/// converter.set_next_error(ConverterError::conversion_failed("exit 1", None)).await;
///
/// let worker = TranscodeWorker::new(Arc::new(converter.clone()), policy, temp_dir);
/// // ...
/// assert_eq!(converter.conversion_count().await, 1);
/// ```
#[derive(Debug, Clone)]
pub struct MockConverter {
    /// Recorded conversions.
    conversions: Arc<RwLock<Vec<RecordedConversion>>>,
    /// If set, the next conversion will fail with this error.
    next_error: Arc<RwLock<Option<ConverterError>>>,
    /// If set, the next conversion panics.
    panic_next: Arc<RwLock<bool>>,
    /// Simulated conversion duration in milliseconds.
    conversion_duration_ms: Arc<RwLock<u64>>,
    /// Written to the job's output path on success.
    output: Arc<RwLock<Vec<u8>>>,
}

impl Default for MockConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl MockConverter {
    /// Create a new mock converter.
    pub fn new() -> Self {
        Self {
            conversions: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
            panic_next: Arc::new(RwLock::new(false)),
            conversion_duration_ms: Arc::new(RwLock::new(0)),
            output: Arc::new(RwLock::new(MOCK_OUTPUT.to_vec())),
        }
    }

    /// Get all recorded conversions.
    pub async fn recorded_conversions(&self) -> Vec<RecordedConversion> {
        self.conversions.read().await.clone()
    }

    /// Get the number of conversions attempted.
    pub async fn conversion_count(&self) -> usize {
        self.conversions.read().await.len()
    }

    /// Configure the next conversion to fail with the given error.
    pub async fn set_next_error(&self, error: ConverterError) {
        *self.next_error.write().await = Some(error);
    }

    /// Configure the next conversion to panic.
    pub async fn panic_on_next(&self) {
        *self.panic_next.write().await = true;
    }

    /// Set the simulated conversion duration.
    pub async fn set_conversion_duration(&self, duration: Duration) {
        *self.conversion_duration_ms.write().await = duration.as_millis() as u64;
    }

    /// Set the bytes a successful conversion writes.
    pub async fn set_output(&self, bytes: impl Into<Vec<u8>>) {
        *self.output.write().await = bytes.into();
    }
}

#[async_trait]
impl Converter for MockConverter {
    fn name(&self) -> &str {
        "mock"
    }

    async fn convert(&self, job: ConversionJob) -> Result<ConversionResult, ConverterError> {
        if std::mem::take(&mut *self.panic_next.write().await) {
            panic!("mock encoder crashed");
        }

        if let Some(err) = self.next_error.write().await.take() {
            self.conversions.write().await.push(RecordedConversion {
                job,
                success: false,
            });
            return Err(err);
        }

        self.conversions.write().await.push(RecordedConversion {
            job: job.clone(),
            success: true,
        });

        let duration_ms = *self.conversion_duration_ms.read().await;
        if duration_ms > 0 {
            tokio::time::sleep(Duration::from_millis(duration_ms)).await;
        }

        if let Some(parent) = job.output_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let output = self.output.read().await.clone();
        tokio::fs::write(&job.output_path, &output).await?;

        Ok(ConversionResult {
            job_id: job.job_id,
            output_path: job.output_path,
            output_size_bytes: output.len() as u64,
            duration_ms,
        })
    }

    async fn validate(&self) -> Result<(), ConverterError> {
        Ok(())
    }
}
