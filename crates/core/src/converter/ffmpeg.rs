//! FFmpeg-based converter implementation.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::process::Stdio;
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::time::{timeout, Duration};
use tracing::debug;

use super::config::ConverterConfig;
use super::error::ConverterError;
use super::traits::Converter;
use super::types::{ConversionJob, ConversionResult};

/// Number of trailing stderr lines kept for failure diagnostics.
const STDERR_TAIL_LINES: usize = 20;

/// FFmpeg-based converter implementation.
pub struct FfmpegConverter {
    config: ConverterConfig,
}

impl FfmpegConverter {
    /// Creates a new FFmpeg converter with the given configuration.
    pub fn new(config: ConverterConfig) -> Self {
        Self { config }
    }

    /// Builds ffmpeg arguments for a re-encode.
    fn build_args(&self, job: &ConversionJob) -> Vec<String> {
        let policy = &job.policy;
        let mut args = vec![
            "-y".to_string(), // Overwrite output
            "-i".to_string(),
            job.input_path.to_string_lossy().to_string(),
            "-threads".to_string(),
            policy.threads.to_string(),
            "-c:v".to_string(),
            policy.codec.ffmpeg_codec().to_string(),
            "-crf".to_string(),
            policy.crf.to_string(),
            "-preset".to_string(),
            policy.preset.clone(),
            "-loglevel".to_string(),
            self.config.log_level.clone(),
        ];

        args.extend(self.config.extra_args.iter().cloned());
        args.push(job.output_path.to_string_lossy().to_string());

        args
    }

    async fn run_conversion(&self, job: &ConversionJob) -> Result<ConversionResult, ConverterError> {
        let start = Instant::now();

        if !job.input_path.exists() {
            return Err(ConverterError::InputNotFound {
                path: job.input_path.clone(),
            });
        }
        if job.input_path == job.output_path {
            return Err(ConverterError::conversion_failed(
                "output path must differ from input path",
                None,
            ));
        }

        // Ensure output directory exists
        if let Some(parent) = job.output_path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|_| {
                ConverterError::OutputDirectoryFailed {
                    path: parent.to_path_buf(),
                }
            })?;
        }

        let args = self.build_args(job);
        debug!(job_id = %job.job_id, ?args, "spawning ffmpeg");

        let mut child = Command::new(&self.config.ffmpeg_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ConverterError::FfmpegNotFound {
                        path: self.config.ffmpeg_path.clone(),
                    }
                } else {
                    ConverterError::Io(e)
                }
            })?;

        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| ConverterError::conversion_failed("ffmpeg stderr not captured", None))?;
        let mut reader = BufReader::new(stderr).lines();

        let wait = async {
            let mut tail = VecDeque::with_capacity(STDERR_TAIL_LINES);
            while let Ok(Some(line)) = reader.next_line().await {
                if tail.len() == STDERR_TAIL_LINES {
                    tail.pop_front();
                }
                tail.push_back(line);
            }

            let status = child.wait().await?;
            Ok::<_, std::io::Error>((status, tail))
        };

        let outcome = match self.config.timeout_secs {
            Some(secs) => timeout(Duration::from_secs(secs), wait).await.ok(),
            None => Some(wait.await),
        };

        let (status, tail) = match outcome {
            Some(result) => result?,
            None => {
                let _ = child.kill().await;
                return Err(ConverterError::Timeout {
                    timeout_secs: self.config.timeout_secs.unwrap_or_default(),
                });
            }
        };

        if !status.success() {
            let stderr = Vec::from(tail).join("\n");
            return Err(ConverterError::conversion_failed(
                format!("FFmpeg exited with code: {:?}", status.code()),
                if stderr.is_empty() { None } else { Some(stderr) },
            ));
        }

        // Verify output exists and get size
        let output_meta = tokio::fs::metadata(&job.output_path)
            .await
            .map_err(|_| ConverterError::conversion_failed("Output file not created", None))?;
        if output_meta.len() == 0 {
            return Err(ConverterError::conversion_failed("Output file is empty", None));
        }

        Ok(ConversionResult {
            job_id: job.job_id.clone(),
            output_path: job.output_path.clone(),
            output_size_bytes: output_meta.len(),
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }
}

#[async_trait]
impl Converter for FfmpegConverter {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn convert(&self, job: ConversionJob) -> Result<ConversionResult, ConverterError> {
        self.run_conversion(&job).await
    }

    async fn validate(&self) -> Result<(), ConverterError> {
        let ffmpeg_result = Command::new(&self.config.ffmpeg_path)
            .arg("-version")
            .output()
            .await;

        if let Err(e) = ffmpeg_result {
            if e.kind() == std::io::ErrorKind::NotFound {
                return Err(ConverterError::FfmpegNotFound {
                    path: self.config.ffmpeg_path.clone(),
                });
            }
            return Err(ConverterError::Io(e));
        }

        // Ensure temp dir exists
        tokio::fs::create_dir_all(&self.config.temp_dir).await?;

        Ok(())
    }

    fn command_line(&self, job: &ConversionJob) -> String {
        format!(
            "{} {}",
            self.config.ffmpeg_path.display(),
            self.build_args(job).join(" ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::EncodingPolicy;
    use std::path::{Path, PathBuf};

    fn with_binary(path: &str) -> FfmpegConverter {
        FfmpegConverter::new(ConverterConfig {
            ffmpeg_path: PathBuf::from(path),
            ..Default::default()
        })
    }

    fn job(input: &Path, output: &Path, policy: EncodingPolicy) -> ConversionJob {
        ConversionJob {
            job_id: "test-job".to_string(),
            input_path: input.to_path_buf(),
            output_path: output.to_path_buf(),
            policy,
        }
    }

    #[test]
    fn test_build_args_standard_tier() {
        let converter = FfmpegConverter::new(ConverterConfig::default());
        let args = converter.build_args(&job(
            Path::new("/uploads/a.mp4"),
            Path::new("/tmp/compressed-a.mp4"),
            EncodingPolicy::standard(),
        ));

        assert_eq!(&args[..3], &["-y", "-i", "/uploads/a.mp4"]);
        let joined = args.join(" ");
        assert!(joined.contains("-threads 3"));
        assert!(joined.contains("-c:v libx265"));
        assert!(joined.contains("-crf 35"));
        assert!(joined.contains("-preset superfast"));
        assert_eq!(args.last().unwrap(), "/tmp/compressed-a.mp4");
    }

    #[test]
    fn test_build_args_extra_args_before_output() {
        let mut config = ConverterConfig::default();
        config.extra_args = vec!["-an".to_string()];
        let converter = FfmpegConverter::new(config);
        let args = converter.build_args(&job(
            Path::new("/in.mp4"),
            Path::new("/out.mp4"),
            EncodingPolicy::aggressive(),
        ));

        let n = args.len();
        assert_eq!(args[n - 2], "-an");
        assert_eq!(args[n - 1], "/out.mp4");
        assert!(args.join(" ").contains("-crf 40 -preset ultrafast"));
    }

    #[test]
    fn test_command_line_starts_with_binary() {
        let converter = with_binary("/bin/ffmpeg");
        let line = converter.command_line(&job(
            Path::new("/in.mp4"),
            Path::new("/out.mp4"),
            EncodingPolicy::standard(),
        ));
        assert!(line.starts_with("/bin/ffmpeg -y -i /in.mp4"));
        assert!(line.ends_with("/out.mp4"));
    }

    #[tokio::test]
    async fn test_missing_input_is_reported() {
        let converter = FfmpegConverter::new(ConverterConfig::default());
        let err = converter
            .convert(job(
                Path::new("/definitely/not/here.mp4"),
                Path::new("/tmp/out.mp4"),
                EncodingPolicy::standard(),
            ))
            .await
            .unwrap_err();
        assert!(matches!(err, ConverterError::InputNotFound { .. }));
    }

    #[tokio::test]
    async fn test_missing_binary_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.mp4");
        std::fs::write(&input, b"original").unwrap();

        let converter = with_binary("/nonexistent/bin/ffmpeg");
        let err = converter
            .convert(job(&input, &dir.path().join("out.mp4"), EncodingPolicy::standard()))
            .await
            .unwrap_err();
        assert!(matches!(err, ConverterError::FfmpegNotFound { .. }));
        assert_eq!(std::fs::read(&input).unwrap(), b"original");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_non_zero_exit_is_conversion_failure() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.mp4");
        std::fs::write(&input, b"original").unwrap();

        let converter = with_binary("false");
        let err = converter
            .convert(job(&input, &dir.path().join("out.mp4"), EncodingPolicy::standard()))
            .await
            .unwrap_err();
        assert!(matches!(err, ConverterError::ConversionFailed { .. }));
        assert_eq!(std::fs::read(&input).unwrap(), b"original");
    }

    #[tokio::test]
    async fn test_same_input_and_output_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.mp4");
        std::fs::write(&input, b"original").unwrap();

        let converter = FfmpegConverter::new(ConverterConfig::default());
        let err = converter
            .convert(job(&input, &input, EncodingPolicy::standard()))
            .await
            .unwrap_err();
        assert!(matches!(err, ConverterError::ConversionFailed { .. }));
    }
}
