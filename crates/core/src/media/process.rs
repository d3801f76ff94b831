//! ffmpeg/ffprobe process execution.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tokio::process::Command;
use tokio::time::timeout;

use crate::config::VideoConfig;
use crate::metrics;

/// External media tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaTool {
    Ffmpeg,
    Ffprobe,
}

impl MediaTool {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaTool::Ffmpeg => "ffmpeg",
            MediaTool::Ffprobe => "ffprobe",
        }
    }
}

/// A single tool run: which binary, its arguments, and a short label for
/// logs and errors.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaInvocation {
    pub tool: MediaTool,
    pub args: Vec<String>,
    pub label: &'static str,
}

impl MediaInvocation {
    pub fn ffmpeg(label: &'static str) -> Self {
        Self {
            tool: MediaTool::Ffmpeg,
            args: Vec::new(),
            label,
        }
    }

    pub fn ffprobe(label: &'static str) -> Self {
        Self {
            tool: MediaTool::Ffprobe,
            args: Vec::new(),
            label,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn path_arg(self, path: &Path) -> Self {
        self.arg(path.to_string_lossy().to_string())
    }

    /// The last argument, which for ffmpeg is the output file.
    pub fn output(&self) -> Option<&str> {
        self.args.last().map(String::as_str)
    }
}

/// Captured output of a successful run.
#[derive(Debug, Clone, Default)]
pub struct ProcessOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Errors from running a media tool.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("{tool} not found at path: {path}")]
    NotFound { tool: &'static str, path: PathBuf },

    #[error("{label} failed (exit code {code:?}): {stderr}")]
    Failed {
        label: &'static str,
        code: Option<i32>,
        stderr: String,
    },

    #[error("{label} timed out after {timeout_secs} seconds")]
    Timeout {
        label: &'static str,
        timeout_secs: u64,
    },

    #[error("Failed to parse {label} output: {reason}")]
    Parse { label: &'static str, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Runs ffmpeg and ffprobe.
#[async_trait]
pub trait MediaRunner: Send + Sync {
    async fn run(&self, invocation: &MediaInvocation) -> Result<ProcessOutput, ProcessError>;
}

/// Spawns the real binaries with a timeout.
pub struct FfmpegRunner {
    ffmpeg_path: PathBuf,
    ffprobe_path: PathBuf,
    timeout_secs: u64,
}

impl FfmpegRunner {
    pub fn new(config: &VideoConfig) -> Self {
        Self {
            ffmpeg_path: config.ffmpeg_path.clone(),
            ffprobe_path: config.ffprobe_path.clone(),
            timeout_secs: config.timeout_secs,
        }
    }

    fn binary(&self, tool: MediaTool) -> &Path {
        match tool {
            MediaTool::Ffmpeg => &self.ffmpeg_path,
            MediaTool::Ffprobe => &self.ffprobe_path,
        }
    }
}

#[async_trait]
impl MediaRunner for FfmpegRunner {
    async fn run(&self, invocation: &MediaInvocation) -> Result<ProcessOutput, ProcessError> {
        let binary = self.binary(invocation.tool);
        tracing::debug!(
            tool = invocation.tool.as_str(),
            label = invocation.label,
            args = ?invocation.args,
            "Running media tool"
        );

        let child = Command::new(binary)
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ProcessError::NotFound {
                        tool: invocation.tool.as_str(),
                        path: binary.to_path_buf(),
                    }
                } else {
                    ProcessError::Io(e)
                }
            })?;

        // Dropping the future on timeout drops the child, which kills it.
        let output = match timeout(
            Duration::from_secs(self.timeout_secs),
            child.wait_with_output(),
        )
        .await
        {
            Ok(result) => result?,
            Err(_) => {
                metrics::MEDIA_PROCESS_RUNS
                    .with_label_values(&[invocation.label, "timeout"])
                    .inc();
                return Err(ProcessError::Timeout {
                    label: invocation.label,
                    timeout_secs: self.timeout_secs,
                });
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if !output.status.success() {
            metrics::MEDIA_PROCESS_RUNS
                .with_label_values(&[invocation.label, "error"])
                .inc();
            return Err(ProcessError::Failed {
                label: invocation.label,
                code: output.status.code(),
                stderr: stderr.trim().to_string(),
            });
        }

        metrics::MEDIA_PROCESS_RUNS
            .with_label_values(&[invocation.label, "success"])
            .inc();
        Ok(ProcessOutput { stdout, stderr })
    }
}

/// Build the ffprobe invocation that reports container format as JSON.
pub fn probe_invocation(path: &Path) -> MediaInvocation {
    MediaInvocation::ffprobe("probe")
        .args(["-v", "quiet", "-print_format", "json", "-show_format"])
        .path_arg(path)
}

/// Extract the container duration in seconds from ffprobe JSON output.
pub fn parse_probe_duration(output: &str) -> Result<f64, ProcessError> {
    #[derive(Deserialize)]
    struct ProbeOutput {
        format: ProbeFormat,
    }

    #[derive(Deserialize)]
    struct ProbeFormat {
        duration: Option<String>,
    }

    let probe: ProbeOutput = serde_json::from_str(output).map_err(|e| ProcessError::Parse {
        label: "probe",
        reason: e.to_string(),
    })?;

    probe
        .format
        .duration
        .as_deref()
        .and_then(|d| d.parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d > 0.0)
        .ok_or_else(|| ProcessError::Parse {
            label: "probe",
            reason: "missing or zero duration".to_string(),
        })
}

/// Probe a media file's duration.
pub async fn probe_duration(runner: &dyn MediaRunner, path: &Path) -> Result<f64, ProcessError> {
    let output = runner.run(&probe_invocation(path)).await?;
    parse_probe_duration(&output.stdout)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_probe_duration() {
        let json = r#"{
            "format": {
                "filename": "narration.mp3",
                "format_name": "mp3",
                "duration": "50.016000",
                "size": "801234"
            }
        }"#;
        let duration = parse_probe_duration(json).unwrap();
        assert!((duration - 50.016).abs() < 1e-9);
    }

    #[test]
    fn test_parse_probe_duration_missing() {
        let json = r#"{"format": {"filename": "x.mp3"}}"#;
        assert!(matches!(
            parse_probe_duration(json),
            Err(ProcessError::Parse { .. })
        ));

        let zero = r#"{"format": {"duration": "0.000000"}}"#;
        assert!(parse_probe_duration(zero).is_err());

        assert!(parse_probe_duration("not json").is_err());
    }

    #[test]
    fn test_invocation_builder() {
        let inv = MediaInvocation::ffmpeg("mux")
            .args(["-y", "-i"])
            .path_arg(Path::new("/tmp/in.mp4"))
            .arg("/tmp/out.mp4");
        assert_eq!(inv.tool, MediaTool::Ffmpeg);
        assert_eq!(inv.args, vec!["-y", "-i", "/tmp/in.mp4", "/tmp/out.mp4"]);
        assert_eq!(inv.output(), Some("/tmp/out.mp4"));
    }

    #[test]
    fn test_probe_invocation() {
        let inv = probe_invocation(Path::new("/tmp/a.mp3"));
        assert_eq!(inv.tool, MediaTool::Ffprobe);
        assert!(inv.args.contains(&"-show_format".to_string()));
        assert_eq!(inv.output(), Some("/tmp/a.mp3"));
    }

    #[tokio::test]
    async fn test_missing_binary() {
        let config = VideoConfig {
            ffmpeg_path: PathBuf::from("/nonexistent/ffmpeg-binary"),
            ..VideoConfig::default()
        };
        let runner = FfmpegRunner::new(&config);
        let err = runner
            .run(&MediaInvocation::ffmpeg("version").arg("-version"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProcessError::NotFound { tool: "ffmpeg", .. }));
    }
}
