//! Mock ffmpeg/ffprobe runner for testing.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::media::{MediaInvocation, MediaRunner, MediaTool, ProcessError, ProcessOutput};

/// Mock implementation of the [`MediaRunner`] trait.
///
/// ffmpeg runs write a placeholder file at the output path. ffprobe runs
/// answer with a per-file duration, falling back to a default; without
/// either the probe output has no duration and callers see a parse error.
///
/// # Example
///
/// ```rust,ignore
/// let runner = MockMediaRunner::new();
/// runner.set_probe_duration(Some(50.0)).await;
/// runner.fail_on("mux").await;
/// ```
#[derive(Debug, Default)]
pub struct MockMediaRunner {
    invocations: Arc<RwLock<Vec<MediaInvocation>>>,
    default_duration: Arc<RwLock<Option<f64>>>,
    file_durations: Arc<RwLock<HashMap<String, f64>>>,
    failing_labels: Arc<RwLock<HashSet<String>>>,
}

impl MockMediaRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Duration reported by ffprobe for files without their own setting.
    pub async fn set_probe_duration(&self, duration: Option<f64>) {
        *self.default_duration.write().await = duration;
    }

    /// Duration reported by ffprobe for files named `file_name`.
    pub async fn set_file_duration(&self, file_name: impl Into<String>, duration: f64) {
        self.file_durations
            .write()
            .await
            .insert(file_name.into(), duration);
    }

    /// Make every invocation with `label` fail.
    pub async fn fail_on(&self, label: impl Into<String>) {
        self.failing_labels.write().await.insert(label.into());
    }

    /// Invocations received, in order.
    pub async fn invocations(&self) -> Vec<MediaInvocation> {
        self.invocations.read().await.clone()
    }

    async fn probe_output(&self, path: &str) -> String {
        let file_name = Path::new(path)
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let duration = match self.file_durations.read().await.get(&file_name) {
            Some(d) => Some(*d),
            None => *self.default_duration.read().await,
        };
        match duration {
            Some(d) => format!(r#"{{"format": {{"filename": "{}", "duration": "{:.6}"}}}}"#, file_name, d),
            None => r#"{"format": {}}"#.to_string(),
        }
    }
}

#[async_trait]
impl MediaRunner for MockMediaRunner {
    async fn run(&self, invocation: &MediaInvocation) -> Result<ProcessOutput, ProcessError> {
        self.invocations.write().await.push(invocation.clone());

        if self.failing_labels.read().await.contains(invocation.label) {
            return Err(ProcessError::Failed {
                label: invocation.label,
                code: Some(1),
                stderr: "mock failure".to_string(),
            });
        }

        let output = invocation.output().unwrap_or_default();
        match invocation.tool {
            MediaTool::Ffprobe => Ok(ProcessOutput {
                stdout: self.probe_output(output).await,
                stderr: String::new(),
            }),
            MediaTool::Ffmpeg => {
                if !output.is_empty() {
                    tokio::fs::write(output, b"mock media").await?;
                }
                Ok(ProcessOutput::default())
            }
        }
    }
}
