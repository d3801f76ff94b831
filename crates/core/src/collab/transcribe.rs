//! Speech-to-text with segment timestamps.

use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{ensure_success, http_client, CollaboratorError};
use crate::config::TranscriberConfig;

/// One timed span of transcribed speech, in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

/// Produces timed segments for an audio file.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, audio_path: &Path)
        -> Result<Vec<TranscriptSegment>, CollaboratorError>;
}

/// OpenAI Whisper transcription endpoint.
pub struct WhisperClient {
    client: reqwest::Client,
    config: TranscriberConfig,
}

impl WhisperClient {
    pub fn new(config: TranscriberConfig) -> Self {
        Self {
            client: http_client(config.timeout_secs),
            config,
        }
    }
}

#[derive(Debug, Deserialize)]
struct VerboseTranscription {
    #[serde(default)]
    segments: Vec<TranscriptSegment>,
}

#[async_trait]
impl Transcriber for WhisperClient {
    async fn transcribe(
        &self,
        audio_path: &Path,
    ) -> Result<Vec<TranscriptSegment>, CollaboratorError> {
        let bytes = tokio::fs::read(audio_path).await?;
        let file_name = audio_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "audio.mp3".to_string());

        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("audio/mpeg")?;
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("model", self.config.model.clone())
            .text("language", self.config.language.clone())
            .text("response_format", "verbose_json")
            .text("timestamp_granularities[]", "segment");

        let response = self
            .client
            .post(format!(
                "{}/v1/audio/transcriptions",
                self.config.api_base.trim_end_matches('/')
            ))
            .bearer_auth(&self.config.api_key)
            .multipart(form)
            .send()
            .await?;
        let response = ensure_success(response).await?;
        let transcription: VerboseTranscription = response.json().await?;

        Ok(transcription
            .segments
            .into_iter()
            .map(|s| TranscriptSegment {
                text: s.text.trim().to_string(),
                ..s
            })
            .filter(|s| !s.text.is_empty())
            .collect())
    }
}
