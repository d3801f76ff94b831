//! External services the pipeline talks to.
//!
//! Each service sits behind a narrow async trait so stages receive injected
//! `Arc<dyn Trait>` handles and tests can swap in the mocks from
//! [`crate::testing`].

mod footage;
mod llm;
mod notify;
mod platform;
mod speech;
mod transcribe;

pub use footage::{
    FootageFile, FootageQuery, FootageVideo, Orientation, PexelsClient, StockFootageSearch,
};
pub use llm::{
    create_text_generator, AnthropicClient, Completion, CompletionRequest, OpenAiClient,
    TextGenerator, TokenUsage,
};
pub use notify::{ApprovalNotification, ApprovalNotifier, WebhookNotifier};
pub use platform::{HttpPlatformPublisher, PlatformPublisher, PostMetadata};
pub use speech::{GoogleTtsClient, SpeechSynthesizer, SynthesizedSpeech};
pub use transcribe::{TranscriptSegment, Transcriber, WhisperClient};

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::VoiceProfile;
use crate::record::Platform;

/// Failure of an external service call.
#[derive(Debug, Error)]
pub enum CollaboratorError {
    /// The service has no configuration (missing API key or endpoint).
    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// The service answered but the payload was unusable.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CollaboratorError {
    pub fn invalid_response(reason: impl Into<String>) -> Self {
        Self::InvalidResponse(reason.into())
    }

    /// Whether re-invoking the stage could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(_) | Self::Timeout(_) | Self::Io(_) => true,
            Self::Api { status, .. } => *status == 429 || *status >= 500,
            Self::NotConfigured(_) | Self::InvalidResponse(_) => false,
        }
    }
}

impl From<reqwest::Error> for CollaboratorError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::InvalidResponse(e.to_string())
        } else {
            Self::Http(e.to_string())
        }
    }
}

/// Turn a non-success response into [`CollaboratorError::Api`].
pub(crate) async fn ensure_success(
    response: reqwest::Response,
) -> Result<reqwest::Response, CollaboratorError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    Err(CollaboratorError::Api {
        status: status.as_u16(),
        message,
    })
}

pub(crate) fn http_client(timeout_secs: u64) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .unwrap_or_default()
}

/// Stand-in for a service that has no configuration.
///
/// Every call fails with [`CollaboratorError::NotConfigured`], which lets the
/// server start with partial credentials and lets stages with a fallback
/// (keywords, subtitles) degrade instead of failing.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unconfigured;

#[async_trait]
impl TextGenerator for Unconfigured {
    fn provider(&self) -> &str {
        "none"
    }

    fn model(&self) -> &str {
        "none"
    }

    async fn complete(&self, _request: CompletionRequest) -> Result<Completion, CollaboratorError> {
        Err(CollaboratorError::NotConfigured("text generator"))
    }
}

#[async_trait]
impl SpeechSynthesizer for Unconfigured {
    async fn synthesize(
        &self,
        _text: &str,
        _voice: &VoiceProfile,
    ) -> Result<SynthesizedSpeech, CollaboratorError> {
        Err(CollaboratorError::NotConfigured("speech synthesizer"))
    }
}

#[async_trait]
impl Transcriber for Unconfigured {
    async fn transcribe(
        &self,
        _audio_path: &Path,
    ) -> Result<Vec<TranscriptSegment>, CollaboratorError> {
        Err(CollaboratorError::NotConfigured("transcriber"))
    }
}

#[async_trait]
impl StockFootageSearch for Unconfigured {
    async fn search(&self, _query: &FootageQuery) -> Result<Vec<FootageVideo>, CollaboratorError> {
        Err(CollaboratorError::NotConfigured("stock footage search"))
    }

    async fn download(&self, _url: &str, _dest: &Path) -> Result<u64, CollaboratorError> {
        Err(CollaboratorError::NotConfigured("stock footage search"))
    }
}

#[async_trait]
impl ApprovalNotifier for Unconfigured {
    async fn notify(
        &self,
        _notification: &ApprovalNotification,
    ) -> Result<String, CollaboratorError> {
        Err(CollaboratorError::NotConfigured("approval notifier"))
    }
}

/// Publisher for a platform without an upload endpoint.
#[derive(Debug, Clone, Copy)]
pub struct UnconfiguredPlatform(pub Platform);

#[async_trait]
impl PlatformPublisher for UnconfiguredPlatform {
    fn platform(&self) -> Platform {
        self.0
    }

    async fn upload(
        &self,
        _video_path: &Path,
        _metadata: &PostMetadata,
    ) -> Result<String, CollaboratorError> {
        Err(CollaboratorError::NotConfigured("platform publisher"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(CollaboratorError::Http("reset".into()).is_retryable());
        assert!(CollaboratorError::Api {
            status: 503,
            message: String::new()
        }
        .is_retryable());
        assert!(!CollaboratorError::Api {
            status: 401,
            message: String::new()
        }
        .is_retryable());
        assert!(!CollaboratorError::NotConfigured("x").is_retryable());
    }

    #[tokio::test]
    async fn test_unconfigured_reports_service() {
        let err = Unconfigured
            .complete(CompletionRequest::new("hi"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "text generator is not configured");

        let err = UnconfiguredPlatform(Platform::Tiktok)
            .upload(Path::new("/tmp/x.mp4"), &PostMetadata::default())
            .await
            .unwrap_err();
        assert!(matches!(err, CollaboratorError::NotConfigured(_)));
    }
}
