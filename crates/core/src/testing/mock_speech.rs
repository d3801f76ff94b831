//! Mock speech synthesizer for testing.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::collab::{CollaboratorError, SpeechSynthesizer, SynthesizedSpeech};
use crate::config::VoiceProfile;

/// Mock implementation of the [`SpeechSynthesizer`] trait.
///
/// Returns a few placeholder bytes and, unless configured otherwise, no
/// reported duration so callers estimate it from the character count.
#[derive(Debug, Default)]
pub struct MockSpeechSynthesizer {
    duration: Arc<RwLock<Option<f64>>>,
    texts: Arc<RwLock<Vec<String>>>,
    next_error: Arc<RwLock<Option<CollaboratorError>>>,
}

impl MockSpeechSynthesizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Duration reported with each synthesis.
    pub async fn set_duration(&self, duration: Option<f64>) {
        *self.duration.write().await = duration;
    }

    pub async fn set_next_error(&self, error: CollaboratorError) {
        *self.next_error.write().await = Some(error);
    }

    /// Texts synthesized so far.
    pub async fn synthesized_texts(&self) -> Vec<String> {
        self.texts.read().await.clone()
    }
}

#[async_trait]
impl SpeechSynthesizer for MockSpeechSynthesizer {
    async fn synthesize(
        &self,
        text: &str,
        _voice: &VoiceProfile,
    ) -> Result<SynthesizedSpeech, CollaboratorError> {
        if let Some(error) = self.next_error.write().await.take() {
            return Err(error);
        }
        self.texts.write().await.push(text.to_string());
        Ok(SynthesizedSpeech {
            audio: b"ID3mock-mp3".to_vec(),
            duration_seconds: *self.duration.read().await,
        })
    }
}
