//! Mock transcriber for testing.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::collab::{CollaboratorError, TranscriptSegment, Transcriber};

/// Mock implementation of the [`Transcriber`] trait.
///
/// Returns the configured segments, which are empty by default.
#[derive(Debug, Default)]
pub struct MockTranscriber {
    segments: Arc<RwLock<Vec<TranscriptSegment>>>,
    calls: Arc<RwLock<Vec<PathBuf>>>,
    next_error: Arc<RwLock<Option<CollaboratorError>>>,
}

impl MockTranscriber {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_segments(&self, segments: Vec<TranscriptSegment>) {
        *self.segments.write().await = segments;
    }

    pub async fn set_next_error(&self, error: CollaboratorError) {
        *self.next_error.write().await = Some(error);
    }

    /// Audio files transcribed so far.
    pub async fn calls(&self) -> Vec<PathBuf> {
        self.calls.read().await.clone()
    }
}

#[async_trait]
impl Transcriber for MockTranscriber {
    async fn transcribe(
        &self,
        audio_path: &Path,
    ) -> Result<Vec<TranscriptSegment>, CollaboratorError> {
        self.calls.write().await.push(audio_path.to_path_buf());
        if let Some(error) = self.next_error.write().await.take() {
            return Err(error);
        }
        Ok(self.segments.read().await.clone())
    }
}
