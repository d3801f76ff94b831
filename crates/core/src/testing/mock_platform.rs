//! Mock platform publisher for testing.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::collab::{CollaboratorError, PlatformPublisher, PostMetadata};
use crate::record::Platform;

/// Mock implementation of the [`PlatformPublisher`] trait for one platform.
#[derive(Debug)]
pub struct MockPlatformPublisher {
    platform: Platform,
    uploads: Arc<RwLock<Vec<PostMetadata>>>,
    next_error: Arc<RwLock<Option<CollaboratorError>>>,
}

impl MockPlatformPublisher {
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            uploads: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
        }
    }

    pub async fn set_next_error(&self, error: CollaboratorError) {
        *self.next_error.write().await = Some(error);
    }

    /// Metadata of each successful upload.
    pub async fn uploads(&self) -> Vec<PostMetadata> {
        self.uploads.read().await.clone()
    }
}

#[async_trait]
impl PlatformPublisher for MockPlatformPublisher {
    fn platform(&self) -> Platform {
        self.platform
    }

    async fn upload(
        &self,
        video_path: &Path,
        metadata: &PostMetadata,
    ) -> Result<String, CollaboratorError> {
        if let Some(error) = self.next_error.write().await.take() {
            return Err(error);
        }
        if !video_path.is_file() {
            return Err(CollaboratorError::invalid_response(format!(
                "video not found: {}",
                video_path.display()
            )));
        }
        let mut uploads = self.uploads.write().await;
        uploads.push(metadata.clone());
        Ok(format!("{}-post-{}", self.platform, uploads.len()))
    }
}
