//! Social platform uploads.

use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{ensure_success, http_client, CollaboratorError};
use crate::config::PlatformEndpointConfig;
use crate::record::Platform;

/// Caption data sent with an upload, already fitted to the platform.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostMetadata {
    pub title: String,
    pub description: String,
    pub hashtags: Vec<String>,
    /// Platform-specific extras (category id, privacy, ...).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra: Vec<(String, String)>,
}

/// Uploads a finished video to one platform.
#[async_trait]
pub trait PlatformPublisher: Send + Sync {
    fn platform(&self) -> Platform;

    /// Upload the video, returning the platform's id for the post.
    async fn upload(
        &self,
        video_path: &Path,
        metadata: &PostMetadata,
    ) -> Result<String, CollaboratorError>;
}

/// Multipart upload to a configured HTTP endpoint with a bearer token.
pub struct HttpPlatformPublisher {
    platform: Platform,
    client: reqwest::Client,
    config: PlatformEndpointConfig,
}

impl HttpPlatformPublisher {
    pub fn new(platform: Platform, config: PlatformEndpointConfig) -> Self {
        Self {
            platform,
            client: http_client(config.timeout_secs),
            config,
        }
    }
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    #[serde(alias = "video_id", alias = "media_id", alias = "publish_id")]
    id: String,
}

#[async_trait]
impl PlatformPublisher for HttpPlatformPublisher {
    fn platform(&self) -> Platform {
        self.platform
    }

    async fn upload(
        &self,
        video_path: &Path,
        metadata: &PostMetadata,
    ) -> Result<String, CollaboratorError> {
        let bytes = tokio::fs::read(video_path).await?;
        let metadata_json = serde_json::to_string(metadata)
            .map_err(|e| CollaboratorError::invalid_response(e.to_string()))?;

        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name("video.mp4")
            .mime_str("video/mp4")?;
        let form = reqwest::multipart::Form::new()
            .text("metadata", metadata_json)
            .part("video", part);

        let response = self
            .client
            .post(&self.config.upload_url)
            .bearer_auth(&self.config.access_token)
            .multipart(form)
            .send()
            .await?;
        let response = ensure_success(response).await?;
        let body: UploadResponse = response.json().await?;
        Ok(body.id)
    }
}
