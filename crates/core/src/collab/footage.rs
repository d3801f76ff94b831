//! Stock footage search and download.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;

use super::{ensure_success, http_client, CollaboratorError};
use crate::config::FootageConfig;

/// Requested frame orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    Portrait,
    Landscape,
    Square,
}

impl Orientation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Orientation::Portrait => "portrait",
            Orientation::Landscape => "landscape",
            Orientation::Square => "square",
        }
    }
}

/// A footage search.
#[derive(Debug, Clone, PartialEq)]
pub struct FootageQuery {
    pub query: String,
    pub orientation: Orientation,
    pub per_page: u32,
}

impl FootageQuery {
    pub fn portrait(query: impl Into<String>, per_page: u32) -> Self {
        Self {
            query: query.into(),
            orientation: Orientation::Portrait,
            per_page,
        }
    }
}

/// One downloadable encoding of a video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FootageFile {
    #[serde(default)]
    pub quality: Option<String>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    pub link: String,
}

/// A video returned by a footage search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FootageVideo {
    pub id: u64,
    pub width: u32,
    pub height: u32,
    /// Declared length in seconds.
    pub duration: f64,
    #[serde(rename = "video_files", default)]
    pub files: Vec<FootageFile>,
}

/// Searches a stock footage library and fetches clips.
#[async_trait]
pub trait StockFootageSearch: Send + Sync {
    async fn search(&self, query: &FootageQuery) -> Result<Vec<FootageVideo>, CollaboratorError>;

    /// Download `url` to `dest`, returning the byte count.
    async fn download(&self, url: &str, dest: &Path) -> Result<u64, CollaboratorError>;
}

/// Pexels video API client.
pub struct PexelsClient {
    client: reqwest::Client,
    download_client: reqwest::Client,
    config: FootageConfig,
}

impl PexelsClient {
    pub fn new(config: FootageConfig) -> Self {
        let download_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.download_timeout_secs))
            .build()
            .unwrap_or_default();
        Self {
            client: http_client(config.timeout_secs),
            download_client,
            config,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    videos: Vec<FootageVideo>,
}

#[async_trait]
impl StockFootageSearch for PexelsClient {
    async fn search(&self, query: &FootageQuery) -> Result<Vec<FootageVideo>, CollaboratorError> {
        let per_page = query.per_page.to_string();
        let response = self
            .client
            .get(format!(
                "{}/videos/search",
                self.config.api_base.trim_end_matches('/')
            ))
            .header("Authorization", &self.config.api_key)
            .query(&[
                ("query", query.query.as_str()),
                ("orientation", query.orientation.as_str()),
                ("size", "medium"),
                ("per_page", per_page.as_str()),
            ])
            .send()
            .await?;
        let response = ensure_success(response).await?;
        let body: SearchResponse = response.json().await?;
        Ok(body.videos)
    }

    async fn download(&self, url: &str, dest: &Path) -> Result<u64, CollaboratorError> {
        let response = self.download_client.get(url).send().await?;
        let mut response = ensure_success(response).await?;

        let mut file = tokio::fs::File::create(dest).await?;
        let mut written = 0u64;
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        if written == 0 {
            return Err(CollaboratorError::invalid_response("empty download"));
        }
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_search_response() {
        let json = r#"{
            "page": 1,
            "per_page": 15,
            "videos": [{
                "id": 857195,
                "width": 1080,
                "height": 1920,
                "duration": 14,
                "url": "https://www.pexels.com/video/857195/",
                "video_files": [
                    {"id": 1, "quality": "sd", "file_type": "video/mp4", "width": 540, "height": 960, "link": "https://cdn.example/sd.mp4"},
                    {"id": 2, "quality": "hd", "file_type": "video/mp4", "width": 1080, "height": 1920, "link": "https://cdn.example/hd.mp4"},
                    {"id": 3, "quality": null, "file_type": "video/mp4", "width": null, "height": null, "link": "https://cdn.example/hls"}
                ]
            }]
        }"#;
        let parsed: SearchResponse = serde_json::from_str(json).unwrap();
        let video = &parsed.videos[0];
        assert_eq!(video.id, 857195);
        assert_eq!(video.duration, 14.0);
        assert_eq!(video.files.len(), 3);
        assert_eq!(video.files[1].height, Some(1920));
        assert_eq!(video.files[2].quality, None);
    }

    #[test]
    fn test_portrait_query() {
        let query = FootageQuery::portrait("robot", 15);
        assert_eq!(query.orientation.as_str(), "portrait");
        assert_eq!(query.per_page, 15);
    }
}
