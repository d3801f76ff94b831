//! Mock stock footage library for testing.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::collab::{CollaboratorError, FootageQuery, FootageVideo, StockFootageSearch};

/// A recorded download for test assertions.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedDownload {
    pub url: String,
    pub dest: PathBuf,
}

/// Mock implementation of the [`StockFootageSearch`] trait.
///
/// Search results are configured per query string; unknown queries return
/// nothing. Downloads write a small placeholder file unless the link was
/// marked as failing.
///
/// # Example
///
/// ```rust,ignore
/// let footage = MockFootageSearch::new();
/// footage.set_results("robot", vec![fixtures::footage_video(1, 1080, 1920, 12.0)]).await;
/// footage.fail_download("https://videos.example/1/hd.mp4").await;
/// ```
#[derive(Debug, Default)]
pub struct MockFootageSearch {
    results: Arc<RwLock<HashMap<String, Vec<FootageVideo>>>>,
    searches: Arc<RwLock<Vec<String>>>,
    downloads: Arc<RwLock<Vec<RecordedDownload>>>,
    failing_links: Arc<RwLock<HashSet<String>>>,
    next_error: Arc<RwLock<Option<CollaboratorError>>>,
}

impl MockFootageSearch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Results returned for an exact query string.
    pub async fn set_results(&self, query: impl Into<String>, videos: Vec<FootageVideo>) {
        self.results.write().await.insert(query.into(), videos);
    }

    /// Make downloads of `link` fail.
    pub async fn fail_download(&self, link: impl Into<String>) {
        self.failing_links.write().await.insert(link.into());
    }

    /// Make the next search fail with `error`.
    pub async fn set_next_error(&self, error: CollaboratorError) {
        *self.next_error.write().await = Some(error);
    }

    /// Queries searched so far, in order.
    pub async fn searches(&self) -> Vec<String> {
        self.searches.read().await.clone()
    }

    /// Successful downloads so far.
    pub async fn downloads(&self) -> Vec<RecordedDownload> {
        self.downloads.read().await.clone()
    }
}

#[async_trait]
impl StockFootageSearch for MockFootageSearch {
    async fn search(&self, query: &FootageQuery) -> Result<Vec<FootageVideo>, CollaboratorError> {
        self.searches.write().await.push(query.query.clone());
        if let Some(error) = self.next_error.write().await.take() {
            return Err(error);
        }
        Ok(self
            .results
            .read()
            .await
            .get(&query.query)
            .cloned()
            .unwrap_or_default())
    }

    async fn download(&self, url: &str, dest: &Path) -> Result<u64, CollaboratorError> {
        if self.failing_links.read().await.contains(url) {
            return Err(CollaboratorError::Api {
                status: 404,
                message: format!("mock download failure: {}", url),
            });
        }
        let bytes = format!("mock clip from {}", url).into_bytes();
        tokio::fs::write(dest, &bytes).await?;
        self.downloads.write().await.push(RecordedDownload {
            url: url.to_string(),
            dest: dest.to_path_buf(),
        });
        Ok(bytes.len() as u64)
    }
}
