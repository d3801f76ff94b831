//! Feed sources that supply ranked news candidates.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::collab::CollaboratorError;

/// A news item as reported by a feed, before filtering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedItem {
    pub title: String,
    pub url: String,
    pub score: i64,
}

impl FeedItem {
    pub fn new(title: impl Into<String>, url: impl Into<String>, score: i64) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            score,
        }
    }
}

/// A popularity-ranked news feed.
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Tag stored on topics from this source.
    fn name(&self) -> &str;

    /// Items scoring below this are discarded.
    fn min_score(&self) -> i64;

    async fn fetch(&self) -> Result<Vec<FeedItem>, CollaboratorError>;
}
