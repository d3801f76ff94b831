//! Mock feed source for testing.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::collab::CollaboratorError;
use crate::collector::{FeedItem, FeedSource};

/// Mock implementation of the [`FeedSource`] trait.
#[derive(Debug)]
pub struct MockFeedSource {
    name: String,
    min_score: i64,
    items: Arc<RwLock<Vec<FeedItem>>>,
    next_error: Arc<RwLock<Option<CollaboratorError>>>,
}

impl MockFeedSource {
    pub fn new(name: impl Into<String>, min_score: i64) -> Self {
        Self {
            name: name.into(),
            min_score,
            items: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
        }
    }

    pub async fn set_items(&self, items: Vec<FeedItem>) {
        *self.items.write().await = items;
    }

    pub async fn set_next_error(&self, error: CollaboratorError) {
        *self.next_error.write().await = Some(error);
    }
}

#[async_trait]
impl FeedSource for MockFeedSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn min_score(&self) -> i64 {
        self.min_score
    }

    async fn fetch(&self) -> Result<Vec<FeedItem>, CollaboratorError> {
        if let Some(error) = self.next_error.write().await.take() {
            return Err(error);
        }
        Ok(self.items.read().await.clone())
    }
}
