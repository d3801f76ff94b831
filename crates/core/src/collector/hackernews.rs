//! Hacker News front page via the Firebase API.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::source::{FeedItem, FeedSource};
use crate::collab::{ensure_success, http_client, CollaboratorError};
use crate::config::HackerNewsConfig;

pub struct HackerNewsSource {
    client: reqwest::Client,
    config: HackerNewsConfig,
}

impl HackerNewsSource {
    pub fn new(config: HackerNewsConfig) -> Self {
        Self {
            client: http_client(config.timeout_secs),
            config,
        }
    }

    fn base(&self) -> &str {
        self.config.api_base.trim_end_matches('/')
    }

    async fn fetch_item(&self, id: u64) -> Result<Option<FeedItem>, CollaboratorError> {
        let response = self
            .client
            .get(format!("{}/item/{}.json", self.base(), id))
            .send()
            .await?;
        let item: Option<HnItem> = ensure_success(response).await?.json().await?;
        Ok(item.and_then(|item| item.into_feed_item(id)))
    }
}

#[derive(Debug, Deserialize)]
struct HnItem {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    score: i64,
    #[serde(default)]
    dead: bool,
    #[serde(default)]
    deleted: bool,
}

impl HnItem {
    fn into_feed_item(self, id: u64) -> Option<FeedItem> {
        if self.dead || self.deleted {
            return None;
        }
        let title = self.title.filter(|t| !t.trim().is_empty())?;
        // Ask HN and similar posts have no external link.
        let url = self
            .url
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| format!("https://news.ycombinator.com/item?id={}", id));
        Some(FeedItem::new(title.trim(), url, self.score))
    }
}

#[async_trait]
impl FeedSource for HackerNewsSource {
    fn name(&self) -> &str {
        "hackernews"
    }

    fn min_score(&self) -> i64 {
        self.config.min_score
    }

    async fn fetch(&self) -> Result<Vec<FeedItem>, CollaboratorError> {
        let response = self
            .client
            .get(format!("{}/topstories.json", self.base()))
            .send()
            .await?;
        let ids: Vec<u64> = ensure_success(response).await?.json().await?;

        let item_futures: Vec<_> = ids
            .into_iter()
            .take(self.config.story_limit)
            .map(|id| async move { (id, self.fetch_item(id).await) })
            .collect();

        let mut items = Vec::new();
        for (id, result) in futures::future::join_all(item_futures).await {
            match result {
                Ok(Some(item)) => items.push(item),
                Ok(None) => {}
                Err(e) => debug!(id, error = %e, "Skipping Hacker News item"),
            }
        }
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_without_url_links_to_discussion() {
        let json = r#"{"id": 42, "title": "Ask HN: Rust?", "score": 150, "type": "story"}"#;
        let item: HnItem = serde_json::from_str(json).unwrap();
        let feed = item.into_feed_item(42).unwrap();
        assert_eq!(feed.url, "https://news.ycombinator.com/item?id=42");
        assert_eq!(feed.score, 150);
    }

    #[test]
    fn test_dead_or_untitled_items_skipped() {
        let dead: HnItem =
            serde_json::from_str(r#"{"title": "x", "score": 500, "dead": true}"#).unwrap();
        assert!(dead.into_feed_item(1).is_none());

        let untitled: HnItem = serde_json::from_str(r#"{"score": 500}"#).unwrap();
        assert!(untitled.into_feed_item(2).is_none());
    }
}
