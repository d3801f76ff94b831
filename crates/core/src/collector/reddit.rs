//! Reddit hot listings.

use async_trait::async_trait;
use serde::Deserialize;

use super::source::{FeedItem, FeedSource};
use crate::collab::{ensure_success, http_client, CollaboratorError};
use crate::config::RedditConfig;

pub struct RedditSource {
    client: reqwest::Client,
    config: RedditConfig,
}

impl RedditSource {
    pub fn new(config: RedditConfig) -> Self {
        Self {
            client: http_client(config.timeout_secs),
            config,
        }
    }

    fn listing_url(&self) -> String {
        format!(
            "{}/r/{}/hot.json",
            self.config.api_base.trim_end_matches('/'),
            self.config.subreddits
        )
    }
}

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<Child>,
}

#[derive(Debug, Deserialize)]
struct Child {
    data: Post,
}

#[derive(Debug, Deserialize)]
struct Post {
    title: String,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    permalink: Option<String>,
    #[serde(default)]
    score: i64,
    #[serde(default)]
    stickied: bool,
}

fn listing_to_items(listing: Listing) -> Vec<FeedItem> {
    listing
        .data
        .children
        .into_iter()
        .map(|c| c.data)
        .filter(|p| !p.stickied && !p.title.trim().is_empty())
        .map(|p| {
            let url = p
                .url
                .filter(|u| !u.is_empty())
                .or_else(|| p.permalink.map(|l| format!("https://www.reddit.com{}", l)))
                .unwrap_or_default();
            FeedItem::new(p.title.trim(), url, p.score)
        })
        .collect()
}

#[async_trait]
impl FeedSource for RedditSource {
    fn name(&self) -> &str {
        "reddit"
    }

    fn min_score(&self) -> i64 {
        self.config.min_score
    }

    async fn fetch(&self) -> Result<Vec<FeedItem>, CollaboratorError> {
        let limit = self.config.limit.to_string();
        let response = self
            .client
            .get(self.listing_url())
            .header(reqwest::header::USER_AGENT, &self.config.user_agent)
            .query(&[("limit", limit.as_str())])
            .send()
            .await?;
        let listing: Listing = ensure_success(response).await?.json().await?;
        Ok(listing_to_items(listing))
    }
}
