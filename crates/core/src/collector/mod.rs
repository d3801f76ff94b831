//! Trending topic collection.
//!
//! Every configured [`FeedSource`] is polled concurrently. Each source's
//! candidates are filtered by its minimum score and trimmed to its best few,
//! then the survivors are merged and the overall top items are persisted as
//! pending topics.

mod hackernews;
mod reddit;
mod source;

pub use hackernews::HackerNewsSource;
pub use reddit::RedditSource;
pub use source::{FeedItem, FeedSource};

use std::sync::Arc;
use std::time::Instant;

use tracing::{info, warn};

use crate::config::CollectorConfig;
use crate::error::PipelineError;
use crate::metrics;
use crate::record::{NewTopic, RecordStore, Topic};

/// A candidate tagged with the source it came from.
#[derive(Debug, Clone, PartialEq)]
struct Candidate {
    source: String,
    item: FeedItem,
}

/// Keep items at or above `min_score`, best first, at most `limit`.
///
/// The sort is stable so equal scores keep feed order.
pub fn rank_items(mut items: Vec<FeedItem>, min_score: i64, limit: usize) -> Vec<FeedItem> {
    items.retain(|i| i.score >= min_score);
    items.sort_by(|a, b| b.score.cmp(&a.score));
    items.truncate(limit);
    items
}

pub struct TopicCollector {
    store: Arc<dyn RecordStore>,
    sources: Vec<Arc<dyn FeedSource>>,
    config: CollectorConfig,
}

impl TopicCollector {
    pub fn new(
        store: Arc<dyn RecordStore>,
        sources: Vec<Arc<dyn FeedSource>>,
        config: CollectorConfig,
    ) -> Self {
        Self {
            store,
            sources,
            config,
        }
    }

    /// Poll all sources and persist the top topics. A failing source is
    /// logged and contributes nothing.
    pub async fn collect(&self) -> Result<Vec<Topic>, PipelineError> {
        let started = Instant::now();

        let fetches: Vec<_> = self
            .sources
            .iter()
            .map(|source| async move {
                let result = source.fetch().await;
                (source.name().to_string(), source.min_score(), result)
            })
            .collect();

        let mut candidates = Vec::new();
        for (name, min_score, result) in futures::future::join_all(fetches).await {
            match result {
                Ok(items) => {
                    let ranked = rank_items(items, min_score, self.config.per_source_limit);
                    info!(source = %name, kept = ranked.len(), "Fetched feed");
                    candidates.extend(ranked.into_iter().map(|item| Candidate {
                        source: name.clone(),
                        item,
                    }));
                }
                Err(e) => {
                    warn!(source = %name, error = %e, "Feed source failed");
                    metrics::SOURCE_FAILURES.with_label_values(&[&name]).inc();
                }
            }
        }

        candidates.sort_by(|a, b| b.item.score.cmp(&a.item.score));
        candidates.truncate(self.config.max_topics);

        let mut topics = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let topic = self.store.insert_topic(NewTopic {
                title: candidate.item.title,
                url: candidate.item.url,
                score: candidate.item.score,
                source: candidate.source,
            });
            match topic {
                Ok(topic) => topics.push(topic),
                Err(e) => {
                    metrics::observe_stage("collect", "error", started);
                    return Err(e.into());
                }
            }
        }

        metrics::TOPICS_COLLECTED.inc_by(topics.len() as u64);
        metrics::observe_stage("collect", "success", started);
        info!(count = topics.len(), "Collected topics");
        Ok(topics)
    }
}
