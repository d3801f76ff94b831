//! Background clip selection.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, warn};

use super::error::AssemblyError;
use crate::collab::{FootageQuery, FootageVideo, StockFootageSearch};
use crate::config::VideoConfig;
use crate::metrics;

/// A clip that passed the quality filter, with the file chosen for download.
#[derive(Debug, Clone, PartialEq)]
pub struct ClipCandidate {
    pub id: u64,
    pub width: u32,
    pub height: u32,
    pub duration: f64,
    pub url: String,
}

impl ClipCandidate {
    fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

/// A downloaded clip in scratch space.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedClip {
    pub id: u64,
    pub path: PathBuf,
    pub duration: f64,
}

#[derive(Debug, Clone)]
pub struct ClipSelection {
    pub clips: Vec<SelectedClip>,
    /// Sum of the declared durations of `clips`.
    pub total_duration: f64,
    pub target: f64,
}

/// Portrait, long enough, and offered in at least `min_height` resolution.
pub fn qualify(video: &FootageVideo, min_duration: f64, min_height: u32) -> Option<ClipCandidate> {
    if video.height <= video.width || video.duration < min_duration {
        return None;
    }
    let file = video
        .files
        .iter()
        .find(|f| f.height.is_some_and(|h| h >= min_height))?;
    Some(ClipCandidate {
        id: video.id,
        width: video.width,
        height: video.height,
        duration: video.duration,
        url: file.link.clone(),
    })
}

/// Highest resolution first; the sort is stable so ties keep search order.
pub fn rank_pool(pool: &mut [ClipCandidate]) {
    pool.sort_by(|a, b| b.area().cmp(&a.area()));
}

pub struct ClipSelector {
    footage: Arc<dyn StockFootageSearch>,
    per_page: u32,
    min_duration: f64,
    min_height: u32,
    fallback_query: String,
}

impl ClipSelector {
    pub fn new(footage: Arc<dyn StockFootageSearch>, per_page: u32, config: &VideoConfig) -> Self {
        Self {
            footage,
            per_page,
            min_duration: config.min_clip_duration_secs,
            min_height: config.min_clip_height,
            fallback_query: config.fallback_query.clone(),
        }
    }

    /// Qualifying clips for all queries, de-duplicated by id.
    async fn search_pool(&self, queries: &[String]) -> Vec<ClipCandidate> {
        let mut seen = HashSet::new();
        let mut pool = Vec::new();
        for query in queries {
            let results = match self
                .footage
                .search(&FootageQuery::portrait(query.as_str(), self.per_page))
                .await
            {
                Ok(results) => results,
                Err(e) => {
                    warn!(query = %query, error = %e, "Footage search failed");
                    continue;
                }
            };
            let before = pool.len();
            for video in &results {
                if let Some(candidate) = qualify(video, self.min_duration, self.min_height) {
                    if seen.insert(candidate.id) {
                        pool.push(candidate);
                    }
                }
            }
            info!(
                query = %query,
                found = results.len(),
                qualified = pool.len() - before,
                "Searched footage"
            );
        }
        pool
    }

    /// Search, rank and download clips covering `target` seconds into `dir`.
    pub async fn select(
        &self,
        keywords: &[String],
        target: f64,
        dir: &Path,
    ) -> Result<ClipSelection, AssemblyError> {
        let mut queries = keywords.to_vec();
        let mut pool = self.search_pool(&queries).await;
        if pool.is_empty() {
            warn!(
                keywords = ?keywords,
                fallback = %self.fallback_query,
                "No qualifying clips, retrying with fallback query"
            );
            let fallback = vec![self.fallback_query.clone()];
            pool = self.search_pool(&fallback).await;
            queries.extend(fallback);
        }
        if pool.is_empty() {
            return Err(AssemblyError::NoClips { queries });
        }

        rank_pool(&mut pool);

        // Greedy: stop as soon as the running total reaches the target.
        let mut clips = Vec::new();
        let mut total = 0.0;
        for candidate in &pool {
            if total >= target {
                break;
            }
            let path = dir.join(format!("clip_{:02}_{}.mp4", clips.len(), candidate.id));
            match self.footage.download(&candidate.url, &path).await {
                Ok(bytes) => {
                    metrics::CLIPS_DOWNLOADED.with_label_values(&["success"]).inc();
                    tracing::debug!(clip_id = candidate.id, bytes, "Downloaded clip");
                    total += candidate.duration;
                    clips.push(SelectedClip {
                        id: candidate.id,
                        path,
                        duration: candidate.duration,
                    });
                }
                Err(e) => {
                    metrics::CLIPS_DOWNLOADED.with_label_values(&["error"]).inc();
                    warn!(clip_id = candidate.id, error = %e, "Clip download failed, skipping");
                    let _ = tokio::fs::remove_file(&path).await;
                }
            }
        }

        if clips.is_empty() {
            return Err(AssemblyError::NoClips { queries });
        }
        if total < target {
            warn!(
                total = %format!("{:.1}", total),
                target = %format!("{:.1}", target),
                "Footage shorter than narration target, proceeding"
            );
        }

        info!(clips = clips.len(), total = %format!("{:.1}", total), "Selected clips");
        Ok(ClipSelection {
            clips,
            total_duration: total,
            target,
        })
    }
}
