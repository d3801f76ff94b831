//! Multi-platform publishing of approved videos.

pub mod captions;

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;
use serde::Serialize;
use tracing::{info, warn};

use crate::collab::PlatformPublisher;
use crate::error::PipelineError;
use crate::metrics;
use crate::record::{Platform, RecordStore, ScriptChange, ScriptStatus, UploadResult};
use crate::storage::{AssetStore, StorageError};

pub use captions::{build_caption, fit_for, hashtags_for, Caption};

#[derive(Debug, Clone, Serialize)]
pub struct PublishOutcome {
    pub script_id: String,
    pub upload_results: BTreeMap<Platform, UploadResult>,
    pub published_platforms: Vec<Platform>,
    /// True when the script had already been published.
    pub reused: bool,
}

/// Requested platform names to platforms, in request order without
/// duplicates. `None` means every platform.
pub fn parse_platforms(names: Option<&[String]>) -> Result<Vec<Platform>, PipelineError> {
    let Some(names) = names else {
        return Ok(Platform::ALL.to_vec());
    };
    let mut platforms = Vec::new();
    for name in names {
        let platform: Platform = name.parse().map_err(PipelineError::validation)?;
        if !platforms.contains(&platform) {
            platforms.push(platform);
        }
    }
    if platforms.is_empty() {
        return Err(PipelineError::validation("platforms must not be empty"));
    }
    Ok(platforms)
}

pub struct Publisher {
    store: Arc<dyn RecordStore>,
    assets: Arc<dyn AssetStore>,
    publishers: HashMap<Platform, Arc<dyn PlatformPublisher>>,
    scratch_root: PathBuf,
}

impl Publisher {
    pub fn new(
        store: Arc<dyn RecordStore>,
        assets: Arc<dyn AssetStore>,
        publishers: Vec<Arc<dyn PlatformPublisher>>,
        scratch_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            store,
            assets,
            publishers: publishers.into_iter().map(|p| (p.platform(), p)).collect(),
            scratch_root: scratch_root.into(),
        }
    }

    /// Upload the approved video of `script_id` to each platform and mark the
    /// script published. Failed uploads are recorded, never retried.
    pub async fn publish(
        &self,
        script_id: &str,
        platforms: Option<&[String]>,
    ) -> Result<PublishOutcome, PipelineError> {
        let started = Instant::now();
        let result = self.publish_inner(script_id, platforms).await;
        let label = match &result {
            Ok(outcome) if outcome.reused => "noop",
            Ok(_) => "success",
            Err(_) => "error",
        };
        metrics::observe_stage("publish", label, started);
        result
    }

    async fn publish_inner(
        &self,
        script_id: &str,
        platforms: Option<&[String]>,
    ) -> Result<PublishOutcome, PipelineError> {
        let platforms = parse_platforms(platforms)?;
        if script_id.trim().is_empty() {
            return Err(PipelineError::validation("script_id is required"));
        }
        let script = self
            .store
            .get_script(script_id)?
            .ok_or_else(|| PipelineError::script_not_found(script_id))?;

        match script.status {
            ScriptStatus::Published => {
                info!(script_id = %script.id, "Already published");
                return Ok(PublishOutcome {
                    script_id: script.id,
                    upload_results: script.upload_results,
                    published_platforms: script.published_platforms,
                    reused: true,
                });
            }
            ScriptStatus::Approved => {}
            status => {
                return Err(PipelineError::precondition(format!(
                    "script {} is {}, only approved videos are published",
                    script.id, status
                )));
            }
        }
        let locator = script.video_locator().ok_or_else(|| {
            PipelineError::precondition(format!("script {} has no video", script.id))
        })?;

        tokio::fs::create_dir_all(&self.scratch_root)
            .await
            .map_err(StorageError::Io)?;
        let scratch = tempfile::Builder::new()
            .prefix("shorts-publish-")
            .tempdir_in(&self.scratch_root)
            .map_err(StorageError::Io)?;
        let video_path = scratch.path().join("video.mp4");
        self.assets.fetch_to(locator, &video_path).await?;

        let caption = build_caption(&script.topic_title, &script.text);
        let attempts = platforms
            .iter()
            .map(|platform| self.upload_one(*platform, &video_path, &caption));
        let results: BTreeMap<Platform, UploadResult> = join_all(attempts)
            .await
            .into_iter()
            .map(|r| (r.platform, r))
            .collect();

        // Request order, successful uploads only.
        let published: Vec<Platform> = platforms
            .iter()
            .copied()
            .filter(|p| results.get(p).is_some_and(|r| r.success))
            .collect();

        self.store.transition_script(
            &script.id,
            ScriptStatus::Approved,
            ScriptChange::to(ScriptStatus::Published)
                .with_publication(results.clone(), published.clone()),
        )?;

        info!(
            script_id = %script.id,
            attempted = platforms.len(),
            published = published.len(),
            "Published video"
        );
        Ok(PublishOutcome {
            script_id: script.id,
            upload_results: results,
            published_platforms: published,
            reused: false,
        })
    }

    async fn upload_one(&self, platform: Platform, video: &Path, caption: &Caption) -> UploadResult {
        let Some(publisher) = self.publishers.get(&platform) else {
            warn!(platform = %platform, "No publisher configured");
            metrics::UPLOADS
                .with_label_values(&[platform.as_str(), "unconfigured"])
                .inc();
            return UploadResult::failed(platform, format!("{} publisher is not configured", platform));
        };

        let metadata = fit_for(platform, caption);
        let started = Instant::now();
        let result = publisher.upload(video, &metadata).await;
        metrics::EXTERNAL_SERVICE_DURATION
            .with_label_values(&[platform.as_str()])
            .observe(started.elapsed().as_secs_f64());

        match result {
            Ok(external_id) => {
                metrics::UPLOADS
                    .with_label_values(&[platform.as_str(), "success"])
                    .inc();
                info!(platform = %platform, external_id = %external_id, "Upload succeeded");
                UploadResult::succeeded(platform, external_id)
            }
            Err(e) => {
                metrics::UPLOADS
                    .with_label_values(&[platform.as_str(), "error"])
                    .inc();
                warn!(platform = %platform, error = %e, "Upload failed");
                UploadResult::failed(platform, e.to_string())
            }
        }
    }
}
