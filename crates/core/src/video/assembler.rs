//! End-to-end video assembly for one script.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tempfile::TempDir;
use tracing::{info, warn};

use super::clips::ClipSelector;
use super::compositor::Compositor;
use super::error::AssemblyError;
use super::fonts::locate_font;
use super::keywords::KeywordExtractor;
use super::subtitles::{render_srt, SubtitleSynchronizer};
use crate::collab::{StockFootageSearch, TextGenerator, Transcriber};
use crate::config::VideoConfig;
use crate::error::PipelineError;
use crate::media::{probe_duration, MediaRunner};
use crate::metrics;
use crate::record::{RecordStore, Script, ScriptChange, ScriptStatus, VideoAsset};
use crate::storage::AssetStore;

/// Footage results requested per keyword.
pub const DEFAULT_PER_PAGE: u32 = 15;

/// External services used during assembly.
pub struct AssemblyServices {
    pub llm: Arc<dyn TextGenerator>,
    pub footage: Arc<dyn StockFootageSearch>,
    pub transcriber: Arc<dyn Transcriber>,
    pub runner: Arc<dyn MediaRunner>,
}

/// A rendered video for a script.
#[derive(Debug, Clone, Serialize)]
pub struct VideoOutcome {
    pub script_id: String,
    pub video_url: String,
    pub asset: VideoAsset,
    /// True when the script already had a video and nothing was rendered.
    pub reused: bool,
}

pub struct VideoAssembler {
    store: Arc<dyn RecordStore>,
    assets: Arc<dyn AssetStore>,
    runner: Arc<dyn MediaRunner>,
    keywords: KeywordExtractor,
    clips: ClipSelector,
    subtitles: SubtitleSynchronizer,
    compositor: Compositor,
    config: VideoConfig,
}

impl VideoAssembler {
    pub fn new(
        store: Arc<dyn RecordStore>,
        assets: Arc<dyn AssetStore>,
        services: AssemblyServices,
        config: VideoConfig,
    ) -> Self {
        Self::with_per_page(store, assets, services, config, DEFAULT_PER_PAGE)
    }

    pub fn with_per_page(
        store: Arc<dyn RecordStore>,
        assets: Arc<dyn AssetStore>,
        services: AssemblyServices,
        config: VideoConfig,
        per_page: u32,
    ) -> Self {
        Self {
            keywords: KeywordExtractor::new(
                services.llm,
                config.keyword_temperature,
                config.keyword_max_tokens,
            ),
            clips: ClipSelector::new(services.footage, per_page, &config),
            subtitles: SubtitleSynchronizer::new(services.transcriber),
            compositor: Compositor::new(services.runner.clone(), config.clone()),
            runner: services.runner,
            store,
            assets,
            config,
        }
    }

    /// Render the video for `script_id` and move the script to `video_ready`.
    ///
    /// A script already at `video_ready` returns its existing video.
    pub async fn assemble(&self, script_id: &str) -> Result<VideoOutcome, PipelineError> {
        let started = Instant::now();
        let result = self.assemble_inner(script_id).await;
        let label = match &result {
            Ok(outcome) if outcome.reused => "noop",
            Ok(_) => "success",
            Err(_) => "error",
        };
        metrics::observe_stage("video", label, started);
        result
    }

    async fn assemble_inner(&self, script_id: &str) -> Result<VideoOutcome, PipelineError> {
        if script_id.trim().is_empty() {
            return Err(PipelineError::validation("script_id is required"));
        }
        let script = self
            .store
            .get_script(script_id)?
            .ok_or_else(|| PipelineError::script_not_found(script_id))?;

        match script.status {
            ScriptStatus::AudioReady => {}
            ScriptStatus::VideoReady => {
                if let Some(video) = script.video.clone().filter(|v| !v.locator.is_empty()) {
                    info!(script_id = %script.id, "Video already assembled");
                    return Ok(VideoOutcome {
                        script_id: script.id,
                        video_url: self.assets.public_url(&video.locator),
                        asset: video,
                        reused: true,
                    });
                }
                return Err(PipelineError::precondition(format!(
                    "script {} is video_ready without a video",
                    script.id
                )));
            }
            other => {
                return Err(PipelineError::precondition(format!(
                    "script {} is {}, expected audio_ready",
                    script.id, other
                )));
            }
        }

        if script.text.trim().is_empty() {
            return Err(PipelineError::precondition(format!(
                "script {} has no text",
                script.id
            )));
        }
        let (audio_locator, measured_duration) = match &script.audio {
            Some(audio) if !audio.locator.is_empty() => {
                (audio.locator.clone(), audio.measured_duration_seconds)
            }
            _ => {
                return Err(PipelineError::precondition(format!(
                    "script {} has no audio",
                    script.id
                )))
            }
        };

        // Removed on drop, whichever way this function returns.
        let scratch = self.scratch_dir().await?;
        let asset = self
            .render(&script, &audio_locator, measured_duration, scratch.path())
            .await?;

        self.store.transition_script(
            &script.id,
            ScriptStatus::AudioReady,
            ScriptChange::to(ScriptStatus::VideoReady)
                .with_video(asset.clone())
                .at_revision(script.revision),
        )?;

        info!(
            script_id = %script.id,
            duration = %format!("{:.1}", asset.duration),
            clips = asset.clip_count,
            subtitles = asset.subtitle_source.as_str(),
            "Assembled video"
        );
        Ok(VideoOutcome {
            script_id: script.id,
            video_url: self.assets.public_url(&asset.locator),
            asset,
            reused: false,
        })
    }

    async fn scratch_dir(&self) -> Result<TempDir, AssemblyError> {
        tokio::fs::create_dir_all(&self.config.temp_dir)
            .await
            .map_err(AssemblyError::Scratch)?;
        tempfile::Builder::new()
            .prefix("shorts-video-")
            .tempdir_in(&self.config.temp_dir)
            .map_err(AssemblyError::Scratch)
    }

    async fn render(
        &self,
        script: &Script,
        audio_locator: &str,
        measured_duration: f64,
        scratch: &Path,
    ) -> Result<VideoAsset, AssemblyError> {
        let audio_path = scratch.join("narration.mp3");
        self.assets
            .fetch_to(audio_locator, &audio_path)
            .await
            .map_err(|e| AssemblyError::AudioUnavailable(e.to_string()))?;

        let duration = match probe_duration(self.runner.as_ref(), &audio_path).await {
            Ok(d) => d,
            Err(e) => {
                warn!(error = %e, fallback = measured_duration, "Audio probe failed, using measured duration");
                measured_duration
            }
        };

        let (keywords, _) = self.keywords.extract(&script.text).await;

        let target = duration + self.config.duration_buffer_secs;
        let selection = self.clips.select(&keywords, target, scratch).await?;

        let background = self
            .compositor
            .compose_background(&selection.clips, duration, scratch)
            .await?;

        let (entries, subtitle_source) = self
            .subtitles
            .synchronize(&audio_path, &script.text, duration)
            .await;
        let srt_path = scratch.join("subtitles.srt");
        tokio::fs::write(&srt_path, render_srt(&entries))
            .await
            .map_err(|e| AssemblyError::Subtitles(e.to_string()))?;

        let font = locate_font(&self.config.preferred_fonts, &self.config.fallback_fonts);
        match &font {
            Some(f) if f.degraded => {
                warn!(font = %f.path.display(), "No CJK font found, Hangul may not render");
                metrics::DEGRADED_FONT_RENDERS.inc();
            }
            None => {
                warn!("No subtitle font found, using renderer default");
                metrics::DEGRADED_FONT_RENDERS.inc();
            }
            Some(_) => {}
        }

        let output = scratch.join("final.mp4");
        self.compositor
            .mux(&background, &audio_path, &srt_path, font.as_ref(), &output)
            .await?;

        let final_duration = probe_duration(self.runner.as_ref(), &output)
            .await
            .unwrap_or(duration);

        let locator = self
            .assets
            .put_file(&format!("videos/{}.mp4", script.id), &output)
            .await
            .map_err(AssemblyError::Upload)?;

        Ok(VideoAsset {
            locator,
            duration: final_duration,
            keywords,
            clip_count: selection.clips.len(),
            subtitle_source,
            font_degraded: font.as_ref().map_or(true, |f| f.degraded),
            font_path: font.map(|f| f.path),
        })
    }
}
