//! Narration synthesis.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use serde::Serialize;
use tracing::info;

use crate::collab::SpeechSynthesizer;
use crate::config::TtsConfig;
use crate::error::PipelineError;
use crate::metrics;
use crate::record::{AudioAsset, RecordStore, ScriptChange, ScriptStatus};
use crate::storage::AssetStore;

/// Input to [`AudioSynthesizer::synthesize`].
#[derive(Debug, Clone, Default)]
pub struct AudioRequest {
    pub text: String,
    pub script_id: Option<String>,
    pub video_id: Option<String>,
}

/// A stored narration.
#[derive(Debug, Clone, Serialize)]
pub struct AudioOutcome {
    pub video_id: String,
    pub audio_url: String,
    pub asset: AudioAsset,
}

/// Narration length when the synthesizer reports none.
pub fn estimate_audio_duration(chars: usize, chars_per_second: f64) -> f64 {
    chars as f64 / chars_per_second
}

/// Ids become part of an asset key, so only a conservative character set
/// is accepted.
fn validate_video_id(id: &str) -> Result<(), PipelineError> {
    let valid = !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(PipelineError::validation(format!("invalid video_id: {:?}", id)))
    }
}

pub struct AudioSynthesizer {
    store: Arc<dyn RecordStore>,
    tts: Arc<dyn SpeechSynthesizer>,
    assets: Arc<dyn AssetStore>,
    config: TtsConfig,
}

impl AudioSynthesizer {
    pub fn new(
        store: Arc<dyn RecordStore>,
        tts: Arc<dyn SpeechSynthesizer>,
        assets: Arc<dyn AssetStore>,
        config: TtsConfig,
    ) -> Self {
        Self {
            store,
            tts,
            assets,
            config,
        }
    }

    /// Synthesize `request.text` and store it as `audio/{video_id}.mp3`.
    ///
    /// With a script id the script moves to `audio_ready`; a script that
    /// already has audio is re-synthesized in place.
    pub async fn synthesize(&self, request: AudioRequest) -> Result<AudioOutcome, PipelineError> {
        let started = Instant::now();
        let result = self.synthesize_inner(request).await;
        let label = if result.is_ok() { "success" } else { "error" };
        metrics::observe_stage("audio", label, started);
        result
    }

    async fn synthesize_inner(&self, request: AudioRequest) -> Result<AudioOutcome, PipelineError> {
        let text = request.text.trim();
        if text.is_empty() {
            return Err(PipelineError::validation("script_text is required"));
        }

        let script = match request.script_id.as_deref() {
            Some(id) => {
                let script = self
                    .store
                    .get_script(id)?
                    .ok_or_else(|| PipelineError::script_not_found(id))?;
                if !matches!(
                    script.status,
                    ScriptStatus::PendingAudio | ScriptStatus::AudioReady
                ) {
                    return Err(PipelineError::precondition(format!(
                        "script {} is {}; audio can only be generated before video assembly",
                        script.id, script.status
                    )));
                }
                Some(script)
            }
            None => None,
        };

        let video_id = request
            .video_id
            .or_else(|| request.script_id.clone())
            .unwrap_or_else(|| format!("video_{}", Utc::now().format("%Y%m%d_%H%M%S")));
        validate_video_id(&video_id)?;

        let voice = &self.config.voice;
        let speech = self
            .tts
            .synthesize(text, voice)
            .await
            .map_err(|e| PipelineError::collaborator("speech synthesizer", e))?;

        let character_count = text.chars().count();
        let duration = speech
            .duration_seconds
            .filter(|d| d.is_finite() && *d > 0.0)
            .unwrap_or_else(|| {
                estimate_audio_duration(character_count, self.config.chars_per_second)
            });

        let locator = self
            .assets
            .put(&format!("audio/{}.mp3", video_id), &speech.audio)
            .await?;

        let asset = AudioAsset {
            locator: locator.clone(),
            measured_duration_seconds: duration,
            character_count,
            cost_estimate: character_count as f64 * self.config.unit_cost,
            voice: voice.name.clone(),
        };

        if let Some(script) = script {
            self.store.transition_script(
                &script.id,
                script.status,
                ScriptChange::to(ScriptStatus::AudioReady)
                    .with_audio(asset.clone())
                    .at_revision(script.revision),
            )?;
        }

        info!(
            video_id = %video_id,
            chars = character_count,
            duration = %format!("{:.1}", duration),
            cost = %format!("{:.6}", asset.cost_estimate),
            "Synthesized narration"
        );

        Ok(AudioOutcome {
            audio_url: self.assets.public_url(&locator),
            video_id,
            asset,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collab::CollaboratorError;
    use crate::record::{ScriptMode, SqliteRecordStore};
    use crate::storage::LocalAssetStore;
    use crate::testing::{fixtures, MockSpeechSynthesizer};
    use tempfile::TempDir;

    struct Harness {
        _dir: TempDir,
        store: Arc<SqliteRecordStore>,
        tts: Arc<MockSpeechSynthesizer>,
        synthesizer: AudioSynthesizer,
    }

    fn harness() -> Harness {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(SqliteRecordStore::in_memory().unwrap());
        let tts = Arc::new(MockSpeechSynthesizer::new());
        let assets = Arc::new(LocalAssetStore::new(dir.path(), "http://test/assets"));
        let synthesizer =
            AudioSynthesizer::new(store.clone(), tts.clone(), assets, TtsConfig::default());
        Harness {
            _dir: dir,
            store,
            tts,
            synthesizer,
        }
    }

    #[tokio::test]
    async fn test_duration_and_cost_from_character_count() {
        let h = harness();
        let text = "가".repeat(300);
        let outcome = h
            .synthesizer
            .synthesize(AudioRequest {
                text,
                video_id: Some("v1".into()),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(outcome.video_id, "v1");
        assert_eq!(outcome.asset.locator, "audio/v1.mp3");
        assert_eq!(outcome.audio_url, "http://test/assets/audio/v1.mp3");
        assert_eq!(outcome.asset.character_count, 300);
        assert!((outcome.asset.measured_duration_seconds - 50.0).abs() < 1e-9);
        assert!((outcome.asset.cost_estimate - 0.0048).abs() < 1e-12);
        assert_eq!(outcome.asset.voice, "ko-KR-Neural2-A");
    }

    #[tokio::test]
    async fn test_reported_duration_wins() {
        let h = harness();
        h.tts.set_duration(Some(12.5)).await;
        let outcome = h
            .synthesizer
            .synthesize(AudioRequest {
                text: "짧은 문장입니다.".into(),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(outcome.asset.measured_duration_seconds, 12.5);
        assert!(outcome.video_id.starts_with("video_"));
    }

    #[tokio::test]
    async fn test_script_advances_to_audio_ready() {
        let h = harness();
        let script = fixtures::script(h.store.as_ref(), "AI breakthrough", ScriptMode::Info);

        let outcome = h
            .synthesizer
            .synthesize(AudioRequest {
                text: script.text.clone(),
                script_id: Some(script.id.clone()),
                video_id: None,
            })
            .await
            .unwrap();
        assert_eq!(outcome.video_id, script.id);

        let stored = h.store.get_script(&script.id).unwrap().unwrap();
        assert_eq!(stored.status, ScriptStatus::AudioReady);
        assert_eq!(stored.audio.unwrap().locator, format!("audio/{}.mp3", script.id));

        // Re-synthesis keeps the script at audio_ready
        h.synthesizer
            .synthesize(AudioRequest {
                text: script.text.clone(),
                script_id: Some(script.id.clone()),
                video_id: None,
            })
            .await
            .unwrap();
        let stored = h.store.get_script(&script.id).unwrap().unwrap();
        assert_eq!(stored.status, ScriptStatus::AudioReady);
        assert_eq!(h.tts.synthesized_texts().await.len(), 2);
    }

    #[tokio::test]
    async fn test_rejects_later_statuses() {
        let h = harness();
        let script = fixtures::script(h.store.as_ref(), "AI", ScriptMode::Info);
        fixtures::advance_to(h.store.as_ref(), &script.id, ScriptStatus::VideoReady);

        let err = h
            .synthesizer
            .synthesize(AudioRequest {
                text: "다시".into(),
                script_id: Some(script.id),
                video_id: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Precondition(_)));
    }

    #[tokio::test]
    async fn test_validation_and_not_found() {
        let h = harness();
        let err = h
            .synthesizer
            .synthesize(AudioRequest {
                text: "   ".into(),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Validation(_)));

        let err = h
            .synthesizer
            .synthesize(AudioRequest {
                text: "hi".into(),
                script_id: Some("missing".into()),
                video_id: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::NotFound { .. }));

        let err = h
            .synthesizer
            .synthesize(AudioRequest {
                text: "hi".into(),
                video_id: Some("../etc".into()),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Validation(_)));
    }

    #[tokio::test]
    async fn test_synthesis_failure_leaves_record_untouched() {
        let h = harness();
        let script = fixtures::script(h.store.as_ref(), "AI", ScriptMode::Sales);
        h.tts
            .set_next_error(CollaboratorError::Api {
                status: 500,
                message: "internal".into(),
            })
            .await;

        let err = h
            .synthesizer
            .synthesize(AudioRequest {
                text: script.text.clone(),
                script_id: Some(script.id.clone()),
                video_id: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Collaborator { .. }));

        let stored = h.store.get_script(&script.id).unwrap().unwrap();
        assert_eq!(stored.status, ScriptStatus::PendingAudio);
        assert!(stored.audio.is_none());
    }
}
