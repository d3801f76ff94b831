//! Narration script generation.

mod prompt;

pub use prompt::build_request;

use std::sync::{Arc, Mutex};
use std::time::Instant;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{info, warn};

use crate::collab::{CollaboratorError, TextGenerator};
use crate::config::ScriptConfig;
use crate::error::PipelineError;
use crate::metrics;
use crate::record::{NewScript, RecordStore, Script, ScriptMode, ScriptStats};

/// Text up to and including the first sentence terminator.
///
/// Without a terminator the whole text is returned with a `.` appended.
pub fn extract_hook(text: &str) -> String {
    let text = text.trim();
    match text.find(['.', '!', '?']) {
        Some(pos) => text[..=pos].trim().to_string(),
        None => format!("{}.", text),
    }
}

/// Provisional narration length for `chars` characters.
pub fn estimate_duration(chars: usize, seconds_per_char: f64) -> f64 {
    chars as f64 * seconds_per_char
}

/// Writes scripts for pending topics.
///
/// The mode comes from one uniform sample per script drawn from an injected
/// RNG, so a fixed seed reproduces the same sequence of modes.
pub struct ScriptGenerator {
    store: Arc<dyn RecordStore>,
    llm: Arc<dyn TextGenerator>,
    config: ScriptConfig,
    rng: Mutex<StdRng>,
}

impl ScriptGenerator {
    pub fn new(
        store: Arc<dyn RecordStore>,
        llm: Arc<dyn TextGenerator>,
        config: ScriptConfig,
    ) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            store,
            llm,
            config,
            rng: Mutex::new(rng),
        }
    }

    /// Replace the mode-selection RNG.
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = Mutex::new(rng);
        self
    }

    /// Forced mode wins; otherwise `sales` with the configured probability.
    pub fn select_mode(&self, forced: Option<ScriptMode>) -> ScriptMode {
        if let Some(mode) = forced {
            return mode;
        }
        let sample: f64 = {
            let mut rng = self.rng.lock().unwrap_or_else(|p| p.into_inner());
            rng.gen()
        };
        let mode = if sample < self.config.sales_probability {
            ScriptMode::Sales
        } else {
            ScriptMode::Info
        };
        info!(mode = %mode, sample = %format!("{:.2}", sample), "Selected script mode");
        mode
    }

    /// Generate and persist a script for `topic_id`.
    ///
    /// A topic that already has a script returns it unchanged.
    pub async fn generate(
        &self,
        topic_id: &str,
        forced: Option<ScriptMode>,
    ) -> Result<Script, PipelineError> {
        let started = Instant::now();
        let result = self.generate_inner(topic_id, forced).await;
        match &result {
            Ok((_, true)) => metrics::observe_stage("script", "noop", started),
            Ok((_, false)) => metrics::observe_stage("script", "success", started),
            Err(_) => metrics::observe_stage("script", "error", started),
        }
        result.map(|(script, _)| script)
    }

    async fn generate_inner(
        &self,
        topic_id: &str,
        forced: Option<ScriptMode>,
    ) -> Result<(Script, bool), PipelineError> {
        if topic_id.trim().is_empty() {
            return Err(PipelineError::validation("topic_id is required"));
        }

        let topic = self
            .store
            .get_topic(topic_id)?
            .ok_or_else(|| PipelineError::topic_not_found(topic_id))?;

        if let Some(existing) = self.store.find_script_by_topic(&topic.id)? {
            info!(topic_id = %topic.id, script_id = %existing.id, "Topic already has a script");
            return Ok((existing, true));
        }

        let mode = self.select_mode(forced);
        let request = build_request(mode, &topic.title, &self.config);
        let completion = self
            .llm
            .complete(request)
            .await
            .map_err(|e| PipelineError::collaborator("text generator", e))?;

        let text = completion.text.trim().to_string();
        if text.is_empty() {
            return Err(PipelineError::collaborator(
                "text generator",
                CollaboratorError::invalid_response("empty script"),
            ));
        }

        let word_count = text.chars().count();
        if word_count < self.config.min_length {
            warn!(
                topic_id = %topic.id,
                mode = %mode,
                chars = word_count,
                min = self.config.min_length,
                "Script is shorter than recommended"
            );
        }

        let script = self.store.create_script(NewScript {
            topic_id: topic.id.clone(),
            topic_title: topic.title.clone(),
            mode,
            hook: extract_hook(&text),
            word_count,
            estimated_duration: estimate_duration(word_count, self.config.seconds_per_char),
            text,
        })?;

        metrics::SCRIPTS_GENERATED
            .with_label_values(&[mode.as_str()])
            .inc();
        info!(
            script_id = %script.id,
            mode = %mode,
            chars = script.word_count,
            estimated_duration = %format!("{:.1}", script.estimated_duration),
            "Generated script"
        );
        Ok((script, false))
    }

    /// Mode split and per-mode averages across all scripts.
    pub fn stats(&self) -> Result<ScriptStats, PipelineError> {
        Ok(self.store.script_stats()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{NewTopic, ScriptStatus, SqliteRecordStore, TopicStatus};
    use crate::testing::MockTextGenerator;

    fn setup(
        config: ScriptConfig,
    ) -> (Arc<SqliteRecordStore>, Arc<MockTextGenerator>, ScriptGenerator) {
        let store = Arc::new(SqliteRecordStore::in_memory().unwrap());
        let llm = Arc::new(MockTextGenerator::new());
        let generator = ScriptGenerator::new(store.clone(), llm.clone(), config);
        (store, llm, generator)
    }

    fn topic(store: &SqliteRecordStore, title: &str) -> String {
        store
            .insert_topic(NewTopic {
                title: title.to_string(),
                url: "https://example.com".to_string(),
                score: 5000,
                source: "hackernews".to_string(),
            })
            .unwrap()
            .id
    }

    #[test]
    fn test_extract_hook() {
        assert_eq!(extract_hook("A. B. C."), "A.");
        assert_eq!(extract_hook("정말일까요? 네 맞습니다."), "정말일까요?");
        assert_eq!(extract_hook("  놀랍습니다! 그리고."), "놀랍습니다!");
        assert_eq!(extract_hook("terminator missing"), "terminator missing.");
    }

    #[test]
    fn test_estimate_duration() {
        assert!((estimate_duration(300, 0.15) - 45.0).abs() < 1e-9);
        assert_eq!(estimate_duration(0, 0.15), 0.0);
    }

    #[test]
    fn test_forced_mode_always_wins() {
        let config = ScriptConfig {
            sales_probability: 1.0,
            ..ScriptConfig::default()
        };
        let (_, _, generator) = setup(config);
        for _ in 0..50 {
            assert_eq!(generator.select_mode(Some(ScriptMode::Info)), ScriptMode::Info);
        }
    }

    #[test]
    fn test_sales_fraction_converges() {
        let (_, _, generator) = setup(ScriptConfig::default());
        let generator = generator.with_rng(StdRng::seed_from_u64(7));

        let trials = 10_000;
        let sales = (0..trials)
            .filter(|_| generator.select_mode(None) == ScriptMode::Sales)
            .count();
        let fraction = sales as f64 / trials as f64;
        assert!((fraction - 0.25).abs() < 0.02, "fraction was {}", fraction);
    }

    #[test]
    fn test_seed_reproduces_modes() {
        let config = ScriptConfig {
            seed: Some(42),
            ..ScriptConfig::default()
        };
        let (_, _, a) = setup(config.clone());
        let (_, _, b) = setup(config);
        let modes_a: Vec<_> = (0..20).map(|_| a.select_mode(None)).collect();
        let modes_b: Vec<_> = (0..20).map(|_| b.select_mode(None)).collect();
        assert_eq!(modes_a, modes_b);
    }

    #[tokio::test]
    async fn test_generate_persists_script_and_advances_topic() {
        let (store, llm, generator) = setup(ScriptConfig::default());
        let topic_id = topic(&store, "AI breakthrough");
        llm.push_response("  이 AI가 방금 의사 시험을 통과했습니다. 그런데 문제가 있습니다!  ")
            .await;

        let script = generator
            .generate(&topic_id, Some(ScriptMode::Info))
            .await
            .unwrap();

        assert_eq!(script.mode, ScriptMode::Info);
        assert_eq!(script.status, ScriptStatus::PendingAudio);
        assert_eq!(script.hook, "이 AI가 방금 의사 시험을 통과했습니다.");
        assert_eq!(script.word_count, script.text.chars().count());
        assert!(!script.text.starts_with(' '));
        assert!((script.estimated_duration - script.word_count as f64 * 0.15).abs() < 1e-9);

        let topic = store.get_topic(&topic_id).unwrap().unwrap();
        assert_eq!(topic.status, TopicStatus::ScriptGenerated);

        let requests = llm.requests().await;
        assert_eq!(requests.len(), 1);
        assert!(requests[0].prompt.contains("AI breakthrough"));
    }

    #[tokio::test]
    async fn test_generate_twice_returns_existing() {
        let (store, llm, generator) = setup(ScriptConfig::default());
        let topic_id = topic(&store, "Quantum chips");
        llm.push_response("첫 번째 스크립트입니다.").await;

        let first = generator.generate(&topic_id, None).await.unwrap();
        let second = generator.generate(&topic_id, None).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(llm.requests().await.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_topic() {
        let (_, _, generator) = setup(ScriptConfig::default());
        let err = generator.generate("nope", None).await.unwrap_err();
        assert!(matches!(err, PipelineError::NotFound { kind: "topic", .. }));

        let err = generator.generate("  ", None).await.unwrap_err();
        assert!(matches!(err, PipelineError::Validation(_)));
    }

    #[tokio::test]
    async fn test_llm_failure_persists_nothing() {
        let (store, llm, generator) = setup(ScriptConfig::default());
        let topic_id = topic(&store, "Robots");
        llm.set_next_error(CollaboratorError::Api {
            status: 503,
            message: "overloaded".into(),
        })
        .await;

        let err = generator.generate(&topic_id, None).await.unwrap_err();
        assert!(matches!(err, PipelineError::Collaborator { .. }));
        assert!(store.find_script_by_topic(&topic_id).unwrap().is_none());
        assert_eq!(
            store.get_topic(&topic_id).unwrap().unwrap().status,
            TopicStatus::Pending
        );
    }

    #[tokio::test]
    async fn test_empty_completion_is_collaborator_error() {
        let (store, llm, generator) = setup(ScriptConfig::default());
        let topic_id = topic(&store, "Robots");
        llm.push_response("   ").await;

        let err = generator.generate(&topic_id, None).await.unwrap_err();
        assert!(matches!(err, PipelineError::Collaborator { .. }));
        assert!(store.find_script_by_topic(&topic_id).unwrap().is_none());
    }
}
