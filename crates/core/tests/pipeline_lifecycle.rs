//! Pipeline lifecycle integration tests.
//!
//! These tests drive one topic through every stage with mock collaborators:
//! - Collection and script generation
//! - Narration and video assembly (mock ffmpeg, mock footage)
//! - The approval gate and its idempotency rules
//! - Publishing and failure isolation

use std::sync::Arc;

use async_trait::async_trait;
use tempfile::TempDir;

use shorts_core::{
    approval::{ApprovalGate, DecisionOutcome, ReviewOverrides},
    audio::{AudioRequest, AudioSynthesizer},
    collab::{CollaboratorError, Completion, CompletionRequest, PlatformPublisher, TextGenerator, TokenUsage},
    collector::{FeedItem, FeedSource, TopicCollector},
    config::{ApprovalConfig, CollectorConfig, ScriptConfig, TtsConfig, VideoConfig},
    error::PipelineError,
    publisher::Publisher,
    record::{
        ApprovalStatus, AudioAsset, Platform, RecordStore, ScriptChange, ScriptMode, ScriptStatus,
        SqliteRecordStore, SubtitleSource,
    },
    script::ScriptGenerator,
    storage::LocalAssetStore,
    testing::{
        fixtures, MockFeedSource, MockFootageSearch, MockMediaRunner, MockNotifier,
        MockPlatformPublisher, MockSpeechSynthesizer, MockTextGenerator, MockTranscriber,
    },
    video::{AssemblyError, AssemblyServices, VideoAssembler},
};

/// Keyword generator that replaces the script's narration while the video
/// is being rendered, as a concurrent `/generate` call would.
struct ResynthesizeDuringRender {
    store: Arc<SqliteRecordStore>,
    script_id: String,
}

#[async_trait]
impl TextGenerator for ResynthesizeDuringRender {
    fn provider(&self) -> &str {
        "test"
    }

    fn model(&self) -> &str {
        "resynthesize"
    }

    async fn complete(&self, _request: CompletionRequest) -> Result<Completion, CollaboratorError> {
        let current = self.store.get_script(&self.script_id).unwrap().unwrap();
        self.store
            .transition_script(
                &self.script_id,
                ScriptStatus::AudioReady,
                ScriptChange::to(ScriptStatus::AudioReady)
                    .with_audio(AudioAsset {
                        locator: format!("audio/{}.mp3", self.script_id),
                        measured_duration_seconds: 100.0,
                        character_count: 600,
                        cost_estimate: 0.0096,
                        voice: "ko-KR-Neural2-A".to_string(),
                    })
                    .at_revision(current.revision),
            )
            .unwrap();

        Ok(Completion {
            text: "artificial intelligence, AI technology, neural network".to_string(),
            usage: TokenUsage {
                input_tokens: 0,
                output_tokens: 0,
            },
            model: "resynthesize".to_string(),
        })
    }
}

/// Test helper wiring every stage to mocks over a temp directory.
struct TestHarness {
    store: Arc<SqliteRecordStore>,
    feed: Arc<MockFeedSource>,
    llm: Arc<MockTextGenerator>,
    footage: Arc<MockFootageSearch>,
    runner: Arc<MockMediaRunner>,
    notifier: Arc<MockNotifier>,
    youtube: Arc<MockPlatformPublisher>,
    tiktok: Arc<MockPlatformPublisher>,
    instagram: Arc<MockPlatformPublisher>,
    collector: TopicCollector,
    scripts: ScriptGenerator,
    audio: AudioSynthesizer,
    video: VideoAssembler,
    gate: ApprovalGate,
    publisher: Publisher,
    temp_dir: TempDir,
}

impl TestHarness {
    async fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = Arc::new(
            SqliteRecordStore::new(&temp_dir.path().join("shorts.db"))
                .expect("Failed to create record store"),
        );
        let assets = Arc::new(LocalAssetStore::new(
            temp_dir.path().join("assets"),
            "http://localhost:8080/assets",
        ));

        let feed = Arc::new(MockFeedSource::new("reddit", 1000));
        let llm = Arc::new(MockTextGenerator::new());
        let tts = Arc::new(MockSpeechSynthesizer::new());
        let footage = Arc::new(MockFootageSearch::new());
        let runner = Arc::new(MockMediaRunner::new());
        let notifier = Arc::new(MockNotifier::new());
        let youtube = Arc::new(MockPlatformPublisher::new(Platform::Youtube));
        let tiktok = Arc::new(MockPlatformPublisher::new(Platform::Tiktok));
        let instagram = Arc::new(MockPlatformPublisher::new(Platform::Instagram));

        let video_config = VideoConfig {
            temp_dir: temp_dir.path().join("scratch"),
            ..VideoConfig::default()
        };

        let sources: Vec<Arc<dyn FeedSource>> = vec![feed.clone()];
        let collector = TopicCollector::new(store.clone(), sources, CollectorConfig::default());
        let scripts = ScriptGenerator::new(
            store.clone(),
            llm.clone(),
            ScriptConfig {
                sales_probability: 0.0,
                seed: Some(1),
                ..ScriptConfig::default()
            },
        );
        let audio = AudioSynthesizer::new(store.clone(), tts, assets.clone(), TtsConfig::default());
        let video = VideoAssembler::new(
            store.clone(),
            assets.clone(),
            AssemblyServices {
                llm: llm.clone(),
                footage: footage.clone(),
                transcriber: Arc::new(MockTranscriber::new()),
                runner: runner.clone(),
            },
            video_config,
        );
        let gate = ApprovalGate::new(
            store.clone(),
            notifier.clone(),
            assets.clone(),
            ApprovalConfig::default(),
        );
        let publishers: Vec<Arc<dyn PlatformPublisher>> =
            vec![youtube.clone(), tiktok.clone(), instagram.clone()];
        let publisher = Publisher::new(
            store.clone(),
            assets,
            publishers,
            temp_dir.path().join("scratch"),
        );

        runner.set_file_duration("narration.mp3", 50.0).await;
        runner.set_file_duration("final.mp4", 50.2).await;

        Self {
            store,
            feed,
            llm,
            footage,
            runner,
            notifier,
            youtube,
            tiktok,
            instagram,
            collector,
            scripts,
            audio,
            video,
            gate,
            publisher,
            temp_dir,
        }
    }

    /// 300 characters mentioning AI, ending in a sentence terminator.
    fn narration() -> String {
        let prefix = "AI 혁신이 시작됐습니다.";
        let pad = 299 - prefix.chars().count();
        format!("{}{}.", prefix, "가".repeat(pad))
    }

    /// Collect, write and narrate one topic; returns the script id at
    /// `audio_ready`.
    async fn narrated_script(&self) -> String {
        self.feed
            .set_items(vec![FeedItem::new(
                "AI breakthrough",
                "https://news.example/ai",
                5000,
            )])
            .await;
        let topics = self.collector.collect().await.expect("collect");
        assert_eq!(topics.len(), 1);

        self.llm.push_response(Self::narration()).await;
        let script = self
            .scripts
            .generate(&topics[0].id, None)
            .await
            .expect("generate script");

        self.audio
            .synthesize(AudioRequest {
                text: script.text.clone(),
                script_id: Some(script.id.clone()),
                video_id: None,
            })
            .await
            .expect("synthesize");
        script.id
    }

    async fn stock_ai_footage(&self, clips: u64) {
        self.footage
            .set_results("artificial intelligence", fixtures::portrait_clips(clips, 12.0))
            .await;
    }

    fn scratch_entries(&self) -> usize {
        std::fs::read_dir(self.temp_dir.path().join("scratch"))
            .map(|dir| dir.count())
            .unwrap_or(0)
    }
}

#[tokio::test]
async fn test_topic_to_published_video() {
    let h = TestHarness::new().await;
    let id = h.narrated_script().await;

    let script = h.store.get_script(&id).unwrap().unwrap();
    assert_eq!(script.mode, ScriptMode::Info);
    assert_eq!(script.word_count, 300);
    assert!((script.estimated_duration - 45.0).abs() < 1e-9);
    assert_eq!(script.status, ScriptStatus::AudioReady);
    let audio = script.audio.unwrap();
    assert!((audio.measured_duration_seconds - 50.0).abs() < 1e-9);

    // 50 s of narration plus the 5 s buffer needs five 12 s clips
    h.stock_ai_footage(8).await;
    let outcome = h.video.assemble(&id).await.expect("assemble");
    assert!(!outcome.reused);
    assert_eq!(outcome.asset.clip_count, 5);
    assert_eq!(outcome.asset.locator, format!("videos/{}.mp4", id));
    assert_eq!(outcome.asset.subtitle_source, SubtitleSource::Estimated);
    assert!((outcome.asset.duration - 50.2).abs() < 1e-9);
    assert_eq!(
        outcome.asset.keywords,
        vec!["artificial intelligence", "AI technology", "neural network"]
    );
    assert!(h
        .temp_dir
        .path()
        .join(format!("assets/videos/{}.mp4", id))
        .is_file());
    assert_eq!(h.footage.downloads().await.len(), 5);
    assert_eq!(h.scratch_entries(), 0);

    let invocations = h.runner.invocations().await;
    let composition = invocations
        .iter()
        .find(|i| i.label == "composition")
        .expect("composition ran");
    assert!(composition.args.join(" ").contains("-t 50.000"));
    assert!(invocations.iter().any(|i| i.label == "mux"));

    let stored = h.store.get_script(&id).unwrap().unwrap();
    assert_eq!(stored.status, ScriptStatus::VideoReady);

    // Assembling again returns the stored video without rendering
    let again = h.video.assemble(&id).await.unwrap();
    assert!(again.reused);
    assert_eq!(h.footage.downloads().await.len(), 5);

    let sent = h.gate.send(&id, ReviewOverrides::default()).await.unwrap();
    assert_eq!(sent.email_id, "mock-email-1");
    let notifications = h.notifier.sent().await;
    let notification = &notifications[0];
    assert!(notification.subject.ends_with("INFO 모드"));
    assert!(notification.approve_url.ends_with(&format!("video_id={}&action=approve", id)));

    assert_eq!(
        h.gate.decide(&id, "approve").await.unwrap(),
        DecisionOutcome::Decided(ApprovalStatus::Approved)
    );
    assert_eq!(
        h.gate.decide(&id, "approve").await.unwrap(),
        DecisionOutcome::AlreadyDecided(ApprovalStatus::Approved)
    );
    assert!(matches!(
        h.gate.decide(&id, "reject").await,
        Err(PipelineError::Precondition(_))
    ));

    h.instagram
        .set_next_error(CollaboratorError::Api {
            status: 400,
            message: "unsupported aspect ratio".into(),
        })
        .await;
    let published = h.publisher.publish(&id, None).await.unwrap();
    assert_eq!(
        published.published_platforms,
        vec![Platform::Youtube, Platform::Tiktok]
    );
    assert_eq!(published.upload_results.len(), 3);

    let youtube = h.youtube.uploads().await;
    assert_eq!(youtube[0].title, "AI breakthrough #Shorts");
    assert!(h.tiktok.uploads().await[0].hashtags.len() <= 10);

    let stored = h.store.get_script(&id).unwrap().unwrap();
    assert_eq!(stored.status, ScriptStatus::Published);
    assert_eq!(stored.approval_status, ApprovalStatus::Approved);
    assert!(!stored.upload_results[&Platform::Instagram].success);
}

#[tokio::test]
async fn test_rejected_video_is_never_published() {
    let h = TestHarness::new().await;
    let id = h.narrated_script().await;
    h.stock_ai_footage(8).await;
    h.video.assemble(&id).await.unwrap();
    h.gate.send(&id, ReviewOverrides::default()).await.unwrap();

    h.gate.decide(&id, "reject").await.unwrap();
    assert!(h.gate.decide(&id, "approve").await.is_err());

    let err = h.publisher.publish(&id, None).await.unwrap_err();
    assert!(matches!(err, PipelineError::Precondition(_)));
    assert!(h.youtube.uploads().await.is_empty());

    let stored = h.store.get_script(&id).unwrap().unwrap();
    assert_eq!(stored.status, ScriptStatus::Rejected);
}

#[tokio::test]
async fn test_no_footage_leaves_script_at_audio_ready() {
    let h = TestHarness::new().await;
    let id = h.narrated_script().await;

    let err = h.video.assemble(&id).await.unwrap_err();
    match err {
        PipelineError::Assembly(AssemblyError::NoClips { queries }) => {
            assert!(queries.contains(&"technology abstract".to_string()));
        }
        other => panic!("expected NoClips, got {:?}", other),
    }

    let stored = h.store.get_script(&id).unwrap().unwrap();
    assert_eq!(stored.status, ScriptStatus::AudioReady);
    assert!(stored.video.is_none());
    assert_eq!(h.scratch_entries(), 0);
}

#[tokio::test]
async fn test_mux_failure_reports_stage() {
    let h = TestHarness::new().await;
    let id = h.narrated_script().await;
    h.stock_ai_footage(8).await;
    h.runner.fail_on("mux").await;

    let err = h.video.assemble(&id).await.unwrap_err();
    match &err {
        PipelineError::Assembly(e) => assert_eq!(e.stage(), "mux"),
        other => panic!("expected assembly error, got {:?}", other),
    }
    assert_eq!(
        h.store.get_script(&id).unwrap().unwrap().status,
        ScriptStatus::AudioReady
    );
    assert_eq!(h.scratch_entries(), 0);
}

#[tokio::test]
async fn test_probe_failure_falls_back_to_measured_duration() {
    let h = TestHarness::new().await;
    let id = h.narrated_script().await;
    h.stock_ai_footage(8).await;
    h.runner.fail_on("probe").await;

    let outcome = h.video.assemble(&id).await.unwrap();
    // Final probe fails too, so the narration length is recorded
    assert!((outcome.asset.duration - 50.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_stage_order_is_enforced() {
    let h = TestHarness::new().await;
    let script = fixtures::script(h.store.as_ref(), "AI chips", ScriptMode::Sales);

    let err = h.video.assemble(&script.id).await.unwrap_err();
    assert!(matches!(err, PipelineError::Precondition(_)));

    let err = h
        .gate
        .send(&script.id, ReviewOverrides::default())
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::Precondition(_)));

    let err = h.publisher.publish(&script.id, None).await.unwrap_err();
    assert!(matches!(err, PipelineError::Precondition(_)));

    let err = h.video.assemble("missing").await.unwrap_err();
    assert!(matches!(err, PipelineError::NotFound { .. }));
}

#[tokio::test]
async fn test_resynthesis_during_render_rejects_stale_video() {
    let h = TestHarness::new().await;
    let id = h.narrated_script().await;
    h.stock_ai_footage(8).await;

    let racing = VideoAssembler::new(
        h.store.clone(),
        Arc::new(LocalAssetStore::new(
            h.temp_dir.path().join("assets"),
            "http://localhost:8080/assets",
        )),
        AssemblyServices {
            llm: Arc::new(ResynthesizeDuringRender {
                store: h.store.clone(),
                script_id: id.clone(),
            }),
            footage: h.footage.clone(),
            transcriber: Arc::new(MockTranscriber::new()),
            runner: h.runner.clone(),
        },
        VideoConfig {
            temp_dir: h.temp_dir.path().join("scratch"),
            ..VideoConfig::default()
        },
    );

    // The video was cut to the old 50 s narration; it must not be recorded.
    let err = racing.assemble(&id).await.unwrap_err();
    assert!(matches!(err, PipelineError::Precondition(_)));

    let stored = h.store.get_script(&id).unwrap().unwrap();
    assert_eq!(stored.status, ScriptStatus::AudioReady);
    assert!(stored.video.is_none());
    let audio = stored.audio.unwrap();
    assert!((audio.measured_duration_seconds - 100.0).abs() < 1e-9);
    assert_eq!(h.scratch_entries(), 0);

    // A fresh assembly picks up the new narration.
    let outcome = h.video.assemble(&id).await.unwrap();
    assert!(!outcome.reused);
    assert_eq!(
        h.store.get_script(&id).unwrap().unwrap().status,
        ScriptStatus::VideoReady
    );
}
