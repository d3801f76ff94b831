//! Testing utilities and mock implementations of every collaborator trait.
//!
//! The mocks record their calls and accept injected failures, so pipeline
//! stages can be exercised end to end without network access or ffmpeg.
//!
//! # Example
//!
//! ```rust,ignore
//! use shorts_core::testing::{MockFootageSearch, MockMediaRunner, MockTextGenerator};
//!
//! let llm = MockTextGenerator::new();
//! llm.push_response("robot, factory, automation").await;
//!
//! let runner = MockMediaRunner::new();
//! runner.set_probe_duration(Some(50.0)).await;
//! ```

mod mock_feed;
mod mock_footage;
mod mock_llm;
mod mock_media;
mod mock_notifier;
mod mock_platform;
mod mock_speech;
mod mock_transcriber;

pub use mock_feed::MockFeedSource;
pub use mock_footage::{MockFootageSearch, RecordedDownload};
pub use mock_llm::MockTextGenerator;
pub use mock_media::MockMediaRunner;
pub use mock_notifier::MockNotifier;
pub use mock_platform::MockPlatformPublisher;
pub use mock_speech::MockSpeechSynthesizer;
pub use mock_transcriber::MockTranscriber;

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::collections::BTreeMap;

    use chrono::Utc;

    use crate::collab::{FootageFile, FootageVideo};
    use crate::record::{
        ApprovalStatus, AudioAsset, NewScript, NewTopic, RecordStore, Script, ScriptChange,
        ScriptMode, ScriptStatus, SubtitleSource, VideoAsset,
    };

    /// A short Korean narration mentioning `title`.
    pub fn script_text(title: &str) -> String {
        format!(
            "{} 소식입니다. 오늘의 테크 뉴스를 짧게 전해드립니다. 구독과 좋아요 부탁드립니다!",
            title
        )
    }

    /// Create a topic and its script, leaving the script at `pending_audio`.
    pub fn script(store: &dyn RecordStore, title: &str, mode: ScriptMode) -> Script {
        let topic = store
            .insert_topic(NewTopic {
                title: title.to_string(),
                url: format!("https://news.example/{}", title.len()),
                score: 5000,
                source: "hackernews".to_string(),
            })
            .expect("insert topic");

        let text = script_text(title);
        let word_count = text.chars().count();
        store
            .create_script(NewScript {
                topic_id: topic.id,
                topic_title: title.to_string(),
                mode,
                hook: format!("{} 소식입니다.", title),
                word_count,
                estimated_duration: word_count as f64 * 0.15,
                text,
            })
            .expect("create script")
    }

    /// Narration asset stored at `audio/{id}.mp3`.
    pub fn audio_asset(id: &str) -> AudioAsset {
        AudioAsset {
            locator: format!("audio/{}.mp3", id),
            measured_duration_seconds: 50.0,
            character_count: 300,
            cost_estimate: 0.0048,
            voice: "ko-KR-Neural2-A".to_string(),
        }
    }

    /// Video asset stored at `videos/{id}.mp4`.
    pub fn video_asset(id: &str) -> VideoAsset {
        VideoAsset {
            locator: format!("videos/{}.mp4", id),
            duration: 50.0,
            keywords: vec!["artificial intelligence".to_string()],
            clip_count: 5,
            subtitle_source: SubtitleSource::Estimated,
            font_path: None,
            font_degraded: false,
        }
    }

    /// Walk a script along the status machine until it reaches `target`,
    /// attaching placeholder assets on the way.
    pub fn advance_to(store: &dyn RecordStore, id: &str, target: ScriptStatus) {
        loop {
            let current = store.get_script(id).expect("get script").expect("script exists").status;
            if current == target {
                return;
            }
            let change = match (current, target) {
                (ScriptStatus::PendingAudio, _) => {
                    ScriptChange::to(ScriptStatus::AudioReady).with_audio(audio_asset(id))
                }
                (ScriptStatus::AudioReady, _) => {
                    ScriptChange::to(ScriptStatus::VideoReady).with_video(video_asset(id))
                }
                (ScriptStatus::VideoReady, _) => ScriptChange::to(ScriptStatus::PendingApproval)
                    .with_approval(ApprovalStatus::Pending, None),
                (ScriptStatus::PendingApproval, ScriptStatus::Rejected) => {
                    ScriptChange::to(ScriptStatus::Rejected)
                        .with_approval(ApprovalStatus::Rejected, Some(Utc::now()))
                }
                (ScriptStatus::PendingApproval, _) => ScriptChange::to(ScriptStatus::Approved)
                    .with_approval(ApprovalStatus::Approved, Some(Utc::now())),
                (ScriptStatus::Approved, _) => ScriptChange::to(ScriptStatus::Published)
                    .with_publication(BTreeMap::new(), Vec::new()),
                (from, to) => panic!("cannot advance script from {} to {}", from, to),
            };
            store
                .transition_script(id, current, change)
                .expect("transition script");
        }
    }

    /// A footage search hit with one file at the full frame size.
    pub fn footage_video(id: u64, width: u32, height: u32, duration: f64) -> FootageVideo {
        FootageVideo {
            id,
            width,
            height,
            duration,
            files: vec![FootageFile {
                quality: Some("hd".to_string()),
                width: Some(width),
                height: Some(height),
                link: format!("https://videos.example/{}/hd.mp4", id),
            }],
        }
    }

    /// `count` portrait clips of `duration` seconds each, ids from 1.
    pub fn portrait_clips(count: u64, duration: f64) -> Vec<FootageVideo> {
        (1..=count)
            .map(|id| footage_video(id, 1080, 1920, duration))
            .collect()
    }
}
