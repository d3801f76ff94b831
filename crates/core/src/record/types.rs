//! Persisted pipeline records and their status machines.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status of a collected topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TopicStatus {
    Pending,
    ScriptGenerated,
}

impl TopicStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TopicStatus::Pending => "pending",
            TopicStatus::ScriptGenerated => "script_generated",
        }
    }
}

impl fmt::Display for TopicStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TopicStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TopicStatus::Pending),
            "script_generated" => Ok(TopicStatus::ScriptGenerated),
            other => Err(format!("unknown topic status: {}", other)),
        }
    }
}

/// A candidate news item ranked by popularity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    pub id: String,
    pub title: String,
    pub url: String,
    pub score: i64,
    /// Feed the topic came from (e.g. "hackernews").
    pub source: String,
    pub status: TopicStatus,
    pub created_at: DateTime<Utc>,
}

/// Narrative structure applied to a script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptMode {
    /// Storytelling: hook, context, conflict, resolution, call to action.
    Info,
    /// Persuasive: problem hook, agitation, solution tease, call to action.
    Sales,
}

impl ScriptMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScriptMode::Info => "info",
            ScriptMode::Sales => "sales",
        }
    }
}

impl fmt::Display for ScriptMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScriptMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "info" => Ok(ScriptMode::Info),
            "sales" => Ok(ScriptMode::Sales),
            other => Err(format!("unknown script mode: {}", other)),
        }
    }
}

/// Position of a script in the production pipeline.
///
/// Transitions only move forward along the edges accepted by
/// [`ScriptStatus::can_transition_to`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptStatus {
    PendingAudio,
    AudioReady,
    VideoReady,
    PendingApproval,
    Approved,
    Rejected,
    Published,
}

impl ScriptStatus {
    pub const ALL: [ScriptStatus; 7] = [
        ScriptStatus::PendingAudio,
        ScriptStatus::AudioReady,
        ScriptStatus::VideoReady,
        ScriptStatus::PendingApproval,
        ScriptStatus::Approved,
        ScriptStatus::Rejected,
        ScriptStatus::Published,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ScriptStatus::PendingAudio => "pending_audio",
            ScriptStatus::AudioReady => "audio_ready",
            ScriptStatus::VideoReady => "video_ready",
            ScriptStatus::PendingApproval => "pending_approval",
            ScriptStatus::Approved => "approved",
            ScriptStatus::Rejected => "rejected",
            ScriptStatus::Published => "published",
        }
    }

    /// Position in the pipeline; approved and rejected share a rank.
    pub fn rank(&self) -> u8 {
        match self {
            ScriptStatus::PendingAudio => 0,
            ScriptStatus::AudioReady => 1,
            ScriptStatus::VideoReady => 2,
            ScriptStatus::PendingApproval => 3,
            ScriptStatus::Approved | ScriptStatus::Rejected => 4,
            ScriptStatus::Published => 5,
        }
    }

    /// Whether no further transition is possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ScriptStatus::Rejected | ScriptStatus::Published)
    }

    /// Whether a human decision has already been recorded.
    pub fn is_decided(&self) -> bool {
        matches!(
            self,
            ScriptStatus::Approved | ScriptStatus::Rejected | ScriptStatus::Published
        )
    }

    /// Edges of the status machine. `AudioReady -> AudioReady` allows
    /// re-synthesis before a video exists.
    pub fn can_transition_to(&self, next: ScriptStatus) -> bool {
        use ScriptStatus::*;
        matches!(
            (self, next),
            (PendingAudio, AudioReady)
                | (AudioReady, AudioReady)
                | (AudioReady, VideoReady)
                | (VideoReady, PendingApproval)
                | (PendingApproval, Approved)
                | (PendingApproval, Rejected)
                | (Approved, Published)
        )
    }
}

impl fmt::Display for ScriptStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScriptStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ScriptStatus::ALL
            .iter()
            .find(|status| status.as_str() == s)
            .copied()
            .ok_or_else(|| format!("unknown script status: {}", s))
    }
}

/// Human review state of the rendered video.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    #[default]
    None,
    Pending,
    Approved,
    Rejected,
}

impl ApprovalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalStatus::None => "none",
            ApprovalStatus::Pending => "pending",
            ApprovalStatus::Approved => "approved",
            ApprovalStatus::Rejected => "rejected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ApprovalStatus::Approved | ApprovalStatus::Rejected)
    }
}

impl FromStr for ApprovalStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(ApprovalStatus::None),
            "pending" => Ok(ApprovalStatus::Pending),
            "approved" => Ok(ApprovalStatus::Approved),
            "rejected" => Ok(ApprovalStatus::Rejected),
            other => Err(format!("unknown approval status: {}", other)),
        }
    }
}

/// Synthesized narration for a script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioAsset {
    /// Asset store locator.
    pub locator: String,
    /// Narration length used to size the video.
    pub measured_duration_seconds: f64,
    pub character_count: usize,
    pub cost_estimate: f64,
    pub voice: String,
}

/// Where the subtitle timings came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubtitleSource {
    /// Segment timestamps from the transcriber.
    Transcribed,
    /// Equal time slices per sentence.
    Estimated,
}

impl SubtitleSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubtitleSource::Transcribed => "transcribed",
            SubtitleSource::Estimated => "estimated",
        }
    }
}

/// Rendered vertical video for a script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoAsset {
    pub locator: String,
    pub duration: f64,
    pub keywords: Vec<String>,
    pub clip_count: usize,
    pub subtitle_source: SubtitleSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_path: Option<PathBuf>,
    /// True when no preferred CJK font was available.
    pub font_degraded: bool,
}

/// Target social platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Youtube,
    Tiktok,
    Instagram,
}

impl Platform {
    pub const ALL: [Platform; 3] = [Platform::Youtube, Platform::Tiktok, Platform::Instagram];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Youtube => "youtube",
            Platform::Tiktok => "tiktok",
            Platform::Instagram => "instagram",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "youtube" => Ok(Platform::Youtube),
            "tiktok" => Ok(Platform::Tiktok),
            "instagram" => Ok(Platform::Instagram),
            other => Err(format!("unknown platform: {}", other)),
        }
    }
}

/// Outcome of one platform upload attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadResult {
    pub platform: Platform,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl UploadResult {
    pub fn succeeded(platform: Platform, external_id: impl Into<String>) -> Self {
        Self {
            platform,
            success: true,
            external_id: Some(external_id.into()),
            error: None,
        }
    }

    pub fn failed(platform: Platform, error: impl Into<String>) -> Self {
        Self {
            platform,
            success: false,
            external_id: None,
            error: Some(error.into()),
        }
    }
}

/// A narrated script and everything produced from it downstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Script {
    pub id: String,
    pub topic_id: String,
    pub topic_title: String,
    pub mode: ScriptMode,
    pub text: String,
    pub hook: String,
    /// Unicode character count.
    pub word_count: usize,
    pub estimated_duration: f64,
    pub status: ScriptStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio: Option<AudioAsset>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video: Option<VideoAsset>,
    pub approval_status: ApprovalStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approval_decided_at: Option<DateTime<Utc>>,
    pub upload_results: BTreeMap<Platform, UploadResult>,
    pub published_platforms: Vec<Platform>,
    /// Bumped by every transition, including the re-synthesis self-edge.
    pub revision: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Script {
    /// Audio locator, if synthesis produced a usable asset.
    pub fn audio_locator(&self) -> Option<&str> {
        self.audio
            .as_ref()
            .map(|a| a.locator.as_str())
            .filter(|l| !l.is_empty())
    }

    /// Video locator, if assembly produced a usable asset.
    pub fn video_locator(&self) -> Option<&str> {
        self.video
            .as_ref()
            .map(|v| v.locator.as_str())
            .filter(|l| !l.is_empty())
    }
}

/// Aggregate statistics over generated scripts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScriptStats {
    pub total: u64,
    pub info: u64,
    pub sales: u64,
    pub info_percentage: f64,
    pub sales_percentage: f64,
    pub avg_length_info: f64,
    pub avg_length_sales: f64,
    pub avg_duration_info: f64,
    pub avg_duration_sales: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_edges_allowed() {
        use ScriptStatus::*;
        assert!(PendingAudio.can_transition_to(AudioReady));
        assert!(AudioReady.can_transition_to(AudioReady));
        assert!(AudioReady.can_transition_to(VideoReady));
        assert!(VideoReady.can_transition_to(PendingApproval));
        assert!(PendingApproval.can_transition_to(Approved));
        assert!(PendingApproval.can_transition_to(Rejected));
        assert!(Approved.can_transition_to(Published));
    }

    #[test]
    fn test_skips_and_backward_moves_rejected() {
        use ScriptStatus::*;
        assert!(!PendingAudio.can_transition_to(VideoReady));
        assert!(!VideoReady.can_transition_to(AudioReady));
        assert!(!Rejected.can_transition_to(Approved));
        assert!(!Approved.can_transition_to(Rejected));
        assert!(!Published.can_transition_to(Approved));
        assert!(!Rejected.can_transition_to(Published));
        assert!(!VideoReady.can_transition_to(Approved));
    }

    #[test]
    fn test_every_edge_moves_forward_or_stays() {
        for from in ScriptStatus::ALL {
            for to in ScriptStatus::ALL {
                if from.can_transition_to(to) {
                    assert!(to.rank() >= from.rank(), "{} -> {}", from, to);
                }
            }
        }
    }

    #[test]
    fn test_terminal_statuses_have_no_exits() {
        for from in ScriptStatus::ALL.iter().filter(|s| s.is_terminal()) {
            assert!(ScriptStatus::ALL.iter().all(|to| !from.can_transition_to(*to)));
        }
    }

    #[test]
    fn test_status_string_roundtrip() {
        for status in ScriptStatus::ALL {
            assert_eq!(status.as_str().parse::<ScriptStatus>().unwrap(), status);
        }
        assert!("video".parse::<ScriptStatus>().is_err());
    }

    #[test]
    fn test_parse_mode_and_platform_case_insensitive() {
        assert_eq!("SALES".parse::<ScriptMode>().unwrap(), ScriptMode::Sales);
        assert_eq!(" TikTok ".parse::<Platform>().unwrap(), Platform::Tiktok);
        assert!("myspace".parse::<Platform>().is_err());
    }

    #[test]
    fn test_serde_uses_snake_case() {
        let json = serde_json::to_string(&ScriptStatus::PendingApproval).unwrap();
        assert_eq!(json, "\"pending_approval\"");
        let json = serde_json::to_string(&ApprovalStatus::None).unwrap();
        assert_eq!(json, "\"none\"");
    }
}
