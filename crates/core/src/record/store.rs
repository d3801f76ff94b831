//! Record storage trait and request types.

use chrono::{DateTime, Utc};
use thiserror::Error;

use super::types::{
    ApprovalStatus, AudioAsset, Platform, Script, ScriptMode, ScriptStats, ScriptStatus, Topic,
    TopicStatus, UploadResult, VideoAsset,
};
use std::collections::BTreeMap;

/// Error type for record store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Record not found.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// The record was not in the status the update expected (a concurrent
    /// trigger won, or the caller is out of order).
    #[error("{kind} {id} is {actual}, expected {expected}")]
    StaleStatus {
        kind: &'static str,
        id: String,
        expected: String,
        actual: String,
    },

    /// The record changed since the caller read it, even though its status
    /// did not.
    #[error("script {id} changed during the operation (revision {actual}, expected {expected})")]
    StaleRevision {
        id: String,
        expected: i64,
        actual: i64,
    },

    /// The requested transition is not an edge of the status machine.
    #[error("invalid transition for script {id}: {from} -> {to}")]
    InvalidTransition {
        id: String,
        from: ScriptStatus,
        to: ScriptStatus,
    },

    /// A script already exists for the topic.
    #[error("topic {0} already has a script")]
    DuplicateScript(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

/// Candidate topic to persist.
#[derive(Debug, Clone)]
pub struct NewTopic {
    pub title: String,
    pub url: String,
    pub score: i64,
    pub source: String,
}

/// Generated script to persist alongside the topic transition.
#[derive(Debug, Clone)]
pub struct NewScript {
    pub topic_id: String,
    pub topic_title: String,
    pub mode: ScriptMode,
    pub text: String,
    pub hook: String,
    pub word_count: usize,
    pub estimated_duration: f64,
}

/// Field updates applied together with a status transition.
#[derive(Debug, Clone)]
pub struct ScriptChange {
    pub status: ScriptStatus,
    pub audio: Option<AudioAsset>,
    pub video: Option<VideoAsset>,
    pub approval: Option<(ApprovalStatus, Option<DateTime<Utc>>)>,
    pub upload_results: Option<BTreeMap<Platform, UploadResult>>,
    pub published_platforms: Option<Vec<Platform>>,
    /// Revision the caller read; the update fails if the record moved on.
    pub revision: Option<i64>,
}

impl ScriptChange {
    pub fn to(status: ScriptStatus) -> Self {
        Self {
            status,
            audio: None,
            video: None,
            approval: None,
            upload_results: None,
            published_platforms: None,
            revision: None,
        }
    }

    /// Only apply the change if the script is still at `revision`.
    pub fn at_revision(mut self, revision: i64) -> Self {
        self.revision = Some(revision);
        self
    }

    pub fn with_audio(mut self, audio: AudioAsset) -> Self {
        self.audio = Some(audio);
        self
    }

    pub fn with_video(mut self, video: VideoAsset) -> Self {
        self.video = Some(video);
        self
    }

    pub fn with_approval(mut self, status: ApprovalStatus, decided_at: Option<DateTime<Utc>>) -> Self {
        self.approval = Some((status, decided_at));
        self
    }

    pub fn with_publication(
        mut self,
        results: BTreeMap<Platform, UploadResult>,
        published: Vec<Platform>,
    ) -> Self {
        self.upload_results = Some(results);
        self.published_platforms = Some(published);
        self
    }
}

/// Filter for querying topics.
#[derive(Debug, Clone)]
pub struct TopicFilter {
    pub status: Option<TopicStatus>,
    pub limit: i64,
    pub offset: i64,
}

impl Default for TopicFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl TopicFilter {
    pub fn new() -> Self {
        Self {
            status: None,
            limit: 100,
            offset: 0,
        }
    }

    pub fn with_status(mut self, status: TopicStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_offset(mut self, offset: i64) -> Self {
        self.offset = offset;
        self
    }
}

/// Filter for querying scripts.
#[derive(Debug, Clone)]
pub struct ScriptFilter {
    pub status: Option<ScriptStatus>,
    pub mode: Option<ScriptMode>,
    pub limit: i64,
    pub offset: i64,
}

impl Default for ScriptFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptFilter {
    pub fn new() -> Self {
        Self {
            status: None,
            mode: None,
            limit: 100,
            offset: 0,
        }
    }

    pub fn with_status(mut self, status: ScriptStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_mode(mut self, mode: ScriptMode) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_offset(mut self, offset: i64) -> Self {
        self.offset = offset;
        self
    }
}

/// Persistent store for topics and scripts.
///
/// Every status change goes through a conditional update on the expected
/// prior status, so two racing triggers cannot both advance a record.
pub trait RecordStore: Send + Sync {
    fn insert_topic(&self, topic: NewTopic) -> Result<Topic, StoreError>;

    fn get_topic(&self, id: &str) -> Result<Option<Topic>, StoreError>;

    fn list_topics(&self, filter: &TopicFilter) -> Result<Vec<Topic>, StoreError>;

    /// Persist a script and move its topic `pending -> script_generated`
    /// atomically.
    fn create_script(&self, script: NewScript) -> Result<Script, StoreError>;

    fn get_script(&self, id: &str) -> Result<Option<Script>, StoreError>;

    fn find_script_by_topic(&self, topic_id: &str) -> Result<Option<Script>, StoreError>;

    fn list_scripts(&self, filter: &ScriptFilter) -> Result<Vec<Script>, StoreError>;

    fn count_scripts(&self, filter: &ScriptFilter) -> Result<i64, StoreError>;

    /// Apply `change` only if the script is currently `expected` (and at
    /// `change.revision`, when given). Every applied change bumps the
    /// revision.
    fn transition_script(
        &self,
        id: &str,
        expected: ScriptStatus,
        change: ScriptChange,
    ) -> Result<Script, StoreError>;

    fn script_stats(&self) -> Result<ScriptStats, StoreError>;
}
