//! Topic and script records shared by every pipeline stage.

mod sqlite_store;
mod store;
mod types;

pub use sqlite_store::SqliteRecordStore;
pub use store::{
    NewScript, NewTopic, RecordStore, ScriptChange, ScriptFilter, StoreError, TopicFilter,
};
pub use types::{
    ApprovalStatus, AudioAsset, Platform, Script, ScriptMode, ScriptStats, ScriptStatus,
    SubtitleSource, Topic, TopicStatus, UploadResult, VideoAsset,
};
