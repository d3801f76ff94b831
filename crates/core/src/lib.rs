pub mod approval;
pub mod audio;
pub mod collab;
pub mod collector;
pub mod config;
pub mod error;
pub mod media;
pub mod metrics;
pub mod publisher;
pub mod record;
pub mod script;
pub mod storage;
pub mod testing;
pub mod video;

pub use approval::{ApprovalAction, ApprovalGate, DecisionOutcome, ReviewOverrides, SendOutcome};
pub use audio::{AudioOutcome, AudioRequest, AudioSynthesizer};
pub use collector::TopicCollector;
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, SanitizedConfig,
};
pub use error::PipelineError;
pub use publisher::{PublishOutcome, Publisher};
pub use record::{RecordStore, Script, ScriptMode, ScriptStatus, SqliteRecordStore, Topic};
pub use script::ScriptGenerator;
pub use storage::{AssetStore, LocalAssetStore};
pub use video::{AssemblyError, AssemblyServices, VideoAssembler, VideoOutcome};
