use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub collector: CollectorConfig,
    #[serde(default)]
    pub script: ScriptConfig,
    #[serde(default)]
    pub llm: Option<LlmConfig>,
    #[serde(default)]
    pub tts: TtsConfig,
    #[serde(default)]
    pub transcriber: Option<TranscriberConfig>,
    #[serde(default)]
    pub footage: Option<FootageConfig>,
    #[serde(default)]
    pub video: VideoConfig,
    #[serde(default)]
    pub approval: ApprovalConfig,
    #[serde(default)]
    pub publisher: PublisherConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8080
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("shorts.db")
}

/// Asset store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Directory holding audio and video assets.
    #[serde(default = "default_storage_root")]
    pub root: PathBuf,
    /// Base URL under which `root` is served (used for preview links).
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: default_storage_root(),
            public_base_url: default_public_base_url(),
        }
    }
}

fn default_storage_root() -> PathBuf {
    PathBuf::from("data/assets")
}

fn default_public_base_url() -> String {
    "http://localhost:8080/assets".to_string()
}

/// Topic collection configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CollectorConfig {
    /// Topics persisted per collection run.
    #[serde(default = "default_max_topics")]
    pub max_topics: usize,
    /// Candidates kept from each source before merging.
    #[serde(default = "default_per_source_limit")]
    pub per_source_limit: usize,
    #[serde(default)]
    pub hackernews: HackerNewsConfig,
    #[serde(default)]
    pub reddit: RedditConfig,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            max_topics: default_max_topics(),
            per_source_limit: default_per_source_limit(),
            hackernews: HackerNewsConfig::default(),
            reddit: RedditConfig::default(),
        }
    }
}

fn default_max_topics() -> usize {
    5
}

fn default_per_source_limit() -> usize {
    5
}

/// Hacker News source configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HackerNewsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_hn_api_base")]
    pub api_base: String,
    #[serde(default = "default_hn_min_score")]
    pub min_score: i64,
    /// How many of the top story ids to inspect.
    #[serde(default = "default_hn_story_limit")]
    pub story_limit: usize,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for HackerNewsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_base: default_hn_api_base(),
            min_score: default_hn_min_score(),
            story_limit: default_hn_story_limit(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_hn_api_base() -> String {
    "https://hacker-news.firebaseio.com/v0".to_string()
}

fn default_hn_min_score() -> i64 {
    100
}

fn default_hn_story_limit() -> usize {
    30
}

/// Reddit source configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RedditConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_reddit_api_base")]
    pub api_base: String,
    /// Subreddits joined with `+`.
    #[serde(default = "default_subreddits")]
    pub subreddits: String,
    #[serde(default = "default_reddit_min_score")]
    pub min_score: i64,
    #[serde(default = "default_reddit_limit")]
    pub limit: u32,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for RedditConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_base: default_reddit_api_base(),
            subreddits: default_subreddits(),
            min_score: default_reddit_min_score(),
            limit: default_reddit_limit(),
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_reddit_api_base() -> String {
    "https://www.reddit.com".to_string()
}

fn default_subreddits() -> String {
    "technology+programming+artificial".to_string()
}

fn default_reddit_min_score() -> i64 {
    1000
}

fn default_reddit_limit() -> u32 {
    50
}

fn default_user_agent() -> String {
    concat!("tech-shorts/", env!("CARGO_PKG_VERSION")).to_string()
}

/// Script generation configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScriptConfig {
    /// Probability of picking the sales mode when no mode is forced.
    #[serde(default = "default_sales_probability")]
    pub sales_probability: f64,
    /// Scripts shorter than this (in characters) trigger a warning.
    #[serde(default = "default_min_length")]
    pub min_length: usize,
    /// Provisional narration time per character.
    #[serde(default = "default_seconds_per_char")]
    pub seconds_per_char: f64,
    #[serde(default = "default_script_temperature")]
    pub temperature: f32,
    #[serde(default = "default_script_max_tokens")]
    pub max_tokens: u32,
    /// Fixed RNG seed; unset means seeded from OS entropy.
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub product: ProductInfo,
}

impl Default for ScriptConfig {
    fn default() -> Self {
        Self {
            sales_probability: default_sales_probability(),
            min_length: default_min_length(),
            seconds_per_char: default_seconds_per_char(),
            temperature: default_script_temperature(),
            max_tokens: default_script_max_tokens(),
            seed: None,
            product: ProductInfo::default(),
        }
    }
}

fn default_sales_probability() -> f64 {
    0.25
}

fn default_min_length() -> usize {
    250
}

fn default_seconds_per_char() -> f64 {
    0.15
}

fn default_script_temperature() -> f32 {
    0.85
}

fn default_script_max_tokens() -> u32 {
    500
}

/// Product pitched by sales-mode scripts.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProductInfo {
    #[serde(default = "default_product_name")]
    pub name: String,
    #[serde(default = "default_product_benefit")]
    pub benefit: String,
    #[serde(default = "default_product_cta")]
    pub cta: String,
}

impl Default for ProductInfo {
    fn default() -> Self {
        Self {
            name: default_product_name(),
            benefit: default_product_benefit(),
            cta: default_product_cta(),
        }
    }
}

fn default_product_name() -> String {
    "IT 학습 솔루션".to_string()
}

fn default_product_benefit() -> String {
    "최신 기술 트렌드를 빠르게 학습".to_string()
}

fn default_product_cta() -> String {
    "프로필 링크 확인".to_string()
}

/// Text generation backend.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LlmProvider {
    /// OpenAI-compatible chat completions API.
    Openai,
    Anthropic,
}

/// Text generation configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    #[serde(default)]
    pub api_key: String,
    /// Model used for script writing.
    pub model: String,
    /// Model used for keyword extraction (defaults to `model`).
    #[serde(default)]
    pub keyword_model: Option<String>,
    #[serde(default)]
    pub api_base: Option<String>,
    #[serde(default = "default_llm_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_llm_timeout_secs() -> u64 {
    60
}

/// Speech synthesis configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TtsConfig {
    /// Google Cloud API key; absent means synthesis is unavailable.
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_tts_api_base")]
    pub api_base: String,
    #[serde(default)]
    pub voice: VoiceProfile,
    /// Fallback narration rate when the synthesizer reports no duration.
    #[serde(default = "default_chars_per_second")]
    pub chars_per_second: f64,
    /// Cost per synthesized character.
    #[serde(default = "default_unit_cost")]
    pub unit_cost: f64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: default_tts_api_base(),
            voice: VoiceProfile::default(),
            chars_per_second: default_chars_per_second(),
            unit_cost: default_unit_cost(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_tts_api_base() -> String {
    "https://texttospeech.googleapis.com".to_string()
}

fn default_chars_per_second() -> f64 {
    6.0
}

fn default_unit_cost() -> f64 {
    0.000016
}

/// Fixed voice and audio encoding settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct VoiceProfile {
    #[serde(default = "default_language_code")]
    pub language_code: String,
    #[serde(default = "default_voice_name")]
    pub name: String,
    #[serde(default = "default_speaking_rate")]
    pub speaking_rate: f64,
    #[serde(default)]
    pub pitch: f64,
    #[serde(default = "default_sample_rate")]
    pub sample_rate_hz: u32,
}

impl Default for VoiceProfile {
    fn default() -> Self {
        Self {
            language_code: default_language_code(),
            name: default_voice_name(),
            speaking_rate: default_speaking_rate(),
            pitch: 0.0,
            sample_rate_hz: default_sample_rate(),
        }
    }
}

fn default_language_code() -> String {
    "ko-KR".to_string()
}

fn default_voice_name() -> String {
    "ko-KR-Neural2-A".to_string()
}

fn default_speaking_rate() -> f64 {
    1.05
}

fn default_sample_rate() -> u32 {
    24000
}

/// Speech-to-text configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TranscriberConfig {
    pub api_key: String,
    #[serde(default = "default_openai_api_base")]
    pub api_base: String,
    #[serde(default = "default_whisper_model")]
    pub model: String,
    /// ISO-639-1 language of the narration.
    #[serde(default = "default_transcription_language")]
    pub language: String,
    #[serde(default = "default_llm_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_openai_api_base() -> String {
    "https://api.openai.com".to_string()
}

fn default_whisper_model() -> String {
    "whisper-1".to_string()
}

fn default_transcription_language() -> String {
    "ko".to_string()
}

/// Stock footage search configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FootageConfig {
    pub api_key: String,
    #[serde(default = "default_pexels_api_base")]
    pub api_base: String,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_download_timeout_secs")]
    pub download_timeout_secs: u64,
}

fn default_pexels_api_base() -> String {
    "https://api.pexels.com".to_string()
}

fn default_per_page() -> u32 {
    15
}

fn default_download_timeout_secs() -> u64 {
    300
}

/// Video assembly configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VideoConfig {
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: PathBuf,
    #[serde(default = "default_ffprobe_path")]
    pub ffprobe_path: PathBuf,
    /// Parent directory for per-invocation scratch directories.
    #[serde(default = "std::env::temp_dir")]
    pub temp_dir: PathBuf,
    /// Timeout for a single ffmpeg/ffprobe run.
    #[serde(default = "default_process_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_ffmpeg_log_level")]
    pub ffmpeg_log_level: String,
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default = "default_preset")]
    pub preset: String,
    #[serde(default = "default_crf")]
    pub crf: u8,
    #[serde(default = "default_audio_bitrate")]
    pub audio_bitrate: String,
    /// Footage gathered beyond the narration length.
    #[serde(default = "default_duration_buffer_secs")]
    pub duration_buffer_secs: f64,
    #[serde(default = "default_min_clip_duration")]
    pub min_clip_duration_secs: f64,
    #[serde(default = "default_min_clip_height")]
    pub min_clip_height: u32,
    #[serde(default = "default_fallback_query")]
    pub fallback_query: String,
    #[serde(default = "default_keyword_temperature")]
    pub keyword_temperature: f32,
    #[serde(default = "default_keyword_max_tokens")]
    pub keyword_max_tokens: u32,
    #[serde(default = "default_font_size")]
    pub font_size: u32,
    /// Fonts with CJK coverage, searched in order.
    #[serde(default = "default_preferred_fonts")]
    pub preferred_fonts: Vec<FontCandidate>,
    /// Generic fonts used when no preferred font is installed.
    #[serde(default = "default_fallback_fonts")]
    pub fallback_fonts: Vec<FontCandidate>,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
            ffprobe_path: default_ffprobe_path(),
            temp_dir: std::env::temp_dir(),
            timeout_secs: default_process_timeout_secs(),
            ffmpeg_log_level: default_ffmpeg_log_level(),
            width: default_width(),
            height: default_height(),
            preset: default_preset(),
            crf: default_crf(),
            audio_bitrate: default_audio_bitrate(),
            duration_buffer_secs: default_duration_buffer_secs(),
            min_clip_duration_secs: default_min_clip_duration(),
            min_clip_height: default_min_clip_height(),
            fallback_query: default_fallback_query(),
            keyword_temperature: default_keyword_temperature(),
            keyword_max_tokens: default_keyword_max_tokens(),
            font_size: default_font_size(),
            preferred_fonts: default_preferred_fonts(),
            fallback_fonts: default_fallback_fonts(),
        }
    }
}

fn default_ffmpeg_path() -> PathBuf {
    PathBuf::from("ffmpeg")
}

fn default_ffprobe_path() -> PathBuf {
    PathBuf::from("ffprobe")
}

fn default_process_timeout_secs() -> u64 {
    600
}

fn default_ffmpeg_log_level() -> String {
    "error".to_string()
}

fn default_width() -> u32 {
    1080
}

fn default_height() -> u32 {
    1920
}

fn default_preset() -> String {
    "medium".to_string()
}

fn default_crf() -> u8 {
    23
}

fn default_audio_bitrate() -> String {
    "192k".to_string()
}

fn default_duration_buffer_secs() -> f64 {
    5.0
}

fn default_min_clip_duration() -> f64 {
    10.0
}

fn default_min_clip_height() -> u32 {
    1080
}

fn default_fallback_query() -> String {
    "technology abstract".to_string()
}

fn default_keyword_temperature() -> f32 {
    0.7
}

fn default_keyword_max_tokens() -> u32 {
    50
}

fn default_font_size() -> u32 {
    24
}

/// A font file and the family name libass should request.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct FontCandidate {
    pub path: PathBuf,
    pub family: String,
}

impl FontCandidate {
    pub fn new(path: impl Into<PathBuf>, family: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            family: family.into(),
        }
    }
}

fn default_preferred_fonts() -> Vec<FontCandidate> {
    vec![
        FontCandidate::new(
            "/usr/share/fonts/opentype/noto/NotoSansCJK-Regular.ttc",
            "Noto Sans CJK KR",
        ),
        FontCandidate::new(
            "/usr/share/fonts/truetype/noto/NotoSansCJK-Regular.ttc",
            "Noto Sans CJK KR",
        ),
        FontCandidate::new(
            "/usr/share/fonts/opentype/noto/NotoSerifCJK-Regular.ttc",
            "Noto Serif CJK KR",
        ),
    ]
}

fn default_fallback_fonts() -> Vec<FontCandidate> {
    vec![FontCandidate::new(
        "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
        "DejaVu Sans",
    )]
}

/// Human approval configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApprovalConfig {
    /// Public base URL of this server; approve/reject links point here.
    #[serde(default = "default_approval_base_url")]
    pub base_url: String,
    /// Reviewer address passed to the notifier.
    #[serde(default)]
    pub recipient: String,
    /// Mail relay webhook; absent means notifications are unavailable.
    #[serde(default)]
    pub webhook_url: Option<String>,
    #[serde(default)]
    pub webhook_token: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ApprovalConfig {
    fn default() -> Self {
        Self {
            base_url: default_approval_base_url(),
            recipient: String::new(),
            webhook_url: None,
            webhook_token: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_approval_base_url() -> String {
    "http://localhost:8080".to_string()
}

/// Publishing configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PublisherConfig {
    #[serde(default)]
    pub youtube: Option<PlatformEndpointConfig>,
    #[serde(default)]
    pub tiktok: Option<PlatformEndpointConfig>,
    #[serde(default)]
    pub instagram: Option<PlatformEndpointConfig>,
}

/// Upload endpoint of a single platform.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlatformEndpointConfig {
    pub upload_url: String,
    #[serde(default)]
    pub access_token: String,
    #[serde(default = "default_upload_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_upload_timeout_secs() -> u64 {
    600
}

fn default_true() -> bool {
    true
}

fn default_timeout_secs() -> u64 {
    30
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub collector: CollectorConfig,
    pub script: ScriptConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub llm: Option<SanitizedLlmConfig>,
    pub tts: SanitizedTtsConfig,
    pub transcriber_configured: bool,
    pub footage_configured: bool,
    pub video: VideoConfig,
    pub approval: SanitizedApprovalConfig,
    /// Platforms with an upload endpoint.
    pub publisher_platforms: Vec<String>,
}

/// Sanitized LLM config (API key hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedLlmConfig {
    pub provider: LlmProvider,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyword_model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
    pub api_key_configured: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedTtsConfig {
    pub voice: VoiceProfile,
    pub chars_per_second: f64,
    pub unit_cost: f64,
    pub api_key_configured: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedApprovalConfig {
    pub base_url: String,
    pub recipient: String,
    pub webhook_configured: bool,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        let publisher = &config.publisher;
        let publisher_platforms = [
            ("youtube", publisher.youtube.is_some()),
            ("tiktok", publisher.tiktok.is_some()),
            ("instagram", publisher.instagram.is_some()),
        ]
        .into_iter()
        .filter(|(_, configured)| *configured)
        .map(|(name, _)| name.to_string())
        .collect();

        Self {
            server: config.server.clone(),
            database: config.database.clone(),
            storage: config.storage.clone(),
            collector: config.collector.clone(),
            script: config.script.clone(),
            llm: config.llm.as_ref().map(|llm| SanitizedLlmConfig {
                provider: llm.provider.clone(),
                model: llm.model.clone(),
                keyword_model: llm.keyword_model.clone(),
                api_base: llm.api_base.clone(),
                api_key_configured: !llm.api_key.is_empty(),
            }),
            tts: SanitizedTtsConfig {
                voice: config.tts.voice.clone(),
                chars_per_second: config.tts.chars_per_second,
                unit_cost: config.tts.unit_cost,
                api_key_configured: config
                    .tts
                    .api_key
                    .as_ref()
                    .is_some_and(|k| !k.is_empty()),
            },
            transcriber_configured: config.transcriber.is_some(),
            footage_configured: config.footage.is_some(),
            video: config.video.clone(),
            approval: SanitizedApprovalConfig {
                base_url: config.approval.base_url.clone(),
                recipient: config.approval.recipient.clone(),
                webhook_configured: config.approval.webhook_url.is_some(),
            },
            publisher_platforms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host.to_string(), "0.0.0.0");
        assert_eq!(config.collector.max_topics, 5);
        assert_eq!(config.collector.hackernews.min_score, 100);
        assert_eq!(config.collector.reddit.min_score, 1000);
        assert_eq!(config.script.sales_probability, 0.25);
        assert_eq!(config.script.seconds_per_char, 0.15);
        assert_eq!(config.tts.chars_per_second, 6.0);
        assert_eq!(config.tts.voice.name, "ko-KR-Neural2-A");
        assert_eq!(config.video.fallback_query, "technology abstract");
        assert_eq!(config.video.preferred_fonts.len(), 3);
        assert!(config.llm.is_none());
        assert!(config.footage.is_none());
    }

    #[test]
    fn test_deserialize_llm_section() {
        let toml = r#"
[llm]
provider = "openai"
api_key = "sk-test"
model = "gpt-4o"
keyword_model = "gpt-4o-mini"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        let llm = config.llm.unwrap();
        assert_eq!(llm.provider, LlmProvider::Openai);
        assert_eq!(llm.keyword_model.as_deref(), Some("gpt-4o-mini"));
        assert_eq!(llm.timeout_secs, 60);
    }

    #[test]
    fn test_deserialize_unknown_provider_fails() {
        let toml = r#"
[llm]
provider = "mystery"
model = "x"
"#;
        assert!(toml::from_str::<Config>(toml).is_err());
    }

    #[test]
    fn test_sanitized_config_hides_secrets() {
        let toml = r#"
[llm]
provider = "anthropic"
api_key = "secret-key"
model = "claude-3-haiku-20240307"

[tts]
api_key = "google-key"

[approval]
webhook_url = "https://relay.example/send"
webhook_token = "relay-token"

[publisher.youtube]
upload_url = "https://uploads.example/youtube"
access_token = "yt-token"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        let sanitized = SanitizedConfig::from(&config);
        let json = serde_json::to_string(&sanitized).unwrap();

        assert!(!json.contains("secret-key"));
        assert!(!json.contains("google-key"));
        assert!(!json.contains("relay-token"));
        assert!(!json.contains("yt-token"));
        assert!(sanitized.llm.unwrap().api_key_configured);
        assert!(sanitized.tts.api_key_configured);
        assert!(sanitized.approval.webhook_configured);
        assert_eq!(sanitized.publisher_platforms, vec!["youtube".to_string()]);
    }
}
