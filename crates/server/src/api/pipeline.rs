//! Stage trigger handlers.
//!
//! Each handler runs one pipeline stage to completion and returns its
//! result. Missing fields deserialize to empty values so the stage itself
//! reports them as validation failures (400) rather than the extractor.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use shorts_core::record::{Platform, ScriptMode, ScriptStats, Topic, UploadResult};
use shorts_core::{AudioRequest, PipelineError, ReviewOverrides};

use super::error::ApiError;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct CollectResponse {
    pub topics_count: usize,
    pub topics: Vec<Topic>,
}

#[derive(Debug, Default, Deserialize)]
pub struct GenerateScriptBody {
    #[serde(default)]
    pub topic_id: String,
    /// "info" or "sales"; random selection when absent.
    pub force_mode: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GenerateScriptResponse {
    pub script_id: String,
    pub topic_id: String,
    pub mode: ScriptMode,
    pub script: String,
    pub hook: String,
    pub word_count: usize,
    pub estimated_duration: f64,
}

#[derive(Debug, Default, Deserialize)]
pub struct GenerateAudioBody {
    #[serde(default)]
    pub script_text: String,
    pub script_id: Option<String>,
    pub video_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GenerateAudioResponse {
    pub video_id: String,
    pub audio_url: String,
    pub duration_seconds: f64,
    pub character_count: usize,
    pub cost: f64,
}

#[derive(Debug, Default, Deserialize)]
pub struct EditVideoBody {
    #[serde(default)]
    pub script_id: String,
}

#[derive(Debug, Serialize)]
pub struct EditVideoResponse {
    pub script_id: String,
    pub video_url: String,
    pub duration: f64,
    pub keywords: Vec<String>,
    pub clip_count: usize,
    pub reused: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct SendApprovalBody {
    #[serde(default)]
    pub video_id: String,
    pub script_text: Option<String>,
    pub video_url: Option<String>,
    pub duration: Option<f64>,
    pub mode: Option<String>,
    pub thumbnail_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SendApprovalResponse {
    pub video_id: String,
    pub email_id: String,
    pub resent: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct UploadBody {
    #[serde(default)]
    pub script_id: String,
    /// Platform names; every platform when absent.
    pub platforms: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub script_id: String,
    pub upload_results: BTreeMap<Platform, UploadResult>,
    pub published_platforms: Vec<Platform>,
    pub reused: bool,
}

fn parse_mode(mode: Option<&str>) -> Result<Option<ScriptMode>, PipelineError> {
    mode.map(|m| m.parse::<ScriptMode>().map_err(PipelineError::validation))
        .transpose()
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /collect
pub async fn collect(
    State(state): State<Arc<AppState>>,
) -> Result<Json<CollectResponse>, ApiError> {
    let topics = state.collector().collect().await?;
    Ok(Json(CollectResponse {
        topics_count: topics.len(),
        topics,
    }))
}

/// POST /generate-script
pub async fn generate_script(
    State(state): State<Arc<AppState>>,
    Json(body): Json<GenerateScriptBody>,
) -> Result<Json<GenerateScriptResponse>, ApiError> {
    let forced = parse_mode(body.force_mode.as_deref())?;
    let script = state.scripts().generate(&body.topic_id, forced).await?;
    Ok(Json(GenerateScriptResponse {
        script_id: script.id,
        topic_id: script.topic_id,
        mode: script.mode,
        script: script.text,
        hook: script.hook,
        word_count: script.word_count,
        estimated_duration: script.estimated_duration,
    }))
}

/// GET /stats
pub async fn stats(State(state): State<Arc<AppState>>) -> Result<Json<ScriptStats>, ApiError> {
    Ok(Json(state.scripts().stats()?))
}

/// POST /generate
///
/// Narrates `script_text`. With a `script_id` the script advances to
/// `audio_ready`; without one the audio is stored under `video_id`.
pub async fn generate_audio(
    State(state): State<Arc<AppState>>,
    Json(body): Json<GenerateAudioBody>,
) -> Result<Json<GenerateAudioResponse>, ApiError> {
    let outcome = state
        .audio()
        .synthesize(AudioRequest {
            text: body.script_text,
            script_id: body.script_id,
            video_id: body.video_id,
        })
        .await?;
    Ok(Json(GenerateAudioResponse {
        video_id: outcome.video_id,
        audio_url: outcome.audio_url,
        duration_seconds: outcome.asset.measured_duration_seconds,
        character_count: outcome.asset.character_count,
        cost: outcome.asset.cost_estimate,
    }))
}

/// POST /edit-video
pub async fn edit_video(
    State(state): State<Arc<AppState>>,
    Json(body): Json<EditVideoBody>,
) -> Result<Json<EditVideoResponse>, ApiError> {
    let outcome = state
        .video()
        .assemble(&body.script_id)
        .await
        .map_err(ApiError::with_stage)?;
    Ok(Json(EditVideoResponse {
        script_id: outcome.script_id,
        video_url: outcome.video_url,
        duration: outcome.asset.duration,
        keywords: outcome.asset.keywords,
        clip_count: outcome.asset.clip_count,
        reused: outcome.reused,
    }))
}

/// POST /send-approval
pub async fn send_approval(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SendApprovalBody>,
) -> Result<Json<SendApprovalResponse>, ApiError> {
    let overrides = ReviewOverrides {
        script_text: body.script_text,
        video_url: body.video_url,
        duration: body.duration,
        mode: parse_mode(body.mode.as_deref())?,
        thumbnail_url: body.thumbnail_url,
    };
    let outcome = state.approval().send(&body.video_id, overrides).await?;
    Ok(Json(SendApprovalResponse {
        video_id: outcome.script_id,
        email_id: outcome.email_id,
        resent: outcome.resent,
    }))
}

/// POST /upload
pub async fn upload(
    State(state): State<Arc<AppState>>,
    Json(body): Json<UploadBody>,
) -> Result<Json<UploadResponse>, ApiError> {
    let outcome = state
        .publisher()
        .publish(&body.script_id, body.platforms.as_deref())
        .await?;
    Ok(Json(UploadResponse {
        script_id: outcome.script_id,
        upload_results: outcome.upload_results,
        published_platforms: outcome.published_platforms,
        reused: outcome.reused,
    }))
}
