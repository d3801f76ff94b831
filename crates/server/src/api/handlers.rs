use axum::{extract::State, http::header, response::IntoResponse, Json};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use shorts_core::SanitizedConfig;

use crate::metrics::{collect_dynamic_metrics, encode_metrics};
use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub korean_font_available: bool,
    pub font_path: Option<PathBuf>,
    pub degraded: bool,
}

/// Always `ok`; a missing subtitle font only marks the service degraded.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let fonts = state.font_status();
    Json(HealthResponse {
        status: "ok".to_string(),
        korean_font_available: fonts.korean_font_available,
        font_path: fonts.font_path,
        degraded: fonts.degraded,
    })
}

pub async fn get_config(State(state): State<Arc<AppState>>) -> Json<SanitizedConfig> {
    Json(state.sanitized_config())
}

pub async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    collect_dynamic_metrics(&state);
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        encode_metrics(),
    )
}
