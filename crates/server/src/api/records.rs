//! Read-only views of topics and scripts.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use shorts_core::record::{
    Script, ScriptFilter, ScriptMode, ScriptStatus, Topic, TopicFilter, TopicStatus,
};
use shorts_core::PipelineError;

use super::error::ApiError;
use crate::state::AppState;

/// Maximum allowed limit for list queries
const MAX_LIMIT: i64 = 1000;

/// Default limit for list queries
const DEFAULT_LIMIT: i64 = 100;

#[derive(Debug, Deserialize)]
pub struct ListTopicsParams {
    pub status: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct ListTopicsResponse {
    pub topics: Vec<Topic>,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug, Deserialize)]
pub struct ListScriptsParams {
    pub status: Option<String>,
    pub mode: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct ListScriptsResponse {
    pub scripts: Vec<Script>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

fn page_bounds(limit: Option<i64>, offset: Option<i64>) -> (i64, i64) {
    (
        limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT),
        offset.unwrap_or(0).max(0),
    )
}

/// GET /topics
pub async fn list_topics(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListTopicsParams>,
) -> Result<Json<ListTopicsResponse>, ApiError> {
    let (limit, offset) = page_bounds(params.limit, params.offset);
    let mut filter = TopicFilter::new().with_limit(limit).with_offset(offset);
    if let Some(status) = params.status.as_deref() {
        let status: TopicStatus = status.parse().map_err(PipelineError::validation)?;
        filter = filter.with_status(status);
    }
    let topics = state.store().list_topics(&filter).map_err(PipelineError::from)?;
    Ok(Json(ListTopicsResponse {
        topics,
        limit,
        offset,
    }))
}

/// GET /scripts
pub async fn list_scripts(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListScriptsParams>,
) -> Result<Json<ListScriptsResponse>, ApiError> {
    let (limit, offset) = page_bounds(params.limit, params.offset);
    let mut filter = ScriptFilter::new();
    if let Some(status) = params.status.as_deref() {
        let status: ScriptStatus = status.parse().map_err(PipelineError::validation)?;
        filter = filter.with_status(status);
    }
    if let Some(mode) = params.mode.as_deref() {
        let mode: ScriptMode = mode.parse().map_err(PipelineError::validation)?;
        filter = filter.with_mode(mode);
    }

    let store = state.store();
    let total = store.count_scripts(&filter).map_err(PipelineError::from)?;
    let scripts = store
        .list_scripts(&filter.with_limit(limit).with_offset(offset))
        .map_err(PipelineError::from)?;
    Ok(Json(ListScriptsResponse {
        scripts,
        total,
        limit,
        offset,
    }))
}

/// GET /scripts/{id}
pub async fn get_script(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Script>, ApiError> {
    let script = state
        .store()
        .get_script(&id)
        .map_err(PipelineError::from)?
        .ok_or_else(|| PipelineError::script_not_found(&id))?;
    Ok(Json(script))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_bounds() {
        assert_eq!(page_bounds(None, None), (DEFAULT_LIMIT, 0));
        assert_eq!(page_bounds(Some(5000), Some(-3)), (MAX_LIMIT, 0));
        assert_eq!(page_bounds(Some(0), Some(20)), (1, 20));
    }
}
