//! Reviewer decision page.
//!
//! `GET /approve` is opened from the links in the approval email, so every
//! outcome, failures included, renders a small HTML page instead of JSON.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Html,
};
use serde::Deserialize;
use shorts_core::approval::escape_html;
use shorts_core::record::ApprovalStatus;
use shorts_core::{DecisionOutcome, PipelineError};
use tracing::warn;

use super::error::status_for;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ApproveParams {
    pub video_id: Option<String>,
    pub action: Option<String>,
}

fn page(color: &str, heading: &str, lines: &[&str]) -> String {
    let body: String = lines
        .iter()
        .map(|line| format!("<p style=\"font-size: 18px;\">{}</p>\n", escape_html(line)))
        .collect();
    format!(
        r#"<!DOCTYPE html>
<html><head><meta charset="utf-8"><title>Tech Shorts</title></head>
<body style="font-family: Arial, sans-serif; text-align: center; padding: 50px;">
<h1 style="color: {color};">{heading}</h1>
{body}<p style="color: #666; margin-top: 30px;">이 창을 닫아도 됩니다.</p>
</body></html>
"#,
        color = color,
        heading = escape_html(heading),
        body = body,
    )
}

fn decision_page(outcome: DecisionOutcome) -> String {
    let already = matches!(outcome, DecisionOutcome::AlreadyDecided(_));
    match outcome.status() {
        ApprovalStatus::Rejected => {
            let note = if already {
                "이미 거부된 영상입니다."
            } else {
                "영상이 거부되었습니다."
            };
            page("#ef4444", "❌ 거부 완료", &[note, "더이상 처리되지 않습니다."])
        }
        _ => {
            let note = if already {
                "이미 승인된 영상입니다."
            } else {
                "영상이 승인되었습니다."
            };
            page(
                "#10b981",
                "✅ 승인 완료!",
                &[note, "곧 YouTube, TikTok, Instagram에 업로드됩니다."],
            )
        }
    }
}

fn error_page(err: &PipelineError) -> String {
    let heading = match err {
        PipelineError::NotFound { .. } => "❌ 영상을 찾을 수 없습니다",
        PipelineError::Validation(_) => "❌ 잘못된 요청",
        PipelineError::Precondition(_) => "⚠️ 처리할 수 없는 상태",
        _ => "❌ 오류",
    };
    page("#ef4444", heading, &[&err.to_string()])
}

/// GET /approve?video_id=..&action=approve|reject
pub async fn approve(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ApproveParams>,
) -> (StatusCode, Html<String>) {
    let (Some(video_id), Some(action)) = (
        params.video_id.filter(|v| !v.is_empty()),
        params.action.filter(|a| !a.is_empty()),
    ) else {
        return (
            StatusCode::BAD_REQUEST,
            Html(page(
                "#ef4444",
                "❌ 오류",
                &["video_id와 action 파라미터가 필요합니다."],
            )),
        );
    };

    match state.approval().decide(&video_id, &action).await {
        Ok(outcome) => (StatusCode::OK, Html(decision_page(outcome))),
        Err(e) => {
            warn!(video_id = %video_id, action = %action, error = %e, "Approval decision failed");
            (status_for(&e), Html(error_page(&e)))
        }
    }
}
