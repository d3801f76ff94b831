//! Reviewer email composition.

use std::fmt::Write as _;

use chrono::{DateTime, Utc};

use crate::collab::ApprovalNotification;
use crate::record::ScriptMode;

use super::ApprovalAction;

/// Values shown to the reviewer.
#[derive(Debug, Clone)]
pub struct ReviewDetails {
    pub record_id: String,
    pub mode: ScriptMode,
    pub script_text: String,
    pub video_url: String,
    pub duration: f64,
    pub thumbnail_url: Option<String>,
    pub generated_at: DateTime<Utc>,
}

/// Escape text for HTML element content and attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// `{base}/approve?video_id={id}&action={action}`
pub fn decision_link(base_url: &str, record_id: &str, action: ApprovalAction) -> String {
    format!(
        "{}/approve?video_id={}&action={}",
        base_url.trim_end_matches('/'),
        urlencoding::encode(record_id),
        action.as_str()
    )
}

pub fn subject(mode: ScriptMode) -> String {
    format!(
        "[Tech Shorts] 새 영상 승인 요청 - {} 모드",
        mode.as_str().to_uppercase()
    )
}

fn mode_badge(mode: ScriptMode) -> &'static str {
    match mode {
        ScriptMode::Info => r#"<span class="badge badge-info">ℹ️ INFO</span>"#,
        ScriptMode::Sales => r#"<span class="badge badge-sales">💰 SALES</span>"#,
    }
}

const STYLE: &str = "\
body { font-family: Arial, sans-serif; line-height: 1.6; color: #333; }
.container { max-width: 600px; margin: 0 auto; padding: 20px; }
.header { background: #667eea; color: white; padding: 20px; border-radius: 8px 8px 0 0; }
.content { background: #f9f9f9; padding: 20px; border: 1px solid #ddd; }
.script { background: #fff; padding: 15px; margin: 15px 0; border: 1px solid #e0e0e0; }
.btn { display: inline-block; padding: 12px 30px; margin: 10px; text-decoration: none; \
border-radius: 5px; font-weight: bold; }
.btn-approve { background: #10b981; color: white; }
.btn-reject { background: #ef4444; color: white; }
.thumbnail { max-width: 100%; border-radius: 8px; margin: 15px 0; }
.badge { display: inline-block; padding: 4px 12px; border-radius: 12px; font-size: 12px; }
.badge-info { background: #3b82f6; color: white; }
.badge-sales { background: #f59e0b; color: white; }
";

fn html_body(details: &ReviewDetails, approve_url: &str, reject_url: &str) -> String {
    let mut html = String::new();
    let _ = write!(
        html,
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<style>\n{}</style>\n</head>\n<body>\n",
        STYLE
    );
    html.push_str("<div class=\"container\">\n<div class=\"header\">\n");
    html.push_str("<h2>🎬 새 영상 승인 요청</h2>\n<p>생성된 영상을 검토하고 승인/거부해주세요.</p>\n</div>\n");
    html.push_str("<div class=\"content\">\n");
    let _ = writeln!(
        html,
        "<p><strong>Video ID:</strong> {}</p>",
        escape_html(&details.record_id)
    );
    let _ = writeln!(html, "<p><strong>모드:</strong> {}</p>", mode_badge(details.mode));
    let _ = writeln!(html, "<p><strong>길이:</strong> {:.1}초</p>", details.duration);
    let _ = writeln!(
        html,
        "<p><strong>생성 시간:</strong> {}</p>",
        details.generated_at.format("%Y-%m-%d %H:%M:%S")
    );
    if let Some(thumbnail) = details.thumbnail_url.as_deref().filter(|u| !u.is_empty()) {
        let _ = writeln!(
            html,
            "<img src=\"{}\" class=\"thumbnail\" alt=\"Thumbnail\">",
            escape_html(thumbnail)
        );
    }
    let _ = writeln!(
        html,
        "<div class=\"script\">\n<h4>📝 스크립트</h4>\n<p>{}</p>\n</div>",
        escape_html(&details.script_text)
    );
    let _ = writeln!(
        html,
        "<p style=\"text-align: center;\"><a href=\"{}\">🎥 영상 미리보기</a></p>",
        escape_html(&details.video_url)
    );
    let _ = writeln!(
        html,
        "<p style=\"text-align: center;\">\
         <a href=\"{}\" class=\"btn btn-approve\">✅ 승인 (업로드)</a>\
         <a href=\"{}\" class=\"btn btn-reject\">❌ 거부 (삭제)</a></p>",
        escape_html(approve_url),
        escape_html(reject_url)
    );
    html.push_str(
        "<p style=\"color: #666; font-size: 12px; text-align: center;\">\
         승인하면 YouTube, TikTok, Instagram에 업로드할 수 있습니다.<br>\
         거부하면 더이상 처리되지 않습니다.</p>\n",
    );
    html.push_str("</div>\n</div>\n</body>\n</html>\n");
    html
}

/// Compose the notification for `details`.
pub fn compose(details: &ReviewDetails, base_url: &str, recipient: &str) -> ApprovalNotification {
    let approve_url = decision_link(base_url, &details.record_id, ApprovalAction::Approve);
    let reject_url = decision_link(base_url, &details.record_id, ApprovalAction::Reject);
    ApprovalNotification {
        record_id: details.record_id.clone(),
        recipient: recipient.to_string(),
        subject: subject(details.mode),
        html_body: html_body(details, &approve_url, &reject_url),
        preview_url: details.video_url.clone(),
        approve_url,
        reject_url,
    }
}
