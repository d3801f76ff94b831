//! Reviewer notification delivery.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{ensure_success, http_client, CollaboratorError};

/// A composed approval request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApprovalNotification {
    pub record_id: String,
    pub recipient: String,
    pub subject: String,
    pub html_body: String,
    pub preview_url: String,
    pub approve_url: String,
    pub reject_url: String,
}

/// Delivers approval requests to a human reviewer.
#[async_trait]
pub trait ApprovalNotifier: Send + Sync {
    /// Send the notification, returning the delivery id.
    async fn notify(&self, notification: &ApprovalNotification)
        -> Result<String, CollaboratorError>;
}

/// Posts notifications as JSON to a mail relay webhook.
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
    token: Option<String>,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>, token: Option<String>, timeout_secs: u64) -> Self {
        Self {
            client: http_client(timeout_secs),
            url: url.into(),
            token,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RelayResponse {
    #[serde(default, alias = "message_id")]
    id: Option<String>,
}

#[async_trait]
impl ApprovalNotifier for WebhookNotifier {
    async fn notify(
        &self,
        notification: &ApprovalNotification,
    ) -> Result<String, CollaboratorError> {
        let mut request = self.client.post(&self.url).json(notification);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = ensure_success(request.send().await?).await?;
        let body = response.text().await?;

        // Relays that answer without a body still count as delivered.
        let id = serde_json::from_str::<RelayResponse>(&body)
            .ok()
            .and_then(|r| r.id)
            .unwrap_or_else(|| format!("webhook-{}", uuid::Uuid::new_v4()));
        Ok(id)
    }
}
