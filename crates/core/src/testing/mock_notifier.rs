//! Mock approval notifier for testing.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::collab::{ApprovalNotification, ApprovalNotifier, CollaboratorError};

/// Mock implementation of the [`ApprovalNotifier`] trait that records every
/// notification and answers with sequential message ids.
#[derive(Debug, Default)]
pub struct MockNotifier {
    sent: Arc<RwLock<Vec<ApprovalNotification>>>,
    next_error: Arc<RwLock<Option<CollaboratorError>>>,
}

impl MockNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_next_error(&self, error: CollaboratorError) {
        *self.next_error.write().await = Some(error);
    }

    /// Notifications delivered so far.
    pub async fn sent(&self) -> Vec<ApprovalNotification> {
        self.sent.read().await.clone()
    }
}

#[async_trait]
impl ApprovalNotifier for MockNotifier {
    async fn notify(
        &self,
        notification: &ApprovalNotification,
    ) -> Result<String, CollaboratorError> {
        if let Some(error) = self.next_error.write().await.take() {
            return Err(error);
        }
        let mut sent = self.sent.write().await;
        sent.push(notification.clone());
        Ok(format!("mock-email-{}", sent.len()))
    }
}
