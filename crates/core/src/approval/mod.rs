//! Human approval gate between assembly and publishing.

pub mod notification;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use crate::collab::ApprovalNotifier;
use crate::config::ApprovalConfig;
use crate::error::PipelineError;
use crate::metrics;
use crate::record::{
    ApprovalStatus, RecordStore, ScriptChange, ScriptMode, ScriptStatus, StoreError,
};
use crate::storage::AssetStore;

pub use notification::{escape_html, ReviewDetails};

/// A reviewer decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalAction {
    Approve,
    Reject,
}

impl ApprovalAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalAction::Approve => "approve",
            ApprovalAction::Reject => "reject",
        }
    }

    fn target_status(&self) -> ScriptStatus {
        match self {
            ApprovalAction::Approve => ScriptStatus::Approved,
            ApprovalAction::Reject => ScriptStatus::Rejected,
        }
    }

    fn approval_status(&self) -> ApprovalStatus {
        match self {
            ApprovalAction::Approve => ApprovalStatus::Approved,
            ApprovalAction::Reject => ApprovalStatus::Rejected,
        }
    }
}

impl fmt::Display for ApprovalAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApprovalAction {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "approve" => Ok(ApprovalAction::Approve),
            "reject" => Ok(ApprovalAction::Reject),
            other => Err(PipelineError::validation(format!(
                "invalid action: {:?} (expected approve or reject)",
                other
            ))),
        }
    }
}

/// Caller-supplied values that replace the stored ones in the email.
#[derive(Debug, Clone, Default)]
pub struct ReviewOverrides {
    pub script_text: Option<String>,
    pub video_url: Option<String>,
    pub duration: Option<f64>,
    pub mode: Option<ScriptMode>,
    pub thumbnail_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SendOutcome {
    pub script_id: String,
    pub email_id: String,
    /// True when the script was already awaiting a decision.
    pub resent: bool,
}

/// Result of applying a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "outcome", content = "status")]
pub enum DecisionOutcome {
    /// The decision was recorded now.
    Decided(ApprovalStatus),
    /// The same decision had already been recorded; nothing changed.
    AlreadyDecided(ApprovalStatus),
}

impl DecisionOutcome {
    pub fn status(&self) -> ApprovalStatus {
        match self {
            DecisionOutcome::Decided(s) | DecisionOutcome::AlreadyDecided(s) => *s,
        }
    }
}

pub struct ApprovalGate {
    store: Arc<dyn RecordStore>,
    notifier: Arc<dyn ApprovalNotifier>,
    assets: Arc<dyn AssetStore>,
    config: ApprovalConfig,
}

impl ApprovalGate {
    pub fn new(
        store: Arc<dyn RecordStore>,
        notifier: Arc<dyn ApprovalNotifier>,
        assets: Arc<dyn AssetStore>,
        config: ApprovalConfig,
    ) -> Self {
        Self {
            store,
            notifier,
            assets,
            config,
        }
    }

    /// Email the reviewer and move the script to `pending_approval`.
    ///
    /// A script already awaiting a decision gets the email again without a
    /// status change.
    pub async fn send(
        &self,
        script_id: &str,
        overrides: ReviewOverrides,
    ) -> Result<SendOutcome, PipelineError> {
        let started = Instant::now();
        let result = self.send_inner(script_id, overrides).await;
        let label = if result.is_ok() { "success" } else { "error" };
        metrics::observe_stage("approval", label, started);
        result
    }

    async fn send_inner(
        &self,
        script_id: &str,
        overrides: ReviewOverrides,
    ) -> Result<SendOutcome, PipelineError> {
        if script_id.trim().is_empty() {
            return Err(PipelineError::validation("video_id is required"));
        }
        let script = self
            .store
            .get_script(script_id)?
            .ok_or_else(|| PipelineError::script_not_found(script_id))?;

        let resent = match script.status {
            ScriptStatus::VideoReady => false,
            ScriptStatus::PendingApproval => true,
            status if status.is_decided() => {
                return Err(PipelineError::precondition(format!(
                    "script {} was already decided ({})",
                    script.id, status
                )));
            }
            status => {
                return Err(PipelineError::precondition(format!(
                    "script {} is {}, no video to review yet",
                    script.id, status
                )));
            }
        };
        let video = match (&script.video, script.video_locator()) {
            (Some(video), Some(_)) => video,
            _ => {
                return Err(PipelineError::precondition(format!(
                    "script {} has no video",
                    script.id
                )))
            }
        };

        let details = ReviewDetails {
            record_id: script.id.clone(),
            mode: overrides.mode.unwrap_or(script.mode),
            script_text: overrides.script_text.unwrap_or_else(|| script.text.clone()),
            video_url: overrides
                .video_url
                .unwrap_or_else(|| self.assets.public_url(&video.locator)),
            duration: overrides.duration.unwrap_or(video.duration),
            thumbnail_url: overrides.thumbnail_url,
            generated_at: Utc::now(),
        };
        let notification =
            notification::compose(&details, &self.config.base_url, &self.config.recipient);

        let email_id = self
            .notifier
            .notify(&notification)
            .await
            .map_err(|e| PipelineError::collaborator("approval notifier", e))?;

        let resent = resent || self.mark_pending(&script.id)?;

        info!(
            script_id = %script.id,
            email_id = %email_id,
            resent,
            "Sent approval request"
        );
        Ok(SendOutcome {
            script_id: script.id,
            email_id,
            resent,
        })
    }

    /// Move a `video_ready` script to `pending_approval`.
    ///
    /// Returns true when a concurrent send already made the move; the email
    /// just delivered then counts as a resend.
    fn mark_pending(&self, script_id: &str) -> Result<bool, PipelineError> {
        let moved = self.store.transition_script(
            script_id,
            ScriptStatus::VideoReady,
            ScriptChange::to(ScriptStatus::PendingApproval)
                .with_approval(ApprovalStatus::Pending, None),
        );
        match moved {
            Ok(_) => Ok(false),
            Err(e @ StoreError::StaleStatus { .. }) => {
                let current = self
                    .store
                    .get_script(script_id)?
                    .ok_or_else(|| PipelineError::script_not_found(script_id))?;
                if current.status == ScriptStatus::PendingApproval {
                    info!(script_id, "Concurrent send already requested approval");
                    Ok(true)
                } else {
                    Err(e.into())
                }
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Record a reviewer decision.
    ///
    /// Repeating the recorded decision is a no-op; the opposite decision on a
    /// decided script fails and leaves it unchanged.
    pub async fn decide(
        &self,
        script_id: &str,
        action: &str,
    ) -> Result<DecisionOutcome, PipelineError> {
        let action: ApprovalAction = action.parse()?;
        if script_id.trim().is_empty() {
            return Err(PipelineError::validation("video_id is required"));
        }
        let script = self
            .store
            .get_script(script_id)?
            .ok_or_else(|| PipelineError::script_not_found(script_id))?;

        match script.status {
            ScriptStatus::PendingApproval => {
                self.store.transition_script(
                    &script.id,
                    ScriptStatus::PendingApproval,
                    ScriptChange::to(action.target_status())
                        .with_approval(action.approval_status(), Some(Utc::now())),
                )?;
                metrics::APPROVAL_DECISIONS
                    .with_label_values(&[action.as_str()])
                    .inc();
                info!(script_id = %script.id, decision = %action, "Recorded approval decision");
                Ok(DecisionOutcome::Decided(action.approval_status()))
            }
            status if status.is_decided() => {
                if script.approval_status == action.approval_status() {
                    info!(script_id = %script.id, decision = %action, "Decision already recorded");
                    Ok(DecisionOutcome::AlreadyDecided(script.approval_status))
                } else {
                    warn!(
                        script_id = %script.id,
                        recorded = script.approval_status.as_str(),
                        requested = %action,
                        "Conflicting approval decision ignored"
                    );
                    Err(PipelineError::precondition(format!(
                        "script {} was already {}",
                        script.id,
                        script.approval_status.as_str()
                    )))
                }
            }
            status => Err(PipelineError::precondition(format!(
                "script {} is {}, not awaiting approval",
                script.id, status
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use crate::collab::CollaboratorError;
    use crate::record::{
        NewScript, NewTopic, Script, ScriptFilter, ScriptStats, SqliteRecordStore, Topic,
        TopicFilter,
    };
    use crate::storage::LocalAssetStore;
    use crate::testing::{fixtures, MockNotifier};
    use tempfile::TempDir;

    struct Harness {
        _dir: TempDir,
        store: Arc<SqliteRecordStore>,
        notifier: Arc<MockNotifier>,
        gate: ApprovalGate,
    }

    fn harness() -> Harness {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(SqliteRecordStore::in_memory().unwrap());
        let notifier = Arc::new(MockNotifier::new());
        let assets = Arc::new(LocalAssetStore::new(dir.path(), "http://test/assets"));
        let config = ApprovalConfig {
            base_url: "https://shorts.example".into(),
            recipient: "reviewer@example.com".into(),
            ..Default::default()
        };
        let gate = ApprovalGate::new(store.clone(), notifier.clone(), assets, config);
        Harness {
            _dir: dir,
            store,
            notifier,
            gate,
        }
    }

    /// Serves one stale script read, as seen by a request that lost a race,
    /// then delegates everything to the real store.
    struct StaleFirstRead {
        inner: Arc<SqliteRecordStore>,
        stale: Mutex<Option<Script>>,
    }

    impl RecordStore for StaleFirstRead {
        fn insert_topic(&self, topic: NewTopic) -> Result<Topic, StoreError> {
            self.inner.insert_topic(topic)
        }

        fn get_topic(&self, id: &str) -> Result<Option<Topic>, StoreError> {
            self.inner.get_topic(id)
        }

        fn list_topics(&self, filter: &TopicFilter) -> Result<Vec<Topic>, StoreError> {
            self.inner.list_topics(filter)
        }

        fn create_script(&self, script: NewScript) -> Result<Script, StoreError> {
            self.inner.create_script(script)
        }

        fn get_script(&self, id: &str) -> Result<Option<Script>, StoreError> {
            match self.stale.lock().unwrap().take() {
                Some(script) => Ok(Some(script)),
                None => self.inner.get_script(id),
            }
        }

        fn find_script_by_topic(&self, topic_id: &str) -> Result<Option<Script>, StoreError> {
            self.inner.find_script_by_topic(topic_id)
        }

        fn list_scripts(&self, filter: &ScriptFilter) -> Result<Vec<Script>, StoreError> {
            self.inner.list_scripts(filter)
        }

        fn count_scripts(&self, filter: &ScriptFilter) -> Result<i64, StoreError> {
            self.inner.count_scripts(filter)
        }

        fn transition_script(
            &self,
            id: &str,
            expected: ScriptStatus,
            change: ScriptChange,
        ) -> Result<Script, StoreError> {
            self.inner.transition_script(id, expected, change)
        }

        fn script_stats(&self) -> Result<ScriptStats, StoreError> {
            self.inner.script_stats()
        }
    }

    fn video_ready(h: &Harness) -> String {
        let script = fixtures::script(h.store.as_ref(), "AI breakthrough", ScriptMode::Info);
        fixtures::advance_to(h.store.as_ref(), &script.id, ScriptStatus::VideoReady);
        script.id
    }

    #[test]
    fn test_parse_action() {
        assert_eq!("approve".parse::<ApprovalAction>().unwrap(), ApprovalAction::Approve);
        assert!(matches!(
            "delete".parse::<ApprovalAction>(),
            Err(PipelineError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_send_moves_to_pending_approval() {
        let h = harness();
        let id = video_ready(&h);

        let outcome = h.gate.send(&id, ReviewOverrides::default()).await.unwrap();
        assert!(!outcome.resent);
        assert!(!outcome.email_id.is_empty());

        let stored = h.store.get_script(&id).unwrap().unwrap();
        assert_eq!(stored.status, ScriptStatus::PendingApproval);
        assert_eq!(stored.approval_status, ApprovalStatus::Pending);

        let sent = h.notifier.sent().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].recipient, "reviewer@example.com");
        assert!(sent[0].subject.ends_with("INFO 모드"));
        assert_eq!(
            sent[0].preview_url,
            format!("http://test/assets/videos/{}.mp4", id)
        );
    }

    #[tokio::test]
    async fn test_send_uses_overrides() {
        let h = harness();
        let id = video_ready(&h);
        h.gate
            .send(
                &id,
                ReviewOverrides {
                    mode: Some(ScriptMode::Sales),
                    video_url: Some("https://cdn.example/v.mp4".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let sent = h.notifier.sent().await;
        assert!(sent[0].subject.ends_with("SALES 모드"));
        assert_eq!(sent[0].preview_url, "https://cdn.example/v.mp4");
    }

    #[tokio::test]
    async fn test_resend_while_pending() {
        let h = harness();
        let id = video_ready(&h);
        h.gate.send(&id, ReviewOverrides::default()).await.unwrap();
        let outcome = h.gate.send(&id, ReviewOverrides::default()).await.unwrap();
        assert!(outcome.resent);
        assert_eq!(h.notifier.sent().await.len(), 2);
    }

    #[tokio::test]
    async fn test_send_losing_race_counts_as_resend() {
        let h = harness();
        let id = video_ready(&h);
        let snapshot = h.store.get_script(&id).unwrap().unwrap();

        let winner = h.gate.send(&id, ReviewOverrides::default()).await.unwrap();
        assert!(!winner.resent);

        // The second request read the script before the first one moved it.
        let racing = ApprovalGate::new(
            Arc::new(StaleFirstRead {
                inner: h.store.clone(),
                stale: Mutex::new(Some(snapshot)),
            }),
            h.notifier.clone(),
            Arc::new(LocalAssetStore::new(h._dir.path(), "http://test/assets")),
            ApprovalConfig::default(),
        );
        let loser = racing.send(&id, ReviewOverrides::default()).await.unwrap();
        assert!(loser.resent);
        assert!(!loser.email_id.is_empty());

        let sent = h.notifier.sent().await;
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].subject, sent[1].subject);
        assert!(sent[1].approve_url.ends_with(&format!("video_id={}&action=approve", id)));
        let stored = h.store.get_script(&id).unwrap().unwrap();
        assert_eq!(stored.status, ScriptStatus::PendingApproval);
        assert_eq!(stored.approval_status, ApprovalStatus::Pending);
    }

    #[tokio::test]
    async fn test_send_losing_race_to_decision_fails() {
        let h = harness();
        let id = video_ready(&h);
        let snapshot = h.store.get_script(&id).unwrap().unwrap();
        h.gate.send(&id, ReviewOverrides::default()).await.unwrap();
        h.gate.decide(&id, "approve").await.unwrap();

        let racing = ApprovalGate::new(
            Arc::new(StaleFirstRead {
                inner: h.store.clone(),
                stale: Mutex::new(Some(snapshot)),
            }),
            h.notifier.clone(),
            Arc::new(LocalAssetStore::new(h._dir.path(), "http://test/assets")),
            ApprovalConfig::default(),
        );
        let err = racing.send(&id, ReviewOverrides::default()).await.unwrap_err();
        assert!(matches!(err, PipelineError::Precondition(_)));
        assert_eq!(
            h.store.get_script(&id).unwrap().unwrap().status,
            ScriptStatus::Approved
        );
    }

    #[tokio::test]
    async fn test_send_includes_thumbnail() {
        let h = harness();
        let id = video_ready(&h);
        h.gate
            .send(
                &id,
                ReviewOverrides {
                    thumbnail_url: Some("https://cdn.example/thumb.jpg".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let sent = h.notifier.sent().await;
        assert!(sent[0]
            .html_body
            .contains(r#"<img src="https://cdn.example/thumb.jpg" class="thumbnail""#));
        assert!(sent[0].html_body.contains("생성 시간"));
    }

    #[tokio::test]
    async fn test_send_preconditions() {
        let h = harness();
        let err = h.gate.send("missing", ReviewOverrides::default()).await.unwrap_err();
        assert!(matches!(err, PipelineError::NotFound { .. }));

        let script = fixtures::script(h.store.as_ref(), "AI", ScriptMode::Info);
        let err = h
            .gate
            .send(&script.id, ReviewOverrides::default())
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Precondition(_)));

        fixtures::advance_to(h.store.as_ref(), &script.id, ScriptStatus::Rejected);
        let err = h
            .gate
            .send(&script.id, ReviewOverrides::default())
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Precondition(_)));
        assert!(h.notifier.sent().await.is_empty());
    }

    #[tokio::test]
    async fn test_notifier_failure_leaves_status() {
        let h = harness();
        let id = video_ready(&h);
        h.notifier
            .set_next_error(CollaboratorError::Http("relay down".into()))
            .await;

        let err = h.gate.send(&id, ReviewOverrides::default()).await.unwrap_err();
        assert!(matches!(err, PipelineError::Collaborator { .. }));
        let stored = h.store.get_script(&id).unwrap().unwrap();
        assert_eq!(stored.status, ScriptStatus::VideoReady);
    }

    #[tokio::test]
    async fn test_approve_twice_is_noop() {
        let h = harness();
        let id = video_ready(&h);
        h.gate.send(&id, ReviewOverrides::default()).await.unwrap();

        let first = h.gate.decide(&id, "approve").await.unwrap();
        assert_eq!(first, DecisionOutcome::Decided(ApprovalStatus::Approved));
        let decided_at = h
            .store
            .get_script(&id)
            .unwrap()
            .unwrap()
            .approval_decided_at
            .unwrap();

        let second = h.gate.decide(&id, "approve").await.unwrap();
        assert_eq!(second, DecisionOutcome::AlreadyDecided(ApprovalStatus::Approved));
        let stored = h.store.get_script(&id).unwrap().unwrap();
        assert_eq!(stored.approval_decided_at, Some(decided_at));
        assert_eq!(stored.status, ScriptStatus::Approved);
    }

    #[tokio::test]
    async fn test_approve_after_reject_keeps_rejected() {
        let h = harness();
        let id = video_ready(&h);
        h.gate.send(&id, ReviewOverrides::default()).await.unwrap();
        h.gate.decide(&id, "reject").await.unwrap();

        let err = h.gate.decide(&id, "approve").await.unwrap_err();
        assert!(matches!(err, PipelineError::Precondition(_)));
        let stored = h.store.get_script(&id).unwrap().unwrap();
        assert_eq!(stored.status, ScriptStatus::Rejected);
        assert_eq!(stored.approval_status, ApprovalStatus::Rejected);
    }

    #[tokio::test]
    async fn test_decide_errors() {
        let h = harness();
        let id = video_ready(&h);

        let err = h.gate.decide(&id, "maybe").await.unwrap_err();
        assert!(matches!(err, PipelineError::Validation(_)));

        let err = h.gate.decide("missing", "approve").await.unwrap_err();
        assert!(matches!(err, PipelineError::NotFound { .. }));

        // Not sent for approval yet
        let err = h.gate.decide(&id, "approve").await.unwrap_err();
        assert!(matches!(err, PipelineError::Precondition(_)));
    }
}
