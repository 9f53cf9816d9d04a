//! Notification dispatch contract.
//!
//! Dispatch is fire-and-forget: callers bound every send with a timeout and
//! swallow failures, so a broken sink can never fail or roll back the state
//! change it reports on.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use common::UserId;
use thiserror::Error;

/// What a notification is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    /// A buyer's order was placed.
    OrderConfirmation,

    /// An order's status changed.
    OrderStatusUpdated,
}

/// Dispatch failure. Only ever logged, never propagated.
#[derive(Debug, Error)]
#[error("notification dispatch failed: {0}")]
pub struct NotifyError(pub String);

/// Sink for outbound notifications.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Delivers a notification to a user.
    async fn notify(
        &self,
        user_id: UserId,
        kind: NotificationKind,
        payload: serde_json::Value,
    ) -> Result<(), NotifyError>;
}

#[derive(Debug, Default)]
struct NotifierState {
    sent: Vec<(UserId, NotificationKind, serde_json::Value)>,
    fail: bool,
    delay: Option<Duration>,
}

/// In-memory notification sink for tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryNotifier {
    state: Arc<Mutex<NotifierState>>,
}

impl InMemoryNotifier {
    /// Creates a new in-memory notifier.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the sink to fail every send.
    pub fn set_fail(&self, fail: bool) {
        self.state.lock().unwrap().fail = fail;
    }

    /// Configures the sink to sleep before answering.
    pub fn set_delay(&self, delay: Duration) {
        self.state.lock().unwrap().delay = Some(delay);
    }

    /// Returns the number of delivered notifications.
    pub fn sent_count(&self) -> usize {
        self.state.lock().unwrap().sent.len()
    }

    /// Returns the delivered notifications.
    pub fn sent(&self) -> Vec<(UserId, NotificationKind, serde_json::Value)> {
        self.state.lock().unwrap().sent.clone()
    }
}

#[async_trait]
impl NotificationSink for InMemoryNotifier {
    async fn notify(
        &self,
        user_id: UserId,
        kind: NotificationKind,
        payload: serde_json::Value,
    ) -> Result<(), NotifyError> {
        let (fail, delay) = {
            let state = self.state.lock().unwrap();
            (state.fail, state.delay)
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if fail {
            return Err(NotifyError("sink unavailable".to_string()));
        }

        self.state.lock().unwrap().sent.push((user_id, kind, payload));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_delivered_notifications() {
        let notifier = InMemoryNotifier::new();
        let user_id = UserId::new();

        notifier
            .notify(
                user_id,
                NotificationKind::OrderConfirmation,
                serde_json::json!({"hello": "world"}),
            )
            .await
            .unwrap();

        let sent = notifier.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, user_id);
        assert_eq!(sent[0].1, NotificationKind::OrderConfirmation);
    }

    #[tokio::test]
    async fn fails_when_configured_to() {
        let notifier = InMemoryNotifier::new();
        notifier.set_fail(true);

        let result = notifier
            .notify(
                UserId::new(),
                NotificationKind::OrderStatusUpdated,
                serde_json::Value::Null,
            )
            .await;

        assert!(result.is_err());
        assert_eq!(notifier.sent_count(), 0);
    }
}
