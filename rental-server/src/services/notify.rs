//! Notification trigger contract
//!
//! The engine only decides WHEN to notify; delivery transport lives behind
//! the [`NotificationDispatcher`] trait. Dispatch is fire-and-forget and a
//! failed dispatch never rolls back the state transition that caused it.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use shared::models::NotificationEvent;
use uuid::Uuid;

/// Result of a dispatch attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Sent,
    Failed,
}

/// Delivery capability carried in `AppState`.
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn dispatch(
        &self,
        user_id: Uuid,
        event: NotificationEvent,
        template_data: Value,
    ) -> DispatchOutcome;
}

/// Default dispatcher: structured log lines instead of real delivery.
pub struct LogDispatcher;

#[async_trait]
impl NotificationDispatcher for LogDispatcher {
    async fn dispatch(
        &self,
        user_id: Uuid,
        event: NotificationEvent,
        template_data: Value,
    ) -> DispatchOutcome {
        tracing::info!(
            user_id = %user_id,
            event = %event,
            data = %template_data,
            "Notification dispatched"
        );
        DispatchOutcome::Sent
    }
}

/// Fire-and-forget dispatch on a background task.
pub fn fire(
    notifier: &Arc<dyn NotificationDispatcher>,
    user_id: Uuid,
    event: NotificationEvent,
    template_data: Value,
) {
    let notifier = Arc::clone(notifier);
    tokio::spawn(async move {
        if notifier.dispatch(user_id, event, template_data).await == DispatchOutcome::Failed {
            tracing::warn!(
                user_id = %user_id,
                event = %event,
                "Notification dispatch failed"
            );
        }
    });
}
