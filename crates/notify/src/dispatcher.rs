//! Notification dispatch: the delivery-channel seam and the detached task.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use thiserror::Error;
use tracing::warn;

use crate::event::Notification;

/// Delivery failed. Only ever observed inside the detached dispatch task,
/// where it is logged; the caller that triggered the notification never
/// sees it.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("notification dispatch failed: {0}")]
pub struct DispatchError(pub String);

/// A delivery channel for rendered notifications (SMS gateway, WhatsApp
/// bridge, ...). Implementations own their transport; the core neither
/// retries nor inspects channel-level failures.
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn dispatch(&self, notification: Notification) -> Result<(), DispatchError>;
}

/// Hand a notification to the dispatcher on a detached task.
///
/// The spawned work is deliberately unawaited: the status change that
/// produced the notification is already persisted and authoritative, so the
/// initiating request returns immediately and a delivery failure is logged
/// once, never retried, never rolled back.
pub fn spawn_dispatch(dispatcher: Arc<dyn NotificationDispatcher>, notification: Notification) {
    tokio::spawn(async move {
        let id = notification.id;
        if let Err(err) = dispatcher.dispatch(notification).await {
            warn!(notification_id = %id, error = %err, "notification dispatch failed");
        }
    });
}

/// Dispatcher that only logs. The default channel in dev and the fallback
/// when no gateway is configured.
#[derive(Debug, Default, Clone)]
pub struct TracingDispatcher;

#[async_trait]
impl NotificationDispatcher for TracingDispatcher {
    async fn dispatch(&self, notification: Notification) -> Result<(), DispatchError> {
        tracing::info!(
            notification_id = %notification.id,
            phone = %notification.phone,
            kind = ?notification.kind,
            message = %notification.message,
            "notification dispatched"
        );
        Ok(())
    }
}

/// In-memory recording dispatcher.
///
/// Intended for tests/dev: records everything dispatched, and can be told
/// to fail to exercise the fire-and-forget contract.
#[derive(Debug, Default)]
pub struct MemoryDispatcher {
    sent: Mutex<Vec<Notification>>,
    fail: Mutex<bool>,
}

impl MemoryDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent dispatch fail.
    pub fn fail_all(&self) {
        *self.fail.lock().expect("dispatcher lock poisoned") = true;
    }

    /// Everything dispatched so far.
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().expect("dispatcher lock poisoned").clone()
    }
}

#[async_trait]
impl NotificationDispatcher for MemoryDispatcher {
    async fn dispatch(&self, notification: Notification) -> Result<(), DispatchError> {
        let failing = *self
            .fail
            .lock()
            .map_err(|_| DispatchError("lock poisoned".to_string()))?;
        if failing {
            return Err(DispatchError("channel unavailable".to_string()));
        }
        self.sent
            .lock()
            .map_err(|_| DispatchError("lock poisoned".to_string()))?
            .push(notification);
        Ok(())
    }
}
