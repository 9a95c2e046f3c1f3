//! Best-effort notifications about order status changes.
//!
//! Delivery is fire-and-forget: the dispatcher spawns one task per
//! notification, never retries, and only logs and counts failures. Callers
//! that want to wait for delivery can await the returned `JoinHandle`.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::DocumentId;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::lifecycle::OrderStatus;
use crate::order::{CustomerId, StatusTransition, TriggeredBy};

/// What the customer is told about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusNotification {
    pub order_id: DocumentId,
    pub customer_id: Option<CustomerId>,
    pub previous_status: OrderStatus,
    pub new_status: OrderStatus,
    pub triggered_by: TriggeredBy,
    pub timestamp: DateTime<Utc>,
    pub notes: Option<String>,
}

impl StatusNotification {
    /// Builds the notification for a recorded transition.
    pub fn for_transition(
        order_id: DocumentId,
        customer_id: Option<CustomerId>,
        transition: &StatusTransition,
    ) -> Self {
        Self {
            order_id,
            customer_id,
            previous_status: transition.previous_status,
            new_status: transition.new_status,
            triggered_by: transition.triggered_by,
            timestamp: transition.timestamp,
            notes: transition.notes.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotificationError {
    #[error("{channel} delivery failed: {message}")]
    Delivery {
        channel: &'static str,
        message: String,
    },
}

/// A delivery channel (email, SMS, ...).
#[async_trait]
pub trait Notifier: Send + Sync {
    fn channel(&self) -> &'static str;

    async fn notify(&self, notification: &StatusNotification) -> Result<(), NotificationError>;
}

/// Writes a structured log line in place of a real delivery.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    fn channel(&self) -> &'static str {
        "log"
    }

    async fn notify(&self, notification: &StatusNotification) -> Result<(), NotificationError> {
        tracing::info!(
            order_id = %notification.order_id,
            from = %notification.previous_status,
            to = %notification.new_status,
            triggered_by = %notification.triggered_by,
            "Order status notification"
        );
        Ok(())
    }
}

/// Keeps every notification it is given. Can be switched to failing mode.
#[derive(Debug, Clone, Default)]
pub struct InMemoryNotifier {
    sent: Arc<Mutex<Vec<StatusNotification>>>,
    failing: Arc<AtomicBool>,
}

impl InMemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// A notifier whose every delivery fails.
    pub fn failing() -> Self {
        let notifier = Self::default();
        notifier.set_failing(true);
        notifier
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Returns every notification delivered so far.
    pub async fn sent(&self) -> Vec<StatusNotification> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl Notifier for InMemoryNotifier {
    fn channel(&self) -> &'static str {
        "memory"
    }

    async fn notify(&self, notification: &StatusNotification) -> Result<(), NotificationError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(NotificationError::Delivery {
                channel: self.channel(),
                message: "notifier is in failing mode".to_string(),
            });
        }
        self.sent.lock().await.push(notification.clone());
        Ok(())
    }
}

/// Hands notifications to a [`Notifier`] on a detached task.
#[derive(Clone)]
pub struct NotificationDispatcher {
    notifier: Option<Arc<dyn Notifier>>,
}

impl NotificationDispatcher {
    /// Creates a dispatcher that delivers through `notifier`.
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self {
            notifier: Some(notifier),
        }
    }

    /// A dispatcher that drops everything.
    pub fn disabled() -> Self {
        Self { notifier: None }
    }

    /// Returns true if notifications are delivered at all.
    pub fn is_enabled(&self) -> bool {
        self.notifier.is_some()
    }

    /// Spawns delivery and returns immediately. Must be called from within a
    /// tokio runtime.
    pub fn dispatch(&self, notification: StatusNotification) -> Option<JoinHandle<()>> {
        let Some(notifier) = self.notifier.clone() else {
            tracing::debug!(
                order_id = %notification.order_id,
                "Notifications disabled, dropping"
            );
            return None;
        };

        Some(tokio::spawn(async move {
            if let Err(e) = notifier.notify(&notification).await {
                metrics::counter!(
                    "status_notifications_failed_total",
                    "channel" => notifier.channel()
                )
                .increment(1);
                tracing::warn!(
                    order_id = %notification.order_id,
                    to = %notification.new_status,
                    error = %e,
                    "Failed to deliver status notification"
                );
            }
        }))
    }
}

impl Default for NotificationDispatcher {
    fn default() -> Self {
        Self::new(Arc::new(LogNotifier))
    }
}

impl std::fmt::Debug for NotificationDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationDispatcher")
            .field("channel", &self.notifier.as_ref().map(|n| n.channel()))
            .finish()
    }
}
