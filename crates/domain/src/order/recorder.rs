//! Recording validated order status changes.

use chrono::Utc;
use common::DocumentId;
use event_store::{EventStore, Sequence};
use tokio::task::JoinHandle;

use crate::command::CommandHandler;
use crate::error::DomainError;
use crate::lifecycle::Lifecycle;
use crate::notification::{NotificationDispatcher, StatusNotification};

use super::{Order, OrderError, OrderEvent, RecordStatusChange, StatusTransition};

/// A status change that has been appended to the order's history.
#[derive(Debug)]
pub struct RecordedTransition {
    pub order_id: DocumentId,
    pub transition: StatusTransition,
    /// Stream sequence of the appended entry.
    pub sequence: Sequence,
    /// Delivery task, when a notification was requested and dispatch is
    /// enabled. Dropping it detaches the task.
    pub notification: Option<JoinHandle<()>>,
}

/// Validates status changes against the order lifecycle and appends them to
/// the order's history.
///
/// The caller's `previous_status` must match the order's live status, and the
/// append only succeeds if no other change landed since the order was loaded.
/// Of two racing updates built on the same status, exactly one is recorded.
pub struct StatusUpdateRecorder<S: EventStore> {
    handler: CommandHandler<S, Order>,
    notifications: NotificationDispatcher,
}

impl<S: EventStore> StatusUpdateRecorder<S> {
    /// Creates a recorder over `store` that dispatches through `notifications`.
    pub fn new(store: S, notifications: NotificationDispatcher) -> Self {
        Self {
            handler: CommandHandler::new(store),
            notifications,
        }
    }

    /// Records one status transition.
    ///
    /// Fails with `NotFound` for an unknown order, `StatusMismatch` when
    /// `previous_status` is no longer the live status, `InvalidTransition` when
    /// the lifecycle forbids the move, and a sequence conflict when another
    /// writer appended first. Nothing is appended on failure.
    #[tracing::instrument(
        skip(self, cmd),
        fields(
            order_id = %cmd.order_id,
            from = %cmd.previous_status,
            to = %cmd.new_status,
            triggered_by = %cmd.triggered_by,
        )
    )]
    pub async fn record(&self, cmd: RecordStatusChange) -> Result<RecordedTransition, DomainError> {
        let order_id = cmd.order_id;
        let now = Utc::now();

        let outcome = self
            .handler
            .execute(order_id, Some(cmd.updated_by.clone()), |order| {
                order
                    .record_status_change(&cmd, now)
                    .map(|transition| vec![OrderEvent::StatusChanged(transition)])
            })
            .await;

        let result = match outcome {
            Ok(result) => result,
            Err(DomainError::Order(OrderError::NotPlaced)) => {
                count_rejection("not_found");
                return Err(DomainError::NotFound {
                    entity: "order",
                    id: order_id,
                });
            }
            Err(e) => {
                if let Some(reason) = rejection_reason(&e) {
                    count_rejection(reason);
                    tracing::info!(reason, error = %e, "Status change rejected");
                }
                return Err(e);
            }
        };

        let Some(transition) = result.events.iter().find_map(OrderEvent::as_transition).cloned()
        else {
            return Err(DomainError::UnexpectedOutcome(
                "status change appended no transition",
            ));
        };

        metrics::counter!(
            "status_transitions_recorded_total",
            "from" => transition.previous_status.as_str(),
            "to" => transition.new_status.as_str()
        )
        .increment(1);

        for warning in &transition.warnings {
            tracing::warn!(warning = %warning, "Sensitive status transition");
        }
        tracing::info!(sequence = %result.sequence, "Status change recorded");

        let notification = cmd.notify.then(|| {
            self.notifications.dispatch(StatusNotification::for_transition(
                order_id,
                result.aggregate.customer_id(),
                &transition,
            ))
        });

        Ok(RecordedTransition {
            order_id,
            transition,
            sequence: result.sequence,
            notification: notification.flatten(),
        })
    }
}

fn rejection_reason(err: &DomainError) -> Option<&'static str> {
    match err {
        DomainError::Order(OrderError::StatusMismatch { .. }) => Some("stale_status"),
        DomainError::Order(OrderError::InvalidTransition { .. }) => Some("invalid_transition"),
        e if e.is_conflict() => Some("conflict"),
        _ => None,
    }
}

fn count_rejection(reason: &'static str) {
    metrics::counter!("status_transitions_rejected_total", "reason" => reason).increment(1);
}
