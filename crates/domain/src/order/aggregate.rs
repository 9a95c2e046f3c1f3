//! Order aggregate.

use chrono::{DateTime, Duration, Utc};
use common::DocumentId;
use event_store::Sequence;

use crate::aggregate::Aggregate;
use crate::lifecycle::{OrderStatus, validate};

use super::{
    CustomerId, Money, OrderError, OrderEvent, OrderPlacedData, PlaceOrder, RecordStatusChange,
    StatusTransition,
};

/// An order as seen by the status service.
///
/// The live `status` only ever changes by applying a `StatusChanged` event,
/// and every such event is also the order's history entry.
#[derive(Debug, Clone, Default)]
pub struct Order {
    id: Option<DocumentId>,
    sequence: Sequence,
    customer_id: Option<CustomerId>,
    status: OrderStatus,
    total_amount: Money,
    placed_at: Option<DateTime<Utc>>,
    last_transition_at: Option<DateTime<Utc>>,
    transition_count: u64,
}

impl Aggregate for Order {
    type Event = OrderEvent;
    type Error = OrderError;

    fn stream_type() -> &'static str {
        "Order"
    }

    fn id(&self) -> Option<DocumentId> {
        self.id
    }

    fn sequence(&self) -> Sequence {
        self.sequence
    }

    fn set_sequence(&mut self, sequence: Sequence) {
        self.sequence = sequence;
    }

    fn apply(&mut self, event: Self::Event) {
        match event {
            OrderEvent::OrderPlaced(data) => {
                self.id = Some(data.order_id);
                self.customer_id = Some(data.customer_id);
                self.status = data.status;
                self.total_amount = data.total_amount;
                self.placed_at = Some(data.placed_at);
            }
            OrderEvent::StatusChanged(transition) => {
                self.status = transition.new_status;
                self.last_transition_at = Some(transition.timestamp);
                self.transition_count += 1;
            }
        }
    }
}

impl Order {
    /// Returns the customer who placed the order.
    pub fn customer_id(&self) -> Option<CustomerId> {
        self.customer_id
    }

    /// Returns the live status.
    pub fn status(&self) -> OrderStatus {
        self.status
    }

    /// Returns the order total.
    pub fn total_amount(&self) -> Money {
        self.total_amount
    }

    pub fn placed_at(&self) -> Option<DateTime<Utc>> {
        self.placed_at
    }

    /// Returns the timestamp of the latest recorded transition.
    pub fn last_transition_at(&self) -> Option<DateTime<Utc>> {
        self.last_transition_at
    }

    /// Returns the number of recorded transitions.
    pub fn transition_count(&self) -> u64 {
        self.transition_count
    }
}

impl Order {
    /// Validates a placement and returns the `OrderPlaced` event.
    pub fn place(&self, cmd: &PlaceOrder, now: DateTime<Utc>) -> Result<Vec<OrderEvent>, OrderError> {
        if self.id.is_some() {
            return Err(OrderError::AlreadyPlaced);
        }
        if !cmd.initial_status.is_initial() {
            return Err(OrderError::InvalidInitialStatus(cmd.initial_status));
        }
        if cmd.total_amount.is_negative() {
            return Err(OrderError::NegativeAmount {
                cents: cmd.total_amount.cents(),
            });
        }

        Ok(vec![OrderEvent::OrderPlaced(OrderPlacedData {
            order_id: cmd.order_id,
            customer_id: cmd.customer_id,
            status: cmd.initial_status,
            total_amount: cmd.total_amount,
            placed_at: now,
        })])
    }

    /// Produces the history entry for a status change.
    ///
    /// The entry's timestamp is strictly later than the order's previous
    /// transition (or its placement): a clock reading that is not is moved
    /// one microsecond past it.
    pub fn record_status_change(
        &self,
        cmd: &RecordStatusChange,
        now: DateTime<Utc>,
    ) -> Result<StatusTransition, OrderError> {
        if self.id.is_none() {
            return Err(OrderError::NotPlaced);
        }
        if cmd.previous_status != self.status {
            return Err(OrderError::StatusMismatch {
                expected: cmd.previous_status,
                actual: self.status,
            });
        }

        let verdict = validate(cmd.previous_status, cmd.new_status);
        if !verdict.is_valid {
            return Err(OrderError::InvalidTransition {
                previous: cmd.previous_status,
                new: cmd.new_status,
                errors: verdict.errors,
            });
        }

        Ok(StatusTransition {
            previous_status: cmd.previous_status,
            new_status: cmd.new_status,
            triggered_by: cmd.triggered_by,
            timestamp: self.next_timestamp(now),
            notes: cmd.notes.clone(),
            reason: cmd.reason.clone(),
            updated_by: cmd.updated_by.clone(),
            warnings: verdict.warnings,
        })
    }

    fn next_timestamp(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self.last_transition_at.or(self.placed_at) {
            Some(floor) if now <= floor => floor + Duration::microseconds(1),
            _ => now,
        }
    }
}
