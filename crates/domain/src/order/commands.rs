//! Commands accepted by the order document.

use common::{DocumentId, UserId};

use crate::lifecycle::OrderStatus;

use super::{CustomerId, Money, TriggeredBy};

#[derive(Debug, Clone)]
pub struct PlaceOrder {
    pub order_id: DocumentId,
    pub customer_id: CustomerId,
    pub total_amount: Money,
    pub initial_status: OrderStatus,
    pub placed_by: Option<UserId>,
}

impl PlaceOrder {
    /// Creates a command for a new order in `pending`.
    pub fn new(customer_id: CustomerId, total_amount: Money) -> Self {
        Self {
            order_id: DocumentId::new(),
            customer_id,
            total_amount,
            initial_status: OrderStatus::Pending,
            placed_by: None,
        }
    }

    /// Places the order directly in `payment_pending`.
    pub fn awaiting_payment(mut self) -> Self {
        self.initial_status = OrderStatus::PaymentPending;
        self
    }

    pub fn placed_by(mut self, user: UserId) -> Self {
        self.placed_by = Some(user);
        self
    }
}

/// Request to move an order from `previous_status` to `new_status`.
///
/// `previous_status` is the status the caller believes the order is in; the
/// change is refused when the order has moved on since.
#[derive(Debug, Clone)]
pub struct RecordStatusChange {
    pub order_id: DocumentId,
    pub previous_status: OrderStatus,
    pub new_status: OrderStatus,
    pub triggered_by: TriggeredBy,
    pub updated_by: UserId,
    pub notes: Option<String>,
    pub reason: Option<String>,
    pub notify: bool,
}

impl RecordStatusChange {
    pub fn new(
        order_id: DocumentId,
        previous_status: OrderStatus,
        new_status: OrderStatus,
        updated_by: UserId,
    ) -> Self {
        Self {
            order_id,
            previous_status,
            new_status,
            triggered_by: TriggeredBy::default(),
            updated_by,
            notes: None,
            reason: None,
            notify: false,
        }
    }

    pub fn triggered_by(mut self, trigger: TriggeredBy) -> Self {
        self.triggered_by = trigger;
        self
    }

    /// Attaches free-form notes to the history entry.
    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Requests a notification once the transition is recorded.
    pub fn notify(mut self, notify: bool) -> Self {
        self.notify = notify;
        self
    }
}
