//! The order document: placement, status changes and their history.

mod aggregate;
mod commands;
mod events;
mod recorder;
mod service;
mod transition;
mod value_objects;

pub use aggregate::Order;
pub use commands::{PlaceOrder, RecordStatusChange};
pub use events::{OrderEvent, OrderPlacedData};
pub use recorder::{RecordedTransition, StatusUpdateRecorder};
pub use service::{HistoryEntry, OrderService};
pub use transition::{StatusTransition, TriggeredBy, UnknownTrigger};
pub use value_objects::{CustomerId, Money};

use thiserror::Error;

use crate::lifecycle::OrderStatus;

/// Rules an order command can break.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    #[error("Order already placed")]
    AlreadyPlaced,

    #[error("Order has not been placed")]
    NotPlaced,

    #[error("An order cannot be placed as {0}")]
    InvalidInitialStatus(OrderStatus),

    #[error("Order total must not be negative, got {cents} cents")]
    NegativeAmount { cents: i64 },

    /// The caller's view of the order is out of date.
    #[error("Order status is {actual}, but the update expected {expected}")]
    StatusMismatch {
        expected: OrderStatus,
        actual: OrderStatus,
    },

    #[error("Invalid transition from {previous} to {new}")]
    InvalidTransition {
        previous: OrderStatus,
        new: OrderStatus,
        errors: Vec<String>,
    },
}
