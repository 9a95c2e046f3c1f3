//! Order status lifecycle domain.
//!
//! - [`lifecycle`]: allow-list tables and the pure transition validator for
//!   orders, payments and checkout sessions
//! - [`order`]: the event-sourced order document, whose stream doubles as its
//!   status history, and the [`StatusUpdateRecorder`]
//! - [`notification`]: fire-and-forget delivery of status notifications

pub mod aggregate;
pub mod command;
pub mod error;
pub mod lifecycle;
pub mod notification;
pub mod order;

pub use aggregate::{Aggregate, DomainEvent};
pub use command::{CommandHandler, CommandResult};
pub use error::DomainError;
pub use lifecycle::{
    CheckoutStep, EntityKind, Lifecycle, OrderStatus, PaymentStatus, TransitionValidation,
    UnknownEntityKind, UnknownStatus, validate, validate_named,
};
pub use notification::{
    InMemoryNotifier, LogNotifier, NotificationDispatcher, NotificationError, Notifier,
    StatusNotification,
};
pub use order::{
    CustomerId, HistoryEntry, Money, Order, OrderError, OrderEvent, OrderPlacedData,
    OrderService, PlaceOrder, RecordStatusChange, RecordedTransition, StatusTransition,
    StatusUpdateRecorder, TriggeredBy, UnknownTrigger,
};
