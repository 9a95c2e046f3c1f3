//! Read models over the order event log.
//!
//! - [`Projection`]: turns stored events into a read model
//! - [`ProjectionProcessor`]: feeds the global event log to projections
//! - [`OrderStatusBoard`]: current status of every order
//! - [`TransitionLog`]: every recorded status change, across orders

pub mod error;
pub mod processor;
pub mod projection;
pub mod views;

pub use error::{ProjectionError, Result};
pub use processor::ProjectionProcessor;
pub use projection::{Projection, ProjectionPosition};
pub use views::{
    BoardFilter, OrderStatusBoard, OrderSummary, StatusCount, TransitionFilter, TransitionLog,
    TransitionRecord,
};
