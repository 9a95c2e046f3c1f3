//! Read model views.

mod status_board;
mod transition_log;

pub use status_board::{BoardFilter, OrderStatusBoard, OrderSummary, StatusCount};
pub use transition_log::{TransitionFilter, TransitionLog, TransitionRecord};
