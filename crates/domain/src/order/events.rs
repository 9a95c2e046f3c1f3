//! Order domain events.

use chrono::{DateTime, Utc};
use common::DocumentId;
use serde::{Deserialize, Serialize};

use crate::aggregate::DomainEvent;
use crate::lifecycle::OrderStatus;

use super::{CustomerId, Money, StatusTransition};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum OrderEvent {
    OrderPlaced(OrderPlacedData),
    /// Carries the history entry; applying it moves the live status.
    StatusChanged(StatusTransition),
}

impl DomainEvent for OrderEvent {
    fn event_type(&self) -> &'static str {
        match self {
            OrderEvent::OrderPlaced(_) => "OrderPlaced",
            OrderEvent::StatusChanged(_) => "StatusChanged",
        }
    }
}

impl OrderEvent {
    /// Returns the transition carried by a `StatusChanged` event.
    pub fn as_transition(&self) -> Option<&StatusTransition> {
        match self {
            OrderEvent::StatusChanged(transition) => Some(transition),
            OrderEvent::OrderPlaced(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPlacedData {
    pub order_id: DocumentId,
    pub customer_id: CustomerId,
    pub status: OrderStatus,
    pub total_amount: Money,
    pub placed_at: DateTime<Utc>,
}
