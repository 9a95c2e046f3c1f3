//! Placing orders and reading them back.

use chrono::{DateTime, Utc};
use common::{DocumentId, PageMeta, PageRequest};
use event_store::{EventStore, Sequence};
use serde::Serialize;

use crate::command::{CommandHandler, CommandResult};
use crate::error::DomainError;

use super::{Order, OrderEvent, PlaceOrder, StatusTransition};

/// A status history entry together with its position in the order's stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    pub sequence: Sequence,
    pub recorded_at: DateTime<Utc>,
    #[serde(flatten)]
    pub transition: StatusTransition,
}

pub struct OrderService<S: EventStore> {
    handler: CommandHandler<S, Order>,
}

impl<S: EventStore> OrderService<S> {
    /// Creates a new order service with the given event store.
    pub fn new(store: S) -> Self {
        Self {
            handler: CommandHandler::new(store),
        }
    }

    /// Places a new order.
    #[tracing::instrument(skip(self, cmd), fields(order_id = %cmd.order_id))]
    pub async fn place_order(&self, cmd: PlaceOrder) -> Result<CommandResult<Order>, DomainError> {
        let now = Utc::now();
        let placed_by = cmd.placed_by.clone();

        let result = self
            .handler
            .execute(cmd.order_id, placed_by, |order| order.place(&cmd, now))
            .await?;

        tracing::info!(status = %result.aggregate.status(), "Order placed");
        Ok(result)
    }

    /// Loads an order, failing with `NotFound` if it was never placed.
    pub async fn get_order(&self, order_id: DocumentId) -> Result<Order, DomainError> {
        self.handler
            .load_existing(order_id)
            .await?
            .ok_or(DomainError::NotFound {
                entity: "order",
                id: order_id,
            })
    }

    /// Recorded transitions of one order, oldest first.
    pub async fn status_history(
        &self,
        order_id: DocumentId,
        page: PageRequest,
    ) -> Result<(Vec<HistoryEntry>, PageMeta), DomainError> {
        let events = self.handler.store().read_stream(order_id).await?;
        if events.is_empty() {
            return Err(DomainError::NotFound {
                entity: "order",
                id: order_id,
            });
        }

        let mut entries = Vec::new();
        for stored in events.iter().filter(|e| e.event_type == "StatusChanged") {
            if let OrderEvent::StatusChanged(transition) = stored.decode::<OrderEvent>()? {
                entries.push(HistoryEntry {
                    sequence: stored.sequence,
                    recorded_at: stored.recorded_at,
                    transition,
                });
            }
        }

        Ok(page.slice(entries))
    }
}
