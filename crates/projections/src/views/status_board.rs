//! Order status board: the live status of every order.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{DocumentId, PageMeta, PageRequest};
use domain::{Aggregate, CustomerId, Lifecycle, Money, Order, OrderEvent, OrderStatus};
use event_store::StoredEvent;
use serde::Serialize;
use tokio::sync::RwLock;

use crate::Result;
use crate::projection::Projection;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderSummary {
    pub order_id: DocumentId,
    pub customer_id: CustomerId,
    pub status: OrderStatus,
    pub total_amount: Money,
    pub placed_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub transition_count: u64,
}

/// Optional constraints for [`OrderStatusBoard::list`].
#[derive(Debug, Clone, Copy, Default)]
pub struct BoardFilter {
    pub status: Option<OrderStatus>,
    pub customer_id: Option<CustomerId>,
}

impl BoardFilter {
    fn matches(&self, summary: &OrderSummary) -> bool {
        self.status.is_none_or(|s| s == summary.status)
            && self.customer_id.is_none_or(|c| c == summary.customer_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusCount {
    pub status: OrderStatus,
    pub count: u64,
}

#[derive(Clone, Default)]
pub struct OrderStatusBoard {
    orders: Arc<RwLock<HashMap<DocumentId, OrderSummary>>>,
}

impl OrderStatusBoard {
    /// Creates an empty board.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the summary for one order, if the board has seen it.
    pub async fn get(&self, order_id: DocumentId) -> Option<OrderSummary> {
        self.orders.read().await.get(&order_id).cloned()
    }

    /// Returns the number of orders on the board.
    pub async fn len(&self) -> usize {
        self.orders.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.orders.read().await.is_empty()
    }

    /// Matching orders, oldest placement first.
    pub async fn list(&self, filter: BoardFilter, page: PageRequest) -> (Vec<OrderSummary>, PageMeta) {
        let mut matching: Vec<_> = self
            .orders
            .read()
            .await
            .values()
            .filter(|o| filter.matches(o))
            .cloned()
            .collect();
        matching.sort_by(|a, b| {
            a.placed_at
                .cmp(&b.placed_at)
                .then_with(|| a.order_id.cmp(&b.order_id))
        });
        page.slice(matching)
    }

    /// Number of orders in each status, in lifecycle order. Statuses with no
    /// orders are included with a zero count.
    pub async fn counts_by_status(&self) -> Vec<StatusCount> {
        let orders = self.orders.read().await;
        OrderStatus::ALL
            .iter()
            .map(|&status| StatusCount {
                status,
                count: orders.values().filter(|o| o.status == status).count() as u64,
            })
            .collect()
    }
}

#[async_trait]
impl Projection for OrderStatusBoard {
    fn name(&self) -> &'static str {
        "OrderStatusBoard"
    }

    async fn handle(&self, event: &StoredEvent) -> Result<()> {
        if event.stream_type == Order::stream_type() {
            let order_id = event.stream_id;
            let mut orders = self.orders.write().await;

            match event.decode::<OrderEvent>()? {
                OrderEvent::OrderPlaced(data) => {
                    orders.insert(
                        order_id,
                        OrderSummary {
                            order_id,
                            customer_id: data.customer_id,
                            status: data.status,
                            total_amount: data.total_amount,
                            placed_at: data.placed_at,
                            updated_at: data.placed_at,
                            transition_count: 0,
                        },
                    );
                }
                OrderEvent::StatusChanged(transition) => {
                    if let Some(summary) = orders.get_mut(&order_id) {
                        summary.status = transition.new_status;
                        summary.updated_at = transition.timestamp;
                        summary.transition_count += 1;
                    } else {
                        tracing::warn!(%order_id, "Status change for an order the board has not seen");
                    }
                }
            }
        }

        Ok(())
    }

    async fn reset(&self) -> Result<()> {
        self.orders.write().await.clear();
        Ok(())
    }
}
