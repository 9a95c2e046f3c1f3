//! Every recorded status change, across all orders.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{DocumentId, PageMeta, PageRequest};
use domain::{Aggregate, Order, OrderEvent, OrderStatus, StatusTransition, TriggeredBy};
use event_store::{Sequence, StoredEvent};
use serde::Serialize;
use tokio::sync::RwLock;

use crate::Result;
use crate::projection::Projection;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransitionRecord {
    pub order_id: DocumentId,
    pub sequence: Sequence,
    pub recorded_at: DateTime<Utc>,
    #[serde(flatten)]
    pub transition: StatusTransition,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TransitionFilter {
    pub triggered_by: Option<TriggeredBy>,
    pub new_status: Option<OrderStatus>,
}

impl TransitionFilter {
    fn matches(&self, record: &TransitionRecord) -> bool {
        self.triggered_by
            .is_none_or(|t| t == record.transition.triggered_by)
            && self.new_status.is_none_or(|s| s == record.transition.new_status)
    }
}

/// Append-only log of transitions in event log order.
#[derive(Clone, Default)]
pub struct TransitionLog {
    records: Arc<RwLock<Vec<TransitionRecord>>>,
}

impl TransitionLog {
    /// Creates an empty transition log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of recorded transitions.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// Matching transitions, newest first.
    pub async fn query(
        &self,
        filter: TransitionFilter,
        page: PageRequest,
    ) -> (Vec<TransitionRecord>, PageMeta) {
        let matching: Vec<_> = self
            .records
            .read()
            .await
            .iter()
            .rev()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        page.slice(matching)
    }
}

#[async_trait]
impl Projection for TransitionLog {
    fn name(&self) -> &'static str {
        "TransitionLog"
    }

    async fn handle(&self, event: &StoredEvent) -> Result<()> {
        if event.stream_type == Order::stream_type()
            && let OrderEvent::StatusChanged(transition) = event.decode::<OrderEvent>()?
        {
            self.records.write().await.push(TransitionRecord {
                order_id: event.stream_id,
                sequence: event.sequence,
                recorded_at: event.recorded_at,
                transition,
            });
        }
        Ok(())
    }

    async fn reset(&self) -> Result<()> {
        self.records.write().await.clear();
        Ok(())
    }
}
