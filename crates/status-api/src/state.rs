//! Shared application state.

use std::sync::Arc;

use common::DocumentId;
use domain::{NotificationDispatcher, OrderService, StatusUpdateRecorder};
use event_store::EventStore;
use projections::{OrderStatusBoard, ProjectionProcessor, TransitionLog};

pub struct AppState<S: EventStore> {
    pub orders: OrderService<S>,
    pub recorder: StatusUpdateRecorder<S>,
    pub board: OrderStatusBoard,
    pub transitions: TransitionLog,
    pub projection_processor: Arc<ProjectionProcessor<S>>,
}

impl<S: EventStore + Clone + 'static> AppState<S> {
    /// Wires the services and read models over one store.
    pub fn new(store: S, notifications: NotificationDispatcher) -> Self {
        let board = OrderStatusBoard::new();
        let transitions = TransitionLog::new();

        let mut processor = ProjectionProcessor::new(store.clone());
        processor.register(Box::new(board.clone()));
        processor.register(Box::new(transitions.clone()));

        Self {
            orders: OrderService::new(store.clone()),
            recorder: StatusUpdateRecorder::new(store, notifications),
            board,
            transitions,
            projection_processor: Arc::new(processor),
        }
    }

    /// Feeds an order's newly appended events to the read models.
    ///
    /// Called after a successful write. The write has already been committed,
    /// so a failure here is logged rather than returned; the order's next
    /// write or a restart delivers whatever was missed.
    pub async fn update_views(&self, order_id: DocumentId) {
        if let Err(e) = self.projection_processor.catch_up_stream(order_id).await {
            tracing::error!(%order_id, error = %e, "Failed to update read models");
        }
    }
}
