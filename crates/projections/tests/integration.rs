//! Order commands flowing through the processor into both read models.

use std::sync::Arc;

use common::{PageRequest, UserId};
use domain::{
    CustomerId, Money, NotificationDispatcher, OrderService, OrderStatus, PlaceOrder,
    RecordStatusChange, StatusUpdateRecorder, TriggeredBy,
};
use event_store::InMemoryEventStore;
use projections::{
    BoardFilter, OrderStatusBoard, ProjectionProcessor, TransitionFilter, TransitionLog,
};

struct Setup {
    orders: OrderService<InMemoryEventStore>,
    recorder: StatusUpdateRecorder<InMemoryEventStore>,
    processor: Arc<ProjectionProcessor<InMemoryEventStore>>,
    board: OrderStatusBoard,
    log: TransitionLog,
}

fn setup() -> Setup {
    let store = InMemoryEventStore::new();
    let board = OrderStatusBoard::new();
    let log = TransitionLog::new();

    let mut processor = ProjectionProcessor::new(store.clone());
    processor.register(Box::new(board.clone()));
    processor.register(Box::new(log.clone()));

    Setup {
        orders: OrderService::new(store.clone()),
        recorder: StatusUpdateRecorder::new(store, NotificationDispatcher::disabled()),
        processor: Arc::new(processor),
        board,
        log,
    }
}

async fn place(s: &Setup, customer_id: CustomerId) -> common::DocumentId {
    let cmd = PlaceOrder::new(customer_id, Money::from_cents(3_000));
    let order_id = cmd.order_id;
    s.orders.place_order(cmd).await.unwrap();
    order_id
}

async fn record(
    s: &Setup,
    order_id: common::DocumentId,
    from: OrderStatus,
    to: OrderStatus,
    trigger: TriggeredBy,
) {
    s.recorder
        .record(
            RecordStatusChange::new(order_id, from, to, UserId::system()).triggered_by(trigger),
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn board_and_log_follow_recorded_transitions() {
    let s = setup();
    let customer = CustomerId::new();
    let order_id = place(&s, customer).await;

    record(&s, order_id, OrderStatus::Pending, OrderStatus::Confirmed, TriggeredBy::PaymentConfirmation).await;
    record(&s, order_id, OrderStatus::Confirmed, OrderStatus::Processing, TriggeredBy::System).await;
    s.processor.run_catch_up().await.unwrap();

    let summary = s.board.get(order_id).await.unwrap();
    assert_eq!(summary.status, OrderStatus::Processing);
    assert_eq!(summary.customer_id, customer);
    assert_eq!(summary.transition_count, 2);

    let (entries, meta) = s
        .log
        .query(TransitionFilter::default(), PageRequest::default())
        .await;
    assert_eq!(meta.total, 2);
    assert_eq!(entries[0].transition.new_status, OrderStatus::Processing);
    assert_eq!(entries[1].transition.triggered_by, TriggeredBy::PaymentConfirmation);
}

#[tokio::test]
async fn rejected_transitions_leave_no_trace() {
    let s = setup();
    let order_id = place(&s, CustomerId::new()).await;

    let rejected = s
        .recorder
        .record(RecordStatusChange::new(
            order_id,
            OrderStatus::Pending,
            OrderStatus::Delivered,
            UserId::system(),
        ))
        .await;
    assert!(rejected.is_err());
    s.processor.run_catch_up().await.unwrap();

    assert_eq!(s.board.get(order_id).await.unwrap().status, OrderStatus::Pending);
    assert!(s.log.is_empty().await);
}

#[tokio::test]
async fn board_lists_by_status_across_customers() {
    let s = setup();
    let first = place(&s, CustomerId::new()).await;
    let second = place(&s, CustomerId::new()).await;
    place(&s, CustomerId::new()).await;

    record(&s, first, OrderStatus::Pending, OrderStatus::Cancelled, TriggeredBy::CustomerRequest).await;
    record(&s, second, OrderStatus::Pending, OrderStatus::Cancelled, TriggeredBy::AdminAction).await;
    s.processor.run_catch_up().await.unwrap();

    let (cancelled, meta) = s
        .board
        .list(
            BoardFilter {
                status: Some(OrderStatus::Cancelled),
                ..Default::default()
            },
            PageRequest::new(1, 1).unwrap(),
        )
        .await;
    assert_eq!(meta.total, 2);
    assert_eq!(meta.page_count, 2);
    assert_eq!(cancelled.len(), 1);

    let counts = s.board.counts_by_status().await;
    let pending = counts.iter().find(|c| c.status == OrderStatus::Pending).unwrap();
    assert_eq!(pending.count, 1);
}

#[tokio::test]
async fn rebuild_reproduces_the_same_views() {
    let s = setup();
    let order_id = place(&s, CustomerId::new()).await;
    record(&s, order_id, OrderStatus::Pending, OrderStatus::PaymentPending, TriggeredBy::System).await;
    s.processor.run_catch_up().await.unwrap();

    let before = s.board.get(order_id).await.unwrap();
    s.processor.rebuild_all().await.unwrap();

    assert_eq!(s.board.get(order_id).await.unwrap(), before);
    assert_eq!(s.log.len().await, 1);
}

#[tokio::test]
async fn per_write_stream_catch_up_matches_a_full_replay() {
    let s = setup();
    let first = place(&s, CustomerId::new()).await;
    s.processor.catch_up_stream(first).await.unwrap();
    let second = place(&s, CustomerId::new()).await;
    s.processor.catch_up_stream(second).await.unwrap();

    record(&s, first, OrderStatus::Pending, OrderStatus::Confirmed, TriggeredBy::PaymentConfirmation).await;
    s.processor.catch_up_stream(first).await.unwrap();
    record(&s, second, OrderStatus::Pending, OrderStatus::Cancelled, TriggeredBy::CustomerRequest).await;
    s.processor.catch_up_stream(second).await.unwrap();

    assert_eq!(s.board.get(first).await.unwrap().status, OrderStatus::Confirmed);
    assert_eq!(s.board.get(second).await.unwrap().status, OrderStatus::Cancelled);
    assert_eq!(s.log.len().await, 2);

    // Nothing is left for a full pass to deliver.
    s.processor.run_catch_up().await.unwrap();
    assert_eq!(s.log.len().await, 2);
    assert_eq!(s.board.get(first).await.unwrap().transition_count, 1);
}
