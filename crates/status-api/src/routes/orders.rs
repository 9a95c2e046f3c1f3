//! Order placement, lookup and status transition endpoints.

use std::str::FromStr;
use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use chrono::{DateTime, Utc};
use common::{DocumentId, PageRequest};
use domain::{
    CustomerId, Lifecycle, Money, Order, OrderStatus, PlaceOrder, RecordStatusChange,
    StatusTransition, TriggeredBy,
};
use event_store::{EventStore, Sequence};
use projections::{BoardFilter, OrderSummary};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::extract::{RequestUser, user_from_headers};
use crate::response::{self, Envelope};
use crate::state::AppState;

// -- Request types --

#[derive(Debug, Default, Deserialize)]
pub struct PlaceOrderRequest {
    pub customer_id: Option<String>,
    pub total_cents: Option<i64>,
    #[serde(default)]
    pub awaiting_payment: bool,
}

#[derive(Debug, Deserialize)]
pub struct ListOrdersQuery {
    pub status: Option<String>,
    pub customer_id: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct RecordStatusRequest {
    pub previous_status: String,
    pub new_status: String,
    pub triggered_by: Option<String>,
    pub notes: Option<String>,
    pub reason: Option<String>,
    #[serde(default)]
    pub notify: bool,
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

// -- Response types --

#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub id: DocumentId,
    pub customer_id: Option<CustomerId>,
    pub status: OrderStatus,
    pub total_cents: i64,
    pub placed_at: Option<DateTime<Utc>>,
    pub last_transition_at: Option<DateTime<Utc>>,
    pub transition_count: u64,
    /// Statuses the order may move to next.
    pub allowed_transitions: &'static [OrderStatus],
}

impl OrderResponse {
    fn new(id: DocumentId, order: &Order) -> Self {
        Self {
            id,
            customer_id: order.customer_id(),
            status: order.status(),
            total_cents: order.total_amount().cents(),
            placed_at: order.placed_at(),
            last_transition_at: order.last_transition_at(),
            transition_count: order.transition_count(),
            allowed_transitions: order.status().allowed_next(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RecordedTransitionResponse {
    pub order_id: DocumentId,
    pub sequence: Sequence,
    #[serde(flatten)]
    pub transition: StatusTransition,
    pub notification_dispatched: bool,
}

// -- Handlers --

/// POST /orders
#[tracing::instrument(skip(state, headers, body))]
pub async fn place<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    body: Result<Json<PlaceOrderRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Envelope<OrderResponse>>), ApiError> {
    let Json(req) = body?;

    let customer_id = match req.customer_id.as_deref() {
        Some(raw) => parse_customer_id(raw)?,
        None => CustomerId::new(),
    };

    let mut cmd = PlaceOrder::new(customer_id, Money::from_cents(req.total_cents.unwrap_or(0)));
    if req.awaiting_payment {
        cmd = cmd.awaiting_payment();
    }
    if let Some(user) = user_from_headers(&headers)? {
        cmd = cmd.placed_by(user);
    }

    let order_id = cmd.order_id;
    let result = state.orders.place_order(cmd).await?;
    state.update_views(order_id).await;

    Ok((
        StatusCode::CREATED,
        response::data(OrderResponse::new(order_id, &result.aggregate)),
    ))
}

/// GET /orders
#[tracing::instrument(skip(state, query))]
pub async fn list<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    query: Result<Query<ListOrdersQuery>, QueryRejection>,
) -> Result<Json<Envelope<Vec<OrderSummary>>>, ApiError> {
    let Query(query) = query?;

    let filter = BoardFilter {
        status: query.status.as_deref().map(OrderStatus::from_str).transpose()?,
        customer_id: query.customer_id.as_deref().map(parse_customer_id).transpose()?,
    };
    let page = PageRequest::from_params(query.page, query.page_size)?;

    let (orders, meta) = state.board.list(filter, page).await;

    Ok(response::page(orders, meta))
}

/// GET /orders/{id}
#[tracing::instrument(skip(state))]
pub async fn get<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<Envelope<OrderResponse>>, ApiError> {
    let order_id = DocumentId::from_str(&id)?;
    let order = state.orders.get_order(order_id).await?;

    Ok(response::data(OrderResponse::new(order_id, &order)))
}

/// POST /orders/{id}/status
///
/// Records a transition from `previous_status`, which must still be the
/// order's live status.
#[tracing::instrument(skip(state, user, body), fields(user = %user.0))]
pub async fn record_status<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    user: RequestUser,
    body: Result<Json<RecordStatusRequest>, JsonRejection>,
) -> Result<Json<Envelope<RecordedTransitionResponse>>, ApiError> {
    let order_id = DocumentId::from_str(&id)?;
    let Json(req) = body?;

    let (previous, new) = parse_status_pair(&req.previous_status, &req.new_status)?;
    let triggered_by = req
        .triggered_by
        .as_deref()
        .map(TriggeredBy::from_str)
        .transpose()?
        .unwrap_or_default();

    let mut cmd = RecordStatusChange::new(order_id, previous, new, user.0)
        .triggered_by(triggered_by)
        .notify(req.notify);
    cmd.notes = req.notes;
    cmd.reason = req.reason;

    let recorded = state.recorder.record(cmd).await?;
    state.update_views(order_id).await;

    Ok(response::data(RecordedTransitionResponse {
        order_id,
        sequence: recorded.sequence,
        notification_dispatched: recorded.notification.is_some(),
        transition: recorded.transition,
    }))
}

/// GET /orders/{id}/status-history
#[tracing::instrument(skip(state, query))]
pub async fn status_history<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> Result<Json<Envelope<Vec<domain::HistoryEntry>>>, ApiError> {
    let order_id = DocumentId::from_str(&id)?;
    let Query(query) = query?;
    let page = PageRequest::from_params(query.page, query.page_size)?;

    let (entries, meta) = state.orders.status_history(order_id, page).await?;
    Ok(response::page(entries, meta))
}

fn parse_customer_id(raw: &str) -> Result<CustomerId, ApiError> {
    uuid::Uuid::parse_str(raw.trim())
        .map(CustomerId::from_uuid)
        .map_err(|e| ApiError::validation(format!("Invalid customer_id: {e}")))
}

/// Parses both names, reporting every unknown one.
fn parse_status_pair(previous: &str, new: &str) -> Result<(OrderStatus, OrderStatus), ApiError> {
    match (OrderStatus::parse(previous), OrderStatus::parse(new)) {
        (Ok(previous), Ok(new)) => Ok((previous, new)),
        (previous, new) => Err(ApiError::validation_errors(
            "Unknown order status",
            [previous.err(), new.err()]
                .into_iter()
                .flatten()
                .map(|e| e.to_string())
                .collect(),
        )),
    }
}
