//! Stateless transition validation and the cross-order transition log.

use std::str::FromStr;
use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use common::PageRequest;
use domain::{EntityKind, OrderStatus, TransitionValidation, TriggeredBy, validate_named};
use event_store::EventStore;
use projections::{TransitionFilter, TransitionRecord};
use serde::Deserialize;

use crate::error::ApiError;
use crate::response::{self, Envelope};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ValidateRequest {
    pub entity: String,
    pub previous_status: String,
    pub new_status: String,
}

#[derive(Debug, Deserialize)]
pub struct TransitionLogQuery {
    pub triggered_by: Option<String>,
    pub new_status: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

/// POST /status-transitions/validate
///
/// Always answers with a verdict for known entity kinds; unknown status names
/// produce an invalid verdict rather than an error.
#[tracing::instrument(skip(body))]
pub async fn validate(
    body: Result<Json<ValidateRequest>, JsonRejection>,
) -> Result<Json<Envelope<TransitionValidation>>, ApiError> {
    let Json(req) = body?;
    let entity = EntityKind::from_str(&req.entity)?;

    let verdict = validate_named(entity, &req.previous_status, &req.new_status);
    tracing::debug!(%entity, is_valid = verdict.is_valid, "Transition validated");

    Ok(response::data(verdict))
}

/// GET /status-transitions
#[tracing::instrument(skip(state, query))]
pub async fn list<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    query: Result<Query<TransitionLogQuery>, QueryRejection>,
) -> Result<Json<Envelope<Vec<TransitionRecord>>>, ApiError> {
    let Query(query) = query?;

    let filter = TransitionFilter {
        triggered_by: query.triggered_by.as_deref().map(TriggeredBy::from_str).transpose()?,
        new_status: query.new_status.as_deref().map(OrderStatus::from_str).transpose()?,
    };
    let page = PageRequest::from_params(query.page, query.page_size)?;

    let (records, meta) = state.transitions.query(filter, page).await;

    Ok(response::page(records, meta))
}
