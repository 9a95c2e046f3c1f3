//! HTTP API for order status transitions.
//!
//! Exposes the transition validator, the order status recorder and the
//! read models as JSON endpoints, with structured logging (tracing) and
//! Prometheus metrics.

pub mod config;
pub mod error;
pub mod extract;
pub mod response;
pub mod routes;
pub mod state;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use domain::{LogNotifier, NotificationDispatcher};
use event_store::EventStore;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use config::{Config, LogFormat};
pub use error::ApiError;
pub use state::AppState;

/// Creates the router with all routes and middleware.
pub fn create_app<S: EventStore + Clone + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route(
            "/orders",
            post(routes::orders::place::<S>).get(routes::orders::list::<S>),
        )
        .route("/orders/{id}", get(routes::orders::get::<S>))
        .route("/orders/{id}/status", post(routes::orders::record_status::<S>))
        .route(
            "/orders/{id}/status-history",
            get(routes::orders::status_history::<S>),
        )
        .route(
            "/status-transitions",
            get(routes::transitions::list::<S>),
        )
        .route(
            "/status-transitions/validate",
            post(routes::transitions::validate),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// State over `store`, delivering notifications through the log when
/// `notifications_enabled` is set.
pub fn create_default_state<S: EventStore + Clone + 'static>(
    store: S,
    notifications_enabled: bool,
) -> Arc<AppState<S>> {
    let notifications = if notifications_enabled {
        NotificationDispatcher::new(Arc::new(LogNotifier))
    } else {
        NotificationDispatcher::disabled()
    };
    Arc::new(AppState::new(store, notifications))
}
