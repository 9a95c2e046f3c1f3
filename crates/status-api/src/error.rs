//! API error types with HTTP response mapping.
//!
//! Every error renders as
//! `{"error": {"status", "name", "message", "details"}}`.

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use common::{IdError, PaginationError};
use domain::{DomainError, OrderError, UnknownEntityKind, UnknownStatus, UnknownTrigger};
use serde_json::{Value, json};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed input or a rejected transition.
    #[error("{message}")]
    Validation { message: String, details: Value },

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    /// The request was built on state that has since changed.
    #[error("{message}")]
    Conflict { message: String, details: Value },

    /// Logged in full; the client only sees a generic message.
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    /// Creates a validation error with empty details.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation {
            message: message.into(),
            details: json!({}),
        }
    }

    /// A validation failure listing several independent problems.
    pub fn validation_errors(message: impl Into<String>, errors: Vec<String>) -> Self {
        ApiError::Validation {
            message: message.into(),
            details: json!({ "errors": errors }),
        }
    }

    /// Returns the HTTP status code for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation { .. } => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict { .. } => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            ApiError::Validation { .. } => "ValidationError",
            ApiError::Unauthorized(_) => "UnauthorizedError",
            ApiError::NotFound(_) => "NotFoundError",
            ApiError::Conflict { .. } => "ConflictError",
            ApiError::Internal(_) => "ApplicationError",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let name = self.name();

        let (message, details) = match self {
            ApiError::Validation { message, details } | ApiError::Conflict { message, details } => {
                (message, details)
            }
            ApiError::Unauthorized(message) | ApiError::NotFound(message) => (message, json!({})),
            ApiError::Internal(cause) => {
                tracing::error!(error = %cause, "internal server error");
                ("Internal server error".to_string(), json!({}))
            }
        };

        let body = json!({
            "error": {
                "status": status.as_u16(),
                "name": name,
                "message": message,
                "details": details,
            }
        });
        (status, Json(body)).into_response()
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        if err.is_conflict() {
            return ApiError::Conflict {
                message: "Order was modified concurrently; reload it and retry".to_string(),
                details: json!({}),
            };
        }

        match err {
            DomainError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{} {id} not found", capitalize(entity)))
            }
            DomainError::Order(order_err) => order_err.into(),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<OrderError> for ApiError {
    fn from(err: OrderError) -> Self {
        let message = err.to_string();
        match err {
            OrderError::InvalidTransition { errors, .. } => {
                ApiError::validation_errors(message, errors)
            }
            OrderError::StatusMismatch { expected, actual } => ApiError::Conflict {
                message,
                details: json!({ "expected": expected, "actual": actual }),
            },
            OrderError::AlreadyPlaced => ApiError::Conflict {
                message,
                details: json!({}),
            },
            OrderError::NotPlaced => ApiError::NotFound(message),
            OrderError::InvalidInitialStatus(_) | OrderError::NegativeAmount { .. } => {
                ApiError::validation(message)
            }
        }
    }
}

impl From<IdError> for ApiError {
    fn from(err: IdError) -> Self {
        ApiError::validation(err.to_string())
    }
}

impl From<PaginationError> for ApiError {
    fn from(err: PaginationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

impl From<UnknownStatus> for ApiError {
    fn from(err: UnknownStatus) -> Self {
        ApiError::validation(err.to_string())
    }
}

impl From<UnknownTrigger> for ApiError {
    fn from(err: UnknownTrigger) -> Self {
        ApiError::validation(err.to_string())
    }
}

impl From<UnknownEntityKind> for ApiError {
    fn from(err: UnknownEntityKind) -> Self {
        ApiError::validation(err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::validation(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::validation(rejection.body_text())
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
