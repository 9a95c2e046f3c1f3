//! Domain error types.

use common::DocumentId;
use event_store::EventStoreError;
use thiserror::Error;

use crate::order::OrderError;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Event store error: {0}")]
    EventStore(#[from] EventStoreError),

    #[error(transparent)]
    Order(#[from] OrderError),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: DocumentId },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A command succeeded but did not produce the event it exists for.
    #[error("Unexpected command outcome: {0}")]
    UnexpectedOutcome(&'static str),
}

impl DomainError {
    /// True when another writer changed the stream between read and append.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            DomainError::EventStore(EventStoreError::SequenceConflict { .. })
        )
    }
}
