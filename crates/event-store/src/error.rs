use thiserror::Error;

use crate::{DocumentId, Sequence};

/// Errors raised by event store backends.
#[derive(Debug, Error)]
pub enum EventStoreError {
    /// The stream moved on since the writer read it.
    #[error("Sequence conflict on stream {stream_id}: expected {expected}, found {actual}")]
    SequenceConflict {
        stream_id: DocumentId,
        expected: Sequence,
        actual: Sequence,
    },

    /// The batch handed to `append` is malformed.
    #[error("Invalid append batch: {0}")]
    InvalidBatch(String),

    /// A required field was not set on the event builder.
    #[error("Incomplete event: missing {0}")]
    IncompleteEvent(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, EventStoreError>;
