//! Core projection trait and position tracking.

use std::collections::HashMap;

use async_trait::async_trait;
use common::DocumentId;
use event_store::{Sequence, StoredEvent};

use crate::Result;

/// How far into each stream the projections have been fed.
///
/// Positions are kept per stream rather than as an offset into the global
/// log. Within one stream, sequences become visible in order, but a
/// PostgreSQL insert can commit after a later-numbered row from another
/// stream has already been read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectionPosition {
    streams: HashMap<DocumentId, Sequence>,
}

impl ProjectionPosition {
    /// Creates a position that has seen nothing.
    pub fn zero() -> Self {
        Self::default()
    }

    /// Returns the last sequence applied for a stream.
    pub fn applied(&self, stream_id: DocumentId) -> Sequence {
        self.streams
            .get(&stream_id)
            .copied()
            .unwrap_or_else(Sequence::empty)
    }

    /// Returns true if the event is at or behind its stream's mark.
    pub fn has_seen(&self, event: &StoredEvent) -> bool {
        event.sequence <= self.applied(event.stream_id)
    }

    /// Moves the stream's mark up to the event's sequence.
    pub fn advance(&mut self, event: &StoredEvent) {
        let mark = self.streams.entry(event.stream_id).or_default();
        if event.sequence > *mark {
            *mark = event.sequence;
        }
    }

    /// Returns the number of streams with at least one applied event.
    pub fn stream_count(&self) -> usize {
        self.streams.len()
    }
}

impl std::fmt::Display for ProjectionPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "position({} streams)", self.streams.len())
    }
}

/// Folds stored events into a read model.
///
/// `handle` is called at most once per event, and events of one stream
/// arrive in sequence order. Events from different streams may interleave
/// in any order.
#[async_trait]
pub trait Projection: Send + Sync {
    /// Returns the name used in logs and metrics.
    fn name(&self) -> &'static str;

    /// Applies one event to the read model.
    async fn handle(&self, event: &StoredEvent) -> Result<()>;

    /// Empties the read model.
    async fn reset(&self) -> Result<()>;
}
