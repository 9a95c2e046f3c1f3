use std::pin::Pin;

use async_trait::async_trait;
use futures_core::Stream;

use crate::{DocumentId, EventStoreError, Result, Sequence, StoredEvent};

/// Precondition attached to an append.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppendCondition {
    /// Append regardless of the stream's current sequence. The batch must
    /// still continue the stream without gaps.
    #[default]
    Any,

    /// The stream must not exist yet.
    NoStream,

    /// The stream must currently end at this sequence.
    AtSequence(Sequence),
}

impl AppendCondition {
    /// Condition matching a stream last observed at `sequence`.
    pub fn after(sequence: Sequence) -> Self {
        if sequence == Sequence::empty() {
            Self::NoStream
        } else {
            Self::AtSequence(sequence)
        }
    }

    /// The sequence the stream is required to be at, if any.
    pub fn expected(&self) -> Option<Sequence> {
        match self {
            Self::Any => None,
            Self::NoStream => Some(Sequence::empty()),
            Self::AtSequence(sequence) => Some(*sequence),
        }
    }
}

/// All events of the store, oldest first.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<StoredEvent>> + Send>>;

/// Storage backend for document event streams.
///
/// Implementations must append a batch atomically and must reject a batch
/// whose precondition does not hold at the moment of writing, so that two
/// writers racing on the same stream cannot both succeed.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Appends a batch of events belonging to one stream.
    ///
    /// Returns the stream's sequence after the append.
    async fn append(&self, events: Vec<StoredEvent>, condition: AppendCondition)
    -> Result<Sequence>;

    /// Reads a whole stream in sequence order.
    async fn read_stream(&self, stream_id: DocumentId) -> Result<Vec<StoredEvent>>;

    /// Reads a stream starting at `from` (inclusive).
    async fn read_stream_from(
        &self,
        stream_id: DocumentId,
        from: Sequence,
    ) -> Result<Vec<StoredEvent>>;

    /// Streams every event in insertion order.
    async fn stream_all(&self) -> Result<EventStream>;
}

/// Checks that a batch is non-empty, targets a single stream and carries
/// consecutive sequences.
pub fn validate_batch(events: &[StoredEvent]) -> Result<()> {
    let Some(first) = events.first() else {
        return Err(EventStoreError::InvalidBatch(
            "cannot append an empty batch".to_string(),
        ));
    };

    let mut expected = first.sequence;
    for event in &events[1..] {
        if event.stream_id != first.stream_id || event.stream_type != first.stream_type {
            return Err(EventStoreError::InvalidBatch(
                "all events must belong to the same stream".to_string(),
            ));
        }
        expected = expected.next();
        if event.sequence != expected {
            return Err(EventStoreError::InvalidBatch(format!(
                "sequences must be consecutive: expected {expected}, got {}",
                event.sequence
            )));
        }
    }

    if first.sequence < Sequence::first() {
        return Err(EventStoreError::InvalidBatch(format!(
            "sequences start at 1, got {}",
            first.sequence
        )));
    }

    Ok(())
}

/// Checks a batch against the stream's current sequence.
pub(crate) fn check_condition(
    stream_id: DocumentId,
    current: Sequence,
    first_new: Sequence,
    condition: AppendCondition,
) -> Result<()> {
    if let Some(expected) = condition.expected()
        && expected != current
    {
        metrics::counter!("event_store_sequence_conflicts_total").increment(1);
        return Err(EventStoreError::SequenceConflict {
            stream_id,
            expected,
            actual: current,
        });
    }

    if first_new != current.next() {
        metrics::counter!("event_store_sequence_conflicts_total").increment(1);
        return Err(EventStoreError::SequenceConflict {
            stream_id,
            expected: first_new.preceding(),
            actual: current,
        });
    }

    Ok(())
}
