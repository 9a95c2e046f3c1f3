//! Loading aggregates and appending the events produced by a command.

use std::marker::PhantomData;

use common::{DocumentId, UserId};
use event_store::{AppendCondition, EventStore, Sequence, StoredEvent};

use crate::aggregate::{Aggregate, DomainEvent};
use crate::error::DomainError;

/// Outcome of a command that was accepted and persisted.
#[derive(Debug)]
pub struct CommandResult<A: Aggregate> {
    /// State after the new events were applied.
    pub aggregate: A,

    pub events: Vec<A::Event>,

    /// Stream sequence after the append.
    pub sequence: Sequence,
}

/// Runs commands against aggregates stored in an [`EventStore`].
///
/// A command sees the aggregate as of the sequence it was loaded at, and its
/// events are appended on the condition that the stream is still at that
/// sequence. A concurrent writer therefore turns into a
/// [`EventStoreError::SequenceConflict`](event_store::EventStoreError::SequenceConflict)
/// rather than a lost update.
pub struct CommandHandler<S, A>
where
    S: EventStore,
    A: Aggregate,
{
    store: S,
    _aggregate: PhantomData<A>,
}

impl<S, A> CommandHandler<S, A>
where
    S: EventStore,
    A: Aggregate,
{
    /// Creates a new command handler with the given event store.
    pub fn new(store: S) -> Self {
        Self {
            store,
            _aggregate: PhantomData,
        }
    }

    /// Returns a reference to the underlying event store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Replays a stream. A missing stream yields `A::default()`.
    pub async fn load(&self, stream_id: DocumentId) -> Result<A, DomainError> {
        let events = self.store.read_stream(stream_id).await?;

        let mut aggregate = A::default();
        for stored in events {
            let event: A::Event = stored.decode()?;
            aggregate.apply(event);
            aggregate.set_sequence(stored.sequence);
        }

        Ok(aggregate)
    }

    /// Loads an aggregate, returning None if it doesn't exist.
    pub async fn load_existing(&self, stream_id: DocumentId) -> Result<Option<A>, DomainError> {
        let aggregate = self.load(stream_id).await?;
        Ok(aggregate.id().is_some().then_some(aggregate))
    }

    /// Loads the aggregate, lets `command` decide which events to emit and
    /// appends them conditionally on the loaded sequence.
    pub async fn execute<F>(
        &self,
        stream_id: DocumentId,
        recorded_by: Option<UserId>,
        command: F,
    ) -> Result<CommandResult<A>, DomainError>
    where
        F: FnOnce(&A) -> Result<Vec<A::Event>, A::Error>,
        DomainError: From<A::Error>,
    {
        let mut aggregate = self.load(stream_id).await?;
        let loaded_at = aggregate.sequence();

        let events = command(&aggregate)?;
        if events.is_empty() {
            return Ok(CommandResult {
                aggregate,
                events,
                sequence: loaded_at,
            });
        }

        let stored = self.to_stored(stream_id, loaded_at, recorded_by, &events)?;
        let sequence = self
            .store
            .append(stored, AppendCondition::after(loaded_at))
            .await?;

        aggregate.apply_events(events.iter().cloned());
        aggregate.set_sequence(sequence);

        Ok(CommandResult {
            aggregate,
            events,
            sequence,
        })
    }

    fn to_stored(
        &self,
        stream_id: DocumentId,
        loaded_at: Sequence,
        recorded_by: Option<UserId>,
        events: &[A::Event],
    ) -> Result<Vec<StoredEvent>, DomainError> {
        let mut sequence = loaded_at;
        let mut stored = Vec::with_capacity(events.len());

        for event in events {
            sequence = sequence.next();
            stored.push(
                StoredEvent::builder()
                    .stream(stream_id, A::stream_type())
                    .event_type(event.event_type())
                    .sequence(sequence)
                    .recorded_by(recorded_by.clone())
                    .payload(event)?
                    .build()?,
            );
        }

        Ok(stored)
    }
}
