use chrono::{DateTime, Utc};
use common::UserId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{DocumentId, EventStoreError, Result};

/// Unique identifier of a stored event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(Uuid);

impl EventId {
    /// Creates a new random event ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an event ID from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Position of an event inside its stream.
///
/// An empty stream is at [`Sequence::empty`] (0); the first event carries 1
/// and every following event increments by one.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Sequence(i64);

impl Sequence {
    /// Creates a sequence from a raw value.
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Sequence of a stream with no events.
    pub fn empty() -> Self {
        Self(0)
    }

    /// Sequence carried by the first event of a stream.
    pub fn first() -> Self {
        Self(1)
    }

    /// Returns the sequence that follows this one.
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }

    /// The sequence a stream had before this event was appended.
    pub fn preceding(&self) -> Self {
        Self((self.0 - 1).max(0))
    }

    /// Returns the raw value.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for Sequence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for Sequence {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

/// An event as persisted: the serialized domain event plus the stream
/// bookkeeping needed to order and filter it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredEvent {
    pub event_id: EventId,

    /// Domain event name, e.g. `"StatusChanged"`.
    pub event_type: String,

    pub stream_id: DocumentId,

    /// Kind of document owning the stream, e.g. `"Order"`.
    pub stream_type: String,

    pub sequence: Sequence,

    pub recorded_at: DateTime<Utc>,

    /// User on whose behalf the event was written, when known.
    pub recorded_by: Option<UserId>,

    pub payload: serde_json::Value,
}

impl StoredEvent {
    /// Starts building a stored event.
    pub fn builder() -> StoredEventBuilder {
        StoredEventBuilder::default()
    }

    /// Deserializes the payload into a concrete domain event.
    pub fn decode<T: for<'de> Deserialize<'de>>(&self) -> Result<T> {
        Ok(serde_json::from_value(self.payload.clone())?)
    }
}

#[derive(Debug, Default)]
pub struct StoredEventBuilder {
    event_id: Option<EventId>,
    event_type: Option<String>,
    stream_id: Option<DocumentId>,
    stream_type: Option<String>,
    sequence: Option<Sequence>,
    recorded_at: Option<DateTime<Utc>>,
    recorded_by: Option<UserId>,
    payload: Option<serde_json::Value>,
}

impl StoredEventBuilder {
    pub fn event_id(mut self, id: EventId) -> Self {
        self.event_id = Some(id);
        self
    }

    pub fn event_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_type = Some(event_type.into());
        self
    }

    /// Sets the stream the event belongs to.
    pub fn stream(mut self, stream_id: DocumentId, stream_type: impl Into<String>) -> Self {
        self.stream_id = Some(stream_id);
        self.stream_type = Some(stream_type.into());
        self
    }

    /// Sets the event's position within its stream.
    pub fn sequence(mut self, sequence: Sequence) -> Self {
        self.sequence = Some(sequence);
        self
    }

    /// Defaults to the time of [`build`](Self::build) when unset.
    pub fn recorded_at(mut self, at: DateTime<Utc>) -> Self {
        self.recorded_at = Some(at);
        self
    }

    pub fn recorded_by(mut self, user: Option<UserId>) -> Self {
        self.recorded_by = user;
        self
    }

    /// Serializes a domain event as the payload.
    pub fn payload<T: Serialize>(mut self, payload: &T) -> Result<Self> {
        self.payload = Some(serde_json::to_value(payload)?);
        Ok(self)
    }

    pub fn payload_raw(mut self, payload: serde_json::Value) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Builds the event, failing if a required field is missing.
    pub fn build(self) -> Result<StoredEvent> {
        Ok(StoredEvent {
            event_id: self.event_id.unwrap_or_default(),
            event_type: self
                .event_type
                .ok_or(EventStoreError::IncompleteEvent("event_type"))?,
            stream_id: self
                .stream_id
                .ok_or(EventStoreError::IncompleteEvent("stream_id"))?,
            stream_type: self
                .stream_type
                .ok_or(EventStoreError::IncompleteEvent("stream_type"))?,
            sequence: self
                .sequence
                .ok_or(EventStoreError::IncompleteEvent("sequence"))?,
            recorded_at: self.recorded_at.unwrap_or_else(Utc::now),
            recorded_by: self.recorded_by,
            payload: self
                .payload
                .ok_or(EventStoreError::IncompleteEvent("payload"))?,
        })
    }
}
