//! Core aggregate and domain event traits.

use common::DocumentId;
use event_store::Sequence;
use serde::{Serialize, de::DeserializeOwned};

/// A fact recorded in a document's stream. Named in the past tense.
pub trait DomainEvent: Serialize + DeserializeOwned + Send + Sync + Clone {
    /// Name stored alongside the payload and used for filtering.
    fn event_type(&self) -> &'static str;
}

/// A document rebuilt by replaying its event stream.
///
/// `apply` must be deterministic and infallible: every rule is checked when
/// the event is produced, never when it is replayed.
pub trait Aggregate: Default + Send + Sync + Sized {
    type Event: DomainEvent;

    type Error: std::error::Error + Send + Sync;

    /// Stream type written with every event, e.g. `"Order"`.
    fn stream_type() -> &'static str;

    /// `None` until the creating event has been applied.
    fn id(&self) -> Option<DocumentId>;

    fn sequence(&self) -> Sequence;

    fn set_sequence(&mut self, sequence: Sequence);

    fn apply(&mut self, event: Self::Event);

    fn apply_events(&mut self, events: impl IntoIterator<Item = Self::Event>) {
        for event in events {
            self.apply(event);
        }
    }
}
