//! Append-only event streams keyed by document.
//!
//! Each document (an order, for instance) owns one stream. Events in a stream
//! carry a gap-free [`Sequence`] starting at 1; appends may be made conditional
//! on the sequence the writer last observed, which is how concurrent writers
//! to the same document are detected.

pub mod error;
pub mod event;
pub mod memory;
pub mod postgres;
pub mod store;

pub use common::DocumentId;
pub use error::{EventStoreError, Result};
pub use event::{EventId, Sequence, StoredEvent, StoredEventBuilder};
pub use memory::InMemoryEventStore;
pub use postgres::PostgresEventStore;
pub use store::{AppendCondition, EventStore, EventStream};
