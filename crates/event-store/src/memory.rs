use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    DocumentId, Result, Sequence, StoredEvent,
    store::{AppendCondition, EventStore, EventStream, check_condition, validate_batch},
};

/// Event store held entirely in memory.
///
/// Events live in one vector in insertion order, which doubles as the global
/// ordering used by [`EventStore::stream_all`]. The append precondition is
/// checked under the write lock, so concurrent appends to one stream are
/// serialized.
#[derive(Clone, Default)]
pub struct InMemoryEventStore {
    events: Arc<RwLock<Vec<StoredEvent>>>,
}

impl InMemoryEventStore {
    /// Creates a new empty in-memory event store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of events stored.
    pub async fn len(&self) -> usize {
        self.events.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.events.read().await.is_empty()
    }
}

fn current_sequence(events: &[StoredEvent], stream_id: DocumentId) -> Sequence {
    events
        .iter()
        .filter(|e| e.stream_id == stream_id)
        .map(|e| e.sequence)
        .max()
        .unwrap_or_default()
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn append(
        &self,
        events: Vec<StoredEvent>,
        condition: AppendCondition,
    ) -> Result<Sequence> {
        validate_batch(&events)?;

        let stream_id = events[0].stream_id;
        let first_new = events[0].sequence;

        let mut log = self.events.write().await;
        let current = current_sequence(&log, stream_id);
        check_condition(stream_id, current, first_new, condition)?;

        let last = events.last().map(|e| e.sequence).unwrap_or(current);
        log.extend(events);

        tracing::trace!(%stream_id, sequence = %last, "appended to in-memory stream");
        Ok(last)
    }

    async fn read_stream(&self, stream_id: DocumentId) -> Result<Vec<StoredEvent>> {
        self.read_stream_from(stream_id, Sequence::first()).await
    }

    async fn read_stream_from(
        &self,
        stream_id: DocumentId,
        from: Sequence,
    ) -> Result<Vec<StoredEvent>> {
        let log = self.events.read().await;
        let mut events: Vec<_> = log
            .iter()
            .filter(|e| e.stream_id == stream_id && e.sequence >= from)
            .cloned()
            .collect();
        events.sort_by_key(|e| e.sequence);
        Ok(events)
    }

    async fn stream_all(&self) -> Result<EventStream> {
        let snapshot = self.events.read().await.clone();
        Ok(Box::pin(futures_util::stream::iter(
            snapshot.into_iter().map(Ok),
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EventStoreError;

    fn event(stream_id: DocumentId, sequence: i64, event_type: &str) -> StoredEvent {
        StoredEvent::builder()
            .event_type(event_type)
            .stream(stream_id, "Order")
            .sequence(Sequence::new(sequence))
            .payload_raw(serde_json::json!({"n": sequence}))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn append_to_new_stream() {
        let store = InMemoryEventStore::new();
        let id = DocumentId::new();

        let sequence = store
            .append(vec![event(id, 1, "OrderPlaced")], AppendCondition::NoStream)
            .await
            .unwrap();

        assert_eq!(sequence, Sequence::first());
        assert_eq!(store.read_stream(id).await.unwrap().len(), 1);
        assert_eq!(store.read_stream(id).await.unwrap()[0].sequence, Sequence::first());
    }

    #[tokio::test]
    async fn append_batch_returns_last_sequence() {
        let store = InMemoryEventStore::new();
        let id = DocumentId::new();
        let batch = vec![
            event(id, 1, "OrderPlaced"),
            event(id, 2, "StatusChanged"),
            event(id, 3, "StatusChanged"),
        ];

        let sequence = store.append(batch, AppendCondition::NoStream).await.unwrap();
        assert_eq!(sequence, Sequence::new(3));
        assert_eq!(store.read_stream(id).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn no_stream_condition_fails_on_existing_stream() {
        let store = InMemoryEventStore::new();
        let id = DocumentId::new();
        store
            .append(vec![event(id, 1, "OrderPlaced")], AppendCondition::NoStream)
            .await
            .unwrap();

        let result = store
            .append(vec![event(id, 2, "StatusChanged")], AppendCondition::NoStream)
            .await;

        assert!(matches!(result, Err(EventStoreError::SequenceConflict { .. })));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn stale_writer_loses() {
        let store = InMemoryEventStore::new();
        let id = DocumentId::new();
        store
            .append(vec![event(id, 1, "OrderPlaced")], AppendCondition::NoStream)
            .await
            .unwrap();

        // Two writers both observed sequence 1.
        let observed = AppendCondition::after(Sequence::first());
        store
            .append(vec![event(id, 2, "StatusChanged")], observed)
            .await
            .unwrap();
        let second = store.append(vec![event(id, 2, "StatusChanged")], observed).await;

        assert!(matches!(
            second,
            Err(EventStoreError::SequenceConflict { actual, .. }) if actual == Sequence::new(2)
        ));
        assert_eq!(store.read_stream(id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn concurrent_appends_on_one_stream_admit_a_single_winner() {
        let store = InMemoryEventStore::new();
        let id = DocumentId::new();
        store
            .append(vec![event(id, 1, "OrderPlaced")], AppendCondition::NoStream)
            .await
            .unwrap();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .append(
                        vec![event(id, 2, "StatusChanged")],
                        AppendCondition::AtSequence(Sequence::first()),
                    )
                    .await
            }));
        }

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                winners += 1;
            }
        }

        assert_eq!(winners, 1);
        assert_eq!(store.read_stream(id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn read_stream_from_sequence() {
        let store = InMemoryEventStore::new();
        let id = DocumentId::new();
        let batch = (1..=4).map(|n| event(id, n, "StatusChanged")).collect();
        store.append(batch, AppendCondition::Any).await.unwrap();

        let tail = store.read_stream_from(id, Sequence::new(3)).await.unwrap();
        assert_eq!(tail.len(), 2);
        assert_eq!(tail[0].sequence, Sequence::new(3));
    }

    #[tokio::test]
    async fn stream_all_preserves_insertion_order() {
        use futures_util::StreamExt;

        let store = InMemoryEventStore::new();
        let a = DocumentId::new();
        let b = DocumentId::new();
        store
            .append(vec![event(b, 1, "OrderPlaced")], AppendCondition::Any)
            .await
            .unwrap();
        store
            .append(vec![event(a, 1, "OrderPlaced")], AppendCondition::Any)
            .await
            .unwrap();

        let all: Vec<_> = store.stream_all().await.unwrap().collect().await;
        let ids: Vec<_> = all.into_iter().map(|e| e.unwrap().stream_id).collect();
        assert_eq!(ids, vec![b, a]);
    }

    #[tokio::test]
    async fn unknown_stream_reads_empty() {
        let store = InMemoryEventStore::new();
        assert!(store.read_stream(DocumentId::new()).await.unwrap().is_empty());
        assert!(store.is_empty().await);
    }
}
