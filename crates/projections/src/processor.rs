//! Feeding stored events to projections.

use common::DocumentId;
use event_store::{EventStore, StoredEvent};
use futures_util::StreamExt;
use tokio::sync::Mutex;

use crate::Result;
use crate::projection::{Projection, ProjectionPosition};

/// Delivers events from an event store to registered projections.
///
/// [`run_catch_up`](Self::run_catch_up) walks the whole log and is meant for
/// start-up and rebuilds. After a write, [`catch_up_stream`](Self::catch_up_stream)
/// reads only the tail of the stream that changed. Both skip events at or
/// behind the stream's mark, and both hold the position lock while delivering,
/// so an event reaches each projection once.
pub struct ProjectionProcessor<S: EventStore> {
    store: S,
    projections: Vec<Box<dyn Projection>>,
    position: Mutex<ProjectionPosition>,
}

impl<S: EventStore> ProjectionProcessor<S> {
    /// Creates a processor with no projections.
    pub fn new(store: S) -> Self {
        Self {
            store,
            projections: Vec::new(),
            position: Mutex::new(ProjectionPosition::zero()),
        }
    }

    /// Adds a projection. Register before the first catch-up.
    pub fn register(&mut self, projection: Box<dyn Projection>) {
        self.projections.push(projection);
    }

    /// Returns the number of registered projections.
    pub fn projection_count(&self) -> usize {
        self.projections.len()
    }

    /// Returns a snapshot of the per-stream marks.
    pub async fn position(&self) -> ProjectionPosition {
        self.position.lock().await.clone()
    }

    /// Delivers every event in the store not yet applied.
    #[tracing::instrument(skip(self))]
    pub async fn run_catch_up(&self) -> Result<()> {
        let mut position = self.position.lock().await;
        self.replay_all(&mut position).await
    }

    /// Delivers the events of one stream past its mark.
    #[tracing::instrument(skip(self), fields(%stream_id))]
    pub async fn catch_up_stream(&self, stream_id: DocumentId) -> Result<()> {
        let mut position = self.position.lock().await;
        let from = position.applied(stream_id).next();

        let mut delivered = 0u64;
        for event in self.store.read_stream_from(stream_id, from).await? {
            if self.deliver(&mut position, &event).await? {
                delivered += 1;
            }
        }

        tracing::debug!(delivered, "Stream catch-up complete");
        Ok(())
    }

    /// Empties every projection and replays the whole log.
    #[tracing::instrument(skip(self))]
    pub async fn rebuild_all(&self) -> Result<()> {
        let mut position = self.position.lock().await;
        for projection in &self.projections {
            projection.reset().await?;
            tracing::info!(projection = projection.name(), "Projection reset");
        }
        *position = ProjectionPosition::zero();
        self.replay_all(&mut position).await
    }

    async fn replay_all(&self, position: &mut ProjectionPosition) -> Result<()> {
        let mut stream = self.store.stream_all().await?;
        let mut read = 0u64;
        let mut delivered = 0u64;

        while let Some(result) = stream.next().await {
            let event = result?;
            read += 1;
            if self.deliver(position, &event).await? {
                delivered += 1;
            }
        }

        tracing::debug!(read, delivered, "Catch-up complete");
        Ok(())
    }

    async fn deliver(&self, position: &mut ProjectionPosition, event: &StoredEvent) -> Result<bool> {
        if position.has_seen(event) {
            return Ok(false);
        }

        for projection in &self.projections {
            projection.handle(event).await?;
            metrics::counter!("projections_events_processed", "projection" => projection.name())
                .increment(1);
        }

        position.advance(event);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use event_store::{
        AppendCondition, EventStream, InMemoryEventStore, Sequence,
        Result as StoreResult,
    };
    use std::sync::Arc;
    use tokio::sync::RwLock;

    #[derive(Clone, Default)]
    struct RecordingProjection {
        seen: Arc<RwLock<Vec<(DocumentId, Sequence)>>>,
    }

    impl RecordingProjection {
        async fn seen(&self) -> Vec<(DocumentId, Sequence)> {
            self.seen.read().await.clone()
        }
    }

    #[async_trait]
    impl Projection for RecordingProjection {
        fn name(&self) -> &'static str {
            "RecordingProjection"
        }

        async fn handle(&self, event: &StoredEvent) -> Result<()> {
            self.seen.write().await.push((event.stream_id, event.sequence));
            Ok(())
        }

        async fn reset(&self) -> Result<()> {
            self.seen.write().await.clear();
            Ok(())
        }
    }

    /// Store whose global log is whatever the test says it is, so rows can
    /// appear ahead of ones already read, the way a late PostgreSQL commit does.
    #[derive(Clone, Default)]
    struct ScriptedStore {
        log: Arc<RwLock<Vec<StoredEvent>>>,
    }

    impl ScriptedStore {
        async fn set_log(&self, events: Vec<StoredEvent>) {
            *self.log.write().await = events;
        }
    }

    #[async_trait]
    impl EventStore for ScriptedStore {
        async fn append(
            &self,
            events: Vec<StoredEvent>,
            _condition: AppendCondition,
        ) -> StoreResult<Sequence> {
            let last = events.last().map(|e| e.sequence).unwrap_or_default();
            self.log.write().await.extend(events);
            Ok(last)
        }

        async fn read_stream(&self, stream_id: DocumentId) -> StoreResult<Vec<StoredEvent>> {
            self.read_stream_from(stream_id, Sequence::first()).await
        }

        async fn read_stream_from(
            &self,
            stream_id: DocumentId,
            from: Sequence,
        ) -> StoreResult<Vec<StoredEvent>> {
            let log = self.log.read().await;
            Ok(log
                .iter()
                .filter(|e| e.stream_id == stream_id && e.sequence >= from)
                .cloned()
                .collect())
        }

        async fn stream_all(&self) -> StoreResult<EventStream> {
            let snapshot = self.log.read().await.clone();
            Ok(Box::pin(futures_util::stream::iter(
                snapshot.into_iter().map(Ok),
            )))
        }
    }

    fn event(stream_id: DocumentId, sequence: i64) -> StoredEvent {
        StoredEvent::builder()
            .stream(stream_id, "Order")
            .event_type("Noted")
            .sequence(Sequence::new(sequence))
            .payload_raw(serde_json::json!({ "noted": true }))
            .build()
            .unwrap()
    }

    async fn store_with(n: i64) -> InMemoryEventStore {
        let store = InMemoryEventStore::new();
        let stream_id = DocumentId::new();
        let events = (1..=n).map(|s| event(stream_id, s)).collect();
        store.append(events, AppendCondition::NoStream).await.unwrap();
        store
    }

    fn processor_for<S: EventStore>(store: S) -> (ProjectionProcessor<S>, RecordingProjection) {
        let projection = RecordingProjection::default();
        let mut processor = ProjectionProcessor::new(store);
        processor.register(Box::new(projection.clone()));
        (processor, projection)
    }

    #[tokio::test]
    async fn catch_up_delivers_every_event() {
        let (processor, projection) = processor_for(store_with(3).await);
        processor.run_catch_up().await.unwrap();

        assert_eq!(projection.seen().await.len(), 3);
        assert_eq!(processor.position().await.stream_count(), 1);
    }

    #[tokio::test]
    async fn second_catch_up_only_delivers_new_events() {
        let store = store_with(3).await;
        let (processor, projection) = processor_for(store.clone());

        processor.run_catch_up().await.unwrap();
        processor.run_catch_up().await.unwrap();
        assert_eq!(projection.seen().await.len(), 3);

        store
            .append(vec![event(DocumentId::new(), 1)], AppendCondition::NoStream)
            .await
            .unwrap();
        processor.run_catch_up().await.unwrap();
        assert_eq!(projection.seen().await.len(), 4);
    }

    #[tokio::test]
    async fn late_commit_behind_a_read_event_is_still_delivered() {
        let store = ScriptedStore::default();
        let early = DocumentId::new();
        let late = DocumentId::new();
        let (processor, projection) = processor_for(store.clone());

        store.set_log(vec![event(late, 1)]).await;
        processor.run_catch_up().await.unwrap();

        // `early` committed after `late` was read but sorts ahead of it.
        store.set_log(vec![event(early, 1), event(late, 1)]).await;
        processor.run_catch_up().await.unwrap();

        let seen = projection.seen().await;
        assert_eq!(seen, vec![(late, Sequence::first()), (early, Sequence::first())]);
    }

    #[tokio::test]
    async fn stream_catch_up_reads_only_past_the_mark() {
        let store = InMemoryEventStore::new();
        let a = DocumentId::new();
        let b = DocumentId::new();
        let (processor, projection) = processor_for(store.clone());

        store
            .append(vec![event(a, 1), event(a, 2)], AppendCondition::NoStream)
            .await
            .unwrap();
        store
            .append(vec![event(b, 1)], AppendCondition::NoStream)
            .await
            .unwrap();

        processor.catch_up_stream(a).await.unwrap();
        assert_eq!(projection.seen().await.len(), 2);

        store
            .append(vec![event(a, 3)], AppendCondition::after(Sequence::new(2)))
            .await
            .unwrap();
        processor.catch_up_stream(a).await.unwrap();
        assert_eq!(projection.seen().await.last(), Some(&(a, Sequence::new(3))));
        assert_eq!(projection.seen().await.len(), 3);

        // `b` was never caught up by stream, so a full pass still finds it.
        processor.run_catch_up().await.unwrap();
        assert_eq!(projection.seen().await.len(), 4);
        assert_eq!(processor.position().await.applied(b), Sequence::first());
    }

    #[tokio::test]
    async fn overlapping_catch_ups_deliver_once() {
        let store = store_with(5).await;
        let stream_id = store.stream_all().await.unwrap().next().await.unwrap().unwrap().stream_id;
        let (processor, projection) = processor_for(store);

        let (a, b) = tokio::join!(processor.run_catch_up(), processor.catch_up_stream(stream_id));
        a.unwrap();
        b.unwrap();
        assert_eq!(projection.seen().await.len(), 5);
    }

    #[tokio::test]
    async fn rebuild_resets_and_replays() {
        let (processor, projection) = processor_for(store_with(2).await);

        processor.run_catch_up().await.unwrap();
        processor.rebuild_all().await.unwrap();

        assert_eq!(projection.seen().await.len(), 2);
        assert_eq!(processor.projection_count(), 1);
    }

    #[tokio::test]
    async fn empty_store_catch_up_is_a_no_op() {
        let (processor, projection) = processor_for(InMemoryEventStore::new());
        processor.run_catch_up().await.unwrap();

        assert!(projection.seen().await.is_empty());
        assert_eq!(processor.position().await, ProjectionPosition::zero());
    }
}
