use async_trait::async_trait;
use common::UserId;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::{
    DocumentId, EventId, EventStoreError, Result, Sequence, StoredEvent,
    store::{AppendCondition, EventStore, EventStream, check_condition, validate_batch},
};

const SELECT_COLUMNS: &str =
    "SELECT id, stream_id, stream_type, event_type, sequence, recorded_at, recorded_by, payload FROM events";

/// Event store backed by a PostgreSQL `events` table.
///
/// The `(stream_id, sequence)` unique constraint is the final arbiter for
/// concurrent writers: the precondition is checked inside the append
/// transaction, and a writer that slips past the check still fails on insert.
#[derive(Clone)]
pub struct PostgresEventStore {
    pool: PgPool,
}

impl PostgresEventStore {
    /// Creates a store over an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a pool against `database_url`.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Returns the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Applies the migrations under `migrations/`.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_event(row: PgRow) -> Result<StoredEvent> {
        let recorded_by: Option<String> = row.try_get("recorded_by")?;
        Ok(StoredEvent {
            event_id: EventId::from_uuid(row.try_get::<Uuid, _>("id")?),
            event_type: row.try_get("event_type")?,
            stream_id: DocumentId::from_uuid(row.try_get::<Uuid, _>("stream_id")?),
            stream_type: row.try_get("stream_type")?,
            sequence: Sequence::new(row.try_get("sequence")?),
            recorded_at: row.try_get("recorded_at")?,
            recorded_by: recorded_by.and_then(|id| UserId::new(id).ok()),
            payload: row.try_get("payload")?,
        })
    }
}

#[async_trait]
impl EventStore for PostgresEventStore {
    async fn append(
        &self,
        events: Vec<StoredEvent>,
        condition: AppendCondition,
    ) -> Result<Sequence> {
        validate_batch(&events)?;

        let stream_id = events[0].stream_id;
        let mut tx = self.pool.begin().await?;

        let current: i64 =
            sqlx::query_scalar("SELECT COALESCE(MAX(sequence), 0) FROM events WHERE stream_id = $1")
                .bind(stream_id.as_uuid())
                .fetch_one(&mut *tx)
                .await?;
        let current = Sequence::new(current);

        check_condition(stream_id, current, events[0].sequence, condition)?;

        let mut last = current;
        for event in &events {
            sqlx::query(
                r#"
                INSERT INTO events (id, stream_id, stream_type, event_type, sequence, recorded_at, recorded_by, payload)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                "#,
            )
            .bind(event.event_id.as_uuid())
            .bind(event.stream_id.as_uuid())
            .bind(&event.stream_type)
            .bind(&event.event_type)
            .bind(event.sequence.as_i64())
            .bind(event.recorded_at)
            .bind(event.recorded_by.as_ref().map(UserId::as_str))
            .bind(&event.payload)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(ref db_err) = e
                    && db_err.constraint() == Some("unique_stream_sequence")
                {
                    metrics::counter!("event_store_sequence_conflicts_total").increment(1);
                    return EventStoreError::SequenceConflict {
                        stream_id,
                        expected: condition.expected().unwrap_or(current),
                        actual: event.sequence,
                    };
                }
                EventStoreError::Database(e)
            })?;

            last = event.sequence;
        }

        tx.commit().await?;
        tracing::debug!(%stream_id, sequence = %last, "appended to postgres stream");
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
        let rows = sqlx::query(&format!(
            "{SELECT_COLUMNS} WHERE stream_id = $1 AND sequence >= $2 ORDER BY sequence ASC"
        ))
        .bind(stream_id.as_uuid())
        .bind(from.as_i64())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_event).collect()
    }

    async fn stream_all(&self) -> Result<EventStream> {
        let rows = sqlx::query(&format!("{SELECT_COLUMNS} ORDER BY position ASC"))
            .fetch_all(&self.pool)
            .await?;

        let events: Vec<Result<StoredEvent>> = rows.into_iter().map(Self::row_to_event).collect();
        Ok(Box::pin(futures_util::stream::iter(events)))
    }
}
