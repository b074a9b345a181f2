use async_trait::async_trait;
use ::scylla::client::session::Session;
use ::scylla::statement::batch::Batch;
use std::marker::PhantomData;
use std::sync::Arc;
use uuid::Uuid;
use chrono::{DateTime, Utc};
use anyhow::Result;

use crate::event_sourcing::core::{deserialize_event, serialize_event, DomainEvent, EventEnvelope};
use super::event_store::{check_batch, EventStore, StoreError};

// ============================================================================
// ScyllaDB Event Store
// ============================================================================
//
// One partition per aggregate, clustered by sequence number:
//
//   PRIMARY KEY (aggregate_id, sequence_number)
//
// An append is a single-partition conditional batch where every row is
// written with IF NOT EXISTS. Two writers racing for the same next sequence
// number cannot both win; the loser finds someone else's event id at that
// position and gets a VersionConflict.
//
// ============================================================================

type EventRow = (Uuid, i64, Uuid, String, i32, String, Uuid, Option<Uuid>, DateTime<Utc>);

pub struct ScyllaEventStore<E: DomainEvent> {
    session: Arc<Session>,
    aggregate_type_name: String, // e.g. "Order"
    table: String,               // keyspace-qualified, e.g. "fruitmart.order_events"
    _phantom: PhantomData<E>,
}

impl<E: DomainEvent> ScyllaEventStore<E> {
    pub fn new(session: Arc<Session>, keyspace: &str, aggregate_type_name: &str, table: &str) -> Self {
        Self {
            session,
            aggregate_type_name: aggregate_type_name.to_string(),
            table: format!("{}.{}", keyspace, table),
            _phantom: PhantomData,
        }
    }

    /// Create the keyspace and event table if they do not exist yet
    pub async fn ensure_schema(&self, keyspace: &str) -> Result<()> {
        let create_keyspace = format!(
            "CREATE KEYSPACE IF NOT EXISTS {} WITH REPLICATION = \
             {{'class': 'SimpleStrategy', 'replication_factor': 1}}",
            keyspace
        );
        self.session.query_unpaged(create_keyspace.as_str(), ()).await?;

        let create_table = format!(
            "CREATE TABLE IF NOT EXISTS {} (
                aggregate_id uuid,
                sequence_number bigint,
                event_id uuid,
                event_type text,
                event_version int,
                event_data text,
                correlation_id uuid,
                user_id uuid,
                timestamp timestamp,
                PRIMARY KEY (aggregate_id, sequence_number)
            ) WITH CLUSTERING ORDER BY (sequence_number ASC)",
            self.table
        );
        self.session.query_unpaged(create_table.as_str(), ()).await?;

        tracing::info!(table = %self.table, aggregate_type = %self.aggregate_type_name, "Event store schema ready");
        Ok(())
    }

    async fn write_batch(&self, aggregate_id: Uuid, expected_version: i64, events: &[EventEnvelope<E>]) -> Result<bool> {
        let insert = format!(
            "INSERT INTO {} (
                aggregate_id, sequence_number, event_id, event_type, event_version,
                event_data, correlation_id, user_id, timestamp
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?) IF NOT EXISTS",
            self.table
        );

        let mut batch = Batch::default();
        let mut values: Vec<EventRow> = Vec::with_capacity(events.len());

        for envelope in events {
            batch.append_statement(insert.as_str());
            values.push((
                aggregate_id,
                envelope.sequence_number,
                envelope.event_id,
                envelope.event_type.clone(),
                envelope.event_version,
                serialize_event(&envelope.event_data)?,
                envelope.correlation_id,
                envelope.user_id,
                envelope.timestamp,
            ));
        }

        self.session.batch(&batch, values).await?;

        // Whoever owns the first new position owns the whole batch
        let first = &events[0];
        let owner = self.event_id_at(aggregate_id, expected_version + 1).await?;
        Ok(owner == Some(first.event_id))
    }

    async fn event_id_at(&self, aggregate_id: Uuid, sequence_number: i64) -> Result<Option<Uuid>> {
        let query = format!(
            "SELECT event_id FROM {} WHERE aggregate_id = ? AND sequence_number = ?",
            self.table
        );
        let rows = self
            .session
            .query_unpaged(query.as_str(), (aggregate_id, sequence_number))
            .await?
            .into_rows_result()?;

        Ok(rows.maybe_first_row::<(Uuid,)>()?.map(|(event_id,)| event_id))
    }

    async fn fetch_events(&self, aggregate_id: Uuid) -> Result<Vec<EventEnvelope<E>>> {
        let query = format!(
            "SELECT aggregate_id, sequence_number, event_id, event_type, event_version,
                    event_data, correlation_id, user_id, timestamp
             FROM {}
             WHERE aggregate_id = ?
             ORDER BY sequence_number ASC",
            self.table
        );
        let rows_result = self
            .session
            .query_unpaged(query.as_str(), (aggregate_id,))
            .await?
            .into_rows_result()?;

        let mut events = Vec::new();
        for row in rows_result.rows::<EventRow>()? {
            let (agg_id, sequence_number, event_id, event_type, event_version, event_data_json, correlation_id, user_id, timestamp) = row?;

            events.push(EventEnvelope {
                event_id,
                aggregate_id: agg_id,
                sequence_number,
                event_type,
                event_version,
                event_data: deserialize_event(&event_data_json)?,
                correlation_id,
                user_id,
                timestamp,
            });
        }

        tracing::debug!("Loaded {} events for aggregate {}", events.len(), aggregate_id);
        Ok(events)
    }

    async fn fetch_version(&self, aggregate_id: Uuid) -> Result<i64> {
        let query = format!(
            "SELECT sequence_number FROM {} WHERE aggregate_id = ? ORDER BY sequence_number DESC LIMIT 1",
            self.table
        );
        let rows = self
            .session
            .query_unpaged(query.as_str(), (aggregate_id,))
            .await?
            .into_rows_result()?;

        Ok(rows.maybe_first_row::<(i64,)>()?.map(|(version,)| version).unwrap_or(0))
    }

    async fn fetch_ids(&self) -> Result<Vec<Uuid>> {
        let query = format!("SELECT DISTINCT aggregate_id FROM {}", self.table);
        let rows = self.session.query_unpaged(query.as_str(), ()).await?.into_rows_result()?;

        let mut ids = Vec::new();
        for row in rows.rows::<(Uuid,)>()? {
            let (id,) = row?;
            ids.push(id);
        }
        Ok(ids)
    }
}

#[async_trait]
impl<E: DomainEvent> EventStore<E> for ScyllaEventStore<E> {
    async fn append_events(
        &self,
        aggregate_id: Uuid,
        expected_version: i64,
        events: Vec<EventEnvelope<E>>,
    ) -> Result<i64, StoreError> {
        check_batch(aggregate_id, expected_version, &events)?;

        let current_version = self.fetch_version(aggregate_id).await?;
        if current_version != expected_version {
            return Err(StoreError::VersionConflict {
                aggregate_id,
                expected: expected_version,
                actual: current_version,
            });
        }

        if !self.write_batch(aggregate_id, expected_version, &events).await? {
            let actual = self.fetch_version(aggregate_id).await?;
            return Err(StoreError::VersionConflict {
                aggregate_id,
                expected: expected_version,
                actual,
            });
        }

        let new_version = expected_version + events.len() as i64;

        tracing::info!(
            aggregate_id = %aggregate_id,
            aggregate_type = %self.aggregate_type_name,
            new_version = new_version,
            event_count = events.len(),
            "✅ Appended events to event store"
        );

        Ok(new_version)
    }

    async fn load_events(&self, aggregate_id: Uuid) -> Result<Vec<EventEnvelope<E>>, StoreError> {
        Ok(self.fetch_events(aggregate_id).await?)
    }

    async fn current_version(&self, aggregate_id: Uuid) -> Result<i64, StoreError> {
        Ok(self.fetch_version(aggregate_id).await?)
    }

    async fn aggregate_ids(&self) -> Result<Vec<Uuid>, StoreError> {
        Ok(self.fetch_ids().await?)
    }
}

// Exercising append/load/conflict needs a running ScyllaDB node; the store
// contract itself is covered by the in-memory backend tests.
