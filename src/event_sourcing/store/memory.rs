use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::event_sourcing::core::{DomainEvent, EventEnvelope};
use super::event_store::{check_batch, EventStore, StoreError};

// ============================================================================
// In-Memory Event Store
// ============================================================================
//
// Streams live in a map behind one RwLock. The version check and the append
// happen under the same write guard, which makes every append atomic.
//
// ============================================================================

pub struct InMemoryEventStore<E> {
    streams: RwLock<HashMap<Uuid, Vec<EventEnvelope<E>>>>,
}

impl<E> InMemoryEventStore<E> {
    pub fn new() -> Self {
        Self {
            streams: RwLock::new(HashMap::new()),
        }
    }
}

impl<E> Default for InMemoryEventStore<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<E: DomainEvent> EventStore<E> for InMemoryEventStore<E> {
    async fn append_events(
        &self,
        aggregate_id: Uuid,
        expected_version: i64,
        events: Vec<EventEnvelope<E>>,
    ) -> Result<i64, StoreError> {
        check_batch(aggregate_id, expected_version, &events)?;

        let mut streams = self.streams.write().await;

        let current_version = streams
            .get(&aggregate_id)
            .and_then(|stream| stream.last())
            .map(|last| last.sequence_number)
            .unwrap_or(0);

        if current_version != expected_version {
            return Err(StoreError::VersionConflict {
                aggregate_id,
                expected: expected_version,
                actual: current_version,
            });
        }

        let event_count = events.len();
        let new_version = expected_version + event_count as i64;
        streams.entry(aggregate_id).or_default().extend(events);

        tracing::debug!(
            aggregate_id = %aggregate_id,
            new_version = new_version,
            event_count = event_count,
            "Appended events to in-memory store"
        );

        Ok(new_version)
    }

    async fn load_events(&self, aggregate_id: Uuid) -> Result<Vec<EventEnvelope<E>>, StoreError> {
        let streams = self.streams.read().await;
        Ok(streams.get(&aggregate_id).cloned().unwrap_or_default())
    }

    async fn current_version(&self, aggregate_id: Uuid) -> Result<i64, StoreError> {
        let streams = self.streams.read().await;
        Ok(streams
            .get(&aggregate_id)
            .and_then(|stream| stream.last())
            .map(|last| last.sequence_number)
            .unwrap_or(0))
    }

    async fn aggregate_ids(&self) -> Result<Vec<Uuid>, StoreError> {
        let streams = self.streams.read().await;
        Ok(streams.keys().copied().collect())
    }
}
