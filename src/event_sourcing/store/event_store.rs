use async_trait::async_trait;
use uuid::Uuid;
use anyhow::bail;

use crate::event_sourcing::core::{Aggregate, DomainEvent, EventEnvelope};

// ============================================================================
// Event Store - Repository for Events
// ============================================================================
//
// Responsibilities:
// 1. Append events to a per-aggregate stream (append-only)
// 2. Load event history for aggregates
// 3. Enforce optimistic concurrency: an append names the version it was
//    decided against and fails if the stream has moved on
//
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Concurrency conflict on {aggregate_id}: expected version {expected}, but current is {actual}")]
    VersionConflict {
        aggregate_id: Uuid,
        expected: i64,
        actual: i64,
    },

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

impl StoreError {
    pub fn is_version_conflict(&self) -> bool {
        matches!(self, StoreError::VersionConflict { .. })
    }
}

#[async_trait]
pub trait EventStore<E: DomainEvent>: Send + Sync {
    /// Append events to a stream, returning the new version.
    ///
    /// `expected_version` is 0 for a stream that must not exist yet.
    async fn append_events(
        &self,
        aggregate_id: Uuid,
        expected_version: i64,
        events: Vec<EventEnvelope<E>>,
    ) -> Result<i64, StoreError>;

    /// Load all events of a stream in sequence order (empty if unknown)
    async fn load_events(&self, aggregate_id: Uuid) -> Result<Vec<EventEnvelope<E>>, StoreError>;

    /// Sequence number of the last event in a stream, 0 if unknown
    async fn current_version(&self, aggregate_id: Uuid) -> Result<i64, StoreError>;

    /// Ids of every stream in the store
    async fn aggregate_ids(&self) -> Result<Vec<Uuid>, StoreError>;
}

/// Fold an aggregate from its stream. `None` when the stream is empty.
pub async fn load_aggregate<A, E>(store: &dyn EventStore<E>, aggregate_id: Uuid) -> Result<Option<A>, StoreError>
where
    E: DomainEvent,
    A: Aggregate<Event = E>,
    A::Error: std::fmt::Display,
{
    let events = store.load_events(aggregate_id).await?;
    if events.is_empty() {
        return Ok(None);
    }

    let aggregate = A::load_from_events(&events)?;
    Ok(Some(aggregate))
}

/// Check that a batch continues the stream at `expected_version` without gaps
pub(crate) fn check_batch<E>(aggregate_id: Uuid, expected_version: i64, events: &[EventEnvelope<E>]) -> anyhow::Result<()> {
    if events.is_empty() {
        bail!("Cannot append empty event list");
    }

    for (offset, envelope) in events.iter().enumerate() {
        let wanted = expected_version + 1 + offset as i64;
        if envelope.aggregate_id != aggregate_id {
            bail!("Event {} belongs to stream {}, not {}", envelope.event_id, envelope.aggregate_id, aggregate_id);
        }
        if envelope.sequence_number != wanted {
            bail!(
                "Event {} has sequence number {}, expected {}",
                envelope.event_id,
                envelope.sequence_number,
                wanted
            );
        }
    }

    Ok(())
}
