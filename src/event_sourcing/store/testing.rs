use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::{Barrier, Notify};
use uuid::Uuid;

use crate::event_sourcing::core::{DomainEvent, EventEnvelope};
use super::event_store::{EventStore, StoreError};
use super::memory::InMemoryEventStore;

// ============================================================================
// Test Stores - Scripted interleavings over the in-memory backend
// ============================================================================

/// Holds the next `writers` appends at a barrier, so every writer has loaded
/// and decided against the same version before any of them commits.
pub struct InterleavedStore<E> {
    inner: InMemoryEventStore<E>,
    barrier: Barrier,
    writers: usize,
    gated: AtomicUsize,
}

impl<E> InterleavedStore<E> {
    pub fn new(writers: usize) -> Self {
        Self {
            inner: InMemoryEventStore::new(),
            barrier: Barrier::new(writers),
            writers,
            gated: AtomicUsize::new(0),
        }
    }

    pub fn arm(&self) {
        self.gated.store(self.writers, Ordering::SeqCst);
    }
}

#[async_trait]
impl<E: DomainEvent> EventStore<E> for InterleavedStore<E> {
    async fn append_events(
        &self,
        aggregate_id: Uuid,
        expected_version: i64,
        events: Vec<EventEnvelope<E>>,
    ) -> Result<i64, StoreError> {
        let gated = self
            .gated
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if gated {
            self.barrier.wait().await;
        }
        self.inner.append_events(aggregate_id, expected_version, events).await
    }

    async fn load_events(&self, aggregate_id: Uuid) -> Result<Vec<EventEnvelope<E>>, StoreError> {
        self.inner.load_events(aggregate_id).await
    }

    async fn current_version(&self, aggregate_id: Uuid) -> Result<i64, StoreError> {
        self.inner.current_version(aggregate_id).await
    }

    async fn aggregate_ids(&self) -> Result<Vec<Uuid>, StoreError> {
        self.inner.aggregate_ids().await
    }
}

/// Parks the next append until `release`, signalling when it got there.
pub struct HeldStore<E> {
    inner: InMemoryEventStore<E>,
    hold: AtomicBool,
    entered: Notify,
    released: Notify,
}

impl<E> HeldStore<E> {
    pub fn new() -> Self {
        Self {
            inner: InMemoryEventStore::new(),
            hold: AtomicBool::new(false),
            entered: Notify::new(),
            released: Notify::new(),
        }
    }

    pub fn hold_next_append(&self) {
        self.hold.store(true, Ordering::SeqCst);
    }

    /// Resolves once a held append is parked
    pub async fn append_parked(&self) {
        self.entered.notified().await;
    }

    pub fn release(&self) {
        self.released.notify_one();
    }
}

#[async_trait]
impl<E: DomainEvent> EventStore<E> for HeldStore<E> {
    async fn append_events(
        &self,
        aggregate_id: Uuid,
        expected_version: i64,
        events: Vec<EventEnvelope<E>>,
    ) -> Result<i64, StoreError> {
        if self.hold.swap(false, Ordering::SeqCst) {
            self.entered.notify_one();
            self.released.notified().await;
        }
        self.inner.append_events(aggregate_id, expected_version, events).await
    }

    async fn load_events(&self, aggregate_id: Uuid) -> Result<Vec<EventEnvelope<E>>, StoreError> {
        self.inner.load_events(aggregate_id).await
    }

    async fn current_version(&self, aggregate_id: Uuid) -> Result<i64, StoreError> {
        self.inner.current_version(aggregate_id).await
    }

    async fn aggregate_ids(&self) -> Result<Vec<Uuid>, StoreError> {
        self.inner.aggregate_ids().await
    }
}
