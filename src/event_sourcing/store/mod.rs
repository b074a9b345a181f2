// ============================================================================
// Event Sourcing Store - Persistence Layer
// ============================================================================
//
// The EventStore contract plus two backends: in-memory (tests, demo) and
// ScyllaDB (production).
//
// ============================================================================

pub mod event_store;
pub mod memory;
pub mod scylla_store;
#[cfg(test)]
pub mod testing;

pub use event_store::{load_aggregate, EventStore, StoreError};
pub use memory::InMemoryEventStore;
pub use scylla_store::ScyllaEventStore;
