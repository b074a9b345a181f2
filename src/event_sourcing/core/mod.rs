// ============================================================================
// Event Sourcing Core - Generic Infrastructure Abstractions
// ============================================================================
//
// Aggregate and event-envelope abstractions shared by every event-sourced
// aggregate in the crate. Nothing in here knows about orders, carts or
// payments.
//
// ============================================================================

pub mod aggregate;
pub mod event;

pub use aggregate::Aggregate;
pub use event::{deserialize_event, serialize_event, DomainEvent, EventEnvelope};
