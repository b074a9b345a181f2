use uuid::Uuid;
use anyhow::{Result, bail};
use super::event::EventEnvelope;

// ============================================================================
// Aggregate Root Pattern
// ============================================================================
//
// 1. State is derived from the event stream, never stored directly
// 2. Commands are validated against current state before any event exists
// 3. An aggregate's version is the sequence number of its last applied event
// 4. The version read at load time is the expected version at append time
//
// ============================================================================

/// Event-sourced aggregate.
///
/// Creation is not a command: the first event of a stream is produced by a
/// domain factory and appended at version 0. `handle_command` only runs
/// against an aggregate that has already been folded from its history.
pub trait Aggregate: Sized + Send + Sync {
    type Event;
    type Command;
    type Error;

    /// Build the aggregate from the first event of its stream
    fn apply_first_event(envelope: &EventEnvelope<Self::Event>) -> Result<Self, Self::Error>;

    /// Fold a subsequent event into the aggregate
    fn apply_event(&mut self, envelope: &EventEnvelope<Self::Event>) -> Result<(), Self::Error>;

    /// Decide which events a command produces (business rules live here)
    fn handle_command(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error>;

    fn aggregate_id(&self) -> Uuid;

    /// Sequence number of the last applied event
    fn version(&self) -> i64;

    /// Reconstruct the aggregate from its full event history
    fn load_from_events(events: &[EventEnvelope<Self::Event>]) -> Result<Self>
    where
        Self::Error: std::fmt::Display,
    {
        let Some((first, rest)) = events.split_first() else {
            bail!("No events to load");
        };

        let mut aggregate = Self::apply_first_event(first)
            .map_err(|e| anyhow::anyhow!("Failed to apply first event: {}", e))?;

        for envelope in rest {
            if envelope.sequence_number != aggregate.version() + 1 {
                bail!(
                    "Sequence gap in stream {}: expected {}, found {}",
                    envelope.aggregate_id,
                    aggregate.version() + 1,
                    envelope.sequence_number
                );
            }
            aggregate.apply_event(envelope)
                .map_err(|e| anyhow::anyhow!("Failed to apply event: {}", e))?;
        }

        Ok(aggregate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Counter {
        id: Uuid,
        version: i64,
        total: i64,
    }

    impl Aggregate for Counter {
        type Event = i64;
        type Command = i64;
        type Error = String;

        fn apply_first_event(envelope: &EventEnvelope<i64>) -> Result<Self, String> {
            Ok(Self {
                id: envelope.aggregate_id,
                version: envelope.sequence_number,
                total: envelope.event_data,
            })
        }

        fn apply_event(&mut self, envelope: &EventEnvelope<i64>) -> Result<(), String> {
            self.total += envelope.event_data;
            self.version = envelope.sequence_number;
            Ok(())
        }

        fn handle_command(&self, command: &i64) -> Result<Vec<i64>, String> {
            Ok(vec![*command])
        }

        fn aggregate_id(&self) -> Uuid {
            self.id
        }

        fn version(&self) -> i64 {
            self.version
        }
    }

    fn envelope(id: Uuid, seq: i64, value: i64) -> EventEnvelope<i64> {
        EventEnvelope::new(id, seq, "Counted", value, Uuid::new_v4())
    }

    #[test]
    fn test_load_from_events_tracks_version() {
        let id = Uuid::new_v4();
        let events = vec![envelope(id, 1, 2), envelope(id, 2, 3), envelope(id, 3, 5)];

        let counter = Counter::load_from_events(&events).unwrap();
        assert_eq!(counter.aggregate_id(), id);
        assert_eq!(counter.version(), 3);
        assert_eq!(counter.total, 10);
    }

    #[test]
    fn test_load_from_empty_stream_fails() {
        assert!(Counter::load_from_events(&[]).is_err());
    }

    #[test]
    fn test_load_rejects_sequence_gap() {
        let id = Uuid::new_v4();
        let events = vec![envelope(id, 1, 2), envelope(id, 3, 3)];
        assert!(Counter::load_from_events(&events).is_err());
    }
}
