//! The [`EventSource`] seam.
//!
//! The projection never talks to a concrete store; it asks an
//! `EventSource` for "everything after position P" and consumes the result
//! in order. [`EventStore`](crate::EventStore) implements it on top of
//! `SQLite`; [`InMemoryEventSource`] is a plain vector for tests and replays.

use whenline_core::SequenceNumber;

use crate::envelope::EventEnvelope;
use crate::errors::{EventStoreError, Result};

/// Ordered, append-only source of events.
pub trait EventSource {
    /// All events with a sequence number strictly greater than `after`,
    /// in ascending sequence order.
    fn events_after(&self, after: SequenceNumber) -> Result<Vec<EventEnvelope>>;
}

/// Vector-backed [`EventSource`].
///
/// Envelopes must be pushed in strictly increasing sequence order.
#[derive(Clone, Debug, Default)]
pub struct InMemoryEventSource {
    events: Vec<EventEnvelope>,
}

impl InMemoryEventSource {
    /// Create an empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an envelope.
    ///
    /// Fails with [`EventStoreError::InvalidOperation`] if its sequence number
    /// does not exceed the last one.
    pub fn push(&mut self, envelope: EventEnvelope) -> Result<()> {
        if let Some(last) = self.events.last() {
            if envelope.sequence_number <= last.sequence_number {
                return Err(EventStoreError::InvalidOperation(format!(
                    "sequence number {} does not follow {}",
                    envelope.sequence_number, last.sequence_number
                )));
            }
        }
        self.events.push(envelope);
        Ok(())
    }

    /// Highest sequence number in the source.
    #[must_use]
    pub fn last_sequence_number(&self) -> SequenceNumber {
        self.events
            .last()
            .map_or(SequenceNumber::NONE, |e| e.sequence_number)
    }

    /// Number of stored events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the source holds no events.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl TryFrom<Vec<EventEnvelope>> for InMemoryEventSource {
    type Error = EventStoreError;

    fn try_from(events: Vec<EventEnvelope>) -> Result<Self> {
        let mut source = Self::new();
        for envelope in events {
            source.push(envelope)?;
        }
        Ok(source)
    }
}

impl EventSource for InMemoryEventSource {
    fn events_after(&self, after: SequenceNumber) -> Result<Vec<EventEnvelope>> {
        let start = self.events.partition_point(|e| e.sequence_number <= after);
        Ok(self.events[start..].to_vec())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
