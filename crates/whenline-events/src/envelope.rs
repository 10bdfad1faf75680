//! The [`EventEnvelope`]: one stored event as handed out by an event source.
//!
//! An envelope carries the store-assigned sequence number and recording time
//! next to the producer's event type, payload and metadata. The payload stays
//! opaque JSON here; typed access goes through
//! [`NodeEvent::decode`](crate::NodeEvent::decode).
//!
//! # Timestamps
//!
//! The time an event is shown at is resolved in two tiers:
//!
//! 1. the `initiatingTimestamp` metadata entry, set by the producer when a
//!    user action started (this is the causal, user-facing time);
//! 2. otherwise the envelope's `recorded_at`, assigned by the store on append.
//!
//! A malformed `initiatingTimestamp` is an error, not a reason to fall back.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use whenline_core::timestamp::{Timestamp, parse_w3c};
use whenline_core::{EventId, SequenceNumber};

/// Metadata key holding the initiating timestamp.
pub const INITIATING_TIMESTAMP: &str = "initiatingTimestamp";

/// Why no timestamp could be resolved for an event.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum TimestampError {
    /// `initiatingTimestamp` is present but not an RFC 3339 string.
    #[error("invalid initiatingTimestamp metadata: {value}")]
    InvalidInitiatingTimestamp {
        /// The offending value, JSON-encoded unless it was a string.
        value: String,
    },
    /// Neither `initiatingTimestamp` nor a recording time is available.
    #[error("event has neither initiatingTimestamp metadata nor a recorded-at time")]
    Missing,
}

/// A stored event with its store-assigned envelope fields.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventEnvelope {
    /// Position in the global log.
    pub sequence_number: SequenceNumber,
    /// Unique event ID.
    pub event_id: EventId,
    /// Stream the producer appended to.
    #[serde(default)]
    pub stream: String,
    /// Event type string, e.g. `"NodePropertiesWereSet"`.
    #[serde(rename = "type")]
    pub event_type: String,
    /// Event payload (opaque JSON).
    pub payload: Value,
    /// Producer metadata.
    #[serde(default)]
    pub metadata: Map<String, Value>,
    /// Time the store recorded the event, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recorded_at: Option<Timestamp>,
}

impl EventEnvelope {
    /// Create an envelope with a fresh event ID, no metadata and no recording time.
    #[must_use]
    pub fn new(sequence_number: SequenceNumber, event_type: &str, payload: Value) -> Self {
        Self {
            sequence_number,
            event_id: EventId::new(),
            stream: String::new(),
            event_type: event_type.to_string(),
            payload,
            metadata: Map::new(),
            recorded_at: None,
        }
    }

    /// Set a metadata entry.
    #[must_use]
    pub fn with_metadata(mut self, key: &str, value: Value) -> Self {
        let _ = self.metadata.insert(key.to_string(), value);
        self
    }

    /// Set the `initiatingTimestamp` metadata entry.
    #[must_use]
    pub fn with_initiating_timestamp(self, timestamp: &str) -> Self {
        self.with_metadata(INITIATING_TIMESTAMP, Value::String(timestamp.to_string()))
    }

    /// Set the recording time.
    #[must_use]
    pub fn with_recorded_at(mut self, recorded_at: Timestamp) -> Self {
        self.recorded_at = Some(recorded_at);
        self
    }

    /// Set the stream name.
    #[must_use]
    pub fn with_stream(mut self, stream: &str) -> Self {
        self.stream = stream.to_string();
        self
    }

    /// The `initiatingTimestamp` metadata entry, if present.
    pub fn initiating_timestamp(&self) -> Result<Option<Timestamp>, TimestampError> {
        match self.metadata.get(INITIATING_TIMESTAMP) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(raw)) => parse_w3c(raw).map(Some).map_err(|_| {
                TimestampError::InvalidInitiatingTimestamp { value: raw.clone() }
            }),
            Some(other) => Err(TimestampError::InvalidInitiatingTimestamp {
                value: other.to_string(),
            }),
        }
    }

    /// Resolve the time this event is shown at: initiating timestamp first,
    /// recording time second.
    pub fn resolve_timestamp(&self) -> Result<Timestamp, TimestampError> {
        if let Some(initiated) = self.initiating_timestamp()? {
            return Ok(initiated);
        }
        self.recorded_at.ok_or(TimestampError::Missing)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
