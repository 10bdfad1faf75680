//! Projection error types.
//!
//! Every variant aborts the operation in progress. A failed catch-up cycle
//! persists nothing, so retrying it is always safe.

use std::path::PathBuf;

use thiserror::Error;
use whenline_core::SequenceNumber;
use whenline_events::{EventStoreError, TimestampError};

/// Errors raised while loading, advancing, saving or rendering the projection.
#[derive(Debug, Error)]
pub enum ProjectionError {
    /// The persisted state file is not a valid snapshot.
    #[error("failed to decode projection state from {}: {source}", .path.display())]
    StateDecode {
        /// State file path.
        path: PathBuf,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// A handled event's payload does not have the expected shape.
    #[error("failed to decode event {sequence_number} ({event_type}): {source}")]
    EventDecode {
        /// Sequence number of the event.
        sequence_number: SequenceNumber,
        /// Its event type.
        event_type: String,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// The `initiatingTimestamp` metadata of an event is malformed.
    #[error("event {sequence_number} has an invalid initiatingTimestamp: {value}")]
    InvalidTimestamp {
        /// Sequence number of the event.
        sequence_number: SequenceNumber,
        /// The offending value.
        value: String,
    },

    /// An event has neither `initiatingTimestamp` metadata nor a recorded-at time.
    #[error("event {sequence_number} has no timestamp")]
    MissingTimestamp {
        /// Sequence number of the event.
        sequence_number: SequenceNumber,
    },

    /// The snapshot could not be serialized.
    #[error("failed to encode projection state: {0}")]
    StateEncode(#[source] serde_json::Error),

    /// Reading, writing or replacing the state file failed.
    #[error("state file I/O error on {}: {source}", .path.display())]
    Io {
        /// Path involved.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The event source could not be read.
    #[error("event source error: {0}")]
    EventSource(#[from] EventStoreError),

    /// A programming invariant does not hold (e.g. an unrenderable record).
    #[error("projection invariant violated: {0}")]
    InvariantViolation(String),
}

impl ProjectionError {
    /// Attach the offending sequence number to a timestamp resolution failure.
    pub fn from_timestamp(sequence_number: SequenceNumber, error: TimestampError) -> Self {
        match error {
            TimestampError::InvalidInitiatingTimestamp { value } => Self::InvalidTimestamp {
                sequence_number,
                value,
            },
            TimestampError::Missing => Self::MissingTimestamp { sequence_number },
        }
    }
}

/// Convenience type alias for projection results.
pub type Result<T> = std::result::Result<T, ProjectionError>;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
