//! Database row types for mapping between `SQLite` rows and Rust structs.
//!
//! These represent the raw database row shape, not the public API types.
//! Conversion to [`EventEnvelope`](crate::EventEnvelope) happens in the
//! store layer.

use serde::{Deserialize, Serialize};

/// Raw event row from the `events` table.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EventRow {
    /// Global sequence number.
    pub sequence_number: i64,
    /// Event ID.
    pub id: String,
    /// Stream name.
    pub stream: String,
    /// Event type.
    pub event_type: String,
    /// Payload as JSON text.
    pub payload: String,
    /// Metadata as JSON text.
    pub metadata: String,
    /// Recording time, RFC 3339.
    pub recorded_at: String,
}
