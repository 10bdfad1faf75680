//! Error types for the event log.
//!
//! [`EventStoreError`] is returned by every [`EventStore`](crate::EventStore)
//! and [`EventSource`](crate::EventSource) operation.

use thiserror::Error;

/// Errors that can occur while reading from or appending to the event log.
#[derive(Debug, Error)]
pub enum EventStoreError {
    /// `SQLite` database error.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Connection pool error.
    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    /// JSON serialization/deserialization error.
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),

    /// The log was written with a schema this build does not know.
    #[error("unsupported event log schema version {found} (expected {supported})")]
    Schema {
        /// Version recorded in the database file.
        found: i32,
        /// Version this build writes.
        supported: i32,
    },

    /// A stored row does not have the expected shape.
    #[error("corrupt event row {sequence_number}: {message}")]
    CorruptRow {
        /// Sequence number of the offending row.
        sequence_number: i64,
        /// What is wrong with it.
        message: String,
    },

    /// Invalid operation on the event log.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),
}

/// Convenience type alias for event log results.
pub type Result<T> = std::result::Result<T, EventStoreError>;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sqlite_error_display() {
        let err = EventStoreError::Sqlite(rusqlite::Error::QueryReturnedNoRows);
        assert!(err.to_string().contains("sqlite error"));
    }

    #[test]
    fn serde_error_display() {
        let serde_err = serde_json::from_str::<String>("not json").unwrap_err();
        let err = EventStoreError::Serde(serde_err);
        assert!(err.to_string().contains("serde error"));
    }

    #[test]
    fn schema_error_display() {
        let err = EventStoreError::Schema {
            found: 3,
            supported: 1,
        };
        assert_eq!(
            err.to_string(),
            "unsupported event log schema version 3 (expected 1)"
        );
    }

    #[test]
    fn corrupt_row_display() {
        let err = EventStoreError::CorruptRow {
            sequence_number: 12,
            message: "metadata is not an object".into(),
        };
        assert_eq!(
            err.to_string(),
            "corrupt event row 12: metadata is not an object"
        );
    }

    #[test]
    fn invalid_operation_display() {
        let err = EventStoreError::InvalidOperation("empty event type".into());
        assert_eq!(err.to_string(), "invalid operation: empty event type");
    }

    #[test]
    fn from_rusqlite_error() {
        let err: EventStoreError = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(matches!(err, EventStoreError::Sqlite(_)));
    }
}
