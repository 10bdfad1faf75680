//! `SQLite`-backed event log.
//!
//! Appends assign the next sequence number and the recording time; reads
//! hand out [`EventEnvelope`]s in sequence order.

use std::path::Path;

use serde_json::{Map, Value};
use tracing::{debug, warn};
use whenline_core::timestamp::{self, format_w3c, parse_w3c};
use whenline_core::{EventId, SequenceNumber};

use crate::envelope::{EventEnvelope, INITIATING_TIMESTAMP};
use crate::errors::{EventStoreError, Result};
use crate::source::EventSource;
use crate::sqlite::pool::{self, ConnectionConfig, ConnectionPool, PooledConnection};
use crate::sqlite::schema::ensure_schema;
use crate::sqlite::repositories::event::{EventRepo, NewEventRow};
use crate::sqlite::row_types::EventRow;

/// An event about to be appended.
#[derive(Clone, Debug, PartialEq)]
pub struct AppendEvent {
    /// Stream to append to.
    pub stream: String,
    /// Event type string.
    pub event_type: String,
    /// Event payload (JSON).
    pub payload: Value,
    /// Producer metadata.
    pub metadata: Map<String, Value>,
}

impl AppendEvent {
    /// Create an event with empty metadata.
    #[must_use]
    pub fn new(stream: &str, event_type: &str, payload: Value) -> Self {
        Self {
            stream: stream.to_string(),
            event_type: event_type.to_string(),
            payload,
            metadata: Map::new(),
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
}

/// Event log wrapping a connection pool.
#[derive(Debug)]
pub struct EventStore {
    pool: ConnectionPool,
}

impl EventStore {
    /// Open (or create) a file-backed log.
    pub fn open(path: &Path, config: &ConnectionConfig) -> Result<Self> {
        let store = Self::with_pool(pool::file_pool(path, config)?)?;
        debug!(path = %path.display(), "opened event log");
        Ok(store)
    }

    /// Create a private in-memory log.
    pub fn in_memory() -> Result<Self> {
        Self::with_pool(pool::memory_pool()?)
    }

    fn with_pool(pool: ConnectionPool) -> Result<Self> {
        let conn: PooledConnection = pool.get()?;
        ensure_schema(&conn)?;
        drop(conn);
        Ok(Self { pool })
    }

    /// Get a connection from the pool.
    fn conn(&self) -> Result<PooledConnection> {
        Ok(self.pool.get()?)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Writes
    // ─────────────────────────────────────────────────────────────────────

    /// Append one event. Returns the stored envelope with its assigned
    /// sequence number and recording time.
    pub fn append(&self, event: &AppendEvent) -> Result<EventEnvelope> {
        let event_id = EventId::new();
        let recorded_at = format_w3c(&timestamp::now());
        let payload = serde_json::to_string(&event.payload)?;
        let metadata = serde_json::to_string(&event.metadata)?;

        let conn = self.conn()?;
        let sequence_number = EventRepo::insert(
            &conn,
            &NewEventRow {
                id: event_id.as_str(),
                stream: &event.stream,
                event_type: &event.event_type,
                payload: &payload,
                metadata: &metadata,
                recorded_at: &recorded_at,
            },
        )?;
        debug!(
            sequence_number,
            event_type = %event.event_type,
            stream = %event.stream,
            "appended event"
        );

        Ok(EventEnvelope {
            sequence_number: to_sequence_number(sequence_number)?,
            event_id,
            stream: event.stream.clone(),
            event_type: event.event_type.clone(),
            payload: event.payload.clone(),
            metadata: event.metadata.clone(),
            recorded_at: parse_w3c(&recorded_at).ok(),
        })
    }

    // ─────────────────────────────────────────────────────────────────────
    // Reads
    // ─────────────────────────────────────────────────────────────────────

    /// All events strictly after `after`, in sequence order.
    pub fn events_after(&self, after: SequenceNumber) -> Result<Vec<EventEnvelope>> {
        let after = i64::try_from(after.value()).map_err(|_| {
            EventStoreError::InvalidOperation(format!("sequence number {after} out of range"))
        })?;
        let conn = self.conn()?;
        EventRepo::get_after(&conn, after)?
            .into_iter()
            .map(row_to_envelope)
            .collect()
    }

    /// Highest assigned sequence number, [`SequenceNumber::NONE`] when empty.
    pub fn last_sequence_number(&self) -> Result<SequenceNumber> {
        let conn = self.conn()?;
        to_sequence_number(EventRepo::last_sequence_number(&conn)?)
    }

    /// Number of stored events.
    pub fn count(&self) -> Result<i64> {
        let conn = self.conn()?;
        EventRepo::count(&conn)
    }
}

impl EventSource for EventStore {
    fn events_after(&self, after: SequenceNumber) -> Result<Vec<EventEnvelope>> {
        Self::events_after(self, after)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Internal
// ─────────────────────────────────────────────────────────────────────────────

fn to_sequence_number(raw: i64) -> Result<SequenceNumber> {
    u64::try_from(raw)
        .map(SequenceNumber::new)
        .map_err(|_| EventStoreError::CorruptRow {
            sequence_number: raw,
            message: "negative sequence number".to_string(),
        })
}

fn row_to_envelope(row: EventRow) -> Result<EventEnvelope> {
    let corrupt = |message: String| EventStoreError::CorruptRow {
        sequence_number: row.sequence_number,
        message,
    };
    let payload: Value =
        serde_json::from_str(&row.payload).map_err(|e| corrupt(format!("payload: {e}")))?;
    let metadata: Map<String, Value> =
        serde_json::from_str(&row.metadata).map_err(|e| corrupt(format!("metadata: {e}")))?;
    let recorded_at = match parse_w3c(&row.recorded_at) {
        Ok(ts) => Some(ts),
        Err(e) => {
            warn!(
                sequence_number = row.sequence_number,
                recorded_at = %row.recorded_at,
                error = %e,
                "unparsable recorded_at, treating as unknown"
            );
            None
        }
    };

    Ok(EventEnvelope {
        sequence_number: to_sequence_number(row.sequence_number)?,
        event_id: EventId::from(row.id),
        stream: row.stream,
        event_type: row.event_type,
        payload,
        metadata,
        recorded_at,
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(unused_results)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    fn setup() -> EventStore {
        EventStore::in_memory().unwrap()
    }

    fn node_event(event_type: &str, node: &str) -> AppendEvent {
        AppendEvent::new(
            "ContentStream:cs-1",
            event_type,
            json!({"contentStreamId": "cs-1", "nodeAggregateId": node}),
        )
    }

    #[test]
    fn append_assigns_sequence_and_recorded_at() {
        let store = setup();
        let first = store.append(&node_event("NodeAggregateWithNodeWasCreated", "n-1")).unwrap();
        let second = store.append(&node_event("NodePropertiesWereSet", "n-1")).unwrap();

        assert_eq!(first.sequence_number, SequenceNumber::new(1));
        assert_eq!(second.sequence_number, SequenceNumber::new(2));
        assert!(first.recorded_at.is_some());
        assert_ne!(first.event_id, second.event_id);
    }

    #[test]
    fn events_after_round_trips_append() {
        let store = setup();
        let appended = store
            .append(
                &node_event("NodeAggregateWasDisabled", "n-1")
                    .with_initiating_timestamp("2024-01-01T00:00:00+00:00"),
            )
            .unwrap();

        let read = store.events_after(SequenceNumber::NONE).unwrap();
        assert_eq!(read, vec![appended]);
    }

    #[test]
    fn events_after_is_exclusive() {
        let store = setup();
        for node in ["a", "b", "c"] {
            store.append(&node_event("NodePropertiesWereSet", node)).unwrap();
        }
        let nodes: Vec<Value> = store
            .events_after(SequenceNumber::new(1))
            .unwrap()
            .into_iter()
            .map(|e| e.payload["nodeAggregateId"].clone())
            .collect();
        assert_eq!(nodes, vec![json!("b"), json!("c")]);
        assert!(store.events_after(SequenceNumber::new(3)).unwrap().is_empty());
    }

    #[test]
    fn last_sequence_number_and_count() {
        let store = setup();
        assert_eq!(store.last_sequence_number().unwrap(), SequenceNumber::NONE);
        store.append(&node_event("NodePropertiesWereSet", "n-1")).unwrap();
        store.append(&node_event("NodePropertiesWereSet", "n-1")).unwrap();
        assert_eq!(store.last_sequence_number().unwrap(), SequenceNumber::new(2));
        assert_eq!(store.count().unwrap(), 2);
    }

    #[test]
    fn implements_event_source() {
        let store = setup();
        store.append(&node_event("NodePropertiesWereSet", "n-1")).unwrap();
        let source: &dyn EventSource = &store;
        assert_eq!(source.events_after(SequenceNumber::NONE).unwrap().len(), 1);
    }

    #[test]
    fn corrupt_payload_is_reported() {
        let store = setup();
        {
            let conn = store.conn().unwrap();
            conn.execute(
                "INSERT INTO events (id, stream, type, payload, recorded_at)
                 VALUES ('evt_bad', 's', 'NodePropertiesWereSet', 'not json', '2024-01-01T00:00:00+00:00')",
                [],
            )
            .unwrap();
        }
        assert_matches!(
            store.events_after(SequenceNumber::NONE),
            Err(EventStoreError::CorruptRow { sequence_number: 1, .. })
        );
    }

    #[test]
    fn unparsable_recorded_at_becomes_none() {
        let store = setup();
        {
            let conn = store.conn().unwrap();
            conn.execute(
                "INSERT INTO events (id, stream, type, payload, recorded_at)
                 VALUES ('evt_1', 's', 'NodePropertiesWereSet', '{}', 'yesterday')",
                [],
            )
            .unwrap();
        }
        let events = store.events_after(SequenceNumber::NONE).unwrap();
        assert_eq!(events[0].recorded_at, None);
    }

    #[test]
    fn open_refuses_log_with_other_schema_version() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.db");
        {
            let conn = rusqlite::Connection::open(&path).unwrap();
            conn.pragma_update(None, "user_version", 9).unwrap();
        }
        assert_matches!(
            EventStore::open(&path, &ConnectionConfig::default()),
            Err(EventStoreError::Schema { found: 9, .. })
        );
    }

    #[test]
    fn file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.db");
        {
            let store = EventStore::open(&path, &ConnectionConfig::default()).unwrap();
            store.append(&node_event("NodePropertiesWereSet", "n-1")).unwrap();
        }
        let store = EventStore::open(&path, &ConnectionConfig::default()).unwrap();
        assert_eq!(store.last_sequence_number().unwrap(), SequenceNumber::new(1));
        assert_eq!(store.events_after(SequenceNumber::NONE).unwrap().len(), 1);
    }
}
