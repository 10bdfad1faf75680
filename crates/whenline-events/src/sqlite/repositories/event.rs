//! Event repository: the global append-only log.
//!
//! Rows are only ever inserted. `sequence_number` is assigned by `SQLite`
//! (`AUTOINCREMENT`), so it is strictly increasing and never reused.

use rusqlite::{Connection, params};

use crate::errors::Result;
use crate::sqlite::row_types::EventRow;

/// Columns of a row about to be inserted.
#[derive(Clone, Debug)]
pub struct NewEventRow<'a> {
    /// Event ID.
    pub id: &'a str,
    /// Stream name.
    pub stream: &'a str,
    /// Event type.
    pub event_type: &'a str,
    /// Payload as JSON text.
    pub payload: &'a str,
    /// Metadata as JSON text.
    pub metadata: &'a str,
    /// Recording time, RFC 3339.
    pub recorded_at: &'a str,
}

/// Event repository, stateless, every method takes `&Connection`.
pub struct EventRepo;

impl EventRepo {
    /// Insert a single event and return its assigned sequence number.
    pub fn insert(conn: &Connection, row: &NewEventRow<'_>) -> Result<i64> {
        let _ = conn.execute(
            "INSERT INTO events (id, stream, type, payload, metadata, recorded_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                row.id,
                row.stream,
                row.event_type,
                row.payload,
                row.metadata,
                row.recorded_at,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Get all events with a sequence number strictly greater than `after`,
    /// in ascending order.
    pub fn get_after(conn: &Connection, after: i64) -> Result<Vec<EventRow>> {
        let mut stmt = conn.prepare(
            "SELECT sequence_number, id, stream, type, payload, metadata, recorded_at
             FROM events WHERE sequence_number > ?1 ORDER BY sequence_number ASC",
        )?;
        let rows = stmt
            .query_map(params![after], Self::map_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Highest assigned sequence number, or 0 for an empty log.
    pub fn last_sequence_number(conn: &Connection) -> Result<i64> {
        let seq: i64 = conn.query_row(
            "SELECT COALESCE(MAX(sequence_number), 0) FROM events",
            [],
            |row| row.get(0),
        )?;
        Ok(seq)
    }

    /// Count all events.
    pub fn count(conn: &Connection) -> Result<i64> {
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM events", [], |row| row.get(0))?;
        Ok(count)
    }

    fn map_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<EventRow> {
        Ok(EventRow {
            sequence_number: row.get(0)?,
            id: row.get(1)?,
            stream: row.get(2)?,
            event_type: row.get(3)?,
            payload: row.get(4)?,
            metadata: row.get(5)?,
            recorded_at: row.get(6)?,
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(unused_results)]
mod tests {
    use super::*;
    use crate::sqlite::schema::ensure_schema;

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        ensure_schema(&conn).unwrap();
        conn
    }

    fn row<'a>(id: &'a str, event_type: &'a str) -> NewEventRow<'a> {
        NewEventRow {
            id,
            stream: "ContentStream:cs-1",
            event_type,
            payload: r#"{"contentStreamId":"cs-1","nodeAggregateId":"n-1"}"#,
            metadata: "{}",
            recorded_at: "2024-01-01T00:00:00+00:00",
        }
    }

    #[test]
    fn insert_assigns_increasing_sequence_numbers() {
        let conn = setup();
        let first = EventRepo::insert(&conn, &row("evt_1", "NodePropertiesWereSet")).unwrap();
        let second = EventRepo::insert(&conn, &row("evt_2", "NodePropertiesWereSet")).unwrap();
        assert_eq!(first, 1);
        assert_eq!(second, 2);
    }

    #[test]
    fn insert_rejects_duplicate_id() {
        let conn = setup();
        EventRepo::insert(&conn, &row("evt_1", "NodePropertiesWereSet")).unwrap();
        assert!(EventRepo::insert(&conn, &row("evt_1", "NodePropertiesWereSet")).is_err());
        assert_eq!(EventRepo::count(&conn).unwrap(), 1);
    }

    #[test]
    fn get_after_is_exclusive_and_ordered() {
        let conn = setup();
        for (id, ty) in [
            ("evt_1", "RootWorkspaceWasCreated"),
            ("evt_2", "NodeAggregateWithNodeWasCreated"),
            ("evt_3", "NodeAggregateWasRemoved"),
        ] {
            EventRepo::insert(&conn, &row(id, ty)).unwrap();
        }

        let rows = EventRepo::get_after(&conn, 1).unwrap();
        let ids: Vec<&str> = rows.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["evt_2", "evt_3"]);
        assert_eq!(rows[0].sequence_number, 2);
        assert_eq!(rows[0].event_type, "NodeAggregateWithNodeWasCreated");
        assert_eq!(rows[1].recorded_at, "2024-01-01T00:00:00+00:00");
    }

    #[test]
    fn get_after_end_is_empty() {
        let conn = setup();
        EventRepo::insert(&conn, &row("evt_1", "NodePropertiesWereSet")).unwrap();
        assert!(EventRepo::get_after(&conn, 1).unwrap().is_empty());
    }

    #[test]
    fn last_sequence_number_of_empty_log() {
        let conn = setup();
        assert_eq!(EventRepo::last_sequence_number(&conn).unwrap(), 0);
        EventRepo::insert(&conn, &row("evt_1", "NodePropertiesWereSet")).unwrap();
        assert_eq!(EventRepo::last_sequence_number(&conn).unwrap(), 1);
    }

    #[test]
    fn metadata_defaults_to_empty_object() {
        let conn = setup();
        conn.execute(
            "INSERT INTO events (id, stream, type, payload, recorded_at)
             VALUES ('evt_1', 's', 't', '{}', '2024-01-01T00:00:00+00:00')",
            [],
        )
        .unwrap();
        let rows = EventRepo::get_after(&conn, 0).unwrap();
        assert_eq!(rows[0].metadata, "{}");
    }
}
