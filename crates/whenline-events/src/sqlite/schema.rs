//! Event log schema.
//!
//! The version lives in the database header (`PRAGMA user_version`). A fresh
//! file gets the whole schema in one transaction. A file stamped with a
//! different version is refused.

use rusqlite::Connection;
use tracing::{debug, info};

use crate::errors::{EventStoreError, Result};

/// Schema version this build creates and reads.
pub(crate) const SCHEMA_VERSION: i32 = 1;

const SCHEMA: &str = include_str!("schema.sql");

/// Create the schema on a fresh database, or check the existing one.
pub(crate) fn ensure_schema(conn: &Connection) -> Result<()> {
    let found: i32 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
    match found {
        0 => {
            let tx = conn.unchecked_transaction()?;
            tx.execute_batch(SCHEMA)?;
            tx.pragma_update(None, "user_version", SCHEMA_VERSION)?;
            tx.commit()?;
            info!(version = SCHEMA_VERSION, "created event log schema");
            Ok(())
        }
        SCHEMA_VERSION => {
            debug!(version = found, "event log schema up to date");
            Ok(())
        }
        _ => Err(EventStoreError::Schema {
            found,
            supported: SCHEMA_VERSION,
        }),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
