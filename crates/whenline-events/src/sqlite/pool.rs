//! Connection pools for the event log.
//!
//! A file-backed log runs in WAL mode so readers (`render`, `status`) are not
//! blocked while a catch-up or an append holds the write lock. An in-memory
//! log lives in exactly one connection.

use std::path::Path;
use std::time::Duration;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;

use crate::errors::{EventStoreError, Result};

/// Pool of connections to one event log.
pub type ConnectionPool = Pool<SqliteConnectionManager>;

/// A connection checked out of a [`ConnectionPool`].
pub type PooledConnection = r2d2::PooledConnection<SqliteConnectionManager>;

const CHECKOUT_TIMEOUT: Duration = Duration::from_secs(5);

/// Pool settings for a file-backed log.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// Maximum number of open connections (default: 4).
    pub pool_size: u32,
    /// How long a connection waits on a locked database, in milliseconds
    /// (default: 30000).
    pub busy_timeout_ms: u32,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            pool_size: 4,
            busy_timeout_ms: 30_000,
        }
    }
}

/// Applied to every connection the pool opens.
#[derive(Debug)]
struct LogPragmas {
    busy_timeout: Duration,
    wal: bool,
}

impl r2d2::CustomizeConnection<Connection, rusqlite::Error> for LogPragmas {
    fn on_acquire(&self, conn: &mut Connection) -> std::result::Result<(), rusqlite::Error> {
        conn.busy_timeout(self.busy_timeout)?;
        if self.wal {
            // journal_mode answers with the mode actually in effect
            let _mode: String = conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
            conn.execute_batch("PRAGMA synchronous = NORMAL;")?;
        }
        Ok(())
    }
}

/// Pool over the log file at `path`, created if missing.
pub(crate) fn file_pool(path: &Path, config: &ConnectionConfig) -> Result<ConnectionPool> {
    if config.pool_size == 0 {
        return Err(EventStoreError::InvalidOperation(
            "pool size must be at least 1".to_string(),
        ));
    }
    build(
        SqliteConnectionManager::file(path),
        config.pool_size,
        LogPragmas {
            busy_timeout: Duration::from_millis(u64::from(config.busy_timeout_ms)),
            wal: true,
        },
    )
}

/// Single-connection pool over a private in-memory log.
pub(crate) fn memory_pool() -> Result<ConnectionPool> {
    let defaults = ConnectionConfig::default();
    build(
        SqliteConnectionManager::memory(),
        1,
        LogPragmas {
            busy_timeout: Duration::from_millis(u64::from(defaults.busy_timeout_ms)),
            wal: false,
        },
    )
}

fn build(
    manager: SqliteConnectionManager,
    max_size: u32,
    pragmas: LogPragmas,
) -> Result<ConnectionPool> {
    let pool = Pool::builder()
        .max_size(max_size)
        .connection_timeout(CHECKOUT_TIMEOUT)
        .connection_customizer(Box::new(pragmas))
        .build(manager)?;
    Ok(pool)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
