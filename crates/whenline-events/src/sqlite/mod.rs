//! `SQLite` backend for the event log.
//!
//! - **[`pool`]**: `r2d2` pools; file logs run in WAL mode.
//! - `schema`: creates the `events` table on a fresh file and refuses files
//!   stamped with another schema version.
//! - **[`row_types`]** and **[`repositories`]**: raw rows and the stateless
//!   SQL behind [`EventStore`](crate::EventStore).

pub mod pool;
pub mod repositories;
pub mod row_types;
pub(crate) mod schema;

pub use pool::{ConnectionConfig, ConnectionPool, PooledConnection};
