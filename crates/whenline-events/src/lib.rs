//! # whenline-events
//!
//! Everything whenline knows about the content repository's event log.
//!
//! - **Event kinds**: the 7-variant [`EventKind`] allow-list and the [`can_handle`] classifier
//! - **Envelopes**: [`EventEnvelope`] with sequence number, raw payload, metadata and the
//!   two-tier timestamp resolution (initiating timestamp, then recorded-at)
//! - **Typed payloads**: [`NodeEvent`] decoding with per-kind node aggregate resolution
//! - **Event source**: the [`EventSource`] seam the projection reads through
//! - **`SQLite` backend**: an append-only event log with pooled connections and a versioned schema,
//!   standing in for the external event store

#![deny(unsafe_code)]

pub mod envelope;
pub mod errors;
pub mod source;
pub mod sqlite;
pub mod store;
pub mod types;

pub use envelope::{EventEnvelope, TimestampError, INITIATING_TIMESTAMP};
pub use errors::{EventStoreError, Result};
pub use source::{EventSource, InMemoryEventSource};
pub use sqlite::ConnectionConfig;
pub use store::{AppendEvent, EventStore};
pub use types::{ALL_EVENT_KINDS, EventKind, NodeEvent, can_handle, can_handle_batch};
