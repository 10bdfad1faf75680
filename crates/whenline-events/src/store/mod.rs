//! High-level `EventStore` API.
//!
//! The [`EventStore`] appends to and reads from the global event log on top
//! of the repository layer, and implements [`EventSource`](crate::EventSource)
//! so the projection can read from it directly.

mod event_store;

pub use event_store::*;
