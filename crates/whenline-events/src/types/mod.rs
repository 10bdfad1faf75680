//! Event type definitions for the timeline projection.
//!
//! - [`EventKind`]: 7-variant allow-list of handled event types.
//! - [`can_handle`]: classifier over raw event type strings.
//! - [`NodeEvent`]: typed view of an envelope, decoded per kind.
//! - [`payloads`]: payload structs for each handled kind.

pub mod event_kind;
pub mod node_event;
pub mod payloads;

pub use event_kind::{ALL_EVENT_KINDS, EventKind, UnknownEventKind, can_handle, can_handle_batch};
pub use node_event::NodeEvent;
