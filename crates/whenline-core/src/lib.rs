//! # whenline-core
//!
//! Shared vocabulary for the whenline crates:
//!
//! - **Branded IDs**: `ContentStreamId`, `NodeAggregateId`, `EventId` as newtypes for type safety
//! - **Sequence numbers**: [`SequenceNumber`], the position of an event in the global log
//! - **Timestamps**: W3C/RFC 3339 parsing and formatting helpers
//! - **Logging**: `tracing` subscriber setup for binaries

#![deny(unsafe_code)]

pub mod ids;
pub mod logging;
pub mod sequence;
pub mod timestamp;

pub use ids::{ContentStreamId, EventId, NodeAggregateId};
pub use sequence::SequenceNumber;
