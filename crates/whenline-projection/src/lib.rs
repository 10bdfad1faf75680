//! # whenline-projection
//!
//! A catch-up projection over the content repository's event log that keeps
//! one lifecycle timeline per node aggregate and renders it as
//! [Markwhen](https://markwhen.com/) text.
//!
//! - **State**: [`ProjectionState`], an immutable snapshot of bookmark, live
//!   content stream and per-node timelines
//! - **Persistence**: [`StateFile`], whole-snapshot JSON with atomic replace
//! - **Controller**: [`MarkwhenProjection`], which runs catch-up cycles against
//!   an [`EventSource`](whenline_events::EventSource) and caches the snapshot
//! - **Renderer**: [`render_markwhen`], a pure function of the snapshot

#![deny(unsafe_code)]

pub mod error;
pub mod persistence;
pub mod projection;
pub mod render;
pub mod state;

pub use error::{ProjectionError, Result};
pub use persistence::StateFile;
pub use projection::{CycleStats, MarkwhenProjection, apply_events};
pub use render::{TITLE, render_markwhen, render_markwhen_at};
pub use state::{NodeEventRecord, ProjectionState};
