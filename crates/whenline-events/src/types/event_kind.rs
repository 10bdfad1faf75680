//! The [`EventKind`] enum: the 7 event types the timeline projection handles.
//!
//! Every variant serializes to the exact event type string written by the
//! content repository (e.g. `"NodePropertiesWereSet"`). The same strings are
//! persisted as the `type` of each lifecycle record in the state file.
//!
//! [`can_handle`] is the classifier: a pure allow-list test that lets a
//! scheduler skip a catch-up cycle when nothing relevant was published.
//! Skipping is an optimization only; running a cycle anyway is always safe.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::envelope::EventEnvelope;

/// Event types handled by the projection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// A root workspace was created; its content stream becomes the live one.
    RootWorkspaceWasCreated,
    /// A node aggregate was created together with its first node.
    NodeAggregateWithNodeWasCreated,
    /// Properties of a node were changed.
    NodePropertiesWereSet,
    /// References of a node were changed.
    NodeReferencesWereSet,
    /// A node aggregate was disabled (hidden).
    NodeAggregateWasDisabled,
    /// A node aggregate was enabled again.
    NodeAggregateWasEnabled,
    /// A node aggregate was removed.
    NodeAggregateWasRemoved,
}

/// All event kind variants in definition order.
pub const ALL_EVENT_KINDS: [EventKind; 7] = [
    EventKind::RootWorkspaceWasCreated,
    EventKind::NodeAggregateWithNodeWasCreated,
    EventKind::NodePropertiesWereSet,
    EventKind::NodeReferencesWereSet,
    EventKind::NodeAggregateWasDisabled,
    EventKind::NodeAggregateWasEnabled,
    EventKind::NodeAggregateWasRemoved,
];

impl EventKind {
    /// Return the wire string (e.g. `"NodeAggregateWasRemoved"`).
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RootWorkspaceWasCreated => "RootWorkspaceWasCreated",
            Self::NodeAggregateWithNodeWasCreated => "NodeAggregateWithNodeWasCreated",
            Self::NodePropertiesWereSet => "NodePropertiesWereSet",
            Self::NodeReferencesWereSet => "NodeReferencesWereSet",
            Self::NodeAggregateWasDisabled => "NodeAggregateWasDisabled",
            Self::NodeAggregateWasEnabled => "NodeAggregateWasEnabled",
            Self::NodeAggregateWasRemoved => "NodeAggregateWasRemoved",
        }
    }

    /// Whether events of this kind end up as a record on a node timeline.
    ///
    /// Only `RootWorkspaceWasCreated` does not; it moves the live branch.
    #[must_use]
    pub fn is_node_event(self) -> bool {
        !matches!(self, Self::RootWorkspaceWasCreated)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an event type string outside the allow-list.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unhandled event type: {0}")]
pub struct UnknownEventKind(pub String);

impl FromStr for EventKind {
    type Err = UnknownEventKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ALL_EVENT_KINDS
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownEventKind(s.to_string()))
    }
}

/// Whether the projection is interested in events of type `event_type`.
#[must_use]
pub fn can_handle(event_type: &str) -> bool {
    event_type.parse::<EventKind>().is_ok()
}

/// Whether any event in `batch` is handled by the projection.
#[must_use]
pub fn can_handle_batch(batch: &[EventEnvelope]) -> bool {
    batch.iter().any(|envelope| can_handle(&envelope.event_type))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
