//! The [`NodeEvent`] enum: typed view of an event envelope.
//!
//! [`NodeEvent::decode`] dispatches on the envelope's event type and
//! deserializes the payload into the matching struct. Event types outside
//! the allow-list decode to [`NodeEvent::Other`] without touching the payload.

use whenline_core::{ContentStreamId, NodeAggregateId};

use super::event_kind::EventKind;
use super::payloads;
use crate::envelope::EventEnvelope;

/// A decoded event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeEvent {
    /// `RootWorkspaceWasCreated`
    RootWorkspaceWasCreated(payloads::RootWorkspaceWasCreated),
    /// `NodeAggregateWithNodeWasCreated`
    NodeAggregateWithNodeWasCreated(payloads::NodeAggregateWithNodeWasCreated),
    /// `NodePropertiesWereSet`
    NodePropertiesWereSet(payloads::NodePropertiesWereSet),
    /// `NodeReferencesWereSet`
    NodeReferencesWereSet(payloads::NodeReferencesWereSet),
    /// `NodeAggregateWasDisabled`
    NodeAggregateWasDisabled(payloads::NodeAggregateWasDisabled),
    /// `NodeAggregateWasEnabled`
    NodeAggregateWasEnabled(payloads::NodeAggregateWasEnabled),
    /// `NodeAggregateWasRemoved`
    NodeAggregateWasRemoved(payloads::NodeAggregateWasRemoved),
    /// Any event type the projection does not handle.
    Other(String),
}

impl NodeEvent {
    /// Decode the payload of `envelope` according to its event type.
    ///
    /// Returns `Err` if the event type is handled but the payload doesn't
    /// match the expected shape.
    pub fn decode(envelope: &EventEnvelope) -> Result<Self, serde_json::Error> {
        let Ok(kind) = envelope.event_type.parse::<EventKind>() else {
            return Ok(Self::Other(envelope.event_type.clone()));
        };
        let payload = envelope.payload.clone();
        Ok(match kind {
            EventKind::RootWorkspaceWasCreated => {
                Self::RootWorkspaceWasCreated(serde_json::from_value(payload)?)
            }
            EventKind::NodeAggregateWithNodeWasCreated => {
                Self::NodeAggregateWithNodeWasCreated(serde_json::from_value(payload)?)
            }
            EventKind::NodePropertiesWereSet => {
                Self::NodePropertiesWereSet(serde_json::from_value(payload)?)
            }
            EventKind::NodeReferencesWereSet => {
                Self::NodeReferencesWereSet(serde_json::from_value(payload)?)
            }
            EventKind::NodeAggregateWasDisabled => {
                Self::NodeAggregateWasDisabled(serde_json::from_value(payload)?)
            }
            EventKind::NodeAggregateWasEnabled => {
                Self::NodeAggregateWasEnabled(serde_json::from_value(payload)?)
            }
            EventKind::NodeAggregateWasRemoved => {
                Self::NodeAggregateWasRemoved(serde_json::from_value(payload)?)
            }
        })
    }

    /// The kind of this event, `None` for [`NodeEvent::Other`].
    #[must_use]
    pub fn kind(&self) -> Option<EventKind> {
        match self {
            Self::RootWorkspaceWasCreated(_) => Some(EventKind::RootWorkspaceWasCreated),
            Self::NodeAggregateWithNodeWasCreated(_) => {
                Some(EventKind::NodeAggregateWithNodeWasCreated)
            }
            Self::NodePropertiesWereSet(_) => Some(EventKind::NodePropertiesWereSet),
            Self::NodeReferencesWereSet(_) => Some(EventKind::NodeReferencesWereSet),
            Self::NodeAggregateWasDisabled(_) => Some(EventKind::NodeAggregateWasDisabled),
            Self::NodeAggregateWasEnabled(_) => Some(EventKind::NodeAggregateWasEnabled),
            Self::NodeAggregateWasRemoved(_) => Some(EventKind::NodeAggregateWasRemoved),
            Self::Other(_) => None,
        }
    }

    /// Content stream a node event happened in.
    ///
    /// `None` for `RootWorkspaceWasCreated` (which declares a *new* stream,
    /// carried in its payload) and for `Other`.
    #[must_use]
    pub fn content_stream_id(&self) -> Option<&ContentStreamId> {
        match self {
            Self::NodeAggregateWithNodeWasCreated(e) => Some(&e.content_stream_id),
            Self::NodePropertiesWereSet(e) => Some(&e.content_stream_id),
            Self::NodeReferencesWereSet(e) => Some(&e.content_stream_id),
            Self::NodeAggregateWasDisabled(e) => Some(&e.content_stream_id),
            Self::NodeAggregateWasEnabled(e) => Some(&e.content_stream_id),
            Self::NodeAggregateWasRemoved(e) => Some(&e.content_stream_id),
            Self::RootWorkspaceWasCreated(_) | Self::Other(_) => None,
        }
    }

    /// The node aggregate whose timeline this event belongs to.
    #[must_use]
    pub fn node_aggregate_id(&self) -> Option<&NodeAggregateId> {
        match self {
            Self::NodeAggregateWithNodeWasCreated(e) => Some(&e.node_aggregate_id),
            Self::NodePropertiesWereSet(e) => Some(&e.node_aggregate_id),
            // the references event names its subject differently
            Self::NodeReferencesWereSet(e) => Some(&e.source_node_aggregate_id),
            Self::NodeAggregateWasDisabled(e) => Some(&e.node_aggregate_id),
            Self::NodeAggregateWasEnabled(e) => Some(&e.node_aggregate_id),
            Self::NodeAggregateWasRemoved(e) => Some(&e.node_aggregate_id),
            Self::RootWorkspaceWasCreated(_) | Self::Other(_) => None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
