//! Typed payloads for the handled event kinds.
//!
//! Only the fields the projection needs are modelled. Unknown fields are
//! ignored so producers can add data without breaking the projection; a
//! missing required field is a decode error.

use serde::{Deserialize, Serialize};
use whenline_core::{ContentStreamId, NodeAggregateId};

/// Payload of `RootWorkspaceWasCreated`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RootWorkspaceWasCreated {
    /// Name of the created workspace (e.g. `live`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace_name: Option<String>,
    /// Content stream the new root workspace starts on.
    pub new_content_stream_id: ContentStreamId,
}

/// Payload of `NodeAggregateWithNodeWasCreated`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeAggregateWithNodeWasCreated {
    /// Content stream the node was created in.
    pub content_stream_id: ContentStreamId,
    /// The created node aggregate.
    pub node_aggregate_id: NodeAggregateId,
    /// Node type name, if present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_type_name: Option<String>,
}

/// Payload of `NodePropertiesWereSet`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodePropertiesWereSet {
    /// Content stream the change happened in.
    pub content_stream_id: ContentStreamId,
    /// The modified node aggregate.
    pub node_aggregate_id: NodeAggregateId,
}

/// Payload of `NodeReferencesWereSet`.
///
/// Unlike every other node event, the subject is called
/// `sourceNodeAggregateId` here.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeReferencesWereSet {
    /// Content stream the change happened in.
    pub content_stream_id: ContentStreamId,
    /// The node aggregate whose outgoing references changed.
    pub source_node_aggregate_id: NodeAggregateId,
}

/// Payload of `NodeAggregateWasDisabled`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeAggregateWasDisabled {
    /// Content stream the change happened in.
    pub content_stream_id: ContentStreamId,
    /// The disabled node aggregate.
    pub node_aggregate_id: NodeAggregateId,
}

/// Payload of `NodeAggregateWasEnabled`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeAggregateWasEnabled {
    /// Content stream the change happened in.
    pub content_stream_id: ContentStreamId,
    /// The enabled node aggregate.
    pub node_aggregate_id: NodeAggregateId,
}

/// Payload of `NodeAggregateWasRemoved`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeAggregateWasRemoved {
    /// Content stream the removal happened in.
    pub content_stream_id: ContentStreamId,
    /// The removed node aggregate.
    pub node_aggregate_id: NodeAggregateId,
}
