//! The projection snapshot.
//!
//! [`ProjectionState`] is immutable in spirit: every `with_*` method consumes
//! the snapshot and returns the next one. The catch-up controller is the only
//! writer; readers hold an `Arc` to whatever snapshot was current.
//!
//! # JSON format
//!
//! ```json
//! {
//!   "sequenceNumber": 4,
//!   "liveContentStreamId": "cs-1",
//!   "nodeEvents": {
//!     "n-1": [
//!       { "timestamp": "2024-01-01T00:00:00+00:00", "type": "NodeAggregateWithNodeWasCreated" }
//!     ]
//!   }
//! }
//! ```
//!
//! `liveContentStreamId` is omitted while unset. A missing or `null`
//! `sequenceNumber` loads as [`SequenceNumber::NONE`]; a missing or `null`
//! `nodeEvents` (or an empty JSON array) loads as no timelines.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use whenline_core::timestamp::{Timestamp, truncate_to_seconds};
use whenline_core::{ContentStreamId, NodeAggregateId, SequenceNumber};
use whenline_events::EventKind;

/// One entry on a node timeline.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeEventRecord {
    /// When it happened, stored in W3C form.
    #[serde(with = "whenline_core::timestamp::w3c")]
    pub timestamp: Timestamp,
    /// What happened.
    #[serde(rename = "type")]
    pub kind: EventKind,
}

impl NodeEventRecord {
    /// Create a record. Sub-second precision is dropped, as on disk.
    #[must_use]
    pub fn new(timestamp: Timestamp, kind: EventKind) -> Self {
        Self {
            timestamp: truncate_to_seconds(timestamp),
            kind,
        }
    }
}

/// Snapshot of the projection.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionState {
    #[serde(default, deserialize_with = "null_as_default")]
    sequence_number: SequenceNumber,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    live_content_stream_id: Option<ContentStreamId>,
    #[serde(default, deserialize_with = "node_events_or_empty")]
    node_events: IndexMap<NodeAggregateId, Vec<NodeEventRecord>>,
}

impl ProjectionState {
    /// The empty snapshot: nothing seen, no live branch, no timelines.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Sequence number of the last event processed.
    #[must_use]
    pub fn sequence_number(&self) -> SequenceNumber {
        self.sequence_number
    }

    /// Content stream of the live workspace, if one was created yet.
    #[must_use]
    pub fn live_content_stream_id(&self) -> Option<&ContentStreamId> {
        self.live_content_stream_id.as_ref()
    }

    /// All timelines, in first-seen order.
    #[must_use]
    pub fn node_events(&self) -> &IndexMap<NodeAggregateId, Vec<NodeEventRecord>> {
        &self.node_events
    }

    /// The timeline of one node aggregate.
    #[must_use]
    pub fn timeline(&self, node_aggregate_id: &NodeAggregateId) -> Option<&[NodeEventRecord]> {
        self.node_events.get(node_aggregate_id).map(Vec::as_slice)
    }

    /// Number of node aggregates with a timeline.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.node_events.len()
    }

    /// Whether `content_stream_id` is the live content stream.
    ///
    /// Always `false` before the first `RootWorkspaceWasCreated`.
    #[must_use]
    pub fn is_live(&self, content_stream_id: &ContentStreamId) -> bool {
        self.live_content_stream_id.as_ref() == Some(content_stream_id)
    }

    /// Move the bookmark.
    #[must_use]
    pub fn with_sequence_number(mut self, sequence_number: SequenceNumber) -> Self {
        self.sequence_number = sequence_number;
        self
    }

    /// Make `content_stream_id` the live content stream.
    #[must_use]
    pub fn with_live_content_stream_id(mut self, content_stream_id: ContentStreamId) -> Self {
        self.live_content_stream_id = Some(content_stream_id);
        self
    }

    /// Append a record to the timeline of `node_aggregate_id`.
    ///
    /// Returns the snapshot unchanged unless `content_stream_id` is live.
    #[must_use]
    pub fn with_added_node_event(
        mut self,
        content_stream_id: &ContentStreamId,
        node_aggregate_id: NodeAggregateId,
        timestamp: Timestamp,
        kind: EventKind,
    ) -> Self {
        if !self.is_live(content_stream_id) {
            return self;
        }
        self.node_events
            .entry(node_aggregate_id)
            .or_default()
            .push(NodeEventRecord::new(timestamp, kind));
        self
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

type NodeEvents = IndexMap<NodeAggregateId, Vec<NodeEventRecord>>;

// an empty JSON array is how some writers encode an empty map
fn node_events_or_empty<'de, D>(deserializer: D) -> Result<NodeEvents, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Map(NodeEvents),
        List(Vec<serde_json::Value>),
    }

    match Option::<Repr>::deserialize(deserializer)? {
        None => Ok(NodeEvents::default()),
        Some(Repr::Map(map)) => Ok(map),
        Some(Repr::List(list)) if list.is_empty() => Ok(NodeEvents::default()),
        Some(Repr::List(_)) => Err(serde::de::Error::custom(
            "nodeEvents must be an object keyed by node aggregate id",
        )),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use whenline_core::timestamp::parse_w3c;

    fn ts(value: &str) -> Timestamp {
        parse_w3c(value).unwrap()
    }

    fn live(cs: &str) -> ProjectionState {
        ProjectionState::empty().with_live_content_stream_id(ContentStreamId::from(cs))
    }

    #[test]
    fn empty_state() {
        let state = ProjectionState::empty();
        assert_eq!(state.sequence_number(), SequenceNumber::NONE);
        assert!(state.live_content_stream_id().is_none());
        assert_eq!(state.node_count(), 0);
    }

    #[test]
    fn no_live_stream_ignores_every_event() {
        let cs = ContentStreamId::from("cs-1");
        let state = ProjectionState::empty().with_added_node_event(
            &cs,
            NodeAggregateId::from("n-1"),
            ts("2024-01-01T00:00:00Z"),
            EventKind::NodeAggregateWithNodeWasCreated,
        );
        assert_eq!(state, ProjectionState::empty());
    }

    #[test]
    fn records_keep_whole_seconds_only() {
        let record = NodeEventRecord::new(
            ts("2024-01-01T00:00:00.750Z"),
            EventKind::NodePropertiesWereSet,
        );
        assert_eq!(record.timestamp, ts("2024-01-01T00:00:00Z"));
    }

    #[test]
    fn other_stream_is_ignored() {
        let state = live("cs-1").with_added_node_event(
            &ContentStreamId::from("cs-2"),
            NodeAggregateId::from("n-1"),
            ts("2024-01-01T00:00:00Z"),
            EventKind::NodePropertiesWereSet,
        );
        assert_eq!(state.node_count(), 0);
    }

    #[test]
    fn live_stream_appends_in_order() {
        let cs = ContentStreamId::from("cs-1");
        let state = live("cs-1")
            .with_added_node_event(
                &cs,
                NodeAggregateId::from("b"),
                ts("2024-01-01T00:00:00Z"),
                EventKind::NodeAggregateWithNodeWasCreated,
            )
            .with_added_node_event(
                &cs,
                NodeAggregateId::from("a"),
                ts("2024-01-02T00:00:00Z"),
                EventKind::NodeAggregateWithNodeWasCreated,
            )
            .with_added_node_event(
                &cs,
                NodeAggregateId::from("b"),
                ts("2024-01-03T00:00:00Z"),
                EventKind::NodeAggregateWasRemoved,
            );

        let order: Vec<&str> = state.node_events().keys().map(|k| k.as_str()).collect();
        assert_eq!(order, vec!["b", "a"]);
        let kinds: Vec<EventKind> = state
            .timeline(&NodeAggregateId::from("b"))
            .unwrap()
            .iter()
            .map(|r| r.kind)
            .collect();
        assert_eq!(
            kinds,
            vec![
                EventKind::NodeAggregateWithNodeWasCreated,
                EventKind::NodeAggregateWasRemoved
            ]
        );
    }

    #[test]
    fn switching_live_stream_keeps_timelines() {
        let cs1 = ContentStreamId::from("cs-1");
        let state = live("cs-1")
            .with_added_node_event(
                &cs1,
                NodeAggregateId::from("n-1"),
                ts("2024-01-01T00:00:00Z"),
                EventKind::NodeAggregateWithNodeWasCreated,
            )
            .with_live_content_stream_id(ContentStreamId::from("cs-2"));
        assert!(!state.is_live(&cs1));
        assert_eq!(state.node_count(), 1);
    }

    #[test]
    fn serializes_in_wire_format() {
        let cs = ContentStreamId::from("cs-1");
        let state = live("cs-1")
            .with_added_node_event(
                &cs,
                NodeAggregateId::from("n-1"),
                ts("2024-01-01T01:00:00+01:00"),
                EventKind::NodeAggregateWithNodeWasCreated,
            )
            .with_sequence_number(SequenceNumber::new(2));

        assert_eq!(
            serde_json::to_value(&state).unwrap(),
            json!({
                "sequenceNumber": 2,
                "liveContentStreamId": "cs-1",
                "nodeEvents": {
                    "n-1": [
                        {"timestamp": "2024-01-01T01:00:00+01:00", "type": "NodeAggregateWithNodeWasCreated"}
                    ]
                }
            })
        );
    }

    #[test]
    fn unset_live_stream_is_omitted() {
        let val = serde_json::to_value(ProjectionState::empty()).unwrap();
        assert_eq!(val, json!({"sequenceNumber": 0, "nodeEvents": {}}));
    }

    #[test]
    fn missing_fields_default() {
        let state: ProjectionState = serde_json::from_str("{}").unwrap();
        assert_eq!(state, ProjectionState::empty());

        let state: ProjectionState =
            serde_json::from_str(r#"{"sequenceNumber": null, "nodeEvents": null}"#).unwrap();
        assert_eq!(state, ProjectionState::empty());
    }

    #[test]
    fn empty_array_node_events_loads_as_empty() {
        let state: ProjectionState =
            serde_json::from_str(r#"{"sequenceNumber": 5, "nodeEvents": []}"#).unwrap();
        assert_eq!(state.sequence_number(), SequenceNumber::new(5));
        assert_eq!(state.node_count(), 0);
    }

    #[test]
    fn non_empty_array_node_events_is_rejected() {
        assert!(serde_json::from_str::<ProjectionState>(r#"{"nodeEvents": [1]}"#).is_err());
    }

    #[test]
    fn unknown_record_type_is_rejected() {
        let result = serde_json::from_str::<ProjectionState>(
            r#"{"nodeEvents": {"n": [{"timestamp": "2024-01-01T00:00:00+00:00", "type": "NodeAggregateWasMoved"}]}}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn load_preserves_file_order() {
        let state: ProjectionState = serde_json::from_str(
            r#"{"nodeEvents": {
                "z": [{"timestamp": "2024-01-01T00:00:00+00:00", "type": "NodeAggregateWithNodeWasCreated"}],
                "a": [{"timestamp": "2024-01-01T00:00:00+00:00", "type": "NodeAggregateWithNodeWasCreated"}]
            }}"#,
        )
        .unwrap();
        let order: Vec<&str> = state.node_events().keys().map(|k| k.as_str()).collect();
        assert_eq!(order, vec!["z", "a"]);
    }
}
