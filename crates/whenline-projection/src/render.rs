//! Markwhen rendering.
//!
//! One group per node aggregate in first-seen order. A group spans from its
//! first record to its removal, or to "now" while the node still exists.

use std::fmt::Write;

use chrono::{DateTime, Utc};
use whenline_core::timestamp::format_utc;
use whenline_events::EventKind;

use crate::error::{ProjectionError, Result};
use crate::state::ProjectionState;

/// Timeline title.
pub const TITLE: &str = "Neos Content Repository";

const TAGS: [(&str, &str); 3] = [
    ("creation", "#49a74f"),
    ("modification", "#e6c833"),
    ("deletion", "#c83737"),
];

/// Render `state` with open-ended groups ending at the current time.
pub fn render_markwhen(state: &ProjectionState) -> Result<String> {
    render_markwhen_at(state, Utc::now())
}

/// Render `state` with open-ended groups ending at `now`.
pub fn render_markwhen_at(state: &ProjectionState, now: DateTime<Utc>) -> Result<String> {
    let now = format_utc(&now);
    let mut out = format!("title: {TITLE}\n\n");
    for (tag, color) in TAGS {
        let _ = writeln!(out, "#{tag}: {color}");
    }
    out.push('\n');

    for (node_aggregate_id, records) in state.node_events() {
        let (Some(first), Some(last)) = (records.first(), records.last()) else {
            return Err(ProjectionError::InvariantViolation(format!(
                "timeline of node aggregate {node_aggregate_id} is empty"
            )));
        };
        let end = if last.kind == EventKind::NodeAggregateWasRemoved {
            format_utc(&last.timestamp)
        } else {
            now.clone()
        };

        let _ = writeln!(out, "  group {node_aggregate_id}");
        let _ = writeln!(out, "{}-{end}:", format_utc(&first.timestamp));
        for record in records {
            let (label, tag) = label(record.kind)?;
            let _ = writeln!(out, "{}: {label} #{tag}", format_utc(&record.timestamp));
        }
        out.push_str("endGroup\n\n");
    }
    Ok(out)
}

/// Label and tag of a timeline record.
fn label(kind: EventKind) -> Result<(&'static str, &'static str)> {
    Ok(match kind {
        EventKind::NodeAggregateWithNodeWasCreated => ("Created", "creation"),
        EventKind::NodePropertiesWereSet => ("Properties updated", "modification"),
        EventKind::NodeReferencesWereSet => ("References updated", "modification"),
        EventKind::NodeAggregateWasDisabled => ("Disabled", "deletion"),
        EventKind::NodeAggregateWasEnabled => ("Enabled", "creation"),
        EventKind::NodeAggregateWasRemoved => ("Deleted", "deletion"),
        EventKind::RootWorkspaceWasCreated => {
            return Err(ProjectionError::InvariantViolation(format!(
                "{kind} never appears on a node timeline"
            )));
        }
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use whenline_core::timestamp::parse_w3c;
    use whenline_core::{ContentStreamId, NodeAggregateId};
    use whenline_events::ALL_EVENT_KINDS;

    const HEADER: &str = "title: Neos Content Repository\n\n#creation: #49a74f\n#modification: #e6c833\n#deletion: #c83737\n\n";

    fn now() -> DateTime<Utc> {
        parse_w3c("2024-06-01T12:00:00Z").unwrap().with_timezone(&Utc)
    }

    fn state_with(events: &[(&str, &str, EventKind)]) -> ProjectionState {
        let cs = ContentStreamId::from("cs-1");
        events.iter().fold(
            ProjectionState::empty().with_live_content_stream_id(cs.clone()),
            |state, (node, at, kind)| {
                state.with_added_node_event(
                    &cs,
                    NodeAggregateId::from(*node),
                    parse_w3c(at).unwrap(),
                    *kind,
                )
            },
        )
    }

    #[test]
    fn empty_state_renders_header_only() {
        let out = render_markwhen_at(&ProjectionState::empty(), now()).unwrap();
        assert_eq!(out, HEADER);
    }

    #[test]
    fn removed_node_ends_at_removal() {
        let state = state_with(&[
            ("E1", "2024-01-01T00:00:00Z", EventKind::NodeAggregateWithNodeWasCreated),
            ("E1", "2024-01-02T00:00:00Z", EventKind::NodePropertiesWereSet),
            ("E1", "2024-01-03T00:00:00Z", EventKind::NodeAggregateWasRemoved),
        ]);
        let out = render_markwhen_at(&state, now()).unwrap();
        assert_eq!(
            out,
            format!(
                "{HEADER}  group E1\n\
                 2024-01-01T00:00:00Z-2024-01-03T00:00:00Z:\n\
                 2024-01-01T00:00:00Z: Created #creation\n\
                 2024-01-02T00:00:00Z: Properties updated #modification\n\
                 2024-01-03T00:00:00Z: Deleted #deletion\n\
                 endGroup\n\n"
            )
        );
    }

    #[test]
    fn existing_node_ends_now() {
        let state = state_with(&[(
            "n-1",
            "2024-01-01T00:00:00Z",
            EventKind::NodeAggregateWithNodeWasCreated,
        )]);
        let out = render_markwhen_at(&state, now()).unwrap();
        assert!(out.contains("2024-01-01T00:00:00Z-2024-06-01T12:00:00Z:\n"));
    }

    #[test]
    fn removed_then_enabled_ends_now() {
        let state = state_with(&[
            ("n-1", "2024-01-01T00:00:00Z", EventKind::NodeAggregateWasRemoved),
            ("n-1", "2024-01-02T00:00:00Z", EventKind::NodeAggregateWasEnabled),
        ]);
        let out = render_markwhen_at(&state, now()).unwrap();
        assert!(out.contains("2024-01-01T00:00:00Z-2024-06-01T12:00:00Z:\n"));
    }

    #[test]
    fn offsets_are_converted_to_utc() {
        let state = state_with(&[(
            "n-1",
            "2024-01-01T02:30:00+02:00",
            EventKind::NodeAggregateWasDisabled,
        )]);
        let out = render_markwhen_at(&state, now()).unwrap();
        assert!(out.contains("2024-01-01T00:30:00Z: Disabled #deletion\n"));
    }

    #[test]
    fn groups_follow_first_seen_order() {
        let state = state_with(&[
            ("b", "2024-01-01T00:00:00Z", EventKind::NodeAggregateWithNodeWasCreated),
            ("a", "2024-01-02T00:00:00Z", EventKind::NodeAggregateWithNodeWasCreated),
            ("b", "2024-01-03T00:00:00Z", EventKind::NodeReferencesWereSet),
        ]);
        let out = render_markwhen_at(&state, now()).unwrap();
        insta::assert_snapshot!(out, @r"
        title: Neos Content Repository

        #creation: #49a74f
        #modification: #e6c833
        #deletion: #c83737

          group b
        2024-01-01T00:00:00Z-2024-06-01T12:00:00Z:
        2024-01-01T00:00:00Z: Created #creation
        2024-01-03T00:00:00Z: References updated #modification
        endGroup

          group a
        2024-01-02T00:00:00Z-2024-06-01T12:00:00Z:
        2024-01-02T00:00:00Z: Created #creation
        endGroup
        ");
    }

    #[test]
    fn every_timeline_kind_has_exactly_one_label() {
        let labelled: Vec<EventKind> = ALL_EVENT_KINDS
            .into_iter()
            .filter(|kind| label(*kind).is_ok())
            .collect();
        assert_eq!(labelled.len(), 6);
        assert!(labelled.iter().all(|kind| kind.is_node_event()));
    }

    #[test]
    fn root_workspace_record_is_an_invariant_violation() {
        let state = state_with(&[(
            "n-1",
            "2024-01-01T00:00:00Z",
            EventKind::RootWorkspaceWasCreated,
        )]);
        assert_matches!(
            render_markwhen_at(&state, now()),
            Err(ProjectionError::InvariantViolation(_))
        );
    }

    #[test]
    fn empty_timeline_is_an_invariant_violation() {
        let state: ProjectionState =
            serde_json::from_str(r#"{"liveContentStreamId": "cs-1", "nodeEvents": {"n-1": []}}"#)
                .unwrap();
        assert_matches!(
            render_markwhen_at(&state, now()),
            Err(ProjectionError::InvariantViolation(msg)) if msg.contains("n-1")
        );
    }
}
