//! The catch-up controller.
//!
//! A cycle reads every event after the bookmark, folds it into a working copy
//! of the snapshot and saves the result in one atomic write. The in-memory
//! cache is only replaced after that write succeeded, so a failing cycle
//! leaves both the file and the cache as they were.
//!
//! Cycles are serialized per [`MarkwhenProjection`] handle. Several processes
//! writing the same state file is not supported.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, instrument, warn};
use whenline_core::SequenceNumber;
use whenline_events::{EventEnvelope, EventSource, NodeEvent, can_handle_batch};

use crate::error::{ProjectionError, Result};
use crate::persistence::StateFile;
use crate::state::ProjectionState;

/// Counters for one catch-up cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CycleStats {
    /// Events read from the source.
    pub seen: usize,
    /// Records added to node timelines.
    pub appended: usize,
    /// Node events skipped because their content stream was not live.
    pub off_branch: usize,
    /// Events of unhandled types.
    pub unhandled: usize,
}

/// Fold `events` into `state`.
///
/// Pure: the same inputs always give the same snapshot. Fails on the first
/// event that cannot be decoded or dated; nothing is returned in that case.
pub fn apply_events(
    mut state: ProjectionState,
    events: &[EventEnvelope],
) -> Result<(ProjectionState, CycleStats)> {
    let mut stats = CycleStats::default();
    for envelope in events {
        state = apply_event(state, envelope, &mut stats)?;
        stats.seen += 1;
    }
    Ok((state, stats))
}

fn apply_event(
    state: ProjectionState,
    envelope: &EventEnvelope,
    stats: &mut CycleStats,
) -> Result<ProjectionState> {
    let sequence_number = envelope.sequence_number;
    if sequence_number <= state.sequence_number() {
        return Err(ProjectionError::InvariantViolation(format!(
            "event {sequence_number} is not after bookmark {}",
            state.sequence_number()
        )));
    }

    let event = NodeEvent::decode(envelope).map_err(|source| ProjectionError::EventDecode {
        sequence_number,
        event_type: envelope.event_type.clone(),
        source,
    })?;

    let state = match event {
        NodeEvent::RootWorkspaceWasCreated(created) => {
            debug!(
                %sequence_number,
                content_stream_id = %created.new_content_stream_id,
                "live content stream changed"
            );
            state.with_live_content_stream_id(created.new_content_stream_id)
        }
        NodeEvent::Other(event_type) => {
            debug!(%sequence_number, %event_type, "unhandled event type");
            stats.unhandled += 1;
            state
        }
        node_event => {
            let (Some(kind), Some(content_stream_id), Some(node_aggregate_id)) = (
                node_event.kind(),
                node_event.content_stream_id(),
                node_event.node_aggregate_id(),
            ) else {
                return Err(ProjectionError::InvariantViolation(format!(
                    "event {sequence_number} ({}) names no node aggregate",
                    envelope.event_type
                )));
            };

            if state.is_live(content_stream_id) {
                let timestamp = envelope
                    .resolve_timestamp()
                    .map_err(|e| ProjectionError::from_timestamp(sequence_number, e))?;
                debug!(
                    %sequence_number,
                    %kind,
                    %node_aggregate_id,
                    "appending node event"
                );
                stats.appended += 1;
                state.with_added_node_event(
                    content_stream_id,
                    node_aggregate_id.clone(),
                    timestamp,
                    kind,
                )
            } else {
                stats.off_branch += 1;
                state
            }
        }
    };

    Ok(state.with_sequence_number(sequence_number))
}

/// Handle on the Markwhen projection of one content repository.
pub struct MarkwhenProjection {
    file: StateFile,
    cache: Mutex<Option<Arc<ProjectionState>>>,
    cycle: Mutex<()>,
}

impl MarkwhenProjection {
    /// Create a handle persisting to `file`. Nothing is read until first use.
    #[must_use]
    pub fn new(file: StateFile) -> Self {
        Self {
            file,
            cache: Mutex::new(None),
            cycle: Mutex::new(()),
        }
    }

    /// The backing state file.
    #[must_use]
    pub fn state_file(&self) -> &StateFile {
        &self.file
    }

    /// Whether any event in `batch` could change the projection.
    ///
    /// A scheduler may skip a cycle when this is `false`.
    #[must_use]
    pub fn can_handle(&self, batch: &[EventEnvelope]) -> bool {
        can_handle_batch(batch)
    }

    /// Create the state directory and persist an empty snapshot.
    pub fn setup(&self) -> Result<()> {
        let _cycle = self.cycle.lock();
        let state = self.file.setup()?;
        info!(path = %self.file.path().display(), "projection set up");
        *self.cache.lock() = Some(Arc::new(state));
        Ok(())
    }

    /// Persist an empty snapshot.
    pub fn reset(&self) -> Result<()> {
        let _cycle = self.cycle.lock();
        let state = self.file.reset()?;
        info!(path = %self.file.path().display(), "projection reset");
        *self.cache.lock() = Some(Arc::new(state));
        Ok(())
    }

    /// The current snapshot, loaded from disk on first access.
    pub fn state(&self) -> Result<Arc<ProjectionState>> {
        let mut cache = self.cache.lock();
        if let Some(state) = cache.as_ref() {
            return Ok(Arc::clone(state));
        }
        let state = Arc::new(self.file.load()?);
        *cache = Some(Arc::clone(&state));
        Ok(state)
    }

    /// The persisted bookmark, read from disk.
    pub fn sequence_number(&self) -> Result<SequenceNumber> {
        Ok(self.file.load()?.sequence_number())
    }

    /// Run one catch-up cycle against `source`.
    #[instrument(skip_all, fields(path = %self.file.path().display(), from = tracing::field::Empty))]
    pub fn catch_up(&self, source: &dyn EventSource) -> Result<Arc<ProjectionState>> {
        let _cycle = self.cycle.lock();
        let current = self.state()?;
        let from = current.sequence_number();
        let _ = tracing::Span::current().record("from", tracing::field::display(from));

        let events = source.events_after(from).inspect_err(|e| {
            warn!(%from, error = %e, "failed to read events");
        })?;
        let (next, stats) =
            apply_events(ProjectionState::clone(&current), &events).inspect_err(|e| {
                warn!(%from, error = %e, "catch-up cycle aborted");
            })?;

        self.file.save(&next).inspect_err(|e| {
            warn!(%from, error = %e, "failed to save projection state");
        })?;
        let next = Arc::new(next);
        *self.cache.lock() = Some(Arc::clone(&next));

        info!(
            seen = stats.seen,
            appended = stats.appended,
            off_branch = stats.off_branch,
            unhandled = stats.unhandled,
            to = %next.sequence_number(),
            "catch-up complete"
        );
        Ok(next)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
