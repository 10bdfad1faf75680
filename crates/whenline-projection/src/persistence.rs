//! Whole-snapshot persistence in a single JSON file.
//!
//! Saves write the full snapshot to a temporary file in the target directory
//! and rename it over the old one, so a reader sees either the previous or
//! the new snapshot and never a partial write.

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{ProjectionError, Result};
use crate::state::ProjectionState;

/// File name of the snapshot inside a repository's data directory.
pub const STATE_FILE_NAME: &str = "state.json";

/// The snapshot file of one content repository.
#[derive(Clone, Debug)]
pub struct StateFile {
    path: PathBuf,
}

impl StateFile {
    /// Use the snapshot file at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<repository_dir>/state.json`.
    #[must_use]
    pub fn in_dir(repository_dir: &Path) -> Self {
        Self::new(repository_dir.join(STATE_FILE_NAME))
    }

    /// Path of the snapshot file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the persisted snapshot. A missing file yields the empty snapshot.
    pub fn load(&self) -> Result<ProjectionState> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "state file not found, starting empty");
                return Ok(ProjectionState::empty());
            }
            Err(source) => return Err(self.io_error(source)),
        };
        serde_json::from_str(&content).map_err(|source| ProjectionError::StateDecode {
            path: self.path.clone(),
            source,
        })
    }

    /// Replace the persisted snapshot with `state`.
    pub fn save(&self, state: &ProjectionState) -> Result<()> {
        let encoded = serde_json::to_vec_pretty(state).map_err(ProjectionError::StateEncode)?;
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| self.io_error(e))?;
        tmp.write_all(&encoded).map_err(|e| self.io_error(e))?;
        tmp.as_file().sync_all().map_err(|e| self.io_error(e))?;
        let _ = tmp
            .persist(&self.path)
            .map_err(|e| self.io_error(e.error))?;

        debug!(
            path = %self.path.display(),
            sequence_number = %state.sequence_number(),
            nodes = state.node_count(),
            "saved projection state"
        );
        Ok(())
    }

    /// Persist and return the empty snapshot.
    pub fn reset(&self) -> Result<ProjectionState> {
        let state = ProjectionState::empty();
        self.save(&state)?;
        Ok(state)
    }

    /// Create the parent directory (recursively), then [`reset`](Self::reset).
    pub fn setup(&self) -> Result<ProjectionState> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ProjectionError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        self.reset()
    }

    fn io_error(&self, source: std::io::Error) -> ProjectionError {
        ProjectionError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use whenline_core::timestamp::parse_w3c;
    use whenline_core::{ContentStreamId, NodeAggregateId, SequenceNumber};
    use whenline_events::EventKind;

    fn sample_state() -> ProjectionState {
        let cs = ContentStreamId::from("cs-1");
        ProjectionState::empty()
            .with_live_content_stream_id(cs.clone())
            .with_added_node_event(
                &cs,
                NodeAggregateId::from("n-1"),
                parse_w3c("2024-01-01T00:00:00Z").unwrap(),
                EventKind::NodeAggregateWithNodeWasCreated,
            )
            .with_sequence_number(SequenceNumber::new(2))
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let file = StateFile::in_dir(dir.path());
        assert_eq!(file.load().unwrap(), ProjectionState::empty());
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let file = StateFile::in_dir(dir.path());
        let state = sample_state();
        file.save(&state).unwrap();
        assert_eq!(file.load().unwrap(), state);
    }

    #[test]
    fn save_writes_w3c_timestamps() {
        let dir = tempfile::tempdir().unwrap();
        let file = StateFile::in_dir(dir.path());
        file.save(&sample_state()).unwrap();
        let raw = std::fs::read_to_string(file.path()).unwrap();
        assert!(raw.contains("\"2024-01-01T00:00:00+00:00\""));
        assert!(raw.contains("\"liveContentStreamId\": \"cs-1\""));
    }

    #[test]
    fn save_replaces_previous_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let file = StateFile::in_dir(dir.path());
        file.save(&sample_state()).unwrap();
        file.save(&ProjectionState::empty()).unwrap();
        assert_eq!(file.load().unwrap(), ProjectionState::empty());

        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_name() != STATE_FILE_NAME)
            .collect();
        assert!(leftovers.is_empty(), "temporary files left behind");
    }

    #[test]
    fn malformed_file_is_a_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let file = StateFile::in_dir(dir.path());
        std::fs::write(file.path(), "{ not json").unwrap();
        assert_matches!(file.load(), Err(ProjectionError::StateDecode { .. }));
    }

    #[test]
    fn save_into_missing_directory_fails_with_io() {
        let dir = tempfile::tempdir().unwrap();
        let file = StateFile::new(dir.path().join("missing").join(STATE_FILE_NAME));
        assert_matches!(file.save(&sample_state()), Err(ProjectionError::Io { .. }));
    }

    #[test]
    fn reset_persists_empty_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let file = StateFile::in_dir(dir.path());
        file.save(&sample_state()).unwrap();
        assert_eq!(file.reset().unwrap(), ProjectionState::empty());
        assert_eq!(file.load().unwrap(), ProjectionState::empty());
    }

    #[test]
    fn setup_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let file = StateFile::in_dir(&dir.path().join("a").join("b"));
        file.setup().unwrap();
        assert!(file.path().exists());
        assert_eq!(file.load().unwrap(), ProjectionState::empty());
    }
}
