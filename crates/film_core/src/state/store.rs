//! Durable, atomic persistence for checkpoints.
//!
//! One `state.json` per job under its output directory. Saves go to a
//! temp file first and are renamed into place, so a crash mid-write
//! never corrupts the previous valid checkpoint.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::checkpoint::{Checkpoint, CHECKPOINT_VERSION};

/// Name of the checkpoint file under the output directory.
pub const STATE_FILE_NAME: &str = "state.json";

/// Errors from checkpoint persistence.
#[derive(Error, Debug)]
pub enum StateError {
    /// No checkpoint exists for the job.
    #[error("no checkpoint found at {path}")]
    NotFound { path: PathBuf },

    /// The file exists but cannot be parsed. Never silently replaced -
    /// a corrupt checkpoint may still describe paid-for work.
    #[error("checkpoint at {path} is corrupt: {message}")]
    Corrupt { path: PathBuf, message: String },

    /// The file was written by a newer version of this tool.
    #[error(
        "checkpoint at {path} has version {found}, newer than supported version {supported}"
    )]
    IncompatibleVersion {
        path: PathBuf,
        found: u32,
        supported: u32,
    },

    /// Filesystem failure while reading or writing.
    #[error("I/O error during {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: io::Error,
    },
}

impl StateError {
    fn io(operation: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            source,
        }
    }
}

/// Result type for state operations.
pub type StateResult<T> = Result<T, StateError>;

/// Loads, saves, and clears the checkpoint file for one job.
pub struct CheckpointStore {
    state_path: PathBuf,
}

impl CheckpointStore {
    /// Create a store for the job owning `output_dir`.
    pub fn new(output_dir: impl AsRef<Path>) -> Self {
        Self {
            state_path: output_dir.as_ref().join(STATE_FILE_NAME),
        }
    }

    /// Path of the checkpoint file.
    pub fn state_path(&self) -> &Path {
        &self.state_path
    }

    /// Whether a checkpoint exists for this job.
    pub fn exists(&self) -> bool {
        self.state_path.exists()
    }

    /// Load the checkpoint.
    ///
    /// A missing file is `NotFound`; an unparseable file is `Corrupt`;
    /// a newer schema version is `IncompatibleVersion`. None of these
    /// fabricate a fresh checkpoint.
    pub fn load(&self) -> StateResult<Checkpoint> {
        if !self.state_path.exists() {
            return Err(StateError::NotFound {
                path: self.state_path.clone(),
            });
        }

        let content = fs::read_to_string(&self.state_path)
            .map_err(|e| StateError::io("reading checkpoint", e))?;

        let checkpoint: Checkpoint =
            serde_json::from_str(&content).map_err(|e| StateError::Corrupt {
                path: self.state_path.clone(),
                message: e.to_string(),
            })?;

        if checkpoint.version > CHECKPOINT_VERSION {
            return Err(StateError::IncompatibleVersion {
                path: self.state_path.clone(),
                found: checkpoint.version,
                supported: CHECKPOINT_VERSION,
            });
        }

        Ok(checkpoint)
    }

    /// Save the checkpoint atomically, refreshing its updated-at stamp.
    pub fn save(&self, checkpoint: &mut Checkpoint) -> StateResult<()> {
        checkpoint.touch();

        let content = serde_json::to_string_pretty(checkpoint).map_err(|e| {
            StateError::io(
                "serializing checkpoint",
                io::Error::new(io::ErrorKind::InvalidData, e),
            )
        })?;

        if let Some(parent) = self.state_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| StateError::io("creating output directory", e))?;
        }

        // Temp file in the same directory so the rename stays atomic.
        let temp_path = self.state_path.with_extension("json.tmp");
        {
            let mut file = fs::File::create(&temp_path)
                .map_err(|e| StateError::io("creating checkpoint temp file", e))?;
            file.write_all(content.as_bytes())
                .map_err(|e| StateError::io("writing checkpoint", e))?;
            file.sync_all()
                .map_err(|e| StateError::io("syncing checkpoint", e))?;
        }

        fs::rename(&temp_path, &self.state_path)
            .map_err(|e| StateError::io("replacing checkpoint", e))?;

        Ok(())
    }

    /// Remove the checkpoint file. Only called on explicit user request.
    pub fn clear(&self) -> StateResult<()> {
        if self.state_path.exists() {
            fs::remove_file(&self.state_path)
                .map_err(|e| StateError::io("removing checkpoint", e))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FilmSpec, FilmStyle, MusicVibe, ProviderKind, Stage};
    use tempfile::tempdir;

    fn checkpoint(output_dir: &Path) -> Checkpoint {
        let film = FilmSpec::new(
            "Two robots fall in love in a post-apocalyptic city",
            FilmStyle::Cinematic,
            MusicVibe::Calm,
            ProviderKind::Gemini,
            30,
            10,
        )
        .unwrap();
        Checkpoint::new(film, output_dir)
    }

    #[test]
    fn load_missing_is_not_found() {
        let dir = tempdir().unwrap();
        let store = CheckpointStore::new(dir.path());
        assert!(matches!(store.load(), Err(StateError::NotFound { .. })));
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempdir().unwrap();
        let store = CheckpointStore::new(dir.path());
        let mut original = checkpoint(dir.path());
        original.stage = Stage::StartingFrameGenerated;

        store.save(&mut original).unwrap();
        let loaded = store.load().unwrap();

        assert_eq!(loaded.stage, original.stage);
        assert_eq!(loaded.clips.len(), 3);
        assert_eq!(loaded.film.premise, original.film.premise);
    }

    #[test]
    fn corrupt_file_is_surfaced_not_replaced() {
        let dir = tempdir().unwrap();
        let store = CheckpointStore::new(dir.path());
        fs::write(store.state_path(), "{ not json").unwrap();

        assert!(matches!(store.load(), Err(StateError::Corrupt { .. })));
        // The corrupt file is left in place for inspection.
        assert!(store.state_path().exists());
    }

    #[test]
    fn newer_version_is_refused() {
        let dir = tempdir().unwrap();
        let store = CheckpointStore::new(dir.path());
        let mut cp = checkpoint(dir.path());
        store.save(&mut cp).unwrap();

        let content = fs::read_to_string(store.state_path()).unwrap();
        let bumped = content.replacen(
            &format!("\"version\": {}", CHECKPOINT_VERSION),
            &format!("\"version\": {}", CHECKPOINT_VERSION + 1),
            1,
        );
        fs::write(store.state_path(), bumped).unwrap();

        assert!(matches!(
            store.load(),
            Err(StateError::IncompatibleVersion { .. })
        ));
    }

    #[test]
    fn save_leaves_no_temp_file() {
        let dir = tempdir().unwrap();
        let store = CheckpointStore::new(dir.path());
        let mut cp = checkpoint(dir.path());
        store.save(&mut cp).unwrap();

        assert!(!store.state_path().with_extension("json.tmp").exists());
    }

    #[test]
    fn interrupted_save_preserves_previous_checkpoint() {
        let dir = tempdir().unwrap();
        let store = CheckpointStore::new(dir.path());
        let mut cp = checkpoint(dir.path());
        store.save(&mut cp).unwrap();

        // Simulate a crash mid-write: a half-written temp file exists but
        // was never renamed over the real checkpoint.
        let temp_path = store.state_path().with_extension("json.tmp");
        fs::write(&temp_path, "{ \"version\": 1, \"film\"").unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.clips.len(), 3);
    }

    #[test]
    fn clear_removes_the_file() {
        let dir = tempdir().unwrap();
        let store = CheckpointStore::new(dir.path());
        let mut cp = checkpoint(dir.path());
        store.save(&mut cp).unwrap();

        store.clear().unwrap();
        assert!(!store.exists());
        // Clearing twice is fine.
        store.clear().unwrap();
    }
}
