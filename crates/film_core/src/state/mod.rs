//! Checkpoint persistence for resumable jobs.

mod checkpoint;
mod store;

pub use checkpoint::{Checkpoint, CHECKPOINT_VERSION};
pub use store::{CheckpointStore, StateError, StateResult, STATE_FILE_NAME};
