//! Pipeline stage as recorded in the checkpoint.

use serde::{Deserialize, Serialize};

/// One step of the fixed production sequence.
///
/// The sequence is total:
/// `premise_confirmed` → `starting_frame_generated` →
/// `clip_generated{1..N}` → `stitched` → `complete`.
///
/// The stage in a checkpoint names the furthest point the job has durably
/// reached; re-running the pipeline from any stage skips work whose
/// artifacts already exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "snake_case")]
pub enum Stage {
    /// Job created, nothing generated yet.
    PremiseConfirmed,
    /// The seed image for clip 1 is on disk.
    StartingFrameGenerated,
    /// Clips 1..=index are on disk with their chained last frames.
    ClipGenerated { index: usize },
    /// All clips concatenated into the final film.
    Stitched,
    /// Terminal; no further external calls.
    Complete,
}

impl Stage {
    /// Position in the total order. Clip stages are ordered by index.
    fn rank(&self) -> (u8, usize) {
        match self {
            Stage::PremiseConfirmed => (0, 0),
            Stage::StartingFrameGenerated => (1, 0),
            Stage::ClipGenerated { index } => (2, *index),
            Stage::Stitched => (3, 0),
            Stage::Complete => (4, 0),
        }
    }

    /// Whether this stage is at or past `other` in the sequence.
    pub fn has_reached(&self, other: &Stage) -> bool {
        self.rank() >= other.rank()
    }

    /// Whether the job is finished.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Stage::Complete)
    }

    /// Advance to `next` only if it is further along than the current stage.
    ///
    /// Keeps re-entered steps from moving the recorded stage backwards.
    pub fn advance_to(&mut self, next: Stage) {
        if next.rank() > self.rank() {
            *self = next;
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::PremiseConfirmed => write!(f, "premise confirmed"),
            Stage::StartingFrameGenerated => write!(f, "starting frame generated"),
            Stage::ClipGenerated { index } => write!(f, "clip {} generated", index),
            Stage::Stitched => write!(f, "stitched"),
            Stage::Complete => write!(f, "complete"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stages_are_totally_ordered() {
        let sequence = [
            Stage::PremiseConfirmed,
            Stage::StartingFrameGenerated,
            Stage::ClipGenerated { index: 1 },
            Stage::ClipGenerated { index: 2 },
            Stage::Stitched,
            Stage::Complete,
        ];

        for window in sequence.windows(2) {
            assert!(window[1].has_reached(&window[0]));
            assert!(!window[0].has_reached(&window[1]) || window[0] == window[1]);
        }
    }

    #[test]
    fn advance_never_moves_backwards() {
        let mut stage = Stage::ClipGenerated { index: 3 };
        stage.advance_to(Stage::ClipGenerated { index: 1 });
        assert_eq!(stage, Stage::ClipGenerated { index: 3 });

        stage.advance_to(Stage::Stitched);
        assert_eq!(stage, Stage::Stitched);
    }

    #[test]
    fn stage_serializes_with_tag() {
        let json = serde_json::to_string(&Stage::ClipGenerated { index: 2 }).unwrap();
        assert_eq!(json, "{\"name\":\"clip_generated\",\"index\":2}");

        let back: Stage = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Stage::ClipGenerated { index: 2 });
    }
}
