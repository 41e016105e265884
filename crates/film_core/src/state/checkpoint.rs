//! The durable progress record for one film job.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::models::{file_non_empty, FilmSpec, Stage, VideoClip};

/// Current checkpoint schema version.
///
/// Bumped on incompatible schema changes; loading a file with a newer
/// version is refused rather than guessed at.
pub const CHECKPOINT_VERSION: u32 = 1;

/// Serializable snapshot of a job's progress.
///
/// The checkpoint is the sole source of truth for resumption; no
/// in-memory state survives a restart. It is overwritten atomically
/// after every stage transition and after every clip completes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Schema version tag.
    pub version: u32,
    /// Unique job identifier, assigned at creation.
    pub job_id: String,
    /// The immutable film parameters.
    pub film: FilmSpec,
    /// Directory all artifacts live under.
    pub output_dir: PathBuf,
    /// Furthest stage durably reached.
    pub stage: Stage,
    /// Seed image for clip 1, once generated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub starting_frame: Option<PathBuf>,
    /// Ordered clip records, one per clip in the film.
    pub clips: Vec<VideoClip>,
    /// Final stitched film, once produced.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_film: Option<PathBuf>,
    /// When the job was created (RFC 3339).
    pub created_at: String,
    /// When the checkpoint was last written (RFC 3339).
    pub updated_at: String,
}

impl Checkpoint {
    /// Create a fresh checkpoint for a new job, with one pending clip
    /// record per clip in the film.
    pub fn new(film: FilmSpec, output_dir: impl Into<PathBuf>) -> Self {
        let output_dir = output_dir.into();
        let clips = (1..=film.clip_count())
            .map(|i| VideoClip::new(i, film.clip_duration_secs, &output_dir))
            .collect();
        let now = chrono::Local::now().to_rfc3339();
        let job_id = format!("film-{}", chrono::Local::now().format("%Y%m%d-%H%M%S"));

        Self {
            version: CHECKPOINT_VERSION,
            job_id,
            film,
            output_dir,
            stage: Stage::PremiseConfirmed,
            starting_frame: None,
            clips,
            final_film: None,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Refresh the updated-at timestamp. Called by the store on save.
    pub fn touch(&mut self) {
        self.updated_at = chrono::Local::now().to_rfc3339();
    }

    /// Whether the starting frame is recorded and actually on disk.
    pub fn starting_frame_on_disk(&self) -> bool {
        self.starting_frame
            .as_deref()
            .map(file_non_empty)
            .unwrap_or(false)
    }

    /// Number of clips recorded as done.
    pub fn clips_done(&self) -> usize {
        self.clips.iter().filter(|c| c.is_done()).count()
    }

    /// Whether every clip is done.
    pub fn all_clips_done(&self) -> bool {
        self.clips.iter().all(|c| c.is_done())
    }

    /// Whether the job reached its terminal stage.
    pub fn is_complete(&self) -> bool {
        self.stage.is_terminal()
    }

    /// Ordered video paths of all clips (for stitching).
    pub fn clip_video_paths(&self) -> Vec<PathBuf> {
        self.clips.iter().map(|c| c.video_path.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ClipStatus, FilmStyle, MusicVibe, ProviderKind};
    use tempfile::tempdir;

    fn film() -> FilmSpec {
        FilmSpec::new(
            "A lone astronaut discovers an alien artifact on Mars",
            FilmStyle::Scifi,
            MusicVibe::Suspenseful,
            ProviderKind::OpenAi,
            60,
            10,
        )
        .unwrap()
    }

    #[test]
    fn new_checkpoint_has_pending_clips() {
        let dir = tempdir().unwrap();
        let checkpoint = Checkpoint::new(film(), dir.path());

        assert_eq!(checkpoint.version, CHECKPOINT_VERSION);
        assert_eq!(checkpoint.stage, Stage::PremiseConfirmed);
        assert_eq!(checkpoint.clips.len(), 6);
        assert!(checkpoint
            .clips
            .iter()
            .all(|c| c.status == ClipStatus::Pending));
        assert_eq!(checkpoint.clips[0].index, 1);
        assert_eq!(checkpoint.clips[5].index, 6);
    }

    #[test]
    fn clip_accounting() {
        let dir = tempdir().unwrap();
        let mut checkpoint = Checkpoint::new(film(), dir.path());

        assert_eq!(checkpoint.clips_done(), 0);
        assert!(!checkpoint.all_clips_done());

        for clip in &mut checkpoint.clips {
            clip.status = ClipStatus::Done;
        }
        assert_eq!(checkpoint.clips_done(), 6);
        assert!(checkpoint.all_clips_done());
    }

    #[test]
    fn checkpoint_round_trips_losslessly() {
        let dir = tempdir().unwrap();
        let mut checkpoint = Checkpoint::new(film(), dir.path());
        checkpoint.clips[0].status = ClipStatus::Done;
        checkpoint.clips[0].prompt = "opening scene".to_string();
        checkpoint.stage = Stage::ClipGenerated { index: 1 };

        let json = serde_json::to_string_pretty(&checkpoint).unwrap();
        let back: Checkpoint = serde_json::from_str(&json).unwrap();
        assert_eq!(back, checkpoint);
    }
}
