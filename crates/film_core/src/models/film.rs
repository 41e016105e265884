//! Film specification and clip records.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::enums::{ClipStatus, FilmStyle, MusicVibe, ProviderKind};

/// Errors raised when constructing a [`FilmSpec`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FilmSpecError {
    #[error("premise must not be empty")]
    EmptyPremise,

    #[error("clip duration must be greater than zero")]
    ZeroClipDuration,

    #[error(
        "target duration {target}s is not an exact multiple of the clip duration {clip}s"
    )]
    NotExactMultiple { target: u32, clip: u32 },
}

/// Immutable description of one film job.
///
/// Validated at construction; everything mutable about a job lives in its
/// checkpoint, never here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilmSpec {
    /// What the film is about.
    pub premise: String,
    /// Visual style applied to all prompts.
    pub style: FilmStyle,
    /// Music vibe; metadata only, never affects generation.
    pub music_vibe: MusicVibe,
    /// Which video provider to call.
    pub provider: ProviderKind,
    /// Total film length in seconds.
    pub target_duration_secs: u32,
    /// Length of each generated clip in seconds.
    pub clip_duration_secs: u32,
}

impl FilmSpec {
    /// Create a validated spec.
    ///
    /// The target duration must be a positive exact multiple of the clip
    /// duration, so the film divides into whole clips.
    pub fn new(
        premise: impl Into<String>,
        style: FilmStyle,
        music_vibe: MusicVibe,
        provider: ProviderKind,
        target_duration_secs: u32,
        clip_duration_secs: u32,
    ) -> Result<Self, FilmSpecError> {
        let premise = premise.into();
        if premise.trim().is_empty() {
            return Err(FilmSpecError::EmptyPremise);
        }
        if clip_duration_secs == 0 {
            return Err(FilmSpecError::ZeroClipDuration);
        }
        if target_duration_secs == 0 || target_duration_secs % clip_duration_secs != 0 {
            return Err(FilmSpecError::NotExactMultiple {
                target: target_duration_secs,
                clip: clip_duration_secs,
            });
        }

        Ok(Self {
            premise,
            style,
            music_vibe,
            provider,
            target_duration_secs,
            clip_duration_secs,
        })
    }

    /// Number of clips the film divides into. Always >= 1.
    pub fn clip_count(&self) -> usize {
        (self.target_duration_secs / self.clip_duration_secs) as usize
    }
}

/// One generated video segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoClip {
    /// 1-based position in the film.
    pub index: usize,
    /// Generation status.
    #[serde(default)]
    pub status: ClipStatus,
    /// Video generation prompt; filled in when the clip is first attempted.
    #[serde(default)]
    pub prompt: String,
    /// Seed image the clip starts from (previous clip's last frame, or the
    /// starting frame for clip 1).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed_frame: Option<PathBuf>,
    /// Where the generated video is written.
    pub video_path: PathBuf,
    /// Last frame extracted after generation, seeding the next clip.
    /// The final clip has none; nothing chains after it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_frame: Option<PathBuf>,
    /// Clip length in seconds.
    pub duration_secs: u32,
    /// Provider attempts consumed for this clip so far.
    #[serde(default)]
    pub attempts: u32,
    /// Failure detail when status is `failed`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl VideoClip {
    /// Create a pending clip record with its output path under `output_dir`.
    pub fn new(index: usize, duration_secs: u32, output_dir: &Path) -> Self {
        Self {
            index,
            status: ClipStatus::Pending,
            prompt: String::new(),
            seed_frame: None,
            video_path: output_dir.join(format!("clip_{:02}.mp4", index)),
            last_frame: None,
            duration_secs,
            attempts: 0,
            error: None,
        }
    }

    /// Path where this clip's extracted last frame goes.
    pub fn last_frame_path(&self, output_dir: &Path) -> PathBuf {
        output_dir.join(format!("clip_{:02}_last_frame.png", self.index))
    }

    /// Whether the checkpoint records this clip as done.
    pub fn is_done(&self) -> bool {
        self.status == ClipStatus::Done
    }

    /// Whether the artifacts the checkpoint claims actually exist on disk
    /// and are non-empty. A done clip whose files vanished must be
    /// regenerated rather than trusted.
    pub fn artifacts_on_disk(&self) -> bool {
        if !file_non_empty(&self.video_path) {
            return false;
        }
        match &self.last_frame {
            Some(frame) => file_non_empty(frame),
            // Final clip: no extracted frame required.
            None => true,
        }
    }
}

/// True if `path` exists and has a non-zero size.
pub(crate) fn file_non_empty(path: &Path) -> bool {
    std::fs::metadata(path).map(|m| m.len() > 0).unwrap_or(false)
}
