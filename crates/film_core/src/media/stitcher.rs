//! Clip concatenation via FFmpeg's concat demuxer.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;

use super::frames::stderr_tail;
use crate::models;

/// Errors from stitching clips into a film.
#[derive(Error, Debug)]
pub enum StitchError {
    /// No clips were given to stitch.
    #[error("no video clips to stitch")]
    NoInputs,

    /// An input clip is missing or empty on disk.
    #[error("input clip missing or empty: {0}")]
    InputMissing(String),

    /// FFmpeg could not be spawned (usually: not installed).
    #[error(
        "failed to run ffmpeg: {0}. Install it with your package manager \
         (apt install ffmpeg / dnf install ffmpeg / brew install ffmpeg)"
    )]
    FfmpegSpawn(String),

    /// FFmpeg ran but failed (incompatible formats, bad container).
    #[error("ffmpeg exited with code {code:?}: {stderr}")]
    FfmpegFailed { code: Option<i32>, stderr: String },

    /// Writing the concat list or reading the output failed.
    #[error("I/O error during {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    /// FFmpeg reported success but the output file is missing or empty.
    #[error("stitching produced no output at {0}")]
    EmptyOutput(String),
}

/// Concatenates ordered video clips into one film.
pub trait Stitcher: Send + Sync {
    /// Concatenate `clips` in order into `output`, returning the output path.
    fn concatenate(&self, clips: &[PathBuf], output: &Path) -> Result<PathBuf, StitchError>;
}

/// FFmpeg-based stitcher using the concat demuxer with stream copy.
#[derive(Debug, Clone, Copy, Default)]
pub struct FfmpegStitcher;

impl FfmpegStitcher {
    pub fn new() -> Self {
        Self
    }
}

impl Stitcher for FfmpegStitcher {
    fn concatenate(&self, clips: &[PathBuf], output: &Path) -> Result<PathBuf, StitchError> {
        if clips.is_empty() {
            return Err(StitchError::NoInputs);
        }
        for clip in clips {
            if !models::file_non_empty(clip) {
                return Err(StitchError::InputMissing(clip.display().to_string()));
            }
        }

        if let Some(parent) = output.parent() {
            fs::create_dir_all(parent).map_err(|e| StitchError::Io {
                operation: "creating output directory".to_string(),
                source: e,
            })?;
        }

        // The concat demuxer reads its inputs from a list file.
        let list_path = output.with_extension("concat.txt");
        let mut list = String::new();
        for clip in clips {
            list.push_str(&format!("file '{}'\n", escape_concat_path(clip)));
        }
        fs::write(&list_path, list).map_err(|e| StitchError::Io {
            operation: "writing concat list".to_string(),
            source: e,
        })?;

        let mut cmd = Command::new("ffmpeg");
        cmd.arg("-f")
            .arg("concat")
            .arg("-safe")
            .arg("0")
            .arg("-i")
            .arg(&list_path)
            .arg("-c")
            .arg("copy")
            .arg("-y")
            .arg(output);

        tracing::debug!("Running FFmpeg: {:?}", cmd);

        let result = cmd.output();
        // The list file is scratch; remove it whether ffmpeg worked or not.
        let _ = fs::remove_file(&list_path);

        let result = result.map_err(|e| StitchError::FfmpegSpawn(e.to_string()))?;
        if !result.status.success() {
            return Err(StitchError::FfmpegFailed {
                code: result.status.code(),
                stderr: stderr_tail(&result.stderr),
            });
        }

        if !models::file_non_empty(output) {
            return Err(StitchError::EmptyOutput(output.display().to_string()));
        }

        Ok(output.to_path_buf())
    }
}

/// Trim a video to `duration_secs` with stream copy.
pub fn trim_video(
    input: &Path,
    output: &Path,
    duration_secs: u32,
) -> Result<PathBuf, StitchError> {
    if !models::file_non_empty(input) {
        return Err(StitchError::InputMissing(input.display().to_string()));
    }

    let mut cmd = Command::new("ffmpeg");
    cmd.arg("-i")
        .arg(input)
        .arg("-t")
        .arg(duration_secs.to_string())
        .arg("-c")
        .arg("copy")
        .arg("-y")
        .arg(output);

    tracing::debug!("Running FFmpeg: {:?}", cmd);

    let result = cmd
        .output()
        .map_err(|e| StitchError::FfmpegSpawn(e.to_string()))?;

    if !result.status.success() {
        return Err(StitchError::FfmpegFailed {
            code: result.status.code(),
            stderr: stderr_tail(&result.stderr),
        });
    }

    Ok(output.to_path_buf())
}

/// Check whether ffmpeg is runnable on this system.
pub fn check_ffmpeg() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Escape a path for the concat demuxer list format. Single quotes inside
/// a quoted string are written as `'\''`.
fn escape_concat_path(path: &Path) -> String {
    path.display().to_string().replace('\'', "'\\''")
}
