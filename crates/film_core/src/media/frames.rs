//! Last-frame extraction via FFmpeg.
//!
//! The final frame of clip i seeds clip i+1 (frame chaining), so
//! extraction failure blocks the chain and is treated as permanent.

use std::path::Path;
use std::process::Command;

use thiserror::Error;

use crate::models;

/// Errors from frame extraction.
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// The video file to extract from does not exist.
    #[error("video not found: {0}")]
    VideoNotFound(String),

    /// FFmpeg could not be spawned (usually: not installed).
    #[error("failed to run ffmpeg: {0}")]
    FfmpegSpawn(String),

    /// FFmpeg ran but failed.
    #[error("ffmpeg exited with code {code:?}: {stderr}")]
    FfmpegFailed { code: Option<i32>, stderr: String },

    /// FFmpeg succeeded but produced no usable frame (zero-frame or
    /// unreadable video).
    #[error("no frame could be extracted from {0}")]
    NoFrames(String),
}

/// Extracts the last frame of a video to an image file.
pub trait FrameExtractor: Send + Sync {
    /// Write the last frame of `video` to `output` as an image.
    fn extract_last_frame(&self, video: &Path, output: &Path) -> Result<(), ExtractionError>;
}

/// FFmpeg-based frame extractor.
#[derive(Debug, Clone, Copy, Default)]
pub struct FfmpegFrameExtractor;

impl FfmpegFrameExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl FrameExtractor for FfmpegFrameExtractor {
    fn extract_last_frame(&self, video: &Path, output: &Path) -> Result<(), ExtractionError> {
        if !video.exists() {
            return Err(ExtractionError::VideoNotFound(video.display().to_string()));
        }

        if let Some(parent) = output.parent() {
            let _ = std::fs::create_dir_all(parent);
        }

        // Seek close to the end and keep overwriting the output with each
        // decoded frame; the file that remains is the last frame.
        let mut cmd = Command::new("ffmpeg");
        cmd.arg("-sseof")
            .arg("-1")
            .arg("-i")
            .arg(video)
            .arg("-update")
            .arg("1")
            .arg("-q:v")
            .arg("2")
            .arg("-y")
            .arg(output);

        tracing::debug!("Running FFmpeg: {:?}", cmd);

        let result = cmd
            .output()
            .map_err(|e| ExtractionError::FfmpegSpawn(e.to_string()))?;

        if !result.status.success() {
            return Err(ExtractionError::FfmpegFailed {
                code: result.status.code(),
                stderr: stderr_tail(&result.stderr),
            });
        }

        // A zero-frame video leaves nothing behind even on exit code 0.
        if !models::file_non_empty(output) {
            return Err(ExtractionError::NoFrames(video.display().to_string()));
        }

        Ok(())
    }
}

/// Last few lines of captured stderr, for error messages.
pub(crate) fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(5);
    lines[start..].join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_video_is_rejected_without_running_ffmpeg() {
        let extractor = FfmpegFrameExtractor::new();
        let result = extractor.extract_last_frame(
            Path::new("/nonexistent/clip.mp4"),
            Path::new("/tmp/frame.png"),
        );
        assert!(matches!(result, Err(ExtractionError::VideoNotFound(_))));
    }

    #[test]
    fn stderr_tail_keeps_last_lines() {
        let stderr = b"line1\nline2\nline3\nline4\nline5\nline6\nline7";
        let tail = stderr_tail(stderr);
        assert!(tail.starts_with("line3"));
        assert!(tail.ends_with("line7"));
    }
}
