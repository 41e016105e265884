//! Shared test doubles for pipeline tests.
//!
//! The mocks write real files so idempotence and chain-integrity checks
//! against the filesystem behave exactly as they do in production.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use super::types::{Capabilities, Context};
use crate::cancel::CancelHandle;
use crate::config::Settings;
use crate::logging::{JobLogger, LogConfig};
use crate::media::{ExtractionError, FrameExtractor, StitchError, Stitcher};
use crate::models::{FilmSpec, FilmStyle, MusicVibe, ProviderKind};
use crate::providers::{ImageGenerator, ProviderError, VideoGenerator};

/// Standard six-clip film used across pipeline tests.
pub fn test_film() -> FilmSpec {
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

/// Settings with zero backoff so retries don't slow tests down.
pub fn test_settings() -> Settings {
    let mut settings = Settings::default();
    settings.retry.base_delay_secs = 0.0;
    settings
}

/// Image generator that always succeeds and counts calls.
#[derive(Default)]
pub struct MockImage {
    calls: AtomicUsize,
}

impl MockImage {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ImageGenerator for MockImage {
    fn generate_image(&self, prompt: &str, _style_hints: &str) -> Result<Vec<u8>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!("image:{}", prompt).into_bytes())
    }
}

/// Video generator with configurable failure and cancellation behavior.
#[derive(Default)]
pub struct MockVideo {
    calls: AtomicUsize,
    /// Fail permanently whenever the seed path contains this substring.
    fail_seed_substring: Option<String>,
    /// Cancel the given handle once this many calls have completed.
    cancel_after: Mutex<Option<(usize, CancelHandle)>>,
}

impl MockVideo {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn cancel_after(&self, completed_calls: usize, handle: CancelHandle) {
        *self.cancel_after.lock() = Some((completed_calls, handle));
    }
}

impl VideoGenerator for MockVideo {
    fn generate_clip(
        &self,
        prompt: &str,
        seed_image: Option<&Path>,
        _duration_secs: u32,
    ) -> Result<Vec<u8>, ProviderError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;

        if let Some(ref substring) = self.fail_seed_substring {
            let seed_matches = seed_image
                .map(|p| p.display().to_string().contains(substring))
                .unwrap_or(false);
            if seed_matches {
                return Err(ProviderError::InvalidRequest {
                    provider: "mock",
                    message: "prompt rejected by provider".to_string(),
                });
            }
        }

        if let Some((after, ref handle)) = *self.cancel_after.lock() {
            if call >= after {
                handle.cancel();
            }
        }

        Ok(format!("video:{}", prompt).into_bytes())
    }
}

/// Frame extractor that derives a deterministic frame file from the video.
#[derive(Default)]
pub struct MockFrames;

impl FrameExtractor for MockFrames {
    fn extract_last_frame(&self, video: &Path, output: &Path) -> Result<(), ExtractionError> {
        let bytes = std::fs::read(video)
            .map_err(|_| ExtractionError::VideoNotFound(video.display().to_string()))?;
        let tag = format!(
            "frame-of:{}:{}",
            video.file_name().unwrap_or_default().to_string_lossy(),
            bytes.len()
        );
        std::fs::write(output, tag)
            .map_err(|e| ExtractionError::FfmpegSpawn(e.to_string()))?;
        Ok(())
    }
}

/// Stitcher that concatenates input files byte-wise and counts calls.
#[derive(Default)]
pub struct MockStitcher {
    calls: AtomicUsize,
}

impl MockStitcher {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Stitcher for MockStitcher {
    fn concatenate(&self, clips: &[PathBuf], output: &Path) -> Result<PathBuf, StitchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if clips.is_empty() {
            return Err(StitchError::NoInputs);
        }

        let mut film = Vec::new();
        for clip in clips {
            let bytes = std::fs::read(clip)
                .map_err(|_| StitchError::InputMissing(clip.display().to_string()))?;
            film.extend_from_slice(&bytes);
        }
        std::fs::write(output, film).map_err(|e| StitchError::Io {
            operation: "writing stitched film".to_string(),
            source: e,
        })?;
        Ok(output.to_path_buf())
    }
}

/// A full set of mock capabilities with handles kept for assertions.
pub struct CapabilitySet {
    pub image: Arc<MockImage>,
    pub video: Arc<MockVideo>,
    pub frames: Arc<MockFrames>,
    pub stitcher: Arc<MockStitcher>,
}

impl CapabilitySet {
    /// Every capability succeeds.
    pub fn all_success() -> Self {
        Self {
            image: Arc::new(MockImage::default()),
            video: Arc::new(MockVideo::default()),
            frames: Arc::new(MockFrames),
            stitcher: Arc::new(MockStitcher::default()),
        }
    }

    /// Video generation fails permanently for seeds matching `substring`.
    pub fn video_fails_for_seed(substring: &str) -> Self {
        let set = Self::all_success();
        Self {
            video: Arc::new(MockVideo {
                fail_seed_substring: Some(substring.to_string()),
                ..MockVideo::default()
            }),
            ..set
        }
    }

    /// Bundle into the trait-object form the pipeline consumes.
    pub fn capabilities(&self) -> Capabilities {
        Capabilities::new(
            self.image.clone(),
            self.video.clone(),
            self.frames.clone(),
            self.stitcher.clone(),
        )
    }
}

/// Context over all-success mocks.
pub fn test_context(dir: &Path) -> Context {
    test_context_with(dir, &CapabilitySet::all_success())
}

/// Context over the given mock set, writing into `dir`.
pub fn test_context_with(dir: &Path, set: &CapabilitySet) -> Context {
    let logger = Arc::new(
        JobLogger::new("test_job", dir.join("logs"), LogConfig::default(), None).unwrap(),
    );
    Context::new(
        test_film(),
        test_settings(),
        "test_job",
        dir.to_path_buf(),
        logger,
        set.capabilities(),
        CancelHandle::new(),
    )
}
