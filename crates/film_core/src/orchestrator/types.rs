//! Core types for the orchestrator pipeline.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cancel::CancelHandle;
use crate::config::{ApiKeys, GenerationSettings, Settings};
use crate::logging::JobLogger;
use crate::media::{
    FfmpegFrameExtractor, FfmpegStitcher, FrameExtractor, Stitcher,
};
use crate::models::FilmSpec;
use crate::providers::{
    create_image_generator, create_video_generator, ImageGenerator, ProviderError,
    VideoGenerator,
};
use crate::retry::RetryPolicy;
use crate::state::CheckpointStore;

use super::errors::{StepError, StepResult};

/// Progress callback type for reporting pipeline progress.
///
/// Arguments: (step_name, percent_complete, message)
pub type ProgressCallback = Arc<dyn Fn(&str, u32, &str) + Send + Sync>;

/// The external capabilities the pipeline calls.
///
/// The state machine only ever sees these trait objects; swapping in
/// test doubles exercises every pipeline path without a network or
/// ffmpeg install.
#[derive(Clone)]
pub struct Capabilities {
    /// Starting-frame image generation.
    pub image: Arc<dyn ImageGenerator>,
    /// Clip video generation.
    pub video: Arc<dyn VideoGenerator>,
    /// Last-frame extraction for chaining.
    pub frames: Arc<dyn FrameExtractor>,
    /// Final concatenation.
    pub stitcher: Arc<dyn Stitcher>,
}

impl Capabilities {
    /// Assemble capabilities from explicit implementations.
    pub fn new(
        image: Arc<dyn ImageGenerator>,
        video: Arc<dyn VideoGenerator>,
        frames: Arc<dyn FrameExtractor>,
        stitcher: Arc<dyn Stitcher>,
    ) -> Self {
        Self {
            image,
            video,
            frames,
            stitcher,
        }
    }

    /// Build the production set: real provider clients plus ffmpeg.
    pub fn from_providers(
        film: &FilmSpec,
        keys: &ApiKeys,
        generation: &GenerationSettings,
    ) -> Result<Self, ProviderError> {
        Ok(Self {
            image: Arc::from(create_image_generator(keys, generation)?),
            video: Arc::from(create_video_generator(film.provider, keys, generation)?),
            frames: Arc::new(FfmpegFrameExtractor::new()),
            stitcher: Arc::new(FfmpegStitcher::new()),
        })
    }
}

/// Read-only context passed to pipeline steps.
///
/// Mutable progress lives in the checkpoint, which steps receive
/// separately and persist through [`Context::save_checkpoint`].
pub struct Context {
    /// The film being generated.
    pub film: FilmSpec,
    /// Application settings.
    pub settings: Settings,
    /// Job name/identifier.
    pub job_name: String,
    /// Directory all artifacts are written under.
    pub output_dir: PathBuf,
    /// Per-job logger.
    pub logger: Arc<JobLogger>,
    /// Checkpoint persistence for this job.
    pub store: CheckpointStore,
    /// External generation/media capabilities.
    pub capabilities: Capabilities,
    /// Retry policy for provider calls.
    pub retry: RetryPolicy,
    /// Cooperative cancellation flag.
    pub cancel: CancelHandle,
    /// Optional progress callback.
    progress_callback: Option<ProgressCallback>,
}

impl Context {
    /// Create a new context for a job.
    pub fn new(
        film: FilmSpec,
        settings: Settings,
        job_name: impl Into<String>,
        output_dir: PathBuf,
        logger: Arc<JobLogger>,
        capabilities: Capabilities,
        cancel: CancelHandle,
    ) -> Self {
        let retry = RetryPolicy::from_settings(&settings.retry);
        let store = CheckpointStore::new(&output_dir);
        Self {
            film,
            settings,
            job_name: job_name.into(),
            output_dir,
            logger,
            store,
            capabilities,
            retry,
            cancel,
            progress_callback: None,
        }
    }

    /// Set the progress callback.
    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Report progress to the callback (if set).
    pub fn report_progress(&self, step_name: &str, percent: u32, message: &str) {
        if let Some(ref callback) = self.progress_callback {
            callback(step_name, percent, message);
        }
    }

    /// Persist the checkpoint through the store.
    pub fn save_checkpoint(
        &self,
        checkpoint: &mut crate::state::Checkpoint,
    ) -> StepResult<()> {
        self.store.save(checkpoint).map_err(StepError::from)
    }

    /// Write an artifact durably: temp file, fsync, then rename.
    ///
    /// The checkpoint must never reference a partially-written file, so
    /// artifacts only appear at their final path once complete.
    pub fn write_artifact(&self, path: &Path, bytes: &[u8]) -> StepResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| StepError::io_error("creating artifact directory", e))?;
        }

        let temp_path = PathBuf::from(format!("{}.tmp", path.display()));
        {
            let mut file = fs::File::create(&temp_path)
                .map_err(|e| StepError::io_error("creating artifact temp file", e))?;
            file.write_all(bytes)
                .map_err(|e| StepError::io_error("writing artifact", e))?;
            file.sync_all()
                .map_err(|e| StepError::io_error("syncing artifact", e))?;
        }
        fs::rename(&temp_path, path)
            .map_err(|e| StepError::io_error("moving artifact into place", e))?;

        Ok(())
    }
}

/// Result of executing a pipeline step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// Step completed successfully.
    Success,
    /// Step had nothing to do (artifacts already present).
    Skipped(String),
}
