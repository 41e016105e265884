//! Job orchestrator - the public entry point for starting and resuming
//! film generation jobs.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use crate::cancel::CancelHandle;
use crate::config::Settings;
use crate::logging::{JobLogger, LogCallback, LogConfig};
use crate::models::FilmSpec;
use crate::state::{Checkpoint, CheckpointStore, StateError};

use super::errors::PipelineError;
use super::pipeline::Pipeline;
use super::steps::{ClipsStep, StartingFrameStep, StitchStep};
use super::types::{Capabilities, Context, ProgressCallback};

/// Orchestrator-level, user-facing errors.
#[derive(Error, Debug)]
pub enum GeneratorError {
    /// Starting would overwrite an existing job's checkpoint.
    #[error(
        "a checkpoint already exists at {}; resume the job instead of starting over",
        path.display()
    )]
    AlreadyExists { path: PathBuf },

    /// Resume was requested but there is no checkpoint.
    #[error("nothing to resume: no checkpoint under {}", dir.display())]
    NothingToResume { dir: PathBuf },

    /// Creating directories or the job logger failed.
    #[error("job setup failed: {message}")]
    Setup { message: String },

    /// Checkpoint load/save failure (corrupt file, version mismatch, I/O).
    #[error(transparent)]
    State(#[from] StateError),
}

/// How a pipeline run ended.
#[derive(Debug)]
pub enum RunOutcome {
    /// The film is finished.
    Completed { film: PathBuf },
    /// The pipeline halted; the checkpoint records the failure point and
    /// the job can be resumed after the cause is addressed.
    Halted { error: PipelineError },
}

/// Result of one start/resume call: the final checkpoint plus outcome.
#[derive(Debug)]
pub struct FilmRun {
    /// Checkpoint at completion or at the failure point.
    pub checkpoint: Checkpoint,
    /// What happened.
    pub outcome: RunOutcome,
}

impl FilmRun {
    /// Whether the film was completed.
    pub fn succeeded(&self) -> bool {
        matches!(self.outcome, RunOutcome::Completed { .. })
    }
}

/// Coordinates one job: owns its output directory, checkpoint store,
/// logger, and capabilities, and drives the pipeline.
pub struct FilmGenerator {
    output_dir: PathBuf,
    job_name: String,
    settings: Settings,
    capabilities: Capabilities,
    store: CheckpointStore,
    logger: Arc<JobLogger>,
    cancel: CancelHandle,
    progress_callback: Option<ProgressCallback>,
}

impl FilmGenerator {
    /// Create a generator for the job owning `output_dir`.
    ///
    /// Creates the output and log directories. The log callback (if any)
    /// receives every job log line, for console rendering.
    pub fn new(
        output_dir: impl Into<PathBuf>,
        settings: Settings,
        capabilities: Capabilities,
        log_callback: Option<LogCallback>,
    ) -> Result<Self, GeneratorError> {
        let output_dir = output_dir.into();

        fs::create_dir_all(&output_dir).map_err(|e| GeneratorError::Setup {
            message: format!("cannot create output directory {}: {}", output_dir.display(), e),
        })?;

        let job_name = output_dir
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "film".to_string());

        let log_dir = output_dir.join(&settings.paths.logs_folder);
        let logger = JobLogger::new(
            &job_name,
            &log_dir,
            LogConfig::from_settings(&settings.logging),
            log_callback,
        )
        .map_err(|e| GeneratorError::Setup {
            message: format!("cannot create job logger under {}: {}", log_dir.display(), e),
        })?;

        Ok(Self {
            store: CheckpointStore::new(&output_dir),
            output_dir,
            job_name,
            settings,
            capabilities,
            logger: Arc::new(logger),
            cancel: CancelHandle::new(),
            progress_callback: None,
        })
    }

    /// Set the progress callback.
    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Handle for cancelling this job from another thread.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Path of this job's checkpoint file.
    pub fn state_path(&self) -> &std::path::Path {
        self.store.state_path()
    }

    /// Start a new job.
    ///
    /// Fails with [`GeneratorError::AlreadyExists`] when a checkpoint is
    /// already present, so paid-for work is never silently overwritten.
    pub fn start(&self, film: FilmSpec) -> Result<FilmRun, GeneratorError> {
        if self.store.exists() {
            return Err(GeneratorError::AlreadyExists {
                path: self.store.state_path().to_path_buf(),
            });
        }

        let mut checkpoint = Checkpoint::new(film, self.output_dir.clone());
        self.store.save(&mut checkpoint)?;

        self.log_job_summary(&checkpoint.film, false);
        self.run(checkpoint)
    }

    /// Resume the job recorded in the checkpoint.
    ///
    /// Fails with [`GeneratorError::NothingToResume`] when no checkpoint
    /// exists; corrupt or newer-version checkpoints surface as
    /// [`GeneratorError::State`] and are never silently replaced.
    pub fn resume(&self) -> Result<FilmRun, GeneratorError> {
        if !self.store.exists() {
            return Err(GeneratorError::NothingToResume {
                dir: self.output_dir.clone(),
            });
        }

        let checkpoint = self.store.load()?;
        self.log_job_summary(&checkpoint.film, true);
        self.logger.info(&format!(
            "Resuming from saved checkpoint (stage: {}, clips done: {}/{})",
            checkpoint.stage,
            checkpoint.clips_done(),
            checkpoint.clips.len()
        ));

        self.run(checkpoint)
    }

    /// Remove this job's checkpoint. Explicit action only; nothing in
    /// the pipeline ever destroys a checkpoint implicitly.
    pub fn clear(&self) -> Result<(), GeneratorError> {
        self.store.clear().map_err(GeneratorError::from)
    }

    /// Drive the pipeline from the checkpoint's current stage.
    fn run(&self, mut checkpoint: Checkpoint) -> Result<FilmRun, GeneratorError> {
        let mut ctx = Context::new(
            checkpoint.film.clone(),
            self.settings.clone(),
            self.job_name.clone(),
            self.output_dir.clone(),
            self.logger.clone(),
            self.capabilities.clone(),
            self.cancel.clone(),
        );
        if let Some(ref callback) = self.progress_callback {
            ctx = ctx.with_progress_callback(callback.clone());
        }

        let pipeline = Pipeline::new()
            .with_step(StartingFrameStep::new())
            .with_step(ClipsStep::new())
            .with_step(StitchStep::new());

        match pipeline.run(&ctx, &mut checkpoint) {
            Ok(_) => {
                let film = checkpoint.final_film.clone().ok_or_else(|| {
                    GeneratorError::Setup {
                        message: "pipeline finished without recording a film path".to_string(),
                    }
                })?;
                Ok(FilmRun {
                    checkpoint,
                    outcome: RunOutcome::Completed { film },
                })
            }
            Err(error) => {
                self.logger.error(&error.to_string());
                self.logger
                    .info("Progress is saved; re-run with resume to continue from this point.");
                Ok(FilmRun {
                    checkpoint,
                    outcome: RunOutcome::Halted { error },
                })
            }
        }
    }

    /// Log the job header the way the front end shows it.
    fn log_job_summary(&self, film: &FilmSpec, resuming: bool) {
        self.logger
            .phase(if resuming { "Resuming film generation" } else { "Film generation" });
        self.logger.info(&format!("Premise: {}", film.premise));
        self.logger.info(&format!("Style: {}", film.style));
        self.logger
            .info(&format!("Music vibe: {} (metadata only)", film.music_vibe));
        self.logger.info(&format!("Provider: {}", film.provider));
        self.logger.info(&format!(
            "Duration: {}s in {} clips of {}s",
            film.target_duration_secs,
            film.clip_count(),
            film.clip_duration_secs
        ));
    }
}
