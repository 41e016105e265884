//! Error types for the generation pipeline.
//!
//! Errors carry context that chains through layers:
//! Job → Step → Operation → Detail

use std::io;

use thiserror::Error;

use crate::media::{ExtractionError, StitchError};
use crate::providers::ProviderError;
use crate::retry::RetryError;
use crate::state::StateError;

/// Top-level pipeline error with job context.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A step failed during execution.
    #[error("Job '{job_name}' failed at step '{step_name}': {source}")]
    StepFailed {
        job_name: String,
        step_name: String,
        #[source]
        source: StepError,
    },

    /// Pipeline was cancelled; the checkpoint holds the last saved state.
    #[error("Job '{job_name}' was cancelled")]
    Cancelled { job_name: String },
}

impl PipelineError {
    /// Create a step failed error.
    pub fn step_failed(
        job_name: impl Into<String>,
        step_name: impl Into<String>,
        source: StepError,
    ) -> Self {
        Self::StepFailed {
            job_name: job_name.into(),
            step_name: step_name.into(),
            source,
        }
    }

    /// Create a cancelled error.
    pub fn cancelled(job_name: impl Into<String>) -> Self {
        Self::Cancelled {
            job_name: job_name.into(),
        }
    }
}

/// Error from a pipeline step with operation context.
#[derive(Error, Debug)]
pub enum StepError {
    /// Input validation failed.
    #[error("Input validation failed: {0}")]
    InvalidInput(String),

    /// Output validation failed.
    #[error("Output validation failed: {0}")]
    InvalidOutput(String),

    /// Starting-frame generation gave up.
    #[error("image generation failed after {attempts} attempt(s): {source}")]
    ImageGeneration {
        attempts: u32,
        #[source]
        source: ProviderError,
    },

    /// Video generation for one clip gave up.
    #[error("video generation for clip {clip} failed after {attempts} attempt(s): {source}")]
    ClipGeneration {
        clip: usize,
        attempts: u32,
        #[source]
        source: ProviderError,
    },

    /// Last-frame extraction failed; the chain cannot continue.
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    /// Stitching the final film failed.
    #[error(transparent)]
    Stitch(#[from] StitchError),

    /// Checkpoint persistence failed.
    #[error("checkpoint error: {0}")]
    State(#[from] StateError),

    /// File I/O error with operation context.
    #[error("I/O error in {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: io::Error,
    },

    /// The step observed a cancellation request and stopped.
    #[error("step cancelled")]
    Cancelled,
}

impl StepError {
    /// Create an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Create an invalid output error.
    pub fn invalid_output(message: impl Into<String>) -> Self {
        Self::InvalidOutput(message.into())
    }

    /// Create an I/O error with context.
    pub fn io_error(operation: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            source,
        }
    }

    /// Convert a terminal retry failure from image generation.
    pub fn image_generation(error: RetryError<ProviderError>) -> Self {
        match error {
            RetryError::Cancelled { .. } => Self::Cancelled,
            RetryError::Permanent { attempts, source }
            | RetryError::Exhausted { attempts, source } => {
                Self::ImageGeneration { attempts, source }
            }
        }
    }

    /// Convert a terminal retry failure from clip generation.
    pub fn clip_generation(clip: usize, error: RetryError<ProviderError>) -> Self {
        match error {
            RetryError::Cancelled { .. } => Self::Cancelled,
            RetryError::Permanent { attempts, source }
            | RetryError::Exhausted { attempts, source } => Self::ClipGeneration {
                clip,
                attempts,
                source,
            },
        }
    }

    /// Whether this error is a cancellation rather than a failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Result type for step operations.
pub type StepResult<T> = Result<T, StepError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_error_displays_clip_context() {
        let err = StepError::ClipGeneration {
            clip: 3,
            attempts: 5,
            source: ProviderError::RateLimited {
                provider: "openai",
                message: "too many requests".into(),
            },
        };
        let msg = err.to_string();
        assert!(msg.contains("clip 3"));
        assert!(msg.contains("5 attempt(s)"));
    }

    #[test]
    fn pipeline_error_chains_context() {
        let step_err = StepError::invalid_input("no starting frame");
        let pipeline_err = PipelineError::step_failed("mars_film", "Clips", step_err);

        let msg = pipeline_err.to_string();
        assert!(msg.contains("mars_film"));
        assert!(msg.contains("Clips"));
    }

    #[test]
    fn cancelled_retry_becomes_cancelled_step() {
        let err = StepError::clip_generation(
            2,
            RetryError::<ProviderError>::Cancelled { attempts: 1 },
        );
        assert!(err.is_cancelled());
    }
}
