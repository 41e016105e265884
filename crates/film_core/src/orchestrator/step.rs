//! Pipeline step trait definition.

use super::errors::StepResult;
use super::types::{Context, StepOutcome};
use crate::state::Checkpoint;

/// Trait for pipeline steps.
///
/// The pipeline runner calls these methods in order:
///
/// 1. `validate_input` - check preconditions against the checkpoint
/// 2. `execute` - perform the step's work, persisting progress
/// 3. `validate_output` - verify the step produced valid artifacts
///
/// Steps must be idempotent: when the checkpoint already records this
/// step's artifacts and they exist on disk, `execute` returns
/// [`StepOutcome::Skipped`] without calling any external capability.
pub trait PipelineStep: Send + Sync {
    /// Get the step name (for logging and error context).
    fn name(&self) -> &str;

    /// Validate preconditions before execution.
    fn validate_input(&self, ctx: &Context, checkpoint: &Checkpoint) -> StepResult<()>;

    /// Execute the step's work, recording progress in the checkpoint.
    ///
    /// Durable sub-steps save the checkpoint through
    /// [`Context::save_checkpoint`] as they complete, always after the
    /// artifact they describe is on disk.
    fn execute(&self, ctx: &Context, checkpoint: &mut Checkpoint) -> StepResult<StepOutcome>;

    /// Validate outputs after execution.
    fn validate_output(&self, ctx: &Context, checkpoint: &Checkpoint) -> StepResult<()>;

    /// Human-readable description of what this step does.
    fn description(&self) -> &str {
        self.name()
    }
}
