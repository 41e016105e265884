//! Starting frame step - generates the seed image for clip 1.

use crate::models::Stage;
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, StepOutcome};
use crate::providers::{create_image_prompt, style_hints};
use crate::state::Checkpoint;

/// Generates the starting frame through the image capability and records
/// it in the checkpoint.
pub struct StartingFrameStep;

impl StartingFrameStep {
    pub fn new() -> Self {
        Self
    }
}

impl Default for StartingFrameStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for StartingFrameStep {
    fn name(&self) -> &str {
        "StartingFrame"
    }

    fn description(&self) -> &str {
        "Generate the starting frame image"
    }

    fn validate_input(&self, _ctx: &Context, checkpoint: &Checkpoint) -> StepResult<()> {
        if checkpoint.clips.is_empty() {
            return Err(StepError::invalid_input("checkpoint has no clip records"));
        }
        Ok(())
    }

    fn execute(&self, ctx: &Context, checkpoint: &mut Checkpoint) -> StepResult<StepOutcome> {
        // Idempotence: an existing frame is never regenerated.
        if checkpoint.starting_frame_on_disk() {
            checkpoint.stage.advance_to(Stage::StartingFrameGenerated);
            return Ok(StepOutcome::Skipped(
                "starting frame already on disk".to_string(),
            ));
        }

        let prompt = create_image_prompt(&ctx.film.premise);
        let hints = style_hints(ctx.film.style);
        ctx.logger.info("Generating starting frame...");

        let image = ctx.capabilities.image.clone();
        let outcome = ctx
            .retry
            .execute(
                &ctx.cancel,
                || image.generate_image(&prompt, hints),
                |e| e.class(),
            )
            .map_err(StepError::image_generation)?;

        let path = ctx.output_dir.join("starting_frame.png");
        ctx.write_artifact(&path, &outcome.value)?;

        checkpoint.starting_frame = Some(path.clone());
        checkpoint.stage.advance_to(Stage::StartingFrameGenerated);
        ctx.save_checkpoint(checkpoint)?;

        ctx.logger.success(&format!(
            "Starting frame saved to {} ({} attempt(s))",
            path.display(),
            outcome.attempts
        ));
        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, checkpoint: &Checkpoint) -> StepResult<()> {
        if !checkpoint.starting_frame_on_disk() {
            return Err(StepError::invalid_output(
                "starting frame not recorded or missing on disk",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::testing::{test_context, test_context_with, CapabilitySet};
    use tempfile::tempdir;

    #[test]
    fn generates_and_records_the_frame() {
        let dir = tempdir().unwrap();
        let ctx = test_context(dir.path());
        let mut checkpoint = Checkpoint::new(ctx.film.clone(), dir.path());

        let step = StartingFrameStep::new();
        step.validate_input(&ctx, &checkpoint).unwrap();
        let outcome = step.execute(&ctx, &mut checkpoint).unwrap();

        assert_eq!(outcome, StepOutcome::Success);
        assert!(checkpoint.starting_frame_on_disk());
        assert_eq!(checkpoint.stage, Stage::StartingFrameGenerated);
        step.validate_output(&ctx, &checkpoint).unwrap();
    }

    #[test]
    fn existing_frame_is_not_regenerated() {
        let dir = tempdir().unwrap();
        let set = CapabilitySet::all_success();
        let ctx = test_context_with(dir.path(), &set);
        let mut checkpoint = Checkpoint::new(ctx.film.clone(), dir.path());

        let step = StartingFrameStep::new();
        step.execute(&ctx, &mut checkpoint).unwrap();
        assert_eq!(set.image.calls(), 1);

        let outcome = step.execute(&ctx, &mut checkpoint).unwrap();
        assert!(matches!(outcome, StepOutcome::Skipped(_)));
        assert_eq!(set.image.calls(), 1);
    }
}
