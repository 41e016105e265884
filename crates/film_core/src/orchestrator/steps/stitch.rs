//! Stitch step - concatenates all clips into the final film.

use crate::models::{file_non_empty, Stage};
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, StepOutcome};
use crate::state::Checkpoint;

/// Concatenates the ordered clip videos and marks the job complete.
pub struct StitchStep;

impl StitchStep {
    pub fn new() -> Self {
        Self
    }
}

impl Default for StitchStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for StitchStep {
    fn name(&self) -> &str {
        "Stitch"
    }

    fn description(&self) -> &str {
        "Concatenate clips into the final film"
    }

    fn validate_input(&self, _ctx: &Context, checkpoint: &Checkpoint) -> StepResult<()> {
        if !checkpoint.all_clips_done() {
            return Err(StepError::invalid_input(format!(
                "only {}/{} clips are done",
                checkpoint.clips_done(),
                checkpoint.clips.len()
            )));
        }
        Ok(())
    }

    fn execute(&self, ctx: &Context, checkpoint: &mut Checkpoint) -> StepResult<StepOutcome> {
        // Idempotence: an existing film is never re-stitched.
        if checkpoint
            .final_film
            .as_deref()
            .map(file_non_empty)
            .unwrap_or(false)
        {
            checkpoint.stage.advance_to(Stage::Complete);
            return Ok(StepOutcome::Skipped("final film already on disk".to_string()));
        }

        let clip_paths = checkpoint.clip_video_paths();
        let output = ctx.output_dir.join("final_film.mp4");

        ctx.logger
            .info(&format!("Stitching {} clips...", clip_paths.len()));

        let film_path = ctx
            .capabilities
            .stitcher
            .concatenate(&clip_paths, &output)
            .map_err(|error| {
                ctx.logger
                    .error(&format!("Stitching failed: {}", error));
                ctx.logger.show_tail("ffmpeg");
                StepError::Stitch(error)
            })?;

        checkpoint.final_film = Some(film_path.clone());
        checkpoint.stage.advance_to(Stage::Stitched);
        ctx.save_checkpoint(checkpoint)?;

        // Terminal transition; no further external calls.
        checkpoint.stage.advance_to(Stage::Complete);
        ctx.save_checkpoint(checkpoint)?;

        ctx.logger
            .success(&format!("Final film saved to {}", film_path.display()));
        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, checkpoint: &Checkpoint) -> StepResult<()> {
        let on_disk = checkpoint
            .final_film
            .as_deref()
            .map(file_non_empty)
            .unwrap_or(false);
        if !on_disk {
            return Err(StepError::invalid_output(
                "final film not recorded or missing on disk",
            ));
        }
        if !checkpoint.is_complete() {
            return Err(StepError::invalid_output("job not marked complete"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::steps::{ClipsStep, StartingFrameStep};
    use crate::orchestrator::testing::{test_context_with, CapabilitySet};
    use tempfile::tempdir;

    fn checkpoint_with_all_clips(ctx: &Context) -> Checkpoint {
        let mut checkpoint = Checkpoint::new(ctx.film.clone(), &ctx.output_dir);
        StartingFrameStep::new()
            .execute(ctx, &mut checkpoint)
            .unwrap();
        ClipsStep::new().execute(ctx, &mut checkpoint).unwrap();
        checkpoint
    }

    #[test]
    fn stitches_and_completes() {
        let dir = tempdir().unwrap();
        let set = CapabilitySet::all_success();
        let ctx = test_context_with(dir.path(), &set);
        let mut checkpoint = checkpoint_with_all_clips(&ctx);

        let step = StitchStep::new();
        step.validate_input(&ctx, &checkpoint).unwrap();
        let outcome = step.execute(&ctx, &mut checkpoint).unwrap();

        assert_eq!(outcome, StepOutcome::Success);
        assert!(checkpoint.is_complete());
        assert!(checkpoint.final_film.is_some());
        step.validate_output(&ctx, &checkpoint).unwrap();
    }

    #[test]
    fn refuses_to_stitch_with_pending_clips() {
        let dir = tempdir().unwrap();
        let set = CapabilitySet::all_success();
        let ctx = test_context_with(dir.path(), &set);
        let checkpoint = Checkpoint::new(ctx.film.clone(), &ctx.output_dir);

        let step = StitchStep::new();
        assert!(step.validate_input(&ctx, &checkpoint).is_err());
    }

    #[test]
    fn existing_film_is_not_restitched() {
        let dir = tempdir().unwrap();
        let set = CapabilitySet::all_success();
        let ctx = test_context_with(dir.path(), &set);
        let mut checkpoint = checkpoint_with_all_clips(&ctx);

        let step = StitchStep::new();
        step.execute(&ctx, &mut checkpoint).unwrap();
        assert_eq!(set.stitcher.calls(), 1);

        let outcome = step.execute(&ctx, &mut checkpoint).unwrap();
        assert!(matches!(outcome, StepOutcome::Skipped(_)));
        assert_eq!(set.stitcher.calls(), 1);
    }
}
