//! Clips step - generates every clip sequentially with frame chaining.
//!
//! Clip i+1 starts from the last frame of clip i, so clips can never run
//! in parallel and a failed clip blocks everything after it. The
//! checkpoint is saved after every clip completes; a crash loses at most
//! one clip's work.

use crate::models::{ClipStatus, Stage};
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, StepOutcome};
use crate::providers::create_video_prompt;
use crate::retry::RetryError;
use crate::state::Checkpoint;

/// Generates all pending clips in order through the video capability.
pub struct ClipsStep;

impl ClipsStep {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ClipsStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for ClipsStep {
    fn name(&self) -> &str {
        "Clips"
    }

    fn description(&self) -> &str {
        "Generate video clips with frame chaining"
    }

    fn validate_input(&self, _ctx: &Context, checkpoint: &Checkpoint) -> StepResult<()> {
        if !checkpoint.starting_frame_on_disk() {
            return Err(StepError::invalid_input(
                "starting frame missing; cannot seed clip 1",
            ));
        }
        Ok(())
    }

    fn execute(&self, ctx: &Context, checkpoint: &mut Checkpoint) -> StepResult<StepOutcome> {
        let total = checkpoint.clips.len();
        let mut generated = 0usize;
        let mut skipped = 0usize;

        for i in 0..total {
            if ctx.cancel.is_cancelled() {
                return Err(StepError::Cancelled);
            }

            // Idempotence: a done clip whose artifacts verify is skipped
            // without touching the provider.
            if checkpoint.clips[i].is_done() {
                if checkpoint.clips[i].artifacts_on_disk() {
                    ctx.logger
                        .debug(&format!("Clip {}/{} already generated, skipping", i + 1, total));
                    skipped += 1;
                    continue;
                }
                ctx.logger.warn(&format!(
                    "Clip {} is recorded done but its files are missing; regenerating",
                    i + 1
                ));
                checkpoint.clips[i].status = ClipStatus::Pending;
                checkpoint.clips[i].last_frame = None;
            }

            // Frame chaining: clip 1 starts from the starting frame, every
            // later clip from its predecessor's extracted last frame.
            let seed = if i == 0 {
                checkpoint
                    .starting_frame
                    .clone()
                    .ok_or_else(|| StepError::invalid_input("starting frame not recorded"))?
            } else {
                checkpoint.clips[i - 1].last_frame.clone().ok_or_else(|| {
                    StepError::invalid_input(format!(
                        "clip {} has no extracted last frame to seed clip {}",
                        i,
                        i + 1
                    ))
                })?
            };

            let prompt = if checkpoint.clips[i].prompt.is_empty() {
                create_video_prompt(&ctx.film.premise, i + 1, total)
            } else {
                checkpoint.clips[i].prompt.clone()
            };
            let duration = checkpoint.clips[i].duration_secs;

            {
                let clip = &mut checkpoint.clips[i];
                clip.prompt = prompt.clone();
                clip.seed_frame = Some(seed.clone());
                clip.status = ClipStatus::Generating;
                clip.error = None;
            }
            ctx.save_checkpoint(checkpoint)?;

            ctx.logger.info(&format!("Generating clip {}/{}...", i + 1, total));
            let percent = ((i as f64 / total as f64) * 100.0) as u32;
            ctx.report_progress(
                "Clips",
                percent,
                &format!("Generating clip {}/{}", i + 1, total),
            );
            ctx.logger.progress(percent);

            let video = ctx.capabilities.video.clone();
            let result = ctx.retry.execute(
                &ctx.cancel,
                || video.generate_clip(&prompt, Some(seed.as_path()), duration),
                |e| e.class(),
            );

            let outcome = match result {
                Ok(outcome) => outcome,
                Err(RetryError::Cancelled { .. }) => {
                    // Nothing durable was claimed for this clip; leave it
                    // pending for the next run.
                    checkpoint.clips[i].status = ClipStatus::Pending;
                    ctx.save_checkpoint(checkpoint)?;
                    return Err(StepError::Cancelled);
                }
                Err(error) => {
                    checkpoint.clips[i].attempts += error.attempts();
                    checkpoint.clips[i].status = ClipStatus::Failed;
                    checkpoint.clips[i].error = Some(error.to_string());
                    ctx.save_checkpoint(checkpoint)?;
                    ctx.logger
                        .error(&format!("Clip {}/{} failed: {}", i + 1, total, error));
                    return Err(StepError::clip_generation(i + 1, error));
                }
            };

            checkpoint.clips[i].attempts += outcome.attempts;
            ctx.write_artifact(&checkpoint.clips[i].video_path, &outcome.value)?;

            // Extract the chaining frame; the final clip seeds nothing.
            if i + 1 < total {
                let frame_path = checkpoint.clips[i].last_frame_path(&ctx.output_dir);
                if let Err(error) = ctx
                    .capabilities
                    .frames
                    .extract_last_frame(&checkpoint.clips[i].video_path, &frame_path)
                {
                    checkpoint.clips[i].status = ClipStatus::Failed;
                    checkpoint.clips[i].error = Some(error.to_string());
                    ctx.save_checkpoint(checkpoint)?;
                    ctx.logger.error(&format!(
                        "Clip {}/{}: last-frame extraction failed: {}",
                        i + 1,
                        total,
                        error
                    ));
                    ctx.logger.show_tail("ffmpeg");
                    return Err(StepError::Extraction(error));
                }
                checkpoint.clips[i].last_frame = Some(frame_path);
            }

            checkpoint.clips[i].status = ClipStatus::Done;
            checkpoint.stage.advance_to(Stage::ClipGenerated { index: i + 1 });
            // Primary durability point: everything this clip produced is
            // on disk before the checkpoint claims it.
            ctx.save_checkpoint(checkpoint)?;

            ctx.logger.success(&format!(
                "Clip {}/{} done ({} attempt(s))",
                i + 1,
                total,
                outcome.attempts
            ));
            generated += 1;
        }

        if generated == 0 && skipped == total {
            return Ok(StepOutcome::Skipped("all clips already generated".to_string()));
        }
        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, checkpoint: &Checkpoint) -> StepResult<()> {
        if !checkpoint.all_clips_done() {
            return Err(StepError::invalid_output("not every clip is done"));
        }
        for clip in &checkpoint.clips {
            if !clip.artifacts_on_disk() {
                return Err(StepError::invalid_output(format!(
                    "clip {} artifacts missing on disk",
                    clip.index
                )));
            }
        }
        Ok(())
    }
}
