//! Pipeline runner that executes steps in sequence.

use super::errors::{PipelineError, PipelineResult};
use super::step::PipelineStep;
use super::types::{Context, StepOutcome};
use crate::state::Checkpoint;

/// Pipeline that runs a sequence of steps over one job's checkpoint.
///
/// Steps run strictly in order with validation before and after each.
/// Cancellation is checked at every step boundary; the checkpoint always
/// reflects the last durable point when the pipeline stops for any
/// reason.
pub struct Pipeline {
    /// Steps to execute in order.
    steps: Vec<Box<dyn PipelineStep>>,
}

impl Pipeline {
    /// Create a new empty pipeline.
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    /// Add a step (builder pattern).
    pub fn with_step<S: PipelineStep + 'static>(mut self, step: S) -> Self {
        self.steps.push(Box::new(step));
        self
    }

    /// Get the number of steps in the pipeline.
    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// Get step names in order.
    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    /// Run the pipeline, advancing the checkpoint to completion or to
    /// the first unrecoverable failure.
    ///
    /// On failure the checkpoint has already been saved at the failure
    /// point by the failing step; resuming later re-runs this pipeline
    /// and skips everything already durable.
    pub fn run(
        &self,
        ctx: &Context,
        checkpoint: &mut Checkpoint,
    ) -> PipelineResult<PipelineRunResult> {
        let mut result = PipelineRunResult {
            steps_completed: Vec::new(),
            steps_skipped: Vec::new(),
        };

        let total_steps = self.steps.len();

        for (i, step) in self.steps.iter().enumerate() {
            if ctx.cancel.is_cancelled() {
                ctx.logger.warn(&format!(
                    "Pipeline cancelled before step '{}'",
                    step.name()
                ));
                return Err(PipelineError::cancelled(&ctx.job_name));
            }

            let step_name = step.name();
            ctx.logger.phase(step_name);

            let percent = ((i as f64 / total_steps as f64) * 100.0) as u32;
            ctx.report_progress(step_name, percent, &format!("Starting {}", step_name));

            ctx.logger.debug(&format!("Validating input for '{}'", step_name));
            if let Err(e) = step.validate_input(ctx, checkpoint) {
                ctx.logger.error(&format!("Input validation failed: {}", e));
                return Err(PipelineError::step_failed(&ctx.job_name, step_name, e));
            }

            ctx.logger.debug(&format!("Executing '{}'", step_name));
            let outcome = match step.execute(ctx, checkpoint) {
                Ok(outcome) => outcome,
                Err(e) if e.is_cancelled() => {
                    ctx.logger.warn(&format!("Step '{}' cancelled", step_name));
                    return Err(PipelineError::cancelled(&ctx.job_name));
                }
                Err(e) => {
                    ctx.logger.error(&format!("Execution failed: {}", e));
                    return Err(PipelineError::step_failed(&ctx.job_name, step_name, e));
                }
            };

            // Stage transitions from this step (including ones recorded
            // on the skip path) become durable before the next step runs.
            if let Err(e) = ctx.save_checkpoint(checkpoint) {
                ctx.logger.error(&format!("Checkpoint save failed: {}", e));
                return Err(PipelineError::step_failed(&ctx.job_name, step_name, e));
            }

            match outcome {
                StepOutcome::Success => {
                    ctx.logger.debug(&format!("Validating output for '{}'", step_name));
                    if let Err(e) = step.validate_output(ctx, checkpoint) {
                        ctx.logger.error(&format!("Output validation failed: {}", e));
                        return Err(PipelineError::step_failed(&ctx.job_name, step_name, e));
                    }

                    ctx.logger.success(&format!("{} completed", step_name));
                    result.steps_completed.push(step_name.to_string());
                }
                StepOutcome::Skipped(reason) => {
                    ctx.logger.info(&format!("{} skipped: {}", step_name, reason));
                    result.steps_skipped.push(step_name.to_string());
                }
            }
        }

        ctx.report_progress("Complete", 100, "Pipeline finished");
        ctx.logger.success("Pipeline completed successfully");

        Ok(result)
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of a pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineRunResult {
    /// Steps that did work.
    pub steps_completed: Vec<String>,
    /// Steps that had nothing left to do.
    pub steps_skipped: Vec<String>,
}

impl PipelineRunResult {
    /// Total number of steps that ran.
    pub fn total_steps(&self) -> usize {
        self.steps_completed.len() + self.steps_skipped.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::errors::{StepError, StepResult};
    use crate::orchestrator::testing::test_context;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::tempdir;

    struct CountingStep {
        name: &'static str,
        execute_count: Arc<AtomicUsize>,
    }

    impl PipelineStep for CountingStep {
        fn name(&self) -> &str {
            self.name
        }

        fn validate_input(&self, _ctx: &Context, _cp: &Checkpoint) -> StepResult<()> {
            Ok(())
        }

        fn execute(&self, _ctx: &Context, _cp: &mut Checkpoint) -> StepResult<StepOutcome> {
            self.execute_count.fetch_add(1, Ordering::SeqCst);
            Ok(StepOutcome::Success)
        }

        fn validate_output(&self, _ctx: &Context, _cp: &Checkpoint) -> StepResult<()> {
            Ok(())
        }
    }

    struct FailingStep;

    impl PipelineStep for FailingStep {
        fn name(&self) -> &str {
            "Failing"
        }

        fn validate_input(&self, _ctx: &Context, _cp: &Checkpoint) -> StepResult<()> {
            Ok(())
        }

        fn execute(&self, _ctx: &Context, _cp: &mut Checkpoint) -> StepResult<StepOutcome> {
            Err(StepError::invalid_input("boom"))
        }

        fn validate_output(&self, _ctx: &Context, _cp: &Checkpoint) -> StepResult<()> {
            Ok(())
        }
    }

    #[test]
    fn pipeline_builds_correctly() {
        let pipeline = Pipeline::new()
            .with_step(CountingStep {
                name: "Step1",
                execute_count: Arc::new(AtomicUsize::new(0)),
            })
            .with_step(CountingStep {
                name: "Step2",
                execute_count: Arc::new(AtomicUsize::new(0)),
            });

        assert_eq!(pipeline.step_count(), 2);
        assert_eq!(pipeline.step_names(), vec!["Step1", "Step2"]);
    }

    #[test]
    fn runs_steps_in_order_and_saves_checkpoint() {
        let dir = tempdir().unwrap();
        let ctx = test_context(dir.path());
        let mut checkpoint = crate::state::Checkpoint::new(ctx.film.clone(), dir.path());

        let count = Arc::new(AtomicUsize::new(0));
        let pipeline = Pipeline::new().with_step(CountingStep {
            name: "Only",
            execute_count: count.clone(),
        });

        let result = pipeline.run(&ctx, &mut checkpoint).unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(result.steps_completed, vec!["Only"]);
        // The runner persisted the checkpoint after the step.
        assert!(ctx.store.exists());
    }

    #[test]
    fn failure_stops_later_steps() {
        let dir = tempdir().unwrap();
        let ctx = test_context(dir.path());
        let mut checkpoint = crate::state::Checkpoint::new(ctx.film.clone(), dir.path());

        let count = Arc::new(AtomicUsize::new(0));
        let pipeline = Pipeline::new().with_step(FailingStep).with_step(CountingStep {
            name: "Never",
            execute_count: count.clone(),
        });

        let result = pipeline.run(&ctx, &mut checkpoint);
        assert!(matches!(
            result,
            Err(PipelineError::StepFailed { ref step_name, .. }) if step_name == "Failing"
        ));
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn cancellation_stops_before_the_next_step() {
        let dir = tempdir().unwrap();
        let ctx = test_context(dir.path());
        let mut checkpoint = crate::state::Checkpoint::new(ctx.film.clone(), dir.path());

        ctx.cancel.cancel();

        let count = Arc::new(AtomicUsize::new(0));
        let pipeline = Pipeline::new().with_step(CountingStep {
            name: "Never",
            execute_count: count.clone(),
        });

        let result = pipeline.run(&ctx, &mut checkpoint);
        assert!(matches!(result, Err(PipelineError::Cancelled { .. })));
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }
}
