//! Driving a sealed plan through an external builder.

use planbox_common::constants::WORK_CONTAINER_PREFIX;
use planbox_common::error::{PlanboxError, Result};
use planbox_common::types::{BuildId, BuildPhase};
use planbox_plan::plan::{BuildPlan, Step};

use crate::builder::ImageBuilder;
use crate::cancel::CancelToken;

/// Summary of one completed build.
#[derive(Debug, Clone)]
pub struct BuildOutcome {
    /// Identity of the build; also names its working container.
    pub build_id: BuildId,
    /// Tag the image was committed under.
    pub tag: String,
    /// Steps executed.
    pub steps_executed: usize,
    /// Flatten points applied.
    pub flattens: usize,
}

/// Sequences a plan's operations against an [`ImageBuilder`].
///
/// A failed or cancelled build removes its working container before the
/// error surfaces; the committed image only exists on full success. The
/// cancel flag is checked between operations, and the builder kills any
/// in-flight process itself.
pub struct BuildDriver<'a> {
    builder: &'a dyn ImageBuilder,
    cancel: CancelToken,
}

impl<'a> BuildDriver<'a> {
    /// Creates a driver over a builder.
    #[must_use]
    pub fn new(builder: &'a dyn ImageBuilder, cancel: CancelToken) -> Self {
        Self { builder, cancel }
    }

    /// Executes a plan and commits the image under `tag`.
    ///
    /// # Errors
    ///
    /// Returns the first failure: a builder error, a step exiting
    /// non-zero, or `Cancelled`.
    pub fn execute(&self, plan: &BuildPlan, tag: &str) -> Result<BuildOutcome> {
        let build_id = BuildId::generate();
        let container = format!("{WORK_CONTAINER_PREFIX}-{build_id}");
        tracing::info!(build = %build_id, container = %container, tag, "starting build");

        match self.run_plan(&container, plan, tag) {
            Ok((steps_executed, flattens)) => {
                tracing::info!(phase = %BuildPhase::Done, build = %build_id, tag, "build complete");
                Ok(BuildOutcome {
                    build_id,
                    tag: tag.to_owned(),
                    steps_executed,
                    flattens,
                })
            }
            Err(error) => {
                tracing::error!(phase = %BuildPhase::Failed, build = %build_id, %error, "build failed");
                let _ = self.builder.destroy(&container);
                Err(error)
            }
        }
    }

    fn run_plan(&self, container: &str, plan: &BuildPlan, tag: &str) -> Result<(usize, usize)> {
        eprintln!("  Creating working container from '{}'...", plan.base_image);
        self.builder.create(container, &plan.base_image)?;
        if !plan.env.is_empty() {
            self.builder.apply_env(container, &plan.env)?;
        }

        let total = plan.steps.len();
        let mut steps_executed = 0usize;
        let mut flattens = 0usize;
        for boundary in 0..=total {
            if plan.flatten_points.contains(&boundary) {
                self.check_cancel()?;
                eprintln!("  Flattening layers...");
                tracing::info!(boundary, "flattening layers");
                self.builder.flatten(container, flattens)?;
                flattens += 1;
            }
            if let Some(step) = plan.steps.get(boundary) {
                self.check_cancel()?;
                eprintln!("  [{}/{total}] {step}", boundary + 1);
                tracing::info!(index = boundary, step = %step, "executing step");
                match step {
                    Step::Run { command } => self.builder.run(container, command)?,
                    Step::Copy { source, dest } => {
                        let staged = plan.context_dir.join(source);
                        self.builder
                            .copy(container, &staged.display().to_string(), dest)?;
                    }
                }
                steps_executed += 1;
            }
        }

        if let Some(entrypoint) = &plan.entrypoint {
            self.builder.set_entrypoint(container, entrypoint)?;
        }
        eprintln!("  Committing '{tag}'...");
        self.builder.commit(container, tag)?;
        Ok((steps_executed, flattens))
    }

    fn check_cancel(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(PlanboxError::Cancelled);
        }
        Ok(())
    }
}
