//! Plan assembly.
//!
//! Concatenates an evaluation's directives in traversal order, merges the
//! environment, and enforces the singleton rules. The result is a draft
//! that queued hooks append to before it is sealed.

use std::path::PathBuf;

use planbox_common::error::{PlanboxError, Result};
use planbox_script::hooks::HookTarget;
use planbox_script::model::{Directive, Evaluation, Origin};

use crate::envmerge::EnvTable;
use crate::plan::{BuildPlan, Step};

/// Mutable plan under construction.
///
/// Hooks may only append: they reach the draft through [`HookTarget`],
/// which exposes no way to touch existing steps.
#[derive(Debug)]
pub struct PlanDraft {
    base_image: String,
    steps: Vec<Step>,
    env: EnvTable,
    entrypoint: Option<String>,
    flatten_points: Vec<usize>,
}

impl PlanDraft {
    /// Number of steps currently in the draft.
    #[must_use]
    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    fn push_flatten_at_tail(&mut self) {
        let point = self.steps.len();
        if self.flatten_points.last() != Some(&point) {
            self.flatten_points.push(point);
        }
    }

    /// Seals the draft into an immutable plan.
    #[must_use]
    pub fn seal(self, context_dir: PathBuf) -> BuildPlan {
        BuildPlan {
            base_image: self.base_image,
            steps: self.steps,
            env: self.env.finalize(),
            entrypoint: self.entrypoint,
            flatten_points: self.flatten_points,
            context_dir,
        }
    }
}

impl HookTarget for PlanDraft {
    fn append_run(&mut self, command: String) {
        self.steps.push(Step::Run { command });
    }

    fn mark_flatten(&mut self) {
        self.push_flatten_at_tail();
    }
}

fn conflict(
    directive: &'static str,
    existing: &str,
    existing_origin: &Origin,
    incoming: &str,
    incoming_origin: &Origin,
) -> PlanboxError {
    PlanboxError::ConflictingDirective {
        script: incoming_origin.script.to_string(),
        directive,
        message: format!(
            "\"{existing}\" at {existing_origin} conflicts with \"{incoming}\" at {incoming_origin}"
        ),
    }
}

/// Assembles an evaluation into a plan draft.
///
/// # Errors
///
/// Returns an error when no base image was declared, when a second `FROM`
/// appears, or when two `ENTRYPOINT` declarations disagree.
pub fn assemble(evaluation: &Evaluation) -> Result<PlanDraft> {
    tracing::debug!(script = %evaluation.root, directives = evaluation.directives.len(), "assembling plan draft");

    let mut base: Option<(String, Origin)> = None;
    let mut entrypoint: Option<(String, Origin)> = None;
    let mut steps = Vec::new();
    let mut env = EnvTable::new();

    for record in &evaluation.directives {
        match &record.directive {
            Directive::From { image } => {
                if let Some((existing, origin)) = &base {
                    return Err(conflict("FROM", existing, origin, image, &record.origin));
                }
                base = Some((image.clone(), record.origin.clone()));
            }
            Directive::Run { command } => steps.push(Step::Run {
                command: command.clone(),
            }),
            Directive::Copy { source, dest } => steps.push(Step::Copy {
                source: source.clone(),
                dest: dest.clone(),
            }),
            Directive::Env { entries } => {
                for entry in entries {
                    env.apply(entry);
                }
            }
            Directive::Entrypoint { command } => {
                match &entrypoint {
                    Some((existing, origin)) if existing != command => {
                        return Err(conflict(
                            "ENTRYPOINT",
                            existing,
                            origin,
                            command,
                            &record.origin,
                        ));
                    }
                    // An identical redeclaration is a no-op.
                    Some(_) => {}
                    None => entrypoint = Some((command.clone(), record.origin.clone())),
                }
            }
        }
    }

    let Some((base_image, _)) = base else {
        return Err(PlanboxError::MissingBaseImage {
            script: evaluation.root.to_string(),
        });
    };

    Ok(PlanDraft {
        base_image,
        steps,
        env,
        entrypoint: entrypoint.map(|(command, _)| command),
        flatten_points: Vec::new(),
    })
}
