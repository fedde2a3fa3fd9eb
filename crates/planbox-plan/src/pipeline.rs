//! The compile pipeline for one top-level build.
//!
//! Drives the phases in order: evaluate the script graph, assemble the
//! draft, run queued hooks against it, seal. The first failure aborts the
//! whole build; no partial plan escapes.

use std::path::{Path, PathBuf};

use planbox_common::env::EnvSource;
use planbox_common::error::Result;
use planbox_common::types::BuildPhase;
use planbox_script::eval;
use planbox_script::source::ScriptSource;

use crate::assemble;
use crate::plan::BuildPlan;

/// Compiles `reference` into a sealed build plan.
///
/// `context_override` replaces the default build context, which is the
/// top-level script's directory.
///
/// # Errors
///
/// Returns the first error raised in any phase.
pub fn compile(
    env: &EnvSource,
    source: &dyn ScriptSource,
    reference: &str,
    context_override: Option<&Path>,
) -> Result<BuildPlan> {
    tracing::debug!(phase = %BuildPhase::Idle, script = reference, "starting build plan compilation");
    match compile_inner(env, source, reference, context_override) {
        Ok(plan) => Ok(plan),
        Err(error) => {
            tracing::error!(phase = %BuildPhase::Failed, script = reference, %error, "build plan compilation failed");
            Err(error)
        }
    }
}

fn compile_inner(
    env: &EnvSource,
    source: &dyn ScriptSource,
    reference: &str,
    context_override: Option<&Path>,
) -> Result<BuildPlan> {
    tracing::debug!(phase = %BuildPhase::Evaluating, script = reference, "evaluating script graph");
    let evaluation = eval::evaluate(env, source, reference)?;

    tracing::debug!(phase = %BuildPhase::HooksPending, hooks = evaluation.hooks.len(), "assembling draft");
    let mut draft = assemble::assemble(&evaluation)?;

    tracing::debug!(phase = %BuildPhase::HooksRunning, "applying deferred hooks");
    evaluation.hooks.run_all(&mut draft);

    let context_dir = context_override.map_or_else(
        || default_context_dir(&evaluation.root.to_string()),
        Path::to_path_buf,
    );
    let plan = draft.seal(context_dir);
    tracing::info!(
        phase = %BuildPhase::PlanAssembled,
        script = %evaluation.root,
        steps = plan.steps.len(),
        flatten_points = plan.flatten_points.len(),
        "build plan assembled"
    );
    Ok(plan)
}

fn default_context_dir(root: &str) -> PathBuf {
    Path::new(root)
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
}
