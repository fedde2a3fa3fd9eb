//! Formatted output helpers for CLI commands.
//!
//! Provides the section framing, colored status markers, and the
//! human-readable plan rendering shared by commands.

use planbox_common::constants::DEFAULT_BUILDER_BIN;
use planbox_common::types::PlanDigest;
use planbox_plan::plan::BuildPlan;
use planbox_plan::render;

/// ANSI bold.
pub const BOLD: &str = "\x1b[1m";
/// ANSI dim.
pub const DIM: &str = "\x1b[2m";
/// ANSI green.
pub const GREEN: &str = "\x1b[32m";
/// ANSI reset.
pub const RESET: &str = "\x1b[0m";

/// Horizontal double-rule under section headings.
#[must_use]
pub fn section_bar() -> String {
    "\u{2550}".repeat(35)
}

/// Renders the human-readable form of a plan.
///
/// The invocation stream at the end shows the exact builder command
/// lines a `pbx build` of this plan would run, with a placeholder
/// working-container name and tag.
#[must_use]
pub fn render_plan_text(script: &str, plan: &BuildPlan, digest: &PlanDigest) -> String {
    use std::fmt::Write as _;

    let mut out = String::new();
    let _ = writeln!(out, "Build Plan for: {script}");
    let _ = writeln!(out, "{}", section_bar());
    let _ = writeln!(out);
    let _ = writeln!(out, "  from: {}", plan.base_image);
    let _ = writeln!(out, "  context: {}", plan.context_dir.display());

    if !plan.env.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "  env:");
        for assignment in &plan.env {
            let _ = writeln!(out, "    {}={}", assignment.name, assignment.value);
        }
    }

    if !plan.steps.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "  steps:");
        for (index, step) in plan.steps.iter().enumerate() {
            let _ = writeln!(out, "    {}. {step}", index + 1);
        }
    }

    if !plan.flatten_points.is_empty() {
        let points: Vec<String> = plan
            .flatten_points
            .iter()
            .map(ToString::to_string)
            .collect();
        let _ = writeln!(out);
        let _ = writeln!(out, "  flatten after step(s): {}", points.join(", "));
    }

    if let Some(entrypoint) = &plan.entrypoint {
        let _ = writeln!(out);
        let _ = writeln!(out, "  entrypoint: {entrypoint}");
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "  digest: {digest}");

    let _ = writeln!(out);
    let _ = writeln!(out, "  invocations:");
    for invocation in render::render(plan, DEFAULT_BUILDER_BIN, "work", "<tag>") {
        let _ = writeln!(out, "    {invocation}");
    }
    out
}
