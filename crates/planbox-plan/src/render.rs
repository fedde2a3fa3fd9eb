//! Rendering a plan as external-builder invocations.
//!
//! The argument helpers here are the single source of truth for builder
//! command lines: the executor feeds them to the real binary, and the CLI
//! prints them as the shell-invocable form of a plan.

use std::fmt;

use crate::plan::{BuildPlan, EnvAssignment, Step};

/// One external-builder invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Builder program name or path.
    pub program: String,
    /// Arguments in order.
    pub args: Vec<String>,
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            if arg.chars().any(char::is_whitespace) {
                write!(f, " '{arg}'")?;
            } else {
                write!(f, " {arg}")?;
            }
        }
        Ok(())
    }
}

/// Arguments to create the working container from the base image.
#[must_use]
pub fn from_args(container: &str, base_image: &str) -> Vec<String> {
    vec![
        "from".into(),
        "--name".into(),
        container.into(),
        base_image.into(),
    ]
}

/// Arguments to apply the final environment table.
#[must_use]
pub fn config_env_args(container: &str, env: &[EnvAssignment]) -> Vec<String> {
    let mut args = vec!["config".to_owned()];
    for assignment in env {
        args.push("--env".into());
        args.push(format!("{}={}", assignment.name, assignment.value));
    }
    args.push(container.into());
    args
}

/// Arguments to run one shell step.
#[must_use]
pub fn run_args(container: &str, command: &str) -> Vec<String> {
    vec![
        "run".into(),
        container.into(),
        "--".into(),
        "sh".into(),
        "-c".into(),
        command.into(),
    ]
}

/// Arguments to stage one context file.
#[must_use]
pub fn copy_args(container: &str, source: &str, dest: &str) -> Vec<String> {
    vec!["copy".into(), container.into(), source.into(), dest.into()]
}

/// Arguments to squash-commit the working container to an image.
#[must_use]
pub fn squash_commit_args(container: &str, image: &str) -> Vec<String> {
    vec![
        "commit".into(),
        "--rm".into(),
        "--squash".into(),
        container.into(),
        image.into(),
    ]
}

/// Arguments to set the image entrypoint.
#[must_use]
pub fn config_entrypoint_args(container: &str, entrypoint: &str) -> Vec<String> {
    vec![
        "config".into(),
        "--entrypoint".into(),
        entrypoint.into(),
        container.into(),
    ]
}

/// Arguments to commit the working container under its final tag.
#[must_use]
pub fn commit_args(container: &str, tag: &str) -> Vec<String> {
    vec!["commit".into(), "--rm".into(), container.into(), tag.into()]
}

/// Arguments to remove the working container without committing.
#[must_use]
pub fn rm_args(container: &str) -> Vec<String> {
    vec!["rm".into(), container.into()]
}

/// Name of the intermediate image produced by the `ordinal`-th flatten.
#[must_use]
pub fn squash_image_name(container: &str, ordinal: usize) -> String {
    format!("{container}-squash-{ordinal}")
}

/// Renders the full invocation stream for a plan.
///
/// Flattening squash-commits the working container and recreates it from
/// the squashed image, so each flatten point contributes two invocations.
#[must_use]
pub fn render(plan: &BuildPlan, builder: &str, container: &str, tag: &str) -> Vec<Invocation> {
    let invoke = |args: Vec<String>| Invocation {
        program: builder.to_owned(),
        args,
    };

    let mut stream = Vec::new();
    stream.push(invoke(from_args(container, &plan.base_image)));
    if !plan.env.is_empty() {
        stream.push(invoke(config_env_args(container, &plan.env)));
    }

    let mut flattens = 0usize;
    for boundary in 0..=plan.steps.len() {
        if plan.flatten_points.contains(&boundary) {
            let squashed = squash_image_name(container, flattens);
            flattens += 1;
            stream.push(invoke(squash_commit_args(container, &squashed)));
            stream.push(invoke(from_args(container, &squashed)));
        }
        if let Some(step) = plan.steps.get(boundary) {
            stream.push(invoke(match step {
                Step::Run { command } => run_args(container, command),
                Step::Copy { source, dest } => copy_args(container, source, dest),
            }));
        }
    }

    if let Some(entrypoint) = &plan.entrypoint {
        stream.push(invoke(config_entrypoint_args(container, entrypoint)));
    }
    stream.push(invoke(commit_args(container, tag)));
    stream
}
