//! Static analysis and validation of the parsed AST.
//!
//! Checks statement placement and argument shape before evaluation:
//! `FLATTEN` only inside `AFTER`, `AFTER` only at top level, hook bodies
//! restricted to tail-appending statements, no empty arguments.

use planbox_common::error::{PlanboxError, Result};

use super::ast::{Condition, ScriptFile, Statement, ValueDecl};

#[derive(Clone, Copy, Default)]
struct Placement {
    in_after: bool,
    in_guard: bool,
}

/// Validates a parsed script for structural correctness.
///
/// # Checks performed
///
/// 1. `FLATTEN` appears only inside `AFTER` bodies.
/// 2. `AFTER` appears only at script top level and does not nest.
/// 3. `AFTER` bodies contain only `RUN`, `FLATTEN`, and guards.
/// 4. No directive argument is empty.
///
/// # Errors
///
/// Returns an error if any structural check fails.
pub fn validate(script: &str, file: &ScriptFile) -> Result<()> {
    tracing::debug!(script, "validating build script");
    check_placement(script, &file.statements, Placement::default())?;
    check_arguments(script, &file.statements)?;
    Ok(())
}

fn placement_err(script: &str, message: impl Into<String>) -> PlanboxError {
    PlanboxError::Parse {
        script: script.to_owned(),
        message: message.into(),
    }
}

fn check_placement(script: &str, statements: &[Statement], at: Placement) -> Result<()> {
    for stmt in statements {
        match stmt {
            Statement::Flatten if !at.in_after => {
                return Err(placement_err(
                    script,
                    "FLATTEN is only valid inside AFTER blocks",
                ));
            }
            Statement::After { .. } if at.in_after => {
                return Err(placement_err(script, "AFTER blocks do not nest"));
            }
            Statement::After { .. } if at.in_guard => {
                return Err(placement_err(
                    script,
                    "AFTER must appear at script top level, not inside a guard",
                ));
            }
            Statement::After { body } => {
                check_placement(
                    script,
                    body,
                    Placement {
                        in_after: true,
                        in_guard: false,
                    },
                )?;
            }
            Statement::Guard { body, .. } => {
                check_placement(
                    script,
                    body,
                    Placement {
                        in_guard: true,
                        ..at
                    },
                )?;
            }
            Statement::From { .. }
            | Statement::Copy { .. }
            | Statement::Env { .. }
            | Statement::Entrypoint { .. }
            | Statement::Include { .. }
            | Statement::Let { .. }
                if at.in_after =>
            {
                return Err(placement_err(
                    script,
                    format!("{} is not permitted inside AFTER blocks", stmt.keyword()),
                ));
            }
            _ => {}
        }
    }
    Ok(())
}

fn check_arguments(script: &str, statements: &[Statement]) -> Result<()> {
    for stmt in statements {
        match stmt {
            Statement::From { image } => require_nonempty(script, "FROM", image)?,
            Statement::Run { command } => require_nonempty(script, "RUN", command)?,
            Statement::Copy { source, dest } => {
                require_nonempty(script, "COPY source", source)?;
                require_nonempty(script, "COPY destination", dest)?;
            }
            Statement::Entrypoint { command } => {
                require_nonempty(script, "ENTRYPOINT", command)?;
            }
            Statement::Include { path } => require_nonempty(script, "INCLUDE", path)?,
            Statement::Env { entries } => {
                for entry in entries {
                    if let ValueDecl::List(items) = &entry.value {
                        for item in items {
                            require_nonempty(script, "ENV list item", item)?;
                        }
                    }
                }
            }
            Statement::After { body } => check_arguments(script, body)?,
            Statement::Guard {
                condition, body, ..
            } => {
                if let Condition::EnvSet(name) = condition {
                    require_nonempty(script, "ENV condition", name)?;
                }
                check_arguments(script, body)?;
            }
            Statement::Let { .. } | Statement::Flatten => {}
        }
    }
    Ok(())
}

fn require_nonempty(script: &str, what: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(placement_err(script, format!("{what} argument is empty")));
    }
    Ok(())
}
