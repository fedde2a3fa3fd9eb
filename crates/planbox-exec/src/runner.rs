//! External process running with cancellation.

use std::path::Path;
use std::process::Command;
use std::time::Duration;

use planbox_common::error::{PlanboxError, Result};

use crate::cancel::CancelToken;

/// Interval between exit-status polls of an in-flight process.
const POLL_INTERVAL_MS: u64 = 50;

/// Runs one external command to completion.
///
/// The child inherits stdout and stderr so builder output streams to the
/// user. The exit status is polled so a raised cancel flag kills the
/// in-flight process instead of waiting it out.
///
/// # Errors
///
/// Returns `StepExecution` when the command exits non-zero (signal-killed
/// processes report status `-1`), `Cancelled` when the flag was raised,
/// or `Io` when the process cannot be spawned or queried.
pub fn run(program: &Path, args: &[String], cancel: &CancelToken) -> Result<()> {
    let command = command_line(program, args);
    tracing::debug!(command = %command, "running builder invocation");

    let mut child = Command::new(program)
        .args(args)
        .spawn()
        .map_err(|source| PlanboxError::Io {
            path: program.to_path_buf(),
            source,
        })?;

    loop {
        if cancel.is_cancelled() {
            let _ = child.kill();
            let _ = child.wait();
            tracing::info!(command = %command, "invocation killed on cancellation");
            return Err(PlanboxError::Cancelled);
        }

        match child.try_wait() {
            Ok(Some(status)) => {
                if status.success() {
                    return Ok(());
                }
                return Err(PlanboxError::StepExecution {
                    command,
                    status: status.code().unwrap_or(-1),
                });
            }
            Ok(None) => std::thread::sleep(Duration::from_millis(POLL_INTERVAL_MS)),
            Err(source) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(PlanboxError::Io {
                    path: program.to_path_buf(),
                    source,
                });
            }
        }
    }
}

/// Shell-readable form of an invocation, used in errors and logs.
#[must_use]
pub fn command_line(program: &Path, args: &[String]) -> String {
    let mut line = program.display().to_string();
    for arg in args {
        line.push(' ');
        if arg.chars().any(char::is_whitespace) {
            line.push('\'');
            line.push_str(arg);
            line.push('\'');
        } else {
            line.push_str(arg);
        }
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn successful_command_returns_ok() {
        let cancel = CancelToken::new();
        run(Path::new("true"), &[], &cancel).expect("true should succeed");
    }

    #[test]
    fn failing_command_reports_its_status() {
        let cancel = CancelToken::new();
        let err = run(
            Path::new("sh"),
            &args(&["-c", "exit 3"]),
            &cancel,
        )
        .expect_err("exit 3 should fail");
        let PlanboxError::StepExecution { command, status } = err else {
            panic!("expected StepExecution, got: {err}");
        };
        assert_eq!(status, 3);
        assert!(command.starts_with("sh"), "got: {command}");
    }

    #[test]
    fn missing_program_is_an_io_error() {
        let cancel = CancelToken::new();
        let err = run(Path::new("/nonexistent/planbox-builder"), &[], &cancel)
            .expect_err("missing binary should fail");
        assert!(matches!(err, PlanboxError::Io { .. }), "got: {err}");
    }

    #[test]
    fn run_returns_only_after_the_child_finishes() {
        let dir = tempfile::tempdir().expect("tempdir");
        let marker = dir.path().join("done");
        let script = format!("sleep 0.2 && echo ok > '{}'", marker.display());
        let cancel = CancelToken::new();
        run(Path::new("sh"), &args(&["-c", &script]), &cancel).expect("command should succeed");

        let content = std::fs::read_to_string(&marker).expect("marker should exist");
        assert_eq!(content.trim(), "ok");
    }

    #[test]
    fn pre_raised_flag_kills_the_command() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let err = run(Path::new("sleep"), &args(&["30"]), &cancel)
            .expect_err("cancelled run should fail");
        assert!(matches!(err, PlanboxError::Cancelled), "got: {err}");
    }

    #[test]
    fn command_line_quotes_whitespace_arguments() {
        let line = command_line(
            &PathBuf::from("buildah"),
            &args(&["run", "work", "--", "sh", "-c", "apt-get update"]),
        );
        assert_eq!(line, "buildah run work -- sh -c 'apt-get update'");
    }
}
