//! CLI command definitions and dispatch.

pub mod build;
pub mod check;
pub mod plan;

use clap::{Parser, Subcommand};

/// Planbox — declarative image-build planning.
#[derive(Parser, Debug)]
#[command(name = "pbx", version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compile .pbx scripts and execute the resulting plans.
    Build(build::BuildArgs),
    /// Compile a .pbx script and display its plan without executing.
    Plan(plan::PlanArgs),
    /// Parse and evaluate .pbx scripts without executing.
    Check(check::CheckArgs),
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn execute(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Build(args) => build::execute(args),
        Command::Plan(args) => plan::execute(args),
        Command::Check(args) => check::execute(args),
    }
}
