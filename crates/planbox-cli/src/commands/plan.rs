//! `pbx plan` — Compile a .pbx script and display its plan without executing.

use std::path::PathBuf;

use clap::{Args, ValueEnum};
use planbox_common::env::EnvSource;
use planbox_plan::pipeline;
use planbox_script::source::FsSource;

use crate::output;

/// Plan emission formats.
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum PlanFormat {
    /// Human-readable plan with the builder invocation stream.
    #[default]
    Text,
    /// Canonical JSON manifest (the digest input).
    Json,
    /// YAML manifest.
    Yaml,
}

/// Arguments for the `plan` command.
#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Path to the .pbx build script.
    pub script: String,

    /// Emission format.
    #[arg(long, value_enum, default_value_t = PlanFormat::Text)]
    pub format: PlanFormat,

    /// Write the plan to a file instead of stdout.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Build context directory (defaults to the script's directory).
    #[arg(long)]
    pub context: Option<PathBuf>,
}

/// Executes the `plan` command.
///
/// Compiles the script against the current environment snapshot and
/// emits the sealed plan plus its digest. Nothing is executed.
///
/// # Errors
///
/// Returns an error if compilation, serialization, or the output write
/// fails.
pub fn execute(args: PlanArgs) -> anyhow::Result<()> {
    tracing::info!(script = %args.script, "compiling plan");
    let env = EnvSource::from_process();
    let plan = pipeline::compile(&env, &FsSource::new(), &args.script, args.context.as_deref())?;
    let digest = plan.digest()?;

    let rendered = match args.format {
        PlanFormat::Text => output::render_plan_text(&args.script, &plan, &digest),
        PlanFormat::Json => plan.to_json()?,
        PlanFormat::Yaml => serde_yaml::to_string(&plan)?,
    };

    match &args.output {
        Some(path) => {
            std::fs::write(path, &rendered)?;
            eprintln!("  Plan written to {}", path.display());
        }
        None => println!("{rendered}"),
    }

    // The manifest formats carry no digest field; surface it separately.
    if !matches!(args.format, PlanFormat::Text) {
        eprintln!("  digest: {digest}");
    }
    Ok(())
}
