//! `pbx build` — Compile .pbx scripts and execute the resulting plans.

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use planbox_common::config::BuildOptions;
use planbox_common::constants::DEFAULT_IMAGE_TAG;
use planbox_common::env::EnvSource;
use planbox_common::error::Result;
use planbox_exec::builder::BuildahBuilder;
use planbox_exec::cancel::CancelToken;
use planbox_exec::driver::{BuildDriver, BuildOutcome};
use planbox_plan::pipeline;
use planbox_script::source::FsSource;

use crate::output::{BOLD, DIM, GREEN, RESET};

/// Arguments for the `build` command.
#[derive(Args, Debug)]
pub struct BuildArgs {
    /// Paths to .pbx build scripts.
    #[arg(required = true)]
    pub scripts: Vec<String>,

    /// Tag for the committed image (single script only; defaults to the
    /// script name).
    #[arg(short, long)]
    pub tag: Option<String>,

    /// Build context directory (defaults to each script's directory).
    #[arg(long)]
    pub context: Option<PathBuf>,

    /// Builder binary to invoke.
    #[arg(long)]
    pub builder: Option<String>,
}

/// Executes the `build` command.
///
/// Scripts compile and build concurrently, each against its own plan;
/// the environment snapshot and the builder are shared. Ctrl+C raises
/// the cancel flag and the in-flight step is killed.
///
/// # Errors
///
/// Returns an error if any script fails to compile or build.
pub fn execute(args: BuildArgs) -> anyhow::Result<()> {
    if args.tag.is_some() && args.scripts.len() > 1 {
        anyhow::bail!("--tag applies to a single script; omit it to tag each image by script name");
    }
    for script in &args.scripts {
        if !Path::new(script).exists() {
            anyhow::bail!(
                "Build script not found: {script}\n\
                 Create a .pbx file or specify a path: pbx build <script>"
            );
        }
    }

    tracing::info!(scripts = args.scripts.len(), "starting builds");
    let started = Instant::now();
    print_header();

    let options = BuildOptions {
        builder: args.builder,
        context: args.context,
        tag: args.tag,
    };

    let cancel = CancelToken::new();
    let handler = cancel.clone();
    ctrlc::set_handler(move || handler.cancel())
        .map_err(|e| anyhow::anyhow!("failed to set Ctrl+C handler: {e}"))?;

    let env = EnvSource::from_process();
    let source = FsSource::new();
    let builder = BuildahBuilder::discover(options.builder.as_deref(), cancel.clone())?;
    let driver = BuildDriver::new(&builder, cancel);

    let outcomes = run_builds(&args.scripts, &options, &env, &source, &driver)?;

    eprintln!();
    eprintln!(
        "  {GREEN}{BOLD}Built {}{RESET} image(s) in {:.1}s:",
        outcomes.len(),
        started.elapsed().as_secs_f64()
    );
    eprintln!();
    for outcome in &outcomes {
        eprintln!(
            "    {GREEN}●{RESET} {BOLD}{}{RESET} {DIM}[{}]{RESET} ({} step(s), {} flatten(s))",
            outcome.tag, outcome.build_id, outcome.steps_executed, outcome.flattens
        );
    }
    Ok(())
}

fn print_header() {
    eprintln!();
    eprintln!(
        "  {BOLD}Planbox{RESET} {DIM}v{}{RESET}",
        env!("CARGO_PKG_VERSION")
    );
    eprintln!();
}

/// Runs every requested build on its own scoped thread.
fn run_builds(
    scripts: &[String],
    options: &BuildOptions,
    env: &EnvSource,
    source: &FsSource,
    driver: &BuildDriver<'_>,
) -> anyhow::Result<Vec<BuildOutcome>> {
    let context = options.context.as_deref();

    std::thread::scope(|scope| {
        let handles: Vec<_> = scripts
            .iter()
            .map(|script| {
                let tag = tag_for(script, options.tag.as_deref());
                let handle = scope.spawn(move || -> Result<BuildOutcome> {
                    let plan = pipeline::compile(env, source, script, context)?;
                    driver.execute(&plan, &tag)
                });
                (script, handle)
            })
            .collect();

        let mut outcomes = Vec::new();
        let mut failures = 0usize;
        for (script, handle) in handles {
            match handle.join() {
                Ok(Ok(outcome)) => outcomes.push(outcome),
                Ok(Err(error)) => {
                    failures += 1;
                    eprintln!("  Build failed for '{script}': {error}");
                }
                Err(_) => {
                    failures += 1;
                    eprintln!("  Build thread for '{script}' panicked");
                }
            }
        }

        if failures > 0 {
            anyhow::bail!("{failures} of {} build(s) failed", scripts.len());
        }
        Ok(outcomes)
    })
}

/// Tag for one script: the explicit `--tag`, else `<stem>:latest`.
fn tag_for(script: &str, explicit: Option<&str>) -> String {
    explicit.map_or_else(
        || {
            Path::new(script).file_stem().map_or_else(
                || DEFAULT_IMAGE_TAG.to_owned(),
                |stem| format!("{}:latest", stem.to_string_lossy()),
            )
        },
        str::to_owned,
    )
}
