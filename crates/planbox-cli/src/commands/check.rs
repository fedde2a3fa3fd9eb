//! `pbx check` — Parse and evaluate .pbx scripts without executing.

use clap::Args;
use planbox_common::env::EnvSource;
use planbox_plan::pipeline;
use planbox_script::source::FsSource;

/// Arguments for the `check` command.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Paths to .pbx build scripts.
    #[arg(required = true)]
    pub scripts: Vec<String>,
}

/// Executes the `check` command.
///
/// Runs the full compile pipeline for each script, so guard violations,
/// unresolvable variables, and conflicting directives surface exactly as
/// a build would see them. No builder is invoked.
///
/// # Errors
///
/// Returns an error if any script fails to compile.
pub fn execute(args: CheckArgs) -> anyhow::Result<()> {
    let env = EnvSource::from_process();
    let source = FsSource::new();

    let mut failures = 0usize;
    for script in &args.scripts {
        match pipeline::compile(&env, &source, script, None) {
            Ok(plan) => {
                let digest = plan.digest()?;
                println!("  ok   {script} ({} step(s), {digest})", plan.steps.len());
            }
            Err(error) => {
                failures += 1;
                eprintln!("  err  {script}: {error}");
            }
        }
    }

    if failures > 0 {
        anyhow::bail!(
            "{failures} of {} script(s) failed validation",
            args.scripts.len()
        );
    }
    Ok(())
}
