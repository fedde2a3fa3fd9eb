//! External image-builder abstraction.

use std::path::PathBuf;

use planbox_common::constants::DEFAULT_BUILDER_BIN;
use planbox_common::error::{PlanboxError, Result};
use planbox_plan::plan::EnvAssignment;
use planbox_plan::render;

use crate::cancel::CancelToken;
use crate::runner;

/// Builder-side operations a plan's execution needs.
///
/// Implementors handle the mechanics of one working container: creation
/// from a base image, step application, layer squashing, and teardown.
/// The driver sequences calls; it never constructs builder command lines
/// itself.
pub trait ImageBuilder: Send + Sync {
    /// Creates the working container from a base image.
    ///
    /// # Errors
    ///
    /// Returns an error if the container cannot be created.
    fn create(&self, container: &str, base_image: &str) -> Result<()>;

    /// Applies the final environment table to the working container.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails.
    fn apply_env(&self, container: &str, env: &[EnvAssignment]) -> Result<()>;

    /// Runs one shell command inside the working container.
    ///
    /// # Errors
    ///
    /// Returns an error if the command cannot be started or exits non-zero.
    fn run(&self, container: &str, command: &str) -> Result<()>;

    /// Stages a file or directory into the working container.
    ///
    /// # Errors
    ///
    /// Returns an error if the copy fails.
    fn copy(&self, container: &str, source: &str, dest: &str) -> Result<()>;

    /// Squashes the container's layers and recreates it from the result.
    ///
    /// `ordinal` numbers the flatten within the build, so intermediate
    /// image names stay unique.
    ///
    /// # Errors
    ///
    /// Returns an error if the squash commit or the recreate fails.
    fn flatten(&self, container: &str, ordinal: usize) -> Result<()>;

    /// Sets the image entrypoint on the working container.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails.
    fn set_entrypoint(&self, container: &str, entrypoint: &str) -> Result<()>;

    /// Commits the working container under its final tag and removes it.
    ///
    /// # Errors
    ///
    /// Returns an error if the commit fails.
    fn commit(&self, container: &str, tag: &str) -> Result<()>;

    /// Removes the working container without committing.
    ///
    /// # Errors
    ///
    /// Returns an error if removal fails.
    fn destroy(&self, container: &str) -> Result<()>;
}

/// Builder backed by a `buildah`-compatible binary.
///
/// Each trait operation maps to one invocation built from the argument
/// helpers in [`planbox_plan::render`], so the executed command lines and
/// the ones `pbx plan` prints stay identical.
#[derive(Debug)]
pub struct BuildahBuilder {
    program: PathBuf,
    cancel: CancelToken,
}

impl BuildahBuilder {
    /// Locates the builder binary and constructs the builder.
    ///
    /// `binary` overrides the default `buildah`; it may be a bare name
    /// resolved on `PATH` or an explicit path.
    ///
    /// # Errors
    ///
    /// Returns an error if the binary cannot be found.
    pub fn discover(binary: Option<&str>, cancel: CancelToken) -> Result<Self> {
        let name = binary.unwrap_or(DEFAULT_BUILDER_BIN);
        let program = which::which(name).map_err(|_| {
            let install_hint = if cfg!(target_os = "macos") {
                "Install with: brew install buildah"
            } else {
                "Install with: apt install buildah"
            };
            PlanboxError::Config {
                message: format!("builder binary '{name}' not found — {install_hint}"),
            }
        })?;
        tracing::debug!(program = %program.display(), "builder binary located");
        Ok(Self { program, cancel })
    }

    /// Constructs the builder around an explicit binary path, skipping
    /// `PATH` lookup.
    #[must_use]
    pub const fn with_program(program: PathBuf, cancel: CancelToken) -> Self {
        Self { program, cancel }
    }

    fn invoke(&self, args: Vec<String>) -> Result<()> {
        runner::run(&self.program, &args, &self.cancel)
    }
}

impl ImageBuilder for BuildahBuilder {
    fn create(&self, container: &str, base_image: &str) -> Result<()> {
        self.invoke(render::from_args(container, base_image))
    }

    fn apply_env(&self, container: &str, env: &[EnvAssignment]) -> Result<()> {
        self.invoke(render::config_env_args(container, env))
    }

    fn run(&self, container: &str, command: &str) -> Result<()> {
        self.invoke(render::run_args(container, command))
    }

    fn copy(&self, container: &str, source: &str, dest: &str) -> Result<()> {
        self.invoke(render::copy_args(container, source, dest))
    }

    fn flatten(&self, container: &str, ordinal: usize) -> Result<()> {
        let squashed = render::squash_image_name(container, ordinal);
        self.invoke(render::squash_commit_args(container, &squashed))?;
        self.invoke(render::from_args(container, &squashed))
    }

    fn set_entrypoint(&self, container: &str, entrypoint: &str) -> Result<()> {
        self.invoke(render::config_entrypoint_args(container, entrypoint))
    }

    fn commit(&self, container: &str, tag: &str) -> Result<()> {
        self.invoke(render::commit_args(container, tag))
    }

    fn destroy(&self, container: &str) -> Result<()> {
        self.invoke(render::rm_args(container))
    }
}
