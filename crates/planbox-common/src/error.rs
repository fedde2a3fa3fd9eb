//! Unified error types for the Planbox workspace.
//!
//! Every failure is fatal to the build that raised it: the first error wins,
//! nothing is retried, and no partial plan is ever handed out.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum PlanboxError {
    /// An I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path where the I/O error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A build script could not be parsed.
    #[error("parse error in {script}: {message}")]
    Parse {
        /// Script in which the error was found.
        script: String,
        /// Description of the offending input.
        message: String,
    },

    /// A build declared steps without ever declaring a base image.
    #[error("{script} declares no base image")]
    MissingBaseImage {
        /// Top-level script of the offending build.
        script: String,
    },

    /// A singleton directive was declared more than once with diverging values.
    #[error("conflicting {directive} in {script}: {message}")]
    ConflictingDirective {
        /// Script in which the conflict surfaced.
        script: String,
        /// Directive keyword that conflicted.
        directive: &'static str,
        /// Both values involved in the conflict.
        message: String,
    },

    /// A `${NAME:?}` interpolation resolved to nothing.
    #[error("{script} requires variable {name} to be set and non-empty")]
    MissingRequiredVariable {
        /// Script that demanded the variable.
        script: String,
        /// Name of the missing variable.
        name: String,
    },

    /// An `INCLUDE` referenced a fragment that does not exist.
    #[error("{script} includes missing fragment {path}")]
    MissingInclude {
        /// Script containing the reference.
        script: String,
        /// Fragment path that could not be loaded.
        path: PathBuf,
    },

    /// An external build step exited unsuccessfully.
    #[error("step `{command}` failed with exit status {status}")]
    StepExecution {
        /// Command of the failing step.
        command: String,
        /// Exit status reported by the external builder.
        status: i32,
    },

    /// The build was cancelled before it could complete.
    #[error("build cancelled")]
    Cancelled,

    /// A configuration value is invalid.
    #[error("invalid configuration: {message}")]
    Config {
        /// Description of the invalid configuration.
        message: String,
    },

    /// Serialization or deserialization failed.
    #[error("serialization error: {source}")]
    Serialization {
        /// Underlying serialization error.
        #[from]
        source: serde_json::Error,
    },
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, PlanboxError>;
