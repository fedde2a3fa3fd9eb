//! System-wide constants and defaults.

/// Application name used in CLI output and emitted manifests.
pub const APP_NAME: &str = "planbox";

/// Binary name for the CLI.
pub const BIN_NAME: &str = "pbx";

/// File extension for Planbox build scripts.
pub const SCRIPT_EXTENSION: &str = ".pbx";

/// Separator used when joining path-list environment values.
pub const PATH_LIST_SEPARATOR: &str = ":";

/// Separator used when a list-valued binding interpolates into a string.
pub const WORD_LIST_SEPARATOR: &str = " ";

/// Maximum depth of nested `INCLUDE` evaluation.
///
/// Direct and mutual re-inclusion are absorbed by the inclusion guard; this
/// bounds chains of distinct fragments.
pub const MAX_INCLUDE_DEPTH: usize = 64;

/// Default external builder binary, looked up on `PATH`.
pub const DEFAULT_BUILDER_BIN: &str = "buildah";

/// Image tag applied when the caller does not request one.
pub const DEFAULT_IMAGE_TAG: &str = "planbox-build:latest";

/// Prefix for working-container names handed to the external builder.
pub const WORK_CONTAINER_PREFIX: &str = "planbox-work";

/// SHA-256 digest length in hex characters.
pub const SHA256_HEX_LENGTH: usize = 64;
