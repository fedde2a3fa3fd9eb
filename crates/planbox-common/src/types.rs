//! Domain primitive types used across the Planbox workspace.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Identity of one build script or shared fragment.
///
/// The inclusion guard keys on this, so two paths naming the same file must
/// compare equal. Loaders canonicalize filesystem paths before constructing
/// one; in-memory sources use their logical names as-is.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScriptId(PathBuf);

impl ScriptId {
    /// Creates a script identity from an already-canonical path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    /// Returns the identity as a path.
    #[must_use]
    pub fn as_path(&self) -> &Path {
        &self.0
    }
}

impl fmt::Display for ScriptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

/// Unique identifier for one top-level build.
///
/// Names the working container handed to the external builder and tags
/// every log line the build emits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BuildId(String);

impl BuildId {
    /// Creates a build ID from a string value.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a random build ID.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Returns the inner string representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BuildId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// SHA-256 digest identifying a sealed build plan.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlanDigest(String);

impl PlanDigest {
    /// Creates a digest from a hex-encoded string.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not a valid 64-character hex string.
    pub fn from_hex(hex: impl Into<String>) -> crate::error::Result<Self> {
        let hex = hex.into();
        if hex.len() != crate::constants::SHA256_HEX_LENGTH
            || !hex.chars().all(|c| c.is_ascii_hexdigit())
        {
            return Err(crate::error::PlanboxError::Config {
                message: format!("invalid SHA-256 hex string: {hex}"),
            });
        }
        Ok(Self(hex))
    }

    /// Returns the hex-encoded digest string.
    #[must_use]
    pub fn as_hex(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlanDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sha256:{}", self.0)
    }
}

/// Lifecycle phase of one top-level build.
///
/// Phases advance strictly forward; `Failed` is reachable from any of them
/// and carries only the first error raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuildPhase {
    /// No evaluation has started yet.
    Idle,
    /// The script graph is being evaluated, includes in place.
    Evaluating,
    /// Evaluation finished; queued hooks have not run.
    HooksPending,
    /// Queued hooks are running against the draft plan.
    HooksRunning,
    /// The plan is sealed and ready for execution or emission.
    PlanAssembled,
    /// All requested work completed.
    Done,
    /// The build aborted on its first error.
    Failed,
}

impl fmt::Display for BuildPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Evaluating => write!(f, "evaluating"),
            Self::HooksPending => write!(f, "hooks-pending"),
            Self::HooksRunning => write!(f, "hooks-running"),
            Self::PlanAssembled => write!(f, "plan-assembled"),
            Self::Done => write!(f, "done"),
            Self::Failed => write!(f, "failed"),
        }
    }
}
