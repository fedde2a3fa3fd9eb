//! The sealed build plan.

use std::fmt;
use std::path::PathBuf;

use planbox_common::error::Result;
use planbox_common::types::PlanDigest;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// One executable step of a build plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Step {
    /// Run a shell command inside the working container.
    Run {
        /// Shell command.
        command: String,
    },
    /// Stage a file or directory from the build context.
    Copy {
        /// Context-relative source path.
        source: String,
        /// In-image destination path.
        dest: String,
    },
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Run { command } => write!(f, "RUN {command}"),
            Self::Copy { source, dest } => write!(f, "COPY {source} -> {dest}"),
        }
    }
}

/// One entry of the final merged environment table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvAssignment {
    /// Variable name.
    pub name: String,
    /// Final value; path-list keys are already joined.
    pub value: String,
}

/// Deterministic, immutable description of one image build.
///
/// Plans carry no timestamps: compiling the same script graph against the
/// same environment snapshot yields a byte-identical manifest and digest.
/// A flatten point `p` means "squash layers after executing the first `p`
/// steps"; points are strictly increasing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildPlan {
    /// Base image the working container starts from.
    pub base_image: String,
    /// Ordered build steps.
    pub steps: Vec<Step>,
    /// Final environment table, in first-declaration order.
    pub env: Vec<EnvAssignment>,
    /// Startup command, if any was declared.
    pub entrypoint: Option<String>,
    /// Step indices after which layers are squashed.
    pub flatten_points: Vec<usize>,
    /// Directory `Copy` sources resolve against.
    pub context_dir: PathBuf,
}

impl BuildPlan {
    /// SHA-256 digest over the plan's canonical JSON manifest.
    ///
    /// # Errors
    ///
    /// Returns an error if the plan cannot be serialized.
    pub fn digest(&self) -> Result<PlanDigest> {
        let canonical = serde_json::to_vec(self)?;
        let mut hasher = Sha256::new();
        hasher.update(&canonical);
        let hex: String = hasher
            .finalize()
            .iter()
            .map(|byte| format!("{byte:02x}"))
            .collect();
        PlanDigest::from_hex(hex)
    }

    /// Pretty-printed JSON manifest.
    ///
    /// # Errors
    ///
    /// Returns an error if the plan cannot be serialized.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
