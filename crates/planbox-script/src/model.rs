//! Fully resolved directive model produced by evaluation.
//!
//! Everything here is post-interpolation: strings are final values, guard
//! conditions have already been applied, and hook bodies have been reduced
//! to action lists.

use std::fmt;

use planbox_common::types::ScriptId;
use serde::{Deserialize, Serialize};

use crate::hooks::HookQueue;

/// A single evaluated build directive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Directive {
    /// Base-image declaration; at most one may survive per build.
    From {
        /// Resolved image reference.
        image: String,
    },
    /// Shell build step.
    Run {
        /// Resolved shell command.
        command: String,
    },
    /// Context-file staging step.
    Copy {
        /// Resolved context-relative source.
        source: String,
        /// Resolved in-image destination.
        dest: String,
    },
    /// Environment declaration.
    Env {
        /// Resolved entries in declaration order.
        entries: Vec<EnvEntry>,
    },
    /// Startup-command declaration; at most one effective value per build.
    Entrypoint {
        /// Resolved startup command.
        command: String,
    },
}

impl Directive {
    /// Keyword of this directive as written in scripts.
    #[must_use]
    pub const fn keyword(&self) -> &'static str {
        match self {
            Self::From { .. } => "FROM",
            Self::Run { .. } => "RUN",
            Self::Copy { .. } => "COPY",
            Self::Env { .. } => "ENV",
            Self::Entrypoint { .. } => "ENTRYPOINT",
        }
    }
}

/// One resolved entry of an `ENV` declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvEntry {
    /// Variable name.
    pub name: String,
    /// Resolved value.
    pub value: EnvValue,
}

/// Resolved value of an environment entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnvValue {
    /// Plain value; a later declaration of the same name replaces it.
    Scalar(String),
    /// Search-path segments; later declarations of the same name extend it.
    PathList(Vec<String>),
}

/// Where an evaluated directive came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Origin {
    /// Script that declared the directive.
    pub script: ScriptId,
    /// Zero-based directive ordinal within that script.
    pub index: usize,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.script, self.index)
    }
}

/// A directive together with its provenance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectiveRecord {
    /// The evaluated directive.
    pub directive: Directive,
    /// Declaration site, for error context.
    pub origin: Origin,
}

/// Result of evaluating one top-level script graph.
///
/// Directives appear in depth-first traversal order: an included fragment's
/// directives land at the position of its `INCLUDE` statement. Hooks are
/// queued in the same traversal order and have not yet been applied.
#[derive(Debug, Clone)]
pub struct Evaluation {
    /// Identity of the top-level script.
    pub root: ScriptId,
    /// Ordered, fully resolved directives of the whole graph.
    pub directives: Vec<DirectiveRecord>,
    /// Hooks queued during evaluation, in registration order.
    pub hooks: HookQueue,
}
