//! At-most-once inclusion tracking.

use std::collections::HashSet;

use planbox_common::types::ScriptId;

/// Tracks which scripts have already been applied within one top-level
/// build.
///
/// Each build owns its own guard; state never crosses build boundaries.
/// Marking the top-level script first also makes self-inclusion and
/// mutual-inclusion cycles degrade to no-ops.
#[derive(Debug, Default)]
pub struct InclusionGuard {
    seen: HashSet<ScriptId>,
}

impl InclusionGuard {
    /// Creates a guard with no scripts marked.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns whether `id` should be applied, marking it as seen.
    ///
    /// True exactly once per identity; every later call for the same
    /// identity returns false.
    pub fn should_apply(&mut self, id: &ScriptId) -> bool {
        self.seen.insert(id.clone())
    }
}
