//! Deferred hook scheduling.
//!
//! `AFTER` bodies are resolved during evaluation into plain values: an
//! ordered list of actions with every variable reference already expanded
//! and every guard already applied. The queue preserves registration
//! order, which is the depth-first traversal order of the script graph,
//! and runs only once the whole graph has been evaluated.

use planbox_common::types::ScriptId;

/// One resolved action of a hook body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookAction {
    /// Append a shell step at the current plan tail.
    Run {
        /// Resolved shell command.
        command: String,
    },
    /// Record a flatten marker at the current plan tail.
    Flatten,
}

/// A resolved hook: where it came from and what it appends.
///
/// A hook with no actions is permitted and has no effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hook {
    /// Script whose `AFTER` block produced this hook.
    pub origin: ScriptId,
    /// Actions in body order.
    pub actions: Vec<HookAction>,
}

/// Sink for hook actions; implemented by the plan draft.
///
/// Hooks only ever append: earlier steps are never inserted into,
/// reordered, or rewritten.
pub trait HookTarget {
    /// Appends a shell step after all existing steps.
    fn append_run(&mut self, command: String);

    /// Records a flatten marker after the most recently appended step.
    fn mark_flatten(&mut self);
}

/// FIFO queue of hooks registered during evaluation.
#[derive(Debug, Clone, Default)]
pub struct HookQueue {
    hooks: Vec<Hook>,
}

impl HookQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a hook at the back of the queue.
    pub fn register(&mut self, hook: Hook) {
        self.hooks.push(hook);
    }

    /// Runs every queued hook against `target`, in registration order.
    pub fn run_all(&self, target: &mut dyn HookTarget) {
        for hook in &self.hooks {
            tracing::debug!(origin = %hook.origin, actions = hook.actions.len(), "running deferred hook");
            for action in &hook.actions {
                match action {
                    HookAction::Run { command } => target.append_run(command.clone()),
                    HookAction::Flatten => target.mark_flatten(),
                }
            }
        }
    }

    /// Number of queued hooks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    /// Whether the queue is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Queued hooks in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Hook> {
        self.hooks.iter()
    }
}
