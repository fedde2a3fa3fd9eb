//! Environment merging.
//!
//! Entries merge in declaration order into a table keyed by first
//! appearance. Scalar keys are last-write-wins. Path-list keys accumulate
//! segments across declarations, joined with `:` at finalization, with no
//! deduplication. A scalar assignment to a path-list key replaces it
//! wholesale; a list assignment to a scalar key starts a fresh list.

use planbox_common::constants::PATH_LIST_SEPARATOR;
use planbox_script::model::{EnvEntry, EnvValue};

use crate::plan::EnvAssignment;

#[derive(Debug, Clone, PartialEq, Eq)]
enum MergedValue {
    Scalar(String),
    PathList(Vec<String>),
}

/// Insertion-ordered environment table under merge.
#[derive(Debug, Clone, Default)]
pub struct EnvTable {
    entries: Vec<(String, MergedValue)>,
}

impl EnvTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges one declared entry into the table.
    pub fn apply(&mut self, entry: &EnvEntry) {
        let incoming = match &entry.value {
            EnvValue::Scalar(value) => MergedValue::Scalar(value.clone()),
            EnvValue::PathList(items) => MergedValue::PathList(items.clone()),
        };

        let Some(pos) = self.entries.iter().position(|(name, _)| name == &entry.name) else {
            self.entries.push((entry.name.clone(), incoming));
            return;
        };

        match (&mut self.entries[pos].1, incoming) {
            (MergedValue::PathList(existing), MergedValue::PathList(items)) => {
                existing.extend(items);
            }
            (slot, replacement) => *slot = replacement,
        }
    }

    /// Finalizes the table into plan-ready assignments.
    #[must_use]
    pub fn finalize(&self) -> Vec<EnvAssignment> {
        self.entries
            .iter()
            .map(|(name, value)| EnvAssignment {
                name: name.clone(),
                value: match value {
                    MergedValue::Scalar(v) => v.clone(),
                    MergedValue::PathList(items) => items.join(PATH_LIST_SEPARATOR),
                },
            })
            .collect()
    }
}
