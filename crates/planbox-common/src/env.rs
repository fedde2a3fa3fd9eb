//! Immutable snapshot of the environment-variable source.

use std::collections::BTreeMap;

/// Read-only view of the environment a build resolves variables against.
///
/// Taken once per invocation and shared across concurrent builds; absence of
/// a name is not an error at this layer. Mutating the process environment
/// after the snapshot is taken has no effect on resolution.
#[derive(Debug, Clone, Default)]
pub struct EnvSource {
    vars: BTreeMap<String, String>,
}

impl EnvSource {
    /// Snapshots the current process environment.
    #[must_use]
    pub fn from_process() -> Self {
        Self {
            vars: std::env::vars().collect(),
        }
    }

    /// Builds a snapshot from explicit pairs.
    #[must_use]
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Looks up a variable by name.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }
}
