//! Script loading.
//!
//! Evaluation reaches scripts through the [`ScriptSource`] trait so the
//! engine stays independent of where script text lives: on disk for the
//! CLI, in memory for tests and embedders.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use planbox_common::error::{PlanboxError, Result};
use planbox_common::types::ScriptId;

/// Provider of script text, keyed by [`ScriptId`].
pub trait ScriptSource {
    /// Resolves a script reference to its identity.
    ///
    /// `from` is the including script for `INCLUDE` references, or `None`
    /// for the top-level script. Two references naming the same script
    /// must resolve to equal identities; the inclusion guard depends on it.
    ///
    /// # Errors
    ///
    /// Returns an error if the reference does not name a loadable script.
    fn resolve(&self, from: Option<&ScriptId>, reference: &str) -> Result<ScriptId>;

    /// Loads the text of a resolved script.
    ///
    /// # Errors
    ///
    /// Returns an error if the script cannot be read.
    fn load(&self, id: &ScriptId) -> Result<String>;
}

/// Filesystem-backed script source.
///
/// References resolve relative to the including script's directory and are
/// canonicalized, so the same fragment reached through different relative
/// paths carries one identity.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsSource;

impl FsSource {
    /// Creates a filesystem source.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl ScriptSource for FsSource {
    fn resolve(&self, from: Option<&ScriptId>, reference: &str) -> Result<ScriptId> {
        let candidate = if Path::new(reference).is_absolute() {
            PathBuf::from(reference)
        } else {
            let base = from
                .and_then(|id| id.as_path().parent())
                .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
            base.join(reference)
        };

        match candidate.canonicalize() {
            Ok(path) => Ok(ScriptId::new(path)),
            Err(source) => Err(from.map_or_else(
                || PlanboxError::Io {
                    path: candidate.clone(),
                    source,
                },
                |includer| PlanboxError::MissingInclude {
                    script: includer.to_string(),
                    path: candidate.clone(),
                },
            )),
        }
    }

    fn load(&self, id: &ScriptId) -> Result<String> {
        std::fs::read_to_string(id.as_path()).map_err(|source| PlanboxError::Io {
            path: id.as_path().to_path_buf(),
            source,
        })
    }
}

/// In-memory script source keyed by logical names.
///
/// References are used verbatim as identities; no relative resolution is
/// performed.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    files: BTreeMap<String, String>,
}

impl MemorySource {
    /// Creates an empty in-memory source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a script under a logical name, replacing any previous text.
    pub fn insert(&mut self, name: impl Into<String>, text: impl Into<String>) {
        let _ = self.files.insert(name.into(), text.into());
    }

    /// Builds a source from name/text pairs.
    #[must_use]
    pub fn from_files<K, V>(files: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            files: files
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl ScriptSource for MemorySource {
    fn resolve(&self, from: Option<&ScriptId>, reference: &str) -> Result<ScriptId> {
        if self.files.contains_key(reference) {
            return Ok(ScriptId::new(reference));
        }
        Err(from.map_or_else(
            || PlanboxError::Io {
                path: PathBuf::from(reference),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such script"),
            },
            |includer| PlanboxError::MissingInclude {
                script: includer.to_string(),
                path: PathBuf::from(reference),
            },
        ))
    }

    fn load(&self, id: &ScriptId) -> Result<String> {
        self.files
            .get(&id.to_string())
            .cloned()
            .ok_or_else(|| PlanboxError::Io {
                path: id.as_path().to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such script"),
            })
    }
}
