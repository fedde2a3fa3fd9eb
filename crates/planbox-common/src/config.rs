//! Caller-supplied build invocation options.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Caller-supplied options for one build invocation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildOptions {
    /// External builder binary; resolved on `PATH` when not absolute.
    /// `None` selects the default builder.
    pub builder: Option<String>,
    /// Build context directory for `COPY` sources. `None` uses the
    /// top-level script's directory.
    pub context: Option<PathBuf>,
    /// Tag for the committed image. `None` uses the default tag.
    pub tag: Option<String>,
}
