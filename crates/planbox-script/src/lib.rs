//! # planbox-script
//!
//! Parser and evaluator for the `.pbx` build-script language.
//!
//! Handles:
//! - **Parser**: Lexing, AST construction, and validation of `.pbx` files.
//! - **Interp**: `${NAME}` interpolation against the environment snapshot.
//! - **Eval**: Source-order evaluation of a script graph, includes in place.
//! - **Guard**: At-most-once application of shared fragments per build.
//! - **Hooks**: Deferred `AFTER` bodies, resolved to values and queued.
//! - **Source**: Script loading from the filesystem or from memory.
//!
//! The crate's output is a [`model::Evaluation`]: the fully resolved,
//! ordered directive sequence of one script graph plus its queued hooks,
//! ready for plan assembly.

pub mod eval;
pub mod guard;
pub mod hooks;
pub mod interp;
pub mod model;
pub mod parser;
pub mod source;
