//! Abstract Syntax Tree for `.pbx` build scripts.
//!
//! String arguments at this level are raw templates: `${NAME}` references
//! are resolved later, during evaluation, never at parse time.

/// Root node of a parsed `.pbx` file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptFile {
    /// Top-level statements in source order.
    pub statements: Vec<Statement>,
}

/// A single statement in a `.pbx` script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    /// `FROM "image"` base-image declaration.
    From {
        /// Image reference template.
        image: String,
    },
    /// `RUN "command"` build step.
    Run {
        /// Shell command template.
        command: String,
    },
    /// `COPY "source" -> "dest"` staging step.
    Copy {
        /// Context-relative source template.
        source: String,
        /// In-image destination template.
        dest: String,
    },
    /// `ENV { ... }` environment declaration block.
    Env {
        /// Declared entries in source order.
        entries: Vec<EnvDecl>,
    },
    /// `ENTRYPOINT "command"` startup-command declaration.
    Entrypoint {
        /// Startup command template.
        command: String,
    },
    /// `INCLUDE "path"` shared-fragment reference.
    Include {
        /// Fragment path template, relative to the including script.
        path: String,
    },
    /// `LET name = value` script-local binding.
    Let {
        /// Binding name.
        name: String,
        /// Bound value.
        value: ValueDecl,
    },
    /// `AFTER { ... }` deferred hook body.
    After {
        /// Hook statements; restricted by the validator to `RUN`,
        /// `FLATTEN`, and guards.
        body: Vec<Statement>,
    },
    /// `FLATTEN` layer-squash request, valid only inside `AFTER` bodies.
    Flatten,
    /// `IF cond { ... }` or `UNLESS cond { ... }` conditional block.
    Guard {
        /// True for `UNLESS`, which inverts the condition.
        negated: bool,
        /// Condition to test.
        condition: Condition,
        /// Guarded statements.
        body: Vec<Statement>,
    },
}

impl Statement {
    /// Keyword of this statement as written in scripts.
    #[must_use]
    pub const fn keyword(&self) -> &'static str {
        match self {
            Self::From { .. } => "FROM",
            Self::Run { .. } => "RUN",
            Self::Copy { .. } => "COPY",
            Self::Env { .. } => "ENV",
            Self::Entrypoint { .. } => "ENTRYPOINT",
            Self::Include { .. } => "INCLUDE",
            Self::Let { .. } => "LET",
            Self::After { .. } => "AFTER",
            Self::Flatten => "FLATTEN",
            Self::Guard { negated: false, .. } => "IF",
            Self::Guard { negated: true, .. } => "UNLESS",
        }
    }
}

/// A guard condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// `included`: true when the current script was evaluated via `INCLUDE`.
    Included,
    /// `ENV("NAME")`: true when the named variable is set and non-empty.
    EnvSet(String),
}

/// Right-hand side of an `ENV` entry or `LET` binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueDecl {
    /// A single string template.
    Scalar(String),
    /// An ordered list of string templates.
    List(Vec<String>),
}

/// One entry inside an `ENV` block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvDecl {
    /// Variable name.
    pub name: String,
    /// Declared value; list values carry search-path semantics.
    pub value: ValueDecl,
}
