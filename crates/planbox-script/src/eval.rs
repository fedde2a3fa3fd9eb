//! Source-order evaluation of a script graph.
//!
//! Walks a top-level script's statements top to bottom, resolving every
//! string through the interpolation scope as it goes. `INCLUDE` evaluates
//! the referenced fragment in place, once per build; `AFTER` bodies are
//! reduced to action values and queued. Evaluation is all-or-nothing: the
//! first error aborts and no partial result is returned.

use std::collections::BTreeMap;

use planbox_common::constants::{MAX_INCLUDE_DEPTH, WORD_LIST_SEPARATOR};
use planbox_common::env::EnvSource;
use planbox_common::error::{PlanboxError, Result};
use planbox_common::types::ScriptId;

use crate::guard::InclusionGuard;
use crate::hooks::{Hook, HookAction, HookQueue};
use crate::interp::{self, Scope};
use crate::model::{Directive, DirectiveRecord, EnvEntry, EnvValue, Evaluation, Origin};
use crate::parser;
use crate::parser::ast::{Condition, EnvDecl, Statement, ValueDecl};
use crate::source::ScriptSource;

/// Evaluates `reference` as a top-level build script.
///
/// # Errors
///
/// Returns the first error raised while loading, parsing, or evaluating
/// any script in the graph.
pub fn evaluate(
    env: &EnvSource,
    source: &dyn ScriptSource,
    reference: &str,
) -> Result<Evaluation> {
    let root = source.resolve(None, reference)?;
    tracing::info!(script = %root, "evaluating build script");

    let mut evaluator = Evaluator {
        env,
        source,
        guard: InclusionGuard::new(),
        directives: Vec::new(),
        hooks: HookQueue::new(),
    };
    let _ = evaluator.guard.should_apply(&root);
    evaluator.eval_script(root.clone(), false, 0)?;

    Ok(Evaluation {
        root,
        directives: evaluator.directives,
        hooks: evaluator.hooks,
    })
}

struct Evaluator<'a> {
    env: &'a EnvSource,
    source: &'a dyn ScriptSource,
    guard: InclusionGuard,
    directives: Vec<DirectiveRecord>,
    hooks: HookQueue,
}

/// Per-script evaluation state.
struct Frame {
    id: ScriptId,
    name: String,
    included: bool,
    depth: usize,
    bindings: BTreeMap<String, String>,
    next_index: usize,
}

impl Evaluator<'_> {
    fn eval_script(&mut self, id: ScriptId, included: bool, depth: usize) -> Result<()> {
        if depth > MAX_INCLUDE_DEPTH {
            return Err(PlanboxError::Parse {
                script: id.to_string(),
                message: format!("include depth limit ({MAX_INCLUDE_DEPTH}) exceeded"),
            });
        }

        let text = self.source.load(&id)?;
        let name = id.to_string();
        let file = parser::parse_script(&name, &text)?;
        let mut frame = Frame {
            id,
            name,
            included,
            depth,
            bindings: BTreeMap::new(),
            next_index: 0,
        };
        self.eval_statements(&file.statements, &mut frame)
    }

    fn eval_statements(&mut self, statements: &[Statement], frame: &mut Frame) -> Result<()> {
        for stmt in statements {
            match stmt {
                Statement::From { image } => {
                    let image = self.expand(frame, image)?;
                    self.record(frame, Directive::From { image });
                }
                Statement::Run { command } => {
                    let command = self.expand(frame, command)?;
                    self.record(frame, Directive::Run { command });
                }
                Statement::Copy { source, dest } => {
                    let source = self.expand(frame, source)?;
                    let dest = self.expand(frame, dest)?;
                    self.record(frame, Directive::Copy { source, dest });
                }
                Statement::Env { entries } => {
                    let entries = entries
                        .iter()
                        .map(|decl| self.resolve_env_decl(frame, decl))
                        .collect::<Result<Vec<_>>>()?;
                    self.record(frame, Directive::Env { entries });
                }
                Statement::Entrypoint { command } => {
                    let command = self.expand(frame, command)?;
                    self.record(frame, Directive::Entrypoint { command });
                }
                Statement::Include { path } => {
                    let path = self.expand(frame, path)?;
                    let from = frame.id.clone();
                    let depth = frame.depth;
                    self.eval_include(&from, depth, &path)?;
                }
                Statement::Let { name, value } => {
                    let resolved = self.resolve_binding_value(frame, value)?;
                    let _ = frame.bindings.insert(name.clone(), resolved);
                }
                Statement::After { body } => {
                    let actions = self.resolve_hook_body(frame, body)?;
                    self.hooks.register(Hook {
                        origin: frame.id.clone(),
                        actions,
                    });
                }
                Statement::Flatten => {
                    return Err(PlanboxError::Parse {
                        script: frame.name.clone(),
                        message: "FLATTEN is only valid inside AFTER blocks".into(),
                    });
                }
                Statement::Guard {
                    negated,
                    condition,
                    body,
                } => {
                    if self.test_condition(frame, condition) != *negated {
                        self.eval_statements(body, frame)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn eval_include(&mut self, from: &ScriptId, depth: usize, path: &str) -> Result<()> {
        let id = self.source.resolve(Some(from), path)?;
        if !self.guard.should_apply(&id) {
            tracing::debug!(fragment = %id, "fragment already applied, skipping");
            return Ok(());
        }
        tracing::debug!(fragment = %id, includer = %from, "evaluating included fragment");
        self.eval_script(id, true, depth + 1)
    }

    fn resolve_hook_body(&self, frame: &Frame, body: &[Statement]) -> Result<Vec<HookAction>> {
        let mut actions = Vec::new();
        for stmt in body {
            match stmt {
                Statement::Run { command } => {
                    let command = self.expand(frame, command)?;
                    actions.push(HookAction::Run { command });
                }
                Statement::Flatten => actions.push(HookAction::Flatten),
                Statement::Guard {
                    negated,
                    condition,
                    body,
                } => {
                    if self.test_condition(frame, condition) != *negated {
                        actions.extend(self.resolve_hook_body(frame, body)?);
                    }
                }
                other => {
                    return Err(PlanboxError::Parse {
                        script: frame.name.clone(),
                        message: format!(
                            "{} is not permitted inside AFTER blocks",
                            other.keyword()
                        ),
                    });
                }
            }
        }
        Ok(actions)
    }

    fn test_condition(&self, frame: &Frame, condition: &Condition) -> bool {
        match condition {
            Condition::Included => frame.included,
            Condition::EnvSet(name) => self.env.lookup(name).is_some_and(|v| !v.is_empty()),
        }
    }

    fn resolve_env_decl(&self, frame: &Frame, decl: &EnvDecl) -> Result<EnvEntry> {
        let value = match &decl.value {
            ValueDecl::Scalar(template) => EnvValue::Scalar(self.expand(frame, template)?),
            ValueDecl::List(items) => EnvValue::PathList(
                items
                    .iter()
                    .map(|item| self.expand(frame, item))
                    .collect::<Result<Vec<_>>>()?,
            ),
        };
        Ok(EnvEntry {
            name: decl.name.clone(),
            value,
        })
    }

    fn resolve_binding_value(&self, frame: &Frame, value: &ValueDecl) -> Result<String> {
        match value {
            ValueDecl::Scalar(template) => self.expand(frame, template),
            ValueDecl::List(items) => Ok(items
                .iter()
                .map(|item| self.expand(frame, item))
                .collect::<Result<Vec<_>>>()?
                .join(WORD_LIST_SEPARATOR)),
        }
    }

    fn expand(&self, frame: &Frame, template: &str) -> Result<String> {
        interp::expand(
            &frame.name,
            template,
            &Scope::new(self.env, &frame.bindings),
        )
    }

    fn record(&mut self, frame: &mut Frame, directive: Directive) {
        let origin = Origin {
            script: frame.id.clone(),
            index: frame.next_index,
        };
        frame.next_index += 1;
        self.directives.push(DirectiveRecord { directive, origin });
    }
}
