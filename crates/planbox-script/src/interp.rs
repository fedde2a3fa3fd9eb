//! Build-time string interpolation.
//!
//! Directive arguments may reference variables with `${NAME}`,
//! `${NAME:-fallback}`, and `${NAME:?}`. References resolve against the
//! script's local bindings first, then the environment snapshot. `$$`
//! yields a literal `$`; any other `$` passes through untouched so shell
//! syntax like `$HOME` or `$(cmd)` inside `RUN` arguments survives to
//! execution time.

use std::collections::BTreeMap;
use std::iter::Peekable;
use std::str::Chars;

use planbox_common::env::EnvSource;
use planbox_common::error::{PlanboxError, Result};

/// Resolution scope for one script: local bindings shadow the environment.
#[derive(Debug, Clone, Copy)]
pub struct Scope<'a> {
    env: &'a EnvSource,
    bindings: &'a BTreeMap<String, String>,
}

impl<'a> Scope<'a> {
    /// Creates a scope over an environment snapshot and a script's bindings.
    #[must_use]
    pub const fn new(env: &'a EnvSource, bindings: &'a BTreeMap<String, String>) -> Self {
        Self { env, bindings }
    }

    fn resolve(&self, name: &str) -> Option<&str> {
        self.bindings
            .get(name)
            .map(String::as_str)
            .or_else(|| self.env.lookup(name))
    }

    /// Resolves a name to a non-empty value, if it has one.
    fn resolve_nonempty(&self, name: &str) -> Option<&str> {
        self.resolve(name).filter(|v| !v.is_empty())
    }
}

/// Expands all variable references in `template`.
///
/// Unset names resolve to the empty string in the plain `${NAME}` form.
/// `script` names the source in error messages.
///
/// # Errors
///
/// Returns an error for malformed references (unterminated `${`, empty or
/// invalid names, unsupported operators) and when a `${NAME:?}` reference
/// resolves to nothing.
pub fn expand(script: &str, template: &str, scope: &Scope<'_>) -> Result<String> {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            out.push(c);
            continue;
        }
        match chars.peek() {
            Some('$') => {
                let _ = chars.next();
                out.push('$');
            }
            Some('{') => {
                let _ = chars.next();
                expand_reference(script, &mut chars, scope, &mut out)?;
            }
            // Bare `$` belongs to the shell, not to us.
            _ => out.push('$'),
        }
    }

    Ok(out)
}

fn interp_err(script: &str, message: String) -> PlanboxError {
    PlanboxError::Parse {
        script: script.to_owned(),
        message,
    }
}

fn unterminated(script: &str) -> PlanboxError {
    interp_err(script, "unterminated ${ variable reference".into())
}

const fn is_name_char(c: char, first: bool) -> bool {
    if first {
        c.is_ascii_alphabetic() || c == '_'
    } else {
        c.is_ascii_alphanumeric() || c == '_'
    }
}

fn expand_reference(
    script: &str,
    chars: &mut Peekable<Chars<'_>>,
    scope: &Scope<'_>,
    out: &mut String,
) -> Result<()> {
    let mut name = String::new();
    loop {
        match chars.next() {
            Some('}') => {
                if name.is_empty() {
                    return Err(interp_err(script, "empty variable reference".into()));
                }
                out.push_str(scope.resolve(&name).unwrap_or_default());
                return Ok(());
            }
            Some(':') => break,
            Some(c) if is_name_char(c, name.is_empty()) => name.push(c),
            Some(c) => {
                return Err(interp_err(
                    script,
                    format!("invalid character {c:?} in variable reference"),
                ));
            }
            None => return Err(unterminated(script)),
        }
    }

    if name.is_empty() {
        return Err(interp_err(script, "empty variable reference".into()));
    }

    match chars.next() {
        Some('-') => {
            let mut fallback = String::new();
            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(c) => fallback.push(c),
                    None => return Err(unterminated(script)),
                }
            }
            out.push_str(scope.resolve_nonempty(&name).unwrap_or(&fallback));
            Ok(())
        }
        Some('?') => match chars.next() {
            Some('}') => scope.resolve_nonempty(&name).map_or_else(
                || {
                    Err(PlanboxError::MissingRequiredVariable {
                        script: script.to_owned(),
                        name: name.clone(),
                    })
                },
                |v| {
                    out.push_str(v);
                    Ok(())
                },
            ),
            _ => Err(interp_err(script, "expected `}` after `:?`".into())),
        },
        Some(c) => Err(interp_err(
            script,
            format!("unsupported interpolation operator `:{c}`"),
        )),
        None => Err(unterminated(script)),
    }
}
