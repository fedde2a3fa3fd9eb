//! `.pbx` script parser built on `nom`.
//!
//! Transforms raw `.pbx` text into a validated AST through
//! lexing, parsing, and static analysis phases.

pub mod ast;
pub mod lexer;
pub mod validator;

use planbox_common::error::{PlanboxError, Result};

use self::ast::{Condition, EnvDecl, ScriptFile, Statement, ValueDecl};
use self::lexer::Token;

/// Cursor into a token stream for recursive-descent parsing.
struct TokenCursor<'a> {
    tokens: &'a [Token],
    pos: usize,
    script: &'a str,
}

impl<'a> TokenCursor<'a> {
    const fn new(script: &'a str, tokens: &'a [Token]) -> Self {
        Self {
            tokens,
            pos: 0,
            script,
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<&'a Token> {
        let tok = self.tokens.get(self.pos);
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn err(&self, message: String) -> PlanboxError {
        PlanboxError::Parse {
            script: self.script.to_owned(),
            message,
        }
    }

    fn expect_identifier(&mut self) -> Result<String> {
        match self.advance() {
            Some(Token::Identifier(s)) => Ok(s.clone()),
            other => Err(self.err(format!("expected identifier, got {other:?}"))),
        }
    }

    fn expect_token(&mut self, expected: &Token) -> Result<()> {
        match self.advance() {
            Some(tok) if tok == expected => Ok(()),
            other => Err(self.err(format!("expected {expected:?}, got {other:?}"))),
        }
    }

    fn expect_string(&mut self) -> Result<String> {
        match self.advance() {
            Some(Token::StringLiteral(s)) => Ok(s.clone()),
            other => Err(self.err(format!("expected string literal, got {other:?}"))),
        }
    }

    const fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }
}

fn skip_optional_comma(cursor: &mut TokenCursor<'_>) {
    if cursor.peek() == Some(&Token::Comma) {
        let _ = cursor.advance();
    }
}

/// Parses a `.pbx` script from its source text.
///
/// `script` names the source in error messages.
///
/// # Errors
///
/// Returns an error if the input contains syntax errors or fails validation.
pub fn parse_script(script: &str, input: &str) -> Result<ScriptFile> {
    tracing::debug!(script, "parsing build script");
    let tokens = lexer::tokenize(script, input)?;
    let mut cursor = TokenCursor::new(script, &tokens);
    let file = parse_file(&mut cursor)?;
    validator::validate(script, &file)?;
    Ok(file)
}

fn parse_file(cursor: &mut TokenCursor<'_>) -> Result<ScriptFile> {
    let mut file = ScriptFile::default();
    while !cursor.at_end() {
        file.statements.push(parse_statement(cursor)?);
    }
    Ok(file)
}

fn parse_statement(cursor: &mut TokenCursor<'_>) -> Result<Statement> {
    match cursor.peek() {
        Some(Token::From) => {
            let _ = cursor.advance();
            Ok(Statement::From {
                image: cursor.expect_string()?,
            })
        }
        Some(Token::Run) => {
            let _ = cursor.advance();
            Ok(Statement::Run {
                command: cursor.expect_string()?,
            })
        }
        Some(Token::Copy) => parse_copy(cursor),
        Some(Token::Env) => parse_env(cursor),
        Some(Token::Entrypoint) => {
            let _ = cursor.advance();
            Ok(Statement::Entrypoint {
                command: cursor.expect_string()?,
            })
        }
        Some(Token::Include) => {
            let _ = cursor.advance();
            Ok(Statement::Include {
                path: cursor.expect_string()?,
            })
        }
        Some(Token::Let) => parse_let(cursor),
        Some(Token::After) => parse_after(cursor),
        Some(Token::Flatten) => {
            let _ = cursor.advance();
            Ok(Statement::Flatten)
        }
        Some(Token::If) => parse_guard(cursor, false),
        Some(Token::Unless) => parse_guard(cursor, true),
        other => Err(cursor.err(format!("expected a statement, got {other:?}"))),
    }
}

fn parse_copy(cursor: &mut TokenCursor<'_>) -> Result<Statement> {
    cursor.expect_token(&Token::Copy)?;
    let source = cursor.expect_string()?;
    cursor.expect_token(&Token::Arrow)?;
    let dest = cursor.expect_string()?;
    Ok(Statement::Copy { source, dest })
}

fn parse_env(cursor: &mut TokenCursor<'_>) -> Result<Statement> {
    cursor.expect_token(&Token::Env)?;
    cursor.expect_token(&Token::BraceOpen)?;

    let mut entries = Vec::new();
    while cursor.peek() != Some(&Token::BraceClose) {
        if cursor.at_end() {
            return Err(cursor.err("unexpected end of input inside ENV block".into()));
        }
        let name = cursor.expect_identifier()?;
        cursor.expect_token(&Token::Equals)?;
        let value = parse_value_decl(cursor)?;
        entries.push(EnvDecl { name, value });
        skip_optional_comma(cursor);
    }

    cursor.expect_token(&Token::BraceClose)?;
    Ok(Statement::Env { entries })
}

fn parse_let(cursor: &mut TokenCursor<'_>) -> Result<Statement> {
    cursor.expect_token(&Token::Let)?;
    let name = cursor.expect_identifier()?;
    cursor.expect_token(&Token::Equals)?;
    let value = parse_value_decl(cursor)?;
    Ok(Statement::Let { name, value })
}

fn parse_value_decl(cursor: &mut TokenCursor<'_>) -> Result<ValueDecl> {
    match cursor.peek() {
        Some(Token::StringLiteral(_)) => Ok(ValueDecl::Scalar(cursor.expect_string()?)),
        Some(Token::BracketOpen) => Ok(ValueDecl::List(parse_string_list(cursor)?)),
        other => Err(cursor.err(format!(
            "expected string literal or list, got {other:?}"
        ))),
    }
}

fn parse_string_list(cursor: &mut TokenCursor<'_>) -> Result<Vec<String>> {
    cursor.expect_token(&Token::BracketOpen)?;
    let mut items = Vec::new();

    while cursor.peek() != Some(&Token::BracketClose) {
        if cursor.at_end() {
            return Err(cursor.err("unexpected end of input inside list".into()));
        }
        items.push(cursor.expect_string()?);
        skip_optional_comma(cursor);
    }

    cursor.expect_token(&Token::BracketClose)?;
    Ok(items)
}

fn parse_after(cursor: &mut TokenCursor<'_>) -> Result<Statement> {
    cursor.expect_token(&Token::After)?;
    cursor.expect_token(&Token::BraceOpen)?;

    let mut body = Vec::new();
    while cursor.peek() != Some(&Token::BraceClose) {
        if cursor.at_end() {
            return Err(cursor.err("unexpected end of input inside AFTER block".into()));
        }
        body.push(parse_statement(cursor)?);
    }

    cursor.expect_token(&Token::BraceClose)?;
    Ok(Statement::After { body })
}

fn parse_guard(cursor: &mut TokenCursor<'_>, negated: bool) -> Result<Statement> {
    let keyword = if negated { &Token::Unless } else { &Token::If };
    cursor.expect_token(keyword)?;
    let condition = parse_condition(cursor)?;
    cursor.expect_token(&Token::BraceOpen)?;

    let mut body = Vec::new();
    while cursor.peek() != Some(&Token::BraceClose) {
        if cursor.at_end() {
            return Err(cursor.err("unexpected end of input inside guard block".into()));
        }
        body.push(parse_statement(cursor)?);
    }

    cursor.expect_token(&Token::BraceClose)?;
    Ok(Statement::Guard {
        negated,
        condition,
        body,
    })
}

fn parse_condition(cursor: &mut TokenCursor<'_>) -> Result<Condition> {
    match cursor.peek() {
        Some(Token::Included) => {
            let _ = cursor.advance();
            Ok(Condition::Included)
        }
        Some(Token::Env) => {
            let _ = cursor.advance();
            cursor.expect_token(&Token::ParenOpen)?;
            let name = cursor.expect_string()?;
            cursor.expect_token(&Token::ParenClose)?;
            Ok(Condition::EnvSet(name))
        }
        other => Err(cursor.err(format!(
            "expected `included` or ENV(\"NAME\") condition, got {other:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &str) -> ScriptFile {
        parse_script("test.pbx", input).expect("should parse")
    }

    #[test]
    fn parse_empty_input() {
        let file = parse("");
        assert!(file.statements.is_empty());
    }

    #[test]
    fn parse_from() {
        let file = parse(r#"FROM "ubuntu:19.04""#);
        assert_eq!(
            file.statements,
            vec![Statement::From {
                image: "ubuntu:19.04".into()
            }]
        );
    }

    #[test]
    fn parse_run_and_copy() {
        let file = parse(
            r#"FROM "alpine"
RUN "apk add curl"
COPY "entrypoint.sh" -> "/""#,
        );
        assert_eq!(file.statements.len(), 3);
        assert_eq!(
            file.statements[1],
            Statement::Run {
                command: "apk add curl".into()
            }
        );
        assert_eq!(
            file.statements[2],
            Statement::Copy {
                source: "entrypoint.sh".into(),
                dest: "/".into()
            }
        );
    }

    #[test]
    fn parse_env_block() {
        let file = parse(
            r#"FROM "alpine"
ENV {
    GOPATH = "/go"
    PATH = ["/go/bin", "/usr/local/go/bin", "/bin"]
    TESTING = "${TESTING}"
}"#,
        );
        let Statement::Env { entries } = &file.statements[1] else {
            panic!("expected ENV statement");
        };
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].name, "GOPATH");
        assert_eq!(entries[0].value, ValueDecl::Scalar("/go".into()));
        assert_eq!(
            entries[1].value,
            ValueDecl::List(vec![
                "/go/bin".into(),
                "/usr/local/go/bin".into(),
                "/bin".into()
            ])
        );
        assert_eq!(entries[2].value, ValueDecl::Scalar("${TESTING}".into()));
    }

    #[test]
    fn parse_env_with_trailing_commas() {
        let file = parse(
            r#"FROM "alpine"
ENV {
    A = "1",
    B = "2",
}"#,
        );
        let Statement::Env { entries } = &file.statements[1] else {
            panic!("expected ENV statement");
        };
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn parse_let_scalar_and_list() {
        let file = parse(
            r#"LET GO_VERSION = "1.13"
LET PACKAGES = ["curl", "wget", "git"]"#,
        );
        assert_eq!(
            file.statements[0],
            Statement::Let {
                name: "GO_VERSION".into(),
                value: ValueDecl::Scalar("1.13".into())
            }
        );
        assert_eq!(
            file.statements[1],
            Statement::Let {
                name: "PACKAGES".into(),
                value: ValueDecl::List(vec!["curl".into(), "wget".into(), "git".into()])
            }
        );
    }

    #[test]
    fn parse_include() {
        let file = parse(r#"INCLUDE "shared/golang.pbx""#);
        assert_eq!(
            file.statements,
            vec![Statement::Include {
                path: "shared/golang.pbx".into()
            }]
        );
    }

    #[test]
    fn parse_after_with_guard_and_flatten() {
        let file = parse(
            r#"AFTER {
    IF ENV("PACKAGE_FOR_CI") {
        RUN "apt-get clean"
        FLATTEN
    }
}"#,
        );
        let Statement::After { body } = &file.statements[0] else {
            panic!("expected AFTER statement");
        };
        let Statement::Guard {
            negated,
            condition,
            body: inner,
        } = &body[0]
        else {
            panic!("expected guard inside AFTER");
        };
        assert!(!negated);
        assert_eq!(*condition, Condition::EnvSet("PACKAGE_FOR_CI".into()));
        assert_eq!(
            inner,
            &vec![
                Statement::Run {
                    command: "apt-get clean".into()
                },
                Statement::Flatten,
            ]
        );
    }

    #[test]
    fn parse_unless_included_guard() {
        let file = parse(
            r#"UNLESS included {
    COPY "entrypoint.sh" -> "/"
    ENTRYPOINT "/entrypoint.sh"
}"#,
        );
        let Statement::Guard {
            negated,
            condition,
            body,
        } = &file.statements[0]
        else {
            panic!("expected guard statement");
        };
        assert!(negated);
        assert_eq!(*condition, Condition::Included);
        assert_eq!(body.len(), 2);
    }

    #[test]
    fn parse_nested_guards() {
        let file = parse(
            r#"IF ENV("A") {
    UNLESS ENV("B") {
        RUN "true"
    }
}"#,
        );
        let Statement::Guard { body, .. } = &file.statements[0] else {
            panic!("expected guard statement");
        };
        assert!(matches!(body[0], Statement::Guard { negated: true, .. }));
    }

    #[test]
    fn parse_full_script() {
        let input = r#"# CI toolchain image
FROM "ubuntu:19.04"

LET GO_VERSION = "1.13"

AFTER {
    IF ENV("PACKAGE_FOR_CI") {
        RUN "apt-get clean"
        FLATTEN
    }
}

RUN "apt-get update"

ENV {
    GOPATH = "/go"
    PATH = ["/go/bin", "/usr/local/go/bin", "/bin"]
}

INCLUDE "shared/golang.pbx"

UNLESS included {
    COPY "entrypoint.sh" -> "/"
    RUN "chmod 755 /entrypoint.sh"
    ENTRYPOINT "/entrypoint.sh"
}"#;
        let file = parse(input);
        assert_eq!(file.statements.len(), 7);
        assert!(matches!(file.statements[0], Statement::From { .. }));
        assert!(matches!(file.statements[1], Statement::Let { .. }));
        assert!(matches!(file.statements[2], Statement::After { .. }));
        assert!(matches!(file.statements[5], Statement::Include { .. }));
        assert!(matches!(file.statements[6], Statement::Guard { .. }));
    }

    #[test]
    fn parse_error_statement_outside_grammar() {
        let result = parse_script("test.pbx", r#"DEPLOY "x""#);
        assert!(result.is_err());
    }

    #[test]
    fn parse_error_missing_arrow_in_copy() {
        let result = parse_script("test.pbx", r#"COPY "a" "b""#);
        assert!(result.is_err());
    }

    #[test]
    fn parse_error_missing_brace() {
        let result = parse_script(
            "test.pbx",
            r#"ENV {
    A = "1"
"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn parse_error_bad_condition() {
        let result = parse_script("test.pbx", r#"IF PACKAGE_FOR_CI { RUN "x" }"#);
        assert!(result.is_err());
    }

    #[test]
    fn parse_error_reports_script_name() {
        let err = parse_script("ci/build.pbx", "FROM").expect_err("should fail");
        assert!(err.to_string().contains("ci/build.pbx"), "got: {err}");
    }
}
