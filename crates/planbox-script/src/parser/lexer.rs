//! Tokenization of `.pbx` source text using `nom`.
//!
//! Produces a stream of [`Token`]s from raw input for the parser to consume.
//! Whitespace and `#` line comments are discarded between tokens.

use planbox_common::error::{PlanboxError, Result};
use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{char, multispace1, not_line_ending},
    combinator::value,
    multi::many0,
    sequence::preceded,
};

/// A token in the `.pbx` language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// `FROM` keyword.
    From,
    /// `RUN` keyword.
    Run,
    /// `COPY` keyword.
    Copy,
    /// `ENV` keyword.
    Env,
    /// `ENTRYPOINT` keyword.
    Entrypoint,
    /// `INCLUDE` keyword.
    Include,
    /// `LET` keyword.
    Let,
    /// `AFTER` keyword.
    After,
    /// `FLATTEN` keyword.
    Flatten,
    /// `IF` keyword.
    If,
    /// `UNLESS` keyword.
    Unless,
    /// Condition literal `included`.
    Included,
    /// An identifier (environment key, binding name).
    Identifier(String),
    /// A double-quoted string literal.
    StringLiteral(String),
    /// `{` opening brace.
    BraceOpen,
    /// `}` closing brace.
    BraceClose,
    /// `[` opening bracket.
    BracketOpen,
    /// `]` closing bracket.
    BracketClose,
    /// `(` opening parenthesis.
    ParenOpen,
    /// `)` closing parenthesis.
    ParenClose,
    /// `->` arrow separating copy source and destination.
    Arrow,
    /// `=` assignment.
    Equals,
    /// `,` comma separator.
    Comma,
}

/// Skippable items: whitespace or line comments.
fn skip_trivia(input: &str) -> IResult<&str, ()> {
    let comment = value((), preceded(tag("#"), not_line_ending));
    let ws = value((), multispace1);
    let (input, _) = many0(alt((ws, comment))).parse(input)?;
    Ok((input, ()))
}

/// Parses a double-quoted string literal with basic escape support.
fn string_literal(input: &str) -> IResult<&str, Token> {
    let (input, _) = char('"')(input)?;
    let mut result = String::new();
    let mut chars = input.char_indices();
    loop {
        match chars.next() {
            Some((idx, '"')) => {
                let remaining = &input[idx + 1..];
                return Ok((remaining, Token::StringLiteral(result)));
            }
            Some((_, '\\')) => match chars.next() {
                Some((_, 'n')) => result.push('\n'),
                Some((_, 't')) => result.push('\t'),
                Some((_, '\\')) => result.push('\\'),
                Some((_, '"')) => result.push('"'),
                Some((_, c)) => {
                    result.push('\\');
                    result.push(c);
                }
                None => {
                    return Err(nom::Err::Failure(nom::error::Error::new(
                        input,
                        nom::error::ErrorKind::Char,
                    )));
                }
            },
            Some((_, c)) => result.push(c),
            None => {
                return Err(nom::Err::Failure(nom::error::Error::new(
                    input,
                    nom::error::ErrorKind::Char,
                )));
            }
        }
    }
}

const fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

const fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Parses an identifier or keyword.
fn identifier_or_keyword(input: &str) -> IResult<&str, Token> {
    let (input, first) = take_while1(is_ident_start)(input)?;
    let (input, rest) = take_while(is_ident_continue)(input)?;
    let word = format!("{first}{rest}");
    let token = match word.as_str() {
        "FROM" => Token::From,
        "RUN" => Token::Run,
        "COPY" => Token::Copy,
        "ENV" => Token::Env,
        "ENTRYPOINT" => Token::Entrypoint,
        "INCLUDE" => Token::Include,
        "LET" => Token::Let,
        "AFTER" => Token::After,
        "FLATTEN" => Token::Flatten,
        "IF" => Token::If,
        "UNLESS" => Token::Unless,
        "included" => Token::Included,
        _ => Token::Identifier(word),
    };
    Ok((input, token))
}

/// Parses a symbol token.
fn symbol(input: &str) -> IResult<&str, Token> {
    alt((
        value(Token::Arrow, tag("->")),
        value(Token::BraceOpen, char('{')),
        value(Token::BraceClose, char('}')),
        value(Token::BracketOpen, char('[')),
        value(Token::BracketClose, char(']')),
        value(Token::ParenOpen, char('(')),
        value(Token::ParenClose, char(')')),
        value(Token::Equals, char('=')),
        value(Token::Comma, char(',')),
    ))
    .parse(input)
}

/// Parses a single token (after trivia has been skipped).
fn single_token(input: &str) -> IResult<&str, Token> {
    alt((string_literal, symbol, identifier_or_keyword)).parse(input)
}

/// Tokenizes a `.pbx` source string into a vector of tokens.
///
/// Whitespace and `#` line comments are discarded. `script` names the
/// source in error messages.
///
/// # Errors
///
/// Returns an error if the input contains characters that cannot be tokenized.
pub fn tokenize(script: &str, input: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut remaining = input;

    loop {
        let (rest, ()) = skip_trivia(remaining).map_err(|e| PlanboxError::Parse {
            script: script.to_owned(),
            message: format!("lexer error skipping whitespace: {e}"),
        })?;
        remaining = rest;

        if remaining.is_empty() {
            break;
        }

        let (rest, token) = single_token(remaining).map_err(|_| PlanboxError::Parse {
            script: script.to_owned(),
            message: format!(
                "unexpected character at: \"{}\"",
                &remaining[..remaining.len().min(20)]
            ),
        })?;
        tokens.push(token);
        remaining = rest;
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(input: &str) -> Vec<Token> {
        tokenize("test.pbx", input).expect("should tokenize")
    }

    #[test]
    fn tokenize_keywords() {
        let tokens = lex("FROM RUN COPY ENV ENTRYPOINT INCLUDE LET AFTER FLATTEN IF UNLESS included");
        assert_eq!(
            tokens,
            vec![
                Token::From,
                Token::Run,
                Token::Copy,
                Token::Env,
                Token::Entrypoint,
                Token::Include,
                Token::Let,
                Token::After,
                Token::Flatten,
                Token::If,
                Token::Unless,
                Token::Included,
            ]
        );
    }

    #[test]
    fn tokenize_symbols() {
        let tokens = lex("{ } [ ] ( ) -> = ,");
        assert_eq!(
            tokens,
            vec![
                Token::BraceOpen,
                Token::BraceClose,
                Token::BracketOpen,
                Token::BracketClose,
                Token::ParenOpen,
                Token::ParenClose,
                Token::Arrow,
                Token::Equals,
                Token::Comma,
            ]
        );
    }

    #[test]
    fn tokenize_string_literal() {
        let tokens = lex(r#""ubuntu:19.04""#);
        assert_eq!(tokens, vec![Token::StringLiteral("ubuntu:19.04".into())]);
    }

    #[test]
    fn tokenize_string_with_escapes() {
        let tokens = lex(r#""line\nnew\ttab\\slash\"quote""#);
        assert_eq!(
            tokens,
            vec![Token::StringLiteral("line\nnew\ttab\\slash\"quote".into())]
        );
    }

    #[test]
    fn tokenize_keywords_are_case_sensitive() {
        let tokens = lex("from From");
        assert_eq!(
            tokens,
            vec![
                Token::Identifier("from".into()),
                Token::Identifier("From".into()),
            ]
        );
    }

    #[test]
    fn tokenize_identifier() {
        let tokens = lex("GOPATH APT_MIRROR _private");
        assert_eq!(
            tokens,
            vec![
                Token::Identifier("GOPATH".into()),
                Token::Identifier("APT_MIRROR".into()),
                Token::Identifier("_private".into()),
            ]
        );
    }

    #[test]
    fn tokenize_skips_comments() {
        let input = "FROM \"alpine\" # base image\nRUN \"true\"";
        let tokens = lex(input);
        assert_eq!(
            tokens,
            vec![
                Token::From,
                Token::StringLiteral("alpine".into()),
                Token::Run,
                Token::StringLiteral("true".into()),
            ]
        );
    }

    #[test]
    fn tokenize_hash_inside_string_is_not_a_comment() {
        let tokens = lex(r#"RUN "echo '#!/bin/sh' > /entry""#);
        assert_eq!(
            tokens,
            vec![
                Token::Run,
                Token::StringLiteral("echo '#!/bin/sh' > /entry".into()),
            ]
        );
    }

    #[test]
    fn tokenize_empty_input() {
        let tokens = lex("");
        assert!(tokens.is_empty());
    }

    #[test]
    fn tokenize_only_comments() {
        let tokens = lex("# just a comment\n# another one");
        assert!(tokens.is_empty());
    }

    #[test]
    fn tokenize_env_block() {
        let input = r#"ENV {
    GOPATH = "/go"
    PATH = ["/go/bin", "/bin"]
}"#;
        let tokens = lex(input);
        assert_eq!(
            tokens,
            vec![
                Token::Env,
                Token::BraceOpen,
                Token::Identifier("GOPATH".into()),
                Token::Equals,
                Token::StringLiteral("/go".into()),
                Token::Identifier("PATH".into()),
                Token::Equals,
                Token::BracketOpen,
                Token::StringLiteral("/go/bin".into()),
                Token::Comma,
                Token::StringLiteral("/bin".into()),
                Token::BracketClose,
                Token::BraceClose,
            ]
        );
    }

    #[test]
    fn tokenize_copy_arrow() {
        let tokens = lex(r#"COPY "entrypoint.sh" -> "/""#);
        assert_eq!(
            tokens,
            vec![
                Token::Copy,
                Token::StringLiteral("entrypoint.sh".into()),
                Token::Arrow,
                Token::StringLiteral("/".into()),
            ]
        );
    }

    #[test]
    fn tokenize_guard_condition() {
        let tokens = lex(r#"IF ENV("PACKAGE_FOR_CI") { FLATTEN }"#);
        assert_eq!(
            tokens,
            vec![
                Token::If,
                Token::Env,
                Token::ParenOpen,
                Token::StringLiteral("PACKAGE_FOR_CI".into()),
                Token::ParenClose,
                Token::BraceOpen,
                Token::Flatten,
                Token::BraceClose,
            ]
        );
    }

    #[test]
    fn tokenize_error_on_invalid_char() {
        let result = tokenize("test.pbx", "FROM @image");
        assert!(result.is_err());
    }
}
