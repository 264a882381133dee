use logos::{Lexer, Logos};
use std::fmt;
use thiserror::Error;

use crate::Span;

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\n\r]+")]
#[logos(skip r";[^\n\r]*")] // Line comments
#[logos(error = LexerErrorKind)]
pub enum TokenKind {
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token(".")]
    Dot,
    #[regex(r"[\p{Extended_Pictographic}.a-zA-Z0-9!#$%&*/:<=>?~_^+-]+", |lex| lex.slice().to_owned(), priority = 1)]
    Symbol(String),
    // Wins over Symbol when both match the same digits
    #[regex(r"[-+]?[0-9]+", lex_integer, priority = 3)]
    Integer(i64),
    #[token("#t", |_| true)]
    #[token("#f", |_| false)]
    Boolean(bool),
    #[regex(r#""([^"\\]|\\(.|\n))*.?"#, lex_string)]
    String(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

type LexerResult<T> = Result<T, LexerErrorKind>;

fn lex_integer(lex: &mut Lexer<TokenKind>) -> LexerResult<i64> {
    let digits = lex.slice();
    digits
        .parse()
        .map_err(|_| LexerErrorKind::InvalidNumberFormat(digits.to_owned()))
}

// The regex also accepts an unclosed literal so it can be reported here.
fn lex_string(lex: &mut Lexer<TokenKind>) -> LexerResult<String> {
    let body = lex
        .slice()
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .ok_or(LexerErrorKind::UnterminatedString)?;
    let mut text = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            text.push(c);
            continue;
        }
        let escaped = chars.next().ok_or(LexerErrorKind::UnterminatedString)?;
        text.push(match escaped {
            'n' => '\n',
            'r' => '\r',
            't' => '\t',
            '\\' | '"' => escaped,
            other => return Err(LexerErrorKind::UnknownEscapeSequence(other)),
        });
    }
    Ok(text)
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::LParen => f.write_str("("),
            TokenKind::RParen => f.write_str(")"),
            TokenKind::Dot => f.write_str("."),
            TokenKind::Symbol(name) => f.write_str(name),
            TokenKind::Integer(n) => write!(f, "{}", n),
            TokenKind::Boolean(true) => f.write_str("#t"),
            TokenKind::Boolean(false) => f.write_str("#f"),
            TokenKind::String(text) => write!(f, "{:?}", text),
        }
    }
}

#[derive(Default, Debug, Clone, PartialEq, Error)]
pub enum LexerErrorKind {
    #[error("Unterminated string literal")]
    UnterminatedString,
    #[error("Invalid integer literal: '{0}'")]
    InvalidNumberFormat(String),
    #[error("Unknown escape sequence: '\\{0}'")]
    UnknownEscapeSequence(char),
    #[default]
    #[error("Invalid token")]
    InvalidToken,
}

/// A lexing failure together with the offending stretch of input.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{error}")]
pub struct LexerError {
    pub error: LexerErrorKind,
    pub span: Span,
}

/// Tokenizes the whole input, stopping at the first invalid token.
pub fn tokenize(input: &str) -> Result<Vec<Token>, LexerError> {
    TokenKind::lexer(input)
        .spanned()
        .map(|(result, range)| {
            let span = Span::new(range.start, range.end);
            result
                .map(|kind| Token { kind, span })
                .map_err(|error| LexerError { error, span })
        })
        .collect()
}
