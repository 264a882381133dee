use crate::environment::EnvError;
use crate::evaluator::EvalError;
use crate::interpreter::SchemeError;
use crate::parser::ParseError;
use ariadne::{Label, Report, ReportKind, Source};
use std::ops::Range;

type SourceSpan<'a> = (&'a str, Range<usize>);

impl SchemeError {
    /// Builds an `ariadne` report pointing at the offending part of the source.
    pub fn report<'a>(&self, source_id: &'a str, input: &str) -> Report<'a, SourceSpan<'a>> {
        match self {
            SchemeError::Parse(parse_error) => parse_report(parse_error, source_id, input.len()),
            SchemeError::Output(message) => Report::build(ReportKind::Error, (source_id, 0..0))
                .with_message(format!("Cannot write output: {}", message))
                .finish(),
            SchemeError::Eval { error, span } => {
                let range = span.to_range();
                let (message, label) = match error {
                    EvalError::Env(EnvError::UndefinedSymbol(symbol)) => (
                        format!("Undefined symbol `{}`", symbol),
                        "No binding for this symbol in any enclosing scope".to_string(),
                    ),
                    EvalError::Syntax(message) => {
                        ("Syntax error".to_string(), message.clone())
                    }
                    EvalError::Type(message) => ("Type error".to_string(), message.clone()),
                    EvalError::Arithmetic(message) => {
                        ("Arithmetic error".to_string(), message.clone())
                    }
                };
                Report::build(ReportKind::Error, (source_id, range.clone()))
                    .with_message(message)
                    .with_label(Label::new((source_id, range)).with_message(label))
                    .finish()
            }
        }
    }

    /// Prints the report to stderr.
    pub fn pretty_print(&self, source_id: &str, input: &str) -> std::io::Result<()> {
        self.report(source_id, input)
            .eprint((source_id, Source::from(input)))
    }
}

fn parse_report<'a>(
    error: &ParseError,
    source_id: &'a str,
    input_len: usize,
) -> Report<'a, SourceSpan<'a>> {
    let (range, message, label) = match error {
        ParseError::UnexpectedToken { found, expected } => (
            found.span.to_range(),
            format!("Unexpected token: {}", found.kind),
            format!("Expected {}", expected),
        ),
        ParseError::UnexpectedEof(expected) => (
            input_len.saturating_sub(1)..input_len,
            "Unexpected end of input".to_string(),
            format!("Expected {}", expected),
        ),
        ParseError::LexerError(lex_err) => (
            lex_err.span.to_range(),
            "Lexer error".to_string(),
            lex_err.error.to_string(),
        ),
        ParseError::InvalidDotSyntax(span) => (
            span.to_range(),
            "Invalid dot syntax".to_string(),
            "A dot needs at least one element before it".to_string(),
        ),
    };
    Report::build(ReportKind::Error, (source_id, range.clone()))
        .with_message(message)
        .with_label(Label::new((source_id, range)).with_message(label))
        .finish()
}
