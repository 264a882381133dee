use crate::environment::Env;
use crate::evaluator::{EvalError, evaluate};
use crate::lexer::tokenize;
use crate::parser::{ParseError, Parser};
use crate::source::Span;
use crate::types::Value;
use log::debug;
use std::io::Write;
use thiserror::Error;

/// A failure of a whole run: either the reader or the evaluator gave up.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemeError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("{error}")]
    Eval {
        error: EvalError,
        span: Span, // The top-level expression being evaluated
    },
    #[error("Cannot write output: {0}")]
    Output(String),
}

impl From<std::io::Error> for SchemeError {
    fn from(err: std::io::Error) -> Self {
        SchemeError::Output(err.to_string())
    }
}

/// Evaluates every expression in `input` against `env`, returning the value of
/// the last one (`None` for input with no expressions). The first error aborts
/// the rest of the input.
pub fn eval_str(input: &str, env: &Env) -> Result<Option<Value>, SchemeError> {
    let mut parser = Parser::new(tokenize(input).map_err(ParseError::from)?);
    let mut last = None;
    while let Some(node) = parser.next_expr()? {
        let result = evaluate(&node.kind, env).map_err(|error| SchemeError::Eval {
            error,
            span: node.span,
        })?;
        last = Some(result);
    }
    Ok(last)
}

/// Runs a whole program the way the file driver does: each top-level
/// expression is echoed to `out`, evaluated, and followed by a `"  => value"`
/// line. The first error ends the run; the failing expression is echoed but
/// gets no result line.
pub fn run_transcript<W: Write>(input: &str, env: &Env, out: &mut W) -> Result<(), SchemeError> {
    let mut parser = Parser::new(tokenize(input).map_err(ParseError::from)?);
    while let Some(node) = parser.next_expr()? {
        writeln!(out, "{}", node)?;
        let result = evaluate(&node.kind, env).map_err(|error| SchemeError::Eval {
            error,
            span: node.span,
        })?;
        writeln!(out, "  => {}", result)?;
    }
    debug!("reached end of input");
    Ok(())
}
