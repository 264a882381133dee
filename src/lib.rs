// Declare modules publicly so they are part of the library interface
pub mod environment;
pub mod evaluator;
pub mod interpreter;
pub mod lexer;
pub mod list;
pub mod parser;
pub mod pretty_print;
pub mod primitives;
pub mod source;
pub mod special_forms;
pub mod types;

pub use environment::{EnvError, Env, Environment};
pub use evaluator::{EvalError, EvalResult, evaluate};
pub use interpreter::{SchemeError, eval_str, run_transcript};
pub use lexer::{LexerError, LexerErrorKind, Token, TokenKind, tokenize};
pub use parser::{ParseError, Parser, parse_program, parse_str};
pub use source::Span;
pub use types::{Builtin, Closure, Node, SpecialForm, Value};
