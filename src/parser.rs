use crate::Span;
use crate::lexer::{LexerError, Token, TokenKind};
use crate::types::{Node, Value};
use std::iter::Peekable;
use std::vec::IntoIter; // To iterate over Vec<Token>
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("Unexpected token '{}' at {}, expected {expected}", .found.kind, .found.span)]
    UnexpectedToken { found: Token, expected: String },
    #[error("Unexpected end of input, expected {0}")]
    UnexpectedEof(String),
    #[error("Lexer error: {0}")]
    LexerError(#[from] LexerError),
    #[error("Invalid syntax for dotted pair at {0}")]
    InvalidDotSyntax(Span),
}

// Result type alias for convenience
pub type ParseResult<T> = Result<T, ParseError>;

pub struct Parser {
    tokens: Peekable<IntoIter<Token>>,
    // End of the most recently consumed token, for spans of whole expressions
    last_end: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Parser {
            tokens: tokens.into_iter().peekable(),
            last_end: 0,
        }
    }

    // Consumes the next token if available.
    fn next_token(&mut self) -> Option<Token> {
        let token = self.tokens.next();
        if let Some(token) = &token {
            self.last_end = token.span.end;
        }
        token
    }

    /// Parses the next top-level expression, or returns `None` once the input
    /// is exhausted.
    pub fn next_expr(&mut self) -> ParseResult<Option<Node>> {
        let Some(start) = self.tokens.peek().map(|token| token.span.start) else {
            return Ok(None);
        };
        let kind = self.parse_expr()?;
        Ok(Some(Node::new(kind, Span::new(start, self.last_end))))
    }

    /// Parses a single S-expression from the token stream.
    pub fn parse_expr(&mut self) -> ParseResult<Value> {
        match self.next_token() {
            Some(token) => self.parse_expr_with_token(token),
            None => Err(ParseError::UnexpectedEof("an expression".to_string())),
        }
    }

    fn parse_expr_with_token(&mut self, token: Token) -> ParseResult<Value> {
        match token.kind {
            TokenKind::LParen => self.parse_list(token.span),
            TokenKind::Symbol(s) => Ok(Value::Symbol(s)),
            TokenKind::Integer(n) => Ok(Value::Integer(n)),
            TokenKind::Boolean(b) => Ok(Value::Boolean(b)),
            TokenKind::String(s) => Ok(Value::String(s)),
            TokenKind::RParen | TokenKind::Dot => Err(ParseError::UnexpectedToken {
                found: token,
                expected: "an atom or '('".to_string(),
            }),
        }
    }

    /// Parses the remainder of a list after its opening parenthesis.
    fn parse_list(&mut self, lparen_span: Span) -> ParseResult<Value> {
        let mut elements = Vec::new();
        let tail = loop {
            let Some(token) = self.next_token() else {
                return Err(ParseError::UnexpectedEof("')'".to_string()));
            };
            match token.kind {
                TokenKind::RParen => break Value::Nil,
                TokenKind::Dot if elements.is_empty() => {
                    return Err(ParseError::InvalidDotSyntax(lparen_span.merge(token.span)));
                }
                TokenKind::Dot => {
                    let tail = self.parse_expr()?;
                    match self.next_token() {
                        Some(Token {
                            kind: TokenKind::RParen,
                            ..
                        }) => break tail,
                        Some(found) => {
                            return Err(ParseError::UnexpectedToken {
                                found,
                                expected: "')' after dotted pair".to_string(),
                            });
                        }
                        None => {
                            return Err(ParseError::UnexpectedEof(
                                "')' after dotted pair".to_string(),
                            ));
                        }
                    }
                }
                _ => elements.push(self.parse_expr_with_token(token)?),
            }
        };
        Ok(elements
            .into_iter()
            .rev()
            .fold(tail, |cdr, car| Value::cons(car, cdr)))
    }

    /// Parses exactly one expression, rejecting any trailing tokens.
    pub fn parse(mut self) -> ParseResult<Node> {
        let node = match self.next_expr()? {
            Some(node) => node,
            None => return Err(ParseError::UnexpectedEof("an expression".to_string())),
        };
        match self.next_token() {
            Some(found) => Err(ParseError::UnexpectedToken {
                found,
                expected: "end of input".to_string(),
            }),
            None => Ok(node),
        }
    }
}

impl Iterator for Parser {
    type Item = ParseResult<Node>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_expr().transpose()
    }
}

// Helper function to lex and parse a single expression (useful for tests and REPL)
pub fn parse_str(input: &str) -> ParseResult<Node> {
    let tokens = crate::lexer::tokenize(input)?;
    Parser::new(tokens).parse()
}

/// Lexes and parses every top-level expression in `input`.
pub fn parse_program(input: &str) -> ParseResult<Vec<Node>> {
    let tokens = crate::lexer::tokenize(input)?;
    Parser::new(tokens).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::LexerErrorKind;

    fn int(n: i64) -> Value {
        Value::Integer(n)
    }

    fn sym(s: &str) -> Value {
        Value::symbol(s)
    }

    fn list_of(values: Vec<Value>) -> Value {
        values.into_iter().collect()
    }

    // Helper for asserting successful parsing
    fn assert_parse(input: &str, expected: Value) {
        match parse_str(input) {
            Ok(result) => assert_eq!(result.kind, expected, "Input: '{}'", input),
            Err(e) => panic!("Parsing failed for input '{}': {}", input, e),
        }
    }

    // Helper for asserting parse errors
    fn assert_parse_error(input: &str, expected_error_variant: ParseError) {
        match parse_str(input) {
            Ok(result) => panic!(
                "Expected parsing to fail for input '{}', but got: {}",
                input, result
            ),
            Err(e) => {
                assert_eq!(
                    std::mem::discriminant(&e),
                    std::mem::discriminant(&expected_error_variant),
                    "Input: '{}', Expected error variant like {:?}, got: {:?}",
                    input,
                    expected_error_variant,
                    e
                );
            }
        }
    }

    fn assert_round_trip(input: &str, expected_output: &str) {
        let node = match parse_str(input) {
            Ok(result) => result,
            Err(e) => panic!("Parsing failed for input '{}': {}", input, e),
        };
        assert_eq!(node.to_string(), expected_output, "Input: '{}'", input);
    }

    fn unexpected_rparen() -> ParseError {
        ParseError::UnexpectedToken {
            found: Token {
                kind: TokenKind::RParen,
                span: Span::default(),
            },
            expected: String::new(),
        }
    }

    #[test]
    fn test_parse_atoms() {
        assert_parse("123", int(123));
        assert_parse("-4", int(-4));
        assert_parse("symbol", sym("symbol"));
        assert_parse("+", sym("+"));
        assert_parse("#t", Value::Boolean(true));
        assert_parse("#f", Value::Boolean(false));
        assert_parse(r#""hello world""#, Value::string("hello world"));
        assert_parse(r#""with \"quotes\"""#, Value::string("with \"quotes\""));
    }

    #[test]
    fn test_parse_empty_list() {
        assert_parse("()", Value::Nil);
        assert_parse("( )", Value::Nil);
    }

    #[test]
    fn test_parse_simple_list() {
        assert_parse("(1 2 3)", list_of(vec![int(1), int(2), int(3)]));
        assert_parse("(+ 10 20)", list_of(vec![sym("+"), int(10), int(20)]));
    }

    #[test]
    fn test_parse_dotted_list() {
        assert_parse("(1 . 2)", Value::cons(int(1), int(2)));
        assert_parse(
            "(1 2 . 3)",
            Value::cons(int(1), Value::cons(int(2), int(3))),
        );
        // A dotted nil tail is just a proper list
        assert_parse("(1 . ())", list_of(vec![int(1)]));
    }

    #[test]
    fn test_parse_nested_list() {
        assert_parse(
            "(a (b c) d)",
            list_of(vec![sym("a"), list_of(vec![sym("b"), sym("c")]), sym("d")]),
        );
        assert_parse("(()())", list_of(vec![Value::Nil, Value::Nil]));
    }

    #[test]
    fn test_rendering_of_parsed_input() {
        assert_round_trip("(define square (lambda (n) (* n n)))", "(define square (lambda (n) (* n n)))");
        assert_round_trip("( a   .  b )", "(a . b)");
        assert_round_trip("(1 2 . 3)", "(1 . (2 . 3))");
        assert_round_trip("\"s\"", "\"s\"");
    }

    #[test]
    fn test_node_span_covers_expression() {
        let node = parse_str("  (+ 1 2) ; trailing").unwrap();
        assert_eq!(node.span, Span::new(2, 9));
    }

    #[test]
    fn test_parse_errors_unexpected_token() {
        assert_parse_error(")", unexpected_rparen());
        assert_parse_error("(1))", unexpected_rparen());
        assert_parse_error("(1 . 2 3)", unexpected_rparen());
        assert_parse_error("(1 . )", unexpected_rparen());
        assert_parse_error("(1 . . 2)", unexpected_rparen());
    }

    #[test]
    fn test_parse_errors_eof() {
        let eof = ParseError::UnexpectedEof(String::new());
        assert_parse_error("", eof.clone());
        assert_parse_error("(1 2", eof.clone());
        assert_parse_error("(", eof.clone());
        assert_parse_error("(1 .", eof.clone());
        assert_parse_error("(1 . 2", eof);
    }

    #[test]
    fn test_parse_error_leading_dot() {
        assert_parse_error("( . 2)", ParseError::InvalidDotSyntax(Span::default()));
    }

    #[test]
    fn test_parse_lexer_error_propagation() {
        assert_parse_error(
            "(1 \"abc",
            ParseError::LexerError(LexerError {
                error: LexerErrorKind::UnterminatedString,
                span: Span::new(3, 7),
            }),
        );
    }

    #[test]
    fn test_next_expr_signals_end_of_input() {
        let tokens = crate::lexer::tokenize("(define x 1) x ; done").unwrap();
        let mut parser = Parser::new(tokens);
        let first = parser.next_expr().unwrap().unwrap();
        assert_eq!(first.to_string(), "(define x 1)");
        assert_eq!(first.span, Span::new(0, 12));
        let second = parser.next_expr().unwrap().unwrap();
        assert_eq!(second.kind, sym("x"));
        assert_eq!(second.span, Span::new(13, 14));
        assert_eq!(parser.next_expr(), Ok(None));
        assert_eq!(parser.next_expr(), Ok(None));
    }

    #[test]
    fn test_parse_program() {
        let nodes = parse_program("1 (2) \"three\"").unwrap();
        let rendered: Vec<String> = nodes.iter().map(|n| n.to_string()).collect();
        assert_eq!(rendered, vec!["1", "(2)", "\"three\""]);
        assert_eq!(parse_program("; nothing here"), Ok(vec![]));
        assert!(parse_program("1 (2").is_err());
    }
}
