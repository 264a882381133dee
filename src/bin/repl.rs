use std::borrow::Cow;
use std::env;

use log::{debug, warn};
use rustyline::error::ReadlineError;
use rustyline::highlight::{CmdKind, Highlighter};
use rustyline::history::DefaultHistory;
use rustyline::validate::{ValidationContext, ValidationResult, Validator};
use rustyline::{Cmd, Completer, Context, Editor, EventHandler, KeyCode, KeyEvent, Modifiers};
use rustyline::{Helper, Highlighter, Hinter, Validator};
use schemelet::{Env, Environment, LexerErrorKind, SpecialForm, Token, TokenKind, eval_str, tokenize};

const DEFAULT_HISTORY_FILE: &str = "schemelet_history.txt";

struct SchemeletCompleter {
    env: Env,
}

impl SchemeletCompleter {
    fn new(env: Env) -> Self {
        SchemeletCompleter { env }
    }
}

impl rustyline::completion::Completer for SchemeletCompleter {
    type Candidate = String;
    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<String>)> {
        let prefix = match tokenize(&line[..pos]) {
            Ok(tokens) => match tokens.last() {
                Some(Token {
                    kind: TokenKind::Symbol(prefix),
                    span,
                }) if span.end == pos => prefix.clone(),
                _ => return Ok((pos, vec![])),
            },
            Err(_) => return Ok((pos, vec![])),
        };
        let mut candidates: Vec<String> = self
            .env
            .borrow()
            .get_identifiers()
            .into_iter()
            .filter_map(|id| id.strip_prefix(prefix.as_str()).map(str::to_string))
            .filter(|suffix| !suffix.is_empty())
            .collect();
        candidates.sort();
        Ok((pos, candidates))
    }
}

#[derive(Completer, Helper, Highlighter, Hinter, Validator)]
struct ReplHelper {
    #[rustyline(Validator)]
    validator: SchemeletValidator,
    #[rustyline(Highlighter)]
    highlighter: SchemeletHighlighter,
    #[rustyline(Completer)]
    completer: SchemeletCompleter,
}

struct SchemeletValidator;

impl Validator for SchemeletValidator {
    fn validate(&self, ctx: &mut ValidationContext) -> rustyline::Result<ValidationResult> {
        let tokens = match tokenize(ctx.input()) {
            Ok(tokens) => tokens,
            // Keep reading until the string is closed
            Err(e) if e.error == LexerErrorKind::UnterminatedString => {
                return Ok(ValidationResult::Incomplete);
            }
            // Let the evaluator report everything else
            Err(_) => return Ok(ValidationResult::Valid(None)),
        };

        let mut depth: usize = 0;
        for token in &tokens {
            match token.kind {
                TokenKind::LParen => depth += 1,
                TokenKind::RParen if depth == 0 => {
                    return Ok(ValidationResult::Invalid(Some(format!(
                        "  - Unmatched ')' at position {}",
                        token.span.start
                    ))));
                }
                TokenKind::RParen => depth -= 1,
                _ => {}
            }
        }

        if depth > 0 {
            Ok(ValidationResult::Incomplete)
        } else {
            Ok(ValidationResult::Valid(None))
        }
    }
}

struct SchemeletHighlighter;

// Indices of the parenthesis pair next to the cursor, if any
fn matching_parens(tokens: &[Token], pos: usize) -> Option<(usize, usize)> {
    let near_cursor = |token: &Token| token.span.start == pos || token.span.end == pos;
    let mut stack = Vec::new();
    for (i, token) in tokens.iter().enumerate() {
        match token.kind {
            TokenKind::LParen => stack.push(i),
            TokenKind::RParen => {
                if let Some(open) = stack.pop() {
                    if near_cursor(&tokens[open]) || near_cursor(token) {
                        return Some((open, i));
                    }
                }
            }
            _ => {}
        }
    }
    None
}

impl Highlighter for SchemeletHighlighter {
    fn highlight<'l>(&self, line: &'l str, pos: usize) -> Cow<'l, str> {
        let Ok(tokens) = tokenize(line) else {
            return Cow::Borrowed(line);
        };
        let matching = matching_parens(&tokens, pos);
        let is_matched = |i: usize| matches!(matching, Some((open, close)) if i == open || i == close);

        let mut highlighted = String::with_capacity(line.len());
        let mut last = 0;
        for (i, token) in tokens.iter().enumerate() {
            highlighted.push_str(&line[last..token.span.start]);
            let text = &line[token.span.to_range()];
            let color = match &token.kind {
                TokenKind::String(_) => Some("32"), // Green for strings
                TokenKind::Integer(_) | TokenKind::Boolean(_) => Some("33"),
                TokenKind::Symbol(s) if SpecialForm::ALL.iter().any(|form| form.name() == s.as_str()) => {
                    Some("35")
                }
                TokenKind::LParen | TokenKind::RParen if is_matched(i) => Some("1;34"), // Bold blue for the matching pair
                _ => None,
            };
            match color {
                Some(code) => highlighted.push_str(&format!("\x1b[{}m{}\x1b[0m", code, text)),
                None => highlighted.push_str(text),
            }
            last = token.span.end;
        }
        highlighted.push_str(&line[last..]);
        Cow::Owned(highlighted)
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _kind: CmdKind) -> bool {
        true
    }
}

fn main() -> rustyline::Result<()> {
    env_logger::init();

    println!("schemelet REPL v{}", env!("CARGO_PKG_VERSION"));
    println!("Type 'exit' or press Ctrl-D to quit.");

    let history_file =
        env::var("SCHEMELET_HISTORY").unwrap_or_else(|_| DEFAULT_HISTORY_FILE.to_string());
    let edit_mode = if env::var_os("SCHEMELET_VI").is_some() {
        rustyline::EditMode::Vi
    } else {
        rustyline::EditMode::Emacs
    };

    let global_env = Environment::new_global();
    let helper = ReplHelper {
        highlighter: SchemeletHighlighter,
        validator: SchemeletValidator,
        completer: SchemeletCompleter::new(global_env.clone()),
    };
    let config = rustyline::config::Config::builder()
        .edit_mode(edit_mode)
        .build();
    let mut rl: Editor<ReplHelper, DefaultHistory> = Editor::with_config(config)?;
    rl.set_helper(Some(helper));
    rl.bind_sequence(
        KeyEvent(KeyCode::Char('s'), Modifiers::CTRL),
        EventHandler::Simple(Cmd::Newline),
    );
    if rl.load_history(&history_file).is_err() {
        debug!("no previous history at '{}'", history_file);
    }

    loop {
        match rl.readline("schemelet> ") {
            Ok(line) => {
                rl.add_history_entry(line.as_str())?;
                let trimmed_input = line.trim();
                if trimmed_input.is_empty() {
                    continue;
                }
                if trimmed_input.eq_ignore_ascii_case("exit") {
                    break;
                }

                match eval_str(trimmed_input, &global_env) {
                    Ok(Some(result)) => println!("  => {}", result),
                    Ok(None) => {}
                    Err(e) => {
                        if let Err(io_err) = e.pretty_print("repl", trimmed_input) {
                            warn!("failed to render error report: {}", io_err);
                            eprintln!("Error: {}", e);
                        }
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                // Ctrl-C
                println!("Interrupted. Type 'exit' or Ctrl-D to quit.");
            }
            Err(ReadlineError::Eof) => {
                // Ctrl-D
                println!("\nExiting.");
                break;
            }
            Err(err) => {
                eprintln!("Readline Error: {:?}", err);
                break;
            }
        }
    }
    rl.save_history(&history_file)
}
