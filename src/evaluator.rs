use crate::environment::{EnvError, Env, Environment};
use crate::types::{Closure, Value};
use crate::{primitives, special_forms};
use log::trace;
use thiserror::Error;

// --- Evaluation Error ---
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error(transparent)]
    Env(#[from] EnvError), // Errors from environment lookup
    #[error("Syntax error: {0}")]
    Syntax(String), // Wrong arity, malformed special form, non-list where a list is required
    #[error("Type error: {0}")]
    Type(String), // Not callable, car/cdr of a non-pair, non-integer arithmetic
    #[error("Arithmetic error: {0}")]
    Arithmetic(String), // Division by zero, overflow
}

// Result type alias for convenience
pub type EvalResult<T = Value> = Result<T, EvalError>;

// --- Evaluate Function ---

/// Evaluates an expression within the specified environment.
///
/// Evaluation is plain structural recursion; nesting depth is bounded by the
/// host stack.
pub fn evaluate(expr: &Value, env: &Env) -> EvalResult {
    match expr {
        // 1. Self-evaluating values
        Value::Integer(_)
        | Value::Boolean(_)
        | Value::String(_)
        | Value::Nil
        | Value::Builtin(_)
        | Value::SpecialForm(_)
        | Value::Closure(_) => Ok(expr.clone()),

        // 2. Symbols: Look up in the environment
        Value::Symbol(name) => Ok(env.borrow().get(name)?),

        // 3. Lists: function application or special form
        Value::Pair(operator, operands) => {
            if !expr.is_list() {
                return Err(EvalError::Syntax(format!(
                    "cannot evaluate dotted pair {}",
                    expr
                )));
            }
            match evaluate(operator, env)? {
                Value::Builtin(builtin) => {
                    let args = evaluate_each(operands, env)?;
                    primitives::apply(builtin, &args)
                }
                Value::Closure(closure) => {
                    let args = evaluate_each(operands, env)?;
                    apply_closure(&closure, &args)
                }
                Value::SpecialForm(form) => special_forms::invoke(form, operands, env),
                other => Err(EvalError::Type(format!(
                    "expected function or special form, got {} {}",
                    other.type_name(),
                    other
                ))),
            }
        }
    }
}

/// Evaluates every element of a list left to right, producing a parallel list.
pub fn evaluate_each(list: &Value, env: &Env) -> EvalResult {
    list.map_list(|item| evaluate(item, env))
}

/// Invokes a closure on an already-evaluated argument list.
pub fn apply_closure(closure: &Closure, args: &Value) -> EvalResult {
    let arity = closure.params.length()?;
    let supplied = args.length()?;
    if arity != supplied {
        return Err(EvalError::Syntax(format!(
            "closure {} expects {} arguments, got {}",
            closure.params, arity, supplied
        )));
    }

    let call_env = Environment::new_enclosed(closure.env.clone());
    {
        let mut frame = call_env.borrow_mut();
        for (param, arg) in closure.params.iter().zip(args.iter()) {
            match param? {
                Value::Symbol(name) => frame.define(name.clone(), arg?.clone()),
                other => {
                    return Err(EvalError::Syntax(format!(
                        "closure parameter must be a symbol, got {}",
                        other
                    )));
                }
            }
        }
    }
    trace!("applying closure {} to {}", closure.params, args);
    evaluate(&closure.body, &call_env)
}
