use crate::evaluator::{EvalError, EvalResult};
use crate::list::{expect_args, expect_at_least};
use crate::types::{Builtin, Value};

/// Calls a built-in function with an already-evaluated argument list.
pub fn apply(builtin: Builtin, args: &Value) -> EvalResult {
    match builtin {
        Builtin::Add => prim_add(args),
        Builtin::Sub => prim_sub(args),
        Builtin::Mul => prim_mul(args),
        Builtin::Div => prim_div(args),
        Builtin::Equals => prim_equals(args),
        Builtin::Cons => prim_cons(args),
        Builtin::Car => prim_car(args),
        Builtin::Cdr => prim_cdr(args),
        Builtin::List => prim_list(args),
    }
}

// Extracts an integer or returns a type error naming the argument position
fn expect_integer(value: &Value, operator: &str, arg_pos: usize) -> EvalResult<i64> {
    match value {
        Value::Integer(n) => Ok(*n),
        other => Err(EvalError::Type(format!(
            "'{}' expects an integer for argument {}, got {} {}",
            operator,
            arg_pos,
            other.type_name(),
            other
        ))),
    }
}

fn overflow(operator: &str) -> EvalError {
    EvalError::Arithmetic(format!("integer overflow in '{}'", operator))
}

/// Folds `func` over `items`, left to right, starting from `start`.
/// `func` returns `None` on overflow.
fn fold_integers<F: Fn(i64, i64) -> Option<i64>>(
    items: &[&Value],
    start: i64,
    first_pos: usize,
    func: F,
    operator: &str,
) -> EvalResult {
    let mut acc = start;
    for (i, item) in items.iter().enumerate() {
        let num = expect_integer(item, operator, first_pos + i)?;
        acc = func(acc, num).ok_or_else(|| overflow(operator))?;
    }
    Ok(Value::Integer(acc))
}

// Shared shape of '-', '*' and '/': at least two arguments, the first is the seed
fn fold_from_first<F: Fn(i64, i64) -> Option<i64>>(
    args: &Value,
    func: F,
    operator: &str,
) -> EvalResult {
    let items = expect_at_least(args, 2, operator)?;
    let first = expect_integer(items[0], operator, 1)?;
    fold_integers(&items[1..], first, 2, func, operator)
}

pub fn prim_add(args: &Value) -> EvalResult {
    // (+) -> 0
    // (+ 1 2 3) -> 6
    let items = args.iter().collect::<EvalResult<Vec<_>>>()?;
    fold_integers(&items, 0, 1, i64::checked_add, "+")
}

pub fn prim_sub(args: &Value) -> EvalResult {
    // (- x y z) -> x - y - z
    fold_from_first(args, i64::checked_sub, "-")
}

pub fn prim_mul(args: &Value) -> EvalResult {
    // (* x y z) -> x * y * z
    fold_from_first(args, i64::checked_mul, "*")
}

/// Integer division rounding toward negative infinity.
fn floor_div(dividend: i64, divisor: i64) -> Option<i64> {
    let quotient = dividend.checked_div(divisor)?;
    if dividend % divisor != 0 && (dividend < 0) != (divisor < 0) {
        Some(quotient - 1)
    } else {
        Some(quotient)
    }
}

pub fn prim_div(args: &Value) -> EvalResult {
    // (/ x y z) -> x / y / z
    let items = expect_at_least(args, 2, "/")?;
    let mut acc = expect_integer(items[0], "/", 1)?;
    for (i, item) in items.iter().enumerate().skip(1) {
        let divisor = expect_integer(item, "/", i + 1)?;
        if divisor == 0 {
            return Err(EvalError::Arithmetic("division by zero".to_string()));
        }
        acc = floor_div(acc, divisor).ok_or_else(|| overflow("/"))?;
    }
    Ok(Value::Integer(acc))
}

pub fn prim_equals(args: &Value) -> EvalResult {
    // (= a b) -> structural equality
    let [left, right] = expect_args(args, "=")?;
    Ok(Value::Boolean(left == right))
}

// --- List Primitives ---

pub fn prim_cons(args: &Value) -> EvalResult {
    // (cons a b) -> (a . b)
    let [car, cdr] = expect_args(args, "cons")?;
    Ok(Value::cons(car.clone(), cdr.clone()))
}

fn expect_pair<'a>(args: &'a Value, operator: &str) -> EvalResult<(&'a Value, &'a Value)> {
    let [arg] = expect_args(args, operator)?;
    match arg {
        Value::Pair(car, cdr) => Ok((car.as_ref(), cdr.as_ref())),
        other => Err(EvalError::Type(format!(
            "'{}' expects a pair, got {} {}",
            operator,
            other.type_name(),
            other
        ))),
    }
}

pub fn prim_car(args: &Value) -> EvalResult {
    let (car, _) = expect_pair(args, "car")?;
    Ok(car.clone())
}

pub fn prim_cdr(args: &Value) -> EvalResult {
    let (_, cdr) = expect_pair(args, "cdr")?;
    Ok(cdr.clone())
}

pub fn prim_list(args: &Value) -> EvalResult {
    // (list item1 item2 ...) -> a fresh copy of the evaluated arguments
    args.length()?;
    Ok(args.clone())
}
