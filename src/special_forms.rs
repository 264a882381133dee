use crate::environment::{Env, Environment};
use crate::evaluator::{EvalError, EvalResult, evaluate};
use crate::list::expect_args;
use crate::types::{Closure, SpecialForm, Value};
use log::{debug, trace};
use std::rc::Rc;

/// Runs a special form on its raw, unevaluated operands.
pub fn invoke(form: SpecialForm, operands: &Value, env: &Env) -> EvalResult {
    match form {
        SpecialForm::If => evaluate_if(operands, env),
        SpecialForm::Define => evaluate_define(operands, env),
        SpecialForm::Let => evaluate_let(operands, env),
        SpecialForm::Lambda => evaluate_lambda(operands, env),
    }
}

fn expect_symbol<'a>(value: &'a Value, form: &str) -> EvalResult<&'a str> {
    match value {
        Value::Symbol(name) => Ok(name.as_str()),
        other => Err(EvalError::Syntax(format!(
            "'{}' expects a symbol, got {} {}",
            form,
            other.type_name(),
            other
        ))),
    }
}

fn evaluate_if(operands: &Value, env: &Env) -> EvalResult {
    let [test, consequent, alternative] = expect_args(operands, "if")?;
    // Only the chosen branch is ever evaluated
    if evaluate(test, env)?.is_truthy() {
        evaluate(consequent, env)
    } else {
        evaluate(alternative, env)
    }
}

fn evaluate_define(operands: &Value, env: &Env) -> EvalResult {
    let [name, value_expr] = expect_args(operands, "define")?;
    let name = expect_symbol(name, "define")?;
    let value = evaluate(value_expr, env)?;
    debug!("define '{}' = {}", name, value);
    // Always a global binding, however deeply nested the caller is.
    Environment::global(env)
        .borrow_mut()
        .define(name.to_string(), value.clone());
    Ok(value)
}

fn evaluate_let(operands: &Value, env: &Env) -> EvalResult {
    let [definitions, body] = expect_args(operands, "let")?;
    let let_env = Environment::new_enclosed(env.clone());
    for definition in definitions.iter() {
        let [name, value_expr] = expect_args(definition?, "let binding")?;
        let name = expect_symbol(name, "let")?;
        // Value expressions see the calling environment, never earlier bindings.
        let value = evaluate(value_expr, env)?;
        let_env.borrow_mut().define(name.to_string(), value);
    }
    trace!("let frame for {}", definitions);
    evaluate(body, &let_env)
}

fn evaluate_lambda(operands: &Value, env: &Env) -> EvalResult {
    let [params, body] = expect_args(operands, "lambda")?;
    Ok(Value::Closure(Rc::new(Closure::new(
        env.clone(),
        params.clone(),
        body.clone(),
    ))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::EnvError;
    use crate::parser::parse_program;

    fn int(n: i64) -> Value {
        Value::Integer(n)
    }

    // Evaluates every expression in `input` and returns the last result
    fn run(input: &str, env: &Env) -> EvalResult {
        let nodes = parse_program(input).expect("test input should parse");
        let mut last = Value::Nil;
        for node in nodes {
            last = evaluate(&node.kind, env)?;
        }
        Ok(last)
    }

    fn run_fresh(input: &str) -> EvalResult {
        run(input, &Environment::new_global())
    }

    fn is_syntax_error(result: EvalResult) -> bool {
        matches!(result, Err(EvalError::Syntax(_)))
    }

    #[test]
    fn test_if_branches() {
        assert_eq!(run_fresh("(if #t 1 2)"), Ok(int(1)));
        assert_eq!(run_fresh("(if #f 1 2)"), Ok(int(2)));
        assert_eq!(run_fresh("(if 0 1 2)"), Ok(int(1)));
        assert_eq!(run_fresh("(if () 1 2)"), Ok(int(1)));
        assert_eq!(run_fresh("(if \"\" 1 2)"), Ok(int(1)));
        assert_eq!(run_fresh("(if (= 1 1) 10 20)"), Ok(int(10)));
    }

    #[test]
    fn test_if_does_not_evaluate_unused_branch() {
        // The untaken branch would fail if it were evaluated
        assert_eq!(run_fresh("(if #t 1 (car 5))"), Ok(int(1)));
        assert_eq!(run_fresh("(if #f (undefined-fn) 2)"), Ok(int(2)));
        assert_eq!(run_fresh("(if #t 1 (/ 1 0))"), Ok(int(1)));
    }

    #[test]
    fn test_if_arity() {
        assert!(is_syntax_error(run_fresh("(if)")));
        assert!(is_syntax_error(run_fresh("(if #t 1)")));
        assert!(is_syntax_error(run_fresh("(if #t 1 2 3)")));
    }

    #[test]
    fn test_define_returns_value_and_binds_globally() {
        let env = Environment::new_global();
        assert_eq!(run("(define x 42)", &env), Ok(int(42)));
        assert_eq!(env.borrow().get("x"), Ok(int(42)));
    }

    #[test]
    fn test_define_inside_closure_is_global() {
        let env = Environment::new_global();
        run("(define setter (lambda (v) (define inner v)))", &env).unwrap();
        run("(setter 7)", &env).unwrap();
        assert_eq!(env.borrow().get("inner"), Ok(int(7)));
    }

    #[test]
    fn test_define_inside_let_is_global_but_sees_locals() {
        let env = Environment::new_global();
        run("(let ((y 3)) (define z (+ y 1)))", &env).unwrap();
        assert_eq!(env.borrow().get("z"), Ok(int(4)));
        assert!(matches!(
            env.borrow().get("y"),
            Err(EnvError::UndefinedSymbol(_))
        ));
    }

    #[test]
    fn test_define_overwrites_builtin() {
        let env = Environment::new_global();
        run("(define + -)", &env).unwrap();
        assert_eq!(run("(+ 10 4)", &env), Ok(int(6)));
    }

    #[test]
    fn test_define_errors() {
        assert!(is_syntax_error(run_fresh("(define 1 2)")));
        assert!(is_syntax_error(run_fresh("(define x)")));
        assert!(is_syntax_error(run_fresh("(define x 1 2)")));
        assert!(matches!(
            run_fresh("(define x y)"),
            Err(EvalError::Env(EnvError::UndefinedSymbol(name))) if name == "y"
        ));
    }

    #[test]
    fn test_let() {
        assert_eq!(run_fresh("(let ((x 3) (y 4)) (+ x y))"), Ok(int(7)));
        assert_eq!(run_fresh("(let () 5)"), Ok(int(5)));
    }

    #[test]
    fn test_let_shadows_and_reverts() {
        let env = Environment::new_global();
        run("(define x 1)", &env).unwrap();
        assert_eq!(run("(let ((x 2)) x)", &env), Ok(int(2)));
        assert_eq!(run("x", &env), Ok(int(1)));
    }

    #[test]
    fn test_let_is_parallel() {
        assert!(matches!(
            run_fresh("(let ((x 1) (y x)) y)"),
            Err(EvalError::Env(EnvError::UndefinedSymbol(name))) if name == "x"
        ));

        // Later values still see the outer binding, not the new one
        let env = Environment::new_global();
        run("(define x 10)", &env).unwrap();
        assert_eq!(run("(let ((x 1) (y x)) y)", &env), Ok(int(10)));
    }

    #[test]
    fn test_let_errors() {
        assert!(is_syntax_error(run_fresh("(let ((x 1)))")));
        assert!(is_syntax_error(run_fresh("(let ((x)) x)")));
        assert!(is_syntax_error(run_fresh("(let ((x 1 2)) x)")));
        assert!(is_syntax_error(run_fresh("(let ((1 2)) 1)")));
        assert!(is_syntax_error(run_fresh("(let (x) x)")));
        assert!(is_syntax_error(run_fresh("(let x x)")));
    }

    #[test]
    fn test_lambda_creates_closure_without_evaluating_body() {
        let result = run_fresh("(lambda (x) (car 1))").unwrap();
        match result {
            Value::Closure(closure) => {
                assert_eq!(closure.params.to_string(), "(x)");
                assert_eq!(closure.body.to_string(), "(car 1)");
            }
            other => panic!("Expected closure, got {}", other),
        }
    }

    #[test]
    fn test_lambda_arity() {
        assert!(is_syntax_error(run_fresh("(lambda (x))")));
        assert!(is_syntax_error(run_fresh("(lambda (x) x x)")));
    }

    #[test]
    fn test_special_forms_are_values() {
        assert_eq!(
            run_fresh("if"),
            Ok(Value::SpecialForm(SpecialForm::If))
        );
        let env = Environment::new_global();
        run("(define my-if if)", &env).unwrap();
        assert_eq!(run("(my-if #f 1 2)", &env), Ok(int(2)));
    }
}
