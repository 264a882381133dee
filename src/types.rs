use crate::environment::Env;
use crate::source::Span;
use std::fmt; // For custom display formatting
use std::rc::Rc;

/// A parsed top-level expression together with the source span it covers.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: Value, // The expression tree handed to the evaluator
    pub span: Span,  // The source span it covers
}

impl Node {
    pub fn new(kind: Value, span: Span) -> Self {
        Node { kind, span }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Delegate to Value's Display implementation
        write!(f, "{}", self.kind)
    }
}

/// Every evaluable entity: both code (the parsed expression tree) and data.
///
/// Pairs own their children, so `clone()` on a pair is a deep copy of the whole
/// structure. Every other variant is either a scalar or shared behind an `Rc`,
/// so cloning it is effectively an identity copy.
#[derive(Debug, Clone)]
pub enum Value {
    Integer(i64),
    Boolean(bool),   // #t or #f
    String(String),  // Rendered with surrounding quotes
    Symbol(String),  // e.g., +, variable-name, lambda
    Nil,             // The empty list '()
    Pair(Box<Value>, Box<Value>),
    Builtin(Builtin),
    SpecialForm(SpecialForm),
    Closure(Rc<Closure>),
}

impl Value {
    pub fn cons(car: Value, cdr: Value) -> Value {
        Value::Pair(Box::new(car), Box::new(cdr))
    }

    pub fn symbol(name: impl Into<String>) -> Value {
        Value::Symbol(name.into())
    }

    pub fn string(s: impl Into<String>) -> Value {
        Value::String(s.into())
    }

    /// Only `#f` is false; every other value counts as true.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Boolean(false))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "integer",
            Value::Boolean(_) => "boolean",
            Value::String(_) => "string",
            Value::Symbol(_) => "symbol",
            Value::Nil => "nil",
            Value::Pair(_, _) => "pair",
            Value::Builtin(_) => "builtin",
            Value::SpecialForm(_) => "special form",
            Value::Closure(_) => "closure",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(n) => write!(f, "{}", n),
            Value::Boolean(b) => write!(f, "{}", if *b { "#t" } else { "#f" }),
            Value::String(s) => write!(f, "\"{}\"", s),
            Value::Symbol(s) => write!(f, "{}", s),
            Value::Nil => write!(f, "()"),
            // Every link of an improper chain shares its tail, so the whole
            // chain is written in dot notation without re-checking each cdr.
            Value::Pair(_, _) if !self.is_list() => {
                let mut current = self;
                let mut depth = 0;
                while let Value::Pair(car, cdr) = current {
                    write!(f, "({} . ", car)?;
                    depth += 1;
                    current = cdr;
                }
                write!(f, "{}", current)?;
                for _ in 0..depth {
                    write!(f, ")")?;
                }
                Ok(())
            }
            Value::Pair(_, _) => {
                write!(f, "(")?;
                let mut current = self;
                let mut first = true;
                while let Value::Pair(car, cdr) = current {
                    if !first {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", car)?;
                    first = false;
                    current = cdr;
                }
                write!(f, ")")
            }
            Value::Builtin(builtin) => write!(f, "#<builtin:{}>", builtin.name()),
            Value::SpecialForm(form) => write!(f, "#<special-form:{}>", form.name()),
            Value::Closure(closure) => write!(f, "#<closure:{}>", closure.params),
        }
    }
}

// Structural equality for data; identity for closures, whose captured
// environments are not comparable.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Symbol(a), Value::Symbol(b)) => a == b,
            (Value::Nil, Value::Nil) => true,
            (Value::Pair(car1, cdr1), Value::Pair(car2, cdr2)) => car1 == car2 && cdr1 == cdr2,
            (Value::Builtin(a), Value::Builtin(b)) => a == b,
            (Value::SpecialForm(a), Value::SpecialForm(b)) => a == b,
            (Value::Closure(a), Value::Closure(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// The fixed set of built-in functions. Each receives already-evaluated arguments.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Builtin {
    Add,
    Sub,
    Mul,
    Div,
    Equals,
    Cons,
    Car,
    Cdr,
    List,
}

impl Builtin {
    pub const ALL: [Builtin; 9] = [
        Builtin::Add,
        Builtin::Sub,
        Builtin::Mul,
        Builtin::Div,
        Builtin::Equals,
        Builtin::Cons,
        Builtin::Car,
        Builtin::Cdr,
        Builtin::List,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Builtin::Add => "+",
            Builtin::Sub => "-",
            Builtin::Mul => "*",
            Builtin::Div => "/",
            Builtin::Equals => "=",
            Builtin::Cons => "cons",
            Builtin::Car => "car",
            Builtin::Cdr => "cdr",
            Builtin::List => "list",
        }
    }
}

/// The fixed set of special forms. Each receives its raw argument list and the
/// calling environment.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SpecialForm {
    If,
    Define,
    Let,
    Lambda,
}

impl SpecialForm {
    pub const ALL: [SpecialForm; 4] = [
        SpecialForm::If,
        SpecialForm::Define,
        SpecialForm::Let,
        SpecialForm::Lambda,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SpecialForm::If => "if",
            SpecialForm::Define => "define",
            SpecialForm::Let => "let",
            SpecialForm::Lambda => "lambda",
        }
    }
}

/// A `lambda` value: formal parameters and body closed over the defining environment.
pub struct Closure {
    pub env: Env,
    pub params: Value, // Expected to be a proper list of symbols, checked on invocation
    pub body: Value,
}

impl Closure {
    pub fn new(env: Env, params: Value, body: Value) -> Self {
        Closure { env, params, body }
    }
}

// The captured environment may contain this very closure, so it is left out.
impl fmt::Debug for Closure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Closure")
            .field("params", &self.params)
            .field("body", &self.body)
            .finish_non_exhaustive()
    }
}
