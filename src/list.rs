//! Proper-list helpers over chains of `Value::Pair`.
//!
//! A proper list is `Nil` or a pair whose cdr is a proper list. Anything that
//! needs list shape (counting, iterating, evaluating arguments) rejects dotted
//! structures with a syntax error instead of silently stopping at the dot.

use crate::evaluator::{EvalError, EvalResult};
use crate::types::Value;

/// Iterates over the elements of a list, yielding one error and stopping if the
/// chain ends in something other than `Nil`.
pub struct ListIter<'a> {
    whole: &'a Value,
    rest: Option<&'a Value>,
}

impl<'a> Iterator for ListIter<'a> {
    type Item = EvalResult<&'a Value>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.rest? {
            Value::Pair(car, cdr) => {
                self.rest = Some(cdr);
                Some(Ok(car))
            }
            Value::Nil => {
                self.rest = None;
                None
            }
            _ => {
                self.rest = None;
                Some(Err(not_a_list(self.whole)))
            }
        }
    }
}

fn not_a_list(value: &Value) -> EvalError {
    EvalError::Syntax(format!("expected a proper list, got {}", value))
}

impl Value {
    pub fn is_list(&self) -> bool {
        let mut current = self;
        loop {
            match current {
                Value::Nil => return true,
                Value::Pair(_, cdr) => current = cdr,
                _ => return false,
            }
        }
    }

    pub fn iter(&self) -> ListIter<'_> {
        ListIter {
            whole: self,
            rest: Some(self),
        }
    }

    pub fn length(&self) -> EvalResult<usize> {
        self.iter().try_fold(0, |count, item| item.map(|_| count + 1))
    }

    /// Builds a new list of the same length by applying `func` to every element,
    /// left to right. Stops at the first error.
    pub fn map_list<F>(&self, mut func: F) -> EvalResult<Value>
    where
        F: FnMut(&Value) -> EvalResult<Value>,
    {
        self.iter().map(|item| item.and_then(&mut func)).collect()
    }
}

impl FromIterator<Value> for Value {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        let items: Vec<Value> = iter.into_iter().collect();
        items
            .into_iter()
            .rev()
            .fold(Value::Nil, |tail, item| Value::cons(item, tail))
    }
}

/// Destructures an argument list that must hold exactly `N` elements.
pub fn expect_args<'a, const N: usize>(args: &'a Value, name: &str) -> EvalResult<[&'a Value; N]> {
    let items = args.iter().collect::<EvalResult<Vec<_>>>()?;
    let count = items.len();
    items.try_into().map_err(|_| {
        EvalError::Syntax(format!(
            "'{}' expects exactly {} arguments, got {}",
            name, N, count
        ))
    })
}

/// Collects an argument list that must hold at least `min` elements.
pub fn expect_at_least<'a>(args: &'a Value, min: usize, name: &str) -> EvalResult<Vec<&'a Value>> {
    let items = args.iter().collect::<EvalResult<Vec<_>>>()?;
    if items.len() < min {
        return Err(EvalError::Syntax(format!(
            "'{}' expects at least {} arguments, got {}",
            name,
            min,
            items.len()
        )));
    }
    Ok(items)
}
