use crate::types::{Builtin, SpecialForm, Value};
use log::trace;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;
use thiserror::Error;

// --- Environment Error ---
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EnvError {
    #[error("Undefined symbol: '{0}'")]
    UndefinedSymbol(String),
}

/// Shared handle to one environment frame.
pub type Env = Rc<RefCell<Environment>>;

// --- Environment Definition ---

#[derive(Debug)]
pub struct Environment {
    // Use Rc<RefCell<...>> to allow shared ownership and interior mutability.
    // Needed for closures capturing environments and for global 'define'.
    outer: Option<Env>,
    bindings: HashMap<String, Value>,
}

impl Environment {
    /// Creates a new, empty top-level environment.
    pub fn new() -> Env {
        Rc::new(RefCell::new(Environment {
            outer: None,
            bindings: HashMap::new(),
        }))
    }

    /// Creates the global environment with every built-in function and special
    /// form bound under its name.
    pub fn new_global() -> Env {
        let env_ptr = Environment::new();
        {
            let mut env = env_ptr.borrow_mut();
            for builtin in Builtin::ALL {
                env.define(builtin.name().to_string(), Value::Builtin(builtin));
            }
            for form in SpecialForm::ALL {
                env.define(form.name().to_string(), Value::SpecialForm(form));
            }
        }
        env_ptr
    }

    /// Creates a new environment enclosed within an outer one.
    pub fn new_enclosed(outer_env: Env) -> Env {
        Rc::new(RefCell::new(Environment {
            outer: Some(outer_env),
            bindings: HashMap::new(),
        }))
    }

    /// Walks up the chain to the root environment.
    pub fn global(env: &Env) -> Env {
        let mut current = env.clone();
        loop {
            let outer = current.borrow().outer.clone();
            match outer {
                Some(outer) => current = outer,
                None => return current,
            }
        }
    }

    /// Defines a variable in the *current* environment frame.
    /// Replaces the value if the variable already exists in this frame.
    pub fn define(&mut self, name: String, value: Value) {
        trace!("binding '{}'", name);
        self.bindings.insert(name, value);
    }

    /// Looks up a variable's value.
    /// Checks the current environment first, then walks up the outer environment chain.
    pub fn get(&self, name: &str) -> Result<Value, EnvError> {
        match self.bindings.get(name) {
            Some(value) => Ok(value.clone()),
            None => match &self.outer {
                Some(outer_env_ptr) => outer_env_ptr.borrow().get(name),
                None => Err(EnvError::UndefinedSymbol(name.to_string())),
            },
        }
    }

    /// Gets every identifier visible from this environment.
    pub fn get_identifiers(&self) -> HashSet<String> {
        let mut identifiers: HashSet<String> = self.bindings.keys().cloned().collect();
        if let Some(outer_env_ptr) = &self.outer {
            identifiers.extend(outer_env_ptr.borrow().get_identifiers());
        }
        identifiers
    }
}
