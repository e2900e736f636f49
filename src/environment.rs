use crate::error::{LoxError, Result};
use crate::token::Token;
use crate::value::Value;
use log::debug;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Shared handle to an environment.  Children and closures hold one of these
/// to their parent, never a copy, so writes are seen by every holder.
pub type EnvRef<'a> = Rc<RefCell<Environment<'a>>>;

/// One scope's bindings plus a link to the enclosing scope.
#[derive(Debug, Default)]
pub struct Environment<'a> {
    values: HashMap<String, Value<'a>>,
    enclosing: Option<EnvRef<'a>>,
}

impl<'a> Environment<'a> {
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    pub fn with_enclosing(enclosing: EnvRef<'a>) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// Create a fresh child scope of `parent`, already wrapped in a handle.
    pub fn child(parent: &EnvRef<'a>) -> EnvRef<'a> {
        Rc::new(RefCell::new(Environment::with_enclosing(Rc::clone(parent))))
    }

    pub fn enclosing(&self) -> Option<EnvRef<'a>> {
        self.enclosing.clone()
    }

    /// Bind `name` in this scope, replacing any previous binding.
    pub fn define(&mut self, name: &str, value: Value<'a>) {
        self.values.insert(name.to_string(), value);
    }

    /// Dynamic lookup along the whole chain; used for globals.
    pub fn get(&self, name: &Token<'_>) -> Result<Value<'a>> {
        if let Some(value) = self.values.get(name.lexeme) {
            Ok(value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name)
        } else {
            Err(undefined(name))
        }
    }

    pub fn assign(&mut self, name: &Token<'_>, value: Value<'a>) -> Result<()> {
        if let Some(slot) = self.values.get_mut(name.lexeme) {
            *slot = value;
            Ok(())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value)
        } else {
            Err(undefined(name))
        }
    }

    /// Walk exactly `distance` parent links from `env`.
    pub fn ancestor(env: &EnvRef<'a>, distance: usize) -> EnvRef<'a> {
        let mut current: EnvRef<'a> = Rc::clone(env);

        for _ in 0..distance {
            let parent = current.borrow().enclosing();
            match parent {
                Some(parent) => current = parent,
                None => break,
            }
        }

        current
    }

    /// Read `name` from the scope `distance` hops above `env`.
    pub fn get_at(env: &EnvRef<'a>, distance: usize, name: &str) -> Option<Value<'a>> {
        let target = Environment::ancestor(env, distance);
        let value = target.borrow().values.get(name).cloned();

        debug!("get_at({}, '{}') -> found={}", distance, name, value.is_some());

        value
    }

    /// Write `name` into the scope `distance` hops above `env`.
    pub fn assign_at(env: &EnvRef<'a>, distance: usize, name: &str, value: Value<'a>) {
        let target = Environment::ancestor(env, distance);
        target.borrow_mut().values.insert(name.to_string(), value);
    }
}

fn undefined(name: &Token<'_>) -> LoxError {
    LoxError::runtime(name, format!("Undefined variable '{}'.", name.lexeme))
}
