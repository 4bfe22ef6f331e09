use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::{NoxError, Result};
use crate::token::Token;
use crate::value::Value;

/// One lexical scope frame.  Frames form a chain through `enclosing`; the
/// global frame (and each module's top-level frame) has no enclosing link.
#[derive(Debug, Clone)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<Rc<RefCell<Environment>>>,
}

impl Default for Environment {
    fn default() -> Self {
        Environment::new()
    }
}

impl Environment {
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    pub fn with_enclosing(enclosing: Rc<RefCell<Environment>>) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    pub fn define(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    /// The declaration statements use this to reject redefinition within one
    /// frame; shadowing in an inner frame stays legal.
    pub fn is_defined_locally(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Direct read of this frame only.  The module loader uses it to collect
    /// exported bindings without walking enclosing scopes.
    pub fn get_local(&self, name: &str) -> Option<Value> {
        self.values.get(name).cloned()
    }

    pub fn get(&self, name: &Token) -> Result<Value> {
        if let Some(value) = self.values.get(&name.lexeme) {
            Ok(value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name)
        } else {
            Err(NoxError::runtime(
                name,
                format!("Undefined variable '{}'.", name.lexeme),
            ))
        }
    }

    pub fn assign(&mut self, name: &Token, value: Value) -> Result<()> {
        if self.values.contains_key(&name.lexeme) {
            self.values.insert(name.lexeme.clone(), value);
            Ok(())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value)
        } else {
            Err(NoxError::runtime(
                name,
                format!("Undefined variable '{}'.", name.lexeme),
            ))
        }
    }

    /// Outermost frame of the chain: the global environment of whatever
    /// top level this scope descends from (the script's globals, or a
    /// module's own top level).  Unresolved references land here.
    pub fn root(env: &Rc<RefCell<Environment>>) -> Rc<RefCell<Environment>> {
        let mut current = Rc::clone(env);

        loop {
            let next = current.borrow().enclosing.clone();
            match next {
                Some(enclosing) => current = enclosing,
                None => return current,
            }
        }
    }

    /// Frame exactly `distance` hops up the chain, or None when the chain is
    /// shorter (which only happens if the resolver recorded a bad depth).
    pub fn ancestor(
        env: &Rc<RefCell<Environment>>,
        distance: usize,
    ) -> Option<Rc<RefCell<Environment>>> {
        let mut current = Rc::clone(env);

        for _ in 0..distance {
            let next = current.borrow().enclosing.clone()?;
            current = next;
        }

        Some(current)
    }

    /// Distance-addressed read.  The resolver guarantees the name exists at
    /// that depth; a miss is surfaced as None for the caller to diagnose.
    pub fn get_at(env: &Rc<RefCell<Environment>>, distance: usize, name: &str) -> Option<Value> {
        let frame = Environment::ancestor(env, distance)?;
        let value = frame.borrow().values.get(name).cloned();
        value
    }

    /// Distance-addressed write; returns false on a resolver/runtime
    /// disagreement.
    pub fn assign_at(
        env: &Rc<RefCell<Environment>>,
        distance: usize,
        name: &str,
        value: Value,
    ) -> bool {
        match Environment::ancestor(env, distance) {
            Some(frame) => {
                frame.borrow_mut().values.insert(name.to_string(), value);
                true
            }
            None => false,
        }
    }
}
