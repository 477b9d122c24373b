//! This module provides [`Environment`].

use crate::{interpreter::RuntimeError, object::FinchObject};
use std::{cell::RefCell, collections::HashMap, rc::Rc};

/// The environment of defined values in the current interpreter session.
///
/// Environments form a tree of frames rather than a LIFO stack: a closure keeps its declaring
/// frame alive for as long as the function value itself lives.
#[derive(Clone, Debug, PartialEq)]
pub struct Environment {
    /// The environment being enclosed by this one.
    pub enclosing: Option<Rc<RefCell<Environment>>>,

    /// A map of variable names to their values.
    pub values: HashMap<String, FinchObject>,
}

impl Default for Environment {
    fn default() -> Self {
        Self::enclosing(None)
    }
}

impl Environment {
    /// Create a new environment enclosing the given environment.
    pub fn enclosing(enclosing: Option<Rc<RefCell<Self>>>) -> Self {
        Self {
            enclosing,
            values: HashMap::new(),
        }
    }

    /// Define a new variable with the given value.
    pub fn define(&mut self, name: String, value: FinchObject) {
        self.values.insert(name, value);
    }

    /// Re-assign an already existing name, searching up the chain of enclosing environments.
    /// Returns a [`RuntimeError`] if the name is undefined.
    pub fn assign(
        &mut self,
        name: &str,
        value: FinchObject,
        line: usize,
    ) -> Result<(), RuntimeError> {
        if let Some(current) = self.values.get_mut(name) {
            *current = value;
            Ok(())
        } else if let Some(env) = &self.enclosing {
            env.borrow_mut().assign(name, value, line)
        } else {
            Err(RuntimeError {
                message: format!("Undefined variable '{name}'."),
                line,
            })
        }
    }

    /// Re-assign an already existing name in the environment at the given depth above this one.
    pub fn assign_at_depth(
        env: &Rc<RefCell<Environment>>,
        depth: usize,
        name: &str,
        value: FinchObject,
    ) {
        let env = Environment::ancestor(env, depth).unwrap_or_else(|| {
            panic!("Resolved environment depth ({depth}) for name '{name}' is too great")
        });
        *env.borrow_mut().values.get_mut(name).unwrap_or_else(|| {
            panic!("Name '{name}' does not exist at expected environment depth ({depth})")
        }) = value;
    }

    /// Get the value of the given name, searching up the chain of enclosing environments.
    /// Returns a [`RuntimeError`] if the name is undefined.
    pub fn get(&self, name: &str, line: usize) -> Result<FinchObject, RuntimeError> {
        if let Some(value) = self.values.get(name) {
            Ok(value.clone())
        } else if let Some(env) = &self.enclosing {
            env.borrow().get(name, line)
        } else {
            Err(RuntimeError {
                message: format!("Undefined variable '{name}'."),
                line,
            })
        }
    }

    /// Get the value of the given name in the environment at the given depth above this one.
    pub fn get_at_depth(env: &Rc<RefCell<Environment>>, depth: usize, name: &str) -> FinchObject {
        Environment::ancestor(env, depth)
            .unwrap_or_else(|| {
                panic!("Resolved environment depth ({depth}) for name '{name}' is too great")
            })
            .borrow()
            .values
            .get(name)
            .unwrap_or_else(|| {
                panic!("Name '{name}' does not exist at expected environment depth ({depth})")
            })
            .clone()
    }

    /// Get the ancestor of this environment at the given distance.
    fn ancestor(
        env: &Rc<RefCell<Environment>>,
        distance: usize,
    ) -> Option<Rc<RefCell<Environment>>> {
        if distance == 0 {
            Some(Rc::clone(env))
        } else {
            let enclosing = match &env.borrow().enclosing {
                Some(x) => Rc::clone(x),
                None => return None,
            };
            Self::ancestor(&enclosing, distance - 1)
        }
    }
}
