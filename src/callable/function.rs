//! This module provides [`FinchFunction`].

use crate::{
    ast::{Stmt, WithLine},
    environment::Environment,
    interpreter::{Interpreter, RuntimeError, Unwind},
    object::FinchObject,
};
use std::{cell::RefCell, fmt, rc::Rc};

/// A function that was defined by user Finch code: a `fun` declaration or a `lambda` expression.
#[derive(Clone)]
pub struct FinchFunction {
    /// The name of the function. Lambdas have no name.
    name: Option<String>,

    /// The parameters that this function takes.
    parameters: Box<[WithLine<String>]>,

    /// The body of the function.
    body: Box<[Stmt]>,

    /// The environment that the function was declared in.
    closure: Rc<RefCell<Environment>>,
}

impl fmt::Debug for FinchFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FinchFunction")
            .field("name", &self.name)
            .field("parameters", &self.parameters)
            .field("body", &self.body)
            .finish_non_exhaustive()
    }
}

impl FinchFunction {
    /// Create a new Finch function.
    pub fn new(
        name: Option<String>,
        parameters: impl Into<Box<[WithLine<String>]>>,
        body: impl Into<Box<[Stmt]>>,
        closure: Rc<RefCell<Environment>>,
    ) -> Self {
        Self {
            name,
            parameters: parameters.into(),
            body: body.into(),
            closure,
        }
    }

    /// The name of the function, if it has one.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The number of arguments that this function takes.
    pub fn arity(&self) -> u8 {
        self.parameters
            .len()
            .try_into()
            .expect("Functions can never be declared with more than 255 params")
    }

    /// Call the function.
    ///
    /// The body executes in a fresh environment whose parent is the function's closure, not the
    /// caller's current environment. A `return` is caught here; falling off the end of the body
    /// returns nil.
    pub fn call(
        &self,
        interpreter: &mut Interpreter,
        arguments: Vec<FinchObject>,
    ) -> Result<FinchObject, RuntimeError> {
        let mut environment = Environment::enclosing(Some(Rc::clone(&self.closure)));

        for (parameter, argument) in self.parameters.iter().zip(arguments) {
            environment.define(parameter.value.clone(), argument);
        }

        match interpreter.execute_block(&self.body, Some(Rc::new(RefCell::new(environment)))) {
            Ok(()) => Ok(FinchObject::Nil),
            Err(Unwind::Return(value)) => Ok(value),
            Err(Unwind::Error(e)) => Err(e),
            Err(Unwind::Break | Unwind::Continue) => {
                unreachable!("The resolver rejects loop control flow outside of a loop body")
            }
        }
    }
}
