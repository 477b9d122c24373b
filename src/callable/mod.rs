//! This module provides the [`FinchCallable`] trait.

pub mod function;
pub mod native;

use crate::{
    interpreter::{Interpreter, RuntimeError},
    object::FinchObject,
};
use std::fmt;

/// A trait to encompass the ability to call a native object in Finch.
///
/// User-defined functions and lambdas are handled by
/// [`FinchFunction`](self::function::FinchFunction) instead, which needs access to its shared
/// declaration and closure.
pub trait FinchCallable: fmt::Debug {
    /// The name of this function.
    fn name(&self) -> &str;

    /// The number of arguments that this callable takes.
    fn arity(&self) -> u8;

    /// Call the callable and return a value.
    ///
    /// Implementors may assume the arguments list has the length returned by
    /// [`arity`](FinchCallable::arity), since this is checked by the interpreter before calling
    /// this function.
    fn call(
        &self,
        interpreter: &mut Interpreter,
        arguments: Vec<FinchObject>,
        call_line: usize,
    ) -> Result<FinchObject, RuntimeError>;

    /// Return the error for when the argument list has a length that disagrees with the arity.
    fn bad_arity_error(&self, arguments: &[FinchObject], call_line: usize) -> RuntimeError {
        RuntimeError {
            message: format!(
                "Expected {} arguments but got {}.",
                self.arity(),
                arguments.len()
            ),
            line: call_line,
        }
    }
}
