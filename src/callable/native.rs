//! This module provides the native functions callable from Finch code.

use super::FinchCallable;
use crate::{
    interpreter::{Interpreter, RuntimeError},
    object::FinchObject,
};
use std::time;

/// Return the current Unix time in seconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Clock;

impl FinchCallable for Clock {
    fn name(&self) -> &str {
        "clock"
    }

    fn arity(&self) -> u8 {
        0
    }

    fn call(
        &self,
        _interpreter: &mut Interpreter,
        _arguments: Vec<FinchObject>,
        call_line: usize,
    ) -> Result<FinchObject, RuntimeError> {
        Ok(FinchObject::Number(
            time::SystemTime::now()
                .duration_since(time::UNIX_EPOCH)
                .map_err(|error| RuntimeError {
                    message: format!("NATIVE FUNCTION INTERNAL ERROR: {error:?}"),
                    line: call_line,
                })?
                .as_nanos() as f64
                / 1_000_000_000.0,
        ))
    }
}

/// Convert the given value to a string.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Str;

impl FinchCallable for Str {
    fn name(&self) -> &str {
        "str"
    }

    fn arity(&self) -> u8 {
        1
    }

    fn call(
        &self,
        _interpreter: &mut Interpreter,
        arguments: Vec<FinchObject>,
        call_line: usize,
    ) -> Result<FinchObject, RuntimeError> {
        let [value] = &arguments[..] else {
            return Err(self.bad_arity_error(&arguments, call_line));
        };

        Ok(FinchObject::String(value.print()))
    }
}

/// Return the length of an array.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Len;

impl FinchCallable for Len {
    fn name(&self) -> &str {
        "len"
    }

    fn arity(&self) -> u8 {
        1
    }

    fn call(
        &self,
        _interpreter: &mut Interpreter,
        arguments: Vec<FinchObject>,
        call_line: usize,
    ) -> Result<FinchObject, RuntimeError> {
        let [value] = &arguments[..] else {
            return Err(self.bad_arity_error(&arguments, call_line));
        };

        let FinchObject::Array(elements) = value else {
            return Err(RuntimeError {
                message: "First argument to len must be an array.".to_string(),
                line: call_line,
            });
        };

        Ok(FinchObject::Number(elements.borrow().len() as f64))
    }
}

/// Check that a higher-order native got a callable of the right arity and an array, and return
/// the array's elements.
///
/// The elements are cloned out of the array up front so that the callee is free to mutate the
/// array while we iterate.
fn check_function_and_array(
    native: &str,
    noun: &str,
    expected_arity: u8,
    arity_message: &str,
    arguments: &[FinchObject],
    call_line: usize,
) -> Result<Vec<FinchObject>, RuntimeError> {
    let error = |message: String| RuntimeError {
        message,
        line: call_line,
    };

    let [function, array] = arguments else {
        unreachable!("The interpreter checks arity before calling a native")
    };

    if Interpreter::arity_of(function).is_none() {
        return Err(error(format!(
            "First argument to {native} must be a function."
        )));
    }
    if Interpreter::arity_of(function) != Some(expected_arity) {
        return Err(error(format!("{noun} function must take {arity_message}.")));
    }

    let FinchObject::Array(elements) = array else {
        return Err(error(format!(
            "Second argument to {native} must be an array."
        )));
    };

    Ok(elements.borrow().clone())
}

/// Build a new array by applying a function to every element of an array.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Map;

impl FinchCallable for Map {
    fn name(&self) -> &str {
        "map"
    }

    fn arity(&self) -> u8 {
        2
    }

    fn call(
        &self,
        interpreter: &mut Interpreter,
        arguments: Vec<FinchObject>,
        call_line: usize,
    ) -> Result<FinchObject, RuntimeError> {
        let items = check_function_and_array(
            "map",
            "Map",
            1,
            "exactly one argument",
            &arguments,
            call_line,
        )?;
        let function = &arguments[0];

        let mut applied = Vec::with_capacity(items.len());
        for item in items {
            applied.push(interpreter.call_value(function, vec![item], call_line)?);
        }

        Ok(FinchObject::new_array(applied))
    }
}

/// Build a new array of the elements of an array for which a predicate returns a truthy value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Filter;

impl FinchCallable for Filter {
    fn name(&self) -> &str {
        "filter"
    }

    fn arity(&self) -> u8 {
        2
    }

    fn call(
        &self,
        interpreter: &mut Interpreter,
        arguments: Vec<FinchObject>,
        call_line: usize,
    ) -> Result<FinchObject, RuntimeError> {
        let items = check_function_and_array(
            "filter",
            "Filter",
            1,
            "exactly one argument",
            &arguments,
            call_line,
        )?;
        let function = &arguments[0];

        let mut kept = Vec::new();
        for item in items {
            if interpreter
                .call_value(function, vec![item.clone()], call_line)?
                .is_truthy()
            {
                kept.push(item);
            }
        }

        Ok(FinchObject::new_array(kept))
    }
}

/// Fold an array from the left with a two-argument function.
///
/// An empty array folds to nil and a singleton folds to its only element; otherwise the first
/// element seeds the fold.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Reduce;

impl FinchCallable for Reduce {
    fn name(&self) -> &str {
        "reduce"
    }

    fn arity(&self) -> u8 {
        2
    }

    fn call(
        &self,
        interpreter: &mut Interpreter,
        arguments: Vec<FinchObject>,
        call_line: usize,
    ) -> Result<FinchObject, RuntimeError> {
        let items = check_function_and_array(
            "reduce",
            "Reducer",
            2,
            "exactly two arguments",
            &arguments,
            call_line,
        )?;
        let function = &arguments[0];

        let mut items = items.into_iter();
        let Some(first) = items.next() else {
            return Ok(FinchObject::Nil);
        };

        let mut accumulator = first;
        for item in items {
            accumulator = interpreter.call_value(function, vec![accumulator, item], call_line)?;
        }

        Ok(accumulator)
    }
}
