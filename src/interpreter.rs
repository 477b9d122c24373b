//! This module provides the [`Interpreter`].

use crate::{
    ast::{BinaryOperator, Expr, ExprId, LogicalOperator, Stmt, UnaryOperator, VarRef, WithLine},
    callable::{
        function::FinchFunction,
        native::{Clock, Filter, Len, Map, Reduce, Str},
    },
    environment::Environment,
    object::{DictKey, FinchObject},
};
use std::{
    cell::RefCell,
    collections::HashMap,
    fmt,
    io::{self, Write},
    rc::Rc,
};
use thiserror::Error;

/// An error encountered by the interpreter at runtime.
#[derive(Clone, Debug, PartialEq, Error)]
pub struct RuntimeError {
    /// The error message.
    pub message: String,

    /// The line where the error occurred.
    pub line: usize,
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RuntimeError({:?})", self.message)
    }
}

/// A signal that unwinds through enclosing statements.
///
/// These are the error arm of statement execution. `Return` is caught by the function call
/// dispatch in [`FinchFunction::call`]; `Break` and `Continue` are caught by the nearest
/// enclosing `while` loop; a `RuntimeError` unwinds all the way to [`Interpreter::interpret`].
pub enum Unwind {
    /// A [`RuntimeError`] has occurred.
    Error(RuntimeError),

    /// Return from the current function with the given value.
    Return(FinchObject),

    /// Exit the nearest enclosing loop.
    Break,

    /// Jump to the next iteration of the nearest enclosing loop.
    Continue,
}

impl From<RuntimeError> for Unwind {
    fn from(value: RuntimeError) -> Self {
        Self::Error(value)
    }
}

/// A result wrapping an [`Unwind`] signal.
type Result<T, E = Unwind> = ::std::result::Result<T, E>;

/// A tree-walk interpreter for Finch.
pub struct Interpreter {
    /// The global environment. It persists for the lifetime of the interpreter, so global
    /// bindings survive across REPL inputs.
    globals: Rc<RefCell<Environment>>,

    /// The current environment. Its chain of enclosing environments always ends at
    /// [`globals`](Self::globals).
    environment: Rc<RefCell<Environment>>,

    /// The resolver's side-table, mapping each local variable use to the depth of the
    /// environment that holds its binding. Uses that are absent from the table are globals.
    locals: HashMap<ExprId, usize>,

    /// Where `print` writes to.
    output: Rc<RefCell<dyn Write>>,
}

impl fmt::Debug for Interpreter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interpreter")
            .field("globals", &self.globals)
            .field("locals", &self.locals)
            .finish_non_exhaustive()
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// Create a new interpreter printing to stdout.
    pub fn new() -> Self {
        Self::with_output(Rc::new(RefCell::new(io::stdout())))
    }

    /// Create a new interpreter printing to the given sink.
    pub fn with_output(output: Rc<RefCell<dyn Write>>) -> Self {
        let mut globals = Environment::default();

        globals.define("clock".to_string(), FinchObject::NativeFunction(Rc::new(Clock)));
        globals.define("str".to_string(), FinchObject::NativeFunction(Rc::new(Str)));
        globals.define("len".to_string(), FinchObject::NativeFunction(Rc::new(Len)));
        globals.define("map".to_string(), FinchObject::NativeFunction(Rc::new(Map)));
        globals.define("filter".to_string(), FinchObject::NativeFunction(Rc::new(Filter)));
        globals.define("reduce".to_string(), FinchObject::NativeFunction(Rc::new(Reduce)));

        let globals = Rc::new(RefCell::new(globals));

        Self {
            environment: Rc::clone(&globals),
            globals,
            locals: HashMap::new(),
            output,
        }
    }

    /// Interpret the given statements, consuming the resolver's locals table for them.
    ///
    /// A runtime error unwinds the whole statement list and is returned to the caller; the table
    /// entries are kept, since closures created by earlier inputs may still reference them.
    pub fn interpret(
        &mut self,
        stmts: &[Stmt],
        locals: HashMap<ExprId, usize>,
    ) -> ::std::result::Result<(), RuntimeError> {
        self.locals.extend(locals);

        match self.execute_statements(stmts) {
            Ok(()) => Ok(()),
            Err(Unwind::Error(e)) => Err(e),
            Err(Unwind::Return(_) | Unwind::Break | Unwind::Continue) => {
                unreachable!("The resolver rejects return/break/continue outside their context")
            }
        }
    }

    /// Execute the given statements.
    fn execute_statements(&mut self, stmts: &[Stmt]) -> Result<()> {
        for stmt in stmts {
            self.execute_statement(stmt)?;
        }
        Ok(())
    }

    /// Execute the given statement.
    fn execute_statement(&mut self, stmt: &Stmt) -> Result<()> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate_expression(expr)?;
            }
            Stmt::Print(expr) => {
                let value = self.evaluate_expression(expr)?;
                let _ = writeln!(self.output.borrow_mut(), "{}", value.print());
            }
            Stmt::VarDecl(name, initializer) => self.execute_var_decl(name, initializer)?,
            Stmt::FunDecl((name, parameters, body)) => {
                let function = FinchFunction::new(
                    Some(name.value.clone()),
                    parameters.clone(),
                    body.clone(),
                    Rc::clone(&self.environment),
                );
                self.environment
                    .borrow_mut()
                    .define(name.value.clone(), FinchObject::Function(Rc::new(function)));
            }
            Stmt::If(condition, then_branch, else_branch) => {
                if self.evaluate_expression(condition)?.is_truthy() {
                    self.execute_statement(then_branch)?;
                } else if let Some(else_branch) = else_branch {
                    self.execute_statement(else_branch)?;
                }
            }
            Stmt::While(condition, body, step) => {
                while self.evaluate_expression(condition)?.is_truthy() {
                    match self.execute_statement(body) {
                        Ok(()) | Err(Unwind::Continue) => {}
                        Err(Unwind::Break) => break,
                        Err(other) => return Err(other),
                    }

                    // The step comes from for-loop desugaring. It runs after continue, but not
                    // after break.
                    if let Some(step) = step {
                        self.evaluate_expression(step)?;
                    }
                }
            }
            Stmt::Return(_, value) => {
                let value = match value {
                    Some(expr) => self.evaluate_expression(expr)?,
                    None => FinchObject::Nil,
                };
                return Err(Unwind::Return(value));
            }
            Stmt::Break(_) => return Err(Unwind::Break),
            Stmt::Continue(_) => return Err(Unwind::Continue),
            Stmt::Block(stmts) => self.execute_block(stmts, None)?,
        }

        Ok(())
    }

    /// Execute a variable declaration in the current environment.
    fn execute_var_decl(
        &mut self,
        name: &WithLine<String>,
        initializer: &Option<Expr>,
    ) -> Result<()> {
        let value = match initializer {
            Some(expr) => self.evaluate_expression(expr)?,
            None => FinchObject::Nil,
        };
        self.environment
            .borrow_mut()
            .define(name.value.clone(), value);
        Ok(())
    }

    /// Execute the given block.
    ///
    /// If the environment argument is Some, then use that environment (this is how a function
    /// call runs its body in a child of its closure). Otherwise, create a new environment
    /// enclosing the current one. Either way, the previous environment is restored on every exit
    /// path, including unwinds.
    pub fn execute_block(
        &mut self,
        stmts: &[Stmt],
        environment: Option<Rc<RefCell<Environment>>>,
    ) -> Result<()> {
        let block_env = environment.unwrap_or_else(|| {
            Rc::new(RefCell::new(Environment::enclosing(Some(Rc::clone(
                &self.environment,
            )))))
        });

        let previous = std::mem::replace(&mut self.environment, block_env);
        let result = self.execute_statements(stmts);
        self.environment = previous;
        result
    }

    /// Evaluate the given expression.
    fn evaluate_expression(
        &mut self,
        expr: &Expr,
    ) -> ::std::result::Result<FinchObject, RuntimeError> {
        Ok(match expr {
            Expr::Nil => FinchObject::Nil,
            Expr::Boolean(b) => FinchObject::Boolean(*b),
            Expr::Number(n) => FinchObject::Number(*n),
            Expr::String(s) => FinchObject::String(s.clone()),
            Expr::Binary(left, operator, right) => {
                let left = self.evaluate_expression(left)?;
                let right = self.evaluate_expression(right)?;
                self.evaluate_binary_expression(*operator, left, right)?
            }
            Expr::Logical(left, operator, right) => {
                let left = self.evaluate_expression(left)?;

                match operator.value {
                    LogicalOperator::And if !left.is_truthy() => FinchObject::Boolean(false),
                    LogicalOperator::Or if left.is_truthy() => FinchObject::Boolean(true),
                    _ => FinchObject::Boolean(self.evaluate_expression(right)?.is_truthy()),
                }
            }
            Expr::Unary(operator, expr) => {
                let value = self.evaluate_expression(expr)?;
                self.evaluate_unary_expression(*operator, value)?
            }
            Expr::Grouping(expr) => self.evaluate_expression(expr)?,
            Expr::Variable(var) => self.look_up_variable(var)?,
            Expr::Assign(var, expr) => {
                let value = self.evaluate_expression(expr)?;
                match self.locals.get(&var.id) {
                    Some(&depth) => Environment::assign_at_depth(
                        &self.environment,
                        depth,
                        &var.name,
                        value.clone(),
                    ),
                    None => self
                        .globals
                        .borrow_mut()
                        .assign(&var.name, value.clone(), var.line)?,
                }
                value
            }
            Expr::Call(callee, arguments, paren_line) => {
                let callee = self.evaluate_expression(callee)?;

                let mut evaluated = Vec::with_capacity(arguments.len());
                for argument in arguments {
                    evaluated.push(self.evaluate_expression(argument)?);
                }

                self.call_value(&callee, evaluated, *paren_line)?
            }
            Expr::Array(values) => {
                let mut elements = Vec::with_capacity(values.len());
                for value in values {
                    elements.push(self.evaluate_expression(value)?);
                }
                FinchObject::new_array(elements)
            }
            Expr::Dictionary(pairs, brace_line) => {
                let mut entries = HashMap::with_capacity(pairs.len() / 2);
                for pair in pairs.chunks_exact(2) {
                    let key = self.evaluate_expression(&pair[0])?;
                    let value = self.evaluate_expression(&pair[1])?;
                    // Later duplicates overwrite earlier ones.
                    entries.insert(self.dict_key(key, *brace_line)?, value);
                }
                FinchObject::new_dictionary(entries)
            }
            Expr::Subscript(subscriptee, index, bracket_line) => {
                match self.evaluate_expression(subscriptee)? {
                    FinchObject::Array(elements) => {
                        let index = self.array_index(index, &elements, *bracket_line)?;
                        let element = elements.borrow()[index].clone();
                        element
                    }
                    FinchObject::Dictionary(entries) => {
                        let key = self.evaluate_expression(index)?;
                        let key = self.dict_key(key, *bracket_line)?;
                        entries
                            .borrow()
                            .get(&key)
                            .cloned()
                            .ok_or_else(|| RuntimeError {
                                message: "Dictionary does not contain given key.".to_string(),
                                line: *bracket_line,
                            })?
                    }
                    other => {
                        return Err(RuntimeError {
                            message: format!(
                                "Can only use subscript operator [] on arrays or dictionaries, not '{}'.",
                                other.type_name()
                            ),
                            line: *bracket_line,
                        })
                    }
                }
            }
            Expr::SubscriptAssign(subscriptee, index, value, bracket_line) => {
                match self.evaluate_expression(subscriptee)? {
                    FinchObject::Array(elements) => {
                        let index = self.array_index(index, &elements, *bracket_line)?;
                        let value = self.evaluate_expression(value)?;
                        *elements
                            .borrow_mut()
                            .get_mut(index)
                            .ok_or_else(|| RuntimeError {
                                message: "Array index out of bounds.".to_string(),
                                line: *bracket_line,
                            })? = value.clone();
                        value
                    }
                    FinchObject::Dictionary(entries) => {
                        let key = self.evaluate_expression(index)?;
                        let key = self.dict_key(key, *bracket_line)?;
                        let value = self.evaluate_expression(value)?;
                        // Insert-or-update: subscript assignment to a fresh key always succeeds.
                        entries.borrow_mut().insert(key, value.clone());
                        value
                    }
                    other => {
                        return Err(RuntimeError {
                            message: format!(
                                "Can only use subscript operator [] on arrays or dictionaries, not '{}'.",
                                other.type_name()
                            ),
                            line: *bracket_line,
                        })
                    }
                }
            }
            Expr::Lambda(parameters, body) => {
                FinchObject::Function(Rc::new(FinchFunction::new(
                    None,
                    parameters.clone(),
                    body.clone(),
                    Rc::clone(&self.environment),
                )))
            }
        })
    }

    /// Look up the value of a variable use, going through the resolver's locals table.
    fn look_up_variable(&self, var: &VarRef) -> ::std::result::Result<FinchObject, RuntimeError> {
        match self.locals.get(&var.id) {
            Some(&depth) => Ok(Environment::get_at_depth(&self.environment, depth, &var.name)),
            None => self.globals.borrow().get(&var.name, var.line),
        }
    }

    /// Call a callable value with already-evaluated arguments, checking arity first.
    pub fn call_value(
        &mut self,
        callee: &FinchObject,
        arguments: Vec<FinchObject>,
        call_line: usize,
    ) -> ::std::result::Result<FinchObject, RuntimeError> {
        let Some(arity) = Self::arity_of(callee) else {
            return Err(RuntimeError {
                message: "Can only call functions.".to_string(),
                line: call_line,
            });
        };

        if arguments.len() != arity as usize {
            return Err(RuntimeError {
                message: format!(
                    "Expected {arity} arguments but got {}.",
                    arguments.len()
                ),
                line: call_line,
            });
        }

        match callee {
            FinchObject::NativeFunction(function) => function.call(self, arguments, call_line),
            FinchObject::Function(function) => function.call(self, arguments),
            _ => unreachable!("arity_of returned Some, so the callee is callable"),
        }
    }

    /// The arity of the given value, or None if it is not callable.
    pub fn arity_of(callee: &FinchObject) -> Option<u8> {
        match callee {
            FinchObject::NativeFunction(function) => Some(function.arity()),
            FinchObject::Function(function) => Some(function.arity()),
            _ => None,
        }
    }

    /// Evaluate an array subscript index: it must be an integral number within bounds.
    fn array_index(
        &mut self,
        index: &Expr,
        elements: &Rc<RefCell<Vec<FinchObject>>>,
        bracket_line: usize,
    ) -> ::std::result::Result<usize, RuntimeError> {
        let FinchObject::Number(number) = self.evaluate_expression(index)? else {
            return Err(RuntimeError {
                message: "Can only use subscript operator [] with integers.".to_string(),
                line: bracket_line,
            });
        };

        if number.floor() != number {
            return Err(RuntimeError {
                message: "Can only use subscript operator [] with integers.".to_string(),
                line: bracket_line,
            });
        }

        if number < 0.0 || number >= elements.borrow().len() as f64 {
            return Err(RuntimeError {
                message: "Array index out of bounds.".to_string(),
                line: bracket_line,
            });
        }

        Ok(number as usize)
    }

    /// Convert an evaluated expression to a dictionary key.
    fn dict_key(
        &self,
        key: FinchObject,
        line: usize,
    ) -> ::std::result::Result<DictKey, RuntimeError> {
        key.as_dict_key().ok_or_else(|| RuntimeError {
            message: format!(
                "Can only use nil, booleans, numbers, and strings as dictionary keys, not '{}'.",
                key.type_name()
            ),
            line,
        })
    }

    /// Evaluate a binary expression.
    fn evaluate_binary_expression(
        &mut self,
        operator: WithLine<BinaryOperator>,
        left: FinchObject,
        right: FinchObject,
    ) -> ::std::result::Result<FinchObject, RuntimeError> {
        use BinaryOperator::*;
        use FinchObject::*;

        let WithLine {
            line,
            value: operator,
        } = operator;

        let unsupported = |left: &FinchObject, right: &FinchObject| {
            Err(RuntimeError {
                message: format!(
                    "Unsupported operation '{operator}' between types '{}' and '{}'.",
                    left.type_name(),
                    right.type_name()
                ),
                line,
            })
        };

        let value = match (&left, &right) {
            (Number(a), Number(b)) => match operator {
                // Division follows IEEE-754, so dividing by zero gives an infinity.
                Slash => Number(a / b),
                Star => Number(a * b),
                Plus => Number(a + b),
                Minus => Number(a - b),
                Greater => Boolean(a > b),
                GreaterEqual => Boolean(a >= b),
                Less => Boolean(a < b),
                LessEqual => Boolean(a <= b),
                BangEqual => Boolean(a != b),
                EqualEqual => Boolean(a == b),
            },
            (String(a), String(b)) => match operator {
                Plus => String(a.clone() + b),
                _ => unsupported(&left, &right)?,
            },
            (Array(a), Array(b)) => match operator {
                Plus => {
                    // A fresh array; the element handles are cloned, not the elements.
                    let mut elements = a.borrow().clone();
                    elements.extend(b.borrow().iter().cloned());
                    FinchObject::new_array(elements)
                }
                _ => unsupported(&left, &right)?,
            },
            _ => unsupported(&left, &right)?,
        };

        Ok(value)
    }

    /// Evaluate a unary expression.
    fn evaluate_unary_expression(
        &mut self,
        operator: WithLine<UnaryOperator>,
        value: FinchObject,
    ) -> ::std::result::Result<FinchObject, RuntimeError> {
        use FinchObject::*;
        use UnaryOperator::*;

        let WithLine {
            line,
            value: operator,
        } = operator;

        match (operator, &value) {
            (Bang, val) => Ok(Boolean(!val.is_truthy())),
            (Minus, Number(n)) => Ok(Number(-*n)),
            (Minus, _) => Err(RuntimeError {
                message: format!(
                    "Unsupported operation '{operator}' on type '{}'.",
                    value.type_name()
                ),
                line,
            }),
        }
    }
}
