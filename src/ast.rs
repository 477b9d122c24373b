//! This module handles the AST.

use std::{
    fmt,
    ops::Deref,
    sync::atomic::{AtomicUsize, Ordering},
};

/// Wrap a value with the source line it came from.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct WithLine<T> {
    /// The line of the value.
    pub line: usize,

    /// The value itself.
    pub value: T,
}

impl<T> Deref for WithLine<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.value
    }
}

/// A unique id for a resolvable expression node.
///
/// The resolver's side-table is keyed by these ids. They come from a process-wide counter, so ids
/// stay unique across separate parses and the table can safely accumulate over REPL inputs.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct ExprId(usize);

impl ExprId {
    /// Allocate a fresh id.
    pub fn next() -> Self {
        /// The id to hand out next.
        static NEXT: AtomicUsize = AtomicUsize::new(0);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// A use of a named variable: a read ([`Expr::Variable`]) or a write target ([`Expr::Assign`]).
#[derive(Clone, Debug, PartialEq)]
pub struct VarRef {
    /// The id that keys this node in the resolver's locals table.
    pub id: ExprId,

    /// The name of the variable.
    pub name: String,

    /// The line of the use.
    pub line: usize,
}

/// A binary operator - includes arithmetic and comparison.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[allow(clippy::missing_docs_in_private_items)]
pub enum BinaryOperator {
    Slash,
    Star,
    Plus,
    Minus,
    Greater,
    GreaterEqual,
    Less,
    LessEqual,
    BangEqual,
    EqualEqual,
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Slash => "/",
                Self::Star => "*",
                Self::Plus => "+",
                Self::Minus => "-",
                Self::Greater => ">",
                Self::GreaterEqual => ">=",
                Self::Less => "<",
                Self::LessEqual => "<=",
                Self::BangEqual => "!=",
                Self::EqualEqual => "==",
            }
        )
    }
}

/// A binary logic operator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[allow(clippy::missing_docs_in_private_items)]
pub enum LogicalOperator {
    And,
    Or,
}

impl fmt::Display for LogicalOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::And => "and",
                Self::Or => "or",
            }
        )
    }
}

/// A unary operator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[allow(clippy::missing_docs_in_private_items)]
pub enum UnaryOperator {
    Bang,
    Minus,
}

impl fmt::Display for UnaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Bang => "!",
                Self::Minus => "-",
            }
        )
    }
}

/// A list of all the possible expressions.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// Nothing.
    Nil,

    /// A boolean.
    Boolean(bool),

    /// A number.
    Number(f64),

    /// A string.
    String(String),

    /// (left_expr, operator, right_expr).
    Binary(Box<Expr>, WithLine<BinaryOperator>, Box<Expr>),

    /// (left_expr, operator, right_expr).
    Logical(Box<Expr>, WithLine<LogicalOperator>, Box<Expr>),

    /// (operator, expr).
    Unary(WithLine<UnaryOperator>, Box<Expr>),

    /// Parens around expression.
    Grouping(Box<Expr>),

    /// A read of a named variable.
    Variable(VarRef),

    /// (target, new_value).
    Assign(VarRef, Box<Expr>),

    /// (callee, arguments, close_paren_line).
    Call(Box<Expr>, Vec<Expr>, usize),

    /// An array literal.
    Array(Vec<Expr>),

    /// A dictionary literal as a flat list of alternating keys and values, with the line of the
    /// opening brace.
    ///
    /// The list always has even length.
    Dictionary(Vec<Expr>, usize),

    /// (subscriptee, index, bracket_line).
    Subscript(Box<Expr>, Box<Expr>, usize),

    /// (subscriptee, index, new_value, bracket_line).
    SubscriptAssign(Box<Expr>, Box<Expr>, Box<Expr>, usize),

    /// (parameters, body).
    Lambda(Vec<WithLine<String>>, Vec<Stmt>),
}

/// A function declaration. (identifier, parameters, body).
pub type FunctionDecl = (WithLine<String>, Vec<WithLine<String>>, Vec<Stmt>);

/// A list of all the possible statements.
#[derive(Clone, Debug, PartialEq)]
pub enum Stmt {
    /// See [`Expr`].
    Expression(Expr),

    /// (expr).
    Print(Expr),

    /// (identifier, initializer).
    VarDecl(WithLine<String>, Option<Expr>),

    /// (identifier, parameters, body).
    FunDecl(FunctionDecl),

    /// (condition, then_branch, else_branch).
    If(Expr, Box<Stmt>, Option<Box<Stmt>>),

    /// (condition, body, step).
    ///
    /// The step slot is only ever populated by for-loop desugaring. It runs after the body on
    /// every iteration, including iterations cut short by `continue`, but not after `break`.
    While(Expr, Box<Stmt>, Option<Expr>),

    /// (keyword_line, return_value).
    Return(usize, Option<Expr>),

    /// (keyword_line).
    Break(usize),

    /// (keyword_line).
    Continue(usize),

    /// (body).
    Block(Vec<Stmt>),
}
