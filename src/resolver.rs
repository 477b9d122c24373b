//! This module provides the [`Resolver`].

use crate::ast::{Expr, ExprId, Stmt, VarRef, WithLine};
use std::{collections::HashMap, fmt};
use thiserror::Error;

/// An error that occurred whilst resolving.
#[derive(Clone, Debug, PartialEq, Error)]
pub struct ResolveError {
    /// The error message.
    pub message: String,

    /// The lexeme the error is attached to.
    pub lexeme: String,

    /// The line where the error occurred.
    pub line: usize,
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ResolveError({:?})", self.message)
    }
}

/// An enum to determine if the [`Resolver`] is currently in a function body. Used to detect badly
/// placed return statements.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum FunctionType {
    /// Top-level code.
    Main,

    /// Inside the body of a function or lambda.
    Local,
}

/// A type to handle resolving and binding names before runtime.
///
/// The resolver walks the AST once, maintaining a stack of lexical scopes, and records for every
/// local variable use how many environments up the chain its binding lives. The interpreter then
/// follows exactly that many parent links instead of searching by name. Global variables are
/// never recorded; absence from the table means a global lookup.
#[derive(Clone, Debug)]
pub struct Resolver {
    /// A stack of local scopes.
    ///
    /// The global scope is not included. Each scope maps a declared name to whether its
    /// initializer has finished; the flag is false between declaration and definition, which is
    /// what catches `var a = a;` in a local scope.
    scopes: Vec<HashMap<String, bool>>,

    /// A map from a variable use to its environment depth.
    locals: HashMap<ExprId, usize>,

    /// The static errors found so far. Resolution carries on after an error so that one bad
    /// declaration doesn't hide the rest.
    errors: Vec<ResolveError>,

    /// Whether we're currently inside a function body.
    current_function: FunctionType,

    /// How many loops we're currently nested inside. Break and continue need at least one.
    loop_depth: usize,
}

impl Resolver {
    /// Resolve the given statements and get the map of local uses to their depths, along with
    /// every static error found.
    pub fn resolve(stmts: &[Stmt]) -> (HashMap<ExprId, usize>, Vec<ResolveError>) {
        let mut resolver = Self {
            scopes: Vec::new(),
            locals: HashMap::new(),
            errors: Vec::new(),
            current_function: FunctionType::Main,
            loop_depth: 0,
        };

        resolver.resolve_stmts(stmts);
        (resolver.locals, resolver.errors)
    }

    /// Resolve a list of statements.
    fn resolve_stmts(&mut self, stmts: &[Stmt]) {
        for stmt in stmts {
            self.resolve_stmt(stmt);
        }
    }

    /// Resolve a single statement.
    fn resolve_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Block(body) => {
                self.begin_scope();
                self.resolve_stmts(body);
                self.end_scope();
            }
            Stmt::VarDecl(name, initializer) => {
                self.declare_name(name);
                if let Some(initializer) = initializer {
                    self.resolve_expr(initializer);
                }
                self.define_name(&name.value);
            }
            Stmt::FunDecl((name, params, body)) => {
                self.declare_name(name);
                self.define_name(&name.value);
                self.resolve_function(params, body);
            }
            Stmt::Expression(expr) | Stmt::Print(expr) => self.resolve_expr(expr),
            Stmt::If(condition, then_branch, else_branch) => {
                self.resolve_expr(condition);
                self.resolve_stmt(then_branch);
                if let Some(else_branch) = else_branch {
                    self.resolve_stmt(else_branch);
                }
            }
            Stmt::While(condition, body, step) => {
                self.resolve_expr(condition);
                self.loop_depth += 1;
                self.resolve_stmt(body);
                self.loop_depth -= 1;
                if let Some(step) = step {
                    self.resolve_expr(step);
                }
            }
            Stmt::Return(line, value) => {
                if self.current_function == FunctionType::Main {
                    self.errors.push(ResolveError {
                        message: "Can't return from top-level code.".to_string(),
                        lexeme: "return".to_string(),
                        line: *line,
                    });
                }
                if let Some(value) = value {
                    self.resolve_expr(value);
                }
            }
            Stmt::Break(line) => {
                if self.loop_depth == 0 {
                    self.errors.push(ResolveError {
                        message: "Can't use 'break' outside of a loop.".to_string(),
                        lexeme: "break".to_string(),
                        line: *line,
                    });
                }
            }
            Stmt::Continue(line) => {
                if self.loop_depth == 0 {
                    self.errors.push(ResolveError {
                        message: "Can't use 'continue' outside of a loop.".to_string(),
                        lexeme: "continue".to_string(),
                        line: *line,
                    });
                }
            }
        }
    }

    /// Resolve a single expression.
    fn resolve_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Variable(var) => {
                if self
                    .scopes
                    .last()
                    .is_some_and(|scope| scope.get(&var.name) == Some(&false))
                {
                    self.errors.push(ResolveError {
                        message: "Can't read local variable in its own initializer.".to_string(),
                        lexeme: var.name.clone(),
                        line: var.line,
                    });
                    return;
                }

                self.resolve_local(var);
            }
            Expr::Assign(var, value) => {
                self.resolve_expr(value);
                self.resolve_local(var);
            }
            Expr::Binary(left, _, right) | Expr::Logical(left, _, right) => {
                self.resolve_expr(left);
                self.resolve_expr(right);
            }
            Expr::Unary(_, expr) | Expr::Grouping(expr) => self.resolve_expr(expr),
            Expr::Call(callee, arguments, _) => {
                self.resolve_expr(callee);
                for argument in arguments {
                    self.resolve_expr(argument);
                }
            }
            Expr::Array(values) => {
                for value in values {
                    self.resolve_expr(value);
                }
            }
            Expr::Dictionary(pairs, _) => {
                for pair in pairs {
                    self.resolve_expr(pair);
                }
            }
            Expr::Subscript(subscriptee, index, _) => {
                self.resolve_expr(subscriptee);
                self.resolve_expr(index);
            }
            Expr::SubscriptAssign(subscriptee, index, value, _) => {
                self.resolve_expr(subscriptee);
                self.resolve_expr(index);
                self.resolve_expr(value);
            }
            Expr::Lambda(params, body) => self.resolve_function(params, body),
            Expr::Nil | Expr::Boolean(_) | Expr::Number(_) | Expr::String(_) => (),
        }
    }

    /// Begin a new local scope.
    fn begin_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    /// End a local scope.
    fn end_scope(&mut self) {
        self.scopes.pop();
    }

    /// Declare the given name to exist in the current scope, but not yet be defined.
    fn declare_name(&mut self, name: &WithLine<String>) {
        let Some(scope) = self.scopes.last_mut() else {
            // Globals are not tracked.
            return;
        };

        if scope.contains_key(&name.value) {
            self.errors.push(ResolveError {
                message: "Already a variable with this name in this scope.".to_string(),
                lexeme: name.value.clone(),
                line: name.line,
            });
        }
        scope.insert(name.value.clone(), false);
    }

    /// Define the given name in the current scope, marking its initializer as finished.
    fn define_name(&mut self, name: &str) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), true);
        }
    }

    /// Resolve a name in a local scope by walking the scope stack from the innermost scope
    /// outward, recording the depth of the first scope that declares the name.
    fn resolve_local(&mut self, var: &VarRef) {
        let top = self.scopes.len().saturating_sub(1);

        for (idx, scope) in self.scopes.iter().enumerate().rev() {
            if scope.contains_key(&var.name) {
                self.locals.insert(var.id, top - idx);
                return;
            }
        }
    }

    /// Resolve a function or lambda body.
    ///
    /// The loop depth resets inside the body: a `break` in a function declared inside a loop
    /// cannot jump out of the call.
    fn resolve_function(&mut self, params: &[WithLine<String>], body: &[Stmt]) {
        let enclosing_function = self.current_function;
        let enclosing_loop_depth = self.loop_depth;
        self.current_function = FunctionType::Local;
        self.loop_depth = 0;

        self.begin_scope();
        for param in params {
            self.declare_name(param);
            self.define_name(&param.value);
        }
        self.resolve_stmts(body);
        self.end_scope();

        self.current_function = enclosing_function;
        self.loop_depth = enclosing_loop_depth;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{parser::Parser, scanner::Scanner};

    fn resolve(code: &str) -> (HashMap<ExprId, usize>, Vec<ResolveError>, Vec<Stmt>) {
        let stmts = Parser::parse(Scanner::scan_tokens(code));
        let (locals, errors) = Resolver::resolve(&stmts);
        (locals, errors, stmts)
    }

    /// Collect the ids of every `Variable` and `Assign` node with the given name.
    fn find_uses(stmts: &[Stmt], name: &str) -> Vec<ExprId> {
        fn walk_stmt(stmt: &Stmt, name: &str, found: &mut Vec<ExprId>) {
            match stmt {
                Stmt::Expression(e) | Stmt::Print(e) => walk_expr(e, name, found),
                Stmt::VarDecl(_, Some(e)) => walk_expr(e, name, found),
                Stmt::VarDecl(_, None) => {}
                Stmt::FunDecl((_, _, body)) => {
                    for stmt in body {
                        walk_stmt(stmt, name, found);
                    }
                }
                Stmt::If(c, t, e) => {
                    walk_expr(c, name, found);
                    walk_stmt(t, name, found);
                    if let Some(e) = e {
                        walk_stmt(e, name, found);
                    }
                }
                Stmt::While(c, b, s) => {
                    walk_expr(c, name, found);
                    walk_stmt(b, name, found);
                    if let Some(s) = s {
                        walk_expr(s, name, found);
                    }
                }
                Stmt::Return(_, Some(e)) => walk_expr(e, name, found),
                Stmt::Return(_, None) | Stmt::Break(_) | Stmt::Continue(_) => {}
                Stmt::Block(body) => {
                    for stmt in body {
                        walk_stmt(stmt, name, found);
                    }
                }
            }
        }

        fn walk_expr(expr: &Expr, name: &str, found: &mut Vec<ExprId>) {
            match expr {
                Expr::Variable(var) => {
                    if var.name == name {
                        found.push(var.id);
                    }
                }
                Expr::Assign(var, value) => {
                    if var.name == name {
                        found.push(var.id);
                    }
                    walk_expr(value, name, found);
                }
                Expr::Binary(l, _, r) | Expr::Logical(l, _, r) => {
                    walk_expr(l, name, found);
                    walk_expr(r, name, found);
                }
                Expr::Unary(_, e) | Expr::Grouping(e) => walk_expr(e, name, found),
                Expr::Call(callee, args, _) => {
                    walk_expr(callee, name, found);
                    for arg in args {
                        walk_expr(arg, name, found);
                    }
                }
                Expr::Array(values) => {
                    for value in values {
                        walk_expr(value, name, found);
                    }
                }
                Expr::Dictionary(pairs, _) => {
                    for pair in pairs {
                        walk_expr(pair, name, found);
                    }
                }
                Expr::Subscript(s, i, _) => {
                    walk_expr(s, name, found);
                    walk_expr(i, name, found);
                }
                Expr::SubscriptAssign(s, i, v, _) => {
                    walk_expr(s, name, found);
                    walk_expr(i, name, found);
                    walk_expr(v, name, found);
                }
                Expr::Lambda(_, body) => {
                    for stmt in body {
                        walk_stmt(stmt, name, found);
                    }
                }
                Expr::Nil | Expr::Boolean(_) | Expr::Number(_) | Expr::String(_) => {}
            }
        }

        let mut found = Vec::new();
        for stmt in stmts {
            walk_stmt(stmt, name, &mut found);
        }
        found
    }

    #[test]
    fn globals_are_not_recorded() {
        let (locals, errors, stmts) = resolve("var a = 1; print a;");
        assert!(errors.is_empty());
        assert!(locals.is_empty());
        assert_eq!(find_uses(&stmts, "a").len(), 1);
    }

    #[test]
    fn depths_count_environments_not_scopes() {
        let (locals, errors, stmts) = resolve("{ var a = 1; { print a; a = 2; } }");
        assert!(errors.is_empty(), "{errors:?}");

        let uses = find_uses(&stmts, "a");
        assert_eq!(uses.len(), 2);
        // both uses sit one block below the declaration, and nothing else is in the table
        assert_eq!(locals.len(), 2);
        assert_eq!(locals.get(&uses[0]), Some(&1));
        assert_eq!(locals.get(&uses[1]), Some(&1));
    }

    #[test]
    fn innermost_declaration_wins() {
        let (locals, _, stmts) = resolve("{ var a = 1; { var a = 2; print a; } }");

        let uses = find_uses(&stmts, "a");
        assert_eq!(uses.len(), 1);
        assert_eq!(locals.get(&uses[0]), Some(&0));
    }

    #[test]
    fn function_parameters_resolve_at_depth_zero() {
        let (locals, errors, stmts) = resolve("fun f(x) { return x; }");
        assert!(errors.is_empty(), "{errors:?}");

        let uses = find_uses(&stmts, "x");
        assert_eq!(uses.len(), 1);
        assert_eq!(locals.get(&uses[0]), Some(&0));
    }

    #[test]
    fn closures_resolve_through_function_scopes() {
        let (locals, errors, stmts) =
            resolve("fun make() { var i = 0; fun inc() { i = i + 1; return i; } return inc; }");
        assert!(errors.is_empty(), "{errors:?}");

        let uses = find_uses(&stmts, "i");
        // i = ..., ... = i + 1, return i, all inside inc's body scope: one environment up
        assert_eq!(uses.len(), 3);
        for id in uses {
            assert_eq!(locals.get(&id), Some(&1));
        }
    }

    #[test]
    fn self_reference_in_initializer_is_an_error() {
        let (_, errors, _) = resolve("var a = 1; { var a = a + 1; }");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("its own initializer"));
    }

    #[test]
    fn duplicate_declaration_in_scope_is_an_error() {
        let (_, errors, _) = resolve("{ var a = 1; var a = 2; }");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("Already a variable"));
    }

    #[test]
    fn global_redeclaration_is_allowed() {
        let (_, errors, _) = resolve("var a = 1; var a = 2;");
        assert!(errors.is_empty());
    }

    #[test]
    fn return_outside_function_is_an_error() {
        let (_, errors, _) = resolve("return 5;");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("top-level"));
    }

    #[test]
    fn break_and_continue_outside_loop_are_errors() {
        let (_, errors, _) = resolve("break;");
        assert_eq!(errors.len(), 1);

        let (_, errors, _) = resolve("continue;");
        assert_eq!(errors.len(), 1);

        let (_, errors, _) = resolve("while (true) { break; continue; }");
        assert!(errors.is_empty());
    }

    #[test]
    fn break_cannot_escape_a_function_body() {
        let (_, errors, _) = resolve("while (true) { fun f() { break; } }");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("break"));
    }

    #[test]
    fn lambda_bodies_allow_return() {
        let (_, errors, _) = resolve("var f = lambda(x) => { return x; };");
        assert!(errors.is_empty(), "{errors:?}");
    }

    #[test]
    fn errors_accumulate() {
        let (_, errors, _) = resolve("return 1; break; { var a = 1; var a = 2; }");
        assert_eq!(errors.len(), 3);
    }
}
