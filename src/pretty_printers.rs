//! This module provides pretty-printers for the AST.

use crate::ast::{Expr, Stmt, WithLine};

/// Pretty-print the AST with clarifying parentheses.
///
/// Binary, logical, unary, and assignment expressions always print parenthesized, and grouping
/// nodes print transparently, so printing a parse of the printer's own output reproduces it.
pub struct ParenPrinter;

impl ParenPrinter {
    /// Print the statements with extra parentheses.
    pub fn print_stmts(stmts: &[Stmt]) -> String {
        stmts
            .iter()
            .map(Self::print_stmt)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Print a single statement.
    pub fn print_stmt(stmt: &Stmt) -> String {
        match stmt {
            Stmt::Expression(expr) => format!("{};", Self::print_expr(expr)),
            Stmt::Print(expr) => format!("print {};", Self::print_expr(expr)),
            Stmt::VarDecl(name, initializer) => format!(
                "var {}{};",
                name.value,
                initializer
                    .as_ref()
                    .map(|expr| format!(" = {}", Self::print_expr(expr)))
                    .unwrap_or_default()
            ),
            Stmt::FunDecl((name, parameters, body)) => format!(
                "fun {}({}) {{\n{}\n}}",
                name.value,
                Self::print_params(parameters),
                Self::print_stmts(body)
            ),
            Stmt::If(condition, then_branch, else_branch) => {
                let mut string = format!(
                    "if ({}) {}",
                    Self::print_expr(condition),
                    Self::print_stmt(then_branch)
                );
                if let Some(else_branch) = else_branch {
                    string.push_str(&format!(" else {}", Self::print_stmt(else_branch)));
                }
                string
            }
            // A while loop with a step slot came from for-loop desugaring, so it prints in
            // for-loop form.
            Stmt::While(condition, body, Some(step)) => format!(
                "for (; {}; {}) {}",
                Self::print_expr(condition),
                Self::print_expr(step),
                Self::print_stmt(body)
            ),
            Stmt::While(condition, body, None) => format!(
                "while ({}) {}",
                Self::print_expr(condition),
                Self::print_stmt(body)
            ),
            Stmt::Return(_, expr) => format!(
                "return{};",
                expr.as_ref()
                    .map(|expr| format!(" {}", Self::print_expr(expr)))
                    .unwrap_or_default()
            ),
            Stmt::Break(_) => "break;".to_string(),
            Stmt::Continue(_) => "continue;".to_string(),
            Stmt::Block(stmts) => format!("{{\n{}\n}}", Self::print_stmts(stmts)),
        }
    }

    /// Print a version of the given expression with extra parentheses.
    pub fn print_expr(expr: &Expr) -> String {
        match expr {
            Expr::Nil => "nil".to_string(),
            Expr::Boolean(boolean) => boolean.to_string(),
            Expr::Number(number) => number.to_string(),
            Expr::String(string) => format!("{string:?}"),
            Expr::Binary(left, operator, right) => format!(
                "({} {} {})",
                Self::print_expr(left),
                operator.value,
                Self::print_expr(right)
            ),
            Expr::Logical(left, operator, right) => format!(
                "({} {} {})",
                Self::print_expr(left),
                operator.value,
                Self::print_expr(right)
            ),
            Expr::Unary(operator, expr) => {
                format!("({}{})", operator.value, Self::print_expr(expr))
            }
            // Groupings print transparently; everything that needs parens already has them.
            Expr::Grouping(expr) => Self::print_expr(expr),
            Expr::Variable(var) => var.name.clone(),
            Expr::Assign(var, expr) => format!("({} = {})", var.name, Self::print_expr(expr)),
            Expr::Call(callee, arguments, _) => format!(
                "{}({})",
                Self::print_expr(callee),
                arguments
                    .iter()
                    .map(Self::print_expr)
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            Expr::Array(values) => format!(
                "[{}]",
                values
                    .iter()
                    .map(Self::print_expr)
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            Expr::Dictionary(pairs, _) => format!(
                "{{{}}}",
                pairs
                    .chunks_exact(2)
                    .map(|pair| format!(
                        "{}: {}",
                        Self::print_expr(&pair[0]),
                        Self::print_expr(&pair[1])
                    ))
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            Expr::Subscript(subscriptee, index, _) => format!(
                "{}[{}]",
                Self::print_expr(subscriptee),
                Self::print_expr(index)
            ),
            Expr::SubscriptAssign(subscriptee, index, value, _) => format!(
                "({}[{}] = {})",
                Self::print_expr(subscriptee),
                Self::print_expr(index),
                Self::print_expr(value)
            ),
            Expr::Lambda(parameters, body) => format!(
                "lambda({}) => {{\n{}\n}}",
                Self::print_params(parameters),
                Self::print_stmts(body)
            ),
        }
    }

    /// Print a parameter list.
    fn print_params(parameters: &[WithLine<String>]) -> String {
        parameters
            .iter()
            .map(|param| param.value.clone())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{parser::Parser, scanner::Scanner};

    #[test]
    fn printing_is_a_fixpoint_under_reparsing() {
        let source = "
            var a = 1;
            {
                var b = a + 2;
                print b;
            }
            fun add(x, y) { return x + y; }
            print add(1, 2) == 3 and true;
            var xs = [1, 2, 3];
            xs[0] = xs[1] * 2;
            var d = {\"k\": 1, 2: \"two\"};
            var f = lambda(n) => { if (n > 0) return n; return -n; };
            while (a < 10) a = a + 1;
            if (!false) print \"yes\"; else print \"no\";
        ";

        let first = ParenPrinter::print_stmts(&Parser::parse(Scanner::scan_tokens(source)));
        let second = ParenPrinter::print_stmts(&Parser::parse(Scanner::scan_tokens(&first)));

        assert_eq!(first, second);
    }

    #[test]
    fn binary_expressions_print_with_parens() {
        let stmts = Parser::parse(Scanner::scan_tokens("print 1 + 2 * 3;"));
        assert_eq!(ParenPrinter::print_stmts(&stmts), "print (1 + (2 * 3));");
    }
}
