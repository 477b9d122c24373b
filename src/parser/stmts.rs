//! This module lets the [`Parser`] parse statements.

use super::{ParseResult, Parser};
use crate::{
    ast::{Expr, FunctionDecl, Stmt, WithLine},
    tokens::TokenType,
};

impl<'s> Parser<'s> {
    /// declaration → varDecl | funDecl | statement ;
    pub(super) fn parse_declaration(&mut self) -> Option<Stmt> {
        let result = if self.match_tokens([TokenType::Var]) {
            self.parse_var_decl()
        } else if self.match_tokens([TokenType::Fun]) {
            self.parse_function().map(Stmt::FunDecl)
        } else {
            self.parse_statement()
        };

        match result {
            Ok(stmt) => Some(stmt),
            Err(error) => {
                error.report();
                self.synchronize();
                None
            }
        }
    }

    /// funDecl → "fun" IDENTIFIER "(" parameters? ")" "{" block ;
    fn parse_function(&mut self) -> ParseResult<'s, FunctionDecl> {
        let name = {
            let token = self.consume(TokenType::Identifier, "Expected function name".to_string())?;
            WithLine {
                line: token.line,
                value: token.lexeme.to_string(),
            }
        };

        self.consume(
            TokenType::LeftParen,
            "Expected '(' after function name".to_string(),
        )?;
        let parameters = self.parse_parameters("function declaration")?;

        self.consume(
            TokenType::LeftBrace,
            "Expected '{' before function body".to_string(),
        )?;
        let body = self.parse_block()?;

        Ok((name, parameters, body))
    }

    /// parameters → IDENTIFIER ( "," IDENTIFIER )* ;
    ///
    /// This method expects to be called just after the opening paren and consumes the closing
    /// paren itself.
    pub(super) fn parse_parameters(
        &mut self,
        declaration_kind: &str,
    ) -> ParseResult<'s, Vec<WithLine<String>>> {
        let mut parameters: Vec<WithLine<String>> = Vec::new();

        if !self.check(TokenType::RightParen) {
            loop {
                if parameters.len() >= 255 {
                    let token = *self.peek().unwrap();
                    return Err(super::ParseError {
                        token,
                        message: format!(
                            "Cannot have more than 255 parameters in a {declaration_kind}"
                        ),
                    });
                }

                let token =
                    self.consume(TokenType::Identifier, "Expected parameter name".to_string())?;
                parameters.push(WithLine {
                    line: token.line,
                    value: token.lexeme.to_string(),
                });

                if !self.match_tokens([TokenType::Comma]) {
                    break;
                }
            }
        }

        self.consume(
            TokenType::RightParen,
            "Expected ')' after parameters".to_string(),
        )?;

        Ok(parameters)
    }

    /// varDecl → "var" IDENTIFIER ( "=" expression )? ";" ;
    fn parse_var_decl(&mut self) -> ParseResult<'s, Stmt> {
        let name = self.consume(
            TokenType::Identifier,
            "Expected variable name after 'var' keyword".to_string(),
        )?;

        let initializer = if self.match_tokens([TokenType::Equal]) {
            Some(self.parse_expression()?)
        } else {
            None
        };

        self.consume(
            TokenType::Semicolon,
            "Expected ';' after variable declaration".to_string(),
        )?;

        Ok(Stmt::VarDecl(
            WithLine {
                line: name.line,
                value: name.lexeme.to_string(),
            },
            initializer,
        ))
    }

    /// statement → exprStmt | ifStmt | printStmt | returnStmt | breakStmt | continueStmt
    ///           | whileStmt | forStmt | block ;
    fn parse_statement(&mut self) -> ParseResult<'s, Stmt> {
        if self.match_tokens([TokenType::If]) {
            self.parse_if_statement()
        } else if self.match_tokens([TokenType::Print]) {
            self.parse_print_statement()
        } else if self.match_tokens([TokenType::Return]) {
            self.parse_return_statement()
        } else if self.match_tokens([TokenType::Break]) {
            let line = self.previous().unwrap().line;
            self.consume(
                TokenType::Semicolon,
                "Expected ';' after 'break'".to_string(),
            )?;
            Ok(Stmt::Break(line))
        } else if self.match_tokens([TokenType::Continue]) {
            let line = self.previous().unwrap().line;
            self.consume(
                TokenType::Semicolon,
                "Expected ';' after 'continue'".to_string(),
            )?;
            Ok(Stmt::Continue(line))
        } else if self.match_tokens([TokenType::While]) {
            self.parse_while_loop()
        } else if self.match_tokens([TokenType::For]) {
            self.parse_for_loop()
        } else if self.match_tokens([TokenType::LeftBrace]) {
            self.parse_block().map(Stmt::Block)
        } else {
            self.parse_expr_statement()
        }
    }

    /// exprStmt → expression ";" ;
    fn parse_expr_statement(&mut self) -> ParseResult<'s, Stmt> {
        let value = self.parse_expression()?;
        self.consume(
            TokenType::Semicolon,
            "Expected ';' after expression".to_string(),
        )?;
        Ok(Stmt::Expression(value))
    }

    /// ifStmt → "if" "(" expression ")" statement ( "else" statement )? ;
    fn parse_if_statement(&mut self) -> ParseResult<'s, Stmt> {
        self.consume(TokenType::LeftParen, "Expected '(' after 'if'".to_string())?;
        let condition = self.parse_expression()?;
        self.consume(
            TokenType::RightParen,
            "Expected ')' after if condition".to_string(),
        )?;

        let then_branch = self.parse_statement()?;
        let else_branch = if self.match_tokens([TokenType::Else]) {
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };

        Ok(Stmt::If(condition, Box::new(then_branch), else_branch))
    }

    /// printStmt → "print" expression ";" ;
    fn parse_print_statement(&mut self) -> ParseResult<'s, Stmt> {
        let value = self.parse_expression()?;
        self.consume(TokenType::Semicolon, "Expected ';' after value".to_string())?;
        Ok(Stmt::Print(value))
    }

    /// returnStmt → "return" expression? ";" ;
    fn parse_return_statement(&mut self) -> ParseResult<'s, Stmt> {
        let keyword_line = self.previous().unwrap().line;

        let value = if self.check(TokenType::Semicolon) {
            None
        } else {
            Some(self.parse_expression()?)
        };

        self.consume(
            TokenType::Semicolon,
            "Expected ';' after return value".to_string(),
        )?;

        Ok(Stmt::Return(keyword_line, value))
    }

    /// whileStmt → "while" "(" expression ")" statement ;
    fn parse_while_loop(&mut self) -> ParseResult<'s, Stmt> {
        self.consume(
            TokenType::LeftParen,
            "Expected '(' after 'while'".to_string(),
        )?;
        let condition = self.parse_expression()?;
        self.consume(
            TokenType::RightParen,
            "Expected ')' after while condition".to_string(),
        )?;

        let body = self.parse_statement()?;

        Ok(Stmt::While(condition, Box::new(body), None))
    }

    /// forStmt → "for" "(" ( varDecl | exprStmt | ";" ) expression? ";" expression? ")" statement ;
    ///
    /// This method desugars the for loop into a [while loop](Stmt::While) wrapped in a block. The
    /// step expression goes into the while loop's dedicated step slot so that `continue` still
    /// advances the loop variable.
    fn parse_for_loop(&mut self) -> ParseResult<'s, Stmt> {
        self.consume(TokenType::LeftParen, "Expected '(' after 'for'".to_string())?;

        let initializer = if self.match_tokens([TokenType::Semicolon]) {
            None
        } else if self.match_tokens([TokenType::Var]) {
            Some(self.parse_var_decl()?)
        } else {
            Some(self.parse_expr_statement()?)
        };

        let condition = if self.check(TokenType::Semicolon) {
            Expr::Boolean(true)
        } else {
            self.parse_expression()?
        };
        self.consume(
            TokenType::Semicolon,
            "Expected ';' after for loop condition".to_string(),
        )?;

        let step = if self.check(TokenType::RightParen) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.consume(
            TokenType::RightParen,
            "Expected ')' after for loop clauses".to_string(),
        )?;

        let body = self.parse_statement()?;

        let mut statements = Vec::new();
        if let Some(initializer) = initializer {
            statements.push(initializer);
        }
        statements.push(Stmt::While(condition, Box::new(body), step));

        Ok(Stmt::Block(statements))
    }

    /// block → "{" declaration* "}" ;
    ///
    /// This method does not return a [`Stmt::Block`] but just the statements inside the block,
    /// since function bodies want the bare statement list. It is easily wrapped into a
    /// [`Stmt::Block`] by [`parse_statement`](Self::parse_statement).
    pub(super) fn parse_block(&mut self) -> ParseResult<'s, Vec<Stmt>> {
        let mut stmts = Vec::new();

        while !self.check(TokenType::RightBrace) && !self.is_at_end() {
            if let Some(stmt) = self.parse_declaration() {
                stmts.push(stmt);
            }
        }

        self.consume(
            TokenType::RightBrace,
            "Expected '}' after block".to_string(),
        )?;

        Ok(stmts)
    }
}
