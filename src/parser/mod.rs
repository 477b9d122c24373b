//! This module provides the [`Parser`].

mod exprs;
mod stmts;

use crate::{
    ast::Stmt,
    finch::report_token_error,
    tokens::{Token, TokenType},
};
use std::fmt;
use thiserror::Error;

/// An error that occured during parsing.
#[derive(Clone, Debug, PartialEq, Error)]
struct ParseError<'s> {
    /// The token that caused the error.
    token: Token<'s>,

    /// The message to display to the user.
    message: String,
}

impl fmt::Display for ParseError<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

impl ParseError<'_> {
    /// Report the parsing error to the user.
    fn report(&self) {
        report_token_error(&self.token, &self.message);
    }
}

/// A result wrapping a [`ParseError`].
type ParseResult<'s, T, E = ParseError<'s>> = ::std::result::Result<T, E>;

/// A recursive descent parser for Finch.
///
/// It parses this grammar:
/// ```text
/// program     → declaration* EOF ;
///
/// declaration → varDecl | funDecl | statement ;
///
/// funDecl     → "fun" IDENTIFIER "(" parameters? ")" "{" block ;
/// parameters  → IDENTIFIER ( "," IDENTIFIER )* ;
/// varDecl     → "var" IDENTIFIER ( "=" expression )? ";" ;
///
/// statement   → exprStmt | ifStmt | printStmt | returnStmt | breakStmt | continueStmt
///             | whileStmt | forStmt | block ;
/// exprStmt    → expression ";" ;
/// ifStmt      → "if" "(" expression ")" statement ( "else" statement )? ;
/// printStmt   → "print" expression ";" ;
/// returnStmt  → "return" expression? ";" ;
/// breakStmt   → "break" ";" ;
/// continueStmt → "continue" ";" ;
/// whileStmt   → "while" "(" expression ")" statement ;
/// forStmt     → "for" "(" ( varDecl | exprStmt | ";" ) expression? ";" expression? ")" statement ;
/// block       → "{" declaration* "}" ;
///
/// expression  → assignment ;
/// assignment  → logic_or ( "=" assignment )? ;
/// logic_or    → logic_and ( "or" logic_and )* ;
/// logic_and   → equality ( "and" equality )* ;
/// equality    → comparison ( ( "!=" | "==" ) comparison )* ;
/// comparison  → term ( ( ">" | ">=" | "<" | "<=" ) term )* ;
/// term        → factor ( ( "-" | "+" ) factor )* ;
/// factor      → unary ( ( "/" | "*" ) unary )* ;
/// unary       → ( "!" | "-" ) unary | call ;
/// call        → primary ( "(" arguments? ")" | "[" expression "]" )* ;
/// arguments   → expression ( "," expression )* ;
/// primary     → NUMBER | STRING | "true" | "false" | "nil"
///             | "(" expression ")"
///             | "[" ( expression ( "," expression )* )? "]"
///             | "{" ( expression ":" expression ( "," expression ":" expression )* )? "}"
///             | IDENTIFIER | lambda ;
/// lambda      → "lambda" "(" parameters? ")" "=" ">" "{" block ;
/// ```
pub struct Parser<'s> {
    /// The token list that we're parsing.
    tokens: Vec<Token<'s>>,

    /// The index of the token currently being considered.
    current: usize,

    /// The statements that have been parsed by the parser.
    statements: Vec<Stmt>,
}

impl<'s> Parser<'s> {
    /// Parse the given list of tokens.
    ///
    /// Parse errors are reported as they occur; the parser recovers and keeps going, so the
    /// returned statements are only meaningful if nothing got reported.
    pub fn parse(tokens: Vec<Token<'s>>) -> Vec<Stmt> {
        let mut parser = Self {
            tokens,
            current: 0,
            statements: vec![],
        };

        parser.parse_program();
        parser.statements
    }

    /// Get the current token.
    #[inline]
    fn peek(&self) -> Option<&Token<'s>> {
        self.tokens.get(self.current)
    }

    /// Get the previous token.
    #[inline]
    fn previous(&self) -> Option<&Token<'s>> {
        self.tokens.get(self.current.saturating_sub(1))
    }

    /// Are we at the end of the token list?
    #[inline]
    fn is_at_end(&self) -> bool {
        self.check(TokenType::Eof)
    }

    /// Advance the internal pointer and get the next token.
    fn advance(&mut self) -> Token<'s> {
        if !self.is_at_end() {
            self.current += 1;
        }
        *self.previous().unwrap()
    }

    /// Check if the next token is of the given type.
    #[inline]
    fn check(&self, token_type: TokenType) -> bool {
        self.peek().is_some_and(|t| t.token_type == token_type)
    }

    /// Check if the next token is of one of the given types and advance if it is.
    fn match_tokens(&mut self, token_types: impl IntoIterator<Item = TokenType>) -> bool {
        for token_type in token_types {
            if self.check(token_type) {
                self.advance();
                return true;
            }
        }

        false
    }

    /// Expect the next token to be of the given type and return it if so, or return an error with
    /// the given message if the check fails.
    fn consume(&mut self, token_type: TokenType, message: String) -> ParseResult<'s, Token<'s>> {
        if self.check(token_type) {
            Ok(self.advance())
        } else {
            let token = *self.peek().unwrap();
            Err(ParseError { token, message })
        }
    }

    /// Synchronize the parser to an assumed correct state after an error.
    fn synchronize(&mut self) {
        use TokenType::*;

        self.advance();

        while !self.is_at_end() {
            if self.previous().is_some_and(|t| t.token_type == Semicolon) {
                return;
            }

            match self.peek().map(|t| t.token_type) {
                Some(Class | Fun | Lambda | Var | For | If | While | Print | Return) => return,
                _ => {}
            }

            self.advance();
        }
    }

    /// program → declaration* EOF ;
    fn parse_program(&mut self) {
        while !self.is_at_end() {
            if let Some(stmt) = self.parse_declaration() {
                self.statements.push(stmt);
            }
        }
    }
}
