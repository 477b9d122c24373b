//! This module handles scanning source code to produce tokens.

use crate::tokens::{Token, TokenLiteral, TokenType};
use lazy_static::lazy_static;
use std::collections::HashMap;

lazy_static! {
    /// The reserved words of the language, mapped to their token types.
    static ref KEYWORDS: HashMap<&'static str, TokenType> = HashMap::from([
        ("and", TokenType::And),
        ("break", TokenType::Break),
        ("class", TokenType::Class),
        ("continue", TokenType::Continue),
        ("else", TokenType::Else),
        ("false", TokenType::False),
        ("for", TokenType::For),
        ("fun", TokenType::Fun),
        ("if", TokenType::If),
        ("lambda", TokenType::Lambda),
        ("nil", TokenType::Nil),
        ("or", TokenType::Or),
        ("print", TokenType::Print),
        ("return", TokenType::Return),
        ("super", TokenType::Super),
        ("this", TokenType::This),
        ("true", TokenType::True),
        ("var", TokenType::Var),
        ("while", TokenType::While),
    ]);
}

/// A scanner to get tokens from source code.
pub struct Scanner<'s> {
    /// The source code.
    source: &'s str,

    /// The tokens that we've already scanned out.
    tokens: Vec<Token<'s>>,

    /// An index to the start of the token currently being scanned.
    start: usize,

    /// An index to the character currently being considered.
    current: usize,

    /// The line that the current token is on.
    line: usize,
}

impl<'s> Scanner<'s> {
    /// Scan all the tokens from the given source code.
    pub fn scan_tokens(source: &'s str) -> Vec<Token<'s>> {
        let mut scanner = Self {
            source,
            tokens: Vec::new(),
            start: 0,
            current: 0,
            line: 1,
        };

        while !scanner.is_at_end() {
            scanner.start = scanner.current;
            scanner.scan_token();
        }

        scanner.tokens.push(Token {
            token_type: TokenType::Eof,
            lexeme: "",
            literal: None,
            line: scanner.line,
        });

        scanner.tokens
    }

    /// Are we at the end of the source code?
    #[inline]
    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }

    /// Scan a single token.
    fn scan_token(&mut self) {
        let c = self.advance();

        match c {
            '[' => self.add_token(TokenType::LeftBracket, None),
            ']' => self.add_token(TokenType::RightBracket, None),
            '(' => self.add_token(TokenType::LeftParen, None),
            ')' => self.add_token(TokenType::RightParen, None),
            '{' => self.add_token(TokenType::LeftBrace, None),
            '}' => self.add_token(TokenType::RightBrace, None),
            ',' => self.add_token(TokenType::Comma, None),
            '.' => self.add_token(TokenType::Dot, None),
            '-' => self.add_token(TokenType::Minus, None),
            '+' => self.add_token(TokenType::Plus, None),
            ':' => self.add_token(TokenType::Colon, None),
            ';' => self.add_token(TokenType::Semicolon, None),
            '*' => self.add_token(TokenType::Star, None),

            '/' => {
                if self.match_char('/') {
                    while self.current_char() != Some('\n') && !self.is_at_end() {
                        self.advance();
                    }
                } else {
                    self.add_token(TokenType::Slash, None);
                }
            }
            '!' => {
                let token_type = if self.match_char('=') {
                    TokenType::BangEqual
                } else {
                    TokenType::Bang
                };
                self.add_token(token_type, None);
            }
            '=' => {
                let token_type = if self.match_char('=') {
                    TokenType::EqualEqual
                } else {
                    TokenType::Equal
                };
                self.add_token(token_type, None);
            }
            '<' => {
                let token_type = if self.match_char('=') {
                    TokenType::LessEqual
                } else {
                    TokenType::Less
                };
                self.add_token(token_type, None);
            }
            '>' => {
                let token_type = if self.match_char('=') {
                    TokenType::GreaterEqual
                } else {
                    TokenType::Greater
                };
                self.add_token(token_type, None);
            }

            ' ' | '\t' | '\r' => {}

            '\n' => self.line += 1,

            '"' => self.scan_string(),

            '0'..='9' => self.scan_number(),

            c if c.is_ascii_alphabetic() || c == '_' => self.scan_identifier_or_keyword(),

            _ => crate::finch::report_scan_error(self.line, "Unexpected character"),
        }
    }

    /// Return the char pointed to by `self.current`.
    #[inline]
    fn current_char(&self) -> Option<char> {
        self.source[self.current..].chars().next()
    }

    /// Return the char after the one pointed to by `self.current`.
    #[inline]
    fn next_char(&self) -> Option<char> {
        let mut chars = self.source[self.current..].chars();
        chars.next();
        chars.next()
    }

    /// Advance the internal pointer.
    fn advance(&mut self) -> char {
        let c = self.current_char().unwrap_or_else(|| {
            panic!(
                "source: {:?}, current: {}, tokens: {:?}",
                self.source, self.current, self.tokens
            )
        });
        self.current += c.len_utf8();
        c
    }

    /// Add a token with the given token type and literal to the internal token vec.
    fn add_token(&mut self, token_type: TokenType, literal: Option<TokenLiteral<'s>>) {
        let lexeme = &self.source[self.start..self.current];
        self.tokens.push(Token {
            token_type,
            lexeme,
            literal,
            line: self.line,
        });
    }

    /// Conditionally [`advance`](Self::advance) if the next char is the expected one.
    fn match_char(&mut self, expected: char) -> bool {
        if self.is_at_end() || (self.current_char() != Some(expected)) {
            false
        } else {
            self.current += expected.len_utf8();
            true
        }
    }

    /// Scan a string literal. Strings have no escape sequences and may span lines.
    fn scan_string(&mut self) {
        while self.current_char() != Some('"') && !self.is_at_end() {
            if self.current_char() == Some('\n') {
                self.line += 1;
            }
            self.advance();
        }

        if self.is_at_end() {
            crate::finch::report_scan_error(self.line, "Unterminated string");
            return;
        }

        // The closing "
        self.advance();

        self.add_token(
            TokenType::String,
            Some(TokenLiteral::String(
                // Trim the surrounding quotes
                &self.source[(self.start + 1)..(self.current - 1)],
            )),
        );
    }

    /// Scan a numeric literal.
    ///
    /// A trailing `.` with no digit after it is not part of the number, so `123.` scans as the
    /// number `123` followed by a dot.
    fn scan_number(&mut self) {
        while self.current_char().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }

        if self.current_char() == Some('.') && self.next_char().is_some_and(|c| c.is_ascii_digit())
        {
            self.advance();
            while self.current_char().is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
            }
        }

        self.add_token(
            TokenType::Number,
            Some(TokenLiteral::Number(
                self.source[self.start..self.current].parse().unwrap(),
            )),
        );
    }

    /// Scan a single identifier or keyword.
    fn scan_identifier_or_keyword(&mut self) {
        /// Check if the given character is valid to be used in an identifier.
        fn is_ident_char(c: Option<char>) -> bool {
            c.is_some_and(|c| c.is_ascii_alphanumeric() || c == '_')
        }

        while is_ident_char(self.current_char()) {
            self.advance();
        }

        let token_type = KEYWORDS
            .get(&self.source[self.start..self.current])
            .copied()
            .unwrap_or(TokenType::Identifier);

        self.add_token(token_type, None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use TokenType::*;

    fn scan(code: &str) -> Vec<(TokenType, &str, Option<TokenLiteral<'_>>)> {
        Scanner::scan_tokens(code)
            .into_iter()
            .map(|token| (token.token_type, token.lexeme, token.literal))
            .collect()
    }

    #[test]
    fn identifiers() {
        let scanned = scan("andy formless fo _ _123 _abc ab123\nabcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ1234567890_");

        assert_eq!(
            scanned,
            vec![
                (Identifier, "andy", None),
                (Identifier, "formless", None),
                (Identifier, "fo", None),
                (Identifier, "_", None),
                (Identifier, "_123", None),
                (Identifier, "_abc", None),
                (Identifier, "ab123", None),
                (
                    Identifier,
                    "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ1234567890_",
                    None
                ),
                (Eof, "", None),
            ]
        );
    }

    #[test]
    fn keywords() {
        let scanned = scan(
            "and break class continue else false for fun if lambda nil or return super this true var while",
        );

        assert_eq!(
            scanned,
            vec![
                (And, "and", None),
                (Break, "break", None),
                (Class, "class", None),
                (Continue, "continue", None),
                (Else, "else", None),
                (False, "false", None),
                (For, "for", None),
                (Fun, "fun", None),
                (If, "if", None),
                (Lambda, "lambda", None),
                (Nil, "nil", None),
                (Or, "or", None),
                (Return, "return", None),
                (Super, "super", None),
                (This, "this", None),
                (True, "true", None),
                (Var, "var", None),
                (While, "while", None),
                (Eof, "", None),
            ]
        );
    }

    #[test]
    fn numbers() {
        let scanned = scan("123\n123.456\n.456\n123.");

        assert_eq!(
            scanned,
            vec![
                (Number, "123", Some(TokenLiteral::Number(123.0))),
                (Number, "123.456", Some(TokenLiteral::Number(123.456))),
                (Dot, ".", None),
                (Number, "456", Some(TokenLiteral::Number(456.0))),
                (Number, "123", Some(TokenLiteral::Number(123.0))),
                (Dot, ".", None),
                (Eof, "", None),
            ]
        );
    }

    #[test]
    fn punctuators() {
        let scanned = scan("(){};,+-*!===<=>=!=! =<>/.[]:");

        assert_eq!(
            scanned,
            vec![
                (LeftParen, "(", None),
                (RightParen, ")", None),
                (LeftBrace, "{", None),
                (RightBrace, "}", None),
                (Semicolon, ";", None),
                (Comma, ",", None),
                (Plus, "+", None),
                (Minus, "-", None),
                (Star, "*", None),
                (BangEqual, "!=", None),
                (EqualEqual, "==", None),
                (LessEqual, "<=", None),
                (GreaterEqual, ">=", None),
                (BangEqual, "!=", None),
                (Bang, "!", None),
                (Equal, "=", None),
                (Less, "<", None),
                (Greater, ">", None),
                (Slash, "/", None),
                (Dot, ".", None),
                (LeftBracket, "[", None),
                (RightBracket, "]", None),
                (Colon, ":", None),
                (Eof, "", None),
            ]
        );
    }

    #[test]
    fn lambda_arrow() {
        let scanned = scan("lambda(x)=>{}");

        assert_eq!(
            scanned,
            vec![
                (Lambda, "lambda", None),
                (LeftParen, "(", None),
                (Identifier, "x", None),
                (RightParen, ")", None),
                (Equal, "=", None),
                (Greater, ">", None),
                (LeftBrace, "{", None),
                (RightBrace, "}", None),
                (Eof, "", None),
            ]
        );
    }

    #[test]
    fn strings() {
        let scanned = scan("\"\"\n\"string\"\n\"spans\nlines\"");

        assert_eq!(
            scanned,
            vec![
                (String, "\"\"", Some(TokenLiteral::String(""))),
                (String, "\"string\"", Some(TokenLiteral::String("string"))),
                (
                    String,
                    "\"spans\nlines\"",
                    Some(TokenLiteral::String("spans\nlines"))
                ),
                (Eof, "", None),
            ]
        );
    }

    #[test]
    fn comments_and_whitespace() {
        let scanned = scan("space    tabs\t\t\t\tnewlines\n\n// a comment\n\n\nend // trailing");

        assert_eq!(
            scanned,
            vec![
                (Identifier, "space", None),
                (Identifier, "tabs", None),
                (Identifier, "newlines", None),
                (Identifier, "end", None),
                (Eof, "", None),
            ]
        );
    }

    #[test]
    fn line_numbers() {
        let lines: Vec<(TokenType, usize)> = Scanner::scan_tokens("a\nb\n\"x\ny\"\nc")
            .into_iter()
            .map(|token| (token.token_type, token.line))
            .collect();

        assert_eq!(
            lines,
            vec![
                (Identifier, 1),
                (Identifier, 2),
                // a multi-line string is reported on the line where it closes
                (String, 4),
                (Identifier, 5),
                (Eof, 5),
            ]
        );
    }
}
