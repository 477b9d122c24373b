//! This module lets the [`Parser`] parse expressions.

use super::{ParseError, ParseResult, Parser};
use crate::{
    ast::{BinaryOperator, Expr, ExprId, LogicalOperator, UnaryOperator, VarRef, WithLine},
    tokens::{Token, TokenLiteral, TokenType},
};

impl<'s> Parser<'s> {
    /// expression → assignment ;
    pub(super) fn parse_expression(&mut self) -> ParseResult<'s, Expr> {
        self.parse_assignment()
    }

    /// assignment → logic_or ( "=" assignment )? ;
    ///
    /// The left-hand side is parsed as a normal expression and then inspected: a variable becomes
    /// an assignment, a subscript becomes a subscript assignment, and anything else reports an
    /// error without unwinding the parser.
    fn parse_assignment(&mut self) -> ParseResult<'s, Expr> {
        let mut expr = self.parse_logic_or()?;

        if self.match_tokens([TokenType::Equal]) {
            let equals = *self.previous().unwrap();
            let r_value = self.parse_assignment()?;

            match expr {
                Expr::Variable(var) => return Ok(Expr::Assign(var, Box::new(r_value))),
                Expr::Subscript(subscriptee, index, bracket_line) => {
                    return Ok(Expr::SubscriptAssign(
                        subscriptee,
                        index,
                        Box::new(r_value),
                        bracket_line,
                    ))
                }
                other => {
                    ParseError {
                        token: equals,
                        message: "Invalid assignment target".to_string(),
                    }
                    .report();
                    expr = other;
                }
            }
        }

        Ok(expr)
    }

    /// logic_or → logic_and ( "or" logic_and )* ;
    fn parse_logic_or(&mut self) -> ParseResult<'s, Expr> {
        let mut expr = self.parse_logic_and()?;

        while self.match_tokens([TokenType::Or]) {
            let operator = WithLine {
                line: self.previous().unwrap().line,
                value: LogicalOperator::Or,
            };
            let right = self.parse_logic_and()?;
            expr = Expr::Logical(Box::new(expr), operator, Box::new(right));
        }

        Ok(expr)
    }

    /// logic_and → equality ( "and" equality )* ;
    fn parse_logic_and(&mut self) -> ParseResult<'s, Expr> {
        let mut expr = self.parse_equality()?;

        while self.match_tokens([TokenType::And]) {
            let operator = WithLine {
                line: self.previous().unwrap().line,
                value: LogicalOperator::And,
            };
            let right = self.parse_equality()?;
            expr = Expr::Logical(Box::new(expr), operator, Box::new(right));
        }

        Ok(expr)
    }

    /// equality → comparison ( ( "!=" | "==" ) comparison )* ;
    fn parse_equality(&mut self) -> ParseResult<'s, Expr> {
        use TokenType::*;

        let mut expr = self.parse_comparison()?;

        while self.match_tokens([BangEqual, EqualEqual]) {
            let operator = self.previous_binary_operator();
            let right = self.parse_comparison()?;
            expr = Expr::Binary(Box::new(expr), operator, Box::new(right));
        }

        Ok(expr)
    }

    /// comparison → term ( ( ">" | ">=" | "<" | "<=" ) term )* ;
    fn parse_comparison(&mut self) -> ParseResult<'s, Expr> {
        use TokenType::*;

        let mut expr = self.parse_term()?;

        while self.match_tokens([Greater, GreaterEqual, Less, LessEqual]) {
            let operator = self.previous_binary_operator();
            let right = self.parse_term()?;
            expr = Expr::Binary(Box::new(expr), operator, Box::new(right));
        }

        Ok(expr)
    }

    /// term → factor ( ( "-" | "+" ) factor )* ;
    fn parse_term(&mut self) -> ParseResult<'s, Expr> {
        use TokenType::*;

        let mut expr = self.parse_factor()?;

        while self.match_tokens([Minus, Plus]) {
            let operator = self.previous_binary_operator();
            let right = self.parse_factor()?;
            expr = Expr::Binary(Box::new(expr), operator, Box::new(right));
        }

        Ok(expr)
    }

    /// factor → unary ( ( "/" | "*" ) unary )* ;
    fn parse_factor(&mut self) -> ParseResult<'s, Expr> {
        use TokenType::*;

        let mut expr = self.parse_unary()?;

        while self.match_tokens([Slash, Star]) {
            let operator = self.previous_binary_operator();
            let right = self.parse_unary()?;
            expr = Expr::Binary(Box::new(expr), operator, Box::new(right));
        }

        Ok(expr)
    }

    /// Convert the token just consumed into a binary operator with its line.
    ///
    /// Panics if the previous token is not a binary operator, which cannot happen when called
    /// just after a successful [`match_tokens`](Self::match_tokens) on operator tokens.
    fn previous_binary_operator(&self) -> WithLine<BinaryOperator> {
        let token = self.previous().unwrap();
        let value = match token.token_type {
            TokenType::Slash => BinaryOperator::Slash,
            TokenType::Star => BinaryOperator::Star,
            TokenType::Plus => BinaryOperator::Plus,
            TokenType::Minus => BinaryOperator::Minus,
            TokenType::Greater => BinaryOperator::Greater,
            TokenType::GreaterEqual => BinaryOperator::GreaterEqual,
            TokenType::Less => BinaryOperator::Less,
            TokenType::LessEqual => BinaryOperator::LessEqual,
            TokenType::BangEqual => BinaryOperator::BangEqual,
            TokenType::EqualEqual => BinaryOperator::EqualEqual,
            _ => unreachable!("previous_binary_operator called after matching an operator token"),
        };

        WithLine {
            line: token.line,
            value,
        }
    }

    /// unary → ( "!" | "-" ) unary | call ;
    fn parse_unary(&mut self) -> ParseResult<'s, Expr> {
        use TokenType::*;

        if self.match_tokens([Bang, Minus]) {
            let token = self.previous().unwrap();
            let operator = WithLine {
                line: token.line,
                value: match token.token_type {
                    Bang => UnaryOperator::Bang,
                    Minus => UnaryOperator::Minus,
                    _ => unreachable!(),
                },
            };

            let right = self.parse_unary()?;
            Ok(Expr::Unary(operator, Box::new(right)))
        } else {
            self.parse_call()
        }
    }

    /// call → primary ( "(" arguments? ")" | "[" expression "]" )* ;
    fn parse_call(&mut self) -> ParseResult<'s, Expr> {
        let mut expr = self.parse_primary()?;

        loop {
            if self.match_tokens([TokenType::LeftParen]) {
                expr = self.finish_call(expr)?;
            } else if self.match_tokens([TokenType::LeftBracket]) {
                expr = self.finish_subscript(expr)?;
            } else {
                break;
            }
        }

        Ok(expr)
    }

    /// Finish parsing a function call by parsing the argument list and closing paren.
    /// `arguments → expression ( "," expression )* ;`
    fn finish_call(&mut self, callee: Expr) -> ParseResult<'s, Expr> {
        let mut arguments: Vec<Expr> = Vec::new();

        if !self.check(TokenType::RightParen) {
            loop {
                if arguments.len() >= 255 {
                    let token = *self.peek().unwrap();
                    return Err(ParseError {
                        token,
                        message: "Cannot have more than 255 arguments in function call"
                            .to_string(),
                    });
                }

                arguments.push(self.parse_expression()?);

                if !self.match_tokens([TokenType::Comma]) {
                    break;
                }
            }
        }

        let close_paren = self.consume(
            TokenType::RightParen,
            "Expected ')' after arguments in function call".to_string(),
        )?;

        Ok(Expr::Call(
            Box::new(callee),
            arguments,
            close_paren.line,
        ))
    }

    /// Finish parsing a subscript by parsing the index and closing bracket.
    fn finish_subscript(&mut self, subscriptee: Expr) -> ParseResult<'s, Expr> {
        let index = self.parse_expression()?;
        let close_bracket = self.consume(
            TokenType::RightBracket,
            "Expected ']' after subscript index".to_string(),
        )?;

        Ok(Expr::Subscript(
            Box::new(subscriptee),
            Box::new(index),
            close_bracket.line,
        ))
    }

    /// primary → NUMBER | STRING | "true" | "false" | "nil" | "(" expression ")"
    ///         | "[" ( expression ( "," expression )* )? "]"
    ///         | "{" ( expression ":" expression ( "," expression ":" expression )* )? "}"
    ///         | IDENTIFIER | lambda ;
    fn parse_primary(&mut self) -> ParseResult<'s, Expr> {
        use TokenType::*;

        if self.match_tokens([
            True, False, Nil, Number, String, Identifier, LeftParen, LeftBracket, LeftBrace,
            Lambda,
        ]) {
            let previous = *self.previous().unwrap();

            let value = match previous {
                Token {
                    token_type: True, ..
                } => Expr::Boolean(true),
                Token {
                    token_type: False, ..
                } => Expr::Boolean(false),
                Token {
                    token_type: Nil, ..
                } => Expr::Nil,
                Token {
                    token_type: Number,
                    literal: Some(TokenLiteral::Number(num)),
                    ..
                } => Expr::Number(num),
                Token {
                    token_type: String,
                    literal: Some(TokenLiteral::String(string)),
                    ..
                } => Expr::String(string.to_string()),
                Token {
                    token_type: Identifier,
                    lexeme,
                    line,
                    ..
                } => Expr::Variable(VarRef {
                    id: ExprId::next(),
                    name: lexeme.to_string(),
                    line,
                }),
                Token {
                    token_type: LeftParen,
                    ..
                } => {
                    let expr = self.parse_expression()?;
                    self.consume(
                        RightParen,
                        "Expected ')' at end of grouped expression".to_string(),
                    )?;
                    Expr::Grouping(Box::new(expr))
                }
                Token {
                    token_type: LeftBracket,
                    ..
                } => self.parse_array_literal()?,
                Token {
                    token_type: LeftBrace,
                    line,
                    ..
                } => self.parse_dictionary_literal(line)?,
                Token {
                    token_type: Lambda, ..
                } => self.parse_lambda()?,
                _ => unreachable!(
                    "match_tokens() will only return a token with a TokenType that we expected"
                ),
            };

            Ok(value)
        } else {
            let token = *self.peek().unwrap_or_else(|| self.previous().unwrap());
            let message = format!("Expected expression, got {:?}", token.token_type);
            Err(ParseError { token, message })
        }
    }

    /// Parse an array literal after the opening bracket has been consumed.
    fn parse_array_literal(&mut self) -> ParseResult<'s, Expr> {
        let mut values = Vec::new();

        if !self.check(TokenType::RightBracket) {
            values.push(self.parse_expression()?);
            while self.match_tokens([TokenType::Comma]) {
                values.push(self.parse_expression()?);
            }
        }

        self.consume(
            TokenType::RightBracket,
            "Expected ']' to close array literal".to_string(),
        )?;

        Ok(Expr::Array(values))
    }

    /// Parse a dictionary literal after the opening brace has been consumed.
    ///
    /// The keys and values go into one flat list, keys at even indices and values at odd ones.
    fn parse_dictionary_literal(&mut self, brace_line: usize) -> ParseResult<'s, Expr> {
        let mut pairs = Vec::new();

        if !self.check(TokenType::RightBrace) {
            loop {
                pairs.push(self.parse_expression()?);
                self.consume(
                    TokenType::Colon,
                    "Expected ':' after dictionary key".to_string(),
                )?;
                pairs.push(self.parse_expression()?);

                if !self.match_tokens([TokenType::Comma]) {
                    break;
                }
            }
        }

        self.consume(
            TokenType::RightBrace,
            "Expected '}' to close dictionary literal".to_string(),
        )?;

        Ok(Expr::Dictionary(pairs, brace_line))
    }

    /// lambda → "lambda" "(" parameters? ")" "=" ">" "{" block ;
    ///
    /// The `=>` arrow is two tokens, an `=` and a `>`, so both get consumed here.
    fn parse_lambda(&mut self) -> ParseResult<'s, Expr> {
        self.consume(
            TokenType::LeftParen,
            "Expected '(' after 'lambda' keyword".to_string(),
        )?;
        let parameters = self.parse_parameters("lambda")?;

        self.consume(
            TokenType::Equal,
            "Expected '=>' after lambda parameters".to_string(),
        )?;
        self.consume(
            TokenType::Greater,
            "Expected '=>' after lambda parameters".to_string(),
        )?;

        self.consume(
            TokenType::LeftBrace,
            "Expected '{' before lambda body".to_string(),
        )?;
        let body = self.parse_block()?;

        Ok(Expr::Lambda(parameters, body))
    }
}
