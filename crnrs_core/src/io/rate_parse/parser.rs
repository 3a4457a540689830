//! Parse a token stream into a rate expression AST

use thiserror::Error;

use crate::io::rate_parse::token::Token;
use crate::reaction_network::propensity::{RateExpr, RateOp};

/*
Rate expression grammar:
expression -> term (("+" | "-") term)* ;
term -> factor (("*" | "/") factor)* ;
factor -> unary ("^" factor)? ;
unary -> "-" unary | primary ;
primary -> NUMBER | IDENTIFIER | "(" expression ")" ;

e.g. k_tx * G / (1 + (P/K)^2)
 */

/// Rate expression parser
pub struct RateParser {
    /// Vector of tokens from the expression string
    tokens: Vec<Token>,
    /// Current token being processed
    current: usize,
}

impl RateParser {
    /// Create a new RateParser
    pub fn new(tokens: Vec<Token>) -> RateParser {
        RateParser { tokens, current: 0 }
    }

    // region Parsing Functions

    /// Parse the token vector into an expression AST
    pub fn parse(&mut self) -> Result<RateExpr, ParseError> {
        let expr = self.expression()?;
        if !self.is_at_end() {
            // Leftover tokens mean the input was not a single expression
            return Err(ParseError::EarlyTermination);
        }
        Ok(expr)
    }

    fn expression(&mut self) -> Result<RateExpr, ParseError> {
        let mut expr = self.term()?;

        while self.match_token(&[Token::Plus, Token::Minus]) {
            let op = match self.previous() {
                Token::Plus => RateOp::Add,
                _ => RateOp::Sub,
            };
            let right = self.term()?;
            expr = RateExpr::Binary {
                op,
                left: Box::new(expr),
                right: Box::new(right),
            };
        }
        Ok(expr)
    }

    fn term(&mut self) -> Result<RateExpr, ParseError> {
        let mut expr = self.factor()?;

        while self.match_token(&[Token::Star, Token::Slash]) {
            let op = match self.previous() {
                Token::Star => RateOp::Mul,
                _ => RateOp::Div,
            };
            let right = self.factor()?;
            expr = RateExpr::Binary {
                op,
                left: Box::new(expr),
                right: Box::new(right),
            };
        }
        Ok(expr)
    }

    fn factor(&mut self) -> Result<RateExpr, ParseError> {
        let base = self.unary()?;
        if self.match_token(&[Token::Caret]) {
            // Right associative: a^b^c parses as a^(b^c)
            let exponent = self.factor()?;
            return Ok(RateExpr::Binary {
                op: RateOp::Pow,
                left: Box::new(base),
                right: Box::new(exponent),
            });
        }
        Ok(base)
    }

    fn unary(&mut self) -> Result<RateExpr, ParseError> {
        if self.match_token(&[Token::Minus]) {
            let operand = self.unary()?;
            return Ok(RateExpr::Negate(Box::new(operand)));
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<RateExpr, ParseError> {
        if let Some(value) = self.match_number() {
            return Ok(RateExpr::Number(value));
        }
        if let Some(identifier) = self.match_identifier() {
            return Ok(RateExpr::Variable(identifier));
        }
        if self.match_token(&[Token::LeftParen]) {
            let expr = self.expression()?;
            self.consume(Token::RightParen, "Expect ')' after expression.")?;
            return Ok(expr);
        }

        Err(ParseError::ExpectedExpression)
    }

    // endregion Parsing Functions

    // region parsing helper functions

    /// Check whether the token at the current position matches one of the
    /// provided `tokens`, if it does advance and return true
    fn match_token(&mut self, tokens: &[Token]) -> bool {
        for t in tokens {
            if self.check(t) {
                self.advance();
                return true;
            }
        }
        false
    }

    /// Like [`RateParser::match_token`] but for number tokens
    fn match_number(&mut self) -> Option<f64> {
        if let Token::Number(value) = self.peek() {
            self.advance();
            return Some(value);
        }
        None
    }

    /// Like [`RateParser::match_token`] but for identifier tokens
    fn match_identifier(&mut self) -> Option<String> {
        if let Token::Identifier(id) = self.peek() {
            self.advance();
            return Some(id);
        }
        None
    }

    /// Check whether the current token matches the provided `token`
    fn check(&self, token: &Token) -> bool {
        if self.is_at_end() {
            return false;
        }
        &self.peek() == token
    }

    /// Advance one position unless at the end of the token vector, then
    /// return the previous token
    fn advance(&mut self) -> Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }

    /// Check whether the parser is at the end of the source Vec
    fn is_at_end(&self) -> bool {
        self.peek() == Token::Eof
    }

    /// Get a copy of the current token
    fn peek(&self) -> Token {
        self.tokens[self.current].clone()
    }

    /// Get a copy of the previous token
    fn previous(&self) -> Token {
        self.tokens[self.current - 1].clone()
    }

    /// Check whether the current token matches an input token, advancing
    /// past it when it does. Used for matching closing parentheses.
    fn consume(&mut self, token: Token, msg: &str) -> Result<Token, ParseError> {
        if self.check(&token) {
            return Ok(self.advance());
        }

        Err(ParseError::MissingToken(msg.to_string()))
    }

    // endregion parsing helper functions
}

/// Enum representing possible parse errors
#[derive(Debug, Error, PartialEq, Clone)]
pub enum ParseError {
    /// Missing expected token (e.g. a right parenthesis)
    #[error("Missing expected token: {0}")]
    MissingToken(String),
    /// No expression found when one was expected
    #[error("No expression found, check that the rate expression is not empty")]
    ExpectedExpression,
    /// Expression was not completed when parsing terminated
    #[error("Parsing terminated early, check for adjacent terms with no operator between them")]
    EarlyTermination,
}
