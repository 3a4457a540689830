//! Lex a rate expression string into a series of tokens for later parsing

use thiserror::Error;

use crate::io::rate_parse::token::Token;

pub struct Lexer {
    source: Vec<char>,
    tokens: Vec<Token>,
    start: usize,
    current: usize,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Lexer {
            source: source.chars().collect(),
            tokens: Vec::new(),
            start: 0,
            current: 0,
        }
    }

    pub fn lex(mut self) -> Result<Vec<Token>, LexerError> {
        while !self.is_at_end() {
            self.start = self.current;
            self.scan_token()?;
        }

        self.tokens.push(Token::Eof);
        Ok(self.tokens)
    }

    fn scan_token(&mut self) -> Result<(), LexerError> {
        let c: char = self.advance();
        match c {
            // Single character tokens
            '(' => self.add_token(Token::LeftParen),
            ')' => self.add_token(Token::RightParen),
            '+' => self.add_token(Token::Plus),
            '-' => self.add_token(Token::Minus),
            '*' => self.add_token(Token::Star),
            '/' => self.add_token(Token::Slash),
            '^' => self.add_token(Token::Caret),
            // Identifiers
            'a'..='z' | 'A'..='Z' | '_' => self.read_identifier(),
            // Numeric literals
            '0'..='9' | '.' => self.read_number()?,
            // Whitespace
            ' ' | '\r' | '\n' | '\t' => {}
            _ => return Err(LexerError::InvalidCharacter(c)),
        };
        Ok(())
    }

    fn advance(&mut self) -> char {
        let char_at_current = self.source[self.current];
        self.current += 1;
        char_at_current
    }

    fn read_identifier(&mut self) {
        while Lexer::is_alphanumeric(self.peek()) {
            self.advance();
        }

        let text: String = self.source[self.start..self.current].iter().collect();
        self.add_token(Token::Identifier(text));
    }

    fn read_number(&mut self) -> Result<(), LexerError> {
        while Lexer::is_digit(self.peek()) || self.peek() == '.' {
            self.advance();
        }
        // Exponent notation, e.g. 2.5e-3
        if self.peek() == 'e' || self.peek() == 'E' {
            let after_e = self.peek_next();
            if Lexer::is_digit(after_e) || after_e == '+' || after_e == '-' {
                self.advance();
                if self.peek() == '+' || self.peek() == '-' {
                    self.advance();
                }
                while Lexer::is_digit(self.peek()) {
                    self.advance();
                }
            }
        }

        let text: String = self.source[self.start..self.current].iter().collect();
        match text.parse::<f64>() {
            Ok(value) => {
                self.add_token(Token::Number(value));
                Ok(())
            }
            Err(_) => Err(LexerError::InvalidNumber(text)),
        }
    }

    fn is_digit(c: char) -> bool {
        c.is_ascii_digit()
    }

    fn is_alpha(c: char) -> bool {
        matches!(c, 'a'..='z' | 'A'..='Z' | '_')
    }

    fn is_alphanumeric(c: char) -> bool {
        Lexer::is_alpha(c) || Lexer::is_digit(c)
    }

    fn peek(&self) -> char {
        if self.is_at_end() {
            return '\0';
        }
        self.source[self.current]
    }

    fn peek_next(&self) -> char {
        if self.current + 1 >= self.source.len() {
            return '\0';
        }
        self.source[self.current + 1]
    }

    fn add_token(&mut self, token: Token) {
        self.tokens.push(token);
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum LexerError {
    #[error("unexpected character `{0}` in rate expression")]
    InvalidCharacter(char),
    #[error("malformed numeric literal `{0}`")]
    InvalidNumber(String),
}
