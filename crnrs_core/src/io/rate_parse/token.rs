//! Module providing Token struct for lexing

/// Represents Tokens in a rate expression
#[derive(Debug, PartialEq, Clone)]
pub enum Token {
    Number(f64),
    Identifier(String),
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    LeftParen,
    RightParen,
    Eof,
}
