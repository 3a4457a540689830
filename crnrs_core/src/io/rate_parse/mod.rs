//! Module for parsing free-form rate expression strings into AST values

use thiserror::Error;

use crate::io::rate_parse::lexer::LexerError;
use crate::io::rate_parse::parser::ParseError;
use crate::reaction_network::propensity::RateExpression;

mod lexer;
pub mod parser;
mod token;

/// Parse a rate expression string into an AST
///
/// # Parameters
/// - `input`: &str holding the algebraic rate expression
///
/// # Returns
/// Parse result which is
/// - `Ok`: the parsed [`RateExpression`]
/// - `Err`: a [`RateParseError`] describing the issue with the expression
///
/// # Examples
/// ```rust
/// use crnrs_core::io::rate_parse::parse_rate_expression;
/// let rate = parse_rate_expression("k_tx * G / (1 + P^2)").unwrap();
/// assert_eq!(rate.to_string(), "k_tx*G/(1+P^2)");
/// ```
pub fn parse_rate_expression(input: &str) -> Result<RateExpression, RateParseError> {
    // Start by converting the expression string into tokens
    let tokens = lexer::Lexer::new(input).lex()?;

    // Now parse those tokens into an expression tree
    let mut parser = parser::RateParser::new(tokens);
    let root = parser.parse()?;
    Ok(RateExpression::new(root))
}

/// Enum representing possible lex and parse errors
#[derive(Debug, Error, PartialEq)]
pub enum RateParseError {
    /// Lexing Error
    #[error("error during lexing of rate expression: {0}")]
    LexingError(#[from] LexerError),
    /// Parsing Error
    #[error("error during parsing of rate expression: {0}")]
    ParsingError(#[from] ParseError),
}
