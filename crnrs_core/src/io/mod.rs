//! Module for reading and writing reaction networks
pub mod json;
pub mod rate_parse;
pub mod sbml;
