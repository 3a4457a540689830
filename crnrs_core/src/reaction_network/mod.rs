//! Module providing the value types a chemical reaction network is built from.

pub mod network;
pub mod propensity;
pub mod reaction;
pub mod species;
