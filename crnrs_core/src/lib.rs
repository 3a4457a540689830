//! Core rust implementation of crnrs, a crate for programmatically building chemical
//! reaction networks with mass-action and Hill-type kinetics, and for reading and
//! writing them as SBML Level 3 documents.
#![allow(unused)]

pub mod configuration;
pub mod io;
pub mod reaction_network;
pub mod simulate;
