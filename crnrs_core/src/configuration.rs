//! Global configuration for propensity evaluation and SBML export
use std::sync::{LazyLock, RwLock};

pub static CONFIGURATION: LazyLock<RwLock<Configuration>> =
    LazyLock::new(|| RwLock::new(Configuration::default()));

pub struct Configuration {
    /// How mass action propensities are evaluated (see [`RateMode`])
    pub rate_mode: RateMode,
    /// Compartment id assigned to every species on SBML export
    pub compartment: String,
    /// Concentration assigned to species absent from an initial condition map
    pub initial_concentration: f64,
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration {
            rate_mode: RateMode::Deterministic,
            compartment: "default".to_string(),
            initial_concentration: 0.,
        }
    }
}

/// Enum used to specify how mass action rates are computed
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RateMode {
    /// Continuous semantics: k * product(conc_i ^ stoichiometry_i)
    Deterministic,
    /// Discrete count semantics: k * product(s_i! / (s_i - stoichiometry_i)!)
    Stochastic,
}
