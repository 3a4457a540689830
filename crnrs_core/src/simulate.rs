//! Interface types for external simulation engines
//!
//! Simulation numerics live outside this crate. This module defines the
//! contract a numerical engine implements and the input validation every
//! engine needs: strictly increasing timepoints and a non-negative initial
//! condition map keyed by species strings.

use indexmap::IndexMap;
use thiserror::Error;

use crate::reaction_network::network::ChemicalReactionNetwork;

/// Simulation result table
///
/// Holds a `"time"` column plus one column per species string, all aligned
/// with the requested timepoints.
#[derive(Clone, Debug, PartialEq)]
pub struct Trajectory {
    pub columns: IndexMap<String, Vec<f64>>,
}

impl Trajectory {
    /// Create a trajectory with a filled time column and empty species columns
    pub fn new(timepoints: &[f64], species_ids: impl IntoIterator<Item = String>) -> Trajectory {
        let mut columns = IndexMap::new();
        columns.insert("time".to_string(), timepoints.to_vec());
        for id in species_ids {
            columns.insert(id, Vec::with_capacity(timepoints.len()));
        }
        Trajectory { columns }
    }

    /// The time column
    pub fn time(&self) -> Option<&[f64]> {
        self.column("time")
    }

    /// Concentration column for a species string
    pub fn column(&self, id: &str) -> Option<&[f64]> {
        self.columns.get(id).map(|column| column.as_slice())
    }
}

/// Contract for an external numerical engine
pub trait SimulationEngine {
    /// Simulate the network over `timepoints` starting from `initial_condition`
    ///
    /// Implementations should call [`validate_simulation_inputs`] before
    /// integrating.
    fn simulate(
        &self,
        network: &ChemicalReactionNetwork,
        timepoints: &[f64],
        initial_condition: &IndexMap<String, f64>,
    ) -> Result<Trajectory, SimulationError>;
}

/// Check simulation inputs against the network
///
/// Timepoints must be non-empty and strictly increasing; initial condition
/// keys must name network species and values must be non-negative.
pub fn validate_simulation_inputs(
    network: &ChemicalReactionNetwork,
    timepoints: &[f64],
    initial_condition: &IndexMap<String, f64>,
) -> Result<(), SimulationError> {
    if timepoints.is_empty() {
        return Err(SimulationError::EmptyTimepoints);
    }
    for (index, window) in timepoints.windows(2).enumerate() {
        if window[1] <= window[0] {
            return Err(SimulationError::NonIncreasingTimepoints { index: index + 1 });
        }
    }
    let known_ids: Vec<String> = network
        .species
        .iter()
        .map(|s| s.canonical_string())
        .collect();
    for (id, value) in initial_condition {
        if !known_ids.contains(id) {
            return Err(SimulationError::UnknownSpecies(id.clone()));
        }
        if *value < 0. {
            return Err(SimulationError::NegativeInitialCondition {
                species: id.clone(),
                value: *value,
            });
        }
    }
    Ok(())
}

/// Errors reported by simulation engines and input validation
#[derive(Debug, Error, PartialEq)]
pub enum SimulationError {
    #[error("timepoints must not be empty")]
    EmptyTimepoints,
    #[error("timepoints must be strictly increasing (violated at index {index})")]
    NonIncreasingTimepoints { index: usize },
    #[error("initial condition references unknown species `{0}`")]
    UnknownSpecies(String),
    #[error("initial concentration for `{species}` must be non-negative, found {value}")]
    NegativeInitialCondition { species: String, value: f64 },
    #[error("simulation engine failure: {0}")]
    Engine(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reaction_network::reaction::Reaction;
    use crate::reaction_network::species::Species;

    fn degradation_network() -> ChemicalReactionNetwork {
        let x = Species::with_material("X", "protein");
        let degradation = Reaction::mass_action(vec![x.clone()], vec![], 0.1);
        ChemicalReactionNetwork::new(vec![x], vec![degradation]).unwrap()
    }

    /// Minimal engine used to exercise the trait: holds every species at its
    /// initial value instead of integrating.
    struct ConstantEngine;

    impl SimulationEngine for ConstantEngine {
        fn simulate(
            &self,
            network: &ChemicalReactionNetwork,
            timepoints: &[f64],
            initial_condition: &IndexMap<String, f64>,
        ) -> Result<Trajectory, SimulationError> {
            validate_simulation_inputs(network, timepoints, initial_condition)?;
            let state = network
                .initial_state(initial_condition)
                .map_err(|err| SimulationError::Engine(err.to_string()))?;
            let mut trajectory = Trajectory::new(timepoints, state.keys().cloned());
            for (id, concentration) in &state {
                let column = trajectory.columns.get_mut(id).unwrap();
                column.extend(std::iter::repeat(*concentration).take(timepoints.len()));
            }
            Ok(trajectory)
        }
    }

    #[test]
    fn engine_produces_aligned_columns() {
        let network = degradation_network();
        let mut initial = IndexMap::new();
        initial.insert("protein_X".to_string(), 5.);
        let timepoints = [0., 1., 2.];
        let trajectory = ConstantEngine
            .simulate(&network, &timepoints, &initial)
            .unwrap();
        assert_eq!(trajectory.time(), Some(&timepoints[..]));
        assert_eq!(trajectory.column("protein_X"), Some(&[5., 5., 5.][..]));
    }

    #[test]
    fn rejects_empty_timepoints() {
        let network = degradation_network();
        assert_eq!(
            validate_simulation_inputs(&network, &[], &IndexMap::new()),
            Err(SimulationError::EmptyTimepoints)
        );
    }

    #[test]
    fn rejects_non_increasing_timepoints() {
        let network = degradation_network();
        assert_eq!(
            validate_simulation_inputs(&network, &[0., 1., 1.], &IndexMap::new()),
            Err(SimulationError::NonIncreasingTimepoints { index: 2 })
        );
    }

    #[test]
    fn rejects_unknown_species() {
        let network = degradation_network();
        let mut initial = IndexMap::new();
        initial.insert("protein_Y".to_string(), 1.);
        assert_eq!(
            validate_simulation_inputs(&network, &[0., 1.], &initial),
            Err(SimulationError::UnknownSpecies("protein_Y".to_string()))
        );
    }

    #[test]
    fn rejects_negative_initial_condition() {
        let network = degradation_network();
        let mut initial = IndexMap::new();
        initial.insert("protein_X".to_string(), -2.);
        assert!(matches!(
            validate_simulation_inputs(&network, &[0., 1.], &initial),
            Err(SimulationError::NegativeInitialCondition { .. })
        ));
    }
}
