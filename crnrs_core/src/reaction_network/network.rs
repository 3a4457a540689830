//! This module provides the ChemicalReactionNetwork struct for representing
//! an entire reaction network

use std::fmt::{Display, Formatter};

use indexmap::{IndexMap, IndexSet};
use thiserror::Error;

use crate::configuration::CONFIGURATION;
use crate::reaction_network::propensity::Concentrations;
use crate::reaction_network::reaction::Reaction;
use crate::reaction_network::species::Species;

/// Represents a chemical reaction network
///
/// The network owns a deduplicated, insertion-ordered set of species and an
/// ordered list of reactions. Every species any reaction references (as a
/// reactant, a product, or a propensity parameter) is guaranteed to be in
/// the species set; networks are built once and not mutated afterwards.
#[derive(Clone, Debug, PartialEq)]
pub struct ChemicalReactionNetwork {
    /// Species of the network, in first-insertion order
    pub species: IndexSet<Species>,
    /// Reactions of the network, in construction order
    pub reactions: Vec<Reaction>,
}

impl ChemicalReactionNetwork {
    /// Build a network from explicit species and reaction lists
    ///
    /// Species are deduplicated by value with insertion order preserved.
    /// A reaction referencing a species absent from `species` is a
    /// validation error; no partial network is returned.
    ///
    /// # Examples
    /// ```rust
    /// use crnrs_core::reaction_network::network::ChemicalReactionNetwork;
    /// use crnrs_core::reaction_network::reaction::Reaction;
    /// use crnrs_core::reaction_network::species::Species;
    /// let x = Species::with_material("X", "protein");
    /// let degradation = Reaction::mass_action(vec![x.clone()], vec![], 0.1);
    /// let network = ChemicalReactionNetwork::new(vec![x], vec![degradation]).unwrap();
    /// assert_eq!(network.species.len(), 1);
    /// ```
    pub fn new(
        species: Vec<Species>,
        reactions: Vec<Reaction>,
    ) -> Result<ChemicalReactionNetwork, NetworkError> {
        let mut species_set: IndexSet<Species> = IndexSet::new();
        for s in species {
            species_set.insert(s);
        }
        for (index, reaction) in reactions.iter().enumerate() {
            for referenced in reaction.referenced_species() {
                if !species_set.contains(referenced) {
                    return Err(NetworkError::UnknownSpecies {
                        reaction: format!("r{}", index),
                        species: referenced.canonical_string(),
                    });
                }
            }
        }
        Ok(ChemicalReactionNetwork {
            species: species_set,
            reactions,
        })
    }

    /// Map of canonical string to species, as used by the io codecs
    pub fn species_by_id(&self) -> IndexMap<String, Species> {
        self.species
            .iter()
            .map(|s| (s.canonical_string(), s.clone()))
            .collect()
    }

    /// Build a complete concentration state for the network
    ///
    /// Every species defaults to the configured initial concentration;
    /// `overrides` maps species strings to explicit values. An override key
    /// naming no network species, or a negative value, is an error.
    pub fn initial_state(
        &self,
        overrides: &IndexMap<String, f64>,
    ) -> Result<Concentrations, NetworkError> {
        let default_concentration = CONFIGURATION.read().unwrap().initial_concentration;
        let mut state: Concentrations = self
            .species
            .iter()
            .map(|s| (s.canonical_string(), default_concentration))
            .collect();
        for (id, value) in overrides {
            if *value < 0. {
                return Err(NetworkError::NegativeInitialCondition {
                    species: id.clone(),
                    value: *value,
                });
            }
            match state.get_mut(id) {
                Some(entry) => *entry = *value,
                None => return Err(NetworkError::UnknownInitialCondition(id.clone())),
            }
        }
        Ok(state)
    }

    /// Render the network with display toggles
    ///
    /// Purely a presentation concern; the toggles have no effect on
    /// semantics.
    pub fn pretty_print(&self, options: &DisplayOptions) -> String {
        let mut out = String::new();
        out.push_str(&format!("Species ({}):\n", self.species.len()));
        for species in &self.species {
            out.push_str("  ");
            out.push_str(&species.format_with(options.show_material_types, options.show_attributes));
            out.push('\n');
        }
        out.push_str(&format!("Reactions ({}):\n", self.reactions.len()));
        for reaction in &self.reactions {
            out.push_str("  ");
            out.push_str(&reaction.format_with(
                options.show_material_types,
                options.show_rates,
                options.show_attributes,
            ));
            out.push('\n');
        }
        out
    }
}

impl Display for ChemicalReactionNetwork {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.pretty_print(&DisplayOptions::default()))
    }
}

/// Presentation toggles for [`ChemicalReactionNetwork::pretty_print`]
#[derive(Clone, Copy, Debug)]
pub struct DisplayOptions {
    pub show_material_types: bool,
    pub show_rates: bool,
    pub show_attributes: bool,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        DisplayOptions {
            show_material_types: true,
            show_rates: true,
            show_attributes: true,
        }
    }
}

/// Network construction and state assembly errors
#[derive(Debug, Error, PartialEq)]
pub enum NetworkError {
    /// A reaction references a species absent from the species list
    #[error("reaction `{reaction}` references species `{species}` not present in the network")]
    UnknownSpecies { reaction: String, species: String },
    /// An initial condition key names no network species
    #[error("no species named `{0}` in the network")]
    UnknownInitialCondition(String),
    /// Initial concentrations must be non-negative
    #[error("initial concentration for `{species}` must be non-negative, found {value}")]
    NegativeInitialCondition { species: String, value: f64 },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reaction_network::propensity::Propensity;

    fn repression_network() -> ChemicalReactionNetwork {
        let dna_g = Species::with_material("G", "dna");
        let protein_a = Species::with_material("A", "protein");
        let protein_x = Species::with_material("X", "protein");
        let expression = Reaction::new(
            vec![dna_g.clone()],
            vec![dna_g.clone(), protein_x.clone()],
            Propensity::ProportionalHillNegative {
                k: 1.,
                K: 10.,
                n: 2.,
                s1: protein_a.clone(),
                d: dna_g.clone(),
            },
        );
        let degradation = Reaction::mass_action(vec![protein_x.clone()], vec![], 0.1);
        ChemicalReactionNetwork::new(
            vec![dna_g, protein_a, protein_x],
            vec![expression, degradation],
        )
        .unwrap()
    }

    #[test]
    fn species_deduplicate_in_order() {
        let a = Species::new("A");
        let b = Species::new("B");
        let network =
            ChemicalReactionNetwork::new(vec![a.clone(), b.clone(), a.clone()], vec![]).unwrap();
        let ids: Vec<String> = network.species.iter().map(|s| s.to_string()).collect();
        assert_eq!(ids, vec!["A".to_string(), "B".to_string()]);
    }

    #[test]
    fn unknown_reactant_rejected() {
        let a = Species::new("A");
        let b = Species::new("B");
        let reaction = Reaction::mass_action(vec![a.clone()], vec![b], 1.);
        let err = ChemicalReactionNetwork::new(vec![a], vec![reaction]).unwrap_err();
        assert_eq!(
            err,
            NetworkError::UnknownSpecies {
                reaction: "r0".to_string(),
                species: "B".to_string(),
            }
        );
    }

    #[test]
    fn unknown_propensity_species_rejected() {
        let a = Species::new("A");
        let missing = Species::with_material("R", "protein");
        let reaction = Reaction::new(
            vec![a.clone()],
            vec![],
            Propensity::HillNegative {
                k: 1.,
                K: 1.,
                n: 1.,
                s1: missing,
            },
        );
        let err = ChemicalReactionNetwork::new(vec![a], vec![reaction]).unwrap_err();
        assert!(matches!(err, NetworkError::UnknownSpecies { species, .. } if species == "protein_R"));
    }

    #[test]
    fn initial_state_defaults_and_overrides() {
        let network = repression_network();
        let mut overrides = IndexMap::new();
        overrides.insert("dna_G".to_string(), 1.);
        overrides.insert("protein_A".to_string(), 2.);
        let state = network.initial_state(&overrides).unwrap();
        assert_eq!(state.get("dna_G"), Some(&1.));
        assert_eq!(state.get("protein_A"), Some(&2.));
        assert_eq!(state.get("protein_X"), Some(&0.));
    }

    #[test]
    fn initial_state_rejects_unknown_species() {
        let network = repression_network();
        let mut overrides = IndexMap::new();
        overrides.insert("protein_Y".to_string(), 1.);
        assert_eq!(
            network.initial_state(&overrides).unwrap_err(),
            NetworkError::UnknownInitialCondition("protein_Y".to_string())
        );
    }

    #[test]
    fn initial_state_rejects_negative_values() {
        let network = repression_network();
        let mut overrides = IndexMap::new();
        overrides.insert("dna_G".to_string(), -1.);
        assert!(matches!(
            network.initial_state(&overrides).unwrap_err(),
            NetworkError::NegativeInitialCondition { .. }
        ));
    }

    #[test]
    fn sample_network_propensities() {
        let network = repression_network();
        let mut overrides = IndexMap::new();
        overrides.insert("dna_G".to_string(), 1.);
        overrides.insert("protein_A".to_string(), 2.);
        overrides.insert("protein_X".to_string(), 5.);
        let state = network.initial_state(&overrides).unwrap();
        let r0 = network.reactions[0].propensity_value(&state).unwrap();
        let r1 = network.reactions[1].propensity_value(&state).unwrap();
        assert!((r0 - 1. / 14.).abs() < 1e-12);
        assert!((r1 - 0.5).abs() < 1e-12);
    }

    #[test]
    fn pretty_print_toggles() {
        let network = repression_network();
        let full = network.pretty_print(&DisplayOptions::default());
        assert!(full.contains("dna_G"));
        assert!(full.contains("type=proportionalhillnegative"));
        let bare = network.pretty_print(&DisplayOptions {
            show_material_types: false,
            show_rates: false,
            show_attributes: false,
        });
        assert!(bare.contains("\n  G\n"));
        assert!(!bare.contains("type="));
    }
}
