//! This module provides a struct for representing reactions

use std::fmt::{Display, Formatter};

use derive_builder::Builder;
use indexmap::IndexMap;

use crate::configuration::{RateMode, CONFIGURATION};
use crate::reaction_network::propensity::{Concentrations, Propensity, RateError};
use crate::reaction_network::species::Species;

/// Represents a single irreversible reaction
///
/// A reaction pairs a reactant multiset and a product multiset with exactly
/// one propensity, and is immutable once constructed. Reversible reactions
/// are materialized eagerly as two irreversible reactions, see
/// [`Reaction::reversible`].
#[derive(Builder, Debug, Clone, PartialEq)]
pub struct Reaction {
    /// Reactant stoichiometry of the reaction
    #[builder(default = "IndexMap::new()")]
    pub reactants: IndexMap<Species, f64>,
    /// Product stoichiometry of the reaction
    #[builder(default = "IndexMap::new()")]
    pub products: IndexMap<Species, f64>,
    /// Rate law governing the reaction
    pub propensity: Propensity,
}

impl Reaction {
    /// Create a reaction from species lists
    ///
    /// Repeated species accumulate into their stoichiometric coefficient, so
    /// `[A, A]` becomes `2 A`.
    ///
    /// # Examples
    /// ```rust
    /// use crnrs_core::reaction_network::propensity::Propensity;
    /// use crnrs_core::reaction_network::reaction::Reaction;
    /// use crnrs_core::reaction_network::species::Species;
    /// let x = Species::with_material("X", "protein");
    /// let degradation = Reaction::new(vec![x], vec![], Propensity::MassAction { k: 0.1 });
    /// assert_eq!(degradation.to_string(), "protein_X --> ");
    /// ```
    pub fn new(reactants: Vec<Species>, products: Vec<Species>, propensity: Propensity) -> Reaction {
        ReactionBuilder::default()
            .reactants(count_species(reactants))
            .products(count_species(products))
            .propensity(propensity)
            .build()
            .unwrap()
    }

    /// Create a reaction directly from stoichiometry maps
    pub fn from_stoichiometry(
        reactants: IndexMap<Species, f64>,
        products: IndexMap<Species, f64>,
        propensity: Propensity,
    ) -> Reaction {
        ReactionBuilder::default()
            .reactants(reactants)
            .products(products)
            .propensity(propensity)
            .build()
            .unwrap()
    }

    /// Shorthand for a mass action reaction with rate constant `k`
    pub fn mass_action(reactants: Vec<Species>, products: Vec<Species>, k: f64) -> Reaction {
        Reaction::new(reactants, products, Propensity::MassAction { k })
    }

    /// Materialize a reversible reaction as two irreversible reactions
    ///
    /// The second reaction has the reactant and product roles swapped and
    /// carries the `reverse` propensity. The pair behaves identically to two
    /// independently constructed irreversible reactions.
    pub fn reversible(
        reactants: Vec<Species>,
        products: Vec<Species>,
        forward: Propensity,
        reverse: Propensity,
    ) -> [Reaction; 2] {
        let forward_reaction = Reaction::new(reactants.clone(), products.clone(), forward);
        let reverse_reaction = Reaction::new(products, reactants, reverse);
        [forward_reaction, reverse_reaction]
    }

    /// Shorthand for a reversible mass action reaction with rates `k` and `k_rev`
    pub fn reversible_mass_action(
        reactants: Vec<Species>,
        products: Vec<Species>,
        k: f64,
        k_rev: f64,
    ) -> [Reaction; 2] {
        Reaction::reversible(
            reactants,
            products,
            Propensity::MassAction { k },
            Propensity::MassAction { k: k_rev },
        )
    }

    /// Evaluate the reaction's propensity using the configured rate mode
    pub fn propensity_value(&self, state: &Concentrations) -> Result<f64, RateError> {
        let mode = CONFIGURATION.read().unwrap().rate_mode;
        self.propensity_value_with_mode(state, mode)
    }

    /// Evaluate the reaction's propensity with an explicit rate mode
    pub fn propensity_value_with_mode(
        &self,
        state: &Concentrations,
        mode: RateMode,
    ) -> Result<f64, RateError> {
        self.propensity.evaluate(state, &self.reactants, mode)
    }

    /// All species this reaction touches: reactants, products, and the
    /// species the propensity depends on
    pub fn referenced_species(&self) -> Vec<&Species> {
        let mut species: Vec<&Species> = Vec::new();
        species.extend(self.reactants.keys());
        species.extend(self.products.keys());
        species.extend(self.propensity.species_dependencies());
        species
    }

    /// Render the reaction with display toggles for material types, rate
    /// expressions, and attributes
    pub fn format_with(&self, show_material: bool, show_rate: bool, show_attributes: bool) -> String {
        let render_side = |side: &IndexMap<Species, f64>| {
            side.iter()
                .map(|(species, stoichiometry)| {
                    let id = species.format_with(show_material, show_attributes);
                    if *stoichiometry == 1. {
                        id
                    } else {
                        format!("{} {}", stoichiometry, id)
                    }
                })
                .collect::<Vec<String>>()
                .join(" + ")
        };
        let mut rendered = format!(
            "{} --> {}",
            render_side(&self.reactants),
            render_side(&self.products)
        );
        if show_rate {
            rendered.push_str(&format!("  [{}]", self.propensity.to_annotation()));
        }
        rendered
    }
}

impl Display for Reaction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.format_with(true, false, true))
    }
}

/// Accumulate a species list into a stoichiometry map, preserving first
/// occurrence order
fn count_species(species: Vec<Species>) -> IndexMap<Species, f64> {
    let mut counts: IndexMap<Species, f64> = IndexMap::new();
    for s in species {
        *counts.entry(s).or_insert(0.) += 1.;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_reactants_accumulate() {
        let a = Species::new("A");
        let b = Species::new("B");
        let reaction = Reaction::mass_action(vec![a.clone(), a.clone()], vec![b.clone()], 1.);
        assert_eq!(reaction.reactants.get(&a), Some(&2.));
        assert_eq!(reaction.products.get(&b), Some(&1.));
        assert_eq!(reaction.to_string(), "2 A --> B");
    }

    #[test]
    fn reversible_pair_matches_explicit_reactions() {
        let a = Species::new("A");
        let b = Species::new("B");
        let [forward, reverse] =
            Reaction::reversible_mass_action(vec![a.clone()], vec![b.clone()], 2., 0.5);
        let explicit_forward = Reaction::mass_action(vec![a.clone()], vec![b.clone()], 2.);
        let explicit_reverse = Reaction::mass_action(vec![b.clone()], vec![a.clone()], 0.5);
        assert_eq!(forward, explicit_forward);
        assert_eq!(reverse, explicit_reverse);

        let mut state = Concentrations::new();
        state.insert("A".to_string(), 3.);
        state.insert("B".to_string(), 4.);
        let forward_rate = forward
            .propensity_value_with_mode(&state, RateMode::Deterministic)
            .unwrap();
        let reverse_rate = reverse
            .propensity_value_with_mode(&state, RateMode::Deterministic)
            .unwrap();
        assert!((forward_rate - 6.).abs() < 1e-12);
        assert!((reverse_rate - 2.).abs() < 1e-12);
    }

    #[test]
    fn referenced_species_include_propensity_dependencies() {
        let g = Species::with_material("G", "dna");
        let a = Species::with_material("A", "protein");
        let x = Species::with_material("X", "protein");
        let reaction = Reaction::new(
            vec![g.clone()],
            vec![g.clone(), x.clone()],
            Propensity::ProportionalHillNegative {
                k: 1.,
                K: 10.,
                n: 2.,
                s1: a.clone(),
                d: g.clone(),
            },
        );
        let referenced = reaction.referenced_species();
        assert!(referenced.contains(&&g));
        assert!(referenced.contains(&&x));
        assert!(referenced.contains(&&a));
    }

    #[test]
    fn display_toggles() {
        let g = Species::with_material("G", "dna").with_attribute("bound");
        let x = Species::with_material("X", "protein");
        let reaction = Reaction::mass_action(vec![g.clone()], vec![g, x], 1.);
        assert_eq!(
            reaction.format_with(true, false, true),
            "dna_G_bound --> dna_G_bound + protein_X"
        );
        assert_eq!(reaction.format_with(false, false, false), "G --> G + X");
        assert!(reaction
            .format_with(true, true, true)
            .contains("type=massaction k=1"));
    }
}
