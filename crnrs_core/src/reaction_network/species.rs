//! This module provides the Species struct representing a chemical species
//!
//! A species is an immutable value object identified by its name, optional
//! material type, and attribute set. Composite species additionally carry
//! their constituent list.

use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};
use std::hash::Hash;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

/// Represents a chemical species
///
/// Two species are equal iff their name, material type, attribute set, and
/// composition all match. Species are hashable by value, so they can be
/// deduplicated in set containers.
#[derive(Builder, Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Species {
    /// Base name of the species (for complexes, derived from the members)
    pub name: String,
    /// Material type of the species (e.g. "dna", "protein")
    #[builder(default = "None")]
    pub material_type: Option<String>,
    /// Attributes attached to the species (e.g. "degtagged")
    #[builder(default = "BTreeSet::new()")]
    pub attributes: BTreeSet<String>,
    /// Whether the species is elementary or a complex of other species
    #[builder(default = "Composition::Simple")]
    pub composition: Composition,
}

/// Composition of a [`Species`]
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Composition {
    /// An elementary species
    Simple,
    /// A complex made from other species
    ///
    /// Unordered complexes are canonicalized by sorting their members at
    /// construction, which makes equality order independent. Ordered
    /// complexes keep their member sequence and compare order sensitively.
    Complex { members: Vec<Species>, ordered: bool },
}

impl Species {
    /// Create a new elementary species with no material type or attributes
    ///
    /// # Examples
    /// ```rust
    /// use crnrs_core::reaction_network::species::Species;
    /// let a = Species::new("A");
    /// assert_eq!(a.to_string(), "A");
    /// ```
    pub fn new(name: &str) -> Species {
        SpeciesBuilder::default()
            .name(name.to_string())
            .build()
            .unwrap()
    }

    /// Create a new elementary species with a material type
    ///
    /// # Examples
    /// ```rust
    /// use crnrs_core::reaction_network::species::Species;
    /// let g = Species::with_material("G", "dna");
    /// assert_eq!(g.to_string(), "dna_G");
    /// ```
    pub fn with_material(name: &str, material_type: &str) -> Species {
        SpeciesBuilder::default()
            .name(name.to_string())
            .material_type(Some(material_type.to_string()))
            .build()
            .unwrap()
    }

    /// Return a copy of this species with an additional attribute
    pub fn with_attribute(&self, attribute: &str) -> Species {
        let mut new_species = self.clone();
        new_species.attributes.insert(attribute.to_string());
        new_species
    }

    /// Create an unordered complex from the provided member species
    ///
    /// Members are sorted into a canonical order, so complexes built from
    /// the same multiset of members are equal regardless of argument order.
    pub fn complex(members: Vec<Species>) -> Species {
        let mut members = members;
        members.sort();
        Species::complex_inner(members, false)
    }

    /// Create an ordered complex from the provided member species
    ///
    /// Member order is part of the complex's identity.
    pub fn ordered_complex(members: Vec<Species>) -> Species {
        Species::complex_inner(members, true)
    }

    /// Create an unordered complex of `count` copies of `unit`
    pub fn multimer(unit: &Species, count: usize) -> Species {
        Species::complex(vec![unit.clone(); count])
    }

    fn complex_inner(members: Vec<Species>, ordered: bool) -> Species {
        let name = members
            .iter()
            .map(|m| m.canonical_string())
            .collect::<Vec<String>>()
            .join("_");
        SpeciesBuilder::default()
            .name(name)
            .composition(Composition::Complex { members, ordered })
            .build()
            .unwrap()
    }

    /// Get the constituent species of a complex, or None for an elementary species
    pub fn members(&self) -> Option<&[Species]> {
        match &self.composition {
            Composition::Simple => None,
            Composition::Complex { members, .. } => Some(members),
        }
    }

    /// Full textual form of the species
    ///
    /// This string is used for display, as the key in concentration maps,
    /// and as the species id in exported SBML documents.
    pub fn canonical_string(&self) -> String {
        self.format_with(true, true)
    }

    /// Textual form with independent toggles for material types and attributes
    pub fn format_with(&self, show_material: bool, show_attributes: bool) -> String {
        let mut parts: Vec<String> = Vec::new();
        match &self.composition {
            Composition::Simple => {
                if show_material {
                    if let Some(ref material) = self.material_type {
                        parts.push(material.clone());
                    }
                }
                parts.push(self.name.clone());
            }
            Composition::Complex { members, ordered } => {
                if show_material {
                    let prefix = match self.material_type {
                        Some(ref material) => material.clone(),
                        None if *ordered => "ordered_complex".to_string(),
                        None => "complex".to_string(),
                    };
                    parts.push(prefix);
                }
                for member in members {
                    parts.push(member.format_with(show_material, show_attributes));
                }
            }
        }
        if show_attributes {
            for attribute in &self.attributes {
                parts.push(attribute.clone());
            }
        }
        parts.join("_")
    }
}

impl Display for Species {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.canonical_string())
    }
}
