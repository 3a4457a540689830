//! Module providing JSON IO for reaction networks
use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::reaction_network::network::{ChemicalReactionNetwork, NetworkError};
use crate::reaction_network::propensity::Propensity;
use crate::reaction_network::reaction::Reaction;
use crate::reaction_network::species::Species;

// region JSON Network
/// Represents a JSON serialized network, used for reading and writing
/// networks in json format
#[derive(Serialize, Deserialize)]
struct JsonNetwork {
    species: Vec<Species>,
    reactions: Vec<JsonReaction>,
}

#[derive(Serialize, Deserialize)]
struct JsonReaction {
    reactants: Vec<JsonSpeciesReference>,
    products: Vec<JsonSpeciesReference>,
    propensity: Propensity,
}

/// One stoichiometry entry of a reaction
///
/// Species cannot key a JSON map directly, so stoichiometries are stored as
/// explicit reference lists.
#[derive(Serialize, Deserialize)]
struct JsonSpeciesReference {
    species: Species,
    stoichiometry: f64,
}
// endregion JSON Network

// region Conversions
fn to_reference_list(side: &IndexMap<Species, f64>) -> Vec<JsonSpeciesReference> {
    side.iter()
        .map(|(species, stoichiometry)| JsonSpeciesReference {
            species: species.clone(),
            stoichiometry: *stoichiometry,
        })
        .collect()
}

fn from_reference_list(references: Vec<JsonSpeciesReference>) -> IndexMap<Species, f64> {
    let mut side = IndexMap::new();
    for reference in references {
        *side.entry(reference.species).or_insert(0.) += reference.stoichiometry;
    }
    side
}

impl From<&Reaction> for JsonReaction {
    fn from(reaction: &Reaction) -> Self {
        JsonReaction {
            reactants: to_reference_list(&reaction.reactants),
            products: to_reference_list(&reaction.products),
            propensity: reaction.propensity.clone(),
        }
    }
}

impl From<JsonReaction> for Reaction {
    fn from(reaction: JsonReaction) -> Self {
        Reaction::from_stoichiometry(
            from_reference_list(reaction.reactants),
            from_reference_list(reaction.products),
            reaction.propensity,
        )
    }
}

impl ChemicalReactionNetwork {
    /// Read a network from a json file
    pub fn read_json<P: AsRef<Path>>(path: P) -> Result<ChemicalReactionNetwork, JsonError> {
        let network_str = match fs::read_to_string(path) {
            Ok(data) => data,
            Err(err) => return Err(JsonError::UnableToRead(format!("{:?}", err))),
        };
        let json_network = match serde_json::from_str::<JsonNetwork>(&network_str) {
            Ok(network) => network,
            Err(err) => return Err(JsonError::UnableToParse(format!("{:?}", err))),
        };
        ChemicalReactionNetwork::from_json(json_network)
    }

    /// Write the network to a json file, overwriting any existing file
    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<(), JsonError> {
        let json_network = self.to_json();
        let network_string = serde_json::to_string(&json_network)?;
        fs::write(path, network_string)?;
        Ok(())
    }

    fn from_json(json_network: JsonNetwork) -> Result<ChemicalReactionNetwork, JsonError> {
        let reactions: Vec<Reaction> = json_network
            .reactions
            .into_iter()
            .map(Reaction::from)
            .collect();
        Ok(ChemicalReactionNetwork::new(json_network.species, reactions)?)
    }

    fn to_json(&self) -> JsonNetwork {
        JsonNetwork {
            species: self.species.iter().cloned().collect(),
            reactions: self.reactions.iter().map(JsonReaction::from).collect(),
        }
    }
}
// endregion Conversions

#[derive(Error, Debug)]
pub enum JsonError {
    #[error("Unable to read file due to {0}")]
    UnableToRead(String),
    #[error("Unable to parse json due to {0}")]
    UnableToParse(String),
    #[error("Deserialized network failed validation")]
    InvalidNetwork(#[from] NetworkError),
    #[error("Serde json error")]
    SerdeJsonError(#[from] serde_json::Error),
    #[error("Unable to write to file")]
    UnableToWrite(#[from] std::io::Error),
}
