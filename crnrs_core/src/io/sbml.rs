//! Module providing SBML Level 3 Version 1 IO for reaction networks
//!
//! Export writes one `<species>` element per network species and one
//! `<reaction>` element per reaction. The propensity is carried twice: as a
//! flat `<PropensityType>` annotation (`type=<kind> key=value ...`), which is
//! the normative, losslessly round-trippable encoding, and as a MathML
//! `<kineticLaw>` equivalent to the evaluated rate, for consumers that only
//! understand standard SBML. Species structure (material type, attributes,
//! complex composition) rides in a `<SpeciesData>` annotation holding the
//! species' JSON serialization, so `from_sbml(to_sbml(n)) == n`.

use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use quick_xml::events::attributes::AttrError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use thiserror::Error;

use crate::configuration::CONFIGURATION;
use crate::reaction_network::network::{ChemicalReactionNetwork, NetworkError};
use crate::reaction_network::propensity::{Propensity, PropensityError, RateExpr, RateOp};
use crate::reaction_network::reaction::Reaction;
use crate::reaction_network::species::Species;

const SBML_NAMESPACE: &str = "http://www.sbml.org/sbml/level3/version1/core";
const MATHML_NAMESPACE: &str = "http://www.w3.org/1998/Math/MathML";

// region Export

impl ChemicalReactionNetwork {
    /// Serialize the network as an SBML Level 3 Version 1 document
    pub fn to_sbml(&self) -> Result<String, SbmlError> {
        let (compartment, initial_concentration) = {
            let configuration = CONFIGURATION.read().unwrap();
            (
                configuration.compartment.clone(),
                configuration.initial_concentration,
            )
        };
        let mut out = String::new();
        out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        out.push_str(&format!(
            "<sbml xmlns=\"{}\" level=\"3\" version=\"1\">\n",
            SBML_NAMESPACE
        ));
        out.push_str("  <model id=\"crn\">\n");
        out.push_str("    <listOfCompartments>\n");
        out.push_str(&format!(
            "      <compartment id=\"{}\" spatialDimensions=\"3\" size=\"1\" constant=\"true\"/>\n",
            escape_xml(&compartment)
        ));
        out.push_str("    </listOfCompartments>\n");

        out.push_str("    <listOfSpecies>\n");
        for species in &self.species {
            let id = species.canonical_string();
            out.push_str(&format!(
                "      <species id=\"{}\" compartment=\"{}\" initialConcentration=\"{}\" \
                 substanceUnits=\"mole\" hasOnlySubstanceUnits=\"false\" \
                 boundaryCondition=\"false\" constant=\"false\">\n",
                escape_xml(&id),
                escape_xml(&compartment),
                initial_concentration
            ));
            out.push_str("        <annotation>\n");
            out.push_str(&format!(
                "          <SpeciesData>{}</SpeciesData>\n",
                escape_xml(&serde_json::to_string(species)?)
            ));
            out.push_str("        </annotation>\n");
            out.push_str("      </species>\n");
        }
        out.push_str("    </listOfSpecies>\n");

        out.push_str("    <listOfReactions>\n");
        for (index, reaction) in self.reactions.iter().enumerate() {
            write_reaction(&mut out, index, reaction);
        }
        out.push_str("    </listOfReactions>\n");
        out.push_str("  </model>\n");
        out.push_str("</sbml>\n");
        Ok(out)
    }

    /// Write the network to an SBML file, overwriting any existing file
    pub fn write_sbml<P: AsRef<Path>>(&self, path: P) -> Result<(), SbmlError> {
        let document = self.to_sbml()?;
        fs::write(path, document)?;
        Ok(())
    }
}

fn write_reaction(out: &mut String, index: usize, reaction: &Reaction) {
    out.push_str(&format!(
        "      <reaction id=\"r{}\" reversible=\"false\" fast=\"false\">\n",
        index
    ));
    out.push_str("        <annotation>\n");
    out.push_str(&format!(
        "          <PropensityType> {} </PropensityType>\n",
        escape_xml(&reaction.propensity.to_annotation())
    ));
    out.push_str("        </annotation>\n");
    write_species_references(out, "listOfReactants", &reaction.reactants);
    write_species_references(out, "listOfProducts", &reaction.products);

    out.push_str("        <kineticLaw>\n");
    out.push_str(&format!(
        "          <math xmlns=\"{}\">\n",
        MATHML_NAMESPACE
    ));
    let law = rate_law_expr(&reaction.propensity, &reaction.reactants);
    write_mathml(out, &law, 6);
    out.push_str("          </math>\n");
    let locals = local_parameters(&reaction.propensity);
    if !locals.is_empty() {
        out.push_str("          <listOfLocalParameters>\n");
        for (id, value) in locals {
            out.push_str(&format!(
                "            <localParameter id=\"{}\" value=\"{}\"/>\n",
                id, value
            ));
        }
        out.push_str("          </listOfLocalParameters>\n");
    }
    out.push_str("        </kineticLaw>\n");
    out.push_str("      </reaction>\n");
}

fn write_species_references(out: &mut String, list_tag: &str, side: &IndexMap<Species, f64>) {
    if side.is_empty() {
        return;
    }
    out.push_str(&format!("        <{}>\n", list_tag));
    for (species, stoichiometry) in side {
        out.push_str(&format!(
            "          <speciesReference species=\"{}\" stoichiometry=\"{}\" constant=\"true\"/>\n",
            escape_xml(&species.canonical_string()),
            stoichiometry
        ));
    }
    out.push_str(&format!("        </{}>\n", list_tag));
}

/// Build the kinetic law as a rate expression tree
///
/// Numeric rate constants appear as the local parameter names (`k`, `K`,
/// `n`), species as their canonical ids, so the rendered MathML evaluates to
/// the same value as propensity evaluation.
fn rate_law_expr(propensity: &Propensity, reactants: &IndexMap<Species, f64>) -> RateExpr {
    let var = |name: &str| RateExpr::Variable(name.to_string());
    let bin = |op: RateOp, left: RateExpr, right: RateExpr| RateExpr::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
    };
    let hill_power = |s1: &Species| {
        bin(
            RateOp::Pow,
            RateExpr::Variable(s1.canonical_string()),
            var("n"),
        )
    };
    let hill_denominator = |s1: &Species| bin(RateOp::Add, hill_power(s1), var("K"));
    match propensity {
        Propensity::MassAction { .. } => {
            let mut law = var("k");
            for (species, stoichiometry) in reactants {
                let concentration = RateExpr::Variable(species.canonical_string());
                let factor = if *stoichiometry == 1. {
                    concentration
                } else {
                    bin(RateOp::Pow, concentration, RateExpr::Number(*stoichiometry))
                };
                law = bin(RateOp::Mul, law, factor);
            }
            law
        }
        Propensity::HillPositive { s1, .. } => bin(
            RateOp::Div,
            bin(RateOp::Mul, var("k"), hill_power(s1)),
            hill_denominator(s1),
        ),
        Propensity::HillNegative { s1, .. } => {
            bin(RateOp::Div, var("k"), hill_denominator(s1))
        }
        Propensity::ProportionalHillPositive { s1, d, .. } => bin(
            RateOp::Div,
            bin(
                RateOp::Mul,
                bin(RateOp::Mul, var("k"), RateExpr::Variable(d.canonical_string())),
                hill_power(s1),
            ),
            hill_denominator(s1),
        ),
        Propensity::ProportionalHillNegative { s1, d, .. } => bin(
            RateOp::Div,
            bin(RateOp::Mul, var("k"), RateExpr::Variable(d.canonical_string())),
            hill_denominator(s1),
        ),
        Propensity::General { rate } => rate.root.clone(),
    }
}

/// Numeric constants declared as kinetic law local parameters
#[allow(non_snake_case)]
fn local_parameters(propensity: &Propensity) -> Vec<(&'static str, f64)> {
    match propensity {
        Propensity::MassAction { k } => vec![("k", *k)],
        Propensity::HillPositive { k, K, n, .. }
        | Propensity::HillNegative { k, K, n, .. }
        | Propensity::ProportionalHillPositive { k, K, n, .. }
        | Propensity::ProportionalHillNegative { k, K, n, .. } => {
            vec![("k", *k), ("K", *K), ("n", *n)]
        }
        Propensity::General { .. } => Vec::new(),
    }
}

fn write_mathml(out: &mut String, expr: &RateExpr, depth: usize) {
    let indent = "  ".repeat(depth);
    match expr {
        RateExpr::Number(value) => {
            out.push_str(&format!("{}<cn> {} </cn>\n", indent, value));
        }
        RateExpr::Variable(name) => {
            out.push_str(&format!("{}<ci> {} </ci>\n", indent, escape_xml(name)));
        }
        RateExpr::Negate(inner) => {
            out.push_str(&format!("{}<apply>\n", indent));
            out.push_str(&format!("{}  <minus/>\n", indent));
            write_mathml(out, inner, depth + 1);
            out.push_str(&format!("{}</apply>\n", indent));
        }
        RateExpr::Binary { op, left, right } => {
            let tag = match op {
                RateOp::Add => "plus",
                RateOp::Sub => "minus",
                RateOp::Mul => "times",
                RateOp::Div => "divide",
                RateOp::Pow => "power",
            };
            out.push_str(&format!("{}<apply>\n", indent));
            out.push_str(&format!("{}  <{}/>\n", indent, tag));
            write_mathml(out, left, depth + 1);
            write_mathml(out, right, depth + 1);
            out.push_str(&format!("{}</apply>\n", indent));
        }
    }
}

fn escape_xml(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

// endregion Export

// region Import

#[derive(PartialEq, Clone, Copy)]
enum ReactionSide {
    Outside,
    Reactants,
    Products,
}

struct ReactionDraft {
    id: String,
    reactants: Vec<(String, f64)>,
    products: Vec<(String, f64)>,
    annotation: Option<String>,
}

impl ChemicalReactionNetwork {
    /// Read a network from an SBML file
    pub fn read_sbml<P: AsRef<Path>>(path: P) -> Result<ChemicalReactionNetwork, SbmlError> {
        let document = match fs::read_to_string(path) {
            Ok(data) => data,
            Err(err) => return Err(SbmlError::UnableToRead(format!("{:?}", err))),
        };
        ChemicalReactionNetwork::from_sbml(&document)
    }

    /// Parse a network from SBML document text
    ///
    /// Species are rebuilt from their `<SpeciesData>` annotation when
    /// present, falling back to an elementary species named by the SBML id.
    /// Propensities are rebuilt from the `<PropensityType>` annotation; the
    /// kinetic law MathML is not consulted. All errors identify the species
    /// or reaction at fault.
    pub fn from_sbml(document: &str) -> Result<ChemicalReactionNetwork, SbmlError> {
        let mut reader = Reader::from_str(document);

        let mut species_list: Vec<Species> = Vec::new();
        let mut species_by_id: IndexMap<String, Species> = IndexMap::new();
        let mut reactions: Vec<Reaction> = Vec::new();

        let mut pending_species: Option<String> = None;
        let mut in_species_data = false;
        let mut draft: Option<ReactionDraft> = None;
        let mut side = ReactionSide::Outside;
        let mut in_propensity_type = false;

        loop {
            match reader.read_event()? {
                Event::Eof => break,
                Event::Start(e) => match e.name().as_ref() {
                    b"species" => {
                        pending_species = Some(required_attr(&e, "id")?);
                    }
                    b"SpeciesData" => {
                        in_species_data = pending_species.is_some();
                    }
                    b"reaction" => {
                        draft = Some(ReactionDraft {
                            id: required_attr(&e, "id")?,
                            reactants: Vec::new(),
                            products: Vec::new(),
                            annotation: None,
                        });
                    }
                    b"listOfReactants" => side = ReactionSide::Reactants,
                    b"listOfProducts" => side = ReactionSide::Products,
                    b"PropensityType" => {
                        in_propensity_type = draft.is_some();
                    }
                    b"speciesReference" => {
                        record_species_reference(&e, &mut draft, side)?;
                    }
                    _ => {}
                },
                Event::Empty(e) => match e.name().as_ref() {
                    b"species" => {
                        let id = required_attr(&e, "id")?;
                        register_species(Species::new(&id), id, &mut species_list, &mut species_by_id);
                    }
                    b"speciesReference" => {
                        record_species_reference(&e, &mut draft, side)?;
                    }
                    _ => {}
                },
                Event::Text(t) => {
                    if in_species_data {
                        if let Some(id) = pending_species.take() {
                            let text = t.unescape()?;
                            let species: Species = serde_json::from_str(&text).map_err(|err| {
                                SbmlError::SpeciesAnnotation {
                                    id: id.clone(),
                                    source: err,
                                }
                            })?;
                            if species.canonical_string() != id {
                                return Err(SbmlError::SpeciesIdMismatch {
                                    id,
                                    canonical: species.canonical_string(),
                                });
                            }
                            register_species(species, id, &mut species_list, &mut species_by_id);
                        }
                        in_species_data = false;
                    } else if in_propensity_type {
                        if let Some(ref mut draft) = draft {
                            draft.annotation = Some(t.unescape()?.trim().to_string());
                        }
                    }
                }
                Event::End(e) => match e.name().as_ref() {
                    b"species" => {
                        // No annotation seen; fall back to the bare id
                        if let Some(id) = pending_species.take() {
                            register_species(
                                Species::new(&id),
                                id,
                                &mut species_list,
                                &mut species_by_id,
                            );
                        }
                    }
                    b"SpeciesData" => in_species_data = false,
                    b"PropensityType" => in_propensity_type = false,
                    b"listOfReactants" | b"listOfProducts" => side = ReactionSide::Outside,
                    b"reaction" => {
                        if let Some(finished) = draft.take() {
                            reactions.push(finish_reaction(finished, &species_by_id)?);
                        }
                    }
                    _ => {}
                },
                _ => {}
            }
        }

        Ok(ChemicalReactionNetwork::new(species_list, reactions)?)
    }
}

fn register_species(
    species: Species,
    id: String,
    species_list: &mut Vec<Species>,
    species_by_id: &mut IndexMap<String, Species>,
) {
    species_list.push(species.clone());
    species_by_id.insert(id, species);
}

fn record_species_reference(
    element: &BytesStart,
    draft: &mut Option<ReactionDraft>,
    side: ReactionSide,
) -> Result<(), SbmlError> {
    let Some(draft) = draft.as_mut() else {
        return Ok(());
    };
    if side == ReactionSide::Outside {
        // e.g. a modifier reference; not part of the stoichiometry
        return Ok(());
    }
    let species = required_attr(element, "species")?;
    let stoichiometry = match optional_attr(element, "stoichiometry")? {
        Some(raw) => raw.parse().map_err(|_| SbmlError::InvalidStoichiometry {
            reaction: draft.id.clone(),
            value: raw,
        })?,
        None => 1.,
    };
    match side {
        ReactionSide::Reactants => draft.reactants.push((species, stoichiometry)),
        ReactionSide::Products => draft.products.push((species, stoichiometry)),
        ReactionSide::Outside => unreachable!(),
    }
    Ok(())
}

fn finish_reaction(
    draft: ReactionDraft,
    species_by_id: &IndexMap<String, Species>,
) -> Result<Reaction, SbmlError> {
    let annotation = draft
        .annotation
        .ok_or_else(|| SbmlError::MissingPropensityAnnotation {
            reaction: draft.id.clone(),
        })?;
    let propensity =
        Propensity::from_annotation(&annotation, species_by_id).map_err(|err| {
            SbmlError::InvalidPropensity {
                reaction: draft.id.clone(),
                source: err,
            }
        })?;
    let resolve = |references: Vec<(String, f64)>| -> Result<IndexMap<Species, f64>, SbmlError> {
        let mut stoichiometry: IndexMap<Species, f64> = IndexMap::new();
        for (id, count) in references {
            let species =
                species_by_id
                    .get(&id)
                    .cloned()
                    .ok_or_else(|| SbmlError::UnknownSpeciesReference {
                        reaction: draft.id.clone(),
                        species: id,
                    })?;
            *stoichiometry.entry(species).or_insert(0.) += count;
        }
        Ok(stoichiometry)
    };
    let reactants = resolve(draft.reactants)?;
    let products = resolve(draft.products)?;
    Ok(Reaction::from_stoichiometry(reactants, products, propensity))
}

fn required_attr(element: &BytesStart, name: &'static str) -> Result<String, SbmlError> {
    optional_attr(element, name)?.ok_or_else(|| SbmlError::MissingAttribute {
        element: String::from_utf8_lossy(element.name().as_ref()).into_owned(),
        attribute: name,
    })
}

fn optional_attr(element: &BytesStart, name: &str) -> Result<Option<String>, SbmlError> {
    for attribute in element.attributes() {
        let attribute = attribute?;
        if attribute.key.as_ref() == name.as_bytes() {
            return Ok(Some(attribute.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

// endregion Import

#[derive(Error, Debug)]
pub enum SbmlError {
    #[error("Unable to read file due to {0}")]
    UnableToRead(String),
    #[error("Unable to write to file")]
    UnableToWrite(#[from] std::io::Error),
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("XML attribute error: {0}")]
    Attribute(#[from] AttrError),
    #[error("element `{element}` is missing required attribute `{attribute}`")]
    MissingAttribute {
        element: String,
        attribute: &'static str,
    },
    #[error("species annotation for `{id}` could not be parsed: {source}")]
    SpeciesAnnotation {
        id: String,
        source: serde_json::Error,
    },
    #[error("annotation for species `{id}` describes `{canonical}` instead")]
    SpeciesIdMismatch { id: String, canonical: String },
    #[error("reaction `{reaction}` has no PropensityType annotation")]
    MissingPropensityAnnotation { reaction: String },
    #[error("reaction `{reaction}` has an invalid propensity annotation: {source}")]
    InvalidPropensity {
        reaction: String,
        source: PropensityError,
    },
    #[error("reaction `{reaction}` references unknown species `{species}`")]
    UnknownSpeciesReference { reaction: String, species: String },
    #[error("invalid stoichiometry `{value}` in reaction `{reaction}`")]
    InvalidStoichiometry { reaction: String, value: String },
    #[error("species annotation could not be serialized")]
    Serialize(#[from] serde_json::Error),
    #[error("parsed network failed validation: {0}")]
    Network(#[from] NetworkError),
}
