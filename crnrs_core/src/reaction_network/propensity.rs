//! This module provides the Propensity enum representing kinetic rate laws
//!
//! A propensity is a closed tagged union over the supported rate law kinds.
//! Each variant carries its full parameter set, so a propensity that exists
//! cannot be missing a required parameter. The map-based constructor used by
//! the SBML annotation codec ([`Propensity::from_annotation`]) performs that
//! validation when the parameters arrive as loose key=value text.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use indexmap::IndexMap;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::configuration::RateMode;
use crate::io::rate_parse::{parse_rate_expression, RateParseError};
use crate::reaction_network::species::Species;

/// Concentration assignment, keyed by the species' canonical string
pub type Concentrations = IndexMap<String, f64>;

/// Kinetic rate law attached to a reaction
#[allow(non_snake_case)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Propensity {
    /// Mass action kinetics: k * product over reactants
    #[serde(rename = "massaction")]
    MassAction { k: f64 },
    /// Positive Hill function: k * s1^n / (s1^n + K)
    #[serde(rename = "hillpositive")]
    HillPositive { k: f64, K: f64, n: f64, s1: Species },
    /// Negative Hill function: k / (s1^n + K)
    #[serde(rename = "hillnegative")]
    HillNegative { k: f64, K: f64, n: f64, s1: Species },
    /// Positive Hill function scaled by the concentration of species d
    #[serde(rename = "proportionalhillpositive")]
    ProportionalHillPositive {
        k: f64,
        K: f64,
        n: f64,
        s1: Species,
        d: Species,
    },
    /// Negative Hill function scaled by the concentration of species d
    #[serde(rename = "proportionalhillnegative")]
    ProportionalHillNegative {
        k: f64,
        K: f64,
        n: f64,
        s1: Species,
        d: Species,
    },
    /// Free-form rate expression evaluated against the concentration state
    #[serde(rename = "general")]
    General { rate: RateExpression },
}

impl Propensity {
    /// Name of the propensity kind, as used in SBML annotations
    pub fn kind(&self) -> &'static str {
        match self {
            Propensity::MassAction { .. } => "massaction",
            Propensity::HillPositive { .. } => "hillpositive",
            Propensity::HillNegative { .. } => "hillnegative",
            Propensity::ProportionalHillPositive { .. } => "proportionalhillpositive",
            Propensity::ProportionalHillNegative { .. } => "proportionalhillnegative",
            Propensity::General { .. } => "general",
        }
    }

    /// Species whose live concentration the rate law reads, beyond the reactants
    ///
    /// General propensities reference species by identifier inside their
    /// expression and are checked at evaluation time instead.
    pub fn species_dependencies(&self) -> Vec<&Species> {
        match self {
            Propensity::MassAction { .. } | Propensity::General { .. } => Vec::new(),
            Propensity::HillPositive { s1, .. } | Propensity::HillNegative { s1, .. } => {
                vec![s1]
            }
            Propensity::ProportionalHillPositive { s1, d, .. }
            | Propensity::ProportionalHillNegative { s1, d, .. } => vec![s1, d],
        }
    }

    /// Evaluate the rate law at the given concentration state
    ///
    /// `reactants` is the stoichiometry map of the owning reaction, consumed
    /// only by mass action kinetics. Domain errors (zero denominator,
    /// negative concentration in a Hill term, undefined identifier) are
    /// reported as [`RateError`] and never affect the static structure.
    #[allow(non_snake_case)]
    pub fn evaluate(
        &self,
        state: &Concentrations,
        reactants: &IndexMap<Species, f64>,
        mode: RateMode,
    ) -> Result<f64, RateError> {
        match self {
            Propensity::MassAction { k } => mass_action_rate(*k, state, reactants, mode),
            Propensity::HillPositive { k, K, n, s1 } => {
                let s1_conc = hill_concentration(s1, state)?;
                let numerator = k * pow0(s1_conc, *n);
                Ok(numerator / hill_denominator(s1_conc, *n, *K)?)
            }
            Propensity::HillNegative { k, K, n, s1 } => {
                let s1_conc = hill_concentration(s1, state)?;
                Ok(k / hill_denominator(s1_conc, *n, *K)?)
            }
            Propensity::ProportionalHillPositive { k, K, n, s1, d } => {
                let s1_conc = hill_concentration(s1, state)?;
                let d_conc = lookup(d, state)?;
                let numerator = k * d_conc * pow0(s1_conc, *n);
                Ok(numerator / hill_denominator(s1_conc, *n, *K)?)
            }
            Propensity::ProportionalHillNegative { k, K, n, s1, d } => {
                let s1_conc = hill_concentration(s1, state)?;
                let d_conc = lookup(d, state)?;
                Ok(k * d_conc / hill_denominator(s1_conc, *n, *K)?)
            }
            Propensity::General { rate } => rate.evaluate(state),
        }
    }

    /// Render the propensity as the flat annotation text stored in SBML
    ///
    /// The first token is always `type=<kind>`, followed by the kind's
    /// parameters in a fixed order. Species parameters are referenced by
    /// their canonical string.
    #[allow(non_snake_case)]
    pub fn to_annotation(&self) -> String {
        match self {
            Propensity::MassAction { k } => format!("type=massaction k={}", k),
            Propensity::HillPositive { k, K, n, s1 } => {
                format!("type=hillpositive k={} K={} n={} s1={}", k, K, n, s1)
            }
            Propensity::HillNegative { k, K, n, s1 } => {
                format!("type=hillnegative k={} K={} n={} s1={}", k, K, n, s1)
            }
            Propensity::ProportionalHillPositive { k, K, n, s1, d } => format!(
                "type=proportionalhillpositive k={} K={} n={} s1={} d={}",
                k, K, n, s1, d
            ),
            Propensity::ProportionalHillNegative { k, K, n, s1, d } => format!(
                "type=proportionalhillnegative k={} K={} n={} s1={} d={}",
                k, K, n, s1, d
            ),
            Propensity::General { rate } => format!("type=general rate={}", rate),
        }
    }

    /// Reconstruct a propensity from annotation text
    ///
    /// Species parameters (`s1`, `d`) are resolved against `species_by_id`,
    /// the map of canonical string to species for the surrounding network.
    /// Missing required parameters, unknown kinds, unparseable values, and
    /// unresolvable species references are all construction errors.
    pub fn from_annotation(
        text: &str,
        species_by_id: &IndexMap<String, Species>,
    ) -> Result<Propensity, PropensityError> {
        let mut tokens = text.split_whitespace();
        // The first token is always type=<kind>
        let kind = tokens
            .next()
            .and_then(|token| token.strip_prefix("type="))
            .ok_or(PropensityError::MissingType)?;
        if kind == "general" {
            // The expression is everything after `rate=`; canonical
            // renderings contain no whitespace but hand-written ones may.
            let (_, expression) =
                text.split_once("rate=")
                    .ok_or(PropensityError::MissingParameter {
                        kind: "general".to_string(),
                        parameter: "rate",
                    })?;
            return Ok(Propensity::General {
                rate: expression.trim().parse()?,
            });
        }
        let mut params: IndexMap<&str, &str> = IndexMap::new();
        for token in tokens {
            let (key, value) = token
                .split_once('=')
                .ok_or_else(|| PropensityError::MalformedToken(token.to_string()))?;
            params.insert(key, value);
        }
        match kind {
            "massaction" => Ok(Propensity::MassAction {
                k: require_value(&params, kind, "k")?,
            }),
            "hillpositive" => Ok(Propensity::HillPositive {
                k: require_value(&params, kind, "k")?,
                K: require_value(&params, kind, "K")?,
                n: require_value(&params, kind, "n")?,
                s1: require_species(&params, kind, "s1", species_by_id)?,
            }),
            "hillnegative" => Ok(Propensity::HillNegative {
                k: require_value(&params, kind, "k")?,
                K: require_value(&params, kind, "K")?,
                n: require_value(&params, kind, "n")?,
                s1: require_species(&params, kind, "s1", species_by_id)?,
            }),
            "proportionalhillpositive" => Ok(Propensity::ProportionalHillPositive {
                k: require_value(&params, kind, "k")?,
                K: require_value(&params, kind, "K")?,
                n: require_value(&params, kind, "n")?,
                s1: require_species(&params, kind, "s1", species_by_id)?,
                d: require_species(&params, kind, "d", species_by_id)?,
            }),
            "proportionalhillnegative" => Ok(Propensity::ProportionalHillNegative {
                k: require_value(&params, kind, "k")?,
                K: require_value(&params, kind, "K")?,
                n: require_value(&params, kind, "n")?,
                s1: require_species(&params, kind, "s1", species_by_id)?,
                d: require_species(&params, kind, "d", species_by_id)?,
            }),
            other => Err(PropensityError::UnknownKind(other.to_string())),
        }
    }
}

fn require_value(
    params: &IndexMap<&str, &str>,
    kind: &str,
    key: &'static str,
) -> Result<f64, PropensityError> {
    let raw = params
        .get(key)
        .ok_or_else(|| PropensityError::MissingParameter {
            kind: kind.to_string(),
            parameter: key,
        })?;
    raw.parse()
        .map_err(|_| PropensityError::InvalidValue {
            parameter: key,
            value: raw.to_string(),
        })
}

fn require_species(
    params: &IndexMap<&str, &str>,
    kind: &str,
    key: &'static str,
    species_by_id: &IndexMap<String, Species>,
) -> Result<Species, PropensityError> {
    let id = params
        .get(key)
        .ok_or_else(|| PropensityError::MissingParameter {
            kind: kind.to_string(),
            parameter: key,
        })?;
    species_by_id
        .get(*id)
        .cloned()
        .ok_or_else(|| PropensityError::UnknownSpecies(id.to_string()))
}

/// Exponentiation with the convention 0^0 = 1
pub(crate) fn pow0(base: f64, exponent: f64) -> f64 {
    if exponent == 0. {
        1.
    } else {
        base.powf(exponent)
    }
}

fn lookup(species: &Species, state: &Concentrations) -> Result<f64, RateError> {
    let id = species.canonical_string();
    state
        .get(&id)
        .copied()
        .ok_or(RateError::MissingConcentration(id))
}

fn hill_concentration(s1: &Species, state: &Concentrations) -> Result<f64, RateError> {
    let conc = lookup(s1, state)?;
    if conc < 0. {
        return Err(RateError::NegativeConcentration {
            species: s1.canonical_string(),
            value: conc,
        });
    }
    Ok(conc)
}

fn hill_denominator(s1_conc: f64, n: f64, big_k: f64) -> Result<f64, RateError> {
    let denominator = pow0(s1_conc, n) + big_k;
    if denominator == 0. {
        return Err(RateError::DivisionByZero);
    }
    Ok(denominator)
}

fn mass_action_rate(
    k: f64,
    state: &Concentrations,
    reactants: &IndexMap<Species, f64>,
    mode: RateMode,
) -> Result<f64, RateError> {
    let mut rate = k;
    for (species, stoichiometry) in reactants {
        let conc = lookup(species, state)?;
        match mode {
            RateMode::Deterministic => rate *= pow0(conc, *stoichiometry),
            RateMode::Stochastic => {
                if stoichiometry.fract() != 0. || *stoichiometry < 0. {
                    return Err(RateError::NonIntegerStoichiometry(*stoichiometry));
                }
                // Falling factorial s * (s-1) * ... * (s - I + 1); a reactant
                // count below the stoichiometry yields a zero rate.
                let copies = *stoichiometry as u64;
                for i in 0..copies {
                    let factor = conc - i as f64;
                    if factor <= 0. {
                        return Ok(0.);
                    }
                    rate *= factor;
                }
            }
        }
    }
    Ok(rate)
}

// region Rate expressions

/// Parsed free-form rate expression
///
/// The expression is held as an AST and evaluated against a variable binding
/// context, never re-interpreted as source text. `Display` renders a
/// canonical whitespace-free form that parses back to the same AST.
#[derive(Debug, Clone, PartialEq)]
pub struct RateExpression {
    pub(crate) root: RateExpr,
}

/// A node of a parsed rate expression
#[derive(Debug, Clone, PartialEq)]
pub enum RateExpr {
    Number(f64),
    Variable(String),
    Negate(Box<RateExpr>),
    Binary {
        op: RateOp,
        left: Box<RateExpr>,
        right: Box<RateExpr>,
    },
}

/// Binary operators allowed in rate expressions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

impl RateOp {
    fn precedence(self) -> u8 {
        match self {
            RateOp::Add | RateOp::Sub => 1,
            RateOp::Mul | RateOp::Div => 2,
            RateOp::Pow => 3,
        }
    }

    fn symbol(self) -> char {
        match self {
            RateOp::Add => '+',
            RateOp::Sub => '-',
            RateOp::Mul => '*',
            RateOp::Div => '/',
            RateOp::Pow => '^',
        }
    }
}

impl RateExpression {
    pub fn new(root: RateExpr) -> RateExpression {
        RateExpression { root }
    }

    /// Evaluate the expression against a variable binding context
    ///
    /// Identifiers resolve against the canonical species strings in `bindings`;
    /// an identifier with no binding is an error.
    pub fn evaluate(&self, bindings: &Concentrations) -> Result<f64, RateError> {
        self.root.evaluate(bindings)
    }
}

impl RateExpr {
    fn evaluate(&self, bindings: &Concentrations) -> Result<f64, RateError> {
        match self {
            RateExpr::Number(value) => Ok(*value),
            RateExpr::Variable(name) => bindings
                .get(name)
                .copied()
                .ok_or_else(|| RateError::UndefinedIdentifier(name.clone())),
            RateExpr::Negate(inner) => Ok(-inner.evaluate(bindings)?),
            RateExpr::Binary { op, left, right } => {
                let lhs = left.evaluate(bindings)?;
                let rhs = right.evaluate(bindings)?;
                match op {
                    RateOp::Add => Ok(lhs + rhs),
                    RateOp::Sub => Ok(lhs - rhs),
                    RateOp::Mul => Ok(lhs * rhs),
                    RateOp::Div => {
                        if rhs == 0. {
                            Err(RateError::DivisionByZero)
                        } else {
                            Ok(lhs / rhs)
                        }
                    }
                    RateOp::Pow => Ok(pow0(lhs, rhs)),
                }
            }
        }
    }

    fn precedence(&self) -> u8 {
        match self {
            RateExpr::Number(_) | RateExpr::Variable(_) => 5,
            RateExpr::Negate(_) => 4,
            RateExpr::Binary { op, .. } => op.precedence(),
        }
    }

    fn write(&self, out: &mut String) {
        match self {
            RateExpr::Number(value) => out.push_str(&value.to_string()),
            RateExpr::Variable(name) => out.push_str(name),
            RateExpr::Negate(inner) => {
                out.push('-');
                // Parenthesize anything that is not an atom so the rendered
                // form parses back to the same tree.
                let atom = inner.precedence() == 5;
                if !atom {
                    out.push('(');
                }
                inner.write(out);
                if !atom {
                    out.push(')');
                }
            }
            RateExpr::Binary { op, left, right } => {
                let prec = op.precedence();
                let left_parens = match op {
                    // Pow is right associative
                    RateOp::Pow => left.precedence() <= prec,
                    _ => left.precedence() < prec,
                };
                let right_parens = match op {
                    RateOp::Sub | RateOp::Div => right.precedence() <= prec,
                    _ => right.precedence() < prec,
                };
                if left_parens {
                    out.push('(');
                }
                left.write(out);
                if left_parens {
                    out.push(')');
                }
                out.push(op.symbol());
                if right_parens {
                    out.push('(');
                }
                right.write(out);
                if right_parens {
                    out.push(')');
                }
            }
        }
    }
}

impl Display for RateExpression {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut out = String::new();
        self.root.write(&mut out);
        write!(f, "{}", out)
    }
}

impl FromStr for RateExpression {
    type Err = RateParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_rate_expression(s)
    }
}

impl Serialize for RateExpression {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for RateExpression {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let source = String::deserialize(deserializer)?;
        source.parse().map_err(D::Error::custom)
    }
}

// endregion Rate expressions

/// Construction time propensity errors
#[derive(Debug, Error, PartialEq)]
pub enum PropensityError {
    /// Annotation text without a leading type token
    #[error("propensity annotation is missing its `type=` token")]
    MissingType,
    /// Annotation names a kind this library does not know
    #[error("unknown propensity type `{0}`")]
    UnknownKind(String),
    /// A required parameter of the kind was not supplied
    #[error("missing required parameter `{parameter}` for propensity type `{kind}`")]
    MissingParameter { kind: String, parameter: &'static str },
    /// A numeric parameter could not be parsed
    #[error("could not parse value `{value}` for parameter `{parameter}`")]
    InvalidValue { parameter: &'static str, value: String },
    /// A species parameter references a species absent from the network
    #[error("propensity references unknown species `{0}`")]
    UnknownSpecies(String),
    /// A token of the annotation is not of the form key=value
    #[error("malformed annotation token `{0}`, expected key=value")]
    MalformedToken(String),
    /// The general rate expression could not be parsed
    #[error("invalid rate expression: {0}")]
    Expression(#[from] RateParseError),
}

/// Evaluation time domain errors, disjoint from construction errors
#[derive(Debug, Error, PartialEq)]
pub enum RateError {
    /// A species the rate law depends on has no concentration in the state
    #[error("species `{0}` has no assigned concentration")]
    MissingConcentration(String),
    /// A negative concentration reached a Hill term
    #[error("negative concentration {value} for species `{species}` in a Hill term")]
    NegativeConcentration { species: String, value: f64 },
    /// The rate law denominator evaluated to zero
    #[error("rate law denominator evaluated to zero")]
    DivisionByZero,
    /// A general expression used an identifier with no binding
    #[error("undefined identifier `{0}` in rate expression")]
    UndefinedIdentifier(String),
    /// Stochastic mass action needs integer stoichiometries
    #[error("stochastic mass action requires non-negative integer stoichiometry, found {0}")]
    NonIntegerStoichiometry(f64),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(pairs: &[(&str, f64)]) -> Concentrations {
        pairs
            .iter()
            .map(|(id, conc)| (id.to_string(), *conc))
            .collect()
    }

    fn species_map(species: &[Species]) -> IndexMap<String, Species> {
        species
            .iter()
            .map(|s| (s.canonical_string(), s.clone()))
            .collect()
    }

    #[test]
    fn proportional_hill_negative_sample_values() {
        let protein_a = Species::with_material("A", "protein");
        let dna_g = Species::with_material("G", "dna");
        let propensity = Propensity::ProportionalHillNegative {
            k: 1.,
            K: 10.,
            n: 2.,
            s1: protein_a,
            d: dna_g,
        };
        let state = state(&[("protein_A", 2.), ("dna_G", 1.)]);
        let rate = propensity
            .evaluate(&state, &IndexMap::new(), RateMode::Deterministic)
            .unwrap();
        // 1 * 1 / (2^2 + 10) = 1/14
        assert!((rate - 1. / 14.).abs() < 1e-12);
    }

    #[test]
    fn mass_action_deterministic() {
        let protein_x = Species::with_material("X", "protein");
        let propensity = Propensity::MassAction { k: 0.1 };
        let mut reactants = IndexMap::new();
        reactants.insert(protein_x, 1.);
        let state = state(&[("protein_X", 5.)]);
        let rate = propensity
            .evaluate(&state, &reactants, RateMode::Deterministic)
            .unwrap();
        assert!((rate - 0.5).abs() < 1e-12);
    }

    #[test]
    fn mass_action_stochastic_falling_factorial() {
        let a = Species::new("A");
        let propensity = Propensity::MassAction { k: 2. };
        let mut reactants = IndexMap::new();
        reactants.insert(a, 2.);
        let state = state(&[("A", 5.)]);
        let rate = propensity
            .evaluate(&state, &reactants, RateMode::Stochastic)
            .unwrap();
        // 2 * 5 * 4
        assert!((rate - 40.).abs() < 1e-12);
    }

    #[test]
    fn mass_action_stochastic_underflow_is_zero() {
        let a = Species::new("A");
        let propensity = Propensity::MassAction { k: 2. };
        let mut reactants = IndexMap::new();
        reactants.insert(a, 3.);
        let state = state(&[("A", 2.)]);
        let rate = propensity
            .evaluate(&state, &reactants, RateMode::Stochastic)
            .unwrap();
        assert_eq!(rate, 0.);
    }

    #[test]
    fn mass_action_stochastic_rejects_fractional_stoichiometry() {
        let a = Species::new("A");
        let propensity = Propensity::MassAction { k: 1. };
        let mut reactants = IndexMap::new();
        reactants.insert(a, 1.5);
        let state = state(&[("A", 2.)]);
        let err = propensity
            .evaluate(&state, &reactants, RateMode::Stochastic)
            .unwrap_err();
        assert_eq!(err, RateError::NonIntegerStoichiometry(1.5));
    }

    #[test]
    fn hill_positive_with_zero_exponent() {
        let a = Species::new("A");
        let propensity = Propensity::HillPositive {
            k: 3.,
            K: 5.,
            n: 0.,
            s1: a,
        };
        // s1^0 = 1 regardless of the concentration, including zero
        for conc in [0., 1., 100.] {
            let rate = propensity
                .evaluate(&state(&[("A", conc)]), &IndexMap::new(), RateMode::Deterministic)
                .unwrap();
            assert!((rate - 3. / 6.).abs() < 1e-12);
        }
    }

    #[test]
    fn hill_zero_denominator_is_domain_error() {
        let a = Species::new("A");
        let propensity = Propensity::HillNegative {
            k: 1.,
            K: 0.,
            n: 1.,
            s1: a,
        };
        let err = propensity
            .evaluate(&state(&[("A", 0.)]), &IndexMap::new(), RateMode::Deterministic)
            .unwrap_err();
        assert_eq!(err, RateError::DivisionByZero);
    }

    #[test]
    fn hill_rejects_negative_concentration() {
        let a = Species::new("A");
        let propensity = Propensity::HillPositive {
            k: 1.,
            K: 1.,
            n: 2.,
            s1: a,
        };
        let err = propensity
            .evaluate(&state(&[("A", -1.)]), &IndexMap::new(), RateMode::Deterministic)
            .unwrap_err();
        assert!(matches!(err, RateError::NegativeConcentration { .. }));
    }

    #[test]
    fn missing_concentration_is_reported() {
        let a = Species::new("A");
        let propensity = Propensity::HillPositive {
            k: 1.,
            K: 1.,
            n: 2.,
            s1: a,
        };
        let err = propensity
            .evaluate(&state(&[]), &IndexMap::new(), RateMode::Deterministic)
            .unwrap_err();
        assert_eq!(err, RateError::MissingConcentration("A".to_string()));
    }

    #[test]
    fn general_expression_evaluation() {
        let rate: RateExpression = "k_tx*A/(1+A)".parse().unwrap();
        let propensity = Propensity::General { rate };
        let state = state(&[("A", 3.), ("k_tx", 2.)]);
        let value = propensity
            .evaluate(&state, &IndexMap::new(), RateMode::Deterministic)
            .unwrap();
        assert!((value - 2. * 3. / 4.).abs() < 1e-12);
    }

    #[test]
    fn general_expression_undefined_identifier() {
        let rate: RateExpression = "missing*2".parse().unwrap();
        let propensity = Propensity::General { rate };
        let err = propensity
            .evaluate(&state(&[]), &IndexMap::new(), RateMode::Deterministic)
            .unwrap_err();
        assert_eq!(err, RateError::UndefinedIdentifier("missing".to_string()));
    }

    #[test]
    fn annotation_round_trip() {
        let protein_a = Species::with_material("A", "protein");
        let dna_g = Species::with_material("G", "dna");
        let lookup = species_map(&[protein_a.clone(), dna_g.clone()]);
        let propensities = vec![
            Propensity::MassAction { k: 0.1 },
            Propensity::HillPositive {
                k: 1.,
                K: 10.,
                n: 2.,
                s1: protein_a.clone(),
            },
            Propensity::ProportionalHillNegative {
                k: 1.,
                K: 10.,
                n: 2.,
                s1: protein_a.clone(),
                d: dna_g.clone(),
            },
            Propensity::General {
                rate: "2*protein_A/(1+protein_A)".parse().unwrap(),
            },
        ];
        for propensity in propensities {
            let annotation = propensity.to_annotation();
            let parsed = Propensity::from_annotation(&annotation, &lookup).unwrap();
            assert_eq!(parsed, propensity);
        }
    }

    #[test]
    fn annotation_sample_text() {
        let protein_a = Species::with_material("A", "protein");
        let dna_g = Species::with_material("G", "dna");
        let propensity = Propensity::ProportionalHillNegative {
            k: 1.,
            K: 10.,
            n: 2.,
            s1: protein_a,
            d: dna_g,
        };
        assert_eq!(
            propensity.to_annotation(),
            "type=proportionalhillnegative k=1 K=10 n=2 s1=protein_A d=dna_G"
        );
    }

    #[test]
    fn annotation_missing_parameter() {
        let err = Propensity::from_annotation("type=hillpositive k=1 K=2 n=3", &IndexMap::new())
            .unwrap_err();
        assert_eq!(
            err,
            PropensityError::MissingParameter {
                kind: "hillpositive".to_string(),
                parameter: "s1",
            }
        );
    }

    #[test]
    fn annotation_unknown_kind() {
        let err = Propensity::from_annotation("type=linear k=1", &IndexMap::new()).unwrap_err();
        assert_eq!(err, PropensityError::UnknownKind("linear".to_string()));
    }

    #[test]
    fn annotation_unknown_species() {
        let err = Propensity::from_annotation(
            "type=hillnegative k=1 K=10 n=2 s1=protein_A",
            &IndexMap::new(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            PropensityError::UnknownSpecies("protein_A".to_string())
        );
    }

    #[test]
    fn annotation_general_with_spaces() {
        let parsed =
            Propensity::from_annotation("type=general rate=1 + 2*A", &IndexMap::new()).unwrap();
        let Propensity::General { rate } = parsed else {
            panic!("expected a general propensity");
        };
        assert_eq!(rate.to_string(), "1+2*A");
    }

    #[test]
    fn annotation_malformed_general_expression() {
        let err =
            Propensity::from_annotation("type=general rate=1+*2", &IndexMap::new()).unwrap_err();
        assert!(matches!(err, PropensityError::Expression(_)));
    }

    #[test]
    fn expression_canonical_rendering() {
        let rate: RateExpression = "(k * 2) ^ n + 1".parse().unwrap();
        assert_eq!(rate.to_string(), "(k*2)^n+1");
        let reparsed: RateExpression = rate.to_string().parse().unwrap();
        assert_eq!(reparsed, rate);
    }

    #[test]
    fn pow0_convention() {
        assert_eq!(pow0(0., 0.), 1.);
        assert_eq!(pow0(2., 3.), 8.);
    }
}
