//! This module provides structs for representing reactions and their rate
//! expressions

use std::fmt::{Display, Formatter};

use derive_builder::Builder;
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

/// Integer type used for stoichiometric coefficients
///
/// Widening this alias (e.g. to i128) widens every exact computation in the
/// analysis engine, which matters when the conservation law engine reports
/// an overflow.
pub type StoichInt = i64;

/// A rate expression attached to a reaction
///
/// The structural engine treats the expression text as opaque; only the set
/// of parameters it references matters (for subnetwork decomposition).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RateExpression {
    /// Textual form of the rate expression
    pub expression: String,
    /// Parameters referenced by the expression
    pub parameters: IndexSet<String>,
}

impl RateExpression {
    /// Create a rate expression from its text and the parameters it references
    pub fn new(expression: &str, parameters: &[&str]) -> RateExpression {
        RateExpression {
            expression: expression.to_string(),
            parameters: parameters.iter().map(|p| p.to_string()).collect(),
        }
    }
}

/// Represents a reaction in the network
#[derive(Builder, Debug, Clone, Serialize, Deserialize)]
pub struct Reaction {
    /// Used to identify the reaction
    pub id: String,
    /// Substrate multiset, species id to nonnegative stoichiometric coefficient
    #[builder(default = "IndexMap::new()")]
    pub substrates: IndexMap<String, StoichInt>,
    /// Product multiset, species id to nonnegative stoichiometric coefficient
    #[builder(default = "IndexMap::new()")]
    pub products: IndexMap<String, StoichInt>,
    /// Rate expression (opaque to the structural engine)
    #[builder(default = "RateExpression::default()")]
    pub rate: RateExpression,
    /// Whether the rate law bypasses mass-action scaling and is used as-is
    #[builder(default = "false")]
    pub only_use_rate: bool,
    /// Human-readable reaction name
    #[builder(default = "None")]
    pub name: Option<String>,
    /// Notes about the reaction
    #[builder(default = "None")]
    pub notes: Option<String>,
}

impl Display for Reaction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let side = |m: &IndexMap<String, StoichInt>| -> String {
            if m.is_empty() {
                return "0".to_string();
            }
            m.iter()
                .map(|(s, c)| {
                    if *c == 1 {
                        s.clone()
                    } else {
                        format!("{}*{}", c, s)
                    }
                })
                .collect::<Vec<_>>()
                .join(" + ")
        };
        write!(f, "{} --> {}", side(&self.substrates), side(&self.products))
    }
}
