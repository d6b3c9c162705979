//! This module provides the Species struct representing a chemical species

use std::fmt::{Display, Formatter};
use std::hash::Hash;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

/// Represents a chemical species
#[derive(Builder, Debug, Clone, Serialize, Deserialize)]
pub struct Species {
    /// Used to identify the species (must be unique)
    pub id: String,
    /// Human readable name of the species
    #[builder(default = "None")]
    pub name: Option<String>,
    /// Whether the species concentration is held constant
    ///
    /// Constant species are kept in the reaction list but excluded from the
    /// complex and stoichiometry structures built by the analysis engine.
    #[builder(default = "false")]
    pub constant: bool,
    /// Notes about the species
    #[builder(default = "None")]
    pub notes: Option<String>,
    /// Species annotations
    #[builder(default = "None")]
    pub annotation: Option<String>,
}

impl Species {
    /// Create a new species with the given id
    pub fn new(id: &str) -> Species {
        SpeciesBuilder::default().id(id.to_string()).build().unwrap()
    }

    /// Create a new constant (fixed concentration) species
    pub fn new_constant(id: &str) -> Species {
        SpeciesBuilder::default()
            .id(id.to_string())
            .constant(true)
            .build()
            .unwrap()
    }
}

impl Display for Species {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl Hash for Species {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state); // Hash by id
    }
}

#[cfg(test)]
mod species_tests {
    use super::*;

    #[test]
    fn builder_defaults() {
        let s = SpeciesBuilder::default()
            .id("glucose".to_string())
            .build()
            .unwrap();
        assert_eq!(s.id, "glucose");
        assert!(!s.constant);
        assert!(s.name.is_none());
    }

    #[test]
    fn constant_constructor() {
        let s = Species::new_constant("H2O");
        assert!(s.constant);
        assert_eq!(format!("{}", s), "H2O");
    }
}
