//! This module provides the ReactionNetwork struct representing an entire
//! flattened reaction network

use std::fmt::{Display, Formatter};

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

use crate::analysis::properties::NetworkProperties;
use crate::analysis::AnalysisError;
use crate::network::reaction::Reaction;
use crate::network::species::Species;

/// Represents a flattened chemical reaction network
///
/// The network owns a per-instance property cache which is populated lazily
/// by the analysis engine. The cache is written at most once per field and
/// is never invalidated: mutating the species or reaction lists after
/// properties have been computed produces stale results.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReactionNetwork {
    /// Name of the network
    pub name: String,
    /// Map of species ids to Species objects, in insertion order
    ///
    /// Map indices are the species indices used throughout the analysis
    /// structures.
    pub species: IndexMap<String, Species>,
    /// Map of reaction ids to Reaction objects, in insertion order
    pub reactions: IndexMap<String, Reaction>,
    /// Union of the parameters referenced by the reactions' rate expressions
    pub parameters: IndexSet<String>,
    /// Names of unflattened child systems
    ///
    /// Structural analysis is undefined on a composed system; callers must
    /// flatten before analyzing.
    pub subsystems: Vec<String>,
    /// Lazily populated structural properties
    #[serde(skip)]
    pub(crate) properties: NetworkProperties,
}

impl ReactionNetwork {
    /// Create a new empty reaction network with the given name
    pub fn new(name: &str) -> Self {
        ReactionNetwork {
            name: name.to_string(),
            species: IndexMap::new(),
            reactions: IndexMap::new(),
            parameters: IndexSet::new(),
            subsystems: Vec::new(),
            properties: NetworkProperties::default(),
        }
    }

    /// Add a species to the network
    ///
    /// # Examples
    /// ```rust
    /// use crnt_core::network::network::ReactionNetwork;
    /// use crnt_core::network::species::Species;
    /// let mut rn = ReactionNetwork::new("example");
    /// rn.add_species(Species::new("A"));
    /// assert_eq!(rn.num_species(), 1);
    /// ```
    pub fn add_species(&mut self, species: Species) {
        let id = species.id.clone();
        self.species.insert(id, species);
    }

    /// Add a reaction to the network
    ///
    /// The parameters referenced by the reaction's rate expression are folded
    /// into the network-level parameter set.
    pub fn add_reaction(&mut self, reaction: Reaction) {
        for p in reaction.rate.parameters.iter() {
            self.parameters.insert(p.clone());
        }
        let id = reaction.id.clone();
        self.reactions.insert(id, reaction);
    }

    /// Number of species in the network (constant species included)
    pub fn num_species(&self) -> usize {
        self.species.len()
    }

    /// Number of reactions in the network
    pub fn num_reactions(&self) -> usize {
        self.reactions.len()
    }

    /// Index of a species id within the network's species order
    pub fn species_index(&self, id: &str) -> Option<usize> {
        self.species.get_index_of(id)
    }

    /// Indices of the non-constant species, in species order
    pub fn nonconstant_species(&self) -> Vec<usize> {
        self.species
            .values()
            .enumerate()
            .filter(|(_, s)| !s.constant)
            .map(|(i, _)| i)
            .collect()
    }

    /// Check that the network is a flattened (leaf) system
    pub(crate) fn ensure_flat(&self) -> Result<(), AnalysisError> {
        if self.subsystems.is_empty() {
            Ok(())
        } else {
            Err(AnalysisError::ComposedNetwork(self.name.clone()))
        }
    }
}

impl Display for ReactionNetwork {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({} species, {} reactions)",
            self.name,
            self.num_species(),
            self.num_reactions()
        )
    }
}
