//! Reaction complex extraction and deduplication
//!
//! A complex is the canonical multiset of non-constant species appearing on
//! one side of a reaction. Complexes are deduplicated across the whole
//! reaction list and assigned stable ids in discovery order; the ids are the
//! node/row numbers used by every downstream structure.

use std::fmt::{Display, Formatter};

use indexmap::IndexMap;
use log::debug;

use crate::analysis::AnalysisError;
use crate::network::network::ReactionNetwork;
use crate::network::reaction::StoichInt;

/// Canonical, order-independent multiset of (species index, coefficient)
///
/// Entries are sorted by species index and never contain duplicates, so the
/// derived equality and hash are insensitive to the order species were
/// listed on the reaction side. The empty complex is the null complex.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ReactionComplex {
    entries: Vec<(usize, StoichInt)>,
}

impl ReactionComplex {
    /// Build a complex from parallel (species index, coefficient) lists
    ///
    /// Duplicate species entries are merged by summing their coefficients;
    /// zero coefficients are dropped.
    pub fn new(indices: &[usize], coefficients: &[StoichInt]) -> ReactionComplex {
        let mut merged: IndexMap<usize, StoichInt> = IndexMap::new();
        for (&i, &c) in indices.iter().zip(coefficients.iter()) {
            *merged.entry(i).or_insert(0) += c;
        }
        let mut entries: Vec<(usize, StoichInt)> =
            merged.into_iter().filter(|(_, c)| *c != 0).collect();
        entries.sort_unstable_by_key(|(i, _)| *i);
        ReactionComplex { entries }
    }

    /// The null complex (empty multiset)
    pub fn null() -> ReactionComplex {
        ReactionComplex { entries: Vec::new() }
    }

    /// Whether this is the null complex
    pub fn is_null(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sorted (species index, coefficient) pairs
    pub fn entries(&self) -> &[(usize, StoichInt)] {
        &self.entries
    }

    /// Coefficient of a species within this complex (0 when absent)
    pub fn coefficient(&self, species: usize) -> StoichInt {
        self.entries
            .iter()
            .find(|(i, _)| *i == species)
            .map(|(_, c)| *c)
            .unwrap_or(0)
    }

    /// Dense stoichiometric vector of this complex over all network species
    pub fn stoichiometric_vector(&self, num_species: usize) -> Vec<StoichInt> {
        let mut v = vec![0; num_species];
        for &(i, c) in &self.entries {
            v[i] = c;
        }
        v
    }
}

impl Display for ReactionComplex {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.entries.is_empty() {
            return write!(f, "0");
        }
        let terms: Vec<String> = self
            .entries
            .iter()
            .map(|(i, c)| {
                if *c == 1 {
                    format!("x{}", i)
                } else {
                    format!("{}*x{}", c, i)
                }
            })
            .collect();
        write!(f, "{}", terms.join(" + "))
    }
}

/// Remove constant species from one reaction side, preserving multiplicity
///
/// Returns parallel (species index, coefficient) lists. When the network has
/// no constant species this is a plain copy of the side.
pub(crate) fn filter_constant_species(
    network: &ReactionNetwork,
    reaction_id: &str,
    side: &IndexMap<String, StoichInt>,
) -> Result<(Vec<usize>, Vec<StoichInt>), AnalysisError> {
    let mut indices = Vec::with_capacity(side.len());
    let mut coefficients = Vec::with_capacity(side.len());
    for (species_id, coefficient) in side.iter() {
        let (index, _, species) = network.species.get_full(species_id).ok_or_else(|| {
            AnalysisError::UnknownSpecies {
                reaction: reaction_id.to_string(),
                species: species_id.clone(),
            }
        })?;
        if species.constant {
            continue;
        }
        indices.push(index);
        coefficients.push(*coefficient);
    }
    Ok((indices, coefficients))
}

impl ReactionNetwork {
    /// Distinct reaction complexes of the network, in discovery order
    ///
    /// Discovery order walks the reaction list, visiting each reaction's
    /// substrate complex before its product complex.
    pub fn reaction_complexes(&mut self) -> Result<&[ReactionComplex], AnalysisError> {
        self.compute_complexes()?;
        Ok(self.properties.complexes.as_deref().expect("complexes cached"))
    }

    /// Map from complex id to the (reaction index, sign) pairs it takes part
    /// in; sign is -1 as a substrate complex and +1 as a product complex
    ///
    /// Every reaction contributes exactly two entries. A reaction whose
    /// substrate and product complexes coincide registers both signs on the
    /// same complex.
    pub fn complex_to_reactions(&mut self) -> Result<&[Vec<(usize, StoichInt)>], AnalysisError> {
        self.compute_complexes()?;
        Ok(self
            .properties
            .complex_to_reactions
            .as_deref()
            .expect("complex map cached"))
    }

    fn compute_complexes(&mut self) -> Result<(), AnalysisError> {
        self.ensure_flat()?;
        if self.properties.complexes.is_some() {
            return Ok(());
        }
        if self.reactions.is_empty() {
            return Err(AnalysisError::NoReactions(self.name.clone()));
        }
        let mut dedup: IndexMap<ReactionComplex, usize> = IndexMap::new();
        let mut map: Vec<Vec<(usize, StoichInt)>> = Vec::new();
        for (reaction_index, reaction) in self.reactions.values().enumerate() {
            for (side, sign) in [(&reaction.substrates, -1), (&reaction.products, 1)] {
                let (indices, coefficients) =
                    filter_constant_species(self, &reaction.id, side)?;
                let complex = ReactionComplex::new(&indices, &coefficients);
                let next_id = dedup.len();
                let id = *dedup.entry(complex).or_insert(next_id);
                if id == next_id {
                    map.push(Vec::new());
                }
                map[id].push((reaction_index, sign));
            }
        }
        debug!(
            "network '{}': {} distinct complexes over {} reactions",
            self.name,
            dedup.len(),
            self.reactions.len()
        );
        self.properties.complexes = Some(dedup.into_keys().collect());
        self.properties.complex_to_reactions = Some(map);
        Ok(())
    }
}

#[cfg(test)]
mod complex_tests {
    use super::*;
    use crate::network::reaction::{Reaction, ReactionBuilder};
    use crate::network::species::Species;

    fn reaction(id: &str, subs: &[(&str, StoichInt)], prods: &[(&str, StoichInt)]) -> Reaction {
        let side = |pairs: &[(&str, StoichInt)]| {
            pairs
                .iter()
                .map(|(s, c)| (s.to_string(), *c))
                .collect::<IndexMap<String, StoichInt>>()
        };
        ReactionBuilder::default()
            .id(id.to_string())
            .substrates(side(subs))
            .products(side(prods))
            .build()
            .unwrap()
    }

    fn network(name: &str, species: &[&str], reactions: Vec<Reaction>) -> ReactionNetwork {
        let mut rn = ReactionNetwork::new(name);
        for s in species {
            rn.add_species(Species::new(s));
        }
        for r in reactions {
            rn.add_reaction(r);
        }
        rn
    }

    #[test]
    fn canonical_form_is_order_independent() {
        let a = ReactionComplex::new(&[2, 0], &[1, 3]);
        let b = ReactionComplex::new(&[0, 2], &[3, 1]);
        assert_eq!(a, b);
        assert_eq!(a.entries(), &[(0, 3), (2, 1)]);
    }

    #[test]
    fn duplicate_species_are_merged() {
        let c = ReactionComplex::new(&[1, 1], &[1, 1]);
        assert_eq!(c.entries(), &[(1, 2)]);
        assert_eq!(c.coefficient(1), 2);
        assert_eq!(c.coefficient(0), 0);
    }

    #[test]
    fn complexes_deduplicate_across_reactions() {
        // A + B --> C, C --> A + B share both complexes
        let mut rn = network(
            "dedup",
            &["A", "B", "C"],
            vec![
                reaction("f", &[("A", 1), ("B", 1)], &[("C", 1)]),
                reaction("b", &[("C", 1)], &[("A", 1), ("B", 1)]),
            ],
        );
        let complexes = rn.reaction_complexes().unwrap();
        assert_eq!(complexes.len(), 2);
        let map = rn.complex_to_reactions().unwrap();
        assert_eq!(map[0], vec![(0, -1), (1, 1)]);
        assert_eq!(map[1], vec![(0, 1), (1, -1)]);
    }

    #[test]
    fn constant_species_are_filtered() {
        let mut rn = ReactionNetwork::new("constants");
        rn.add_species(Species::new("A"));
        rn.add_species(Species::new_constant("E"));
        rn.add_species(Species::new("B"));
        rn.add_reaction(reaction("r", &[("A", 1), ("E", 1)], &[("B", 1), ("E", 1)]));
        let complexes = rn.reaction_complexes().unwrap();
        assert_eq!(complexes.len(), 2);
        assert_eq!(complexes[0].entries(), &[(0, 1)]);
        assert_eq!(complexes[1].entries(), &[(2, 1)]);
    }

    #[test]
    fn empty_products_form_the_null_complex() {
        let mut rn = network("open", &["A"], vec![reaction("deg", &[("A", 1)], &[])]);
        let complexes = rn.reaction_complexes().unwrap();
        assert_eq!(complexes.len(), 2);
        assert!(complexes[1].is_null());
        assert_eq!(format!("{}", complexes[1]), "0");
    }

    #[test]
    fn degenerate_reaction_registers_both_signs() {
        let mut rn = network("loop", &["A"], vec![reaction("r", &[("A", 1)], &[("A", 1)])]);
        let map = rn.complex_to_reactions().unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(map[0], vec![(0, -1), (0, 1)]);
    }

    #[test]
    fn no_reactions_is_an_error() {
        let mut rn = network("empty", &["A"], vec![]);
        assert!(matches!(
            rn.reaction_complexes(),
            Err(AnalysisError::NoReactions(_))
        ));
    }

    #[test]
    fn unknown_species_is_an_error() {
        let mut rn = network("bad", &["A"], vec![reaction("r", &[("Z", 1)], &[("A", 1)])]);
        assert!(matches!(
            rn.reaction_complexes(),
            Err(AnalysisError::UnknownSpecies { .. })
        ));
    }
}
