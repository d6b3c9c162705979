//! Network deficiency and per-linkage-class subnetwork decomposition
//!
//! The deficiency is the topological invariant n - l - s (complexes minus
//! linkage classes minus stoichiometric rank). Subnetworks are full,
//! independently analyzable networks carved out of one linkage class each.

use std::collections::BTreeSet;

use log::debug;

use crate::analysis::AnalysisError;
use crate::network::network::ReactionNetwork;

impl ReactionNetwork {
    /// Rank s of the net stoichiometry matrix, computed exactly from the
    /// conservation law engine (s = non-constant species minus nullity)
    pub fn rank(&mut self) -> Result<usize, AnalysisError> {
        Ok(self.conservation_laws()?.rank)
    }

    /// The network deficiency n - l - s
    ///
    /// Always nonnegative for a valid network. Zero-deficiency networks have
    /// strong dynamical guarantees; only the value is exposed here.
    pub fn deficiency(&mut self) -> Result<i64, AnalysisError> {
        if self.properties.deficiency.is_none() {
            let n = self.reaction_complexes()?.len() as i64;
            let l = self.linkage_classes()?.len() as i64;
            let s = self.rank()? as i64;
            let deficiency = n - l - s;
            debug!(
                "network '{}': n={} l={} s={} deficiency={}",
                self.name, n, l, s, deficiency
            );
            self.properties.deficiency = Some(deficiency);
        }
        Ok(self.properties.deficiency.expect("deficiency cached"))
    }

    /// Per-linkage-class subnetworks, in linkage class order
    ///
    /// Each subnetwork holds exactly the reactions whose complexes lie in
    /// one linkage class, the union of species those reactions touch, and
    /// the union of parameters their rate expressions reference. Subnetworks
    /// are named `{parent}_{i}` and carry fresh, empty property caches.
    pub fn subnetworks(&mut self) -> Result<Vec<ReactionNetwork>, AnalysisError> {
        if self.properties.subnetworks.is_none() {
            let classes = self.linkage_classes()?.to_vec();
            let map = self
                .properties
                .complex_to_reactions
                .clone()
                .expect("complex map cached");
            let mut subnetworks = Vec::with_capacity(classes.len());
            for (ordinal, class) in classes.iter().enumerate() {
                let mut reaction_indices: BTreeSet<usize> = BTreeSet::new();
                for &complex in class {
                    for &(reaction, _) in &map[complex] {
                        reaction_indices.insert(reaction);
                    }
                }
                let mut used_species: BTreeSet<usize> = BTreeSet::new();
                for &index in &reaction_indices {
                    let reaction = &self.reactions[index];
                    for side in [&reaction.substrates, &reaction.products] {
                        for species_id in side.keys() {
                            if let Some(i) = self.species.get_index_of(species_id) {
                                used_species.insert(i);
                            }
                        }
                    }
                }
                let mut subnetwork =
                    ReactionNetwork::new(&format!("{}_{}", self.name, ordinal));
                // Species keep the parent's relative order; constant species
                // stay in the reaction list, so they are carried along too
                for (index, species) in self.species.values().enumerate() {
                    if used_species.contains(&index) {
                        subnetwork.add_species(species.clone());
                    }
                }
                for &index in &reaction_indices {
                    subnetwork.add_reaction(self.reactions[index].clone());
                }
                subnetworks.push(subnetwork);
            }
            debug!(
                "network '{}': decomposed into {} subnetworks",
                self.name,
                subnetworks.len()
            );
            self.properties.subnetworks = Some(subnetworks);
        }
        Ok(self
            .properties
            .subnetworks
            .clone()
            .expect("subnetworks cached"))
    }

    /// Per-linkage-class deficiencies: |class i| - 1 - rank(subnetwork i)
    ///
    /// Indexed by linkage class; used for instance to locate the
    /// deficiency-one classes robustness analysis looks at.
    pub fn linkage_deficiencies(&mut self) -> Result<Vec<i64>, AnalysisError> {
        if self.properties.linkage_deficiencies.is_none() {
            let classes = self.linkage_classes()?.to_vec();
            let subnetworks = self.subnetworks()?;
            let mut deficiencies = Vec::with_capacity(classes.len());
            for (class, mut subnetwork) in classes.iter().zip(subnetworks) {
                let rank = subnetwork.rank()? as i64;
                deficiencies.push(class.len() as i64 - 1 - rank);
            }
            self.properties.linkage_deficiencies = Some(deficiencies);
        }
        Ok(self
            .properties
            .linkage_deficiencies
            .clone()
            .expect("linkage deficiencies cached"))
    }
}

#[cfg(test)]
mod deficiency_tests {
    use super::*;
    use crate::network::reaction::{RateExpression, Reaction, ReactionBuilder, StoichInt};
    use crate::network::species::Species;
    use indexmap::IndexMap;

    fn reaction(id: &str, subs: &[(&str, StoichInt)], prods: &[(&str, StoichInt)]) -> Reaction {
        let side = |pairs: &[(&str, StoichInt)]| {
            pairs
                .iter()
                .map(|(s, c)| (s.to_string(), *c))
                .collect::<IndexMap<String, StoichInt>>()
        };
        let parameter = format!("k_{}", id);
        ReactionBuilder::default()
            .id(id.to_string())
            .substrates(side(subs))
            .products(side(prods))
            .rate(RateExpression::new(&parameter, &[parameter.as_str()]))
            .build()
            .unwrap()
    }

    fn ensure_species(rn: &mut ReactionNetwork, ids: &[&str]) {
        for id in ids {
            if !rn.species.contains_key(*id) {
                rn.add_species(Species::new(id));
            }
        }
    }

    fn add_reversible(rn: &mut ReactionNetwork, tag: &str, a: &[(&str, StoichInt)], b: &[(&str, StoichInt)]) {
        rn.add_reaction(reaction(&format!("{}_f", tag), a, b));
        rn.add_reaction(reaction(&format!("{}_r", tag), b, a));
    }

    /// sub + enz <--> sub:enz --> prod + enz
    fn add_enzymatic(rn: &mut ReactionNetwork, sub: &str, enz: &str, prod: &str, tag: &str) {
        let bound = format!("{}_{}", sub, enz);
        ensure_species(rn, &[sub, enz, bound.as_str(), prod]);
        add_reversible(
            rn,
            &format!("bind{}", tag),
            &[(sub, 1), (enz, 1)],
            &[(bound.as_str(), 1)],
        );
        rn.add_reaction(reaction(
            &format!("cat{}", tag),
            &[(bound.as_str(), 1)],
            &[(prod, 1), (enz, 1)],
        ));
    }

    /// Two deficiency-one motifs (2X <--> X+Y <--> 2Y) and two reversible
    /// three-complex chains over disjoint species.
    ///
    /// Complex count 4*3 = 12; linkage classes 4; stoichiometric rank
    /// 1 + 1 + 2 + 2 = 6, so the deficiency is 12 - 4 - 6 = 2.
    fn fixture_12_4_2() -> ReactionNetwork {
        let mut rn = ReactionNetwork::new("fixture_a");
        ensure_species(
            &mut rn,
            &["A", "B", "C", "D", "E", "F", "G", "H", "I", "J"],
        );
        add_reversible(&mut rn, "ab1", &[("A", 2)], &[("A", 1), ("B", 1)]);
        add_reversible(&mut rn, "ab2", &[("A", 1), ("B", 1)], &[("B", 2)]);
        add_reversible(&mut rn, "cd1", &[("C", 2)], &[("C", 1), ("D", 1)]);
        add_reversible(&mut rn, "cd2", &[("C", 1), ("D", 1)], &[("D", 2)]);
        add_reversible(&mut rn, "ef", &[("E", 1)], &[("F", 1)]);
        add_reversible(&mut rn, "fg", &[("F", 1)], &[("G", 1)]);
        add_reversible(&mut rn, "hi", &[("H", 1)], &[("I", 1)]);
        add_reversible(&mut rn, "ij", &[("I", 1)], &[("J", 1)]);
        rn
    }

    /// The two deficiency-one motifs plus one reversible nine-complex chain.
    ///
    /// Complex count 3 + 3 + 9 = 15; linkage classes 3; stoichiometric rank
    /// 1 + 1 + 8 = 10, so the deficiency is 15 - 3 - 10 = 2.
    fn fixture_15_3_2() -> ReactionNetwork {
        let mut rn = ReactionNetwork::new("fixture_b");
        ensure_species(&mut rn, &["A", "B", "C", "D"]);
        add_reversible(&mut rn, "ab1", &[("A", 2)], &[("A", 1), ("B", 1)]);
        add_reversible(&mut rn, "ab2", &[("A", 1), ("B", 1)], &[("B", 2)]);
        add_reversible(&mut rn, "cd1", &[("C", 2)], &[("C", 1), ("D", 1)]);
        add_reversible(&mut rn, "cd2", &[("C", 1), ("D", 1)], &[("D", 2)]);
        let chain: Vec<String> = (1..=9).map(|i| format!("S{}", i)).collect();
        for window in chain.windows(2) {
            ensure_species(&mut rn, &[window[0].as_str(), window[1].as_str()]);
            add_reversible(
                &mut rn,
                &format!("{}_{}", window[0], window[1]),
                &[(window[0].as_str(), 1)],
                &[(window[1].as_str(), 1)],
            );
        }
        rn
    }

    /// Huang-Ferrell MAPK cascade: three layers of dual phosphorylation
    /// cycles driven by the upstream kinase, each step an enzymatic block.
    fn mapk_cascade() -> ReactionNetwork {
        let mut rn = ReactionNetwork::new("mapk");
        add_enzymatic(&mut rn, "KKK", "E1", "KKKs", "1");
        add_enzymatic(&mut rn, "KKKs", "E2", "KKK", "2");
        add_enzymatic(&mut rn, "KK", "KKKs", "KKp", "3");
        add_enzymatic(&mut rn, "KKp", "KKKs", "KKpp", "4");
        add_enzymatic(&mut rn, "KKpp", "KKPase", "KKp", "5");
        add_enzymatic(&mut rn, "KKp", "KKPase", "KK", "6");
        add_enzymatic(&mut rn, "K", "KKpp", "Kp", "7");
        add_enzymatic(&mut rn, "Kp", "KKpp", "Kpp", "8");
        add_enzymatic(&mut rn, "Kpp", "KPase", "Kp", "9");
        add_enzymatic(&mut rn, "Kp", "KPase", "K", "10");
        rn
    }

    #[test]
    fn fixture_a_reference_values() {
        let mut rn = fixture_12_4_2();
        assert_eq!(rn.reaction_complexes().unwrap().len(), 12);
        assert_eq!(rn.linkage_classes().unwrap().len(), 4);
        assert_eq!(rn.deficiency().unwrap(), 2);
    }

    #[test]
    fn fixture_b_reference_values() {
        let mut rn = fixture_15_3_2();
        assert_eq!(rn.reaction_complexes().unwrap().len(), 15);
        assert_eq!(rn.linkage_classes().unwrap().len(), 3);
        assert_eq!(rn.deficiency().unwrap(), 2);
    }

    #[test]
    fn mapk_reference_values() {
        let mut rn = mapk_cascade();
        assert_eq!(rn.reaction_complexes().unwrap().len(), 26);
        assert_eq!(rn.linkage_classes().unwrap().len(), 6);
        assert_eq!(rn.deficiency().unwrap(), 5);
        assert!(!rn.is_weakly_reversible().unwrap());
    }

    #[test]
    fn deficiency_formula_holds() {
        let mut rn = mapk_cascade();
        let n = rn.reaction_complexes().unwrap().len() as i64;
        let l = rn.linkage_classes().unwrap().len() as i64;
        let s = rn.rank().unwrap() as i64;
        assert_eq!(rn.deficiency().unwrap(), n - l - s);
        assert!(rn.deficiency().unwrap() >= 0);
    }

    #[test]
    fn linkage_deficiencies_split_the_motifs() {
        let mut rn = fixture_12_4_2();
        assert_eq!(rn.linkage_deficiencies().unwrap(), vec![1, 1, 0, 0]);
    }

    #[test]
    fn subnetworks_are_named_and_scoped() {
        let mut rn = fixture_12_4_2();
        let subnetworks = rn.subnetworks().unwrap();
        assert_eq!(subnetworks.len(), 4);
        assert_eq!(subnetworks[0].name, "fixture_a_0");
        // First class: the 2A <--> A+B <--> 2B motif
        assert_eq!(subnetworks[0].num_species(), 2);
        assert_eq!(subnetworks[0].num_reactions(), 4);
        // Rate parameters travel with the class's reactions
        assert!(subnetworks[0].parameters.contains("k_ab1_f"));
        assert!(!subnetworks[0].parameters.contains("k_cd1_f"));
        // Each subnetwork is independently analyzable with a fresh cache
        let mut first = subnetworks.into_iter().next().unwrap();
        assert_eq!(first.reaction_complexes().unwrap().len(), 3);
        assert_eq!(first.deficiency().unwrap(), 1);
    }
}
