//! Incidence graph construction and connectivity analysis
//!
//! Linkage classes are the weakly connected components of the incidence
//! graph, strong linkage classes its strongly connected components, and
//! terminal linkage classes the strong components with no outgoing edge in
//! the condensation. Reversibility and weak reversibility are graph
//! predicates derived from the same structure.

use std::collections::HashMap;

use log::debug;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::unionfind::UnionFind;
use petgraph::visit::EdgeRef;

use crate::analysis::AnalysisError;
use crate::network::network::ReactionNetwork;

/// Directed graph on complexes: node weight = complex id, edge weight =
/// reaction index. Parallel edges are kept, one edge per reaction.
pub type IncidenceGraph = DiGraph<usize, usize>;

impl ReactionNetwork {
    /// The incidence graph, one node per complex and one edge per reaction
    pub fn incidence_graph(&mut self) -> Result<&IncidenceGraph, AnalysisError> {
        if self.properties.graph.is_none() {
            let map = self.complex_to_reactions()?.to_vec();
            let num_reactions = self.num_reactions();
            let mut source = vec![usize::MAX; num_reactions];
            let mut target = vec![usize::MAX; num_reactions];
            for (complex, entries) in map.iter().enumerate() {
                for &(reaction, sign) in entries {
                    if sign < 0 {
                        source[reaction] = complex;
                    } else {
                        target[reaction] = complex;
                    }
                }
            }
            let mut graph = DiGraph::with_capacity(map.len(), num_reactions);
            for complex in 0..map.len() {
                graph.add_node(complex);
            }
            for reaction in 0..num_reactions {
                graph.add_edge(
                    NodeIndex::new(source[reaction]),
                    NodeIndex::new(target[reaction]),
                    reaction,
                );
            }
            self.properties.graph = Some(graph);
        }
        Ok(self.properties.graph.as_ref().expect("graph cached"))
    }

    /// Linkage classes: weakly connected components of the incidence graph,
    /// each a sorted list of complex ids, ordered by smallest member
    pub fn linkage_classes(&mut self) -> Result<&[Vec<usize>], AnalysisError> {
        if self.properties.linkage_classes.is_none() {
            let graph = self.incidence_graph()?;
            let n = graph.node_count();
            let mut components = UnionFind::new(n);
            for edge in graph.edge_references() {
                components.union(edge.source().index(), edge.target().index());
            }
            let mut class_of_root: HashMap<usize, usize> = HashMap::new();
            let mut classes: Vec<Vec<usize>> = Vec::new();
            for complex in 0..n {
                let root = components.find(complex);
                let class = *class_of_root.entry(root).or_insert_with(|| {
                    classes.push(Vec::new());
                    classes.len() - 1
                });
                classes[class].push(complex);
            }
            debug!("network '{}': {} linkage classes", self.name, classes.len());
            self.properties.linkage_classes = Some(classes);
        }
        Ok(self
            .properties
            .linkage_classes
            .as_deref()
            .expect("linkage classes cached"))
    }

    /// Strong linkage classes: strongly connected components of the
    /// incidence graph, each sorted, ordered by smallest member
    pub fn strong_linkage_classes(&mut self) -> Result<&[Vec<usize>], AnalysisError> {
        if self.properties.strong_linkage_classes.is_none() {
            let graph = self.incidence_graph()?;
            let mut classes: Vec<Vec<usize>> = tarjan_scc(graph)
                .into_iter()
                .map(|component| {
                    let mut ids: Vec<usize> =
                        component.into_iter().map(|node| node.index()).collect();
                    ids.sort_unstable();
                    ids
                })
                .collect();
            classes.sort_unstable_by_key(|class| class[0]);
            self.properties.strong_linkage_classes = Some(classes);
        }
        Ok(self
            .properties
            .strong_linkage_classes
            .as_deref()
            .expect("strong linkage classes cached"))
    }

    /// Terminal linkage classes: strong linkage classes with no edge leaving
    /// to a different strong linkage class
    pub fn terminal_linkage_classes(&mut self) -> Result<&[Vec<usize>], AnalysisError> {
        if self.properties.terminal_linkage_classes.is_none() {
            let strong = self.strong_linkage_classes()?.to_vec();
            let graph = self.properties.graph.as_ref().expect("graph cached");
            let mut class_of = vec![0usize; graph.node_count()];
            for (index, class) in strong.iter().enumerate() {
                for &complex in class {
                    class_of[complex] = index;
                }
            }
            let mut terminal = vec![true; strong.len()];
            for edge in graph.edge_references() {
                let from = class_of[edge.source().index()];
                let to = class_of[edge.target().index()];
                if from != to {
                    terminal[from] = false;
                }
            }
            let classes: Vec<Vec<usize>> = strong
                .into_iter()
                .zip(terminal)
                .filter(|(_, t)| *t)
                .map(|(class, _)| class)
                .collect();
            self.properties.terminal_linkage_classes = Some(classes);
        }
        Ok(self
            .properties
            .terminal_linkage_classes
            .as_deref()
            .expect("terminal linkage classes cached"))
    }

    /// Whether the incidence graph equals its edge reversal, counting
    /// parallel edges with multiplicity
    pub fn is_reversible(&mut self) -> Result<bool, AnalysisError> {
        if self.properties.reversible.is_none() {
            let graph = self.incidence_graph()?;
            let mut counts: HashMap<(usize, usize), i64> = HashMap::new();
            for edge in graph.edge_references() {
                *counts
                    .entry((edge.source().index(), edge.target().index()))
                    .or_insert(0) += 1;
            }
            let reversible = counts
                .iter()
                .all(|(&(u, v), &count)| counts.get(&(v, u)) == Some(&count));
            self.properties.reversible = Some(reversible);
        }
        Ok(self.properties.reversible.expect("reversibility cached"))
    }

    /// Whether every linkage class is strongly connected
    ///
    /// Tested by decomposing into per-linkage-class subnetworks and checking
    /// strong connectivity of each subnetwork's own incidence graph; explicit
    /// reverse reactions are not required, only reachability.
    pub fn is_weakly_reversible(&mut self) -> Result<bool, AnalysisError> {
        if self.properties.weakly_reversible.is_none() {
            let mut weakly_reversible = true;
            for mut subnetwork in self.subnetworks()? {
                if subnetwork.strong_linkage_classes()?.len() != 1 {
                    weakly_reversible = false;
                    break;
                }
            }
            self.properties.weakly_reversible = Some(weakly_reversible);
        }
        Ok(self
            .properties
            .weakly_reversible
            .expect("weak reversibility cached"))
    }
}
