//! Per-network memoization record for derived structural properties

use nalgebra::DMatrix;

use crate::analysis::complexes::ReactionComplex;
use crate::analysis::connectivity::IncidenceGraph;
use crate::analysis::conservation::ConservationLaws;
use crate::analysis::incidence::IncidenceMatrix;
use crate::network::network::ReactionNetwork;
use crate::network::reaction::StoichInt;

/// Lazily populated structural properties of one network
///
/// Each field starts out `None` and is written at most once (the incidence
/// matrices may additionally be replaced when a different representation is
/// requested). The record is exclusively owned by one network and is not safe
/// for concurrent mutation; subnetworks get their own fresh record.
#[derive(Clone, Debug, Default)]
pub(crate) struct NetworkProperties {
    /// Distinct reaction complexes in discovery order
    pub complexes: Option<Vec<ReactionComplex>>,
    /// Per complex id, the list of (reaction index, sign) entries where sign
    /// is -1 for the substrate complex and +1 for the product complex
    pub complex_to_reactions: Option<Vec<Vec<(usize, StoichInt)>>>,
    /// Incidence matrix B, tagged with its representation
    pub incidence: Option<IncidenceMatrix>,
    /// Complex outgoing matrix (B with +1 entries zeroed)
    pub outgoing: Option<IncidenceMatrix>,
    /// Net stoichiometry matrix over non-constant species
    pub stoichiometry: Option<DMatrix<StoichInt>>,
    /// Directed graph on complexes, one edge per reaction
    pub graph: Option<IncidenceGraph>,
    /// Linkage classes (weak components), each a sorted list of complex ids
    pub linkage_classes: Option<Vec<Vec<usize>>>,
    /// Strong linkage classes (strongly connected components)
    pub strong_linkage_classes: Option<Vec<Vec<usize>>>,
    /// Terminal strong linkage classes
    pub terminal_linkage_classes: Option<Vec<Vec<usize>>>,
    /// Whether every edge has a reverse companion, counted with multiplicity
    pub reversible: Option<bool>,
    /// Whether every linkage class is strongly connected
    pub weakly_reversible: Option<bool>,
    /// Network deficiency
    pub deficiency: Option<i64>,
    /// Per-linkage-class deficiencies
    pub linkage_deficiencies: Option<Vec<i64>>,
    /// Per-linkage-class subnetworks, each with its own fresh cache
    pub subnetworks: Option<Vec<ReactionNetwork>>,
    /// Conservation law artifacts (default species ordering)
    pub conservation: Option<ConservationLaws>,
}
