//! Incidence matrix B, complex outgoing matrix, and net stoichiometry matrix
//!
//! The incidence matrix maps (complex, reaction) to {-1, 0, +1}: each
//! reaction column holds -1 at its substrate complex row and +1 at its
//! product complex row. Both a dense and a sparse representation are
//! supported with identical semantics; the cache remembers which one was
//! built last and rebuilds only when the other is requested.

use nalgebra::DMatrix;
use nalgebra_sparse::{CooMatrix, CscMatrix, SparseEntry};

use crate::analysis::AnalysisError;
use crate::network::network::ReactionNetwork;
use crate::network::reaction::StoichInt;

/// Storage representation of an incidence-shaped matrix
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatrixRepr {
    /// Dense column-major storage
    Dense,
    /// Compressed sparse column storage
    Sparse,
}

/// An integer complex-by-reaction matrix in dense or sparse form
#[derive(Clone, Debug)]
pub enum IncidenceMatrix {
    Dense(DMatrix<StoichInt>),
    Sparse(CscMatrix<StoichInt>),
}

impl IncidenceMatrix {
    /// Representation tag of this matrix
    pub fn repr(&self) -> MatrixRepr {
        match self {
            IncidenceMatrix::Dense(_) => MatrixRepr::Dense,
            IncidenceMatrix::Sparse(_) => MatrixRepr::Sparse,
        }
    }

    pub fn nrows(&self) -> usize {
        match self {
            IncidenceMatrix::Dense(m) => m.nrows(),
            IncidenceMatrix::Sparse(m) => m.nrows(),
        }
    }

    pub fn ncols(&self) -> usize {
        match self {
            IncidenceMatrix::Dense(m) => m.ncols(),
            IncidenceMatrix::Sparse(m) => m.ncols(),
        }
    }

    /// Entry at (row, col); sparse zeros and missing entries both read as 0
    pub fn get(&self, row: usize, col: usize) -> StoichInt {
        match self {
            IncidenceMatrix::Dense(m) => m[(row, col)],
            IncidenceMatrix::Sparse(m) => match m.get_entry(row, col) {
                Some(SparseEntry::NonZero(v)) => *v,
                _ => 0,
            },
        }
    }

    /// Densified copy, regardless of representation
    pub fn to_dense(&self) -> DMatrix<StoichInt> {
        match self {
            IncidenceMatrix::Dense(m) => m.clone(),
            IncidenceMatrix::Sparse(m) => {
                let mut dense = DMatrix::zeros(m.nrows(), m.ncols());
                for (r, c, v) in m.triplet_iter() {
                    dense[(r, c)] += *v;
                }
                dense
            }
        }
    }
}

/// Assemble an incidence-shaped matrix from (row, col, value) triplets
///
/// Duplicate triplets sum, so a degenerate reaction whose substrate and
/// product complexes coincide nets to zero in its column.
fn build_matrix(
    nrows: usize,
    ncols: usize,
    triplets: &[(usize, usize, StoichInt)],
    repr: MatrixRepr,
) -> IncidenceMatrix {
    match repr {
        MatrixRepr::Dense => {
            let mut m = DMatrix::zeros(nrows, ncols);
            for &(r, c, v) in triplets {
                m[(r, c)] += v;
            }
            IncidenceMatrix::Dense(m)
        }
        MatrixRepr::Sparse => {
            let mut coo = CooMatrix::new(nrows, ncols);
            for &(r, c, v) in triplets {
                coo.push(r, c, v);
            }
            IncidenceMatrix::Sparse(CscMatrix::from(&coo))
        }
    }
}

impl ReactionNetwork {
    /// The incidence matrix B in the requested representation
    ///
    /// The cached copy is tagged with the representation it was built in and
    /// is rebuilt only when the request differs from the tag.
    pub fn incidence_matrix(
        &mut self,
        repr: MatrixRepr,
    ) -> Result<&IncidenceMatrix, AnalysisError> {
        let cached = matches!(&self.properties.incidence, Some(m) if m.repr() == repr);
        if !cached {
            let triplets = self.incidence_triplets(false)?;
            let nrows = self.properties.complex_to_reactions.as_ref().map(Vec::len);
            let built = build_matrix(
                nrows.expect("complex map cached"),
                self.num_reactions(),
                &triplets,
                repr,
            );
            self.properties.incidence = Some(built);
            // The outgoing matrix tracks the incidence representation
            self.properties.outgoing = None;
        }
        Ok(self.properties.incidence.as_ref().expect("incidence cached"))
    }

    /// Non-computing accessor for the incidence matrix
    ///
    /// Fails when the matrix has never been built through
    /// [`incidence_matrix`](Self::incidence_matrix).
    pub fn try_incidence_matrix(&self) -> Result<&IncidenceMatrix, AnalysisError> {
        self.properties
            .incidence
            .as_ref()
            .ok_or(AnalysisError::IncidenceNotBuilt)
    }

    /// The complex outgoing matrix: B with every +1 entry zeroed
    ///
    /// Keeps only the outgoing (-1) entries; used by the balance analysis.
    pub fn complex_outgoing_matrix(
        &mut self,
        repr: MatrixRepr,
    ) -> Result<&IncidenceMatrix, AnalysisError> {
        let cached = matches!(&self.properties.outgoing, Some(m) if m.repr() == repr);
        if !cached {
            let triplets = self.incidence_triplets(true)?;
            let nrows = self.properties.complex_to_reactions.as_ref().map(Vec::len);
            let built = build_matrix(
                nrows.expect("complex map cached"),
                self.num_reactions(),
                &triplets,
                repr,
            );
            self.properties.outgoing = Some(built);
        }
        Ok(self.properties.outgoing.as_ref().expect("outgoing cached"))
    }

    /// The net stoichiometry matrix S over non-constant species
    ///
    /// Rows follow species order with constant species skipped; columns are
    /// reactions; entries are product minus substrate coefficients.
    pub fn net_stoichiometry_matrix(&mut self) -> Result<&DMatrix<StoichInt>, AnalysisError> {
        self.ensure_flat()?;
        if self.properties.stoichiometry.is_none() {
            let rows = self.nonconstant_species();
            let mut row_of = vec![None; self.num_species()];
            for (compact, &species) in rows.iter().enumerate() {
                row_of[species] = Some(compact);
            }
            let mut s = DMatrix::zeros(rows.len(), self.num_reactions());
            for (col, reaction) in self.reactions.values().enumerate() {
                for (side, sign) in [(&reaction.substrates, -1), (&reaction.products, 1)] {
                    for (species_id, coefficient) in side.iter() {
                        let index = self.species.get_index_of(species_id).ok_or_else(|| {
                            AnalysisError::UnknownSpecies {
                                reaction: reaction.id.clone(),
                                species: species_id.clone(),
                            }
                        })?;
                        if let Some(row) = row_of[index] {
                            s[(row, col)] += sign * coefficient;
                        }
                    }
                }
            }
            self.properties.stoichiometry = Some(s);
        }
        Ok(self
            .properties
            .stoichiometry
            .as_ref()
            .expect("stoichiometry cached"))
    }

    /// Triplets of the incidence matrix, optionally dropping the +1 entries
    fn incidence_triplets(
        &mut self,
        outgoing_only: bool,
    ) -> Result<Vec<(usize, usize, StoichInt)>, AnalysisError> {
        let map = self.complex_to_reactions()?;
        let mut triplets = Vec::new();
        for (complex, entries) in map.iter().enumerate() {
            for &(reaction, sign) in entries {
                if outgoing_only && sign > 0 {
                    continue;
                }
                triplets.push((complex, reaction, sign));
            }
        }
        Ok(triplets)
    }
}

#[cfg(test)]
mod incidence_tests {
    use super::*;
    use crate::network::reaction::{Reaction, ReactionBuilder};
    use crate::network::species::Species;
    use indexmap::IndexMap;

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

    /// A + B <--> C --> 2*A
    fn setup_network() -> ReactionNetwork {
        let mut rn = ReactionNetwork::new("incidence");
        for s in ["A", "B", "C"] {
            rn.add_species(Species::new(s));
        }
        rn.add_reaction(reaction("bind", &[("A", 1), ("B", 1)], &[("C", 1)]));
        rn.add_reaction(reaction("unbind", &[("C", 1)], &[("A", 1), ("B", 1)]));
        rn.add_reaction(reaction("split", &[("C", 1)], &[("A", 2)]));
        rn
    }

    #[test]
    fn each_column_has_one_source_and_one_target() {
        let mut rn = setup_network();
        let b = rn.incidence_matrix(MatrixRepr::Dense).unwrap().to_dense();
        assert_eq!(b.nrows(), 3);
        assert_eq!(b.ncols(), 3);
        for col in 0..b.ncols() {
            let mut minus = 0;
            let mut plus = 0;
            for row in 0..b.nrows() {
                match b[(row, col)] {
                    -1 => minus += 1,
                    1 => plus += 1,
                    0 => {}
                    other => panic!("unexpected incidence entry {}", other),
                }
            }
            assert_eq!((minus, plus), (1, 1));
        }
    }

    #[test]
    fn dense_and_sparse_agree() {
        let mut rn = setup_network();
        let dense = rn.incidence_matrix(MatrixRepr::Dense).unwrap().to_dense();
        let sparse = rn.incidence_matrix(MatrixRepr::Sparse).unwrap().to_dense();
        assert_eq!(dense, sparse);
    }

    #[test]
    fn cache_is_tagged_by_representation() {
        let mut rn = setup_network();
        let first = rn.incidence_matrix(MatrixRepr::Dense).unwrap() as *const IncidenceMatrix;
        let second = rn.incidence_matrix(MatrixRepr::Dense).unwrap() as *const IncidenceMatrix;
        assert_eq!(first, second);
        assert_eq!(
            rn.incidence_matrix(MatrixRepr::Sparse).unwrap().repr(),
            MatrixRepr::Sparse
        );
    }

    #[test]
    fn try_accessor_requires_a_build() {
        let mut rn = setup_network();
        assert!(matches!(
            rn.try_incidence_matrix(),
            Err(AnalysisError::IncidenceNotBuilt)
        ));
        rn.incidence_matrix(MatrixRepr::Dense).unwrap();
        assert!(rn.try_incidence_matrix().is_ok());
    }

    #[test]
    fn outgoing_matrix_zeroes_product_entries() {
        let mut rn = setup_network();
        let b = rn.incidence_matrix(MatrixRepr::Dense).unwrap().to_dense();
        let delta = rn
            .complex_outgoing_matrix(MatrixRepr::Dense)
            .unwrap()
            .to_dense();
        for r in 0..b.nrows() {
            for c in 0..b.ncols() {
                let expected = if b[(r, c)] < 0 { b[(r, c)] } else { 0 };
                assert_eq!(delta[(r, c)], expected);
            }
        }
    }

    #[test]
    fn self_loop_column_nets_to_zero() {
        let mut rn = ReactionNetwork::new("loop");
        rn.add_species(Species::new("A"));
        rn.add_reaction(reaction("r", &[("A", 1)], &[("A", 1)]));
        let b = rn.incidence_matrix(MatrixRepr::Sparse).unwrap();
        assert_eq!(b.get(0, 0), 0);
    }

    #[test]
    fn net_stoichiometry_entries() {
        let mut rn = setup_network();
        let s = rn.net_stoichiometry_matrix().unwrap().clone();
        // Columns: bind, unbind, split; rows: A, B, C
        assert_eq!(s[(0, 0)], -1);
        assert_eq!(s[(1, 0)], -1);
        assert_eq!(s[(2, 0)], 1);
        assert_eq!(s[(0, 2)], 2);
        assert_eq!(s[(2, 2)], -1);
    }

    #[test]
    fn constant_species_have_no_stoichiometry_row() {
        let mut rn = ReactionNetwork::new("constants");
        rn.add_species(Species::new("A"));
        rn.add_species(Species::new_constant("E"));
        rn.add_reaction(reaction("r", &[("A", 1), ("E", 1)], &[("E", 1)]));
        let s = rn.net_stoichiometry_matrix().unwrap();
        assert_eq!(s.nrows(), 1);
        assert_eq!(s[(0, 0)], -1);
    }
}
