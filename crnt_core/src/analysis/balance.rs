//! Complex balance, detailed balance, and absolute concentration robustness
//!
//! Both balance predicates take a positive numeric rate assignment keyed by
//! reaction id and decide the Horn-Jackson/Feinberg conditions without
//! solving the nonlinear steady-state system: complex balance reduces to a
//! linear flux-balance condition on the weighted incidence graph, detailed
//! balance to the spanning-forest and independent-cycle conditions on the
//! equilibrium constants.

use std::collections::{BTreeSet, HashMap};

use indexmap::IndexMap;
use log::debug;
use nalgebra::{DMatrix, SVD};
use petgraph::unionfind::UnionFind;

use crate::analysis::AnalysisError;
use crate::configuration::CONFIGURATION;
use crate::network::network::ReactionNetwork;

/// Kernel vector of a square matrix: right-singular vector of the smallest
/// singular value
///
/// nalgebra leaves the ordering of the singular values unspecified, so the
/// minimal one is located explicitly instead of assuming it sits last.
fn kernel_vector(matrix: DMatrix<f64>) -> Vec<f64> {
    let n = matrix.nrows();
    if n == 1 {
        return vec![1.0];
    }
    let svd = SVD::new(matrix, false, true);
    let v_t = svd.v_t.expect("singular vectors requested");
    let mut smallest = 0;
    for (i, value) in svd.singular_values.iter().enumerate() {
        if *value < svd.singular_values[smallest] {
            smallest = i;
        }
    }
    (0..n).map(|j| v_t[(smallest, j)]).collect()
}

impl ReactionNetwork {
    /// Rates in reaction order, validated present and positive
    fn rate_vector(&self, rates: &IndexMap<String, f64>) -> Result<Vec<f64>, AnalysisError> {
        self.reactions
            .values()
            .map(|reaction| {
                let k = rates
                    .get(&reaction.id)
                    .copied()
                    .ok_or_else(|| AnalysisError::MissingRate(reaction.id.clone()))?;
                if k <= 0.0 {
                    return Err(AnalysisError::InvalidRate(reaction.id.clone(), k));
                }
                Ok(k)
            })
            .collect()
    }

    /// Substrate and product complex ids of each reaction
    fn reaction_endpoints(&mut self) -> Result<(Vec<usize>, Vec<usize>), AnalysisError> {
        let map = self.complex_to_reactions()?;
        let num_reactions = map.iter().map(Vec::len).sum::<usize>() / 2;
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
        Ok((source, target))
    }

    /// Whether mass-action kinetics with the given rates admits a complex
    /// balanced steady state
    ///
    /// Requires weak reversibility; then forms the per-linkage-class kernel
    /// vector rho of the weighted graph Laplacian (the matrix-tree steady
    /// state of the linear complex-flow system) and checks the linear
    /// condition B'·ln(rho) in Im(S').
    pub fn is_complex_balanced(
        &mut self,
        rates: &IndexMap<String, f64>,
    ) -> Result<bool, AnalysisError> {
        let k = self.rate_vector(rates)?;
        if !self.is_weakly_reversible()? {
            debug!("network '{}': not weakly reversible, not complex balanced", self.name);
            return Ok(false);
        }
        let (source, target) = self.reaction_endpoints()?;
        let num_complexes = self.reaction_complexes()?.len();

        // Weighted Laplacian, columns indexed by source complex
        let mut laplacian = DMatrix::<f64>::zeros(num_complexes, num_complexes);
        for (reaction, &rate) in k.iter().enumerate() {
            laplacian[(target[reaction], source[reaction])] += rate;
            laplacian[(source[reaction], source[reaction])] -= rate;
        }

        let classes = self.linkage_classes()?.to_vec();
        let tolerance = CONFIGURATION.read().unwrap().tolerance;
        let mut rho = vec![0.0; num_complexes];
        for class in &classes {
            let sub = DMatrix::from_fn(class.len(), class.len(), |i, j| {
                laplacian[(class[i], class[j])]
            });
            let mut kernel = kernel_vector(sub);
            let total: f64 = kernel.iter().sum();
            if total < 0.0 {
                for v in kernel.iter_mut() {
                    *v = -*v;
                }
            }
            let max = kernel.iter().fold(0.0f64, |acc, v| acc.max(v.abs()));
            if kernel.iter().any(|&v| v <= tolerance * max) {
                // The matrix-tree vector of a strongly connected class is
                // strictly positive; anything else cannot balance
                return Ok(false);
            }
            for (&complex, &value) in class.iter().zip(kernel.iter()) {
                rho[complex] = value;
            }
        }

        // B'·ln(rho) must lie in the image of S'
        let s = self.net_stoichiometry_matrix()?.map(|v| v as f64);
        let num_reactions = k.len();
        let num_species = s.nrows();
        let transposed = DMatrix::from_fn(num_reactions, num_species + 1, |r, c| {
            if c < num_species {
                s[(c, r)]
            } else {
                rho[target[r]].ln() - rho[source[r]].ln()
            }
        });
        let eps = CONFIGURATION.read().unwrap().rank_tolerance;
        let base = transposed.columns(0, num_species).clone_owned();
        let base_rank = SVD::new(base, false, false).rank(eps);
        let augmented_rank = SVD::new(transposed, false, false).rank(eps);
        Ok(base_rank == augmented_rank)
    }

    /// Whether the rate assignment satisfies detailed balance
    ///
    /// Only reversible networks can be detailed balanced. Rates of parallel
    /// reversible pairs between the same two complexes are aggregated before
    /// forming equilibrium constants. Two necessary and sufficient
    /// conditions are checked: the spanning-forest condition (the forest
    /// edges' log equilibrium constants lie in the image of their net
    /// stoichiometric vectors) and the independent-cycle condition (every
    /// non-forest edge closes a cycle whose equilibrium constants multiply
    /// to one).
    pub fn is_detailed_balanced(
        &mut self,
        rates: &IndexMap<String, f64>,
    ) -> Result<bool, AnalysisError> {
        let k = self.rate_vector(rates)?;
        if !self.is_reversible()? {
            debug!("network '{}': not reversible, not detailed balanced", self.name);
            return Ok(false);
        }
        let (source, target) = self.reaction_endpoints()?;
        let num_complexes = self.reaction_complexes()?.len();

        let mut total: HashMap<(usize, usize), f64> = HashMap::new();
        for (reaction, &rate) in k.iter().enumerate() {
            *total.entry((source[reaction], target[reaction])).or_insert(0.0) += rate;
        }
        let mut pairs: Vec<(usize, usize, f64)> = Vec::new();
        for (&(u, v), &forward) in total.iter() {
            if u >= v {
                // Self loops are trivially balanced; (v, u) handles the rest
                continue;
            }
            let Some(&backward) = total.get(&(v, u)) else {
                return Ok(false);
            };
            pairs.push((u, v, forward / backward));
        }
        pairs.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));

        // Spanning forest over the reversible pairs
        let mut components = UnionFind::new(num_complexes);
        let mut forest: Vec<(usize, usize, f64)> = Vec::new();
        let mut chords: Vec<(usize, usize, f64)> = Vec::new();
        for &(u, v, keq) in &pairs {
            if components.union(u, v) {
                forest.push((u, v, keq));
            } else {
                chords.push((u, v, keq));
            }
        }

        // Complex potentials along the forest
        let mut adjacency: Vec<Vec<(usize, f64)>> = vec![Vec::new(); num_complexes];
        for &(u, v, keq) in &forest {
            adjacency[u].push((v, keq.ln()));
            adjacency[v].push((u, -keq.ln()));
        }
        let mut phi = vec![f64::NAN; num_complexes];
        for start in 0..num_complexes {
            if !phi[start].is_nan() {
                continue;
            }
            phi[start] = 0.0;
            let mut stack = vec![start];
            while let Some(u) = stack.pop() {
                for &(v, delta) in &adjacency[u] {
                    if phi[v].is_nan() {
                        phi[v] = phi[u] + delta;
                        stack.push(v);
                    }
                }
            }
        }

        // Independent-cycle condition
        let tolerance = CONFIGURATION.read().unwrap().tolerance;
        for &(u, v, keq) in &chords {
            if (phi[u] + keq.ln() - phi[v]).abs() > tolerance {
                return Ok(false);
            }
        }

        // Spanning-forest condition
        let complexes = self.reaction_complexes()?.to_vec();
        let nonconstant = self.nonconstant_species();
        let mut compact = vec![usize::MAX; self.num_species()];
        for (c, &network_index) in nonconstant.iter().enumerate() {
            compact[network_index] = c;
        }
        let m = nonconstant.len();
        let mut augmented = DMatrix::<f64>::zeros(forest.len(), m + 1);
        for (row, &(u, v, keq)) in forest.iter().enumerate() {
            for &(species, coefficient) in complexes[v].entries() {
                augmented[(row, compact[species])] += coefficient as f64;
            }
            for &(species, coefficient) in complexes[u].entries() {
                augmented[(row, compact[species])] -= coefficient as f64;
            }
            augmented[(row, m)] = keq.ln();
        }
        let eps = CONFIGURATION.read().unwrap().rank_tolerance;
        let base = augmented.columns(0, m).clone_owned();
        let base_rank = SVD::new(base, false, false).rank(eps);
        let augmented_rank = SVD::new(augmented, false, false).rank(eps);
        Ok(base_rank == augmented_rank)
    }

    /// Species with absolute concentration robustness, by the
    /// Shinar-Feinberg sufficient condition
    ///
    /// Applies to networks of deficiency exactly one: any two nonterminal
    /// complexes whose stoichiometric vectors differ by one unit in exactly
    /// one species certify that species as robust. Returns the (possibly
    /// empty) sorted set of robust species indices.
    pub fn robust_species(&mut self) -> Result<Vec<usize>, AnalysisError> {
        if self.deficiency()? != 1 {
            return Ok(Vec::new());
        }
        let terminal = self.terminal_linkage_classes()?.to_vec();
        let complexes = self.reaction_complexes()?.to_vec();
        let num_complexes = complexes.len();
        let mut in_terminal = vec![false; num_complexes];
        for class in &terminal {
            for &complex in class {
                in_terminal[complex] = true;
            }
        }
        let nonterminal: Vec<usize> =
            (0..num_complexes).filter(|&c| !in_terminal[c]).collect();

        let num_species = self.num_species();
        let mut robust: BTreeSet<usize> = BTreeSet::new();
        for (position, &a) in nonterminal.iter().enumerate() {
            let va = complexes[a].stoichiometric_vector(num_species);
            for &b in &nonterminal[position + 1..] {
                let vb = complexes[b].stoichiometric_vector(num_species);
                let mut difference: Option<(usize, i64)> = None;
                let mut count = 0;
                for species in 0..num_species {
                    let d = va[species] - vb[species];
                    if d != 0 {
                        count += 1;
                        difference = Some((species, d));
                    }
                }
                if count == 1 {
                    if let Some((species, d)) = difference {
                        if d.abs() == 1 {
                            robust.insert(species);
                        }
                    }
                }
            }
        }
        debug!(
            "network '{}': {} robust species",
            self.name,
            robust.len()
        );
        Ok(robust.into_iter().collect())
    }
}
