//! Exact integer conservation law engine
//!
//! Computes an integer basis C of the left null space of the net
//! stoichiometry matrix (C·S = 0, exactly) with fraction-free Gaussian
//! elimination over the integers, then derives the dependent/independent
//! species partition and the symbolic conserved-quantity relations. No
//! floating point is involved anywhere on this path; all intermediate
//! arithmetic is checked and overflow surfaces as a dedicated error.

use log::debug;
use nalgebra::{DMatrix, DVector};

use crate::analysis::AnalysisError;
use crate::network::network::ReactionNetwork;
use crate::network::reaction::StoichInt;

/// Conservation law artifacts of one network
#[derive(Clone, Debug)]
pub struct ConservationLaws {
    /// Integer conservation law matrix: one row per law, one column per
    /// network species (constant species columns are identically zero)
    pub matrix: DMatrix<StoichInt>,
    /// Rank of the net stoichiometry matrix (non-constant species minus
    /// nullity)
    pub rank: usize,
    /// Number of independent conservation laws
    pub nullity: usize,
    /// Species chosen as independent, in preference order (network indices)
    pub independent: Vec<usize>,
    /// Species chosen as dependent, one per law row (network indices)
    pub dependent: Vec<usize>,
    /// Symbolic conserved-quantity relations, one per dependent species
    pub quantities: Vec<ConservedQuantity>,
}

impl ConservationLaws {
    /// Values of the conserved quantities at a state vector: C · state
    ///
    /// The state is indexed like the network's species list. By construction
    /// C·(S·flux) = 0 for any flux vector, so the returned values are
    /// invariant under any reaction-induced state update.
    pub fn conserved_quantities(&self, state: &DVector<f64>) -> DVector<f64> {
        let c = self.matrix.map(|v| v as f64);
        &c * state
    }
}

/// One conserved-quantity relation, eliminating one dependent species
#[derive(Clone, Debug)]
pub struct ConservedQuantity {
    /// Name of the conserved constant, e.g. "Gamma_1"
    pub constant: String,
    /// Network index of the dependent species this relation eliminates
    pub species: usize,
    /// The dependent species in terms of the constant and the others,
    /// e.g. "B = Gamma_1 - A"
    pub dependent_expression: String,
    /// The constant in terms of all participating species,
    /// e.g. "Gamma_1 = A + B"
    pub constant_expression: String,
}

fn gcd(a: StoichInt, b: StoichInt) -> StoichInt {
    let (mut a, mut b) = (a.abs(), b.abs());
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

/// Divide a row by the gcd of its entries to keep coefficients small
fn normalize_row(row: &mut [StoichInt]) {
    let mut g = 0;
    for &v in row.iter() {
        g = gcd(g, v);
    }
    if g > 1 {
        for v in row.iter_mut() {
            *v /= g;
        }
    }
}

/// Fraction-free row combination: row = a*row - b*pivot_row
fn combine_rows(
    row: &mut [StoichInt],
    pivot_row: &[StoichInt],
    a: StoichInt,
    b: StoichInt,
) -> Result<(), AnalysisError> {
    for (v, &p) in row.iter_mut().zip(pivot_row.iter()) {
        let left = a.checked_mul(*v).ok_or(AnalysisError::NumericOverflow)?;
        let right = b.checked_mul(p).ok_or(AnalysisError::NumericOverflow)?;
        *v = left.checked_sub(right).ok_or(AnalysisError::NumericOverflow)?;
    }
    normalize_row(row);
    Ok(())
}

/// Integer left null space of `s` via elimination of the [S | I] augmentation
///
/// Rows of `s` whose augmented row reduces to zero on the left block yield
/// null space vectors on the right block. Returns the null space rows (width
/// = nrows of `s`) and the rank of `s`.
fn left_nullspace(
    s: &DMatrix<StoichInt>,
) -> Result<(Vec<Vec<StoichInt>>, usize), AnalysisError> {
    let m = s.nrows();
    let r = s.ncols();
    let width = r + m;
    let mut rows: Vec<Vec<StoichInt>> = (0..m)
        .map(|i| {
            let mut row = vec![0; width];
            for j in 0..r {
                row[j] = s[(i, j)];
            }
            row[r + i] = 1;
            row
        })
        .collect();
    let mut used = vec![false; m];
    let mut rank = 0;
    for col in 0..r {
        // Smallest-magnitude pivot keeps the integer growth down
        let mut pivot: Option<usize> = None;
        for i in 0..m {
            if used[i] || rows[i][col] == 0 {
                continue;
            }
            pivot = match pivot {
                Some(p) if rows[p][col].abs() <= rows[i][col].abs() => Some(p),
                _ => Some(i),
            };
        }
        let Some(p) = pivot else { continue };
        used[p] = true;
        rank += 1;
        let pivot_row = rows[p].clone();
        let pivot_value = pivot_row[col];
        for i in 0..m {
            if used[i] || rows[i][col] == 0 {
                continue;
            }
            let g = gcd(pivot_value, rows[i][col]);
            let a = pivot_value / g;
            let b = rows[i][col] / g;
            combine_rows(&mut rows[i], &pivot_row, a, b)?;
        }
    }
    let laws = rows
        .into_iter()
        .zip(used)
        .filter(|(_, u)| !u)
        .map(|(row, _)| row[r..].to_vec())
        .collect();
    Ok((laws, rank))
}

/// Reduce the law matrix so each row owns one pivot (dependent) column,
/// scanning candidate columns from the least independence-preferred end
///
/// Returns the pivot column of each row. Pivots are normalized positive,
/// which also enforces the convention that no row is entirely non-positive.
fn select_dependent(
    laws: &mut [Vec<StoichInt>],
    order: &[usize],
    species_ids: &[&str],
) -> Result<Vec<usize>, AnalysisError> {
    let mut pivot_of_row: Vec<Option<usize>> = vec![None; laws.len()];
    let mut assigned = 0;
    for &col in order.iter().rev() {
        if assigned == laws.len() {
            break;
        }
        let candidate = (0..laws.len())
            .find(|&i| pivot_of_row[i].is_none() && laws[i][col] != 0);
        let Some(p) = candidate else { continue };
        pivot_of_row[p] = Some(col);
        assigned += 1;
        let pivot_row = laws[p].clone();
        let pivot_value = pivot_row[col];
        for i in 0..laws.len() {
            if i == p || laws[i][col] == 0 {
                continue;
            }
            let g = gcd(pivot_value, laws[i][col]);
            let a = pivot_value / g;
            let b = laws[i][col] / g;
            combine_rows(&mut laws[i], &pivot_row, a, b)?;
        }
    }
    let assigned_cols: Vec<usize> = pivot_of_row.iter().flatten().copied().collect();
    let mut pivots = Vec::with_capacity(laws.len());
    for (i, pivot) in pivot_of_row.into_iter().enumerate() {
        let col = pivot.ok_or_else(|| {
            // Null space rows are independent, so a pivotless row is a logic
            // error, not bad input. Name the least-preferred species still
            // awaiting a pivot, since that is the one this row failed to claim.
            let witness = order
                .iter()
                .rev()
                .find(|&&c| !assigned_cols.contains(&c))
                .and_then(|&c| species_ids.get(c).copied())
                .unwrap_or("?");
            AnalysisError::ZeroPivot(witness.to_string())
        })?;
        if laws[i][col] < 0 {
            for v in laws[i].iter_mut() {
                *v = -*v;
            }
        }
        pivots.push(col);
    }
    Ok(pivots)
}

/// Render `coeff * name` terms as "2*A + B - 3*C"
fn format_linear(terms: &[(StoichInt, String)]) -> String {
    let mut out = String::new();
    for (coeff, name) in terms {
        if *coeff == 0 {
            continue;
        }
        let magnitude = coeff.abs();
        if out.is_empty() {
            if *coeff < 0 {
                out.push('-');
            }
        } else if *coeff < 0 {
            out.push_str(" - ");
        } else {
            out.push_str(" + ");
        }
        if magnitude == 1 {
            out.push_str(name);
        } else {
            out.push_str(&format!("{}*{}", magnitude, name));
        }
    }
    out
}

impl ReactionNetwork {
    /// Conservation laws of the network with the default (species order)
    /// independence preference; computed once and cached
    pub fn conservation_laws(&mut self) -> Result<&ConservationLaws, AnalysisError> {
        if self.properties.conservation.is_none() {
            let laws = self.compute_conservation_laws(None)?;
            self.properties.conservation = Some(laws);
        }
        Ok(self
            .properties
            .conservation
            .as_ref()
            .expect("conservation laws cached"))
    }

    /// Conservation laws with an explicit independence-preference ordering
    ///
    /// `preference` ranks non-constant species (network indices) from most
    /// to least preferred to end up independent; species left out keep their
    /// natural order at the end. Not cached; the default-ordering cache is
    /// left untouched.
    pub fn conservation_laws_ordered(
        &mut self,
        preference: &[usize],
    ) -> Result<ConservationLaws, AnalysisError> {
        self.compute_conservation_laws(Some(preference))
    }

    fn compute_conservation_laws(
        &mut self,
        preference: Option<&[usize]>,
    ) -> Result<ConservationLaws, AnalysisError> {
        self.ensure_flat()?;
        let s = self.net_stoichiometry_matrix()?.clone();
        let nonconstant = self.nonconstant_species();
        let m = nonconstant.len();
        let species_ids: Vec<&str> = nonconstant
            .iter()
            .map(|&i| self.species.get_index(i).expect("species index").0.as_str())
            .collect();

        let (mut laws, rank) = left_nullspace(&s)?;
        let nullity = laws.len();

        // Compact-column preference order, defaulting to species order
        let mut order: Vec<usize> = Vec::with_capacity(m);
        if let Some(preference) = preference {
            let mut seen = vec![false; m];
            for &network_index in preference {
                if let Some(compact) = nonconstant.iter().position(|&n| n == network_index) {
                    if !seen[compact] {
                        seen[compact] = true;
                        order.push(compact);
                    }
                }
            }
            for compact in 0..m {
                if !seen[compact] {
                    order.push(compact);
                }
            }
        } else {
            order.extend(0..m);
        }

        let dependent_cols = select_dependent(&mut laws, &order, &species_ids)?;

        // Reconstruction check: C·S must be exactly zero. A failure here
        // means the integer width was insufficient somewhere upstream.
        for row in &laws {
            for j in 0..s.ncols() {
                let sum: i128 = (0..m)
                    .map(|i| row[i] as i128 * s[(i, j)] as i128)
                    .sum();
                if sum != 0 {
                    return Err(AnalysisError::NumericOverflow);
                }
            }
        }

        let mut quantities =
            assemble_quantities(&laws, &dependent_cols, &species_ids)?;
        for (quantity, &col) in quantities.iter_mut().zip(&dependent_cols) {
            quantity.species = nonconstant[col];
        }

        // Embed over the full species list; constant species columns stay 0
        let mut matrix = DMatrix::zeros(nullity, self.num_species());
        for (r, row) in laws.iter().enumerate() {
            for (compact, &network_index) in nonconstant.iter().enumerate() {
                matrix[(r, network_index)] = row[compact];
            }
        }

        let dependent: Vec<usize> = dependent_cols.iter().map(|&c| nonconstant[c]).collect();
        let independent: Vec<usize> = order
            .iter()
            .filter(|c| !dependent_cols.contains(c))
            .map(|&c| nonconstant[c])
            .collect();
        debug!(
            "network '{}': rank={} nullity={} ({} dependent species)",
            self.name,
            rank,
            nullity,
            dependent.len()
        );
        Ok(ConservationLaws {
            matrix,
            rank,
            nullity,
            independent,
            dependent,
            quantities,
        })
    }
}

/// Build the two symbolic relations for each dependent species
fn assemble_quantities(
    laws: &[Vec<StoichInt>],
    dependent_cols: &[usize],
    species_ids: &[&str],
) -> Result<Vec<ConservedQuantity>, AnalysisError> {
    let mut quantities = Vec::with_capacity(laws.len());
    for (r, (row, &col)) in laws.iter().zip(dependent_cols).enumerate() {
        let pivot = row[col];
        if pivot == 0 {
            return Err(AnalysisError::ZeroPivot(species_ids[col].to_string()));
        }
        let constant = format!("Gamma_{}", r + 1);
        let all_terms: Vec<(StoichInt, String)> = row
            .iter()
            .enumerate()
            .map(|(i, &c)| (c, species_ids[i].to_string()))
            .collect();
        let constant_expression = format!("{} = {}", constant, format_linear(&all_terms));
        // Move every other term to the right-hand side with flipped sign
        let mut rhs_terms = vec![(1, constant.clone())];
        for (i, &c) in row.iter().enumerate() {
            if i != col {
                rhs_terms.push((-c, species_ids[i].to_string()));
            }
        }
        let rhs = format_linear(&rhs_terms);
        let dependent_expression = if pivot == 1 {
            format!("{} = {}", species_ids[col], rhs)
        } else {
            format!("{} = ({})/{}", species_ids[col], rhs, pivot)
        };
        quantities.push(ConservedQuantity {
            constant,
            species: col,
            dependent_expression,
            constant_expression,
        });
    }
    Ok(quantities)
}
