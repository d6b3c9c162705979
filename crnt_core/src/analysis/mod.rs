//! Structural analysis engine: reaction complexes, incidence structures,
//! connectivity, deficiency, conservation laws, and balance properties
//!
//! All operations are methods on
//! [`ReactionNetwork`](crate::network::network::ReactionNetwork), computed on
//! first access and memoized in the network's property cache. Later stages
//! trigger earlier ones on demand, so callers can ask for any derived
//! artifact directly.

use thiserror::Error;

pub mod balance;
pub mod complexes;
pub mod connectivity;
pub mod conservation;
pub mod deficiency;
pub mod incidence;
pub mod properties;

/// Errors raised by the structural analysis engine
///
/// All variants are raised synchronously at the point of detection and are
/// never retried internally. No partial results are cached on failure.
#[derive(Clone, Debug, Error)]
pub enum AnalysisError {
    /// Reaction complexes are undefined for a network with zero reactions
    #[error("network '{0}' has no reactions; reaction complexes are undefined")]
    NoReactions(String),
    /// Requested a cached incidence structure before it was ever built
    #[error("incidence matrix has not been built; request it through incidence_matrix first")]
    IncidenceNotBuilt,
    /// A reaction references a species missing from the network's species list
    #[error("reaction '{reaction}' references unknown species '{species}'")]
    UnknownSpecies { reaction: String, species: String },
    /// Structural operations are unsupported on unflattened composed systems
    #[error("network '{0}' is composed of subsystems; flatten it before structural analysis")]
    ComposedNetwork(String),
    /// The conservation law reconstruction check failed, or intermediate
    /// integer arithmetic overflowed
    #[error(
        "integer overflow while computing conservation laws; \
         widen the stoichiometric integer type and retry"
    )]
    NumericOverflow,
    /// An expected nonzero pivot coefficient was zero while assembling
    /// conserved quantity relations; indicates a logic error, not bad input
    #[error("internal inconsistency: zero pivot coefficient for species '{0}'")]
    ZeroPivot(String),
    /// A species appears in more than one diffusion/rate-law context
    ///
    /// Raised by spatially extended network variants which share this error
    /// taxonomy; the core engine does not produce it.
    #[error("species '{0}' appears in more than one rate-law context")]
    ParameterMismatch(String),
    /// A balance predicate was queried without a rate for some reaction
    #[error("no rate constant supplied for reaction '{0}'")]
    MissingRate(String),
    /// A balance predicate was queried with a non-positive rate
    #[error("rate constant for reaction '{0}' must be positive, got {1}")]
    InvalidRate(String, f64),
}
