//! Static description of a reaction network: species, reactions, and the
//! network container the analysis engine operates on

pub mod network;
pub mod reaction;
pub mod species;
