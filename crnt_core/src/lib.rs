//! Core rust implementation of crnt.rs, a crate for structural analysis of
//! chemical reaction networks (Feinberg/Horn-Jackson deficiency theory).

pub mod analysis;
pub mod network;
mod configuration;
