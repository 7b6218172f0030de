#![deny(missing_docs)]

//! Core value types shared by the cemc lattice Monte Carlo engine: error
//! taxonomy, deterministic RNG handle, species identities and physical
//! constants.

pub mod errors;
pub mod rng;
pub mod species;
pub mod step;

pub use errors::{CemcError, ErrorInfo};
pub use rng::{derive_substream_seed, RngHandle};
pub use species::Species;
pub use step::{apply_step, SiteFlip};

/// Boltzmann constant in eV/K, matching the energy units of fitted
/// effective cluster interactions.
pub const BOLTZMANN_EV_K: f64 = 8.617333262145e-5;
