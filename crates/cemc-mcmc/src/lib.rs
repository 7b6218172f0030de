#![deny(missing_docs)]

//! Metropolis Monte Carlo machinery for cluster-expansion Hamiltonians:
//! move proposers over sublattice models, canonical and semigrand
//! ensembles, acceptance kernels, and a sampler driving deterministic
//! seeded chains into a sample container.

pub mod config;
pub mod container;
pub mod determinism;
pub mod ensemble;
pub mod kernel;
pub mod moves_flip;
pub mod moves_swap;
pub mod moves_table;
pub mod proposal;
pub mod sampler;
pub mod usher;

pub use config::{RunConfig, SeedPolicy, TemperatureSchedule};
pub use container::{SampleContainer, SampleRecord};
pub use determinism::{chain_seed, step_seed};
pub use ensemble::{ChemicalPotentials, Ensemble};
pub use kernel::{ChainState, Kernel, StepOutcome};
pub use moves_flip::FlipUsher;
pub use moves_swap::SwapUsher;
pub use moves_table::{
    ReactionChange, ReactionEntry, SemigrandTableSwapUsher, SwapTableEntry, TableSwapUsher,
};
pub use proposal::{MoveKind, Proposal};
pub use sampler::Sampler;
pub use usher::Usher;
