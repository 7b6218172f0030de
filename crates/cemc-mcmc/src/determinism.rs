//! Deterministic seed derivation for chains and steps.
//!
//! Chains with the same master seed but different chain ids draw independent
//! substreams, and each step gets its own stream so runs replay identically
//! regardless of how the step budget is split across `run` calls.

use cemc_core::derive_substream_seed;

/// Derives the deterministic seed for a chain.
pub fn chain_seed(master_seed: u64, chain: u64) -> u64 {
    derive_substream_seed(master_seed, chain)
}

/// Derives the deterministic seed for one step of a chain.
pub fn step_seed(master_seed: u64, chain: u64, step: u64) -> u64 {
    derive_substream_seed(chain_seed(master_seed, chain), step)
}
