//! Closed set of move proposers.

use cemc_core::RngHandle;

use crate::moves_flip::FlipUsher;
use crate::moves_swap::SwapUsher;
use crate::moves_table::{SemigrandTableSwapUsher, TableSwapUsher};
use crate::proposal::Proposal;

/// The supported move proposers. The set is closed: kernels, samplers and
/// serialized results all assume one of these four families.
#[derive(Debug, Clone)]
pub enum Usher {
    /// Single-site species flips.
    Flip(FlipUsher),
    /// Link-directed two-site exchanges.
    Swap(SwapUsher),
    /// Table-directed exchanges across sublattice pairs.
    TableSwap(TableSwapUsher),
    /// Table swaps mixed with stoichiometric reactions.
    SemigrandTableSwap(SemigrandTableSwapUsher),
}

impl Usher {
    /// Proposes one move for the current occupancy.
    pub fn propose(&self, occupancy: &[usize], rng: &mut RngHandle) -> Proposal {
        match self {
            Usher::Flip(usher) => usher.propose(occupancy, rng),
            Usher::Swap(usher) => usher.propose(occupancy, rng),
            Usher::TableSwap(usher) => usher.propose(occupancy, rng),
            Usher::SemigrandTableSwap(usher) => usher.propose(occupancy, rng),
        }
    }

    /// Stable label for reporting.
    pub fn label(&self) -> &'static str {
        match self {
            Usher::Flip(_) => "flip",
            Usher::Swap(_) => "swap",
            Usher::TableSwap(_) => "table-swap",
            Usher::SemigrandTableSwap(_) => "semigrand-table-swap",
        }
    }
}
