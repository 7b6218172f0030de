//! The unit of change shared by move proposers and processors.

use serde::{Deserialize, Serialize};

/// One site taking a new species code.
///
/// A Monte Carlo step is a sequence of these: one for a single-site flip, two
/// for a swap, more for stoichiometric reactions. An empty sequence is a null
/// move. The occupancy is mutated only after acceptance; processors treat the
/// flips as hypothetical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteFlip {
    /// Index of the site whose species changes.
    pub site: usize,
    /// New species code, indexing the site's sublattice site space.
    pub code: usize,
}

impl SiteFlip {
    /// Creates a flip of `site` to `code`.
    pub fn new(site: usize, code: usize) -> Self {
        Self { site, code }
    }
}

/// Applies a step to an occupancy, returning the resulting vector.
///
/// Flips apply in order, so a later flip of the same site wins. Panics are
/// avoided; out-of-range sites are the caller's precondition and checked by
/// processors.
pub fn apply_step(occupancy: &[usize], step: &[SiteFlip]) -> Vec<usize> {
    let mut next = occupancy.to_vec();
    for flip in step {
        if flip.site < next.len() {
            next[flip.site] = flip.code;
        }
    }
    next
}
