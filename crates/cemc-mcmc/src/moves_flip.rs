//! Single-site flip proposals.

use cemc_core::{CemcError, ErrorInfo, RngHandle, SiteFlip};
use cemc_lattice::Sublattice;

use crate::proposal::{MoveKind, Proposal};

/// Proposes replacing one active site's species with another allowed species
/// on its sublattice, both choices uniform.
///
/// The replacement is drawn from the `n - 1` other codes of a sublattice with
/// `n` allowed species, and the reverse move draws from the same remainder
/// size, so the proposal is symmetric and carries a zero log ratio.
#[derive(Debug, Clone)]
pub struct FlipUsher {
    sublattices: Vec<Sublattice>,
    // (site, sublattice index) for every active site on a flippable
    // sublattice, flattened for uniform selection.
    flippable: Vec<(usize, usize)>,
    weights: Option<Vec<f64>>,
}

impl FlipUsher {
    /// Builds a flip usher over all active sites.
    ///
    /// `weights`, when given, selects the sublattice first with the listed
    /// probabilities (must sum to one) and then a site uniformly within it;
    /// otherwise sites are uniform across all flippable active sites.
    pub fn new(
        sublattices: Vec<Sublattice>,
        weights: Option<Vec<f64>>,
    ) -> Result<Self, CemcError> {
        if let Some(weights) = &weights {
            if weights.len() != sublattices.len() {
                return Err(CemcError::Config(
                    ErrorInfo::new("weight-count", "one weight per sublattice required")
                        .with_context("sublattices", sublattices.len().to_string())
                        .with_context("weights", weights.len().to_string()),
                ));
            }
            validate_probabilities(weights, "sublattice weights")?;
        }
        let mut flippable = Vec::new();
        for (sl_idx, sublattice) in sublattices.iter().enumerate() {
            if sublattice.num_species() < 2 {
                continue;
            }
            for &site in sublattice.active_sites() {
                flippable.push((site, sl_idx));
            }
        }
        if flippable.is_empty() {
            return Err(CemcError::Config(ErrorInfo::new(
                "no-flippable-sites",
                "no active site has more than one allowed species",
            )));
        }
        Ok(Self {
            sublattices,
            flippable,
            weights,
        })
    }

    /// Proposes one flip.
    pub fn propose(&self, occupancy: &[usize], rng: &mut RngHandle) -> Proposal {
        let (site, sl_idx) = match &self.weights {
            None => self.flippable[rng.index_below(self.flippable.len())],
            Some(weights) => {
                let sl_idx = select_weighted(weights, rng);
                let sublattice = &self.sublattices[sl_idx];
                if sublattice.num_species() < 2 || sublattice.active_sites().is_empty() {
                    return Proposal::null(
                        MoveKind::Flip,
                        Some("selected sublattice has no flippable site".to_string()),
                    );
                }
                let active = sublattice.active_sites();
                (active[rng.index_below(active.len())], sl_idx)
            }
        };
        let num_species = self.sublattices[sl_idx].num_species();
        let current = occupancy[site];
        // Uniform draw over the other codes: shift past the current one.
        let mut code = rng.index_below(num_species - 1);
        if code >= current {
            code += 1;
        }
        Proposal::step(MoveKind::Flip, vec![SiteFlip::new(site, code)], 0.0)
    }
}

pub(crate) fn select_weighted(weights: &[f64], rng: &mut RngHandle) -> usize {
    let draw = rng.uniform_f64();
    let mut cumulative = 0.0;
    for (idx, &weight) in weights.iter().enumerate() {
        cumulative += weight;
        if draw < cumulative {
            return idx;
        }
    }
    weights.len() - 1
}

pub(crate) fn validate_probabilities(probs: &[f64], what: &str) -> Result<(), CemcError> {
    if probs.iter().any(|&p| !(0.0..=1.0).contains(&p)) {
        return Err(CemcError::Config(ErrorInfo::new(
            "probability-range",
            format!("{what} must lie in [0, 1]"),
        )));
    }
    let total: f64 = probs.iter().sum();
    if (total - 1.0).abs() > 1e-9 {
        return Err(CemcError::Config(
            ErrorInfo::new("probability-sum", format!("{what} must sum to one"))
                .with_context("sum", total.to_string()),
        ));
    }
    Ok(())
}
