//! Species-exchange (swap) proposals.

use cemc_core::{CemcError, ErrorInfo, RngHandle, SiteFlip};
use cemc_lattice::Sublattice;

use crate::proposal::{MoveKind, Proposal};

/// Proposes exchanging the species of two active sites drawn from a linked
/// sublattice pair.
///
/// The reverse move is the same exchange, so the proposal is symmetric and
/// the log ratio is zero. Species counts are conserved, which is what makes
/// this the canonical-ensemble move.
#[derive(Debug, Clone)]
pub struct SwapUsher {
    sublattices: Vec<Sublattice>,
    links: Vec<(usize, usize)>,
}

impl SwapUsher {
    /// Builds a swap usher over the given sublattice links.
    ///
    /// A link `(a, b)` allows exchanges between sublattices `a` and `b`;
    /// `(a, a)` is the ordinary within-sublattice swap. When `links` is
    /// empty, every sublattice with at least two species is linked to
    /// itself.
    pub fn new(
        sublattices: Vec<Sublattice>,
        links: Vec<(usize, usize)>,
    ) -> Result<Self, CemcError> {
        let links = if links.is_empty() {
            sublattices
                .iter()
                .enumerate()
                .filter(|(_, sublattice)| sublattice.num_species() > 1)
                .map(|(idx, _)| (idx, idx))
                .collect()
        } else {
            for &(a, b) in &links {
                if a >= sublattices.len() || b >= sublattices.len() {
                    return Err(CemcError::Config(
                        ErrorInfo::new("link-out-of-range", "swap link names unknown sublattice")
                            .with_context("link", format!("{a}-{b}")),
                    ));
                }
            }
            links
        };
        if links.is_empty() {
            return Err(CemcError::Config(ErrorInfo::new(
                "no-swap-links",
                "no sublattice is eligible for swapping",
            )));
        }
        Ok(Self { sublattices, links })
    }

    /// Proposes one swap.
    pub fn propose(&self, occupancy: &[usize], rng: &mut RngHandle) -> Proposal {
        let (sl_a, sl_b) = self.links[rng.index_below(self.links.len())];
        let lattice_a = &self.sublattices[sl_a];
        let lattice_b = &self.sublattices[sl_b];
        if lattice_a.active_sites().is_empty() {
            return Proposal::null(MoveKind::Swap, None);
        }
        let active_a = lattice_a.active_sites();
        let site_a = active_a[rng.index_below(active_a.len())];
        let species_a = lattice_a
            .species_for_code(occupancy[site_a])
            .expect("validated occupancy")
            .clone();

        // Partners must currently host a different species, and both species
        // must be allowed on the other side of the link.
        let partners: Vec<usize> = lattice_b
            .active_sites()
            .iter()
            .copied()
            .filter(|&site_b| site_b != site_a)
            .filter(|&site_b| {
                let species_b = lattice_b
                    .species_for_code(occupancy[site_b])
                    .expect("validated occupancy");
                species_b != &species_a
                    && lattice_a.code_for_species(species_b).is_some()
                    && lattice_b.code_for_species(&species_a).is_some()
            })
            .collect();
        if partners.is_empty() {
            return Proposal::null(MoveKind::Swap, None);
        }
        let site_b = partners[rng.index_below(partners.len())];
        let species_b = lattice_b
            .species_for_code(occupancy[site_b])
            .expect("validated occupancy");

        let code_a = lattice_a
            .code_for_species(species_b)
            .expect("filtered above");
        let code_b = lattice_b
            .code_for_species(&species_a)
            .expect("filtered above");
        Proposal::step(
            MoveKind::Swap,
            vec![SiteFlip::new(site_a, code_a), SiteFlip::new(site_b, code_b)],
            0.0,
        )
    }
}
