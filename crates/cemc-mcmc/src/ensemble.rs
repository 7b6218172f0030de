//! Thermodynamic ensembles and chemical-potential bookkeeping.

use serde::{Deserialize, Serialize};

use cemc_core::{CemcError, ErrorInfo, SiteFlip, Species};
use cemc_lattice::{SiteIndex, Sublattice};

/// Chemical potentials keyed by species.
///
/// Every species allowed on any active sublattice of a semigrand ensemble
/// must carry a potential; duplicates and gaps are fatal at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChemicalPotentials {
    table: Vec<(Species, f64)>,
}

impl ChemicalPotentials {
    /// Builds the table, rejecting duplicate species.
    pub fn new(pairs: Vec<(Species, f64)>) -> Result<Self, CemcError> {
        for (idx, (species, value)) in pairs.iter().enumerate() {
            if !value.is_finite() {
                return Err(CemcError::Config(
                    ErrorInfo::new("bad-mu", "chemical potential must be finite")
                        .with_context("species", species.canonical_key()),
                ));
            }
            if pairs[..idx].iter().any(|(other, _)| other == species) {
                return Err(CemcError::Config(
                    ErrorInfo::new("duplicate-mu", "species listed twice in chemical potentials")
                        .with_context("species", species.canonical_key()),
                ));
            }
        }
        Ok(Self { table: pairs })
    }

    /// Potential for a species, if listed.
    pub fn get(&self, species: &Species) -> Option<f64> {
        self.table
            .iter()
            .find(|(other, _)| other == species)
            .map(|(_, value)| *value)
    }

    /// All listed pairs.
    pub fn pairs(&self) -> &[(Species, f64)] {
        &self.table
    }

    fn check_coverage(&self, sublattices: &[Sublattice]) -> Result<(), CemcError> {
        for lattice in sublattices {
            if lattice.active_sites().is_empty() {
                continue;
            }
            for species in lattice.species() {
                if self.get(species).is_none() {
                    return Err(CemcError::Config(
                        ErrorInfo::new("missing-mu", "active species lacks a chemical potential")
                            .with_context("species", species.canonical_key())
                            .with_hint("list every species of every active sublattice"),
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Statistical ensemble applied on top of the processor energy.
///
/// The ensemble turns a raw energy change into the quantity entering the
/// Metropolis exponent: unchanged in the canonical ensemble, shifted by
/// `-sum(mu_i * dn_i)` in the semigrand ensemble. Temperature lives on the
/// kernel, not here.
#[derive(Debug, Clone)]
pub enum Ensemble {
    /// Fixed composition; moves must conserve species counts.
    Canonical {
        /// Sublattice partition of the supercell.
        sublattices: Vec<Sublattice>,
        /// Site-to-sublattice index over the partition.
        index: SiteIndex,
    },
    /// Fixed chemical potentials; species counts may drift.
    Semigrand {
        /// Sublattice partition of the supercell.
        sublattices: Vec<Sublattice>,
        /// Site-to-sublattice index over the partition.
        index: SiteIndex,
        /// Potentials covering every active species.
        chemical_potentials: ChemicalPotentials,
    },
}

impl Ensemble {
    /// Canonical ensemble over a validated partition.
    pub fn canonical(sublattices: Vec<Sublattice>, num_sites: usize) -> Result<Self, CemcError> {
        let index = SiteIndex::new(&sublattices, num_sites)?;
        Ok(Ensemble::Canonical { sublattices, index })
    }

    /// Semigrand ensemble; potentials must cover every active species.
    pub fn semigrand(
        sublattices: Vec<Sublattice>,
        num_sites: usize,
        chemical_potentials: ChemicalPotentials,
    ) -> Result<Self, CemcError> {
        chemical_potentials.check_coverage(&sublattices)?;
        let index = SiteIndex::new(&sublattices, num_sites)?;
        Ok(Ensemble::Semigrand {
            sublattices,
            index,
            chemical_potentials,
        })
    }

    /// The sublattice partition.
    pub fn sublattices(&self) -> &[Sublattice] {
        match self {
            Ensemble::Canonical { sublattices, .. } | Ensemble::Semigrand { sublattices, .. } => {
                sublattices
            }
        }
    }

    /// The site index over the partition.
    pub fn site_index(&self) -> &SiteIndex {
        match self {
            Ensemble::Canonical { index, .. } | Ensemble::Semigrand { index, .. } => index,
        }
    }

    /// Current potentials, if this is a semigrand ensemble.
    pub fn chemical_potentials(&self) -> Option<&ChemicalPotentials> {
        match self {
            Ensemble::Canonical { .. } => None,
            Ensemble::Semigrand {
                chemical_potentials,
                ..
            } => Some(chemical_potentials),
        }
    }

    /// Replaces the chemical potentials mid-run.
    ///
    /// Changing potentials is an explicit operation so a run's ensemble
    /// parameters never drift silently. Fails on a canonical ensemble.
    pub fn set_chemical_potentials(
        &mut self,
        chemical_potentials: ChemicalPotentials,
    ) -> Result<(), CemcError> {
        match self {
            Ensemble::Canonical { .. } => Err(CemcError::Config(ErrorInfo::new(
                "canonical-mu",
                "canonical ensemble carries no chemical potentials",
            ))),
            Ensemble::Semigrand {
                sublattices,
                chemical_potentials: slot,
                ..
            } => {
                chemical_potentials.check_coverage(sublattices)?;
                *slot = chemical_potentials;
                Ok(())
            }
        }
    }

    /// Quantity entering the acceptance exponent for a proposed step.
    ///
    /// `energy_delta` is the processor's incremental energy change for the
    /// step applied to `occupancy`. The semigrand correction walks the step
    /// flip by flip on an evolving copy so coupled reactions account each
    /// transmutation against the species actually present when it fires.
    pub fn acceptance_delta(
        &self,
        energy_delta: f64,
        occupancy: &[usize],
        step: &[SiteFlip],
    ) -> Result<f64, CemcError> {
        match self {
            Ensemble::Canonical { .. } => Ok(energy_delta),
            Ensemble::Semigrand {
                sublattices,
                index,
                chemical_potentials,
            } => {
                let mut mu_delta = 0.0;
                let mut scratch = occupancy.to_vec();
                for flip in step {
                    let sl_idx = index.sublattice_of(flip.site).ok_or_else(|| {
                        CemcError::Proposal(
                            ErrorInfo::new("site-out-of-partition", "step touches unindexed site")
                                .with_context("site", flip.site.to_string()),
                        )
                    })?;
                    let lattice = &sublattices[sl_idx];
                    let old = lattice.species_for_code(scratch[flip.site]).ok_or_else(|| {
                        bad_code(scratch[flip.site], flip.site)
                    })?;
                    let new = lattice
                        .species_for_code(flip.code)
                        .ok_or_else(|| bad_code(flip.code, flip.site))?;
                    let mu_old = chemical_potentials
                        .get(old)
                        .expect("coverage checked at construction");
                    let mu_new = chemical_potentials
                        .get(new)
                        .expect("coverage checked at construction");
                    mu_delta += mu_new - mu_old;
                    scratch[flip.site] = flip.code;
                }
                Ok(energy_delta - mu_delta)
            }
        }
    }
}

fn bad_code(code: usize, site: usize) -> CemcError {
    CemcError::Proposal(
        ErrorInfo::new("code-out-of-range", "species code outside the site's space")
            .with_context("site", site.to_string())
            .with_context("code", code.to_string()),
    )
}
