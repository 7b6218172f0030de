//! Sublattice partition of supercell sites.
//!
//! A sublattice is the set of sites sharing one ordered allowed-species list
//! (the site space). Species on a sublattice are encoded as their index into
//! that list, which is the integer code stored in occupancy vectors.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use cemc_core::{CemcError, ErrorInfo, Species};

/// A group of sites with an identical allowed-species set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sublattice {
    site_space: Vec<Species>,
    sites: Vec<usize>,
    active_sites: Vec<usize>,
}

impl Sublattice {
    /// Creates a sublattice from its site space and member site indices.
    ///
    /// All sites start active. The site space must be non-empty and free of
    /// duplicate species; the site list must be free of duplicates.
    pub fn new(site_space: Vec<Species>, sites: Vec<usize>) -> Result<Self, CemcError> {
        if site_space.is_empty() {
            return Err(CemcError::Lattice(ErrorInfo::new(
                "empty-site-space",
                "sublattice needs at least one allowed species",
            )));
        }
        let unique: BTreeSet<&Species> = site_space.iter().collect();
        if unique.len() != site_space.len() {
            return Err(CemcError::Lattice(
                ErrorInfo::new("duplicate-species", "site space repeats a species")
                    .with_context("site_space", render_site_space(&site_space)),
            ));
        }
        let unique_sites: BTreeSet<usize> = sites.iter().copied().collect();
        if unique_sites.len() != sites.len() {
            return Err(CemcError::Lattice(ErrorInfo::new(
                "duplicate-sites",
                "site list repeats a site index",
            )));
        }
        Ok(Self {
            active_sites: sites.clone(),
            site_space,
            sites,
        })
    }

    /// Ordered allowed species for sites in this sublattice.
    pub fn species(&self) -> &[Species] {
        &self.site_space
    }

    /// Number of allowed species; codes run `0..num_species()`.
    pub fn num_species(&self) -> usize {
        self.site_space.len()
    }

    /// Range of valid occupancy codes for sites on this sublattice.
    pub fn encoding(&self) -> std::ops::Range<usize> {
        0..self.site_space.len()
    }

    /// Species for an encoded occupancy code, if in range.
    pub fn species_for_code(&self, code: usize) -> Option<&Species> {
        self.site_space.get(code)
    }

    /// Encoded code for a species, if allowed on this sublattice.
    pub fn code_for_species(&self, species: &Species) -> Option<usize> {
        self.site_space.iter().position(|sp| sp == species)
    }

    /// All member site indices.
    pub fn sites(&self) -> &[usize] {
        &self.sites
    }

    /// Sites whose occupancy may change during sampling.
    pub fn active_sites(&self) -> &[usize] {
        &self.active_sites
    }

    /// Sites excluded from proposals.
    pub fn restricted_sites(&self) -> Vec<usize> {
        self.sites
            .iter()
            .copied()
            .filter(|site| !self.active_sites.contains(site))
            .collect()
    }

    /// Whether a site is currently active on this sublattice.
    pub fn is_active(&self, site: usize) -> bool {
        self.active_sites.contains(&site)
    }

    /// Freezes the given sites, excluding them from future proposals.
    ///
    /// Indices not belonging to the sublattice are rejected.
    pub fn restrict_sites(&mut self, frozen: &[usize]) -> Result<(), CemcError> {
        for &site in frozen {
            if !self.sites.contains(&site) {
                return Err(CemcError::Lattice(
                    ErrorInfo::new("foreign-site", "cannot restrict a site outside the sublattice")
                        .with_context("site", site.to_string()),
                ));
            }
        }
        self.active_sites.retain(|site| !frozen.contains(site));
        Ok(())
    }

    /// Restores every member site to the active set.
    pub fn reset_restricted_sites(&mut self) {
        self.active_sites = self.sites.clone();
    }
}

fn render_site_space(site_space: &[Species]) -> String {
    site_space
        .iter()
        .map(Species::canonical_key)
        .collect::<Vec<_>>()
        .join(",")
}

/// Groups sites with identical allowed-species sequences into sublattices.
///
/// `allowed_species[i]` is the ordered species list for site `i`. Sublattices
/// are returned in order of first appearance, so the grouping is
/// deterministic for a fixed input.
pub fn build_sublattices(allowed_species: &[Vec<Species>]) -> Result<Vec<Sublattice>, CemcError> {
    let mut spaces: Vec<Vec<Species>> = Vec::new();
    let mut members: Vec<Vec<usize>> = Vec::new();
    for (site, space) in allowed_species.iter().enumerate() {
        if space.is_empty() {
            return Err(CemcError::Lattice(
                ErrorInfo::new("empty-site-space", "site allows no species")
                    .with_context("site", site.to_string()),
            ));
        }
        match spaces.iter().position(|known| known == space) {
            Some(idx) => members[idx].push(site),
            None => {
                spaces.push(space.clone());
                members.push(vec![site]);
            }
        }
    }
    spaces
        .into_iter()
        .zip(members)
        .map(|(space, sites)| Sublattice::new(space, sites))
        .collect()
}

/// Site-to-sublattice lookup built once per ensemble.
///
/// Construction enforces the partition invariant: every site index in
/// `0..num_sites` belongs to exactly one sublattice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteIndex {
    sublattice_of: Vec<usize>,
}

impl SiteIndex {
    /// Builds the lookup, validating the partition.
    pub fn new(sublattices: &[Sublattice], num_sites: usize) -> Result<Self, CemcError> {
        let mut sublattice_of = vec![usize::MAX; num_sites];
        for (idx, sublattice) in sublattices.iter().enumerate() {
            for &site in sublattice.sites() {
                if site >= num_sites {
                    return Err(CemcError::Lattice(
                        ErrorInfo::new("site-out-of-range", "sublattice site exceeds supercell")
                            .with_context("site", site.to_string())
                            .with_context("num_sites", num_sites.to_string()),
                    ));
                }
                if sublattice_of[site] != usize::MAX {
                    return Err(CemcError::Lattice(
                        ErrorInfo::new("partition-overlap", "site assigned to two sublattices")
                            .with_context("site", site.to_string()),
                    ));
                }
                sublattice_of[site] = idx;
            }
        }
        if let Some(site) = sublattice_of.iter().position(|&idx| idx == usize::MAX) {
            return Err(CemcError::Lattice(
                ErrorInfo::new("partition-gap", "site not covered by any sublattice")
                    .with_context("site", site.to_string()),
            ));
        }
        Ok(Self { sublattice_of })
    }

    /// Sublattice index owning the given site.
    pub fn sublattice_of(&self, site: usize) -> Option<usize> {
        self.sublattice_of.get(site).copied()
    }

    /// Number of sites covered by the partition.
    pub fn num_sites(&self) -> usize {
        self.sublattice_of.len()
    }
}

/// Checks that the sublattices partition `0..num_sites`.
pub fn validate_partition(sublattices: &[Sublattice], num_sites: usize) -> Result<(), CemcError> {
    SiteIndex::new(sublattices, num_sites).map(|_| ())
}
