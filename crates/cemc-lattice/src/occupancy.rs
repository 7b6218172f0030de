//! Occupancy encoding checks and composition statistics.
//!
//! An occupancy is one integer code per site, indexing into the site's
//! sublattice site space. These helpers are used by the semigrand ensemble
//! for chemical-potential bookkeeping and by the table-swap ushers to find
//! sites currently hosting a species.

use cemc_core::{CemcError, ErrorInfo};

use crate::sublattice::{SiteIndex, Sublattice};

/// Validates that an occupancy vector matches the partition and that every
/// code is within its site's allowed encoding.
pub fn check_occupancy(
    sublattices: &[Sublattice],
    index: &SiteIndex,
    occupancy: &[usize],
) -> Result<(), CemcError> {
    if occupancy.len() != index.num_sites() {
        return Err(CemcError::Lattice(
            ErrorInfo::new("occupancy-length", "occupancy length does not match supercell")
                .with_context("expected", index.num_sites().to_string())
                .with_context("actual", occupancy.len().to_string()),
        ));
    }
    for (site, &code) in occupancy.iter().enumerate() {
        let sublattice = &sublattices[index
            .sublattice_of(site)
            .expect("site index validated at construction")];
        if code >= sublattice.num_species() {
            return Err(CemcError::Lattice(
                ErrorInfo::new("code-out-of-range", "species code not allowed on site")
                    .with_context("site", site.to_string())
                    .with_context("code", code.to_string())
                    .with_context("num_species", sublattice.num_species().to_string()),
            ));
        }
    }
    Ok(())
}

/// Counts each species code per sublattice.
///
/// Returns one row per sublattice, one count per species code in the
/// sublattice's encoding order.
pub fn species_counts(
    sublattices: &[Sublattice],
    index: &SiteIndex,
    occupancy: &[usize],
) -> Result<Vec<Vec<usize>>, CemcError> {
    check_occupancy(sublattices, index, occupancy)?;
    let mut counts: Vec<Vec<usize>> = sublattices
        .iter()
        .map(|sublattice| vec![0; sublattice.num_species()])
        .collect();
    for (site, &code) in occupancy.iter().enumerate() {
        let sl_idx = index.sublattice_of(site).expect("validated partition");
        counts[sl_idx][code] += 1;
    }
    Ok(counts)
}

/// Lists the site indices currently hosting each species code, per
/// sublattice. Only active sites are listed; restricted sites never appear
/// so they cannot be selected by any move.
pub fn species_site_lists(
    sublattices: &[Sublattice],
    index: &SiteIndex,
    occupancy: &[usize],
) -> Result<Vec<Vec<Vec<usize>>>, CemcError> {
    check_occupancy(sublattices, index, occupancy)?;
    let mut lists: Vec<Vec<Vec<usize>>> = sublattices
        .iter()
        .map(|sublattice| vec![Vec::new(); sublattice.num_species()])
        .collect();
    for (sl_idx, sublattice) in sublattices.iter().enumerate() {
        for &site in sublattice.active_sites() {
            lists[sl_idx][occupancy[site]].push(site);
        }
    }
    Ok(lists)
}

/// Normalized per-sublattice composition fractions.
pub fn composition_fractions(
    sublattices: &[Sublattice],
    index: &SiteIndex,
    occupancy: &[usize],
) -> Result<Vec<Vec<f64>>, CemcError> {
    let counts = species_counts(sublattices, index, occupancy)?;
    Ok(counts
        .into_iter()
        .map(|row| {
            let total: usize = row.iter().sum();
            row.into_iter()
                .map(|count| {
                    if total == 0 {
                        0.0
                    } else {
                        count as f64 / total as f64
                    }
                })
                .collect()
        })
        .collect())
}
