#![deny(missing_docs)]

//! Sublattice model for configurational lattice sampling: partitions
//! supercell sites into groups sharing an allowed-species set, tracks active
//! versus frozen sites, and derives composition statistics from encoded
//! occupancy vectors.

pub mod occupancy;
pub mod sublattice;

pub use occupancy::{check_occupancy, composition_fractions, species_counts, species_site_lists};
pub use sublattice::{build_sublattices, validate_partition, SiteIndex, Sublattice};
