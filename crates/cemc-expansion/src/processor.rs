//! Feature/energy processors with incremental evaluation.
//!
//! The contract: `feature_change` must equal the difference of two full
//! `feature_vector` evaluations for the same before/after occupancy, and must
//! run in time proportional to the cluster images touching the changed sites.

use cemc_core::{apply_step, CemcError, ErrorInfo, SiteFlip};
use cemc_lattice::{SiteIndex, Sublattice};

use crate::orbit::Orbit;

/// Per-site species-space sizes for a validated sublattice partition, in
/// site order. This is the shape information processors are built against.
pub fn site_space_sizes(sublattices: &[Sublattice], index: &SiteIndex) -> Vec<usize> {
    (0..index.num_sites())
        .map(|site| {
            let sl = index.sublattice_of(site).expect("validated partition");
            sublattices[sl].num_species()
        })
        .collect()
}

/// Computes total and incremental feature vectors and energies for encoded
/// occupancies. Implementations never mutate the occupancy they are given.
pub trait Processor: Send + Sync {
    /// Dimensionality of the feature vector.
    fn num_features(&self) -> usize;

    /// Fixed coefficient vector, one entry per feature dimension.
    fn coefficients(&self) -> &[f64];

    /// Full feature vector for an occupancy.
    fn feature_vector(&self, occupancy: &[usize]) -> Result<Vec<f64>, CemcError>;

    /// Change in the feature vector caused by a hypothetical step.
    fn feature_change(&self, occupancy: &[usize], step: &[SiteFlip])
        -> Result<Vec<f64>, CemcError>;

    /// Total energy: coefficients dotted with the full feature vector.
    fn energy(&self, occupancy: &[usize]) -> Result<f64, CemcError> {
        Ok(dot(self.coefficients(), &self.feature_vector(occupancy)?))
    }

    /// Energy change: coefficients dotted with the feature change.
    fn energy_change(&self, occupancy: &[usize], step: &[SiteFlip]) -> Result<f64, CemcError> {
        Ok(dot(self.coefficients(), &self.feature_change(occupancy, step)?))
    }
}

pub(crate) fn dot(coefficients: &[f64], features: &[f64]) -> f64 {
    coefficients
        .iter()
        .zip(features)
        .map(|(c, f)| c * f)
        .sum()
}

/// Cluster-expansion processor over a fixed supercell.
///
/// Precomputes, for every site, the orbit images containing it, so a flip
/// only re-evaluates the touched images. One feature dimension per orbit;
/// each orbit's feature is its image-averaged basis value.
#[derive(Debug, Clone)]
pub struct ClusterProcessor {
    orbits: Vec<Orbit>,
    coefficients: Vec<f64>,
    num_sites: usize,
    // site -> [(orbit index, image indices containing the site)]
    site_orbit_images: Vec<Vec<(usize, Vec<usize>)>>,
}

impl ClusterProcessor {
    /// Builds the processor, validating orbit geometry against the supercell.
    ///
    /// `site_space_sizes[i]` is the number of allowed species on site `i`;
    /// each orbit table dimension must match the size of the site it indexes.
    pub fn new(
        orbits: Vec<Orbit>,
        coefficients: Vec<f64>,
        site_space_sizes: &[usize],
    ) -> Result<Self, CemcError> {
        if coefficients.len() != orbits.len() {
            return Err(CemcError::Processor(
                ErrorInfo::new(
                    "coefficient-count",
                    "need exactly one coefficient per orbit",
                )
                .with_context("orbits", orbits.len().to_string())
                .with_context("coefficients", coefficients.len().to_string()),
            ));
        }
        let num_sites = site_space_sizes.len();
        for orbit in &orbits {
            for cluster in orbit.clusters() {
                for (pos, &site) in cluster.iter().enumerate() {
                    if site >= num_sites {
                        return Err(CemcError::Processor(
                            ErrorInfo::new("cluster-site-range", "cluster site outside supercell")
                                .with_context("orbit", orbit.id().to_string())
                                .with_context("site", site.to_string()),
                        ));
                    }
                    if orbit.table().space_sizes()[pos] != site_space_sizes[site] {
                        return Err(CemcError::Processor(
                            ErrorInfo::new(
                                "table-space-mismatch",
                                "table dimension does not match site space",
                            )
                            .with_context("orbit", orbit.id().to_string())
                            .with_context("site", site.to_string()),
                        ));
                    }
                }
            }
        }

        let mut site_orbit_images: Vec<Vec<(usize, Vec<usize>)>> = vec![Vec::new(); num_sites];
        for (orbit_idx, orbit) in orbits.iter().enumerate() {
            for site in 0..num_sites {
                let images: Vec<usize> = orbit
                    .clusters()
                    .iter()
                    .enumerate()
                    .filter(|(_, cluster)| cluster.contains(&site))
                    .map(|(image, _)| image)
                    .collect();
                if !images.is_empty() {
                    site_orbit_images[site].push((orbit_idx, images));
                }
            }
        }

        Ok(Self {
            orbits,
            coefficients,
            num_sites,
            site_orbit_images,
        })
    }

    /// Orbits backing this processor.
    pub fn orbits(&self) -> &[Orbit] {
        &self.orbits
    }

    /// Number of supercell sites the processor was built for.
    pub fn num_sites(&self) -> usize {
        self.num_sites
    }

    fn check_occupancy_len(&self, occupancy: &[usize]) -> Result<(), CemcError> {
        if occupancy.len() != self.num_sites {
            return Err(CemcError::Processor(
                ErrorInfo::new("occupancy-length", "occupancy does not match supercell")
                    .with_context("expected", self.num_sites.to_string())
                    .with_context("actual", occupancy.len().to_string()),
            ));
        }
        Ok(())
    }

    fn check_step(&self, step: &[SiteFlip]) -> Result<(), CemcError> {
        for flip in step {
            if flip.site >= self.num_sites {
                return Err(CemcError::Processor(
                    ErrorInfo::new("flip-site-range", "flip site outside supercell")
                        .with_context("site", flip.site.to_string()),
                ));
            }
        }
        Ok(())
    }
}

impl Processor for ClusterProcessor {
    fn num_features(&self) -> usize {
        self.orbits.len()
    }

    fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    fn feature_vector(&self, occupancy: &[usize]) -> Result<Vec<f64>, CemcError> {
        self.check_occupancy_len(occupancy)?;
        Ok(self
            .orbits
            .iter()
            .map(|orbit| orbit.feature(occupancy))
            .collect())
    }

    fn feature_change(
        &self,
        occupancy: &[usize],
        step: &[SiteFlip],
    ) -> Result<Vec<f64>, CemcError> {
        self.check_occupancy_len(occupancy)?;
        self.check_step(step)?;
        let mut delta = vec![0.0; self.orbits.len()];
        let mut before = occupancy.to_vec();
        for flip in step {
            if before[flip.site] == flip.code {
                continue;
            }
            let mut after = before.clone();
            after[flip.site] = flip.code;
            for (orbit_idx, images) in &self.site_orbit_images[flip.site] {
                let orbit = &self.orbits[*orbit_idx];
                let image_count = orbit.clusters().len() as f64;
                let mut image_delta = 0.0;
                for &image in images {
                    image_delta +=
                        orbit.evaluate_image(image, &after) - orbit.evaluate_image(image, &before);
                }
                delta[*orbit_idx] += image_delta / image_count;
            }
            before = after;
        }
        Ok(delta)
    }
}

/// Recomputes a step's feature change from two full evaluations and compares
/// against the incremental path. A mismatch beyond `tol` is fatal; this backs
/// the sampler's periodic verification mode.
pub fn verify_delta(
    processor: &dyn Processor,
    occupancy: &[usize],
    step: &[SiteFlip],
    tol: f64,
) -> Result<(), CemcError> {
    let incremental = processor.feature_change(occupancy, step)?;
    let before = processor.feature_vector(occupancy)?;
    let after = processor.feature_vector(&apply_step(occupancy, step))?;
    for (dim, ((b, a), inc)) in before.iter().zip(&after).zip(&incremental).enumerate() {
        let full = a - b;
        if (full - inc).abs() > tol {
            return Err(CemcError::Processor(
                ErrorInfo::new(
                    "delta-mismatch",
                    "incremental feature change disagrees with full recomputation",
                )
                .with_context("dimension", dim.to_string())
                .with_context("full", full.to_string())
                .with_context("incremental", inc.to_string())
                .with_hint("the orbit tables or delta index are inconsistent"),
            ));
        }
    }
    Ok(())
}
