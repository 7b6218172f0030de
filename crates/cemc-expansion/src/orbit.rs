//! Orbit data consumed by the cluster processor.
//!
//! An orbit is a symmetry-equivalence class of site clusters sharing one
//! basis function and one fitted coefficient. The basis function is realized
//! as a dense correlation table indexed by the species codes on a cluster's
//! sites; the orbit feature is the table value averaged over all symmetric
//! cluster images in the supercell.

use serde::{Deserialize, Serialize};

use cemc_core::{CemcError, ErrorInfo};

/// Dense basis-function table over the species codes of one cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationTable {
    space_sizes: Vec<usize>,
    strides: Vec<usize>,
    values: Vec<f64>,
}

impl CorrelationTable {
    /// Builds a table from per-cluster-site space sizes and row-major values.
    ///
    /// `values.len()` must equal the product of the space sizes.
    pub fn new(space_sizes: Vec<usize>, values: Vec<f64>) -> Result<Self, CemcError> {
        if space_sizes.is_empty() || space_sizes.contains(&0) {
            return Err(CemcError::Processor(ErrorInfo::new(
                "empty-table-dimension",
                "correlation table needs non-zero dimensions",
            )));
        }
        let expected: usize = space_sizes.iter().product();
        if values.len() != expected {
            return Err(CemcError::Processor(
                ErrorInfo::new("table-size-mismatch", "value count does not match dimensions")
                    .with_context("expected", expected.to_string())
                    .with_context("actual", values.len().to_string()),
            ));
        }
        // Row-major strides: the last cluster site varies fastest.
        let mut strides = vec![1usize; space_sizes.len()];
        for idx in (0..space_sizes.len().saturating_sub(1)).rev() {
            strides[idx] = strides[idx + 1] * space_sizes[idx + 1];
        }
        Ok(Self {
            space_sizes,
            strides,
            values,
        })
    }

    /// Number of cluster sites the table spans.
    pub fn cluster_size(&self) -> usize {
        self.space_sizes.len()
    }

    /// Per-site species-space sizes.
    pub fn space_sizes(&self) -> &[usize] {
        &self.space_sizes
    }

    /// Looks up the basis value for the given species codes.
    ///
    /// Codes must be in range; processors validate occupancies before
    /// reaching this hot path.
    pub fn evaluate(&self, codes: &[usize]) -> f64 {
        debug_assert_eq!(codes.len(), self.space_sizes.len());
        let mut offset = 0usize;
        for (code, stride) in codes.iter().zip(&self.strides) {
            offset += code * stride;
        }
        self.values[offset]
    }
}

/// One orbit: an id, its symmetric cluster images and its basis table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Orbit {
    id: usize,
    clusters: Vec<Vec<usize>>,
    table: CorrelationTable,
}

impl Orbit {
    /// Creates an orbit from its cluster images and correlation table.
    ///
    /// Every image must list exactly as many sites as the table has
    /// dimensions, and at least one image is required.
    pub fn new(
        id: usize,
        clusters: Vec<Vec<usize>>,
        table: CorrelationTable,
    ) -> Result<Self, CemcError> {
        if clusters.is_empty() {
            return Err(CemcError::Processor(
                ErrorInfo::new("orbit-no-clusters", "orbit has no cluster images")
                    .with_context("orbit", id.to_string()),
            ));
        }
        for cluster in &clusters {
            if cluster.len() != table.cluster_size() {
                return Err(CemcError::Processor(
                    ErrorInfo::new("cluster-arity", "cluster image does not match table rank")
                        .with_context("orbit", id.to_string())
                        .with_context("expected", table.cluster_size().to_string())
                        .with_context("actual", cluster.len().to_string()),
                ));
            }
        }
        Ok(Self {
            id,
            clusters,
            table,
        })
    }

    /// Stable identifier for diagnostics.
    pub fn id(&self) -> usize {
        self.id
    }

    /// Symmetric cluster images in the supercell.
    pub fn clusters(&self) -> &[Vec<usize>] {
        &self.clusters
    }

    /// The orbit's basis-function table.
    pub fn table(&self) -> &CorrelationTable {
        &self.table
    }

    /// Evaluates one cluster image against an occupancy.
    pub fn evaluate_image(&self, image: usize, occupancy: &[usize]) -> f64 {
        let codes: Vec<usize> = self.clusters[image]
            .iter()
            .map(|&site| occupancy[site])
            .collect();
        self.table.evaluate(&codes)
    }

    /// Orbit feature: basis value averaged over all images.
    pub fn feature(&self, occupancy: &[usize]) -> f64 {
        let sum: f64 = (0..self.clusters.len())
            .map(|image| self.evaluate_image(image, occupancy))
            .sum();
        sum / self.clusters.len() as f64
    }
}
