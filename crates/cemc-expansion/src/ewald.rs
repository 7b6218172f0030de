//! Long-range electrostatic pair term.
//!
//! A single-feature processor over a precomputed symmetric interaction
//! matrix indexed by (site, species-code) rows. The matrix itself comes from
//! an external Ewald summation; this crate only validates its shape and
//! evaluates it, incrementally where possible.

use cemc_core::{CemcError, ErrorInfo, SiteFlip};

use crate::processor::Processor;

/// Electrostatic pair processor.
///
/// The feature is `sum_{i<=j} M[row_i][row_j]` over the rows selected by the
/// current occupancy, where `row_i = offset(site_i) + code_i`. A flip changes
/// one row, so its delta touches `O(num_sites)` matrix entries rather than
/// the full quadratic form.
#[derive(Debug, Clone)]
pub struct EwaldProcessor {
    matrix: Vec<Vec<f64>>,
    offsets: Vec<usize>,
    space_sizes: Vec<usize>,
    coefficients: [f64; 1],
}

impl EwaldProcessor {
    /// Builds the processor from per-site space sizes and the interaction
    /// matrix, scaled by a single fitted coefficient.
    ///
    /// The matrix must be square with one row per (site, code) pair and
    /// symmetric within `1e-8`.
    pub fn new(
        site_space_sizes: &[usize],
        matrix: Vec<Vec<f64>>,
        coefficient: f64,
    ) -> Result<Self, CemcError> {
        let mut offsets = Vec::with_capacity(site_space_sizes.len());
        let mut total_rows = 0usize;
        for &size in site_space_sizes {
            if size == 0 {
                return Err(CemcError::Processor(ErrorInfo::new(
                    "empty-site-space",
                    "site allows no species",
                )));
            }
            offsets.push(total_rows);
            total_rows += size;
        }
        if matrix.len() != total_rows {
            return Err(CemcError::Processor(
                ErrorInfo::new("matrix-rows", "interaction matrix row count mismatch")
                    .with_context("expected", total_rows.to_string())
                    .with_context("actual", matrix.len().to_string()),
            ));
        }
        for (row_idx, row) in matrix.iter().enumerate() {
            if row.len() != total_rows {
                return Err(CemcError::Processor(
                    ErrorInfo::new("matrix-columns", "interaction matrix is not square")
                        .with_context("row", row_idx.to_string()),
                ));
            }
        }
        for i in 0..total_rows {
            for j in (i + 1)..total_rows {
                if (matrix[i][j] - matrix[j][i]).abs() > 1e-8 {
                    return Err(CemcError::Processor(
                        ErrorInfo::new("matrix-asymmetry", "interaction matrix must be symmetric")
                            .with_context("i", i.to_string())
                            .with_context("j", j.to_string()),
                    ));
                }
            }
        }
        Ok(Self {
            matrix,
            offsets,
            space_sizes: site_space_sizes.to_vec(),
            coefficients: [coefficient],
        })
    }

    fn row(&self, site: usize, code: usize) -> Result<usize, CemcError> {
        if site >= self.space_sizes.len() || code >= self.space_sizes[site] {
            return Err(CemcError::Processor(
                ErrorInfo::new("row-out-of-range", "site/code pair outside matrix")
                    .with_context("site", site.to_string())
                    .with_context("code", code.to_string()),
            ));
        }
        Ok(self.offsets[site] + code)
    }

    fn rows_for(&self, occupancy: &[usize]) -> Result<Vec<usize>, CemcError> {
        if occupancy.len() != self.space_sizes.len() {
            return Err(CemcError::Processor(
                ErrorInfo::new("occupancy-length", "occupancy does not match supercell")
                    .with_context("expected", self.space_sizes.len().to_string())
                    .with_context("actual", occupancy.len().to_string()),
            ));
        }
        occupancy
            .iter()
            .enumerate()
            .map(|(site, &code)| self.row(site, code))
            .collect()
    }
}

impl Processor for EwaldProcessor {
    fn num_features(&self) -> usize {
        1
    }

    fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    fn feature_vector(&self, occupancy: &[usize]) -> Result<Vec<f64>, CemcError> {
        let rows = self.rows_for(occupancy)?;
        let mut value = 0.0;
        for (i, &row_i) in rows.iter().enumerate() {
            for &row_j in rows.iter().skip(i) {
                value += self.matrix[row_i][row_j];
            }
        }
        Ok(vec![value])
    }

    fn feature_change(
        &self,
        occupancy: &[usize],
        step: &[SiteFlip],
    ) -> Result<Vec<f64>, CemcError> {
        let mut rows = self.rows_for(occupancy)?;
        let mut delta = 0.0;
        for flip in step {
            let new_row = self.row(flip.site, flip.code)?;
            let old_row = rows[flip.site];
            if new_row == old_row {
                continue;
            }
            // A single changed row: subtract its old interactions, add the
            // new ones, diagonal handled separately.
            for (site, &row) in rows.iter().enumerate() {
                if site == flip.site {
                    continue;
                }
                delta += self.matrix[new_row][row] - self.matrix[old_row][row];
            }
            delta += self.matrix[new_row][new_row] - self.matrix[old_row][old_row];
            rows[flip.site] = new_row;
        }
        Ok(vec![delta])
    }
}
