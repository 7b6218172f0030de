//! Collected samples and run statistics.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use cemc_core::{CemcError, ErrorInfo};

use crate::proposal::MoveKind;

/// One recorded snapshot of the chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleRecord {
    /// Attempted-step index at which the snapshot was taken.
    pub step: u64,
    /// Kernel temperature when the snapshot was taken (0 for athermal).
    pub temperature: f64,
    /// Encoded occupancy.
    pub occupancy: Vec<usize>,
    /// Feature vector.
    pub features: Vec<f64>,
    /// Energy in eV.
    pub energy: f64,
    /// Whether the attempt at this step was accepted.
    pub accepted: bool,
}

const MOVE_KINDS: [MoveKind; 4] = [
    MoveKind::Flip,
    MoveKind::Swap,
    MoveKind::TableSwap,
    MoveKind::ReactionFlip,
];

fn kind_slot(kind: MoveKind) -> usize {
    match kind {
        MoveKind::Flip => 0,
        MoveKind::Swap => 1,
        MoveKind::TableSwap => 2,
        MoveKind::ReactionFlip => 3,
    }
}

/// Accumulates samples and acceptance statistics for one chain.
///
/// Every attempted step is tallied, including null moves; snapshots are
/// recorded at the sampler's thinning interval. Aggregate statistics skip
/// records below the burn-in step, but the records themselves are kept.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SampleContainer {
    records: Vec<SampleRecord>,
    burn_in: u64,
    attempted: u64,
    accepted: u64,
    attempted_by_kind: [u64; 4],
    accepted_by_kind: [u64; 4],
    best: Option<SampleRecord>,
}

impl SampleContainer {
    /// Empty container with a burn-in threshold in attempted steps.
    pub fn new(burn_in: u64) -> Self {
        Self {
            burn_in,
            ..Self::default()
        }
    }

    /// Tallies one attempted step.
    pub fn count_attempt(&mut self, kind: MoveKind, accepted: bool) {
        self.attempted += 1;
        self.attempted_by_kind[kind_slot(kind)] += 1;
        if accepted {
            self.accepted += 1;
            self.accepted_by_kind[kind_slot(kind)] += 1;
        }
    }

    /// Stores a snapshot, tracking the minimum-energy record seen.
    pub fn push(&mut self, record: SampleRecord) {
        let better = self
            .best
            .as_ref()
            .map_or(true, |best| record.energy < best.energy);
        if better {
            self.best = Some(record.clone());
        }
        self.records.push(record);
    }

    /// All stored records, burn-in included.
    pub fn records(&self) -> &[SampleRecord] {
        &self.records
    }

    /// Records at or past the burn-in step.
    pub fn production_records(&self) -> impl Iterator<Item = &SampleRecord> {
        self.records
            .iter()
            .filter(move |record| record.step >= self.burn_in)
    }

    /// Recorded energies in recording order, burn-in included.
    pub fn energies(&self) -> Vec<f64> {
        self.records.iter().map(|record| record.energy).collect()
    }

    /// Recorded occupancies in recording order, burn-in included.
    pub fn occupancies(&self) -> Vec<&[usize]> {
        self.records
            .iter()
            .map(|record| record.occupancy.as_slice())
            .collect()
    }

    /// Recorded feature vectors in recording order, burn-in included.
    pub fn feature_vectors(&self) -> Vec<&[f64]> {
        self.records
            .iter()
            .map(|record| record.features.as_slice())
            .collect()
    }

    /// Lowest-energy record seen, regardless of burn-in.
    pub fn min_energy_record(&self) -> Option<&SampleRecord> {
        self.best.as_ref()
    }

    /// Total attempted steps.
    pub fn num_attempted(&self) -> u64 {
        self.attempted
    }

    /// Accepted over attempted; zero before any attempt.
    pub fn acceptance_efficiency(&self) -> f64 {
        if self.attempted == 0 {
            0.0
        } else {
            self.accepted as f64 / self.attempted as f64
        }
    }

    /// Per-move-kind (attempted, accepted) tallies for kinds seen so far.
    pub fn acceptance_by_kind(&self) -> Vec<(MoveKind, u64, u64)> {
        MOVE_KINDS
            .iter()
            .enumerate()
            .filter(|(slot, _)| self.attempted_by_kind[*slot] > 0)
            .map(|(slot, &kind)| {
                (kind, self.attempted_by_kind[slot], self.accepted_by_kind[slot])
            })
            .collect()
    }

    /// Mean production energy; `None` with no production records.
    pub fn mean_energy(&self) -> Option<f64> {
        let (sum, count) = self
            .production_records()
            .fold((0.0, 0u64), |(sum, count), record| {
                (sum + record.energy, count + 1)
            });
        (count > 0).then(|| sum / count as f64)
    }

    /// Unbiased production energy variance; `None` below two records.
    pub fn energy_variance(&self) -> Option<f64> {
        let mean = self.mean_energy()?;
        let (sum_sq, count) = self
            .production_records()
            .fold((0.0, 0u64), |(sum_sq, count), record| {
                let dev = record.energy - mean;
                (sum_sq + dev * dev, count + 1)
            });
        (count > 1).then(|| sum_sq / (count - 1) as f64)
    }

    /// Per-dimension mean of production feature vectors.
    pub fn mean_features(&self) -> Option<Vec<f64>> {
        let mut sums: Option<Vec<f64>> = None;
        let mut count = 0u64;
        for record in self.production_records() {
            match &mut sums {
                None => sums = Some(record.features.clone()),
                Some(sums) => {
                    for (sum, feature) in sums.iter_mut().zip(&record.features) {
                        *sum += feature;
                    }
                }
            }
            count += 1;
        }
        sums.map(|mut sums| {
            for sum in &mut sums {
                *sum /= count as f64;
            }
            sums
        })
    }

    /// Drops all records and tallies, keeping the burn-in threshold.
    pub fn clear(&mut self) {
        let burn_in = self.burn_in;
        *self = Self::new(burn_in);
    }

    /// Serializes the container to a JSON string.
    pub fn to_json(&self) -> Result<String, CemcError> {
        serde_json::to_string(self).map_err(|err| {
            CemcError::Serde(
                ErrorInfo::new("container-encode", "failed to serialize sample container")
                    .with_context("cause", err.to_string()),
            )
        })
    }

    /// Restores a container from its JSON form.
    pub fn from_json(payload: &str) -> Result<Self, CemcError> {
        serde_json::from_str(payload).map_err(|err| {
            CemcError::Serde(
                ErrorInfo::new("container-decode", "failed to parse sample container")
                    .with_context("cause", err.to_string()),
            )
        })
    }

    /// Writes the container as JSON to `path`.
    pub fn save(&self, path: &Path) -> Result<(), CemcError> {
        let payload = self.to_json()?;
        fs::write(path, payload).map_err(|err| {
            CemcError::Serde(
                ErrorInfo::new("container-write", "failed to write sample container")
                    .with_context("path", path.display().to_string())
                    .with_context("cause", err.to_string()),
            )
        })
    }

    /// Reads a container previously written with [`SampleContainer::save`].
    pub fn load(path: &Path) -> Result<Self, CemcError> {
        let payload = fs::read_to_string(path).map_err(|err| {
            CemcError::Serde(
                ErrorInfo::new("container-read", "failed to read sample container")
                    .with_context("path", path.display().to_string())
                    .with_context("cause", err.to_string()),
            )
        })?;
        Self::from_json(&payload)
    }
}
