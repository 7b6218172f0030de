//! Acceptance kernels and in-place chain state.

use serde::{Deserialize, Serialize};

use cemc_core::{CemcError, ErrorInfo, RngHandle, BOLTZMANN_EV_K};
use cemc_expansion::Processor;

use crate::ensemble::Ensemble;
use crate::proposal::{MoveKind, Proposal};
use crate::usher::Usher;

/// Live state of one Markov chain, updated incrementally on acceptance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainState {
    /// Encoded occupancy, one species code per site.
    pub occupancy: Vec<usize>,
    /// Feature vector matching the occupancy.
    pub features: Vec<f64>,
    /// Energy matching the occupancy, in eV.
    pub energy: f64,
}

impl ChainState {
    /// Seeds the state from an occupancy, computing features and energy once.
    pub fn new(processor: &dyn Processor, occupancy: Vec<usize>) -> Result<Self, CemcError> {
        let features = processor.feature_vector(&occupancy)?;
        let energy = processor.energy(&occupancy)?;
        Ok(Self {
            occupancy,
            features,
            energy,
        })
    }
}

/// Outcome of a single attempted step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepOutcome {
    /// Whether the step was accepted and applied.
    pub accepted: bool,
    /// Whether the proposal was a null move (always counted as rejected).
    pub null: bool,
    /// Move family that produced the proposal.
    pub kind: MoveKind,
    /// Processor energy change of the proposal (zero for null moves).
    pub energy_delta: f64,
}

/// Acceptance rules for proposed steps. The set is closed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Kernel {
    /// Metropolis-Hastings at a fixed temperature.
    Metropolis {
        /// Temperature in Kelvin.
        temperature: f64,
    },
    /// Accepts every proposed step; samples the proposal distribution
    /// itself, useful for validating ushers.
    UniformlyRandom,
}

impl Kernel {
    /// Current temperature, if the kernel has one.
    pub fn temperature(&self) -> Option<f64> {
        match self {
            Kernel::Metropolis { temperature } => Some(*temperature),
            Kernel::UniformlyRandom => None,
        }
    }

    /// Sets the temperature; a no-op carrier error on athermal kernels.
    pub fn set_temperature(&mut self, new_temperature: f64) -> Result<(), CemcError> {
        match self {
            Kernel::Metropolis { temperature } => {
                if !new_temperature.is_finite() || new_temperature <= 0.0 {
                    return Err(CemcError::Config(
                        ErrorInfo::new("bad-temperature", "temperature must be positive and finite")
                            .with_context("temperature", new_temperature.to_string()),
                    ));
                }
                *temperature = new_temperature;
                Ok(())
            }
            Kernel::UniformlyRandom => Err(CemcError::Config(ErrorInfo::new(
                "athermal-kernel",
                "uniformly-random kernel has no temperature",
            ))),
        }
    }

    /// Attempts one step: propose, evaluate, decide, and on acceptance apply
    /// the step to `state` in place.
    ///
    /// Null proposals are evaluated as rejections so acceptance statistics
    /// stay comparable across move tables; they never surface as errors.
    pub fn single_step(
        &self,
        ensemble: &Ensemble,
        processor: &dyn Processor,
        usher: &Usher,
        state: &mut ChainState,
        rng: &mut RngHandle,
    ) -> Result<StepOutcome, CemcError> {
        let proposal = usher.propose(&state.occupancy, rng);
        if proposal.is_null() {
            return Ok(StepOutcome {
                accepted: false,
                null: true,
                kind: proposal.kind,
                energy_delta: 0.0,
            });
        }
        let feature_delta = processor.feature_change(&state.occupancy, &proposal.step)?;
        let energy_delta: f64 = processor
            .coefficients()
            .iter()
            .zip(&feature_delta)
            .map(|(c, d)| c * d)
            .sum();
        let delta = ensemble.acceptance_delta(energy_delta, &state.occupancy, &proposal.step)?;
        let accepted = self.decide(delta, &proposal, rng);
        if accepted {
            for flip in &proposal.step {
                state.occupancy[flip.site] = flip.code;
            }
            for (feature, change) in state.features.iter_mut().zip(&feature_delta) {
                *feature += change;
            }
            state.energy += energy_delta;
        }
        Ok(StepOutcome {
            accepted,
            null: false,
            kind: proposal.kind,
            energy_delta,
        })
    }

    fn decide(&self, delta: f64, proposal: &Proposal, rng: &mut RngHandle) -> bool {
        match self {
            Kernel::Metropolis { temperature } => {
                let exponent = -delta / (BOLTZMANN_EV_K * temperature) + proposal.log_ratio;
                exponent >= 0.0 || rng.uniform_f64() < exponent.exp()
            }
            Kernel::UniformlyRandom => true,
        }
    }
}
