//! Chain driver: wires ensemble, processor, usher and kernel together.

use cemc_core::{CemcError, ErrorInfo, RngHandle};
use cemc_expansion::Processor;
use cemc_lattice::check_occupancy;

use crate::config::{RunConfig, TemperatureSchedule};
use crate::container::{SampleContainer, SampleRecord};
use crate::determinism::step_seed;
use crate::ensemble::Ensemble;
use crate::kernel::{ChainState, Kernel};
use crate::usher::Usher;

/// Tolerance for the shadow check between the incrementally maintained
/// feature vector and a full recomputation.
const DRIFT_TOL: f64 = 1e-8;

/// Owns one Markov chain and drives it through a configured run.
pub struct Sampler {
    ensemble: Ensemble,
    processor: Box<dyn Processor>,
    usher: Usher,
    kernel: Kernel,
    config: RunConfig,
    state: ChainState,
    container: SampleContainer,
    steps_attempted: u64,
}

impl Sampler {
    /// Builds a sampler from validated parts and an initial occupancy.
    pub fn new(
        ensemble: Ensemble,
        processor: Box<dyn Processor>,
        usher: Usher,
        kernel: Kernel,
        config: RunConfig,
        initial_occupancy: Vec<usize>,
    ) -> Result<Self, CemcError> {
        config.validate()?;
        check_occupancy(
            ensemble.sublattices(),
            ensemble.site_index(),
            &initial_occupancy,
        )?;
        let state = ChainState::new(processor.as_ref(), initial_occupancy)?;
        let container = SampleContainer::new(config.burn_in as u64);
        Ok(Self {
            ensemble,
            processor,
            usher,
            kernel,
            config,
            state,
            container,
            steps_attempted: 0,
        })
    }

    /// Runs the configured schedule from the current state.
    ///
    /// A fixed schedule runs one stage of `steps`; an anneal schedule runs
    /// `steps` at each listed temperature, carrying the occupancy between
    /// stages. Each attempted step draws a freshly derived per-step stream so
    /// a run split across multiple calls replays identically.
    pub fn run(&mut self) -> Result<(), CemcError> {
        match self.config.schedule.clone() {
            TemperatureSchedule::Fixed { temperature } => {
                self.apply_temperature(temperature)?;
                self.run_stage(self.config.steps)
            }
            TemperatureSchedule::Anneal { temperatures } => {
                for temperature in temperatures {
                    self.apply_temperature(temperature)?;
                    self.run_stage(self.config.steps)?;
                }
                Ok(())
            }
        }
    }

    /// Runs `steps` attempts at the kernel's current settings.
    pub fn run_stage(&mut self, steps: usize) -> Result<(), CemcError> {
        let seed_policy = self.config.seed_policy.clone();
        for _ in 0..steps {
            let seed = step_seed(seed_policy.master_seed, seed_policy.chain, self.steps_attempted);
            let mut rng = RngHandle::from_seed(seed);
            let outcome = self.kernel.single_step(
                &self.ensemble,
                self.processor.as_ref(),
                &self.usher,
                &mut self.state,
                &mut rng,
            )?;
            self.container.count_attempt(outcome.kind, outcome.accepted);
            self.steps_attempted += 1;
            if self.steps_attempted % self.config.thinning as u64 == 0 {
                self.container.push(SampleRecord {
                    step: self.steps_attempted,
                    temperature: self.kernel.temperature().unwrap_or(0.0),
                    occupancy: self.state.occupancy.clone(),
                    features: self.state.features.clone(),
                    energy: self.state.energy,
                    accepted: outcome.accepted,
                });
            }
            if self.config.check_interval > 0
                && self.steps_attempted % self.config.check_interval as u64 == 0
            {
                self.verify_state()?;
            }
        }
        Ok(())
    }

    /// Compares the incrementally maintained state against a full
    /// recomputation. Drift is fatal: it means the processor's incremental
    /// path disagrees with its definition.
    fn verify_state(&self) -> Result<(), CemcError> {
        let full = self.processor.feature_vector(&self.state.occupancy)?;
        let drift = full
            .iter()
            .zip(&self.state.features)
            .map(|(a, b)| (a - b).abs())
            .fold(0.0_f64, f64::max);
        if drift > DRIFT_TOL {
            return Err(CemcError::Sampling(
                ErrorInfo::new("feature-drift", "incremental features drifted from recomputation")
                    .with_context("step", self.steps_attempted.to_string())
                    .with_context("max_drift", drift.to_string())
                    .with_hint("the processor's feature_change path is inconsistent"),
            ));
        }
        Ok(())
    }

    /// Sets the kernel temperature when the kernel is thermal.
    fn apply_temperature(&mut self, temperature: f64) -> Result<(), CemcError> {
        if self.kernel.temperature().is_some() {
            self.kernel.set_temperature(temperature)?;
        }
        Ok(())
    }

    /// Runs `steps_per_stage` attempts at each listed temperature, carrying
    /// the live occupancy between stages. Ignores the configured schedule.
    pub fn anneal(&mut self, temperatures: &[f64], steps_per_stage: usize) -> Result<(), CemcError> {
        for &temperature in temperatures {
            self.apply_temperature(temperature)?;
            self.run_stage(steps_per_stage)?;
        }
        Ok(())
    }

    /// Restarts the chain from a fresh occupancy: drops samples and tallies,
    /// resets the step clock and recomputes the cached features and energy.
    pub fn reset(&mut self, initial_occupancy: Vec<usize>) -> Result<(), CemcError> {
        check_occupancy(
            self.ensemble.sublattices(),
            self.ensemble.site_index(),
            &initial_occupancy,
        )?;
        self.state = ChainState::new(self.processor.as_ref(), initial_occupancy)?;
        self.container.clear();
        self.steps_attempted = 0;
        Ok(())
    }

    /// Live chain state.
    pub fn state(&self) -> &ChainState {
        &self.state
    }

    /// Collected samples and statistics.
    pub fn container(&self) -> &SampleContainer {
        &self.container
    }

    /// The ensemble, e.g. to adjust chemical potentials between runs.
    pub fn ensemble_mut(&mut self) -> &mut Ensemble {
        &mut self.ensemble
    }

    /// The ensemble.
    pub fn ensemble(&self) -> &Ensemble {
        &self.ensemble
    }

    /// The acceptance kernel.
    pub fn kernel(&self) -> &Kernel {
        &self.kernel
    }

    /// Total attempted steps so far.
    pub fn steps_attempted(&self) -> u64 {
        self.steps_attempted
    }
}
