//! Run configuration schema and defaults.

use serde::{Deserialize, Serialize};

use cemc_core::{CemcError, ErrorInfo};

/// Parameters governing a sampling run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Number of MC steps to attempt (per schedule stage for annealing).
    pub steps: usize,
    /// Record every `thinning`-th attempted step.
    #[serde(default = "default_thinning")]
    pub thinning: usize,
    /// Step index below which records are excluded from aggregate
    /// statistics. Records themselves are retained.
    #[serde(default)]
    pub burn_in: usize,
    /// Temperature schedule for the run.
    #[serde(default)]
    pub schedule: TemperatureSchedule,
    /// Master seed and substream policy.
    #[serde(default)]
    pub seed_policy: SeedPolicy,
    /// Interval in steps between shadow delta-vs-full verification checks
    /// (0 disables the check).
    #[serde(default)]
    pub check_interval: usize,
}

fn default_thinning() -> usize {
    1
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            steps: 1000,
            thinning: 1,
            burn_in: 0,
            schedule: TemperatureSchedule::default(),
            seed_policy: SeedPolicy::default(),
            check_interval: 0,
        }
    }
}

impl RunConfig {
    /// Validates the configuration. Invalid values are fatal at setup.
    pub fn validate(&self) -> Result<(), CemcError> {
        if self.thinning == 0 {
            return Err(CemcError::Config(ErrorInfo::new(
                "zero-thinning",
                "thinning factor must be at least one",
            )));
        }
        match &self.schedule {
            TemperatureSchedule::Fixed { temperature } => check_temperature(*temperature)?,
            TemperatureSchedule::Anneal { temperatures } => {
                if temperatures.is_empty() {
                    return Err(CemcError::Config(ErrorInfo::new(
                        "empty-schedule",
                        "anneal schedule needs at least one temperature",
                    )));
                }
                for &temperature in temperatures {
                    check_temperature(temperature)?;
                }
            }
        }
        Ok(())
    }
}

fn check_temperature(temperature: f64) -> Result<(), CemcError> {
    if !temperature.is_finite() || temperature <= 0.0 {
        return Err(CemcError::Config(
            ErrorInfo::new("bad-temperature", "temperature must be positive and finite")
                .with_context("temperature", temperature.to_string()),
        ));
    }
    Ok(())
}

/// Supported temperature schedules.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum TemperatureSchedule {
    /// One temperature for the whole run.
    Fixed {
        /// Temperature in Kelvin.
        temperature: f64,
    },
    /// Simulated annealing: one sweep of `steps` per listed temperature,
    /// reusing the live occupancy between stages.
    Anneal {
        /// Ordered stage temperatures in Kelvin.
        temperatures: Vec<f64>,
    },
}

impl Default for TemperatureSchedule {
    fn default() -> Self {
        TemperatureSchedule::Fixed {
            temperature: default_temperature(),
        }
    }
}

fn default_temperature() -> f64 {
    1000.0
}

/// Deterministic seeding configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedPolicy {
    /// Master seed used for the run.
    #[serde(default = "default_master_seed")]
    pub master_seed: u64,
    /// Chain identifier mixed into substream derivation so parallel chains
    /// sharing a master seed draw independent streams.
    #[serde(default)]
    pub chain: u64,
}

fn default_master_seed() -> u64 {
    0x0CC0_0CC0_5A3B_17E5_u64
}

impl Default for SeedPolicy {
    fn default() -> Self {
        Self {
            master_seed: default_master_seed(),
            chain: 0,
        }
    }
}
