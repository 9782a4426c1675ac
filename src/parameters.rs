//! Model parameters and forecast configuration.
//!
//! [`ModelParameters`] are the epidemiological inputs a user varies between runs. The rates the
//! simulator actually uses ([`Hyperparameters`]) are derived from them on every run.
//! [`ForecastConfig`] bundles the parameters with the fixed constants of a forecast (population,
//! reporting rate, bed capacity, critical death rate) and can be loaded from JSON.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ForecastError;

/// Population of Canada, 2019.
pub const DEFAULT_TOTAL_POPULATION: u64 = 37_411_038;
/// Assumed fraction of true infections that are confirmed.
pub const DEFAULT_REPORTING_RATE: f64 = 0.75;
/// Hospital beds available in Canada.
pub const DEFAULT_HOSPITAL_BED_CAPACITY: u64 = 93_527;
/// Mortality of critically ill patients who cannot be admitted
/// (Emerging Infectious Diseases 26(6), "Estimating Risk for Death from COVID-19").
pub const DEFAULT_CRITICAL_DEATH_RATE: f64 = 0.12;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelParameters {
    /// Expected secondary infections caused by one infected person.
    pub reproduction_number: f64,
    pub incubation_period_days: f64,
    pub recovery_period_days: f64,
    /// Number of days to simulate after the reference date.
    pub horizon_days: i64,
}

impl Default for ModelParameters {
    fn default() -> Self {
        ModelParameters {
            reproduction_number: 2.5,
            incubation_period_days: 5.0,
            recovery_period_days: 10.0,
            horizon_days: 180,
        }
    }
}

/// Rates of the compartment model, per day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hyperparameters {
    /// Transmission rate.
    pub beta: f64,
    /// Incubation rate, E -> I.
    pub sigma: f64,
    /// Recovery rate, I -> R.
    pub gamma: f64,
}

impl ModelParameters {
    /// Derives `sigma = 1 / incubation`, `gamma = 1 / recovery` and `beta = R * gamma`.
    ///
    /// # Errors
    ///
    /// Returns `ForecastError::InvalidParameters` if the reproduction number or either period
    /// is not a positive finite number.
    pub fn hyperparameters(&self) -> Result<Hyperparameters, ForecastError> {
        check_positive("reproduction_number", self.reproduction_number)?;
        check_positive("incubation_period_days", self.incubation_period_days)?;
        check_positive("recovery_period_days", self.recovery_period_days)?;

        let sigma = 1.0 / self.incubation_period_days;
        let gamma = 1.0 / self.recovery_period_days;
        Ok(Hyperparameters {
            beta: self.reproduction_number * gamma,
            sigma,
            gamma,
        })
    }

    /// The horizon as a number of steps.
    ///
    /// # Errors
    ///
    /// Returns `ForecastError::InvalidHorizon` if `horizon_days` is negative.
    pub fn steps(&self) -> Result<usize, ForecastError> {
        usize::try_from(self.horizon_days).map_err(|_| ForecastError::InvalidHorizon(self.horizon_days))
    }
}

fn check_positive(name: &str, value: f64) -> Result<(), ForecastError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ForecastError::InvalidParameters(format!(
            "{name} must be a positive number, got {value}"
        )))
    }
}

/// Validates a critical death rate: a finite probability.
///
/// # Errors
///
/// Returns `ForecastError::InvalidParameters` outside `[0, 1]`.
pub fn check_critical_death_rate(rate: f64) -> Result<(), ForecastError> {
    if (0.0..=1.0).contains(&rate) {
        Ok(())
    } else {
        Err(ForecastError::InvalidParameters(format!(
            "critical_death_rate must lie in [0, 1], got {rate}"
        )))
    }
}

/// Validates a reporting rate: the fraction of infections that are confirmed.
///
/// # Errors
///
/// Returns `ForecastError::InvalidParameters` outside `(0, 1]`.
pub fn check_reporting_rate(rate: f64) -> Result<(), ForecastError> {
    if rate > 0.0 && rate <= 1.0 {
        Ok(())
    } else {
        Err(ForecastError::InvalidParameters(format!(
            "reporting_rate must lie in (0, 1], got {rate}"
        )))
    }
}

/// What to do when the historical counts exceed the total population.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnderflowPolicy {
    /// Fail with `ForecastError::PopulationUnderflow`.
    #[default]
    Reject,
    /// Start with zero susceptible people.
    ClampToZero,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ForecastConfig {
    pub total_population: u64,
    pub reporting_rate: f64,
    pub hospital_bed_capacity: u64,
    pub critical_death_rate: f64,
    pub population_underflow: UnderflowPolicy,
    pub model: ModelParameters,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        ForecastConfig {
            total_population: DEFAULT_TOTAL_POPULATION,
            reporting_rate: DEFAULT_REPORTING_RATE,
            hospital_bed_capacity: DEFAULT_HOSPITAL_BED_CAPACITY,
            critical_death_rate: DEFAULT_CRITICAL_DEATH_RATE,
            population_underflow: UnderflowPolicy::Reject,
            model: ModelParameters::default(),
        }
    }
}

impl ForecastConfig {
    /// Loads a configuration from a JSON file. Missing fields take their default values.
    /// Values are not checked here, so that overrides can still be applied; call
    /// [`ForecastConfig::validate`] before running.
    ///
    /// # Errors
    ///
    /// Returns a `ForecastError` if the file cannot be read or parsed.
    pub fn from_json_file(path: &Path) -> Result<Self, ForecastError> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }

    /// Checks every value that a run would otherwise reject later.
    ///
    /// # Errors
    ///
    /// Returns `ForecastError::InvalidParameters` or `ForecastError::InvalidHorizon`.
    pub fn validate(&self) -> Result<(), ForecastError> {
        if self.total_population == 0 {
            return Err(ForecastError::InvalidParameters(
                "total_population must be positive".to_string(),
            ));
        }
        check_reporting_rate(self.reporting_rate)?;
        check_critical_death_rate(self.critical_death_rate)?;
        self.model.hyperparameters()?;
        self.model.steps()?;
        Ok(())
    }
}
