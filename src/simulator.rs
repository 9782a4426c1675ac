//! The compartment simulator: a discrete-time SEIR model with hospitalization and a
//! capacity-dependent mortality rule.
//!
//! Each day is advanced with one explicit Euler step of size one day, using only the previous
//! day's values:
//!
//! ```text
//! S' = S - beta S I / N
//! E' = E + beta S I / N - sigma E
//! I' = I + sigma E - gamma I
//! R' = R + gamma I
//! ```
//!
//! The number of people needing a hospital bed, `H'`, is the age-weighted share of `I'`. While
//! `H'` fits within the bed capacity, the day's deaths are the age-weighted in-hospital deaths of
//! `H'`. Beyond capacity, the admitted patients die at the age-weighted in-hospital rate and the
//! patients who cannot be admitted die at the flat critical death rate.
//!
//! `S`, `E`, `I` and `R` stay continuous; `H` and the daily deaths are rounded per age band
//! (half-to-even) and summed. Deaths are added to `D` without being taken out of `I`, so
//! `S + E + I + R` stays equal to its day-0 value while `S + E + I + R + D` grows by the deaths
//! accrued since day 0. See [`Trajectory::conservation_error`].

use crate::compartments::CompartmentState;
use crate::demographics::{DemographicProfile, Severity};
use crate::error::ForecastError;
use crate::log::{info, trace, warn};
use crate::numeric::round_count;
use crate::parameters::{check_critical_death_rate, Hyperparameters, ModelParameters};
use crate::trajectory::Trajectory;

/// Which mortality rule produced a day's deaths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MortalityRegime {
    /// Every patient needing a bed has one.
    WithinCapacity,
    /// Some patients are turned away and die at the critical death rate.
    OverCapacity,
}

/// The deaths added on one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeathToll {
    /// Deaths among hospitalized patients.
    pub admitted: u64,
    /// Deaths among patients who could not be admitted.
    pub overflow: u64,
    pub regime: MortalityRegime,
}

impl DeathToll {
    #[must_use]
    pub fn total(&self) -> u64 {
        self.admitted + self.overflow
    }
}

/// Holds everything that stays fixed during a run and advances states one day at a time.
#[derive(Debug, Clone, Copy)]
pub struct Simulator<'a> {
    population: f64,
    rates: Hyperparameters,
    profile: &'a DemographicProfile,
    hospital_bed_capacity: u64,
    critical_death_rate: f64,
}

impl<'a> Simulator<'a> {
    /// Prepares a run starting from `initial_state`. The total population `N` is fixed to
    /// `S + E + I + R + D` of the initial state.
    ///
    /// # Errors
    ///
    /// Returns `ForecastError::InvalidParameters` if the rates cannot be derived from
    /// `parameters`, if the critical death rate is not a probability or if the initial state
    /// holds no population.
    pub fn new(
        initial_state: &CompartmentState,
        parameters: &ModelParameters,
        profile: &'a DemographicProfile,
        hospital_bed_capacity: u64,
        critical_death_rate: f64,
    ) -> Result<Self, ForecastError> {
        let rates = parameters.hyperparameters()?;
        check_critical_death_rate(critical_death_rate)?;
        let population = initial_state.population();
        if !(population.is_finite() && population > 0.0) {
            return Err(ForecastError::InvalidParameters(format!(
                "initial state must hold a positive population, got {population}"
            )));
        }
        Ok(Simulator {
            population,
            rates,
            profile,
            hospital_bed_capacity,
            critical_death_rate,
        })
    }

    #[must_use]
    pub fn population(&self) -> f64 {
        self.population
    }

    #[must_use]
    pub fn rates(&self) -> Hyperparameters {
        self.rates
    }

    /// The deaths of one day given the number of people needing a hospital bed.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn deaths_for(&self, hospitalized: u64) -> DeathToll {
        if hospitalized <= self.hospital_bed_capacity {
            DeathToll {
                admitted: self
                    .profile
                    .severity_weighted_count(hospitalized as f64, Severity::HospitalizedDeath),
                overflow: 0,
                regime: MortalityRegime::WithinCapacity,
            }
        } else {
            let turned_away = (hospitalized - self.hospital_bed_capacity) as f64;
            DeathToll {
                admitted: self.profile.severity_weighted_count(
                    self.hospital_bed_capacity as f64,
                    Severity::HospitalizedDeath,
                ),
                overflow: round_count(turned_away * self.critical_death_rate),
                regime: MortalityRegime::OverCapacity,
            }
        }
    }

    /// Advances `state` by one day.
    ///
    /// # Errors
    ///
    /// Returns `ForecastError::HorizonOutOfRange` if `state.date` is the last representable
    /// calendar day.
    pub fn step(&self, state: &CompartmentState) -> Result<CompartmentState, ForecastError> {
        let date = state
            .date
            .succ_opt()
            .ok_or(ForecastError::HorizonOutOfRange {
                start: state.date,
                days: 1,
            })?;
        let Hyperparameters { beta, sigma, gamma } = self.rates;
        let CompartmentState {
            susceptible: s,
            exposed: e,
            infected: i,
            recovered: r,
            ..
        } = *state;

        let new_exposures = beta * s * i / self.population;
        let susceptible = s - new_exposures;
        let exposed = e + new_exposures - sigma * e;
        let infected = i + (sigma * e - gamma * i);
        let recovered = r + gamma * i;

        let hospitalized = self
            .profile
            .severity_weighted_count(infected, Severity::Hospitalization);
        let deaths = self.deaths_for(hospitalized);

        Ok(CompartmentState {
            date,
            susceptible,
            exposed,
            infected,
            recovered,
            hospitalized,
            dead: state.dead + deaths.total(),
        })
    }

    /// Runs `steps` days from `initial_state`. Day 0 of the result is `initial_state` itself.
    ///
    /// # Errors
    ///
    /// Returns `ForecastError::HorizonOutOfRange` if the run would pass the last representable
    /// calendar day. Nothing is simulated in that case.
    pub fn run(
        &self,
        initial_state: &CompartmentState,
        steps: usize,
    ) -> Result<Trajectory, ForecastError> {
        let days = u64::try_from(steps).unwrap_or(u64::MAX);
        if initial_state
            .date
            .checked_add_days(chrono::Days::new(days))
            .is_none()
        {
            return Err(ForecastError::HorizonOutOfRange {
                start: initial_state.date,
                days,
            });
        }

        let mut states = Vec::with_capacity(steps + 1);
        states.push(*initial_state);
        let mut over_capacity = initial_state.hospitalized > self.hospital_bed_capacity;
        for _ in 0..steps {
            let next = self.step(&states[states.len() - 1])?;
            trace!("{:?}", next);
            if !over_capacity && next.hospitalized > self.hospital_bed_capacity {
                warn!(
                    "Hospital demand of {} exceeds the {} available beds on {}",
                    next.hospitalized, self.hospital_bed_capacity, next.date
                );
            }
            over_capacity = next.hospitalized > self.hospital_bed_capacity;
            states.push(next);
        }
        Ok(Trajectory::from_states(states))
    }
}

/// Forecasts `parameters.horizon_days` days from `initial_state`.
///
/// # Errors
///
/// - `ForecastError::InvalidParameters` for a non-positive reproduction number, incubation
///   period or recovery period, a critical death rate outside `[0, 1]` or an empty initial state.
/// - `ForecastError::InvalidHorizon` for a negative horizon.
/// - `ForecastError::HorizonOutOfRange` for a horizon that runs past the last representable
///   date.
pub fn simulate(
    initial_state: &CompartmentState,
    parameters: &ModelParameters,
    demographic_profile: &DemographicProfile,
    hospital_bed_capacity: u64,
    critical_death_rate: f64,
) -> Result<Trajectory, ForecastError> {
    let simulator = Simulator::new(
        initial_state,
        parameters,
        demographic_profile,
        hospital_bed_capacity,
        critical_death_rate,
    )?;
    let steps = parameters.steps()?;

    let rates = simulator.rates();
    info!(
        "Simulating {} days from {} (N = {}, beta = {}, sigma = {}, gamma = {})",
        steps,
        initial_state.date,
        simulator.population(),
        rates.beta,
        rates.sigma,
        rates.gamma
    );
    let trajectory = simulator.run(initial_state, steps)?;
    let final_state = trajectory.final_state();
    info!(
        "Simulation finished on {} with {} total deaths",
        final_state.date, final_state.dead
    );
    Ok(trajectory)
}
