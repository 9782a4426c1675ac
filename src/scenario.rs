//! What-if comparisons: the same starting point simulated under several parameter sets.
//!
//! Runs share nothing mutable. The initial state and the demographic profile are borrowed
//! read-only by every run, so each scenario gets its own scoped thread.

use std::thread;

use crate::compartments::CompartmentState;
use crate::demographics::DemographicProfile;
use crate::error::ForecastError;
use crate::log::debug;
use crate::parameters::ModelParameters;
use crate::simulator::simulate;
use crate::trajectory::Trajectory;

#[derive(Debug, Clone, PartialEq)]
pub struct Scenario {
    pub name: String,
    pub parameters: ModelParameters,
}

impl Scenario {
    pub fn new(name: impl Into<String>, parameters: ModelParameters) -> Self {
        Scenario {
            name: name.into(),
            parameters,
        }
    }
}

#[derive(Debug)]
pub struct ScenarioOutcome {
    pub name: String,
    pub result: Result<Trajectory, ForecastError>,
}

/// Simulates every scenario from `initial_state`, one thread per scenario. Outcomes come back
/// in the order of `scenarios`; a failing scenario does not affect the others.
///
/// # Panics
///
/// Panics if a simulation thread panics.
#[must_use]
pub fn run_scenarios(
    initial_state: &CompartmentState,
    scenarios: &[Scenario],
    demographic_profile: &DemographicProfile,
    hospital_bed_capacity: u64,
    critical_death_rate: f64,
) -> Vec<ScenarioOutcome> {
    thread::scope(|scope| {
        let handles: Vec<_> = scenarios
            .iter()
            .map(|scenario| {
                scope.spawn(move || {
                    debug!("Running scenario {}", scenario.name);
                    ScenarioOutcome {
                        name: scenario.name.clone(),
                        result: simulate(
                            initial_state,
                            &scenario.parameters,
                            demographic_profile,
                            hospital_bed_capacity,
                            critical_death_rate,
                        ),
                    }
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|handle| handle.join().expect("Scenario thread panicked"))
            .collect()
    })
}
