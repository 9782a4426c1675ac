//! Derives the day-0 compartment populations from observed counts.
//!
//! Only a fraction of infections is ever confirmed (the reporting rate `RR`). For every
//! confirmed active case there are `(1 - RR) / RR` unreported ones, which are placed in the
//! exposed compartment.

use chrono::NaiveDate;

use crate::compartments::CompartmentState;
use crate::demographics::{DemographicProfile, Severity};
use crate::error::ForecastError;
use crate::history::HistoricalSeries;
use crate::log::{debug, warn};
use crate::numeric::round_half_even;
use crate::parameters::{check_reporting_rate, UnderflowPolicy};

/// Computes the compartment populations on `reference_date`. A susceptible count that would be
/// negative is an error; see [`estimate_initial_state_with_policy`] to clamp it instead.
///
/// # Errors
///
/// - `ForecastError::DateNotFound` if the series has no record for `reference_date`.
/// - `ForecastError::InvalidHistory` if the record has more recoveries and deaths than cases.
/// - `ForecastError::InvalidParameters` if `reporting_rate` is outside `(0, 1]`.
/// - `ForecastError::PopulationUnderflow` if the counts exceed `total_population`.
pub fn estimate_initial_state(
    historical_series: &HistoricalSeries,
    reference_date: NaiveDate,
    total_population: u64,
    reporting_rate: f64,
    demographic_profile: &DemographicProfile,
) -> Result<CompartmentState, ForecastError> {
    estimate_initial_state_with_policy(
        historical_series,
        reference_date,
        total_population,
        reporting_rate,
        demographic_profile,
        UnderflowPolicy::Reject,
    )
}

/// [`estimate_initial_state`] with an explicit choice of what to do when the derived
/// susceptible count is negative.
///
/// # Errors
///
/// As [`estimate_initial_state`], except that `UnderflowPolicy::ClampToZero` never reports
/// `ForecastError::PopulationUnderflow`.
#[allow(clippy::cast_precision_loss)]
pub fn estimate_initial_state_with_policy(
    historical_series: &HistoricalSeries,
    reference_date: NaiveDate,
    total_population: u64,
    reporting_rate: f64,
    demographic_profile: &DemographicProfile,
    underflow_policy: UnderflowPolicy,
) -> Result<CompartmentState, ForecastError> {
    check_reporting_rate(reporting_rate)?;
    let record = historical_series
        .get(reference_date)
        .ok_or(ForecastError::DateNotFound(reference_date))?;
    let active = record.active_cases().ok_or_else(|| {
        ForecastError::InvalidHistory(format!(
            "{} reports {} recovered and {} deaths for only {} confirmed cases",
            record.date, record.num_recovered, record.num_deaths, record.num_confirmed
        ))
    })?;

    let infected = active as f64;
    let unreported_per_case = (1.0 - reporting_rate) / reporting_rate;
    let exposed = round_half_even(infected * unreported_per_case);
    let recovered = record.num_recovered as f64;
    let dead = record.num_deaths;

    let mut susceptible = total_population as f64 - (exposed + infected + recovered + dead as f64);
    if susceptible < 0.0 {
        match underflow_policy {
            UnderflowPolicy::Reject => {
                return Err(ForecastError::PopulationUnderflow {
                    total_population,
                    susceptible,
                })
            }
            UnderflowPolicy::ClampToZero => {
                warn!(
                    "Susceptible population on {} would be {}; clamping to zero",
                    reference_date, susceptible
                );
                susceptible = 0.0;
            }
        }
    }

    let hospitalized = demographic_profile.severity_weighted_count(infected, Severity::Hospitalization);

    let state = CompartmentState {
        date: reference_date,
        susceptible,
        exposed,
        infected,
        recovered,
        hospitalized,
        dead,
    };
    debug!("Initial state on {}: {:?}", reference_date, state);
    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demographics::tests::uniform_profile;
    use crate::demographics::SeverityRates;
    use crate::history::HistoricalRecord;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 4, d).unwrap()
    }

    fn series() -> HistoricalSeries {
        HistoricalSeries::new(vec![
            HistoricalRecord {
                date: day(1),
                num_confirmed: 1_000,
                num_recovered: 200,
                num_deaths: 50,
            },
            HistoricalRecord {
                date: day(2),
                num_confirmed: 1_230,
                num_recovered: 250,
                num_deaths: 60,
            },
        ])
        .unwrap()
    }

    fn profile() -> DemographicProfile {
        uniform_profile(SeverityRates {
            hospitalization_rate: 0.1,
            hospitalized_death_rate: 0.01,
        })
    }

    #[test]
    fn derives_compartments_from_counts() {
        let state = estimate_initial_state(&series(), day(1), 100_000, 0.75, &profile()).unwrap();
        assert_eq!(state.date, day(1));
        assert_eq!(state.infected, 750.0);
        assert_eq!(state.exposed, 250.0);
        assert_eq!(state.recovered, 200.0);
        assert_eq!(state.dead, 50);
        assert_eq!(state.susceptible, 100_000.0 - 1_250.0);
        // 750 / 9 * 0.1 = 8.33 per band -> 8, nine bands.
        assert_eq!(state.hospitalized, 72);
        assert_eq!(state.population(), 100_000.0);
    }

    fn active_on_day_one(active: u64) -> HistoricalSeries {
        HistoricalSeries::new(vec![HistoricalRecord {
            date: day(1),
            num_confirmed: active + 10,
            num_recovered: 6,
            num_deaths: 4,
        }])
        .unwrap()
    }

    fn exposed_for(active: u64, reporting_rate: f64) -> f64 {
        estimate_initial_state(
            &active_on_day_one(active),
            day(1),
            100_000,
            reporting_rate,
            &profile(),
        )
        .unwrap()
        .exposed
    }

    #[test]
    fn exposed_is_rounded() {
        // 920 active, RR = 0.8: 920 * 0.25 = 230 exactly.
        let state = estimate_initial_state(&series(), day(2), 100_000, 0.8, &profile()).unwrap();
        assert_eq!(state.infected, 920.0);
        assert_eq!(state.exposed, 230.0);

        // 750 * (0.3 / 0.7) = 321.43
        assert_eq!(exposed_for(750, 0.7), 321.0);
        // 750 * (0.4 / 0.6) = 500
        assert_eq!(exposed_for(750, 0.6), 500.0);
    }

    #[test]
    fn exposed_uses_unreported_cases_per_case() {
        // (1 - 0.4) / 0.4 is just below 1.5 in binary, so 5 active cases give 7.4999... -> 7.
        assert_eq!(exposed_for(5, 0.4), 7.0);
    }

    #[test]
    fn exposed_ties_round_to_even() {
        // (1 - 0.08) / 0.08 = 11.5 exactly.
        assert_eq!(exposed_for(1, 0.08), 12.0);
        assert_eq!(exposed_for(3, 0.08), 34.0);
        assert_eq!(exposed_for(7, 0.08), 80.0);
    }

    #[test]
    fn missing_date() {
        let result = estimate_initial_state(&series(), day(9), 100_000, 0.75, &profile());
        assert!(matches!(result, Err(ForecastError::DateNotFound(d)) if d == day(9)));
    }

    #[test]
    fn population_underflow_is_surfaced() {
        let result = estimate_initial_state(&series(), day(1), 1_000, 0.75, &profile());
        match result {
            Err(ForecastError::PopulationUnderflow {
                total_population,
                susceptible,
            }) => {
                assert_eq!(total_population, 1_000);
                assert_eq!(susceptible, -250.0);
            }
            other => panic!("expected PopulationUnderflow, got {other:?}"),
        }
    }

    #[test]
    fn population_underflow_can_be_clamped() {
        let state = estimate_initial_state_with_policy(
            &series(),
            day(1),
            1_000,
            0.75,
            &profile(),
            UnderflowPolicy::ClampToZero,
        )
        .unwrap();
        assert_eq!(state.susceptible, 0.0);
        assert_eq!(state.infected, 750.0);
    }

    #[test]
    fn rejects_bad_inputs() {
        assert!(matches!(
            estimate_initial_state(&series(), day(1), 100_000, 0.0, &profile()),
            Err(ForecastError::InvalidParameters(_))
        ));

        let inconsistent = HistoricalSeries::new(vec![HistoricalRecord {
            date: day(1),
            num_confirmed: 10,
            num_recovered: 9,
            num_deaths: 2,
        }])
        .unwrap();
        assert!(matches!(
            estimate_initial_state(&inconsistent, day(1), 100_000, 0.75, &profile()),
            Err(ForecastError::InvalidHistory(_))
        ));
    }
}
