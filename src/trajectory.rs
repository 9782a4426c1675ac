use chrono::NaiveDate;
use serde::Serialize;

use crate::compartments::{Compartment, CompartmentState};

/// One value of one compartment on one day, the "long" layout used for charting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrajectoryPoint {
    pub date: NaiveDate,
    pub variable: Compartment,
    pub value: f64,
}

/// The daily states of one simulation run, from the reference date through the last day of
/// the horizon. Never empty: day 0 is always present.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    states: Vec<CompartmentState>,
}

impl Trajectory {
    pub(crate) fn from_states(states: Vec<CompartmentState>) -> Self {
        debug_assert!(!states.is_empty());
        Trajectory { states }
    }

    #[must_use]
    pub fn states(&self) -> &[CompartmentState] {
        &self.states
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CompartmentState> {
        self.states.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    #[must_use]
    pub fn initial_state(&self) -> &CompartmentState {
        &self.states[0]
    }

    #[must_use]
    pub fn final_state(&self) -> &CompartmentState {
        &self.states[self.states.len() - 1]
    }

    /// The state on `date`, if the run covers it.
    #[must_use]
    pub fn on(&self, date: NaiveDate) -> Option<&CompartmentState> {
        let offset = usize::try_from((date - self.initial_state().date).num_days()).ok()?;
        self.states.get(offset)
    }

    /// The first day with the most people needing a hospital bed.
    #[must_use]
    pub fn peak_hospitalized(&self) -> &CompartmentState {
        self.states
            .iter()
            .reduce(|peak, state| {
                if state.hospitalized > peak.hospitalized {
                    state
                } else {
                    peak
                }
            })
            .unwrap_or(&self.states[0])
    }

    /// The first day on which more people need a bed than `capacity`.
    #[must_use]
    pub fn first_day_over_capacity(&self, capacity: u64) -> Option<NaiveDate> {
        self.states
            .iter()
            .find(|state| state.hospitalized > capacity)
            .map(|state| state.date)
    }

    /// The largest deviation of `S + E + I + R + D` from its day-0 value.
    ///
    /// Deaths are added to `D` without being removed from the living compartments, so this
    /// equals the deaths accrued over the run, up to floating point error.
    #[must_use]
    pub fn conservation_error(&self) -> f64 {
        let population = self.initial_state().population();
        self.states
            .iter()
            .map(|state| (state.population() - population).abs())
            .fold(0.0, f64::max)
    }

    /// Flattens the selected compartments into one point per day and compartment, ordered by
    /// compartment and then by date.
    #[must_use]
    pub fn melt(&self, compartments: &[Compartment]) -> Vec<TrajectoryPoint> {
        compartments
            .iter()
            .flat_map(|&variable| {
                self.states.iter().map(move |state| TrajectoryPoint {
                    date: state.date,
                    variable,
                    value: state.value(variable),
                })
            })
            .collect()
    }
}

impl<'a> IntoIterator for &'a Trajectory {
    type Item = &'a CompartmentState;
    type IntoIter = std::slice::Iter<'a, CompartmentState>;

    fn into_iter(self) -> Self::IntoIter {
        self.states.iter()
    }
}
