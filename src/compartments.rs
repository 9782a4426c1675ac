use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

/// The population of every compartment on one day.
///
/// `susceptible`, `exposed`, `infected` and `recovered` are continuous. `hospitalized` and
/// `dead` are whole numbers. `hospitalized` is a sub-count of `infected`, so the population
/// identity only covers the other five compartments.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompartmentState {
    pub date: NaiveDate,
    pub susceptible: f64,
    pub exposed: f64,
    pub infected: f64,
    pub recovered: f64,
    pub hospitalized: u64,
    pub dead: u64,
}

impl CompartmentState {
    /// `S + E + I + R + D`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn population(&self) -> f64 {
        self.susceptible + self.exposed + self.infected + self.recovered + self.dead as f64
    }

    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn value(&self, compartment: Compartment) -> f64 {
        match compartment {
            Compartment::Susceptible => self.susceptible,
            Compartment::Exposed => self.exposed,
            Compartment::Infected => self.infected,
            Compartment::Recovered => self.recovered,
            Compartment::Hospitalized => self.hospitalized as f64,
            Compartment::Dead => self.dead as f64,
        }
    }
}

/// Names a compartment, e.g. to select series for a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Compartment {
    Susceptible,
    Exposed,
    Infected,
    Recovered,
    Hospitalized,
    #[serde(rename = "Total Deaths")]
    Dead,
}

impl Compartment {
    pub const ALL: [Compartment; 6] = [
        Compartment::Susceptible,
        Compartment::Exposed,
        Compartment::Infected,
        Compartment::Recovered,
        Compartment::Hospitalized,
        Compartment::Dead,
    ];

    /// The series charted by default: what hospitals and the public watch.
    pub const CHARTED: [Compartment; 4] = [
        Compartment::Exposed,
        Compartment::Infected,
        Compartment::Hospitalized,
        Compartment::Dead,
    ];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Compartment::Susceptible => "Susceptible",
            Compartment::Exposed => "Exposed",
            Compartment::Infected => "Infected",
            Compartment::Recovered => "Recovered",
            Compartment::Hospitalized => "Hospitalized",
            Compartment::Dead => "Total Deaths",
        }
    }
}

impl Display for Compartment {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn population_excludes_hospitalized() {
        let state = CompartmentState {
            date: NaiveDate::from_ymd_opt(2020, 4, 1).unwrap(),
            susceptible: 990.0,
            exposed: 5.0,
            infected: 4.0,
            recovered: 0.5,
            hospitalized: 3,
            dead: 1,
        };
        assert_eq!(state.population(), 1000.5);
        assert_eq!(state.value(Compartment::Hospitalized), 3.0);
        assert_eq!(state.value(Compartment::Dead), 1.0);
    }

    #[test]
    fn names() {
        assert_eq!(Compartment::Dead.to_string(), "Total Deaths");
        assert_eq!(
            serde_json::to_string(&Compartment::Dead).unwrap(),
            "\"Total Deaths\""
        );
    }
}
