//! Age-stratified demographic data: the share of the population in each age band and the
//! probability that an infection in that band leads to hospitalization, and that a hospitalized
//! patient in that band dies.
//!
//! A [`DemographicProfile`] is built once and then only read. It is `Send + Sync`, so one profile
//! can back any number of concurrent simulation runs.
//!
//! The severity rates shipped with the crate come from the Imperial College COVID-19 Response
//! Team report of 16 March 2020 ("Impact of non-pharmaceutical interventions (NPIs) to reduce
//! COVID-19 mortality and healthcare demand"), grouped by ten-year age band.

use std::fmt::{self, Display};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ForecastError;
use crate::log::debug;
use crate::numeric::round_count;
use crate::HashMap;

/// The fixed, ordered set of age bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AgeBandLabel {
    #[serde(rename = "0-9")]
    Age0To9,
    #[serde(rename = "10-19")]
    Age10To19,
    #[serde(rename = "20-29")]
    Age20To29,
    #[serde(rename = "30-39")]
    Age30To39,
    #[serde(rename = "40-49")]
    Age40To49,
    #[serde(rename = "50-59")]
    Age50To59,
    #[serde(rename = "60-69")]
    Age60To69,
    #[serde(rename = "70-79")]
    Age70To79,
    #[serde(rename = "80+")]
    Age80Plus,
}

impl AgeBandLabel {
    pub const ALL: [AgeBandLabel; 9] = [
        AgeBandLabel::Age0To9,
        AgeBandLabel::Age10To19,
        AgeBandLabel::Age20To29,
        AgeBandLabel::Age30To39,
        AgeBandLabel::Age40To49,
        AgeBandLabel::Age50To59,
        AgeBandLabel::Age60To69,
        AgeBandLabel::Age70To79,
        AgeBandLabel::Age80Plus,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AgeBandLabel::Age0To9 => "0-9",
            AgeBandLabel::Age10To19 => "10-19",
            AgeBandLabel::Age20To29 => "20-29",
            AgeBandLabel::Age30To39 => "30-39",
            AgeBandLabel::Age40To49 => "40-49",
            AgeBandLabel::Age50To59 => "50-59",
            AgeBandLabel::Age60To69 => "60-69",
            AgeBandLabel::Age70To79 => "70-79",
            AgeBandLabel::Age80Plus => "80+",
        }
    }
}

impl Display for AgeBandLabel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgeBandLabel {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label = s.trim();
        AgeBandLabel::ALL
            .into_iter()
            .find(|band| band.as_str() == label)
            .ok_or_else(|| ForecastError::InvalidDemographics(format!("unknown age band `{label}`")))
    }
}

/// The two disease-severity rates of one age band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeverityRates {
    pub hospitalization_rate: f64,
    pub hospitalized_death_rate: f64,
}

/// Selects which severity rate weights a count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Hospitalization,
    HospitalizedDeath,
}

/// Hospitalization and in-hospital fatality rates by age band, Imperial College report of
/// 16 March 2020.
#[must_use]
pub fn imperial_college_severity_rates() -> [(AgeBandLabel, SeverityRates); 9] {
    const HOSPITALIZATION: [f64; 9] = [
        0.001, 0.003, 0.012, 0.032, 0.049, 0.102, 0.166, 0.243, 0.273,
    ];
    const HOSPITALIZED_DEATH: [f64; 9] = [
        0.00002, 0.00006, 0.0003, 0.0008, 0.0015, 0.006, 0.022, 0.051, 0.093,
    ];
    std::array::from_fn(|i| {
        (
            AgeBandLabel::ALL[i],
            SeverityRates {
                hospitalization_rate: HOSPITALIZATION[i],
                hospitalized_death_rate: HOSPITALIZED_DEATH[i],
            },
        )
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgeBand {
    pub label: AgeBandLabel,
    pub population: u64,
    /// `population` divided by the population of all bands.
    pub distribution: f64,
    pub hospitalization_rate: f64,
    pub hospitalized_death_rate: f64,
}

impl AgeBand {
    fn rate(&self, severity: Severity) -> f64 {
        match severity {
            Severity::Hospitalization => self.hospitalization_rate,
            Severity::HospitalizedDeath => self.hospitalized_death_rate,
        }
    }
}

/// One row of an age-pyramid CSV (`Age,population`).
#[derive(Debug, Deserialize)]
struct AgeDataRow {
    #[serde(rename = "Age", alias = "age")]
    age: String,
    population: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DemographicProfile {
    // Always one entry per `AgeBandLabel::ALL`, in that order.
    bands: Vec<AgeBand>,
    total_population: u64,
}

impl DemographicProfile {
    /// Builds a profile from raw band populations and per-band severity rates.
    ///
    /// # Errors
    ///
    /// - `ForecastError::MissingAgeBand` if a band of the fixed label set has no population or
    ///   no rates.
    /// - `ForecastError::InvalidDemographics` for duplicated bands, zero populations and rates
    ///   outside `[0, 1]`.
    pub fn new(
        populations: &[(AgeBandLabel, u64)],
        rates: &[(AgeBandLabel, SeverityRates)],
    ) -> Result<Self, ForecastError> {
        let populations = index_by_label(populations, "population")?;
        let rates = index_by_label(rates, "severity rates")?;

        let mut total_population: u64 = 0;
        for label in AgeBandLabel::ALL {
            let population = *populations
                .get(&label)
                .ok_or_else(|| ForecastError::MissingAgeBand(label.to_string()))?;
            if population == 0 {
                return Err(ForecastError::InvalidDemographics(format!(
                    "age band {label} has no population"
                )));
            }
            total_population += population;
        }

        let mut bands = Vec::with_capacity(AgeBandLabel::ALL.len());
        for label in AgeBandLabel::ALL {
            let band_rates = rates
                .get(&label)
                .ok_or_else(|| ForecastError::MissingAgeBand(label.to_string()))?;
            check_rate(label, "hospitalization rate", band_rates.hospitalization_rate)?;
            check_rate(
                label,
                "hospitalized death rate",
                band_rates.hospitalized_death_rate,
            )?;
            let population = populations[&label];
            #[allow(clippy::cast_precision_loss)]
            let distribution = population as f64 / total_population as f64;
            bands.push(AgeBand {
                label,
                population,
                distribution,
                hospitalization_rate: band_rates.hospitalization_rate,
                hospitalized_death_rate: band_rates.hospitalized_death_rate,
            });
        }

        debug!(
            "Built demographic profile over {} people in {} age bands",
            total_population,
            bands.len()
        );
        Ok(DemographicProfile {
            bands,
            total_population,
        })
    }

    /// Builds a profile from band populations and the built-in severity rates.
    ///
    /// # Errors
    ///
    /// See [`DemographicProfile::new`].
    pub fn from_populations(populations: &[(AgeBandLabel, u64)]) -> Result<Self, ForecastError> {
        Self::new(populations, &imperial_college_severity_rates())
    }

    /// Reads band populations from CSV data with an `Age,population` header and combines them
    /// with the built-in severity rates.
    ///
    /// # Errors
    ///
    /// Returns a `ForecastError` if the CSV cannot be parsed, names an unknown band, or does not
    /// cover every band.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, ForecastError> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let mut populations = Vec::new();
        for row in csv_reader.deserialize() {
            let row: AgeDataRow = row?;
            populations.push((row.age.parse::<AgeBandLabel>()?, row.population));
        }
        Self::from_populations(&populations)
    }

    /// Reads band populations from a CSV file. See [`DemographicProfile::from_csv_reader`].
    ///
    /// # Errors
    ///
    /// Returns a `ForecastError` if the file cannot be opened or parsed.
    pub fn from_csv_path(path: &Path) -> Result<Self, ForecastError> {
        Self::from_csv_reader(File::open(path)?)
    }

    #[must_use]
    pub fn bands(&self) -> &[AgeBand] {
        &self.bands
    }

    #[must_use]
    pub fn band(&self, label: AgeBandLabel) -> &AgeBand {
        // `bands` is laid out in `AgeBandLabel::ALL` order.
        &self.bands[label as usize]
    }

    #[must_use]
    pub fn total_population(&self) -> u64 {
        self.total_population
    }

    /// Spreads `total` over the age bands by population share, weights each band by the selected
    /// severity rate and sums the per-band counts. Each band is rounded on its own before the
    /// sum, which is not the same as rounding the weighted total.
    #[must_use]
    pub fn severity_weighted_count(&self, total: f64, severity: Severity) -> u64 {
        self.bands
            .iter()
            .map(|band| round_count(total * band.distribution * band.rate(severity)))
            .sum()
    }
}

fn index_by_label<T: Copy>(
    entries: &[(AgeBandLabel, T)],
    what: &str,
) -> Result<HashMap<AgeBandLabel, T>, ForecastError> {
    let mut indexed = HashMap::default();
    for (label, value) in entries {
        if indexed.insert(*label, *value).is_some() {
            return Err(ForecastError::InvalidDemographics(format!(
                "duplicated {what} for age band {label}"
            )));
        }
    }
    Ok(indexed)
}

fn check_rate(label: AgeBandLabel, name: &str, rate: f64) -> Result<(), ForecastError> {
    if (0.0..=1.0).contains(&rate) {
        Ok(())
    } else {
        Err(ForecastError::InvalidDemographics(format!(
            "{name} for age band {label} must lie in [0, 1], got {rate}"
        )))
    }
}
