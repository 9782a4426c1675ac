use std::fmt::{self, Debug, Display};
use std::io;

use chrono::NaiveDate;

/// Provides `ForecastError` and maps other errors to it.
///
/// The domain variants carry the offending input so that callers can turn them into
/// user-facing messages without re-deriving anything.
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub enum ForecastError {
    IoError(io::Error),
    JsonError(serde_json::Error),
    CSVError(csv::Error),
    DateParseError(chrono::ParseError),
    /// The reference date has no record in the historical series.
    DateNotFound(NaiveDate),
    /// The derived initial susceptible count would be negative.
    PopulationUnderflow {
        total_population: u64,
        susceptible: f64,
    },
    InvalidParameters(String),
    InvalidHorizon(i64),
    /// Simulating `days` days from `start` would pass the last representable calendar day.
    HorizonOutOfRange {
        start: NaiveDate,
        days: u64,
    },
    MissingAgeBand(String),
    InvalidDemographics(String),
    InvalidHistory(String),
    ReportError(String),
    ForecastError(String),
}

impl From<io::Error> for ForecastError {
    fn from(error: io::Error) -> Self {
        ForecastError::IoError(error)
    }
}

impl From<serde_json::Error> for ForecastError {
    fn from(error: serde_json::Error) -> Self {
        ForecastError::JsonError(error)
    }
}

impl From<csv::Error> for ForecastError {
    fn from(error: csv::Error) -> Self {
        ForecastError::CSVError(error)
    }
}

impl From<chrono::ParseError> for ForecastError {
    fn from(error: chrono::ParseError) -> Self {
        ForecastError::DateParseError(error)
    }
}

impl From<String> for ForecastError {
    fn from(error: String) -> Self {
        ForecastError::ForecastError(error)
    }
}

impl From<&str> for ForecastError {
    fn from(error: &str) -> Self {
        ForecastError::ForecastError(error.to_string())
    }
}

impl std::error::Error for ForecastError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ForecastError::IoError(error) => Some(error),
            ForecastError::JsonError(error) => Some(error),
            ForecastError::CSVError(error) => Some(error),
            ForecastError::DateParseError(error) => Some(error),
            _ => None,
        }
    }
}

impl Display for ForecastError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ForecastError::DateNotFound(date) => {
                write!(f, "Error: no historical record for reference date {date}")
            }
            ForecastError::PopulationUnderflow {
                total_population,
                susceptible,
            } => write!(
                f,
                "Error: derived susceptible population {susceptible} is negative \
                 (total population {total_population})"
            ),
            ForecastError::InvalidParameters(message) => {
                write!(f, "Error: invalid model parameters: {message}")
            }
            ForecastError::InvalidHorizon(horizon) => {
                write!(f, "Error: horizon must be non-negative, got {horizon} days")
            }
            ForecastError::HorizonOutOfRange { start, days } => write!(
                f,
                "Error: a {days}-day horizon from {start} runs past the last representable date"
            ),
            ForecastError::MissingAgeBand(label) => {
                write!(f, "Error: demographic data is missing age band {label}")
            }
            _ => write!(f, "Error: {self:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_offending_input() {
        let date = NaiveDate::from_ymd_opt(2020, 4, 1).unwrap();
        assert_eq!(
            ForecastError::DateNotFound(date).to_string(),
            "Error: no historical record for reference date 2020-04-01"
        );
        assert_eq!(
            ForecastError::InvalidHorizon(-1).to_string(),
            "Error: horizon must be non-negative, got -1 days"
        );
        assert_eq!(
            ForecastError::HorizonOutOfRange {
                start: date,
                days: 200_000_000,
            }
            .to_string(),
            "Error: a 200000000-day horizon from 2020-04-01 runs past the last representable date"
        );
        assert_eq!(
            ForecastError::MissingAgeBand("80+".to_string()).to_string(),
            "Error: demographic data is missing age band 80+"
        );
    }

    #[test]
    fn io_errors_keep_their_source() {
        let error: ForecastError = io::Error::new(io::ErrorKind::NotFound, "gone").into();
        assert!(std::error::Error::source(&error).is_some());
        assert!(matches!(error, ForecastError::IoError(_)));
    }

    #[test]
    fn strings_convert_to_generic_errors() {
        let error: ForecastError = "something broke".into();
        assert!(matches!(error, ForecastError::ForecastError(message) if message == "something broke"));
    }
}
