//! Observed cumulative case counts, one record per calendar day.
//!
//! A [`HistoricalSeries`] is owned by the caller: whoever fetches the data decides when to
//! refresh it and passes the current value into each forecast.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ForecastError;

/// Date formats accepted by [`parse_date`], tried in order.
const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%m/%d/%y"];

/// Parses a calendar day written either as `YYYY-MM-DD` or as `M/D/YY`
/// (the column headers of the Johns Hopkins CSSE time series).
///
/// # Errors
///
/// Returns `ForecastError::DateParseError` if neither format matches.
pub fn parse_date(value: &str) -> Result<NaiveDate, ForecastError> {
    let value = value.trim();
    let mut last_error = None;
    for format in DATE_FORMATS {
        match NaiveDate::parse_from_str(value, format) {
            Ok(date) => return Ok(date),
            Err(e) => last_error = Some(e),
        }
    }
    Err(last_error.map_or_else(
        || ForecastError::from(format!("unparseable date `{value}`")),
        ForecastError::from,
    ))
}

/// Cumulative counts reported up to and including `date`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoricalRecord {
    pub date: NaiveDate,
    pub num_confirmed: u64,
    pub num_recovered: u64,
    pub num_deaths: u64,
}

impl HistoricalRecord {
    /// Confirmed cases that have neither recovered nor died, or `None` when the record reports
    /// more recoveries and deaths than confirmed cases.
    #[must_use]
    pub fn active_cases(&self) -> Option<u64> {
        self.num_confirmed
            .checked_sub(self.num_recovered)?
            .checked_sub(self.num_deaths)
    }
}

#[derive(Debug, Deserialize)]
struct HistoricalRow {
    date: String,
    num_confirmed: u64,
    num_recovered: u64,
    num_deaths: u64,
}

/// A date-ordered series of [`HistoricalRecord`]s without duplicate dates.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HistoricalSeries {
    records: Vec<HistoricalRecord>,
}

impl HistoricalSeries {
    /// Builds a series, sorting the records by date.
    ///
    /// # Errors
    ///
    /// Returns `ForecastError::InvalidHistory` if two records share a date.
    pub fn new(mut records: Vec<HistoricalRecord>) -> Result<Self, ForecastError> {
        records.sort_by_key(|record| record.date);
        if let Some(pair) = records.windows(2).find(|pair| pair[0].date == pair[1].date) {
            return Err(ForecastError::InvalidHistory(format!(
                "duplicate records for {}",
                pair[0].date
            )));
        }
        Ok(HistoricalSeries { records })
    }

    /// Reads a series from CSV data with a
    /// `date,num_confirmed,num_recovered,num_deaths` header. Dates use either format accepted
    /// by [`parse_date`].
    ///
    /// # Errors
    ///
    /// Returns a `ForecastError` on malformed rows, unparseable dates or duplicate dates.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, ForecastError> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let mut records = Vec::new();
        for row in csv_reader.deserialize() {
            let row: HistoricalRow = row?;
            records.push(HistoricalRecord {
                date: parse_date(&row.date)?,
                num_confirmed: row.num_confirmed,
                num_recovered: row.num_recovered,
                num_deaths: row.num_deaths,
            });
        }
        Self::new(records)
    }

    /// Reads a series from a CSV file. See [`HistoricalSeries::from_csv_reader`].
    ///
    /// # Errors
    ///
    /// Returns a `ForecastError` if the file cannot be opened or parsed.
    pub fn from_csv_path(path: &Path) -> Result<Self, ForecastError> {
        Self::from_csv_reader(File::open(path)?)
    }

    /// The record for exactly `date`; there is no interpolation between days.
    #[must_use]
    pub fn get(&self, date: NaiveDate) -> Option<&HistoricalRecord> {
        self.records
            .binary_search_by_key(&date, |record| record.date)
            .ok()
            .map(|index| &self.records[index])
    }

    /// The most recent record.
    #[must_use]
    pub fn latest(&self) -> Option<&HistoricalRecord> {
        self.records.last()
    }

    /// The date the series was last updated, i.e. the date of its most recent record.
    #[must_use]
    pub fn last_updated(&self) -> Option<NaiveDate> {
        self.latest().map(|record| record.date)
    }

    #[must_use]
    pub fn records(&self) -> &[HistoricalRecord] {
        &self.records
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
