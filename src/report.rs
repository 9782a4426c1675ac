//! Writes forecasts to CSV.
//!
//! Two layouts are available: [`ReportLayout::Wide`] writes one row per day with a column per
//! compartment, [`ReportLayout::Long`] writes one `date,variable,value` row per day and selected
//! compartment, which is the shape charting libraries expect.

use std::ffi::OsStr;
use std::fs::{create_dir_all, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use csv::Writer;

use crate::compartments::Compartment;
use crate::error::ForecastError;
use crate::log::info;
use crate::trajectory::Trajectory;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportLayout {
    Wide,
    /// Only the listed compartments, in the listed order.
    Long(Vec<Compartment>),
}

impl ReportLayout {
    /// The long layout with the series charted by default.
    #[must_use]
    pub fn charted() -> Self {
        ReportLayout::Long(Compartment::CHARTED.to_vec())
    }
}

/// Where report files go and how they are named.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportOptions {
    pub directory: PathBuf,
    pub file_prefix: String,
    /// Replace existing files instead of failing.
    pub overwrite: bool,
}

impl Default for ReportOptions {
    fn default() -> Self {
        ReportOptions {
            directory: PathBuf::from("."),
            file_prefix: String::new(),
            overwrite: false,
        }
    }
}

impl ReportOptions {
    pub fn directory(&mut self, directory: PathBuf) -> &mut Self {
        self.directory = directory;
        self
    }

    pub fn file_prefix(&mut self, file_prefix: String) -> &mut Self {
        self.file_prefix = file_prefix;
        self
    }

    pub fn overwrite(&mut self, overwrite: bool) -> &mut Self {
        self.overwrite = overwrite;
        self
    }

    /// `<directory>/<file_prefix><short_name>.csv`
    #[must_use]
    pub fn path_for(&self, short_name: &str) -> PathBuf {
        self.directory
            .join(format!("{}{}.csv", self.file_prefix, short_name))
    }
}

// Checks that the path names a CSV file, creates missing parent directories and refuses to
// clobber an existing file unless `overwrite` is set.
fn generate_validate_filepath(path: &Path, overwrite: bool) -> Result<File, ForecastError> {
    match path.extension().and_then(OsStr::to_str) {
        Some("csv") => {
            if let Some(parent) = path.parent() {
                create_dir_all(parent)?;
            }
            if path.exists() && !overwrite {
                return Err(ForecastError::ReportError(format!(
                    "{} already exists; set overwrite to replace it",
                    path.display()
                )));
            }
            Ok(File::create(path)?)
        }
        _ => Err(ForecastError::ReportError(
            "Report output files must be CSVs at this time".to_string(),
        )),
    }
}

/// Serializes `trajectory` in the given layout, with a header row.
///
/// # Errors
///
/// Returns `ForecastError::CSVError` or `ForecastError::IoError` if writing fails.
pub fn write_trajectory<W: Write>(
    writer: W,
    trajectory: &Trajectory,
    layout: &ReportLayout,
) -> Result<(), ForecastError> {
    let mut writer = Writer::from_writer(writer);
    match layout {
        ReportLayout::Wide => {
            for state in trajectory {
                writer.serialize(state)?;
            }
        }
        ReportLayout::Long(compartments) => {
            for point in trajectory.melt(compartments) {
                writer.serialize(point)?;
            }
        }
    }
    writer.flush()?;
    Ok(())
}

/// Writes `trajectory` to `options.path_for(short_name)` and returns that path.
///
/// # Errors
///
/// Returns `ForecastError::ReportError` for a non-CSV path or an existing file without
/// `overwrite`, and I/O or CSV errors from writing.
pub fn write_trajectory_file(
    options: &ReportOptions,
    short_name: &str,
    trajectory: &Trajectory,
    layout: &ReportLayout,
) -> Result<PathBuf, ForecastError> {
    let path = options.path_for(short_name);
    let file = generate_validate_filepath(&path, options.overwrite)?;
    write_trajectory(file, trajectory, layout)?;
    info!("Wrote {} days of forecast to {}", trajectory.len(), path.display());
    Ok(path)
}
