//! Command line front end: loads the inputs named on the command line, runs one forecast and
//! reports it.
use std::io::Write;
use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Command, FromArgMatches as _};

use crate::demographics::DemographicProfile;
use crate::error::ForecastError;
use crate::history::{parse_date, HistoricalSeries};
use crate::initial_state::estimate_initial_state_with_policy;
use crate::log::{configure_logging, info};
use crate::parameters::ForecastConfig;
use crate::report::{write_trajectory_file, ReportLayout, ReportOptions};
use crate::simulator::simulate;
use crate::trajectory::Trajectory;

/// Default cli arguments for the forecaster
#[derive(Args, Debug)]
pub struct BaseArgs {
    /// CSV of cumulative counts: date,num_confirmed,num_recovered,num_deaths
    #[arg(long)]
    pub history: PathBuf,

    /// CSV of population by age band: Age,population
    #[arg(long)]
    pub demographics: PathBuf,

    /// Optional path for a forecast config file (JSON)
    #[arg(short, long, default_value = "")]
    pub config: String,

    /// Day to start the forecast from (YYYY-MM-DD or M/D/YY). Defaults to the last day of the
    /// history
    #[arg(short = 'd', long)]
    pub reference_date: Option<String>,

    /// Overrides the horizon of the config file
    #[arg(long, allow_hyphen_values = true)]
    pub horizon_days: Option<i64>,

    /// Optional directory for the forecast CSV
    #[arg(short, long, default_value = "")]
    pub output_dir: String,

    /// Prefix for the forecast file name
    #[arg(long, default_value = "")]
    pub file_prefix: String,

    /// Write date,variable,value rows for the charted compartments instead of one row per day
    #[arg(long)]
    pub long_format: bool,

    /// Replace an existing forecast file
    #[arg(long)]
    pub overwrite: bool,

    /// Enable logging: a level (error, warn, info, debug, trace) optionally followed by
    /// per-module levels, e.g. `warn,seir_forecast::simulator=trace`
    #[arg(long)]
    pub log_level: Option<String>,
}

/// Everything one invocation produced.
#[derive(Debug)]
pub struct Forecast {
    pub config: ForecastConfig,
    pub trajectory: Trajectory,
    pub report_path: Option<PathBuf>,
}

fn create_cli() -> Command {
    let cli = Command::new("seir-forecast")
        .about("Forecasts an epidemic from observed case counts with a hospital-capacity SEIR model");
    BaseArgs::augment_args(cli)
}

/// Parses the process arguments, runs the forecast and prints a summary to stdout.
///
/// # Errors
///
/// Returns an error if argument parsing, loading the inputs, the forecast or writing the
/// report fails.
pub fn run_with_args() -> Result<Forecast, Box<dyn std::error::Error>> {
    let matches = create_cli().get_matches();
    let args = BaseArgs::from_arg_matches(&matches)?;
    let forecast = run_with_args_internal(args)?;
    write_summary(&mut std::io::stdout().lock(), &forecast)?;
    Ok(forecast)
}

fn reference_date(
    args: &BaseArgs,
    series: &HistoricalSeries,
) -> Result<NaiveDate, ForecastError> {
    match &args.reference_date {
        Some(date) => parse_date(date),
        None => series
            .last_updated()
            .ok_or_else(|| ForecastError::InvalidHistory("the historical series is empty".into())),
    }
}

fn run_with_args_internal(args: BaseArgs) -> Result<Forecast, ForecastError> {
    if let Some(directives) = &args.log_level {
        configure_logging(directives)?;
    }

    let mut config = if args.config.is_empty() {
        ForecastConfig::default()
    } else {
        info!("Loading forecast config from: {}", args.config);
        ForecastConfig::from_json_file(&PathBuf::from(&args.config))?
    };
    if let Some(horizon_days) = args.horizon_days {
        config.model.horizon_days = horizon_days;
    }
    config.validate()?;

    let series = HistoricalSeries::from_csv_path(&args.history)?;
    let profile = DemographicProfile::from_csv_path(&args.demographics)?;
    let reference_date = reference_date(&args, &series)?;
    info!(
        "Loaded {} days of history (last updated {:?})",
        series.len(),
        series.last_updated()
    );

    let initial_state = estimate_initial_state_with_policy(
        &series,
        reference_date,
        config.total_population,
        config.reporting_rate,
        &profile,
        config.population_underflow,
    )?;
    let trajectory = simulate(
        &initial_state,
        &config.model,
        &profile,
        config.hospital_bed_capacity,
        config.critical_death_rate,
    )?;

    let report_path = if args.output_dir.is_empty() {
        None
    } else {
        let mut options = ReportOptions::default();
        options
            .directory(PathBuf::from(&args.output_dir))
            .file_prefix(args.file_prefix.clone())
            .overwrite(args.overwrite);
        let layout = if args.long_format {
            ReportLayout::charted()
        } else {
            ReportLayout::Wide
        };
        Some(write_trajectory_file(
            &options,
            "forecast",
            &trajectory,
            &layout,
        )?)
    };

    Ok(Forecast {
        config,
        trajectory,
        report_path,
    })
}

fn write_summary<W: Write>(out: &mut W, forecast: &Forecast) -> Result<(), ForecastError> {
    let trajectory = &forecast.trajectory;
    let first = trajectory.initial_state();
    let last = trajectory.final_state();
    let peak = trajectory.peak_hospitalized();
    let capacity = forecast.config.hospital_bed_capacity;

    writeln!(
        out,
        "Forecast from {} to {} ({} days)",
        first.date,
        last.date,
        trajectory.len() - 1
    )?;
    writeln!(out, "Total deaths: {}", last.dead)?;
    writeln!(
        out,
        "Peak hospitalized: {} on {}",
        peak.hospitalized, peak.date
    )?;
    match trajectory.first_day_over_capacity(capacity) {
        Some(date) => writeln!(out, "Hospital capacity of {capacity} beds exceeded on {date}")?,
        None => writeln!(out, "Hospital capacity of {capacity} beds not exceeded")?,
    }
    if let Some(path) = &forecast.report_path {
        writeln!(out, "Forecast written to {}", path.display())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demographics::AgeBandLabel;
    use std::fs;
    use tempfile::{tempdir, TempDir};

    struct Inputs {
        dir: TempDir,
        history: PathBuf,
        demographics: PathBuf,
        config: PathBuf,
    }

    fn inputs() -> Inputs {
        let dir = tempdir().unwrap();
        let history = dir.path().join("history.csv");
        fs::write(
            &history,
            "date,num_confirmed,num_recovered,num_deaths\n\
             2020-04-01,1000,200,50\n\
             2020-04-02,1300,260,60\n",
        )
        .unwrap();

        let demographics = dir.path().join("age_data.csv");
        let mut csv = String::from("Age,population\n");
        for label in AgeBandLabel::ALL {
            csv.push_str(&format!("{label},100000\n"));
        }
        fs::write(&demographics, csv).unwrap();

        let config = dir.path().join("config.json");
        fs::write(
            &config,
            r#"{
                "total_population": 900000,
                "hospital_bed_capacity": 50,
                "model": {
                    "reproduction_number": 2.5,
                    "incubation_period_days": 5.0,
                    "recovery_period_days": 10.0,
                    "horizon_days": 60
                }
            }"#,
        )
        .unwrap();

        Inputs {
            dir,
            history,
            demographics,
            config,
        }
    }

    fn args(inputs: &Inputs) -> BaseArgs {
        BaseArgs {
            history: inputs.history.clone(),
            demographics: inputs.demographics.clone(),
            config: inputs.config.to_str().unwrap().to_string(),
            reference_date: None,
            horizon_days: None,
            output_dir: String::new(),
            file_prefix: String::new(),
            long_format: false,
            overwrite: false,
            log_level: None,
        }
    }

    #[test]
    fn defaults_to_last_day_of_history() {
        let inputs = inputs();
        let forecast = run_with_args_internal(args(&inputs)).unwrap();
        let first = forecast.trajectory.initial_state();
        assert_eq!(first.date, NaiveDate::from_ymd_opt(2020, 4, 2).unwrap());
        assert_eq!(first.infected, 980.0);
        assert_eq!(forecast.trajectory.len(), 61);
        assert_eq!(forecast.config.hospital_bed_capacity, 50);
        assert!(forecast.report_path.is_none());
    }

    #[test]
    fn reference_date_and_horizon_from_arguments() {
        let inputs = inputs();
        let mut args = args(&inputs);
        args.reference_date = Some("4/1/20".to_string());
        args.horizon_days = Some(5);
        let forecast = run_with_args_internal(args).unwrap();
        assert_eq!(
            forecast.trajectory.initial_state().date,
            NaiveDate::from_ymd_opt(2020, 4, 1).unwrap()
        );
        assert_eq!(forecast.trajectory.len(), 6);
    }

    #[test]
    fn surfaces_input_errors() {
        let inputs = inputs();
        let mut missing_day = args(&inputs);
        missing_day.reference_date = Some("2020-05-01".to_string());
        assert!(matches!(
            run_with_args_internal(missing_day),
            Err(ForecastError::DateNotFound(_))
        ));

        let mut negative = args(&inputs);
        negative.horizon_days = Some(-1);
        assert!(matches!(
            run_with_args_internal(negative),
            Err(ForecastError::InvalidHorizon(-1))
        ));

        let mut no_config = args(&inputs);
        no_config.config = inputs.dir.path().join("missing.json").to_str().unwrap().to_string();
        assert!(matches!(
            run_with_args_internal(no_config),
            Err(ForecastError::IoError(_))
        ));
    }

    #[test]
    fn horizon_argument_overrides_invalid_config_horizon() {
        let inputs = inputs();
        fs::write(
            &inputs.config,
            r#"{
                "total_population": 900000,
                "model": {
                    "reproduction_number": 2.5,
                    "incubation_period_days": 5.0,
                    "recovery_period_days": 10.0,
                    "horizon_days": -1
                }
            }"#,
        )
        .unwrap();

        let rejected = args(&inputs);
        assert!(matches!(
            run_with_args_internal(rejected),
            Err(ForecastError::InvalidHorizon(-1))
        ));

        let mut overridden = args(&inputs);
        overridden.horizon_days = Some(10);
        let forecast = run_with_args_internal(overridden).unwrap();
        assert_eq!(forecast.trajectory.len(), 11);
    }

    #[test]
    fn rejects_malformed_log_directives() {
        let inputs = inputs();
        let mut args = args(&inputs);
        args.log_level = Some("info,debug".to_string());
        assert!(matches!(
            run_with_args_internal(args),
            Err(ForecastError::ForecastError(_))
        ));
    }

    #[test]
    fn writes_report_and_summary() {
        let inputs = inputs();
        let mut args = args(&inputs);
        args.output_dir = inputs.dir.path().join("output").to_str().unwrap().to_string();
        args.long_format = true;
        let forecast = run_with_args_internal(args).unwrap();
        let path = forecast.report_path.clone().unwrap();
        assert_eq!(path, inputs.dir.path().join("output").join("forecast.csv"));

        let mut reader = csv::Reader::from_path(&path).unwrap();
        assert_eq!(
            reader.headers().unwrap(),
            vec!["date", "variable", "value"]
        );
        assert_eq!(reader.records().count(), 4 * 61);

        let mut summary = Vec::new();
        write_summary(&mut summary, &forecast).unwrap();
        let summary = String::from_utf8(summary).unwrap();
        assert!(summary.starts_with("Forecast from 2020-04-02 to 2020-06-01 (60 days)\n"));
        assert!(summary.contains("Hospital capacity of 50 beds exceeded on 2020-04-02"));
        assert!(summary.contains("Forecast written to"));
    }
}
