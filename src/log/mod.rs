//! The `log` module configures the crate's logging. Logging records what the estimator and the
//! simulator are doing (derived initial states, run boundaries, the day hospital demand first
//! exceeds capacity). It is not to be confused with _reports_, which hold the forecast itself.
//!
//! This module (re)exports the five logging macros: `error!`, `warn!`, `info!`, `debug!` and
//! `trace!`:
//!
//! ```rust
//! use seir_forecast::log::info;
//!
//! pub fn do_a_thing() {
//!     info!("A thing is being done.");
//! }
//! ```
//!
//! Logging is _disabled_ by default. The `seir-forecast` binary enables it with
//! `--log-level <directives>`, where the directives are a global level optionally followed by
//! per-module levels:
//!
//! ```rust
//! use seir_forecast::log::configure_logging;
//!
//! // Per-day step messages are only wanted while debugging the simulator.
//! configure_logging("info,seir_forecast::simulator=trace").unwrap();
//! ```
#[cfg(feature = "logging")]
mod standard_logger;

#[cfg(not(feature = "logging"))]
mod null_logger;

pub use log::{debug, error, info, trace, warn, LevelFilter};

use crate::HashMap;
#[cfg(feature = "logging")]
use log4rs::Handle;
use std::str::FromStr;
use std::sync::LazyLock;
use std::sync::{Mutex, MutexGuard};

use crate::error::ForecastError;

// Logging disabled
const DEFAULT_LOG_LEVEL: LevelFilter = LevelFilter::Off;

/// A global instance of the logging configuration.
static LOG_CONFIGURATION: LazyLock<Mutex<LogConfiguration>> = LazyLock::new(Mutex::default);

/// Keeps track of the global level, the per-module levels and the handle to the installed
/// logger.
///
/// Loggers are installed process-wide, so only the singleton behind `LOG_CONFIGURATION` exists.
#[derive(Debug)]
pub(in crate::log) struct LogConfiguration {
    /// Level for modules without their own level. `LevelFilter::Off` disables logging.
    pub(in crate::log) global_log_level: LevelFilter,
    /// Module path (e.g. `"seir_forecast::simulator"`) to level.
    pub(in crate::log) module_levels: HashMap<String, LevelFilter>,

    #[cfg(feature = "logging")]
    root_handle: Option<Handle>,
}

impl Default for LogConfiguration {
    fn default() -> Self {
        Self {
            global_log_level: DEFAULT_LOG_LEVEL,
            module_levels: HashMap::default(),

            #[cfg(feature = "logging")]
            root_handle: None,
        }
    }
}

/// A parsed `--log-level` value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogDirectives {
    pub global_level: LevelFilter,
    pub module_levels: Vec<(String, LevelFilter)>,
}

impl FromStr for LogDirectives {
    type Err = ForecastError;

    /// Parses `level[,module=level]...`, e.g. `warn,seir_forecast::simulator=trace`. A missing
    /// global level means `info`.
    fn from_str(directives: &str) -> Result<Self, Self::Err> {
        let mut parsed = LogDirectives {
            global_level: LevelFilter::Info,
            module_levels: Vec::new(),
        };
        for (index, directive) in directives.split(',').map(str::trim).enumerate() {
            match directive.split_once('=') {
                Some((module, level)) if !module.trim().is_empty() => parsed
                    .module_levels
                    .push((module.trim().to_string(), parse_level_filter(level.trim())?)),
                None if index == 0 => parsed.global_level = parse_level_filter(directive)?,
                _ => {
                    return Err(ForecastError::ForecastError(format!(
                        "invalid log directive `{directive}`"
                    )))
                }
            }
        }
        Ok(parsed)
    }
}

impl LogConfiguration {
    /// Replaces the whole configuration and reinstalls the logger.
    pub(in crate::log) fn apply(&mut self, directives: &LogDirectives) {
        self.global_log_level = directives.global_level;
        self.module_levels = directives
            .module_levels
            .iter()
            .map(|(module, level)| (module.clone(), *level))
            .collect();
        self.set_config();
    }
}

/// Sets the global log level and clears any per-module levels. `LevelFilter::Off` disables
/// logging.
pub fn set_log_level(level: LevelFilter) {
    get_log_configuration().apply(&LogDirectives {
        global_level: level,
        module_levels: Vec::new(),
    });
}

/// Parses `directives` (see [`LogDirectives`]) and installs them.
///
/// # Errors
///
/// Returns `ForecastError::ForecastError` when a level name or directive is malformed. The
/// configuration is left untouched in that case.
pub fn configure_logging(directives: &str) -> Result<(), ForecastError> {
    let directives = directives.parse::<LogDirectives>()?;
    get_log_configuration().apply(&directives);
    Ok(())
}

/// Parses a level name as accepted on the command line (`off`, `error`, ..., `trace`).
///
/// # Errors
///
/// Returns `ForecastError::ForecastError` when the name is not a known level.
pub fn parse_level_filter(name: &str) -> Result<LevelFilter, ForecastError> {
    LevelFilter::from_str(name)
        .map_err(|_| ForecastError::ForecastError(format!("unknown log level `{name}`")))
}

fn get_log_configuration() -> MutexGuard<'static, LogConfiguration> {
    LOG_CONFIGURATION
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}
