//! A discrete-time SEIR forecaster with hospital-capacity dependent mortality.
//!
//! A forecast starts from observed cumulative case counts. The [`initial_state`] module turns
//! the counts on a reference date into compartment populations (susceptible, exposed, infected,
//! recovered, dead, and the hospitalized share of the infected), and the [`simulator`] advances
//! those populations one day at a time:
//!
//! * Transmission, incubation and recovery follow the classic SEIR equations, integrated with
//!   explicit one-day Euler steps.
//! * The number of people needing a hospital bed is derived from the infected population using
//!   age-stratified hospitalization rates from a [`demographics::DemographicProfile`].
//! * While beds are available, deaths follow age-stratified in-hospital fatality rates. Patients
//!   beyond the bed capacity die at a flat critical death rate.
//!
//! ```rust
//! use chrono::NaiveDate;
//! use seir_forecast::demographics::{AgeBandLabel, DemographicProfile};
//! use seir_forecast::history::{HistoricalRecord, HistoricalSeries};
//! use seir_forecast::parameters::ModelParameters;
//! use seir_forecast::{estimate_initial_state, simulate};
//!
//! let date = NaiveDate::from_ymd_opt(2020, 4, 1).unwrap();
//! let series = HistoricalSeries::new(vec![HistoricalRecord {
//!     date,
//!     num_confirmed: 9_000,
//!     num_recovered: 1_500,
//!     num_deaths: 250,
//! }])
//! .unwrap();
//! let populations: Vec<_> = AgeBandLabel::ALL.iter().map(|band| (*band, 4_000_000)).collect();
//! let profile = DemographicProfile::from_populations(&populations).unwrap();
//!
//! let initial = estimate_initial_state(&series, date, 36_000_000, 0.75, &profile).unwrap();
//! let parameters = ModelParameters { horizon_days: 90, ..ModelParameters::default() };
//! let trajectory = simulate(&initial, &parameters, &profile, 93_527, 0.12).unwrap();
//! assert_eq!(trajectory.len(), 91);
//! ```
pub mod compartments;
pub mod demographics;
pub mod error;
pub mod history;
pub mod initial_state;
pub mod log;
pub mod numeric;
pub mod parameters;
pub mod report;
pub mod runner;
pub mod scenario;
pub mod simulator;
pub mod trajectory;

pub use compartments::{Compartment, CompartmentState};
pub use error::ForecastError;
pub use initial_state::estimate_initial_state;
pub use simulator::simulate;
pub use trajectory::Trajectory;

/// The hash map used throughout the crate.
pub use rustc_hash::FxHashMap as HashMap;
