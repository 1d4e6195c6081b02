//! Batch SARIMA model selection for daily time series.
//!
//! The crate covers the full path from raw CSV to persisted models:
//! extraction and cleaning ([`pipeline::etl`]), classical seasonal
//! decomposition ([`pipeline::decompose`]), exhaustive order search per
//! model family ([`search`]), and holdout-evaluated final fits with JSON
//! persistence ([`pipeline::driver`]).
//!
//! # Example
//!
//! ```no_run
//! use sarima_select::core::Series;
//! use sarima_select::pipeline::{DriverConfig, ModelStore, SelectionDriver};
//!
//! # fn run(series: Series) -> sarima_select::error::Result<()> {
//! let store = ModelStore::open("models")?;
//! let driver = SelectionDriver::new(DriverConfig::default()).with_store(&store);
//! let report = driver.run(&series, None)?;
//! println!("trained {} families", report.trained());
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod search;
pub mod utils;

pub use crate::core::{ExogMatrix, Forecast, Series};
pub use crate::error::{PipelineError, Result};
pub use crate::models::Forecaster;
