//! Core data structures: series, exogenous matrices, and forecasts.

mod forecast;
mod series;

pub use forecast::Forecast;
pub use series::{ExogMatrix, Series};
