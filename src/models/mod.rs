//! Forecasting models and the trait they share.

pub mod arima;
pub mod diff;
pub mod order;
pub mod sarima;

pub use arima::Arima;
pub use order::{PlainOrder, SarimaOrder, SeasonalOrder};
pub use sarima::{Sarima, Sarimax};

use crate::core::{Forecast, Series};
use crate::error::Result;

/// Common interface for all forecasting models.
pub trait Forecaster {
    /// Fit the model to a series.
    fn fit(&mut self, series: &Series) -> Result<()>;

    /// Produce point forecasts for the given number of steps past the end
    /// of the training series.
    fn forecast(&self, horizon: usize) -> Result<Forecast>;

    /// In-sample residuals, available after fitting.
    fn residuals(&self) -> Option<&[f64]>;

    /// Model family name.
    fn name(&self) -> &str;

    /// Whether the model has been fitted.
    fn is_fitted(&self) -> bool {
        self.residuals().is_some()
    }
}
