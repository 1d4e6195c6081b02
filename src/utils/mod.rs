//! Shared numeric utilities: metrics, optimization, regression.

pub mod metrics;
pub mod ols;
pub mod optimization;

pub use metrics::{mae, mse};
pub use ols::{ols_fit, OlsFit};
pub use optimization::{nelder_mead, MinimizeConfig, MinimizeResult};
