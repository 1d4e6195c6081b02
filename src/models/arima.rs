//! ARIMA model fitted by conditional least squares.

use crate::core::{Forecast, Series};
use crate::error::{PipelineError, Result};
use crate::models::diff::{difference, integrate};
use crate::models::order::PlainOrder;
use crate::models::Forecaster;
use crate::utils::optimization::{nelder_mead, MinimizeConfig};
use serde::{Deserialize, Serialize};

/// Coefficient bounds keeping the fit away from non-stationary and
/// non-invertible regions.
pub(crate) const COEFF_BOUND: f64 = 0.99;

/// ARIMA(p, d, q) forecasting model.
///
/// Coefficients are estimated by minimizing the conditional sum of squares
/// with a bounded simplex search. Fitting on degenerate inputs (too short
/// for the order, non-finite objective) is reported as a fit failure so the
/// grid search can skip the candidate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Arima {
    order: PlainOrder,
    ar: Vec<f64>,
    ma: Vec<f64>,
    intercept: f64,
    /// Training series on the original scale; kept for integration.
    train: Option<Vec<f64>>,
    /// Training series after differencing.
    differenced: Option<Vec<f64>>,
    /// Residuals on the differenced scale.
    residuals: Option<Vec<f64>>,
    /// Residual variance on the differenced scale.
    sigma2: Option<f64>,
}

impl Arima {
    /// Create an unfitted model at the given order.
    pub fn new(order: PlainOrder) -> Self {
        Self {
            order,
            ar: vec![],
            ma: vec![],
            intercept: 0.0,
            train: None,
            differenced: None,
            residuals: None,
            sigma2: None,
        }
    }

    /// The model's order specification.
    pub fn order(&self) -> PlainOrder {
        self.order
    }

    /// Estimated AR coefficients.
    pub fn ar_coefficients(&self) -> &[f64] {
        &self.ar
    }

    /// Estimated MA coefficients.
    pub fn ma_coefficients(&self) -> &[f64] {
        &self.ma
    }

    /// Estimated intercept on the differenced scale.
    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    /// Residual variance on the differenced scale.
    pub fn sigma2(&self) -> Option<f64> {
        self.sigma2
    }

    /// Conditional sum of squares for a coefficient vector.
    fn css(diff: &[f64], p: usize, q: usize, ar: &[f64], ma: &[f64], intercept: f64) -> f64 {
        let n = diff.len();
        let start = p.max(q);
        if n <= start {
            return f64::MAX;
        }

        let mut residuals = vec![0.0; n];
        let mut css = 0.0;
        for t in start..n {
            let mut pred = intercept;
            for i in 0..p {
                pred += ar[i] * (diff[t - 1 - i] - intercept);
            }
            for i in 0..q {
                pred += ma[i] * residuals[t - 1 - i];
            }
            let error = diff[t] - pred;
            residuals[t] = error;
            css += error * error;
        }
        css
    }

    fn estimate(&mut self, diff: &[f64]) -> Result<()> {
        let p = self.order.p;
        let q = self.order.q;
        let mean = diff.iter().sum::<f64>() / diff.len() as f64;

        if p == 0 && q == 0 {
            self.intercept = mean;
            self.ar = vec![];
            self.ma = vec![];
            return Ok(());
        }

        let mut initial = vec![0.0; p + q + 1];
        initial[0] = mean;
        for (i, slot) in initial[1..].iter_mut().enumerate() {
            *slot = 0.1 / (i + 1) as f64;
        }

        let mut bounds = vec![(f64::NEG_INFINITY, f64::INFINITY)];
        bounds.extend(std::iter::repeat((-COEFF_BOUND, COEFF_BOUND)).take(p + q));

        let result = nelder_mead(
            |params| {
                let intercept = params[0];
                let ar = &params[1..1 + p];
                let ma = &params[1 + p..];
                Self::css(diff, p, q, ar, ma, intercept)
            },
            &initial,
            Some(&bounds),
            MinimizeConfig::default(),
        );

        if !result.value.is_finite() {
            return Err(PipelineError::FitFailure(format!(
                "non-finite objective at order {}",
                self.order
            )));
        }

        self.intercept = result.point[0];
        self.ar = result.point[1..1 + p].to_vec();
        self.ma = result.point[1 + p..].to_vec();
        Ok(())
    }

    fn compute_residuals(&mut self, diff: &[f64]) {
        let n = diff.len();
        let p = self.order.p;
        let q = self.order.q;
        let start = p.max(q);

        let mut residuals = vec![0.0; n];
        for t in start..n {
            let mut pred = self.intercept;
            for i in 0..p {
                pred += self.ar[i] * (diff[t - 1 - i] - self.intercept);
            }
            for i in 0..q {
                pred += self.ma[i] * residuals[t - 1 - i];
            }
            residuals[t] = diff[t] - pred;
        }

        let tail = &residuals[start..];
        if !tail.is_empty() {
            self.sigma2 = Some(tail.iter().map(|r| r * r).sum::<f64>() / tail.len() as f64);
        }
        self.residuals = Some(residuals);
    }
}

impl Forecaster for Arima {
    fn fit(&mut self, series: &Series) -> Result<()> {
        let values = series.values();
        let min_len = self.order.d + self.order.p.max(self.order.q) + 2;
        if values.len() < min_len {
            return Err(PipelineError::InsufficientData {
                needed: min_len,
                got: values.len(),
            });
        }

        let diff = difference(values, self.order.d);
        if diff.is_empty() {
            return Err(PipelineError::FitFailure(format!(
                "series vanished after differencing at order {}",
                self.order
            )));
        }

        self.train = Some(values.to_vec());
        self.estimate(&diff)?;
        self.compute_residuals(&diff);
        self.differenced = Some(diff);
        Ok(())
    }

    fn forecast(&self, horizon: usize) -> Result<Forecast> {
        let train = self.train.as_ref().ok_or(PipelineError::FitRequired)?;
        let diff = self.differenced.as_ref().ok_or(PipelineError::FitRequired)?;
        let residuals = self.residuals.as_ref().ok_or(PipelineError::FitRequired)?;

        if horizon == 0 {
            return Ok(Forecast::new());
        }

        let p = self.order.p;
        let q = self.order.q;

        let mut extended = diff.clone();
        let mut extended_residuals = residuals.clone();
        for _ in 0..horizon {
            let t = extended.len();
            let mut pred = self.intercept;
            for i in 0..p {
                if t > i {
                    pred += self.ar[i] * (extended[t - 1 - i] - self.intercept);
                }
            }
            for i in 0..q {
                if t > i {
                    pred += self.ma[i] * extended_residuals[t - 1 - i];
                }
            }
            extended.push(pred);
            // Future shocks are their expectation, zero.
            extended_residuals.push(0.0);
        }

        let future_diff = &extended[diff.len()..];
        let predictions = integrate(future_diff, train, self.order.d);

        let forecast = Forecast::from_values(predictions);
        if !forecast.is_finite() {
            return Err(PipelineError::FitFailure(format!(
                "non-finite forecast at order {}",
                self.order
            )));
        }
        Ok(forecast)
    }

    fn residuals(&self) -> Option<&[f64]> {
        self.residuals.as_deref()
    }

    fn name(&self) -> &str {
        "ARIMA"
    }
}
