//! Seasonal ARIMA model, with and without exogenous regressors.

use crate::core::{ExogMatrix, Forecast, Series};
use crate::error::{PipelineError, Result};
use crate::models::arima::COEFF_BOUND;
use crate::models::diff::{difference, integrate, seasonal_difference, seasonal_integrate};
use crate::models::order::SarimaOrder;
use crate::models::Forecaster;
use crate::utils::ols::{ols_fit, OlsFit};
use crate::utils::optimization::{nelder_mead, MinimizeConfig};
use serde::{Deserialize, Serialize};

/// SARIMA(p, d, q)(P, D, Q)[m] forecasting model.
///
/// The series is differenced seasonally D times at lag m, then d times at
/// lag 1. AR/MA terms at lag 1 and seasonal AR/MA terms at lag m are
/// estimated jointly by bounded conditional least squares.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sarima {
    order: SarimaOrder,
    ar: Vec<f64>,
    ma: Vec<f64>,
    sar: Vec<f64>,
    sma: Vec<f64>,
    intercept: f64,
    /// Training series on the original scale.
    train: Option<Vec<f64>>,
    /// Training series after seasonal differencing only.
    seasonal_diffed: Option<Vec<f64>>,
    /// Training series after seasonal then regular differencing.
    differenced: Option<Vec<f64>>,
    residuals: Option<Vec<f64>>,
    sigma2: Option<f64>,
}

impl Sarima {
    /// Create an unfitted model at the given order. The seasonal period must
    /// be positive.
    pub fn new(order: SarimaOrder) -> Result<Self> {
        if order.seasonal.m == 0 {
            return Err(PipelineError::InvalidParameter(
                "seasonal period m must be positive".to_string(),
            ));
        }
        Ok(Self {
            order,
            ar: vec![],
            ma: vec![],
            sar: vec![],
            sma: vec![],
            intercept: 0.0,
            train: None,
            seasonal_diffed: None,
            differenced: None,
            residuals: None,
            sigma2: None,
        })
    }

    /// The model's full order.
    pub fn order(&self) -> SarimaOrder {
        self.order
    }

    /// Residual variance on the differenced scale.
    pub fn sigma2(&self) -> Option<f64> {
        self.sigma2
    }

    /// Minimum observations needed to fit this order.
    pub fn min_observations(&self) -> usize {
        let o = &self.order;
        let m = o.seasonal.m;
        let max_lag = o
            .plain
            .p
            .max(o.plain.q)
            .max(o.seasonal.cap_p.max(o.seasonal.cap_q) * m);
        o.plain.d + o.seasonal.cap_d * m + max_lag + 4
    }

    /// Longest backward lag referenced by the AR/MA recursions.
    fn max_lag(&self) -> usize {
        let o = &self.order;
        let m = o.seasonal.m;
        o.plain
            .p
            .max(o.plain.q)
            .max(m * o.seasonal.cap_p)
            .max(m * o.seasonal.cap_q)
    }

    /// One-step prediction at time `t` on the differenced scale.
    fn step(
        coeffs: &Coeffs<'_>,
        m: usize,
        diff: &[f64],
        residuals: &[f64],
        t: usize,
        intercept: f64,
    ) -> f64 {
        let mut pred = intercept;
        for (i, &a) in coeffs.ar.iter().enumerate() {
            if t > i {
                pred += a * (diff[t - 1 - i] - intercept);
            }
        }
        for (j, &a) in coeffs.sar.iter().enumerate() {
            let lag = m * (j + 1);
            if t >= lag {
                pred += a * (diff[t - lag] - intercept);
            }
        }
        for (i, &b) in coeffs.ma.iter().enumerate() {
            if t > i {
                pred += b * residuals[t - 1 - i];
            }
        }
        for (j, &b) in coeffs.sma.iter().enumerate() {
            let lag = m * (j + 1);
            if t >= lag {
                pred += b * residuals[t - lag];
            }
        }
        pred
    }

    fn css(order: &SarimaOrder, diff: &[f64], params: &[f64]) -> f64 {
        let coeffs = Coeffs::split(order, params);
        let m = order.seasonal.m;
        let start = Self::start_index(order);
        let n = diff.len();
        if n <= start {
            return f64::MAX;
        }

        let mut residuals = vec![0.0; n];
        let mut css = 0.0;
        for t in start..n {
            let pred = Self::step(&coeffs, m, diff, &residuals, t, params[0]);
            let error = diff[t] - pred;
            residuals[t] = error;
            css += error * error;
        }
        css
    }

    fn start_index(order: &SarimaOrder) -> usize {
        let m = order.seasonal.m;
        order
            .plain
            .p
            .max(order.plain.q)
            .max(m * order.seasonal.cap_p)
            .max(m * order.seasonal.cap_q)
    }

    fn estimate(&mut self, diff: &[f64]) -> Result<()> {
        let o = self.order;
        let n_coeffs = o.plain.p + o.plain.q + o.seasonal.cap_p + o.seasonal.cap_q;
        let mean = diff.iter().sum::<f64>() / diff.len() as f64;

        if n_coeffs == 0 {
            self.intercept = mean;
            return Ok(());
        }

        let mut initial = vec![0.0; n_coeffs + 1];
        initial[0] = mean;
        for (i, slot) in initial[1..].iter_mut().enumerate() {
            *slot = 0.1 / (i + 1) as f64;
        }

        let mut bounds = vec![(f64::NEG_INFINITY, f64::INFINITY)];
        bounds.extend(std::iter::repeat((-COEFF_BOUND, COEFF_BOUND)).take(n_coeffs));

        let result = nelder_mead(
            |params| Self::css(&o, diff, params),
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

        let coeffs = Coeffs::split(&o, &result.point);
        self.intercept = result.point[0];
        self.ar = coeffs.ar.to_vec();
        self.ma = coeffs.ma.to_vec();
        self.sar = coeffs.sar.to_vec();
        self.sma = coeffs.sma.to_vec();
        Ok(())
    }

    fn compute_residuals(&mut self, diff: &[f64]) {
        let start = Self::start_index(&self.order);
        let m = self.order.seasonal.m;
        let n = diff.len();
        let coeffs = Coeffs {
            ar: &self.ar,
            ma: &self.ma,
            sar: &self.sar,
            sma: &self.sma,
        };

        let mut residuals = vec![0.0; n];
        for t in start..n {
            let pred = Self::step(&coeffs, m, diff, &residuals, t, self.intercept);
            residuals[t] = diff[t] - pred;
        }

        let tail = &residuals[start..];
        if !tail.is_empty() {
            self.sigma2 = Some(tail.iter().map(|r| r * r).sum::<f64>() / tail.len() as f64);
        }
        self.residuals = Some(residuals);
    }
}

/// Borrowed coefficient views in the flat parameter layout
/// `[intercept, ar.., ma.., sar.., sma..]`.
struct Coeffs<'a> {
    ar: &'a [f64],
    ma: &'a [f64],
    sar: &'a [f64],
    sma: &'a [f64],
}

impl<'a> Coeffs<'a> {
    fn split(order: &SarimaOrder, params: &'a [f64]) -> Self {
        let p = order.plain.p;
        let q = order.plain.q;
        let cap_p = order.seasonal.cap_p;
        let mut at = 1;
        let ar = &params[at..at + p];
        at += p;
        let ma = &params[at..at + q];
        at += q;
        let sar = &params[at..at + cap_p];
        at += cap_p;
        let sma = &params[at..];
        Self { ar, ma, sar, sma }
    }
}

impl Forecaster for Sarima {
    fn fit(&mut self, series: &Series) -> Result<()> {
        let values = series.values();
        let min_len = self.min_observations();
        if values.len() < min_len {
            return Err(PipelineError::InsufficientData {
                needed: min_len,
                got: values.len(),
            });
        }

        let m = self.order.seasonal.m;
        let seasonal_diffed = seasonal_difference(values, self.order.seasonal.cap_d, m);
        let diff = difference(&seasonal_diffed, self.order.plain.d);
        if diff.len() <= Self::start_index(&self.order) {
            return Err(PipelineError::FitFailure(format!(
                "series too short after differencing at order {}",
                self.order
            )));
        }

        self.train = Some(values.to_vec());
        self.estimate(&diff)?;
        self.compute_residuals(&diff);
        self.seasonal_diffed = Some(seasonal_diffed);
        self.differenced = Some(diff);
        Ok(())
    }

    fn forecast(&self, horizon: usize) -> Result<Forecast> {
        let train = self.train.as_ref().ok_or(PipelineError::FitRequired)?;
        let seasonal_diffed = self
            .seasonal_diffed
            .as_ref()
            .ok_or(PipelineError::FitRequired)?;
        let diff = self.differenced.as_ref().ok_or(PipelineError::FitRequired)?;
        let residuals = self.residuals.as_ref().ok_or(PipelineError::FitRequired)?;

        if horizon == 0 {
            return Ok(Forecast::new());
        }

        let m = self.order.seasonal.m;
        let coeffs = Coeffs {
            ar: &self.ar,
            ma: &self.ma,
            sar: &self.sar,
            sma: &self.sma,
        };

        let mut extended = diff.clone();
        let mut extended_residuals = residuals.clone();
        for _ in 0..horizon {
            let t = extended.len();
            let pred = Self::step(
                &coeffs,
                m,
                &extended,
                &extended_residuals,
                t,
                self.intercept,
            );
            extended.push(pred);
            extended_residuals.push(0.0);
        }

        let future_diff = &extended[diff.len()..];
        let on_seasonal_scale = integrate(future_diff, seasonal_diffed, self.order.plain.d);
        let predictions =
            seasonal_integrate(&on_seasonal_scale, train, self.order.seasonal.cap_d, m);

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
        "SARIMA"
    }
}

/// SARIMAX: a seasonal model augmented with exogenous regressors.
///
/// The series is regressed on the exogenous matrix by least squares and the
/// regression residual is modeled with [`Sarima`]. Forecasts add the
/// regression contribution back; when future regressor rows are not
/// supplied, the last observed row is held constant over the horizon.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sarimax {
    inner: Sarima,
    exog: Option<ExogMatrix>,
    regression: Option<OlsFit>,
}

impl Sarimax {
    /// Create an unfitted model. `exog` rows must align one-for-one with the
    /// training series handed to `fit`; `None` degenerates to plain SARIMA.
    pub fn new(order: SarimaOrder, exog: Option<ExogMatrix>) -> Result<Self> {
        Ok(Self {
            inner: Sarima::new(order)?,
            exog,
            regression: None,
        })
    }

    /// The model's full order.
    pub fn order(&self) -> SarimaOrder {
        self.inner.order()
    }

    /// The fitted regression component, when regressors were supplied.
    pub fn regression(&self) -> Option<&OlsFit> {
        self.regression.as_ref()
    }

    /// Forecast with explicit future regressor rows. The row count must
    /// equal the horizon.
    pub fn forecast_with_exog(
        &self,
        horizon: usize,
        future_exog: Option<&ExogMatrix>,
    ) -> Result<Forecast> {
        let base = self.inner.forecast(horizon)?;
        let (exog, regression) = match (&self.exog, &self.regression) {
            (Some(x), Some(r)) => (x, r),
            _ => return Ok(base),
        };
        if horizon == 0 {
            return Ok(base);
        }

        let held;
        let future = match future_exog {
            Some(f) => {
                if f.len() != horizon {
                    return Err(PipelineError::DimensionMismatch {
                        expected: horizon,
                        got: f.len(),
                    });
                }
                f
            }
            None => {
                held = exog.held_last(horizon);
                &held
            }
        };

        let contribution = regression.predict(future)?;
        let combined = base
            .values()
            .iter()
            .zip(contribution.iter())
            .map(|(b, c)| b + c)
            .collect();
        Ok(Forecast::from_values(combined))
    }
}

impl Forecaster for Sarimax {
    fn fit(&mut self, series: &Series) -> Result<()> {
        match self.exog.clone() {
            None => self.inner.fit(series),
            Some(exog) => {
                if exog.len() != series.len() {
                    return Err(PipelineError::DimensionMismatch {
                        expected: series.len(),
                        got: exog.len(),
                    });
                }
                let regression = ols_fit(series.values(), &exog)?;
                let explained = regression.predict(&exog)?;
                let residual: Vec<f64> = series
                    .values()
                    .iter()
                    .zip(explained.iter())
                    .map(|(y, e)| y - e)
                    .collect();
                let residual_series = Series::new(series.timestamps().to_vec(), residual)?;
                self.inner.fit(&residual_series)?;
                self.regression = Some(regression);
                Ok(())
            }
        }
    }

    fn forecast(&self, horizon: usize) -> Result<Forecast> {
        self.forecast_with_exog(horizon, None)
    }

    fn residuals(&self) -> Option<&[f64]> {
        self.inner.residuals()
    }

    fn name(&self) -> &str {
        if self.exog.is_some() {
            "SARIMAX"
        } else {
            "SARIMA"
        }
    }
}
