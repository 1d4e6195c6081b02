//! Classical seasonal decomposition by moving averages.

use crate::core::Series;
use crate::error::{PipelineError, Result};

/// How the seasonal and trend components combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecompositionMode {
    /// `observed = trend + seasonal + residual`
    #[default]
    Additive,
    /// `observed = trend * seasonal * residual`; requires positive values.
    Multiplicative,
}

/// Decomposed components, aligned index-for-index with the input series.
///
/// Trend and residual are `NaN` near the ends where the centered moving
/// average is undefined.
#[derive(Debug, Clone)]
pub struct Decomposition {
    series: Series,
    pub trend: Vec<f64>,
    pub seasonal: Vec<f64>,
    pub residual: Vec<f64>,
    pub mode: DecompositionMode,
    pub period: usize,
}

impl Decomposition {
    /// The residual component as a series, with the undefined edges
    /// trimmed off.
    pub fn residual_series(&self) -> Result<Series> {
        let first = self
            .residual
            .iter()
            .position(|v| v.is_finite())
            .ok_or_else(|| {
                PipelineError::InvalidParameter("residual has no finite values".to_string())
            })?;
        let last = self
            .residual
            .iter()
            .rposition(|v| v.is_finite())
            .unwrap_or(first);
        Series::new(
            self.series.timestamps()[first..=last].to_vec(),
            self.residual[first..=last].to_vec(),
        )
    }
}

/// Decompose `series` at the given seasonal period.
///
/// The trend is a centered moving average (even periods use half weights
/// at both ends); the seasonal component is the per-position mean of the
/// detrended series, centered so it sums to zero (additive) or averages
/// one (multiplicative).
pub fn decompose(
    series: &Series,
    period: usize,
    mode: DecompositionMode,
) -> Result<Decomposition> {
    if period < 2 {
        return Err(PipelineError::InvalidParameter(format!(
            "decomposition period must be at least 2, got {period}"
        )));
    }
    let n = series.len();
    if n < 2 * period {
        return Err(PipelineError::InsufficientData {
            needed: 2 * period,
            got: n,
        });
    }
    let values = series.values();
    if mode == DecompositionMode::Multiplicative && values.iter().any(|&v| v <= 0.0) {
        return Err(PipelineError::InvalidParameter(
            "multiplicative decomposition requires positive values".to_string(),
        ));
    }

    let trend = centered_moving_average(values, period);

    // Detrend, then average by cycle position.
    let detrended: Vec<f64> = values
        .iter()
        .zip(&trend)
        .map(|(&v, &t)| match mode {
            DecompositionMode::Additive => v - t,
            DecompositionMode::Multiplicative => v / t,
        })
        .collect();

    let mut position_sums = vec![0.0; period];
    let mut position_counts = vec![0usize; period];
    for (i, &v) in detrended.iter().enumerate() {
        if v.is_finite() {
            position_sums[i % period] += v;
            position_counts[i % period] += 1;
        }
    }
    let mut means: Vec<f64> = position_sums
        .iter()
        .zip(&position_counts)
        .map(|(&s, &c)| if c > 0 { s / c as f64 } else { 0.0 })
        .collect();

    let grand = means.iter().sum::<f64>() / period as f64;
    for mean in &mut means {
        match mode {
            DecompositionMode::Additive => *mean -= grand,
            DecompositionMode::Multiplicative => *mean /= grand,
        }
    }

    let seasonal: Vec<f64> = (0..n).map(|i| means[i % period]).collect();
    let residual: Vec<f64> = (0..n)
        .map(|i| match mode {
            DecompositionMode::Additive => values[i] - trend[i] - seasonal[i],
            DecompositionMode::Multiplicative => values[i] / (trend[i] * seasonal[i]),
        })
        .collect();

    Ok(Decomposition {
        series: series.clone(),
        trend,
        seasonal,
        residual,
        mode,
        period,
    })
}

/// Centered moving average of window `period`. Even periods average two
/// adjacent windows, which halves the weight of the outermost points.
fn centered_moving_average(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut out = vec![f64::NAN; n];
    if period % 2 == 1 {
        let half = period / 2;
        for i in half..n.saturating_sub(half) {
            out[i] = values[i - half..=i + half].iter().sum::<f64>() / period as f64;
        }
    } else {
        let half = period / 2;
        for i in half..n.saturating_sub(half) {
            let mut sum = values[i - half + 1..i + half].iter().sum::<f64>();
            sum += 0.5 * (values[i - half] + values[i + half]);
            out[i] = sum / period as f64;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn make_series(values: Vec<f64>) -> Series {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let timestamps = (0..values.len())
            .map(|i| base + Duration::days(i as i64))
            .collect();
        Series::new(timestamps, values).unwrap()
    }

    #[test]
    fn recovers_additive_weekly_pattern() {
        let pattern = [3.0, -1.0, 0.5, -2.0, 1.5, -0.5, -1.5];
        let values: Vec<f64> = (0..70)
            .map(|i| 100.0 + 0.5 * i as f64 + pattern[i % 7])
            .collect();
        let series = make_series(values);
        let dec = decompose(&series, 7, DecompositionMode::Additive).unwrap();

        // Away from the edges the trend follows the line and the seasonal
        // component matches the injected pattern.
        for i in 10..60 {
            assert!((dec.trend[i] - (100.0 + 0.5 * i as f64)).abs() < 0.2);
            assert!((dec.seasonal[i] - pattern[i % 7]).abs() < 0.2);
            assert!(dec.residual[i].abs() < 0.3);
        }
    }

    #[test]
    fn multiplicative_seasonal_averages_one() {
        let values: Vec<f64> = (0..40)
            .map(|i| (50.0 + i as f64) * (1.0 + 0.1 * ((i % 4) as f64 - 1.5)))
            .collect();
        let series = make_series(values);
        let dec = decompose(&series, 4, DecompositionMode::Multiplicative).unwrap();
        let mean: f64 = dec.seasonal[..4].iter().sum::<f64>() / 4.0;
        assert!((mean - 1.0).abs() < 1e-9);
    }

    #[test]
    fn trend_edges_are_nan() {
        let series = make_series((0..30).map(|i| i as f64).collect());
        let dec = decompose(&series, 7, DecompositionMode::Additive).unwrap();
        assert!(dec.trend[0].is_nan());
        assert!(dec.trend[29].is_nan());
        assert!(dec.trend[15].is_finite());
    }

    #[test]
    fn residual_series_trims_nan_edges() {
        let series = make_series((0..30).map(|i| (i as f64).sin() + 10.0).collect());
        let dec = decompose(&series, 7, DecompositionMode::Additive).unwrap();
        let residual = dec.residual_series().unwrap();
        assert!(residual.len() < series.len());
        assert!(residual.values().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn rejects_bad_inputs() {
        let series = make_series((0..30).map(|i| i as f64 - 5.0).collect());
        assert!(matches!(
            decompose(&series, 1, DecompositionMode::Additive),
            Err(PipelineError::InvalidParameter(_))
        ));
        assert!(matches!(
            decompose(&series, 20, DecompositionMode::Additive),
            Err(PipelineError::InsufficientData { .. })
        ));
        // Values include non-positives.
        assert!(matches!(
            decompose(&series, 7, DecompositionMode::Multiplicative),
            Err(PipelineError::InvalidParameter(_))
        ));
    }

    #[test]
    fn even_period_uses_half_weight_ends() {
        let values: Vec<f64> = (0..20).map(|i| i as f64).collect();
        let series = make_series(values);
        let dec = decompose(&series, 4, DecompositionMode::Additive).unwrap();
        // On a straight line the centered average equals the line itself.
        for i in 2..18 {
            assert!((dec.trend[i] - i as f64).abs() < 1e-9);
        }
    }
}
