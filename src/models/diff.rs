//! Differencing and integration utilities shared by the ARIMA family.

/// Difference a series `d` times at lag 1.
pub fn difference(series: &[f64], d: usize) -> Vec<f64> {
    let mut result = series.to_vec();
    for _ in 0..d {
        if result.len() <= 1 {
            break;
        }
        result = result.windows(2).map(|w| w[1] - w[0]).collect();
    }
    result
}

/// Difference a series `d` times at lag `period`.
pub fn seasonal_difference(series: &[f64], d: usize, period: usize) -> Vec<f64> {
    if period == 0 {
        return series.to_vec();
    }
    let mut result = series.to_vec();
    for _ in 0..d {
        if result.len() <= period {
            break;
        }
        result = result
            .iter()
            .skip(period)
            .zip(result.iter())
            .map(|(curr, prev)| curr - prev)
            .collect();
    }
    result
}

/// Reverse lag-1 differencing for forecast continuation.
///
/// `forecast` holds values on the differenced scale; `original` is the
/// series that was differenced `d` times, used for the anchor points.
pub fn integrate(forecast: &[f64], original: &[f64], d: usize) -> Vec<f64> {
    if d == 0 || forecast.is_empty() {
        return forecast.to_vec();
    }

    let mut result = forecast.to_vec();
    for level in (0..d).rev() {
        let anchor = if level == 0 {
            original.last().copied().unwrap_or(0.0)
        } else {
            difference(original, level).last().copied().unwrap_or(0.0)
        };

        let mut cumsum = anchor;
        for value in result.iter_mut() {
            cumsum += *value;
            *value = cumsum;
        }
    }
    result
}

/// Reverse lag-`period` differencing for forecast continuation.
///
/// Requires `original` to hold at least `period` observations at every
/// differencing level, which the model's minimum-length check guarantees.
pub fn seasonal_integrate(
    forecast: &[f64],
    original: &[f64],
    d: usize,
    period: usize,
) -> Vec<f64> {
    if d == 0 || period == 0 || forecast.is_empty() {
        return forecast.to_vec();
    }

    let mut result = forecast.to_vec();
    for level in (0..d).rev() {
        let mut history = seasonal_difference(original, level, period);
        let mut integrated = Vec::with_capacity(result.len());
        for &value in &result {
            let prev = history[history.len() - period];
            let y = value + prev;
            history.push(y);
            integrated.push(y);
        }
        result = integrated;
    }
    result
}
