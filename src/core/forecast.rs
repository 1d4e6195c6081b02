//! Forecast result structure for holding point predictions.

/// Point predictions for a fixed horizon beyond the end of a series.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Forecast {
    point: Vec<f64>,
}

impl Forecast {
    /// Create an empty forecast.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a forecast from point predictions.
    pub fn from_values(point: Vec<f64>) -> Self {
        Self { point }
    }

    /// Number of forecast steps.
    pub fn horizon(&self) -> usize {
        self.point.len()
    }

    /// Check if the forecast is empty.
    pub fn is_empty(&self) -> bool {
        self.point.is_empty()
    }

    /// Point predictions in step order.
    pub fn values(&self) -> &[f64] {
        &self.point
    }

    /// Consume the forecast, returning the predictions.
    pub fn into_values(self) -> Vec<f64> {
        self.point
    }

    /// Whether every prediction is a finite number.
    pub fn is_finite(&self) -> bool {
        self.point.iter().all(|v| v.is_finite())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forecast_horizon() {
        let f = Forecast::from_values(vec![1.0, 2.0, 3.0]);
        assert_eq!(f.horizon(), 3);
        assert!(!f.is_empty());
        assert!(f.is_finite());
    }

    #[test]
    fn forecast_empty() {
        let f = Forecast::new();
        assert_eq!(f.horizon(), 0);
        assert!(f.is_empty());
    }

    #[test]
    fn forecast_detects_non_finite() {
        let f = Forecast::from_values(vec![1.0, f64::NAN]);
        assert!(!f.is_finite());
    }
}
