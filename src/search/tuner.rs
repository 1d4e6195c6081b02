//! High-level tuning entry points, one per model family.

use crate::core::{ExogMatrix, Series};
use crate::error::Result;
use crate::models::{PlainOrder, SarimaOrder};
use crate::search::engine::{GridSearch, SearchConfig, SearchObserver, NOOP};
use crate::search::grid::{PlainGrid, SeasonalGrid};

/// Runs grid searches for the ARIMA, SARIMA, and SARIMAX families over a
/// single series.
pub struct Tuner<'a> {
    series: &'a Series,
    exog: Option<&'a ExogMatrix>,
    config: SearchConfig,
    observer: &'a dyn SearchObserver,
}

impl<'a> Tuner<'a> {
    pub fn new(series: &'a Series) -> Self {
        Self {
            series,
            exog: None,
            config: SearchConfig::default(),
            observer: &NOOP,
        }
    }

    /// Supply exogenous regressors, enabling SARIMAX tuning.
    pub fn with_exog(mut self, exog: &'a ExogMatrix) -> Self {
        self.exog = Some(exog);
        self
    }

    pub fn with_config(mut self, config: SearchConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_observer(mut self, observer: &'a dyn SearchObserver) -> Self {
        self.observer = observer;
        self
    }

    fn search(&self) -> GridSearch<'a> {
        GridSearch::new(self.series, self.config.clone()).with_observer(self.observer)
    }

    /// Best non-seasonal order in `grid`, with its screening score.
    pub fn tune_arima(&self, grid: &PlainGrid) -> Result<(PlainOrder, f64)> {
        self.search().plain(grid).viable()
    }

    /// Best seasonal order in `grid` at period `m`.
    pub fn tune_sarima(&self, grid: &SeasonalGrid, m: usize) -> Result<(SarimaOrder, f64)> {
        self.search().seasonal(grid, m).viable()
    }

    /// Best seasonal-with-regressors order in `grid` at period `m`. Falls
    /// back to plain SARIMA candidates when no regressors were supplied.
    pub fn tune_sarimax(&self, grid: &SeasonalGrid, m: usize) -> Result<(SarimaOrder, f64)> {
        match self.exog {
            Some(exog) => self.search().seasonal_with_exog(grid, m, exog).viable(),
            None => self.tune_sarima(grid, m),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn weekly_series(n: usize) -> Series {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let timestamps = (0..n).map(|i| base + Duration::days(i as i64)).collect();
        let values = (0..n)
            .map(|i| {
                30.0 + 0.5 * i as f64
                    + 6.0 * (2.0 * std::f64::consts::PI * i as f64 / 7.0).sin()
            })
            .collect();
        Series::new(timestamps, values).unwrap()
    }

    #[test]
    fn tunes_all_three_families() {
        let series = weekly_series(70);
        let exog = ExogMatrix::from_column((0..70).map(|i| (i % 7) as f64).collect()).unwrap();
        let tuner = Tuner::new(&series).with_exog(&exog);

        let plain_grid = PlainGrid::new(vec![0, 1], vec![0, 1], vec![0, 1]);
        let seasonal_grid = SeasonalGrid::uniform(vec![0, 1]);

        let (_, arima_score) = tuner.tune_arima(&plain_grid).unwrap();
        let (sarima_best, sarima_score) = tuner.tune_sarima(&seasonal_grid, 7).unwrap();
        let (_, sarimax_score) = tuner.tune_sarimax(&seasonal_grid, 7).unwrap();

        assert!(arima_score.is_finite());
        assert!(sarima_score.is_finite());
        assert!(sarimax_score.is_finite());
        assert_eq!(sarima_best.seasonal.m, 7);
    }

    #[test]
    fn sarimax_without_exog_degenerates_to_sarima() {
        let series = weekly_series(70);
        let tuner = Tuner::new(&series);
        let grid = SeasonalGrid::uniform(vec![0, 1]);
        assert_eq!(
            tuner.tune_sarimax(&grid, 7).unwrap(),
            tuner.tune_sarima(&grid, 7).unwrap()
        );
    }
}
