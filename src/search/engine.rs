//! Grid search over candidate orders with failure-tolerant evaluation.

use crate::core::{ExogMatrix, Series};
use crate::error::{PipelineError, Result};
use crate::models::{Arima, Forecaster, PlainOrder, Sarima, SarimaOrder, Sarimax};
use crate::search::grid::{PlainGrid, SeasonalGrid};
use crate::utils::metrics::mse;
use rayon::prelude::*;
use std::fmt::Display;
use tracing::debug;

/// Forecast horizon used to score candidates during screening.
pub const SCREEN_HORIZON: usize = 11;

/// How candidate forecasts are scored against the series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EvalMode {
    /// Fit on the full series and score the forecast against its trailing
    /// points. Favors orders that extrapolate the recent past.
    #[default]
    InSample,
    /// Fit on all but the trailing `horizon` points and score against the
    /// held-out tail.
    HoldOut,
}

/// Receives progress callbacks during a search.
///
/// Implementations must be `Sync`; parallel searches report from worker
/// threads.
pub trait SearchObserver: Sync {
    /// A candidate failed to fit or forecast and was skipped.
    fn on_skip(&self, candidate: &dyn Display, error: &PipelineError) {
        let _ = (candidate, error);
    }

    /// A candidate improved on the best score so far. Sequential searches
    /// emit one event per improvement; parallel searches emit a single
    /// event for the reduced winner.
    fn on_improvement(&self, candidate: &dyn Display, score: f64) {
        let _ = (candidate, score);
    }
}

/// Observer that ignores every callback.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl SearchObserver for NoopObserver {}

pub(crate) static NOOP: NoopObserver = NoopObserver;

/// Observer that reports through the `tracing` facade at debug level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl SearchObserver for TracingObserver {
    fn on_skip(&self, candidate: &dyn Display, error: &PipelineError) {
        debug!(candidate = %candidate, error = %error, "candidate skipped");
    }

    fn on_improvement(&self, candidate: &dyn Display, score: f64) {
        debug!(candidate = %candidate, score, "new best candidate");
    }
}

/// Running best over scored candidates.
///
/// `consider` keeps the incumbent on ties, so with candidates offered in
/// enumeration order the earliest of equal scores wins.
#[derive(Debug, Clone, PartialEq)]
pub struct BestSelection<O> {
    pub best_score: f64,
    pub best_params: Option<O>,
}

impl<O> BestSelection<O> {
    /// A selection with no candidate yet: infinite score, no parameters.
    pub fn empty() -> Self {
        Self {
            best_score: f64::INFINITY,
            best_params: None,
        }
    }

    /// Offer a scored candidate; adopt it only on strict improvement.
    pub fn consider(&mut self, params: O, score: f64) -> bool {
        if score < self.best_score {
            self.best_score = score;
            self.best_params = Some(params);
            true
        } else {
            false
        }
    }
}

impl<O> Default for BestSelection<O> {
    fn default() -> Self {
        Self::empty()
    }
}

/// Outcome of a full grid scan: the best selection plus a tally of how
/// many candidates were tried and how many were scored.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome<O> {
    pub selection: BestSelection<O>,
    pub attempted: usize,
    pub succeeded: usize,
}

impl<O> SearchOutcome<O> {
    /// Unwrap the winning parameters and score, or fail when every
    /// candidate was skipped.
    pub fn viable(self) -> Result<(O, f64)> {
        match self.selection.best_params {
            Some(params) => Ok((params, self.selection.best_score)),
            None => Err(PipelineError::NoViableModel {
                attempted: self.attempted,
            }),
        }
    }
}

/// Knobs shared by every grid search.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Screening forecast horizon.
    pub horizon: usize,
    pub mode: EvalMode,
    /// Evaluate candidates across threads. The winner is identical to the
    /// sequential scan; only per-candidate callbacks change.
    pub parallel: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            horizon: SCREEN_HORIZON,
            mode: EvalMode::InSample,
            parallel: false,
        }
    }
}

/// Exhaustive order search for one model family.
pub struct GridSearch<'a> {
    series: &'a Series,
    config: SearchConfig,
    observer: &'a dyn SearchObserver,
}

impl<'a> GridSearch<'a> {
    pub fn new(series: &'a Series, config: SearchConfig) -> Self {
        Self {
            series,
            config,
            observer: &NOOP,
        }
    }

    /// Route progress callbacks to `observer`.
    pub fn with_observer(mut self, observer: &'a dyn SearchObserver) -> Self {
        self.observer = observer;
        self
    }

    /// Scan a non-seasonal grid.
    pub fn plain(&self, grid: &PlainGrid) -> SearchOutcome<PlainOrder> {
        self.scan(grid.orders(), |order| {
            let mut model = Arima::new(order);
            self.score(&mut model)
        })
    }

    /// Scan a seasonal grid at period `m`.
    pub fn seasonal(&self, grid: &SeasonalGrid, m: usize) -> SearchOutcome<SarimaOrder> {
        self.scan(grid.orders(m), |order| {
            let mut model = Sarima::new(order)?;
            self.score(&mut model)
        })
    }

    /// Scan a seasonal grid with exogenous regressors at period `m`.
    ///
    /// The exog rows follow the series: in holdout mode each candidate is
    /// fitted against the leading rows and forecast against the tail rows.
    pub fn seasonal_with_exog(
        &self,
        grid: &SeasonalGrid,
        m: usize,
        exog: &ExogMatrix,
    ) -> SearchOutcome<SarimaOrder> {
        self.scan(grid.orders(m), |order| self.score_exog(order, exog))
    }

    /// Fit and score one regressor candidate, splitting the exog rows the
    /// same way the series is split.
    fn score_exog(&self, order: SarimaOrder, exog: &ExogMatrix) -> Result<f64> {
        let horizon = self.config.horizon;
        if self.series.len() <= horizon {
            return Err(PipelineError::InsufficientData {
                needed: horizon + 1,
                got: self.series.len(),
            });
        }
        match self.config.mode {
            EvalMode::InSample => {
                let mut model = Sarimax::new(order, Some(exog.clone()))?;
                model.fit(self.series)?;
                let forecast = model.forecast(horizon)?;
                mse(self.series.last(horizon), forecast.values())
            }
            EvalMode::HoldOut => {
                let split = self.series.len() - horizon;
                let train = self.series.slice(0, split)?;
                let (head, tail) = exog.split_at(split)?;
                let mut model = Sarimax::new(order, Some(head))?;
                model.fit(&train)?;
                let forecast = model.forecast_with_exog(horizon, Some(&tail))?;
                mse(self.series.last(horizon), forecast.values())
            }
        }
    }

    /// Fit `model` and score its screening forecast.
    fn score<M: Forecaster>(&self, model: &mut M) -> Result<f64> {
        let horizon = self.config.horizon;
        if self.series.len() <= horizon {
            return Err(PipelineError::InsufficientData {
                needed: horizon + 1,
                got: self.series.len(),
            });
        }
        match self.config.mode {
            EvalMode::InSample => {
                model.fit(self.series)?;
                let forecast = model.forecast(horizon)?;
                mse(self.series.last(horizon), forecast.values())
            }
            EvalMode::HoldOut => {
                let split = self.series.len() - horizon;
                let train = self.series.slice(0, split)?;
                model.fit(&train)?;
                let forecast = model.forecast(horizon)?;
                mse(self.series.last(horizon), forecast.values())
            }
        }
    }

    fn scan<O, F>(&self, orders: Vec<O>, evaluate: F) -> SearchOutcome<O>
    where
        O: Display + Copy + Send,
        F: Fn(O) -> Result<f64> + Sync,
    {
        if self.config.parallel {
            self.scan_parallel(orders, evaluate)
        } else {
            self.scan_sequential(orders, evaluate)
        }
    }

    fn scan_sequential<O, F>(&self, orders: Vec<O>, evaluate: F) -> SearchOutcome<O>
    where
        O: Display + Copy,
        F: Fn(O) -> Result<f64>,
    {
        let attempted = orders.len();
        let mut selection = BestSelection::empty();
        let mut succeeded = 0;
        for order in orders {
            match checked(evaluate(order)) {
                Ok(score) => {
                    succeeded += 1;
                    if selection.consider(order, score) {
                        self.observer.on_improvement(&order, score);
                    }
                }
                Err(error) => self.observer.on_skip(&order, &error),
            }
        }
        SearchOutcome {
            selection,
            attempted,
            succeeded,
        }
    }

    /// Parallel scan. Scores carry their enumeration index so the reduction
    /// picks the same winner the sequential scan would.
    fn scan_parallel<O, F>(&self, orders: Vec<O>, evaluate: F) -> SearchOutcome<O>
    where
        O: Display + Copy + Send,
        F: Fn(O) -> Result<f64> + Sync,
    {
        let attempted = orders.len();
        let scored: Vec<(usize, O, f64)> = orders
            .into_par_iter()
            .enumerate()
            .filter_map(|(index, order)| match checked(evaluate(order)) {
                Ok(score) => Some((index, order, score)),
                Err(error) => {
                    self.observer.on_skip(&order, &error);
                    None
                }
            })
            .collect();

        let succeeded = scored.len();
        let mut selection = BestSelection::empty();
        let winner = scored
            .into_iter()
            .min_by(|(ai, _, ascore), (bi, _, bscore)| {
                ascore
                    .partial_cmp(bscore)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then(ai.cmp(bi))
            });
        if let Some((_, order, score)) = winner {
            if selection.consider(order, score) {
                self.observer.on_improvement(&order, score);
            }
        }
        SearchOutcome {
            selection,
            attempted,
            succeeded,
        }
    }
}

/// Classify a non-finite score as a fit failure so the candidate is
/// skipped rather than counted as scored.
fn checked(result: Result<f64>) -> Result<f64> {
    match result {
        Ok(score) if !score.is_finite() => Err(PipelineError::FitFailure(format!(
            "non-finite score {score}"
        ))),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use std::sync::Mutex;

    fn make_series(values: Vec<f64>) -> Series {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let timestamps = (0..values.len())
            .map(|i| base + Duration::days(i as i64))
            .collect();
        Series::new(timestamps, values).unwrap()
    }

    fn weekly_series(n: usize) -> Series {
        let values = (0..n)
            .map(|i| {
                40.0 + 0.3 * i as f64
                    + 5.0 * (2.0 * std::f64::consts::PI * i as f64 / 7.0).sin()
            })
            .collect();
        make_series(values)
    }

    #[test]
    fn selection_keeps_first_on_tie() {
        let mut selection = BestSelection::empty();
        assert!(selection.consider(PlainOrder::new(0, 0, 0), 2.0));
        assert!(!selection.consider(PlainOrder::new(1, 0, 0), 2.0));
        assert_eq!(selection.best_params, Some(PlainOrder::new(0, 0, 0)));
        assert!(selection.consider(PlainOrder::new(0, 0, 1), 1.5));
        assert_eq!(selection.best_params, Some(PlainOrder::new(0, 0, 1)));
    }

    #[test]
    fn empty_grid_yields_no_model() {
        let series = weekly_series(70);
        let search = GridSearch::new(&series, SearchConfig::default());
        let outcome = search.plain(&PlainGrid::new(vec![], vec![0], vec![0]));
        assert_eq!(outcome.attempted, 0);
        assert_eq!(outcome.succeeded, 0);
        assert_eq!(outcome.selection.best_score, f64::INFINITY);
        assert!(outcome.selection.best_params.is_none());
        assert!(matches!(
            outcome.viable(),
            Err(PipelineError::NoViableModel { attempted: 0 })
        ));
    }

    #[test]
    fn short_series_skips_everything() {
        // Every candidate fails at the screening horizon, no panic.
        let series = make_series(vec![1.0]);
        let search = GridSearch::new(&series, SearchConfig::default());
        let outcome = search.plain(&PlainGrid::new(vec![0, 1], vec![0], vec![0]));
        assert_eq!(outcome.attempted, 2);
        assert_eq!(outcome.succeeded, 0);
        assert!(matches!(
            outcome.viable(),
            Err(PipelineError::NoViableModel { attempted: 2 })
        ));
    }

    #[test]
    fn partial_failures_are_tolerated() {
        // d = 40 exceeds the series length and fails to fit; d = 0 survives.
        let series = weekly_series(30);
        let config = SearchConfig {
            horizon: 3,
            ..SearchConfig::default()
        };
        let search = GridSearch::new(&series, config);
        let outcome = search.plain(&PlainGrid::new(vec![0], vec![0, 40], vec![0]));
        assert_eq!(outcome.attempted, 2);
        assert_eq!(outcome.succeeded, 1);
        let (best, score) = outcome.viable().unwrap();
        assert_eq!(best, PlainOrder::new(0, 0, 0));
        assert!(score.is_finite());
    }

    #[test]
    fn plain_search_finds_finite_best() {
        let series = weekly_series(70);
        let search = GridSearch::new(&series, SearchConfig::default());
        let grid = PlainGrid::new(vec![0, 1, 2], vec![0, 1], vec![0, 1, 2]);
        let outcome = search.plain(&grid);
        assert_eq!(outcome.attempted, 18);
        assert!(outcome.succeeded > 0);
        let (_, score) = outcome.viable().unwrap();
        assert!(score.is_finite());
    }

    #[test]
    fn parallel_matches_sequential() {
        let series = weekly_series(70);
        let grid = SeasonalGrid::uniform(vec![0, 1]);

        let sequential = GridSearch::new(&series, SearchConfig::default()).seasonal(&grid, 7);
        let parallel_config = SearchConfig {
            parallel: true,
            ..SearchConfig::default()
        };
        let parallel = GridSearch::new(&series, parallel_config).seasonal(&grid, 7);

        assert_eq!(sequential.attempted, parallel.attempted);
        assert_eq!(sequential.succeeded, parallel.succeeded);
        assert_eq!(
            sequential.selection.best_params,
            parallel.selection.best_params
        );
        assert_eq!(
            sequential.selection.best_score,
            parallel.selection.best_score
        );
    }

    #[test]
    fn holdout_mode_scores_unseen_tail() {
        let series = weekly_series(70);
        let config = SearchConfig {
            mode: EvalMode::HoldOut,
            ..SearchConfig::default()
        };
        let search = GridSearch::new(&series, config);
        let outcome = search.seasonal(&SeasonalGrid::uniform(vec![0, 1]), 7);
        let (best, score) = outcome.viable().unwrap();
        assert!(score.is_finite());
        assert_eq!(best.seasonal.m, 7);
    }

    #[derive(Default)]
    struct RecordingObserver {
        skips: Mutex<usize>,
        improvements: Mutex<Vec<f64>>,
    }

    impl SearchObserver for RecordingObserver {
        fn on_skip(&self, _candidate: &dyn std::fmt::Display, _error: &PipelineError) {
            *self.skips.lock().unwrap() += 1;
        }

        fn on_improvement(&self, _candidate: &dyn std::fmt::Display, score: f64) {
            self.improvements.lock().unwrap().push(score);
        }
    }

    #[test]
    fn observer_sees_skips_and_improvements() {
        let series = weekly_series(30);
        let observer = RecordingObserver::default();
        let config = SearchConfig {
            horizon: 3,
            ..SearchConfig::default()
        };
        let search = GridSearch::new(&series, config).with_observer(&observer);
        let outcome = search.plain(&PlainGrid::new(vec![0, 1], vec![0, 40], vec![0]));

        assert_eq!(*observer.skips.lock().unwrap(), 2);
        let improvements = observer.improvements.lock().unwrap();
        assert!(!improvements.is_empty());
        // Improvement scores strictly decrease.
        assert!(improvements.windows(2).all(|w| w[1] < w[0]));
        assert!(outcome.viable().is_ok());
    }

    #[test]
    fn holdout_screening_with_exog_scores_candidates() {
        let n = 70;
        let series = weekly_series(n);
        let exog = ExogMatrix::from_column((0..n).map(|i| (i % 7) as f64).collect()).unwrap();
        let grid = SeasonalGrid::uniform(vec![0, 1]);

        let insample =
            GridSearch::new(&series, SearchConfig::default()).seasonal_with_exog(&grid, 7, &exog);
        let holdout_config = SearchConfig {
            mode: EvalMode::HoldOut,
            ..SearchConfig::default()
        };
        let holdout =
            GridSearch::new(&series, holdout_config).seasonal_with_exog(&grid, 7, &exog);

        // Both modes score the full grid; holdout fits on the leading exog
        // rows and forecasts against the tail rows.
        assert_eq!(insample.succeeded, insample.attempted);
        assert_eq!(holdout.succeeded, holdout.attempted);
        let (best, score) = holdout.viable().unwrap();
        assert_eq!(best.seasonal.m, 7);
        assert!(score.is_finite());
    }

    #[test]
    fn nan_tail_scores_count_as_skips() {
        // NaN only in the held-out tail: every fit succeeds on the clean
        // head, but each score is non-finite and must tally as a skip.
        let mut values: Vec<f64> = (0..40)
            .map(|i| {
                40.0 + 0.3 * i as f64
                    + 5.0 * (2.0 * std::f64::consts::PI * i as f64 / 7.0).sin()
            })
            .collect();
        let last = values.len() - 1;
        values[last] = f64::NAN;
        let series = make_series(values);
        let grid = PlainGrid::new(vec![0, 1], vec![0], vec![0, 1]);

        let config = SearchConfig {
            mode: EvalMode::HoldOut,
            ..SearchConfig::default()
        };
        let sequential = GridSearch::new(&series, config.clone()).plain(&grid);
        assert_eq!(sequential.succeeded, 0);
        assert!(sequential.selection.best_params.is_none());
        assert!(matches!(
            sequential.viable(),
            Err(PipelineError::NoViableModel { attempted: 4 })
        ));

        let parallel = GridSearch::new(
            &series,
            SearchConfig {
                parallel: true,
                ..config
            },
        )
        .plain(&grid);
        assert_eq!(parallel.succeeded, 0);
        assert!(parallel.selection.best_params.is_none());
    }

    #[test]
    fn parallel_scan_reports_winning_improvement() {
        let series = weekly_series(70);
        let observer = RecordingObserver::default();
        let config = SearchConfig {
            parallel: true,
            ..SearchConfig::default()
        };
        let search = GridSearch::new(&series, config).with_observer(&observer);
        let outcome = search.plain(&PlainGrid::new(vec![0, 1], vec![0, 1], vec![0, 1]));

        let (_, best_score) = outcome.viable().unwrap();
        let improvements = observer.improvements.lock().unwrap();
        assert_eq!(improvements.as_slice(), &[best_score]);
    }

    #[test]
    fn seasonal_search_respects_period() {
        let series = weekly_series(70);
        let search = GridSearch::new(&series, SearchConfig::default());
        let outcome = search.seasonal(&SeasonalGrid::uniform(vec![0, 1]), 7);
        let (best, _) = outcome.viable().unwrap();
        assert_eq!(best.seasonal.m, 7);
    }
}
