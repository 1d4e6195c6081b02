//! End-to-end model selection across the ARIMA, SARIMA, and SARIMAX
//! families.

use crate::core::{ExogMatrix, Series};
use crate::error::Result;
use crate::models::{Arima, Forecaster, PlainOrder, Sarima, SarimaOrder, Sarimax};
use crate::pipeline::persist::ModelStore;
use crate::search::{PlainGrid, SearchConfig, SeasonalGrid, TracingObserver, Tuner};
use crate::utils::metrics::{mae, mse};
use serde::Serialize;
use tracing::{info, warn};

/// Grids, period, and holdout settings for a full selection run.
#[derive(Debug, Clone)]
pub struct DriverConfig {
    pub plain_grid: PlainGrid,
    pub seasonal_grid: SeasonalGrid,
    /// Seasonal period for the SARIMA and SARIMAX families.
    pub period: usize,
    /// Fraction of the series held out for final evaluation.
    pub test_fraction: f64,
    pub search: SearchConfig,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            plain_grid: PlainGrid::new(vec![0, 1, 2], vec![0, 1], vec![0, 1, 2]),
            seasonal_grid: SeasonalGrid::uniform(vec![0, 1]),
            period: 7,
            test_fraction: 0.2,
            search: SearchConfig::default(),
        }
    }
}

/// A tuned, refitted family with its holdout evaluation.
#[derive(Debug, Clone, Serialize)]
pub struct TrainedFamily<O> {
    pub order: O,
    /// Screening score from the grid search.
    pub search_score: f64,
    /// Mean squared error on the holdout tail.
    pub holdout_mse: f64,
    /// Mean absolute error on the holdout tail.
    pub holdout_mae: f64,
}

/// Per-family results of one selection run. A failure in one family never
/// aborts the others.
#[derive(Debug)]
pub struct SelectionReport {
    pub arima: Result<TrainedFamily<PlainOrder>>,
    pub sarima: Result<TrainedFamily<SarimaOrder>>,
    pub sarimax: Result<TrainedFamily<SarimaOrder>>,
}

impl SelectionReport {
    /// Number of families that produced a trained model.
    pub fn trained(&self) -> usize {
        [
            self.arima.is_ok(),
            self.sarima.is_ok(),
            self.sarimax.is_ok(),
        ]
        .iter()
        .filter(|ok| **ok)
        .count()
    }
}

/// Tunes every family on the training split, refits the winners, scores
/// them on the holdout, and persists each fitted model.
pub struct SelectionDriver<'a> {
    config: DriverConfig,
    store: Option<&'a ModelStore>,
}

impl<'a> SelectionDriver<'a> {
    pub fn new(config: DriverConfig) -> Self {
        Self {
            config,
            store: None,
        }
    }

    /// Persist each trained family to `store` as `{family}_Tuned`.
    pub fn with_store(mut self, store: &'a ModelStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Run selection over `series`, tuning SARIMAX against `exog` when
    /// supplied.
    pub fn run(&self, series: &Series, exog: Option<&ExogMatrix>) -> Result<SelectionReport> {
        let (train, test) = series.split_holdout(self.config.test_fraction)?;
        let train_exog = match exog {
            Some(x) => {
                let (head, _) = x.split_at(train.len())?;
                Some(head)
            }
            None => None,
        };
        info!(
            train = train.len(),
            test = test.len(),
            "running model selection"
        );

        let arima = self.run_arima(&train, &test);
        let sarima = self.run_sarima(&train, &test);
        let sarimax = self.run_sarimax(&train, &test, train_exog.as_ref(), exog);

        let report = SelectionReport {
            arima,
            sarima,
            sarimax,
        };
        for (family, outcome) in [
            ("ARIMA", report.arima.as_ref().err()),
            ("SARIMA", report.sarima.as_ref().err()),
            ("SARIMAX", report.sarimax.as_ref().err()),
        ] {
            if let Some(error) = outcome {
                warn!(family, error = %error, "family failed");
            }
        }
        Ok(report)
    }

    fn run_arima(&self, train: &Series, test: &Series) -> Result<TrainedFamily<PlainOrder>> {
        let observer = TracingObserver;
        let tuner = Tuner::new(train)
            .with_config(self.config.search.clone())
            .with_observer(&observer);
        let (order, search_score) = tuner.tune_arima(&self.config.plain_grid)?;

        let mut model = Arima::new(order);
        model.fit(train)?;
        let forecast = model.forecast(test.len())?;
        let family = self.evaluated(order, search_score, test, forecast.values())?;
        self.persist("ARIMA_Tuned", &model)?;
        info!(order = %order, mse = family.holdout_mse, mae = family.holdout_mae, "trained ARIMA");
        Ok(family)
    }

    fn run_sarima(&self, train: &Series, test: &Series) -> Result<TrainedFamily<SarimaOrder>> {
        let observer = TracingObserver;
        let tuner = Tuner::new(train)
            .with_config(self.config.search.clone())
            .with_observer(&observer);
        let (order, search_score) =
            tuner.tune_sarima(&self.config.seasonal_grid, self.config.period)?;

        let mut model = Sarima::new(order)?;
        model.fit(train)?;
        let forecast = model.forecast(test.len())?;
        let family = self.evaluated(order, search_score, test, forecast.values())?;
        self.persist("SARIMA_Tuned", &model)?;
        info!(order = %order, mse = family.holdout_mse, mae = family.holdout_mae, "trained SARIMA");
        Ok(family)
    }

    fn run_sarimax(
        &self,
        train: &Series,
        test: &Series,
        train_exog: Option<&ExogMatrix>,
        full_exog: Option<&ExogMatrix>,
    ) -> Result<TrainedFamily<SarimaOrder>> {
        let observer = TracingObserver;
        let mut tuner = Tuner::new(train)
            .with_config(self.config.search.clone())
            .with_observer(&observer);
        if let Some(x) = train_exog {
            tuner = tuner.with_exog(x);
        }
        let (order, search_score) =
            tuner.tune_sarimax(&self.config.seasonal_grid, self.config.period)?;

        let mut model = Sarimax::new(order, train_exog.cloned())?;
        model.fit(train)?;
        // Score against the regressor rows that align with the holdout.
        let future_exog = match full_exog {
            Some(x) => {
                let (_, tail) = x.split_at(train.len())?;
                Some(tail)
            }
            None => None,
        };
        let forecast = model.forecast_with_exog(test.len(), future_exog.as_ref())?;
        let family = self.evaluated(order, search_score, test, forecast.values())?;
        self.persist("SARIMAX_Tuned", &model)?;
        info!(order = %order, mse = family.holdout_mse, mae = family.holdout_mae, "trained SARIMAX");
        Ok(family)
    }

    fn evaluated<O>(
        &self,
        order: O,
        search_score: f64,
        test: &Series,
        predictions: &[f64],
    ) -> Result<TrainedFamily<O>> {
        Ok(TrainedFamily {
            order,
            search_score,
            holdout_mse: mse(test.values(), predictions)?,
            holdout_mae: mae(test.values(), predictions)?,
        })
    }

    fn persist<M: Serialize>(&self, name: &str, model: &M) -> Result<()> {
        if let Some(store) = self.store {
            store.save(name, model)?;
        }
        Ok(())
    }
}
