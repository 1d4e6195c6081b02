//! Fitted-model persistence as JSON documents on disk.

use crate::error::{PipelineError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use tracing::info;

/// Stores fitted models under a directory, one JSON file per model name.
#[derive(Debug, Clone)]
pub struct ModelStore {
    dir: PathBuf,
}

impl ModelStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.json"))
    }

    /// Serialize `model` under `name`, replacing any existing document.
    pub fn save<M: Serialize>(&self, name: &str, model: &M) -> Result<PathBuf> {
        let path = self.path_for(name);
        let json = serde_json::to_string_pretty(model)?;
        fs::write(&path, json)?;
        info!(name, path = %path.display(), "saved model");
        Ok(path)
    }

    /// Load the model stored under `name`.
    pub fn load<M: DeserializeOwned>(&self, name: &str) -> Result<M> {
        let path = self.path_for(name);
        if !path.exists() {
            return Err(PipelineError::ModelNotFound(name.to_string()));
        }
        let json = fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Whether a model is stored under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.path_for(name).exists()
    }

    /// Names of all stored models.
    pub fn list(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|e| e == "json") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    names.push(stem.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Series;
    use crate::models::{Arima, Forecaster, PlainOrder};
    use chrono::{Duration, TimeZone, Utc};

    fn fitted_model() -> Arima {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let values: Vec<f64> = (0..40).map(|i| 5.0 + (i as f64 * 0.7).sin()).collect();
        let timestamps = (0..40).map(|i| base + Duration::days(i as i64)).collect();
        let series = Series::new(timestamps, values).unwrap();
        let mut model = Arima::new(PlainOrder::new(1, 0, 1));
        model.fit(&series).unwrap();
        model
    }

    #[test]
    fn round_trips_a_fitted_model() {
        let dir = tempfile::tempdir().unwrap();
        let store = ModelStore::open(dir.path()).unwrap();
        let model = fitted_model();

        store.save("ARIMA_Tuned", &model).unwrap();
        assert!(store.contains("ARIMA_Tuned"));

        let restored: Arima = store.load("ARIMA_Tuned").unwrap();
        assert_eq!(
            model.forecast(11).unwrap().values(),
            restored.forecast(11).unwrap().values()
        );
    }

    #[test]
    fn missing_model_is_reported_by_name() {
        let dir = tempfile::tempdir().unwrap();
        let store = ModelStore::open(dir.path()).unwrap();
        let err = store.load::<Arima>("SARIMA_Tuned").unwrap_err();
        assert_eq!(err, PipelineError::ModelNotFound("SARIMA_Tuned".to_string()));
    }

    #[test]
    fn lists_stored_models() {
        let dir = tempfile::tempdir().unwrap();
        let store = ModelStore::open(dir.path()).unwrap();
        let model = fitted_model();
        store.save("B_model", &model).unwrap();
        store.save("A_model", &model).unwrap();
        assert_eq!(store.list().unwrap(), vec!["A_model", "B_model"]);
    }
}
