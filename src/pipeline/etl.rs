//! CSV extraction and cleaning for raw observation files.

use crate::core::Series;
use crate::error::{PipelineError, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Source of raw CSV bytes keyed by object name.
pub trait RawSource {
    fn fetch(&self, key: &str) -> Result<Vec<u8>>;
}

/// A directory of raw files, addressed by file name.
#[derive(Debug, Clone)]
pub struct LocalBucket {
    root: PathBuf,
}

impl LocalBucket {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl RawSource for LocalBucket {
    fn fetch(&self, key: &str) -> Result<Vec<u8>> {
        Ok(fs::read(self.root.join(key))?)
    }
}

/// Column names expected in raw observation CSVs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CsvSchema {
    pub date_column: String,
    pub value_column: String,
}

impl Default for CsvSchema {
    fn default() -> Self {
        Self {
            date_column: "Date".to_string(),
            value_column: "Views".to_string(),
        }
    }
}

/// Extracts a raw CSV, drops malformed rows, and writes the cleaned series
/// to a processed CSV.
pub struct EtlPipeline<S> {
    source: S,
    schema: CsvSchema,
}

impl<S: RawSource> EtlPipeline<S> {
    pub fn new(source: S, schema: CsvSchema) -> Self {
        Self { source, schema }
    }

    /// Fetch `key` from the source and parse it into a series. Rows whose
    /// date or value fails to parse are dropped with a warning.
    pub fn extract(&self, key: &str) -> Result<Series> {
        let bytes = self.source.fetch(key)?;
        let mut reader = csv::Reader::from_reader(bytes.as_slice());

        let headers = reader.headers()?.clone();
        let date_at = column_index(&headers, &self.schema.date_column)?;
        let value_at = column_index(&headers, &self.schema.value_column)?;

        let mut timestamps = Vec::new();
        let mut values = Vec::new();
        let mut dropped = 0usize;
        for (row, record) in reader.records().enumerate() {
            let record = record?;
            let date_field = record.get(date_at).unwrap_or("");
            let value_field = record.get(value_at).unwrap_or("");
            match (parse_date(date_field), value_field.trim().parse::<f64>()) {
                (Some(ts), Ok(value)) if value.is_finite() => {
                    timestamps.push(ts);
                    values.push(value);
                }
                _ => {
                    dropped += 1;
                    warn!(row, date = date_field, value = value_field, "dropped malformed row");
                }
            }
        }

        info!(key, rows = values.len(), dropped, "extracted series");
        Series::new(timestamps, values)
    }

    /// Extract `key` and write the cleaned rows to `output`.
    pub fn run(&self, key: &str, output: &Path) -> Result<Series> {
        let series = self.extract(key)?;
        write_series_csv(&series, &self.schema, output)?;
        info!(output = %output.display(), "wrote processed series");
        Ok(series)
    }
}

fn column_index(headers: &csv::StringRecord, name: &str) -> Result<usize> {
    headers
        .iter()
        .position(|h| h == name)
        .ok_or_else(|| PipelineError::Csv(format!("missing column '{name}'")))
}

/// Accepts ISO dates, with or without a time component.
fn parse_date(field: &str) -> Option<DateTime<Utc>> {
    let field = field.trim();
    if let Ok(ts) = field.parse::<DateTime<Utc>>() {
        return Some(ts);
    }
    NaiveDate::parse_from_str(field, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// Write a series as a two-column CSV using the schema's column names.
pub fn write_series_csv(series: &Series, schema: &CsvSchema, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record([&schema.date_column, &schema.value_column])?;
    for (ts, value) in series.timestamps().iter().zip(series.values()) {
        writer.write_record([ts.format("%Y-%m-%d").to_string(), value.to_string()])?;
    }
    writer.flush()?;
    Ok(())
}

/// Load a processed two-column CSV from disk.
pub fn load_series_csv(path: &Path, schema: &CsvSchema) -> Result<Series> {
    let pipeline = EtlPipeline::new(
        LocalBucket::new(path.parent().unwrap_or_else(|| Path::new("."))),
        schema.clone(),
    );
    let key = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| PipelineError::Io(format!("bad path {}", path.display())))?;
    pipeline.extract(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MemorySource(HashMap<String, Vec<u8>>);

    impl RawSource for MemorySource {
        fn fetch(&self, key: &str) -> Result<Vec<u8>> {
            self.0
                .get(key)
                .cloned()
                .ok_or_else(|| PipelineError::Storage(format!("no object '{key}'")))
        }
    }

    fn source_with(key: &str, body: &str) -> MemorySource {
        let mut map = HashMap::new();
        map.insert(key.to_string(), body.as_bytes().to_vec());
        MemorySource(map)
    }

    #[test]
    fn extracts_well_formed_rows() {
        let csv = "Date,Views\n2024-01-01,10\n2024-01-02,12.5\n2024-01-03,9\n";
        let pipeline = EtlPipeline::new(source_with("views.csv", csv), CsvSchema::default());
        let series = pipeline.extract("views.csv").unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series.values(), &[10.0, 12.5, 9.0]);
    }

    #[test]
    fn drops_malformed_rows() {
        let csv = "Date,Views\n2024-01-01,10\nnot-a-date,11\n2024-01-03,oops\n2024-01-04,13\n";
        let pipeline = EtlPipeline::new(source_with("views.csv", csv), CsvSchema::default());
        let series = pipeline.extract("views.csv").unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.values(), &[10.0, 13.0]);
    }

    #[test]
    fn missing_column_is_an_error() {
        let csv = "Date,Clicks\n2024-01-01,10\n";
        let pipeline = EtlPipeline::new(source_with("views.csv", csv), CsvSchema::default());
        let err = pipeline.extract("views.csv").unwrap_err();
        assert!(matches!(err, PipelineError::Csv(_)));
    }

    #[test]
    fn round_trips_through_processed_csv() {
        let csv = "Date,Views\n2024-01-01,10\n2024-01-02,12\n";
        let pipeline = EtlPipeline::new(source_with("views.csv", csv), CsvSchema::default());

        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("processed.csv");
        let written = pipeline.run("views.csv", &out).unwrap();
        let loaded = load_series_csv(&out, &CsvSchema::default()).unwrap();
        assert_eq!(written, loaded);
    }

    #[test]
    fn local_bucket_reads_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("raw.csv"), "Date,Views\n2024-01-01,5\n").unwrap();
        let pipeline = EtlPipeline::new(LocalBucket::new(dir.path()), CsvSchema::default());
        let series = pipeline.extract("raw.csv").unwrap();
        assert_eq!(series.values(), &[5.0]);
    }
}
