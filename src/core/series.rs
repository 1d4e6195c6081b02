//! Series data structure for time-indexed observations.

use crate::error::{PipelineError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An ordered sequence of real-valued observations indexed by strictly
/// increasing timestamps.
///
/// A `Series` is immutable once constructed; the ETL and decomposition
/// stages build new instances rather than mutating existing ones.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    timestamps: Vec<DateTime<Utc>>,
    values: Vec<f64>,
}

impl Series {
    /// Create a new series. Timestamps must strictly increase and match the
    /// value count.
    pub fn new(timestamps: Vec<DateTime<Utc>>, values: Vec<f64>) -> Result<Self> {
        if timestamps.len() != values.len() {
            return Err(PipelineError::DimensionMismatch {
                expected: timestamps.len(),
                got: values.len(),
            });
        }
        for i in 1..timestamps.len() {
            if timestamps[i] <= timestamps[i - 1] {
                return Err(PipelineError::TimestampError(
                    "timestamps must be strictly increasing".to_string(),
                ));
            }
        }
        Ok(Self { timestamps, values })
    }

    /// Number of observations.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the series is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Observation values in time order.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Timestamps in time order.
    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamps
    }

    /// The trailing `n` observations (fewer if the series is shorter).
    pub fn last(&self, n: usize) -> &[f64] {
        let start = self.values.len().saturating_sub(n);
        &self.values[start..]
    }

    /// Sub-series over `[start, end)`.
    pub fn slice(&self, start: usize, end: usize) -> Result<Series> {
        if end > self.len() || start > end {
            return Err(PipelineError::IndexOutOfBounds {
                index: end,
                size: self.len(),
            });
        }
        Ok(Series {
            timestamps: self.timestamps[start..end].to_vec(),
            values: self.values[start..end].to_vec(),
        })
    }

    /// Split into a non-overlapping train/test partition, reserving
    /// `test_fraction` of the observations (at least one) for the test tail.
    pub fn split_holdout(&self, test_fraction: f64) -> Result<(Series, Series)> {
        if !(0.0..1.0).contains(&test_fraction) || test_fraction == 0.0 {
            return Err(PipelineError::InvalidParameter(format!(
                "test_fraction must be in (0, 1), got {test_fraction}"
            )));
        }
        let n_test = ((self.len() as f64 * test_fraction) as usize).max(1);
        if n_test >= self.len() {
            return Err(PipelineError::InsufficientData {
                needed: n_test + 1,
                got: self.len(),
            });
        }
        let split = self.len() - n_test;
        Ok((self.slice(0, split)?, self.slice(split, self.len())?))
    }
}

/// An exogenous regressor matrix aligned index-for-index with a series.
///
/// Stored row-major: one row per observation, one column per regressor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExogMatrix {
    rows: Vec<Vec<f64>>,
    width: usize,
}

impl ExogMatrix {
    /// Create a matrix from observation rows. All rows must have the same
    /// non-zero width.
    pub fn new(rows: Vec<Vec<f64>>) -> Result<Self> {
        if rows.is_empty() {
            return Err(PipelineError::EmptyData);
        }
        let width = rows[0].len();
        if width == 0 {
            return Err(PipelineError::InvalidParameter(
                "exogenous matrix must have at least one column".to_string(),
            ));
        }
        for row in &rows {
            if row.len() != width {
                return Err(PipelineError::DimensionMismatch {
                    expected: width,
                    got: row.len(),
                });
            }
        }
        Ok(Self { rows, width })
    }

    /// Build a single-regressor matrix from a column of values.
    pub fn from_column(column: Vec<f64>) -> Result<Self> {
        Self::new(column.into_iter().map(|v| vec![v]).collect())
    }

    /// Number of observation rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if the matrix has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of regressor columns.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Observation rows.
    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    /// The last observation row.
    pub fn last_row(&self) -> &[f64] {
        &self.rows[self.rows.len() - 1]
    }

    /// A matrix repeating the last observed row `n` times. Used when a
    /// forecast needs future regressor values and none are supplied.
    pub fn held_last(&self, n: usize) -> ExogMatrix {
        ExogMatrix {
            rows: vec![self.last_row().to_vec(); n],
            width: self.width,
        }
    }

    /// Split rows at `index` into (head, tail).
    pub fn split_at(&self, index: usize) -> Result<(ExogMatrix, ExogMatrix)> {
        if index == 0 || index >= self.len() {
            return Err(PipelineError::IndexOutOfBounds {
                index,
                size: self.len(),
            });
        }
        Ok((
            ExogMatrix {
                rows: self.rows[..index].to_vec(),
                width: self.width,
            },
            ExogMatrix {
                rows: self.rows[index..].to_vec(),
                width: self.width,
            },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn make_timestamps(n: usize) -> Vec<DateTime<Utc>> {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        (0..n).map(|i| base + Duration::days(i as i64)).collect()
    }

    #[test]
    fn series_basic() {
        let s = Series::new(make_timestamps(5), vec![1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        assert_eq!(s.len(), 5);
        assert!(!s.is_empty());
        assert_eq!(s.values()[2], 3.0);
    }

    #[test]
    fn series_rejects_length_mismatch() {
        let err = Series::new(make_timestamps(3), vec![1.0, 2.0]).unwrap_err();
        assert!(matches!(err, PipelineError::DimensionMismatch { .. }));
    }

    #[test]
    fn series_rejects_duplicate_timestamps() {
        let mut ts = make_timestamps(3);
        ts[2] = ts[1];
        let err = Series::new(ts, vec![1.0, 2.0, 3.0]).unwrap_err();
        assert!(matches!(err, PipelineError::TimestampError(_)));
    }

    #[test]
    fn series_last_clamps() {
        let s = Series::new(make_timestamps(3), vec![1.0, 2.0, 3.0]).unwrap();
        assert_eq!(s.last(2), &[2.0, 3.0]);
        assert_eq!(s.last(10), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn holdout_split_is_non_overlapping() {
        let s = Series::new(make_timestamps(10), (0..10).map(|i| i as f64).collect()).unwrap();
        let (train, test) = s.split_holdout(0.2).unwrap();
        assert_eq!(train.len(), 8);
        assert_eq!(test.len(), 2);
        assert_eq!(test.values(), &[8.0, 9.0]);
    }

    #[test]
    fn holdout_split_reserves_at_least_one() {
        let s = Series::new(make_timestamps(4), vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let (train, test) = s.split_holdout(0.1).unwrap();
        assert_eq!(train.len(), 3);
        assert_eq!(test.len(), 1);
    }

    #[test]
    fn holdout_split_rejects_bad_fraction() {
        let s = Series::new(make_timestamps(4), vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        assert!(s.split_holdout(0.0).is_err());
        assert!(s.split_holdout(1.0).is_err());
    }

    #[test]
    fn exog_matrix_validates_widths() {
        let err = ExogMatrix::new(vec![vec![1.0, 2.0], vec![3.0]]).unwrap_err();
        assert!(matches!(err, PipelineError::DimensionMismatch { .. }));
    }

    #[test]
    fn exog_matrix_held_last() {
        let x = ExogMatrix::new(vec![vec![1.0], vec![2.0], vec![3.0]]).unwrap();
        let future = x.held_last(4);
        assert_eq!(future.len(), 4);
        assert!(future.rows().iter().all(|r| r == &[3.0]));
    }

    #[test]
    fn exog_matrix_split() {
        let x = ExogMatrix::from_column(vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let (head, tail) = x.split_at(3).unwrap();
        assert_eq!(head.len(), 3);
        assert_eq!(tail.len(), 1);
        assert_eq!(tail.rows()[0], vec![4.0]);
    }
}
