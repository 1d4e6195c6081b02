//! Ordinary least squares regression on an exogenous matrix.
//!
//! Used by the regressor-augmented model family: the series is regressed on
//! the exogenous matrix and the regression residual is handed to the
//! seasonal model.

use crate::core::ExogMatrix;
use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};

/// Fitted OLS coefficients: `y ≈ intercept + X · coefficients`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OlsFit {
    /// Intercept term.
    pub intercept: f64,
    /// One coefficient per regressor column.
    pub coefficients: Vec<f64>,
}

impl OlsFit {
    /// Predicted values for the given observation rows.
    pub fn predict(&self, exog: &ExogMatrix) -> Result<Vec<f64>> {
        if exog.width() != self.coefficients.len() {
            return Err(PipelineError::DimensionMismatch {
                expected: self.coefficients.len(),
                got: exog.width(),
            });
        }
        Ok(exog
            .rows()
            .iter()
            .map(|row| {
                self.intercept
                    + row
                        .iter()
                        .zip(self.coefficients.iter())
                        .map(|(x, b)| x * b)
                        .sum::<f64>()
            })
            .collect())
    }
}

/// Fit `y = intercept + X · beta` by solving the normal equations with a
/// Cholesky decomposition. A singular design matrix is a fit failure.
pub fn ols_fit(y: &[f64], exog: &ExogMatrix) -> Result<OlsFit> {
    let n = y.len();
    if n == 0 {
        return Err(PipelineError::EmptyData);
    }
    if exog.len() != n {
        return Err(PipelineError::DimensionMismatch {
            expected: n,
            got: exog.len(),
        });
    }

    let k = exog.width() + 1; // intercept column first
    if n < k {
        return Err(PipelineError::InsufficientData { needed: k, got: n });
    }

    // Normal equations: (X'X) beta = X'y, with X carrying a leading 1s column.
    let mut xtx = vec![vec![0.0; k]; k];
    let mut xty = vec![0.0; k];
    for (row, &target) in exog.rows().iter().zip(y.iter()) {
        let mut design = Vec::with_capacity(k);
        design.push(1.0);
        design.extend_from_slice(row);
        for i in 0..k {
            xty[i] += design[i] * target;
            for j in 0..k {
                xtx[i][j] += design[i] * design[j];
            }
        }
    }

    let beta = cholesky_solve(&xtx, &xty)?;
    Ok(OlsFit {
        intercept: beta[0],
        coefficients: beta[1..].to_vec(),
    })
}

/// Solve `A x = b` for symmetric positive-definite `A`.
fn cholesky_solve(a: &[Vec<f64>], b: &[f64]) -> Result<Vec<f64>> {
    let n = b.len();
    let mut chol = vec![vec![0.0; n]; n];

    for i in 0..n {
        for j in 0..=i {
            let mut sum = a[i][j];
            for p in 0..j {
                sum -= chol[i][p] * chol[j][p];
            }
            if i == j {
                if sum <= 1e-12 {
                    return Err(PipelineError::FitFailure(
                        "singular regressor matrix in least squares".to_string(),
                    ));
                }
                chol[i][j] = sum.sqrt();
            } else {
                chol[i][j] = sum / chol[j][j];
            }
        }
    }

    // Forward then backward substitution.
    let mut z = vec![0.0; n];
    for i in 0..n {
        let mut sum = b[i];
        for p in 0..i {
            sum -= chol[i][p] * z[p];
        }
        z[i] = sum / chol[i][i];
    }
    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let mut sum = z[i];
        for p in i + 1..n {
            sum -= chol[p][i] * x[p];
        }
        x[i] = sum / chol[i][i];
    }
    Ok(x)
}
