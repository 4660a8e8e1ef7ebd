//! Penalized least squares on a dense design matrix.
//!
//! Solves `min ||y - Xβ||² + Σ λ_j β_j²` through the normal equations with a
//! Cholesky factorisation. Used by the decomposition model to fit trend and
//! seasonality jointly.

use crate::error::{ForecastError, Result};

/// Fit `y ≈ X β` with per-coefficient ridge penalties.
///
/// # Arguments
/// * `rows` - Design matrix, one row per observation
/// * `y` - Target values, one per row
/// * `penalties` - Ridge weight per column (0 for unpenalized columns)
pub fn ridge_fit(rows: &[Vec<f64>], y: &[f64], penalties: &[f64]) -> Result<Vec<f64>> {
    if rows.is_empty() {
        return Err(ForecastError::InsufficientData { needed: 1, got: 0 });
    }
    if rows.len() != y.len() {
        return Err(ForecastError::ComputationError(format!(
            "design has {} rows but target has {}",
            rows.len(),
            y.len()
        )));
    }
    let k = penalties.len();
    if let Some(bad) = rows.iter().find(|r| r.len() != k) {
        return Err(ForecastError::ComputationError(format!(
            "design row has {} columns, expected {k}",
            bad.len()
        )));
    }

    let mut xtx = vec![vec![0.0; k]; k];
    let mut xty = vec![0.0; k];
    for (row, &target) in rows.iter().zip(y.iter()) {
        for i in 0..k {
            let xi = row[i];
            if xi == 0.0 {
                continue;
            }
            xty[i] += xi * target;
            for j in 0..=i {
                xtx[i][j] += xi * row[j];
            }
        }
    }
    for i in 0..k {
        for j in 0..i {
            xtx[j][i] = xtx[i][j];
        }
        // Small jitter keeps rank-deficient designs solvable.
        xtx[i][i] += penalties[i] + 1e-10;
    }

    solve_symmetric(&xtx, &xty).ok_or_else(|| {
        ForecastError::ComputationError("normal equations are not positive definite".into())
    })
}

/// Evaluate `X β` for each row.
pub fn predict_rows(rows: &[Vec<f64>], beta: &[f64]) -> Vec<f64> {
    rows.iter()
        .map(|row| row.iter().zip(beta.iter()).map(|(x, b)| x * b).sum())
        .collect()
}

/// Solve a symmetric positive definite system `A x = b` by Cholesky.
fn solve_symmetric(a: &[Vec<f64>], b: &[f64]) -> Option<Vec<f64>> {
    let n = b.len();
    if n == 0 || a.len() != n {
        return None;
    }

    let mut l = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in 0..=i {
            let mut sum = a[i][j];
            for k in 0..j {
                sum -= l[i][k] * l[j][k];
            }
            if i == j {
                if sum <= 0.0 || !sum.is_finite() {
                    return None;
                }
                l[i][j] = sum.sqrt();
            } else {
                l[i][j] = sum / l[j][j];
            }
        }
    }

    let mut z = vec![0.0; n];
    for i in 0..n {
        let mut sum = b[i];
        for j in 0..i {
            sum -= l[i][j] * z[j];
        }
        z[i] = sum / l[i][i];
    }

    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let mut sum = z[i];
        for j in (i + 1)..n {
            sum -= l[j][i] * x[j];
        }
        x[i] = sum / l[i][i];
    }

    Some(x)
}
