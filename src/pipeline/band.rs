//! Residual-based confidence band for backends without native intervals.

use crate::core::Forecast;
use crate::error::{ForecastError, Result};
use crate::utils::stats::std_dev;

/// Attach `point ± z·σ`, where `σ` is the sample standard deviation of the
/// finite in-sample residuals. The band has constant width.
pub fn residual_band(forecast: Forecast, residuals: &[f64], z: f64) -> Result<Forecast> {
    let finite: Vec<f64> = residuals.iter().copied().filter(|r| r.is_finite()).collect();
    if finite.len() < 2 {
        return Err(ForecastError::BackendFit(
            "too few residuals to size a confidence band".to_string(),
        ));
    }

    let sigma = std_dev(&finite);
    Ok(forecast.with_symmetric_band(z * sigma))
}
