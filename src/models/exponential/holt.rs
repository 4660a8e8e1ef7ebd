//! Holt's additive-trend exponential smoothing.
//!
//! Double exponential smoothing without seasonality. The initial level and
//! trend are estimated jointly with the smoothing parameters.

use crate::core::{Forecast, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::models::Forecaster;
use crate::utils::optimization::{nelder_mead, NelderMeadConfig};
use crate::utils::stats::std_dev;

const PARAM_BOUNDS: (f64, f64) = (0.0001, 0.9999);

/// Holt's linear trend forecaster with estimated initial states.
///
/// The model equations are:
/// - Level: `l_t = α × y_t + (1-α) × (l_{t-1} + b_{t-1})`
/// - Trend: `b_t = β × (l_t - l_{t-1}) + (1-β) × b_{t-1}`
/// - Forecast: `ŷ_{t+h} = l_t + h × b_t`
///
/// Only point forecasts are produced.
#[derive(Debug, Clone)]
pub struct ExponentialSmoothing {
    /// Fixed smoothing parameters; optimised when `None`.
    fixed: Option<(f64, f64)>,
    alpha: Option<f64>,
    beta: Option<f64>,
    initial_level: Option<f64>,
    initial_trend: Option<f64>,
    level: Option<f64>,
    trend: Option<f64>,
    fitted: Option<Vec<f64>>,
    residuals: Option<Vec<f64>>,
}

/// Smoothing parameters and initial states.
#[derive(Debug, Clone, Copy)]
struct HoltParams {
    alpha: f64,
    beta: f64,
    l0: f64,
    b0: f64,
}

impl ExponentialSmoothing {
    /// Create a model whose parameters and initial states are all estimated.
    pub fn new() -> Self {
        Self {
            fixed: None,
            alpha: None,
            beta: None,
            initial_level: None,
            initial_trend: None,
            level: None,
            trend: None,
            fitted: None,
            residuals: None,
        }
    }

    /// Fix the smoothing parameters; initial states are still estimated.
    pub fn with_smoothing(mut self, alpha: f64, beta: f64) -> Self {
        self.fixed = Some((
            alpha.clamp(PARAM_BOUNDS.0, PARAM_BOUNDS.1),
            beta.clamp(PARAM_BOUNDS.0, PARAM_BOUNDS.1),
        ));
        self
    }

    /// Get the level smoothing parameter.
    pub fn alpha(&self) -> Option<f64> {
        self.alpha
    }

    /// Get the trend smoothing parameter.
    pub fn beta(&self) -> Option<f64> {
        self.beta
    }

    /// Estimated level before the first observation.
    pub fn initial_level(&self) -> Option<f64> {
        self.initial_level
    }

    /// Estimated trend before the first observation.
    pub fn initial_trend(&self) -> Option<f64> {
        self.initial_trend
    }

    /// Get the final level.
    pub fn level(&self) -> Option<f64> {
        self.level
    }

    /// Get the final trend.
    pub fn trend(&self) -> Option<f64> {
        self.trend
    }

    /// Sample standard deviation of the one-step residuals.
    pub fn residual_std(&self) -> Option<f64> {
        self.residuals.as_deref().map(std_dev)
    }

    /// Run the recursions, returning one-step forecasts and final states.
    fn filter(values: &[f64], params: HoltParams) -> (Vec<f64>, f64, f64) {
        let mut l = params.l0;
        let mut b = params.b0;
        let mut fitted = Vec::with_capacity(values.len());

        for &y in values {
            let forecast = l + b;
            fitted.push(forecast);
            let l_prev = l;
            l = params.alpha * y + (1.0 - params.alpha) * (l_prev + b);
            b = params.beta * (l - l_prev) + (1.0 - params.beta) * b;
        }

        (fitted, l, b)
    }

    fn sse(values: &[f64], params: HoltParams) -> f64 {
        let (fitted, _, _) = Self::filter(values, params);
        values
            .iter()
            .zip(fitted.iter())
            .map(|(y, f)| (y - f).powi(2))
            .sum()
    }

    /// Heuristic starting states from the first observations.
    fn initial_states(values: &[f64]) -> (f64, f64) {
        let k = values.len().min(10);
        let trend = (values[k - 1] - values[0]) / (k - 1) as f64;
        (values[0] - trend, trend)
    }

    fn optimize(&self, values: &[f64]) -> HoltParams {
        let (l0, b0) = Self::initial_states(values);
        let config = NelderMeadConfig {
            max_iter: 2000,
            tolerance: 1e-10,
            ..Default::default()
        };
        let free = (f64::NEG_INFINITY, f64::INFINITY);

        match self.fixed {
            Some((alpha, beta)) => {
                let result = nelder_mead(
                    |s| Self::sse(values, HoltParams { alpha, beta, l0: s[0], b0: s[1] }),
                    &[l0, b0],
                    Some(&[free, free]),
                    config,
                );
                HoltParams {
                    alpha,
                    beta,
                    l0: result.optimal_point[0],
                    b0: result.optimal_point[1],
                }
            }
            None => {
                let unpack = |p: &[f64]| HoltParams {
                    alpha: p[0].clamp(PARAM_BOUNDS.0, PARAM_BOUNDS.1),
                    beta: p[1].clamp(PARAM_BOUNDS.0, PARAM_BOUNDS.1),
                    l0: p[2],
                    b0: p[3],
                };
                let result = nelder_mead(
                    |p| Self::sse(values, unpack(p)),
                    &[0.3, 0.1, l0, b0],
                    Some(&[PARAM_BOUNDS, PARAM_BOUNDS, free, free]),
                    config,
                );
                unpack(&result.optimal_point)
            }
        }
    }
}

impl Default for ExponentialSmoothing {
    fn default() -> Self {
        Self::new()
    }
}

impl Forecaster for ExponentialSmoothing {
    fn fit(&mut self, series: &TimeSeries) -> Result<()> {
        let values = series.values();
        let needed = self.min_observations();
        if values.len() < needed {
            return Err(ForecastError::InsufficientData {
                needed,
                got: values.len(),
            });
        }

        let params = self.optimize(values);
        let (fitted, level, trend) = Self::filter(values, params);
        if !level.is_finite() || !trend.is_finite() {
            return Err(ForecastError::ComputationError(
                "smoothing recursion diverged".to_string(),
            ));
        }

        let residuals: Vec<f64> = values
            .iter()
            .zip(fitted.iter())
            .map(|(y, f)| y - f)
            .collect();

        tracing::debug!(
            alpha = params.alpha,
            beta = params.beta,
            initial_level = params.l0,
            initial_trend = params.b0,
            "fitted exponential smoothing"
        );

        self.alpha = Some(params.alpha);
        self.beta = Some(params.beta);
        self.initial_level = Some(params.l0);
        self.initial_trend = Some(params.b0);
        self.level = Some(level);
        self.trend = Some(trend);
        self.fitted = Some(fitted);
        self.residuals = Some(residuals);
        Ok(())
    }

    fn predict(&self, horizon: usize) -> Result<Forecast> {
        let level = self.level.ok_or(ForecastError::FitRequired)?;
        let trend = self.trend.ok_or(ForecastError::FitRequired)?;

        let predictions = (1..=horizon).map(|h| level + h as f64 * trend).collect();
        Ok(Forecast::from_values(predictions))
    }

    fn fitted_values(&self) -> Option<&[f64]> {
        self.fitted.as_deref()
    }

    fn residuals(&self) -> Option<&[f64]> {
        self.residuals.as_deref()
    }

    fn name(&self) -> &str {
        "ExponentialSmoothing"
    }

    fn min_observations(&self) -> usize {
        5
    }
}
