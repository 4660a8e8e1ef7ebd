//! Pipeline configuration.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ForecastError, Result};
use crate::models::arima::AutoARIMA;
use crate::models::decomposition::{DecompositionModel, DEFAULT_SEED};
use crate::models::exponential::ExponentialSmoothing;
use crate::models::BoxedForecaster;

/// Horizons outside this range are accepted but logged.
pub const RECOMMENDED_HORIZON: std::ops::RangeInclusive<usize> = 7..=365;

/// Forecasting method used by a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackendKind {
    /// Piecewise-linear trend plus Fourier seasonality.
    #[default]
    Decomposition,
    /// Stepwise-selected non-seasonal ARIMA.
    AutoArima,
    /// Holt's additive-trend smoothing.
    ExponentialSmoothing,
}

impl BackendKind {
    /// All backends, in display order.
    pub const ALL: [BackendKind; 3] = [
        BackendKind::Decomposition,
        BackendKind::AutoArima,
        BackendKind::ExponentialSmoothing,
    ];

    /// The configuration name.
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Decomposition => "decomposition",
            BackendKind::AutoArima => "auto-arima",
            BackendKind::ExponentialSmoothing => "exponential-smoothing",
        }
    }

    /// Whether the backend produces its own prediction intervals.
    ///
    /// Backends without them get a residual band from the pipeline.
    pub fn native_intervals(&self) -> bool {
        !matches!(self, BackendKind::ExponentialSmoothing)
    }

    /// Interval coverage the backend is asked for, or `None` when the
    /// pipeline builds the band from residuals instead.
    pub fn interval_level(&self, config: &PipelineConfig) -> Option<f64> {
        match self {
            BackendKind::Decomposition => Some(config.interval_width),
            BackendKind::AutoArima => Some(config.confidence_level),
            BackendKind::ExponentialSmoothing => None,
        }
    }

    /// Build a fresh, unfitted backend.
    pub fn create(&self, config: &PipelineConfig) -> BoxedForecaster {
        match self {
            BackendKind::Decomposition => Box::new(
                DecompositionModel::new()
                    .with_seed(config.seed)
                    .with_uncertainty_samples(config.uncertainty_samples),
            ),
            BackendKind::AutoArima => Box::new(AutoARIMA::new()),
            BackendKind::ExponentialSmoothing => Box::new(ExponentialSmoothing::new()),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self> {
        BackendKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s.trim())
            .ok_or_else(|| {
                ForecastError::InvalidParameter(format!(
                    "unknown backend {s:?}; expected decomposition, auto-arima or exponential-smoothing"
                ))
            })
    }
}

/// Settings for one pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Number of future daily periods.
    pub forecast_horizon: usize,
    /// Forecasting method.
    pub backend: BackendKind,
    /// Interval coverage for AutoARIMA; unused by exponential smoothing.
    pub confidence_level: f64,
    /// Interval coverage for the decomposition model.
    pub interval_width: f64,
    /// Multiplier of the residual standard deviation for the exponential
    /// smoothing band.
    pub residual_z: f64,
    /// Seed for the decomposition model's simulation.
    pub seed: u64,
    /// Simulated paths for the decomposition model's intervals.
    pub uncertainty_samples: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            forecast_horizon: 90,
            backend: BackendKind::Decomposition,
            confidence_level: 0.95,
            interval_width: 0.80,
            residual_z: 1.96,
            seed: DEFAULT_SEED,
            uncertainty_samples: 1000,
        }
    }
}

impl PipelineConfig {
    /// Set the forecast horizon.
    pub fn with_horizon(mut self, horizon: usize) -> Self {
        self.forecast_horizon = horizon;
        self
    }

    /// Set the backend.
    pub fn with_backend(mut self, backend: BackendKind) -> Self {
        self.backend = backend;
        self
    }

    /// Set the ARIMA interval coverage.
    pub fn with_confidence_level(mut self, level: f64) -> Self {
        self.confidence_level = level;
        self
    }

    /// Set the decomposition interval coverage.
    pub fn with_interval_width(mut self, width: f64) -> Self {
        self.interval_width = width;
        self
    }

    /// Set the residual band multiplier.
    pub fn with_residual_z(mut self, z: f64) -> Self {
        self.residual_z = z;
        self
    }

    /// Set the simulation seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the number of simulated paths.
    pub fn with_uncertainty_samples(mut self, samples: usize) -> Self {
        self.uncertainty_samples = samples;
        self
    }

    /// Parse from JSON; absent fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| ForecastError::InvalidParameter(format!("bad configuration: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every setting is usable.
    pub fn validate(&self) -> Result<()> {
        if self.forecast_horizon == 0 {
            return Err(ForecastError::InvalidParameter(
                "forecast horizon must be positive".to_string(),
            ));
        }
        for (name, level) in [
            ("confidence_level", self.confidence_level),
            ("interval_width", self.interval_width),
        ] {
            if !(level > 0.0 && level < 1.0) {
                return Err(ForecastError::InvalidParameter(format!(
                    "{name} must be in (0, 1), got {level}"
                )));
            }
        }
        if !(self.residual_z.is_finite() && self.residual_z >= 0.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "residual_z must be a non-negative number, got {}",
                self.residual_z
            )));
        }
        if self.uncertainty_samples == 0 {
            return Err(ForecastError::InvalidParameter(
                "uncertainty_samples must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Whether the horizon lies in the recommended 7–365 day range.
    pub fn horizon_in_recommended_range(&self) -> bool {
        RECOMMENDED_HORIZON.contains(&self.forecast_horizon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::models::Forecaster;

    #[test]
    fn defaults_match_documented_values() {
        let config = PipelineConfig::default();
        assert_eq!(config.forecast_horizon, 90);
        assert_eq!(config.backend, BackendKind::Decomposition);
        assert_eq!(config.interval_width, 0.80);
        assert_eq!(config.confidence_level, 0.95);
        assert_eq!(config.residual_z, 1.96);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn backend_names_round_trip() {
        for kind in BackendKind::ALL {
            assert_eq!(kind.to_string().parse::<BackendKind>().unwrap(), kind);
        }
        assert_eq!("auto-arima".parse::<BackendKind>().unwrap(), BackendKind::AutoArima);
        let err = "prophet".parse::<BackendKind>().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }

    #[test]
    fn json_uses_defaults_for_missing_fields() {
        let json = r#"{"forecast_horizon": 30, "backend": "exponential-smoothing"}"#;
        let config = PipelineConfig::from_json_str(json).unwrap();
        assert_eq!(config.forecast_horizon, 30);
        assert_eq!(config.backend, BackendKind::ExponentialSmoothing);
        assert_eq!(config.uncertainty_samples, 1000);
    }

    #[test]
    fn json_rejects_unknown_backend_and_bad_values() {
        assert!(PipelineConfig::from_json_str(r#"{"backend": "lstm"}"#).is_err());
        assert!(PipelineConfig::from_json_str(r#"{"forecast_horizon": 0}"#).is_err());
        assert!(PipelineConfig::from_json_str(r#"{"interval_width": 1.0}"#).is_err());
    }

    #[test]
    fn validate_rejects_out_of_range_levels() {
        let config = PipelineConfig::default().with_confidence_level(0.0);
        assert!(config.validate().is_err());
        let config = PipelineConfig::default().with_horizon(0);
        assert_eq!(config.validate().unwrap_err().kind(), ErrorKind::Config);
    }

    #[test]
    fn recommended_range() {
        assert!(PipelineConfig::default().horizon_in_recommended_range());
        assert!(!PipelineConfig::default().with_horizon(400).horizon_in_recommended_range());
        assert!(!PipelineConfig::default().with_horizon(3).horizon_in_recommended_range());
    }

    #[test]
    fn native_intervals_by_backend() {
        assert!(BackendKind::Decomposition.native_intervals());
        assert!(BackendKind::AutoArima.native_intervals());
        assert!(!BackendKind::ExponentialSmoothing.native_intervals());

        let config = PipelineConfig::default();
        assert_eq!(BackendKind::Decomposition.interval_level(&config), Some(0.80));
        assert_eq!(BackendKind::AutoArima.interval_level(&config), Some(0.95));
        assert_eq!(BackendKind::ExponentialSmoothing.interval_level(&config), None);
        for kind in BackendKind::ALL {
            assert_eq!(kind.interval_level(&config).is_some(), kind.native_intervals());
        }
        assert_eq!(BackendKind::AutoArima.create(&config).name(), "AutoARIMA");
    }
}
