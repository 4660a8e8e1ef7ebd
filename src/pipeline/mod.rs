//! End-to-end forecasting: validate, normalize, fit, assemble.

mod band;
mod report;
mod table;

pub use band::residual_band;
pub use report::{ForecastReport, HEAD_PREVIEW_ROWS};
pub use table::{DisplayRow, ForecastRow, ForecastTable};

use std::io::Read;
use std::path::Path;

use crate::config::PipelineConfig;
use crate::core::{Forecast, TimeSeries};
use crate::error::{ErrorKind, ForecastError, Result};
use crate::ingest::{normalize, validate, RawTable};
use crate::models::Forecaster;

/// Runs one forecast per call with a fixed configuration.
///
/// Every run builds a fresh backend, so nothing carries over between runs.
///
/// # Example
/// ```
/// use forecast_pipeline::config::{BackendKind, PipelineConfig};
/// use forecast_pipeline::pipeline::ForecastPipeline;
///
/// let mut csv = String::from("date,value\n");
/// for day in 1..=28 {
///     csv.push_str(&format!("2023-02-{day:02},{}\n", 100 + day * 2 + day % 3));
/// }
///
/// let config = PipelineConfig::default()
///     .with_backend(BackendKind::ExponentialSmoothing)
///     .with_horizon(7);
/// let report = ForecastPipeline::new(config)
///     .unwrap()
///     .run_csv(csv.as_bytes())
///     .unwrap();
///
/// assert_eq!(report.table.len(), 7);
/// assert_eq!(report.preview[0].date, "2023-03-01");
/// ```
#[derive(Debug, Clone)]
pub struct ForecastPipeline {
    config: PipelineConfig,
}

impl ForecastPipeline {
    /// Create a pipeline after checking the configuration.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        if !config.horizon_in_recommended_range() {
            tracing::warn!(
                horizon = config.forecast_horizon,
                "forecast horizon outside the recommended 7-365 day range"
            );
        }
        Ok(Self { config })
    }

    /// The active configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Validate and normalize a table for the configured backend.
    pub fn load_series(&self, table: &RawTable) -> Result<TimeSeries> {
        let columns = validate(table)?;
        let min_observations = self.config.backend.create(&self.config).min_observations();
        normalize(table, columns, min_observations)
    }

    /// Forecast from CSV text.
    pub fn run_csv<R: Read>(&self, reader: R) -> Result<ForecastReport> {
        let table = RawTable::from_reader(reader)?;
        let series = self.load_series(&table)?;
        self.run(&series)
    }

    /// Forecast from a CSV file.
    pub fn run_path(&self, path: &Path) -> Result<ForecastReport> {
        let table = RawTable::from_path(path)?;
        let series = self.load_series(&table)?;
        self.run(&series)
    }

    /// Fit the configured backend to `series` and build the report.
    pub fn run(&self, series: &TimeSeries) -> Result<ForecastReport> {
        let backend = self.config.backend;
        let horizon = self.config.forecast_horizon;
        tracing::info!(
            %backend,
            horizon,
            observations = series.len(),
            "starting forecast run"
        );

        let mut model = backend.create(&self.config);
        let needed = model.min_observations().max(2);
        if series.len() < needed {
            return Err(ForecastError::InsufficientData {
                needed,
                got: series.len(),
            });
        }
        if series.is_constant() {
            return Err(ForecastError::Data("all values are identical".to_string()));
        }

        model.fit(series).map_err(into_backend_error)?;
        let forecast = self.forecast(model.as_ref(), horizon)?;
        if forecast.horizon() != horizon || !forecast.is_finite() {
            return Err(ForecastError::BackendFit(format!(
                "{} produced {} usable predictions for a horizon of {horizon}",
                model.name(),
                if forecast.is_finite() { forecast.horizon() } else { 0 },
            )));
        }

        let timestamps = series.future_timestamps(horizon)?;
        let table = ForecastTable::assemble(&timestamps, &forecast)?;
        if table.clamped_rows() > 0 {
            tracing::warn!(
                rows = table.clamped_rows(),
                "bounds clamped to contain the point estimate"
            );
        }

        let report = ForecastReport {
            backend,
            model: model.name().to_string(),
            horizon,
            history: series.observations().collect(),
            fitted: model.fitted_values().map(<[f64]>::to_vec),
            preview: table.tail(horizon),
            head: series.head(HEAD_PREVIEW_ROWS),
            table,
        };

        tracing::info!(rows = report.table.len(), model = %report.model, "forecast run finished");
        Ok(report)
    }

    fn forecast(&self, model: &dyn Forecaster, horizon: usize) -> Result<Forecast> {
        if let Some(level) = self.config.backend.interval_level(&self.config) {
            model
                .predict_with_intervals(horizon, level)
                .map_err(into_backend_error)
        } else {
            let forecast = model.predict(horizon).map_err(into_backend_error)?;
            let residuals = model.residuals().ok_or(ForecastError::FitRequired)?;
            residual_band(forecast, residuals, self.config.residual_z)
        }
    }
}

/// Keep data errors as they are; everything else a model raises is a fit
/// failure.
fn into_backend_error(err: ForecastError) -> ForecastError {
    if err.kind() == ErrorKind::Data || matches!(err, ForecastError::BackendFit(_)) {
        err
    } else {
        ForecastError::BackendFit(err.to_string())
    }
}
