//! Forecaster trait defining the capability set every backend provides.

use crate::core::{Forecast, TimeSeries};
use crate::error::Result;

/// Common interface for all forecasting backends.
///
/// This trait is object-safe and can be used with `Box<dyn Forecaster>`.
pub trait Forecaster: Send {
    /// Fit the model to the time series data.
    fn fit(&mut self, series: &TimeSeries) -> Result<()>;

    /// Generate point predictions for the specified horizon.
    fn predict(&self, horizon: usize) -> Result<Forecast>;

    /// Generate predictions with intervals at the given coverage level.
    ///
    /// Models without a native interval estimate return point predictions
    /// only; callers check [`Forecast::has_intervals`].
    fn predict_with_intervals(&self, horizon: usize, level: f64) -> Result<Forecast> {
        let _ = level;
        self.predict(horizon)
    }

    /// Get the fitted values (in-sample predictions).
    fn fitted_values(&self) -> Option<&[f64]>;

    /// Get the residuals (actual - fitted).
    fn residuals(&self) -> Option<&[f64]>;

    /// Get the model name.
    fn name(&self) -> &str;

    /// Fewest observations `fit` accepts.
    fn min_observations(&self) -> usize {
        2
    }

    /// Check if the model has been fitted.
    fn is_fitted(&self) -> bool {
        self.fitted_values().is_some()
    }
}

/// Type alias for boxed forecaster trait objects.
pub type BoxedForecaster = Box<dyn Forecaster>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::arima::ARIMA;
    use crate::models::decomposition::DecompositionModel;
    use crate::models::exponential::ExponentialSmoothing;
    use chrono::{Duration, TimeZone, Utc};

    fn make_test_series(n: usize) -> TimeSeries {
        let base = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let timestamps = (0..n).map(|i| base + Duration::days(i as i64)).collect();
        let values: Vec<f64> = (1..=n)
            .map(|i| i as f64 + (i as f64 * 0.7).sin())
            .collect();
        TimeSeries::univariate(timestamps, values).unwrap()
    }

    fn backends() -> Vec<BoxedForecaster> {
        vec![
            Box::new(DecompositionModel::new()),
            Box::new(ARIMA::new(1, 1, 0)),
            Box::new(ExponentialSmoothing::new()),
        ]
    }

    #[test]
    fn boxed_forecasters_start_unfitted() {
        for model in backends() {
            assert!(!model.is_fitted(), "{}", model.name());
            assert!(model.residuals().is_none());
        }
    }

    #[test]
    fn boxed_forecasters_fit_and_predict() {
        let ts = make_test_series(40);
        for mut model in backends() {
            model.fit(&ts).unwrap();
            assert!(model.is_fitted());
            let forecast = model.predict(5).unwrap();
            assert_eq!(forecast.horizon(), 5, "{}", model.name());
            assert!(forecast.is_finite());
        }
    }

    #[test]
    fn default_predict_with_intervals_is_point_only() {
        let ts = make_test_series(40);
        let mut model = ExponentialSmoothing::new();
        model.fit(&ts).unwrap();
        let forecast = model.predict_with_intervals(5, 0.95).unwrap();
        assert!(!forecast.has_intervals());
    }
}
