//! Forecasting models.

mod traits;

pub mod arima;
pub mod decomposition;
pub mod exponential;

pub use traits::{BoxedForecaster, Forecaster};
