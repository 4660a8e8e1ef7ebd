//! # forecast-pipeline
//!
//! Daily time series forecasting from uploaded CSV data.
//!
//! A [`ForecastPipeline`](pipeline::ForecastPipeline) reads a CSV with `date`
//! and `value` columns, normalizes it into a [`TimeSeries`](core::TimeSeries),
//! fits one of three backends and returns a forecast table with uncertainty
//! bounds for every future day:
//!
//! - an additive trend + seasonality decomposition with automatic changepoints,
//! - AutoARIMA with stepwise order selection,
//! - Holt's additive-trend exponential smoothing.
//!
//! The crate emits `tracing` events but never installs a subscriber.

#![allow(clippy::upper_case_acronyms)]
#![allow(clippy::needless_range_loop)]

pub mod config;
pub mod core;
pub mod error;
pub mod ingest;
pub mod models;
pub mod pipeline;
pub mod utils;
pub mod validation;

pub use error::{ErrorKind, ForecastError, Result};

pub mod prelude {
    pub use crate::config::{BackendKind, PipelineConfig};
    pub use crate::core::{Forecast, Observation, TimeSeries};
    pub use crate::error::{ErrorKind, ForecastError, Result};
    pub use crate::models::Forecaster;
    pub use crate::pipeline::{ForecastPipeline, ForecastReport, ForecastRow, ForecastTable};
}
