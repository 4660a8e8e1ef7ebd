//! ARIMA (Autoregressive Integrated Moving Average) models.
//!
//! This module provides:
//! - ARIMA models fitted by conditional sum of squares
//! - AutoARIMA for stepwise order selection

mod auto_arima;
mod diff;
mod model;

pub use auto_arima::{AutoARIMA, AutoARIMAConfig, ModelOrder};
pub use diff::{difference, integrate};
pub use model::{ARIMASpec, ARIMA};
