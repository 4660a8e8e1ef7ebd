//! Exponential smoothing models.
//!
//! Holt's additive-trend smoothing without seasonality.

mod holt;

pub use holt::ExponentialSmoothing;
