//! Numerical helpers shared by the forecasting models.

pub mod ols;
pub mod optimization;
pub mod stats;

pub use ols::{predict_rows, ridge_fit};
pub use optimization::{nelder_mead, NelderMeadConfig, NelderMeadResult};
pub use stats::{mean, quantile_normal, quantile_sorted, std_dev, variance};
