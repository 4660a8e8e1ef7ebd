//! Statistical tests used during model selection.

mod stationarity;

pub use stationarity::{kpss_test, ndiffs, StationarityResult};
