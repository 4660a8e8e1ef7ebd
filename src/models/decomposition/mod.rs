//! Additive decomposition forecasting: piecewise-linear trend with
//! changepoints plus Fourier seasonality.

mod model;
mod seasonality;
mod trend;

pub use model::{DecompositionModel, SeasonalityToggle, DEFAULT_SEED};
pub use seasonality::SeasonalityTerm;
