//! Additive trend + seasonality decomposition forecaster.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Exp1, StandardNormal};

use super::seasonality::SeasonalityTerm;
use super::trend::{select_changepoints, trend_features, trend_width};
use crate::core::{Forecast, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::models::Forecaster;
use crate::utils::ols::{predict_rows, ridge_fit};
use crate::utils::stats::{quantile_sorted, variance};

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Default seed for the uncertainty simulation.
pub const DEFAULT_SEED: u64 = 0x5EED_F0CA;

/// Whether a seasonal component is included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SeasonalityToggle {
    /// Included when the history is long enough.
    #[default]
    Auto,
    /// Always included.
    On,
    /// Never included.
    Off,
}

impl SeasonalityToggle {
    fn resolve(self, span_days: f64, required_days: f64) -> bool {
        match self {
            SeasonalityToggle::Auto => span_days >= required_days,
            SeasonalityToggle::On => true,
            SeasonalityToggle::Off => false,
        }
    }
}

/// State learned by `fit`.
#[derive(Debug, Clone)]
struct FittedState {
    /// Length of the history in days; maps days to trend time.
    t_scale: f64,
    last_t_days: f64,
    y_scale: f64,
    changepoints: Vec<f64>,
    terms: Vec<SeasonalityTerm>,
    beta: Vec<f64>,
    /// Observation noise on the scaled target.
    sigma_obs: f64,
    fitted: Vec<f64>,
    residuals: Vec<f64>,
}

impl FittedState {
    fn design_row(&self, t_days: f64) -> Vec<f64> {
        design_row(t_days, self.t_scale, &self.changepoints, &self.terms)
    }

    fn deltas(&self) -> &[f64] {
        &self.beta[2..2 + self.changepoints.len()]
    }

    /// Point predictions `h = 1..=horizon` days after the history, scaled.
    fn future_points(&self, horizon: usize) -> Vec<f64> {
        let rows: Vec<Vec<f64>> = (1..=horizon)
            .map(|h| self.design_row(self.last_t_days + h as f64))
            .collect();
        predict_rows(&rows, &self.beta)
    }
}

fn design_row(
    t_days: f64,
    t_scale: f64,
    changepoints: &[f64],
    terms: &[SeasonalityTerm],
) -> Vec<f64> {
    let width =
        trend_width(changepoints.len()) + terms.iter().map(|s| s.width()).sum::<usize>();
    let mut row = Vec::with_capacity(width);
    trend_features(t_days / t_scale, changepoints, &mut row);
    for term in terms {
        term.features(t_days, &mut row);
    }
    row
}

/// Additive decomposition model: piecewise-linear trend with automatic
/// changepoints plus Fourier seasonalities.
///
/// Trend and seasonal coefficients are estimated jointly by penalized least
/// squares on the target scaled by its maximum absolute value. Changepoint
/// rate adjustments carry a ridge penalty `σ² / τ²`, with `σ²` estimated
/// from first differences and `τ` the changepoint prior scale.
///
/// Prediction intervals come from simulated future paths: new trend
/// changepoints arrive at the historical rate with Laplace-distributed rate
/// changes, and Gaussian observation noise is added on top.
///
/// # Example
/// ```
/// use chrono::{Duration, TimeZone, Utc};
/// use forecast_pipeline::core::TimeSeries;
/// use forecast_pipeline::models::decomposition::DecompositionModel;
/// use forecast_pipeline::models::Forecaster;
///
/// let base = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
/// let timestamps = (0..60).map(|i| base + Duration::days(i)).collect();
/// let values = (0..60).map(|i| 10.0 + i as f64 * 0.5).collect();
/// let series = TimeSeries::univariate(timestamps, values).unwrap();
///
/// let mut model = DecompositionModel::new();
/// model.fit(&series).unwrap();
/// let forecast = model.predict_with_intervals(7, 0.8).unwrap();
/// assert_eq!(forecast.horizon(), 7);
/// assert!(forecast.has_intervals());
/// ```
#[derive(Debug, Clone)]
pub struct DecompositionModel {
    n_changepoints: usize,
    changepoint_range: f64,
    changepoint_prior_scale: f64,
    seasonality_prior_scale: f64,
    weekly: SeasonalityToggle,
    yearly: SeasonalityToggle,
    uncertainty_samples: usize,
    seed: u64,
    state: Option<FittedState>,
}

impl DecompositionModel {
    /// Create a model with 25 changepoints over the first 80% of history.
    pub fn new() -> Self {
        Self {
            n_changepoints: 25,
            changepoint_range: 0.8,
            changepoint_prior_scale: 0.05,
            seasonality_prior_scale: 10.0,
            weekly: SeasonalityToggle::Auto,
            yearly: SeasonalityToggle::Auto,
            uncertainty_samples: 1000,
            seed: DEFAULT_SEED,
            state: None,
        }
    }

    /// Set the number of potential changepoints.
    pub fn with_changepoints(mut self, n: usize) -> Self {
        self.n_changepoints = n;
        self
    }

    /// Set the share of history eligible for changepoints.
    pub fn with_changepoint_range(mut self, range: f64) -> Self {
        self.changepoint_range = range.clamp(0.0, 1.0);
        self
    }

    /// Set the changepoint prior scale (larger allows a more flexible trend).
    pub fn with_changepoint_prior_scale(mut self, scale: f64) -> Self {
        self.changepoint_prior_scale = scale;
        self
    }

    /// Set the seasonality prior scale.
    pub fn with_seasonality_prior_scale(mut self, scale: f64) -> Self {
        self.seasonality_prior_scale = scale;
        self
    }

    /// Control the weekly component.
    pub fn with_weekly_seasonality(mut self, toggle: SeasonalityToggle) -> Self {
        self.weekly = toggle;
        self
    }

    /// Control the yearly component.
    pub fn with_yearly_seasonality(mut self, toggle: SeasonalityToggle) -> Self {
        self.yearly = toggle;
        self
    }

    /// Set the number of simulated paths used for intervals.
    pub fn with_uncertainty_samples(mut self, samples: usize) -> Self {
        self.uncertainty_samples = samples;
        self
    }

    /// Set the simulation seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Number of changepoints placed during the last fit.
    pub fn changepoint_count(&self) -> Option<usize> {
        self.state.as_ref().map(|s| s.changepoints.len())
    }

    /// Fitted trend rate adjustments on the scaled target.
    pub fn changepoint_deltas(&self) -> Option<&[f64]> {
        self.state.as_ref().map(|s| s.deltas())
    }

    /// Names of the seasonal components used in the last fit.
    pub fn seasonalities(&self) -> Vec<&'static str> {
        self.state
            .as_ref()
            .map(|s| s.terms.iter().map(|t| t.name).collect())
            .unwrap_or_default()
    }

    /// Observation noise standard deviation on the original scale.
    pub fn sigma_obs(&self) -> Option<f64> {
        self.state.as_ref().map(|s| s.sigma_obs * s.y_scale)
    }

    /// Draw a zero-mean Laplace variate with scale `b`.
    fn laplace(rng: &mut StdRng, b: f64) -> f64 {
        let magnitude: f64 = Exp1.sample(rng);
        if rng.gen::<bool>() {
            b * magnitude
        } else {
            -b * magnitude
        }
    }

    /// Simulated scaled future values, one vector of samples per step.
    fn simulate(&self, state: &FittedState, points: &[f64]) -> Vec<Vec<f64>> {
        let horizon = points.len();
        let samples = self.uncertainty_samples.max(1);
        let mut rng = StdRng::seed_from_u64(self.seed);

        let deltas = state.deltas();
        let laplace_scale =
            deltas.iter().map(|d| d.abs()).sum::<f64>() / deltas.len().max(1) as f64 + 1e-8;
        // Historical changepoint rate per unit of trend time.
        let dt = 1.0 / state.t_scale;
        let change_prob = (state.changepoints.len() as f64 * dt).min(1.0);

        let mut by_step = vec![Vec::with_capacity(samples); horizon];
        for _ in 0..samples {
            let mut slope_dev = 0.0;
            let mut level_dev = 0.0;
            for (h, point) in points.iter().enumerate() {
                if !deltas.is_empty() && rng.gen::<f64>() < change_prob {
                    slope_dev += Self::laplace(&mut rng, laplace_scale);
                }
                level_dev += slope_dev * dt;
                let noise: f64 = StandardNormal.sample(&mut rng);
                by_step[h].push(point + level_dev + state.sigma_obs * noise);
            }
        }
        by_step
    }
}

impl Default for DecompositionModel {
    fn default() -> Self {
        Self::new()
    }
}

impl Forecaster for DecompositionModel {
    fn fit(&mut self, series: &TimeSeries) -> Result<()> {
        let n = series.len();
        let needed = self.min_observations();
        if n < needed {
            return Err(ForecastError::InsufficientData { needed, got: n });
        }

        let t0 = series.timestamps()[0];
        let t_days: Vec<f64> = series
            .timestamps()
            .iter()
            .map(|ts| (*ts - t0).num_seconds() as f64 / SECONDS_PER_DAY)
            .collect();
        let span_days = t_days[n - 1];
        if span_days <= 0.0 {
            return Err(ForecastError::Data("history spans no time".to_string()));
        }

        let values = series.values();
        let y_scale = values.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
        let y_scale = if y_scale > 0.0 { y_scale } else { 1.0 };
        let y: Vec<f64> = values.iter().map(|v| v / y_scale).collect();

        let t: Vec<f64> = t_days.iter().map(|d| d / span_days).collect();
        let changepoints = select_changepoints(&t, self.n_changepoints, self.changepoint_range);

        let mut terms = Vec::new();
        if self.weekly.resolve(span_days, 14.0) {
            terms.push(SeasonalityTerm::WEEKLY);
        }
        if self.yearly.resolve(span_days, 730.0) {
            terms.push(SeasonalityTerm::YEARLY);
        }

        let rows: Vec<Vec<f64>> = t_days
            .iter()
            .map(|&d| design_row(d, span_days, &changepoints, &terms))
            .collect();

        // Noise variance from first differences; a smooth signal contributes
        // little, so this tracks the observation noise.
        let diffs: Vec<f64> = y.windows(2).map(|w| w[1] - w[0]).collect();
        let noise_var = (variance(&diffs) / 2.0).max(1e-8);

        let mut penalties = vec![0.0, noise_var / 25.0];
        penalties.extend(
            std::iter::repeat(noise_var / self.changepoint_prior_scale.powi(2))
                .take(changepoints.len()),
        );
        let seasonal_columns: usize = terms.iter().map(|s| s.width()).sum();
        penalties.extend(
            std::iter::repeat(noise_var / self.seasonality_prior_scale.powi(2))
                .take(seasonal_columns),
        );

        let beta = ridge_fit(&rows, &y, &penalties)?;
        let fitted_scaled = predict_rows(&rows, &beta);
        let residuals_scaled: Vec<f64> = y
            .iter()
            .zip(fitted_scaled.iter())
            .map(|(a, f)| a - f)
            .collect();
        let sigma_obs =
            (residuals_scaled.iter().map(|r| r * r).sum::<f64>() / n as f64).sqrt();

        if !sigma_obs.is_finite() || beta.iter().any(|b| !b.is_finite()) {
            return Err(ForecastError::ComputationError(
                "decomposition fit produced non-finite coefficients".to_string(),
            ));
        }

        tracing::debug!(
            changepoints = changepoints.len(),
            seasonalities = terms.len(),
            sigma_obs = sigma_obs * y_scale,
            "fitted decomposition model"
        );

        self.state = Some(FittedState {
            t_scale: span_days,
            last_t_days: span_days,
            y_scale,
            changepoints,
            terms,
            beta,
            sigma_obs,
            fitted: fitted_scaled.iter().map(|f| f * y_scale).collect(),
            residuals: residuals_scaled.iter().map(|r| r * y_scale).collect(),
        });
        Ok(())
    }

    fn predict(&self, horizon: usize) -> Result<Forecast> {
        let state = self.state.as_ref().ok_or(ForecastError::FitRequired)?;
        let points = state
            .future_points(horizon)
            .into_iter()
            .map(|p| p * state.y_scale)
            .collect();
        Ok(Forecast::from_values(points))
    }

    fn predict_with_intervals(&self, horizon: usize, level: f64) -> Result<Forecast> {
        if !(level > 0.0 && level < 1.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "interval width must be in (0, 1), got {level}"
            )));
        }
        let state = self.state.as_ref().ok_or(ForecastError::FitRequired)?;
        if horizon == 0 {
            return Ok(Forecast::new());
        }

        let points = state.future_points(horizon);
        let lower_q = (1.0 - level) / 2.0;
        let upper_q = 1.0 - lower_q;

        let mut below = 0.0_f64;
        let mut above = 0.0_f64;
        let mut lower = Vec::with_capacity(horizon);
        let mut upper = Vec::with_capacity(horizon);
        for (mut draws, point) in self.simulate(state, &points).into_iter().zip(points.iter()) {
            draws.sort_by(|a, b| a.total_cmp(b));
            // Bands never narrow at longer leads.
            below = below.max(point - quantile_sorted(&draws, lower_q));
            above = above.max(quantile_sorted(&draws, upper_q) - point);
            lower.push((point - below) * state.y_scale);
            upper.push((point + above) * state.y_scale);
        }

        let points = points.iter().map(|p| p * state.y_scale).collect();
        Ok(Forecast::from_values_with_intervals(points, lower, upper))
    }

    fn fitted_values(&self) -> Option<&[f64]> {
        self.state.as_ref().map(|s| s.fitted.as_slice())
    }

    fn residuals(&self) -> Option<&[f64]> {
        self.state.as_ref().map(|s| s.residuals.as_slice())
    }

    fn name(&self) -> &str {
        "Decomposition"
    }

    fn min_observations(&self) -> usize {
        2
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{Duration, TimeZone, Utc};

    fn make_series(values: Vec<f64>) -> TimeSeries {
        let base = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
        let timestamps = (0..values.len())
            .map(|i| base + Duration::days(i as i64))
            .collect();
        TimeSeries::univariate(timestamps, values).unwrap()
    }

    #[test]
    fn linear_trend_is_extrapolated() {
        let values: Vec<f64> = (0..100).map(|i| 2.0 + 0.5 * i as f64).collect();
        let mut model = DecompositionModel::new();
        model.fit(&make_series(values)).unwrap();

        let forecast = model.predict(10).unwrap();
        for (h, p) in forecast.point().iter().enumerate() {
            let expected = 2.0 + 0.5 * (100 + h) as f64;
            assert_relative_eq!(*p, expected, epsilon = 0.5);
        }
    }

    #[test]
    fn weekly_pattern_is_recovered() {
        let f = |i: usize| 10.0 + 3.0 * (2.0 * std::f64::consts::PI * i as f64 / 7.0).sin();
        let values: Vec<f64> = (0..70).map(f).collect();
        let mut model = DecompositionModel::new();
        model.fit(&make_series(values)).unwrap();

        assert_eq!(model.seasonalities(), vec!["weekly"]);
        let forecast = model.predict(7).unwrap();
        for (h, p) in forecast.point().iter().enumerate() {
            assert_relative_eq!(*p, f(70 + h), epsilon = 0.5);
        }
    }

    #[test]
    fn trend_break_changes_direction() {
        let values: Vec<f64> = (0..100)
            .map(|i| if i < 60 { i as f64 } else { 120.0 - i as f64 })
            .collect();
        let mut model = DecompositionModel::new()
            .with_weekly_seasonality(SeasonalityToggle::Off);
        model.fit(&make_series(values)).unwrap();

        let forecast = model.predict(10).unwrap();
        assert!(forecast.point()[9] < forecast.point()[0]);
        assert_eq!(model.changepoint_count(), Some(25));
    }

    #[test]
    fn seasonalities_follow_history_span() {
        let short: Vec<f64> = (0..10).map(|i| i as f64 + 1.0).collect();
        let mut model = DecompositionModel::new();
        model.fit(&make_series(short)).unwrap();
        assert!(model.seasonalities().is_empty());

        let long: Vec<f64> = (0..800).map(|i| 5.0 + (i as f64 * 0.1).sin()).collect();
        model.fit(&make_series(long)).unwrap();
        assert_eq!(model.seasonalities(), vec!["weekly", "yearly"]);
    }

    #[test]
    fn intervals_bracket_and_widen() {
        let values: Vec<f64> = (0..90)
            .map(|i| 50.0 + 0.3 * i as f64 + ((i * 7919) % 13) as f64 * 0.4)
            .collect();
        let mut model = DecompositionModel::new();
        model.fit(&make_series(values)).unwrap();

        let forecast = model.predict_with_intervals(30, 0.8).unwrap();
        let lower = forecast.lower().unwrap();
        let upper = forecast.upper().unwrap();
        let points = forecast.point();

        let mut prev = 0.0;
        for h in 0..30 {
            assert!(lower[h] <= points[h] && points[h] <= upper[h]);
            let width = upper[h] - lower[h];
            assert!(width >= prev - 1e-9);
            prev = width;
        }
        assert!(upper[0] - lower[0] > 0.0);
    }

    #[test]
    fn intervals_are_reproducible_for_a_seed() {
        let values: Vec<f64> = (0..60).map(|i| (i as f64 * 0.37).sin() * 4.0 + i as f64).collect();
        let mut model = DecompositionModel::new().with_seed(11);
        model.fit(&make_series(values)).unwrap();

        let a = model.predict_with_intervals(14, 0.8).unwrap();
        let b = model.predict_with_intervals(14, 0.8).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn wider_level_gives_wider_band() {
        let values: Vec<f64> = (0..60).map(|i| (i as f64 * 0.9).cos() * 2.0 + 20.0).collect();
        let mut model = DecompositionModel::new();
        model.fit(&make_series(values)).unwrap();

        let narrow = model.predict_with_intervals(5, 0.5).unwrap();
        let wide = model.predict_with_intervals(5, 0.95).unwrap();
        let w = |f: &Forecast| f.upper().unwrap()[4] - f.lower().unwrap()[4];
        assert!(w(&wide) > w(&narrow));
    }

    #[test]
    fn fitted_values_match_history_length() {
        let values: Vec<f64> = (0..30).map(|i| i as f64 * 2.0 + 1.0).collect();
        let mut model = DecompositionModel::new();
        model.fit(&make_series(values.clone())).unwrap();
        let fitted = model.fitted_values().unwrap();
        let residuals = model.residuals().unwrap();
        assert_eq!(fitted.len(), 30);
        for i in 0..30 {
            assert_relative_eq!(fitted[i] + residuals[i], values[i], epsilon = 1e-9);
        }
    }

    #[test]
    fn invalid_width_rejected() {
        let mut model = DecompositionModel::new();
        model.fit(&make_series(vec![1.0, 2.0, 4.0])).unwrap();
        assert!(matches!(
            model.predict_with_intervals(3, 1.5),
            Err(ForecastError::InvalidParameter(_))
        ));
    }

    #[test]
    fn unfitted_model_errors() {
        let model = DecompositionModel::new();
        assert!(matches!(model.predict(3), Err(ForecastError::FitRequired)));
        assert!(model.seasonalities().is_empty());
    }
}
