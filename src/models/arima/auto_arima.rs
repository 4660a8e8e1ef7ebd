//! Automatic ARIMA order selection.

use std::collections::HashMap;

use crate::core::{Forecast, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::models::arima::diff::difference;
use crate::models::arima::model::ARIMA;
use crate::models::Forecaster;
use crate::validation::ndiffs;

/// Configuration for AutoARIMA.
#[derive(Debug, Clone)]
pub struct AutoARIMAConfig {
    /// Maximum AR order to consider.
    pub max_p: usize,
    /// Maximum MA order to consider.
    pub max_q: usize,
    /// Maximum differencing order.
    pub max_d: usize,
    /// Maximum `p + q`.
    pub max_order: usize,
    /// Use stepwise search (faster) vs exhaustive.
    pub stepwise: bool,
    /// Significance level of the KPSS tests choosing `d`.
    pub alpha: f64,
    /// Selection criterion (AIC when true, BIC otherwise).
    pub use_aic: bool,
    /// Upper bound on fitted candidates during a stepwise search.
    pub max_models: usize,
}

impl Default for AutoARIMAConfig {
    fn default() -> Self {
        Self {
            max_p: 5,
            max_q: 5,
            max_d: 2,
            max_order: 5,
            stepwise: true,
            alpha: 0.05,
            use_aic: true,
            max_models: 50,
        }
    }
}

impl AutoARIMAConfig {
    /// Set maximum orders.
    pub fn with_max_orders(mut self, max_p: usize, max_d: usize, max_q: usize) -> Self {
        self.max_p = max_p;
        self.max_d = max_d;
        self.max_q = max_q;
        self
    }

    /// Use exhaustive search instead of stepwise.
    pub fn exhaustive(mut self) -> Self {
        self.stepwise = false;
        self
    }
}

/// Candidate order (p, d, q) plus the constant flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModelOrder {
    /// AR order.
    pub p: usize,
    /// Differencing order.
    pub d: usize,
    /// MA order.
    pub q: usize,
    /// Whether a mean/drift term is estimated.
    pub constant: bool,
}

impl std::fmt::Display for ModelOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ARIMA({},{},{})", self.p, self.d, self.q)?;
        if self.constant {
            write!(f, " with constant")?;
        }
        Ok(())
    }
}

/// Automatic non-seasonal ARIMA selection.
///
/// Chooses `d` by repeated KPSS tests, then searches (p, q) and the constant
/// term, keeping the candidate with the lowest information criterion.
#[derive(Debug, Clone)]
pub struct AutoARIMA {
    config: AutoARIMAConfig,
    selected_model: Option<ARIMA>,
    selected_order: Option<ModelOrder>,
    /// Every successfully fitted candidate with its score, best first.
    model_scores: Vec<(ModelOrder, f64)>,
}

impl AutoARIMA {
    /// Create a new AutoARIMA with default configuration.
    pub fn new() -> Self {
        Self::with_config(AutoARIMAConfig::default())
    }

    /// Create AutoARIMA with custom configuration.
    pub fn with_config(config: AutoARIMAConfig) -> Self {
        Self {
            config,
            selected_model: None,
            selected_order: None,
            model_scores: Vec::new(),
        }
    }

    /// Get the selected order.
    pub fn selected_order(&self) -> Option<(usize, usize, usize)> {
        self.selected_order.map(|o| (o.p, o.d, o.q))
    }

    /// Get the selected order including the constant flag.
    pub fn selected_full_order(&self) -> Option<ModelOrder> {
        self.selected_order
    }

    /// Get all model scores.
    pub fn model_scores(&self) -> &[(ModelOrder, f64)] {
        &self.model_scores
    }

    /// Access the selected model.
    pub fn selected_model(&self) -> Option<&ARIMA> {
        self.selected_model.as_ref()
    }

    fn admissible(&self, order: &ModelOrder, max_p: usize) -> bool {
        order.p <= max_p
            && order.q <= self.config.max_q
            && order.p + order.q <= self.config.max_order
    }

    fn evaluate(
        &self,
        series: &TimeSeries,
        order: ModelOrder,
        conditioning: usize,
    ) -> Option<(ARIMA, f64)> {
        let mut model = ARIMA::new(order.p, order.d, order.q)
            .with_constant(order.constant)
            .with_conditioning(conditioning);

        if let Err(err) = model.fit(series) {
            tracing::trace!(%order, error = %err, "candidate fit failed");
            return None;
        }

        let score = if self.config.use_aic {
            model.aic()
        } else {
            model.bic()
        }?;

        if score.is_finite() {
            Some((model, score))
        } else {
            tracing::trace!(%order, "candidate produced a non-finite score");
            None
        }
    }

    fn neighbours(order: ModelOrder) -> Vec<ModelOrder> {
        let mut out = Vec::with_capacity(9);
        let steps: [(isize, isize); 8] = [
            (-1, 0),
            (1, 0),
            (0, -1),
            (0, 1),
            (-1, -1),
            (1, 1),
            (-1, 1),
            (1, -1),
        ];
        for (dp, dq) in steps {
            let p = order.p as isize + dp;
            let q = order.q as isize + dq;
            if p >= 0 && q >= 0 {
                out.push(ModelOrder {
                    p: p as usize,
                    q: q as usize,
                    ..order
                });
            }
        }
        if order.d < 2 {
            out.push(ModelOrder {
                constant: !order.constant,
                ..order
            });
        }
        out
    }
}

impl Default for AutoARIMA {
    fn default() -> Self {
        Self::new()
    }
}

impl Forecaster for AutoARIMA {
    fn fit(&mut self, series: &TimeSeries) -> Result<()> {
        let values = series.values();
        let min_required = self.min_observations();
        if values.len() < min_required {
            return Err(ForecastError::InsufficientData {
                needed: min_required,
                got: values.len(),
            });
        }

        let d = ndiffs(values, self.config.alpha, self.config.max_d);
        let n_diff = difference(values, d).len();
        // Every candidate conditions on the same leading observations so
        // their criteria are computed over one estimation sample.
        let max_p = self.config.max_p.min(n_diff / 3);
        let conditioning = max_p;
        let with_constant = d < 2;

        let mut scores: HashMap<ModelOrder, f64> = HashMap::new();
        let mut best: Option<(ARIMA, ModelOrder, f64)> = None;

        let try_order = |order: ModelOrder,
                         scores: &mut HashMap<ModelOrder, f64>,
                         best: &mut Option<(ARIMA, ModelOrder, f64)>|
         -> bool {
            if scores.contains_key(&order) {
                return false;
            }
            // Failed candidates are remembered as +inf so they are not retried.
            scores.insert(order, f64::INFINITY);
            let Some((model, score)) = self.evaluate(series, order, conditioning) else {
                return false;
            };
            scores.insert(order, score);
            let improved = best.as_ref().map_or(true, |(_, _, s)| score < *s);
            if improved {
                *best = Some((model, order, score));
            }
            improved
        };

        if self.config.stepwise {
            let starts = [(2, 2), (0, 0), (1, 0), (0, 1)];
            for (p, q) in starts {
                let order = ModelOrder {
                    p,
                    d,
                    q,
                    constant: with_constant,
                };
                if self.admissible(&order, max_p) {
                    try_order(order, &mut scores, &mut best);
                }
            }

            loop {
                let Some(current) = best.as_ref().map(|(_, order, _)| *order) else {
                    break;
                };
                let mut improved = false;
                for candidate in Self::neighbours(current) {
                    if scores.len() >= self.config.max_models {
                        break;
                    }
                    if !self.admissible(&candidate, max_p) {
                        continue;
                    }
                    if try_order(candidate, &mut scores, &mut best) {
                        improved = true;
                        break;
                    }
                }
                if !improved || scores.len() >= self.config.max_models {
                    break;
                }
            }
        } else {
            for p in 0..=max_p {
                for q in 0..=self.config.max_q {
                    let order = ModelOrder {
                        p,
                        d,
                        q,
                        constant: with_constant,
                    };
                    if self.admissible(&order, max_p) {
                        try_order(order, &mut scores, &mut best);
                    }
                }
            }
        }

        let Some((model, order, score)) = best else {
            return Err(ForecastError::ComputationError(
                "no ARIMA candidate could be fitted".to_string(),
            ));
        };

        tracing::debug!(%order, score, candidates = scores.len(), "selected ARIMA order");

        let mut ranked: Vec<(ModelOrder, f64)> = scores
            .into_iter()
            .filter(|(_, s)| s.is_finite())
            .collect();
        ranked.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));

        self.model_scores = ranked;
        self.selected_order = Some(order);
        self.selected_model = Some(model);
        Ok(())
    }

    fn predict(&self, horizon: usize) -> Result<Forecast> {
        self.selected_model
            .as_ref()
            .ok_or(ForecastError::FitRequired)?
            .predict(horizon)
    }

    fn predict_with_intervals(&self, horizon: usize, level: f64) -> Result<Forecast> {
        self.selected_model
            .as_ref()
            .ok_or(ForecastError::FitRequired)?
            .predict_with_intervals(horizon, level)
    }

    fn fitted_values(&self) -> Option<&[f64]> {
        self.selected_model.as_ref()?.fitted_values()
    }

    fn residuals(&self) -> Option<&[f64]> {
        self.selected_model.as_ref()?.residuals()
    }

    fn name(&self) -> &str {
        "AutoARIMA"
    }

    fn min_observations(&self) -> usize {
        10
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn make_series(values: Vec<f64>) -> TimeSeries {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let timestamps = (0..values.len())
            .map(|i| base + Duration::days(i as i64))
            .collect();
        TimeSeries::univariate(timestamps, values).unwrap()
    }

    fn noisy_trend(n: usize, seed: u64) -> Vec<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..n)
            .map(|i| 50.0 + 0.8 * i as f64 + rng.gen::<f64>() * 4.0 - 2.0)
            .collect()
    }

    #[test]
    fn auto_arima_selects_a_model() {
        let mut model = AutoARIMA::new();
        model.fit(&make_series(noisy_trend(100, 1))).unwrap();

        let (p, d, q) = model.selected_order().unwrap();
        assert!(p <= 5 && q <= 5 && d <= 2);
        assert!(!model.model_scores().is_empty());

        let forecast = model.predict(10).unwrap();
        assert_eq!(forecast.horizon(), 10);
        assert!(forecast.is_finite());
    }

    #[test]
    fn trending_series_is_differenced() {
        let mut model = AutoARIMA::new();
        model.fit(&make_series(noisy_trend(120, 2))).unwrap();
        let (_, d, _) = model.selected_order().unwrap();
        assert!(d >= 1);
    }

    #[test]
    fn scores_are_sorted_and_best_is_selected() {
        let mut model = AutoARIMA::new();
        model.fit(&make_series(noisy_trend(80, 3))).unwrap();

        let scores = model.model_scores();
        for pair in scores.windows(2) {
            assert!(pair[0].1 <= pair[1].1);
        }
        assert_eq!(Some(scores[0].0), model.selected_full_order());
    }

    #[test]
    fn exhaustive_search_covers_grid() {
        let config = AutoARIMAConfig::default()
            .with_max_orders(2, 1, 2)
            .exhaustive();
        let mut model = AutoARIMA::with_config(config);
        model.fit(&make_series(noisy_trend(80, 4))).unwrap();
        assert!(model.model_scores().len() >= 4);
    }

    #[test]
    fn intervals_contain_point() {
        let mut model = AutoARIMA::new();
        model.fit(&make_series(noisy_trend(90, 5))).unwrap();
        let forecast = model.predict_with_intervals(14, 0.95).unwrap();

        let lower = forecast.lower().unwrap();
        let upper = forecast.upper().unwrap();
        for (i, point) in forecast.point().iter().enumerate() {
            assert!(lower[i] <= *point && *point <= upper[i]);
        }
        assert!(upper[13] - lower[13] >= upper[0] - lower[0]);
    }

    #[test]
    fn neighbours_step_orders_and_toggle_constant() {
        let order = ModelOrder {
            p: 0,
            d: 1,
            q: 1,
            constant: true,
        };
        let next = AutoARIMA::neighbours(order);
        assert!(next.iter().all(|o| o.d == 1));
        assert!(next.contains(&ModelOrder { p: 1, ..order }));
        assert!(next.contains(&ModelOrder { q: 0, ..order }));
        assert!(next.contains(&ModelOrder {
            constant: false,
            ..order
        }));
        assert!(!next.iter().any(|o| o.q == 1 && o.p == 0 && o.constant));
    }

    #[test]
    fn too_short_series_rejected() {
        let mut model = AutoARIMA::new();
        let result = model.fit(&make_series(vec![1.0, 2.0, 3.0, 4.0, 5.0]));
        assert!(matches!(result, Err(ForecastError::InsufficientData { .. })));
    }

    #[test]
    fn predict_requires_fit() {
        let model = AutoARIMA::new();
        assert!(matches!(model.predict(3), Err(ForecastError::FitRequired)));
        assert_eq!(model.name(), "AutoARIMA");
    }
}
