//! ARIMA (Autoregressive Integrated Moving Average) model.

use crate::core::{Forecast, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::models::arima::diff::{difference, differencing_polynomial, integrate};
use crate::models::Forecaster;
use crate::utils::optimization::{nelder_mead, NelderMeadConfig};
use crate::utils::stats::quantile_normal;

/// Bound on transformed partial autocorrelations during optimisation.
const PACF_BOUND: f64 = 0.98;

/// ARIMA model specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ARIMASpec {
    /// AR order (p)
    pub p: usize,
    /// Differencing order (d)
    pub d: usize,
    /// MA order (q)
    pub q: usize,
}

impl ARIMASpec {
    /// Create a new ARIMA specification.
    pub fn new(p: usize, d: usize, q: usize) -> Self {
        Self { p, d, q }
    }
}

impl Default for ARIMASpec {
    fn default() -> Self {
        Self::new(1, 1, 1)
    }
}

impl std::fmt::Display for ARIMASpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ARIMA({},{},{})", self.p, self.d, self.q)
    }
}

/// ARIMA forecasting model fitted by conditional sum of squares.
///
/// AR and MA coefficients are optimised through partial-autocorrelation
/// parameters, so every fitted model is stationary and invertible.
#[derive(Debug, Clone)]
pub struct ARIMA {
    spec: ARIMASpec,
    include_constant: bool,
    /// Leading differenced observations excluded from the objective.
    conditioning: usize,
    ar_coefficients: Vec<f64>,
    ma_coefficients: Vec<f64>,
    /// Mean of the differenced series (0 without a constant).
    mean: f64,
    original: Option<Vec<f64>>,
    differenced: Option<Vec<f64>>,
    fitted: Option<Vec<f64>>,
    residuals: Option<Vec<f64>>,
    sigma2: Option<f64>,
    aic: Option<f64>,
    bic: Option<f64>,
}

impl ARIMA {
    /// Create a new ARIMA(p, d, q) model with a constant when `d < 2`.
    pub fn new(p: usize, d: usize, q: usize) -> Self {
        Self {
            spec: ARIMASpec::new(p, d, q),
            include_constant: d < 2,
            conditioning: 0,
            ar_coefficients: vec![],
            ma_coefficients: vec![],
            mean: 0.0,
            original: None,
            differenced: None,
            fitted: None,
            residuals: None,
            sigma2: None,
            aic: None,
            bic: None,
        }
    }

    /// Create a model from a specification.
    pub fn from_spec(spec: ARIMASpec) -> Self {
        Self::new(spec.p, spec.d, spec.q)
    }

    /// Include or drop the constant (drift when `d = 1`).
    pub fn with_constant(mut self, include: bool) -> Self {
        self.include_constant = include;
        self
    }

    /// Exclude at least `m` leading differenced observations from the
    /// objective, so models of different order share one estimation sample.
    pub fn with_conditioning(mut self, m: usize) -> Self {
        self.conditioning = m;
        self
    }

    /// Get the model specification.
    pub fn spec(&self) -> ARIMASpec {
        self.spec
    }

    /// Whether the model carries a constant term.
    pub fn has_constant(&self) -> bool {
        self.include_constant
    }

    /// Get AR coefficients.
    pub fn ar_coefficients(&self) -> &[f64] {
        &self.ar_coefficients
    }

    /// Get MA coefficients.
    pub fn ma_coefficients(&self) -> &[f64] {
        &self.ma_coefficients
    }

    /// Mean of the differenced process.
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Innovation variance estimate.
    pub fn sigma2(&self) -> Option<f64> {
        self.sigma2
    }

    /// Get AIC.
    pub fn aic(&self) -> Option<f64> {
        self.aic
    }

    /// Get BIC.
    pub fn bic(&self) -> Option<f64> {
        self.bic
    }

    /// Number of estimated parameters, innovation variance included.
    pub fn num_params(&self) -> usize {
        self.spec.p + self.spec.q + usize::from(self.include_constant) + 1
    }

    fn start(&self) -> usize {
        self.spec.p.max(self.conditioning)
    }

    /// One-step residuals on the differenced scale. Entries before `start`
    /// are zero.
    fn innovations(w: &[f64], start: usize, mean: f64, ar: &[f64], ma: &[f64]) -> Vec<f64> {
        let mut e = vec![0.0; w.len()];
        for t in start..w.len() {
            let mut pred = mean;
            for (i, phi) in ar.iter().enumerate() {
                pred += phi * (w[t - 1 - i] - mean);
            }
            for (i, theta) in ma.iter().enumerate() {
                if t > i {
                    pred += theta * e[t - 1 - i];
                }
            }
            e[t] = w[t] - pred;
        }
        e
    }

    fn css(w: &[f64], start: usize, mean: f64, ar: &[f64], ma: &[f64]) -> f64 {
        Self::innovations(w, start, mean, ar, ma)[start..]
            .iter()
            .map(|e| e * e)
            .sum()
    }

    /// Split an optimiser vector into (mean, AR, MA).
    fn unpack(&self, params: &[f64], fallback_mean: f64) -> (f64, Vec<f64>, Vec<f64>) {
        let p = self.spec.p;
        let q = self.spec.q;
        let offset = usize::from(self.include_constant);
        let mean = if self.include_constant {
            params[0]
        } else {
            fallback_mean
        };
        let ar = pacf_to_coefficients(&params[offset..offset + p]);
        let ma: Vec<f64> = pacf_to_coefficients(&params[offset + p..offset + p + q])
            .into_iter()
            .map(|c| -c)
            .collect();
        (mean, ar, ma)
    }

    fn estimate_parameters(&mut self, w: &[f64]) -> Result<()> {
        let p = self.spec.p;
        let q = self.spec.q;
        let start = self.start();
        let sample_mean = w.iter().sum::<f64>() / w.len() as f64;

        let mut initial = Vec::with_capacity(p + q + 1);
        let mut bounds = Vec::with_capacity(p + q + 1);
        if self.include_constant {
            initial.push(sample_mean);
            bounds.push((f64::NEG_INFINITY, f64::INFINITY));
        }
        for _ in 0..p + q {
            initial.push(0.1);
            bounds.push((-PACF_BOUND, PACF_BOUND));
        }

        let (mean, ar, ma) = if initial.is_empty() {
            (0.0, vec![], vec![])
        } else {
            let config = NelderMeadConfig {
                max_iter: 2000,
                tolerance: 1e-10,
                ..Default::default()
            };
            let result = nelder_mead(
                |params| {
                    let (m, ar, ma) = self.unpack(params, 0.0);
                    Self::css(w, start, m, &ar, &ma)
                },
                &initial,
                Some(&bounds),
                config,
            );
            self.unpack(&result.optimal_point, 0.0)
        };

        let innovations = Self::innovations(w, start, mean, &ar, &ma);
        let css: f64 = innovations[start..].iter().map(|e| e * e).sum();
        if !css.is_finite() {
            return Err(ForecastError::ComputationError(format!(
                "{} produced a non-finite sum of squares",
                self.spec
            )));
        }

        let n_eff = (w.len() - start) as f64;
        let sigma2 = css / n_eff;
        if sigma2 <= 0.0 {
            // A perfect fit leaves the likelihood unbounded.
            return Err(ForecastError::ComputationError(format!(
                "{} has zero innovation variance",
                self.spec
            )));
        }

        let k = self.num_params() as f64;
        let ll = -0.5 * n_eff * (1.0 + sigma2.ln() + (2.0 * std::f64::consts::PI).ln());

        self.mean = mean;
        self.ar_coefficients = ar;
        self.ma_coefficients = ma;
        self.sigma2 = Some(sigma2);
        self.aic = Some(-2.0 * ll + 2.0 * k);
        self.bic = Some(-2.0 * ll + k * n_eff.ln());
        self.residuals = Some(innovations);
        Ok(())
    }

    /// ψ-weights of the integrated process, `ψ_0 = 1`.
    fn psi_weights(&self, horizon: usize) -> Vec<f64> {
        // Combined AR polynomial φ(B)(1 - B)^d, stored as 1 - Σ a_i B^i.
        let diff_poly = differencing_polynomial(self.spec.d);
        let mut full = vec![0.0; self.ar_coefficients.len() + diff_poly.len()];
        // (1 - Σφ_i B^i)(1 - Σδ_j B^j) = 1 - Σφ - Σδ + ΣΣ φ_i δ_j B^{i+j}
        for (i, phi) in self.ar_coefficients.iter().enumerate() {
            full[i] += phi;
        }
        for (j, delta) in diff_poly.iter().enumerate() {
            full[j] += delta;
        }
        for (i, phi) in self.ar_coefficients.iter().enumerate() {
            for (j, delta) in diff_poly.iter().enumerate() {
                full[i + j + 1] -= phi * delta;
            }
        }

        let mut psi = vec![0.0; horizon];
        if horizon == 0 {
            return psi;
        }
        psi[0] = 1.0;
        for j in 1..horizon {
            let mut value = self.ma_coefficients.get(j - 1).copied().unwrap_or(0.0);
            for (i, a) in full.iter().enumerate() {
                if j > i {
                    value += a * psi[j - 1 - i];
                }
            }
            psi[j] = value;
        }
        psi
    }
}

/// Map partial autocorrelations in (-1, 1) to AR coefficients of a
/// stationary polynomial (Durbin-Levinson recursion).
fn pacf_to_coefficients(pacf: &[f64]) -> Vec<f64> {
    let mut phi: Vec<f64> = Vec::with_capacity(pacf.len());
    for (k, &r) in pacf.iter().enumerate() {
        let prev = phi.clone();
        for j in 0..k {
            phi[j] = prev[j] - r * prev[k - 1 - j];
        }
        phi.push(r);
    }
    phi
}

impl Default for ARIMA {
    fn default() -> Self {
        Self::new(1, 1, 1)
    }
}

impl Forecaster for ARIMA {
    fn fit(&mut self, series: &TimeSeries) -> Result<()> {
        let values = series.values();
        let w = difference(values, self.spec.d);
        let needed_diff = self.start() + self.num_params() + 2;

        if w.len() < needed_diff {
            return Err(ForecastError::InsufficientData {
                needed: needed_diff + self.spec.d,
                got: values.len(),
            });
        }

        self.estimate_parameters(&w)?;

        // One-step errors coincide on the differenced and original scales.
        let residuals = self.residuals.as_deref().unwrap_or(&[]);
        let offset = self.spec.d;
        let start = self.start();
        let fitted: Vec<f64> = values
            .iter()
            .enumerate()
            .map(|(t, &y)| {
                if t >= offset + start {
                    y - residuals[t - offset]
                } else {
                    f64::NAN
                }
            })
            .collect();

        self.original = Some(values.to_vec());
        self.differenced = Some(w);
        self.fitted = Some(fitted);
        Ok(())
    }

    fn predict(&self, horizon: usize) -> Result<Forecast> {
        let original = self.original.as_ref().ok_or(ForecastError::FitRequired)?;
        let w = self.differenced.as_ref().ok_or(ForecastError::FitRequired)?;
        let residuals = self.residuals.as_ref().ok_or(ForecastError::FitRequired)?;

        if horizon == 0 {
            return Ok(Forecast::new());
        }

        let mut ext_w = w.clone();
        let mut ext_e = residuals.clone();
        for _ in 0..horizon {
            let t = ext_w.len();
            let mut pred = self.mean;
            for (i, phi) in self.ar_coefficients.iter().enumerate() {
                if t > i {
                    pred += phi * (ext_w[t - 1 - i] - self.mean);
                }
            }
            for (i, theta) in self.ma_coefficients.iter().enumerate() {
                if t > i {
                    pred += theta * ext_e[t - 1 - i];
                }
            }
            ext_w.push(pred);
            ext_e.push(0.0);
        }

        let forecast_diff = &ext_w[w.len()..];
        let predictions = integrate(forecast_diff, original, self.spec.d);
        Ok(Forecast::from_values(predictions))
    }

    fn predict_with_intervals(&self, horizon: usize, level: f64) -> Result<Forecast> {
        let forecast = self.predict(horizon)?;
        let sigma2 = self.sigma2.ok_or(ForecastError::FitRequired)?;

        if horizon == 0 {
            return Ok(forecast);
        }

        let z = quantile_normal((1.0 + level) / 2.0);
        let psi = self.psi_weights(horizon);

        let mut cumulative = 0.0;
        let mut lower = Vec::with_capacity(horizon);
        let mut upper = Vec::with_capacity(horizon);
        for (pred, weight) in forecast.point().iter().zip(psi.iter()) {
            cumulative += weight * weight;
            let se = (sigma2 * cumulative).sqrt();
            lower.push(pred - z * se);
            upper.push(pred + z * se);
        }

        Ok(Forecast::from_values_with_intervals(
            forecast.point().to_vec(),
            lower,
            upper,
        ))
    }

    fn fitted_values(&self) -> Option<&[f64]> {
        self.fitted.as_deref()
    }

    fn residuals(&self) -> Option<&[f64]> {
        self.residuals.as_deref()
    }

    fn name(&self) -> &str {
        "ARIMA"
    }

    fn min_observations(&self) -> usize {
        self.spec.d + self.start() + self.num_params() + 2
    }
}
