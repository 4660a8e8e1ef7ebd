//! Derivative-free minimisation used for parameter estimation.

use std::cmp::Ordering;

/// Result of Nelder-Mead optimization.
#[derive(Debug, Clone)]
pub struct NelderMeadResult {
    /// The best point found.
    pub optimal_point: Vec<f64>,
    /// The objective value at `optimal_point`.
    pub optimal_value: f64,
    /// Number of iterations performed.
    pub iterations: usize,
    /// Whether the simplex collapsed below tolerance.
    pub converged: bool,
}

/// Configuration for Nelder-Mead optimization.
#[derive(Debug, Clone)]
pub struct NelderMeadConfig {
    pub max_iter: usize,
    pub tolerance: f64,
    /// Reflection coefficient.
    pub alpha: f64,
    /// Expansion coefficient.
    pub gamma: f64,
    /// Contraction coefficient.
    pub rho: f64,
    /// Shrink coefficient.
    pub sigma: f64,
    /// Relative size of the initial simplex.
    pub initial_step: f64,
}

impl Default for NelderMeadConfig {
    fn default() -> Self {
        Self {
            max_iter: 1000,
            tolerance: 1e-8,
            alpha: 1.0,
            gamma: 2.0,
            rho: 0.5,
            sigma: 0.5,
            initial_step: 0.05,
        }
    }
}

struct Vertex {
    point: Vec<f64>,
    value: f64,
}

/// Minimise `objective` starting from `initial` with the Nelder-Mead simplex
/// method. Points are clamped into `bounds` when given.
///
/// Non-finite objective values are treated as `+inf`, so an objective may
/// signal an infeasible region by returning NaN.
///
/// # Example
/// ```
/// use forecast_pipeline::utils::optimization::{nelder_mead, NelderMeadConfig};
///
/// let result = nelder_mead(
///     |x| (x[0] - 2.0).powi(2) + (x[1] - 3.0).powi(2),
///     &[0.0, 0.0],
///     None,
///     NelderMeadConfig::default(),
/// );
///
/// assert!((result.optimal_point[0] - 2.0).abs() < 0.01);
/// assert!((result.optimal_point[1] - 3.0).abs() < 0.01);
/// ```
pub fn nelder_mead<F>(
    objective: F,
    initial: &[f64],
    bounds: Option<&[(f64, f64)]>,
    config: NelderMeadConfig,
) -> NelderMeadResult
where
    F: Fn(&[f64]) -> f64,
{
    let n = initial.len();
    if n == 0 {
        return NelderMeadResult {
            optimal_point: vec![],
            optimal_value: f64::NAN,
            iterations: 0,
            converged: false,
        };
    }

    let eval = |p: &[f64]| {
        let v = objective(p);
        if v.is_finite() {
            v
        } else {
            f64::INFINITY
        }
    };
    let make = |point: Vec<f64>| {
        let point = clamp(point, bounds);
        let value = eval(&point);
        Vertex { point, value }
    };

    let start = clamp(initial.to_vec(), bounds);
    let mut simplex: Vec<Vertex> = Vec::with_capacity(n + 1);
    for i in 0..n {
        let mut p = start.clone();
        let step = if p[i].abs() > 1e-10 {
            config.initial_step * p[i].abs()
        } else {
            config.initial_step
        };
        p[i] += step;
        // Stepping past an upper bound would collapse the simplex.
        if let Some(b) = bounds {
            if i < b.len() && p[i] > b[i].1 {
                p[i] = start[i] - step;
            }
        }
        simplex.push(make(p));
    }
    simplex.push(make(start));

    let mut iterations = 0;
    let mut converged = false;

    while iterations < config.max_iter {
        iterations += 1;
        simplex.sort_by(|a, b| a.value.partial_cmp(&b.value).unwrap_or(Ordering::Equal));

        let best = simplex[0].value;
        let worst = simplex[n].value;
        let second_worst = simplex[n - 1].value;

        let centroid = centroid(&simplex[..n]);
        let spread = simplex
            .iter()
            .map(|v| distance(&v.point, &centroid))
            .fold(0.0, f64::max);
        if (worst - best).abs() < config.tolerance || spread < config.tolerance {
            converged = true;
            break;
        }

        let reflected = make(affine(&centroid, &simplex[n].point, -config.alpha));

        if reflected.value < best {
            let expanded = make(affine(&centroid, &reflected.point, config.gamma));
            simplex[n] = if expanded.value < reflected.value {
                expanded
            } else {
                reflected
            };
            continue;
        }

        if reflected.value < second_worst {
            simplex[n] = reflected;
            continue;
        }

        let contracted = if reflected.value < worst {
            make(affine(&centroid, &reflected.point, config.rho))
        } else {
            make(affine(&centroid, &simplex[n].point, config.rho))
        };
        if contracted.value < reflected.value.min(worst) {
            simplex[n] = contracted;
            continue;
        }

        let anchor = simplex[0].point.clone();
        for vertex in simplex.iter_mut().skip(1) {
            let shrunk = affine(&anchor, &vertex.point, config.sigma);
            *vertex = make(shrunk);
        }
    }

    let best = simplex
        .into_iter()
        .min_by(|a, b| a.value.partial_cmp(&b.value).unwrap_or(Ordering::Equal));

    match best {
        Some(v) => NelderMeadResult {
            optimal_point: v.point,
            optimal_value: v.value,
            iterations,
            converged,
        },
        None => NelderMeadResult {
            optimal_point: initial.to_vec(),
            optimal_value: f64::NAN,
            iterations,
            converged: false,
        },
    }
}

/// `origin + t * (toward - origin)`.
fn affine(origin: &[f64], toward: &[f64], t: f64) -> Vec<f64> {
    origin
        .iter()
        .zip(toward.iter())
        .map(|(o, p)| o + t * (p - o))
        .collect()
}

fn centroid(vertices: &[Vertex]) -> Vec<f64> {
    let dim = vertices[0].point.len();
    let mut c = vec![0.0; dim];
    for v in vertices {
        for (ci, pi) in c.iter_mut().zip(v.point.iter()) {
            *ci += pi;
        }
    }
    for ci in &mut c {
        *ci /= vertices.len() as f64;
    }
    c
}

fn clamp(mut point: Vec<f64>, bounds: Option<&[(f64, f64)]>) -> Vec<f64> {
    if let Some(b) = bounds {
        for (x, &(lo, hi)) in point.iter_mut().zip(b.iter()) {
            *x = x.clamp(lo, hi);
        }
    }
    point
}

fn distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f64>()
        .sqrt()
}
