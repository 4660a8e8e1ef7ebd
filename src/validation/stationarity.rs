//! KPSS stationarity test and differencing-order selection.

/// Result of a stationarity test.
#[derive(Debug, Clone)]
pub struct StationarityResult {
    /// Test statistic
    pub statistic: f64,
    /// P-value (interpolated from the critical value table)
    pub p_value: f64,
    /// Number of lags used
    pub lags: usize,
    /// Whether the null of level stationarity is retained
    pub is_stationary: bool,
}

/// KPSS critical values for level stationarity at 10%, 5%, 2.5% and 1%.
const KPSS_CRITICAL: [(f64, f64); 4] = [(0.10, 0.347), (0.05, 0.463), (0.025, 0.574), (0.01, 0.739)];

/// KPSS test for level stationarity.
///
/// The null hypothesis is that the series is stationary around a constant;
/// a large statistic rejects it.
///
/// # Arguments
/// * `series` - Time series data
/// * `lags` - Bartlett window for the long-run variance (default: `⌊4 (n/100)^¼⌋`)
/// * `alpha` - Significance level used for `is_stationary`
pub fn kpss_test(series: &[f64], lags: Option<usize>, alpha: f64) -> StationarityResult {
    let n = series.len();

    if n < 4 {
        return StationarityResult {
            statistic: f64::NAN,
            p_value: f64::NAN,
            lags: 0,
            is_stationary: true,
        };
    }

    let lags = lags.unwrap_or_else(|| (4.0 * (n as f64 / 100.0).powf(0.25)).floor() as usize);
    let lags = lags.min(n / 2).max(1);

    let mean = series.iter().sum::<f64>() / n as f64;
    let residuals: Vec<f64> = series.iter().map(|&x| x - mean).collect();

    let mut partial = 0.0;
    let eta: f64 = residuals
        .iter()
        .map(|&r| {
            partial += r;
            partial * partial
        })
        .sum::<f64>()
        / (n * n) as f64;

    // Long-run variance with Bartlett weights
    let mut long_run = residuals.iter().map(|&r| r * r).sum::<f64>() / n as f64;
    for j in 1..=lags {
        let weight = 1.0 - j as f64 / (lags + 1) as f64;
        let autocov: f64 = residuals
            .iter()
            .skip(j)
            .zip(residuals.iter())
            .map(|(&a, &b)| a * b)
            .sum::<f64>()
            / n as f64;
        long_run += 2.0 * weight * autocov;
    }

    if long_run <= 1e-12 {
        return StationarityResult {
            statistic: 0.0,
            p_value: 0.10,
            lags,
            is_stationary: true,
        };
    }

    let statistic = eta / long_run;
    let p_value = kpss_p_value(statistic);

    StationarityResult {
        statistic,
        p_value,
        lags,
        is_stationary: p_value >= alpha,
    }
}

/// Interpolate the p-value from the critical value table, truncated to
/// `[0.01, 0.10]`.
fn kpss_p_value(stat: f64) -> f64 {
    let (first_p, first_cv) = KPSS_CRITICAL[0];
    if stat <= first_cv {
        return first_p;
    }
    for pair in KPSS_CRITICAL.windows(2) {
        let (p0, cv0) = pair[0];
        let (p1, cv1) = pair[1];
        if stat <= cv1 {
            return p0 + (stat - cv0) / (cv1 - cv0) * (p1 - p0);
        }
    }
    KPSS_CRITICAL[KPSS_CRITICAL.len() - 1].0
}

/// Number of first differences needed for the KPSS test to retain
/// stationarity at level `alpha`, capped at `max_d`.
pub fn ndiffs(series: &[f64], alpha: f64, max_d: usize) -> usize {
    let mut current = series.to_vec();
    let mut d = 0;

    while d < max_d {
        if is_constant(&current) || kpss_test(&current, None, alpha).is_stationary {
            break;
        }
        current = current.windows(2).map(|w| w[1] - w[0]).collect();
        d += 1;
    }

    d
}

fn is_constant(values: &[f64]) -> bool {
    values.windows(2).all(|w| (w[1] - w[0]).abs() < 1e-12)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pseudo_noise(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| ((i * 17 + 13) % 97) as f64 / 50.0 - 1.0)
            .collect()
    }

    #[test]
    fn kpss_noise_is_stationary() {
        let result = kpss_test(&pseudo_noise(200), None, 0.05);
        assert!(result.is_stationary);
        assert!(result.statistic < 0.463);
    }

    #[test]
    fn kpss_trend_is_not_stationary() {
        let series: Vec<f64> = (0..200).map(|i| i as f64 * 0.5).collect();
        let result = kpss_test(&series, None, 0.05);
        assert!(!result.is_stationary);
        assert!((result.p_value - 0.01).abs() < 1e-12);
    }

    #[test]
    fn kpss_short_series() {
        let result = kpss_test(&[1.0, 2.0, 3.0], None, 0.05);
        assert!(result.statistic.is_nan());
    }

    #[test]
    fn p_value_interpolates_table() {
        assert_eq!(kpss_p_value(0.1), 0.10);
        assert!((kpss_p_value(0.463) - 0.05).abs() < 1e-12);
        let mid = kpss_p_value(0.405);
        assert!(mid < 0.10 && mid > 0.05);
        assert_eq!(kpss_p_value(5.0), 0.01);
    }

    #[test]
    fn ndiffs_picks_order() {
        assert_eq!(ndiffs(&pseudo_noise(200), 0.05, 2), 0);

        let trend: Vec<f64> = (0..200)
            .map(|i| 3.0 * i as f64 + pseudo_noise(200)[i])
            .collect();
        assert_eq!(ndiffs(&trend, 0.05, 2), 1);

        let linear: Vec<f64> = (0..100).map(|i| 2.0 * i as f64).collect();
        // First difference is constant, no further differencing.
        assert_eq!(ndiffs(&linear, 0.05, 2), 1);
    }
}
