//! Piecewise-linear trend with changepoints.

/// Place up to `n_changepoints` evenly over the first `range` share of the
/// history. `t` must be sorted; returns changepoint locations in `t` units.
pub(crate) fn select_changepoints(t: &[f64], n_changepoints: usize, range: f64) -> Vec<f64> {
    let hist_size = (t.len() as f64 * range).floor() as usize;
    let n = n_changepoints.min(hist_size.saturating_sub(1));
    if n == 0 {
        return Vec::new();
    }

    let last = (hist_size - 1) as f64;
    let mut out: Vec<f64> = (1..=n)
        .map(|i| {
            let idx = (last * i as f64 / n as f64).round() as usize;
            t[idx]
        })
        .collect();
    out.dedup();
    out
}

/// Append the trend columns `[1, t, (t - s_1)+, ..., (t - s_k)+]`.
pub(crate) fn trend_features(t: f64, changepoints: &[f64], out: &mut Vec<f64>) {
    out.push(1.0);
    out.push(t);
    out.extend(changepoints.iter().map(|s| (t - s).max(0.0)));
}

/// Number of trend columns for `k` changepoints.
pub(crate) fn trend_width(k: usize) -> usize {
    k + 2
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn changepoints_stay_in_range() {
        let t: Vec<f64> = (0..100).map(|i| i as f64 / 99.0).collect();
        let cps = select_changepoints(&t, 25, 0.8);
        assert_eq!(cps.len(), 25);
        assert!(cps[0] > 0.0);
        assert!(*cps.last().unwrap() <= t[79]);
        assert!(cps.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn short_history_limits_changepoints() {
        let t: Vec<f64> = (0..10).map(|i| i as f64 / 9.0).collect();
        assert_eq!(select_changepoints(&t, 25, 0.8).len(), 7);
        assert!(select_changepoints(&t[..2], 25, 0.8).is_empty());
    }

    #[test]
    fn hinge_columns() {
        let mut row = Vec::new();
        trend_features(0.5, &[0.2, 0.7], &mut row);
        assert_eq!(row.len(), trend_width(2));
        assert_relative_eq!(row[2], 0.3);
        assert_relative_eq!(row[3], 0.0);
    }
}
