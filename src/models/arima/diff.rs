//! Differencing utilities for ARIMA models.

/// Apply `d` rounds of first differencing.
pub fn difference(series: &[f64], d: usize) -> Vec<f64> {
    let mut result = series.to_vec();
    for _ in 0..d {
        if result.len() <= 1 {
            return Vec::new();
        }
        result = result.windows(2).map(|w| w[1] - w[0]).collect();
    }
    result
}

/// Undo `d` rounds of differencing for values that continue `original`.
///
/// `differenced` holds future values on the `d`-times differenced scale;
/// the result is on the scale of `original`.
pub fn integrate(differenced: &[f64], original: &[f64], d: usize) -> Vec<f64> {
    let mut result = differenced.to_vec();

    for level in (0..d).rev() {
        let anchor = difference(original, level).last().copied().unwrap_or(0.0);
        let mut acc = anchor;
        for v in result.iter_mut() {
            acc += *v;
            *v = acc;
        }
    }

    result
}

/// Coefficients of `(1 - B)^d` as an AR-style polynomial `[a_1, ..., a_d]`
/// such that `(1 - B)^d = 1 - Σ a_i B^i`.
pub fn differencing_polynomial(d: usize) -> Vec<f64> {
    // Binomial expansion of (1 - B)^d, stored with the leading 1 dropped.
    let mut coeffs = vec![1.0];
    for _ in 0..d {
        let mut next = vec![0.0; coeffs.len() + 1];
        for (i, &c) in coeffs.iter().enumerate() {
            next[i] += c;
            next[i + 1] -= c;
        }
        coeffs = next;
    }
    coeffs.iter().skip(1).map(|c| -c).collect()
}
