//! Fourier seasonality terms.

use std::f64::consts::PI;

/// A periodic component expressed as a truncated Fourier series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeasonalityTerm {
    /// Component name.
    pub name: &'static str,
    /// Period in days.
    pub period: f64,
    /// Number of sine/cosine pairs.
    pub order: usize,
}

impl SeasonalityTerm {
    /// Weekly seasonality, order 3.
    pub const WEEKLY: SeasonalityTerm = SeasonalityTerm {
        name: "weekly",
        period: 7.0,
        order: 3,
    };

    /// Yearly seasonality, order 10.
    pub const YEARLY: SeasonalityTerm = SeasonalityTerm {
        name: "yearly",
        period: 365.25,
        order: 10,
    };

    /// Number of design columns.
    pub fn width(&self) -> usize {
        2 * self.order
    }

    /// Append `sin(2πkt/P), cos(2πkt/P)` for `k = 1..=order`.
    pub fn features(&self, t_days: f64, out: &mut Vec<f64>) {
        for k in 1..=self.order {
            let x = 2.0 * PI * k as f64 * t_days / self.period;
            out.push(x.sin());
            out.push(x.cos());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn weekly_features_repeat_every_week() {
        let mut a = Vec::new();
        let mut b = Vec::new();
        SeasonalityTerm::WEEKLY.features(3.0, &mut a);
        SeasonalityTerm::WEEKLY.features(10.0, &mut b);
        assert_eq!(a.len(), 6);
        for (x, y) in a.iter().zip(b.iter()) {
            assert_relative_eq!(x, y, epsilon = 1e-12);
        }
    }

    #[test]
    fn yearly_width() {
        assert_eq!(SeasonalityTerm::YEARLY.width(), 20);
    }
}
