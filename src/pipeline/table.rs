//! Forecast table assembly.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::core::Forecast;
use crate::error::{ForecastError, Result};

/// One future period: point estimate with its uncertainty bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ForecastRow {
    pub timestamp: DateTime<Utc>,
    pub point: f64,
    pub lower: f64,
    pub upper: f64,
}

impl ForecastRow {
    /// Distance between the bounds.
    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }

    /// Presentation copy rounded to two decimals.
    pub fn rounded(&self) -> DisplayRow {
        DisplayRow {
            date: self.timestamp.date_naive().to_string(),
            point: round2(self.point),
            lower: round2(self.lower),
            upper: round2(self.upper),
        }
    }
}

/// A [`ForecastRow`] rounded for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayRow {
    pub date: String,
    pub point: f64,
    pub lower: f64,
    pub upper: f64,
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// The forecast over the horizon, one row per future day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastTable {
    rows: Vec<ForecastRow>,
    /// Rows whose bounds had to be moved to contain the point estimate.
    clamped_rows: usize,
}

impl ForecastTable {
    /// Join future timestamps with backend output.
    ///
    /// The forecast must carry bounds and match `timestamps` in length.
    /// Bounds on the wrong side of the point estimate are moved onto it.
    pub fn assemble(timestamps: &[DateTime<Utc>], forecast: &Forecast) -> Result<Self> {
        let (lower, upper) = match (forecast.lower(), forecast.upper()) {
            (Some(lower), Some(upper)) => (lower, upper),
            _ => {
                return Err(ForecastError::BackendFit(
                    "forecast has no uncertainty bounds".to_string(),
                ))
            }
        };

        let point = forecast.point();
        if point.len() != timestamps.len() || lower.len() != point.len() || upper.len() != point.len()
        {
            return Err(ForecastError::BackendFit(format!(
                "backend returned {} points for a horizon of {}",
                point.len(),
                timestamps.len()
            )));
        }

        let mut clamped_rows = 0;
        let rows = timestamps
            .iter()
            .enumerate()
            .map(|(i, &timestamp)| {
                let p = point[i];
                let lo = lower[i].min(p);
                let hi = upper[i].max(p);
                if lo != lower[i] || hi != upper[i] {
                    clamped_rows += 1;
                }
                ForecastRow {
                    timestamp,
                    point: p,
                    lower: lo,
                    upper: hi,
                }
            })
            .collect();

        Ok(Self { rows, clamped_rows })
    }

    /// All rows in timestamp order.
    pub fn rows(&self) -> &[ForecastRow] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows whose bounds were clamped during assembly.
    pub fn clamped_rows(&self) -> usize {
        self.clamped_rows
    }

    /// Rounded copies of every row.
    pub fn display_rows(&self) -> Vec<DisplayRow> {
        self.rows.iter().map(ForecastRow::rounded).collect()
    }

    /// Rounded copies of the last `n` rows.
    pub fn tail(&self, n: usize) -> Vec<DisplayRow> {
        let start = self.rows.len().saturating_sub(n);
        self.rows[start..].iter().map(ForecastRow::rounded).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{Duration, TimeZone};

    fn days(n: usize) -> Vec<DateTime<Utc>> {
        let base = Utc.with_ymd_and_hms(2023, 4, 11, 0, 0, 0).unwrap();
        (0..n).map(|i| base + Duration::days(i as i64)).collect()
    }

    #[test]
    fn assembles_rows_in_order() {
        let forecast = Forecast::from_values_with_intervals(
            vec![1.0, 2.0, 3.0],
            vec![0.5, 1.5, 2.5],
            vec![1.5, 2.5, 3.5],
        );
        let table = ForecastTable::assemble(&days(3), &forecast).unwrap();

        assert_eq!(table.len(), 3);
        assert_eq!(table.clamped_rows(), 0);
        assert_eq!(table.rows()[2].timestamp, days(3)[2]);
        assert_relative_eq!(table.rows()[1].width(), 1.0);
    }

    #[test]
    fn clamps_bounds_around_point() {
        let forecast = Forecast::from_values_with_intervals(
            vec![1.0, 2.0],
            vec![1.2, 1.0],
            vec![3.0, 1.9],
        );
        let table = ForecastTable::assemble(&days(2), &forecast).unwrap();

        assert_eq!(table.clamped_rows(), 2);
        let first = table.rows()[0];
        assert_relative_eq!(first.lower, 1.0);
        assert_relative_eq!(first.upper, 3.0);
        let second = table.rows()[1];
        assert_relative_eq!(second.upper, 2.0);
    }

    #[test]
    fn length_mismatch_is_backend_error() {
        let forecast = Forecast::from_values(vec![1.0, 2.0]).with_symmetric_band(0.5);
        let err = ForecastTable::assemble(&days(3), &forecast).unwrap_err();
        assert!(matches!(err, ForecastError::BackendFit(_)));
    }

    #[test]
    fn missing_bounds_is_backend_error() {
        let forecast = Forecast::from_values(vec![1.0]);
        assert!(ForecastTable::assemble(&days(1), &forecast).is_err());
    }

    #[test]
    fn display_rows_round_to_two_decimals() {
        let forecast = Forecast::from_values_with_intervals(
            vec![10.126, 11.0],
            vec![9.994, 10.0],
            vec![10.555, 12.0],
        );
        let table = ForecastTable::assemble(&days(2), &forecast).unwrap();
        let display = table.display_rows();

        assert_eq!(display[0].date, "2023-04-11");
        assert_relative_eq!(display[0].point, 10.13);
        assert_relative_eq!(display[0].lower, 9.99);
        assert_eq!(table.tail(1), vec![table.rows()[1].rounded()]);
        assert_eq!(table.tail(10).len(), 2);
    }
}
