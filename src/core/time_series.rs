//! Daily time series of timestamped observations.

use crate::error::{ForecastError, Result};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::HashMap;

/// One (timestamp, value) pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Observation {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

/// A univariate time series with strictly increasing timestamps.
///
/// Constructed once per upload and never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    timestamps: Vec<DateTime<Utc>>,
    values: Vec<f64>,
}

impl TimeSeries {
    /// Create a series from aligned timestamps and values.
    ///
    /// Timestamps must already be strictly increasing and every value finite.
    pub fn univariate(timestamps: Vec<DateTime<Utc>>, values: Vec<f64>) -> Result<Self> {
        if timestamps.len() != values.len() {
            return Err(ForecastError::Data(format!(
                "{} timestamps but {} values",
                timestamps.len(),
                values.len()
            )));
        }

        for w in timestamps.windows(2) {
            if w[1] == w[0] {
                return Err(ForecastError::Data(format!("duplicate timestamp {}", w[0])));
            }
            if w[1] < w[0] {
                return Err(ForecastError::Data(
                    "timestamps must be strictly increasing".to_string(),
                ));
            }
        }

        if let Some(pos) = values.iter().position(|v| !v.is_finite()) {
            return Err(ForecastError::Data(format!(
                "non-finite value at {}",
                timestamps[pos]
            )));
        }

        Ok(Self { timestamps, values })
    }

    /// Create a series from unordered observations, sorting them ascending.
    pub fn from_observations(mut observations: Vec<Observation>) -> Result<Self> {
        observations.sort_by_key(|o| o.timestamp);
        let (timestamps, values) = observations
            .into_iter()
            .map(|o| (o.timestamp, o.value))
            .unzip();
        Self::univariate(timestamps, values)
    }

    /// Get the number of observations.
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    /// Check if the series is empty.
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Get timestamps.
    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamps
    }

    /// Get values.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Timestamp of the first observation.
    pub fn first_timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamps.first().copied()
    }

    /// Timestamp of the last observation.
    pub fn last_timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamps.last().copied()
    }

    /// Time covered from first to last observation.
    pub fn span(&self) -> Duration {
        match (self.first_timestamp(), self.last_timestamp()) {
            (Some(first), Some(last)) => last - first,
            _ => Duration::zero(),
        }
    }

    /// Iterate over observations in time order.
    pub fn observations(&self) -> impl Iterator<Item = Observation> + '_ {
        self.timestamps
            .iter()
            .zip(self.values.iter())
            .map(|(&timestamp, &value)| Observation { timestamp, value })
    }

    /// The first `n` observations (fewer if the series is shorter).
    pub fn head(&self, n: usize) -> Vec<Observation> {
        self.observations().take(n).collect()
    }

    /// Whether every value is identical.
    pub fn is_constant(&self) -> bool {
        match self.values.first() {
            Some(&first) => self.values.iter().all(|&v| v == first),
            None => true,
        }
    }

    /// The `horizon` daily timestamps immediately following the last observation.
    pub fn future_timestamps(&self, horizon: usize) -> Result<Vec<DateTime<Utc>>> {
        let last = self.last_timestamp().ok_or(ForecastError::EmptyData)?;
        Ok((1..=horizon as i64)
            .map(|d| last + Duration::days(d))
            .collect())
    }

    /// Infer the sampling interval as the modal spacing between timestamps.
    ///
    /// Returns an error if fewer than two observations exist or no spacing
    /// accounts for at least `tolerance` of all gaps.
    pub fn infer_frequency(&self, tolerance: f64) -> Result<Duration> {
        if self.len() < 2 {
            return Err(ForecastError::InsufficientData {
                needed: 2,
                got: self.len(),
            });
        }

        let mut counts: HashMap<i64, usize> = HashMap::new();
        for w in self.timestamps.windows(2) {
            *counts.entry((w[1] - w[0]).num_seconds()).or_insert(0) += 1;
        }

        // Ties resolve to the shortest spacing so the result is deterministic.
        let (modal_diff, modal_count) = counts
            .iter()
            .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(a.0)))
            .map(|(&diff, &count)| (diff, count))
            .ok_or(ForecastError::EmptyData)?;

        let modal_ratio = modal_count as f64 / (self.len() - 1) as f64;
        if modal_ratio < tolerance {
            return Err(ForecastError::Data(
                "no dominant spacing between timestamps".to_string(),
            ));
        }

        Ok(Duration::seconds(modal_diff))
    }

    /// Whether the modal spacing is exactly one day.
    pub fn is_daily(&self) -> bool {
        matches!(self.infer_frequency(0.5), Ok(freq) if freq == Duration::days(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn make_timestamps(n: usize) -> Vec<DateTime<Utc>> {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        (0..n).map(|i| base + Duration::days(i as i64)).collect()
    }

    #[test]
    fn time_series_constructs_univariate_data() {
        let timestamps = make_timestamps(5);
        let values = vec![1.0, 2.0, 3.0, 4.0, 5.0];

        let ts = TimeSeries::univariate(timestamps.clone(), values.clone()).unwrap();

        assert_eq!(ts.len(), 5);
        assert!(!ts.is_empty());
        assert_eq!(ts.values(), &values);
        assert_eq!(ts.timestamps(), &timestamps);
        assert_eq!(ts.span(), Duration::days(4));
    }

    #[test]
    fn time_series_rejects_duplicates_and_disorder() {
        let mut timestamps = make_timestamps(3);
        timestamps[2] = timestamps[1];
        let err = TimeSeries::univariate(timestamps, vec![1.0, 2.0, 3.0]).unwrap_err();
        assert!(err.to_string().contains("duplicate timestamp"));

        let mut timestamps = make_timestamps(3);
        timestamps.swap(0, 2);
        assert!(TimeSeries::univariate(timestamps, vec![1.0, 2.0, 3.0]).is_err());
    }

    #[test]
    fn time_series_rejects_mismatch_and_non_finite() {
        assert!(TimeSeries::univariate(make_timestamps(3), vec![1.0, 2.0]).is_err());
        assert!(TimeSeries::univariate(make_timestamps(2), vec![1.0, f64::NAN]).is_err());
        assert!(TimeSeries::univariate(make_timestamps(2), vec![f64::INFINITY, 1.0]).is_err());
    }

    #[test]
    fn from_observations_sorts() {
        let ts = make_timestamps(3);
        let obs = vec![
            Observation { timestamp: ts[2], value: 3.0 },
            Observation { timestamp: ts[0], value: 1.0 },
            Observation { timestamp: ts[1], value: 2.0 },
        ];
        let series = TimeSeries::from_observations(obs).unwrap();
        assert_eq!(series.values(), &[1.0, 2.0, 3.0]);
        assert_eq!(series.first_timestamp(), Some(ts[0]));
        assert_eq!(series.last_timestamp(), Some(ts[2]));
    }

    #[test]
    fn future_timestamps_are_daily_after_last() {
        let series = TimeSeries::univariate(make_timestamps(10), vec![1.0; 10]).unwrap();
        let future = series.future_timestamps(3).unwrap();
        let last = series.last_timestamp().unwrap();
        assert_eq!(future.len(), 3);
        assert_eq!(future[0], last + Duration::days(1));
        assert_eq!(future[2], last + Duration::days(3));
        assert!(series.future_timestamps(0).unwrap().is_empty());
    }

    #[test]
    fn infer_frequency_daily_with_gap() {
        let mut timestamps = make_timestamps(10);
        timestamps[9] = timestamps[8] + Duration::days(3);
        let series = TimeSeries::univariate(timestamps, (0..10).map(f64::from).collect()).unwrap();
        assert_eq!(series.infer_frequency(0.5).unwrap(), Duration::days(1));
        assert!(series.is_daily());
    }

    #[test]
    fn infer_frequency_weekly() {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let timestamps: Vec<_> = (0..6).map(|i| base + Duration::weeks(i)).collect();
        let series = TimeSeries::univariate(timestamps, vec![1.0; 6]).unwrap();
        assert_eq!(series.infer_frequency(0.5).unwrap(), Duration::weeks(1));
        assert!(!series.is_daily());
    }

    #[test]
    fn head_and_constant() {
        let series = TimeSeries::univariate(make_timestamps(8), vec![2.0; 8]).unwrap();
        assert_eq!(series.head(5).len(), 5);
        assert_eq!(series.head(20).len(), 8);
        assert!(series.is_constant());

        let series = TimeSeries::univariate(make_timestamps(2), vec![2.0, 3.0]).unwrap();
        assert!(!series.is_constant());
    }
}
