//! Turning validated rows into a [`TimeSeries`].

use chrono::Duration;

use super::dates::parse_timestamp;
use super::reader::RawTable;
use super::validate::{ColumnIndex, DATE_COLUMN, MISSING_TOKENS, VALUE_COLUMN};
use crate::core::{Observation, TimeSeries};
use crate::error::{ForecastError, Result};

/// Share of gaps that must agree for a cadence to be inferred.
const FREQUENCY_TOLERANCE: f64 = 0.5;

/// Parse, sort and check the rows of a validated table.
///
/// Rows whose `value` cell is blank, one of [`MISSING_TOKENS`] or parses to
/// NaN are dropped as missing observations. Infinite values are kept and
/// rejected as degenerate.
/// `row` numbers in errors are 1-based and count data rows only.
pub fn normalize(
    table: &RawTable,
    columns: ColumnIndex,
    min_observations: usize,
) -> Result<TimeSeries> {
    let mut observations = Vec::with_capacity(table.len());
    let mut dropped = 0usize;

    for idx in 0..table.len() {
        let row = idx + 1;
        let date_text = table.cell(idx, columns.date);
        let value_text = table.cell(idx, columns.value);

        let timestamp = parse_timestamp(date_text).ok_or_else(|| ForecastError::Parse {
            row,
            column: DATE_COLUMN.to_string(),
            value: date_text.to_string(),
        })?;

        let value = if is_missing(value_text) {
            None
        } else {
            let parsed = value_text
                .parse::<f64>()
                .map_err(|_| ForecastError::Parse {
                    row,
                    column: VALUE_COLUMN.to_string(),
                    value: value_text.to_string(),
                })?;
            Some(parsed).filter(|v| !v.is_nan())
        };
        let Some(value) = value else {
            tracing::debug!(row, text = value_text, "dropping row with missing value");
            dropped += 1;
            continue;
        };

        observations.push(Observation { timestamp, value });
    }

    if dropped > 0 {
        tracing::debug!(dropped, kept = observations.len(), "dropped rows without values");
    }
    if observations.is_empty() {
        return Err(ForecastError::EmptyData);
    }

    let series = TimeSeries::from_observations(observations)?;

    if series.len() < min_observations {
        return Err(ForecastError::InsufficientData {
            needed: min_observations,
            got: series.len(),
        });
    }
    if series.is_constant() {
        return Err(ForecastError::Data("all values are identical".to_string()));
    }

    match series.infer_frequency(FREQUENCY_TOLERANCE) {
        Ok(freq) if freq == Duration::days(1) => {}
        Ok(freq) => tracing::warn!(
            spacing_seconds = freq.num_seconds(),
            "series is not daily; forecasts are still produced at daily steps"
        ),
        Err(_) => tracing::warn!("series has irregular spacing; forecasts use daily steps"),
    }

    Ok(series)
}

fn is_missing(text: &str) -> bool {
    text.is_empty() || MISSING_TOKENS.contains(&text)
}
