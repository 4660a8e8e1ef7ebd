//! Payload handed to the renderer.

use serde::Serialize;

use super::table::{DisplayRow, ForecastTable};
use crate::config::BackendKind;
use crate::core::Observation;
use crate::error::{ForecastError, Result};

/// Rows of the uploaded data shown as a preview.
pub const HEAD_PREVIEW_ROWS: usize = 5;

/// Everything a front end needs to draw the actual-vs-forecast chart and
/// the preview tables.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastReport {
    /// Backend selection.
    pub backend: BackendKind,
    /// Model name reported by the backend.
    pub model: String,
    pub horizon: usize,
    /// The actual series.
    pub history: Vec<Observation>,
    /// In-sample fitted values aligned with `history`; warm-up entries a
    /// model cannot fit serialize as `null`.
    pub fitted: Option<Vec<f64>>,
    pub table: ForecastTable,
    /// Rounded forecast rows.
    pub preview: Vec<DisplayRow>,
    /// First rows of the uploaded data.
    pub head: Vec<Observation>,
}

impl ForecastReport {
    /// Whether any row's bounds were clamped.
    pub fn has_clamped_rows(&self) -> bool {
        self.table.clamped_rows() > 0
    }

    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| ForecastError::ComputationError(format!("cannot serialize report: {e}")))
    }

    /// Serialize to indented JSON.
    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| ForecastError::ComputationError(format!("cannot serialize report: {e}")))
    }
}
