//! Error types for the forecast pipeline.

use thiserror::Error;

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, ForecastError>;

/// Coarse classification of a failure, for callers that need to branch on
/// the cause without matching every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Required columns are missing from the input.
    Schema,
    /// A date or value could not be parsed.
    Parse,
    /// The series is too short or otherwise degenerate.
    Data,
    /// The statistical fit or prediction failed.
    BackendFit,
    /// A configuration value is out of range.
    Config,
}

/// Errors that can occur while ingesting data or forecasting.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ForecastError {
    /// One or more required columns are absent.
    #[error("missing required column(s): {}", missing.join(", "))]
    Schema { missing: Vec<String> },

    /// A cell could not be parsed into the expected type.
    #[error("cannot parse {column} {value:?} on row {row}")]
    Parse {
        row: usize,
        column: String,
        value: String,
    },

    /// The CSV input itself is malformed.
    #[error("malformed CSV: {0}")]
    Csv(String),

    /// The input could not be read.
    #[error("i/o error: {0}")]
    Io(String),

    /// Input data is empty.
    #[error("empty input data")]
    EmptyData,

    /// Insufficient data points for the operation.
    #[error("insufficient data: need at least {needed}, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// Degenerate series (duplicates, non-finite or constant values).
    #[error("invalid series: {0}")]
    Data(String),

    /// The statistical fitting procedure failed.
    #[error("model fitting failed: {0}")]
    BackendFit(String),

    /// Computation error (e.g., numerical issues).
    #[error("computation error: {0}")]
    ComputationError(String),

    /// Model has not been fitted yet.
    #[error("model must be fitted before prediction")]
    FitRequired,

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

impl ForecastError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ForecastError::Schema { .. } => ErrorKind::Schema,
            ForecastError::Parse { .. } | ForecastError::Csv(_) => ErrorKind::Parse,
            ForecastError::Io(_)
            | ForecastError::EmptyData
            | ForecastError::InsufficientData { .. }
            | ForecastError::Data(_) => ErrorKind::Data,
            ForecastError::BackendFit(_)
            | ForecastError::ComputationError(_)
            | ForecastError::FitRequired => ErrorKind::BackendFit,
            ForecastError::InvalidParameter(_) => ErrorKind::Config,
        }
    }

    /// The single message shown to the end user when a run aborts.
    pub fn user_message(&self) -> String {
        match self.kind() {
            ErrorKind::Schema => "CSV must contain 'date' and 'value' columns.".to_string(),
            _ => format!("Error processing file: {self}"),
        }
    }

    pub(crate) fn schema(missing: &[&str]) -> Self {
        ForecastError::Schema {
            missing: missing.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl From<csv::Error> for ForecastError {
    fn from(err: csv::Error) -> Self {
        if err.is_io_error() {
            ForecastError::Io(err.to_string())
        } else {
            ForecastError::Csv(err.to_string())
        }
    }
}

impl From<std::io::Error> for ForecastError {
    fn from(err: std::io::Error) -> Self {
        ForecastError::Io(err.to_string())
    }
}
