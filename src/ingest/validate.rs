//! Schema check for the required columns.

use super::reader::RawTable;
use crate::error::{ForecastError, Result};

/// Name of the timestamp column.
pub const DATE_COLUMN: &str = "date";
/// Name of the observation column.
pub const VALUE_COLUMN: &str = "value";
/// Value cells read as missing observations (besides a blank cell).
pub const MISSING_TOKENS: [&str; 18] = [
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Positions of the required columns within a [`RawTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnIndex {
    pub date: usize,
    pub value: usize,
}

/// Verify that `date` and `value` are present (exact, case-sensitive).
///
/// Other columns are ignored.
pub fn validate(table: &RawTable) -> Result<ColumnIndex> {
    let date = table.column_index(DATE_COLUMN);
    let value = table.column_index(VALUE_COLUMN);

    match (date, value) {
        (Some(date), Some(value)) => Ok(ColumnIndex { date, value }),
        (date, value) => {
            let mut missing = Vec::new();
            if date.is_none() {
                missing.push(DATE_COLUMN);
            }
            if value.is_none() {
                missing.push(VALUE_COLUMN);
            }
            Err(ForecastError::schema(&missing))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(headers: &[&str]) -> RawTable {
        RawTable::new(headers.iter().map(|h| h.to_string()).collect(), vec![])
    }

    #[test]
    fn accepts_required_columns_in_any_order() {
        let idx = validate(&table(&["store", "value", "date"])).unwrap();
        assert_eq!(idx, ColumnIndex { date: 2, value: 1 });
    }

    #[test]
    fn names_the_missing_column() {
        let err = validate(&table(&["date", "sales"])).unwrap_err();
        assert_eq!(
            err,
            ForecastError::Schema {
                missing: vec!["value".to_string()]
            }
        );
    }

    #[test]
    fn names_both_missing_columns() {
        let err = validate(&table(&[])).unwrap_err();
        assert_eq!(err.to_string(), "missing required column(s): date, value");
    }

    #[test]
    fn column_names_are_case_sensitive() {
        assert!(validate(&table(&["Date", "Value"])).is_err());
    }
}
