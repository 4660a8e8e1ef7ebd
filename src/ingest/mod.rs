//! CSV ingest: reading, schema validation and normalization into a
//! [`TimeSeries`](crate::core::TimeSeries).

mod dates;
mod normalize;
mod reader;
mod validate;

pub use dates::parse_timestamp;
pub use normalize::normalize;
pub use reader::RawTable;
pub use validate::{validate, ColumnIndex, DATE_COLUMN, MISSING_TOKENS, VALUE_COLUMN};
