/// Error types for Portfolio Monitor
///
/// Caller mistakes (unknown fields, wrong column types, malformed input) are
/// reported through these enums. Data that is merely thin or degenerate is
/// never an error: the bucketizer and the selection functions return a
/// reduced or empty result instead.

use crate::column::ColumnType;
use thiserror::Error;

/// A requested field is absent from, or unusable in, the dataset schema.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    #[error("field '{0}' not found in dataset schema")]
    MissingField(String),

    #[error("field '{field}' has type {found:?}, expected a numeric column")]
    NotNumeric { field: String, found: ColumnType },

    #[error("unknown aggregation '{0}'. Use: sum, mean, median, min, max, count")]
    UnknownAggregation(String),
}

/// A filter or brush references a field the selection cannot use.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SelectionError {
    #[error("field '{0}' not found in dataset")]
    FieldNotFound(String),

    #[error("brush field '{field}' has type {found:?}, expected a numeric column")]
    NotNumeric { field: String, found: ColumnType },
}

/// Rows or JSON records that do not fit the dataset schema.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DatasetError {
    #[error("row {row}: missing value for field '{field}'")]
    MissingValue { row: usize, field: String },

    #[error("field '{field}': expected {expected:?}, got {found}")]
    TypeMismatch {
        field: String,
        expected: ColumnType,
        found: String,
    },

    #[error("field '{0}' is not nullable")]
    NotNullable(String),

    #[error("identifier field '{0}' must be a non-nullable String column in the schema")]
    InvalidIdField(String),

    #[error("duplicate record identifier '{0}'")]
    DuplicateId(String),

    #[error("field '{0}' already exists")]
    DuplicateField(String),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("malformed JSON records: {0}")]
    Json(String),
}

/// Dashboard configuration could not be loaded.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}
