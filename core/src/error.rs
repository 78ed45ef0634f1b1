use crate::types::TableName;
use thiserror::Error;

/// A required table or column is missing, or a cell cannot be typed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    #[error("Required table '{table}' is missing")]
    MissingTable { table: TableName },

    #[error("Required column '{table}.{column}' is missing")]
    MissingColumn { table: TableName, column: &'static str },

    #[error("Row {row} of '{table}': column '{column}' value {value:?} is not a valid {expected}")]
    Untypeable {
        table: TableName,
        column: &'static str,
        row: usize,
        value: Option<String>,
        expected: &'static str,
    },

    #[error("Row {row} of '{table}' has {actual} cells, header has {expected}")]
    RaggedRow {
        table: TableName,
        row: usize,
        expected: usize,
        actual: usize,
    },
}

/// A typed table violates a structural invariant of the snapshot.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Table '{table}' is empty")]
    EmptyTable { table: TableName },

    #[error("Duplicate key '{key}' in '{table}'")]
    DuplicateKey { table: TableName, key: String },

    #[error("'{table}' row '{key}' references missing {target} '{reference}'")]
    OrphanedReference {
        table: TableName,
        key: String,
        target: TableName,
        reference: String,
    },

    #[error("'{table}' row '{key}': {column} must be >= 0, got {value}")]
    NegativeAmount {
        table: TableName,
        key: String,
        column: &'static str,
        value: String,
    },

    #[error("Transaction '{tx_id}' is a Success but carries error_code '{error_code}'")]
    ErrorCodeOnSuccess { tx_id: String, error_code: String },

    #[error("Transaction '{tx_id}' has no country but gateway '{gateway}' is not privacy-preserving")]
    MissingCountry { tx_id: String, gateway: String },
}

#[derive(Error, Debug)]
pub enum AnalyticsError {
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Computation error in '{metric}': {detail}")]
    Computation { metric: &'static str, detail: String },

    #[error("Snapshot not loaded")]
    NotLoaded,

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

impl AnalyticsError {
    pub fn computation(metric: &'static str, detail: impl Into<String>) -> Self {
        AnalyticsError::Computation {
            metric,
            detail: detail.into(),
        }
    }
}

pub type AnalyticsResult<T> = Result<T, AnalyticsError>;
