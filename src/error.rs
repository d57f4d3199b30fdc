//! Error types for loading budget data
//!
//! The projection engine itself never fails: degenerate inputs produce empty
//! schedules or `None` metrics. Errors only arise at the boundary where raw
//! records are parsed into typed line items.

use thiserror::Error;

/// Errors raised while reading or parsing budget line items
#[derive(Error, Debug)]
pub enum BudgetError {
    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV reader errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A label did not match any known variant of an enumerated field
    #[error("Unknown {field}: '{value}' (line item {item_id})")]
    UnknownLabel {
        field: &'static str,
        value: String,
        item_id: String,
    },

    /// A date column could not be parsed
    #[error("Invalid date '{value}' in {field} (line item {item_id})")]
    InvalidDate {
        field: &'static str,
        value: String,
        item_id: String,
    },

    /// Neither a date range nor a start period + duration was supplied
    #[error("Line item {0} has no timing: expected start/end dates or start period + duration")]
    MissingTiming(String),
}

/// Result alias for budget loading operations
pub type BudgetResult<T> = Result<T, BudgetError>;
