//! Error types for cgats-core

use thiserror::Error;

/// Result type for cgats-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when parsing or manipulating CGATS documents
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Input is not recognizable as a CGATS document
    #[error("Invalid CGATS document: {0}")]
    InvalidDocument(String),

    /// A mutation was attempted on a node kind that does not support it
    #[error("Invalid operation for {kind} node: {what}")]
    InvalidOperation {
        kind: &'static str,
        what: String,
    },

    /// A lookup referenced a field or column that does not exist
    #[error("No such key: {0}")]
    Key(String),

    /// A data row was supplied with the wrong number of fields
    #[error("Wrong number of fields: expected {expected}, got {actual}")]
    FieldCount { expected: usize, actual: usize },

    /// A value required to be numeric by its column could not be parsed
    #[error("Column {column} requires a numeric value, got {token:?}")]
    Value { column: String, token: String },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
