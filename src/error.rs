//! Error types for geoprobe
//!
//! This module defines the error hierarchy used throughout the harness.
//! We use `thiserror` for library-style errors with clear error chains.

use std::io;

/// Main error type for geoprobe
#[derive(Debug, thiserror::Error)]
pub enum GeoprobeError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A probe observed data that does not match expectations
    #[error("Check failed: {0}")]
    Check(#[from] CheckError),
}

/// Database operation errors
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// Failed to establish connection
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Query execution failed
    #[error("Query execution failed: {0}")]
    QueryFailed(String),

    /// The handle has already been closed
    #[error("Not connected to database")]
    NotConnected,

    /// Type conversion error
    #[error("Type conversion error: {0}")]
    TypeConversion(String),
}

impl From<tokio_postgres::Error> for DbError {
    fn from(err: tokio_postgres::Error) -> Self {
        DbError::QueryFailed(pg_error_message(&err))
    }
}

/// Render a driver error, keeping the server's SQLSTATE, message and detail.
///
/// `Display` on a server-side error prints only "db error".
pub(crate) fn pg_error_message(err: &tokio_postgres::Error) -> String {
    match err.as_db_error() {
        Some(db) => {
            let mut msg = format!("{} {}", db.code().code(), db.message());
            if let Some(detail) = db.detail() {
                msg.push_str(&format!(" ({})", detail));
            }
            msg
        }
        None => err.to_string(),
    }
}

/// Configuration loading/parsing errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Required environment variables are unset or empty
    #[error("Missing required environment variable(s): {}", .0.join(", "))]
    MissingVars(Vec<String>),

    /// Settings file could not be read
    #[error("Failed to read settings file: {0}")]
    Io(#[from] io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Probe assertion failures
#[derive(Debug, thiserror::Error)]
pub enum CheckError {
    /// Extension not installed in the target database
    #[error("Extension '{0}' is not installed")]
    ExtensionMissing(String),

    /// Expected columns absent from the table
    #[error("Table '{table}' is missing column(s): {}", .missing.join(", "))]
    ColumnsMissing { table: String, missing: Vec<String> },

    /// Row with the given id was not found after insert
    #[error("No row with id {0}")]
    RowNotFound(i64),

    /// Row had an unexpected number of columns
    #[error("Expected {expected} columns, got {actual}")]
    ColumnCount { expected: usize, actual: usize },

    /// A scalar field read back differs from what was written
    #[error("Field '{field}' mismatch: expected {expected}, got {actual}")]
    FieldMismatch {
        field: &'static str,
        expected: String,
        actual: String,
    },

    /// Geometry column was NULL after insert
    #[error("Geometry is NULL for id {0}")]
    GeometryMissing(i64),

    /// Geometry read back differs from the inserted point
    #[error("Geometry mismatch: expected {expected}, got {actual}")]
    GeometryMismatch { expected: String, actual: String },

    /// Rows with the fixture id existed before the insert
    #[error("{count} row(s) with id {id} already present; remove them before rerunning")]
    FixtureOccupied { id: i64, count: i64 },

    /// Rows with the fixture id survived cleanup
    #[error("{count} row(s) with id {id} left after cleanup")]
    ResidualRows { id: i64, count: i64 },
}

/// Specialized Result type for geoprobe operations
pub type Result<T> = std::result::Result<T, GeoprobeError>;

/// Specialized Result type for database operations
pub type DbResult<T> = std::result::Result<T, DbError>;

/// Specialized Result type for config operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Specialized Result type for probe checks
pub type CheckResult<T> = std::result::Result<T, CheckError>;
