//! Error types for the customer registry.
//!
//! This module defines all error types used throughout the crate. Most of
//! them are recoverable from the point of view of an interactive session:
//! the surface reports them as notices and keeps going.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for customer registry operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Storage Errors ===
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Form Errors ===
    /// Required form fields were left empty on submit.
    #[error("required fields missing: {}", fields.join(", "))]
    MissingFields {
        /// Labels of the empty fields, in form order.
        fields: Vec<&'static str>,
    },

    /// A field value would not survive splitting the composed record back.
    #[error("field '{field}' cannot be stored unambiguously: {value:?}")]
    AmbiguousField {
        /// Label of the offending field.
        field: &'static str,
        /// The rejected value.
        value: String,
    },

    /// A stored record does not have the shape needed to open it for edit.
    #[error("record cannot be opened for edit: {reason}")]
    MalformedRecord {
        /// What part of the record is malformed.
        reason: String,
    },

    // === Registry Errors ===
    /// An index does not point at a stored record.
    #[error("no record at index {index} (registry holds {len})")]
    IndexOutOfRange {
        /// The requested index.
        index: usize,
        /// Number of records in the registry.
        len: usize,
    },

    // === Lookup Errors ===
    /// The postal lookup could not be completed.
    #[error("postal lookup failed: {0}")]
    Lookup(#[from] crate::lookup::LookupError),

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for customer registry operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a malformed record error.
    #[must_use]
    pub fn malformed_record(reason: impl Into<String>) -> Self {
        Self::MalformedRecord {
            reason: reason.into(),
        }
    }

    /// Check if this error should be shown to the user as a notice while the
    /// session carries on, rather than ending the program.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::MissingFields { .. }
                | Self::AmbiguousField { .. }
                | Self::MalformedRecord { .. }
                | Self::IndexOutOfRange { .. }
                | Self::Lookup(_)
        )
    }
}
