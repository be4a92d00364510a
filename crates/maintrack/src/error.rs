//! Error types for maintrack.
//!
//! This module defines all error types used throughout the maintrack crate,
//! covering access-control outcomes, data validation, and storage failures.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for maintrack operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Access Errors ===
    /// The action requires an authenticated user.
    #[error("authentication required: redirect to login")]
    AuthenticationRequired,

    /// The authenticated user lacks the required role or permission.
    #[error("access denied for '{username}': redirect to access-denied page")]
    AuthorizationDenied {
        /// Name of the user that was denied.
        username: String,
    },

    // === Domain Errors ===
    /// A referenced entity does not exist.
    #[error("{entity} with id {id} not found")]
    NotFound {
        /// Kind of entity that was looked up.
        entity: &'static str,
        /// The id that missed.
        id: i64,
    },

    /// A field-level validation failure.
    #[error("validation failed for {field}: {message}")]
    Validation {
        /// Name of the offending field.
        field: &'static str,
        /// Description of the failure.
        message: String,
    },

    /// A write would make an asset its own ancestor or a report chain
    /// loop back on itself.
    #[error("{entity} {id}: link would create a cycle")]
    CycleDetected {
        /// Kind of entity whose link was rejected.
        entity: &'static str,
        /// Id of the entity being written.
        id: i64,
    },

    /// A single CSV import row failed. Collected per row, never aborts
    /// the batch.
    #[error("import row {row}: {message}")]
    ImportRow {
        /// 1-based row number within the file (excluding the header).
        row: usize,
        /// Description of the failure.
        message: String,
    },

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

    /// CSV reading or writing failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// A specialized Result type for maintrack operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a not-found error for the given entity kind and id.
    #[must_use]
    pub fn not_found(entity: &'static str, id: i64) -> Self {
        Self::NotFound { entity, id }
    }

    /// Create a field validation error.
    #[must_use]
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    /// Create a cycle-detected error.
    #[must_use]
    pub fn cycle(entity: &'static str, id: i64) -> Self {
        Self::CycleDetected { entity, id }
    }

    /// Create a per-row import error.
    #[must_use]
    pub fn import_row(row: usize, message: impl Into<String>) -> Self {
        Self::ImportRow {
            row,
            message: message.into(),
        }
    }

    /// Create an access-denied error for the named user.
    #[must_use]
    pub fn denied(username: impl Into<String>) -> Self {
        Self::AuthorizationDenied {
            username: username.into(),
        }
    }

    /// Check if this error is a missing-entity lookup.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this error is an access-control denial (either the
    /// login redirect or the access-denied redirect).
    #[must_use]
    pub fn is_access_denied(&self) -> bool {
        matches!(
            self,
            Self::AuthenticationRequired | Self::AuthorizationDenied { .. }
        )
    }
}
