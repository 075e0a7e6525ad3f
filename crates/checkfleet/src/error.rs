//! Error types for checkfleet.
//!
//! Every fallible operation in the crate returns [`Error`]. Store adapters fold
//! their transport and decode failures into [`Error::BackendUnavailable`] so the
//! calling layer sees one taxonomy regardless of which backend was active.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Which storage backend an operation ran against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// On-device key-value blob.
    Local,
    /// Remote document collection.
    Remote,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => write!(f, "local"),
            Self::Remote => write!(f, "remote"),
        }
    }
}

/// The main error type for checkfleet operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Validation Errors ===
    /// A field value failed its well-formedness rule.
    #[error("invalid {field}: {message}")]
    Validation {
        /// Name of the offending field.
        field: &'static str,
        /// What the field must look like.
        message: String,
    },

    /// A typed update addressed a section the template never created.
    #[error("unknown section '{section_id}'")]
    UnknownSection {
        /// The section id that was not found.
        section_id: String,
    },

    /// A typed update addressed an item the template never created.
    #[error("unknown item '{item_id}' in section '{section_id}'")]
    UnknownItem {
        /// The section that was searched.
        section_id: String,
        /// The item id that was not found.
        item_id: String,
    },

    /// A checklist already holds the maximum number of photos.
    #[error("a checklist holds at most {max} images")]
    ImageLimit {
        /// The limit that was hit.
        max: usize,
    },

    // === Backend Errors ===
    /// Reading from or writing to the active backend failed.
    #[error("{backend} backend unavailable: {message}")]
    BackendUnavailable {
        /// The backend that failed.
        backend: BackendKind,
        /// Description of what went wrong.
        message: String,
    },

    /// A remote operation was requested without usable credentials.
    #[error("remote backend is not configured")]
    BackendNotConfigured,

    /// One write of a bulk sync failed. Earlier writes stay applied.
    #[error("sync failed at record {index} ('{id}'): {source}")]
    SyncFailed {
        /// Zero-based position of the failed record.
        index: usize,
        /// Id of the failed record.
        id: String,
        /// The underlying failure.
        #[source]
        source: Box<Error>,
    },

    // === Image Errors ===
    /// An image reference could not be turned into embedded data.
    #[error("failed to resolve image '{reference}': {message}")]
    ImageResolution {
        /// The reference that could not be resolved.
        reference: String,
        /// Description of what went wrong.
        message: String,
    },

    // === Storage Errors ===
    /// Failed to open or create the local database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

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

    // === Generic Errors ===
    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for checkfleet operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a validation error for the named field.
    #[must_use]
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    /// Create a backend-unavailable error.
    #[must_use]
    pub fn backend(backend: BackendKind, message: impl Into<String>) -> Self {
        Self::BackendUnavailable {
            backend,
            message: message.into(),
        }
    }

    /// Create an image resolution error.
    #[must_use]
    pub fn image_resolution(reference: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ImageResolution {
            reference: reference.into(),
            message: message.into(),
        }
    }

    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Check if this error is a field validation failure.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    /// Check if this error reports an unreachable backend.
    #[must_use]
    pub fn is_backend_unavailable(&self) -> bool {
        matches!(self, Self::BackendUnavailable { .. })
    }

    /// Check if this error reports missing remote credentials.
    #[must_use]
    pub fn is_not_configured(&self) -> bool {
        matches!(self, Self::BackendNotConfigured)
    }

    /// The field named by a validation error.
    #[must_use]
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::Validation { field, .. } => Some(field),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_kind_display() {
        assert_eq!(BackendKind::Local.to_string(), "local");
        assert_eq!(BackendKind::Remote.to_string(), "remote");
    }

    #[test]
    fn test_validation_error_display() {
        let err = Error::validation("plate", "expected ABC1D23");
        assert_eq!(err.to_string(), "invalid plate: expected ABC1D23");
        assert!(err.is_validation());
        assert_eq!(err.field(), Some("plate"));
    }

    #[test]
    fn test_backend_error_display() {
        let err = Error::backend(BackendKind::Remote, "connection refused");
        assert_eq!(
            err.to_string(),
            "remote backend unavailable: connection refused"
        );
        assert!(err.is_backend_unavailable());
        assert!(!err.is_validation());
        assert_eq!(err.field(), None);
    }

    #[test]
    fn test_not_configured() {
        assert!(Error::BackendNotConfigured.is_not_configured());
        assert!(!Error::internal("x").is_not_configured());
        assert_eq!(
            Error::BackendNotConfigured.to_string(),
            "remote backend is not configured"
        );
    }

    #[test]
    fn test_sync_failed_display_and_source() {
        let err = Error::SyncFailed {
            index: 3,
            id: "1700000000000".to_string(),
            source: Box::new(Error::backend(BackendKind::Remote, "HTTP 503")),
        };
        let msg = err.to_string();
        assert!(msg.contains("record 3"));
        assert!(msg.contains("1700000000000"));
        assert!(msg.contains("HTTP 503"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_unknown_item_display() {
        let err = Error::UnknownItem {
            section_id: "tires".to_string(),
            item_id: "spare".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("tires"));
        assert!(msg.contains("spare"));
    }

    #[test]
    fn test_image_limit_display() {
        let err = Error::ImageLimit { max: 2 };
        assert_eq!(err.to_string(), "a checklist holds at most 2 images");
    }

    #[test]
    fn test_image_resolution_display() {
        let err = Error::image_resolution("file:///tmp/front.jpg", "not found");
        let msg = err.to_string();
        assert!(msg.contains("front.jpg"));
        assert!(msg.contains("not found"));
    }

    #[test]
    fn test_from_json_error() {
        let json_result: std::result::Result<i32, serde_json::Error> =
            serde_json::from_str("not valid json");
        if let Err(json_err) = json_result {
            let err: Error = json_err.into();
            assert!(matches!(err, Error::Json(_)));
        }
    }

    #[test]
    fn test_database_open_error_display() {
        let result = rusqlite::Connection::open_with_flags(
            "/nonexistent/path/db.sqlite",
            rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY,
        );
        if let Err(sqlite_err) = result {
            let err = Error::DatabaseOpen {
                path: PathBuf::from("/nonexistent/path/db.sqlite"),
                source: sqlite_err,
            };
            assert!(err.to_string().contains("/nonexistent/path/db.sqlite"));
        }
    }

    #[test]
    fn test_config_validation_error_display() {
        let err = Error::ConfigValidation {
            message: "page_size must be greater than 0".to_string(),
        };
        assert!(err.to_string().contains("page_size"));
    }
}
