//! Error types and result aliases for Courant.
//!
//! This module defines the shared error types used across all Courant
//! components. Errors are structured for programmatic handling and include
//! context for debugging.

/// The result type used throughout Courant.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in core operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An invalid identifier was provided.
    #[error("invalid identifier: {message}")]
    InvalidId {
        /// Description of what made the ID invalid.
        message: String,
    },

    /// A storage operation failed.
    #[error("storage error: {message}")]
    Storage {
        /// Description of the storage failure.
        message: String,
        /// The underlying cause, if any.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A serialization or deserialization error occurred.
    #[error("serialization error: {message}")]
    Serialization {
        /// Description of the serialization failure.
        message: String,
    },
}

impl Error {
    /// Creates a new storage error with the given message.
    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new storage error with a source cause.
    #[must_use]
    pub fn storage_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Storage {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a new serialization error.
    #[must_use]
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_error_display() {
        let err = Error::storage("row missing");
        assert_eq!(err.to_string(), "storage error: row missing");
    }

    #[test]
    fn storage_error_carries_source() {
        let source = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        let err = Error::storage_with_source("write failed", source);
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn invalid_id_display() {
        let err = Error::InvalidId {
            message: "bad ulid".into(),
        };
        assert!(err.to_string().contains("bad ulid"));
    }
}
