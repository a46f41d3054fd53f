//! Error types for the send-orchestration domain.
//!
//! The taxonomy mirrors how callers branch:
//!
//! - [`Error::Validation`] and [`Error::Permission`] are surfaced to the
//!   caller synchronously with no state mutated
//! - [`Error::EntityNotFound`] and [`Error::Dispatch`] count toward the
//!   orchestrator's retry budget
//! - A failed lock acquisition is **not** an error - it is the normal
//!   concurrency outcome, reported as
//!   [`crate::orchestrator::OrchestrationOutcome::LockNotAcquired`]

/// The result type used throughout courant-send.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in lifecycle and orchestration operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The requested entity was not found.
    #[error("not found: {resource_type} with id {id}")]
    EntityNotFound {
        /// The type of resource that was not found.
        resource_type: &'static str,
        /// The identifier that was looked up.
        id: String,
    },

    /// A request failed validation.
    #[error("validation error: {message}")]
    Validation {
        /// Description of the validation failure.
        message: String,
    },

    /// A cross-company access was attempted.
    #[error("permission denied: {message}")]
    Permission {
        /// Description of the denied access.
        message: String,
    },

    /// An invalid state transition was attempted.
    #[error("invalid state transition: {from} -> {to} ({reason})")]
    InvalidStateTransition {
        /// The current state.
        from: String,
        /// The attempted target state.
        to: String,
        /// The reason the transition is invalid.
        reason: String,
    },

    /// A transient failure during recipient load or batch fan-out.
    ///
    /// Retried by the orchestrator with backoff up to the configured budget.
    #[error("dispatch error: {message}")]
    Dispatch {
        /// Description of the dispatch failure.
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

    /// Invalid or out-of-range configuration.
    #[error("configuration error: {message}")]
    Configuration {
        /// Description of the configuration problem.
        message: String,
    },

    /// An error from courant-core.
    #[error("core error: {0}")]
    Core(#[from] courant_core::Error),
}

impl Error {
    /// Creates a new validation error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Creates a new permission error.
    #[must_use]
    pub fn permission(message: impl Into<String>) -> Self {
        Self::Permission {
            message: message.into(),
        }
    }

    /// Creates a new dispatch error.
    #[must_use]
    pub fn dispatch(message: impl Into<String>) -> Self {
        Self::Dispatch {
            message: message.into(),
        }
    }

    /// Creates a new storage error.
    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new configuration error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates a new not-found error.
    #[must_use]
    pub fn not_found(resource_type: &'static str, id: impl ToString) -> Self {
        Self::EntityNotFound {
            resource_type,
            id: id.to_string(),
        }
    }

    /// Returns true if this is a validation error.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    /// Returns true if this is a permission error.
    #[must_use]
    pub const fn is_permission(&self) -> bool {
        matches!(self, Self::Permission { .. })
    }

    /// Returns true if this is a not-found error.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::EntityNotFound { .. })
    }

    /// Returns true if the orchestrator should count this error toward its
    /// retry budget rather than surface it to the caller.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::EntityNotFound { .. } | Self::Dispatch { .. } | Self::Storage { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_is_not_retryable() {
        let err = Error::validation("scheduled_for must be in the future (UTC)");
        assert!(err.is_validation());
        assert!(!err.is_retryable());
    }

    #[test]
    fn dispatch_and_not_found_are_retryable() {
        assert!(Error::dispatch("queue unavailable").is_retryable());
        assert!(Error::not_found("campaign", "01J").is_retryable());
    }

    #[test]
    fn permission_display() {
        let err = Error::permission("campaign doesn't belong to your company");
        assert!(err.to_string().starts_with("permission denied"));
    }

    #[test]
    fn core_error_converts() {
        let core = courant_core::Error::storage("lock poisoned");
        let err: Error = core.into();
        assert!(matches!(err, Error::Core(_)));
    }
}
