//! Centralized error types for Scrumkit.

use scrumkit_store::{StoreError, StoreResult};
use thiserror::Error;

/// Main error type for Scrumkit operations.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("{0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not signed in: {0}")]
    Unauthenticated(String),

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("An account already exists for {0}")]
    EmailInUse(String),

    #[error("Password must be at least {0} characters long")]
    WeakPassword(usize),

    #[error("Missing required configuration: {}", .0.join(", "))]
    MissingConfig(Vec<String>),

    #[error("Configuration error: {0}")]
    Config(String),

    /// A backend failure, carrying the message shown to users.
    #[error("{message}")]
    Backend {
        message: String,
        #[source]
        source: StoreError,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for Scrumkit operations.
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// Create a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a not-found error.
    pub fn not_found(entity: &str, id: &str) -> Self {
        Self::NotFound(format!("{} not found: {}", entity, id))
    }
}

/// Log a store failure and turn it into a user-facing error.
pub(crate) trait StoreResultExt<T> {
    fn or_backend(self, message: &str) -> CoreResult<T>;
}

impl<T> StoreResultExt<T> for StoreResult<T> {
    fn or_backend(self, message: &str) -> CoreResult<T> {
        self.map_err(|source| match source {
            StoreError::NotFound(what) => CoreError::NotFound(format!("Not found: {}", what)),
            source => {
                tracing::error!(error = %source, "{}", message);
                CoreError::Backend {
                    message: message.to_string(),
                    source,
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_error_shows_user_message() {
        let result: StoreResult<()> = Err(StoreError::OperationFailed("socket closed".into()));
        let err = result.or_backend("Could not save the epic. Please try again.").unwrap_err();
        assert_eq!(err.to_string(), "Could not save the epic. Please try again.");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_store_not_found_maps_to_not_found() {
        let result: StoreResult<()> = Err(StoreError::NotFound("epics/e1".into()));
        let err = result.or_backend("Could not update the epic.").unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
    }

    #[test]
    fn test_missing_config_lists_keys() {
        let err = CoreError::MissingConfig(vec!["A".into(), "B".into()]);
        assert_eq!(err.to_string(), "Missing required configuration: A, B");
    }
}
