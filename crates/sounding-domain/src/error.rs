//! Domain error types

use thiserror::Error;

/// Errors raised while constructing domain values
///
/// Configuration errors are fatal and raised at construction time only;
/// a value that fails validation is never partially applied.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    /// Bad depth level, malformed criteria or any other invalid setup
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl DomainError {
    /// Shorthand for building an [`DomainError::InvalidConfiguration`]
    pub fn invalid(msg: impl Into<String>) -> Self {
        DomainError::InvalidConfiguration(msg.into())
    }
}
