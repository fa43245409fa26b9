//! Gatekeeper error types

use sounding_domain::DomainError;
use thiserror::Error;

/// Errors that can occur during gatekeeper operations
#[derive(Error, Debug)]
pub enum GatekeeperError {
    /// Invalid weights or credit table
    #[error("Configuration error: {0}")]
    InvalidConfiguration(String),

    /// Malformed checklist or configuration document
    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<DomainError> for GatekeeperError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::InvalidConfiguration(msg) => GatekeeperError::InvalidConfiguration(msg),
        }
    }
}

impl From<toml::de::Error> for GatekeeperError {
    fn from(err: toml::de::Error) -> Self {
        GatekeeperError::Parse(err.to_string())
    }
}
