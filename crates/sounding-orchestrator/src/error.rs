//! Error types for orchestrator operations

use sounding_domain::DomainError;
use thiserror::Error;

/// Errors that can occur while driving a research session
///
/// Probe-level failures never surface here: they are recorded on the probe
/// and folded into the terminal report.
#[derive(Error, Debug)]
pub enum OrchestratorError {
    /// Invalid depth policy, criteria, wave plan or runner configuration
    #[error("Configuration error: {0}")]
    InvalidConfiguration(String),

    /// Session lifecycle violation
    #[error("Invalid session transition: {0}")]
    InvalidTransition(String),

    /// Wave scheduling failure (tokio runtime issues)
    #[error("Scheduler error: {0}")]
    Scheduler(String),
}

impl From<DomainError> for OrchestratorError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::InvalidConfiguration(msg) => OrchestratorError::InvalidConfiguration(msg),
        }
    }
}

impl From<toml::de::Error> for OrchestratorError {
    fn from(err: toml::de::Error) -> Self {
        OrchestratorError::InvalidConfiguration(format!("Failed to parse TOML: {}", err))
    }
}
