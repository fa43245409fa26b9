//! Error types for the CLI application.

use thiserror::Error;

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Domain error (depth levels, criteria, registry)
    #[error(transparent)]
    Domain(#[from] sounding_domain::DomainError),

    /// Session error
    #[error("Session error: {0}")]
    Orchestrator(#[from] sounding_orchestrator::OrchestratorError),

    /// Readiness gate error
    #[error("Gate error: {0}")]
    Gatekeeper(#[from] sounding_gatekeeper::GatekeeperError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
