//! Configuration for research session runs
//!
//! Depth presets decide how much to ask; this configuration decides how the
//! runner behaves while asking: probe timeouts, abort tolerance and the
//! thresholds the checkpoint uses to judge evidence.

use crate::OrchestratorError;
use serde::{Deserialize, Serialize};
use sounding_domain::CredibilityTier;
use std::time::Duration;

/// Configuration for the session runner
///
/// # Examples
///
/// ```
/// use sounding_orchestrator::OrchestratorConfig;
///
/// // Default configuration (balanced)
/// let config = OrchestratorConfig::default();
/// assert_eq!(config.probe_timeout_ms, 30_000);
///
/// // Hasty: short timeouts, give up after the first dead wave
/// let config = OrchestratorConfig::hasty();
/// assert_eq!(config.max_consecutive_aborts, 1);
///
/// // Patient: long timeouts, demands more corroboration
/// let config = OrchestratorConfig::patient();
/// assert_eq!(config.min_corroborations, 2);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Per-probe timeout (milliseconds)
    /// Default: 30 seconds
    pub probe_timeout_ms: u64,

    /// Consecutive waves with zero successful probes tolerated before the
    /// session aborts
    /// Default: 2
    pub max_consecutive_aborts: u32,

    /// Independent confirmations needed before a non-official topic counts
    /// as corroborated
    /// Default: 1
    pub min_corroborations: usize,

    /// Topics whose best evidence falls below this tier, uncorroborated,
    /// are reported as low-confidence gaps
    /// Default: high
    #[serde(default = "default_min_credible_tier")]
    pub min_credible_tier: CredibilityTier,
}

fn default_min_credible_tier() -> CredibilityTier {
    CredibilityTier::High
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            probe_timeout_ms: 30_000,
            max_consecutive_aborts: 2,
            min_corroborations: 1,
            min_credible_tier: CredibilityTier::High,
        }
    }
}

impl OrchestratorConfig {
    /// Short timeouts and no second chance after a dead wave
    ///
    /// Suitable for interactive use where a quick partial answer beats a
    /// slow complete one.
    pub fn hasty() -> Self {
        Self {
            probe_timeout_ms: 5_000,
            max_consecutive_aborts: 1,
            min_corroborations: 1,
            min_credible_tier: CredibilityTier::Medium,
        }
    }

    /// Long timeouts and stricter corroboration
    pub fn patient() -> Self {
        Self {
            probe_timeout_ms: 120_000,
            max_consecutive_aborts: 3,
            min_corroborations: 2,
            min_credible_tier: CredibilityTier::High,
        }
    }

    /// Per-probe timeout as a Duration
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), OrchestratorError> {
        if self.probe_timeout_ms == 0 {
            return Err(OrchestratorError::InvalidConfiguration(
                "probe_timeout_ms must be greater than 0".to_string(),
            ));
        }
        if self.max_consecutive_aborts == 0 {
            return Err(OrchestratorError::InvalidConfiguration(
                "max_consecutive_aborts must be at least 1".to_string(),
            ));
        }
        if self.min_corroborations == 0 {
            return Err(OrchestratorError::InvalidConfiguration(
                "min_corroborations must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Load configuration from a TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, OrchestratorError> {
        let config: Self = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, OrchestratorError> {
        toml::to_string_pretty(self)
            .map_err(|e| OrchestratorError::InvalidConfiguration(format!("Failed to serialize to TOML: {}", e)))
    }
}
