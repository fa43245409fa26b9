//! Gatekeeper configuration

use crate::gate::ReadinessCheck;
use crate::GatekeeperError;
use serde::{Deserialize, Serialize};
use sounding_domain::{CriteriaSet, Criterion, PartialCredit};

/// Weight of each readiness check; must sum to 1.0
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadinessWeights {
    /// Has the problem been solved before
    pub prior_art_check: f64,

    /// Does the change fit the existing architecture
    pub architectural_fit: f64,

    /// Has the relevant documentation been read and confirmed
    pub documentation_verification: f64,

    /// Has a working reference implementation been examined
    pub reference_implementation_verification: f64,

    /// Is the root cause understood
    pub root_cause_verification: f64,
}

impl Default for ReadinessWeights {
    fn default() -> Self {
        Self {
            prior_art_check: 0.25,
            architectural_fit: 0.25,
            documentation_verification: 0.20,
            reference_implementation_verification: 0.15,
            root_cause_verification: 0.15,
        }
    }
}

impl ReadinessWeights {
    /// Weight of a single check
    pub fn weight(&self, check: ReadinessCheck) -> f64 {
        match check {
            ReadinessCheck::PriorArt => self.prior_art_check,
            ReadinessCheck::ArchitecturalFit => self.architectural_fit,
            ReadinessCheck::Documentation => self.documentation_verification,
            ReadinessCheck::ReferenceImplementation => self.reference_implementation_verification,
            ReadinessCheck::RootCause => self.root_cause_verification,
        }
    }
}

/// Configuration for the readiness gate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ReadinessConfig {
    /// Per-check weights
    pub weights: ReadinessWeights,

    /// Credit awarded for pass / partial / fail, shared by every check
    pub credit: PartialCredit,
}

impl ReadinessConfig {
    /// Lenient configuration: partial checks earn most of their weight
    pub fn lenient() -> Self {
        Self {
            weights: ReadinessWeights::default(),
            credit: PartialCredit {
                pass: 1.0,
                partial: 0.75,
                fail: 0.0,
            },
        }
    }

    /// Strict configuration: partial checks earn a quarter of their weight
    pub fn strict() -> Self {
        Self {
            weights: ReadinessWeights::default(),
            credit: PartialCredit {
                pass: 1.0,
                partial: 0.25,
                fail: 0.0,
            },
        }
    }

    /// Build the criteria set this configuration describes
    ///
    /// # Errors
    /// Fails with [`GatekeeperError::InvalidConfiguration`] when a weight is out of range,
    /// the weights do not sum to 1.0, or the credit table is invalid.
    pub fn criteria(&self) -> Result<CriteriaSet, GatekeeperError> {
        let criteria = ReadinessCheck::ALL
            .iter()
            .map(|check| {
                Criterion::new(check.as_str(), self.weights.weight(*check)).with_credit(self.credit)
            })
            .collect();
        Ok(CriteriaSet::new(criteria)?)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), GatekeeperError> {
        self.criteria().map(|_| ())
    }

    /// Load configuration from a TOML string
    pub fn from_toml(content: &str) -> Result<Self, GatekeeperError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to a TOML string
    pub fn to_toml(&self) -> Result<String, GatekeeperError> {
        toml::to_string_pretty(self).map_err(|e| GatekeeperError::Parse(e.to_string()))
    }
}
