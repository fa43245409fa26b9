//! Depth policy module - probe budgets and stopping thresholds per depth level

use crate::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;

/// Requested research depth
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DepthLevel {
    /// One small wave, fast answer
    Quick,
    /// A handful of probes, up to two waves
    Standard,
    /// Broad sweep, up to three waves
    Deep,
    /// Budget-bounded sweep, up to five waves
    Exhaustive,
}

impl DepthLevel {
    /// All depth levels, shallowest first
    pub const ALL: [DepthLevel; 4] = [
        DepthLevel::Quick,
        DepthLevel::Standard,
        DepthLevel::Deep,
        DepthLevel::Exhaustive,
    ];

    /// Get the level name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            DepthLevel::Quick => "quick",
            DepthLevel::Standard => "standard",
            DepthLevel::Deep => "deep",
            DepthLevel::Exhaustive => "exhaustive",
        }
    }

    /// Resolve this level to its built-in policy
    pub fn policy(&self) -> DepthPolicy {
        DepthPolicy::resolve(*self)
    }
}

impl fmt::Display for DepthLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DepthLevel {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "quick" => Ok(DepthLevel::Quick),
            "standard" => Ok(DepthLevel::Standard),
            "deep" => Ok(DepthLevel::Deep),
            "exhaustive" => Ok(DepthLevel::Exhaustive),
            other => Err(DomainError::invalid(format!("unknown depth level '{}'", other))),
        }
    }
}

/// Probe budget and stopping thresholds for a session
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DepthPolicy {
    /// Fewest probes a single wave may issue
    pub min_probes_per_wave: usize,
    /// Most probes a single wave may issue
    pub max_probes_per_wave: usize,
    /// Hard limit on waves per session
    pub max_waves: u32,
    /// Score at or above which the session may stop successfully
    pub target_confidence: f64,
}

impl DepthPolicy {
    /// Pure lookup of the built-in preset for a level
    ///
    /// | level | probes/wave | max waves | target |
    /// |-------|-------------|-----------|--------|
    /// | quick | 1-2 | 1 | 0.70 |
    /// | standard | 3-5 | 2 | 0.80 |
    /// | deep | 5-10 | 3 | 0.85 |
    /// | exhaustive | 10-20 | 5 | 0.90 |
    pub fn resolve(level: DepthLevel) -> Self {
        match level {
            DepthLevel::Quick => Self {
                min_probes_per_wave: 1,
                max_probes_per_wave: 2,
                max_waves: 1,
                target_confidence: 0.70,
            },
            DepthLevel::Standard => Self {
                min_probes_per_wave: 3,
                max_probes_per_wave: 5,
                max_waves: 2,
                target_confidence: 0.80,
            },
            DepthLevel::Deep => Self {
                min_probes_per_wave: 5,
                max_probes_per_wave: 10,
                max_waves: 3,
                target_confidence: 0.85,
            },
            DepthLevel::Exhaustive => Self {
                min_probes_per_wave: 10,
                max_probes_per_wave: 20,
                max_waves: 5,
                target_confidence: 0.90,
            },
        }
    }

    /// Resolve a level by name
    ///
    /// # Errors
    /// Fails with [`DomainError::InvalidConfiguration`] for an unknown name.
    pub fn resolve_named(name: &str) -> Result<Self, DomainError> {
        Ok(Self::resolve(name.parse()?))
    }

    /// Build a custom policy, validating its bounds
    pub fn custom(
        min_probes_per_wave: usize,
        max_probes_per_wave: usize,
        max_waves: u32,
        target_confidence: f64,
    ) -> Result<Self, DomainError> {
        let policy = Self {
            min_probes_per_wave,
            max_probes_per_wave,
            max_waves,
            target_confidence,
        };
        policy.validate()?;
        Ok(policy)
    }

    /// Check the policy's internal consistency
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.min_probes_per_wave == 0 {
            return Err(DomainError::invalid("min_probes_per_wave must be at least 1"));
        }
        if self.min_probes_per_wave > self.max_probes_per_wave {
            return Err(DomainError::invalid(format!(
                "min_probes_per_wave {} exceeds max_probes_per_wave {}",
                self.min_probes_per_wave, self.max_probes_per_wave
            )));
        }
        if self.max_waves == 0 {
            return Err(DomainError::invalid("max_waves must be at least 1"));
        }
        if !(self.target_confidence > 0.0 && self.target_confidence <= 1.0) {
            return Err(DomainError::invalid(format!(
                "target_confidence {} is outside (0, 1]",
                self.target_confidence
            )));
        }
        Ok(())
    }

    /// Allowed probe count for one wave
    pub fn probe_bounds(&self) -> RangeInclusive<usize> {
        self.min_probes_per_wave..=self.max_probes_per_wave
    }

    /// Whether a wave of `count` probes respects the budget
    pub fn allows_wave_size(&self, count: usize) -> bool {
        self.probe_bounds().contains(&count)
    }
}
