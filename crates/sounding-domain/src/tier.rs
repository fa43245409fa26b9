//! Credibility tier module - ordinal trust rank for evidence sources

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Credibility tier of a source
///
/// Tiers are ordered so that a more trustworthy source compares greater:
/// `Official > High > Medium > Low`. The ordering drives both evidence
/// ranking and conflict resolution (the higher tier wins).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredibilityTier {
    /// Vendor documentation, specifications, primary sources
    Official,

    /// Well-maintained references and reputable secondary sources
    High,

    /// Community answers, blog posts
    Medium,

    /// Unverified or anonymous sources
    Low,
}

impl CredibilityTier {
    /// All tiers, most credible first
    pub const ALL: [CredibilityTier; 4] = [
        CredibilityTier::Official,
        CredibilityTier::High,
        CredibilityTier::Medium,
        CredibilityTier::Low,
    ];

    /// Get the tier name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            CredibilityTier::Official => "official",
            CredibilityTier::High => "high",
            CredibilityTier::Medium => "medium",
            CredibilityTier::Low => "low",
        }
    }

    /// Parse a tier from a string (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "official" => Some(CredibilityTier::Official),
            "high" => Some(CredibilityTier::High),
            "medium" => Some(CredibilityTier::Medium),
            "low" => Some(CredibilityTier::Low),
            _ => None,
        }
    }

    /// Numeric rank, higher is more credible
    pub fn rank(&self) -> u8 {
        match self {
            CredibilityTier::Official => 3,
            CredibilityTier::High => 2,
            CredibilityTier::Medium => 1,
            CredibilityTier::Low => 0,
        }
    }

    /// Whether this tier strictly outranks another
    pub fn outranks(&self, other: CredibilityTier) -> bool {
        self.rank() > other.rank()
    }

    /// Get the next tier up (for promotion)
    pub fn next(&self) -> Option<Self> {
        match self {
            CredibilityTier::Low => Some(CredibilityTier::Medium),
            CredibilityTier::Medium => Some(CredibilityTier::High),
            CredibilityTier::High => Some(CredibilityTier::Official),
            CredibilityTier::Official => None, // Already at top
        }
    }

    /// Get the next tier down (for demotion)
    pub fn previous(&self) -> Option<Self> {
        match self {
            CredibilityTier::Official => Some(CredibilityTier::High),
            CredibilityTier::High => Some(CredibilityTier::Medium),
            CredibilityTier::Medium => Some(CredibilityTier::Low),
            CredibilityTier::Low => None, // Already at bottom
        }
    }
}

impl PartialOrd for CredibilityTier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CredibilityTier {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl fmt::Display for CredibilityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CredibilityTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid credibility tier: {}", s))
    }
}
