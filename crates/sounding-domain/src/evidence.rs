//! Evidence module - citable claims derived from succeeded probes

use crate::{CredibilityTier, ProbeId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for an evidence item based on UUIDv7
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EvidenceId(uuid::Uuid);

impl EvidenceId {
    /// Generate a new UUIDv7-based EvidenceId
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7())
    }

    /// Create an EvidenceId from a raw u128 value
    pub fn from_value(value: u128) -> Self {
        Self(uuid::Uuid::from_u128(value))
    }

    /// Parse an EvidenceId from its string form
    pub fn from_string(s: &str) -> Result<Self, String> {
        uuid::Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| format!("Invalid evidence id: {}", e))
    }
}

impl Default for EvidenceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EvidenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A piece of evidence - a claim with its source and credibility
///
/// Evidence items are immutable once created. A better-sourced duplicate
/// creates a new item that supersedes the old one; the superseded item is
/// kept for audit. Corroborations are recorded alongside, not inside.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceItem {
    /// Unique identifier
    pub id: EvidenceId,

    /// Agenda topic the claim answers
    pub topic: String,

    /// Claim or summary text
    pub claim: String,

    /// Probes backing this item at creation time (never empty)
    pub supporting_probes: Vec<ProbeId>,

    /// Credibility of the source
    pub tier: CredibilityTier,

    /// Citation or source reference
    pub citation: String,

    /// Wave in which the item was created
    pub wave: u32,
}

impl EvidenceItem {
    /// Create an item backed by a single probe
    pub fn new(
        topic: impl Into<String>,
        claim: impl Into<String>,
        probe: ProbeId,
        tier: CredibilityTier,
        citation: impl Into<String>,
        wave: u32,
    ) -> Self {
        Self {
            id: EvidenceId::new(),
            topic: topic.into(),
            claim: claim.into(),
            supporting_probes: vec![probe],
            tier,
            citation: citation.into(),
            wave,
        }
    }

    /// Create an item that inherits the supporting probes of the item it supersedes
    pub fn superseding(previous: &EvidenceItem, candidate: EvidenceItem) -> Self {
        let mut supporting_probes = previous.supporting_probes.clone();
        for probe in candidate.supporting_probes {
            if !supporting_probes.contains(&probe) {
                supporting_probes.push(probe);
            }
        }
        Self {
            supporting_probes,
            ..candidate
        }
    }
}
