//! Gap module - deficiencies in the current evidence

use crate::EvidenceId;
use serde::{Deserialize, Serialize};

/// Why a topic counts as a gap
///
/// Variants are declared in planning priority order: contradicted gaps are
/// closed first, then unanswered ones, then low-confidence ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GapReason {
    /// Two or more active items disagree
    Contradicted,
    /// No evidence at all
    Unanswered,
    /// Evidence exists but is weakly sourced and uncorroborated
    LowConfidence,
}

impl GapReason {
    /// Get the reason name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            GapReason::Contradicted => "contradicted",
            GapReason::Unanswered => "unanswered",
            GapReason::LowConfidence => "low-confidence",
        }
    }
}

/// An identified deficiency in current evidence
///
/// Gaps are derived values, recomputed in full at every checkpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gap {
    /// Agenda topic the gap belongs to
    pub topic: String,

    /// Human-readable description
    pub description: String,

    /// Gap classification
    pub reason: GapReason,

    /// For contradictions settled by a strictly higher tier, the winning item
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_by: Option<EvidenceId>,
}

impl Gap {
    /// Create an open gap
    pub fn new(topic: impl Into<String>, reason: GapReason, description: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            description: description.into(),
            reason,
            resolved_by: None,
        }
    }

    /// Mark the gap as resolved by a winning evidence item
    pub fn resolved_by(mut self, winner: EvidenceId) -> Self {
        self.resolved_by = Some(winner);
        self
    }

    /// Whether the gap still needs work
    pub fn is_open(&self) -> bool {
        self.resolved_by.is_none()
    }

    /// Whether this is an open contradiction
    pub fn is_unresolved_contradiction(&self) -> bool {
        self.reason == GapReason::Contradicted && self.is_open()
    }
}
