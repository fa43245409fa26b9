//! Confidence scoring module
//!
//! Implements the deterministic weighted-sum formula shared by research
//! sessions and the standalone readiness gate:
//!
//! ```text
//! value = Σ weightᵢ × credit(outcomeᵢ)
//! ```
//!
//! and the fixed three-tier decision table:
//!
//! | value | decision |
//! |-------|----------|
//! | ≥ 0.90 | proceed |
//! | 0.70 – 0.90 | proceed with clarification |
//! | < 0.70 | stop |

use crate::{CriteriaSet, Outcome};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lower bound of the proceed tier
pub const PROCEED_THRESHOLD: f64 = 0.90;

/// Lower bound of the proceed-with-clarification tier
pub const CLARIFY_THRESHOLD: f64 = 0.70;

/// Float slack on tier boundaries so that sums like 0.25 + 0.25 + 0.2 + 0.15 + 0.05
/// land on the tier they denote
const BOUNDARY_SLACK: f64 = 1e-9;

/// Three-way go/no-go decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Decision {
    /// Confident enough to act
    Proceed,
    /// Act only after the caller resolves open questions
    ProceedWithClarification,
    /// Do not act
    Stop,
}

impl Decision {
    /// Map a score value onto the decision table
    pub fn from_value(value: f64) -> Self {
        if value >= PROCEED_THRESHOLD - BOUNDARY_SLACK {
            Decision::Proceed
        } else if value >= CLARIFY_THRESHOLD - BOUNDARY_SLACK {
            Decision::ProceedWithClarification
        } else {
            Decision::Stop
        }
    }

    /// Get the decision name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Proceed => "proceed",
            Decision::ProceedWithClarification => "proceed-with-clarification",
            Decision::Stop => "stop",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One criterion's share of a score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriterionScore {
    /// Criterion name
    pub name: String,
    /// Criterion weight
    pub weight: f64,
    /// Outcome at scoring time
    pub outcome: Outcome,
    /// Fraction of the weight awarded for the outcome
    pub awarded_fraction: f64,
    /// weight × awarded_fraction
    pub contribution: f64,
}

/// A computed confidence score with its per-criterion breakdown
///
/// Always produced by [`score`]; never set directly and never cached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceScore {
    /// Weighted sum in [0, 1]
    pub value: f64,
    /// Per-criterion contributions, in criteria order
    pub breakdown: Vec<CriterionScore>,
}

impl ConfidenceScore {
    /// Decision for this score
    pub fn decision(&self) -> Decision {
        Decision::from_value(self.value)
    }

    /// Whether the score reaches a target
    pub fn meets(&self, target: f64) -> bool {
        self.value >= target - BOUNDARY_SLACK
    }

    /// Criteria that did not earn their full weight
    pub fn shortfalls(&self) -> impl Iterator<Item = &CriterionScore> {
        self.breakdown
            .iter()
            .filter(|c| c.awarded_fraction < 1.0)
    }
}

/// Score a criteria set
pub fn score(criteria: &CriteriaSet) -> ConfidenceScore {
    let breakdown: Vec<CriterionScore> = criteria
        .iter()
        .map(|criterion| {
            let awarded_fraction = criterion.awarded_fraction();
            CriterionScore {
                name: criterion.name().to_string(),
                weight: criterion.weight(),
                outcome: criterion.outcome(),
                awarded_fraction,
                contribution: criterion.weight() * awarded_fraction,
            }
        })
        .collect();

    let value = breakdown
        .iter()
        .map(|c| c.contribution)
        .sum::<f64>()
        .clamp(0.0, 1.0);

    ConfidenceScore { value, breakdown }
}
