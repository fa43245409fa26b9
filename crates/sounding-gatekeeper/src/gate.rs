//! Readiness evaluation logic

use crate::{GatekeeperError, ReadinessConfig};
use serde::{Deserialize, Serialize};
use sounding_domain::{score, ConfidenceScore, CriteriaSet, Decision, Outcome};
use std::collections::BTreeMap;
use std::fmt;

/// One of the five fixed readiness checks
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ReadinessCheck {
    /// Has the problem been solved before
    #[serde(rename = "prior_art_check")]
    PriorArt,
    /// Does the change fit the existing architecture
    #[serde(rename = "architectural_fit")]
    ArchitecturalFit,
    /// Has the relevant documentation been confirmed
    #[serde(rename = "documentation_verification")]
    Documentation,
    /// Has a working reference implementation been examined
    #[serde(rename = "reference_implementation_verification")]
    ReferenceImplementation,
    /// Is the root cause understood
    #[serde(rename = "root_cause_verification")]
    RootCause,
}

impl ReadinessCheck {
    /// All checks, in evaluation order
    pub const ALL: [ReadinessCheck; 5] = [
        ReadinessCheck::PriorArt,
        ReadinessCheck::ArchitecturalFit,
        ReadinessCheck::Documentation,
        ReadinessCheck::ReferenceImplementation,
        ReadinessCheck::RootCause,
    ];

    /// Criterion name of the check
    pub fn as_str(&self) -> &'static str {
        match self {
            ReadinessCheck::PriorArt => "prior_art_check",
            ReadinessCheck::ArchitecturalFit => "architectural_fit",
            ReadinessCheck::Documentation => "documentation_verification",
            ReadinessCheck::ReferenceImplementation => "reference_implementation_verification",
            ReadinessCheck::RootCause => "root_cause_verification",
        }
    }

    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            ReadinessCheck::PriorArt => "Prior art",
            ReadinessCheck::ArchitecturalFit => "Architectural fit",
            ReadinessCheck::Documentation => "Documentation",
            ReadinessCheck::ReferenceImplementation => "Reference implementation",
            ReadinessCheck::RootCause => "Root cause",
        }
    }
}

impl fmt::Display for ReadinessCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Caller-supplied outcomes for each check
///
/// Loads from TOML:
///
/// ```toml
/// prior_art_check = "pass"
/// architectural_fit = "partial"
/// documentation_verification = "fail"
/// reference_implementation_verification = "fail"
/// root_cause_verification = "pass"
///
/// [notes]
/// documentation_verification = "only read the changelog"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadinessChecklist {
    /// Prior-art outcome
    pub prior_art_check: Outcome,
    /// Architectural-fit outcome
    pub architectural_fit: Outcome,
    /// Documentation outcome
    pub documentation_verification: Outcome,
    /// Reference-implementation outcome
    pub reference_implementation_verification: Outcome,
    /// Root-cause outcome
    pub root_cause_verification: Outcome,
    /// Free-form notes keyed by check name
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub notes: BTreeMap<String, String>,
}

impl ReadinessChecklist {
    /// Checklist with the same outcome everywhere
    pub fn all(outcome: Outcome) -> Self {
        Self {
            prior_art_check: outcome,
            architectural_fit: outcome,
            documentation_verification: outcome,
            reference_implementation_verification: outcome,
            root_cause_verification: outcome,
            notes: BTreeMap::new(),
        }
    }

    /// Set one check's outcome
    pub fn with(mut self, check: ReadinessCheck, outcome: Outcome) -> Self {
        *self.slot(check) = outcome;
        self
    }

    /// Attach a note to a check
    pub fn with_note(mut self, check: ReadinessCheck, note: impl Into<String>) -> Self {
        self.notes.insert(check.as_str().to_string(), note.into());
        self
    }

    /// Outcome of one check
    pub fn outcome(&self, check: ReadinessCheck) -> Outcome {
        match check {
            ReadinessCheck::PriorArt => self.prior_art_check,
            ReadinessCheck::ArchitecturalFit => self.architectural_fit,
            ReadinessCheck::Documentation => self.documentation_verification,
            ReadinessCheck::ReferenceImplementation => self.reference_implementation_verification,
            ReadinessCheck::RootCause => self.root_cause_verification,
        }
    }

    /// Load a checklist from a TOML string
    pub fn from_toml(content: &str) -> Result<Self, GatekeeperError> {
        let checklist: Self = toml::from_str(content)?;
        if let Some(unknown) = checklist
            .notes
            .keys()
            .find(|k| !ReadinessCheck::ALL.iter().any(|c| c.as_str() == k.as_str()))
        {
            return Err(GatekeeperError::Parse(format!(
                "note for unknown check '{}'",
                unknown
            )));
        }
        Ok(checklist)
    }

    fn slot(&mut self, check: ReadinessCheck) -> &mut Outcome {
        match check {
            ReadinessCheck::PriorArt => &mut self.prior_art_check,
            ReadinessCheck::ArchitecturalFit => &mut self.architectural_fit,
            ReadinessCheck::Documentation => &mut self.documentation_verification,
            ReadinessCheck::ReferenceImplementation => {
                &mut self.reference_implementation_verification
            }
            ReadinessCheck::RootCause => &mut self.root_cause_verification,
        }
    }
}

/// A check that did not fully pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Concern {
    /// Which check
    pub check: ReadinessCheck,
    /// Its outcome (partial or fail)
    pub outcome: Outcome,
    /// Score lost against a full pass
    pub weight_lost: f64,
    /// Caller's note, if any
    pub note: Option<String>,
}

/// Result of a readiness evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadinessAssessment {
    /// Weighted score with per-check breakdown
    pub score: ConfidenceScore,
    /// Decision derived from the score
    pub decision: Decision,
    /// Every non-pass check, largest loss first
    pub concerns: Vec<Concern>,
}

impl ReadinessAssessment {
    /// Whether the caller may act without further questions
    pub fn is_ready(&self) -> bool {
        self.decision == Decision::Proceed
    }
}

/// The readiness gate evaluates a checklist in a single pass
pub struct ReadinessGate {
    config: ReadinessConfig,
    criteria: CriteriaSet,
}

impl ReadinessGate {
    /// Create a gate, validating the configuration
    pub fn new(config: ReadinessConfig) -> Result<Self, GatekeeperError> {
        let criteria = config.criteria()?;
        Ok(Self { config, criteria })
    }

    /// Create a gate with the default weights
    pub fn default_config() -> Result<Self, GatekeeperError> {
        Self::new(ReadinessConfig::default())
    }

    /// Gate configuration
    pub fn config(&self) -> &ReadinessConfig {
        &self.config
    }

    /// Score a checklist
    ///
    /// Every call recomputes the score from the checklist; nothing is cached
    /// between evaluations.
    pub fn evaluate(
        &self,
        checklist: &ReadinessChecklist,
    ) -> Result<ReadinessAssessment, GatekeeperError> {
        let mut criteria = self.criteria.clone();
        for check in ReadinessCheck::ALL {
            criteria.set_outcome(check.as_str(), checklist.outcome(check))?;
        }

        let score = score(&criteria);
        let decision = score.decision();

        let mut concerns: Vec<Concern> = ReadinessCheck::ALL
            .iter()
            .zip(score.breakdown.iter())
            .filter(|(_, entry)| entry.outcome != Outcome::Pass)
            .map(|(check, entry)| Concern {
                check: *check,
                outcome: entry.outcome,
                weight_lost: entry.weight - entry.contribution,
                note: checklist.notes.get(check.as_str()).cloned(),
            })
            .collect();
        concerns.sort_by(|a, b| b.weight_lost.total_cmp(&a.weight_lost));

        tracing::info!(
            score = score.value,
            decision = %decision,
            concerns = concerns.len(),
            "readiness evaluated"
        );

        Ok(ReadinessAssessment {
            score,
            decision,
            concerns,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate() -> ReadinessGate {
        ReadinessGate::default_config().unwrap()
    }

    #[test]
    fn test_all_pass_proceeds() {
        let assessment = gate().evaluate(&ReadinessChecklist::all(Outcome::Pass)).unwrap();
        assert!((assessment.score.value - 1.0).abs() < 1e-9);
        assert!(assessment.is_ready());
        assert!(assessment.concerns.is_empty());
    }

    #[test]
    fn test_all_fail_stops() {
        let assessment = gate().evaluate(&ReadinessChecklist::all(Outcome::Fail)).unwrap();
        assert_eq!(assessment.score.value, 0.0);
        assert_eq!(assessment.decision, Decision::Stop);
        assert_eq!(assessment.concerns.len(), 5);
    }

    #[test]
    fn test_mixed_checklist_stops_at_0_525() {
        let checklist = ReadinessChecklist::all(Outcome::Pass)
            .with(ReadinessCheck::ArchitecturalFit, Outcome::Partial)
            .with(ReadinessCheck::Documentation, Outcome::Fail)
            .with(ReadinessCheck::ReferenceImplementation, Outcome::Fail);

        let assessment = gate().evaluate(&checklist).unwrap();
        assert!((assessment.score.value - 0.525).abs() < 1e-9);
        assert_eq!(assessment.decision, Decision::Stop);

        let checks: Vec<ReadinessCheck> = assessment.concerns.iter().map(|c| c.check).collect();
        assert_eq!(
            checks,
            vec![
                ReadinessCheck::Documentation,
                ReadinessCheck::ReferenceImplementation,
                ReadinessCheck::ArchitecturalFit,
            ]
        );
    }

    #[test]
    fn test_single_partial_root_cause_still_proceeds() {
        // 0.25 + 0.25 + 0.20 + 0.15 + 0.075
        let checklist =
            ReadinessChecklist::all(Outcome::Pass).with(ReadinessCheck::RootCause, Outcome::Partial);
        let assessment = gate().evaluate(&checklist).unwrap();
        assert!((assessment.score.value - 0.925).abs() < 1e-9);
        assert_eq!(assessment.decision, Decision::Proceed);
    }

    #[test]
    fn test_strict_credit_lowers_score() {
        let checklist = ReadinessChecklist::all(Outcome::Partial);
        let default = gate().evaluate(&checklist).unwrap();
        let strict = ReadinessGate::new(ReadinessConfig::strict())
            .unwrap()
            .evaluate(&checklist)
            .unwrap();
        assert!((default.score.value - 0.5).abs() < 1e-9);
        assert!((strict.score.value - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_notes_flow_into_concerns() {
        let checklist = ReadinessChecklist::all(Outcome::Pass)
            .with(ReadinessCheck::Documentation, Outcome::Fail)
            .with_note(ReadinessCheck::Documentation, "only skimmed the README");
        let assessment = gate().evaluate(&checklist).unwrap();
        assert_eq!(
            assessment.concerns[0].note.as_deref(),
            Some("only skimmed the README")
        );
    }

    #[test]
    fn test_checklist_from_toml() {
        let checklist = ReadinessChecklist::from_toml(
            r#"
            prior_art_check = "pass"
            architectural_fit = "partial"
            documentation_verification = "fail"
            reference_implementation_verification = "fail"
            root_cause_verification = "pass"

            [notes]
            architectural_fit = "touches the storage layer"
            "#,
        )
        .unwrap();
        assert_eq!(checklist.outcome(ReadinessCheck::ArchitecturalFit), Outcome::Partial);
        assert_eq!(checklist.notes.len(), 1);
    }

    #[test]
    fn test_checklist_missing_check_rejected() {
        let result = ReadinessChecklist::from_toml(r#"prior_art_check = "pass""#);
        assert!(matches!(result, Err(GatekeeperError::Parse(_))));
    }

    #[test]
    fn test_checklist_unknown_note_rejected() {
        let mut text = String::new();
        for check in ReadinessCheck::ALL {
            text.push_str(&format!("{} = \"pass\"\n", check.as_str()));
        }
        text.push_str("[notes]\nvibes = \"good\"\n");
        assert!(matches!(
            ReadinessChecklist::from_toml(&text),
            Err(GatekeeperError::Parse(_))
        ));
    }
}
