//! Criteria module - weighted scoring criteria with partial-credit tables

use crate::DomainError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Tolerance for the weights-sum-to-one check
pub const WEIGHT_EPSILON: f64 = 1e-6;

/// Discrete outcome of a single criterion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// Criterion fully met
    Pass,
    /// Criterion partly met
    Partial,
    /// Criterion not met
    Fail,
}

impl Outcome {
    /// Get the outcome name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Pass => "pass",
            Outcome::Partial => "partial",
            Outcome::Fail => "fail",
        }
    }
}

impl std::str::FromStr for Outcome {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pass" => Ok(Outcome::Pass),
            "partial" => Ok(Outcome::Partial),
            "fail" => Ok(Outcome::Fail),
            other => Err(DomainError::invalid(format!("unknown outcome '{}'", other))),
        }
    }
}

/// Fraction of a criterion's weight awarded for each outcome
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PartialCredit {
    /// Fraction awarded on pass
    pub pass: f64,
    /// Fraction awarded on partial
    pub partial: f64,
    /// Fraction awarded on fail
    pub fail: f64,
}

impl Default for PartialCredit {
    /// Full credit for pass, half for partial, nothing for fail
    fn default() -> Self {
        Self {
            pass: 1.0,
            partial: 0.5,
            fail: 0.0,
        }
    }
}

impl PartialCredit {
    /// Look up the awarded fraction for an outcome
    pub fn credit(&self, outcome: Outcome) -> f64 {
        match outcome {
            Outcome::Pass => self.pass,
            Outcome::Partial => self.partial,
            Outcome::Fail => self.fail,
        }
    }

    fn validate(&self, name: &str) -> Result<(), DomainError> {
        for (label, value) in [("pass", self.pass), ("partial", self.partial), ("fail", self.fail)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(DomainError::invalid(format!(
                    "criterion '{}': {} credit {} is outside [0, 1]",
                    name, label, value
                )));
            }
        }
        Ok(())
    }
}

/// Evidence-derived signal that drives a criterion's outcome during research
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceSignal {
    /// Share of agenda topics with at least one active evidence item
    Coverage,
    /// Best tier available on the weakest answered topic
    SourceAuthority,
    /// Share of answered topics backed by official sources or corroboration
    Corroboration,
    /// Absence of unresolved contradictions
    Consistency,
}

/// A weighted scoring criterion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Criterion {
    name: String,
    weight: f64,
    #[serde(default)]
    credit: PartialCredit,
    #[serde(default = "default_outcome")]
    outcome: Outcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    signal: Option<EvidenceSignal>,
}

fn default_outcome() -> Outcome {
    Outcome::Fail
}

impl Criterion {
    /// Create a criterion with the default credit table and a failing outcome
    pub fn new(name: impl Into<String>, weight: f64) -> Self {
        Self {
            name: name.into(),
            weight,
            credit: PartialCredit::default(),
            outcome: Outcome::Fail,
            signal: None,
        }
    }

    /// Replace the partial-credit table
    pub fn with_credit(mut self, credit: PartialCredit) -> Self {
        self.credit = credit;
        self
    }

    /// Set the initial outcome
    pub fn with_outcome(mut self, outcome: Outcome) -> Self {
        self.outcome = outcome;
        self
    }

    /// Bind the criterion to an evidence signal re-assessed at every checkpoint
    pub fn assessed_by(mut self, signal: EvidenceSignal) -> Self {
        self.signal = Some(signal);
        self
    }

    /// Criterion name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Weight in (0, 1]
    pub fn weight(&self) -> f64 {
        self.weight
    }

    /// Partial-credit table
    pub fn credit(&self) -> &PartialCredit {
        &self.credit
    }

    /// Current outcome
    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    /// Bound evidence signal, if any
    pub fn signal(&self) -> Option<EvidenceSignal> {
        self.signal
    }

    /// Awarded fraction of the weight for the current outcome
    pub fn awarded_fraction(&self) -> f64 {
        self.credit.credit(self.outcome)
    }
}

/// The fixed set of criteria for one session or gate
///
/// Membership and weights are frozen at construction; only outcomes change.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CriteriaSet {
    criteria: Vec<Criterion>,
}

impl CriteriaSet {
    /// Validate and freeze a set of criteria
    ///
    /// # Errors
    /// Fails with [`DomainError::InvalidConfiguration`] when the set is empty,
    /// a weight is outside (0, 1], names repeat, a credit table is out of
    /// range, or the weights do not sum to 1.0 within [`WEIGHT_EPSILON`].
    pub fn new(criteria: Vec<Criterion>) -> Result<Self, DomainError> {
        if criteria.is_empty() {
            return Err(DomainError::invalid("at least one criterion is required"));
        }

        let mut names = HashSet::new();
        for criterion in &criteria {
            if !(criterion.weight > 0.0 && criterion.weight <= 1.0) {
                return Err(DomainError::invalid(format!(
                    "criterion '{}': weight {} is outside (0, 1]",
                    criterion.name, criterion.weight
                )));
            }
            if !names.insert(criterion.name.as_str()) {
                return Err(DomainError::invalid(format!(
                    "duplicate criterion '{}'",
                    criterion.name
                )));
            }
            criterion.credit.validate(&criterion.name)?;
        }

        let total: f64 = criteria.iter().map(|c| c.weight).sum();
        if (total - 1.0).abs() > WEIGHT_EPSILON {
            return Err(DomainError::invalid(format!(
                "criterion weights sum to {}, expected 1.0",
                total
            )));
        }

        Ok(Self { criteria })
    }

    /// Default research criteria, all bound to evidence signals
    ///
    /// coverage 0.35, source authority 0.25, corroboration 0.20, consistency 0.20
    pub fn research_default() -> Self {
        Self {
            criteria: vec![
                Criterion::new("coverage", 0.35).assessed_by(EvidenceSignal::Coverage),
                Criterion::new("source_authority", 0.25)
                    .assessed_by(EvidenceSignal::SourceAuthority),
                Criterion::new("corroboration", 0.20).assessed_by(EvidenceSignal::Corroboration),
                Criterion::new("consistency", 0.20).assessed_by(EvidenceSignal::Consistency),
            ],
        }
    }

    /// Update a criterion's outcome by name
    pub fn set_outcome(&mut self, name: &str, outcome: Outcome) -> Result<(), DomainError> {
        let criterion = self
            .criteria
            .iter_mut()
            .find(|c| c.name == name)
            .ok_or_else(|| DomainError::invalid(format!("unknown criterion '{}'", name)))?;
        criterion.outcome = outcome;
        Ok(())
    }

    /// Update every criterion bound to `signal`
    pub fn apply_signal(&mut self, signal: EvidenceSignal, outcome: Outcome) {
        for criterion in self.criteria.iter_mut().filter(|c| c.signal == Some(signal)) {
            criterion.outcome = outcome;
        }
    }

    /// Look up a criterion by name
    pub fn get(&self, name: &str) -> Option<&Criterion> {
        self.criteria.iter().find(|c| c.name == name)
    }

    /// Iterate over the criteria in declaration order
    pub fn iter(&self) -> impl Iterator<Item = &Criterion> {
        self.criteria.iter()
    }

    /// Signals referenced by at least one criterion
    pub fn signals(&self) -> Vec<EvidenceSignal> {
        let mut signals: Vec<EvidenceSignal> = Vec::new();
        for signal in self.criteria.iter().filter_map(|c| c.signal) {
            if !signals.contains(&signal) {
                signals.push(signal);
            }
        }
        signals
    }

    /// Number of criteria
    pub fn len(&self) -> usize {
        self.criteria.len()
    }

    /// Always false for a constructed set
    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }
}

impl<'de> Deserialize<'de> for CriteriaSet {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let criteria = Vec::<Criterion>::deserialize(deserializer)?;
        CriteriaSet::new(criteria).map_err(serde::de::Error::custom)
    }
}
