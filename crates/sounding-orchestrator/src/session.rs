//! Research session aggregate and its lifecycle
//!
//! ```text
//! Planning ──► WaveInFlight ──► Checkpointing ──► Succeeded
//!    │              ▲                 │       ├─► Exhausted
//!    │              └─────────────────┘       └─► Aborted
//!    └──► Exhausted | Aborted
//! ```
//!
//! `Checkpointing -> WaveInFlight` is the only re-entry. Terminal states
//! accept no further transitions.

use crate::aggregator::{EvidenceAggregator, EvidenceLedger, MergeSummary};
use crate::checkpoint::{Checkpoint, CheckpointEvaluator};
use crate::planner::Topic;
use crate::scheduler::WaveResult;
use crate::OrchestratorError;
use serde::{Deserialize, Serialize};
use sounding_domain::{
    score, ConfidenceScore, CriteriaSet, DepthLevel, DepthPolicy, Gap, Probe,
};
use std::fmt;
use tokio_util::sync::CancellationToken;

/// Unique identifier for a session (UUIDv7, time-ordered)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(uuid::Uuid);

impl SessionId {
    /// Generate a new session id
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionState {
    /// Accepting agenda topics; first wave not yet dispatched
    Planning,
    /// A wave is running
    WaveInFlight,
    /// Merging evidence and deciding what comes next
    Checkpointing,
    /// Target confidence reached
    Succeeded,
    /// Stopped short of the target
    Exhausted,
    /// Stopped by cancellation or unrecoverable provider failure
    Aborted,
}

impl SessionState {
    /// Get the state name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Planning => "planning",
            SessionState::WaveInFlight => "wave-in-flight",
            SessionState::Checkpointing => "checkpointing",
            SessionState::Succeeded => "succeeded",
            SessionState::Exhausted => "exhausted",
            SessionState::Aborted => "aborted",
        }
    }

    /// Whether no further transition is possible
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionState::Succeeded | SessionState::Exhausted | SessionState::Aborted
        )
    }

    /// Whether `self -> next` is a legal transition
    pub fn can_transition_to(&self, next: SessionState) -> bool {
        use SessionState::*;
        matches!(
            (self, next),
            (Planning, WaveInFlight)
                | (Planning, Exhausted)
                | (Planning, Aborted)
                | (WaveInFlight, Checkpointing)
                | (Checkpointing, WaveInFlight)
                | (Checkpointing, Succeeded)
                | (Checkpointing, Exhausted)
                | (Checkpointing, Aborted)
        )
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One completed wave as kept in session history
#[derive(Debug, Clone, PartialEq)]
pub struct WaveRecord {
    /// Wave ordinal
    pub wave: u32,
    /// Probes in dispatch order, all terminal
    pub probes: Vec<Probe>,
    /// What merging the wave did
    pub merge: MergeSummary,
    /// Whether no probe succeeded
    pub aborted: bool,
    /// Wall time of the wave (milliseconds)
    pub elapsed_ms: u64,
}

/// Aggregate root of one research run
///
/// Binds a depth policy, a fixed criteria set, the agenda of topics, the
/// waves dispatched so far, the evidence ledger and the current gaps to a
/// lifecycle state. Sessions are plain values passed explicitly to the
/// runner.
///
/// # Examples
///
/// ```
/// use sounding_orchestrator::{Session, SessionState};
/// use sounding_domain::{CriteriaSet, DepthLevel};
///
/// let mut session = Session::create(DepthLevel::Standard, CriteriaSet::research_default());
/// session.investigate("version", "latest stable tokio release").unwrap();
///
/// assert_eq!(session.state(), SessionState::Planning);
/// assert_eq!(session.policy().max_waves, 2);
/// ```
#[derive(Debug)]
pub struct Session {
    id: SessionId,
    policy: DepthPolicy,
    criteria: CriteriaSet,
    agenda: Vec<Topic>,
    waves: Vec<WaveRecord>,
    ledger: EvidenceLedger,
    gaps: Vec<Gap>,
    state: SessionState,
    cancel: CancellationToken,
}

impl Session {
    /// Create a session for a preset depth level
    pub fn create(level: DepthLevel, criteria: CriteriaSet) -> Self {
        Self::build(level.policy(), criteria)
    }

    /// Create a session with a custom depth policy
    ///
    /// # Errors
    /// Fails with [`OrchestratorError::InvalidConfiguration`] when the policy is invalid.
    pub fn with_policy(policy: DepthPolicy, criteria: CriteriaSet) -> Result<Self, OrchestratorError> {
        policy.validate()?;
        Ok(Self::build(policy, criteria))
    }

    fn build(policy: DepthPolicy, criteria: CriteriaSet) -> Self {
        let session = Self {
            id: SessionId::new(),
            policy,
            criteria,
            agenda: Vec::new(),
            waves: Vec::new(),
            ledger: EvidenceLedger::new(),
            gaps: Vec::new(),
            state: SessionState::Planning,
            cancel: CancellationToken::new(),
        };
        tracing::debug!(session = %session.id, ?policy, "session created");
        session
    }

    /// Add a topic to the agenda
    ///
    /// # Errors
    /// Fails when the session has left `Planning`, the key is blank, or the
    /// key is already on the agenda.
    pub fn investigate(
        &mut self,
        key: impl Into<String>,
        query: impl Into<String>,
    ) -> Result<(), OrchestratorError> {
        if self.state != SessionState::Planning {
            return Err(OrchestratorError::InvalidTransition(format!(
                "cannot add topics to a session in state {}",
                self.state
            )));
        }
        let topic = Topic::new(key, query);
        if topic.key.trim().is_empty() || topic.query.trim().is_empty() {
            return Err(OrchestratorError::InvalidConfiguration(
                "topic key and query must not be empty".to_string(),
            ));
        }
        if self.agenda.iter().any(|t| t.key == topic.key) {
            return Err(OrchestratorError::InvalidConfiguration(format!(
                "topic '{}' is already on the agenda",
                topic.key
            )));
        }
        self.agenda.push(topic);
        Ok(())
    }

    /// Session id
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Depth policy
    pub fn policy(&self) -> &DepthPolicy {
        &self.policy
    }

    /// Criteria with their current outcomes
    pub fn criteria(&self) -> &CriteriaSet {
        &self.criteria
    }

    /// Agenda topics
    pub fn agenda(&self) -> &[Topic] {
        &self.agenda
    }

    /// Completed waves
    pub fn waves(&self) -> &[WaveRecord] {
        &self.waves
    }

    /// Number of waves dispatched
    pub fn waves_used(&self) -> u32 {
        self.waves.len() as u32
    }

    /// Evidence ledger
    pub fn ledger(&self) -> &EvidenceLedger {
        &self.ledger
    }

    /// Gaps from the last checkpoint
    pub fn gaps(&self) -> &[Gap] {
        &self.gaps
    }

    /// Current lifecycle state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Score the current criteria outcomes
    pub fn score(&self) -> ConfidenceScore {
        score(&self.criteria)
    }

    /// Handle that cancels this session from any task
    pub fn canceller(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Cancel the session
    ///
    /// In-flight probes are marked cancelled; the run ends as aborted.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Whether cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub(crate) fn transition(&mut self, next: SessionState) -> Result<(), OrchestratorError> {
        if !self.state.can_transition_to(next) {
            return Err(OrchestratorError::InvalidTransition(format!(
                "{} -> {}",
                self.state, next
            )));
        }
        tracing::info!(session = %self.id, from = %self.state, to = %next, "session transition");
        self.state = next;
        Ok(())
    }

    /// Compute the gap set for a run that ended before any checkpoint
    ///
    /// Every agenda topic is then unanswered; the report must say so.
    pub(crate) fn settle_unchecked(&mut self, evaluator: &CheckpointEvaluator) {
        if !self.waves.is_empty() {
            return;
        }
        let checkpoint = evaluator.evaluate(&self.agenda, &self.ledger, &mut self.criteria);
        self.gaps = checkpoint.gaps;
    }

    /// Fold a finished wave into the session
    pub(crate) fn absorb(
        &mut self,
        result: WaveResult,
        aggregator: &EvidenceAggregator,
        evaluator: &CheckpointEvaluator,
    ) -> Result<(MergeSummary, Checkpoint), OrchestratorError> {
        if self.state != SessionState::Checkpointing {
            return Err(OrchestratorError::InvalidTransition(format!(
                "cannot absorb a wave in state {}",
                self.state
            )));
        }

        let merge = aggregator.merge(&mut self.ledger, &result);
        let checkpoint = evaluator.evaluate(&self.agenda, &self.ledger, &mut self.criteria);
        self.gaps = checkpoint.gaps.clone();

        let aborted = result.aborted().is_some();
        self.waves.push(WaveRecord {
            wave: result.wave,
            probes: result.probes,
            merge,
            aborted,
            elapsed_ms: result.elapsed.as_millis() as u64,
        });

        Ok((merge, checkpoint))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session::create(DepthLevel::Quick, CriteriaSet::research_default())
    }

    #[test]
    fn test_create_resolves_policy() {
        let session = Session::create(DepthLevel::Deep, CriteriaSet::research_default());
        assert_eq!(session.policy(), &DepthLevel::Deep.policy());
        assert_eq!(session.state(), SessionState::Planning);
        assert_eq!(session.waves_used(), 0);
        assert_eq!(session.score().value, 0.0);
    }

    #[test]
    fn test_invalid_custom_policy_rejected() {
        let policy = DepthPolicy {
            min_probes_per_wave: 4,
            max_probes_per_wave: 2,
            max_waves: 1,
            target_confidence: 0.8,
        };
        let result = Session::with_policy(policy, CriteriaSet::research_default());
        assert!(matches!(result, Err(OrchestratorError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_investigate_rejects_duplicates_and_blanks() {
        let mut session = session();
        session.investigate("version", "tokio version").unwrap();
        assert!(session.investigate("version", "again").is_err());
        assert!(session.investigate(" ", "blank key").is_err());
        assert_eq!(session.agenda().len(), 1);
    }

    #[test]
    fn test_investigate_only_while_planning() {
        let mut session = session();
        session.transition(SessionState::WaveInFlight).unwrap();
        assert!(matches!(
            session.investigate("late", "too late"),
            Err(OrchestratorError::InvalidTransition(_))
        ));
    }

    #[test]
    fn test_transitions_are_monotonic() {
        let mut session = session();
        session.transition(SessionState::WaveInFlight).unwrap();
        session.transition(SessionState::Checkpointing).unwrap();
        session.transition(SessionState::WaveInFlight).unwrap();
        session.transition(SessionState::Checkpointing).unwrap();
        session.transition(SessionState::Succeeded).unwrap();

        assert!(session.transition(SessionState::Planning).is_err());
        assert!(session.transition(SessionState::WaveInFlight).is_err());
    }

    #[test]
    fn test_illegal_shortcuts_rejected() {
        let mut session = session();
        assert!(session.transition(SessionState::Checkpointing).is_err());
        assert!(session.transition(SessionState::Succeeded).is_err());
        session.transition(SessionState::WaveInFlight).unwrap();
        assert!(session.transition(SessionState::Aborted).is_err());
    }

    #[test]
    fn test_every_terminal_state_is_final() {
        for terminal in [
            SessionState::Succeeded,
            SessionState::Exhausted,
            SessionState::Aborted,
        ] {
            assert!(terminal.is_terminal());
            for next in [
                SessionState::Planning,
                SessionState::WaveInFlight,
                SessionState::Checkpointing,
                SessionState::Succeeded,
                SessionState::Exhausted,
                SessionState::Aborted,
            ] {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[test]
    fn test_cancel_through_handle() {
        let session = session();
        let handle = session.canceller();
        assert!(!session.is_cancelled());
        handle.cancel();
        assert!(session.is_cancelled());
    }

    #[test]
    fn test_absorb_requires_checkpointing() {
        let mut session = session();
        let result = WaveResult {
            wave: 1,
            probes: Vec::new(),
            elapsed: std::time::Duration::ZERO,
        };
        let outcome = session.absorb(
            result,
            &EvidenceAggregator::default(),
            &CheckpointEvaluator::default(),
        );
        assert!(matches!(outcome, Err(OrchestratorError::InvalidTransition(_))));
    }
}
