//! Terminal report returned by every session run

use crate::aggregator::EvidenceLedger;
use crate::metrics::SessionMetrics;
use crate::session::{Session, SessionId, SessionState};
use serde::{Deserialize, Serialize};
use sounding_domain::{
    ConfidenceScore, CredibilityTier, Decision, DepthPolicy, EvidenceId, Gap, ProbeId,
};
use std::fmt;

/// Why a session stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StopReason {
    /// Score reached the depth target with no open contradiction
    TargetReached,
    /// Wave budget spent
    WaveLimit,
    /// Last wave brought no fresh evidence
    DiminishingReturns,
    /// The planner found nothing left worth asking
    NothingToAsk,
    /// Too many consecutive waves without a single success
    RepeatedWaveFailure,
    /// Every provider is missing or disabled
    NoUsableProviders,
    /// The caller cancelled the session
    Cancelled,
}

impl StopReason {
    /// Get the reason as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            StopReason::TargetReached => "target-reached",
            StopReason::WaveLimit => "wave-limit",
            StopReason::DiminishingReturns => "diminishing-returns",
            StopReason::NothingToAsk => "nothing-to-ask",
            StopReason::RepeatedWaveFailure => "repeated-wave-failure",
            StopReason::NoUsableProviders => "no-usable-providers",
            StopReason::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One evidence item as reported, with its ledger bookkeeping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceRecord {
    /// Item id
    pub id: EvidenceId,
    /// Agenda topic
    pub topic: String,
    /// Claim text
    pub claim: String,
    /// Source tier
    pub tier: CredibilityTier,
    /// Citation
    pub citation: String,
    /// Wave of creation
    pub wave: u32,
    /// Probes backing the item
    pub supporting_probes: Vec<ProbeId>,
    /// Corroborations recorded against the item's lineage
    pub corroborations: usize,
    /// Whether a higher-tier duplicate replaced the item
    pub superseded: bool,
    /// The replacing item, when superseded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub superseded_by: Option<EvidenceId>,
}

impl EvidenceRecord {
    fn from_ledger(ledger: &EvidenceLedger) -> Vec<Self> {
        ledger
            .items()
            .iter()
            .map(|item| EvidenceRecord {
                id: item.id,
                topic: item.topic.clone(),
                claim: item.claim.clone(),
                tier: item.tier,
                citation: item.citation.clone(),
                wave: item.wave,
                supporting_probes: item.supporting_probes.clone(),
                corroborations: ledger.corroboration_count(item.id),
                superseded: ledger.is_superseded(item.id),
                superseded_by: ledger.superseded_by(item.id),
            })
            .collect()
    }
}

/// Final, self-contained outcome of a research session
///
/// Produced for every run that gets past configuration checks, including
/// aborted and cancelled ones; those are flagged `inconclusive` but keep
/// whatever evidence and score were gathered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerminalReport {
    /// Session id
    pub session_id: SessionId,
    /// Depth policy the session ran under
    pub policy: DepthPolicy,
    /// Terminal lifecycle state
    pub final_state: SessionState,
    /// Why the session stopped
    pub stop_reason: StopReason,
    /// Set for aborted sessions
    pub inconclusive: bool,
    /// Final score with per-criterion breakdown
    pub score: ConfidenceScore,
    /// Decision for the final score
    pub decision: Decision,
    /// Every evidence item, superseded ones included
    pub evidence: Vec<EvidenceRecord>,
    /// Gaps still open at the end
    pub unresolved_gaps: Vec<Gap>,
    /// Waves dispatched
    pub waves_used: u32,
    /// Run counters
    pub metrics: SessionMetrics,
}

impl TerminalReport {
    pub(crate) fn from_session(
        session: &Session,
        stop_reason: StopReason,
        metrics: SessionMetrics,
    ) -> Self {
        let score = session.score();
        let decision = score.decision();
        let final_state = session.state();
        Self {
            session_id: session.id(),
            policy: *session.policy(),
            final_state,
            stop_reason,
            inconclusive: final_state == SessionState::Aborted,
            score,
            decision,
            evidence: EvidenceRecord::from_ledger(session.ledger()),
            unresolved_gaps: session.gaps().iter().filter(|g| g.is_open()).cloned().collect(),
            waves_used: session.waves_used(),
            metrics,
        }
    }

    /// Evidence still in force
    pub fn active_evidence(&self) -> impl Iterator<Item = &EvidenceRecord> {
        self.evidence.iter().filter(|e| !e.superseded)
    }

    /// Whether the session reached its target
    pub fn succeeded(&self) -> bool {
        self.final_state == SessionState::Succeeded
    }
}
