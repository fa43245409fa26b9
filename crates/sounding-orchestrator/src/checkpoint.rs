//! Checkpoint evaluation between waves
//!
//! After every wave the evaluator recomputes the full gap set from the
//! ledger, re-assesses the evidence signals bound to criteria, rescores, and
//! decides whether the session stops or goes on.
//!
//! ## Evidence signals
//!
//! | signal | pass | partial | fail |
//! |--------|------|---------|------|
//! | coverage | every topic answered | at least half answered | fewer |
//! | source authority | weakest answered topic's best tier is official or high | medium | low, or nothing answered |
//! | corroboration | every topic corroborated | some | none |
//! | consistency | no contradictions | only resolved ones | any unresolved, or no evidence |
//!
//! A topic is corroborated when it holds official-tier evidence or an item
//! with at least `min_corroborations` independent confirmations.

use crate::aggregator::{ClaimEquivalence, EvidenceLedger, NormalizedMatch};
use crate::planner::Topic;
use crate::report::StopReason;
use serde::{Deserialize, Serialize};
use sounding_domain::{
    score, ConfidenceScore, CredibilityTier, CriteriaSet, DepthPolicy, EvidenceItem,
    EvidenceSignal, Gap, GapReason, Outcome,
};
use std::sync::Arc;

/// Decides whether two evidence items contradict each other
pub trait ConflictRule: Send + Sync {
    /// Whether `a` and `b` cannot both be true
    fn conflicts(&self, a: &EvidenceItem, b: &EvidenceItem) -> bool;
}

/// Default rule: same topic, claims not equivalent
#[derive(Clone)]
pub struct TopicConflict {
    equivalence: Arc<dyn ClaimEquivalence>,
}

impl TopicConflict {
    /// Create the rule over a claim equivalence
    pub fn new(equivalence: Arc<dyn ClaimEquivalence>) -> Self {
        Self { equivalence }
    }
}

impl Default for TopicConflict {
    fn default() -> Self {
        Self::new(Arc::new(NormalizedMatch))
    }
}

impl ConflictRule for TopicConflict {
    fn conflicts(&self, a: &EvidenceItem, b: &EvidenceItem) -> bool {
        a.topic == b.topic && !self.equivalence.equivalent(&a.claim, &b.claim)
    }
}

/// Assessed outcome of one evidence signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalReading {
    /// Signal
    pub signal: EvidenceSignal,
    /// Outcome applied to every criterion bound to it
    pub outcome: Outcome,
}

/// Everything computed at one checkpoint
#[derive(Debug, Clone, PartialEq)]
pub struct Checkpoint {
    /// Full gap set, open and resolved
    pub gaps: Vec<Gap>,
    /// Signal assessments, in signal order
    pub signals: Vec<SignalReading>,
    /// Score after applying the signals
    pub score: ConfidenceScore,
}

impl Checkpoint {
    /// Whether any contradiction remains unresolved
    pub fn has_unresolved_contradiction(&self) -> bool {
        self.gaps.iter().any(Gap::is_unresolved_contradiction)
    }

    /// Gaps still needing work
    pub fn open_gaps(&self) -> impl Iterator<Item = &Gap> {
        self.gaps.iter().filter(|g| g.is_open())
    }
}

/// What the session does after a checkpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Target reached with no open contradiction
    Succeed,
    /// Stop without reaching the target
    Exhaust(StopReason),
    /// Dispatch another wave
    Continue,
}

/// Per-topic view used by the gap and signal passes
struct TopicView<'a> {
    key: &'a str,
    items: Vec<&'a EvidenceItem>,
    contradiction: Option<Gap>,
    best_tier: Option<CredibilityTier>,
    corroborated: bool,
}

/// Computes gaps, signals and score at each checkpoint
#[derive(Clone)]
pub struct CheckpointEvaluator {
    conflict_rule: Arc<dyn ConflictRule>,
    min_corroborations: usize,
    min_credible_tier: CredibilityTier,
}

impl std::fmt::Debug for CheckpointEvaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckpointEvaluator")
            .field("min_corroborations", &self.min_corroborations)
            .field("min_credible_tier", &self.min_credible_tier)
            .finish_non_exhaustive()
    }
}

impl Default for CheckpointEvaluator {
    fn default() -> Self {
        Self::new(Arc::new(TopicConflict::default()), 1, CredibilityTier::High)
    }
}

impl CheckpointEvaluator {
    /// Create an evaluator
    pub fn new(
        conflict_rule: Arc<dyn ConflictRule>,
        min_corroborations: usize,
        min_credible_tier: CredibilityTier,
    ) -> Self {
        Self {
            conflict_rule,
            min_corroborations,
            min_credible_tier,
        }
    }

    /// Evaluate the ledger against the agenda and rescore `criteria`
    ///
    /// Only criteria bound to an evidence signal are touched; criteria
    /// without a signal keep whatever outcome the caller gave them.
    pub fn evaluate(
        &self,
        agenda: &[Topic],
        ledger: &EvidenceLedger,
        criteria: &mut CriteriaSet,
    ) -> Checkpoint {
        let views: Vec<TopicView<'_>> = agenda
            .iter()
            .map(|topic| self.view(&topic.key, ledger))
            .collect();

        let gaps = self.gaps(&views);
        let signals: Vec<SignalReading> = criteria
            .signals()
            .into_iter()
            .map(|signal| SignalReading {
                signal,
                outcome: assess(signal, &views),
            })
            .collect();

        for reading in &signals {
            criteria.apply_signal(reading.signal, reading.outcome);
        }
        let score = score(criteria);

        tracing::debug!(
            gaps = gaps.len(),
            score = score.value,
            "checkpoint evaluated"
        );

        Checkpoint {
            gaps,
            signals,
            score,
        }
    }

    fn view<'a>(&self, key: &'a str, ledger: &'a EvidenceLedger) -> TopicView<'a> {
        let items: Vec<&EvidenceItem> = ledger.active_for_topic(key).collect();
        let best_tier = items.iter().map(|item| item.tier).max();

        let mut conflicting: Vec<&EvidenceItem> = Vec::new();
        for (i, a) in items.iter().enumerate() {
            for b in items.iter().skip(i + 1) {
                if self.conflict_rule.conflicts(a, b) {
                    for item in [*a, *b] {
                        if !conflicting.iter().any(|c| c.id == item.id) {
                            conflicting.push(item);
                        }
                    }
                }
            }
        }

        let contradiction = (!conflicting.is_empty()).then(|| {
            let gap = Gap::new(
                key,
                GapReason::Contradicted,
                format!("{} conflicting claims", conflicting.len()),
            );
            match strict_winner(&conflicting) {
                Some(winner) => gap.resolved_by(winner.id),
                None => gap,
            }
        });

        let corroborated = items.iter().any(|item| {
            item.tier == CredibilityTier::Official
                || ledger.confirmations(item) >= self.min_corroborations
        });

        TopicView {
            key,
            items,
            contradiction,
            best_tier,
            corroborated,
        }
    }

    fn gaps(&self, views: &[TopicView<'_>]) -> Vec<Gap> {
        let mut gaps = Vec::new();
        for view in views {
            if view.items.is_empty() {
                gaps.push(Gap::new(
                    view.key,
                    GapReason::Unanswered,
                    "no evidence yet",
                ));
                continue;
            }

            if let Some(contradiction) = &view.contradiction {
                gaps.push(contradiction.clone());
                if contradiction.is_open() {
                    continue;
                }
            }

            if let Some(best) = view.best_tier {
                if best < self.min_credible_tier && !view.corroborated {
                    gaps.push(Gap::new(
                        view.key,
                        GapReason::LowConfidence,
                        format!("best source is {} and uncorroborated", best),
                    ));
                }
            }
        }
        gaps
    }
}

/// The single item whose tier strictly outranks every other, if any
fn strict_winner<'a>(items: &[&'a EvidenceItem]) -> Option<&'a EvidenceItem> {
    let best = items.iter().max_by_key(|item| item.tier)?;
    let unique = items
        .iter()
        .filter(|item| item.id != best.id)
        .all(|item| best.tier.outranks(item.tier));
    unique.then_some(*best)
}

fn assess(signal: EvidenceSignal, views: &[TopicView<'_>]) -> Outcome {
    let total = views.len();
    let answered: Vec<&TopicView<'_>> = views.iter().filter(|v| !v.items.is_empty()).collect();

    match signal {
        EvidenceSignal::Coverage => {
            if total > 0 && answered.len() == total {
                Outcome::Pass
            } else if !answered.is_empty() && answered.len() * 2 >= total {
                Outcome::Partial
            } else {
                Outcome::Fail
            }
        }
        EvidenceSignal::SourceAuthority => {
            match answered.iter().filter_map(|v| v.best_tier).min() {
                Some(CredibilityTier::Official) | Some(CredibilityTier::High) => Outcome::Pass,
                Some(CredibilityTier::Medium) => Outcome::Partial,
                Some(CredibilityTier::Low) | None => Outcome::Fail,
            }
        }
        EvidenceSignal::Corroboration => {
            let corroborated = views.iter().filter(|v| v.corroborated).count();
            if total > 0 && corroborated == total {
                Outcome::Pass
            } else if corroborated > 0 {
                Outcome::Partial
            } else {
                Outcome::Fail
            }
        }
        EvidenceSignal::Consistency => {
            if answered.is_empty() {
                return Outcome::Fail;
            }
            let contradictions: Vec<&Gap> =
                views.iter().filter_map(|v| v.contradiction.as_ref()).collect();
            if contradictions.iter().any(|g| g.is_open()) {
                Outcome::Fail
            } else if contradictions.is_empty() {
                Outcome::Pass
            } else {
                Outcome::Partial
            }
        }
    }
}

/// Decide the next step after a successful (non-aborted) wave
///
/// Success needs the target score and no unresolved contradiction. Failing
/// that, the session stops when the wave budget is spent or the wave added no
/// fresh evidence; otherwise it continues.
pub fn verdict(checkpoint: &Checkpoint, policy: &DepthPolicy, wave: u32, fresh: usize) -> Verdict {
    if checkpoint.score.meets(policy.target_confidence) && !checkpoint.has_unresolved_contradiction()
    {
        Verdict::Succeed
    } else if wave >= policy.max_waves {
        Verdict::Exhaust(StopReason::WaveLimit)
    } else if fresh == 0 {
        Verdict::Exhaust(StopReason::DiminishingReturns)
    } else {
        Verdict::Continue
    }
}
