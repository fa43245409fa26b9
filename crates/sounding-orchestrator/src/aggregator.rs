//! Evidence aggregation
//!
//! Folds the succeeded probes of a wave into the session's
//! [`EvidenceLedger`]: new claims become evidence items, a better-sourced
//! duplicate supersedes the item it repeats, and anything else that repeats a
//! known claim is logged as a corroboration. Contradictions are not judged
//! here; that is the checkpoint's job.

use crate::scheduler::WaveResult;
use serde::{Deserialize, Serialize};
use sounding_domain::{CredibilityTier, EvidenceId, EvidenceItem, ProbeId, ProviderId};
use std::collections::HashMap;
use std::sync::Arc;

/// Decides whether two claim texts say the same thing
pub trait ClaimEquivalence: Send + Sync {
    /// Whether `a` and `b` are the same claim
    fn equivalent(&self, a: &str, b: &str) -> bool;
}

impl<F> ClaimEquivalence for F
where
    F: Fn(&str, &str) -> bool + Send + Sync,
{
    fn equivalent(&self, a: &str, b: &str) -> bool {
        self(a, b)
    }
}

/// Default equivalence: exact match after collapsing whitespace and case
#[derive(Debug, Clone, Copy, Default)]
pub struct NormalizedMatch;

impl ClaimEquivalence for NormalizedMatch {
    fn equivalent(&self, a: &str, b: &str) -> bool {
        normalize_claim(a) == normalize_claim(b)
    }
}

/// Collapse runs of whitespace and lowercase
pub fn normalize_claim(claim: &str) -> String {
    claim
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// A later probe that repeated an existing item's claim
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Corroboration {
    /// Item the probe agreed with
    pub evidence: EvidenceId,
    /// Corroborating probe
    pub probe: ProbeId,
    /// Tier of the corroborating source
    pub tier: CredibilityTier,
    /// Citation of the corroborating source
    pub citation: String,
    /// Wave in which it arrived
    pub wave: u32,
}

/// Append-only record of everything the session has learned
///
/// Items are never removed or edited. Supersession and corroboration are
/// tracked beside the items so the full history stays auditable.
#[derive(Debug, Clone, Default)]
pub struct EvidenceLedger {
    items: Vec<EvidenceItem>,
    superseded_by: HashMap<EvidenceId, EvidenceId>,
    supersedes: HashMap<EvidenceId, EvidenceId>,
    corroborations: Vec<Corroboration>,
}

impl EvidenceLedger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Every item ever recorded, in creation order
    pub fn items(&self) -> &[EvidenceItem] {
        &self.items
    }

    /// Items that have not been superseded
    pub fn active(&self) -> impl Iterator<Item = &EvidenceItem> {
        self.items
            .iter()
            .filter(|item| !self.superseded_by.contains_key(&item.id))
    }

    /// Active items for one topic
    pub fn active_for_topic<'a>(&'a self, topic: &'a str) -> impl Iterator<Item = &'a EvidenceItem> {
        self.active().filter(move |item| item.topic == topic)
    }

    /// Look up an item by id
    pub fn get(&self, id: EvidenceId) -> Option<&EvidenceItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Whether an item has been superseded
    pub fn is_superseded(&self, id: EvidenceId) -> bool {
        self.superseded_by.contains_key(&id)
    }

    /// The item that replaced `id`, if any
    pub fn superseded_by(&self, id: EvidenceId) -> Option<EvidenceId> {
        self.superseded_by.get(&id).copied()
    }

    /// All corroboration records, in arrival order
    pub fn corroborations(&self) -> &[Corroboration] {
        &self.corroborations
    }

    /// Corroborations recorded against `id` or any item it superseded
    pub fn corroboration_count(&self, id: EvidenceId) -> usize {
        let mut lineage = vec![id];
        let mut current = id;
        while let Some(previous) = self.supersedes.get(&current) {
            lineage.push(*previous);
            current = *previous;
        }
        self.corroborations
            .iter()
            .filter(|c| lineage.contains(&c.evidence))
            .count()
    }

    /// Independent sources agreeing with an item beyond its first
    pub fn confirmations(&self, item: &EvidenceItem) -> usize {
        item.supporting_probes.len().saturating_sub(1) + self.corroboration_count(item.id)
    }

    /// Number of items ever recorded
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether nothing has been recorded
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn push(&mut self, item: EvidenceItem) {
        self.items.push(item);
    }

    fn supersede(&mut self, old: EvidenceId, replacement: EvidenceItem) {
        self.superseded_by.insert(old, replacement.id);
        self.supersedes.insert(replacement.id, old);
        self.items.push(replacement);
    }

    fn corroborate(&mut self, corroboration: Corroboration) {
        self.corroborations.push(corroboration);
    }
}

/// What one merge did to the ledger
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeSummary {
    /// Wave merged
    pub wave: u32,
    /// New items for previously unseen claims
    pub created: usize,
    /// Items replaced by a higher-tier duplicate
    pub superseded: usize,
    /// Corroboration records appended
    pub corroborated: usize,
    /// New claims that count as fresh ground
    ///
    /// In the first wave a claim echoed by another provider in the same wave
    /// is not fresh. Later waves are measured against the earlier ledger, so
    /// every created item counts.
    pub fresh: usize,
}

/// Merges wave results into an evidence ledger
#[derive(Clone)]
pub struct EvidenceAggregator {
    equivalence: Arc<dyn ClaimEquivalence>,
}

impl std::fmt::Debug for EvidenceAggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvidenceAggregator").finish_non_exhaustive()
    }
}

impl Default for EvidenceAggregator {
    fn default() -> Self {
        Self::new(Arc::new(NormalizedMatch))
    }
}

impl EvidenceAggregator {
    /// Create an aggregator with a custom equivalence rule
    pub fn new(equivalence: Arc<dyn ClaimEquivalence>) -> Self {
        Self { equivalence }
    }

    /// The equivalence rule in use
    pub fn equivalence(&self) -> Arc<dyn ClaimEquivalence> {
        Arc::clone(&self.equivalence)
    }

    /// Merge the succeeded probes of a wave
    ///
    /// Probes are taken in dispatch order. Within a topic, a candidate whose
    /// claim matches an active item either supersedes it (strictly higher
    /// tier) or is recorded as a corroboration (equal or lower tier). A
    /// provider that gives the same answer twice in one wave counts once.
    /// Parallel probes converging on one new claim only discount freshness in
    /// wave 1, where there is no earlier evidence to compare against.
    pub fn merge(&self, ledger: &mut EvidenceLedger, wave: &WaveResult) -> MergeSummary {
        let mut summary = MergeSummary {
            wave: wave.wave,
            ..MergeSummary::default()
        };

        let candidates: Vec<(&ProviderId, EvidenceItem)> = wave
            .succeeded()
            .filter_map(|probe| {
                let outcome = probe.outcome()?;
                let item = EvidenceItem::new(
                    probe.topic(),
                    outcome.claim.clone(),
                    probe.id(),
                    probe.tier(),
                    outcome.citation.clone(),
                    wave.wave,
                );
                Some((probe.provider(), item))
            })
            .collect();

        let same_answer = |a: &(&ProviderId, EvidenceItem), b: &(&ProviderId, EvidenceItem)| {
            a.1.topic == b.1.topic && self.equivalence.equivalent(&a.1.claim, &b.1.claim)
        };

        for (index, entry) in candidates.iter().enumerate() {
            let (provider, candidate) = entry;

            // A provider asked the same topic twice in one wave is one source
            if candidates[..index]
                .iter()
                .any(|earlier| earlier.0 == *provider && same_answer(earlier, entry))
            {
                tracing::debug!(topic = %candidate.topic, provider = %provider, "repeat answer skipped");
                continue;
            }

            let existing = ledger
                .active_for_topic(&candidate.topic)
                .find(|item| self.equivalence.equivalent(&item.claim, &candidate.claim))
                .cloned();

            match existing {
                None => {
                    let echoed = wave.wave <= 1
                        && candidates
                            .iter()
                            .any(|other| other.0 != *provider && same_answer(other, entry));
                    summary.created += 1;
                    if !echoed {
                        summary.fresh += 1;
                    }
                    tracing::debug!(
                        topic = %candidate.topic,
                        tier = %candidate.tier,
                        echoed,
                        "new evidence"
                    );
                    ledger.push(candidate.clone());
                }
                Some(previous) if candidate.tier.outranks(previous.tier) => {
                    tracing::debug!(
                        topic = %candidate.topic,
                        from = %previous.tier,
                        to = %candidate.tier,
                        "evidence superseded"
                    );
                    let replacement = EvidenceItem::superseding(&previous, candidate.clone());
                    ledger.supersede(previous.id, replacement);
                    summary.superseded += 1;
                }
                Some(previous) => {
                    ledger.corroborate(Corroboration {
                        evidence: previous.id,
                        probe: candidate.supporting_probes[0],
                        tier: candidate.tier,
                        citation: candidate.citation.clone(),
                        wave: wave.wave,
                    });
                    summary.corroborated += 1;
                }
            }
        }

        summary
    }
}
