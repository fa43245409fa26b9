//! Sounding Domain Layer
//!
//! Core vocabulary for the adaptive evidence-gathering orchestrator. This crate
//! holds pure value types, the scoring engine and the trait seam towards
//! external probe providers. It performs no I/O of its own.
//!
//! ## Key Concepts
//!
//! - **Depth policy**: probe budget and stopping thresholds per depth level
//! - **Probe**: a single query dispatched to one provider
//! - **Credibility tier**: ordinal trust rank (official > high > medium > low)
//! - **Evidence item**: an immutable, citable claim backed by one or more probes
//! - **Gap**: a deficiency in the current evidence (unanswered, contradicted, low-confidence)
//! - **Criteria / confidence score**: weighted multi-criterion go/no-go scoring
//!
//! ## Architecture
//!
//! - Pure business logic only
//! - Orchestration, scheduling and providers live in other crates
//! - Trait definitions for all external interactions

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod confidence;
pub mod criterion;
pub mod depth;
pub mod error;
pub mod evidence;
pub mod gap;
pub mod probe;
pub mod tier;
pub mod traits;

// Re-exports for convenience
pub use confidence::{score, ConfidenceScore, CriterionScore, Decision};
pub use criterion::{CriteriaSet, Criterion, EvidenceSignal, Outcome, PartialCredit};
pub use depth::{DepthLevel, DepthPolicy};
pub use error::DomainError;
pub use evidence::{EvidenceId, EvidenceItem};
pub use gap::{Gap, GapReason};
pub use probe::{Probe, ProbeError, ProbeId, ProbeOutcome, ProbeStatus, ProviderId};
pub use tier::CredibilityTier;
pub use traits::ProbeProvider;
