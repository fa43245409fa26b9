//! Sounding Orchestrator
//!
//! Adaptive evidence gathering. A [`Session`] holds an agenda of topics and a
//! depth policy; the [`SessionRunner`] drives it through bounded waves of
//! concurrent probes, merging results into an evidence ledger and stopping as
//! soon as the confidence target is met, the budget runs out, or further
//! probing stops paying off.
//!
//! Each wave goes through the same steps:
//! 1. [`Planner`] picks queries from the agenda and the open gaps
//! 2. [`WaveScheduler`] dispatches them concurrently, tolerating partial failure
//! 3. [`EvidenceAggregator`] merges answers, superseding and corroborating
//! 4. [`CheckpointEvaluator`] finds gaps, rescores the criteria and issues a verdict
//!
//! # Examples
//!
//! ```
//! use sounding_orchestrator::{OrchestratorConfig, Session, SessionRunner, SessionState};
//! use sounding_domain::{CredibilityTier, CriteriaSet, DepthLevel, ProbeOutcome};
//! use sounding_probe::{FixtureProvider, ProviderRegistry};
//! use std::sync::Arc;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let mut docs = FixtureProvider::empty();
//! docs.answer("tokio msrv", ProbeOutcome::new("Rust 1.70", "https://docs.rs/tokio"));
//! docs.answer("tokio license", ProbeOutcome::new("MIT", "https://docs.rs/tokio"));
//!
//! let registry = ProviderRegistry::new()
//!     .with("docs", CredibilityTier::Official, Arc::new(docs))
//!     .unwrap();
//! let runner = SessionRunner::new(registry, OrchestratorConfig::default()).unwrap();
//!
//! let mut session = Session::create(DepthLevel::Standard, CriteriaSet::research_default());
//! session.investigate("msrv", "tokio msrv").unwrap();
//! session.investigate("license", "tokio license").unwrap();
//!
//! let report = runner.run(&mut session).await.unwrap();
//! assert_eq!(report.final_state, SessionState::Succeeded);
//! assert_eq!(report.waves_used, 1);
//! # }
//! ```

#![warn(missing_docs)]

pub mod aggregator;
pub mod checkpoint;
pub mod config;
pub mod error;
pub mod metrics;
pub mod planner;
pub mod report;
pub mod runner;
pub mod scheduler;
pub mod session;

pub use aggregator::{
    ClaimEquivalence, Corroboration, EvidenceAggregator, EvidenceLedger, MergeSummary,
    NormalizedMatch,
};
pub use checkpoint::{
    Checkpoint, CheckpointEvaluator, ConflictRule, SignalReading, TopicConflict, Verdict,
};
pub use config::OrchestratorConfig;
pub use error::OrchestratorError;
pub use metrics::SessionMetrics;
pub use planner::{AgendaPlanner, PlannedQuery, Planner, PlanningContext, Topic};
pub use report::{EvidenceRecord, StopReason, TerminalReport};
pub use runner::SessionRunner;
pub use scheduler::{WaveAborted, WaveResult, WaveScheduler};
pub use session::{Session, SessionId, SessionState, WaveRecord};
