//! Session runner: the plan, dispatch, checkpoint loop
//!
//! One [`SessionRunner`] can drive any number of sessions, one call to
//! [`SessionRunner::run`] per session. Each call loops until the session
//! reaches a terminal state and always hands back a [`TerminalReport`] once
//! the first plan has been made.

use crate::aggregator::{ClaimEquivalence, EvidenceAggregator};
use crate::checkpoint::{verdict, CheckpointEvaluator, ConflictRule, TopicConflict, Verdict};
use crate::config::OrchestratorConfig;
use crate::metrics::SessionMetrics;
use crate::planner::{fit_to_bounds, AgendaPlanner, PlannedQuery, Planner, PlanningContext};
use crate::report::{StopReason, TerminalReport};
use crate::scheduler::{WaveResult, WaveScheduler};
use crate::session::{Session, SessionState};
use crate::OrchestratorError;
use sounding_domain::{ProbeError, ProbeStatus, ProviderId};
use sounding_probe::ProviderRegistry;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

/// Drives research sessions against a provider registry
///
/// # Examples
///
/// ```
/// use sounding_orchestrator::{OrchestratorConfig, Session, SessionRunner, StopReason};
/// use sounding_domain::{CredibilityTier, CriteriaSet, DepthLevel, ProbeOutcome};
/// use sounding_probe::{FixtureProvider, ProviderRegistry};
/// use std::sync::Arc;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let docs = FixtureProvider::new(ProbeOutcome::new("MIT", "https://docs.example/license"));
/// let registry = ProviderRegistry::new()
///     .with("docs", CredibilityTier::Official, Arc::new(docs))
///     .unwrap();
///
/// let runner = SessionRunner::new(registry, OrchestratorConfig::default()).unwrap();
/// let mut session = Session::create(DepthLevel::Quick, CriteriaSet::research_default());
/// session.investigate("license", "tokio license").unwrap();
///
/// let report = runner.run(&mut session).await.unwrap();
/// assert_eq!(report.stop_reason, StopReason::TargetReached);
/// # }
/// ```
pub struct SessionRunner {
    registry: ProviderRegistry,
    planner: Arc<dyn Planner>,
    aggregator: EvidenceAggregator,
    evaluator: CheckpointEvaluator,
    scheduler: WaveScheduler,
    config: OrchestratorConfig,
}

impl std::fmt::Debug for SessionRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRunner")
            .field("registry", &self.registry)
            .field("evaluator", &self.evaluator)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl SessionRunner {
    /// Create a runner with the default planner and claim matching
    ///
    /// # Errors
    /// Fails with [`OrchestratorError::InvalidConfiguration`] when the configuration is invalid.
    pub fn new(registry: ProviderRegistry, config: OrchestratorConfig) -> Result<Self, OrchestratorError> {
        config.validate()?;
        let aggregator = EvidenceAggregator::default();
        let evaluator = CheckpointEvaluator::new(
            Arc::new(TopicConflict::new(aggregator.equivalence())),
            config.min_corroborations,
            config.min_credible_tier,
        );
        Ok(Self {
            registry,
            planner: Arc::new(AgendaPlanner::new()),
            aggregator,
            evaluator,
            scheduler: WaveScheduler::new(config.probe_timeout()),
            config,
        })
    }

    /// Replace the planner
    pub fn with_planner(mut self, planner: Arc<dyn Planner>) -> Self {
        self.planner = planner;
        self
    }

    /// Replace the claim equivalence used for merging and conflict detection
    pub fn with_equivalence(mut self, equivalence: Arc<dyn ClaimEquivalence>) -> Self {
        self.aggregator = EvidenceAggregator::new(Arc::clone(&equivalence));
        self.with_conflict_rule(Arc::new(TopicConflict::new(equivalence)))
    }

    /// Replace the rule deciding when two items contradict each other
    pub fn with_conflict_rule(mut self, rule: Arc<dyn ConflictRule>) -> Self {
        self.evaluator = CheckpointEvaluator::new(
            rule,
            self.config.min_corroborations,
            self.config.min_credible_tier,
        );
        self
    }

    /// Runner configuration
    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Provider registry
    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Run a session to a terminal state
    ///
    /// Waves are dispatched one at a time; each is followed by a checkpoint
    /// that merges evidence, rescores the criteria and decides whether to
    /// stop. Provider failures, aborted waves and cancellation all end in a
    /// report rather than an error.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::InvalidTransition`] if the session is not
    /// in `Planning`, and [`OrchestratorError::InvalidConfiguration`] if a planner names a
    /// provider that is not usable.
    pub async fn run(&self, session: &mut Session) -> Result<TerminalReport, OrchestratorError> {
        if session.state() != SessionState::Planning {
            return Err(OrchestratorError::InvalidTransition(format!(
                "session {} is {}, expected planning",
                session.id(),
                session.state()
            )));
        }

        let started = Instant::now();
        let policy = *session.policy();
        let cancel = session.canceller();
        let mut metrics = SessionMetrics::new();
        let mut disabled: HashSet<ProviderId> = HashSet::new();
        let mut asked: HashSet<(String, ProviderId)> = HashSet::new();
        let mut consecutive_aborts = 0u32;

        tracing::info!(
            "Starting session {} ({} topics, up to {} waves, target {:.2})",
            session.id(),
            session.agenda().len(),
            policy.max_waves,
            policy.target_confidence
        );

        let stop_reason = loop {
            let wave = session.waves_used() + 1;

            if cancel.is_cancelled() {
                break finish(session, SessionState::Aborted, StopReason::Cancelled)?;
            }
            let providers = self.usable_providers(&disabled);
            if providers.is_empty() {
                break finish(session, SessionState::Aborted, StopReason::NoUsableProviders)?;
            }

            let planned = {
                let context = PlanningContext {
                    wave,
                    policy: &policy,
                    agenda: session.agenda(),
                    gaps: session.gaps(),
                    providers: &providers,
                    asked: &asked,
                };
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => None,
                    plan = self.planner.plan(&context) => Some(plan),
                }
            };
            let Some(plan) = planned else {
                break finish(session, SessionState::Aborted, StopReason::Cancelled)?;
            };
            let plan = fit_to_bounds(plan, &policy);
            if plan.is_empty() {
                break finish(session, SessionState::Exhausted, StopReason::NothingToAsk)?;
            }
            self.check_plan(&plan, &providers)?;

            session.transition(SessionState::WaveInFlight)?;
            let result = self
                .scheduler
                .run_wave(wave, &policy, plan, &self.registry, &cancel)
                .await?;
            session.transition(SessionState::Checkpointing)?;

            metrics.record_wave(&result);
            record_asked(&mut asked, &result);
            for provider in result.unauthorized_providers() {
                tracing::warn!("Disabling provider {} after it refused access", provider);
                disabled.insert(provider.clone());
                metrics.record_disabled(provider);
            }

            let cancelled = result.was_cancelled() || cancel.is_cancelled();
            let aborted = result.aborted();
            let (merge, checkpoint) = session.absorb(result, &self.aggregator, &self.evaluator)?;
            metrics.record_merge(&merge);

            tracing::info!(
                "Wave {} checkpoint: {} new ({} fresh), {} superseded, {} corroborated, score {:.3}, {} open gaps",
                wave,
                merge.created,
                merge.fresh,
                merge.superseded,
                merge.corroborated,
                checkpoint.score.value,
                checkpoint.open_gaps().count()
            );

            if cancelled {
                break finish(session, SessionState::Aborted, StopReason::Cancelled)?;
            }

            if let Some(abort) = aborted {
                consecutive_aborts += 1;
                tracing::warn!("{} ({} in a row)", abort, consecutive_aborts);
                if self.usable_providers(&disabled).is_empty() {
                    break finish(session, SessionState::Aborted, StopReason::NoUsableProviders)?;
                }
                if consecutive_aborts >= self.config.max_consecutive_aborts {
                    break finish(session, SessionState::Aborted, StopReason::RepeatedWaveFailure)?;
                }
                if wave >= policy.max_waves {
                    break finish(session, SessionState::Exhausted, StopReason::WaveLimit)?;
                }
                continue;
            }

            consecutive_aborts = 0;
            match verdict(&checkpoint, &policy, wave, merge.fresh) {
                Verdict::Succeed => {
                    break finish(session, SessionState::Succeeded, StopReason::TargetReached)?
                }
                Verdict::Exhaust(reason) => break finish(session, SessionState::Exhausted, reason)?,
                Verdict::Continue => {}
            }
        };

        session.settle_unchecked(&self.evaluator);
        metrics.total_runtime_ms = started.elapsed().as_millis() as u64;
        let report = TerminalReport::from_session(session, stop_reason, metrics);
        tracing::info!(
            "Session {} {} after {} waves ({}): score {:.3}, decision {}",
            report.session_id,
            report.final_state,
            report.waves_used,
            report.stop_reason,
            report.score.value,
            report.decision.as_str()
        );
        tracing::debug!("{}", report.metrics.summary());
        Ok(report)
    }

    fn usable_providers(&self, disabled: &HashSet<ProviderId>) -> Vec<ProviderId> {
        self.registry
            .ids()
            .into_iter()
            .filter(|id| !disabled.contains(id))
            .collect()
    }

    fn check_plan(&self, plan: &[PlannedQuery], providers: &[ProviderId]) -> Result<(), OrchestratorError> {
        match plan.iter().find(|q| !providers.contains(&q.provider)) {
            Some(query) => Err(OrchestratorError::InvalidConfiguration(format!(
                "planner chose provider '{}', which is unknown or disabled",
                query.provider
            ))),
            None => Ok(()),
        }
    }
}

fn finish(
    session: &mut Session,
    state: SessionState,
    reason: StopReason,
) -> Result<StopReason, OrchestratorError> {
    session.transition(state)?;
    Ok(reason)
}

/// Mark (topic, provider) pairs that got a definitive answer
///
/// Timeouts, throttling, outages and cancellations leave the pair open so a
/// later wave may retry it.
fn record_asked(asked: &mut HashSet<(String, ProviderId)>, wave: &WaveResult) {
    for probe in &wave.probes {
        let settled = match probe.status() {
            ProbeStatus::Succeeded => true,
            ProbeStatus::Failed => matches!(
                probe.error(),
                Some(ProbeError::NoResults(_)) | Some(ProbeError::Unauthorized(_))
            ),
            _ => false,
        };
        if settled {
            asked.insert((probe.topic().to_string(), probe.provider().clone()));
        }
    }
}
