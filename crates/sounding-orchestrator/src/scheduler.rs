//! Wave scheduler: one bounded round of concurrent probes
//!
//! Every planned query becomes a [`Probe`] dispatched on its own task. The
//! scheduler returns only once every probe is terminal, so a wave is a
//! barrier: partial failure is tolerated, and a wave in which nothing
//! succeeded is reported through [`WaveResult::aborted`].

use crate::planner::PlannedQuery;
use crate::OrchestratorError;
use sounding_domain::{DepthPolicy, Probe, ProbeError, ProbeOutcome, ProbeStatus, ProviderId};
use sounding_probe::ProviderRegistry;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Raised when a wave ends without a single successful probe
#[derive(Error, Debug, Clone, PartialEq)]
#[error("wave {wave} aborted: none of {attempted} probes succeeded")]
pub struct WaveAborted {
    /// Wave ordinal
    pub wave: u32,
    /// Probes dispatched
    pub attempted: usize,
    /// Provider errors seen, in probe order
    pub failures: Vec<ProbeError>,
}

/// Outcome of one wave: every probe in a terminal state
#[derive(Debug, Clone, PartialEq)]
pub struct WaveResult {
    /// Wave ordinal (1-based)
    pub wave: u32,
    /// Probes in dispatch order
    pub probes: Vec<Probe>,
    /// Wall time from dispatch to barrier
    pub elapsed: Duration,
}

impl WaveResult {
    /// Probes that returned an outcome
    pub fn succeeded(&self) -> impl Iterator<Item = &Probe> {
        self.probes
            .iter()
            .filter(|p| p.status() == ProbeStatus::Succeeded)
    }

    /// Number of succeeded probes
    pub fn succeeded_count(&self) -> usize {
        self.succeeded().count()
    }

    /// `Some` when probes were dispatched and none of them succeeded
    pub fn aborted(&self) -> Option<WaveAborted> {
        if self.probes.is_empty() || self.succeeded_count() > 0 {
            return None;
        }
        Some(WaveAborted {
            wave: self.wave,
            attempted: self.probes.len(),
            failures: self.probes.iter().filter_map(|p| p.error().cloned()).collect(),
        })
    }

    /// Providers that refused access during this wave
    pub fn unauthorized_providers(&self) -> Vec<ProviderId> {
        let mut providers: Vec<ProviderId> = Vec::new();
        for probe in &self.probes {
            if probe.error().is_some_and(ProbeError::disables_provider)
                && !providers.contains(probe.provider())
            {
                providers.push(probe.provider().clone());
            }
        }
        providers
    }

    /// Whether any probe was stopped by cancellation
    pub fn was_cancelled(&self) -> bool {
        self.probes
            .iter()
            .any(|p| p.status() == ProbeStatus::Cancelled)
    }
}

enum Attempt {
    Answered(ProbeOutcome),
    Failed(ProbeError),
    Cancelled,
}

/// Dispatches waves of probes against a provider registry
#[derive(Debug, Clone)]
pub struct WaveScheduler {
    probe_timeout: Duration,
}

impl WaveScheduler {
    /// Create a scheduler with a per-probe timeout
    pub fn new(probe_timeout: Duration) -> Self {
        Self { probe_timeout }
    }

    /// Per-probe timeout
    pub fn probe_timeout(&self) -> Duration {
        self.probe_timeout
    }

    /// Run one wave
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::InvalidConfiguration`] when the plan size is outside the
    /// policy's probe bounds, the wave ordinal exceeds the wave budget, or a
    /// query names an unregistered provider. Nothing is dispatched in that
    /// case. Provider failures are recorded on the probes instead.
    pub async fn run_wave(
        &self,
        wave: u32,
        policy: &DepthPolicy,
        queries: Vec<PlannedQuery>,
        registry: &ProviderRegistry,
        cancel: &CancellationToken,
    ) -> Result<WaveResult, OrchestratorError> {
        if !policy.allows_wave_size(queries.len()) {
            return Err(OrchestratorError::InvalidConfiguration(format!(
                "wave of {} probes is outside {}..={}",
                queries.len(),
                policy.min_probes_per_wave,
                policy.max_probes_per_wave
            )));
        }
        if wave == 0 || wave > policy.max_waves {
            return Err(OrchestratorError::InvalidConfiguration(format!(
                "wave {} is outside 1..={}",
                wave, policy.max_waves
            )));
        }

        let mut probes = Vec::with_capacity(queries.len());
        let mut providers = Vec::with_capacity(queries.len());
        for query in queries {
            let entry = registry.get(&query.provider).ok_or_else(|| {
                OrchestratorError::InvalidConfiguration(format!("unknown provider '{}'", query.provider))
            })?;
            providers.push(entry.provider.clone());
            probes.push(Probe::new(
                query.query,
                query.topic,
                query.provider,
                wave,
                entry.default_tier,
            ));
        }

        tracing::debug!("Dispatching wave {} with {} probes", wave, probes.len());
        let started = Instant::now();
        let mut tasks = JoinSet::new();

        for (index, (probe, provider)) in probes.iter().zip(providers).enumerate() {
            let query = probe.query().to_string();
            let timeout = self.probe_timeout;
            let token = cancel.clone();
            tasks.spawn(async move {
                let dispatched = Instant::now();
                // Inner task isolates provider panics from the wave
                let mut call = tokio::spawn(async move {
                    tokio::time::timeout(timeout, provider.execute(&query, timeout)).await
                });
                let attempt = tokio::select! {
                    biased;
                    _ = token.cancelled() => {
                        call.abort();
                        Attempt::Cancelled
                    }
                    joined = &mut call => match joined {
                        Ok(Ok(Ok(outcome))) => Attempt::Answered(outcome),
                        Ok(Ok(Err(error))) => Attempt::Failed(error),
                        Ok(Err(_elapsed)) => Attempt::Failed(ProbeError::Timeout),
                        Err(e) => Attempt::Failed(ProbeError::Unavailable(format!(
                            "provider task failed: {}",
                            e
                        ))),
                    },
                };
                (index, attempt, dispatched.elapsed())
            });
        }

        while let Some(joined) = tasks.join_next().await {
            let (index, attempt, elapsed) = match joined {
                Ok(resolved) => resolved,
                Err(e) => {
                    tracing::error!("Probe task in wave {} failed: {}", wave, e);
                    continue;
                }
            };
            let probe = &mut probes[index];
            match attempt {
                Attempt::Answered(outcome) => probe.succeed(outcome, elapsed),
                Attempt::Failed(error) => probe.fail(error, elapsed),
                Attempt::Cancelled => probe.cancel(elapsed),
            }
            .map_err(|e| OrchestratorError::Scheduler(e.to_string()))?;

            tracing::debug!(
                probe = %probe.id(),
                provider = %probe.provider(),
                status = probe.status().as_str(),
                elapsed_ms = elapsed.as_millis() as u64,
                "probe resolved"
            );
        }

        let elapsed = started.elapsed();
        for probe in probes.iter_mut().filter(|p| !p.status().is_terminal()) {
            probe
                .fail(
                    ProbeError::Unavailable("probe task ended without a result".to_string()),
                    elapsed,
                )
                .map_err(|e| OrchestratorError::Scheduler(e.to_string()))?;
        }

        Ok(WaveResult {
            wave,
            probes,
            elapsed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use sounding_domain::{CredibilityTier, DepthLevel, ProbeProvider};
    use sounding_probe::FixtureProvider;
    use std::sync::Arc;

    struct Panicking;

    #[async_trait]
    impl ProbeProvider for Panicking {
        async fn execute(&self, _query: &str, _timeout: Duration) -> Result<ProbeOutcome, ProbeError> {
            panic!("provider bug");
        }
    }

    fn registry() -> ProviderRegistry {
        let mut docs = FixtureProvider::empty();
        docs.answer("q", ProbeOutcome::new("answer", "https://docs.example/q"));
        let slow = FixtureProvider::new(ProbeOutcome::new("late", "https://slow.example"))
            .with_latency(Duration::from_secs(10))
            .ignoring_timeout();
        let mut broken = FixtureProvider::empty();
        broken.fail("q", ProbeError::Unauthorized("no key".into()));

        ProviderRegistry::new()
            .with("docs", CredibilityTier::Official, Arc::new(docs))
            .unwrap()
            .with("slow", CredibilityTier::Medium, Arc::new(slow))
            .unwrap()
            .with("broken", CredibilityTier::High, Arc::new(broken))
            .unwrap()
            .with("panics", CredibilityTier::Low, Arc::new(Panicking))
            .unwrap()
    }

    fn query(provider: &str) -> PlannedQuery {
        PlannedQuery::new("topic", "q", ProviderId::new(provider))
    }

    fn wide_policy() -> DepthPolicy {
        DepthPolicy::custom(1, 10, 3, 0.8).unwrap()
    }

    #[tokio::test]
    async fn test_partial_failure_tolerated() {
        let scheduler = WaveScheduler::new(Duration::from_millis(100));
        let result = scheduler
            .run_wave(
                1,
                &wide_policy(),
                vec![query("docs"), query("slow"), query("broken"), query("panics")],
                &registry(),
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        let statuses: Vec<ProbeStatus> = result.probes.iter().map(|p| p.status()).collect();
        assert_eq!(
            statuses,
            vec![
                ProbeStatus::Succeeded,
                ProbeStatus::TimedOut,
                ProbeStatus::Failed,
                ProbeStatus::Failed,
            ]
        );
        assert_eq!(result.succeeded_count(), 1);
        assert!(result.aborted().is_none());
        assert_eq!(result.unauthorized_providers(), vec![ProviderId::new("broken")]);
        assert_eq!(result.probes[0].tier(), CredibilityTier::Official);
    }

    #[tokio::test]
    async fn test_wave_with_no_success_is_aborted() {
        let scheduler = WaveScheduler::new(Duration::from_millis(50));
        let result = scheduler
            .run_wave(
                1,
                &wide_policy(),
                vec![query("slow"), query("broken")],
                &registry(),
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        let aborted = result.aborted().unwrap();
        assert_eq!(aborted.attempted, 2);
        assert_eq!(aborted.failures.len(), 2);
    }

    #[tokio::test]
    async fn test_plan_outside_bounds_rejected() {
        let scheduler = WaveScheduler::new(Duration::from_millis(50));
        let quick = DepthLevel::Quick.policy();
        let result = scheduler
            .run_wave(
                1,
                &quick,
                vec![query("docs"), query("docs"), query("docs")],
                &registry(),
                &CancellationToken::new(),
            )
            .await;
        assert!(matches!(result, Err(OrchestratorError::InvalidConfiguration(_))));

        let empty = scheduler
            .run_wave(1, &quick, Vec::new(), &registry(), &CancellationToken::new())
            .await;
        assert!(empty.is_err());
    }

    #[tokio::test]
    async fn test_wave_beyond_budget_rejected() {
        let scheduler = WaveScheduler::new(Duration::from_millis(50));
        let result = scheduler
            .run_wave(
                2,
                &DepthLevel::Quick.policy(),
                vec![query("docs")],
                &registry(),
                &CancellationToken::new(),
            )
            .await;
        assert!(matches!(result, Err(OrchestratorError::InvalidConfiguration(_))));
    }

    #[tokio::test]
    async fn test_unknown_provider_rejected() {
        let scheduler = WaveScheduler::new(Duration::from_millis(50));
        let result = scheduler
            .run_wave(
                1,
                &wide_policy(),
                vec![query("nowhere")],
                &registry(),
                &CancellationToken::new(),
            )
            .await;
        assert!(matches!(result, Err(OrchestratorError::InvalidConfiguration(_))));
    }

    #[tokio::test]
    async fn test_cancellation_marks_in_flight_probes() {
        let scheduler = WaveScheduler::new(Duration::from_secs(30));
        let token = CancellationToken::new();
        let trigger = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let result = scheduler
            .run_wave(
                1,
                &wide_policy(),
                vec![query("docs"), query("slow")],
                &registry(),
                &token,
            )
            .await
            .unwrap();

        assert_eq!(result.probes[0].status(), ProbeStatus::Succeeded);
        assert_eq!(result.probes[1].status(), ProbeStatus::Cancelled);
        assert!(result.was_cancelled());
        assert!(result.elapsed < Duration::from_secs(5));
    }
}
