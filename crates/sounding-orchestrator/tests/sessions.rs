//! End-to-end session runs against scripted providers

use async_trait::async_trait;
use sounding_domain::{
    CredibilityTier, CriteriaSet, Decision, DepthLevel, GapReason, ProbeError, ProbeOutcome,
    ProbeProvider, ProviderId,
};
use sounding_orchestrator::{OrchestratorConfig, Session, SessionRunner, SessionState, StopReason};
use sounding_probe::{FixtureProvider, ProviderRegistry};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn answering(claim: &str, citation: &str) -> FixtureProvider {
    FixtureProvider::new(ProbeOutcome::new(claim, citation))
}

fn runner(registry: ProviderRegistry) -> SessionRunner {
    SessionRunner::new(registry, OrchestratorConfig::default()).unwrap()
}

/// Fails every call until `failures` calls have been made
struct RecoversAfter {
    failures: usize,
    calls: AtomicUsize,
}

#[async_trait]
impl ProbeProvider for RecoversAfter {
    async fn execute(&self, _query: &str, _timeout: Duration) -> Result<ProbeOutcome, ProbeError> {
        if self.calls.fetch_add(1, Ordering::SeqCst) < self.failures {
            Err(ProbeError::Unavailable("warming up".into()))
        } else {
            Ok(ProbeOutcome::new("1.47", "https://docs.example/version"))
        }
    }
}

/// Answers one query after refusing it `refusals` times; knows nothing else
struct Throttled {
    query: &'static str,
    claim: &'static str,
    refusals: usize,
    calls: AtomicUsize,
}

impl Throttled {
    fn new(query: &'static str, claim: &'static str, refusals: usize) -> Self {
        Self {
            query,
            claim,
            refusals,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ProbeProvider for Throttled {
    async fn execute(&self, query: &str, _timeout: Duration) -> Result<ProbeOutcome, ProbeError> {
        if query != self.query {
            return Err(ProbeError::NoResults(format!("nothing on '{}'", query)));
        }
        if self.calls.fetch_add(1, Ordering::SeqCst) < self.refusals {
            Err(ProbeError::RateLimited("slow down".into()))
        } else {
            Ok(ProbeOutcome::new(self.claim, "https://mirror.example"))
        }
    }
}

#[tokio::test]
async fn test_quick_session_with_agreeing_official_sources_succeeds() {
    let registry = ProviderRegistry::new()
        .with("docs", CredibilityTier::Official, Arc::new(answering("MIT", "https://docs.example")))
        .unwrap()
        .with("repo", CredibilityTier::Official, Arc::new(answering("MIT", "https://repo.example")))
        .unwrap();

    let mut session = Session::create(DepthLevel::Quick, CriteriaSet::research_default());
    session.investigate("license", "tokio license").unwrap();

    let report = runner(registry).run(&mut session).await.unwrap();

    assert_eq!(report.final_state, SessionState::Succeeded);
    assert_eq!(report.stop_reason, StopReason::TargetReached);
    assert_eq!(report.waves_used, 1);
    assert!(report.score.value >= 0.90);
    assert_eq!(report.decision, Decision::Proceed);
    assert!(!report.inconclusive);
    assert_eq!(report.metrics.probes_dispatched, 2);
    assert_eq!(report.active_evidence().count(), 1);
    assert_eq!(report.evidence[0].corroborations, 1);
}

#[tokio::test]
async fn test_wave_identical_duplicates_stop_early() {
    let mut registry = ProviderRegistry::new();
    for id in ["blog", "forum", "wiki"] {
        let mut provider = FixtureProvider::empty();
        provider.answer("tokio version", ProbeOutcome::new("1.47", format!("https://{}.example", id)));
        registry
            .register(id.into(), CredibilityTier::Medium, Arc::new(provider))
            .unwrap();
    }

    let mut session = Session::create(DepthLevel::Standard, CriteriaSet::research_default());
    session.investigate("version", "tokio version").unwrap();
    session.investigate("msrv", "tokio msrv").unwrap();

    let report = runner(registry).run(&mut session).await.unwrap();

    assert_eq!(report.final_state, SessionState::Exhausted);
    assert_eq!(report.stop_reason, StopReason::DiminishingReturns);
    assert_eq!(report.waves_used, 1);
    assert_eq!(session.policy().max_waves, 2);
    assert!((report.score.value - 0.6).abs() < 1e-9);
    assert_eq!(report.metrics.probes_dispatched, 5);
    assert_eq!(report.metrics.evidence_created, 1);
    assert_eq!(report.metrics.corroborations, 2);
    assert_eq!(report.unresolved_gaps.len(), 1);
    assert_eq!(report.unresolved_gaps[0].topic, "msrv");
}

#[tokio::test]
async fn test_agreed_answer_in_later_wave_keeps_session_going() {
    let mut docs = FixtureProvider::empty();
    docs.answer("tokio version", ProbeOutcome::new("1.47", "https://docs.example"));
    let registry = ProviderRegistry::new()
        .with("blog", CredibilityTier::Low, Arc::new(Throttled::new("tokio msrv", "1.70", 1)))
        .unwrap()
        .with("docs", CredibilityTier::Official, Arc::new(docs))
        .unwrap()
        .with("forum", CredibilityTier::Low, Arc::new(Throttled::new("tokio msrv", "1.70", 1)))
        .unwrap()
        .with("registry", CredibilityTier::High, Arc::new(Throttled::new("tokio msrv", "1.70", 2)))
        .unwrap();

    let mut session = Session::create(DepthLevel::Deep, CriteriaSet::research_default());
    session.investigate("version", "tokio version").unwrap();
    session.investigate("msrv", "tokio msrv").unwrap();

    let report = runner(registry).run(&mut session).await.unwrap();

    // wave 2 answers msrv through two agreeing low-tier sources, which is
    // new ground even though both gave the same claim
    let second = &session.waves()[1];
    assert_eq!(second.merge.created, 1);
    assert_eq!(second.merge.corroborated, 1);
    assert_eq!(second.merge.fresh, 1);

    assert_eq!(report.final_state, SessionState::Succeeded);
    assert_eq!(report.stop_reason, StopReason::TargetReached);
    assert_eq!(report.waves_used, 3);
    assert!(report.score.value >= 0.85);
    assert_eq!(report.metrics.evidence_superseded, 1);
}

#[tokio::test]
async fn test_cancellation_mid_wave_aborts_with_partial_evidence() {
    let slow = answering("1.47", "https://slow.example").with_latency(Duration::from_secs(10));
    let registry = ProviderRegistry::new()
        .with("fast", CredibilityTier::High, Arc::new(answering("1.47", "https://fast.example")))
        .unwrap()
        .with("slow", CredibilityTier::Official, Arc::new(slow))
        .unwrap();

    let mut session = Session::create(DepthLevel::Quick, CriteriaSet::research_default());
    session.investigate("version", "tokio version").unwrap();

    let handle = session.canceller();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        handle.cancel();
    });

    let report = runner(registry).run(&mut session).await.unwrap();

    assert_eq!(report.final_state, SessionState::Aborted);
    assert_eq!(report.stop_reason, StopReason::Cancelled);
    assert!(report.inconclusive);
    assert_eq!(report.metrics.probes_succeeded, 1);
    assert_eq!(report.metrics.probes_cancelled, 1);
    assert_eq!(report.evidence.len(), 1);
    assert_eq!(report.evidence[0].citation, "https://fast.example");
    assert!(report.metrics.total_runtime_ms < 10_000);
}

#[tokio::test]
async fn test_conflicting_claims_run_to_wave_limit() {
    let mut registry = ProviderRegistry::new();
    for n in 1..=7 {
        let provider = answering(&format!("1.4{}", n), "https://forum.example");
        registry
            .register(ProviderId::new(format!("l{}", n)), CredibilityTier::Low, Arc::new(provider))
            .unwrap();
    }

    let mut session = Session::create(DepthLevel::Standard, CriteriaSet::research_default());
    session.investigate("version", "tokio version").unwrap();

    let report = runner(registry).run(&mut session).await.unwrap();

    assert_eq!(report.final_state, SessionState::Exhausted);
    assert_eq!(report.stop_reason, StopReason::WaveLimit);
    assert_eq!(report.waves_used, 2);
    assert_eq!(report.metrics.evidence_created, 7);
    assert!(report
        .unresolved_gaps
        .iter()
        .any(|gap| gap.is_unresolved_contradiction()));

    // the second wave only asked providers not yet heard from
    let second: Vec<&str> = session.waves()[1]
        .probes
        .iter()
        .map(|p| p.provider().as_str())
        .collect();
    assert!(second.iter().all(|p| *p == "l6" || *p == "l7"));
}

#[tokio::test]
async fn test_aborted_wave_is_retried() {
    let provider = RecoversAfter {
        failures: 3,
        calls: AtomicUsize::new(0),
    };
    let registry = ProviderRegistry::new()
        .with("docs", CredibilityTier::Official, Arc::new(provider))
        .unwrap();

    let mut session = Session::create(DepthLevel::Standard, CriteriaSet::research_default());
    session.investigate("version", "tokio version").unwrap();

    let report = runner(registry).run(&mut session).await.unwrap();

    assert_eq!(report.final_state, SessionState::Succeeded);
    assert_eq!(report.waves_used, 2);
    assert_eq!(report.metrics.waves_aborted, 1);
    assert!(session.waves()[0].aborted);
    assert!(!session.waves()[1].aborted);
}

#[tokio::test]
async fn test_repeated_wave_failure_aborts() {
    let mut down = FixtureProvider::empty();
    down.fail("tokio version", ProbeError::Unavailable("503".into()));
    let registry = ProviderRegistry::new()
        .with("docs", CredibilityTier::Official, Arc::new(down))
        .unwrap();

    let mut session = Session::create(DepthLevel::Standard, CriteriaSet::research_default());
    session.investigate("version", "tokio version").unwrap();

    let report = runner(registry).run(&mut session).await.unwrap();

    assert_eq!(report.final_state, SessionState::Aborted);
    assert_eq!(report.stop_reason, StopReason::RepeatedWaveFailure);
    assert!(report.inconclusive);
    assert_eq!(report.waves_used, 2);
    assert_eq!(report.score.value, 0.0);
    assert_eq!(report.decision, Decision::Stop);
}

#[tokio::test]
async fn test_tolerant_config_exhausts_instead_of_aborting() {
    let mut down = FixtureProvider::empty();
    down.fail("tokio version", ProbeError::Timeout);
    let registry = ProviderRegistry::new()
        .with("docs", CredibilityTier::Official, Arc::new(down))
        .unwrap();
    let config = OrchestratorConfig {
        max_consecutive_aborts: 3,
        ..OrchestratorConfig::default()
    };

    let mut session = Session::create(DepthLevel::Standard, CriteriaSet::research_default());
    session.investigate("version", "tokio version").unwrap();

    let report = SessionRunner::new(registry, config)
        .unwrap()
        .run(&mut session)
        .await
        .unwrap();

    assert_eq!(report.final_state, SessionState::Exhausted);
    assert_eq!(report.stop_reason, StopReason::WaveLimit);
    assert_eq!(report.metrics.probes_timed_out, 6);
}

#[tokio::test]
async fn test_no_providers_aborts_without_waves() {
    let mut session = Session::create(DepthLevel::Standard, CriteriaSet::research_default());
    session.investigate("version", "tokio version").unwrap();
    session.investigate("msrv", "tokio msrv").unwrap();

    let report = runner(ProviderRegistry::new()).run(&mut session).await.unwrap();

    assert_eq!(report.final_state, SessionState::Aborted);
    assert_eq!(report.stop_reason, StopReason::NoUsableProviders);
    assert_eq!(report.waves_used, 0);
    assert!(report.evidence.is_empty());

    // nothing was asked, so every topic is still missing
    let missing: Vec<&str> = report.unresolved_gaps.iter().map(|g| g.topic.as_str()).collect();
    assert_eq!(missing, vec!["version", "msrv"]);
    assert!(report
        .unresolved_gaps
        .iter()
        .all(|g| g.reason == GapReason::Unanswered));
}

#[tokio::test]
async fn test_unauthorized_provider_is_disabled() {
    let mut locked = FixtureProvider::empty();
    locked.fail("tokio version", ProbeError::Unauthorized("missing key".into()));
    let registry = ProviderRegistry::new()
        .with("docs", CredibilityTier::Official, Arc::new(answering("1.47", "https://docs.example")))
        .unwrap()
        .with("search", CredibilityTier::High, Arc::new(locked))
        .unwrap();

    let mut session = Session::create(DepthLevel::Standard, CriteriaSet::research_default());
    session.investigate("version", "tokio version").unwrap();

    let report = runner(registry).run(&mut session).await.unwrap();

    assert!(report.succeeded());
    assert_eq!(report.metrics.disabled_providers.len(), 1);
    assert_eq!(report.metrics.disabled_providers[0].as_str(), "search");
}

#[tokio::test]
async fn test_all_providers_unauthorized() {
    let mut locked = FixtureProvider::empty();
    locked.fail("tokio version", ProbeError::Unauthorized("expired token".into()));
    let registry = ProviderRegistry::new()
        .with("search", CredibilityTier::High, Arc::new(locked))
        .unwrap();

    let mut session = Session::create(DepthLevel::Standard, CriteriaSet::research_default());
    session.investigate("version", "tokio version").unwrap();

    let report = runner(registry).run(&mut session).await.unwrap();

    assert_eq!(report.final_state, SessionState::Aborted);
    assert_eq!(report.stop_reason, StopReason::NoUsableProviders);
    assert_eq!(report.waves_used, 1);
}

#[tokio::test]
async fn test_higher_tier_duplicate_supersedes_in_report() {
    let registry = ProviderRegistry::new()
        .with("a-forum", CredibilityTier::Low, Arc::new(answering("1.47", "https://forum.example")))
        .unwrap()
        .with("b-docs", CredibilityTier::Official, Arc::new(answering("1.47", "https://docs.example")))
        .unwrap();

    let mut session = Session::create(DepthLevel::Quick, CriteriaSet::research_default());
    session.investigate("version", "tokio version").unwrap();

    let report = runner(registry).run(&mut session).await.unwrap();

    assert!(report.succeeded());
    assert_eq!(report.metrics.evidence_superseded, 1);
    assert_eq!(report.evidence.len(), 2);

    let old = &report.evidence[0];
    let new = &report.evidence[1];
    assert!(old.superseded);
    assert_eq!(old.tier, CredibilityTier::Low);
    assert_eq!(old.superseded_by, Some(new.id));
    assert!(!new.superseded);
    assert_eq!(new.tier, CredibilityTier::Official);
    assert_eq!(new.supporting_probes.len(), 2);
}

#[tokio::test]
async fn test_report_serializes_to_json() {
    let registry = ProviderRegistry::new()
        .with("docs", CredibilityTier::Official, Arc::new(answering("MIT", "https://docs.example")))
        .unwrap();
    let mut session = Session::create(DepthLevel::Quick, CriteriaSet::research_default());
    session.investigate("license", "tokio license").unwrap();

    let report = runner(registry).run(&mut session).await.unwrap();
    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(json["final_state"], "succeeded");
    assert_eq!(json["stop_reason"], "target-reached");
    assert_eq!(json["inconclusive"], false);
    assert_eq!(json["evidence"][0]["claim"], "MIT");
    assert!(json["evidence"][0].get("superseded_by").is_none());
    assert_eq!(json["session_id"], session.id().to_string());
}

#[tokio::test]
async fn test_runner_is_reusable_across_sessions() {
    let registry = ProviderRegistry::new()
        .with("docs", CredibilityTier::Official, Arc::new(answering("MIT", "https://docs.example")))
        .unwrap();
    let runner = runner(registry);

    let mut first = Session::create(DepthLevel::Quick, CriteriaSet::research_default());
    first.investigate("license", "tokio license").unwrap();
    let mut second = Session::create(DepthLevel::Quick, CriteriaSet::research_default());
    second.investigate("license", "tokio license").unwrap();

    let (a, b) = tokio::join!(runner.run(&mut first), runner.run(&mut second));
    let (a, b) = (a.unwrap(), b.unwrap());
    assert!(a.succeeded() && b.succeeded());
    assert_ne!(a.session_id, b.session_id);
}
