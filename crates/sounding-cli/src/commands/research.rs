//! Research command implementation.
//!
//! A research plan is a TOML file naming the topics to investigate and the
//! providers to ask:
//!
//! ```toml
//! depth = "standard"
//!
//! [[topics]]
//! key = "license"
//! query = "https://docs.rs/crate/tokio/latest"
//!
//! [[providers]]
//! id = "docs"
//! tier = "official"
//! kind = "fetch"
//!
//! [[providers]]
//! id = "notes"
//! tier = "medium"
//! answers = [{ query = "https://docs.rs/crate/tokio/latest", claim = "MIT", citation = "notes.md" }]
//! ```
//!
//! Providers default to `kind = "fixture"`, which answers from the scripted
//! `answers`, `failures` and `fallback` entries without any I/O.

use crate::cli::ResearchArgs;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use serde::{Deserialize, Serialize};
use sounding_domain::{
    CredibilityTier, CriteriaSet, DepthLevel, ProbeError, ProbeOutcome, ProbeProvider, ProviderId,
};
use sounding_orchestrator::{OrchestratorConfig, Session, SessionRunner, TerminalReport, Topic};
use sounding_probe::{FetchProvider, FixtureProvider, ProviderRegistry};
use std::fs;
use std::sync::Arc;
use std::time::Duration;

/// A research plan loaded from TOML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchPlan {
    /// Depth level, unless overridden on the command line
    #[serde(default)]
    pub depth: Option<DepthLevel>,

    /// Agenda topics, in order
    pub topics: Vec<Topic>,

    /// Providers to register
    #[serde(default)]
    pub providers: Vec<ProviderSpec>,
}

/// How a provider answers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Scripted answers, no I/O
    #[default]
    Fixture,
    /// HTTP GET of the query as a URL
    Fetch,
}

/// One provider entry of a plan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSpec {
    /// Registry id
    pub id: String,

    /// Default credibility tier of its answers
    pub tier: CredibilityTier,

    /// Provider kind
    #[serde(default)]
    pub kind: ProviderKind,

    /// Scripted answers (fixture only)
    #[serde(default)]
    pub answers: Vec<ScriptedAnswer>,

    /// Scripted failures (fixture only)
    #[serde(default)]
    pub failures: Vec<ScriptedFailure>,

    /// Answer for any query not otherwise scripted (fixture only)
    #[serde(default)]
    pub fallback: Option<FallbackAnswer>,

    /// Simulated latency in milliseconds (fixture only)
    #[serde(default)]
    pub latency_ms: u64,
}

/// A scripted answer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptedAnswer {
    /// Query text it answers
    pub query: String,
    /// Claim returned
    pub claim: String,
    /// Citation returned
    pub citation: String,
    /// Tier override for this answer
    #[serde(default)]
    pub tier: Option<CredibilityTier>,
}

/// A scripted failure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptedFailure {
    /// Query text it fails
    pub query: String,
    /// Error kind
    pub error: FailureKind,
    /// Error detail
    #[serde(default)]
    pub message: String,
}

/// Catch-all scripted answer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FallbackAnswer {
    /// Claim returned
    pub claim: String,
    /// Citation returned
    pub citation: String,
}

/// Provider error kinds a fixture can be scripted with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailureKind {
    /// Provider timed out
    Timeout,
    /// Provider throttled the request
    RateLimited,
    /// Provider refused access
    Unauthorized,
    /// Provider had nothing
    NoResults,
    /// Provider was down
    Unavailable,
}

impl ScriptedFailure {
    fn to_error(&self) -> ProbeError {
        let message = self.message.clone();
        match self.error {
            FailureKind::Timeout => ProbeError::Timeout,
            FailureKind::RateLimited => ProbeError::RateLimited(message),
            FailureKind::Unauthorized => ProbeError::Unauthorized(message),
            FailureKind::NoResults => ProbeError::NoResults(message),
            FailureKind::Unavailable => ProbeError::Unavailable(message),
        }
    }
}

impl ProviderSpec {
    fn build(&self) -> Result<Arc<dyn ProbeProvider>> {
        match self.kind {
            ProviderKind::Fetch => {
                if !self.answers.is_empty() || !self.failures.is_empty() || self.fallback.is_some() {
                    return Err(CliError::InvalidInput(format!(
                        "provider '{}' fetches over HTTP and cannot carry scripted answers",
                        self.id
                    )));
                }
                Ok(Arc::new(FetchProvider::new()))
            }
            ProviderKind::Fixture => {
                let mut provider = match &self.fallback {
                    Some(fallback) => FixtureProvider::new(ProbeOutcome::new(
                        fallback.claim.clone(),
                        fallback.citation.clone(),
                    )),
                    None => FixtureProvider::empty(),
                };
                if self.latency_ms > 0 {
                    provider = provider.with_latency(Duration::from_millis(self.latency_ms));
                }
                for answer in &self.answers {
                    let mut outcome = ProbeOutcome::new(answer.claim.clone(), answer.citation.clone());
                    if let Some(tier) = answer.tier {
                        outcome = outcome.with_tier(tier);
                    }
                    provider.answer(answer.query.clone(), outcome);
                }
                for failure in &self.failures {
                    provider.fail(failure.query.clone(), failure.to_error());
                }
                Ok(Arc::new(provider))
            }
        }
    }
}

impl ResearchPlan {
    /// Parse a plan from TOML
    pub fn from_toml(content: &str) -> Result<Self> {
        let plan: Self = toml::from_str(content)?;
        if plan.topics.is_empty() {
            return Err(CliError::InvalidInput("research plan has no topics".to_string()));
        }
        Ok(plan)
    }

    /// Build the provider registry the plan describes
    pub fn registry(&self) -> Result<ProviderRegistry> {
        let mut registry = ProviderRegistry::new();
        for spec in &self.providers {
            registry.register(ProviderId::new(spec.id.clone()), spec.tier, spec.build()?)?;
        }
        Ok(registry)
    }
}

/// Execute the research command.
pub async fn execute_research(args: ResearchArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let plan = ResearchPlan::from_toml(&fs::read_to_string(&args.plan)?)?;
    let depth = match &args.depth {
        Some(name) => name.parse()?,
        None => plan.depth.unwrap_or(config.settings.depth),
    };
    let mut orchestrator = config.orchestrator.clone();
    if let Some(timeout_ms) = args.timeout_ms {
        orchestrator.probe_timeout_ms = timeout_ms;
    }

    let report = run_plan(&plan, depth, orchestrator).await?;
    if report.inconclusive {
        eprintln!("{}", formatter.warning(&format!("Session stopped: {}", report.stop_reason)));
    }
    println!("{}", formatter.format_report(&report)?);
    Ok(())
}

/// Run a plan to completion; Ctrl+C cancels the session
pub async fn run_plan(
    plan: &ResearchPlan,
    depth: DepthLevel,
    config: OrchestratorConfig,
) -> Result<TerminalReport> {
    let runner = SessionRunner::new(plan.registry()?, config)?;
    let mut session = Session::create(depth, CriteriaSet::research_default());
    for topic in &plan.topics {
        session.investigate(topic.key.clone(), topic.query.clone())?;
    }

    let handle = session.canceller();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling session");
            handle.cancel();
        }
    });

    let report = runner.run(&mut session).await;
    interrupt.abort();
    Ok(report?)
}
