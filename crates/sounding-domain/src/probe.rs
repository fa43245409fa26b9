//! Probe module - a single query dispatched to one provider

use crate::{CredibilityTier, DomainError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Unique identifier for a probe based on UUIDv7
///
/// UUIDv7 keeps probe ids chronologically sortable, which makes wave
/// histories read in dispatch order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProbeId(uuid::Uuid);

impl ProbeId {
    /// Generate a new UUIDv7-based ProbeId
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7())
    }

    /// Create a ProbeId from a raw u128 value
    pub fn from_value(value: u128) -> Self {
        Self(uuid::Uuid::from_u128(value))
    }

    /// Get the raw u128 value
    pub fn value(&self) -> u128 {
        self.0.as_u128()
    }
}

impl Default for ProbeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ProbeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Explicit identifier of a registered probe provider
///
/// Providers are always resolved by this key, never by matching free text.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProviderId(String);

impl ProviderId {
    /// Create a provider id
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProviderId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Lifecycle status of a probe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProbeStatus {
    /// Dispatched, not yet resolved
    Pending,
    /// Provider returned a result
    Succeeded,
    /// Provider returned an error
    Failed,
    /// Timeout elapsed before the provider answered
    TimedOut,
    /// Session cancelled while the probe was in flight
    Cancelled,
}

impl ProbeStatus {
    /// Whether the status is final
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ProbeStatus::Pending)
    }

    /// Get the status name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            ProbeStatus::Pending => "pending",
            ProbeStatus::Succeeded => "succeeded",
            ProbeStatus::Failed => "failed",
            ProbeStatus::TimedOut => "timed-out",
            ProbeStatus::Cancelled => "cancelled",
        }
    }
}

/// Errors a provider may report for a single probe
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum ProbeError {
    /// The provider did not answer within the timeout
    #[error("Probe timed out")]
    Timeout,

    /// The provider is throttling requests
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// The provider rejected our credentials
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The provider answered but had nothing for the query
    #[error("No results: {0}")]
    NoResults(String),

    /// The provider is unreachable or failing
    #[error("Provider unavailable: {0}")]
    Unavailable(String),
}

impl ProbeError {
    /// Whether the provider should be considered unusable for the rest of a session
    pub fn disables_provider(&self) -> bool {
        matches!(self, ProbeError::Unauthorized(_))
    }
}

/// Successful result of a probe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeOutcome {
    /// Claim or summary extracted from the result
    pub claim: String,

    /// Citation or source reference (URL, document path, ...)
    pub citation: String,

    /// Tier override; falls back to the provider's default tier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier: Option<CredibilityTier>,

    /// Raw payload, opaque to the orchestrator
    #[serde(default)]
    pub raw: String,
}

impl ProbeOutcome {
    /// Create an outcome with a claim and citation
    pub fn new(claim: impl Into<String>, citation: impl Into<String>) -> Self {
        Self {
            claim: claim.into(),
            citation: citation.into(),
            tier: None,
            raw: String::new(),
        }
    }

    /// Override the credibility tier of this outcome
    pub fn with_tier(mut self, tier: CredibilityTier) -> Self {
        self.tier = Some(tier);
        self
    }

    /// Attach the raw payload
    pub fn with_raw(mut self, raw: impl Into<String>) -> Self {
        self.raw = raw.into();
        self
    }
}

/// A single query dispatched to one provider within a wave
///
/// Created pending by the wave scheduler, resolved exactly once, and
/// immutable afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Probe {
    id: ProbeId,
    query: String,
    topic: String,
    provider: ProviderId,
    wave: u32,
    status: ProbeStatus,
    tier: CredibilityTier,
    outcome: Option<ProbeOutcome>,
    error: Option<ProbeError>,
    elapsed_ms: Option<u64>,
}

impl Probe {
    /// Create a pending probe
    pub fn new(
        query: impl Into<String>,
        topic: impl Into<String>,
        provider: ProviderId,
        wave: u32,
        tier: CredibilityTier,
    ) -> Self {
        Self {
            id: ProbeId::new(),
            query: query.into(),
            topic: topic.into(),
            provider,
            wave,
            status: ProbeStatus::Pending,
            tier,
            outcome: None,
            error: None,
            elapsed_ms: None,
        }
    }

    /// Probe identifier
    pub fn id(&self) -> ProbeId {
        self.id
    }

    /// Query text
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Agenda topic this probe investigates
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Provider the probe was dispatched to
    pub fn provider(&self) -> &ProviderId {
        &self.provider
    }

    /// Wave ordinal (1-based)
    pub fn wave(&self) -> u32 {
        self.wave
    }

    /// Current status
    pub fn status(&self) -> ProbeStatus {
        self.status
    }

    /// Effective credibility tier
    pub fn tier(&self) -> CredibilityTier {
        self.tier
    }

    /// Result payload, present once succeeded
    pub fn outcome(&self) -> Option<&ProbeOutcome> {
        self.outcome.as_ref()
    }

    /// Error, present once failed or timed out
    pub fn error(&self) -> Option<&ProbeError> {
        self.error.as_ref()
    }

    /// Time from dispatch to resolution
    pub fn elapsed(&self) -> Option<Duration> {
        self.elapsed_ms.map(Duration::from_millis)
    }

    /// Record a successful result
    pub fn succeed(&mut self, outcome: ProbeOutcome, elapsed: Duration) -> Result<(), DomainError> {
        self.ensure_pending()?;
        if let Some(tier) = outcome.tier {
            self.tier = tier;
        }
        self.outcome = Some(outcome);
        self.finish(ProbeStatus::Succeeded, elapsed);
        Ok(())
    }

    /// Record a provider error; [`ProbeError::Timeout`] maps to `TimedOut`
    pub fn fail(&mut self, error: ProbeError, elapsed: Duration) -> Result<(), DomainError> {
        self.ensure_pending()?;
        let status = if error == ProbeError::Timeout {
            ProbeStatus::TimedOut
        } else {
            ProbeStatus::Failed
        };
        self.error = Some(error);
        self.finish(status, elapsed);
        Ok(())
    }

    /// Record cancellation of an in-flight probe
    pub fn cancel(&mut self, elapsed: Duration) -> Result<(), DomainError> {
        self.ensure_pending()?;
        self.finish(ProbeStatus::Cancelled, elapsed);
        Ok(())
    }

    fn ensure_pending(&self) -> Result<(), DomainError> {
        if self.status.is_terminal() {
            return Err(DomainError::invalid(format!(
                "probe {} is already {}",
                self.id,
                self.status.as_str()
            )));
        }
        Ok(())
    }

    fn finish(&mut self, status: ProbeStatus, elapsed: Duration) {
        self.status = status;
        self.elapsed_ms = Some(elapsed.as_millis() as u64);
    }
}
