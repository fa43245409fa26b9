//! Scripted provider for deterministic tests and offline runs

use async_trait::async_trait;
use sounding_domain::{ProbeError, ProbeOutcome, ProbeProvider};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

#[derive(Debug, Clone)]
enum Scripted {
    Answer(ProbeOutcome),
    Error(ProbeError),
}

#[derive(Debug, Default)]
struct Script {
    responses: HashMap<String, Scripted>,
    latencies: HashMap<String, Duration>,
    calls: Vec<String>,
}

/// Scripted provider returning pre-configured answers without any I/O
///
/// Unknown queries answer with [`ProbeError::NoResults`] unless a fallback
/// is set. Latency can be simulated globally or per query; by default the
/// provider honors the timeout it is given, and `ignoring_timeout` turns that
/// off to exercise the scheduler's own timeout.
///
/// Clones share the same script and call log.
///
/// # Examples
///
/// ```
/// use sounding_probe::FixtureProvider;
/// use sounding_domain::{ProbeError, ProbeOutcome};
///
/// let mut provider = FixtureProvider::default();
/// provider.answer("q1", ProbeOutcome::new("answer", "fixture://q1"));
/// provider.fail("q2", ProbeError::RateLimited("try later".into()));
/// assert_eq!(provider.call_count(), 0);
/// ```
#[derive(Debug, Clone)]
pub struct FixtureProvider {
    script: Arc<Mutex<Script>>,
    fallback: Option<ProbeOutcome>,
    latency: Duration,
    honor_timeout: bool,
}

impl FixtureProvider {
    /// Create a provider that answers every unknown query with `fallback`
    pub fn new(fallback: ProbeOutcome) -> Self {
        Self {
            fallback: Some(fallback),
            ..Self::empty()
        }
    }

    /// Create a provider with no scripted answers
    pub fn empty() -> Self {
        Self {
            script: Arc::new(Mutex::new(Script::default())),
            fallback: None,
            latency: Duration::ZERO,
            honor_timeout: true,
        }
    }

    /// Script an answer for a query
    pub fn answer(&mut self, query: impl Into<String>, outcome: ProbeOutcome) {
        self.lock()
            .responses
            .insert(query.into(), Scripted::Answer(outcome));
    }

    /// Script an error for a query
    pub fn fail(&mut self, query: impl Into<String>, error: ProbeError) {
        self.lock()
            .responses
            .insert(query.into(), Scripted::Error(error));
    }

    /// Delay every answer by `latency`
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Delay answers to one query by `latency`
    pub fn delay(&mut self, query: impl Into<String>, latency: Duration) {
        self.lock().latencies.insert(query.into(), latency);
    }

    /// Keep sleeping past the supplied timeout, like a misbehaving provider
    pub fn ignoring_timeout(mut self) -> Self {
        self.honor_timeout = false;
        self
    }

    /// Number of executed queries
    pub fn call_count(&self) -> usize {
        self.lock().calls.len()
    }

    /// Queries executed so far, in call order
    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    /// Reset the call log
    pub fn reset_calls(&self) {
        self.lock().calls.clear();
    }

    fn lock(&self) -> MutexGuard<'_, Script> {
        // A panicking test thread must not wedge the other probes
        self.script.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for FixtureProvider {
    fn default() -> Self {
        Self::empty()
    }
}

#[async_trait]
impl ProbeProvider for FixtureProvider {
    async fn execute(&self, query: &str, timeout: Duration) -> Result<ProbeOutcome, ProbeError> {
        let (scripted, latency) = {
            let mut script = self.lock();
            script.calls.push(query.to_string());
            let latency = script
                .latencies
                .get(query)
                .copied()
                .unwrap_or(self.latency);
            (script.responses.get(query).cloned(), latency)
        };

        if !latency.is_zero() {
            if self.honor_timeout && latency > timeout {
                tokio::time::sleep(timeout).await;
                return Err(ProbeError::Timeout);
            }
            tokio::time::sleep(latency).await;
        }

        match scripted {
            Some(Scripted::Answer(outcome)) => Ok(outcome),
            Some(Scripted::Error(error)) => Err(error),
            None => self
                .fallback
                .clone()
                .ok_or_else(|| ProbeError::NoResults(format!("no fixture for '{}'", query))),
        }
    }
}
