//! Trait definitions for external interactions
//!
//! These traits define the boundary between domain logic and the outside
//! world. Implementations live in other crates.

use crate::{ProbeError, ProbeOutcome};
use async_trait::async_trait;
use std::time::Duration;

/// Capability contract for any external information source
///
/// Implemented by the infrastructure layer (sounding-probe). Providers are
/// interchangeable from the scheduler's point of view: search engines,
/// documentation indexes and direct fetchers all expose the same `execute`.
///
/// A provider must honor the supplied timeout. The scheduler still enforces
/// its own timeout around every call, so a provider that overruns is cut off.
#[async_trait]
pub trait ProbeProvider: Send + Sync {
    /// Run a single query
    async fn execute(&self, query: &str, timeout: Duration) -> Result<ProbeOutcome, ProbeError>;
}
