//! Typed capability registry keyed by provider id

use sounding_domain::{CredibilityTier, DomainError, ProbeProvider, ProviderId};
use std::collections::BTreeMap;
use std::sync::Arc;

/// A provider together with the tier its results carry by default
#[derive(Clone)]
pub struct RegisteredProvider {
    /// Registry key
    pub id: ProviderId,
    /// Tier applied to outcomes that do not override it
    pub default_tier: CredibilityTier,
    /// The capability itself
    pub provider: Arc<dyn ProbeProvider>,
}

impl std::fmt::Debug for RegisteredProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredProvider")
            .field("id", &self.id)
            .field("default_tier", &self.default_tier)
            .finish_non_exhaustive()
    }
}

/// Registry of probe providers
///
/// Callers resolve providers by explicit [`ProviderId`] before invocation.
/// Iteration order is the id order, which keeps query planning deterministic.
#[derive(Clone, Debug, Default)]
pub struct ProviderRegistry {
    entries: BTreeMap<ProviderId, RegisteredProvider>,
}

impl ProviderRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider under a unique id
    ///
    /// # Errors
    /// Fails with [`DomainError::InvalidConfiguration`] if the id is empty or
    /// already registered.
    pub fn register(
        &mut self,
        id: ProviderId,
        default_tier: CredibilityTier,
        provider: Arc<dyn ProbeProvider>,
    ) -> Result<(), DomainError> {
        if id.as_str().trim().is_empty() {
            return Err(DomainError::invalid("provider id must not be empty"));
        }
        if self.entries.contains_key(&id) {
            return Err(DomainError::invalid(format!(
                "provider '{}' is already registered",
                id
            )));
        }
        tracing::debug!(provider = %id, tier = %default_tier, "registered probe provider");
        self.entries.insert(
            id.clone(),
            RegisteredProvider {
                id,
                default_tier,
                provider,
            },
        );
        Ok(())
    }

    /// Builder-style registration
    pub fn with(
        mut self,
        id: impl Into<ProviderId>,
        default_tier: CredibilityTier,
        provider: Arc<dyn ProbeProvider>,
    ) -> Result<Self, DomainError> {
        self.register(id.into(), default_tier, provider)?;
        Ok(self)
    }

    /// Resolve a provider by id
    pub fn get(&self, id: &ProviderId) -> Option<&RegisteredProvider> {
        self.entries.get(id)
    }

    /// All registered ids, in order
    pub fn ids(&self) -> Vec<ProviderId> {
        self.entries.keys().cloned().collect()
    }

    /// Number of registered providers
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no provider is registered
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
