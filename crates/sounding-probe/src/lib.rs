//! Sounding Probe Providers
//!
//! Pluggable implementations of the `ProbeProvider` trait from
//! `sounding-domain`, plus the typed registry the orchestrator resolves
//! providers from.
//!
//! # Providers
//!
//! - `FixtureProvider`: Deterministic scripted provider for tests and offline runs
//! - `FetchProvider`: Direct HTTP fetch of a URL query
//!
//! # Examples
//!
//! ```
//! use sounding_probe::{FixtureProvider, ProviderRegistry};
//! use sounding_domain::{CredibilityTier, ProbeOutcome, ProviderId};
//! use std::sync::Arc;
//!
//! let mut docs = FixtureProvider::default();
//! docs.answer("tokio version", ProbeOutcome::new("1.47", "https://docs.rs/tokio"));
//!
//! let mut registry = ProviderRegistry::new();
//! registry
//!     .register(ProviderId::new("docs"), CredibilityTier::Official, Arc::new(docs))
//!     .unwrap();
//! assert!(registry.get(&ProviderId::new("docs")).is_some());
//! ```

#![warn(missing_docs)]

pub mod fetch;
pub mod fixture;
pub mod registry;

pub use fetch::FetchProvider;
pub use fixture::FixtureProvider;
pub use registry::{ProviderRegistry, RegisteredProvider};
