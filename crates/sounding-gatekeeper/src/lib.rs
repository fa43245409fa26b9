//! Sounding Gatekeeper
//!
//! Standalone pre-action readiness gate. Before acting on a plan, the caller
//! fills in a five-item checklist and the gate turns it into a weighted
//! confidence score and a go/no-go decision, using the same scoring engine
//! as research sessions.
//!
//! The gate checks:
//! - Prior art (has this been solved before?)
//! - Architectural fit
//! - Documentation verification
//! - Reference implementation verification
//! - Root cause verification
//!
//! # Examples
//!
//! ```
//! use sounding_gatekeeper::{ReadinessChecklist, ReadinessConfig, ReadinessGate};
//! use sounding_domain::{Decision, Outcome};
//!
//! let gate = ReadinessGate::new(ReadinessConfig::default()).unwrap();
//! let checklist = ReadinessChecklist::all(Outcome::Pass);
//!
//! let assessment = gate.evaluate(&checklist).unwrap();
//! assert_eq!(assessment.decision, Decision::Proceed);
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod gate;

pub use config::{ReadinessConfig, ReadinessWeights};
pub use error::GatekeeperError;
pub use gate::{Concern, ReadinessAssessment, ReadinessCheck, ReadinessChecklist, ReadinessGate};
