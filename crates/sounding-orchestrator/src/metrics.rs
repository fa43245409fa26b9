//! Metrics collected while a session runs

use crate::aggregator::MergeSummary;
use crate::scheduler::WaveResult;
use serde::{Deserialize, Serialize};
use sounding_domain::{ProbeStatus, ProviderId};

/// Counters for one research session
///
/// Tracks probes by terminal status, evidence merge activity and providers
/// disabled along the way.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionMetrics {
    /// Waves dispatched, including aborted ones
    pub waves_dispatched: u32,

    /// Waves in which no probe succeeded
    pub waves_aborted: u32,

    /// Probes dispatched across all waves
    pub probes_dispatched: usize,

    /// Probes that returned an outcome
    pub probes_succeeded: usize,

    /// Probes that failed with a provider error
    pub probes_failed: usize,

    /// Probes that ran out of time
    pub probes_timed_out: usize,

    /// Probes stopped by cancellation
    pub probes_cancelled: usize,

    /// Evidence items created
    pub evidence_created: usize,

    /// Evidence items replaced by a higher-tier duplicate
    pub evidence_superseded: usize,

    /// Corroboration records appended
    pub corroborations: usize,

    /// Providers disabled after refusing access
    pub disabled_providers: Vec<ProviderId>,

    /// Wall time of the whole run (milliseconds)
    pub total_runtime_ms: u64,
}

impl SessionMetrics {
    /// Create new empty metrics
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a completed wave
    pub fn record_wave(&mut self, wave: &WaveResult) {
        self.waves_dispatched += 1;
        if wave.aborted().is_some() {
            self.waves_aborted += 1;
        }
        for probe in &wave.probes {
            self.probes_dispatched += 1;
            match probe.status() {
                ProbeStatus::Succeeded => self.probes_succeeded += 1,
                ProbeStatus::Failed => self.probes_failed += 1,
                ProbeStatus::TimedOut => self.probes_timed_out += 1,
                ProbeStatus::Cancelled => self.probes_cancelled += 1,
                ProbeStatus::Pending => {}
            }
        }
    }

    /// Record the result of merging a wave
    pub fn record_merge(&mut self, merge: &MergeSummary) {
        self.evidence_created += merge.created;
        self.evidence_superseded += merge.superseded;
        self.corroborations += merge.corroborated;
    }

    /// Record a disabled provider
    pub fn record_disabled(&mut self, provider: ProviderId) {
        if !self.disabled_providers.contains(&provider) {
            self.disabled_providers.push(provider);
        }
    }

    /// Fraction of dispatched probes that succeeded
    pub fn success_rate(&self) -> f64 {
        if self.probes_dispatched == 0 {
            0.0
        } else {
            self.probes_succeeded as f64 / self.probes_dispatched as f64
        }
    }

    /// Generate a summary report of metrics
    pub fn summary(&self) -> String {
        let mut lines = vec![
            "Session Metrics Summary".to_string(),
            "=======================".to_string(),
            format!(
                "Waves: {} ({} aborted)",
                self.waves_dispatched, self.waves_aborted
            ),
            format!("Total runtime: {}ms", self.total_runtime_ms),
            String::new(),
            "Probes:".to_string(),
            format!("  Dispatched: {}", self.probes_dispatched),
            format!("  Succeeded: {}", self.probes_succeeded),
            format!("  Failed: {}", self.probes_failed),
            format!("  Timed out: {}", self.probes_timed_out),
            format!("  Cancelled: {}", self.probes_cancelled),
            String::new(),
            "Evidence:".to_string(),
            format!("  Created: {}", self.evidence_created),
            format!("  Superseded: {}", self.evidence_superseded),
            format!("  Corroborations: {}", self.corroborations),
        ];

        if !self.disabled_providers.is_empty() {
            lines.push(String::new());
            lines.push("Disabled providers:".to_string());
            for provider in &self.disabled_providers {
                lines.push(format!("  {}", provider));
            }
        }

        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sounding_domain::{CredibilityTier, Probe, ProbeError, ProbeOutcome};
    use std::time::Duration;

    fn probe(provider: &str) -> Probe {
        Probe::new("q", "topic", ProviderId::new(provider), 1, CredibilityTier::Medium)
    }

    #[test]
    fn test_metrics_creation() {
        let metrics = SessionMetrics::new();
        assert_eq!(metrics.waves_dispatched, 0);
        assert_eq!(metrics.probes_dispatched, 0);
        assert_eq!(metrics.success_rate(), 0.0);
    }

    #[test]
    fn test_record_wave() {
        let mut ok = probe("a");
        ok.succeed(ProbeOutcome::new("c", "u"), Duration::from_millis(3))
            .unwrap();
        let mut slow = probe("b");
        slow.fail(ProbeError::Timeout, Duration::from_millis(9)).unwrap();
        let mut gone = probe("c");
        gone.cancel(Duration::from_millis(1)).unwrap();

        let wave = WaveResult {
            wave: 1,
            probes: vec![ok, slow, gone],
            elapsed: Duration::from_millis(9),
        };

        let mut metrics = SessionMetrics::new();
        metrics.record_wave(&wave);

        assert_eq!(metrics.waves_dispatched, 1);
        assert_eq!(metrics.waves_aborted, 0);
        assert_eq!(metrics.probes_dispatched, 3);
        assert_eq!(metrics.probes_succeeded, 1);
        assert_eq!(metrics.probes_timed_out, 1);
        assert_eq!(metrics.probes_cancelled, 1);
    }

    #[test]
    fn test_record_aborted_wave() {
        let mut failed = probe("a");
        failed
            .fail(ProbeError::Unavailable("down".into()), Duration::ZERO)
            .unwrap();
        let wave = WaveResult {
            wave: 1,
            probes: vec![failed],
            elapsed: Duration::ZERO,
        };

        let mut metrics = SessionMetrics::new();
        metrics.record_wave(&wave);
        assert_eq!(metrics.waves_aborted, 1);
        assert_eq!(metrics.probes_failed, 1);
    }

    #[test]
    fn test_record_disabled_once() {
        let mut metrics = SessionMetrics::new();
        metrics.record_disabled(ProviderId::new("web"));
        metrics.record_disabled(ProviderId::new("web"));
        assert_eq!(metrics.disabled_providers.len(), 1);
    }

    #[test]
    fn test_summary() {
        let mut metrics = SessionMetrics::new();
        metrics.waves_dispatched = 2;
        metrics.probes_dispatched = 6;
        metrics.evidence_created = 4;
        metrics.total_runtime_ms = 120;
        metrics.record_disabled(ProviderId::new("paywalled"));

        let summary = metrics.summary();
        assert!(summary.contains("Waves: 2 (0 aborted)"));
        assert!(summary.contains("Total runtime: 120ms"));
        assert!(summary.contains("Created: 4"));
        assert!(summary.contains("paywalled"));
    }
}
