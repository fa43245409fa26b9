//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use colored::*;
use sounding_domain::{ConfidenceScore, Decision, DepthLevel};
use sounding_gatekeeper::ReadinessAssessment;
use sounding_orchestrator::TerminalReport;
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Format depth level presets.
    pub fn format_depth(&self, levels: &[DepthLevel]) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let presets: Vec<serde_json::Value> = levels
                    .iter()
                    .map(|level| {
                        serde_json::json!({
                            "level": level,
                            "policy": level.policy(),
                        })
                    })
                    .collect();
                Ok(serde_json::to_string_pretty(&presets)?)
            }
            OutputFormat::Quiet => Ok(levels
                .iter()
                .map(|l| l.as_str())
                .collect::<Vec<_>>()
                .join("\n")),
            OutputFormat::Table => {
                let mut builder = Builder::default();
                builder.push_record(["Level", "Probes/Wave", "Max Waves", "Target"]);
                for level in levels {
                    let policy = level.policy();
                    builder.push_record([
                        level.as_str().to_string(),
                        format!("{}-{}", policy.min_probes_per_wave, policy.max_probes_per_wave),
                        policy.max_waves.to_string(),
                        format!("{:.2}", policy.target_confidence),
                    ]);
                }
                Ok(self.render(builder))
            }
        }
    }

    /// Format a readiness assessment.
    pub fn format_assessment(&self, assessment: &ReadinessAssessment) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(assessment)?),
            OutputFormat::Quiet => Ok(assessment.decision.as_str().to_string()),
            OutputFormat::Table => {
                let mut lines = vec![
                    self.score_table(&assessment.score),
                    self.verdict_line(assessment.score.value, assessment.decision),
                ];
                if !assessment.concerns.is_empty() {
                    lines.push(String::new());
                    lines.push("Concerns:".to_string());
                    for concern in &assessment.concerns {
                        let mut line = format!(
                            "  {} ({}, -{:.3})",
                            concern.check.label(),
                            concern.outcome.as_str(),
                            concern.weight_lost
                        );
                        if let Some(note) = &concern.note {
                            line.push_str(&format!(": {}", note));
                        }
                        lines.push(line);
                    }
                }
                Ok(lines.join("\n"))
            }
        }
    }

    /// Format a research session report.
    pub fn format_report(&self, report: &TerminalReport) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(report)?),
            OutputFormat::Quiet => Ok(report.decision.as_str().to_string()),
            OutputFormat::Table => self.format_report_table(report),
        }
    }

    fn format_report_table(&self, report: &TerminalReport) -> Result<String> {
        let mut lines = vec![
            format!("Session {}", report.session_id),
            format!(
                "State: {} ({}) after {} of {} waves",
                report.final_state, report.stop_reason, report.waves_used, report.policy.max_waves
            ),
        ];
        if report.inconclusive {
            lines.push(self.warning("Result is inconclusive"));
        }
        lines.push(String::new());

        if report.evidence.is_empty() {
            lines.push(self.colorize("No evidence gathered.", "yellow"));
        } else {
            let mut builder = Builder::default();
            builder.push_record(["Topic", "Claim", "Tier", "Wave", "Corroborations", "Citation"]);
            for item in report.active_evidence() {
                builder.push_record([
                    item.topic.clone(),
                    item.claim.clone(),
                    item.tier.as_str().to_string(),
                    item.wave.to_string(),
                    item.corroborations.to_string(),
                    item.citation.clone(),
                ]);
            }
            lines.push(self.render(builder));
        }

        if !report.unresolved_gaps.is_empty() {
            lines.push(String::new());
            lines.push("Open gaps:".to_string());
            for gap in &report.unresolved_gaps {
                lines.push(format!("  {} [{}]: {}", gap.topic, gap.reason.as_str(), gap.description));
            }
        }

        lines.push(String::new());
        lines.push(self.score_table(&report.score));
        lines.push(self.verdict_line(report.score.value, report.decision));
        Ok(lines.join("\n"))
    }

    fn score_table(&self, score: &ConfidenceScore) -> String {
        let mut builder = Builder::default();
        builder.push_record(["Criterion", "Weight", "Outcome", "Contribution"]);
        for criterion in &score.breakdown {
            builder.push_record([
                criterion.name.clone(),
                format!("{:.2}", criterion.weight),
                criterion.outcome.as_str().to_string(),
                format!("{:.3}", criterion.contribution),
            ]);
        }
        self.render(builder)
    }

    fn verdict_line(&self, value: f64, decision: Decision) -> String {
        let text = format!("Score {:.3}: {}", value, decision);
        match decision {
            Decision::Proceed => self.success(&text),
            Decision::ProceedWithClarification => self.warning(&text),
            Decision::Stop => self.error(&text),
        }
    }

    fn render(&self, builder: Builder) -> String {
        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));
        table.to_string()
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            _ => text.to_string(),
        }
    }
}
