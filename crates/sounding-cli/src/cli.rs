//! CLI command definitions and argument parsing.

use clap::{Parser, Subcommand};

/// Sounding - adaptive evidence gathering and readiness gating.
#[derive(Debug, Parser)]
#[command(name = "sounding")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path (defaults to ~/.sounding/config.toml)
    #[arg(short, long, global = true, env = "SOUNDING_CONFIG")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
    /// Quiet format (decision only)
    Quiet,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show probe budgets for the depth levels
    Depth(DepthArgs),

    /// Score a readiness checklist
    Gate(GateArgs),

    /// Run a research session from a plan file
    Research(ResearchArgs),
}

/// Arguments for the depth command.
#[derive(Debug, Parser)]
pub struct DepthArgs {
    /// Depth level to show (all levels if omitted)
    pub level: Option<String>,
}

/// Arguments for the gate command.
#[derive(Debug, Parser)]
pub struct GateArgs {
    /// TOML checklist file
    pub checklist: String,

    /// Scoring preset
    #[arg(short, long, value_enum, default_value = "default")]
    pub preset: GatePreset,

    /// TOML file with custom weights and credit (overrides the preset)
    #[arg(long)]
    pub weights: Option<String>,
}

/// Arguments for the research command.
#[derive(Debug, Parser)]
pub struct ResearchArgs {
    /// TOML research plan (topics and providers)
    pub plan: String,

    /// Depth level (overrides the plan and the config file)
    #[arg(short, long)]
    pub depth: Option<String>,

    /// Per-probe timeout in milliseconds
    #[arg(short, long)]
    pub timeout_ms: Option<u64>,
}

/// Readiness scoring presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum GatePreset {
    /// Partial checks earn half their weight
    Default,
    /// Partial checks earn three quarters of their weight
    Lenient,
    /// Partial checks earn a quarter of their weight
    Strict,
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
            CliFormat::Quiet => crate::config::OutputFormat::Quiet,
        }
    }
}

impl From<GatePreset> for sounding_gatekeeper::ReadinessConfig {
    fn from(preset: GatePreset) -> Self {
        match preset {
            GatePreset::Default => sounding_gatekeeper::ReadinessConfig::default(),
            GatePreset::Lenient => sounding_gatekeeper::ReadinessConfig::lenient(),
            GatePreset::Strict => sounding_gatekeeper::ReadinessConfig::strict(),
        }
    }
}
