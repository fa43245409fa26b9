//! Gate command implementation.

use crate::cli::GateArgs;
use crate::error::Result;
use crate::output::Formatter;
use sounding_gatekeeper::{ReadinessAssessment, ReadinessChecklist, ReadinessConfig, ReadinessGate};
use std::fs;

/// Execute the gate command.
pub fn execute_gate(args: GateArgs, formatter: &Formatter) -> Result<()> {
    let assessment = assess(&args)?;
    println!("{}", formatter.format_assessment(&assessment)?);
    Ok(())
}

/// Load the checklist and scoring config named by the arguments and evaluate.
pub fn assess(args: &GateArgs) -> Result<ReadinessAssessment> {
    let config = match &args.weights {
        Some(path) => ReadinessConfig::from_toml(&fs::read_to_string(path)?)?,
        None => args.preset.into(),
    };
    let checklist = ReadinessChecklist::from_toml(&fs::read_to_string(&args.checklist)?)?;

    let gate = ReadinessGate::new(config)?;
    Ok(gate.evaluate(&checklist)?)
}
