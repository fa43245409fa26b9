//! Depth command implementation.

use crate::cli::DepthArgs;
use crate::error::Result;
use crate::output::Formatter;
use sounding_domain::DepthLevel;

/// Execute the depth command.
pub fn execute_depth(args: DepthArgs, formatter: &Formatter) -> Result<()> {
    println!("{}", render_depth(&args, formatter)?);
    Ok(())
}

fn render_depth(args: &DepthArgs, formatter: &Formatter) -> Result<String> {
    let levels = match &args.level {
        Some(name) => vec![name.parse::<DepthLevel>()?],
        None => DepthLevel::ALL.to_vec(),
    };
    formatter.format_depth(&levels)
}
