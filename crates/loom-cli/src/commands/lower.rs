//! `loom lower` - lower a unit and print its definitions.

use super::{read_unit, OutputFormat};
use anyhow::{Context, Result};
use loom_lower::{lower_unit, LowerOptions, PrettyPrint};
use std::path::Path;

pub fn execute(file: &Path, options: LowerOptions, format: OutputFormat) -> Result<()> {
    print!("{}", render(file, options, format)?);
    Ok(())
}

/// The definition table of `file` in the requested format
pub fn render(file: &Path, options: LowerOptions, format: OutputFormat) -> Result<String> {
    let unit = read_unit(file)?;
    let table = lower_unit(&unit, options)
        .with_context(|| format!("failed to lower {}", file.display()))?;
    tracing::info!(definitions = table.len(), "lowered {}", file.display());

    match format {
        OutputFormat::Text => Ok(table.pretty_print()),
        OutputFormat::Json => {
            let mut json = serde_json::to_string_pretty(&table)?;
            json.push('\n');
            Ok(json)
        }
    }
}
