//! CLI command implementations

pub mod check;
pub mod lower;

use anyhow::{Context, Result};
use loom_lower::CompilationUnit;
use std::path::Path;

/// Output format of `loom lower`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Read a compilation unit from a JSON file
pub fn read_unit(path: &Path) -> Result<CompilationUnit> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("{} is not a valid compilation unit", path.display()))
}
