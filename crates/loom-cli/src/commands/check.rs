//! `loom check` - lower a unit and report counts only.

use super::read_unit;
use anyhow::{Context, Result};
use loom_lower::{lower_unit, Defn, LowerOptions};
use std::path::Path;

/// Definition counts of a lowered unit
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    /// Classes, interfaces and modules
    pub classes: usize,
    pub fields: usize,
    pub declared: usize,
    pub defined: usize,
    /// Live nodes over all defined bodies
    pub nodes: usize,
}

impl std::fmt::Display for Summary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} classes, {} fields, {} methods defined, {} declared, {} nodes",
            self.classes, self.fields, self.defined, self.declared, self.nodes
        )
    }
}

pub fn execute(file: &Path, options: LowerOptions) -> Result<()> {
    let summary = summarize(file, options)?;
    println!("{}: {}", file.display(), summary);
    Ok(())
}

pub fn summarize(file: &Path, options: LowerOptions) -> Result<Summary> {
    let unit = read_unit(file)?;
    let table = lower_unit(&unit, options)
        .with_context(|| format!("failed to lower {}", file.display()))?;

    let mut summary = Summary::default();
    for defn in table.iter() {
        match defn {
            Defn::Class { .. } | Defn::Interface { .. } | Defn::Module { .. } => {
                summary.classes += 1
            }
            Defn::Field { .. } => summary.fields += 1,
            Defn::Declare { .. } => summary.declared += 1,
            Defn::Define { body, .. } => {
                summary.defined += 1;
                summary.nodes += body.graph.reachable(&body.ends).len();
            }
        }
    }
    Ok(summary)
}
