//! Lowering options

use serde::{Deserialize, Serialize};

/// Options for a lowering run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LowerOptions {
    /// Validate every lowered body
    pub validate: bool,
    /// Number of threads the driver may use
    pub jobs: usize,
    /// Only lower bodies of methods whose canonical name contains this string
    pub method_filter: Option<String>,
}

impl Default for LowerOptions {
    fn default() -> Self {
        Self {
            validate: true,
            jobs: 1,
            method_filter: None,
        }
    }
}

impl LowerOptions {
    /// Check if the body of `method` should be lowered
    pub fn selects(&self, method: &str) -> bool {
        self.method_filter
            .as_deref()
            .map_or(true, |filter| method.contains(filter))
    }
}
