//! `loom.toml` loading
//!
//! The file holds `LowerOptions` fields at the top level:
//!
//! ```toml
//! validate = true
//! jobs = 4
//! method_filter = "Parser::"
//! ```

use anyhow::{Context, Result};
use loom_lower::LowerOptions;
use std::path::Path;

/// Command line flags that take precedence over the configuration file
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub jobs: Option<usize>,
    pub no_validate: bool,
    pub filter: Option<String>,
}

impl Overrides {
    pub fn apply(self, mut options: LowerOptions) -> LowerOptions {
        if let Some(jobs) = self.jobs {
            options.jobs = jobs;
        }
        if self.no_validate {
            options.validate = false;
        }
        if self.filter.is_some() {
            options.method_filter = self.filter;
        }
        options
    }
}

/// Options from `path`, or the defaults when no file is given
pub fn load(path: Option<&Path>) -> Result<LowerOptions> {
    let Some(path) = path else {
        return Ok(LowerOptions::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let options: LowerOptions =
        toml::from_str(&text).with_context(|| format!("invalid config {}", path.display()))?;
    tracing::debug!(config = %path.display(), ?options, "loaded configuration");
    Ok(options)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_file_gives_defaults() {
        assert_eq!(load(None).unwrap(), LowerOptions::default());
    }

    #[test]
    fn test_flags_win() {
        let options = LowerOptions {
            jobs: 8,
            method_filter: Some("A::".into()),
            ..Default::default()
        };
        let options = Overrides {
            jobs: Some(2),
            no_validate: true,
            filter: None,
        }
        .apply(options);
        assert_eq!(options.jobs, 2);
        assert!(!options.validate);
        assert_eq!(options.method_filter.as_deref(), Some("A::"));
    }
}
