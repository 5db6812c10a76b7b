//! Configuration file handling

use miette::{IntoDiagnostic, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for sqlsleuth
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Schema file paths or patterns
    #[serde(default)]
    pub schema: Vec<String>,

    /// Query file patterns to check
    #[serde(default)]
    pub files: Vec<String>,

    /// SQL dialect name
    #[serde(default)]
    pub dialect: Option<String>,

    /// Output format (human, json)
    #[serde(default)]
    pub format: Option<String>,

    /// Treat unresolvable columns as errors
    #[serde(default)]
    pub strict_columns: bool,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: &PathBuf) -> Result<Self> {
        let contents = std::fs::read_to_string(path).into_diagnostic()?;
        let config: Config = toml::from_str(&contents).into_diagnostic()?;
        Ok(config)
    }

    /// Try to find and load sqlsleuth.toml in the current directory or a parent
    pub fn find_and_load() -> Result<Option<Self>> {
        let mut current_dir = std::env::current_dir().into_diagnostic()?;

        loop {
            let config_path = current_dir.join("sqlsleuth.toml");
            if config_path.exists() {
                return Ok(Some(Self::from_file(&config_path)?));
            }

            if !current_dir.pop() {
                break;
            }
        }

        Ok(None)
    }

    /// Merge CLI arguments into configuration.
    /// CLI arguments take precedence over config file values.
    pub fn merge_with_args(
        mut self,
        schema: &[PathBuf],
        files: &[PathBuf],
        format: &Option<crate::args::OutputFormat>,
        strict_columns: bool,
    ) -> Self {
        if !schema.is_empty() {
            self.schema = schema.iter().map(|p| p.display().to_string()).collect();
        }

        if !files.is_empty() {
            self.files = files.iter().map(|p| p.display().to_string()).collect();
        }

        if let Some(fmt) = format {
            self.format = Some(format!("{:?}", fmt).to_lowercase());
        }

        if strict_columns {
            self.strict_columns = true;
        }

        self
    }
}
