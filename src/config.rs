//! Analyzer configuration

use log::debug;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::constants::anchor::{DEFAULT_ACCOUNT_NAMES, DEFAULT_DETAIL_WIDTH, DEFAULT_EXCLUDED_TOKENS};
use crate::errors::{AnalyzerError, AnalyzerResult, ErrorContext, ErrorExt};

/// Tunable parts of the analysis
///
/// Every field has a default, so a configuration file only needs the keys it
/// overrides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Account names that are defined without any constraint
    pub default_accounts: Vec<String>,
    /// Tokens never captured as the field part of a reference
    pub excluded_tokens: Vec<String>,
    /// Number of characters of an expression quoted in provenance details
    pub detail_width: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            default_accounts: DEFAULT_ACCOUNT_NAMES.iter().map(|s| s.to_string()).collect(),
            excluded_tokens: DEFAULT_EXCLUDED_TOKENS.iter().map(|s| s.to_string()).collect(),
            detail_width: DEFAULT_DETAIL_WIDTH,
        }
    }
}

impl AnalyzerConfig {
    /// Load a configuration from a JSON file
    pub fn from_file(path: &Path) -> AnalyzerResult<Self> {
        let context = || ErrorContext {
            source_file: Some(path.display().to_string()),
            component: "config".to_string(),
            operation: "load_config".to_string(),
            details: None,
        };
        let json = fs::read_to_string(path).with_context(context())?;
        let config: AnalyzerConfig = serde_json::from_str(&json).with_context(context())?;
        config.validate()?;
        debug!("Loaded analyzer configuration from {}", path.display());
        Ok(config)
    }

    fn validate(&self) -> AnalyzerResult<()> {
        if self.detail_width == 0 {
            return Err(AnalyzerError::Config("detail_width must be at least 1".to_string()));
        }
        Ok(())
    }
}
