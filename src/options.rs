//! Builder limits, loadable from TOML configuration

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when loading builder options
#[derive(Error, Debug)]
pub enum OptionsError {
    #[error("Failed to read options file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse options TOML: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// Limits applied during AST construction
///
/// Construction is depth-first and recursive, so nesting depth is the one
/// resource a hostile or degenerate template can exhaust. The builder
/// refuses to descend past `max_depth` instead of overflowing the stack.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildOptions {
    /// Maximum node nesting depth before construction fails
    pub max_depth: usize,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self { max_depth: 128 }
    }
}

/// TOML structure wrapping the options under a `[limits]` table
#[derive(Deserialize)]
#[serde(default)]
struct TomlOptions {
    limits: BuildOptions,
}

impl Default for TomlOptions {
    fn default() -> Self {
        Self {
            limits: BuildOptions::default(),
        }
    }
}

impl BuildOptions {
    /// Load options from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, OptionsError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Load options from a TOML string with a `[limits]` table
    pub fn from_toml_str(content: &str) -> Result<Self, OptionsError> {
        let parsed: TomlOptions = toml::from_str(content)?;
        Ok(parsed.limits)
    }

    /// Override the maximum nesting depth
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}
