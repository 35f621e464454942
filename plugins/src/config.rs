///
/// # Plugin Configuration
///
/// Settings for a plugin runtime, normally read from a TOML file next to
/// the build script. Every field is optional.
///
/// ## Example fubsy-plugin.toml
///
/// ```toml
/// namespace = "fubsy"        # root-scope name of the builtin namespace
/// exports = ["result"]       # names to copy out after a run (empty: all)
/// strict_exports = true      # a missing export is an error
/// max_call_depth = 48        # script recursion limit
/// ```
///

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::bridge::{DEFAULT_NAMESPACE, ExportMode};
use crate::interp::DEFAULT_MAX_CALL_DEPTH;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct PluginConfig {
    pub namespace: String,
    pub exports: Vec<String>,
    pub strict_exports: bool,
    pub max_call_depth: usize,
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            exports: Vec::new(),
            strict_exports: false,
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
        }
    }
}

impl PluginConfig {
    pub fn export_mode(&self) -> ExportMode {
        if self.strict_exports {
            ExportMode::Strict
        } else {
            ExportMode::Lenient
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid plugin config: {0}")]
    Parse(#[from] toml::de::Error),
}

pub fn parse_config_str(content: &str) -> Result<PluginConfig, ConfigError> {
    Ok(toml::from_str(content)?)
}

pub fn load_config(path: &Path) -> Result<PluginConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config_str(&content)
}
