use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;

/// Settings for a structural check, usually loaded from a TOML file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CheckConfig {
    /// Stop walking once this many failures are recorded (0 = unlimited).
    pub error_limit: usize,
    /// Report blocks whose type has no known shape.
    pub deny_unknown_blocks: bool,
    /// Report sockets and fields that repeat a name already used on the
    /// same block. Lookups still resolve to the first one.
    pub reject_duplicate_names: bool,
    /// Shapes for custom block types; these take precedence over built-ins.
    #[serde(rename = "block")]
    pub blocks: Vec<ShapeConfig>,
}

/// A `[[block]]` table declaring the sockets a block type needs.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ShapeConfig {
    #[serde(rename = "type")]
    pub block_type: String,
    #[serde(default)]
    pub fields: Vec<String>,
    #[serde(default)]
    pub values: Vec<String>,
    #[serde(default)]
    pub statements: Vec<String>,
}

impl CheckConfig {
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }
}
