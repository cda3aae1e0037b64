//! Runtime configuration via `reactive.toml`
//!
//! All settings have defaults, so an empty or missing file is valid. A
//! default file with comments can be written next to the application with
//! [`ModelConfig::write_default_if_missing`].

use crate::error::{EngineError, EngineResult};
use reactive_core::MAX_PATH_LENGTH;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Config file name
pub const CONFIG_FILE_NAME: &str = "reactive.toml";

/// What happens to an entity index after its entity is removed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexReuse {
    /// Indices are never handed out twice
    Never,
    /// The smallest released index is handed out first
    #[default]
    LowestFree,
}

/// Which sibling is promoted when the active entity is removed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivationOrder {
    /// Lowest remaining index wins
    #[default]
    Ascending,
    /// Highest remaining index wins
    Descending,
}

/// Runtime configuration loaded from `reactive.toml`.
///
/// # Example
///
/// ```toml
/// strict_paths = false
/// index_reuse = "lowest_free"
/// activation_order = "ascending"
/// max_path_length = 256
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Fail entity writes that would replace a primitive in the way
    #[serde(default)]
    pub strict_paths: bool,
    /// Entity index reuse policy
    #[serde(default)]
    pub index_reuse: IndexReuse,
    /// Tie-break order for sibling promotion
    #[serde(default)]
    pub activation_order: ActivationOrder,
    /// Longest path accepted by the runtime, in segments
    #[serde(default = "default_max_path_length")]
    pub max_path_length: usize,
}

fn default_max_path_length() -> usize {
    MAX_PATH_LENGTH
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            strict_paths: false,
            index_reuse: IndexReuse::default(),
            activation_order: ActivationOrder::default(),
            max_path_length: default_max_path_length(),
        }
    }
}

impl ModelConfig {
    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# Reactive model configuration
#
# Strict paths: when true, writing through a primitive fails instead of
# replacing the primitive with an empty map (default: false)
strict_paths = false

# Entity index reuse: "lowest_free" (default) or "never"
#   "lowest_free" = removed indices are handed out again, smallest first
#   "never"       = indices only ever grow
index_reuse = "lowest_free"

# Sibling promotion order when the active entity is removed:
# "ascending" (default) or "descending"
activation_order = "ascending"

# Maximum path length in segments (1..=256)
max_path_length = 256
"#
    }

    /// Check that every setting is within range.
    ///
    /// # Errors
    ///
    /// Returns an error if `max_path_length` is 0 or above the hard limit.
    pub fn validate(&self) -> EngineResult<()> {
        if self.max_path_length == 0 || self.max_path_length > MAX_PATH_LENGTH {
            return Err(EngineError::config(format!(
                "max_path_length must be between 1 and {}, got {}",
                MAX_PATH_LENGTH, self.max_path_length
            )));
        }
        Ok(())
    }

    /// Parse and validate config from TOML text.
    pub fn from_toml_str(content: &str) -> EngineResult<Self> {
        let config: ModelConfig = toml::from_str(content)
            .map_err(|e| EngineError::config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: &Path) -> EngineResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            EngineError::config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let config: ModelConfig = toml::from_str(&content).map_err(|e| {
            EngineError::config(format!(
                "Failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        config.validate()?;
        tracing::info!(
            target: "reactive::engine",
            path = %path.display(),
            strict_paths = config.strict_paths,
            index_reuse = ?config.index_reuse,
            "config loaded"
        );
        Ok(config)
    }

    /// Write the default config file if it does not already exist.
    ///
    /// Returns `Ok(())` whether the file was created or already existed.
    pub fn write_default_if_missing(path: &Path) -> EngineResult<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml()).map_err(|e| {
                EngineError::config(format!(
                    "Failed to write default config file '{}': {}",
                    path.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> EngineResult<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| EngineError::config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content).map_err(|e| {
            EngineError::config(format!(
                "Failed to write config file '{}': {}",
                path.display(),
                e
            ))
        })
    }
}
