//! Configuration schema types for `assetpipe.toml`
//!
//! Defines the on-disk structure and validation rules. The loader converts a
//! validated [`ConfigFile`] into a [`BuildConfiguration`](super::BuildConfiguration).

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;

/// Root of `assetpipe.toml`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Source directory, relative to the config file unless absolute
    pub input: PathBuf,
    /// Output directory, relative to the config file unless absolute
    pub output: PathBuf,
    /// Skip assets unchanged since the previous build
    #[serde(default = "default_incremental")]
    pub incremental: bool,
    /// Extension of produced files
    #[serde(default = "default_target_extension")]
    pub target_extension: String,
    /// Asset entries, in build order
    #[serde(default)]
    pub assets: Vec<AssetEntry>,
}

fn default_incremental() -> bool {
    true
}

fn default_target_extension() -> String {
    super::DEFAULT_TARGET_EXTENSION.to_string()
}

/// One `[[assets]]` table
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AssetEntry {
    /// File path or glob pattern relative to the input directory
    pub path: String,
    /// Processor display name overriding the importer's default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processor: Option<String>,
    /// Free-form metadata handed to the pipeline
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

/// A single validation problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl ConfigFile {
    /// Validate the configuration, returning every problem found.
    pub fn validate(&self) -> Vec<ConfigValidationError> {
        let mut errors = Vec::new();

        if self.input.as_os_str().is_empty() {
            errors.push(ConfigValidationError {
                field: "input".to_string(),
                message: "must not be empty".to_string(),
            });
        }

        if self.output.as_os_str().is_empty() {
            errors.push(ConfigValidationError {
                field: "output".to_string(),
                message: "must not be empty".to_string(),
            });
        }

        if self.target_extension.trim_start_matches('.').is_empty() {
            errors.push(ConfigValidationError {
                field: "target_extension".to_string(),
                message: "must not be empty".to_string(),
            });
        }

        for (index, asset) in self.assets.iter().enumerate() {
            if asset.path.trim().is_empty() {
                errors.push(ConfigValidationError {
                    field: format!("assets[{}].path", index),
                    message: "must not be empty".to_string(),
                });
            }

            let mut seen = HashSet::new();
            for key in asset.metadata.keys() {
                if !seen.insert(key.to_lowercase()) {
                    errors.push(ConfigValidationError {
                        field: format!("assets[{}].metadata", index),
                        message: format!("duplicate key '{}' (keys are case-insensitive)", key),
                    });
                }
            }
        }

        errors
    }
}
