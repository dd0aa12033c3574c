//! Configuration loading and discovery for `assetpipe.toml`

use super::model::{AssetDefinition, BuildConfiguration, Metadata};
use super::schema::ConfigFile;
use crate::path::{DirectoryPath, PathError};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the configuration file looked up by [`find_config_from`].
pub const CONFIG_FILENAME: &str = "assetpipe.toml";

/// Configuration loading error
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// File I/O error
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error
    #[error("Failed to parse assetpipe.toml: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error
    #[error("Config validation failed:\n{}", .0.iter().map(|e| format!("  - {}", e)).collect::<Vec<_>>().join("\n"))]
    Validation(Vec<String>),
    /// A directory could not be represented as a build path
    #[error("Invalid directory '{0}': {1}")]
    InvalidDirectory(String, PathError),
}

/// Find `assetpipe.toml` by walking up from `start`.
pub fn find_config_from(start: PathBuf) -> Option<PathBuf> {
    let mut current = start;

    loop {
        let config_path = current.join(CONFIG_FILENAME);
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            return None;
        }
    }
}

/// Find `assetpipe.toml` starting from the current working directory.
pub fn find_config() -> Option<PathBuf> {
    std::env::current_dir().ok().and_then(find_config_from)
}

/// Load and validate a configuration file.
///
/// Relative `input`/`output` directories are resolved against the directory
/// containing the file. A relative `path` is taken from the current working
/// directory, so the resulting directories are always absolute.
pub fn load_config(path: &Path) -> Result<BuildConfiguration, ConfigError> {
    let contents = fs::read_to_string(path)?;
    let base_dir = config_base_dir(path, &std::env::current_dir()?);
    parse_config(&contents, &base_dir)
}

/// Directory containing the config file at `path`, anchored at `cwd` when relative.
fn config_base_dir(path: &Path, cwd: &Path) -> PathBuf {
    let parent = path.parent().unwrap_or_else(|| Path::new(""));
    if parent.is_absolute() {
        parent.to_path_buf()
    } else {
        cwd.join(parent)
    }
}

/// Parse configuration text, resolving relative directories against `base_dir`.
pub fn parse_config(contents: &str, base_dir: &Path) -> Result<BuildConfiguration, ConfigError> {
    let file: ConfigFile = toml::from_str(contents)?;

    let errors = file.validate();
    if !errors.is_empty() {
        return Err(ConfigError::Validation(errors.into_iter().map(|e| e.to_string()).collect()));
    }

    Ok(BuildConfiguration {
        input_directory: Some(resolve_directory(base_dir, &file.input)?),
        output_directory: Some(resolve_directory(base_dir, &file.output)?),
        incremental: file.incremental,
        target_extension: file.target_extension.trim_start_matches('.').to_string(),
        assets: file
            .assets
            .into_iter()
            .map(|entry| AssetDefinition {
                path: entry.path,
                metadata: entry.metadata.into_iter().collect::<Metadata>(),
                processor_name: entry.processor,
            })
            .collect(),
    })
}

fn resolve_directory(base_dir: &Path, path: &Path) -> Result<DirectoryPath, ConfigError> {
    let resolved = if path.is_absolute() { path.to_path_buf() } else { base_dir.join(path) };
    let display = resolved.to_string_lossy().into_owned();
    DirectoryPath::new(&display).map_err(|e| ConfigError::InvalidDirectory(display, e))
}
