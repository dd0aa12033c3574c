//! Resolved build inputs.

use crate::config::Metadata;
use crate::path::{DirectoryPath, FilePath};
use serde::Serialize;

/// A concrete source file to build, relative to the input directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Asset {
    pub path: FilePath,
    pub metadata: Metadata,
    /// Explicit processor requested by the asset's definition
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processor_name: Option<String>,
}

impl Asset {
    pub fn new(path: FilePath, metadata: Metadata, processor_name: Option<String>) -> Self {
        Self { path, metadata, processor_name }
    }

    /// Where this asset's output is written: the asset path under `output`,
    /// with its extension replaced by `extension`.
    pub fn target_path(&self, output: &DirectoryPath, extension: &str) -> FilePath {
        output.combine_file(&self.path.change_extension(extension))
    }
}

/// A file other than the source that a build read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetDependency {
    /// Relative to the input directory
    pub path: FilePath,
    pub file_size: u64,
    pub checksum: String,
}

impl AssetDependency {
    pub fn new(path: FilePath, file_size: u64, checksum: impl Into<String>) -> Self {
        Self { path, file_size, checksum: checksum.into() }
    }
}
