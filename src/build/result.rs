//! Build result types.
//!
//! Contains the per-asset outcome of a pipeline run and the failure messages
//! recorded for assets that could not be built.

use crate::build::{Asset, AssetDependency};
use serde::Serialize;
use thiserror::Error;

/// Status of a single asset build, as persisted in the manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum BuildStatus {
    #[default]
    Unknown,
    /// Build failed; the item's message says why
    Failure,
    Success,
    /// Up to date; carried forward from the previous manifest
    Skipped,
}

impl BuildStatus {
    /// Check if the status indicates a usable output.
    pub fn is_success(&self) -> bool {
        matches!(self, BuildStatus::Success | BuildStatus::Skipped)
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, BuildStatus::Failure)
    }

    /// Wire code used by the binary manifest.
    pub fn code(self) -> i32 {
        match self {
            BuildStatus::Unknown => 0,
            BuildStatus::Failure => 1,
            BuildStatus::Success => 2,
            BuildStatus::Skipped => 3,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(BuildStatus::Unknown),
            1 => Some(BuildStatus::Failure),
            2 => Some(BuildStatus::Success),
            3 => Some(BuildStatus::Skipped),
            _ => None,
        }
    }
}

impl std::fmt::Display for BuildStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuildStatus::Unknown => write!(f, "unknown"),
            BuildStatus::Failure => write!(f, "failure"),
            BuildStatus::Success => write!(f, "success"),
            BuildStatus::Skipped => write!(f, "skipped"),
        }
    }
}

/// Why an asset could not be built.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum AssetFailure {
    #[error("No {0} directory has been configured.")]
    DirectoryNotConfigured(&'static str),
    #[error("Asset {0} does not have a file extension.")]
    MissingExtension(String),
    #[error("Source file {0} does not exist in {1}.")]
    SourceNotFound(String, String),
    #[error("Could not read source file {0}: {1}")]
    SourceUnreadable(String, String),
    #[error("No importer is registered for {1} (asset {0}).")]
    NoImporter(String, String),
    #[error("Import of {0} failed: {1}")]
    ImportFailed(String, String),
    #[error("Import of {0} resulted in null.")]
    ImportNull(String),
    #[error("Processor {1} requested by {0} could not be found.")]
    ProcessorNotFound(String, String),
    #[error("Processor {1} expects {2} but {0} was imported as {3}.")]
    SourceTypeMismatch(String, String, &'static str, &'static str),
    #[error("Processing of {0} by {1} failed: {2}")]
    ProcessFailed(String, String, String),
    #[error("Processing of {0} by {1} resulted in null.")]
    ProcessNull(String, String),
    #[error("Processor {1} declares {2} but produced {3} for {0}.")]
    TargetTypeMismatch(String, String, &'static str, &'static str),
    #[error("No writer is registered for {1} (asset {0}).")]
    NoWriter(String, &'static str),
    #[error("Could not create target directory {1} for {0}: {2}")]
    TargetDirectory(String, String, String),
    #[error("Writing {0} to {1} failed: {2}")]
    WriteFailed(String, String, String),
}

/// Result of building a single asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetBuildResult {
    pub asset: Asset,
    pub status: BuildStatus,
    /// Failure message; empty on success
    pub message: String,
    /// Source file length in bytes
    pub length: u64,
    /// Source file checksum
    pub checksum: String,
    pub dependencies: Vec<AssetDependency>,
}

impl AssetBuildResult {
    /// Create a successful result.
    pub fn success(
        asset: Asset,
        length: u64,
        checksum: String,
        dependencies: Vec<AssetDependency>,
    ) -> Self {
        Self { asset, status: BuildStatus::Success, message: String::new(), length, checksum, dependencies }
    }

    /// Create a failed result.
    pub fn failed(asset: Asset, failure: AssetFailure) -> Self {
        Self {
            asset,
            status: BuildStatus::Failure,
            message: failure.to_string(),
            length: 0,
            checksum: String::new(),
            dependencies: vec![],
        }
    }

    /// The same record with its status replaced by [`BuildStatus::Skipped`].
    pub fn skipped(&self) -> Self {
        Self { status: BuildStatus::Skipped, ..self.clone() }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}
