//! Incremental build support.
//!
//! Decides whether an asset recorded in the previous manifest is still up to
//! date. For each asset the checks run in a fixed order and the first one that
//! fails becomes the [`RebuildReason`]:
//!
//! 1. The previous build of the asset succeeded
//! 2. The target file exists
//! 3. The source file length is unchanged
//! 4. The source checksum is unchanged
//! 5. The metadata is unchanged
//! 6. Every recorded dependency exists with unchanged length and checksum
//!
//! If all checks pass the previous item is carried forward as skipped.

use crate::build::{Asset, BuildManifestItem};
use crate::io::{FileSystem, HashComputer};
use crate::path::DirectoryPath;
use thiserror::Error;

/// Why an asset found in the previous manifest has to be rebuilt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum RebuildReason {
    #[error("Rebuilding {0} because its previous build did not succeed.")]
    PreviousBuildFailed(String),
    #[error("Rebuilding {0} because its target {1} does not exist.")]
    TargetMissing(String, String),
    #[error("Rebuilding {0} because its source length changed from {1} to {2}.")]
    LengthChanged(String, u64, u64),
    #[error("Rebuilding {0} because its source checksum changed.")]
    ChecksumChanged(String),
    #[error("Rebuilding {0} because its source file could not be read.")]
    SourceUnreadable(String),
    #[error("Rebuilding {0} because its metadata changed.")]
    MetadataChanged(String),
    #[error("Rebuilding {0} because its dependency {1} does not exist.")]
    DependencyMissing(String, String),
    #[error("Rebuilding {0} because the length of its dependency {1} changed.")]
    DependencyLengthChanged(String, String),
    #[error("Rebuilding {0} because the checksum of its dependency {1} changed.")]
    DependencyChecksumChanged(String, String),
}

/// Compares assets against their previous manifest items.
pub struct StalenessCheck<'a> {
    file_system: &'a dyn FileSystem,
    hasher: &'a dyn HashComputer,
    input_directory: &'a DirectoryPath,
    output_directory: &'a DirectoryPath,
    target_extension: &'a str,
}

impl<'a> StalenessCheck<'a> {
    pub fn new(
        file_system: &'a dyn FileSystem,
        hasher: &'a dyn HashComputer,
        input_directory: &'a DirectoryPath,
        output_directory: &'a DirectoryPath,
        target_extension: &'a str,
    ) -> Self {
        Self { file_system, hasher, input_directory, output_directory, target_extension }
    }

    /// `None` when `asset` is up to date with `previous`.
    pub fn rebuild_reason(&self, asset: &Asset, previous: &BuildManifestItem) -> Option<RebuildReason> {
        let name = asset.path.to_string();

        if !previous.status.is_success() {
            return Some(RebuildReason::PreviousBuildFailed(name));
        }

        let target = asset.target_path(self.output_directory, self.target_extension);
        if !self.file_system.file_exists(&target) {
            return Some(RebuildReason::TargetMissing(name, target.to_string()));
        }

        let source = self.input_directory.combine_file(&asset.path);
        let Ok(length) = self.file_system.file_length(&source) else {
            return Some(RebuildReason::SourceUnreadable(name));
        };
        if length != previous.length {
            return Some(RebuildReason::LengthChanged(name, previous.length, length));
        }
        match self.hasher.compute(self.file_system, &source) {
            Ok(checksum) if checksum == previous.checksum => {}
            Ok(_) => return Some(RebuildReason::ChecksumChanged(name)),
            Err(_) => return Some(RebuildReason::SourceUnreadable(name)),
        }

        if asset.metadata != previous.asset.metadata {
            return Some(RebuildReason::MetadataChanged(name));
        }

        previous.dependencies.iter().find_map(|dependency| {
            let dependency_name = dependency.path.to_string();
            let path = self.input_directory.combine_file(&dependency.path);
            if !self.file_system.file_exists(&path) {
                return Some(RebuildReason::DependencyMissing(name.clone(), dependency_name));
            }
            match self.file_system.file_length(&path) {
                Ok(length) if length == dependency.file_size => {}
                _ => return Some(RebuildReason::DependencyLengthChanged(name.clone(), dependency_name)),
            }
            match self.hasher.compute(self.file_system, &path) {
                Ok(checksum) if checksum == dependency.checksum => None,
                _ => Some(RebuildReason::DependencyChecksumChanged(name.clone(), dependency_name)),
            }
        })
    }
}
