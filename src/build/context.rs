//! Per-asset state handed to pipeline components.

use crate::build::{Asset, AssetDependency};
use crate::config::BuildConfiguration;
use crate::io::{FileSystem, HashComputer};
use crate::log::BuildLog;
use crate::path::{DirectoryPath, FilePath, PathComparer};
use thiserror::Error;

/// A dependency that cannot be recorded.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DependencyError {
    #[error("Dependency {0} does not exist.")]
    NotFound(String),
    #[error("Dependency {path} is not located in the input directory {directory}.")]
    OutsideInput { path: String, directory: String },
    #[error("Could not read dependency {path}: {source}")]
    Io { path: String, source: std::io::Error },
}

/// Context for a single asset build.
///
/// Components reach the filesystem, configuration and log through it, and
/// report the extra files they read with [`Context::add_dependency`] so that
/// changes to them invalidate the asset in the next incremental build.
pub struct Context<'a> {
    asset: &'a Asset,
    configuration: &'a BuildConfiguration,
    input_directory: &'a DirectoryPath,
    file_system: &'a dyn FileSystem,
    hasher: &'a dyn HashComputer,
    log: &'a dyn BuildLog,
    comparer: PathComparer,
    dependencies: Vec<AssetDependency>,
}

impl<'a> Context<'a> {
    pub fn new(
        asset: &'a Asset,
        configuration: &'a BuildConfiguration,
        input_directory: &'a DirectoryPath,
        file_system: &'a dyn FileSystem,
        hasher: &'a dyn HashComputer,
        log: &'a dyn BuildLog,
    ) -> Self {
        Self {
            asset,
            configuration,
            input_directory,
            file_system,
            hasher,
            log,
            comparer: PathComparer::for_file_system(file_system),
            dependencies: Vec::new(),
        }
    }

    pub fn asset(&self) -> &Asset {
        self.asset
    }

    pub fn configuration(&self) -> &BuildConfiguration {
        self.configuration
    }

    pub fn input_directory(&self) -> &DirectoryPath {
        self.input_directory
    }

    pub fn file_system(&self) -> &dyn FileSystem {
        self.file_system
    }

    pub fn log(&self) -> &dyn BuildLog {
        self.log
    }

    /// Checksum service used for sources and dependencies.
    pub fn hasher(&self) -> &dyn HashComputer {
        self.hasher
    }

    /// Record a file the build depends on.
    ///
    /// A relative `path` is taken relative to the input directory. The file
    /// must exist and lie within the input directory. Adding the same path
    /// twice is a no-op.
    pub fn add_dependency(&mut self, path: &FilePath) -> Result<(), DependencyError> {
        let absolute = self
            .input_directory
            .combine_file(path)
            .collapse()
            .map_err(|_| DependencyError::NotFound(path.to_string()))?;

        let relative = self.input_directory.relative_file(&absolute, &self.comparer).ok_or_else(|| {
            DependencyError::OutsideInput {
                path: absolute.to_string(),
                directory: self.input_directory.to_string(),
            }
        })?;

        if self.dependencies.iter().any(|d| self.comparer.eq(&d.path, &relative)) {
            return Ok(());
        }

        if !self.file_system.file_exists(&absolute) {
            return Err(DependencyError::NotFound(absolute.to_string()));
        }

        let io_error = |source| DependencyError::Io { path: absolute.to_string(), source };
        let file_size = self.file_system.file_length(&absolute).map_err(io_error)?;
        let checksum = self.hasher.compute(self.file_system, &absolute).map_err(io_error)?;

        self.log.verbose(&format!("{} depends on {}", self.asset.path, relative));
        self.dependencies.push(AssetDependency::new(relative, file_size, checksum));
        Ok(())
    }

    pub fn dependencies(&self) -> &[AssetDependency] {
        &self.dependencies
    }

    pub(crate) fn into_dependencies(self) -> Vec<AssetDependency> {
        self.dependencies
    }
}
