//! Build orchestration.
//!
//! [`BuildEngine`] validates the configuration, expands the asset definitions,
//! decides per asset whether the previous manifest still holds and builds the
//! rest. The returned [`BuildManifest`] is always new; a previous manifest is
//! only read.

use crate::build::{AssetBuilder, AssetExtractor, BuildManifest, StalenessCheck};
use crate::config::BuildConfiguration;
use crate::glob::GlobError;
use crate::io::{Environment, HashComputer, Sha256Hasher};
use crate::log::{BuildLog, TracingLog};
use crate::path::{DirectoryPath, PathComparer, PathError, PathLike};
use crate::registry::{ComponentRegistry, Components, RegistryError};
use thiserror::Error;

/// Error that aborts a whole build.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BuildError {
    #[error("The build engine has been disposed.")]
    Disposed,
    #[error("No input directory has been specified.")]
    MissingInputDirectory,
    #[error("No output directory has been specified.")]
    MissingOutputDirectory,
    #[error("The input directory '{0}' is not an absolute path.")]
    RelativeInputDirectory(String),
    #[error("The output directory '{0}' is not an absolute path.")]
    RelativeOutputDirectory(String),
    #[error("The input directory '{0}' does not exist.")]
    InputDirectoryNotFound(String),
    #[error("The asset definition '{definition}' resolves outside the input directory '{directory}'.")]
    OutsideInputDirectory { definition: String, directory: String },
    #[error("Invalid asset path: {0}")]
    Path(#[from] PathError),
    #[error(transparent)]
    Glob(#[from] GlobError),
}

/// Builds assets from a configuration using a fixed component set.
pub struct BuildEngine {
    environment: Environment,
    registry: ComponentRegistry,
    hasher: Option<Box<dyn HashComputer>>,
    log: Box<dyn BuildLog>,
}

impl BuildEngine {
    /// Create an engine, validating `components` up front.
    pub fn new(environment: Environment, components: Components) -> Result<Self, RegistryError> {
        Ok(Self {
            environment,
            registry: ComponentRegistry::new(components)?,
            hasher: Some(Box::new(Sha256Hasher::new())),
            log: Box::new(TracingLog),
        })
    }

    /// Replace the log sink.
    pub fn with_log(mut self, log: impl BuildLog + 'static) -> Self {
        self.log = Box::new(log);
        self
    }

    /// Replace the hash computer.
    pub fn with_hasher(mut self, hasher: impl HashComputer + 'static) -> Self {
        self.hasher = Some(Box::new(hasher));
        self
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    /// Release the hasher. Later builds fail with [`BuildError::Disposed`].
    pub fn dispose(&mut self) {
        self.hasher = None;
    }

    pub fn is_disposed(&self) -> bool {
        self.hasher.is_none()
    }

    /// Run a build.
    ///
    /// The configuration's directories are rewritten to their collapsed form.
    /// Per-asset problems are recorded as failed manifest items; only
    /// configuration problems and glob errors are returned as errors.
    pub fn build(
        &self,
        configuration: &mut BuildConfiguration,
        previous: Option<&BuildManifest>,
    ) -> Result<BuildManifest, BuildError> {
        let hasher = self.hasher.as_deref().ok_or(BuildError::Disposed)?;
        let fs = self.environment.file_system();

        let (input, output) = self.validate_directories(configuration)?;
        configuration.input_directory = Some(input.clone());
        configuration.output_directory = Some(output.clone());

        if configuration.assets.is_empty() {
            self.log.information("No assets to build.");
            return Ok(BuildManifest::new());
        }

        let log = self.log.as_ref();
        let assets = AssetExtractor::new(&self.environment, log).extract(&configuration.assets, &input)?;

        let comparer = PathComparer::for_file_system(fs);
        let staleness = StalenessCheck::new(fs, hasher, &input, &output, &configuration.target_extension);
        let builder = AssetBuilder::new(fs, &self.registry, hasher, log);

        let mut manifest = BuildManifest::new();
        for asset in &assets {
            let previous_item = previous
                .filter(|_| configuration.incremental)
                .and_then(|manifest| manifest.find(&asset.path, &comparer));

            if let Some(item) = previous_item {
                match staleness.rebuild_reason(asset, item) {
                    None => {
                        log.verbose(&format!("Skipping {} (up to date).", asset.path));
                        let mut skipped = item.skipped();
                        skipped.asset = asset.clone();
                        manifest.push(skipped);
                        continue;
                    }
                    Some(reason) => log.information(&reason.to_string()),
                }
            }

            let result = builder.build(asset, configuration);
            if result.status.is_failure() {
                log.error(&format!("Failed to build {}: {}", asset.path, result.message));
            } else {
                log.information(&format!("Built {}.", asset.path));
            }
            manifest.push(result);
        }

        Ok(manifest)
    }

    /// Check the directories and return their collapsed forms.
    fn validate_directories(
        &self,
        configuration: &BuildConfiguration,
    ) -> Result<(DirectoryPath, DirectoryPath), BuildError> {
        let input = configuration.input_directory.as_ref().ok_or(BuildError::MissingInputDirectory)?;
        let output = configuration.output_directory.as_ref().ok_or(BuildError::MissingOutputDirectory)?;

        if input.is_relative() {
            return Err(BuildError::RelativeInputDirectory(input.to_string()));
        }
        if output.is_relative() {
            return Err(BuildError::RelativeOutputDirectory(output.to_string()));
        }

        let input = input.collapse()?;
        if !self.environment.file_system().directory_exists(&input) {
            return Err(BuildError::InputDirectoryNotFound(input.to_string()));
        }
        Ok((input, output.collapse()?))
    }
}

impl std::fmt::Debug for BuildEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuildEngine")
            .field("environment", &self.environment)
            .field("registry", &self.registry)
            .field("disposed", &self.is_disposed())
            .finish()
    }
}
