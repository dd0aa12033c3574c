//! Asset discovery for the build system.
//!
//! Expands the configured asset definitions into concrete [`Asset`]s. Glob
//! definitions are resolved against the input directory; plain paths map to
//! exactly one asset whether or not the file exists.

use crate::build::{Asset, BuildError};
use crate::config::AssetDefinition;
use crate::glob::Globber;
use crate::io::Environment;
use crate::log::BuildLog;
use crate::path::{DirectoryPath, FilePath, PathComparer, PathLike};
use std::collections::HashSet;

/// Expands asset definitions into assets relative to the input directory.
pub struct AssetExtractor<'a> {
    environment: &'a Environment,
    log: &'a dyn BuildLog,
    comparer: PathComparer,
}

impl<'a> AssetExtractor<'a> {
    pub fn new(environment: &'a Environment, log: &'a dyn BuildLog) -> Self {
        Self { environment, log, comparer: PathComparer::for_file_system(environment.file_system()) }
    }

    /// Expand `definitions` in order.
    ///
    /// An asset matched by more than one definition is kept once, with the
    /// metadata of the first definition that matched it. Any path resolving
    /// outside `input_directory` is an error.
    pub fn extract(
        &self,
        definitions: &[AssetDefinition],
        input_directory: &DirectoryPath,
    ) -> Result<Vec<Asset>, BuildError> {
        let mut seen = HashSet::new();
        let mut assets = Vec::new();

        for definition in definitions {
            let files = if definition.is_glob() {
                self.expand_glob(definition, input_directory)?
            } else {
                vec![self.expand_path(definition, input_directory)?]
            };

            for path in files {
                if !seen.insert(self.comparer.key(&path)) {
                    self.log.verbose(&format!("{} is matched by more than one asset definition.", path));
                    continue;
                }
                assets.push(Asset::new(
                    path,
                    definition.metadata.clone(),
                    definition.processor_name.clone(),
                ));
            }
        }

        self.log.verbose(&format!(
            "Expanded {} asset definition(s) into {} asset(s).",
            definitions.len(),
            assets.len()
        ));
        Ok(assets)
    }

    fn expand_glob(
        &self,
        definition: &AssetDefinition,
        input_directory: &DirectoryPath,
    ) -> Result<Vec<FilePath>, BuildError> {
        let pattern = if is_rooted(&definition.path) {
            definition.path.clone()
        } else {
            format!("{}/{}", input_directory.full_path().trim_end_matches('/'), definition.path)
        };

        let files = Globber::new(self.environment).resolve_files(&pattern)?;
        if files.is_empty() {
            self.log.warning(&format!("The pattern {} did not match any files.", definition.path));
        }

        files
            .iter()
            .map(|file| self.relative_to_input(file, &definition.path, input_directory))
            .collect()
    }

    fn expand_path(
        &self,
        definition: &AssetDefinition,
        input_directory: &DirectoryPath,
    ) -> Result<FilePath, BuildError> {
        let absolute = input_directory.combine_file(&FilePath::new(&definition.path)?).collapse()?;
        self.relative_to_input(&absolute, &definition.path, input_directory)
    }

    fn relative_to_input(
        &self,
        file: &FilePath,
        definition: &str,
        input_directory: &DirectoryPath,
    ) -> Result<FilePath, BuildError> {
        input_directory.relative_file(file, &self.comparer).ok_or_else(|| BuildError::OutsideInputDirectory {
            definition: definition.to_string(),
            directory: input_directory.to_string(),
        })
    }
}

fn is_rooted(path: &str) -> bool {
    let path = path.trim().replace('\\', "/");
    path.starts_with('/') || crate::path::has_drive(&path)
}
