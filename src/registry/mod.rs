//! Registry of pipeline components.
//!
//! Importers are indexed by file extension, processors by id and display name,
//! writers by the exact [`ValueType`] they accept. All registration rules are
//! checked when the registry is built, so a misconfigured component set fails
//! before any asset is touched.

mod components;
mod value;

pub use components::{Components, Importer, ImporterMetadata, PipelineError, Processor, Writer};
pub use value::{AssetValue, Disposable, ValueType};

use crate::build::Asset;
use crate::path::FilePath;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// A component set that breaks a registration rule.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum RegistryError {
    #[error("Importer '{0}' does not declare importer metadata.")]
    MissingImporterMetadata(String),
    #[error("Importer '{0}' does not declare any file extensions.")]
    EmptyExtensionList(String),
    #[error("The extension '{extension}' is claimed by both '{first}' and '{second}'.")]
    DuplicateExtension { extension: String, first: String, second: String },
    #[error("Importer '{importer}' declares default processor '{processor}', which is not registered.")]
    UnknownDefaultProcessor { importer: String, processor: String },
    #[error("Processor '{0}' does not declare a source type.")]
    MissingSourceType(String),
    #[error("Processor '{0}' does not declare a target type.")]
    MissingTargetType(String),
    #[error("More than one processor is registered as '{0}'.")]
    DuplicateProcessor(String),
    #[error("Writer '{0}' does not declare a target type.")]
    MissingWriterType(String),
    #[error("The type '{value_type}' is claimed by both writers '{first}' and '{second}'.")]
    DuplicateWriter { value_type: String, first: String, second: String },
}

/// An asset names a processor that is not registered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Processor '{0}' is not registered.")]
pub struct ProcessorNotFound(pub String);

struct ImporterEntry {
    importer: Arc<dyn Importer>,
    default_processor: Option<Arc<dyn Processor>>,
}

/// Validated, indexed component set.
pub struct ComponentRegistry {
    importers: HashMap<String, ImporterEntry>,
    processors: HashMap<String, Arc<dyn Processor>>,
    writers: HashMap<ValueType, Arc<dyn Writer>>,
}

impl ComponentRegistry {
    pub fn new(components: Components) -> Result<Self, RegistryError> {
        let Components { importers, processors, writers } = components;

        let mut by_name: HashMap<String, Arc<dyn Processor>> = HashMap::new();
        let mut by_id: HashMap<String, Arc<dyn Processor>> = HashMap::new();
        for processor in processors {
            let id = processor.id().to_string();
            if processor.source_type().is_none() {
                return Err(RegistryError::MissingSourceType(id));
            }
            if processor.target_type().is_none() {
                return Err(RegistryError::MissingTargetType(id));
            }
            if by_id.contains_key(&id) {
                return Err(RegistryError::DuplicateProcessor(id));
            }
            for name in std::iter::once(id.as_str()).chain(processor.display_name()) {
                if let Some(existing) = by_name.get(name) {
                    if !Arc::ptr_eq(existing, &processor) {
                        return Err(RegistryError::DuplicateProcessor(name.to_string()));
                    }
                }
                by_name.insert(name.to_string(), Arc::clone(&processor));
            }
            by_id.insert(id, processor);
        }

        let mut by_extension: HashMap<String, ImporterEntry> = HashMap::new();
        for importer in importers {
            let name = importer.name().to_string();
            let metadata =
                importer.metadata().ok_or_else(|| RegistryError::MissingImporterMetadata(name.clone()))?;
            if metadata.extensions.is_empty() {
                return Err(RegistryError::EmptyExtensionList(name));
            }
            let default_processor = match &metadata.default_processor {
                Some(processor) => Some(Arc::clone(by_id.get(processor).ok_or_else(|| {
                    RegistryError::UnknownDefaultProcessor {
                        importer: name.clone(),
                        processor: processor.clone(),
                    }
                })?)),
                None => None,
            };
            for extension in &metadata.extensions {
                let key = extension_key(extension);
                if let Some(existing) = by_extension.get(&key) {
                    return Err(RegistryError::DuplicateExtension {
                        extension: key,
                        first: existing.importer.name().to_string(),
                        second: name,
                    });
                }
                by_extension.insert(
                    key,
                    ImporterEntry {
                        importer: Arc::clone(&importer),
                        default_processor: default_processor.clone(),
                    },
                );
            }
        }

        let mut by_type: HashMap<ValueType, Arc<dyn Writer>> = HashMap::new();
        for writer in writers {
            let value_type = writer
                .target_type()
                .ok_or_else(|| RegistryError::MissingWriterType(writer.name().to_string()))?;
            if let Some(existing) = by_type.get(&value_type) {
                return Err(RegistryError::DuplicateWriter {
                    value_type: value_type.name().to_string(),
                    first: existing.name().to_string(),
                    second: writer.name().to_string(),
                });
            }
            by_type.insert(value_type, writer);
        }

        tracing::debug!(
            importers = by_extension.len(),
            processors = by_id.len(),
            writers = by_type.len(),
            "component registry built"
        );

        Ok(Self {
            importers: by_extension,
            processors: by_name,
            writers: by_type,
        })
    }

    /// Importer registered for the asset's extension.
    pub fn importer_for(&self, asset: &Asset) -> Option<Arc<dyn Importer>> {
        self.importer_for_path(&asset.path)
    }

    pub fn importer_for_path(&self, path: &FilePath) -> Option<Arc<dyn Importer>> {
        self.entry_for(path).map(|entry| Arc::clone(&entry.importer))
    }

    fn entry_for(&self, path: &FilePath) -> Option<&ImporterEntry> {
        let extension = path.get_extension()?;
        self.importers.get(&extension_key(extension))
    }

    /// The asset's explicit processor, else its importer's default, else none.
    ///
    /// An explicit name that is not registered is an error rather than a
    /// silent fallback.
    pub fn processor_for(&self, asset: &Asset) -> Result<Option<Arc<dyn Processor>>, ProcessorNotFound> {
        if let Some(name) = &asset.processor_name {
            return self
                .processor_named(name)
                .map(Some)
                .ok_or_else(|| ProcessorNotFound(name.clone()));
        }
        Ok(self.entry_for(&asset.path).and_then(|entry| entry.default_processor.clone()))
    }

    /// Processor by id or display name.
    pub fn processor_named(&self, name: &str) -> Option<Arc<dyn Processor>> {
        self.processors.get(name).cloned()
    }

    /// Writer accepting exactly `value_type`.
    pub fn writer_for(&self, value_type: ValueType) -> Option<Arc<dyn Writer>> {
        self.writers.get(&value_type).cloned()
    }
}

impl std::fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut extensions: Vec<_> = self.importers.keys().collect();
        extensions.sort();
        f.debug_struct("ComponentRegistry")
            .field("extensions", &extensions)
            .field("writers", &self.writers.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// `PNG`, `.png` and `.PNG` all index as `.png`.
fn extension_key(extension: &str) -> String {
    format!(".{}", extension.trim().trim_start_matches('.').to_lowercase())
}
