//! Pipeline component traits and the collection they are registered from.

use super::value::{AssetValue, ValueType};
use crate::build::Context;
use crate::path::FilePath;
use std::fmt;
use std::sync::Arc;

/// Error type returned by component implementations.
pub type PipelineError = Box<dyn std::error::Error + Send + Sync>;

/// Registration data an importer declares about itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImporterMetadata {
    /// Extensions handled, with or without the leading dot
    pub extensions: Vec<String>,
    /// Id of the processor used when an asset names none
    pub default_processor: Option<String>,
}

impl ImporterMetadata {
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { extensions: extensions.into_iter().map(Into::into).collect(), default_processor: None }
    }

    pub fn with_default_processor(mut self, id: impl Into<String>) -> Self {
        self.default_processor = Some(id.into());
        self
    }
}

/// Reads a source file into a value.
pub trait Importer: Send + Sync {
    /// Name used in error and log messages.
    fn name(&self) -> &str;

    /// `None` makes the importer unregistrable.
    fn metadata(&self) -> Option<ImporterMetadata>;

    /// Import `source`. `Ok(None)` is reported as a failed import.
    fn import(
        &self,
        source: &FilePath,
        context: &mut Context<'_>,
    ) -> Result<Option<AssetValue>, PipelineError>;
}

/// Transforms a value of one type into another.
pub trait Processor: Send + Sync {
    /// Stable identity referenced by importer defaults.
    fn id(&self) -> &str;

    /// Name matched against an asset's explicit processor, besides the id.
    fn display_name(&self) -> Option<&str> {
        None
    }

    fn source_type(&self) -> Option<ValueType>;

    fn target_type(&self) -> Option<ValueType>;

    fn process(
        &self,
        value: AssetValue,
        context: &mut Context<'_>,
    ) -> Result<Option<AssetValue>, PipelineError>;
}

/// Persists a value to its target file.
pub trait Writer: Send + Sync {
    fn name(&self) -> &str;

    /// The exact type this writer accepts.
    fn target_type(&self) -> Option<ValueType>;

    fn write(
        &self,
        value: &AssetValue,
        target: &FilePath,
        context: &mut Context<'_>,
    ) -> Result<(), PipelineError>;
}

/// The already-instantiated components a registry is built from.
#[derive(Clone, Default)]
pub struct Components {
    pub(crate) importers: Vec<Arc<dyn Importer>>,
    pub(crate) processors: Vec<Arc<dyn Processor>>,
    pub(crate) writers: Vec<Arc<dyn Writer>>,
}

impl Components {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_importer(mut self, importer: impl Importer + 'static) -> Self {
        self.importers.push(Arc::new(importer));
        self
    }

    pub fn with_processor(mut self, processor: impl Processor + 'static) -> Self {
        self.processors.push(Arc::new(processor));
        self
    }

    pub fn with_writer(mut self, writer: impl Writer + 'static) -> Self {
        self.writers.push(Arc::new(writer));
        self
    }

    /// Append every component of `other`.
    pub fn extend(mut self, other: Components) -> Self {
        self.importers.extend(other.importers);
        self.processors.extend(other.processors);
        self.writers.extend(other.writers);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.importers.is_empty() && self.processors.is_empty() && self.writers.is_empty()
    }
}

impl fmt::Debug for Components {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Components")
            .field("importers", &self.importers.iter().map(|i| i.name()).collect::<Vec<_>>())
            .field("processors", &self.processors.iter().map(|p| p.id()).collect::<Vec<_>>())
            .field("writers", &self.writers.iter().map(|w| w.name()).collect::<Vec<_>>())
            .finish()
    }
}
