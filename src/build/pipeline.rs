//! Per-asset import, process and write pipeline.

use crate::build::{Asset, AssetBuildResult, AssetFailure, Context};
use crate::config::BuildConfiguration;
use crate::io::{FileSystem, HashComputer};
use crate::log::BuildLog;
use crate::path::DirectoryPath;
use crate::registry::{AssetValue, ComponentRegistry, ValueType};

/// Runs one asset through its importer, optional processor and writer.
///
/// Content problems never escape as errors: every failure becomes an
/// [`AssetBuildResult`] with [`BuildStatus::Failure`](crate::build::BuildStatus)
/// and a message, so one bad asset does not stop the rest of the build.
pub struct AssetBuilder<'a> {
    file_system: &'a dyn FileSystem,
    registry: &'a ComponentRegistry,
    hasher: &'a dyn HashComputer,
    log: &'a dyn BuildLog,
}

impl<'a> AssetBuilder<'a> {
    pub fn new(
        file_system: &'a dyn FileSystem,
        registry: &'a ComponentRegistry,
        hasher: &'a dyn HashComputer,
        log: &'a dyn BuildLog,
    ) -> Self {
        Self { file_system, registry, hasher, log }
    }

    /// Build a single asset.
    pub fn build(&self, asset: &Asset, configuration: &BuildConfiguration) -> AssetBuildResult {
        match self.run(asset, configuration) {
            Ok(result) => result,
            Err(failure) => AssetBuildResult::failed(asset.clone(), failure),
        }
    }

    fn run(&self, asset: &Asset, configuration: &BuildConfiguration) -> Result<AssetBuildResult, AssetFailure> {
        let name = asset.path.to_string();
        let input = configuration
            .input_directory
            .as_ref()
            .ok_or(AssetFailure::DirectoryNotConfigured("input"))?;
        let output = configuration
            .output_directory
            .as_ref()
            .ok_or(AssetFailure::DirectoryNotConfigured("output"))?;

        let Some(extension) = asset.path.get_extension() else {
            return Err(AssetFailure::MissingExtension(name));
        };

        let source = input.combine_file(&asset.path);
        if !self.file_system.file_exists(&source) {
            return Err(AssetFailure::SourceNotFound(name, input.to_string()));
        }

        let importer = self
            .registry
            .importer_for(asset)
            .ok_or_else(|| AssetFailure::NoImporter(name.clone(), extension.to_string()))?;

        let mut context = Context::new(asset, configuration, input, self.file_system, self.hasher, self.log);

        self.log.verbose(&format!("Importing {} with {}.", name, importer.name()));
        let imported = importer
            .import(&source, &mut context)
            .map_err(|e| AssetFailure::ImportFailed(name.clone(), e.to_string()))?
            .ok_or_else(|| AssetFailure::ImportNull(name.clone()))?;

        let processor = match self.registry.processor_for(asset) {
            Ok(processor) => processor,
            Err(missing) => {
                imported.dispose();
                return Err(AssetFailure::ProcessorNotFound(name, missing.0));
            }
        };

        let value = match processor {
            None => imported,
            Some(processor) => {
                let id = processor.id().to_string();
                if processor.source_type() != Some(imported.value_type()) {
                    let failure = AssetFailure::SourceTypeMismatch(
                        name,
                        id,
                        type_name(processor.source_type()),
                        imported.value_type().name(),
                    );
                    imported.dispose();
                    return Err(failure);
                }

                self.log.verbose(&format!("Processing {} with {}.", name, id));
                let processed = processor
                    .process(imported, &mut context)
                    .map_err(|e| AssetFailure::ProcessFailed(name.clone(), id.clone(), e.to_string()))?
                    .ok_or_else(|| AssetFailure::ProcessNull(name.clone(), id.clone()))?;

                if processor.target_type() != Some(processed.value_type()) {
                    let failure = AssetFailure::TargetTypeMismatch(
                        name,
                        id,
                        type_name(processor.target_type()),
                        processed.value_type().name(),
                    );
                    processed.dispose();
                    return Err(failure);
                }
                processed
            }
        };

        let result = self.write(asset, &name, &value, output, configuration, &mut context);
        value.dispose();
        result?;

        let length = self
            .file_system
            .file_length(&source)
            .map_err(|e| AssetFailure::SourceUnreadable(name.clone(), e.to_string()))?;
        let checksum = self
            .hasher
            .compute(self.file_system, &source)
            .map_err(|e| AssetFailure::SourceUnreadable(name.clone(), e.to_string()))?;

        Ok(AssetBuildResult::success(asset.clone(), length, checksum, context.into_dependencies()))
    }

    fn write(
        &self,
        asset: &Asset,
        name: &str,
        value: &AssetValue,
        output: &DirectoryPath,
        configuration: &BuildConfiguration,
        context: &mut Context<'_>,
    ) -> Result<(), AssetFailure> {
        let writer = self
            .registry
            .writer_for(value.value_type())
            .ok_or_else(|| AssetFailure::NoWriter(name.to_string(), value.value_type().name()))?;

        let target = asset.target_path(output, &configuration.target_extension);
        let directory = target.get_directory();
        if !self.file_system.directory_exists(&directory) {
            self.file_system.create_directory(&directory).map_err(|e| {
                AssetFailure::TargetDirectory(name.to_string(), directory.to_string(), e.to_string())
            })?;
        }

        self.log.verbose(&format!("Writing {} to {} with {}.", name, target, writer.name()));
        writer
            .write(value, &target, context)
            .map_err(|e| AssetFailure::WriteFailed(name.to_string(), target.to_string(), e.to_string()))
    }
}

fn type_name(value_type: Option<ValueType>) -> &'static str {
    value_type.map_or("an undeclared type", |t| t.name())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::BuildStatus;
    use crate::io::{InMemoryFileSystem, Sha256Hasher};
    use crate::log::MemoryLog;
    use crate::path::FilePath;
    use crate::registry::{
        Components, Disposable, Importer, ImporterMetadata, PipelineError, Processor, Writer,
    };
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Handle(Arc<AtomicUsize>);

    impl Disposable for Handle {
        fn dispose(&mut self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct HandleImporter(Arc<AtomicUsize>);

    impl Importer for HandleImporter {
        fn name(&self) -> &str {
            "HandleImporter"
        }

        fn metadata(&self) -> Option<ImporterMetadata> {
            Some(ImporterMetadata::new([".h"]))
        }

        fn import(&self, _: &FilePath, _: &mut Context<'_>) -> Result<Option<AssetValue>, PipelineError> {
            Ok(Some(AssetValue::disposable(Handle(self.0.clone()))))
        }
    }

    struct NumberImporter;

    impl Importer for NumberImporter {
        fn name(&self) -> &str {
            "NumberImporter"
        }

        fn metadata(&self) -> Option<ImporterMetadata> {
            Some(ImporterMetadata::new([".num"]))
        }

        fn import(&self, source: &FilePath, context: &mut Context<'_>) -> Result<Option<AssetValue>, PipelineError> {
            let value: i64 = context.file_system().read_to_string(source)?.trim().parse()?;
            Ok(Some(AssetValue::new(value)))
        }
    }

    /// Doubles numbers. Negative input yields nothing; zero yields the wrong type.
    struct Doubler;

    impl Processor for Doubler {
        fn id(&self) -> &str {
            "double"
        }

        fn source_type(&self) -> Option<ValueType> {
            Some(ValueType::of::<i64>())
        }

        fn target_type(&self) -> Option<ValueType> {
            Some(ValueType::of::<i64>())
        }

        fn process(&self, value: AssetValue, _: &mut Context<'_>) -> Result<Option<AssetValue>, PipelineError> {
            match value.downcast::<i64>() {
                Ok(n) if n < 0 => Ok(None),
                Ok(0) => Ok(Some(AssetValue::new("zero".to_string()))),
                Ok(n) => Ok(Some(AssetValue::new(n * 2))),
                Err(_) => Err("not a number".into()),
            }
        }
    }

    struct NumberWriter;

    impl Writer for NumberWriter {
        fn name(&self) -> &str {
            "NumberWriter"
        }

        fn target_type(&self) -> Option<ValueType> {
            Some(ValueType::of::<i64>())
        }

        fn write(&self, value: &AssetValue, target: &FilePath, context: &mut Context<'_>) -> Result<(), PipelineError> {
            let n = value.downcast_ref::<i64>().ok_or("expected a number")?;
            context.file_system().write(target, n.to_string().as_bytes())?;
            Ok(())
        }
    }

    struct Fixture {
        fs: InMemoryFileSystem,
        registry: ComponentRegistry,
        disposed: Arc<AtomicUsize>,
        configuration: BuildConfiguration,
    }

    fn fixture() -> Fixture {
        let disposed = Arc::new(AtomicUsize::new(0));
        let components = Components::new()
            .with_importer(HandleImporter(disposed.clone()))
            .with_importer(NumberImporter)
            .with_processor(Doubler)
            .with_writer(NumberWriter);
        Fixture {
            fs: InMemoryFileSystem::new(),
            registry: ComponentRegistry::new(components).unwrap(),
            disposed,
            configuration: BuildConfiguration::new(
                DirectoryPath::new("/in").unwrap(),
                DirectoryPath::new("/out").unwrap(),
            ),
        }
    }

    fn build(fixture: &Fixture, path: &str, processor: Option<&str>) -> AssetBuildResult {
        let log = MemoryLog::new();
        let hasher = Sha256Hasher::new();
        let builder = AssetBuilder::new(&fixture.fs, &fixture.registry, &hasher, &log);
        let asset = Asset::new(
            FilePath::new(path).unwrap(),
            Default::default(),
            processor.map(str::to_string),
        );
        builder.build(&asset, &fixture.configuration)
    }

    #[test]
    fn test_build_with_named_processor() {
        let f = fixture();
        f.fs.add_file("/in/value.num", "21").unwrap();

        let result = build(&f, "value.num", Some("double"));

        assert_eq!(result.status, BuildStatus::Success);
        assert_eq!(result.length, 2);
        assert_eq!(f.fs.contents("/out/value.asset").unwrap(), Some(b"42".to_vec()));
    }

    #[test]
    fn test_build_without_processor() {
        let f = fixture();
        f.fs.add_file("/in/value.num", "21").unwrap();

        let result = build(&f, "value.num", None);

        assert_eq!(result.status, BuildStatus::Success);
        assert_eq!(f.fs.contents("/out/value.asset").unwrap(), Some(b"21".to_vec()));
    }

    #[test]
    fn test_import_error_becomes_failure() {
        let f = fixture();
        f.fs.add_file("/in/value.num", "twenty").unwrap();

        let result = build(&f, "value.num", None);

        assert_eq!(result.status, BuildStatus::Failure);
        assert!(result.message.starts_with("Import of value.num failed: "));
        assert!(f.fs.contents("/out/value.asset").unwrap().is_none());
    }

    #[test]
    fn test_process_null_becomes_failure() {
        let f = fixture();
        f.fs.add_file("/in/value.num", "-1").unwrap();

        let result = build(&f, "value.num", Some("double"));

        assert_eq!(result.message, "Processing of value.num by double resulted in null.");
    }

    #[test]
    fn test_processor_output_type_is_checked() {
        let f = fixture();
        f.fs.add_file("/in/value.num", "0").unwrap();

        let result = build(&f, "value.num", Some("double"));

        assert_eq!(result.status, BuildStatus::Failure);
        assert!(result.message.starts_with("Processor double declares i64 but produced "));
        assert!(result.message.ends_with("String for value.num."));
    }

    #[test]
    fn test_missing_writer_disposes_value() {
        let f = fixture();
        f.fs.add_file("/in/thing.h", "").unwrap();

        let result = build(&f, "thing.h", None);

        assert_eq!(result.status, BuildStatus::Failure);
        assert!(result.message.starts_with("No writer is registered for "));
        assert_eq!(f.disposed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_source_type_mismatch_disposes_value() {
        let f = fixture();
        f.fs.add_file("/in/thing.h", "").unwrap();

        let result = build(&f, "thing.h", Some("double"));

        assert!(result.message.starts_with("Processor double expects i64 but thing.h was imported as "));
        assert_eq!(f.disposed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_missing_directories_fail() {
        let mut f = fixture();
        f.configuration.output_directory = None;
        f.fs.add_file("/in/value.num", "1").unwrap();

        let result = build(&f, "value.num", None);

        assert_eq!(result.message, "No output directory has been configured.");
    }
}
