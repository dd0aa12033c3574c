//! Build System Test Suite
//!
//! Integration tests for the assetpipe build engine.
//! Tests cover the full build pipeline including:
//!
//! - Pipeline execution and per-asset failures
//! - Incremental builds and rebuild reasons
//! - Configuration validation
//! - Manifest persistence across runs

use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

use assetpipe::build::{BuildEngine, BuildError, BuildManifest, BuildStatus, Context};
use assetpipe::builtin;
use assetpipe::config::{load_config, AssetDefinition, BuildConfiguration};
use assetpipe::io::{Environment, FileSystem, InMemoryFileSystem, Platform};
use assetpipe::log::MemoryLog;
use assetpipe::path::{DirectoryPath, FilePath, PathLike};
use assetpipe::registry::{
    AssetValue, Components, Disposable, Importer, ImporterMetadata, PipelineError, ValueType, Writer,
};

// ============================================================================
// Test Components
// ============================================================================

/// `.null` files import as nothing.
struct NullImporter;

impl Importer for NullImporter {
    fn name(&self) -> &str {
        "NullImporter"
    }

    fn metadata(&self) -> Option<ImporterMetadata> {
        Some(ImporterMetadata::new([".null"]))
    }

    fn import(&self, _: &FilePath, _: &mut Context<'_>) -> Result<Option<AssetValue>, PipelineError> {
        Ok(None)
    }
}

/// `.dat` files import as text and count how often they were imported.
struct CountingImporter(Arc<AtomicUsize>);

impl Importer for CountingImporter {
    fn name(&self) -> &str {
        "CountingImporter"
    }

    fn metadata(&self) -> Option<ImporterMetadata> {
        Some(ImporterMetadata::new([".dat"]))
    }

    fn import(&self, source: &FilePath, context: &mut Context<'_>) -> Result<Option<AssetValue>, PipelineError> {
        self.0.fetch_add(1, Ordering::SeqCst);
        Ok(Some(AssetValue::new(context.file_system().read_to_string(source)?)))
    }
}

/// `.fx` files record every `#include <path>` line as a dependency.
struct ShaderImporter;

impl Importer for ShaderImporter {
    fn name(&self) -> &str {
        "ShaderImporter"
    }

    fn metadata(&self) -> Option<ImporterMetadata> {
        Some(ImporterMetadata::new([".fx"]))
    }

    fn import(&self, source: &FilePath, context: &mut Context<'_>) -> Result<Option<AssetValue>, PipelineError> {
        let text = context.file_system().read_to_string(source)?;
        for line in text.lines() {
            if let Some(include) = line.strip_prefix("#include ") {
                context.add_dependency(&FilePath::new(include)?)?;
            }
        }
        Ok(Some(AssetValue::new(text)))
    }
}

/// `.lie` files claim to feed the text processor but produce bytes.
struct LyingImporter;

impl Importer for LyingImporter {
    fn name(&self) -> &str {
        "LyingImporter"
    }

    fn metadata(&self) -> Option<ImporterMetadata> {
        Some(ImporterMetadata::new([".lie"]).with_default_processor(builtin::NORMALIZE_LINE_ENDINGS))
    }

    fn import(&self, source: &FilePath, context: &mut Context<'_>) -> Result<Option<AssetValue>, PipelineError> {
        Ok(Some(AssetValue::new(context.file_system().read(source)?)))
    }
}

type Events = Arc<Mutex<Vec<String>>>;

struct Resource {
    events: Events,
}

impl Disposable for Resource {
    fn dispose(&mut self) {
        self.events.lock().unwrap().push("dispose".to_string());
    }
}

/// `.res` files import as a disposable [`Resource`].
struct ResourceImporter(Events);

impl Importer for ResourceImporter {
    fn name(&self) -> &str {
        "ResourceImporter"
    }

    fn metadata(&self) -> Option<ImporterMetadata> {
        Some(ImporterMetadata::new([".res"]))
    }

    fn import(&self, _: &FilePath, _: &mut Context<'_>) -> Result<Option<AssetValue>, PipelineError> {
        Ok(Some(AssetValue::disposable(Resource { events: self.0.clone() })))
    }
}

struct ResourceWriter(Events);

impl Writer for ResourceWriter {
    fn name(&self) -> &str {
        "ResourceWriter"
    }

    fn target_type(&self) -> Option<ValueType> {
        Some(ValueType::of::<Resource>())
    }

    fn write(&self, _: &AssetValue, target: &FilePath, context: &mut Context<'_>) -> Result<(), PipelineError> {
        self.0.lock().unwrap().push("write".to_string());
        context.file_system().write(target, b"resource")?;
        Ok(())
    }
}

// ============================================================================
// Test Utilities
// ============================================================================

struct Harness {
    fs: InMemoryFileSystem,
    log: MemoryLog,
    imports: Arc<AtomicUsize>,
    events: Events,
    engine: BuildEngine,
}

fn harness() -> Harness {
    let fs = InMemoryFileSystem::new();
    fs.add_directory("/in").unwrap();
    let log = MemoryLog::new();
    let imports = Arc::new(AtomicUsize::new(0));
    let events: Events = Arc::default();

    let components = builtin::components().extend(
        Components::new()
            .with_importer(NullImporter)
            .with_importer(CountingImporter(imports.clone()))
            .with_importer(ShaderImporter)
            .with_importer(LyingImporter)
            .with_importer(ResourceImporter(events.clone()))
            .with_writer(ResourceWriter(events.clone())),
    );
    let environment =
        Environment::new(Arc::new(fs.clone()), DirectoryPath::new("/").unwrap(), Platform::Unix);
    let engine = BuildEngine::new(environment, components).unwrap().with_log(log.clone());

    Harness { fs, log, imports, events, engine }
}

fn dir(path: &str) -> DirectoryPath {
    DirectoryPath::new(path).unwrap()
}

fn config(assets: &[&str]) -> BuildConfiguration {
    assets
        .iter()
        .fold(BuildConfiguration::new(dir("/in"), dir("/out")), |config, path| {
            config.with_asset(AssetDefinition::new(*path))
        })
}

fn text(fs: &InMemoryFileSystem, path: &str) -> Option<String> {
    fs.contents(path).unwrap().map(|bytes| String::from_utf8(bytes).unwrap())
}

// ============================================================================
// Pipeline Integration Tests
// ============================================================================

#[test]
fn test_build_writes_targets() {
    let h = harness();
    h.fs.add_file("/in/docs/readme.txt", "line one\r\nline two\r\n").unwrap();
    h.fs.add_file("/in/blob.bin", [0u8, 1, 2, 255]).unwrap();

    let manifest = h.engine.build(&mut config(&["docs/readme.txt", "blob.bin"]), None).unwrap();

    assert_eq!(manifest.len(), 2);
    assert!(manifest.items().iter().all(|i| i.status == BuildStatus::Success));
    assert_eq!(text(&h.fs, "/out/docs/readme.asset").as_deref(), Some("line one\nline two\n"));
    assert_eq!(h.fs.contents("/out/blob.asset").unwrap(), Some(vec![0u8, 1, 2, 255]));

    let readme = &manifest.items()[0];
    assert_eq!(readme.asset.path.full_path(), "docs/readme.txt");
    assert_eq!(readme.length, 20);
    assert_eq!(readme.checksum.len(), 64);
    assert!(readme.message.is_empty());
}

#[test]
fn test_glob_definitions_expand_in_order() {
    let h = harness();
    h.fs.add_file("/in/Hello/World/Text.txt", "a").unwrap();
    h.fs.add_file("/in/Goodbye/OtherText.txt", "b").unwrap();
    h.fs.add_file("/in/Goodbye/ignored.bin", "c").unwrap();

    let manifest = h.engine.build(&mut config(&["**/*.txt"]), None).unwrap();

    let paths: Vec<_> = manifest.items().iter().map(|i| i.asset.path.full_path()).collect();
    assert_eq!(paths, vec!["Goodbye/OtherText.txt", "Hello/World/Text.txt"]);
}

#[test]
fn test_null_import_fails_without_aborting_build() {
    let h = harness();
    h.fs.add_file("/in/broken.null", "").unwrap();
    h.fs.add_file("/in/fine.txt", "ok").unwrap();

    let manifest = h.engine.build(&mut config(&["broken.null", "fine.txt"]), None).unwrap();

    assert_eq!(manifest.len(), 2);
    assert_eq!(manifest.items()[0].status, BuildStatus::Failure);
    assert_eq!(manifest.items()[0].message, "Import of broken.null resulted in null.");
    assert_eq!(manifest.items()[1].status, BuildStatus::Success);
    assert_eq!(manifest.failure_count(), 1);
    assert!(h.log.contains("Failed to build broken.null: Import of broken.null resulted in null."));
}

#[test]
fn test_per_asset_failure_messages() {
    let h = harness();
    h.fs.add_file("/in/README", "no extension").unwrap();
    h.fs.add_file("/in/picture.png", "png").unwrap();
    h.fs.add_file("/in/named.txt", "text").unwrap();
    h.fs.add_file("/in/typed.lie", "bytes").unwrap();

    let mut configuration = config(&["README", "missing.txt", "picture.png", "typed.lie"])
        .with_asset(AssetDefinition::new("named.txt").with_processor("DoesNotExist"));
    let manifest = h.engine.build(&mut configuration, None).unwrap();

    let messages: Vec<_> = manifest.items().iter().map(|i| i.message.as_str()).collect();
    assert_eq!(messages[0], "Asset README does not have a file extension.");
    assert_eq!(messages[1], "Source file missing.txt does not exist in /in.");
    assert_eq!(messages[2], "No importer is registered for .png (asset picture.png).");
    assert!(messages[3].starts_with("Processor normalize-line-endings expects "));
    assert!(messages[3].contains("but typed.lie was imported as "));
    assert_eq!(messages[4], "Processor DoesNotExist requested by named.txt could not be found.");
    assert!(manifest.items().iter().all(|i| i.status == BuildStatus::Failure));
}

#[test]
fn test_named_processor_by_display_name() {
    let h = harness();
    h.fs.add_file("/in/notes.dat", "a\r\nb").unwrap();

    let mut configuration = BuildConfiguration::new(dir("/in"), dir("/out"))
        .with_asset(AssetDefinition::new("notes.dat").with_processor("NormalizeLineEndings"));
    let manifest = h.engine.build(&mut configuration, None).unwrap();

    assert_eq!(manifest.items()[0].status, BuildStatus::Success);
    assert_eq!(text(&h.fs, "/out/notes.asset").as_deref(), Some("a\nb"));
}

#[test]
fn test_target_directory_creation_failure() {
    let h = harness();
    h.fs.add_file("/in/sub/a.txt", "a").unwrap();
    h.fs.add_file("/out/sub", "in the way").unwrap();

    let manifest = h.engine.build(&mut config(&["sub/a.txt"]), None).unwrap();

    let item = &manifest.items()[0];
    assert_eq!(item.status, BuildStatus::Failure);
    assert!(item.message.starts_with("Could not create target directory /out/sub for sub/a.txt"));
}

#[test]
fn test_dispose_runs_after_writer() {
    let h = harness();
    h.fs.add_file("/in/thing.res", "").unwrap();

    let manifest = h.engine.build(&mut config(&["thing.res"]), None).unwrap();

    assert_eq!(manifest.items()[0].status, BuildStatus::Success);
    assert_eq!(*h.events.lock().unwrap(), vec!["write".to_string(), "dispose".to_string()]);
}

#[test]
fn test_dependencies_are_recorded() {
    let h = harness();
    h.fs.add_file("/in/lit.fx", "#include common/light.fxh\nmain").unwrap();
    h.fs.add_file("/in/common/light.fxh", "light").unwrap();

    let manifest = h.engine.build(&mut config(&["lit.fx"]), None).unwrap();

    let item = &manifest.items()[0];
    assert_eq!(item.status, BuildStatus::Success);
    assert_eq!(item.dependencies.len(), 1);
    assert_eq!(item.dependencies[0].path.full_path(), "common/light.fxh");
    assert_eq!(item.dependencies[0].file_size, 5);
}

#[test]
fn test_missing_dependency_fails_asset() {
    let h = harness();
    h.fs.add_file("/in/lit.fx", "#include common/missing.fxh").unwrap();

    let manifest = h.engine.build(&mut config(&["lit.fx"]), None).unwrap();

    let item = &manifest.items()[0];
    assert_eq!(item.status, BuildStatus::Failure);
    assert_eq!(item.message, "Import of lit.fx failed: Dependency /in/common/missing.fxh does not exist.");
}

// ============================================================================
// Configuration Tests
// ============================================================================

#[test]
fn test_configuration_errors() {
    let h = harness();

    let mut missing_input = BuildConfiguration { output_directory: Some(dir("/out")), ..Default::default() };
    assert!(matches!(h.engine.build(&mut missing_input, None), Err(BuildError::MissingInputDirectory)));

    let mut missing_output = BuildConfiguration { input_directory: Some(dir("/in")), ..Default::default() };
    assert!(matches!(h.engine.build(&mut missing_output, None), Err(BuildError::MissingOutputDirectory)));

    let mut relative_input = BuildConfiguration::new(dir("in"), dir("/out"));
    assert_eq!(
        h.engine.build(&mut relative_input, None).unwrap_err().to_string(),
        "The input directory 'in' is not an absolute path."
    );

    let mut relative_output = BuildConfiguration::new(dir("/in"), dir("out"));
    assert!(matches!(
        h.engine.build(&mut relative_output, None),
        Err(BuildError::RelativeOutputDirectory(_))
    ));

    let mut absent_input = BuildConfiguration::new(dir("/nowhere"), dir("/out"));
    assert_eq!(
        h.engine.build(&mut absent_input, None).unwrap_err().to_string(),
        "The input directory '/nowhere' does not exist."
    );
}

#[test]
fn test_directories_are_collapsed_in_place() {
    let h = harness();
    let mut configuration = BuildConfiguration::new(dir("/in/sub/.."), dir("/out/./x/.."));

    let manifest = h.engine.build(&mut configuration, None).unwrap();

    assert!(manifest.is_empty());
    assert_eq!(configuration.input_directory, Some(dir("/in")));
    assert_eq!(configuration.output_directory, Some(dir("/out")));
}

#[test]
fn test_no_definitions_returns_empty_manifest() {
    let h = harness();
    let manifest = h.engine.build(&mut config(&[]), None).unwrap();

    assert!(manifest.is_empty());
    assert!(!h.fs.directory_exists(&dir("/out")));
}

#[test]
fn test_disposed_engine_refuses_to_build() {
    let mut h = harness();
    h.engine.dispose();

    let err = h.engine.build(&mut config(&[]), None).unwrap_err();
    assert!(matches!(err, BuildError::Disposed));
    assert_eq!(err.to_string(), "The build engine has been disposed.");
}

#[test]
fn test_definition_outside_input_aborts_build() {
    let h = harness();
    h.fs.add_file("/outside.txt", "x").unwrap();
    let err = h.engine.build(&mut config(&["../outside.txt"]), None).unwrap_err();

    assert!(matches!(err, BuildError::OutsideInputDirectory { .. }));
}

// ============================================================================
// Incremental Build Tests
// ============================================================================

#[test]
fn test_incremental_second_run_skips_everything() {
    let h = harness();
    h.fs.add_file("/in/a.dat", "alpha").unwrap();
    h.fs.add_file("/in/b.dat", "beta").unwrap();
    let mut configuration = config(&["*.dat"]);

    let first = h.engine.build(&mut configuration, None).unwrap();
    assert_eq!(first.success_count(), 2);
    assert_eq!(h.imports.load(Ordering::SeqCst), 2);

    let second = h.engine.build(&mut configuration, Some(&first)).unwrap();
    assert_eq!(second.skipped_count(), 2);
    assert_eq!(h.imports.load(Ordering::SeqCst), 2);

    for (before, after) in first.items().iter().zip(second.items()) {
        assert_eq!(after.status, BuildStatus::Skipped);
        assert_eq!(after.asset, before.asset);
        assert_eq!(after.length, before.length);
        assert_eq!(after.checksum, before.checksum);
        assert_eq!(after.dependencies, before.dependencies);
    }

    let third = h.engine.build(&mut configuration, Some(&second)).unwrap();
    assert_eq!(third, second);
}

#[test]
fn test_skipped_item_takes_current_asset_definition() {
    let h = harness();
    h.fs.add_file("/in/a.dat", "alpha").unwrap();
    let mut configuration = config(&["a.dat"]);
    let first = h.engine.build(&mut configuration, None).unwrap();
    assert_eq!(first.items()[0].asset.processor_name, None);

    configuration.assets[0] = AssetDefinition::new("a.dat").with_processor("PassThrough");
    let second = h.engine.build(&mut configuration, Some(&first)).unwrap();

    let item = &second.items()[0];
    assert_eq!(item.status, BuildStatus::Skipped);
    assert_eq!(item.asset.processor_name.as_deref(), Some("PassThrough"));
    assert_eq!(item.checksum, first.items()[0].checksum);
    assert_eq!(h.imports.load(Ordering::SeqCst), 1);
}

#[test]
fn test_incremental_disabled_always_builds() {
    let h = harness();
    h.fs.add_file("/in/a.dat", "alpha").unwrap();
    let mut configuration = config(&["a.dat"]).with_incremental(false);

    let first = h.engine.build(&mut configuration, None).unwrap();
    let second = h.engine.build(&mut configuration, Some(&first)).unwrap();

    assert_eq!(second.success_count(), 1);
    assert_eq!(h.imports.load(Ordering::SeqCst), 2);
}

#[test]
fn test_rebuild_when_target_missing() {
    let h = harness();
    h.fs.add_file("/in/a.dat", "alpha").unwrap();
    let mut configuration = config(&["a.dat"]);
    let first = h.engine.build(&mut configuration, None).unwrap();

    h.fs.remove_file("/out/a.asset").unwrap();
    let second = h.engine.build(&mut configuration, Some(&first)).unwrap();

    assert_eq!(second.items()[0].status, BuildStatus::Success);
    assert!(h.log.contains("Rebuilding a.dat because its target /out/a.asset does not exist."));
    assert!(h.fs.contents("/out/a.asset").unwrap().is_some());
}

#[test]
fn test_rebuild_when_source_length_changes() {
    let h = harness();
    h.fs.add_file("/in/a.dat", "alpha").unwrap();
    let mut configuration = config(&["a.dat"]);
    let first = h.engine.build(&mut configuration, None).unwrap();

    h.fs.add_file("/in/a.dat", "alphabet").unwrap();
    let second = h.engine.build(&mut configuration, Some(&first)).unwrap();

    assert_eq!(second.items()[0].status, BuildStatus::Success);
    assert_eq!(second.items()[0].length, 8);
    assert!(h.log.contains("Rebuilding a.dat because its source length changed from 5 to 8."));
}

#[test]
fn test_rebuild_when_source_checksum_changes() {
    let h = harness();
    h.fs.add_file("/in/a.dat", "alpha").unwrap();
    let mut configuration = config(&["a.dat"]);
    let first = h.engine.build(&mut configuration, None).unwrap();

    h.fs.add_file("/in/a.dat", "ALPHA").unwrap();
    let second = h.engine.build(&mut configuration, Some(&first)).unwrap();

    assert_eq!(second.items()[0].status, BuildStatus::Success);
    assert_ne!(second.items()[0].checksum, first.items()[0].checksum);
    assert!(h.log.contains("Rebuilding a.dat because its source checksum changed."));
    assert_eq!(text(&h.fs, "/out/a.asset").as_deref(), Some("ALPHA"));
}

#[test]
fn test_rebuild_when_metadata_changes() {
    let h = harness();
    h.fs.add_file("/in/a.dat", "alpha").unwrap();
    let definition = AssetDefinition::new("a.dat").with_metadata("Quality", "high");
    let mut configuration = BuildConfiguration::new(dir("/in"), dir("/out")).with_asset(definition.clone());
    let first = h.engine.build(&mut configuration, None).unwrap();

    let mut changed = BuildConfiguration::new(dir("/in"), dir("/out"))
        .with_asset(definition.with_metadata("quality", "low"));
    let second = h.engine.build(&mut changed, Some(&first)).unwrap();

    assert_eq!(second.items()[0].status, BuildStatus::Success);
    assert!(h.log.contains("Rebuilding a.dat because its metadata changed."));
}

#[test]
fn test_rebuild_when_dependency_changes() {
    let h = harness();
    h.fs.add_file("/in/lit.fx", "#include light.fxh").unwrap();
    h.fs.add_file("/in/light.fxh", "light").unwrap();
    let mut configuration = config(&["lit.fx"]);
    let first = h.engine.build(&mut configuration, None).unwrap();

    h.fs.add_file("/in/light.fxh", "LIGHT").unwrap();
    let second = h.engine.build(&mut configuration, Some(&first)).unwrap();
    assert_eq!(second.items()[0].status, BuildStatus::Success);
    assert!(h.log.contains("Rebuilding lit.fx because the checksum of its dependency light.fxh changed."));

    h.fs.add_file("/in/light.fxh", "brighter").unwrap();
    let third = h.engine.build(&mut configuration, Some(&second)).unwrap();
    assert_eq!(third.items()[0].status, BuildStatus::Success);
    assert!(h.log.contains("Rebuilding lit.fx because the length of its dependency light.fxh changed."));

    h.fs.remove_file("/in/light.fxh").unwrap();
    let fourth = h.engine.build(&mut configuration, Some(&third)).unwrap();
    assert_eq!(fourth.items()[0].status, BuildStatus::Failure);
    assert!(h.log.contains("Rebuilding lit.fx because its dependency light.fxh does not exist."));
}

#[test]
fn test_previous_failures_are_retried() {
    let h = harness();
    let mut configuration = config(&["late.dat"]);
    let first = h.engine.build(&mut configuration, None).unwrap();
    assert_eq!(first.failure_count(), 1);

    h.fs.add_file("/in/late.dat", "here now").unwrap();
    let second = h.engine.build(&mut configuration, Some(&first)).unwrap();
    assert_eq!(second.success_count(), 1);
}

// ============================================================================
// Physical Filesystem Tests
// ============================================================================

#[test]
fn test_physical_build_with_config_file() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    fs::create_dir_all(root.join("content/data")).unwrap();
    fs::write(root.join("content/data/items.json"), "{\r\n}\r\n").unwrap();
    fs::write(root.join("content/data/table.csv"), "a,b\r\n").unwrap();
    fs::write(
        root.join("assetpipe.toml"),
        r#"
input = "content"
output = "build"

[[assets]]
path = "data/*.json"
metadata = { Kind = "table" }

[[assets]]
path = "data/table.csv"
"#,
    )
    .unwrap();

    let mut configuration = load_config(&root.join("assetpipe.toml")).unwrap();
    let environment = Environment::physical().unwrap();
    let engine = BuildEngine::new(environment, builtin::components()).unwrap();
    let fs_handle = engine.environment().file_system();

    let manifest = engine.build(&mut configuration, None).unwrap();
    assert_eq!(manifest.success_count(), 2, "{}", manifest.summary());

    let output = configuration.output_directory.clone().unwrap();
    manifest.save_to(fs_handle, &output).unwrap();
    assert_eq!(fs::read_to_string(root.join("build/data/items.asset")).unwrap(), "{\n}\n");
    assert!(root.join("build/.assetpipe-manifest").exists());

    let previous = BuildManifest::load_from(fs_handle, &output).unwrap().unwrap();
    assert_eq!(previous, manifest);

    let second = engine.build(&mut configuration, Some(&previous)).unwrap();
    assert_eq!(second.skipped_count(), 2);
    assert_eq!(second.items()[0].asset.metadata.get("kind"), Some("table"));
}
