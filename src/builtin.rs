//! Components shipped with the `assetpipe` binary.
//!
//! Text formats are imported as `String`, normalized to `\n` line endings and
//! written back out as UTF-8. `.bin` files are copied through as bytes.

use crate::build::Context;
use crate::path::FilePath;
use crate::registry::{
    AssetValue, Components, Importer, ImporterMetadata, PipelineError, Processor, ValueType, Writer,
};

/// Id of [`LineEndingProcessor`].
pub const NORMALIZE_LINE_ENDINGS: &str = "normalize-line-endings";

/// Extensions handled by [`TextImporter`].
pub const TEXT_EXTENSIONS: &[&str] = &[".txt", ".json", ".toml", ".xml", ".csv"];

/// The full built-in component set.
pub fn components() -> Components {
    Components::new()
        .with_importer(TextImporter)
        .with_importer(BinaryImporter)
        .with_processor(LineEndingProcessor)
        .with_writer(TextWriter)
        .with_writer(BinaryWriter)
}

/// Reads UTF-8 text files.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextImporter;

impl Importer for TextImporter {
    fn name(&self) -> &str {
        "TextImporter"
    }

    fn metadata(&self) -> Option<ImporterMetadata> {
        Some(ImporterMetadata::new(TEXT_EXTENSIONS.iter().copied()).with_default_processor(NORMALIZE_LINE_ENDINGS))
    }

    fn import(&self, source: &FilePath, context: &mut Context<'_>) -> Result<Option<AssetValue>, PipelineError> {
        let text = context.file_system().read_to_string(source)?;
        Ok(Some(AssetValue::new(text)))
    }
}

/// Reads files as raw bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct BinaryImporter;

impl Importer for BinaryImporter {
    fn name(&self) -> &str {
        "BinaryImporter"
    }

    fn metadata(&self) -> Option<ImporterMetadata> {
        Some(ImporterMetadata::new([".bin"]))
    }

    fn import(&self, source: &FilePath, context: &mut Context<'_>) -> Result<Option<AssetValue>, PipelineError> {
        let bytes = context.file_system().read(source)?;
        Ok(Some(AssetValue::new(bytes)))
    }
}

/// Converts `\r\n` and lone `\r` to `\n`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LineEndingProcessor;

impl Processor for LineEndingProcessor {
    fn id(&self) -> &str {
        NORMALIZE_LINE_ENDINGS
    }

    fn display_name(&self) -> Option<&str> {
        Some("NormalizeLineEndings")
    }

    fn source_type(&self) -> Option<ValueType> {
        Some(ValueType::of::<String>())
    }

    fn target_type(&self) -> Option<ValueType> {
        Some(ValueType::of::<String>())
    }

    fn process(&self, value: AssetValue, _context: &mut Context<'_>) -> Result<Option<AssetValue>, PipelineError> {
        let text = value.downcast::<String>().map_err(|v| format!("expected a String, got {}", v.value_type()))?;
        Ok(Some(AssetValue::new(normalize_line_endings(&text))))
    }
}

fn normalize_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

/// Writes `String` values as UTF-8.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextWriter;

impl Writer for TextWriter {
    fn name(&self) -> &str {
        "TextWriter"
    }

    fn target_type(&self) -> Option<ValueType> {
        Some(ValueType::of::<String>())
    }

    fn write(&self, value: &AssetValue, target: &FilePath, context: &mut Context<'_>) -> Result<(), PipelineError> {
        let text = value.downcast_ref::<String>().ok_or("TextWriter received a value that is not a String")?;
        context.file_system().write(target, text.as_bytes())?;
        Ok(())
    }
}

/// Writes `Vec<u8>` values verbatim.
#[derive(Debug, Clone, Copy, Default)]
pub struct BinaryWriter;

impl Writer for BinaryWriter {
    fn name(&self) -> &str {
        "BinaryWriter"
    }

    fn target_type(&self) -> Option<ValueType> {
        Some(ValueType::of::<Vec<u8>>())
    }

    fn write(&self, value: &AssetValue, target: &FilePath, context: &mut Context<'_>) -> Result<(), PipelineError> {
        let bytes = value.downcast_ref::<Vec<u8>>().ok_or("BinaryWriter received a value that is not bytes")?;
        context.file_system().write(target, bytes)?;
        Ok(())
    }
}
