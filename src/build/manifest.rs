//! Build manifest for tracking build state and enabling incremental builds.
//!
//! The manifest records the outcome of every asset in a build: status,
//! message, the source file's length and checksum, the asset's metadata and
//! the dependencies it read. The next build compares against it to decide
//! which assets can be skipped.
//!
//! # Manifest Format
//!
//! The manifest is stored in `.assetpipe-manifest` in the output directory as
//! little-endian binary. Strings are UTF-8 prefixed with their byte length as
//! a 7-bit variable-length integer.
//!
//! ```text
//! i32 version                      (1)
//! i32 item_count
//! item_count x {
//!     string path
//!     i32    status                (0 unknown, 1 failure, 2 success, 3 skipped)
//!     string message
//!     i64    length
//!     string checksum
//!     i32    metadata_count
//!     metadata_count x { string key, string value }
//!     i32    dependency_count
//!     dependency_count x { string path, i64 file_size, string checksum }
//! }
//! ```

use crate::build::{Asset, AssetBuildResult, AssetDependency, BuildStatus};
use crate::config::Metadata;
use crate::io::FileSystem;
use crate::path::{DirectoryPath, FilePath, PathComparer, PathError, PathLike};
use serde::Serialize;
use std::io::{self, Read, Write};

/// Current manifest format version.
pub const MANIFEST_VERSION: i32 = 1;

/// Default manifest filename.
pub const MANIFEST_FILENAME: &str = ".assetpipe-manifest";

/// Error during manifest operations.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ManifestError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Unsupported manifest version {found}, expected {expected}")]
    UnsupportedVersion { expected: i32, found: i32 },
    #[error("Invalid build status {0}")]
    InvalidStatus(i32),
    #[error("Invalid {what} count {count}")]
    InvalidCount { what: &'static str, count: i32 },
    #[error("Invalid length {0}")]
    InvalidLength(i64),
    #[error("Malformed string length prefix")]
    InvalidStringLength,
    #[error("String is not valid UTF-8: {0}")]
    InvalidString(#[from] std::string::FromUtf8Error),
    #[error("Invalid path in manifest: {0}")]
    InvalidPath(#[from] PathError),
}

/// A manifest entry is the build result it records.
pub type BuildManifestItem = AssetBuildResult;

/// Ordered record of a build's per-asset outcomes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildManifest {
    items: Vec<BuildManifestItem>,
}

impl BuildManifest {
    /// Create a new empty manifest.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, item: BuildManifestItem) {
        self.items.push(item);
    }

    pub fn items(&self) -> &[BuildManifestItem] {
        &self.items
    }

    /// Item recorded for the asset at `path`, compared under `comparer`.
    pub fn find(&self, path: &FilePath, comparer: &PathComparer) -> Option<&BuildManifestItem> {
        self.items.iter().find(|item| comparer.eq(&item.asset.path, path))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn success_count(&self) -> usize {
        self.count(BuildStatus::Success)
    }

    pub fn skipped_count(&self) -> usize {
        self.count(BuildStatus::Skipped)
    }

    pub fn failure_count(&self) -> usize {
        self.count(BuildStatus::Failure)
    }

    fn count(&self, status: BuildStatus) -> usize {
        self.items.iter().filter(|i| i.status == status).count()
    }

    /// Failed items.
    pub fn failures(&self) -> impl Iterator<Item = &BuildManifestItem> {
        self.items.iter().filter(|i| i.status.is_failure())
    }

    /// Check if the build had no failures.
    pub fn is_success(&self) -> bool {
        self.failure_count() == 0
    }

    /// Format a summary of the build.
    pub fn summary(&self) -> String {
        let mut lines = Vec::new();

        let success = self.success_count();
        let skipped = self.skipped_count();
        let failed = self.failure_count();
        let total = self.items.len();

        if failed > 0 {
            lines.push(format!(
                "Build failed: {} succeeded, {} skipped, {} failed ({} total)",
                success, skipped, failed, total
            ));
            for item in self.failures() {
                lines.push(format!("  - {}: {}", item.asset.path, item.message));
            }
        } else {
            lines.push(format!(
                "Build succeeded: {} built, {} skipped ({} total)",
                success, skipped, total
            ));
        }

        lines.join("\n")
    }

    /// Serialize to `writer`. The writer is flushed but not closed.
    pub fn save<W: Write + ?Sized>(&self, writer: &mut W) -> Result<(), ManifestError> {
        let mut out = Encoder { inner: writer };
        out.i32(MANIFEST_VERSION)?;
        out.count(self.items.len())?;
        for item in &self.items {
            out.string(item.asset.path.full_path())?;
            out.i32(item.status.code())?;
            out.string(&item.message)?;
            out.length(item.length)?;
            out.string(&item.checksum)?;
            out.count(item.asset.metadata.len())?;
            for (key, value) in item.asset.metadata.iter() {
                out.string(key)?;
                out.string(value)?;
            }
            out.count(item.dependencies.len())?;
            for dependency in &item.dependencies {
                out.string(dependency.path.full_path())?;
                out.length(dependency.file_size)?;
                out.string(&dependency.checksum)?;
            }
        }
        out.inner.flush()?;
        Ok(())
    }

    /// Deserialize from `reader`.
    pub fn load<R: Read + ?Sized>(reader: &mut R) -> Result<Self, ManifestError> {
        let mut input = Decoder { inner: reader };
        let version = input.i32()?;
        if version != MANIFEST_VERSION {
            return Err(ManifestError::UnsupportedVersion { expected: MANIFEST_VERSION, found: version });
        }

        let item_count = input.count("item")?;
        let mut items = Vec::with_capacity(item_count.min(1024));
        for _ in 0..item_count {
            let path = FilePath::new(&input.string()?)?;
            let code = input.i32()?;
            let status = BuildStatus::from_code(code).ok_or(ManifestError::InvalidStatus(code))?;
            let message = input.string()?;
            let length = input.length()?;
            let checksum = input.string()?;

            let mut metadata = Metadata::new();
            for _ in 0..input.count("metadata")? {
                let key = input.string()?;
                let value = input.string()?;
                metadata.insert(key, value);
            }

            let dependency_count = input.count("dependency")?;
            let mut dependencies = Vec::with_capacity(dependency_count.min(1024));
            for _ in 0..dependency_count {
                let path = FilePath::new(&input.string()?)?;
                let file_size = input.length()?;
                let checksum = input.string()?;
                dependencies.push(AssetDependency::new(path, file_size, checksum));
            }

            items.push(BuildManifestItem {
                asset: Asset::new(path, metadata, None),
                status,
                message,
                length,
                checksum,
                dependencies,
            });
        }

        Ok(Self { items })
    }

    /// Path of the manifest inside `output_directory`.
    pub fn path_in(output_directory: &DirectoryPath) -> FilePath {
        output_directory.combine_file(&FilePath::from_normalized(MANIFEST_FILENAME.to_string()))
    }

    /// Load the manifest stored in `output_directory`.
    ///
    /// Returns `Ok(None)` if the file doesn't exist.
    pub fn load_from(
        fs: &dyn FileSystem,
        output_directory: &DirectoryPath,
    ) -> Result<Option<Self>, ManifestError> {
        let path = Self::path_in(output_directory);
        if !fs.file_exists(&path) {
            return Ok(None);
        }
        let mut reader = fs.open_read(&path)?;
        Self::load(&mut reader).map(Some)
    }

    /// Save the manifest into `output_directory`, creating it if needed.
    pub fn save_to(&self, fs: &dyn FileSystem, output_directory: &DirectoryPath) -> Result<(), ManifestError> {
        if !fs.directory_exists(output_directory) {
            fs.create_directory(output_directory)?;
        }
        let mut writer = fs.create_file(&Self::path_in(output_directory))?;
        self.save(&mut writer)
    }
}

impl FromIterator<BuildManifestItem> for BuildManifest {
    fn from_iter<I: IntoIterator<Item = BuildManifestItem>>(iter: I) -> Self {
        Self { items: iter.into_iter().collect() }
    }
}

struct Encoder<'w, W: Write + ?Sized> {
    inner: &'w mut W,
}

impl<W: Write + ?Sized> Encoder<'_, W> {
    fn i32(&mut self, value: i32) -> io::Result<()> {
        self.inner.write_all(&value.to_le_bytes())
    }

    fn count(&mut self, value: usize) -> io::Result<()> {
        let value = i32::try_from(value)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "too many entries"))?;
        self.i32(value)
    }

    fn length(&mut self, value: u64) -> io::Result<()> {
        let value = i64::try_from(value)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "length out of range"))?;
        self.inner.write_all(&value.to_le_bytes())
    }

    fn string(&mut self, value: &str) -> io::Result<()> {
        let mut remaining = value.len();
        loop {
            let byte = (remaining & 0x7f) as u8;
            remaining >>= 7;
            if remaining == 0 {
                self.inner.write_all(&[byte])?;
                break;
            }
            self.inner.write_all(&[byte | 0x80])?;
        }
        self.inner.write_all(value.as_bytes())
    }
}

struct Decoder<'r, R: Read + ?Sized> {
    inner: &'r mut R,
}

impl<R: Read + ?Sized> Decoder<'_, R> {
    fn i32(&mut self) -> Result<i32, ManifestError> {
        let mut buf = [0u8; 4];
        self.inner.read_exact(&mut buf)?;
        Ok(i32::from_le_bytes(buf))
    }

    fn count(&mut self, what: &'static str) -> Result<usize, ManifestError> {
        let count = self.i32()?;
        usize::try_from(count).map_err(|_| ManifestError::InvalidCount { what, count })
    }

    fn length(&mut self) -> Result<u64, ManifestError> {
        let mut buf = [0u8; 8];
        self.inner.read_exact(&mut buf)?;
        let value = i64::from_le_bytes(buf);
        u64::try_from(value).map_err(|_| ManifestError::InvalidLength(value))
    }

    fn string(&mut self) -> Result<String, ManifestError> {
        let mut length: u32 = 0;
        let mut shift = 0;
        loop {
            if shift > 28 {
                return Err(ManifestError::InvalidStringLength);
            }
            let mut byte = [0u8; 1];
            self.inner.read_exact(&mut byte)?;
            length |= u32::from(byte[0] & 0x7f) << shift;
            if byte[0] & 0x80 == 0 {
                break;
            }
            shift += 7;
        }
        if length > i32::MAX as u32 {
            return Err(ManifestError::InvalidStringLength);
        }

        let mut bytes = Vec::new();
        Read::take(&mut *self.inner, u64::from(length)).read_to_end(&mut bytes)?;
        if bytes.len() != length as usize {
            return Err(io::Error::from(io::ErrorKind::UnexpectedEof).into());
        }
        Ok(String::from_utf8(bytes)?)
    }
}
