//! Filesystem and host abstractions consumed by the build.
//!
//! The build never touches `std::fs` directly. Everything goes through the
//! [`FileSystem`] trait so that builds can run against the real disk
//! ([`PhysicalFileSystem`]) or a fixture tree ([`InMemoryFileSystem`]).

mod hash;
mod memory;
mod physical;

pub use hash::{HashComputer, Sha256Hasher};
pub use memory::InMemoryFileSystem;
pub use physical::PhysicalFileSystem;

use crate::path::{DirectoryPath, FilePath};
use std::io::{self, Read, Write};
use std::sync::Arc;

/// A single child of a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirEntry {
    File(FilePath),
    Directory(DirectoryPath),
}

/// Filesystem operations needed by the build.
pub trait FileSystem: Send + Sync {
    /// Whether paths differing only by case name different entries.
    fn is_case_sensitive(&self) -> bool;

    fn file_exists(&self, path: &FilePath) -> bool;

    /// Length of a file in bytes.
    fn file_length(&self, path: &FilePath) -> io::Result<u64>;

    fn open_read(&self, path: &FilePath) -> io::Result<Box<dyn Read + '_>>;

    /// Create or truncate a file. The parent directory must exist.
    fn create_file(&self, path: &FilePath) -> io::Result<Box<dyn Write + '_>>;

    fn directory_exists(&self, path: &DirectoryPath) -> bool;

    /// Create a directory and any missing parents.
    fn create_directory(&self, path: &DirectoryPath) -> io::Result<()>;

    /// Immediate children of a directory.
    fn entries(&self, path: &DirectoryPath) -> io::Result<Vec<DirEntry>>;

    /// Read a whole file into memory.
    fn read(&self, path: &FilePath) -> io::Result<Vec<u8>> {
        let mut buffer = Vec::new();
        self.open_read(path)?.read_to_end(&mut buffer)?;
        Ok(buffer)
    }

    /// Read a whole file as UTF-8.
    fn read_to_string(&self, path: &FilePath) -> io::Result<String> {
        let mut buffer = String::new();
        self.open_read(path)?.read_to_string(&mut buffer)?;
        Ok(buffer)
    }

    /// Create or truncate a file and write `contents` to it.
    fn write(&self, path: &FilePath, contents: &[u8]) -> io::Result<()> {
        let mut file = self.create_file(path)?;
        file.write_all(contents)?;
        file.flush()
    }
}

/// Host operating system family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Unix,
    Windows,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(windows) {
            Platform::Windows
        } else {
            Platform::Unix
        }
    }
}

/// Everything the build needs to know about the host.
#[derive(Clone)]
pub struct Environment {
    file_system: Arc<dyn FileSystem>,
    working_directory: DirectoryPath,
    platform: Platform,
}

impl Environment {
    pub fn new(
        file_system: Arc<dyn FileSystem>,
        working_directory: DirectoryPath,
        platform: Platform,
    ) -> Self {
        Self { file_system, working_directory, platform }
    }

    /// Environment backed by the real disk and the process working directory.
    pub fn physical() -> io::Result<Self> {
        let cwd = std::env::current_dir()?;
        let working_directory = DirectoryPath::new(&cwd.to_string_lossy())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        Ok(Self::new(Arc::new(PhysicalFileSystem::new()), working_directory, Platform::current()))
    }

    pub fn file_system(&self) -> &dyn FileSystem {
        self.file_system.as_ref()
    }

    pub fn working_directory(&self) -> &DirectoryPath {
        &self.working_directory
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }
}

impl std::fmt::Debug for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Environment")
            .field("working_directory", &self.working_directory)
            .field("platform", &self.platform)
            .field("case_sensitive", &self.file_system.is_case_sensitive())
            .finish()
    }
}
