use super::{DirEntry, FileSystem};
use crate::path::{DirectoryPath, FilePath, PathComparer, PathError, PathLike};
use std::collections::BTreeMap;
use std::io::{self, Cursor, Read, Write};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// In-memory filesystem for tests and embedding.
///
/// Internally reference counted: clones share the same tree, so a test can
/// hand one copy to the build and keep another to mutate files between runs.
#[derive(Debug, Clone)]
pub struct InMemoryFileSystem {
    inner: Arc<Mutex<Inner>>,
    comparer: PathComparer,
}

#[derive(Debug, Default)]
struct Inner {
    files: BTreeMap<String, MemoryFile>,
    directories: BTreeMap<String, DirectoryPath>,
}

#[derive(Debug)]
struct MemoryFile {
    path: FilePath,
    contents: Vec<u8>,
}

impl InMemoryFileSystem {
    /// Create an empty, case-sensitive filesystem.
    pub fn new() -> Self {
        Self::with_case_sensitivity(true)
    }

    pub fn with_case_sensitivity(case_sensitive: bool) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner::default())),
            comparer: PathComparer::new(case_sensitive),
        }
    }

    /// Add or replace a file, creating its parent directories.
    pub fn add_file(&self, path: &str, contents: impl AsRef<[u8]>) -> Result<(), PathError> {
        let path = FilePath::new(path)?;
        let mut inner = self.lock();
        self.insert_directory_chain(&mut inner, &path.get_directory());
        inner
            .files
            .insert(self.comparer.key(&path), MemoryFile { path, contents: contents.as_ref().to_vec() });
        Ok(())
    }

    /// Add a directory and its parents.
    pub fn add_directory(&self, path: &str) -> Result<(), PathError> {
        let path = DirectoryPath::new(path)?;
        let mut inner = self.lock();
        self.insert_directory_chain(&mut inner, &path);
        Ok(())
    }

    /// Remove a file. Returns whether it existed.
    pub fn remove_file(&self, path: &str) -> Result<bool, PathError> {
        let path = FilePath::new(path)?;
        Ok(self.lock().files.remove(&self.comparer.key(&path)).is_some())
    }

    /// Current contents of a file.
    pub fn contents(&self, path: &str) -> Result<Option<Vec<u8>>, PathError> {
        let path = FilePath::new(path)?;
        Ok(self.lock().files.get(&self.comparer.key(&path)).map(|f| f.contents.clone()))
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn insert_directory_chain(&self, inner: &mut Inner, path: &DirectoryPath) {
        let mut current = Some(path.clone());
        while let Some(dir) = current {
            if dir.full_path().is_empty() {
                break;
            }
            current = dir.parent();
            inner.directories.entry(self.comparer.key(&dir)).or_insert(dir);
        }
    }

    fn parent_key_of_file(&self, path: &FilePath) -> String {
        self.comparer.key(&path.get_directory())
    }

    fn parent_key_of_directory(&self, path: &DirectoryPath) -> Option<String> {
        path.parent().map(|p| self.comparer.key(&p))
    }
}

impl Default for InMemoryFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

struct MemoryWriter {
    inner: Arc<Mutex<Inner>>,
    key: String,
}

impl Write for MemoryWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        match inner.files.get_mut(&self.key) {
            Some(file) => {
                file.contents.extend_from_slice(buf);
                Ok(buf.len())
            }
            None => Err(io::Error::new(io::ErrorKind::NotFound, "file was removed while open")),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn not_found(path: &impl std::fmt::Display) -> io::Error {
    io::Error::new(io::ErrorKind::NotFound, format!("'{}' does not exist", path))
}

impl FileSystem for InMemoryFileSystem {
    fn is_case_sensitive(&self) -> bool {
        self.comparer.is_case_sensitive()
    }

    fn file_exists(&self, path: &FilePath) -> bool {
        self.lock().files.contains_key(&self.comparer.key(path))
    }

    fn file_length(&self, path: &FilePath) -> io::Result<u64> {
        self.lock()
            .files
            .get(&self.comparer.key(path))
            .map(|f| f.contents.len() as u64)
            .ok_or_else(|| not_found(path))
    }

    fn open_read(&self, path: &FilePath) -> io::Result<Box<dyn Read + '_>> {
        let contents = self
            .lock()
            .files
            .get(&self.comparer.key(path))
            .map(|f| f.contents.clone())
            .ok_or_else(|| not_found(path))?;
        Ok(Box::new(Cursor::new(contents)))
    }

    fn create_file(&self, path: &FilePath) -> io::Result<Box<dyn Write + '_>> {
        let mut inner = self.lock();
        let parent = path.get_directory();
        if !parent.full_path().is_empty()
            && !inner.directories.contains_key(&self.comparer.key(&parent))
        {
            return Err(not_found(&parent));
        }
        let key = self.comparer.key(path);
        inner.files.insert(key.clone(), MemoryFile { path: path.clone(), contents: Vec::new() });
        Ok(Box::new(MemoryWriter { inner: Arc::clone(&self.inner), key }))
    }

    fn directory_exists(&self, path: &DirectoryPath) -> bool {
        self.lock().directories.contains_key(&self.comparer.key(path))
    }

    fn create_directory(&self, path: &DirectoryPath) -> io::Result<()> {
        let mut inner = self.lock();
        let mut current = Some(path.clone());
        while let Some(dir) = current {
            let as_file = FilePath::from_normalized(dir.full_path().to_string());
            if inner.files.contains_key(&self.comparer.key(&as_file)) {
                return Err(io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    format!("'{}' is a file", dir),
                ));
            }
            current = dir.parent();
        }
        self.insert_directory_chain(&mut inner, path);
        Ok(())
    }

    fn entries(&self, path: &DirectoryPath) -> io::Result<Vec<DirEntry>> {
        let inner = self.lock();
        let key = self.comparer.key(path);
        if !inner.directories.contains_key(&key) {
            return Err(not_found(path));
        }

        let directories = inner
            .directories
            .values()
            .filter(|d| self.parent_key_of_directory(d).as_deref() == Some(key.as_str()))
            .map(|d| DirEntry::Directory(d.clone()));
        let files = inner
            .files
            .values()
            .filter(|f| self.parent_key_of_file(&f.path) == key)
            .map(|f| DirEntry::File(f.path.clone()));

        Ok(directories.chain(files).collect())
    }
}
