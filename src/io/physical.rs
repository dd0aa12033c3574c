use super::{DirEntry, FileSystem};
use crate::path::{DirectoryPath, FilePath, PathLike};
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

/// [`FileSystem`] backed by `std::fs`.
#[derive(Debug, Clone, Copy)]
pub struct PhysicalFileSystem {
    case_sensitive: bool,
}

impl PhysicalFileSystem {
    /// Filesystem using the platform's usual case policy: case-insensitive on
    /// Windows and macOS, case-sensitive elsewhere.
    pub fn new() -> Self {
        Self { case_sensitive: !cfg!(any(windows, target_os = "macos")) }
    }
}

impl Default for PhysicalFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

fn native<P: PathLike>(path: &P) -> &Path {
    Path::new(path.full_path())
}

impl FileSystem for PhysicalFileSystem {
    fn is_case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    fn file_exists(&self, path: &FilePath) -> bool {
        native(path).is_file()
    }

    fn file_length(&self, path: &FilePath) -> io::Result<u64> {
        Ok(fs::metadata(native(path))?.len())
    }

    fn open_read(&self, path: &FilePath) -> io::Result<Box<dyn Read + '_>> {
        Ok(Box::new(BufReader::new(File::open(native(path))?)))
    }

    fn create_file(&self, path: &FilePath) -> io::Result<Box<dyn Write + '_>> {
        Ok(Box::new(BufWriter::new(File::create(native(path))?)))
    }

    fn directory_exists(&self, path: &DirectoryPath) -> bool {
        native(path).is_dir()
    }

    fn create_directory(&self, path: &DirectoryPath) -> io::Result<()> {
        fs::create_dir_all(native(path))
    }

    fn entries(&self, path: &DirectoryPath) -> io::Result<Vec<DirEntry>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(native(path))? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            let child = format!("{}/{}", path.full_path().trim_end_matches('/'), name);
            if entry.file_type()?.is_dir() {
                entries.push(DirEntry::Directory(DirectoryPath::from_normalized(child)));
            } else {
                entries.push(DirEntry::File(FilePath::from_normalized(child)));
            }
        }
        Ok(entries)
    }
}
