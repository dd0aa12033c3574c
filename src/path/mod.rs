//! Path value types used throughout the build.
//!
//! Paths are stored as normalized forward-slash strings so that manifests and
//! log output look the same on every host. `FilePath` and `DirectoryPath` share
//! their representation but are distinct types, which keeps "is this a file or
//! a folder" out of runtime checks.
//!
//! Equality on the types themselves is exact. Use [`PathComparer`] when the
//! comparison must follow a filesystem's case-sensitivity policy.

mod collapse;
mod comparer;

pub use collapse::collapse;
pub use comparer::PathComparer;

use serde::{Serialize, Serializer};
use std::fmt;
use thiserror::Error;

/// Error constructing or normalizing a path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum PathError {
    /// Input was empty or whitespace only
    #[error("Path cannot be empty.")]
    Empty,
    /// Collapsing is only meaningful for rooted paths
    #[error("Cannot collapse relative path '{0}'.")]
    CollapseRelative(String),
}

/// Common read access shared by [`FilePath`] and [`DirectoryPath`].
pub trait PathLike {
    /// The normalized forward-slash path.
    fn full_path(&self) -> &str;

    /// Path segments. For unix-rooted paths the first segment carries the
    /// leading slash (`/hello/world` is `["/hello", "world"]`).
    fn segments(&self) -> &[String];

    /// Whether the path is relative (not rooted at `/` or a drive letter).
    fn is_relative(&self) -> bool;
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct PathData {
    full: String,
    segments: Vec<String>,
    relative: bool,
}

impl PathData {
    fn parse(input: &str) -> Result<Self, PathError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(PathError::Empty);
        }
        Ok(Self::from_normalized(normalize(trimmed)))
    }

    fn from_normalized(full: String) -> Self {
        let relative = !is_rooted(&full);
        let mut segments: Vec<String> =
            full.split('/').filter(|s| !s.is_empty()).map(str::to_string).collect();
        if full.starts_with('/') {
            match segments.first_mut() {
                Some(first) => first.insert(0, '/'),
                None => segments.push("/".to_string()),
            }
        }
        Self { full, segments, relative }
    }

    fn join(&self, other: &PathData) -> String {
        if !other.relative || self.full.is_empty() {
            other.full.clone()
        } else if other.full.is_empty() {
            self.full.clone()
        } else if self.full.ends_with('/') {
            format!("{}{}", self.full, other.full)
        } else {
            format!("{}/{}", self.full, other.full)
        }
    }
}

fn normalize(trimmed: &str) -> String {
    let mut full = trimmed.replace('\\', "/");
    if full == "./" || full == "." {
        return String::new();
    }
    if let Some(stripped) = full.strip_prefix("./") {
        full = stripped.to_string();
    }
    while full.len() > 1 && full.ends_with('/') && !is_drive_root(&full) {
        full.pop();
    }
    full
}

/// `C:` or `C:/`
pub(crate) fn is_drive_root(path: &str) -> bool {
    let bytes = path.as_bytes();
    match bytes.len() {
        2 => bytes[0].is_ascii_alphabetic() && bytes[1] == b':',
        3 => bytes[0].is_ascii_alphabetic() && bytes[1] == b':' && bytes[2] == b'/',
        _ => false,
    }
}

pub(crate) fn has_drive(path: &str) -> bool {
    let bytes = path.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

fn is_rooted(path: &str) -> bool {
    path.starts_with('/') || has_drive(path)
}

macro_rules! impl_path_common {
    ($ty:ident) => {
        impl $ty {
            /// Create a path from a string, normalizing separators.
            pub fn new(path: &str) -> Result<Self, PathError> {
                PathData::parse(path).map(|data| Self { data })
            }

            pub(crate) fn from_normalized(full: String) -> Self {
                Self { data: PathData::from_normalized(full) }
            }

            /// Resolve `.` and `..` segments. See [`collapse`].
            pub fn collapse(&self) -> Result<Self, PathError> {
                collapse(self).map(Self::from_normalized)
            }
        }

        impl PathLike for $ty {
            fn full_path(&self) -> &str {
                &self.data.full
            }

            fn segments(&self) -> &[String] {
                &self.data.segments
            }

            fn is_relative(&self) -> bool {
                self.data.relative
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.data.full)
            }
        }

        impl std::str::FromStr for $ty {
            type Err = PathError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.data.full)
            }
        }
    };
}

/// Path to a file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FilePath {
    data: PathData,
}

/// Path to a directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DirectoryPath {
    data: PathData,
}

impl_path_common!(FilePath);
impl_path_common!(DirectoryPath);

impl FilePath {
    /// The directory containing this file. Empty for a bare file name.
    pub fn get_directory(&self) -> DirectoryPath {
        match self.data.full.rfind('/') {
            Some(0) => DirectoryPath::from_normalized("/".to_string()),
            Some(idx) if is_drive_root(&self.data.full[..=idx]) => {
                DirectoryPath::from_normalized(self.data.full[..=idx].to_string())
            }
            Some(idx) => DirectoryPath::from_normalized(self.data.full[..idx].to_string()),
            None => DirectoryPath::from_normalized(String::new()),
        }
    }

    /// The file name including its extension.
    pub fn get_filename(&self) -> FilePath {
        FilePath::from_normalized(self.file_name().to_string())
    }

    /// The extension including the leading dot, e.g. `.png`.
    pub fn get_extension(&self) -> Option<&str> {
        let name = self.file_name();
        let idx = name.rfind('.')?;
        let ext = &name[idx..];
        if ext.len() > 1 {
            Some(ext)
        } else {
            None
        }
    }

    /// Replace the extension. A leading dot on `extension` is optional; an
    /// empty string removes the extension.
    pub fn change_extension(&self, extension: &str) -> FilePath {
        let full = &self.data.full;
        let stem_end = match self.get_extension() {
            Some(ext) => full.len() - ext.len(),
            None => full.len(),
        };
        let extension = extension.trim_start_matches('.');
        if extension.is_empty() {
            FilePath::from_normalized(full[..stem_end].to_string())
        } else {
            FilePath::from_normalized(format!("{}.{}", &full[..stem_end], extension))
        }
    }

    fn file_name(&self) -> &str {
        match self.data.full.rfind('/') {
            Some(idx) => &self.data.full[idx + 1..],
            None => &self.data.full,
        }
    }
}

impl DirectoryPath {
    /// Combine with another directory. An absolute `other` wins.
    pub fn combine(&self, other: &DirectoryPath) -> DirectoryPath {
        DirectoryPath::from_normalized(self.data.join(&other.data))
    }

    /// Combine with a file path. An absolute `file` wins.
    pub fn combine_file(&self, file: &FilePath) -> FilePath {
        FilePath::from_normalized(self.data.join(&file.data))
    }

    /// Containing directory, or `None` for a root or single-segment path.
    pub fn parent(&self) -> Option<DirectoryPath> {
        let full = &self.data.full;
        if full == "/" || is_drive_root(full) || !full.contains('/') {
            return None;
        }
        Some(FilePath::from_normalized(full.clone()).get_directory())
    }

    /// Last segment without any root marker.
    pub fn name(&self) -> Option<&str> {
        self.data.segments.last().map(|s| s.trim_start_matches('/')).filter(|s| !s.is_empty())
    }

    /// Path of `file` relative to this directory, or `None` when the file does
    /// not lie beneath it. Both paths are expected to be collapsed.
    pub fn relative_file(&self, file: &FilePath, comparer: &PathComparer) -> Option<FilePath> {
        let base = &self.data.full;
        let target = &file.data.full;
        if base.is_empty() {
            return file.is_relative().then(|| file.clone());
        }
        let prefix = target.get(..base.len())?;
        if !comparer.str_eq(prefix, base) {
            return None;
        }
        let rest = if base.ends_with('/') {
            &target[base.len()..]
        } else {
            target[base.len()..].strip_prefix('/')?
        };
        if rest.is_empty() {
            return None;
        }
        Some(FilePath::from_normalized(rest.to_string()))
    }
}
