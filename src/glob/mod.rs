//! Glob pattern resolution against a [`FileSystem`](crate::io::FileSystem).
//!
//! Patterns support `*` and `?` within a segment and `**` for any number of
//! directories. Matching happens one directory level at a time: each segment
//! is compiled into an anchored regular expression and tested against the
//! names of a directory's children, so a wildcard never spans a `/`.
//!
//! ```ignore
//! let globber = Globber::new(&environment);
//! let matches = globber.resolve("/Temp/**/*.txt")?;
//! ```

mod parser;

use crate::io::{DirEntry, Environment, FileSystem, Platform};
use crate::path::{has_drive, DirectoryPath, FilePath, PathComparer, PathError, PathLike};
use parser::{Part, Root, Segment};
use regex::{Regex, RegexBuilder};
use std::collections::HashSet;
use thiserror::Error;

/// Error resolving a glob pattern.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GlobError {
    #[error("The pattern cannot be empty.")]
    EmptyPattern,
    #[error("UNC paths are not supported: '{0}'.")]
    UncRootUnsupported(String),
    #[error("Invalid glob root: {0}")]
    Path(#[from] PathError),
    #[error("Invalid glob segment '{segment}': {source}")]
    InvalidSegment { segment: String, source: regex::Error },
}

/// A path produced by a glob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GlobMatch {
    File(FilePath),
    Directory(DirectoryPath),
}

impl GlobMatch {
    pub fn full_path(&self) -> &str {
        match self {
            GlobMatch::File(f) => f.full_path(),
            GlobMatch::Directory(d) => d.full_path(),
        }
    }

    pub fn as_file(&self) -> Option<&FilePath> {
        match self {
            GlobMatch::File(f) => Some(f),
            GlobMatch::Directory(_) => None,
        }
    }
}

impl From<DirEntry> for GlobMatch {
    fn from(entry: DirEntry) -> Self {
        match entry {
            DirEntry::File(f) => GlobMatch::File(f),
            DirEntry::Directory(d) => GlobMatch::Directory(d),
        }
    }
}

/// Resolves glob patterns to concrete paths.
pub struct Globber<'a> {
    environment: &'a Environment,
}

impl<'a> Globber<'a> {
    pub fn new(environment: &'a Environment) -> Self {
        Self { environment }
    }

    /// Resolve `pattern` to the paths it matches.
    ///
    /// Results are deduplicated under the filesystem's case policy and come out
    /// in a stable order (depth-first, children sorted by path). A pattern
    /// without wildcards resolves to itself without consulting the filesystem.
    pub fn resolve(&self, pattern: &str) -> Result<Vec<GlobMatch>, GlobError> {
        let parsed = parser::parse(pattern)?;

        let first_wildcard =
            parsed.segments.iter().position(Segment::is_wildcard).unwrap_or(parsed.segments.len());
        let (fixed, remaining) = parsed.segments.split_at(first_wildcard);

        let root = self.root_prefix(&parsed.root, fixed)?;
        if remaining.is_empty() {
            return Ok(vec![GlobMatch::File(FilePath::from_normalized(root.full_path().to_string()))]);
        }

        let fs = self.environment.file_system();
        let case_sensitive = fs.is_case_sensitive();
        let compiled = remaining
            .iter()
            .map(|s| CompiledSegment::compile(s, case_sensitive))
            .collect::<Result<Vec<_>, _>>()?;

        let mut walker = Walker::new(fs);
        walker.walk(&root, &compiled);
        Ok(walker.results)
    }

    /// Resolve `pattern`, keeping only files.
    pub fn resolve_files(&self, pattern: &str) -> Result<Vec<FilePath>, GlobError> {
        Ok(self
            .resolve(pattern)?
            .into_iter()
            .filter_map(|m| match m {
                GlobMatch::File(f) => Some(f),
                GlobMatch::Directory(_) => None,
            })
            .collect())
    }

    fn root_prefix(&self, root: &Root, fixed: &[Segment]) -> Result<DirectoryPath, GlobError> {
        let working = self.environment.working_directory();
        let mut prefix = match root {
            Root::Relative => working.full_path().to_string(),
            Root::Unix => match self.environment.platform() {
                Platform::Windows if has_drive(working.full_path()) => {
                    format!("{}/", &working.full_path()[..2])
                }
                _ => "/".to_string(),
            },
            Root::Drive(drive) => format!("{}/", drive),
        };

        for segment in fixed {
            let text = match segment {
                Segment::Literal(text) => text.as_str(),
                Segment::Current => ".",
                Segment::Parent => "..",
                Segment::Wildcard(_) | Segment::Recursive => break,
            };
            if !prefix.ends_with('/') {
                prefix.push('/');
            }
            prefix.push_str(text);
        }

        Ok(DirectoryPath::new(&prefix)?.collapse()?)
    }
}

#[derive(Debug)]
enum CompiledSegment {
    Recursive,
    Current,
    Parent,
    Match(Regex),
}

impl CompiledSegment {
    fn compile(segment: &Segment, case_sensitive: bool) -> Result<Self, GlobError> {
        let expression = match segment {
            Segment::Recursive => return Ok(CompiledSegment::Recursive),
            Segment::Current => return Ok(CompiledSegment::Current),
            Segment::Parent => return Ok(CompiledSegment::Parent),
            Segment::Literal(text) => format!("^{}$", regex::escape(text)),
            Segment::Wildcard(parts) => {
                let body: String = parts
                    .iter()
                    .map(|part| match part {
                        Part::Literal(text) => regex::escape(text),
                        Part::AnyChars => ".*".to_string(),
                        Part::AnyChar => ".".to_string(),
                    })
                    .collect();
                format!("^{}$", body)
            }
        };

        RegexBuilder::new(&expression)
            .case_insensitive(!case_sensitive)
            .build()
            .map(CompiledSegment::Match)
            .map_err(|source| GlobError::InvalidSegment { segment: expression, source })
    }
}

struct Walker<'a> {
    fs: &'a dyn FileSystem,
    comparer: PathComparer,
    seen: HashSet<String>,
    results: Vec<GlobMatch>,
}

impl<'a> Walker<'a> {
    fn new(fs: &'a dyn FileSystem) -> Self {
        Self { fs, comparer: PathComparer::for_file_system(fs), seen: HashSet::new(), results: Vec::new() }
    }

    fn walk(&mut self, dir: &DirectoryPath, segments: &[CompiledSegment]) {
        let Some((segment, rest)) = segments.split_first() else {
            return;
        };

        match segment {
            CompiledSegment::Current => self.descend(dir.clone(), rest),
            CompiledSegment::Parent => self.descend(dir.parent().unwrap_or_else(|| dir.clone()), rest),
            CompiledSegment::Recursive => {
                let children = self.children(dir);
                if rest.is_empty() {
                    for child in &children {
                        self.push(GlobMatch::from(child.clone()));
                    }
                } else {
                    self.walk(dir, rest);
                }
                for child in children {
                    if let DirEntry::Directory(child_dir) = child {
                        self.walk(&child_dir, segments);
                    }
                }
            }
            CompiledSegment::Match(regex) => {
                for child in self.children(dir) {
                    if !regex.is_match(entry_name(&child)) {
                        continue;
                    }
                    if rest.is_empty() {
                        self.push(GlobMatch::from(child));
                    } else if let DirEntry::Directory(child_dir) = child {
                        self.walk(&child_dir, rest);
                    }
                }
            }
        }
    }

    fn descend(&mut self, dir: DirectoryPath, rest: &[CompiledSegment]) {
        if rest.is_empty() {
            if self.fs.directory_exists(&dir) {
                self.push(GlobMatch::Directory(dir));
            }
        } else {
            self.walk(&dir, rest);
        }
    }

    /// Children sorted by path. A missing or unreadable directory has none.
    fn children(&self, dir: &DirectoryPath) -> Vec<DirEntry> {
        let mut entries = self.fs.entries(dir).unwrap_or_default();
        entries.sort_by(|a, b| entry_path(a).cmp(entry_path(b)));
        entries
    }

    fn push(&mut self, found: GlobMatch) {
        let key = match &found {
            GlobMatch::File(f) => self.comparer.key(f),
            GlobMatch::Directory(d) => self.comparer.key(d),
        };
        if self.seen.insert(key) {
            self.results.push(found);
        }
    }
}

fn entry_path(entry: &DirEntry) -> &str {
    match entry {
        DirEntry::File(f) => f.full_path(),
        DirEntry::Directory(d) => d.full_path(),
    }
}

fn entry_name(entry: &DirEntry) -> &str {
    let full = entry_path(entry);
    match full.rfind('/') {
        Some(idx) => &full[idx + 1..],
        None => full,
    }
}
