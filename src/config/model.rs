//! In-memory configuration types consumed by the build engine.

use crate::path::DirectoryPath;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

/// Default extension given to build outputs.
pub const DEFAULT_TARGET_EXTENSION: &str = "asset";

/// String metadata with case-insensitive, unique keys.
///
/// The casing used on first insertion is kept for display and persistence.
/// Equality ignores insertion order and key casing but not value casing.
#[derive(Debug, Clone, Default)]
pub struct Metadata {
    entries: BTreeMap<String, (String, String)>,
}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, returning the previous value for the key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let key = key.into();
        let value = value.into();
        match self.entries.get_mut(&fold(&key)) {
            Some((_, existing)) => Some(std::mem::replace(existing, value)),
            None => {
                self.entries.insert(fold(&key), (key, value));
                None
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(&fold(key)).map(|(_, v)| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(&fold(key))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate `(key, value)` pairs ordered by case-folded key.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.values().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

fn fold(key: &str) -> String {
    key.to_lowercase()
}

impl PartialEq for Metadata {
    fn eq(&self, other: &Self) -> bool {
        self.entries.len() == other.entries.len()
            && self.entries.iter().all(|(folded, (_, value))| {
                other.entries.get(folded).is_some_and(|(_, other_value)| other_value == value)
            })
    }
}

impl Eq for Metadata {}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Metadata {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut metadata = Metadata::new();
        for (k, v) in iter {
            metadata.insert(k, v);
        }
        metadata
    }
}

impl Serialize for Metadata {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (k, v) in self.iter() {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// A configured asset entry: one path or a glob pattern, relative to the
/// input directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetDefinition {
    pub path: String,
    pub metadata: Metadata,
    /// Explicit processor, matched against processor display names
    pub processor_name: Option<String>,
}

impl AssetDefinition {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into(), metadata: Metadata::new(), processor_name: None }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key, value);
        self
    }

    pub fn with_processor(mut self, name: impl Into<String>) -> Self {
        self.processor_name = Some(name.into());
        self
    }

    /// Whether the path contains glob wildcards.
    pub fn is_glob(&self) -> bool {
        self.path.contains(['*', '?'])
    }
}

/// Everything the engine needs to run a build.
#[derive(Debug, Clone)]
pub struct BuildConfiguration {
    /// Source root. Must be absolute and exist.
    pub input_directory: Option<DirectoryPath>,
    /// Output root. Must be absolute.
    pub output_directory: Option<DirectoryPath>,
    /// Whether unchanged assets may be skipped
    pub incremental: bool,
    pub assets: Vec<AssetDefinition>,
    /// Extension given to each asset's output file
    pub target_extension: String,
}

impl BuildConfiguration {
    pub fn new(input_directory: DirectoryPath, output_directory: DirectoryPath) -> Self {
        Self {
            input_directory: Some(input_directory),
            output_directory: Some(output_directory),
            ..Default::default()
        }
    }

    pub fn with_incremental(mut self, incremental: bool) -> Self {
        self.incremental = incremental;
        self
    }

    pub fn with_asset(mut self, asset: AssetDefinition) -> Self {
        self.assets.push(asset);
        self
    }

    pub fn with_target_extension(mut self, extension: impl Into<String>) -> Self {
        self.target_extension = extension.into();
        self
    }
}

impl Default for BuildConfiguration {
    fn default() -> Self {
        Self {
            input_directory: None,
            output_directory: None,
            incremental: true,
            assets: Vec::new(),
            target_extension: DEFAULT_TARGET_EXTENSION.to_string(),
        }
    }
}
