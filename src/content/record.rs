//! Content records and route descriptors.

use crate::markup::ContentFormat;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::{
    fmt,
    path::{Path, PathBuf},
};
use thiserror::Error;

/// Metadata key listing catalog dataset names.
pub const DATASETS_KEY: &str = "datasets";

/// Metadata key listing catalog organization names.
pub const ORGS_KEY: &str = "orgs";

/// Route name for a content entry: everything before the first `.`.
///
/// Returns `None` for names that leave nothing behind (`.hidden`, empty).
pub fn route_stem(name: &str) -> Option<&str> {
    name.split('.').next().filter(|stem| !stem.is_empty())
}

// ============================================================================
// RouteDescriptor
// ============================================================================

/// One statically known route, as a list of path segments.
///
/// Routes discovered from the content root always have exactly one segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct RouteDescriptor {
    pub path: Vec<String>,
}

impl RouteDescriptor {
    pub fn new(path: Vec<String>) -> Self {
        Self { path }
    }

    pub fn single(segment: impl Into<String>) -> Self {
        Self {
            path: vec![segment.into()],
        }
    }

    /// URL of this route under `prefix`, with a trailing slash.
    ///
    /// ```ignore
    /// RouteDescriptor::single("report_1").url("stories") // "/stories/report_1/"
    /// ```
    pub fn url(&self, prefix: &str) -> String {
        let mut url = String::from("/");
        for segment in std::iter::once(prefix).chain(self.path.iter().map(String::as_str)) {
            if segment.is_empty() {
                continue;
            }
            url.push_str(segment);
            url.push('/');
        }
        url
    }
}

impl fmt::Display for RouteDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.join("/"))
    }
}

// ============================================================================
// Metadata
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MetadataError {
    #[error("`{key}` must be a list of names")]
    NotAList { key: &'static str },

    #[error("`{key}` entry {position} is not a string")]
    NotAName { key: &'static str, position: usize },
}

/// Declared frontmatter of a content file, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metadata(Map<String, Value>);

impl Metadata {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Declared dataset names. Absent or `null` means none.
    pub fn datasets(&self) -> Result<Vec<String>, MetadataError> {
        self.names(DATASETS_KEY)
    }

    /// Declared organization names. Absent or `null` means none.
    pub fn orgs(&self) -> Result<Vec<String>, MetadataError> {
        self.names(ORGS_KEY)
    }

    fn names(&self, key: &'static str) -> Result<Vec<String>, MetadataError> {
        match self.0.get(key) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::Array(items)) => items
                .iter()
                .enumerate()
                .map(|(position, item)| {
                    item.as_str()
                        .map(str::to_owned)
                        .ok_or(MetadataError::NotAName { key, position })
                })
                .collect(),
            Some(_) => Err(MetadataError::NotAList { key }),
        }
    }
}

impl From<Map<String, Value>> for Metadata {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

// ============================================================================
// ContentRecord
// ============================================================================

/// A content file resolved from a route, with its declared metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentRecord {
    /// Location relative to the project root (e.g. `content/report_1.mdx`).
    pub file_path: PathBuf,
    pub format: ContentFormat,
    pub metadata: Metadata,
}

impl ContentRecord {
    pub fn absolute_path(&self, root: &Path) -> PathBuf {
        root.join(&self.file_path)
    }
}
