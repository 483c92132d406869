//! Content index: route path segments → content record.
//!
//! The index is built by walking the content directory once and reading the
//! frontmatter of every `.md` / `.mdx` file. [`IndexHandle`] is the shared,
//! lazily-initialized handle passed to every route build:
//!
//! ```text
//!  route A ─┐
//!  route B ─┼──► IndexHandle::lookup() ──► OnceCell::get_or_try_init()
//!  route C ─┘                                   │
//!                                   first caller builds, the rest await
//!                                               │
//!                                               ▼
//!                                     Arc<ContentIndex> (reused)
//! ```

use super::record::{ContentRecord, Metadata, route_stem};
use crate::{log, markup::ContentFormat, markup::frontmatter::split_frontmatter};
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};
use thiserror::Error;
use tokio::sync::OnceCell;
use walkdir::WalkDir;

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("cannot walk content directory `{path}`")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("index construction was interrupted: {0}")]
    Interrupted(String),
}

// ============================================================================
// ContentIndex
// ============================================================================

/// Immutable map from route path to content record.
#[derive(Debug, Default)]
pub struct ContentIndex {
    records: HashMap<Vec<String>, Arc<ContentRecord>>,
}

impl ContentIndex {
    /// Walk `content_dir` and index every content file under it.
    ///
    /// Record paths are stored relative to `root`. A file whose frontmatter
    /// cannot be read or parsed is still indexed with empty metadata, so the
    /// failure surfaces on that route's own build instead of every route's.
    pub fn build(root: &Path, content_dir: &Path) -> Result<Self, IndexError> {
        let mut records = HashMap::new();

        for entry in WalkDir::new(content_dir).follow_links(true).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(source) if source.depth() == 0 => {
                    return Err(IndexError::Walk {
                        path: content_dir.to_path_buf(),
                        source,
                    });
                }
                // a dangling link or unreadable subdirectory only costs its own route
                Err(err) => {
                    log!("warn"; "skipping content entry: {err}");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let Some(format) = ContentFormat::from_path(path) else {
                continue;
            };
            let Some(key) = index_key(content_dir, path) else {
                continue;
            };

            let record = Arc::new(ContentRecord {
                file_path: path.strip_prefix(root).unwrap_or(path).to_path_buf(),
                format,
                metadata: read_metadata(path),
            });

            if let Some(previous) = records.insert(key, Arc::clone(&record)) {
                log!(
                    "warn";
                    "`{}` and `{}` map to the same route, keeping the latter",
                    previous.file_path.display(),
                    record.file_path.display()
                );
            }
        }

        Ok(Self { records })
    }

    pub fn get(&self, path: &[String]) -> Option<Arc<ContentRecord>> {
        self.records.get(path).cloned()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Route path of a content file relative to `content_dir`.
///
/// `report_1.mdx` → `["report_1"]`, `guide/index.md` → `["guide"]`,
/// `guide/setup.md` → `["guide", "setup"]`.
fn index_key(content_dir: &Path, path: &Path) -> Option<Vec<String>> {
    let relative = path.strip_prefix(content_dir).ok()?;
    let mut segments: Vec<String> = relative
        .iter()
        .map(|part| part.to_string_lossy().into_owned())
        .collect();

    let file_name = segments.pop()?;
    let stem = route_stem(&file_name)?;
    if stem != "index" || segments.is_empty() {
        segments.push(stem.to_owned());
    }
    Some(segments)
}

fn read_metadata(path: &Path) -> Metadata {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(_) => return Metadata::default(),
    };
    match split_frontmatter(&raw) {
        Ok((fields, _)) => fields.map(Metadata::new).unwrap_or_default(),
        Err(err) => {
            log!("warn"; "{}: {err}", path.display());
            Metadata::default()
        }
    }
}

// ============================================================================
// IndexHandle
// ============================================================================

/// Shared handle to the lazily-built [`ContentIndex`].
///
/// Construction happens at most once per successful build: concurrent
/// first callers await the same in-flight construction. A failed
/// construction is reported to its callers and retried by the next one.
#[derive(Debug)]
pub struct IndexHandle {
    root: PathBuf,
    content_dir: PathBuf,
    cell: OnceCell<Arc<ContentIndex>>,
    constructions: AtomicUsize,
}

impl IndexHandle {
    pub fn new(root: impl Into<PathBuf>, content_dir: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            content_dir: content_dir.into(),
            cell: OnceCell::new(),
            constructions: AtomicUsize::new(0),
        }
    }

    /// The index, building it on first use.
    pub async fn index(&self) -> Result<Arc<ContentIndex>, IndexError> {
        self.cell
            .get_or_try_init(|| async {
                self.constructions.fetch_add(1, Ordering::SeqCst);
                let root = self.root.clone();
                let content_dir = self.content_dir.clone();
                let index = tokio::task::spawn_blocking(move || {
                    ContentIndex::build(&root, &content_dir)
                })
                .await
                .map_err(|err| IndexError::Interrupted(err.to_string()))??;
                log!("index"; "{} content files indexed", index.len());
                Ok::<_, IndexError>(Arc::new(index))
            })
            .await
            .cloned()
    }

    /// Resolve route segments to a record. `Ok(None)` is the not-found outcome.
    pub async fn lookup(&self, path: &[String]) -> Result<Option<Arc<ContentRecord>>, IndexError> {
        Ok(self.index().await?.get(path))
    }

    /// How many times the index has been constructed.
    pub fn constructions(&self) -> usize {
        self.constructions.load(Ordering::SeqCst)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}
