//! Route discovery from the content root.
//!
//! The content root is read once per build. Every direct entry (file or
//! directory) becomes one single-segment route named after the entry with
//! its extension stripped. The resulting set is exhaustive: there is no
//! fallback route, anything outside it is a 404 at serve time.

use super::record::{RouteDescriptor, route_stem};
use std::{
    collections::BTreeSet,
    fs, io,
    path::{Path, PathBuf},
};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("cannot read content root `{path}`")]
pub struct DiscoveryError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

/// List the routes backed by the direct entries of `content_root`.
///
/// Hidden entries (leading `.`) are skipped. The result is sorted by path
/// and keeps one descriptor per entry, so `a.md` next to `a.mdx` yields
/// `a` twice; see [`RouteTable::duplicates`].
pub fn discover_routes(content_root: &Path) -> Result<Vec<RouteDescriptor>, DiscoveryError> {
    let err = |source| DiscoveryError {
        path: content_root.to_path_buf(),
        source,
    };

    let mut routes = Vec::new();
    for entry in fs::read_dir(content_root).map_err(err)? {
        let entry = entry.map_err(err)?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if let Some(stem) = route_stem(&name) {
            routes.push(RouteDescriptor::single(stem));
        }
    }

    routes.sort();
    Ok(routes)
}

// ============================================================================
// RouteTable
// ============================================================================

/// The static set of valid routes, consulted by the preview server.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: BTreeSet<RouteDescriptor>,
    duplicates: Vec<RouteDescriptor>,
}

impl RouteTable {
    pub fn new(routes: impl IntoIterator<Item = RouteDescriptor>) -> Self {
        let mut table = Self::default();
        for route in routes {
            if table.routes.contains(&route) {
                if !table.duplicates.contains(&route) {
                    table.duplicates.push(route);
                }
            } else {
                table.routes.insert(route);
            }
        }
        table
    }

    pub fn contains(&self, path: &[String]) -> bool {
        self.routes.iter().any(|route| route.path == path)
    }

    /// Resolve a request URL path (already decoded, no query string) against
    /// the table, honoring the route prefix.
    pub fn resolve(&self, prefix: &str, url_path: &str) -> Option<&RouteDescriptor> {
        let mut segments = url_path.split('/').filter(|s| !s.is_empty());
        if !prefix.is_empty() && segments.next() != Some(prefix) {
            return None;
        }
        let rest: Vec<String> = segments
            .filter(|s| *s != "index.html")
            .map(str::to_owned)
            .collect();
        self.routes.iter().find(|route| route.path == rest)
    }

    /// Routes declared by more than one content entry.
    pub fn duplicates(&self) -> &[RouteDescriptor] {
        &self.duplicates
    }

    pub fn routes(&self) -> impl Iterator<Item = &RouteDescriptor> {
        self.routes.iter()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
