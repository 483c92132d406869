//! Route builds.
//!
//! Each route walks a fixed sequence of steps; any failure is terminal for
//! that route only:
//!
//! ```text
//! Discovered ──► lookup ──► read ──► enrich ──► parse ──► Built
//!                  │          │         │          │
//!               NotFound  ContentRead Enrichment  Parse
//! ```
//!
//! Routes share nothing but the index handle and the catalog client, so
//! [`build_routes`] runs them concurrently and reports every outcome.

use crate::{
    catalog::Catalog,
    config::SiteConfig,
    content::{ContentRecord, IndexError, IndexHandle, RouteDescriptor},
    enrich::{EnrichError, Enricher},
    markup::{self, ParseError, RenderPayload},
};
use std::{
    collections::HashMap,
    io,
    path::{Path, PathBuf},
    sync::Arc,
};
use thiserror::Error;
use tokio::{sync::Semaphore, task::JoinSet};

#[derive(Debug, Error)]
pub enum RouteError {
    #[error("no content for `{path}`")]
    NotFound { path: String },

    #[error("content index unavailable")]
    Index(#[from] IndexError),

    #[error("cannot read `{}`", path.display())]
    ContentRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Enrichment(#[from] EnrichError),

    #[error("cannot parse `{}`", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },

    #[error("cannot write `{}`", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("route build aborted: {0}")]
    Aborted(String),
}

impl RouteError {
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Everything a route build needs, cheap to clone into tasks.
#[derive(Clone)]
pub struct BuildContext {
    root: PathBuf,
    index: Arc<IndexHandle>,
    enricher: Enricher,
}

impl BuildContext {
    pub fn new(root: impl Into<PathBuf>, index: Arc<IndexHandle>, enricher: Enricher) -> Self {
        Self {
            root: root.into(),
            index,
            enricher,
        }
    }

    /// Context for a configured project, with a fresh index handle.
    pub fn from_config(config: &SiteConfig, catalog: Arc<dyn Catalog>) -> Self {
        let root = config.get_root().to_path_buf();
        let index = IndexHandle::new(root.clone(), config.build.content.clone());
        Self::new(root, Arc::new(index), Enricher::from_config(catalog, &config.catalog))
    }

    pub fn index(&self) -> &Arc<IndexHandle> {
        &self.index
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// A route that made it through every step.
#[derive(Debug, Clone)]
pub struct BuiltRoute {
    pub route: RouteDescriptor,
    pub record: Arc<ContentRecord>,
    pub payload: RenderPayload,
}

#[derive(Debug)]
pub struct RouteFailure {
    pub route: RouteDescriptor,
    pub error: RouteError,
}

/// Outcome of a multi-route build, sorted by route.
#[derive(Debug, Default)]
pub struct BuildReport {
    pub built: Vec<BuiltRoute>,
    pub failed: Vec<RouteFailure>,
}

impl BuildReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn total(&self) -> usize {
        self.built.len() + self.failed.len()
    }

    pub fn failure(&self, route: &RouteDescriptor) -> Option<&RouteError> {
        self.failed
            .iter()
            .find(|failure| &failure.route == route)
            .map(|failure| &failure.error)
    }

    pub fn built_route(&self, route: &RouteDescriptor) -> Option<&BuiltRoute> {
        self.built.iter().find(|built| &built.route == route)
    }

    fn sort(&mut self) {
        self.built.sort_by(|a, b| a.route.cmp(&b.route));
        self.failed.sort_by(|a, b| a.route.cmp(&b.route));
    }
}

/// Read the file a record points at.
pub async fn read_content(root: &Path, record: &ContentRecord) -> Result<String, RouteError> {
    tokio::fs::read_to_string(record.absolute_path(root))
        .await
        .map_err(|source| RouteError::ContentRead {
            path: record.file_path.clone(),
            source,
        })
}

/// Build one route: lookup, read, enrich, parse.
pub async fn build_route(ctx: &BuildContext, route: &RouteDescriptor) -> Result<BuiltRoute, RouteError> {
    let record = ctx
        .index
        .lookup(&route.path)
        .await?
        .ok_or_else(|| RouteError::NotFound {
            path: route.to_string(),
        })?;

    let raw = read_content(&ctx.root, &record).await?;
    let scope = ctx.enricher.enrich(&record.metadata).await?;
    let payload = markup::parse(&raw, record.format, &scope).map_err(|source| RouteError::Parse {
        path: record.file_path.clone(),
        source,
    })?;

    Ok(BuiltRoute {
        route: route.clone(),
        record,
        payload,
    })
}

/// Build every route concurrently, at most `jobs` at a time.
///
/// Never stops early: every route ends up in either `built` or `failed`.
/// `on_done` is called once per finished route.
pub async fn build_routes(
    ctx: &BuildContext,
    routes: Vec<RouteDescriptor>,
    jobs: usize,
    on_done: impl Fn(&RouteDescriptor, Result<(), &RouteError>),
) -> BuildReport {
    let limit = Arc::new(Semaphore::new(jobs.max(1)));
    let mut tasks = JoinSet::new();
    let mut pending = HashMap::new();

    for route in routes {
        let ctx = ctx.clone();
        let limit = Arc::clone(&limit);
        let task_route = route.clone();
        let handle = tasks.spawn(async move {
            let _permit = limit.acquire_owned().await.ok();
            build_route(&ctx, &task_route).await
        });
        pending.insert(handle.id(), route);
    }

    let mut report = BuildReport::default();
    while let Some(joined) = tasks.join_next_with_id().await {
        let (id, result) = match joined {
            Ok((id, result)) => (id, result),
            Err(err) => (err.id(), Err(RouteError::Aborted(err.to_string()))),
        };
        let Some(route) = pending.remove(&id) else {
            continue;
        };

        match result {
            Ok(built) => {
                on_done(&route, Ok(()));
                report.built.push(built);
            }
            Err(error) => {
                on_done(&route, Err(&error));
                report.failed.push(RouteFailure { route, error });
            }
        }
    }

    report.sort();
    report
}
