//! Enrichment: resolve a story's declared `datasets` / `orgs` through the
//! catalog before it is parsed.
//!
//! ```text
//! metadata.datasets = [d1, d2]     metadata.orgs = [o1]
//!         │                               │
//!    ┌────┴────┐                          │
//!  fetch(d1) fetch(d2)                fetch(o1)       (all in flight at once)
//!    └────┬────┘                          │
//!         ▼                               ▼
//! EnrichmentContext { datasets: [r(d1), r(d2)], orgs: [r(o1)] }
//! ```
//!
//! Results keep the declared order. Under [`OnError::Abort`] the first
//! failure wins and the other fetches of that route are dropped mid-flight;
//! under [`OnError::Placeholder`] every fetch runs to completion and failed
//! positions hold `null`.

use crate::{
    catalog::{Catalog, CatalogError, EntityKind},
    config::{CatalogConfig, OnError},
    content::{Metadata, MetadataError},
    log,
};
use futures::future::{join_all, try_join_all};
use serde::Serialize;
use serde_json::Value;
use std::{sync::Arc, time::Duration};
use thiserror::Error;

/// Resolved catalog records, aligned with the declared names.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EnrichmentContext {
    pub datasets: Vec<Value>,
    pub orgs: Vec<Value>,
}

impl EnrichmentContext {
    pub fn is_empty(&self) -> bool {
        self.datasets.is_empty() && self.orgs.is_empty()
    }
}

#[derive(Debug, Error)]
pub enum EnrichError {
    #[error("invalid catalog references")]
    Metadata(#[from] MetadataError),

    #[error("failed to fetch {kind} `{name}`")]
    Fetch {
        kind: EntityKind,
        name: String,
        #[source]
        source: CatalogError,
    },
}

impl EnrichError {
    /// Name of the entity whose fetch failed, if any.
    pub fn failed_name(&self) -> Option<&str> {
        match self {
            Self::Fetch { name, .. } => Some(name),
            Self::Metadata(_) => None,
        }
    }
}

/// Fans catalog fetches out per route and gathers them back in order.
#[derive(Clone)]
pub struct Enricher {
    catalog: Arc<dyn Catalog>,
    timeout: Duration,
    on_error: OnError,
}

impl Enricher {
    pub fn new(catalog: Arc<dyn Catalog>, timeout: Duration, on_error: OnError) -> Self {
        Self {
            catalog,
            timeout,
            on_error,
        }
    }

    pub fn from_config(catalog: Arc<dyn Catalog>, config: &CatalogConfig) -> Self {
        Self::new(catalog, config.timeout(), config.on_error)
    }

    /// Resolve every declared name in `metadata`.
    ///
    /// Absent declarations resolve to empty sequences without touching the
    /// catalog.
    pub async fn enrich(&self, metadata: &Metadata) -> Result<EnrichmentContext, EnrichError> {
        let dataset_names = metadata.datasets()?;
        let org_names = metadata.orgs()?;

        let (datasets, orgs) = tokio::try_join!(
            self.gather(EntityKind::Dataset, &dataset_names),
            self.gather(EntityKind::Organization, &org_names),
        )?;

        Ok(EnrichmentContext { datasets, orgs })
    }

    async fn gather(&self, kind: EntityKind, names: &[String]) -> Result<Vec<Value>, EnrichError> {
        if names.is_empty() {
            return Ok(Vec::new());
        }

        let fetches = names.iter().map(|name| self.fetch_one(kind, name));
        match self.on_error {
            OnError::Abort => try_join_all(fetches).await,
            OnError::Placeholder => Ok(join_all(fetches)
                .await
                .into_iter()
                .map(|result| {
                    result.unwrap_or_else(|err| {
                        log!("warn"; "{}, using null", error_chain(&err));
                        Value::Null
                    })
                })
                .collect()),
        }
    }

    async fn fetch_one(&self, kind: EntityKind, name: &str) -> Result<Value, EnrichError> {
        let fetched = tokio::time::timeout(self.timeout, self.catalog.fetch(kind, name)).await;
        let source = match fetched {
            Ok(Ok(record)) => return Ok(record),
            Ok(Err(err)) => err,
            Err(_) => CatalogError::Timeout(self.timeout),
        };
        Err(EnrichError::Fetch {
            kind,
            name: name.to_owned(),
            source,
        })
    }
}

/// `outer: inner: innermost`, for single-line logs.
pub fn error_chain(err: &dyn std::error::Error) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        out.push_str(": ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MemoryCatalog;
    use serde_json::{Map, json};

    fn metadata(value: Value) -> Metadata {
        match value {
            Value::Object(map) => Metadata::new(map),
            _ => Metadata::new(Map::new()),
        }
    }

    fn enricher(catalog: &MemoryCatalog, on_error: OnError) -> Enricher {
        Enricher::new(Arc::new(catalog.clone()), Duration::from_secs(5), on_error)
    }

    fn sample_catalog() -> MemoryCatalog {
        MemoryCatalog::new()
            .with_dataset("d1", json!({ "name": "d1" }))
            .with_dataset("d2", json!({ "name": "d2" }))
            .with_dataset("air-quality", json!({ "name": "air-quality", "title": "Air Quality" }))
            .with_org("o1", json!({ "name": "o1" }))
    }

    #[tokio::test]
    async fn test_empty_declarations_skip_catalog() {
        let catalog = sample_catalog();
        let context = enricher(&catalog, OnError::Abort)
            .enrich(&metadata(json!({ "title": "no refs" })))
            .await
            .unwrap();

        assert_eq!(context, EnrichmentContext::default());
        assert!(context.is_empty());
        assert_eq!(catalog.calls(), 0);
    }

    #[tokio::test]
    async fn test_results_align_with_declared_order() {
        // d1 answers last, but still lands first
        let catalog = sample_catalog().with_delay("d1", Duration::from_millis(50));
        let context = enricher(&catalog, OnError::Abort)
            .enrich(&metadata(json!({ "datasets": ["d1", "d2"], "orgs": ["o1"] })))
            .await
            .unwrap();

        assert_eq!(context.datasets, [json!({ "name": "d1" }), json!({ "name": "d2" })]);
        assert_eq!(context.orgs, [json!({ "name": "o1" })]);
        assert_eq!(catalog.calls(), 3);
    }

    #[tokio::test]
    async fn test_fetches_run_concurrently() {
        let catalog = sample_catalog()
            .with_delay("d1", Duration::from_millis(200))
            .with_delay("d2", Duration::from_millis(200))
            .with_delay("o1", Duration::from_millis(200));
        let started = std::time::Instant::now();
        enricher(&catalog, OnError::Abort)
            .enrich(&metadata(json!({ "datasets": ["d1", "d2"], "orgs": ["o1"] })))
            .await
            .unwrap();

        assert!(started.elapsed() < Duration::from_millis(550));
    }

    #[tokio::test]
    async fn test_single_dataset_resolves() {
        let catalog = sample_catalog();
        let context = enricher(&catalog, OnError::Abort)
            .enrich(&metadata(json!({ "datasets": ["air-quality"] })))
            .await
            .unwrap();

        assert_eq!(context.datasets.len(), 1);
        assert_eq!(context.datasets[0]["title"], json!("Air Quality"));
    }

    #[tokio::test]
    async fn test_abort_names_failed_entry() {
        let catalog = sample_catalog();
        let err = enricher(&catalog, OnError::Abort)
            .enrich(&metadata(json!({ "datasets": ["d1", "missing-id"] })))
            .await
            .unwrap_err();

        assert_eq!(err.failed_name(), Some("missing-id"));
        assert!(err.to_string().contains("dataset `missing-id`"));
    }

    #[tokio::test]
    async fn test_placeholder_keeps_positions() {
        let catalog = sample_catalog();
        let context = enricher(&catalog, OnError::Placeholder)
            .enrich(&metadata(json!({ "datasets": ["missing-id", "d2"], "orgs": ["nobody"] })))
            .await
            .unwrap();

        assert_eq!(context.datasets, [Value::Null, json!({ "name": "d2" })]);
        assert_eq!(context.orgs, [Value::Null]);
    }

    #[tokio::test]
    async fn test_timeout_is_fetch_failure() {
        let catalog = sample_catalog().with_delay("d1", Duration::from_millis(500));
        let enricher = Enricher::new(Arc::new(catalog), Duration::from_millis(20), OnError::Abort);
        let err = enricher
            .enrich(&metadata(json!({ "datasets": ["d1"] })))
            .await
            .unwrap_err();

        match err {
            EnrichError::Fetch { name, source, .. } => {
                assert_eq!(name, "d1");
                assert!(matches!(source, CatalogError::Timeout(_)));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_invalid_declaration() {
        let catalog = sample_catalog();
        let err = enricher(&catalog, OnError::Abort)
            .enrich(&metadata(json!({ "orgs": "o1" })))
            .await
            .unwrap_err();

        assert!(matches!(err, EnrichError::Metadata(_)));
        assert_eq!(catalog.calls(), 0);
    }

    #[test]
    fn test_error_chain() {
        let err = EnrichError::Fetch {
            kind: EntityKind::Organization,
            name: "o9".into(),
            source: CatalogError::Unknown("o9".into()),
        };
        assert_eq!(
            error_chain(&err),
            "failed to fetch organization `o9`: `o9` is not in the catalog"
        );
    }
}
