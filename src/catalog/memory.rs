//! In-memory catalog.

use super::{Catalog, CatalogError, DatasetRecord, EntityKind, OrgRecord};
use async_trait::async_trait;
use serde_json::Value;
use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

/// Catalog answering from a fixed set of records.
///
/// Unknown names fail with [`CatalogError::Unknown`]. Every fetch is counted,
/// and an optional per-name delay simulates a slow upstream.
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    records: HashMap<(EntityKind, String), Value>,
    delays: HashMap<String, Duration>,
    calls: Arc<AtomicUsize>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dataset(mut self, name: impl Into<String>, record: Value) -> Self {
        self.records.insert((EntityKind::Dataset, name.into()), record);
        self
    }

    pub fn with_org(mut self, name: impl Into<String>, record: Value) -> Self {
        self.records.insert((EntityKind::Organization, name.into()), record);
        self
    }

    /// Delay every fetch of `name` by `delay`.
    pub fn with_delay(mut self, name: impl Into<String>, delay: Duration) -> Self {
        self.delays.insert(name.into(), delay);
        self
    }

    /// Number of fetches issued so far, across clones.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn lookup(&self, kind: EntityKind, name: &str) -> Result<Value, CatalogError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delays.get(name) {
            tokio::time::sleep(*delay).await;
        }
        self.records
            .get(&(kind, name.to_owned()))
            .cloned()
            .ok_or_else(|| CatalogError::Unknown(name.to_owned()))
    }
}

#[async_trait]
impl Catalog for MemoryCatalog {
    async fn get_dataset_details(&self, name: &str) -> Result<DatasetRecord, CatalogError> {
        self.lookup(EntityKind::Dataset, name).await
    }

    async fn get_org_details(&self, name: &str) -> Result<OrgRecord, CatalogError> {
        self.lookup(EntityKind::Organization, name).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_kinds_are_separate() {
        let catalog = MemoryCatalog::new().with_dataset("shared", json!({ "type": "dataset" }));

        assert_eq!(
            catalog.fetch(EntityKind::Dataset, "shared").await.unwrap(),
            json!({ "type": "dataset" })
        );
        assert!(matches!(
            catalog.fetch(EntityKind::Organization, "shared").await,
            Err(CatalogError::Unknown(_))
        ));
        assert_eq!(catalog.calls(), 2);
    }

    #[tokio::test]
    async fn test_calls_shared_across_clones() {
        let catalog = MemoryCatalog::new().with_org("o", json!({}));
        let clone = catalog.clone();
        clone.get_org_details("o").await.unwrap();
        assert_eq!(catalog.calls(), 1);
    }
}
