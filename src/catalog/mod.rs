//! Catalog access: canonical dataset and organization metadata by name.
//!
//! [`Catalog`] is the seam the enrichment step depends on. [`CkanClient`]
//! talks to a CKAN action API; [`MemoryCatalog`] serves fixed records to
//! tests.

mod ckan;
mod memory;

pub use ckan::CkanClient;
pub use memory::MemoryCatalog;

use async_trait::async_trait;
use serde_json::Value;
use std::{fmt, time::Duration};
use thiserror::Error;

/// A CKAN package, passed through untouched.
pub type DatasetRecord = Value;

/// A CKAN organization, passed through untouched.
pub type OrgRecord = Value;

/// Kind of catalog entity a story can reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Dataset,
    Organization,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Dataset => "dataset",
            Self::Organization => "organization",
        })
    }
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("request failed")]
    Http(#[from] reqwest::Error),

    #[error("catalog answered {status}: {message}")]
    Status { status: u16, message: String },

    #[error("catalog reported an error: {message}")]
    Api { message: String },

    #[error("unreadable catalog response: {0}")]
    Decode(String),

    #[error("no answer within {0:?}")]
    Timeout(Duration),

    #[error("`{0}` is not in the catalog")]
    Unknown(String),
}

/// Remote source of dataset / organization metadata.
#[async_trait]
pub trait Catalog: Send + Sync {
    async fn get_dataset_details(&self, name: &str) -> Result<DatasetRecord, CatalogError>;

    async fn get_org_details(&self, name: &str) -> Result<OrgRecord, CatalogError>;

    async fn fetch(&self, kind: EntityKind, name: &str) -> Result<Value, CatalogError> {
        match kind {
            EntityKind::Dataset => self.get_dataset_details(name).await,
            EntityKind::Organization => self.get_org_details(name).await,
        }
    }
}
