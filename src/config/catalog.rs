//! `[catalog]` section configuration.
//!
//! Connection settings for the CKAN catalog that stories pull dataset and
//! organization metadata from.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Environment variable overriding `[catalog].base_url`.
pub const CATALOG_URL_ENV: &str = "STORYFOLD_CATALOG_URL";

/// What to do when a single catalog fetch fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnError {
    /// Fail the whole route, naming the entry that failed (default).
    #[default]
    Abort,
    /// Put `null` at the failed position and keep building.
    Placeholder,
}

/// `[catalog]` section in storyfold.toml.
///
/// # Example
/// ```toml
/// [catalog]
/// base_url = "https://demo.dev.datopian.com"
/// timeout_secs = 10
/// on_error = "abort"
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct CatalogConfig {
    /// Endpoint for all catalog requests (without the `/api/3` suffix).
    #[serde(default = "defaults::catalog::base_url")]
    #[educe(Default = defaults::catalog::base_url())]
    pub base_url: String,

    /// Upper bound for a single fetch.
    #[serde(default = "defaults::catalog::timeout_secs")]
    #[educe(Default = defaults::catalog::timeout_secs())]
    pub timeout_secs: u64,

    /// Failure policy for individual fetches.
    #[serde(default = "defaults::catalog::on_error")]
    #[educe(Default = defaults::catalog::on_error())]
    pub on_error: OnError,
}

impl CatalogConfig {
    /// Per-fetch timeout.
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Base URL without trailing slashes.
    pub fn endpoint(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}
