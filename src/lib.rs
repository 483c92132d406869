//! storyfold: static story pages from markdown content, enriched with
//! dataset and organization metadata fetched from a CKAN catalog.
//!
//! ```text
//! content/ ──► discover_routes() ──► build_routes() ──► render::write_page()
//!                                        │
//!                          IndexHandle ──┼── Enricher ──► Catalog (CKAN)
//!                                        │
//!                                  markup::parse()
//! ```

pub mod build;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod content;
pub mod enrich;
pub mod init;
pub mod logger;
pub mod markup;
pub mod pipeline;
pub mod render;
pub mod serve;
