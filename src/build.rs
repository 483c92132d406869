//! Site building orchestration.
//!
//! ```text
//! build_site()
//!     │
//!     ├── prepare_output()        clean / create the output directory
//!     │
//!     ├── discover_route_table()  one route per content-root entry
//!     │
//!     ├── build_routes()          lookup → read → enrich → parse, concurrently
//!     │
//!     └── write_pages()           render::write_page per built route
//! ```
//!
//! A failing route never stops the others; every failure is logged and
//! returned in the [`BuildReport`].

use crate::{
    catalog::Catalog,
    config::SiteConfig,
    content::{DiscoveryError, RouteTable, discover_routes},
    enrich::error_chain,
    log,
    logger::ProgressBars,
    pipeline::{BuildContext, BuildReport, BuiltRoute, RouteFailure, build_routes},
    render,
};
use anyhow::{Context, Result};
use std::{fs, io, path::Path, path::PathBuf, sync::Arc};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    #[error("cannot prepare output directory `{}`", path.display())]
    Output {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Discover the route set and warn about entries that collide.
pub fn discover_route_table(config: &SiteConfig) -> Result<RouteTable, BuildError> {
    let table = RouteTable::new(discover_routes(&config.build.content)?);
    for route in table.duplicates() {
        log!(
            "warn";
            "several entries map to `{}`, building it once",
            route.url(&config.build.route_prefix)
        );
    }
    Ok(table)
}

/// Build every discovered route and write the pages that succeeded.
pub async fn build_site(config: &SiteConfig, catalog: Arc<dyn Catalog>) -> Result<BuildReport> {
    prepare_output(&config.build.output, config.build.clean)?;

    let table = discover_route_table(config)?;
    log!("build"; "{} routes discovered", table.len());

    let ctx = BuildContext::from_config(config, catalog);
    let progress = ProgressBars::new(&[("routes", table.len())]);
    let report = build_routes(&ctx, table.routes().cloned().collect(), config.build.jobs, |_, _| {
        progress.inc_by_name("routes")
    })
    .await;
    progress.finish();

    let report = write_pages(config, report).await?;
    log_build_result(&report, &config.build.route_prefix);

    Ok(report)
}

/// Write every built page, moving write failures into `failed`.
async fn write_pages(config: &SiteConfig, report: BuildReport) -> Result<BuildReport> {
    let config = config.clone();
    tokio::task::spawn_blocking(move || {
        let BuildReport { built, mut failed } = report;
        let mut written = Vec::with_capacity(built.len());

        for route in built {
            match render::write_page(&route.payload, &route.route, &config) {
                Ok(_) => written.push(route),
                Err(error) => failed.push(RouteFailure {
                    route: route.route,
                    error,
                }),
            }
        }

        failed.sort_by(|a, b| a.route.cmp(&b.route));
        BuildReport {
            built: written,
            failed,
        }
    })
    .await
    .context("page writer stopped unexpectedly")
}

/// Create the output directory, clearing it first when `clean` is set.
fn prepare_output(output: &Path, clean: bool) -> Result<(), BuildError> {
    let err = |source| BuildError::Output {
        path: output.to_path_buf(),
        source,
    };
    if clean && output.exists() {
        fs::remove_dir_all(output).map_err(err)?;
    }
    fs::create_dir_all(output).map_err(err)
}

fn log_build_result(report: &BuildReport, prefix: &str) {
    for RouteFailure { route, error } in &report.failed {
        log!("error"; "{}: {}", route.url(prefix), error_chain(error));
    }

    match (report.built.len(), report.failed.len()) {
        (0, 0) => log!("warn"; "output is empty, check the content directory"),
        (built, 0) => log!("build"; "done, {built} pages written"),
        (built, failed) => log!("build"; "{built} pages written, {failed} routes failed"),
    }
}

/// URLs of the pages a report wrote.
pub fn built_urls<'a>(built: &'a [BuiltRoute], prefix: &'a str) -> impl Iterator<Item = String> + 'a {
    built.iter().map(move |route| route.route.url(prefix))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MemoryCatalog;
    use serde_json::json;
    use tempfile::TempDir;

    fn project() -> (TempDir, SiteConfig) {
        let dir = TempDir::new().unwrap();
        let content = dir.path().join("content");
        fs::create_dir(&content).unwrap();
        fs::write(content.join("report_1.mdx"), "# Report one\n").unwrap();
        fs::write(
            content.join("air.md"),
            "---\ndatasets: [air-quality]\n---\n# Air\n",
        )
        .unwrap();

        let mut config = SiteConfig::default();
        config.build.content = content;
        config.build.output = dir.path().join("public");
        config.build.minify = false;
        config.set_root(dir.path());
        (dir, config)
    }

    fn catalog() -> Arc<dyn Catalog> {
        Arc::new(MemoryCatalog::new().with_dataset("air-quality", json!({ "title": "Air Quality" })))
    }

    #[tokio::test]
    async fn test_build_site_writes_pages() {
        let (dir, config) = project();
        let report = build_site(&config, catalog()).await.unwrap();

        assert!(report.is_success());
        let urls: Vec<_> = built_urls(&report.built, "stories").collect();
        assert_eq!(urls, ["/stories/air/", "/stories/report_1/"]);
        let air = fs::read_to_string(dir.path().join("public/stories/air/index.html")).unwrap();
        assert!(air.contains("Air Quality"));
    }

    #[tokio::test]
    async fn test_build_site_reports_failures() {
        let (dir, config) = project();
        fs::write(
            dir.path().join("content/broken.md"),
            "---\norgs: [unknown-org]\n---\n",
        )
        .unwrap();

        let report = build_site(&config, catalog()).await.unwrap();
        assert_eq!(report.built.len(), 2);
        assert_eq!(report.failed.len(), 1);
        assert!(!dir.path().join("public/stories/broken").exists());
    }

    #[tokio::test]
    async fn test_build_site_clean() {
        let (dir, mut config) = project();
        let stale = dir.path().join("public/stale.html");
        fs::create_dir_all(stale.parent().unwrap()).unwrap();
        fs::write(&stale, "old").unwrap();

        config.build.clean = true;
        build_site(&config, catalog()).await.unwrap();
        assert!(!stale.exists());
    }

    #[tokio::test]
    async fn test_build_site_missing_content_root() {
        let (dir, config) = project();
        fs::remove_dir_all(dir.path().join("content")).unwrap();

        let err = build_site(&config, catalog()).await.unwrap_err();
        assert!(err.downcast_ref::<BuildError>().is_some());
    }

    #[test]
    fn test_discover_route_table_dedupes() {
        let (dir, config) = project();
        fs::write(dir.path().join("content/air.mdx"), "# Air again\n").unwrap();

        let table = discover_route_table(&config).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.duplicates().len(), 1);
    }
}
