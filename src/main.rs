//! storyfold - static story pages enriched with CKAN catalog metadata.

use anyhow::{Context, Result, bail};
use clap::Parser;
use std::sync::Arc;
use storyfold::{
    build::{build_site, discover_route_table},
    catalog::CkanClient,
    cli::{Cli, Commands},
    config::SiteConfig,
    init::new_project,
    log,
    pipeline::BuildReport,
    serve::serve_site,
};
use tokio::runtime::Runtime;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = SiteConfig::load(&cli)?;

    match &cli.command {
        Commands::Init { name } => new_project(&config, name.is_some()),
        Commands::Routes => print_routes(&config),
        Commands::Build { .. } => {
            let report = build_all(&config)?;
            if !report.is_success() {
                bail!("{} of {} routes failed", report.failed.len(), report.total());
            }
            Ok(())
        }
        Commands::Serve { .. } => {
            let report = build_all(&config)?;
            if !report.is_success() {
                log!("warn"; "serving with {} failed routes", report.failed.len());
            }
            serve_site(&config, &discover_route_table(&config)?)
        }
    }
}

fn runtime() -> Result<Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")
}

/// Build every route against the configured catalog.
fn build_all(config: &SiteConfig) -> Result<BuildReport> {
    let catalog = CkanClient::new(&config.catalog).context("Failed to create catalog client")?;
    log!("catalog"; "{}", config.catalog.endpoint());
    runtime()?.block_on(build_site(config, Arc::new(catalog)))
}

fn print_routes(config: &SiteConfig) -> Result<()> {
    let table = discover_route_table(config)?;
    for route in table.routes() {
        println!("{}", route.url(&config.build.route_prefix));
    }
    Ok(())
}
