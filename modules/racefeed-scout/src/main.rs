use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use filemoon_client::{FilemoonClient, FilemoonError};
use racefeed_common::Config;
use racefeed_scout::{crawler::Crawler, fetch::HttpFetcher, sites::Sites, store::CatalogStore};

#[derive(Parser, Debug)]
#[command(name = "racefeed-scout")]
#[command(about = "Crawl the race listing and keep the stream catalog up to date")]
#[command(version)]
struct Cli {
    /// Catalog file to read and rewrite (overrides RACEFEED_CATALOG_PATH)
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Stop after this many listing pages (overrides RACEFEED_MAX_PAGES)
    #[arg(long)]
    max_pages: Option<u32>,

    /// Attempts per page fetch; 1 disables retry (overrides RACEFEED_FETCH_ATTEMPTS)
    #[arg(long)]
    attempts: Option<u32>,

    /// Scrape this slug again even if already in the catalog (repeatable)
    #[arg(long = "refresh", value_name = "SLUG")]
    refresh: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("racefeed_scout=info".parse()?)
                .add_directive("racefeed_common=info".parse()?)
                .add_directive("filemoon_client=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    let mut config = Config::from_env()?;
    if let Some(path) = cli.catalog {
        config.catalog_path = path;
    }
    if cli.max_pages.is_some() {
        config.max_pages = cli.max_pages;
    }
    if let Some(attempts) = cli.attempts {
        config.fetch_attempts = attempts.max(1);
    }
    config.log();

    let sites = Sites::from_config(&config)?;
    let fetcher = Arc::new(HttpFetcher::new(config.fetch_attempts)?);
    let store = CatalogStore::new(&config.catalog_path);
    let mut catalog = store.load();

    let mut crawler = Crawler::new(fetcher, store, sites)
        .with_max_pages(config.max_pages)
        .with_refresh(cli.refresh);

    match FilemoonClient::from_env(&config.filemoon_api_url, &config.filemoon_embed_url) {
        Ok(client) => crawler = crawler.with_mirror(Arc::new(client)),
        Err(FilemoonError::MissingKey) => {
            warn!("FILEMOON_API_KEY not set, remote mirroring disabled")
        }
        Err(e) => return Err(e.into()),
    }

    info!(known = catalog.len(), "Starting crawl");
    let stats = crawler.run(&mut catalog).await?;
    info!("{stats}");

    Ok(())
}
