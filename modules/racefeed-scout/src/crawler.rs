//! Crawl orchestrator.
//!
//! Walks the listing site page by page until a page has no entries or cannot
//! be fetched. Each unknown entry is enriched, merged, and persisted before
//! the next one starts, so an interrupted run loses at most the entry in
//! flight. Entries whose slug is already in the catalog are skipped without
//! any network call.

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::{Context, Result};
use filemoon_client::MirrorOutcome;
use racefeed_common::{CatalogEntry, StreamLinks};
use tracing::{debug, error, info, warn};

use crate::listing::{parse_listing, ListingEntry};
use crate::merge::merge;
use crate::sites::Sites;
use crate::sources::{cross_site, direct_mirror};
use crate::stats::CrawlStats;
use crate::store::{Catalog, CatalogStore, Upsert};
use crate::traits::{PageFetcher, RemoteMirror};

pub struct Crawler {
    fetcher: Arc<dyn PageFetcher>,
    mirror: Option<Arc<dyn RemoteMirror>>,
    store: CatalogStore,
    sites: Sites,
    max_pages: Option<u32>,
    refresh: HashSet<String>,
}

impl Crawler {
    pub fn new(fetcher: Arc<dyn PageFetcher>, store: CatalogStore, sites: Sites) -> Self {
        Self {
            fetcher,
            mirror: None,
            store,
            sites,
            max_pages: None,
            refresh: HashSet::new(),
        }
    }

    pub fn with_mirror(mut self, mirror: Arc<dyn RemoteMirror>) -> Self {
        self.mirror = Some(mirror);
        self
    }

    pub fn with_max_pages(mut self, max_pages: Option<u32>) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Slugs to scrape again even though the catalog already has them.
    pub fn with_refresh(mut self, slugs: impl IntoIterator<Item = String>) -> Self {
        self.refresh.extend(slugs);
        self
    }

    /// Crawl until pagination ends, updating `catalog` and the store as it goes.
    ///
    /// Only a failed catalog write aborts the run.
    pub async fn run(&self, catalog: &mut Catalog) -> Result<CrawlStats> {
        let mut stats = CrawlStats::default();
        let mut pending_refresh = self.refresh.clone();
        let mut page = 1;

        loop {
            if self.max_pages.is_some_and(|max| page > max) {
                info!(page, "Page limit reached");
                break;
            }

            let url = self.sites.page_url(page);
            info!(page, url = url.as_str(), "Scraping listing page");
            let html = match self.fetcher.fetch(&url).await {
                Ok(html) => html,
                Err(e) => {
                    error!(page, url = url.as_str(), error = %e, "Failed to fetch listing page, ending crawl");
                    stats.page_failures += 1;
                    break;
                }
            };

            let entries = parse_listing(&html, self.sites.listing_base());
            if entries.is_empty() {
                info!(page, "No entries on page, crawl complete");
                break;
            }
            stats.pages_crawled += 1;

            for entry in entries {
                stats.entries_seen += 1;
                let refreshing = pending_refresh.remove(&entry.slug);
                if !refreshing && catalog.contains(&entry.slug) {
                    info!(slug = entry.slug.as_str(), "Skipping already scraped");
                    stats.entries_skipped += 1;
                    continue;
                }
                self.process_entry(entry, catalog, &mut stats).await?;
            }

            page += 1;
        }

        if !pending_refresh.is_empty() {
            warn!(slugs = ?pending_refresh, "Refresh requested for slugs never seen on the listing");
        }

        stats.catalog_size = catalog.len();
        info!(
            total = catalog.len(),
            path = %self.store.path().display(),
            "Saved {} races",
            catalog.len()
        );
        Ok(stats)
    }

    async fn process_entry(
        &self,
        entry: ListingEntry,
        catalog: &mut Catalog,
        stats: &mut CrawlStats,
    ) -> Result<()> {
        let ListingEntry {
            title,
            link,
            slug,
            thumbnail,
            thumbnail_slug,
        } = entry;
        debug!(slug = slug.as_str(), title = title.as_str(), "Processing entry");

        let mut fresh = match direct_mirror::fetch(&*self.fetcher, &link, &self.sites.hosts).await {
            Ok(links) => links,
            Err(e) => {
                warn!(title = title.as_str(), slug = slug.as_str(), error = %e, "Failed to fetch streams");
                stats.detail_failures += 1;
                StreamLinks::new()
            }
        };

        if let Some(source) = fresh.server1.clone() {
            fresh.custom_server = self.mirror_source(&title, &slug, &source, stats).await;
        }

        let discovered = match cross_site::fetch(&*self.fetcher, &self.sites, &title).await {
            Ok(urls) => urls,
            Err(e) => {
                warn!(title = title.as_str(), slug = slug.as_str(), error = %e, "Failed to fetch cross-site streams");
                stats.search_failures += 1;
                Vec::new()
            }
        };
        stats.numbered_links_found += discovered.len() as u32;
        let fresh = fresh.with_discovered(discovered);

        let merged = merge(fresh, catalog.get(&slug));
        let link_count = merged.stream_links.len();
        let key = slug.clone();
        let outcome = catalog.upsert(CatalogEntry {
            id: merged.id,
            title,
            link,
            thumbnail,
            slug,
            thumbnail_slug,
            stream_links: merged.stream_links,
            extra: merged.extra,
        });

        self.store
            .save(catalog)
            .with_context(|| format!("Failed to write {}", self.store.path().display()))?;

        stats.entries_saved += 1;
        let refreshed = outcome == Upsert::Updated;
        if refreshed {
            stats.entries_refreshed += 1;
        }
        if let Some(saved) = catalog.get(&key) {
            info!(slug = key.as_str(), links = link_count, refreshed, "Saved {}", saved.title);
        }
        Ok(())
    }

    /// Remote-upload the primary mirror. Any failure just means no copy.
    async fn mirror_source(
        &self,
        title: &str,
        slug: &str,
        source: &str,
        stats: &mut CrawlStats,
    ) -> Option<String> {
        let mirror = self.mirror.as_ref()?;
        match mirror.mirror(source).await {
            Ok(MirrorOutcome::Mirrored(embed)) => {
                stats.mirrors_created += 1;
                Some(embed)
            }
            Ok(MirrorOutcome::Unmirrored) => {
                debug!(title, slug, "Remote upload produced no mirror");
                None
            }
            Err(e) => {
                warn!(title, slug, error = %e, "Remote upload failed");
                stats.mirror_failures += 1;
                None
            }
        }
    }
}
