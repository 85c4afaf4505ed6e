// Direct mirrors linked from the entry's own detail page.

use std::sync::LazyLock;

use anyhow::{Context, Result};
use racefeed_common::StreamLinks;
use scraper::Selector;

use crate::document::{selector, with_https_scheme, Document};
use crate::hosts::HostTable;
use crate::traits::PageFetcher;

static LINK_OR_FRAME: LazyLock<Selector> = LazyLock::new(|| selector("a, iframe"));

/// Fetch the detail page and pick out the first link for each known host.
pub async fn fetch(
    fetcher: &dyn PageFetcher,
    detail_url: &str,
    hosts: &HostTable,
) -> Result<StreamLinks> {
    let html = fetcher
        .fetch(detail_url)
        .await
        .with_context(|| format!("fetching detail page {detail_url}"))?;
    Ok(extract(&html, hosts))
}

/// Labelled links from a detail page's HTML.
pub fn extract(html: &str, hosts: &HostTable) -> StreamLinks {
    let candidates = candidate_urls(html);
    let mut links = StreamLinks::new();
    for (label, url) in hosts.first_matches(&candidates) {
        links.insert(label, url);
    }
    links
}

/// `href` (falling back to `src`) of every link and frame, in document order.
pub fn candidate_urls(html: &str) -> Vec<String> {
    Document::parse(html)
        .find_all(&LINK_OR_FRAME)
        .into_iter()
        .filter_map(|node| node.attribute("href").or_else(|| node.attribute("src")))
        .map(with_https_scheme)
        .collect()
}
