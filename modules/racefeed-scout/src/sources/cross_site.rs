// Fuzzy cross-site search: find the same event on the secondary site and
// take every player frame from its page.
//
// The first result whose title is similar wins. Later, possibly better,
// results are never looked at.

use std::sync::LazyLock;

use anyhow::{Context, Result};
use racefeed_common::similar;
use scraper::Selector;
use tracing::debug;
use url::Url;

use crate::document::{selector, with_https_scheme, Document};
use crate::listing::absolutize;
use crate::sites::Sites;
use crate::traits::PageFetcher;

static RESULT_ITEM: LazyLock<Selector> =
    LazyLock::new(|| selector("li.col-xs-6.col-sm-4.col-md-3"));
static RESULT_LINK: LazyLock<Selector> = LazyLock::new(|| selector("h3 a"));
static PLAYER: LazyLock<Selector> = LazyLock::new(|| selector("#Playerholder"));
static FRAME: LazyLock<Selector> = LazyLock::new(|| selector("iframe"));

/// One row of the search results list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
}

/// Search for `title` and return the player frames of the first similar hit,
/// in page order. No similar hit is not an error.
pub async fn fetch(fetcher: &dyn PageFetcher, sites: &Sites, title: &str) -> Result<Vec<String>> {
    let search_url = sites.search_url(title);
    let html = fetcher
        .fetch(&search_url)
        .await
        .with_context(|| format!("searching {search_url}"))?;

    let hits = parse_results(&html, sites.search_base());
    let Some(hit) = hits.into_iter().find(|hit| similar(&hit.title, title)) else {
        debug!(title, "No similar cross-site result");
        return Ok(Vec::new());
    };
    debug!(title, found = hit.title.as_str(), url = hit.url.as_str(), "Similar cross-site result");

    let detail = fetcher
        .fetch(&hit.url)
        .await
        .with_context(|| format!("fetching cross-site page {}", hit.url))?;
    Ok(player_frames(&detail))
}

/// Result rows that carry both a title and a link.
pub fn parse_results(html: &str, base: &Url) -> Vec<SearchHit> {
    let doc = Document::parse(html);
    let hits = doc
        .find_all(&RESULT_ITEM)
        .into_iter()
        .filter_map(|item| item.find_first(&RESULT_LINK))
        .filter_map(|link| {
            let url = absolutize(base, link.attribute("href")?)?;
            Some(SearchHit {
                title: link.text(),
                url,
            })
        })
        .collect();
    hits
}

/// `src` of every frame inside the player container.
pub fn player_frames(html: &str) -> Vec<String> {
    let doc = Document::parse(html);
    let Some(player) = doc.find_first(&PLAYER) else {
        return Vec::new();
    };
    let frames = player
        .find_all(&FRAME)
        .into_iter()
        .filter_map(|frame| frame.attribute("src"))
        .map(with_https_scheme)
        .collect();
    frames
}
