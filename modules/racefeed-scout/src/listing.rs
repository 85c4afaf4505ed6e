// Primary listing site: one page of catalog entries.

use std::sync::LazyLock;

use scraper::Selector;
use tracing::debug;
use url::Url;

use crate::document::{selector, Document};

static ENTRY_BLOCK: LazyLock<Selector> = LazyLock::new(|| selector("#allEntries .short_item"));
static TITLE_LINK: LazyLock<Selector> = LazyLock::new(|| selector("h3 a"));
static POSTER: LazyLock<Selector> = LazyLock::new(|| selector(".poster img"));

/// An entry as it appears on a listing page, before any enrichment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    pub title: String,
    pub link: String,
    pub slug: String,
    pub thumbnail: String,
    pub thumbnail_slug: String,
}

/// Extract entries from a listing page in listing order.
///
/// Blocks without a title link, or whose link yields no slug, are skipped.
pub fn parse_listing(html: &str, base: &Url) -> Vec<ListingEntry> {
    let doc = Document::parse(html);
    let mut entries = Vec::new();

    for block in doc.find_all(&ENTRY_BLOCK) {
        let Some(title_link) = block.find_first(&TITLE_LINK) else {
            continue;
        };
        let Some(link) = title_link
            .attribute("href")
            .and_then(|href| absolutize(base, href))
        else {
            debug!(title = %title_link.text(), "Entry has no usable link");
            continue;
        };
        let Some(slug) = slug_from_link(&link) else {
            debug!(link = link.as_str(), "Entry link has no slug");
            continue;
        };

        let thumbnail = block
            .find_first(&POSTER)
            .and_then(|img| img.attribute("src"))
            .and_then(|src| absolutize(base, src))
            .unwrap_or_default();

        entries.push(ListingEntry {
            title: title_link.text(),
            thumbnail_slug: thumbnail_slug(&thumbnail),
            link,
            slug,
            thumbnail,
        });
    }

    entries
}

/// Resolve `href` against the listing site. Absolute URLs pass through.
pub fn absolutize(base: &Url, href: &str) -> Option<String> {
    if href.starts_with("http://") || href.starts_with("https://") {
        return Some(href.to_string());
    }
    base.join(href).ok().map(|u| u.to_string())
}

/// Last non-empty path segment of `link`, without a `.html` suffix.
pub fn slug_from_link(link: &str) -> Option<String> {
    let path = match Url::parse(link) {
        Ok(url) => url.path().to_string(),
        Err(_) => link.to_string(),
    };
    path.split('/')
        .rev()
        .find(|segment| !segment.is_empty())
        .map(|segment| segment.replacen(".html", "", 1))
        .filter(|slug| !slug.is_empty())
}

/// `/` followed by the last three path segments of the thumbnail URL.
pub fn thumbnail_slug(thumbnail: &str) -> String {
    let segments: Vec<&str> = thumbnail.split('/').collect();
    let tail = &segments[segments.len().saturating_sub(3)..];
    format!("/{}", tail.join("/"))
}
