// Test mocks for the crawl pipeline.
//
// Two mocks matching the two trait boundaries:
// - MockFetcher (PageFetcher): HashMap-based URL→HTML, records every request
// - MockMirror (RemoteMirror): HashMap-based source→outcome, records every call
//
// Plus HTML builders shaped like the real listing, detail, search, and
// player pages.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use anyhow::{bail, Result};
use async_trait::async_trait;
use filemoon_client::MirrorOutcome;

use crate::traits::{PageFetcher, RemoteMirror};

// ---------------------------------------------------------------------------
// MockFetcher
// ---------------------------------------------------------------------------

/// HashMap-based page fetcher. Returns `Err` for unregistered URLs.
/// Builder pattern: `.on_page()`, `.panic_on()`.
#[derive(Default)]
pub struct MockFetcher {
    pages: HashMap<String, String>,
    panics: HashSet<String>,
    requests: Mutex<Vec<String>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_string(), html.to_string());
        self
    }

    /// Simulate the process dying while this URL is being fetched.
    pub fn panic_on(mut self, url: &str) -> Self {
        self.panics.insert(url.to_string());
        self
    }

    /// Every URL requested so far, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requested(&self, url: &str) -> bool {
        self.requests.lock().unwrap().iter().any(|u| u == url)
    }

    /// Requests whose URL contains `fragment`.
    pub fn requests_containing(&self, fragment: &str) -> Vec<String> {
        self.requests()
            .into_iter()
            .filter(|u| u.contains(fragment))
            .collect()
    }
}

#[async_trait]
impl PageFetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        self.requests.lock().unwrap().push(url.to_string());
        if self.panics.contains(url) {
            panic!("MockFetcher: simulated crash fetching {url}");
        }
        match self.pages.get(url) {
            Some(html) => Ok(html.clone()),
            None => bail!("MockFetcher: no page registered for {url}"),
        }
    }
}

// ---------------------------------------------------------------------------
// MockMirror
// ---------------------------------------------------------------------------

/// HashMap-based remote mirror. Unregistered sources are `Unmirrored`;
/// sources registered with `.failing()` return `Err`.
#[derive(Default)]
pub struct MockMirror {
    embeds: HashMap<String, String>,
    failures: HashSet<String>,
    calls: Mutex<Vec<String>>,
}

impl MockMirror {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_source(mut self, source_url: &str, embed_url: &str) -> Self {
        self.embeds
            .insert(source_url.to_string(), embed_url.to_string());
        self
    }

    pub fn failing(mut self, source_url: &str) -> Self {
        self.failures.insert(source_url.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl RemoteMirror for MockMirror {
    async fn mirror(&self, source_url: &str) -> Result<MirrorOutcome> {
        self.calls.lock().unwrap().push(source_url.to_string());
        if self.failures.contains(source_url) {
            bail!("MockMirror: simulated upload failure for {source_url}");
        }
        Ok(match self.embeds.get(source_url) {
            Some(embed) => MirrorOutcome::Mirrored(embed.clone()),
            None => MirrorOutcome::Unmirrored,
        })
    }
}

// ---------------------------------------------------------------------------
// HTML builders
// ---------------------------------------------------------------------------

/// One listing block: title, detail link, optional thumbnail.
pub struct ListingItem<'a> {
    pub title: &'a str,
    pub href: &'a str,
    pub thumbnail: Option<&'a str>,
}

pub fn listing_item<'a>(title: &'a str, href: &'a str) -> ListingItem<'a> {
    ListingItem {
        title,
        href,
        thumbnail: None,
    }
}

/// A listing page in the primary site's layout.
pub fn listing_page(items: &[ListingItem<'_>]) -> String {
    let blocks: String = items
        .iter()
        .map(|item| {
            let poster = item
                .thumbnail
                .map(|src| format!(r#"<div class="poster"><img src="{src}"></div>"#))
                .unwrap_or_default();
            format!(
                r#"<div class="short_item">{poster}<h3><a href="{}">{}</a></h3></div>"#,
                item.href, item.title
            )
        })
        .collect();
    format!(r#"<html><body><div id="allEntries">{blocks}</div></body></html>"#)
}

/// A detail page linking each URL as an anchor.
pub fn detail_page(urls: &[&str]) -> String {
    let links: String = urls
        .iter()
        .map(|u| format!(r#"<p><a href="{u}" target="_blank">Watch</a></p>"#))
        .collect();
    format!(r#"<html><body><div class="full-text">{links}</div></body></html>"#)
}

/// A secondary-site search results page.
pub fn search_page(results: &[(&str, &str)]) -> String {
    let items: String = results
        .iter()
        .map(|(title, href)| {
            format!(
                r#"<li class="col-xs-6 col-sm-4 col-md-3"><div class="thumbnail"><h3><a href="{href}">{title}</a></h3></div></li>"#
            )
        })
        .collect();
    format!(r#"<html><body><ul class="row pm-ul-browse-videos">{items}</ul></body></html>"#)
}

/// A secondary-site result page with frames inside the player container.
pub fn player_page(srcs: &[&str]) -> String {
    let frames: String = srcs
        .iter()
        .map(|s| format!(r#"<iframe src="{s}" allowfullscreen></iframe>"#))
        .collect();
    format!(r#"<html><body><div id="Playerholder">{frames}</div></body></html>"#)
}
