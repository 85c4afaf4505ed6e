// Upstream site addresses and URL construction.

use anyhow::{Context, Result};
use racefeed_common::Config;
use url::Url;

use crate::hosts::HostTable;

#[derive(Debug, Clone)]
pub struct Sites {
    listing: Url,
    search: Url,
    pub hosts: HostTable,
}

impl Sites {
    pub fn new(listing_url: &str, search_url: &str) -> Result<Self> {
        Ok(Self {
            listing: directory_url(listing_url).context("Invalid listing site URL")?,
            search: directory_url(search_url).context("Invalid search site URL")?,
            hosts: HostTable::default(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(&config.listing_url, &config.search_url)
    }

    pub fn with_hosts(mut self, hosts: HostTable) -> Self {
        self.hosts = hosts;
        self
    }

    pub fn listing_base(&self) -> &Url {
        &self.listing
    }

    pub fn search_base(&self) -> &Url {
        &self.search
    }

    /// Page 1 is the site root; later pages use the `?page{n}` query.
    pub fn page_url(&self, page: u32) -> String {
        if page <= 1 {
            self.listing.to_string()
        } else {
            format!("{}?page{page}", self.listing)
        }
    }

    /// Keyword search on the secondary site.
    pub fn search_url(&self, title: &str) -> String {
        let mut url = self
            .search
            .join("search.php")
            .unwrap_or_else(|_| self.search.clone());
        url.query_pairs_mut().clear().append_pair("keywords", title);
        url.to_string()
    }
}

/// Parse `raw` and make sure its path ends in `/` so relative joins stay inside it.
fn directory_url(raw: &str) -> Result<Url, url::ParseError> {
    let mut url = Url::parse(raw)?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}
