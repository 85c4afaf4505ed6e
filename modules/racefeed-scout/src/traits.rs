// Trait abstractions for the crawl's network dependencies.
//
// PageFetcher: every HTML page the crawl reads: listing pages, entry detail
//   pages, cross-site search and result pages.
// RemoteMirror: the remote-upload hop that re-hosts one stream.
//
// MockFetcher and MockMirror in `testing` implement both without a network.

use anyhow::Result;
use async_trait::async_trait;

use filemoon_client::{FilemoonClient, MirrorOutcome};

// ---------------------------------------------------------------------------
// PageFetcher
// ---------------------------------------------------------------------------

#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch a page and return its body as text.
    async fn fetch(&self, url: &str) -> Result<String>;
}

// ---------------------------------------------------------------------------
// RemoteMirror
// ---------------------------------------------------------------------------

#[async_trait]
pub trait RemoteMirror: Send + Sync {
    /// Re-host `source_url` and report the embed URL of the copy, if any.
    async fn mirror(&self, source_url: &str) -> Result<MirrorOutcome>;
}

#[async_trait]
impl RemoteMirror for FilemoonClient {
    async fn mirror(&self, source_url: &str) -> Result<MirrorOutcome> {
        Ok(FilemoonClient::mirror(self, source_url).await?)
    }
}
