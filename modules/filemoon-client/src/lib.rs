pub mod error;
pub mod types;

pub use error::{FilemoonError, Result};
pub use types::{MirrorOutcome, RemoteUploadInput, RemoteUploadResponse};

use std::time::Duration;

const DEFAULT_API_URL: &str = "https://filemoonapi.com/api";
const DEFAULT_EMBED_URL: &str = "https://filemoon.sx/e";

pub struct FilemoonClient {
    client: reqwest::Client,
    api_url: String,
    embed_url: String,
    api_key: String,
}

impl FilemoonClient {
    pub fn new(api_key: String) -> Result<Self> {
        Self::with_endpoints(api_key, DEFAULT_API_URL, DEFAULT_EMBED_URL)
    }

    pub fn with_endpoints(api_key: String, api_url: &str, embed_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            embed_url: embed_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    /// Build a client from `FILEMOON_API_KEY`.
    pub fn from_env(api_url: &str, embed_url: &str) -> Result<Self> {
        let api_key = std::env::var("FILEMOON_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or(FilemoonError::MissingKey)?;
        Self::with_endpoints(api_key, api_url, embed_url)
    }

    /// Ask Filemoon to pull `source_url` onto its own hosting.
    pub async fn remote_upload(&self, source_url: &str) -> Result<RemoteUploadResponse> {
        let endpoint = format!("{}/remote/add", self.api_url);
        let input = RemoteUploadInput {
            key: &self.api_key,
            url: source_url,
        };

        let resp = self.client.post(&endpoint).form(&input).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(FilemoonError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body = resp.text().await?;
        let parsed: RemoteUploadResponse = serde_json::from_str(&body)?;
        if let Some(status) = parsed.api_status().filter(|s| *s != 200) {
            tracing::warn!(source_url, status, msg = ?parsed.msg, "Remote upload refused");
        }
        parsed.check()
    }

    /// Remote-upload `source_url` and return the embed URL of the copy.
    pub async fn mirror(&self, source_url: &str) -> Result<MirrorOutcome> {
        tracing::debug!(source_url, "Submitting remote upload");
        let resp = self.remote_upload(source_url).await?;
        if let Some(msg) = resp.msg.as_deref() {
            tracing::debug!(source_url, msg, "Remote upload answered");
        }
        let outcome = resp.into_outcome(&self.embed_url);
        match &outcome {
            MirrorOutcome::Mirrored(embed) => {
                tracing::info!(source_url, embed = embed.as_str(), "Mirrored")
            }
            MirrorOutcome::Unmirrored => tracing::warn!(source_url, "Remote upload returned no file"),
        }
        Ok(outcome)
    }
}
