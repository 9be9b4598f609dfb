// Plain HTTP page fetcher for business websites.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use tracing::{info, warn};

use crate::traits::PageFetcher;

const FETCH_TIMEOUT: Duration = Duration::from_secs(15);
/// Footer links sit at the end of the page, so the cap is generous.
const MAX_BODY_BYTES: usize = 2_000_000;
const USER_AGENT: &str = "Mozilla/5.0 (compatible; profilematch/0.1)";

pub struct HttpPageFetcher {
    client: reqwest::Client,
}

impl HttpPageFetcher {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch_html(&self, url: &str) -> Result<String> {
        let parsed = url::Url::parse(url).context("Invalid URL")?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            bail!("Only http/https URLs allowed, got: {}", parsed.scheme());
        }

        info!(url, "page: fetching");
        let mut resp = self
            .client
            .get(parsed)
            .send()
            .await
            .with_context(|| format!("GET {url} failed"))?;

        let status = resp.status();
        if !status.is_success() {
            warn!(url, status = status.as_u16(), "page: non-success status");
            bail!("GET {url} returned {status}");
        }

        let mut body: Vec<u8> = Vec::new();
        while let Some(chunk) = resp.chunk().await.context("Failed to read page body")? {
            body.extend_from_slice(&chunk);
            if body.len() >= MAX_BODY_BYTES {
                warn!(url, limit = MAX_BODY_BYTES, "page: body truncated");
                break;
            }
        }

        let html = decode_capped(&body, MAX_BODY_BYTES);
        info!(url, bytes = html.len(), "page: fetched successfully");
        Ok(html)
    }
}

/// At most `max` bytes of `body` as text. A character split by the cut becomes U+FFFD.
fn decode_capped(body: &[u8], max: usize) -> String {
    String::from_utf8_lossy(&body[..body.len().min(max)]).into_owned()
}
