// Test mocks for the resolver.
//
// One mock per trait boundary:
// - MockSource (CandidateSource): fixed candidates, a failure, or a stall
// - MockPageFetcher (PageFetcher): HashMap-based URL→HTML
// - MockSearch (SearchProvider): HashMap-based query→hits
// - MockListing (ListingProvider): HashMap-based id→details
//
// Plus helpers for building raw candidates.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;

use profilematch_common::{Platform, Query, RawCandidate, SourceKind};

use crate::traits::{
    CandidateSource, ListingDetails, ListingProvider, PageFetcher, SearchHit, SearchProvider,
};

// ---------------------------------------------------------------------------
// MockSource
// ---------------------------------------------------------------------------

enum Behavior {
    Fixed(HashMap<Platform, Vec<RawCandidate>>),
    Fail(String),
    Stall(Duration),
}

/// Candidate source with scripted behavior. Counts how often it was called.
pub struct MockSource {
    kind: SourceKind,
    behavior: Behavior,
    calls: Arc<AtomicUsize>,
}

impl MockSource {
    /// Returns nothing until candidates are registered with `.on_platform()`.
    pub fn new(kind: SourceKind) -> Self {
        Self {
            kind,
            behavior: Behavior::Fixed(HashMap::new()),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Always errors.
    pub fn failing(kind: SourceKind, message: &str) -> Self {
        Self {
            behavior: Behavior::Fail(message.to_string()),
            ..Self::new(kind)
        }
    }

    /// Sleeps for `delay` and then returns nothing.
    pub fn stalling(kind: SourceKind, delay: Duration) -> Self {
        Self {
            behavior: Behavior::Stall(delay),
            ..Self::new(kind)
        }
    }

    pub fn on_platform(mut self, platform: Platform, candidates: Vec<RawCandidate>) -> Self {
        if let Behavior::Fixed(map) = &mut self.behavior {
            map.insert(platform, candidates);
        }
        self
    }

    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl CandidateSource for MockSource {
    fn kind(&self) -> SourceKind {
        self.kind
    }

    fn applies_to(&self, _query: &Query) -> bool {
        true
    }

    async fn fetch_candidates(&self, _query: &Query, platform: Platform) -> Result<Vec<RawCandidate>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            Behavior::Fixed(map) => Ok(map.get(&platform).cloned().unwrap_or_default()),
            Behavior::Fail(message) => bail!("MockSource: {message}"),
            Behavior::Stall(delay) => {
                tokio::time::sleep(*delay).await;
                Ok(Vec::new())
            }
        }
    }
}

// ---------------------------------------------------------------------------
// MockPageFetcher
// ---------------------------------------------------------------------------

/// Returns `Err` for unregistered URLs.
pub struct MockPageFetcher {
    pages: HashMap<String, String>,
    latency: Option<Duration>,
    calls: Arc<AtomicUsize>,
}

impl MockPageFetcher {
    pub fn new() -> Self {
        Self {
            pages: HashMap::new(),
            latency: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn on_page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_string(), html.to_string());
        self
    }

    /// Sleep before answering, so concurrent callers overlap.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

impl Default for MockPageFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PageFetcher for MockPageFetcher {
    async fn fetch_html(&self, url: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("MockPageFetcher: no page registered for {url}"))
    }
}

// ---------------------------------------------------------------------------
// MockSearch
// ---------------------------------------------------------------------------

/// Returns an empty hit list for unregistered queries.
pub struct MockSearch {
    results: HashMap<String, Vec<SearchHit>>,
}

impl MockSearch {
    pub fn new() -> Self {
        Self {
            results: HashMap::new(),
        }
    }

    pub fn on_search(mut self, query: &str, hits: Vec<SearchHit>) -> Self {
        self.results.insert(query.to_string(), hits);
        self
    }
}

impl Default for MockSearch {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SearchProvider for MockSearch {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>> {
        Ok(self
            .results
            .get(query)
            .map(|hits| hits.iter().take(max_results).cloned().collect())
            .unwrap_or_default())
    }
}

// ---------------------------------------------------------------------------
// MockListing
// ---------------------------------------------------------------------------

/// Returns `Err` for unregistered listing ids.
pub struct MockListing {
    listings: HashMap<String, ListingDetails>,
    latency: Option<Duration>,
    calls: Arc<AtomicUsize>,
}

impl MockListing {
    pub fn new() -> Self {
        Self {
            listings: HashMap::new(),
            latency: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn on_listing(mut self, listing_id: &str, details: ListingDetails) -> Self {
        self.listings.insert(listing_id.to_string(), details);
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

impl Default for MockListing {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ListingProvider for MockListing {
    async fn listing(&self, listing_id: &str) -> Result<ListingDetails> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        self.listings
            .get(listing_id)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("MockListing: no listing registered for {listing_id}"))
    }
}

// ---------------------------------------------------------------------------
// Candidate helpers
// ---------------------------------------------------------------------------

/// A search hit at `rank` with the page title as display text.
pub fn search_candidate(url: &str, title: &str, rank: u32) -> RawCandidate {
    RawCandidate::new(url, title, SourceKind::SearchResult, rank, 1.0, 1)
}

/// A link found on the business's own website.
pub fn website_candidate(url: &str, anchor_text: &str) -> RawCandidate {
    RawCandidate::new(url, anchor_text, SourceKind::WebsiteCrawl, 0, 1.0, 1)
}

/// A profile link from the business's map listing.
pub fn listing_candidate(url: &str, listing_name: &str) -> RawCandidate {
    RawCandidate::new(url, listing_name, SourceKind::MapListing, 0, 0.9, 1)
}
