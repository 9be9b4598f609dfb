// Trait seams for everything that touches the network.
//
// CandidateSource is what the resolver fans out over. PageFetcher, SearchProvider and
// ListingProvider are the collaborators the concrete sources are built on; the mocks in
// `testing` implement all four.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use profilematch_common::{Platform, Query, RawCandidate, SourceKind};

// ---------------------------------------------------------------------------
// CandidateSource
// ---------------------------------------------------------------------------

#[async_trait]
pub trait CandidateSource: Send + Sync {
    fn kind(&self) -> SourceKind;

    /// Whether the query carries what this source needs (a website, a listing id, ...).
    fn applies_to(&self, query: &Query) -> bool;

    /// Per-source override of the resolver's adapter timeout.
    fn timeout(&self) -> Option<Duration> {
        None
    }

    /// Raw candidates for one platform. Errors are contained by the resolver.
    async fn fetch_candidates(&self, query: &Query, platform: Platform) -> Result<Vec<RawCandidate>>;
}

// ---------------------------------------------------------------------------
// Collaborators
// ---------------------------------------------------------------------------

#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Raw HTML of the page at `url`.
    async fn fetch_html(&self, url: &str) -> Result<String>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub url: String,
    pub title: String,
    #[serde(default)]
    pub snippet: String,
}

#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Ranked web results, best first.
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>>;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListingDetails {
    pub name: String,
    pub website: Option<String>,
    #[serde(default)]
    pub social_links: Vec<String>,
}

#[async_trait]
pub trait ListingProvider: Send + Sync {
    async fn listing(&self, listing_id: &str) -> Result<ListingDetails>;
}
