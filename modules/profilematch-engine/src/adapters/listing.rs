//! Website and social fields on the business's map listing.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;

use profilematch_common::{Platform, Query, RawCandidate, SourceKind};

use crate::canonical::{canonicalize, is_platform_url};
use crate::traits::{CandidateSource, ListingDetails, ListingProvider};

/// First-party, but listings are edited by third parties too.
const LISTING_CONFIDENCE: f64 = 0.9;

pub struct ListingSource {
    provider: Arc<dyn ListingProvider>,
}

impl ListingSource {
    pub fn new(provider: Arc<dyn ListingProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl CandidateSource for ListingSource {
    fn kind(&self) -> SourceKind {
        SourceKind::MapListing
    }

    fn applies_to(&self, query: &Query) -> bool {
        query.external_listing_id().is_some()
    }

    async fn fetch_candidates(&self, query: &Query, platform: Platform) -> Result<Vec<RawCandidate>> {
        let Some(listing_id) = query.external_listing_id() else {
            return Ok(Vec::new());
        };

        let details = self
            .provider
            .listing(listing_id)
            .await
            .with_context(|| format!("looking up listing {listing_id}"))?;

        Ok(candidates_from_listing(&details, platform))
    }
}

pub fn candidates_from_listing(details: &ListingDetails, platform: Platform) -> Vec<RawCandidate> {
    let mut by_key: HashMap<String, usize> = HashMap::new();
    let mut candidates: Vec<RawCandidate> = Vec::new();

    let links = details
        .website
        .iter()
        .chain(details.social_links.iter())
        .filter(|url| is_platform_url(platform, url));

    for url in links {
        let key = canonicalize(platform, url).profile().map(|i| i.key);
        if let Some(index) = key.as_ref().and_then(|k| by_key.get(k)) {
            candidates[*index].occurrence_within_source += 1;
            continue;
        }
        if let Some(key) = key {
            by_key.insert(key, candidates.len());
        }
        candidates.push(RawCandidate::new(
            url.as_str(),
            details.name.as_str(),
            SourceKind::MapListing,
            0,
            LISTING_CONFIDENCE,
            1,
        ));
    }

    candidates
}
