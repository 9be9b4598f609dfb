//! Concrete [`CandidateSource`]s, one per source kind.

use std::sync::Arc;

use anyhow::Result;
use tracing::warn;

use profilematch_common::ResolverConfig;

use crate::cache::{CachedListingProvider, CachedPageFetcher};
use crate::services::{HttpPageFetcher, PlacesListingProvider, SerperSearch};
use crate::traits::CandidateSource;

pub mod listing;
pub mod search;
pub mod website;

pub use listing::ListingSource;
pub use search::SearchSource;
pub use website::WebsiteSource;

/// Every source the configuration has credentials for. The website crawl needs none.
pub fn default_sources(config: &ResolverConfig) -> Result<Vec<Arc<dyn CandidateSource>>> {
    let mut sources: Vec<Arc<dyn CandidateSource>> = Vec::new();

    let pages = CachedPageFetcher::new(HttpPageFetcher::new()?, config.page_cache_ttl);
    sources.push(Arc::new(WebsiteSource::new(Arc::new(pages))));

    match &config.places_api_key {
        Some(key) => {
            let places =
                CachedListingProvider::new(PlacesListingProvider::new(key)?, config.page_cache_ttl);
            sources.push(Arc::new(ListingSource::new(Arc::new(places))));
        }
        None => warn!("GOOGLE_PLACES_API_KEY not set, map-listing source disabled"),
    }

    match &config.serper_api_key {
        Some(key) => {
            let serper = SerperSearch::new(key)?;
            sources.push(Arc::new(SearchSource::new(
                Arc::new(serper),
                config.search_max_results,
            )));
        }
        None => warn!("SERPER_API_KEY not set, search-result source disabled"),
    }

    Ok(sources)
}
