//! Site-restricted web search for the business name.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;

use profilematch_common::{Platform, Query, RawCandidate, SourceKind};

use crate::canonical::canonicalize;
use crate::policy::PlatformPolicy;
use crate::traits::{CandidateSource, SearchHit, SearchProvider};

const SEARCH_CONFIDENCE: f64 = 1.0;

pub struct SearchSource {
    provider: Arc<dyn SearchProvider>,
    max_results: usize,
}

impl SearchSource {
    pub fn new(provider: Arc<dyn SearchProvider>, max_results: usize) -> Self {
        Self {
            provider,
            max_results: max_results.max(1),
        }
    }
}

#[async_trait]
impl CandidateSource for SearchSource {
    fn kind(&self) -> SourceKind {
        SourceKind::SearchResult
    }

    fn applies_to(&self, _query: &Query) -> bool {
        true
    }

    async fn fetch_candidates(&self, query: &Query, platform: Platform) -> Result<Vec<RawCandidate>> {
        let q = site_query(platform, query.business_name());
        let hits = self
            .provider
            .search(&q, self.max_results)
            .await
            .with_context(|| format!("searching {q:?}"))?;

        Ok(candidates_from_hits(&hits, platform))
    }
}

/// `site:<primary domain> "<business name>"`, with quotes dropped from the name.
pub fn site_query(platform: Platform, business_name: &str) -> String {
    let domain = PlatformPolicy::builtin(platform).rules.primary_domain();
    let name: String = business_name
        .chars()
        .filter(|c| !matches!(c, '"' | '\u{201c}' | '\u{201d}'))
        .collect();
    format!("site:{domain} \"{}\"", name.trim())
}

/// Each hit keeps its position as rank. Hits that canonicalize to the same profile
/// share an occurrence count.
pub fn candidates_from_hits(hits: &[SearchHit], platform: Platform) -> Vec<RawCandidate> {
    let keys: Vec<Option<String>> = hits
        .iter()
        .map(|hit| canonicalize(platform, &hit.url).profile().map(|i| i.key))
        .collect();

    let mut counts: HashMap<&str, u32> = HashMap::new();
    for key in keys.iter().flatten() {
        *counts.entry(key.as_str()).or_default() += 1;
    }

    hits.iter()
        .zip(&keys)
        .enumerate()
        .map(|(rank, (hit, key))| {
            let occurrences = key
                .as_deref()
                .and_then(|k| counts.get(k).copied())
                .unwrap_or(1);
            RawCandidate::new(
                hit.url.as_str(),
                hit.title.as_str(),
                SourceKind::SearchResult,
                u32::try_from(rank).unwrap_or(u32::MAX),
                SEARCH_CONFIDENCE,
                occurrences,
            )
        })
        .collect()
}
