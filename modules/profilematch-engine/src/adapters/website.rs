//! Links the business publishes on its own website.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::debug;

use profilematch_common::{Platform, Query, RawCandidate, SourceKind};

use crate::canonical::{canonicalize, is_platform_url};
use crate::links::extract_anchors;
use crate::traits::{CandidateSource, PageFetcher};

/// The business linked the profile itself.
const WEBSITE_CONFIDENCE: f64 = 1.0;

pub struct WebsiteSource {
    fetcher: Arc<dyn PageFetcher>,
}

impl WebsiteSource {
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl CandidateSource for WebsiteSource {
    fn kind(&self) -> SourceKind {
        SourceKind::WebsiteCrawl
    }

    fn applies_to(&self, query: &Query) -> bool {
        query.website_url().is_some()
    }

    async fn fetch_candidates(&self, query: &Query, platform: Platform) -> Result<Vec<RawCandidate>> {
        let Some(website) = query.website_url() else {
            return Ok(Vec::new());
        };
        let page_url = with_scheme(website);

        let html = self
            .fetcher
            .fetch_html(&page_url)
            .await
            .with_context(|| format!("fetching website {page_url}"))?;

        let candidates = candidates_from_html(&html, &page_url, platform);
        debug!(
            platform = %platform,
            url = page_url.as_str(),
            count = candidates.len(),
            "website: extracted profile links"
        );
        Ok(candidates)
    }
}

/// One candidate per distinct profile, ranked by first appearance on the page, with
/// `occurrence_within_source` counting repeat links (header + footer, etc.). Links on the
/// platform's hosts that are not profiles pass through once each so they are logged on rejection.
pub fn candidates_from_html(html: &str, page_url: &str, platform: Platform) -> Vec<RawCandidate> {
    // key -> index into `candidates`
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut candidates: Vec<RawCandidate> = Vec::new();

    for anchor in extract_anchors(html, page_url) {
        if !is_platform_url(platform, &anchor.url) {
            continue;
        }

        let key = canonicalize(platform, &anchor.url).profile().map(|i| i.key);
        if let Some(index) = key.as_ref().and_then(|k| seen.get(k)) {
            let existing = &mut candidates[*index];
            existing.occurrence_within_source += 1;
            if existing.display_text.is_empty() {
                existing.display_text = anchor.text;
            }
            continue;
        }

        let rank = u32::try_from(candidates.len()).unwrap_or(u32::MAX);
        if let Some(key) = key {
            seen.insert(key, candidates.len());
        }
        candidates.push(RawCandidate::new(
            anchor.url,
            anchor.text,
            SourceKind::WebsiteCrawl,
            rank,
            WEBSITE_CONFIDENCE,
            1,
        ));
    }

    candidates
}

fn with_scheme(url: &str) -> String {
    if url.contains("://") {
        url.to_string()
    } else {
        format!("https://{url}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockPageFetcher;

    const ACME_HOME: &str = r#"
        <html><body>
          <nav><a href="https://www.facebook.com/AcmeRoofing/">Facebook</a></nav>
          <p>Call us today.</p>
          <a href="https://www.facebook.com/sharer/sharer.php?u=acmeroofing.com">Share</a>
          <a href="/contact">Contact</a>
          <footer>
            <a href="https://instagram.com/acme.roofing" aria-label="Instagram"><i></i></a>
            <a href="https://facebook.com/acmeroofing">Like us on Facebook</a>
          </footer>
        </body></html>
    "#;

    #[test]
    fn counts_repeat_links_and_ranks_by_first_appearance() {
        let candidates = candidates_from_html(ACME_HOME, "https://acmeroofing.com/", Platform::Facebook);

        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].source_url, "https://www.facebook.com/AcmeRoofing/");
        assert_eq!(candidates[0].occurrence_within_source, 2);
        assert_eq!(candidates[0].source_rank, 0);
        assert_eq!(candidates[0].source_kind, SourceKind::WebsiteCrawl);
        assert_eq!(candidates[0].source_confidence, 1.0);

        // share link is passed through for the canonicalizer to reject
        assert!(candidates[1].source_url.contains("sharer"));
        assert_eq!(candidates[1].source_rank, 1);
    }

    #[test]
    fn other_platforms_are_filtered_out() {
        let candidates = candidates_from_html(ACME_HOME, "https://acmeroofing.com/", Platform::Instagram);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].display_text, "Instagram");

        let candidates = candidates_from_html(ACME_HOME, "https://acmeroofing.com/", Platform::TikTok);
        assert!(candidates.is_empty());
    }

    #[tokio::test]
    async fn fetches_the_query_website() {
        let fetcher = MockPageFetcher::new().on_page("https://acmeroofing.com", ACME_HOME);
        let source = WebsiteSource::new(Arc::new(fetcher));
        let query = Query::new("Acme Roofing", Some("acmeroofing.com".into()), None).unwrap();

        assert!(source.applies_to(&query));
        let candidates = source.fetch_candidates(&query, Platform::Facebook).await.unwrap();
        assert_eq!(candidates.len(), 2);
    }

    #[tokio::test]
    async fn fetch_failure_is_an_error() {
        let source = WebsiteSource::new(Arc::new(MockPageFetcher::new()));
        let query = Query::new("Acme Roofing", Some("https://down.example".into()), None).unwrap();
        assert!(source.fetch_candidates(&query, Platform::Facebook).await.is_err());
    }

    #[test]
    fn does_not_apply_without_website() {
        let source = WebsiteSource::new(Arc::new(MockPageFetcher::new()));
        let query = Query::new("Acme Roofing", None, None).unwrap();
        assert!(!source.applies_to(&query));
    }
}
