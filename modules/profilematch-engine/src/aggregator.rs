//! Resolver: fans a query out to every applicable source, then canonicalizes, scores,
//! groups, and gates the candidates for each platform.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tracing::{debug, info, warn};

use profilematch_common::{Platform, Query, RawCandidate, Resolution, Suggestion};

use crate::canonical::{canonicalize_with, Canonical};
use crate::gate::decide;
use crate::grouping::{group, CandidateGroup, ScoredCandidate};
use crate::policy::{PlatformPolicy, PolicyTable};
use crate::scoring::score;
use crate::traits::CandidateSource;

pub const DEFAULT_ADAPTER_TIMEOUT: Duration = Duration::from_secs(20);

pub struct Resolver {
    sources: Vec<Arc<dyn CandidateSource>>,
    policies: PolicyTable,
    adapter_timeout: Duration,
}

impl Resolver {
    pub fn new(policies: PolicyTable) -> Self {
        Self {
            sources: Vec::new(),
            policies,
            adapter_timeout: DEFAULT_ADAPTER_TIMEOUT,
        }
    }

    pub fn with_source(mut self, source: Arc<dyn CandidateSource>) -> Self {
        self.sources.push(source);
        self
    }

    pub fn with_sources(mut self, sources: impl IntoIterator<Item = Arc<dyn CandidateSource>>) -> Self {
        self.sources.extend(sources);
        self
    }

    pub fn with_adapter_timeout(mut self, timeout: Duration) -> Self {
        self.adapter_timeout = timeout;
        self
    }

    pub fn policies(&self) -> &PolicyTable {
        &self.policies
    }

    /// Best profile on one platform, or `None` when nothing clears the platform's threshold.
    pub async fn resolve(&self, query: &Query, platform: Platform) -> Option<Suggestion> {
        let policy = self.policies.get(platform);
        let raws = self.gather(query, platform).await;
        let groups = rank_candidates(query, policy, raws);
        decide(platform, &groups, policy.scoring.threshold)
    }

    /// Every supported platform, resolved concurrently.
    pub async fn resolve_all(&self, query: &Query) -> Resolution {
        self.resolve_platforms(query, &Platform::ALL).await
    }

    pub async fn resolve_platforms(&self, query: &Query, platforms: &[Platform]) -> Resolution {
        let results = join_all(platforms.iter().map(|&platform| async move {
            (platform, self.resolve(query, platform).await)
        }))
        .await;

        let resolution: Resolution = results.into_iter().collect();
        info!(
            business = query.business_name(),
            platforms = resolution.len(),
            matched = resolution.values().filter(|s| s.is_some()).count(),
            "Resolution complete"
        );
        resolution
    }

    /// Run every applicable source concurrently. A failing or slow source contributes nothing.
    async fn gather(&self, query: &Query, platform: Platform) -> Vec<RawCandidate> {
        let applicable: Vec<&Arc<dyn CandidateSource>> = self
            .sources
            .iter()
            .filter(|s| s.applies_to(query))
            .collect();

        let fetches = applicable.into_iter().map(|source| async move {
            let kind = source.kind();
            let limit = source.timeout().unwrap_or(self.adapter_timeout);
            match tokio::time::timeout(limit, source.fetch_candidates(query, platform)).await {
                Ok(Ok(candidates)) => {
                    debug!(
                        platform = %platform,
                        source_kind = %kind,
                        count = candidates.len(),
                        "Source returned candidates"
                    );
                    candidates
                }
                Ok(Err(e)) => {
                    warn!(platform = %platform, source_kind = %kind, error = %e, "Source failed");
                    Vec::new()
                }
                Err(_) => {
                    warn!(
                        platform = %platform,
                        source_kind = %kind,
                        timeout_secs = limit.as_secs_f64(),
                        "Source timed out"
                    );
                    Vec::new()
                }
            }
        });

        join_all(fetches).await.into_iter().flatten().collect()
    }
}

/// Canonicalize, score, and group raw candidates. Pure; the same input always yields the same groups.
pub fn rank_candidates(
    query: &Query,
    policy: &PlatformPolicy,
    raws: Vec<RawCandidate>,
) -> Vec<CandidateGroup> {
    let scored: Vec<ScoredCandidate> = raws
        .into_iter()
        .filter_map(|raw| match canonicalize_with(&policy.rules, &raw.source_url) {
            Canonical::Profile(identity) => {
                let scores = score(&raw, &identity, query, policy);
                Some(ScoredCandidate {
                    raw,
                    identity,
                    scores,
                })
            }
            Canonical::Rejected(reason) => {
                debug!(
                    platform = %policy.platform,
                    source_kind = %raw.source_kind,
                    url = raw.source_url.as_str(),
                    reason = %reason,
                    "Candidate rejected"
                );
                None
            }
        })
        .collect();

    group(scored, &policy.scoring)
}

#[cfg(test)]
mod tests {
    use super::*;
    use profilematch_common::SourceKind;

    fn query() -> Query {
        Query::new("Acme Roofing", Some("https://acmeroofing.com".into()), None).unwrap()
    }

    #[test]
    fn malformed_candidates_are_dropped() {
        let policy = PlatformPolicy::builtin(Platform::Facebook);
        let groups = rank_candidates(
            &query(),
            &policy,
            vec![
                RawCandidate::new("not a url at all", "Acme", SourceKind::SearchResult, 0, 1.0, 1),
                RawCandidate::new(
                    "https://facebook.com/acmeroofing/posts/123",
                    "Acme Roofing",
                    SourceKind::SearchResult,
                    1,
                    1.0,
                    1,
                ),
                RawCandidate::new(
                    "https://www.instagram.com/acmeroofing",
                    "Acme Roofing",
                    SourceKind::SearchResult,
                    2,
                    1.0,
                    1,
                ),
            ],
        );
        assert!(groups.is_empty());
    }

    #[test]
    fn url_variants_merge_into_one_group() {
        let policy = PlatformPolicy::builtin(Platform::Facebook);
        let groups = rank_candidates(
            &query(),
            &policy,
            vec![
                RawCandidate::new(
                    "https://m.facebook.com/AcmeRoofing/?ref=page",
                    "Acme Roofing | Facebook",
                    SourceKind::SearchResult,
                    0,
                    1.0,
                    1,
                ),
                RawCandidate::new(
                    "http://facebook.com/acmeroofing/about",
                    "Facebook",
                    SourceKind::WebsiteCrawl,
                    3,
                    1.0,
                    2,
                ),
            ],
        );
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].identity.key, "acmeroofing");
        assert_eq!(groups[0].source_kinds.len(), 2);
    }

    #[test]
    fn ranking_is_idempotent() {
        let policy = PlatformPolicy::builtin(Platform::Instagram);
        let raws = vec![
            RawCandidate::new(
                "https://www.instagram.com/acmeroofing/",
                "Acme Roofing (@acmeroofing) • Instagram photos and videos",
                SourceKind::SearchResult,
                0,
                1.0,
                1,
            ),
            RawCandidate::new(
                "https://www.instagram.com/acme.roofing.co/",
                "Acme Roofing Co",
                SourceKind::SearchResult,
                1,
                1.0,
                1,
            ),
        ];
        let first = rank_candidates(&query(), &policy, raws.clone());
        let second = rank_candidates(&query(), &policy, raws);
        assert_eq!(first, second);
    }
}
