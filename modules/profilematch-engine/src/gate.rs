//! Decision gate: at most one suggestion per platform, or nothing.

use tracing::info;

use profilematch_common::{Platform, Suggestion};

use crate::grouping::CandidateGroup;
use crate::policy::CONFIDENCE_CAP;

/// Pick the best group at or above `threshold`. Groups need not be pre-sorted.
pub fn decide(platform: Platform, groups: &[CandidateGroup], threshold: f64) -> Option<Suggestion> {
    let winner = groups
        .iter()
        .filter(|g| g.combined_score >= threshold)
        .min_by(|a, b| {
            b.combined_score
                .total_cmp(&a.combined_score)
                .then_with(|| a.identity.key.cmp(&b.identity.key))
        });

    let Some(group) = winner else {
        let best = groups
            .iter()
            .map(|g| g.combined_score)
            .fold(0.0_f64, f64::max);
        info!(
            platform = %platform,
            groups = groups.len(),
            best_score = best,
            threshold,
            "No candidate cleared the threshold"
        );
        return None;
    };

    Some(Suggestion {
        platform,
        identity: group.identity.key.clone(),
        url: group.identity.url.clone(),
        confidence: group.combined_score.clamp(0.0, CONFIDENCE_CAP),
        contributing_sources: group.source_kinds.clone(),
        rationale: rationale(group, threshold),
    })
}

fn rationale(group: &CandidateGroup, threshold: f64) -> String {
    let kinds = group
        .source_kinds
        .iter()
        .map(|k| k.to_string())
        .collect::<Vec<_>>()
        .join(" + ");
    format!(
        "matched '{}' via {} (score {:.2}, boost +{:.2}, threshold {:.2})",
        group.identity.key, kinds, group.combined_score, group.boost, threshold
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grouping::{GroupMember, ScoredCandidate};
    use crate::scoring::SubScores;
    use profilematch_common::{CanonicalIdentity, RawCandidate, SourceKind};
    use std::collections::BTreeSet;

    fn group(key: &str, score: f64, kinds: &[SourceKind], boost: f64) -> CandidateGroup {
        let identity = CanonicalIdentity {
            key: key.to_string(),
            handle: key.to_string(),
            url: format!("https://www.facebook.com/{key}"),
        };
        let member = GroupMember {
            candidate: ScoredCandidate {
                raw: RawCandidate::new(&identity.url, key, kinds[0], 0, 1.0, 1),
                identity: identity.clone(),
                scores: SubScores {
                    text: 1.0,
                    identity: 1.0,
                    rank: 1.0,
                    occurrence: 1.0,
                },
            },
            member_score: score - boost,
        };
        CandidateGroup {
            identity,
            members: vec![member.clone()],
            best: member,
            source_kinds: kinds.iter().copied().collect::<BTreeSet<_>>(),
            boost,
            combined_score: score,
        }
    }

    #[test]
    fn below_threshold_yields_nothing() {
        let groups = vec![group("acme", 0.84, &[SourceKind::SearchResult], 0.0)];
        assert!(decide(Platform::Facebook, &groups, 0.85).is_none());
        assert!(decide(Platform::Facebook, &[], 0.85).is_none());
    }

    #[test]
    fn threshold_is_inclusive() {
        let groups = vec![group("acme", 0.85, &[SourceKind::SearchResult], 0.0)];
        assert!(decide(Platform::Facebook, &groups, 0.85).is_some());
    }

    #[test]
    fn picks_highest_then_key() {
        let groups = vec![
            group("zeta", 0.9, &[SourceKind::SearchResult], 0.0),
            group("acme", 0.9, &[SourceKind::SearchResult], 0.0),
            group("beta", 0.88, &[SourceKind::SearchResult], 0.0),
        ];
        let s = decide(Platform::Facebook, &groups, 0.85).unwrap();
        assert_eq!(s.identity, "acme");
    }

    #[test]
    fn suggestion_carries_sources_and_rationale() {
        let groups = vec![group(
            "acmeroofing",
            0.99,
            &[SourceKind::WebsiteCrawl, SourceKind::SearchResult],
            0.15,
        )];
        let s = decide(Platform::Facebook, &groups, 0.85).unwrap();
        assert_eq!(s.url, "https://www.facebook.com/acmeroofing");
        assert_eq!(s.confidence, 0.99);
        assert_eq!(s.contributing_sources.len(), 2);
        assert_eq!(
            s.rationale,
            "matched 'acmeroofing' via website_crawl + search_result (score 0.99, boost +0.15, threshold 0.85)"
        );
    }
}
