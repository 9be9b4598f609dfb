//! Merge scored candidates by canonical identity and apply the corroboration boost.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use profilematch_common::{CanonicalIdentity, RawCandidate, SourceKind};

use crate::policy::{ScoringPolicy, Weights};
use crate::scoring::{clamp_unit, SubScores};

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCandidate {
    pub raw: RawCandidate,
    pub identity: CanonicalIdentity,
    pub scores: SubScores,
}

impl ScoredCandidate {
    /// Weighted combination of the four sub-scores.
    pub fn member_score(&self, weights: &Weights) -> f64 {
        let s = &self.scores;
        clamp_unit(
            weights.text * s.text
                + weights.identity * s.identity
                + weights.rank * s.rank
                + weights.occurrence * s.occurrence,
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupMember {
    pub candidate: ScoredCandidate,
    pub member_score: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CandidateGroup {
    pub identity: CanonicalIdentity,
    pub members: Vec<GroupMember>,
    pub best: GroupMember,
    pub source_kinds: BTreeSet<SourceKind>,
    pub boost: f64,
    /// Best member score plus boost, capped at the policy's confidence cap.
    pub combined_score: f64,
}

/// Flat boost for agreement across distinct source kinds: none for one, `boost_two` for two,
/// `boost_three` for three.
pub fn corroboration_boost(distinct_kinds: usize, policy: &ScoringPolicy) -> f64 {
    match distinct_kinds {
        0 | 1 => 0.0,
        2 => policy.boost_two,
        _ => policy.boost_three,
    }
}

/// Bucket by identity key, pick each bucket's best member, and boost corroborated buckets.
/// Output is sorted by combined score (desc), then key; input order never matters.
pub fn group(scored: Vec<ScoredCandidate>, policy: &ScoringPolicy) -> Vec<CandidateGroup> {
    let mut buckets: BTreeMap<String, Vec<GroupMember>> = BTreeMap::new();
    for candidate in scored {
        let member_score = candidate.member_score(&policy.weights);
        buckets
            .entry(candidate.identity.key.clone())
            .or_default()
            .push(GroupMember {
                candidate,
                member_score,
            });
    }

    let mut groups: Vec<CandidateGroup> = buckets
        .into_values()
        .filter_map(|mut members| {
            members.sort_by(compare_members);
            let best = members.first()?.clone();

            let source_kinds: BTreeSet<SourceKind> = members
                .iter()
                .map(|m| m.candidate.raw.source_kind)
                .collect();
            let boost = corroboration_boost(source_kinds.len(), policy);
            let combined_score = (best.member_score + boost).clamp(0.0, policy.confidence_cap);

            Some(CandidateGroup {
                identity: best.candidate.identity.clone(),
                members,
                best,
                source_kinds,
                boost,
                combined_score,
            })
        })
        .collect();

    groups.sort_by(|a, b| {
        b.combined_score
            .total_cmp(&a.combined_score)
            .then_with(|| a.identity.key.cmp(&b.identity.key))
    });
    groups
}

/// Best first: higher member score, then lower source rank, then first-party sources,
/// then the lexicographically smallest URL.
fn compare_members(a: &GroupMember, b: &GroupMember) -> Ordering {
    let (ra, rb) = (&a.candidate.raw, &b.candidate.raw);
    b.member_score
        .total_cmp(&a.member_score)
        .then_with(|| ra.source_rank.cmp(&rb.source_rank))
        .then_with(|| rb.source_kind.is_first_party().cmp(&ra.source_kind.is_first_party()))
        .then_with(|| ra.source_kind.cmp(&rb.source_kind))
        .then_with(|| ra.source_url.cmp(&rb.source_url))
        .then_with(|| ra.display_text.cmp(&rb.display_text))
}
