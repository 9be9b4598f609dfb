//! Sub-scores for a single candidate against the query.

use std::sync::LazyLock;

use regex::Regex;

use profilematch_common::{CanonicalIdentity, Query, RawCandidate};

use crate::policy::PlatformPolicy;

/// Four independent signals, each in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SubScores {
    pub text: f64,
    pub identity: f64,
    pub rank: f64,
    pub occurrence: f64,
}

/// Matches `(@handle)` groups that platforms embed in page titles.
static AT_HANDLE_GROUP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(\s*@[^)]*\)").expect("valid regex"));

const MIN_WORD_LEN: usize = 3;

pub fn score(
    raw: &RawCandidate,
    identity: &CanonicalIdentity,
    query: &Query,
    policy: &PlatformPolicy,
) -> SubScores {
    let mut text = text_score(&raw.display_text, query.business_name(), policy.boilerplate);
    if raw.source_kind.is_first_party() {
        text = text.max(raw.source_confidence);
    }

    SubScores {
        text: clamp_unit(text),
        identity: clamp_unit(identity_score(&identity.handle, query.business_name())),
        rank: rank_score(raw.source_rank),
        occurrence: occurrence_score(raw.occurrence_within_source, policy.scoring.saturation),
    }
}

/// Display text vs business name, after stripping platform boilerplate.
pub fn text_score(display_text: &str, business_name: &str, boilerplate: &[&str]) -> f64 {
    let title = normalize_text(&strip_boilerplate(display_text, boilerplate));
    let name = normalize_text(business_name);
    if title.is_empty() || name.is_empty() {
        return 0.0;
    }

    if title == name {
        return 1.0;
    }
    if title.starts_with(&name) || title.ends_with(&name) {
        return 0.9;
    }
    if title.contains(&name) {
        return 0.8;
    }

    let tokens: Vec<&str> = title.split(' ').collect();
    word_blend(&name, |word| tokens.contains(&word), |word| title.contains(word))
}

/// Handle vs business name with whitespace removed.
pub fn identity_score(handle: &str, business_name: &str) -> f64 {
    let handle = handle.trim().trim_start_matches('@').to_lowercase();
    let name = normalize_text(business_name);
    let compact: String = name.chars().filter(|c| !c.is_whitespace()).collect();
    if handle.is_empty() || compact.is_empty() {
        return 0.0;
    }

    let tokens: Vec<&str> = handle
        .split(['.', '_', '-'])
        .filter(|t| !t.is_empty())
        .collect();

    if handle == compact {
        return 1.0;
    }
    if handle.starts_with(&compact) || handle.ends_with(&compact) {
        return if tokens.len() <= 1 { 0.95 } else { 0.9 };
    }
    if handle.contains(&compact) {
        return 0.8;
    }

    word_blend(&name, |word| tokens.contains(&word), |word| handle.contains(word))
}

/// `max(0, 1 - rank * 0.1)`: the first hit scores 1.0, the eleventh and later score 0.
pub fn rank_score(rank: u32) -> f64 {
    if rank >= 10 {
        return 0.0;
    }
    clamp_unit(1.0 - f64::from(rank) * 0.1)
}

/// Repeated mentions within one source, saturating at `saturation`.
pub fn occurrence_score(occurrences: u32, saturation: u32) -> f64 {
    let saturation = saturation.max(1);
    clamp_unit(f64::from(occurrences) / f64::from(saturation))
}

/// Lowercase, drop apostrophes, turn every other non-alphanumeric into a space, collapse whitespace.
pub fn normalize_text(s: &str) -> String {
    let mapped: String = s
        .to_lowercase()
        .chars()
        .filter(|c| !matches!(c, '\'' | '\u{2019}'))
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    mapped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Remove `(@handle)` groups and trailing platform suffixes. Returns lowercased text.
pub fn strip_boilerplate(display_text: &str, suffixes: &[&str]) -> String {
    let mut text = AT_HANDLE_GROUP
        .replace_all(&display_text.to_lowercase(), " ")
        .trim()
        .to_string();

    loop {
        let before = text.len();
        for suffix in suffixes {
            if let Some(head) = text.strip_suffix(suffix) {
                let at_boundary = !suffix.starts_with(|c: char| c.is_alphanumeric())
                    || head.is_empty()
                    || head.ends_with(|c: char| !c.is_alphanumeric());
                if at_boundary {
                    text = head
                        .trim_end_matches(|c: char| c.is_whitespace() || matches!(c, '|' | '-' | '•' | '/' | '·'))
                        .to_string();
                }
            }
        }
        if text.len() == before {
            break;
        }
    }

    text
}

/// `0.7 × exact_fraction + 0.3 × substring_fraction` over the name's words longer than two chars.
fn word_blend(
    normalized_name: &str,
    exact: impl Fn(&str) -> bool,
    substring: impl Fn(&str) -> bool,
) -> f64 {
    let words: Vec<&str> = normalized_name
        .split(' ')
        .filter(|w| w.chars().count() >= MIN_WORD_LEN)
        .collect();
    if words.is_empty() {
        return 0.0;
    }

    let n = words.len() as f64;
    let exact_hits = words.iter().filter(|w| exact(w)).count() as f64;
    let substring_hits = words.iter().filter(|w| substring(w)).count() as f64;
    clamp_unit(0.7 * exact_hits / n + 0.3 * substring_hits / n)
}

pub(crate) fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use profilematch_common::{Platform, SourceKind};

    const FB_SUFFIXES: &[&str] = &["| facebook", "- facebook", "on facebook", "facebook"];

    #[test]
    fn joes_pizza_exact_match() {
        assert_eq!(text_score("Joe's Pizza", "Joe's Pizza", &[]), 1.0);
        assert!(identity_score("joespizza", "Joe's Pizza") >= 0.95);
    }

    #[test]
    fn text_ladder() {
        assert_eq!(text_score("Acme Roofing | Facebook", "Acme Roofing", FB_SUFFIXES), 1.0);
        assert_eq!(text_score("Acme Roofing Co - Home", "Acme Roofing", FB_SUFFIXES), 0.9);
        assert_eq!(text_score("Best of Acme Roofing", "Acme Roofing", FB_SUFFIXES), 0.9);
        assert_eq!(text_score("The Acme Roofing Company", "Acme Roofing", FB_SUFFIXES), 0.8);
    }

    #[test]
    fn text_word_blend() {
        // "acme" is an exact token, "roofing" only a substring of "roofingpros".
        let score = text_score("roofingpros by acme", "Acme Roofing", &[]);
        assert!((score - (0.7 * 0.5 + 0.3 * 1.0)).abs() < 1e-9);

        assert_eq!(text_score("Best roofers in Ohio", "Acme Roofing", &[]), 0.0);
    }

    #[test]
    fn short_words_are_ignored_in_blend() {
        assert_eq!(text_score("the co op", "A B Co", &[]), 0.0);
    }

    #[test]
    fn boilerplate_is_stripped() {
        assert_eq!(
            strip_boilerplate("Acme Roofing (@acmeroofing) • Instagram photos and videos", &[
                "• instagram photos and videos"
            ]),
            "acme roofing"
        );
        assert_eq!(
            strip_boilerplate("Acme Roofing (@acme) / X", &["/ x", "on x"]),
            "acme roofing"
        );
        assert_eq!(
            strip_boilerplate("Acme Roofing - YouTube", &["- youtube"]),
            "acme roofing"
        );
        // suffix must sit on a word boundary
        assert_eq!(strip_boilerplate("Fedex", &["on x", "x"]), "fedex");
    }

    #[test]
    fn identity_ladder() {
        assert_eq!(identity_score("acmeroofing", "Acme Roofing"), 1.0);
        assert_eq!(identity_score("acmeroofingnyc", "Acme Roofing"), 0.95);
        assert_eq!(identity_score("acmeroofing.nyc", "Acme Roofing"), 0.9);
        assert_eq!(identity_score("theacmeroofingco", "Acme Roofing"), 0.8);

        let blended = identity_score("acme.roofers", "Acme Roofing");
        assert!((blended - (0.7 * 0.5 + 0.3 * 0.5)).abs() < 1e-9);
        assert_eq!(identity_score("ohioroofers", "Acme Roofing"), 0.0);
    }

    #[test]
    fn rank_score_bounds_and_monotonicity() {
        assert_eq!(rank_score(0), 1.0);
        assert_eq!(rank_score(10), 0.0);
        assert_eq!(rank_score(25), 0.0);
        for rank in 0..10 {
            assert!(rank_score(rank) > rank_score(rank + 1), "rank {rank}");
        }
    }

    #[test]
    fn occurrence_saturates() {
        assert!((occurrence_score(1, 3) - 1.0 / 3.0).abs() < 1e-9);
        assert_eq!(occurrence_score(3, 3), 1.0);
        assert_eq!(occurrence_score(9, 3), 1.0);
        assert_eq!(occurrence_score(2, 0), 1.0);
    }

    #[test]
    fn first_party_text_uses_source_confidence() {
        let policy = PlatformPolicy::builtin(Platform::Facebook);
        let query = Query::new("Acme Roofing", None, None).unwrap();
        let identity = CanonicalIdentity {
            key: "acmeroofing".into(),
            handle: "acmeroofing".into(),
            url: "https://www.facebook.com/acmeroofing".into(),
        };

        let footer = RawCandidate::new(
            "https://facebook.com/acmeroofing",
            "Facebook",
            SourceKind::WebsiteCrawl,
            0,
            1.0,
            1,
        );
        assert_eq!(score(&footer, &identity, &query, &policy).text, 1.0);

        let hit = RawCandidate {
            source_kind: SourceKind::SearchResult,
            ..footer
        };
        assert_eq!(score(&hit, &identity, &query, &policy).text, 0.0);
    }

    #[test]
    fn scores_stay_in_unit_range() {
        let policy = PlatformPolicy::builtin(Platform::Twitter);
        let query = Query::new("???", None, None).unwrap();
        let identity = CanonicalIdentity {
            key: "x".into(),
            handle: "x".into(),
            url: "https://x.com/x".into(),
        };
        let raw = RawCandidate::new("https://x.com/x", "", SourceKind::SearchResult, 40, 0.5, 99);
        let s = score(&raw, &identity, &query, &policy);
        for v in [s.text, s.identity, s.rank, s.occurrence] {
            assert!((0.0..=1.0).contains(&v));
        }
    }
}
