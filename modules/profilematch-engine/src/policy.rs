//! Per-platform policy tables: URL grammar for the canonicalizer and scoring weights,
//! saturation, threshold, and boosts for the scorer, grouper, and gate.
//!
//! The scoring numbers are empirically tuned, not derived. Every one of them can be
//! overridden from a policy file (see `file_config`) without touching code.

use std::sync::LazyLock;

use regex::Regex;

use profilematch_common::{ConfigError, Platform};

// =============================================================================
// Path Rules
// =============================================================================

/// How the identity segment is located in a profile path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grammar {
    /// `/<handle>` (optionally behind an alias prefix such as Facebook's `/pg/`)
    Vanity,
    /// `/@<handle>`; the `@` is mandatory
    AtHandle,
    /// `/company/<slug>`, `/school/<slug>`, `/showcase/<slug>`, `/in/<id>`
    LinkedIn,
    /// `/@<handle>`, `/channel/<id>`, `/c/<name>`, `/user/<name>`, bare `/<name>`
    YouTube,
}

#[derive(Debug, Clone)]
pub struct PathRules {
    pub domains: &'static [&'static str],
    pub short_links: &'static [&'static str],
    /// Leading path segments that are never profiles.
    pub denylist: &'static [&'static str],
    /// Leading segments skipped before the handle, e.g. Facebook `/pg/<vanity>`.
    pub alias_prefixes: &'static [&'static str],
    /// Trailing segments that still denote the profile itself.
    pub profile_tabs: &'static [&'static str],
    pub grammar: Grammar,
    pub handle_pattern: &'static LazyLock<Regex>,
    pub canonical_base: &'static str,
}

impl PathRules {
    /// Domain used for site-restricted search queries.
    pub fn primary_domain(&self) -> &'static str {
        self.domains[0]
    }
}

static RE_FACEBOOK_HANDLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9.\-_]{2,80}$").expect("valid regex"));
static RE_INSTAGRAM_HANDLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9._]{1,30}$").expect("valid regex"));
static RE_TIKTOK_HANDLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9._]{2,24}$").expect("valid regex"));
static RE_LINKEDIN_SLUG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9\-_%.]{1,100}$").expect("valid regex"));
static RE_YOUTUBE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9._\-]{1,100}$").expect("valid regex"));
static RE_TWITTER_HANDLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9_]{1,15}$").expect("valid regex"));

/// YouTube channel ids are case-sensitive and checked before lowercasing.
pub static RE_YOUTUBE_CHANNEL_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_\-]{10,40}$").expect("valid regex"));

const FACEBOOK_DENY: &[&str] = &[
    "posts", "photo", "photo.php", "photos", "sharer", "sharer.php", "share", "events", "groups",
    "watch", "marketplace", "login", "login.php", "dialog", "plugins", "help", "reel", "reels",
    "videos", "story.php", "permalink.php", "hashtag", "search", "gaming", "profile.php", "people",
    "business", "policies", "privacy", "ads", "l.php", "tr", "home.php", "pages", "media", "notes",
    "live", "stories", "legal", "settings", "messages", "friends", "bookmarks",
];
const INSTAGRAM_DENY: &[&str] = &[
    "p", "reel", "reels", "stories", "explore", "accounts", "tv", "s", "share", "direct", "about",
    "legal", "developer", "web", "challenge", "emails", "session", "oauth", "ar",
];
const TIKTOK_DENY: &[&str] = &[
    "discover", "tag", "music", "sound", "video", "embed", "search", "foryou", "explore", "live",
    "t", "login", "legal", "about", "business", "channel", "following", "friends", "upload",
    "messages", "coin",
];
const LINKEDIN_DENY: &[&str] = &[
    "feed", "jobs", "login", "posts", "pulse", "groups", "search", "events", "help", "learning",
    "signup", "authwall", "checkpoint", "legal", "mynetwork", "messaging", "notifications",
];
const YOUTUBE_DENY: &[&str] = &[
    "watch", "playlist", "results", "feed", "shorts", "embed", "live", "hashtag", "gaming",
    "premium", "account", "signin", "t", "redirect", "about", "kids", "music", "post", "source",
    "attribution_link", "logout", "channels", "howyoutubeworks", "creators", "ads", "trending",
];
const TWITTER_DENY: &[&str] = &[
    "intent", "share", "hashtag", "search", "i", "home", "explore", "notifications", "messages",
    "settings", "login", "signup", "tos", "privacy", "compose", "about", "download", "jobs",
    "account", "logout", "welcome", "status", "lists",
];

// =============================================================================
// Scoring Policy
// =============================================================================

/// Weight vector over the four sub-scores. Must sum to 1.0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Weights {
    pub text: f64,
    pub identity: f64,
    pub rank: f64,
    pub occurrence: f64,
}

impl Weights {
    pub const fn new(text: f64, identity: f64, rank: f64, occurrence: f64) -> Self {
        Self {
            text,
            identity,
            rank,
            occurrence,
        }
    }

    pub fn sum(&self) -> f64 {
        self.text + self.identity + self.rank + self.occurrence
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoringPolicy {
    pub weights: Weights,
    /// Mentions within one source at which the occurrence score saturates.
    pub saturation: u32,
    pub threshold: f64,
    /// Added to the best member when two distinct source kinds agree.
    pub boost_two: f64,
    /// Added to the best member when all three source kinds agree.
    pub boost_three: f64,
    pub confidence_cap: f64,
}

pub const DEFAULT_BOOST_TWO: f64 = 0.15;
pub const DEFAULT_BOOST_THREE: f64 = 0.20;
pub const CONFIDENCE_CAP: f64 = 0.99;

impl ScoringPolicy {
    const fn new(weights: Weights, saturation: u32, threshold: f64) -> Self {
        Self {
            weights,
            saturation,
            threshold,
            boost_two: DEFAULT_BOOST_TWO,
            boost_three: DEFAULT_BOOST_THREE,
            confidence_cap: CONFIDENCE_CAP,
        }
    }

    pub fn validate(&self, platform: Platform) -> Result<(), ConfigError> {
        let name = platform.to_string();
        let w = self.weights;
        for (field, value) in [
            ("weights.text", w.text),
            ("weights.identity", w.identity),
            ("weights.rank", w.rank),
            ("weights.occurrence", w.occurrence),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::OutOfRange {
                    platform: name,
                    field,
                    value,
                });
            }
        }
        if (w.sum() - 1.0).abs() > 1e-6 {
            return Err(ConfigError::WeightSum {
                platform: name,
                sum: w.sum(),
            });
        }
        for (field, value) in [
            ("threshold", self.threshold),
            ("boost_two", self.boost_two),
            ("boost_three", self.boost_three),
        ] {
            if !(0.0..=self.confidence_cap).contains(&value) {
                return Err(ConfigError::OutOfRange {
                    platform: name,
                    field,
                    value,
                });
            }
        }
        if self.boost_three < self.boost_two {
            return Err(ConfigError::OutOfRange {
                platform: name,
                field: "boost_three",
                value: self.boost_three,
            });
        }
        if self.saturation == 0 {
            return Err(ConfigError::OutOfRange {
                platform: name,
                field: "saturation",
                value: 0.0,
            });
        }
        Ok(())
    }
}

// =============================================================================
// Platform Policy
// =============================================================================

#[derive(Debug, Clone)]
pub struct PlatformPolicy {
    pub platform: Platform,
    pub rules: PathRules,
    /// Title suffixes the platform appends to page titles, lowercased.
    pub boilerplate: &'static [&'static str],
    pub scoring: ScoringPolicy,
}

impl PlatformPolicy {
    pub fn builtin(platform: Platform) -> Self {
        match platform {
            Platform::Facebook => Self {
                platform,
                rules: PathRules {
                    domains: &["facebook.com", "fb.com"],
                    short_links: &["fb.me", "fb.watch"],
                    denylist: FACEBOOK_DENY,
                    alias_prefixes: &["pg"],
                    profile_tabs: &["about", "reviews", "community", "followers", "services", "menu"],
                    grammar: Grammar::Vanity,
                    handle_pattern: &RE_FACEBOOK_HANDLE,
                    canonical_base: "https://www.facebook.com",
                },
                boilerplate: &["| facebook", "- facebook", "on facebook", "facebook"],
                scoring: ScoringPolicy::new(Weights::new(0.40, 0.30, 0.20, 0.10), 3, 0.85),
            },
            Platform::Instagram => Self {
                platform,
                rules: PathRules {
                    domains: &["instagram.com"],
                    short_links: &["instagr.am"],
                    denylist: INSTAGRAM_DENY,
                    alias_prefixes: &[],
                    profile_tabs: &["reels", "tagged", "guides"],
                    grammar: Grammar::Vanity,
                    handle_pattern: &RE_INSTAGRAM_HANDLE,
                    canonical_base: "https://www.instagram.com",
                },
                boilerplate: &[
                    "• instagram photos and videos",
                    "instagram photos and videos",
                    "| instagram",
                    "on instagram",
                ],
                scoring: ScoringPolicy::new(Weights::new(0.25, 0.45, 0.20, 0.10), 4, 0.70),
            },
            Platform::TikTok => Self {
                platform,
                rules: PathRules {
                    domains: &["tiktok.com"],
                    short_links: &["vm.tiktok.com", "vt.tiktok.com"],
                    denylist: TIKTOK_DENY,
                    alias_prefixes: &[],
                    profile_tabs: &[],
                    grammar: Grammar::AtHandle,
                    handle_pattern: &RE_TIKTOK_HANDLE,
                    canonical_base: "https://www.tiktok.com",
                },
                boilerplate: &["| tiktok", "official tiktok", "on tiktok", "tiktok"],
                scoring: ScoringPolicy::new(Weights::new(0.25, 0.45, 0.20, 0.10), 5, 0.70),
            },
            Platform::LinkedIn => Self {
                platform,
                rules: PathRules {
                    domains: &["linkedin.com"],
                    short_links: &["lnkd.in"],
                    denylist: LINKEDIN_DENY,
                    alias_prefixes: &[],
                    profile_tabs: &["about", "people", "jobs", "life", "posts", "videos"],
                    grammar: Grammar::LinkedIn,
                    handle_pattern: &RE_LINKEDIN_SLUG,
                    canonical_base: "https://www.linkedin.com",
                },
                boilerplate: &["| linkedin", "- linkedin", "on linkedin"],
                scoring: ScoringPolicy::new(Weights::new(0.40, 0.30, 0.20, 0.10), 3, 0.85),
            },
            Platform::YouTube => Self {
                platform,
                rules: PathRules {
                    domains: &["youtube.com"],
                    short_links: &["youtu.be"],
                    denylist: YOUTUBE_DENY,
                    alias_prefixes: &[],
                    profile_tabs: &[
                        "videos", "about", "featured", "shorts", "streams", "playlists", "community",
                    ],
                    grammar: Grammar::YouTube,
                    handle_pattern: &RE_YOUTUBE_NAME,
                    canonical_base: "https://www.youtube.com",
                },
                boilerplate: &["- youtube", "| youtube"],
                scoring: ScoringPolicy::new(Weights::new(0.35, 0.35, 0.20, 0.10), 3, 0.80),
            },
            Platform::Twitter => Self {
                platform,
                rules: PathRules {
                    domains: &["x.com", "twitter.com"],
                    short_links: &["t.co"],
                    denylist: TWITTER_DENY,
                    alias_prefixes: &[],
                    profile_tabs: &["with_replies", "media", "likes", "highlights"],
                    grammar: Grammar::Vanity,
                    handle_pattern: &RE_TWITTER_HANDLE,
                    canonical_base: "https://x.com",
                },
                boilerplate: &["/ x", "on x", "| twitter", "on twitter", "/ twitter"],
                scoring: ScoringPolicy::new(Weights::new(0.30, 0.40, 0.20, 0.10), 4, 0.80),
            },
        }
    }
}

// =============================================================================
// Policy Table
// =============================================================================

/// One policy per platform. `Default` is the built-in table.
#[derive(Debug, Clone)]
pub struct PolicyTable {
    policies: Vec<PlatformPolicy>,
}

impl Default for PolicyTable {
    fn default() -> Self {
        Self {
            policies: Platform::ALL
                .iter()
                .map(|p| PlatformPolicy::builtin(*p))
                .collect(),
        }
    }
}

impl PolicyTable {
    pub fn get(&self, platform: Platform) -> &PlatformPolicy {
        &self.policies[slot(platform)]
    }

    pub fn scoring_mut(&mut self, platform: Platform) -> &mut ScoringPolicy {
        &mut self.policies[slot(platform)].scoring
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for policy in &self.policies {
            policy.scoring.validate(policy.platform)?;
        }
        Ok(())
    }
}

fn slot(platform: Platform) -> usize {
    match platform {
        Platform::Facebook => 0,
        Platform::Instagram => 1,
        Platform::TikTok => 2,
        Platform::LinkedIn => 3,
        Platform::YouTube => 4,
        Platform::Twitter => 5,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_table_is_valid() {
        PolicyTable::default().validate().unwrap();
    }

    #[test]
    fn table_slots_match_platforms() {
        let table = PolicyTable::default();
        for platform in Platform::ALL {
            assert_eq!(table.get(platform).platform, platform);
        }
    }

    #[test]
    fn false_positive_prone_platforms_have_higher_thresholds() {
        let table = PolicyTable::default();
        let fb = table.get(Platform::Facebook).scoring.threshold;
        let li = table.get(Platform::LinkedIn).scoring.threshold;
        let ig = table.get(Platform::Instagram).scoring.threshold;
        let tt = table.get(Platform::TikTok).scoring.threshold;
        assert_eq!(fb, 0.85);
        assert_eq!(li, 0.85);
        assert!(ig < fb && tt < li);
    }

    #[test]
    fn username_platforms_weight_identity_highest() {
        let table = PolicyTable::default();
        for platform in [Platform::Instagram, Platform::TikTok, Platform::Twitter] {
            let w = table.get(platform).scoring.weights;
            assert!(w.identity > w.text, "{platform}");
        }
        let fb = table.get(Platform::Facebook).scoring.weights;
        assert!(fb.text > fb.identity);
    }

    #[test]
    fn weights_not_summing_to_one_are_rejected() {
        let mut table = PolicyTable::default();
        table.scoring_mut(Platform::Twitter).weights.text = 0.9;
        assert!(matches!(
            table.validate(),
            Err(ConfigError::WeightSum { .. })
        ));
    }

    #[test]
    fn threshold_above_cap_is_rejected() {
        let mut table = PolicyTable::default();
        table.scoring_mut(Platform::YouTube).threshold = 1.0;
        assert!(matches!(
            table.validate(),
            Err(ConfigError::OutOfRange { field: "threshold", .. })
        ));
    }
}
