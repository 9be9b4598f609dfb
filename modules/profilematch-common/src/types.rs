use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::ResolveError;

// --- Platform ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Facebook,
    Instagram,
    TikTok,
    LinkedIn,
    YouTube,
    Twitter,
}

impl Platform {
    pub const ALL: [Platform; 6] = [
        Platform::Facebook,
        Platform::Instagram,
        Platform::TikTok,
        Platform::LinkedIn,
        Platform::YouTube,
        Platform::Twitter,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Facebook => "facebook",
            Platform::Instagram => "instagram",
            Platform::TikTok => "tiktok",
            Platform::LinkedIn => "linkedin",
            Platform::YouTube => "youtube",
            Platform::Twitter => "twitter",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Platform {
    type Err = ResolveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "facebook" | "fb" => Ok(Platform::Facebook),
            "instagram" | "ig" => Ok(Platform::Instagram),
            "tiktok" => Ok(Platform::TikTok),
            "linkedin" => Ok(Platform::LinkedIn),
            "youtube" | "yt" => Ok(Platform::YouTube),
            "twitter" | "x" => Ok(Platform::Twitter),
            other => Err(ResolveError::UnknownPlatform(other.to_string())),
        }
    }
}

// --- Source Kind ---

/// Independent channel of evidence a candidate was found through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Link found on the business's own website
    WebsiteCrawl,
    /// Website or social field on the business's map listing
    MapListing,
    /// Hit from a site-restricted web search
    SearchResult,
}

impl SourceKind {
    /// The business itself published the link (as opposed to a third party ranking it).
    pub fn is_first_party(&self) -> bool {
        matches!(self, SourceKind::WebsiteCrawl | SourceKind::MapListing)
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceKind::WebsiteCrawl => write!(f, "website_crawl"),
            SourceKind::MapListing => write!(f, "map_listing"),
            SourceKind::SearchResult => write!(f, "search_result"),
        }
    }
}

// --- Query ---

/// Input to one resolution run. Construct with [`Query::new`]; the business name is validated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Query {
    business_name: String,
    website_url: Option<String>,
    external_listing_id: Option<String>,
}

impl Query {
    pub fn new(
        business_name: impl Into<String>,
        website_url: Option<String>,
        external_listing_id: Option<String>,
    ) -> Result<Self, ResolveError> {
        let business_name = business_name.into().trim().to_string();
        if business_name.is_empty() {
            return Err(ResolveError::InvalidQuery(
                "business name must not be empty".to_string(),
            ));
        }

        Ok(Self {
            business_name,
            website_url: non_blank(website_url),
            external_listing_id: non_blank(external_listing_id),
        })
    }

    pub fn business_name(&self) -> &str {
        &self.business_name
    }

    pub fn website_url(&self) -> Option<&str> {
        self.website_url.as_deref()
    }

    pub fn external_listing_id(&self) -> Option<&str> {
        self.external_listing_id.as_deref()
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// --- Raw Candidate ---

/// A candidate profile URL as produced by a source adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawCandidate {
    pub source_url: String,
    pub display_text: String,
    pub source_kind: SourceKind,
    /// Position in the source's result list; 0 is the best hit.
    pub source_rank: u32,
    /// Intra-source confidence in [0, 1].
    pub source_confidence: f64,
    /// How many times the source mentioned this candidate (≥ 1).
    pub occurrence_within_source: u32,
}

impl RawCandidate {
    pub fn new(
        source_url: impl Into<String>,
        display_text: impl Into<String>,
        source_kind: SourceKind,
        source_rank: u32,
        source_confidence: f64,
        occurrence_within_source: u32,
    ) -> Self {
        let source_confidence = if source_confidence.is_nan() {
            0.0
        } else {
            source_confidence.clamp(0.0, 1.0)
        };

        Self {
            source_url: source_url.into(),
            display_text: display_text.into(),
            source_kind,
            source_rank,
            source_confidence,
            occurrence_within_source: occurrence_within_source.max(1),
        }
    }
}

// --- Canonical Identity ---

/// Platform-specific identity of a profile. Two identities are the same profile iff their keys match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonicalIdentity {
    /// Unique within a platform, e.g. `acmeroofing`, `company/acme`, `channel/UCxyz`.
    pub key: String,
    /// Bare name compared against the business name, e.g. `acme`.
    pub handle: String,
    /// Reconstructed profile URL.
    pub url: String,
}

impl PartialEq for CanonicalIdentity {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for CanonicalIdentity {}

impl std::hash::Hash for CanonicalIdentity {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

// --- Suggestion ---

/// The engine's answer for one platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub platform: Platform,
    pub identity: String,
    pub url: String,
    /// In [0, 0.99]; never asserted as certain.
    pub confidence: f64,
    pub contributing_sources: BTreeSet<SourceKind>,
    pub rationale: String,
}

/// One answer per requested platform; `None` means no candidate cleared the threshold.
pub type Resolution = std::collections::BTreeMap<Platform, Option<Suggestion>>;
