//! URL → canonical profile identity.
//!
//! Total by construction: every input, however malformed, yields either a
//! [`Canonical::Profile`] or an explicit [`Canonical::Rejected`] with the reason.

use url::Url;

use profilematch_common::{CanonicalIdentity, Platform};

use crate::policy::{Grammar, PathRules, PlatformPolicy, RE_YOUTUBE_CHANNEL_ID};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    Unparsable,
    ForeignHost(String),
    ShortLink(String),
    DeniedSection(String),
    MissingIdentity,
    InvalidIdentity(String),
    ContentPath(String),
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectReason::Unparsable => write!(f, "unparsable"),
            RejectReason::ForeignHost(host) => write!(f, "foreign host {host}"),
            RejectReason::ShortLink(host) => write!(f, "short link {host}"),
            RejectReason::DeniedSection(seg) => write!(f, "non-profile section /{seg}"),
            RejectReason::MissingIdentity => write!(f, "no identity segment"),
            RejectReason::InvalidIdentity(seg) => write!(f, "invalid identity {seg:?}"),
            RejectReason::ContentPath(rest) => write!(f, "content path /{rest}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Canonical {
    Profile(CanonicalIdentity),
    Rejected(RejectReason),
}

impl Canonical {
    pub fn profile(self) -> Option<CanonicalIdentity> {
        match self {
            Canonical::Profile(identity) => Some(identity),
            Canonical::Rejected(_) => None,
        }
    }
}

/// Canonicalize against the built-in rules for `platform`.
pub fn canonicalize(platform: Platform, raw_url: &str) -> Canonical {
    canonicalize_with(&PlatformPolicy::builtin(platform).rules, raw_url)
}

pub fn canonicalize_with(rules: &PathRules, raw_url: &str) -> Canonical {
    match extract(rules, raw_url) {
        Ok(identity) => Canonical::Profile(identity),
        Err(reason) => Canonical::Rejected(reason),
    }
}

/// Whether `raw_url` points at one of the platform's own hosts (short links excluded).
/// Cheap pre-filter for adapters that see arbitrary links.
pub fn is_platform_url(platform: Platform, raw_url: &str) -> bool {
    let rules = PlatformPolicy::builtin(platform).rules;
    parse_url(raw_url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.trim_end_matches('.').to_lowercase()))
        .is_some_and(|host| matches_domain(&host, rules.domains))
}

fn extract(rules: &PathRules, raw_url: &str) -> Result<CanonicalIdentity, RejectReason> {
    let parsed = parse_url(raw_url)?;

    let host = parsed
        .host_str()
        .ok_or(RejectReason::Unparsable)?
        .trim_end_matches('.')
        .to_lowercase();
    if matches_domain(&host, rules.short_links) {
        return Err(RejectReason::ShortLink(host));
    }
    if !matches_domain(&host, rules.domains) {
        return Err(RejectReason::ForeignHost(host));
    }

    let segments: Vec<&str> = parsed
        .path_segments()
        .map(|s| s.filter(|seg| !seg.is_empty()).collect())
        .unwrap_or_default();

    let Some(first) = segments.first() else {
        return Err(RejectReason::MissingIdentity);
    };
    let first_lower = first.to_lowercase();
    if rules.denylist.contains(&first_lower.as_str())
        || first_lower.chars().all(|c| c.is_ascii_digit())
    {
        return Err(RejectReason::DeniedSection(first_lower));
    }

    let located = locate(rules, &segments)?;

    let rest = &segments[located.consumed..];
    match rest {
        [] => {}
        [tab] if rules.profile_tabs.contains(&tab.to_lowercase().as_str()) => {}
        _ => return Err(RejectReason::ContentPath(rest.join("/"))),
    }

    Ok(located.identity)
}

fn parse_url(raw_url: &str) -> Result<Url, RejectReason> {
    let trimmed = raw_url.trim();
    if trimmed.is_empty() {
        return Err(RejectReason::Unparsable);
    }

    let with_scheme = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed.trim_start_matches('/'))
    };

    let parsed = Url::parse(&with_scheme).map_err(|_| RejectReason::Unparsable)?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(RejectReason::Unparsable);
    }
    Ok(parsed)
}

fn matches_domain(host: &str, domains: &[&str]) -> bool {
    domains.iter().any(|domain| {
        host == *domain
            || host
                .strip_suffix(domain)
                .is_some_and(|prefix| prefix.ends_with('.'))
    })
}

struct Located {
    identity: CanonicalIdentity,
    consumed: usize,
}

fn locate(rules: &PathRules, segments: &[&str]) -> Result<Located, RejectReason> {
    let lower = |i: usize| segments.get(i).map(|s| s.to_lowercase());

    match rules.grammar {
        Grammar::Vanity => {
            let start = match lower(0) {
                Some(seg) if rules.alias_prefixes.contains(&seg.as_str()) => 1,
                _ => 0,
            };
            let handle = normalize_handle(rules, segments.get(start).copied())?;
            Ok(Located {
                identity: identity(rules, handle.clone(), handle.clone(), format!("/{handle}")),
                consumed: start + 1,
            })
        }
        Grammar::AtHandle => {
            let first = segments[0];
            if !first.starts_with('@') {
                return Err(RejectReason::MissingIdentity);
            }
            let handle = normalize_handle(rules, Some(first))?;
            Ok(Located {
                identity: identity(rules, handle.clone(), handle.clone(), format!("/@{handle}")),
                consumed: 1,
            })
        }
        Grammar::LinkedIn => {
            let kind = lower(0).unwrap_or_default();
            if !matches!(kind.as_str(), "company" | "school" | "showcase" | "in") {
                return Err(RejectReason::DeniedSection(kind));
            }
            let slug = normalize_handle(rules, segments.get(1).copied())?;
            Ok(Located {
                identity: identity(
                    rules,
                    format!("{kind}/{slug}"),
                    slug.clone(),
                    format!("/{kind}/{slug}"),
                ),
                consumed: 2,
            })
        }
        Grammar::YouTube => {
            let first = segments[0];
            if first.starts_with('@') {
                let handle = normalize_handle(rules, Some(first))?;
                return Ok(Located {
                    identity: identity(
                        rules,
                        format!("@{handle}"),
                        handle.clone(),
                        format!("/@{handle}"),
                    ),
                    consumed: 1,
                });
            }

            match lower(0).as_deref() {
                Some("channel") => {
                    let id = segments
                        .get(1)
                        .map(|s| s.trim())
                        .filter(|s| !s.is_empty())
                        .ok_or(RejectReason::MissingIdentity)?;
                    if !RE_YOUTUBE_CHANNEL_ID.is_match(id) {
                        return Err(RejectReason::InvalidIdentity(id.to_string()));
                    }
                    Ok(Located {
                        identity: identity(
                            rules,
                            format!("channel/{id}"),
                            id.to_lowercase(),
                            format!("/channel/{id}"),
                        ),
                        consumed: 2,
                    })
                }
                Some(kind @ ("c" | "user")) => {
                    let name = normalize_handle(rules, segments.get(1).copied())?;
                    Ok(Located {
                        identity: identity(
                            rules,
                            format!("{kind}/{name}"),
                            name.clone(),
                            format!("/{kind}/{name}"),
                        ),
                        consumed: 2,
                    })
                }
                _ => {
                    // Legacy custom URL: youtube.com/<name> serves the same channel as /c/<name>.
                    let name = normalize_handle(rules, Some(first))?;
                    Ok(Located {
                        identity: identity(
                            rules,
                            format!("c/{name}"),
                            name.clone(),
                            format!("/c/{name}"),
                        ),
                        consumed: 1,
                    })
                }
            }
        }
    }
}

/// Trim, strip a leading `@`, lowercase, and validate against the platform's handle pattern.
fn normalize_handle(rules: &PathRules, raw: Option<&str>) -> Result<String, RejectReason> {
    let raw = raw.ok_or(RejectReason::MissingIdentity)?;
    let handle = raw.trim().trim_start_matches('@').trim().to_lowercase();
    if handle.is_empty() {
        return Err(RejectReason::MissingIdentity);
    }
    if !rules.handle_pattern.is_match(&handle) || !handle.chars().any(|c| c.is_ascii_alphabetic())
    {
        return Err(RejectReason::InvalidIdentity(handle));
    }
    Ok(handle)
}

fn identity(rules: &PathRules, key: String, handle: String, path: String) -> CanonicalIdentity {
    CanonicalIdentity {
        key,
        handle,
        url: format!("{}{}", rules.canonical_base, path),
    }
}
