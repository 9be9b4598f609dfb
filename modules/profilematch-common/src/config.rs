use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;

/// Runtime configuration loaded from environment variables.
/// Contains only secrets and I/O knobs; scoring policy overrides live in the TOML policy file.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    // Search (Serper)
    pub serper_api_key: Option<String>,
    pub search_max_results: usize,

    // Map listings (Google Places)
    pub places_api_key: Option<String>,

    // Adapters
    pub adapter_timeout: Duration,
    pub page_cache_ttl: Duration,

    // Policy overrides
    pub policy_path: Option<PathBuf>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            serper_api_key: None,
            search_max_results: 10,
            places_api_key: None,
            adapter_timeout: Duration::from_secs(20),
            page_cache_ttl: Duration::from_secs(3600),
            policy_path: None,
        }
    }
}

impl ResolverConfig {
    /// Load configuration from the process environment (after reading `.env`, if present).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let config = Self::from_lookup(|key| std::env::var(key).ok())?;
        config.log_redacted();
        Ok(config)
    }

    /// Build from an arbitrary key lookup. Missing keys fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Ok(Self {
            serper_api_key: non_empty("SERPER_API_KEY"),
            search_max_results: parse_or(&non_empty, "SEARCH_MAX_RESULTS", defaults.search_max_results)?,
            places_api_key: non_empty("GOOGLE_PLACES_API_KEY"),
            adapter_timeout: Duration::from_secs(parse_or(
                &non_empty,
                "ADAPTER_TIMEOUT_SECS",
                defaults.adapter_timeout.as_secs(),
            )?),
            page_cache_ttl: Duration::from_secs(parse_or(
                &non_empty,
                "PAGE_CACHE_TTL_SECS",
                defaults.page_cache_ttl.as_secs(),
            )?),
            policy_path: non_empty("PROFILEMATCH_POLICY").map(PathBuf::from),
        })
    }

    pub fn log_redacted(&self) {
        fn preview_opt(val: &Option<String>) -> String {
            match val {
                Some(v) => {
                    let head: String = v.chars().take(5).collect();
                    format!("{}...({} chars)", head, v.chars().count())
                }
                None => "<not set>".to_string(),
            }
        }

        tracing::info!("Config loaded:");
        tracing::info!("  SERPER_API_KEY: {}", preview_opt(&self.serper_api_key));
        tracing::info!("  GOOGLE_PLACES_API_KEY: {}", preview_opt(&self.places_api_key));
        tracing::info!("  ADAPTER_TIMEOUT_SECS: {}", self.adapter_timeout.as_secs());
        tracing::info!("  PAGE_CACHE_TTL_SECS: {}", self.page_cache_ttl.as_secs());
        tracing::info!("  SEARCH_MAX_RESULTS: {}", self.search_max_results);
        if let Some(path) = &self.policy_path {
            tracing::info!("  PROFILEMATCH_POLICY: {}", path.display());
        }
    }
}

fn parse_or<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::NotANumber {
            key: key.to_string(),
            value: raw,
        }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_set() {
        let config = ResolverConfig::from_lookup(lookup_from(&[])).unwrap();
        assert!(config.serper_api_key.is_none());
        assert_eq!(config.adapter_timeout, Duration::from_secs(20));
        assert_eq!(config.page_cache_ttl, Duration::from_secs(3600));
        assert_eq!(config.search_max_results, 10);
    }

    #[test]
    fn reads_values_and_ignores_blank_keys() {
        let config = ResolverConfig::from_lookup(lookup_from(&[
            ("SERPER_API_KEY", "abc123"),
            ("GOOGLE_PLACES_API_KEY", "  "),
            ("ADAPTER_TIMEOUT_SECS", "5"),
            ("PROFILEMATCH_POLICY", "policy.toml"),
        ]))
        .unwrap();
        assert_eq!(config.serper_api_key.as_deref(), Some("abc123"));
        assert!(config.places_api_key.is_none());
        assert_eq!(config.adapter_timeout, Duration::from_secs(5));
        assert_eq!(config.policy_path, Some(PathBuf::from("policy.toml")));
    }

    #[test]
    fn non_numeric_timeout_is_an_error() {
        let err = ResolverConfig::from_lookup(lookup_from(&[("ADAPTER_TIMEOUT_SECS", "soon")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::NotANumber { .. }));
    }
}
