pub mod adapters;
pub mod aggregator;
pub mod cache;
pub mod canonical;
pub mod file_config;
pub mod gate;
pub mod grouping;
pub mod links;
pub mod policy;
pub mod scoring;
pub mod services;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod traits;

use std::path::Path;

use profilematch_common::{ConfigError, ResolverConfig};

pub use aggregator::{rank_candidates, Resolver};
pub use canonical::{canonicalize, Canonical, RejectReason};
pub use file_config::{load_policy_file, PolicyFile};
pub use policy::{PlatformPolicy, PolicyTable};
pub use traits::{CandidateSource, ListingProvider, PageFetcher, SearchProvider};

/// Policy table from `path` (or the built-in table when `None`), validated.
pub fn load_policies(path: Option<&Path>) -> Result<PolicyTable, ConfigError> {
    match path {
        Some(path) => PolicyTable::with_overrides(&load_policy_file(path)?),
        None => Ok(PolicyTable::default()),
    }
}

/// Resolver wired to the network-backed sources the configuration has credentials for.
pub fn build_resolver(config: &ResolverConfig, policies: PolicyTable) -> anyhow::Result<Resolver> {
    let sources = adapters::default_sources(config)?;
    Ok(Resolver::new(policies)
        .with_sources(sources)
        .with_adapter_timeout(config.adapter_timeout))
}
