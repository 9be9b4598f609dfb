//! In-memory TTL cache plus memoizing wrappers for the page and listing collaborators.
//!
//! Reads may be stale by up to one TTL. Expired entries are ignored on read and dropped
//! on insert once the cache reaches `MAX_ENTRIES`; if every entry is still fresh the
//! oldest one goes. Concurrent loads of the same key share one in-flight request.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, OnceCell, RwLock};
use tracing::debug;

use crate::traits::{ListingDetails, ListingProvider, PageFetcher};

const MAX_ENTRIES: usize = 1_000;

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    inserted_at: DateTime<Utc>,
}

type Inflight<V> = Arc<OnceCell<Result<V, Arc<anyhow::Error>>>>;

pub struct TtlCache<V> {
    ttl: Duration,
    entries: RwLock<HashMap<String, CacheEntry<V>>>,
    inflight: Mutex<HashMap<String, Inflight<V>>>,
}

impl<V: Clone + Send + Sync> TtlCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
            inflight: Mutex::new(HashMap::new()),
        }
    }

    pub async fn get(&self, key: &str) -> Option<V> {
        let entries = self.entries.read().await;
        let entry = entries.get(key)?;
        if self.is_fresh(entry, Utc::now()) {
            Some(entry.value.clone())
        } else {
            None
        }
    }

    pub async fn insert(&self, key: impl Into<String>, value: V) {
        let now = Utc::now();
        let mut entries = self.entries.write().await;
        if entries.len() >= MAX_ENTRIES {
            entries.retain(|_, e| self.is_fresh(e, now));
        }
        if entries.len() >= MAX_ENTRIES {
            let oldest = entries
                .iter()
                .min_by_key(|(_, e)| e.inserted_at)
                .map(|(k, _)| k.clone());
            if let Some(oldest) = oldest {
                entries.remove(&oldest);
            }
        }
        entries.insert(
            key.into(),
            CacheEntry {
                value,
                inserted_at: now,
            },
        );
    }

    /// Cached value for `key`, or the result of `load`. Callers racing on the same key
    /// await a single `load`. Errors are handed to every waiter and never stored.
    pub async fn get_or_load<F, Fut>(&self, key: &str, load: F) -> Result<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V>>,
    {
        if let Some(value) = self.get(key).await {
            debug!(key, "cache hit");
            return Ok(value);
        }

        let cell = {
            let mut inflight = self.inflight.lock().await;
            Arc::clone(inflight.entry(key.to_string()).or_default())
        };
        let outcome = cell
            .get_or_init(|| async move { load().await.map_err(Arc::new) })
            .await
            .clone();

        if let Ok(value) = &outcome {
            self.insert(key, value.clone()).await;
        }
        {
            let mut inflight = self.inflight.lock().await;
            if inflight.get(key).is_some_and(|c| Arc::ptr_eq(c, &cell)) {
                inflight.remove(key);
            }
        }

        outcome.map_err(|e| anyhow!("{e:#}"))
    }

    /// Drop every expired entry. Returns how many were removed.
    pub async fn evict_expired(&self) -> usize {
        let now = Utc::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, e| self.is_fresh(e, now));
        before - entries.len()
    }

    /// Entries currently held, expired or not.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn is_fresh(&self, entry: &CacheEntry<V>, now: DateTime<Utc>) -> bool {
        // A negative age (clock moved backwards) counts as fresh.
        (now - entry.inserted_at)
            .to_std()
            .map_or(true, |age| age < self.ttl)
    }
}

/// Serves pages from a [`TtlCache`] keyed by URL, falling through to the inner fetcher on a miss.
/// Failures are not cached.
pub struct CachedPageFetcher<F> {
    inner: F,
    cache: TtlCache<String>,
}

impl<F: PageFetcher> CachedPageFetcher<F> {
    pub fn new(inner: F, ttl: Duration) -> Self {
        Self {
            inner,
            cache: TtlCache::new(ttl),
        }
    }

    pub fn cache(&self) -> &TtlCache<String> {
        &self.cache
    }
}

#[async_trait]
impl<F: PageFetcher> PageFetcher for CachedPageFetcher<F> {
    async fn fetch_html(&self, url: &str) -> Result<String> {
        self.cache
            .get_or_load(url, || self.inner.fetch_html(url))
            .await
    }
}

/// Listing lookups are billed per call; one per listing id per TTL.
pub struct CachedListingProvider<P> {
    inner: P,
    cache: TtlCache<ListingDetails>,
}

impl<P: ListingProvider> CachedListingProvider<P> {
    pub fn new(inner: P, ttl: Duration) -> Self {
        Self {
            inner,
            cache: TtlCache::new(ttl),
        }
    }
}

#[async_trait]
impl<P: ListingProvider> ListingProvider for CachedListingProvider<P> {
    async fn listing(&self, listing_id: &str) -> Result<ListingDetails> {
        self.cache
            .get_or_load(listing_id, || self.inner.listing(listing_id))
            .await
    }
}
