//! Caching layer for timetable pages.
//!
//! Connection lists are cached per query and connection details per handle.
//! Entries expire after a short TTL so delay information stays reasonably
//! fresh. Errors are never cached.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache as MokaCache;
use tracing::debug;

use crate::domain::DetailHandle;
use crate::provider::{
    ConnectionQuery, ProviderError, RawConnectionDetail, RawConnectionList, TimetableProvider,
};

/// Configuration for the cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// TTL for cached entries.
    pub ttl: Duration,

    /// Maximum number of cached entries per page kind.
    pub max_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(60),
            max_capacity: 1000,
        }
    }
}

impl CacheConfig {
    /// Set the TTL.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Set the capacity.
    pub fn with_max_capacity(mut self, max_capacity: u64) -> Self {
        self.max_capacity = max_capacity;
        self
    }
}

/// Timetable provider with caching.
///
/// Wraps any [`TimetableProvider`] and answers repeated requests from memory.
pub struct CachedProvider<P> {
    provider: P,
    lists: MokaCache<ConnectionQuery, Arc<RawConnectionList>>,
    details: MokaCache<DetailHandle, Arc<RawConnectionDetail>>,
}

impl<P: TimetableProvider> CachedProvider<P> {
    /// Create a new cached provider.
    pub fn new(provider: P, config: &CacheConfig) -> Self {
        let lists = MokaCache::builder()
            .time_to_live(config.ttl)
            .max_capacity(config.max_capacity)
            .build();
        let details = MokaCache::builder()
            .time_to_live(config.ttl)
            .max_capacity(config.max_capacity)
            .build();

        Self {
            provider,
            lists,
            details,
        }
    }

    /// Access the underlying provider for requests that bypass the cache.
    pub fn provider(&self) -> &P {
        &self.provider
    }
}

impl<P: TimetableProvider> TimetableProvider for CachedProvider<P> {
    async fn list_connections(
        &self,
        query: &ConnectionQuery,
    ) -> Result<RawConnectionList, ProviderError> {
        if let Some(cached) = self.lists.get(query).await {
            debug!(origin = %query.origin, destination = %query.destination, "connection list cache hit");
            return Ok(cached.as_ref().clone());
        }

        let list = self.provider.list_connections(query).await?;
        self.lists
            .insert(query.clone(), Arc::new(list.clone()))
            .await;

        Ok(list)
    }

    async fn fetch_detail(&self, handle: &DetailHandle) -> Result<RawConnectionDetail, ProviderError> {
        if let Some(cached) = self.details.get(handle).await {
            debug!(handle = %handle, "connection detail cache hit");
            return Ok(cached.as_ref().clone());
        }

        let detail = self.provider.fetch_detail(handle).await?;
        self.details
            .insert(handle.clone(), Arc::new(detail.clone()))
            .await;

        Ok(detail)
    }
}
