//! Cache layer that orchestrates caching logic with network fetching.

use serde::{de::DeserializeOwned, Serialize};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

use super::storage::ResponseCache;
use super::traits::{CacheResult, QueryKey};
use crate::error::Result;

/// Cache layer that manages caching logic and network fetching.
///
/// This layer sits between the application and the network client, providing
/// transparent caching. It never masks a failed fetch: cached data is served
/// only while it is unexpired.
#[derive(Debug, Clone)]
pub struct CacheLayer {
  storage: ResponseCache,
  /// Skip reads and writes for every request
  bypass: bool,
}

impl CacheLayer {
  /// Create a new cache layer with the given storage backend.
  pub fn new(storage: ResponseCache) -> Self {
    Self {
      storage,
      bypass: false,
    }
  }

  pub fn set_bypass(&mut self, bypass: bool) {
    self.bypass = bypass;
  }

  pub fn storage(&self) -> &ResponseCache {
    &self.storage
  }

  fn is_active(&self) -> bool {
    self.storage.is_enabled() && !self.bypass
  }

  /// Fetch with a cache-first strategy.
  ///
  /// 1. If the cache is disabled or bypassed, go straight to the fetcher
  /// 2. Check cache - if an entry decodes, return it
  /// 3. Otherwise fetch from network
  /// 4. Store the fresh value for `ttl`; a failed write is logged, not returned.
  ///    A zero `ttl` skips the write
  pub async fn fetch<K, T, F, Fut>(
    &self,
    key: &K,
    ttl: Duration,
    fetcher: F,
  ) -> Result<CacheResult<T>>
  where
    K: QueryKey,
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T>>,
  {
    if !self.is_active() {
      return Ok(CacheResult::from_network(fetcher().await?));
    }

    let hash = key.cache_hash();

    if let Some(bytes) = self.storage.get(&hash) {
      match serde_json::from_slice::<T>(&bytes) {
        Ok(data) => {
          debug!(key = %key.description(), "cache hit");
          return Ok(CacheResult::from_cache(data));
        }
        Err(e) => {
          // The envelope was fine but the payload no longer matches the type.
          debug!(key = %key.description(), error = %e, "discarding undecodable cache entry");
          if let Err(e) = self.storage.delete(&hash) {
            warn!(key = %key.description(), error = %e, "failed to remove undecodable cache entry");
          }
        }
      }
    } else {
      debug!(key = %key.description(), "cache miss");
    }

    let data = fetcher().await?;

    if ttl.is_zero() {
      return Ok(CacheResult::from_network(data));
    }

    match serde_json::to_vec(&data) {
      Ok(bytes) => {
        if let Err(e) = self.storage.set(&hash, &bytes, ttl) {
          warn!(key = %key.description(), error = %e, "failed to write cache entry");
        }
      }
      Err(e) => warn!(key = %key.description(), error = %e, "failed to serialize response for cache"),
    }

    Ok(CacheResult::from_network(data))
  }
}
