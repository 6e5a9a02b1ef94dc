//! Core traits and types for the caching system.

use sha2::{Digest, Sha256};

/// Number of hex characters kept from the SHA-256 digest.
const KEY_LEN: usize = 32;

/// A logical request that can be cached.
///
/// Implementors describe their parameters as a canonical string; the cache
/// key is always derived from it, never taken from the caller.
pub trait QueryKey {
  /// Canonical, normalized representation of the request parameters.
  fn canonical(&self) -> String;

  /// Human-readable description for logs.
  fn description(&self) -> String;

  /// Stable, fixed-length cache key.
  fn cache_hash(&self) -> String {
    fingerprint(&self.canonical())
  }
}

/// SHA256 hash for stable, fixed-length keys.
pub fn fingerprint(input: &str) -> String {
  let mut hasher = Sha256::new();
  hasher.update(input.as_bytes());
  let mut key = hex::encode(hasher.finalize());
  key.truncate(KEY_LEN);
  key
}

/// Result from a cache operation, including data and metadata about the source.
#[derive(Debug, Clone)]
pub struct CacheResult<T> {
  /// The actual data
  pub data: T,
  /// Where the data came from
  pub source: CacheSource,
}

impl<T> CacheResult<T> {
  /// Create a new cache result from fresh network data.
  pub fn from_network(data: T) -> Self {
    Self {
      data,
      source: CacheSource::Network,
    }
  }

  /// Create a new cache result from cached data.
  pub fn from_cache(data: T) -> Self {
    Self {
      data,
      source: CacheSource::Cache,
    }
  }
}

/// Indicates where a result came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheSource {
  /// Fresh data from network
  Network,
  /// Unexpired cache entry
  Cache,
}

impl std::fmt::Display for CacheSource {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      CacheSource::Network => write!(f, "network"),
      CacheSource::Cache => write!(f, "cache"),
    }
  }
}
