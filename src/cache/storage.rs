//! File-based cache storage.
//!
//! One `<key>.json` file per entry inside the cache directory. No locking is
//! done: concurrent writers to the same key race and the last rename wins.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{Error, Result};

const ENTRY_EXTENSION: &str = "json";

/// On-disk envelope for a cached response.
#[derive(Debug, Serialize, Deserialize)]
pub struct CacheEntry {
  pub key: String,
  /// The cached body, embedded verbatim
  pub payload: Box<RawValue>,
  pub created_at: DateTime<Utc>,
  pub expires_at: DateTime<Utc>,
}

impl CacheEntry {
  fn new(key: &str, payload: Box<RawValue>, ttl: Duration) -> Self {
    let created_at = Utc::now();
    // Clamp so that `expires_at > created_at` always holds.
    let ttl = chrono::Duration::from_std(ttl)
      .unwrap_or_else(|_| chrono::Duration::days(365 * 100))
      .max(chrono::Duration::milliseconds(1));
    let expires_at = created_at
      .checked_add_signed(ttl)
      .unwrap_or(DateTime::<Utc>::MAX_UTC);

    Self {
      key: key.to_string(),
      payload,
      created_at,
      expires_at,
    }
  }

  pub fn is_expired(&self) -> bool {
    Utc::now() > self.expires_at
  }
}

/// Entry count and total size on disk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
  pub entries: usize,
  pub total_bytes: u64,
}

/// Expiring key -> bytes store scoped to a directory.
#[derive(Debug, Clone)]
pub struct ResponseCache {
  dir: PathBuf,
  enabled: bool,
}

impl ResponseCache {
  /// Create a cache rooted at `dir`. The directory is created lazily on the
  /// first write.
  pub fn new(dir: impl Into<PathBuf>) -> Self {
    Self {
      dir: dir.into(),
      enabled: true,
    }
  }

  /// Get the default cache directory.
  pub fn default_dir() -> Result<PathBuf> {
    let cache_dir = dirs::cache_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".cache")))
      .ok_or_else(|| Error::Cache("could not determine cache directory".to_string()))?;

    Ok(cache_dir.join("pray"))
  }

  pub fn with_enabled(mut self, enabled: bool) -> Self {
    self.enabled = enabled;
    self
  }

  pub fn is_enabled(&self) -> bool {
    self.enabled
  }

  pub fn dir(&self) -> &Path {
    &self.dir
  }

  /// Read an unexpired entry.
  ///
  /// Missing, unparseable and expired entries all read as `None`; the latter
  /// two are removed from disk on the way out.
  pub fn get(&self, key: &str) -> Option<Vec<u8>> {
    if !self.enabled {
      return None;
    }

    let path = self.entry_path(key);
    let contents = fs::read(&path).ok()?;

    let entry: CacheEntry = match serde_json::from_slice(&contents) {
      Ok(entry) => entry,
      Err(e) => {
        debug!(key, error = %e, "removing corrupt cache entry");
        remove_quietly(&path);
        return None;
      }
    };

    if entry.is_expired() {
      debug!(key, expires_at = %entry.expires_at, "removing expired cache entry");
      remove_quietly(&path);
      return None;
    }

    Some(entry.payload.get().as_bytes().to_vec())
  }

  /// Store `payload` under `key` for `ttl`, replacing any existing entry.
  pub fn set(&self, key: &str, payload: &[u8], ttl: Duration) -> Result<()> {
    if !self.enabled {
      return Ok(());
    }

    let text = std::str::from_utf8(payload)
      .map_err(|e| Error::Cache(format!("payload for {} is not UTF-8: {}", key, e)))?;
    let raw = RawValue::from_string(text.to_string())
      .map_err(|e| Error::Cache(format!("payload for {} is not JSON: {}", key, e)))?;

    let entry = CacheEntry::new(key, raw, ttl);
    let json = serde_json::to_vec(&entry)
      .map_err(|e| Error::Cache(format!("failed to serialize cache entry: {}", e)))?;

    fs::create_dir_all(&self.dir)?;

    // Write atomically via temp file
    let path = self.entry_path(key);
    let temp_path = path.with_extension("tmp");
    let mut file = fs::File::create(&temp_path)?;
    file.write_all(&json)?;
    file.sync_all()?;
    fs::rename(&temp_path, &path)?;

    Ok(())
  }

  /// Remove a single entry. Removing a missing entry is not an error.
  pub fn delete(&self, key: &str) -> Result<()> {
    match fs::remove_file(self.entry_path(key)) {
      Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e.into()),
      _ => Ok(()),
    }
  }

  /// Remove every entry. A missing directory counts as already clear.
  pub fn clear(&self) -> Result<usize> {
    let mut removed = 0;
    for path in self.entry_files()? {
      fs::remove_file(&path)?;
      removed += 1;
    }
    Ok(removed)
  }

  /// Sweep expired and corrupt entries, returning how many were removed.
  pub fn clean_expired(&self) -> Result<usize> {
    if !self.enabled {
      return Ok(0);
    }

    let mut removed = 0;
    for path in self.entry_files()? {
      let Ok(contents) = fs::read(&path) else {
        continue;
      };

      let stale = match serde_json::from_slice::<CacheEntry>(&contents) {
        Ok(entry) => entry.is_expired(),
        Err(_) => true,
      };

      if stale {
        match fs::remove_file(&path) {
          Ok(()) => removed += 1,
          Err(e) => warn!(path = %path.display(), error = %e, "failed to remove cache entry"),
        }
      }
    }

    Ok(removed)
  }

  pub fn stats(&self) -> Result<CacheStats> {
    let mut stats = CacheStats::default();
    for path in self.entry_files()? {
      if let Ok(meta) = fs::metadata(&path) {
        stats.entries += 1;
        stats.total_bytes += meta.len();
      }
    }
    Ok(stats)
  }

  fn entry_path(&self, key: &str) -> PathBuf {
    self.dir.join(format!("{}.{}", key, ENTRY_EXTENSION))
  }

  /// All entry files in the cache directory (empty if it does not exist).
  fn entry_files(&self) -> Result<Vec<PathBuf>> {
    let entries = match fs::read_dir(&self.dir) {
      Ok(entries) => entries,
      Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
      Err(e) => return Err(e.into()),
    };

    let mut files = Vec::new();
    for entry in entries {
      let path = entry?.path();
      if path.is_file() && path.extension().is_some_and(|ext| ext == ENTRY_EXTENSION) {
        files.push(path);
      }
    }
    Ok(files)
  }
}

fn remove_quietly(path: &Path) {
  if let Err(e) = fs::remove_file(path) {
    if e.kind() != io::ErrorKind::NotFound {
      warn!(path = %path.display(), error = %e, "failed to remove cache entry");
    }
  }
}
