//! Cached prayer client that wraps PrayerClient with transparent caching.

use crate::cache::{CacheLayer, CacheResult, ResponseCache};
use crate::error::Result;
use crate::http::Deadline;

use super::cache::{CacheTtls, PrayerQueryKey};
use super::client::PrayerClient;
use super::params::{CalendarParams, PrayerTimesParams};
use super::types::{PrayerTimesResponse, QiblaResponse};

/// Prayer client with transparent caching support.
///
/// This wraps the underlying PrayerClient and provides the same API, but
/// serves unexpired responses from the local cache. Every result says
/// whether it came from the network or the cache.
#[derive(Clone)]
pub struct CachedPrayerClient {
  inner: PrayerClient,
  cache: CacheLayer,
  ttls: CacheTtls,
}

impl CachedPrayerClient {
  /// Create a new cached prayer client.
  pub fn new(inner: PrayerClient, storage: ResponseCache) -> Self {
    Self {
      inner,
      cache: CacheLayer::new(storage),
      ttls: CacheTtls::default(),
    }
  }

  pub fn with_ttls(mut self, ttls: CacheTtls) -> Self {
    self.ttls = ttls;
    self
  }

  /// Skip the cache for reads and writes.
  pub fn with_bypass(mut self, bypass: bool) -> Self {
    self.cache.set_bypass(bypass);
    self
  }

  pub fn inner(&self) -> &PrayerClient {
    &self.inner
  }

  pub fn storage(&self) -> &ResponseCache {
    self.cache.storage()
  }

  /// Remove every cached response, returning how many were removed.
  pub fn clear_cache(&self) -> Result<usize> {
    self.cache.storage().clear()
  }

  /// Get prayer times by coordinates with caching.
  pub async fn get_prayer_times(
    &self,
    params: &PrayerTimesParams,
    deadline: Deadline,
  ) -> Result<CacheResult<PrayerTimesResponse>> {
    let key = PrayerQueryKey::timings(params);
    let ttl = self.ttls.for_day(params.date);

    self
      .cache
      .fetch(&key, ttl, || self.inner.get_prayer_times(params, deadline))
      .await
  }

  /// Get prayer times by address with caching.
  pub async fn get_prayer_times_by_address(
    &self,
    params: &PrayerTimesParams,
    deadline: Deadline,
  ) -> Result<CacheResult<PrayerTimesResponse>> {
    let key = PrayerQueryKey::timings_by_address(params);
    let ttl = self.ttls.for_day(params.date);

    self
      .cache
      .fetch(&key, ttl, || {
        self.inner.get_prayer_times_by_address(params, deadline)
      })
      .await
  }

  /// Get prayer times by address when `params` has a non-blank one, else by
  /// coordinates.
  pub async fn get_timings(
    &self,
    params: &PrayerTimesParams,
    deadline: Deadline,
  ) -> Result<CacheResult<PrayerTimesResponse>> {
    let has_address = params
      .address
      .as_deref()
      .is_some_and(|address| !address.trim().is_empty());
    if has_address {
      self.get_prayer_times_by_address(params, deadline).await
    } else {
      self.get_prayer_times(params, deadline).await
    }
  }

  /// Get the Qibla direction with caching. It never changes for a place,
  /// so entries live for the long Qibla TTL.
  pub async fn get_qibla(
    &self,
    latitude: f64,
    longitude: f64,
    deadline: Deadline,
  ) -> Result<CacheResult<QiblaResponse>> {
    let key = PrayerQueryKey::qibla(latitude, longitude);

    self
      .cache
      .fetch(&key, self.ttls.qibla, || {
        self.inner.get_qibla(latitude, longitude, deadline)
      })
      .await
  }

  /// Download the ICS feed (not cached - written straight to a file).
  pub async fn download_ics(&self, params: &CalendarParams, deadline: Deadline) -> Result<Vec<u8>> {
    self.inner.download_ics(params, deadline).await
  }
}
