//! Cache keys and lifetimes for prayer API calls.

use chrono::{Local, NaiveDate, NaiveDateTime};
use std::time::Duration;

use crate::cache::QueryKey;

use super::params::PrayerTimesParams;

/// Decimal places for coordinates in timings keys and requests
pub(crate) const COORD_PRECISION: usize = 6;
/// Decimal places for Qibla keys and requests (about 11 m)
pub(crate) const QIBLA_PRECISION: usize = 4;

// ============================================================================
// Query key types
// ============================================================================

/// Query key types for prayer API calls.
///
/// Every parameter that changes the response is part of the key, so two
/// requests share an entry only when the server would answer them identically.
#[derive(Clone, Debug, PartialEq)]
pub enum PrayerQueryKey {
  Timings {
    latitude: f64,
    longitude: f64,
    date: NaiveDate,
    method: u8,
    school: u8,
    timezone: Option<String>,
    adjustment: i32,
    iso8601: bool,
  },
  TimingsByAddress {
    address: String,
    date: NaiveDate,
    method: u8,
    school: u8,
    adjustment: i32,
    iso8601: bool,
  },
  Qibla {
    latitude: f64,
    longitude: f64,
  },
}

impl PrayerQueryKey {
  pub fn timings(params: &PrayerTimesParams) -> Self {
    Self::Timings {
      latitude: params.latitude,
      longitude: params.longitude,
      date: params.date,
      method: params.method,
      school: params.school,
      timezone: params.timezone.clone(),
      adjustment: params.adjustment,
      iso8601: params.iso8601,
    }
  }

  pub fn timings_by_address(params: &PrayerTimesParams) -> Self {
    Self::TimingsByAddress {
      address: params.address.clone().unwrap_or_default(),
      date: params.date,
      method: params.method,
      school: params.school,
      adjustment: params.adjustment,
      iso8601: params.iso8601,
    }
  }

  pub fn qibla(latitude: f64, longitude: f64) -> Self {
    Self::Qibla {
      latitude,
      longitude,
    }
  }

}

impl QueryKey for PrayerQueryKey {
  fn canonical(&self) -> String {
    match self {
      Self::Timings {
        latitude,
        longitude,
        date,
        method,
        school,
        timezone,
        adjustment,
        iso8601,
      } => format!(
        "times|{}|{}|{}|m{}|s{}|tz{}|adj{}|iso{}",
        fixed(*latitude, COORD_PRECISION),
        fixed(*longitude, COORD_PRECISION),
        date,
        method,
        school,
        timezone.as_deref().unwrap_or(""),
        adjustment,
        iso8601
      ),
      Self::TimingsByAddress {
        address,
        date,
        method,
        school,
        adjustment,
        iso8601,
      } => format!(
        "addr|{}|{}|m{}|s{}|adj{}|iso{}",
        normalize_address(address),
        date,
        method,
        school,
        adjustment,
        iso8601
      ),
      Self::Qibla {
        latitude,
        longitude,
      } => format!(
        "qibla|{}|{}",
        fixed(*latitude, QIBLA_PRECISION),
        fixed(*longitude, QIBLA_PRECISION)
      ),
    }
  }

  fn description(&self) -> String {
    match self {
      Self::Timings {
        latitude,
        longitude,
        date,
        method,
        ..
      } => format!(
        "timings {:.4},{:.4} on {} (method {})",
        latitude, longitude, date, method
      ),
      Self::TimingsByAddress {
        address,
        date,
        method,
        ..
      } => format!("timings for {:?} on {} (method {})", address, date, method),
      Self::Qibla {
        latitude,
        longitude,
      } => format!("qibla from {:.4},{:.4}", latitude, longitude),
    }
  }
}

/// Normalize an address for consistent hashing.
/// Trims whitespace, collapses inner runs and lowercases.
fn normalize_address(address: &str) -> String {
  address
    .split_whitespace()
    .collect::<Vec<_>>()
    .join(" ")
    .to_lowercase()
}

/// Fixed-precision coordinate text; negative zero prints as zero.
pub(crate) fn fixed(value: f64, precision: usize) -> String {
  let text = format!("{:.*}", precision, value);
  match text.strip_prefix('-') {
    Some(rest) if rest.bytes().all(|b| b == b'0' || b == b'.') => rest.to_string(),
    _ => text,
  }
}

// ============================================================================
// Lifetimes
// ============================================================================

/// How long each kind of response stays cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheTtls {
  /// Upper bound for a day's timings; they also never outlive that day
  pub timings: Duration,
  pub qibla: Duration,
}

impl Default for CacheTtls {
  fn default() -> Self {
    Self {
      timings: Duration::from_secs(24 * 60 * 60),
      qibla: Duration::from_secs(365 * 24 * 60 * 60),
    }
  }
}

impl CacheTtls {
  /// Lifetime for the timings of `date`, as seen from the local clock.
  pub fn for_day(&self, date: NaiveDate) -> Duration {
    self.for_day_at(date, Local::now().naive_local())
  }

  /// Time from `now` until the end of `date`, capped at the timings TTL.
  /// Zero once the day is over.
  pub fn for_day_at(&self, date: NaiveDate, now: NaiveDateTime) -> Duration {
    let Some(end_of_day) = date.succ_opt().and_then(|d| d.and_hms_opt(0, 0, 0)) else {
      return Duration::ZERO;
    };
    (end_of_day - now)
      .to_std()
      .unwrap_or(Duration::ZERO)
      .min(self.timings)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
  }

  fn timings() -> PrayerQueryKey {
    PrayerQueryKey::timings(
      &PrayerTimesParams::default()
        .with_coordinates(30.0444, 31.2357)
        .with_date(date(2024, 3, 15)),
    )
  }

  #[test]
  fn test_fingerprint_is_deterministic() {
    assert_eq!(timings().cache_hash(), timings().cache_hash());
    assert_eq!(timings().cache_hash().len(), 32);
  }

  #[test]
  fn test_every_parameter_changes_the_key() {
    let base = PrayerTimesParams::default()
      .with_coordinates(30.0444, 31.2357)
      .with_date(date(2024, 3, 15));

    let variants = [
      base.clone().with_coordinates(30.0454, 31.2357),
      base.clone().with_coordinates(30.0444, 31.2347),
      base.clone().with_date(date(2024, 3, 16)),
      base.clone().with_method(4),
      base.clone().with_school(1),
      base.clone().with_timezone(Some("Africa/Cairo".to_string())),
      PrayerTimesParams {
        adjustment: 1,
        ..base.clone()
      },
      base.clone().with_iso8601(true),
    ];

    let base_hash = PrayerQueryKey::timings(&base).cache_hash();
    for variant in &variants {
      assert_ne!(
        PrayerQueryKey::timings(variant).cache_hash(),
        base_hash,
        "{:?}",
        variant
      );
    }
  }

  #[test]
  fn test_float_noise_does_not_split_the_cache() {
    let a = PrayerQueryKey::qibla(30.04441, 31.23569);
    let b = PrayerQueryKey::qibla(30.04439, 31.23571);
    assert_eq!(a.cache_hash(), b.cache_hash());

    let c = PrayerQueryKey::Timings {
      latitude: -0.0,
      longitude: 10.0,
      date: date(2024, 1, 1),
      method: 5,
      school: 0,
      timezone: None,
      adjustment: 0,
      iso8601: false,
    };
    let d = PrayerQueryKey::Timings {
      latitude: 0.0,
      longitude: 10.0,
      date: date(2024, 1, 1),
      method: 5,
      school: 0,
      timezone: None,
      adjustment: 0,
      iso8601: false,
    };
    assert_eq!(c.canonical(), d.canonical());
  }

  #[test]
  fn test_address_is_normalized() {
    let key = |address: &str| {
      PrayerQueryKey::timings_by_address(
        &PrayerTimesParams::default()
          .with_address(address)
          .with_date(date(2024, 3, 15)),
      )
    };
    assert_eq!(
      key("  Cairo,   Egypt ").cache_hash(),
      key("cairo, egypt").cache_hash()
    );
    assert_ne!(key("Cairo").cache_hash(), key("Giza").cache_hash());
  }

  #[test]
  fn test_kinds_never_collide() {
    let qibla = PrayerQueryKey::qibla(30.0444, 31.2357);
    let by_address = PrayerQueryKey::timings_by_address(
      &PrayerTimesParams::default()
        .with_address("30.0444, 31.2357")
        .with_date(date(2024, 3, 15)),
    );
    assert_ne!(qibla.cache_hash(), timings().cache_hash());
    assert_ne!(by_address.cache_hash(), timings().cache_hash());
  }

  #[test]
  fn test_timings_never_outlive_their_day() {
    let ttls = CacheTtls::default();
    let day = date(2024, 3, 15);

    let evening = day.and_hms_opt(22, 30, 0).unwrap();
    assert_eq!(ttls.for_day_at(day, evening), Duration::from_secs(90 * 60));

    let morning = day.and_hms_opt(0, 0, 0).unwrap();
    assert_eq!(ttls.for_day_at(day, morning), Duration::from_secs(24 * 60 * 60));

    // Tomorrow is capped at the configured lifetime
    let tomorrow = day.succ_opt().unwrap();
    assert_eq!(ttls.for_day_at(tomorrow, evening), ttls.timings);

    // Yesterday is never stored
    let yesterday = day.pred_opt().unwrap();
    assert_eq!(ttls.for_day_at(yesterday, evening), Duration::ZERO);
  }

  #[test]
  fn test_configured_cap_applies() {
    let ttls = CacheTtls {
      timings: Duration::from_secs(3600),
      ..Default::default()
    };
    let day = date(2024, 3, 15);
    let noon = day.and_hms_opt(12, 0, 0).unwrap();
    assert_eq!(ttls.for_day_at(day, noon), Duration::from_secs(3600));
  }
}
