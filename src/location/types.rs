use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// How a location was obtained.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationSource {
  Ip,
  #[default]
  Manual,
  Gps,
}

impl std::fmt::Display for LocationSource {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      LocationSource::Ip => write!(f, "ip"),
      LocationSource::Manual => write!(f, "manual"),
      LocationSource::Gps => write!(f, "gps"),
    }
  }
}

/// A geographic location, as detected or as entered by the user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
  #[serde(default)]
  pub latitude: f64,
  #[serde(default)]
  pub longitude: f64,
  /// Free-text address; address-only locations are geocoded by the API
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub address: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub city: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub country: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub country_code: Option<String>,
  /// IANA timezone id (e.g., "Africa/Cairo")
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub timezone: Option<String>,
  #[serde(default)]
  pub source: LocationSource,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub detected_at: Option<DateTime<Utc>>,
}

impl Location {
  pub fn from_coordinates(latitude: f64, longitude: f64) -> Self {
    Self {
      latitude,
      longitude,
      source: LocationSource::Manual,
      ..Default::default()
    }
  }

  /// An address-only location. No geocoding happens here.
  pub fn from_address(address: impl Into<String>) -> Self {
    Self {
      address: Some(address.into()),
      source: LocationSource::Manual,
      ..Default::default()
    }
  }

  /// Both coordinates in range and not the (0, 0) "unset" pair.
  ///
  /// Rejecting exactly (0°, 0°) misclassifies a genuine request for that
  /// point in the Gulf of Guinea. It is kept as a deliberate approximation so
  /// that zero-valued decodes never pass as real positions.
  pub fn is_valid(&self) -> bool {
    (-90.0..=90.0).contains(&self.latitude)
      && (-180.0..=180.0).contains(&self.longitude)
      && (self.latitude != 0.0 || self.longitude != 0.0)
  }

  pub fn validate(&self) -> Result<()> {
    if self.is_valid() {
      Ok(())
    } else {
      Err(Error::InvalidParams(format!(
        "invalid coordinates: lat={}, lon={}",
        self.latitude, self.longitude
      )))
    }
  }

  pub fn has_address(&self) -> bool {
    self.address.as_deref().is_some_and(|a| !a.trim().is_empty())
  }

  /// Human-readable label for output.
  pub fn display_address(&self) -> String {
    if let Some(address) = self.address.as_deref().filter(|a| !a.is_empty()) {
      return address.to_string();
    }
    match (self.city.as_deref(), self.country.as_deref()) {
      (Some(city), Some(country)) => format!("{}, {}", city, country),
      (Some(city), None) => city.to_string(),
      _ => format!("{:.4}, {:.4}", self.latitude, self.longitude),
    }
  }
}

/// Joins two optional name parts as "a, b".
pub(crate) fn format_address(first: Option<&str>, second: Option<&str>) -> Option<String> {
  let first = first.filter(|s| !s.is_empty());
  let second = second.filter(|s| !s.is_empty());
  match (first, second) {
    (Some(a), Some(b)) => Some(format!("{}, {}", a, b)),
    (Some(a), None) | (None, Some(a)) => Some(a.to_string()),
    (None, None) => None,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_validity() {
    assert!(Location::from_coordinates(30.0444, 31.2357).is_valid());
    assert!(Location::from_coordinates(-33.8688, 151.2093).is_valid());
    assert!(Location::from_coordinates(0.0, 31.0).is_valid());
    assert!(Location::from_coordinates(90.0, -180.0).is_valid());

    assert!(!Location::from_coordinates(0.0, 0.0).is_valid());
    assert!(!Location::from_coordinates(91.0, 10.0).is_valid());
    assert!(!Location::from_coordinates(10.0, -180.5).is_valid());
    assert!(!Location::from_coordinates(f64::NAN, 10.0).is_valid());
  }

  #[test]
  fn test_address_only_location_has_no_coordinates() {
    let loc = Location::from_address("Cairo, Egypt");
    assert!(!loc.is_valid());
    assert!(loc.has_address());
    assert_eq!(loc.source, LocationSource::Manual);
    assert_eq!(loc.display_address(), "Cairo, Egypt");
  }

  #[test]
  fn test_display_address_fallbacks() {
    let mut loc = Location::from_coordinates(30.0444, 31.2357);
    assert_eq!(loc.display_address(), "30.0444, 31.2357");

    loc.city = Some("Cairo".to_string());
    assert_eq!(loc.display_address(), "Cairo");

    loc.country = Some("Egypt".to_string());
    assert_eq!(loc.display_address(), "Cairo, Egypt");
  }

  #[test]
  fn test_format_address() {
    assert_eq!(format_address(Some("Cairo"), Some("Egypt")).as_deref(), Some("Cairo, Egypt"));
    assert_eq!(format_address(Some(""), Some("Egypt")).as_deref(), Some("Egypt"));
    assert_eq!(format_address(None, None), None);
  }

  #[test]
  fn test_yaml_round_trip_keeps_source() {
    let loc = Location {
      timezone: Some("Africa/Cairo".to_string()),
      source: LocationSource::Ip,
      ..Location::from_coordinates(30.0444, 31.2357)
    };
    let yaml = serde_yaml::to_string(&loc).unwrap();
    assert!(yaml.contains("source: ip"));
    let back: Location = serde_yaml::from_str(&yaml).unwrap();
    assert_eq!(back, loc);
  }
}
