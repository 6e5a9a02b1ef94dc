//! IP geolocation provider adapters.
//!
//! Each adapter knows one service's URL and JSON schema and nothing else;
//! ordering and validation live in the resolver.

use futures::future::BoxFuture;
use serde::Deserialize;

use super::types::{format_address, Location};
use crate::error::{Error, Result};
use crate::http::{Deadline, RetryingClient};

/// Primary IP geolocation service
pub const IP_API_ENDPOINT: &str = "http://ip-api.com/json/";

/// Secondary fallback
pub const IP_INFO_ENDPOINT: &str = "https://ipinfo.io/json";

/// Tertiary fallback
pub const IP_API_CO_ENDPOINT: &str = "https://ipapi.co/json/";

/// A single geolocation service.
pub trait GeoProvider: Send + Sync {
  fn name(&self) -> &str;

  /// Look up the caller's location. The result is not validated here.
  fn locate<'a>(
    &'a self,
    http: &'a RetryingClient,
    deadline: Deadline,
  ) -> BoxFuture<'a, Result<Location>>;
}

/// The default provider chain, in trial order.
pub fn default_providers() -> Vec<Box<dyn GeoProvider>> {
  vec![
    Box::new(IpApi::default()),
    Box::new(IpInfo::default()),
    Box::new(IpApiCo::default()),
  ]
}

// ============================================================================
// ip-api.com
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IpApiResponse {
  status: String,
  #[serde(default)]
  message: Option<String>,
  #[serde(default)]
  country: Option<String>,
  #[serde(default)]
  country_code: Option<String>,
  #[serde(default)]
  city: Option<String>,
  #[serde(default)]
  lat: f64,
  #[serde(default)]
  lon: f64,
  #[serde(default)]
  timezone: Option<String>,
}

pub struct IpApi {
  endpoint: String,
}

impl IpApi {
  pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
    Self {
      endpoint: endpoint.into(),
    }
  }

  fn parse(body: &[u8]) -> Result<Location> {
    let result: IpApiResponse =
      serde_json::from_slice(body).map_err(|e| Error::decode("ip-api.com response", e))?;

    if result.status != "success" {
      return Err(Error::Api {
        code: 0,
        status: format!(
          "ip-api.com error: {}",
          result.message.unwrap_or_else(|| result.status.clone())
        ),
      });
    }

    Ok(Location {
      latitude: result.lat,
      longitude: result.lon,
      address: format_address(result.city.as_deref(), result.country.as_deref()),
      city: result.city,
      country: result.country,
      country_code: result.country_code,
      timezone: result.timezone,
      ..Default::default()
    })
  }
}

impl Default for IpApi {
  fn default() -> Self {
    Self::with_endpoint(IP_API_ENDPOINT)
  }
}

impl GeoProvider for IpApi {
  fn name(&self) -> &str {
    "ip-api.com"
  }

  fn locate<'a>(
    &'a self,
    http: &'a RetryingClient,
    deadline: Deadline,
  ) -> BoxFuture<'a, Result<Location>> {
    Box::pin(async move {
      let body = http.get(self.name(), &self.endpoint, deadline).await?;
      Self::parse(&body)
    })
  }
}

// ============================================================================
// ipinfo.io
// ============================================================================

#[derive(Debug, Deserialize)]
struct IpInfoResponse {
  #[serde(default)]
  city: Option<String>,
  #[serde(default)]
  region: Option<String>,
  /// Two-letter country code
  #[serde(default)]
  country: Option<String>,
  /// "lat,lon"
  #[serde(default)]
  loc: String,
  #[serde(default)]
  timezone: Option<String>,
}

pub struct IpInfo {
  endpoint: String,
}

impl IpInfo {
  pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
    Self {
      endpoint: endpoint.into(),
    }
  }

  fn parse(body: &[u8]) -> Result<Location> {
    let result: IpInfoResponse =
      serde_json::from_slice(body).map_err(|e| Error::decode("ipinfo.io response", e))?;

    let (latitude, longitude) = parse_lat_lon(&result.loc)?;

    Ok(Location {
      latitude,
      longitude,
      address: format_address(result.city.as_deref(), result.region.as_deref()),
      city: result.city,
      country: result.country.clone(),
      country_code: result.country,
      timezone: result.timezone,
      ..Default::default()
    })
  }
}

impl Default for IpInfo {
  fn default() -> Self {
    Self::with_endpoint(IP_INFO_ENDPOINT)
  }
}

impl GeoProvider for IpInfo {
  fn name(&self) -> &str {
    "ipinfo.io"
  }

  fn locate<'a>(
    &'a self,
    http: &'a RetryingClient,
    deadline: Deadline,
  ) -> BoxFuture<'a, Result<Location>> {
    Box::pin(async move {
      let body = http.get(self.name(), &self.endpoint, deadline).await?;
      Self::parse(&body)
    })
  }
}

/// Parse a "lat,lon" string.
fn parse_lat_lon(loc: &str) -> Result<(f64, f64)> {
  let invalid = || Error::InvalidParams(format!("invalid location format: {:?}", loc));

  let (lat, lon) = loc.split_once(',').ok_or_else(invalid)?;
  let lat = lat.trim().parse::<f64>().map_err(|_| invalid())?;
  let lon = lon.trim().parse::<f64>().map_err(|_| invalid())?;
  Ok((lat, lon))
}

// ============================================================================
// ipapi.co
// ============================================================================

#[derive(Debug, Deserialize)]
struct IpApiCoResponse {
  #[serde(default)]
  city: Option<String>,
  #[serde(default)]
  country_name: Option<String>,
  #[serde(default)]
  country_code: Option<String>,
  #[serde(default)]
  latitude: f64,
  #[serde(default)]
  longitude: f64,
  #[serde(default)]
  timezone: Option<String>,
  #[serde(default)]
  error: bool,
  #[serde(default)]
  reason: Option<String>,
}

pub struct IpApiCo {
  endpoint: String,
}

impl IpApiCo {
  pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
    Self {
      endpoint: endpoint.into(),
    }
  }

  fn parse(body: &[u8]) -> Result<Location> {
    let result: IpApiCoResponse =
      serde_json::from_slice(body).map_err(|e| Error::decode("ipapi.co response", e))?;

    if result.error {
      return Err(Error::Api {
        code: 0,
        status: format!(
          "ipapi.co error: {}",
          result.reason.as_deref().unwrap_or("unknown")
        ),
      });
    }

    Ok(Location {
      latitude: result.latitude,
      longitude: result.longitude,
      address: format_address(result.city.as_deref(), result.country_name.as_deref()),
      city: result.city,
      country: result.country_name,
      country_code: result.country_code,
      timezone: result.timezone,
      ..Default::default()
    })
  }
}

impl Default for IpApiCo {
  fn default() -> Self {
    Self::with_endpoint(IP_API_CO_ENDPOINT)
  }
}

impl GeoProvider for IpApiCo {
  fn name(&self) -> &str {
    "ipapi.co"
  }

  fn locate<'a>(
    &'a self,
    http: &'a RetryingClient,
    deadline: Deadline,
  ) -> BoxFuture<'a, Result<Location>> {
    Box::pin(async move {
      let body = http.get(self.name(), &self.endpoint, deadline).await?;
      Self::parse(&body)
    })
  }
}
