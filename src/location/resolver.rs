//! Ordered multi-provider IP geolocation.

use chrono::Utc;
use std::time::Duration;
use tracing::{debug, warn};

use super::providers::{default_providers, GeoProvider};
use super::types::{Location, LocationSource};
use crate::error::{Error, Result};
use crate::http::{Deadline, RetryConfig, RetryingClient};

/// Budget for a whole detection run.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Upper bound for any single provider.
pub const DEFAULT_PROVIDER_TIMEOUT: Duration = Duration::from_secs(5);

/// Tries providers in order until one returns a usable location.
pub struct Resolver {
  http: RetryingClient,
  providers: Vec<Box<dyn GeoProvider>>,
  timeout: Duration,
  provider_timeout: Duration,
}

impl Resolver {
  /// Create a resolver over the default provider chain.
  ///
  /// Providers are fallbacks for one another, so each gets a single attempt.
  pub fn new(http: &RetryingClient) -> Self {
    let http = http.with_config(
      RetryConfig::default()
        .with_max_retries(0)
        .with_timeout(DEFAULT_PROVIDER_TIMEOUT),
    );
    Self::with_providers(http, default_providers())
  }

  pub fn with_providers(http: RetryingClient, providers: Vec<Box<dyn GeoProvider>>) -> Self {
    Self {
      http,
      providers,
      timeout: DEFAULT_TIMEOUT,
      provider_timeout: DEFAULT_PROVIDER_TIMEOUT,
    }
  }

  #[cfg(test)]
  pub fn with_timeout(mut self, timeout: Duration) -> Self {
    self.timeout = timeout;
    self
  }

  /// Detect the current location within the resolver's own timeout.
  pub async fn resolve(&self) -> Result<Location> {
    self.resolve_within(Deadline::after(self.timeout)).await
  }

  /// Detect the current location, giving up when `deadline` fires.
  ///
  /// A provider error and a structurally invalid location are treated alike:
  /// both move on to the next provider. Providers after the first valid
  /// answer are never contacted.
  pub async fn resolve_within(&self, deadline: Deadline) -> Result<Location> {
    let mut failures = Vec::with_capacity(self.providers.len());

    for (index, provider) in self.providers.iter().enumerate() {
      let name = provider.name().to_string();

      if deadline.has_expired() {
        failures.push((name, "deadline exceeded".to_string()));
        continue;
      }

      // Split what is left evenly among the providers not yet tried
      let providers_left = (self.providers.len() - index) as u32;
      let share = deadline
        .remaining()
        .map(|left| left / providers_left)
        .unwrap_or(self.provider_timeout);
      let sub_deadline = deadline.child(self.provider_timeout.min(share));

      debug!(provider = %name, "detecting location");
      match provider.locate(&self.http, sub_deadline).await {
        Ok(location) if location.is_valid() => {
          debug!(
            provider = %name,
            lat = location.latitude,
            lon = location.longitude,
            "location detected"
          );
          return Ok(Location {
            source: LocationSource::Ip,
            detected_at: Some(Utc::now()),
            ..location
          });
        }
        Ok(location) => {
          warn!(
            provider = %name,
            lat = location.latitude,
            lon = location.longitude,
            "provider returned invalid coordinates"
          );
          failures.push((
            name,
            format!(
              "invalid coordinates: lat={}, lon={}",
              location.latitude, location.longitude
            ),
          ));
        }
        Err(e) => {
          warn!(provider = %name, error = %e, "location provider failed");
          failures.push((name, e.to_string()));
        }
      }
    }

    Err(Error::AllProvidersFailed { failures })
  }
}
