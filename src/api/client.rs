use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use super::cache::{fixed, QIBLA_PRECISION};
use super::params::{CalendarParams, PrayerTimesParams};
use super::types::{ApiEnvelope, ApiResponse, PrayerTimesResponse, QiblaResponse};
use crate::error::{Error, Result};
use crate::http::{Deadline, HttpRequest, RetryingClient};

/// Default prayer times API
pub const DEFAULT_BASE_URL: &str = "https://api.aladhan.com/v1";

/// Host of the ICS subscription feed
pub const ICS_BASE_URL: &str = "https://pray.ahmedelywa.com";

/// Prayer times API client
#[derive(Clone)]
pub struct PrayerClient {
  http: RetryingClient,
  base_url: String,
  ics_base_url: String,
}

impl PrayerClient {
  pub fn new(http: RetryingClient) -> Self {
    Self {
      http,
      base_url: DEFAULT_BASE_URL.to_string(),
      ics_base_url: ICS_BASE_URL.to_string(),
    }
  }

  pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
    self.base_url = base_url.into().trim_end_matches('/').to_string();
    self
  }

  #[cfg(test)]
  pub fn with_ics_base_url(mut self, base_url: impl Into<String>) -> Self {
    self.ics_base_url = base_url.into();
    self
  }

  pub fn ics_base_url(&self) -> &str {
    &self.ics_base_url
  }

  /// Get prayer times for a single day at the given coordinates.
  pub async fn get_prayer_times(
    &self,
    params: &PrayerTimesParams,
    deadline: Deadline,
  ) -> Result<PrayerTimesResponse> {
    let params = PrayerTimesParams {
      address: None,
      ..params.clone()
    };
    params.validate()?;

    let mut url = self.url(&format!("timings/{}", params.date_string()))?;
    params.apply_query(&mut url);
    self.get_json("prayer times", url, deadline).await
  }

  /// Get prayer times for a single day, letting the server geocode the address.
  pub async fn get_prayer_times_by_address(
    &self,
    params: &PrayerTimesParams,
    deadline: Deadline,
  ) -> Result<PrayerTimesResponse> {
    if params.address.as_deref().map_or(true, |a| a.trim().is_empty()) {
      return Err(Error::InvalidParams("address is required".to_string()));
    }
    params.validate()?;

    let mut url = self.url(&format!("timingsByAddress/{}", params.date_string()))?;
    params.apply_query(&mut url);
    self.get_json("prayer times by address", url, deadline).await
  }

  /// Get the Qibla bearing from the given coordinates.
  pub async fn get_qibla(
    &self,
    latitude: f64,
    longitude: f64,
    deadline: Deadline,
  ) -> Result<QiblaResponse> {
    crate::location::Location::from_coordinates(latitude, longitude).validate()?;

    let url = self.url(&format!(
      "qibla/{}/{}",
      fixed(latitude, QIBLA_PRECISION),
      fixed(longitude, QIBLA_PRECISION)
    ))?;
    self.get_json("qibla", url, deadline).await
  }

  /// Download the ICS feed described by `params`.
  pub async fn download_ics(&self, params: &CalendarParams, deadline: Deadline) -> Result<Vec<u8>> {
    params.validate()?;

    let url = params.ics_url(&self.ics_base_url)?;
    let request = HttpRequest::get(url).header("Accept", "text/calendar,application/ics");
    self.http.execute("calendar download", &request, deadline).await
  }

  fn url(&self, path: &str) -> Result<Url> {
    Url::parse(&format!("{}/{}", self.base_url, path))
      .map_err(|e| Error::InvalidParams(format!("invalid API URL {:?}: {}", self.base_url, e)))
  }

  /// GET `url` and decode the `{code, status, data}` envelope.
  ///
  /// A 2xx body whose `code` is not 200 is an application error and is
  /// returned without retrying.
  async fn get_json<T: DeserializeOwned>(
    &self,
    endpoint: &str,
    url: Url,
    deadline: Deadline,
  ) -> Result<ApiResponse<T>> {
    debug!(endpoint, url = %url, "requesting");
    let body = self.http.get(endpoint, url.as_str(), deadline).await?;

    let envelope: ApiEnvelope =
      serde_json::from_slice(&body).map_err(|e| Error::decode(format!("{} response", endpoint), e))?;
    if envelope.code != 200 {
      return Err(Error::Api {
        code: envelope.code,
        status: envelope.status,
      });
    }

    serde_json::from_slice(&body).map_err(|e| Error::decode(format!("{} response", endpoint), e))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::types::fixtures::{QIBLA_BODY, TIMINGS_BODY};
  use crate::http::mock::{MockReply, MockTransport};
  use crate::http::RetryConfig;
  use chrono::NaiveDate;
  use std::sync::Arc;

  const BASE: &str = "https://api.example.test/v1";

  fn client(transport: &Arc<MockTransport>) -> PrayerClient {
    let http = RetryingClient::with_transport(transport.clone(), RetryConfig::default());
    PrayerClient::new(http)
      .with_base_url(BASE)
      .with_ics_base_url("https://ics.example.test")
  }

  fn params() -> PrayerTimesParams {
    PrayerTimesParams::default()
      .with_coordinates(30.0444, 31.2357)
      .with_date(NaiveDate::from_ymd_opt(2024, 3, 15).unwrap())
  }

  #[tokio::test(start_paused = true)]
  async fn test_get_prayer_times() {
    let transport =
      Arc::new(MockTransport::new().route(&format!("{BASE}/timings/"), MockReply::ok(TIMINGS_BODY)));

    let response = client(&transport)
      .get_prayer_times(&params(), Deadline::none())
      .await
      .unwrap();

    assert_eq!(response.data.timings.dhuhr, "11:58");
    assert_eq!(
      transport.calls(),
      [format!(
        "{BASE}/timings/15-03-2024?latitude=30.044400&longitude=31.235700&method=5"
      )]
    );
  }

  #[tokio::test(start_paused = true)]
  async fn test_application_error_is_not_retried() {
    let transport = Arc::new(MockTransport::new().route(
      &format!("{BASE}/timingsByAddress/"),
      MockReply::ok(r#"{"code":400,"status":"Unable to geocode address.","data":"Bad Request"}"#),
    ));

    let err = client(&transport)
      .get_prayer_times_by_address(&params().with_address("nowhere at all"), Deadline::none())
      .await
      .unwrap_err();

    assert!(matches!(err, Error::Api { code: 400, .. }));
    assert_eq!(
      err.to_string(),
      "API error: Unable to geocode address. (code: 400)"
    );
    assert_eq!(transport.calls().len(), 1);
  }

  #[tokio::test(start_paused = true)]
  async fn test_address_is_required() {
    let transport = Arc::new(MockTransport::new());
    let err = client(&transport)
      .get_prayer_times_by_address(&params(), Deadline::none())
      .await
      .unwrap_err();
    assert!(matches!(err, Error::InvalidParams(_)));
    assert!(transport.calls().is_empty());
  }

  #[tokio::test(start_paused = true)]
  async fn test_invalid_coordinates_are_rejected_before_sending() {
    let transport = Arc::new(MockTransport::new());
    let err = client(&transport)
      .get_qibla(0.0, 0.0, Deadline::none())
      .await
      .unwrap_err();
    assert!(matches!(err, Error::InvalidParams(_)));
    assert!(transport.calls().is_empty());
  }

  #[tokio::test(start_paused = true)]
  async fn test_get_qibla() {
    let transport =
      Arc::new(MockTransport::new().route(&format!("{BASE}/qibla/"), MockReply::ok(QIBLA_BODY)));
    let response = client(&transport)
      .get_qibla(30.0444, 31.2357, Deadline::none())
      .await
      .unwrap();
    assert_eq!(response.data.direction, 136.14);
    assert_eq!(transport.calls(), [format!("{BASE}/qibla/30.0444/31.2357")]);
  }

  #[tokio::test(start_paused = true)]
  async fn test_download_ics() {
    let transport = Arc::new(MockTransport::new().route(
      "https://ics.example.test/api/prayer-times.ics",
      MockReply::ok("BEGIN:VCALENDAR\r\nEND:VCALENDAR\r\n"),
    ));
    let calendar = CalendarParams {
      latitude: 30.0444,
      longitude: 31.2357,
      ..Default::default()
    };

    let bytes = client(&transport)
      .download_ics(&calendar, Deadline::none())
      .await
      .unwrap();
    assert!(bytes.starts_with(b"BEGIN:VCALENDAR"));
  }

  #[tokio::test(start_paused = true)]
  async fn test_garbage_body_is_a_decode_error() {
    let transport =
      Arc::new(MockTransport::new().route(&format!("{BASE}/qibla/"), MockReply::ok("<html>")));
    let err = client(&transport)
      .get_qibla(30.0444, 31.2357, Deadline::none())
      .await
      .unwrap_err();
    assert!(matches!(err, Error::Decode { .. }));
  }
}
