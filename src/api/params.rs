//! Request parameters for the prayer API and the ICS calendar service.

use chrono::{Local, NaiveDate};
use url::Url;

use crate::error::{Error, Result};
use crate::location::Location;

pub const DEFAULT_METHOD: u8 = 5;
pub const MAX_METHOD: u8 = 23;

/// Parameters for a single day of prayer times.
#[derive(Debug, Clone, PartialEq)]
pub struct PrayerTimesParams {
  pub latitude: f64,
  pub longitude: f64,
  /// When set, the server geocodes this instead of using coordinates
  pub address: Option<String>,
  pub date: NaiveDate,
  /// Calculation method (0-23)
  pub method: u8,
  /// Juristic school for Asr: 0 = Shafi, 1 = Hanafi
  pub school: u8,
  /// IANA timezone override (e.g., "Africa/Cairo")
  pub timezone: Option<String>,
  /// Hijri day adjustment (-30 to 30)
  pub adjustment: i32,
  /// Ask for ISO 8601 timestamps instead of "HH:MM"
  pub iso8601: bool,
}

impl Default for PrayerTimesParams {
  fn default() -> Self {
    Self {
      latitude: 0.0,
      longitude: 0.0,
      address: None,
      date: Local::now().date_naive(),
      method: DEFAULT_METHOD,
      school: 0,
      timezone: None,
      adjustment: 0,
      iso8601: false,
    }
  }
}

impl PrayerTimesParams {
  /// Parameters for `location`: its address when it has one, else its coordinates.
  pub fn for_location(location: &Location) -> Self {
    let params = Self::default().with_timezone(location.timezone.clone());
    if location.has_address() && !location.is_valid() {
      params.with_address(location.address.clone().unwrap_or_default())
    } else {
      params.with_coordinates(location.latitude, location.longitude)
    }
  }

  pub fn with_coordinates(mut self, latitude: f64, longitude: f64) -> Self {
    self.latitude = latitude;
    self.longitude = longitude;
    self.address = None;
    self
  }

  pub fn with_address(mut self, address: impl Into<String>) -> Self {
    self.address = Some(address.into());
    self
  }

  pub fn with_date(mut self, date: NaiveDate) -> Self {
    self.date = date;
    self
  }

  pub fn with_method(mut self, method: u8) -> Self {
    self.method = method;
    self
  }

  pub fn with_school(mut self, school: u8) -> Self {
    self.school = school;
    self
  }

  pub fn with_timezone(mut self, timezone: Option<String>) -> Self {
    self.timezone = timezone.filter(|tz| !tz.is_empty());
    self
  }

  pub fn with_iso8601(mut self, iso8601: bool) -> Self {
    self.iso8601 = iso8601;
    self
  }

  /// The date as the API wants it in the path: DD-MM-YYYY
  pub fn date_string(&self) -> String {
    self.date.format("%d-%m-%Y").to_string()
  }

  pub fn validate(&self) -> Result<()> {
    if self.address.is_none() {
      Location::from_coordinates(self.latitude, self.longitude).validate()?;
    } else if self.address.as_deref().is_some_and(|a| a.trim().is_empty()) {
      return Err(Error::InvalidParams("address is required".to_string()));
    }
    validate_method(self.method)?;
    if self.school > 1 {
      return Err(Error::InvalidParams(format!(
        "school must be 0 (Shafi) or 1 (Hanafi), got {}",
        self.school
      )));
    }
    if !(-30..=30).contains(&self.adjustment) {
      return Err(Error::InvalidParams(format!(
        "adjustment must be between -30 and 30, got {}",
        self.adjustment
      )));
    }
    Ok(())
  }

  /// Append the query parameters shared by the timings endpoints.
  pub fn apply_query(&self, url: &mut Url) {
    let mut query = url.query_pairs_mut();
    if let Some(address) = &self.address {
      query.append_pair("address", address);
    } else {
      query.append_pair("latitude", &format!("{:.6}", self.latitude));
      query.append_pair("longitude", &format!("{:.6}", self.longitude));
    }
    query.append_pair("method", &self.method.to_string());
    if self.school > 0 {
      query.append_pair("school", &self.school.to_string());
    }
    if let Some(timezone) = &self.timezone {
      query.append_pair("timezonestring", timezone);
    }
    if self.adjustment != 0 {
      query.append_pair("adjustment", &self.adjustment.to_string());
    }
    if self.iso8601 {
      query.append_pair("iso8601", "true");
    }
  }
}

pub(crate) fn validate_method(method: u8) -> Result<()> {
  if method > MAX_METHOD {
    return Err(Error::InvalidParams(format!(
      "method must be between 0 and {}, got {}",
      MAX_METHOD, method
    )));
  }
  Ok(())
}

/// Parameters for the ICS subscription feed.
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarParams {
  pub latitude: f64,
  pub longitude: f64,
  pub address: Option<String>,

  pub method: u8,

  /// Event duration in minutes
  pub duration: u32,
  /// How many months the feed covers
  pub months: u32,
  /// Comma-separated reminder offsets in minutes
  pub alarm: String,
  /// "all" or comma-separated prayer indices
  pub events: String,

  pub language: String,
  pub color: String,
  /// Hijri date placement: "title", "desc" or "none"
  pub hijri: String,

  pub jumuah: bool,
  pub jumuah_duration: u32,
  pub qibla: bool,
  pub dua: bool,
  pub traveler: bool,
  pub ramadan: bool,
  pub iftar_duration: u32,
  pub taraweeh_duration: u32,
  pub suhoor_duration: u32,
  pub hijri_holidays: bool,
  pub iqama: Option<String>,
}

impl Default for CalendarParams {
  fn default() -> Self {
    Self {
      latitude: 0.0,
      longitude: 0.0,
      address: None,
      method: DEFAULT_METHOD,
      duration: 25,
      months: 3,
      alarm: "5,10,15".to_string(),
      events: "all".to_string(),
      language: "en".to_string(),
      color: "#1e90ff".to_string(),
      hijri: "desc".to_string(),
      jumuah: false,
      jumuah_duration: 0,
      qibla: false,
      dua: false,
      traveler: false,
      ramadan: false,
      iftar_duration: 0,
      taraweeh_duration: 0,
      suhoor_duration: 0,
      hijri_holidays: false,
      iqama: None,
    }
  }
}

impl CalendarParams {
  pub fn for_location(location: &Location) -> Self {
    let mut params = Self::default();
    if location.has_address() && !location.is_valid() {
      params.address = location.address.clone();
    } else {
      params.latitude = location.latitude;
      params.longitude = location.longitude;
    }
    params
  }

  pub fn validate(&self) -> Result<()> {
    match &self.address {
      Some(address) if address.trim().is_empty() => {
        return Err(Error::InvalidParams("address is required".to_string()));
      }
      Some(_) => {}
      None => Location::from_coordinates(self.latitude, self.longitude).validate()?,
    }
    validate_method(self.method)?;
    check_range("duration", i64::from(self.duration), 1, 120)?;
    check_range("months", i64::from(self.months), 1, 12)?;
    Ok(())
  }

  /// Subscription URL for the ICS feed at `base`.
  pub fn ics_url(&self, base: &str) -> Result<String> {
    let mut url = Url::parse(&format!("{}/api/prayer-times.ics", base.trim_end_matches('/')))
      .map_err(|e| Error::InvalidParams(format!("invalid calendar URL {:?}: {}", base, e)))?;

    {
      let mut query = url.query_pairs_mut();
      if let Some(address) = &self.address {
        query.append_pair("address", address);
      } else {
        query.append_pair("latitude", &format!("{:.6}", self.latitude));
        query.append_pair("longitude", &format!("{:.6}", self.longitude));
      }
      query.append_pair("method", &self.method.to_string());

      let counts = [
        ("duration", self.duration),
        ("months", self.months),
        ("jumuahDuration", self.jumuah_duration),
        ("iftarDuration", self.iftar_duration),
        ("taraweehDuration", self.taraweeh_duration),
        ("suhoorDuration", self.suhoor_duration),
      ];
      for (name, value) in counts {
        if value > 0 {
          query.append_pair(name, &value.to_string());
        }
      }

      let texts = [
        ("alarm", self.alarm.as_str()),
        ("events", self.events.as_str()),
        ("lang", self.language.as_str()),
        ("color", self.color.as_str()),
        ("hijri", self.hijri.as_str()),
        ("iqama", self.iqama.as_deref().unwrap_or("")),
      ];
      for (name, value) in texts {
        if !value.is_empty() {
          query.append_pair(name, value);
        }
      }

      let flags = [
        ("jumuah", self.jumuah),
        ("qibla", self.qibla),
        ("dua", self.dua),
        ("traveler", self.traveler),
        ("ramadan", self.ramadan),
        ("hijriHolidays", self.hijri_holidays),
      ];
      for (name, enabled) in flags {
        if enabled {
          query.append_pair(name, "true");
        }
      }
    }

    Ok(url.into())
  }
}

fn check_range(name: &str, value: i64, min: i64, max: i64) -> Result<()> {
  if (min..=max).contains(&value) {
    Ok(())
  } else {
    Err(Error::InvalidParams(format!(
      "{} must be between {} and {}, got {}",
      name, min, max, value
    )))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn cairo() -> PrayerTimesParams {
    PrayerTimesParams::default()
      .with_coordinates(30.0444, 31.2357)
      .with_date(NaiveDate::from_ymd_opt(2024, 3, 5).unwrap())
  }

  fn query_of(params: &PrayerTimesParams) -> String {
    let mut url = Url::parse("https://api.example.test/v1/timings/05-03-2024").unwrap();
    params.apply_query(&mut url);
    url.query().unwrap_or_default().to_string()
  }

  #[test]
  fn test_date_string_is_day_first() {
    assert_eq!(cairo().date_string(), "05-03-2024");
  }

  #[test]
  fn test_query_defaults() {
    assert_eq!(
      query_of(&cairo()),
      "latitude=30.044400&longitude=31.235700&method=5"
    );
  }

  #[test]
  fn test_query_optional_parameters() {
    let mut params = cairo()
      .with_school(1)
      .with_timezone(Some("Africa/Cairo".to_string()))
      .with_iso8601(true);
    params.adjustment = -1;

    assert_eq!(
      query_of(&params),
      "latitude=30.044400&longitude=31.235700&method=5&school=1\
       &timezonestring=Africa%2FCairo&adjustment=-1&iso8601=true"
    );
  }

  #[test]
  fn test_query_address_replaces_coordinates() {
    let params = cairo().with_address("Cairo, Egypt");
    assert_eq!(query_of(&params), "address=Cairo%2C+Egypt&method=5");
  }

  #[test]
  fn test_validate_ranges() {
    assert!(cairo().validate().is_ok());
    assert!(cairo().with_method(23).validate().is_ok());
    assert!(cairo().with_method(24).validate().is_err());
    assert!(cairo().with_school(2).validate().is_err());
    assert!(cairo().with_coordinates(91.0, 0.0).validate().is_err());
    assert!(cairo().with_coordinates(0.0, 0.0).validate().is_err());
    assert!(cairo().with_address("  ").validate().is_err());

    let mut params = cairo();
    params.adjustment = 31;
    assert!(params.validate().is_err());
  }

  #[test]
  fn test_for_location_prefers_coordinates_when_valid() {
    let mut location = Location::from_coordinates(30.0444, 31.2357);
    location.address = Some("Cairo, Egypt".to_string());
    assert_eq!(PrayerTimesParams::for_location(&location).address, None);

    let address_only = Location::from_address("Mecca");
    assert_eq!(
      PrayerTimesParams::for_location(&address_only).address.as_deref(),
      Some("Mecca")
    );
  }

  #[test]
  fn test_calendar_validate_ranges() {
    let params = CalendarParams {
      latitude: 21.4225,
      longitude: 39.8262,
      ..Default::default()
    };
    assert!(params.validate().is_ok());
    assert!(CalendarParams { duration: 0, ..params.clone() }.validate().is_err());
    assert!(CalendarParams { duration: 121, ..params.clone() }.validate().is_err());
    assert!(CalendarParams { months: 0, ..params.clone() }.validate().is_err());
    assert!(CalendarParams { months: 13, ..params }.validate().is_err());
  }

  #[test]
  fn test_ics_url() {
    let params = CalendarParams {
      address: Some("Cairo, Egypt".to_string()),
      jumuah: true,
      jumuah_duration: 60,
      ..Default::default()
    };
    let url = params.ics_url("https://calendar.example.test/").unwrap();

    assert!(url.starts_with("https://calendar.example.test/api/prayer-times.ics?"));
    assert!(url.contains("address=Cairo%2C+Egypt"));
    assert!(url.contains("method=5"));
    assert!(url.contains("duration=25"));
    assert!(url.contains("months=3"));
    assert!(url.contains("alarm=5%2C10%2C15"));
    assert!(url.contains("color=%231e90ff"));
    assert!(url.contains("jumuah=true"));
    assert!(url.contains("jumuahDuration=60"));
    assert!(!url.contains("latitude"));
    assert!(!url.contains("ramadan"));
  }
}
