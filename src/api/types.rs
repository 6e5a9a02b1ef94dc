//! Serde types matching prayer API responses.
//!
//! Everything here round-trips through the response cache, so every type is
//! both `Serialize` and `Deserialize` and only keeps fields we display.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The `{code, status, data}` envelope every endpoint answers with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
  pub code: u16,
  #[serde(default)]
  pub status: String,
  pub data: T,
}

/// Status-only view of the envelope, decoded before trusting `data`.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiEnvelope {
  pub code: u16,
  #[serde(default)]
  pub status: String,
}

pub type PrayerTimesResponse = ApiResponse<DayData>;
pub type QiblaResponse = ApiResponse<QiblaData>;

/// One day of timings with its dates and calculation metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayData {
  pub timings: Timings,
  #[serde(default)]
  pub date: DateInfo,
  #[serde(default)]
  pub meta: Meta,
}

// ============================================================================
// Timings
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Timings {
  #[serde(default)]
  pub fajr: String,
  #[serde(default)]
  pub sunrise: String,
  #[serde(default)]
  pub dhuhr: String,
  #[serde(default)]
  pub asr: String,
  #[serde(default)]
  pub sunset: String,
  #[serde(default)]
  pub maghrib: String,
  #[serde(default)]
  pub isha: String,
  #[serde(default)]
  pub imsak: String,
  #[serde(default)]
  pub midnight: String,
  #[serde(default, rename = "Firstthird")]
  pub first_third: String,
  #[serde(default, rename = "Lastthird")]
  pub last_third: String,
}

impl Timings {
  /// The five daily prayers plus sunrise, in chronological order.
  pub fn prayers(&self) -> [(&'static str, &str); 6] {
    [
      ("Fajr", self.fajr.as_str()),
      ("Sunrise", self.sunrise.as_str()),
      ("Dhuhr", self.dhuhr.as_str()),
      ("Asr", self.asr.as_str()),
      ("Maghrib", self.maghrib.as_str()),
      ("Isha", self.isha.as_str()),
    ]
  }

  /// [`Timings::prayers`] followed by midnight, for full-day listings.
  pub fn schedule(&self) -> [(&'static str, &str); 7] {
    let [fajr, sunrise, dhuhr, asr, maghrib, isha] = self.prayers();
    [
      fajr,
      sunrise,
      dhuhr,
      asr,
      maghrib,
      isha,
      ("Midnight", self.midnight.as_str()),
    ]
  }
}

// ============================================================================
// Dates
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DateInfo {
  #[serde(default)]
  pub readable: String,
  #[serde(default)]
  pub timestamp: String,
  #[serde(default)]
  pub gregorian: CalendarDate,
  #[serde(default)]
  pub hijri: CalendarDate,
}

/// A Gregorian or Hijri date as the API spells it out
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CalendarDate {
  /// DD-MM-YYYY
  #[serde(default)]
  pub date: String,
  #[serde(default)]
  pub day: String,
  #[serde(default)]
  pub weekday: LocalizedName,
  #[serde(default)]
  pub month: MonthInfo,
  #[serde(default)]
  pub year: String,
  #[serde(default)]
  pub designation: Designation,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub holidays: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocalizedName {
  #[serde(default)]
  pub en: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub ar: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MonthInfo {
  #[serde(default)]
  pub number: u32,
  #[serde(default)]
  pub en: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub ar: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Designation {
  #[serde(default)]
  pub abbreviated: String,
  #[serde(default)]
  pub expanded: String,
}

// ============================================================================
// Calculation metadata
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
  #[serde(default)]
  pub latitude: f64,
  #[serde(default)]
  pub longitude: f64,
  #[serde(default)]
  pub timezone: String,
  #[serde(default)]
  pub method: MethodInfo,
  #[serde(default)]
  pub latitude_adjustment_method: String,
  #[serde(default)]
  pub midnight_mode: String,
  #[serde(default)]
  pub school: String,
  /// Per-prayer minute offsets
  #[serde(default)]
  pub offset: Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MethodInfo {
  #[serde(default)]
  pub id: i32,
  #[serde(default)]
  pub name: String,
  /// Angles are numbers or strings like "90 min" depending on the method
  #[serde(default)]
  pub params: Value,
}

// ============================================================================
// Qibla
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct QiblaData {
  pub latitude: f64,
  pub longitude: f64,
  /// Degrees clockwise from true north
  pub direction: f64,
}

#[cfg(test)]
pub(crate) mod fixtures {
  /// A `/timings` response body as the API returns it.
  pub const TIMINGS_BODY: &str = r#"{
    "code": 200,
    "status": "OK",
    "data": {
      "timings": {
        "Fajr": "04:32", "Sunrise": "06:03", "Dhuhr": "11:58", "Asr": "15:07",
        "Sunset": "17:53", "Maghrib": "17:53", "Isha": "19:11", "Imsak": "04:22",
        "Midnight": "23:58", "Firstthird": "21:56", "Lastthird": "02:00"
      },
      "date": {
        "readable": "15 Mar 2024",
        "timestamp": "1710482400",
        "gregorian": {
          "date": "15-03-2024", "format": "DD-MM-YYYY", "day": "15",
          "weekday": {"en": "Friday"}, "month": {"number": 3, "en": "March"},
          "year": "2024", "designation": {"abbreviated": "AD", "expanded": "Anno Domini"}
        },
        "hijri": {
          "date": "05-09-1445", "format": "DD-MM-YYYY", "day": "5",
          "weekday": {"en": "Al Juma'a", "ar": "الجمعة"},
          "month": {"number": 9, "en": "Ramaḍān", "ar": "رَمَضان"},
          "year": "1445", "designation": {"abbreviated": "AH", "expanded": "Anno Hegirae"},
          "holidays": []
        }
      },
      "meta": {
        "latitude": 30.0444, "longitude": 31.2357, "timezone": "Africa/Cairo",
        "method": {"id": 5, "name": "Egyptian General Authority of Survey", "params": {"Fajr": 19.5, "Isha": 17.5}},
        "latitudeAdjustmentMethod": "ANGLE_BASED", "midnightMode": "STANDARD", "school": "STANDARD",
        "offset": {"Imsak": 0, "Fajr": 0, "Sunrise": 0, "Dhuhr": 0}
      }
    }
  }"#;

  pub const QIBLA_BODY: &str =
    r#"{"code":200,"status":"OK","data":{"latitude":30.0444,"longitude":31.2357,"direction":136.14}}"#;
}

#[cfg(test)]
mod tests {
  use super::fixtures::*;
  use super::*;

  #[test]
  fn test_decode_timings_response() {
    let response: PrayerTimesResponse = serde_json::from_str(TIMINGS_BODY).unwrap();
    assert_eq!(response.code, 200);
    assert_eq!(response.data.timings.fajr, "04:32");
    assert_eq!(response.data.timings.last_third, "02:00");
    assert_eq!(response.data.date.hijri.month.number, 9);
    assert_eq!(response.data.meta.method.id, 5);
    assert_eq!(response.data.meta.timezone, "Africa/Cairo");
  }

  #[test]
  fn test_cached_form_decodes_to_the_same_value() {
    let response: PrayerTimesResponse = serde_json::from_str(TIMINGS_BODY).unwrap();
    let cached = serde_json::to_vec(&response).unwrap();
    let decoded: PrayerTimesResponse = serde_json::from_slice(&cached).unwrap();
    assert_eq!(decoded, response);
  }

  #[test]
  fn test_prayers_are_in_day_order() {
    let response: PrayerTimesResponse = serde_json::from_str(TIMINGS_BODY).unwrap();
    let names: Vec<&str> = response
      .data
      .timings
      .schedule()
      .iter()
      .map(|(name, _)| *name)
      .collect();
    assert_eq!(
      names,
      ["Fajr", "Sunrise", "Dhuhr", "Asr", "Maghrib", "Isha", "Midnight"]
    );
  }

  #[test]
  fn test_decode_qibla() {
    let response: QiblaResponse = serde_json::from_str(QIBLA_BODY).unwrap();
    assert_eq!(response.data.direction, 136.14);
  }
}
