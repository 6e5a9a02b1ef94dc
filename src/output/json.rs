use color_eyre::{eyre::eyre, Result};
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use super::view::{HijriView, PrayerEntry, PrayerView, QiblaView};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Output<'a> {
  date: DateOutput<'a>,
  location: LocationOutput<'a>,
  #[serde(skip_serializing_if = "Option::is_none")]
  method: Option<MethodOutput<'a>>,
  timings: TimingsOutput<'a>,
  #[serde(skip_serializing_if = "Option::is_none")]
  next_prayer: Option<NextOutput<'a>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  qibla: Option<&'a QiblaView>,
  #[serde(skip_serializing_if = "Option::is_none")]
  server_time: Option<String>,
}

#[derive(Serialize)]
struct DateOutput<'a> {
  gregorian: &'a str,
  #[serde(skip_serializing_if = "Option::is_none")]
  hijri: Option<HijriOutput<'a>>,
}

#[derive(Serialize)]
struct HijriOutput<'a> {
  day: &'a str,
  month: MonthOutput<'a>,
  year: &'a str,
}

#[derive(Serialize)]
struct MonthOutput<'a> {
  number: u32,
  en: &'a str,
  #[serde(skip_serializing_if = "Option::is_none")]
  ar: Option<&'a str>,
}

#[derive(Serialize)]
struct LocationOutput<'a> {
  latitude: f64,
  longitude: f64,
  timezone: &'a str,
  #[serde(skip_serializing_if = "str::is_empty")]
  address: &'a str,
}

#[derive(Serialize)]
struct MethodOutput<'a> {
  id: i32,
  name: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NextOutput<'a> {
  name: &'a str,
  time: &'a str,
  #[serde(skip_serializing_if = "Option::is_none")]
  iso: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  timestamp: Option<i64>,
  minutes_until: i64,
}

/// Prayer name to time, in day order.
struct TimingsOutput<'a>(&'a [PrayerEntry]);

impl Serialize for TimingsOutput<'_> {
  fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(self.0.len()))?;
    for prayer in self.0 {
      map.serialize_entry(prayer.name, &prayer.time)?;
    }
    map.end()
  }
}

fn hijri_output(hijri: &HijriView) -> HijriOutput<'_> {
  HijriOutput {
    day: &hijri.day,
    month: MonthOutput {
      number: hijri.month_number,
      en: &hijri.month,
      ar: hijri.month_ar.as_deref(),
    },
    year: &hijri.year,
  }
}

fn base(view: &PrayerView) -> Output<'_> {
  Output {
    date: DateOutput {
      gregorian: &view.date,
      hijri: view.hijri.as_ref().map(hijri_output),
    },
    location: LocationOutput {
      latitude: view.latitude,
      longitude: view.longitude,
      timezone: &view.timezone,
      address: &view.location,
    },
    method: None,
    timings: TimingsOutput(&view.prayers),
    next_prayer: None,
    qibla: view.qibla.as_ref(),
    server_time: None,
  }
}

fn to_pretty_json(output: &Output<'_>) -> Result<String> {
  serde_json::to_string_pretty(output).map_err(|e| eyre!("Failed to encode JSON output: {}", e))
}

pub fn render_json(view: &PrayerView) -> Result<String> {
  let mut output = base(view);
  output.method = Some(MethodOutput {
    id: view.method_id,
    name: &view.method,
  });
  output.next_prayer = view.next_prayer.as_ref().map(|next| NextOutput {
    name: next.name,
    time: &next.time,
    iso: None,
    timestamp: None,
    minutes_until: next.minutes_until,
  });
  to_pretty_json(&output)
}

/// Like the JSON output, with absolute next-prayer instants and the
/// generation time for consumers on other clocks.
pub fn render_webhook(view: &PrayerView) -> Result<String> {
  let mut output = base(view);
  output.next_prayer = view.next_prayer.as_ref().map(|next| NextOutput {
    name: next.name,
    time: &next.time,
    iso: Some(next.at.to_rfc3339()),
    timestamp: Some(next.at.timestamp()),
    minutes_until: next.minutes_until,
  });
  output.server_time = Some(
    view
      .generated_at
      .to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
  );
  to_pretty_json(&output)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::HijriDisplay;
  use crate::output::view::tests::iso_response;
  use chrono::{TimeZone, Utc};
  use serde_json::Value;

  fn view(hijri: HijriDisplay) -> PrayerView {
    let now = Utc.with_ymd_and_hms(2024, 3, 15, 10, 0, 0).unwrap();
    PrayerView::build(&iso_response(), "Cairo, Egypt", hijri, Some(now)).with_qibla(Some(136.14))
  }

  #[test]
  fn test_json_shape() {
    let json: Value = serde_json::from_str(&render_json(&view(HijriDisplay::Desc)).unwrap()).unwrap();

    assert_eq!(json["date"]["gregorian"], "15 Mar 2024");
    assert_eq!(json["date"]["hijri"]["month"]["number"], 9);
    assert_eq!(json["location"]["address"], "Cairo, Egypt");
    assert_eq!(json["location"]["timezone"], "Africa/Cairo");
    assert_eq!(json["method"]["id"], 5);
    assert_eq!(json["timings"]["Fajr"], "04:32");
    assert_eq!(json["timings"]["Midnight"], "23:58");
    assert_eq!(json["nextPrayer"]["name"], "Asr");
    assert_eq!(json["nextPrayer"]["minutesUntil"], 187);
    assert!(json["nextPrayer"].get("iso").is_none());
    assert_eq!(json["qibla"]["compass"], "SE");
    assert!(json.get("serverTime").is_none());
  }

  #[test]
  fn test_timings_keep_day_order() {
    let output = render_json(&view(HijriDisplay::Desc)).unwrap();
    let fajr = output.find("\"Fajr\"").unwrap();
    let isha = output.find("\"Isha\"").unwrap();
    assert!(fajr < isha);
  }

  #[test]
  fn test_hijri_omitted_when_disabled() {
    let json: Value = serde_json::from_str(&render_json(&view(HijriDisplay::None)).unwrap()).unwrap();
    assert!(json["date"].get("hijri").is_none());
  }

  #[test]
  fn test_webhook_adds_instants() {
    let json: Value = serde_json::from_str(&render_webhook(&view(HijriDisplay::Desc)).unwrap()).unwrap();
    assert_eq!(json["nextPrayer"]["iso"], "2024-03-15T15:07:00+02:00");
    assert_eq!(json["nextPrayer"]["timestamp"], 1710508020);
    assert_eq!(json["serverTime"], "2024-03-15T10:00:00Z");
    assert!(json.get("method").is_none());
  }
}
