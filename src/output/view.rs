//! Render-ready model of one day of prayer times.

use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;

use super::utils::{clean_time, compass_point, parse_instant};
use crate::api::PrayerTimesResponse;
use crate::config::HijriDisplay;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PrayerStatus {
  Passed,
  Next,
  Upcoming,
  /// No absolute time available to compare against
  Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrayerEntry {
  pub name: &'static str,
  /// "HH:MM" in the location's local time
  pub time: String,
  pub status: PrayerStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NextPrayer {
  pub name: &'static str,
  pub time: String,
  pub minutes_until: i64,
  #[serde(skip)]
  pub at: DateTime<FixedOffset>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HijriView {
  pub day: String,
  pub month: String,
  pub month_ar: Option<String>,
  pub month_number: u32,
  pub year: String,
}

impl HijriView {
  pub fn label(&self) -> String {
    format!("{} {} {} AH", self.day, self.month, self.year)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QiblaView {
  pub direction: f64,
  pub compass: &'static str,
}

impl QiblaView {
  pub fn new(direction: f64) -> Self {
    Self {
      direction,
      compass: compass_point(direction),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrayerView {
  pub location: String,
  pub latitude: f64,
  pub longitude: f64,
  pub timezone: String,
  pub method_id: i32,
  pub method: String,
  pub date: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub hijri: Option<HijriView>,
  #[serde(skip)]
  pub hijri_display: HijriDisplay,
  pub prayers: Vec<PrayerEntry>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub next_prayer: Option<NextPrayer>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub qibla: Option<QiblaView>,
  #[serde(skip)]
  pub generated_at: DateTime<Utc>,
}

impl PrayerView {
  /// Build the view for `response`.
  ///
  /// Statuses are only computed when `now` is given and the timings carry
  /// absolute ISO 8601 instants; otherwise every entry is `Unknown`.
  pub fn build(
    response: &PrayerTimesResponse,
    location: impl Into<String>,
    hijri_display: HijriDisplay,
    now: Option<DateTime<Utc>>,
  ) -> Self {
    let day = &response.data;

    let schedule = day.timings.schedule();
    // Midnight is listed but never counted as the next prayer
    let next_index = now.and_then(|now| {
      schedule
        .iter()
        .take(schedule.len() - 1)
        .position(|(_, time)| parse_instant(time).is_some_and(|at| at > now))
    });

    let prayers = schedule
      .iter()
      .enumerate()
      .map(|(index, &(name, time))| {
        let status = match (now, parse_instant(time)) {
          (Some(_), Some(_)) if Some(index) == next_index => PrayerStatus::Next,
          (Some(now), Some(at)) if at <= now => PrayerStatus::Passed,
          (Some(_), Some(_)) => PrayerStatus::Upcoming,
          _ => PrayerStatus::Unknown,
        };
        PrayerEntry {
          name,
          time: clean_time(time).to_string(),
          status,
        }
      })
      .collect();

    let next_prayer = match (now, next_index) {
      (Some(now), Some(index)) => {
        let (name, time) = schedule[index];
        parse_instant(time).map(|at| NextPrayer {
          name,
          time: clean_time(time).to_string(),
          minutes_until: (at.with_timezone(&Utc) - now).num_minutes(),
          at,
        })
      }
      _ => None,
    };

    let hijri = (hijri_display != HijriDisplay::None).then(|| HijriView {
      day: day.date.hijri.day.clone(),
      month: day.date.hijri.month.en.clone(),
      month_ar: day.date.hijri.month.ar.clone(),
      month_number: day.date.hijri.month.number,
      year: day.date.hijri.year.clone(),
    });

    Self {
      location: location.into(),
      latitude: day.meta.latitude,
      longitude: day.meta.longitude,
      timezone: day.meta.timezone.clone(),
      method_id: day.meta.method.id,
      method: day.meta.method.name.clone(),
      date: day.date.readable.clone(),
      hijri,
      hijri_display,
      prayers,
      next_prayer,
      qibla: None,
      generated_at: now.unwrap_or_else(Utc::now),
    }
  }

  pub fn with_qibla(mut self, direction: Option<f64>) -> Self {
    self.qibla = direction.map(QiblaView::new);
    self
  }

  /// Title line, with the Hijri date appended when it goes in the title.
  pub fn title(&self) -> String {
    let base = format!("Prayer Times - {}", self.location);
    match (&self.hijri, self.hijri_display) {
      (Some(hijri), HijriDisplay::Title | HijriDisplay::Both) => {
        format!("{} ({})", base, hijri.label())
      }
      _ => base,
    }
  }

  /// Hijri line for the body, when it goes in the description.
  pub fn hijri_line(&self) -> Option<String> {
    match (&self.hijri, self.hijri_display) {
      (Some(hijri), HijriDisplay::Desc | HijriDisplay::Both) => Some(hijri.label()),
      _ => None,
    }
  }
}
