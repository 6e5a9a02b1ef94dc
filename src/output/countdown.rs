//! Frames for the live countdown to the next prayer.

use chrono::{DateTime, Duration, FixedOffset, Local, Utc};
use crossterm::style::Color;

use super::table::emoji;
use super::utils::{parse_instant, Painter};
use super::view::PrayerView;
use crate::api::PrayerTimesResponse;

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";

/// "HH : MM : SS", clamped at zero. Hours may exceed 24.
pub fn format_hms(remaining: Duration) -> String {
  let total = remaining.num_seconds().max(0);
  format!("{:02} : {:02} : {:02}", total / 3600, total % 3600 / 60, total % 60)
}

/// UTC offset of the place `response` describes, from its ISO 8601 timings.
/// Falls back to the local machine's offset for plain "HH:MM" timings.
pub fn location_offset(response: &PrayerTimesResponse) -> FixedOffset {
  parse_instant(&response.data.timings.fajr)
    .map(|at| *at.offset())
    .unwrap_or_else(|| *Local::now().offset())
}

/// Everything one countdown frame shows.
pub struct CountdownFrame<'a> {
  pub view: &'a PrayerView,
  pub now: DateTime<Utc>,
  pub offset: FixedOffset,
  pub method: &'a str,
  /// Shown once every prayer of the day has passed
  pub tomorrow_fajr: Option<&'a str>,
}

impl CountdownFrame<'_> {
  pub fn render(&self, p: Painter) -> String {
    let mut lines = vec![
      String::new(),
      format!("  ⏱️ {}", p.color("Prayer Time Countdown", Color::Cyan)),
      format!("  {}", RULE),
      String::new(),
    ];

    match &self.view.next_prayer {
      Some(next) => {
        let remaining = next.at.with_timezone(&Utc) - self.now;
        lines.push(format!(
          "  {} {}",
          emoji(next.name),
          p.color(&format!("Next Prayer: {}", next.name), Color::Cyan)
        ));
        lines.push(format!("  {}", p.color(&format!("Time: {}", next.time), Color::Green)));
        lines.push(String::new());
        lines.push(format!("      {}", p.color(&format_hms(remaining), Color::Yellow)));
        lines.push(format!("      {}", p.dim("hr   min   sec")));
      }
      None => {
        lines.push(format!(
          "  {}",
          p.color("🌙 All prayers for today have passed", Color::Yellow)
        ));
        if let Some(fajr) = self.tomorrow_fajr {
          lines.push(format!("  {}", p.dim(&format!("Tomorrow's Fajr: {}", fajr))));
        }
      }
    }

    let clock = self.now.with_timezone(&self.offset).format("%H:%M:%S").to_string();
    lines.extend([
      String::new(),
      format!("  {}", RULE),
      format!("  📍 {}", p.dim(&self.view.location)),
      format!("  ⚙️ {}", p.dim(self.method)),
      format!("  🕐 {}", p.dim(&clock)),
      String::new(),
      format!("  {}", p.dim("Press Ctrl+C to exit")),
    ]);
    lines.join("\n")
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::fixtures::TIMINGS_BODY;
  use crate::config::HijriDisplay;
  use crate::output::view::tests::iso_response;
  use chrono::TimeZone;

  const METHOD: &str = "Egyptian General Authority of Survey";

  fn render(now: DateTime<Utc>, tomorrow_fajr: Option<&str>) -> String {
    let response = iso_response();
    let view = PrayerView::build(&response, "Cairo", HijriDisplay::None, Some(now));
    CountdownFrame {
      view: &view,
      now,
      offset: location_offset(&response),
      method: METHOD,
      tomorrow_fajr,
    }
    .render(Painter::new(false))
  }

  #[test]
  fn test_format_hms() {
    assert_eq!(format_hms(Duration::seconds(2 * 3600 + 5 * 60 + 9)), "02 : 05 : 09");
    assert_eq!(format_hms(Duration::seconds(59)), "00 : 00 : 59");
    assert_eq!(format_hms(Duration::hours(30)), "30 : 00 : 00");
    assert_eq!(format_hms(Duration::seconds(-5)), "00 : 00 : 00");
  }

  #[test]
  fn test_location_offset() {
    assert_eq!(
      location_offset(&iso_response()),
      FixedOffset::east_opt(2 * 3600).unwrap()
    );

    let plain: PrayerTimesResponse = serde_json::from_str(TIMINGS_BODY).unwrap();
    assert_eq!(location_offset(&plain), *Local::now().offset());
  }

  #[test]
  fn test_frame_counts_down_to_next_prayer() {
    // 12:52:30 in Cairo; Asr is at 15:07
    let now = Utc.with_ymd_and_hms(2024, 3, 15, 10, 52, 30).unwrap();
    let frame = render(now, None);

    assert!(frame.contains("🌤️ Next Prayer: Asr"));
    assert!(frame.contains("Time: 15:07"));
    assert!(frame.contains("      02 : 14 : 30"));
    assert!(frame.contains("📍 Cairo"));
    assert!(frame.contains(&format!("⚙️ {}", METHOD)));
    assert!(frame.contains("🕐 12:52:30"));
    assert!(frame.ends_with("Press Ctrl+C to exit"));
  }

  #[test]
  fn test_frame_after_isha_points_to_tomorrow() {
    let now = Utc.with_ymd_and_hms(2024, 3, 15, 20, 0, 0).unwrap();

    let frame = render(now, Some("04:31"));
    assert!(frame.contains("🌙 All prayers for today have passed"));
    assert!(frame.contains("Tomorrow's Fajr: 04:31"));
    assert!(!frame.contains("Next Prayer"));

    assert!(!render(now, None).contains("Tomorrow's Fajr"));
  }
}
