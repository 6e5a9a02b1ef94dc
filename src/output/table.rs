use crossterm::style::Color;

use super::utils::{center, format_minutes, truncate, Painter};
use super::view::{PrayerStatus, PrayerView};

/// Inner width of the table box
const WIDTH: usize = 50;

const NAME_COL: usize = 10;
const TIME_COL: usize = 9;

fn rule(left: char, right: char) -> String {
  format!("{}{}{}", left, "─".repeat(WIDTH), right)
}

/// A boxed line. `plain_len` is the visible width of `painted`.
fn boxed(painted: &str, plain_len: usize) -> String {
  format!("│{}{}│", painted, " ".repeat(WIDTH.saturating_sub(plain_len)))
}

fn boxed_plain(text: &str) -> String {
  let text = truncate(text, WIDTH);
  boxed(&text, text.chars().count())
}

pub(super) fn emoji(name: &str) -> &'static str {
  match name {
    "Fajr" => "🌅",
    "Sunrise" => "🌄",
    "Dhuhr" => "☀️",
    "Asr" => "🌤️",
    "Maghrib" => "🌆",
    "Isha" => "🌙",
    _ => "🌃",
  }
}

fn until_next(view: &PrayerView) -> String {
  format_minutes(view.next_prayer.as_ref().map_or(0, |next| next.minutes_until))
}

pub fn render_table(view: &PrayerView, painter: Painter) -> String {
  let mut lines = vec![String::new(), rule('┌', '┐')];

  lines.push(boxed_plain(&center(&view.title(), WIDTH)));
  lines.push(boxed_plain(&center(&view.date, WIDTH)));
  if let Some(hijri) = view.hijri_line() {
    lines.push(boxed_plain(&center(&hijri, WIDTH)));
  }

  lines.push(rule('├', '┤'));
  let header = format!(" {:<NAME_COL$}{:<TIME_COL$}{}", "Prayer", "Time", "Status");
  lines.push(boxed(&painter.bold(&header), header.chars().count()));

  for prayer in &view.prayers {
    let name = format!(" {:<NAME_COL$}", prayer.name);
    let time = format!("{:<TIME_COL$}", prayer.time);
    let line = match prayer.status {
      PrayerStatus::Passed => {
        let status = "✓ Passed";
        let plain = name.chars().count() + time.chars().count() + status.chars().count();
        boxed(&format!("{}{}{}", name, time, painter.dim(status)), plain)
      }
      PrayerStatus::Next => {
        let status = format!("▶ Next (in {})", until_next(view));
        let plain = name.chars().count() + time.chars().count() + status.chars().count();
        boxed(
          &format!(
            "{}{}{}",
            painter.color(&name, Color::Cyan),
            painter.color(&time, Color::Green),
            painter.color(&status, Color::Yellow)
          ),
          plain,
        )
      }
      PrayerStatus::Upcoming | PrayerStatus::Unknown => {
        let plain = format!("{}{}", name, time);
        boxed(&plain, plain.chars().count())
      }
    };
    lines.push(line);
  }

  lines.push(rule('├', '┤'));
  if let Some(qibla) = &view.qibla {
    lines.push(boxed_plain(&format!(
      " Qibla: {:.1}° ({})",
      qibla.direction, qibla.compass
    )));
  }
  lines.push(boxed_plain(&format!(" Method: {}", view.method)));
  lines.push(rule('└', '┘'));

  lines.join("\n")
}

pub fn render_pretty(view: &PrayerView, painter: Painter) -> String {
  let mut header = format!("📅 {}", view.date);
  if let Some(hijri) = view.hijri_line() {
    header.push_str(&format!(" | {}", hijri));
  }

  let mut lines = vec![
    String::new(),
    format!("🕌 {}", painter.bold(&view.title().replacen(" - ", " for ", 1))),
    header,
    String::new(),
  ];

  for prayer in &view.prayers {
    let display = format!("{} {:<8}  {}", emoji(prayer.name), prayer.name, prayer.time);
    let line = match prayer.status {
      PrayerStatus::Passed => format!("{}  {}", display, painter.dim("✓ Passed")),
      PrayerStatus::Next => format!(
        "{}  {}",
        painter.color(&display, Color::Cyan),
        painter.color(&format!("▶ Next prayer in {}", until_next(view)), Color::Yellow)
      ),
      PrayerStatus::Upcoming | PrayerStatus::Unknown => display,
    };
    lines.push(line);
  }

  if let Some(qibla) = &view.qibla {
    lines.push(String::new());
    lines.push(format!(
      "🧭 Qibla Direction: {} ({:.1}°)",
      painter.color(qibla.compass, Color::Green),
      qibla.direction
    ));
  }

  lines.push(String::new());
  lines.push(painter.dim(&format!("Method: {}", view.method)));

  lines.join("\n")
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::HijriDisplay;
  use crate::output::view::tests::iso_response;
  use chrono::{TimeZone, Utc};

  fn view() -> PrayerView {
    let now = Utc.with_ymd_and_hms(2024, 3, 15, 10, 0, 0).unwrap();
    PrayerView::build(&iso_response(), "Cairo", HijriDisplay::Desc, Some(now)).with_qibla(Some(136.14))
  }

  #[test]
  fn test_table_lines_are_aligned() {
    let output = render_table(&view(), Painter::new(false));
    let widths: Vec<usize> = output
      .lines()
      .skip(1)
      .map(|line| line.chars().count())
      .collect();
    assert!(widths.iter().all(|w| *w == WIDTH + 2), "{:?}", widths);
  }

  #[test]
  fn test_table_content() {
    let output = render_table(&view(), Painter::new(false));
    assert!(output.contains("Prayer Times - Cairo"));
    assert!(output.contains("5 Ramaḍān 1445 AH"));
    assert!(output.contains(" Fajr      04:32    ✓ Passed"));
    assert!(output.contains(" Asr       15:07    ▶ Next (in 3h 7m)"));
    assert!(output.contains(" Qibla: 136.1° (SE)"));
    assert!(output.contains(" Method: Egyptian General Authority of Survey"));
  }

  #[test]
  fn test_table_without_qibla() {
    let view = view().with_qibla(None);
    let output = render_table(&view, Painter::new(false));
    assert!(!output.contains("Qibla"));
  }

  #[test]
  fn test_pretty_content() {
    let output = render_pretty(&view(), Painter::new(false));
    assert!(output.contains("🕌 Prayer Times for Cairo"));
    assert!(output.contains("📅 15 Mar 2024 | 5 Ramaḍān 1445 AH"));
    assert!(output.contains("▶ Next prayer in 3h 7m"));
    assert!(output.contains("🧭 Qibla Direction: SE (136.1°)"));
  }
}
