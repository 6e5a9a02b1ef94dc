use chrono::{DateTime, FixedOffset, NaiveTime};
use crossterm::style::{Attribute, Color, Stylize};

/// Strip timezone decorations from an API time.
///
/// "05:23 (EET)" and "2024-03-15T05:23:00+02:00" both become "05:23".
pub fn clean_time(time: &str) -> &str {
  let time = time.trim();
  // "YYYY-MM-DDTHH:MM..." is the only shape where the clock follows a 'T'
  if parse_instant(time).is_some() {
    if let Some(clock) = time.get(11..16) {
      return clock;
    }
  }
  time
    .split(|c: char| c == ' ' || c == '(')
    .next()
    .unwrap_or(time)
}

/// The absolute instant of an ISO 8601 timing, when the API sent one.
pub fn parse_instant(time: &str) -> Option<DateTime<FixedOffset>> {
  DateTime::parse_from_rfc3339(time.trim()).ok()
}

/// Wall-clock time of day from either API spelling.
pub fn parse_clock(time: &str) -> Option<NaiveTime> {
  NaiveTime::parse_from_str(clean_time(time), "%H:%M").ok()
}

/// "45 min", "2h", "2h 5m"
pub fn format_minutes(minutes: i64) -> String {
  if minutes < 60 {
    return format!("{} min", minutes);
  }
  let (hours, rest) = (minutes / 60, minutes % 60);
  if rest == 0 {
    format!("{}h", hours)
  } else {
    format!("{}h {}m", hours, rest)
  }
}

/// "1 minute", "2 hours 5 minutes"
pub fn format_minutes_long(minutes: i64) -> String {
  fn unit(n: i64, word: &str) -> String {
    if n == 1 {
      format!("1 {}", word)
    } else {
      format!("{} {}s", n, word)
    }
  }

  if minutes < 0 {
    return "passed".to_string();
  }
  if minutes < 60 {
    return unit(minutes, "minute");
  }
  let (hours, rest) = (minutes / 60, minutes % 60);
  if rest == 0 {
    unit(hours, "hour")
  } else {
    format!("{} {}", unit(hours, "hour"), unit(rest, "minute"))
  }
}

/// Signed difference such as "+1h 5m", "-12m" or "same".
pub fn format_diff(minutes: i64) -> String {
  if minutes == 0 {
    return "same".to_string();
  }
  let sign = if minutes > 0 { '+' } else { '-' };
  let minutes = minutes.abs();
  let (hours, rest) = (minutes / 60, minutes % 60);
  match (hours, rest) {
    (0, m) => format!("{}{}m", sign, m),
    (h, 0) => format!("{}{}h", sign, h),
    (h, m) => format!("{}{}h {}m", sign, h, m),
  }
}

/// 16-point compass name for a bearing in degrees.
pub fn compass_point(degrees: f64) -> &'static str {
  const POINTS: [&str; 16] = [
    "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW", "NW",
    "NNW",
  ];
  let normalized = degrees.rem_euclid(360.0);
  let index = ((normalized + 11.25) / 22.5) as usize % POINTS.len();
  POINTS[index]
}

/// Truncate a string to a maximum number of characters, adding "..." if truncated
pub fn truncate(s: &str, max_len: usize) -> String {
  if s.chars().count() <= max_len {
    s.to_string()
  } else {
    let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", kept)
  }
}

/// Centre `text` in `width` columns.
pub fn center(text: &str, width: usize) -> String {
  let text = truncate(text, width);
  let len = text.chars().count();
  let left = (width - len) / 2;
  format!("{}{}{}", " ".repeat(left), text, " ".repeat(width - len - left))
}

/// Terminal styling that collapses to plain text when colour is off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Painter {
  pub enabled: bool,
}

impl Painter {
  pub fn new(enabled: bool) -> Self {
    Self { enabled }
  }

  pub fn color(&self, text: &str, color: Color) -> String {
    if self.enabled {
      text.with(color).to_string()
    } else {
      text.to_string()
    }
  }

  pub fn dim(&self, text: &str) -> String {
    if self.enabled {
      text.attribute(Attribute::Dim).to_string()
    } else {
      text.to_string()
    }
  }

  pub fn bold(&self, text: &str) -> String {
    if self.enabled {
      text.bold().to_string()
    } else {
      text.to_string()
    }
  }
}
