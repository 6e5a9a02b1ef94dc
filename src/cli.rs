//! Command-line surface.

use std::path::PathBuf;

use chrono::{Datelike, Days, NaiveDate, Weekday};
use clap::{Args, Parser, Subcommand};
use color_eyre::{eyre::eyre, Result};
use url::Url;

use crate::config::HijriDisplay;
use crate::output::Format;

#[derive(Parser, Debug)]
#[command(name = "pray")]
#[command(about = "🕌 Islamic prayer times from the command line")]
#[command(version)]
pub struct Cli {
  #[command(flatten)]
  pub global: GlobalArgs,

  #[command(subcommand)]
  pub command: Option<Command>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
  /// Path to config file (default: $XDG_CONFIG_HOME/pray/config.yaml)
  #[arg(long, global = true)]
  pub config: Option<PathBuf>,

  /// Show debug logs and where each response came from
  #[arg(short, long, global = true)]
  pub verbose: bool,

  /// Errors only; skips the update notice and confirmations
  #[arg(short, long, global = true)]
  pub quiet: bool,

  #[arg(short, long, value_enum, global = true)]
  pub output: Option<Format>,

  /// Write rendered output to a file instead of stdout
  #[arg(short = 'f', long = "file", global = true)]
  pub output_file: Option<PathBuf>,

  /// POST the rendered output to this URL (json, webhook, slack or discord)
  #[arg(long, global = true, value_parser = parse_webhook_url)]
  pub webhook_url: Option<Url>,

  /// City or address, e.g. "Cairo, Egypt"
  #[arg(short, long, global = true)]
  pub address: Option<String>,

  #[arg(long, global = true, allow_negative_numbers = true, requires = "lon")]
  pub lat: Option<f64>,

  #[arg(long, global = true, allow_negative_numbers = true, requires = "lat")]
  pub lon: Option<f64>,

  /// Detect the location from the public IP address
  #[arg(short = 'A', long, global = true)]
  pub auto: bool,

  /// Calculation method id (see `pray methods`)
  #[arg(short, long, global = true)]
  pub method: Option<u8>,

  /// Asr juristic school: 0 standard, 1 Hanafi
  #[arg(long, global = true)]
  pub school: Option<u8>,

  /// Language for calendar events: en or ar
  #[arg(short = 'l', long = "lang", global = true)]
  pub language: Option<String>,

  /// Include the Qibla direction
  #[arg(long, global = true)]
  pub qibla: bool,

  /// Where to show the Hijri date
  #[arg(long, value_enum, global = true)]
  pub hijri: Option<HijriDisplay>,

  /// Fetch fresh data, ignoring and not updating the cache
  #[arg(long, global = true)]
  pub no_cache: bool,

  #[arg(long, global = true)]
  pub no_color: bool,

  /// Save the given location and options as defaults
  #[arg(long, global = true)]
  pub save: bool,

  /// Write logs to this file instead of stderr
  #[arg(long, global = true)]
  pub log_file: Option<PathBuf>,
}

impl GlobalArgs {
  pub fn has_location(&self) -> bool {
    self.auto || self.address.is_some() || self.lat.is_some()
  }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
  /// Show today's prayer times (default)
  Today,

  /// Show prayer times for another date
  Get {
    /// today, tomorrow, yesterday, +N, -N, a weekday, YYYY-MM-DD,
    /// DD-MM-YYYY or MM/DD/YYYY
    #[arg(short, long, default_value = "today", allow_hyphen_values = true)]
    date: String,
  },

  /// Show the next prayer and the time left until it
  Next,

  /// Live countdown to the next prayer, updated every second
  Countdown,

  /// Compare today's prayer times between two places
  Diff { first: String, second: String },

  /// Show the Qibla direction
  Qibla,

  /// List the calculation methods
  Methods {
    /// Match by id, name or description
    #[arg(long)]
    filter: Option<String>,
  },

  /// Download an ICS calendar of prayer times
  Calendar(CalendarArgs),

  /// Inspect or clear cached responses
  Cache {
    #[command(subcommand)]
    command: CacheCommand,
  },

  /// Inspect configuration or detect a location
  Config {
    #[command(subcommand)]
    command: ConfigCommand,
  },

  /// Show version information
  Version,
}

#[derive(Args, Debug, Clone, Default)]
pub struct CalendarArgs {
  /// Output path (default: prayer-times-<location>.ics)
  #[arg(long = "output-file")]
  pub ics_file: Option<PathBuf>,

  /// Months to generate, 1-12
  #[arg(long)]
  pub months: Option<u32>,

  /// Event duration in minutes
  #[arg(short, long)]
  pub duration: Option<u32>,

  /// Reminder offsets in minutes, e.g. "5,10,15"
  #[arg(long)]
  pub alarm: Option<String>,

  /// Calendar colour, e.g. "#1e90ff"
  #[arg(long)]
  pub color: Option<String>,

  /// "all" or comma-separated prayer indices
  #[arg(short, long)]
  pub events: Option<String>,

  /// Print the subscription URL instead of downloading
  #[arg(long)]
  pub url_only: bool,
}

#[derive(Subcommand, Debug, Clone, Copy)]
pub enum CacheCommand {
  /// Show cache status and size
  Show,
  /// Remove every cached response
  Clear,
  /// Print the cache directory
  Path,
  /// Remove expired and unreadable entries
  Clean,
}

#[derive(Subcommand, Debug, Clone, Copy)]
pub enum ConfigCommand {
  /// Print the effective configuration
  Show,
  /// Print the configuration file path
  Path,
  /// Check the configuration for invalid values
  Validate,
  /// Detect the location from the public IP address (with --save to keep it)
  Detect,
}

fn parse_webhook_url(input: &str) -> std::result::Result<Url, String> {
  let url = Url::parse(input).map_err(|e| format!("invalid URL: {}", e))?;
  match url.scheme() {
    "http" | "https" => Ok(url),
    other => Err(format!("unsupported scheme {:?}, expected http or https", other)),
  }
}

const WEEKDAYS: [(&str, Weekday); 7] = [
  ("monday", Weekday::Mon),
  ("tuesday", Weekday::Tue),
  ("wednesday", Weekday::Wed),
  ("thursday", Weekday::Thu),
  ("friday", Weekday::Fri),
  ("saturday", Weekday::Sat),
  ("sunday", Weekday::Sun),
];

/// Resolve a `--date` argument relative to `today`.
///
/// A weekday name means its next occurrence, never today.
pub fn parse_date(input: &str, today: NaiveDate) -> Result<NaiveDate> {
  let input = input.trim().to_lowercase();

  match input.as_str() {
    "today" => return Ok(today),
    "tomorrow" => return offset(today, 1),
    "yesterday" => return offset(today, -1),
    _ => {}
  }

  if input.starts_with('+') || input.starts_with('-') {
    if let Ok(days) = input.parse::<i64>() {
      return offset(today, days);
    }
  }

  if let Some((_, weekday)) = WEEKDAYS.iter().find(|(name, _)| *name == input) {
    let ahead = (weekday.num_days_from_monday() + 7 - today.weekday().num_days_from_monday()) % 7;
    let ahead = if ahead == 0 { 7 } else { ahead };
    return offset(today, i64::from(ahead));
  }

  ["%Y-%m-%d", "%d-%m-%Y", "%m/%d/%Y"]
    .iter()
    .find_map(|format| NaiveDate::parse_from_str(&input, format).ok())
    .ok_or_else(|| eyre!("Unrecognized date format: {}", input))
}

fn offset(date: NaiveDate, days: i64) -> Result<NaiveDate> {
  let shifted = if days >= 0 {
    date.checked_add_days(Days::new(days.unsigned_abs()))
  } else {
    date.checked_sub_days(Days::new(days.unsigned_abs()))
  };
  shifted.ok_or_else(|| eyre!("Date out of range: {} days from {}", days, date))
}
