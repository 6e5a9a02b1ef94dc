//! Rendering of prayer times for terminals and chat webhooks.

mod chat;
mod countdown;
mod json;
mod table;
mod utils;
mod view;

use std::fmt;

use clap::ValueEnum;
use color_eyre::Result;
use serde::{Deserialize, Serialize};

pub use countdown::{location_offset, CountdownFrame};
pub use utils::{clean_time, format_diff, format_minutes_long, parse_clock, truncate, Painter};
pub use view::{PrayerView, QiblaView};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Format {
  /// Boxed table with status column
  #[default]
  Table,
  /// Coloured list with emoji
  Pretty,
  Json,
  /// Slack Block Kit message
  Slack,
  /// Discord embed message
  Discord,
  /// Detailed JSON payload for generic webhooks
  Webhook,
}

impl Format {
  pub fn as_str(&self) -> &'static str {
    match self {
      Format::Table => "table",
      Format::Pretty => "pretty",
      Format::Json => "json",
      Format::Slack => "slack",
      Format::Discord => "discord",
      Format::Webhook => "webhook",
    }
  }

  /// Whether the output is meant for machines rather than a terminal.
  pub fn is_structured(&self) -> bool {
    !matches!(self, Format::Table | Format::Pretty)
  }

  pub fn render(&self, view: &PrayerView, painter: Painter) -> Result<String> {
    match self {
      Format::Table => Ok(table::render_table(view, painter)),
      Format::Pretty => Ok(table::render_pretty(view, painter)),
      Format::Json => json::render_json(view),
      Format::Slack => chat::render_slack(view),
      Format::Discord => chat::render_discord(view),
      Format::Webhook => json::render_webhook(view),
    }
  }
}

impl fmt::Display for Format {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}
