//! Slack Block Kit and Discord embed payloads.

use color_eyre::{eyre::eyre, Result};
use serde_json::{json, Value};

use super::view::{PrayerStatus, PrayerView};

/// 0x1DA1F2
const DISCORD_COLOR: u32 = 1942002;

/// The five prayers plus sunrise; midnight stays out of chat messages.
fn chat_prayers(view: &PrayerView) -> impl Iterator<Item = (&'static str, String)> + '_ {
  view
    .prayers
    .iter()
    .filter(|prayer| prayer.name != "Midnight")
    .map(|prayer| {
      let value = if prayer.status == PrayerStatus::Next {
        format!("{} ▶️", prayer.time)
      } else {
        prayer.time.clone()
      };
      (prayer.name, value)
    })
}

fn encode(payload: &Value) -> Result<String> {
  serde_json::to_string_pretty(payload).map_err(|e| eyre!("Failed to encode message: {}", e))
}

pub fn render_slack(view: &PrayerView) -> Result<String> {
  let mut date = format!("📅 *{}*", view.date);
  if let Some(hijri) = view.hijri_line() {
    date.push_str(&format!(" | {}", hijri));
  }

  let fields: Vec<Value> = chat_prayers(view)
    .map(|(name, value)| json!({ "type": "mrkdwn", "text": format!("*{}:*\n{}", name, value) }))
    .collect();

  let mut context = vec![json!({ "type": "mrkdwn", "text": format!("Method: {}", view.method) })];
  if let Some(qibla) = &view.qibla {
    context.push(json!({
      "type": "mrkdwn",
      "text": format!("🧭 Qibla: {:.1}° ({})", qibla.direction, qibla.compass),
    }));
  }

  encode(&json!({
    "blocks": [
      {
        "type": "header",
        "text": { "type": "plain_text", "text": format!("🕌 {}", view.title()), "emoji": true },
      },
      { "type": "section", "text": { "type": "mrkdwn", "text": date } },
      { "type": "divider" },
      { "type": "section", "fields": fields },
      { "type": "context", "elements": context },
    ]
  }))
}

pub fn render_discord(view: &PrayerView) -> Result<String> {
  let mut description = format!("**{}**\n{}", view.location, view.date);
  if let Some(hijri) = view.hijri_line() {
    description.push_str(&format!("\n{}", hijri));
  }
  if let Some(qibla) = &view.qibla {
    description.push_str(&format!("\n🧭 Qibla: {:.1}° ({})", qibla.direction, qibla.compass));
  }

  let fields: Vec<Value> = chat_prayers(view)
    .map(|(name, value)| json!({ "name": name, "value": value, "inline": true }))
    .collect();

  encode(&json!({
    "embeds": [{
      "title": "🕌 Prayer Times",
      "description": description,
      "color": DISCORD_COLOR,
      "fields": fields,
      "footer": { "text": format!("Method: {}", view.method) },
      "timestamp": view.generated_at.to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
    }]
  }))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::HijriDisplay;
  use crate::output::view::tests::iso_response;
  use chrono::{TimeZone, Utc};

  fn view() -> PrayerView {
    let now = Utc.with_ymd_and_hms(2024, 3, 15, 10, 0, 0).unwrap();
    PrayerView::build(&iso_response(), "Cairo", HijriDisplay::Desc, Some(now))
  }

  #[test]
  fn test_slack_blocks() {
    let json: Value = serde_json::from_str(&render_slack(&view()).unwrap()).unwrap();
    let blocks = json["blocks"].as_array().unwrap();

    assert_eq!(blocks.len(), 5);
    assert_eq!(blocks[0]["text"]["text"], "🕌 Prayer Times - Cairo");
    assert_eq!(blocks[2]["type"], "divider");

    let fields = blocks[3]["fields"].as_array().unwrap();
    assert_eq!(fields.len(), 6);
    assert_eq!(fields[0]["text"], "*Fajr:*\n04:32");
    assert_eq!(fields[3]["text"], "*Asr:*\n15:07 ▶️");
    assert_eq!(
      blocks[4]["elements"][0]["text"],
      "Method: Egyptian General Authority of Survey"
    );
  }

  #[test]
  fn test_discord_embed() {
    let json: Value = serde_json::from_str(&render_discord(&view()).unwrap()).unwrap();
    let embed = &json["embeds"][0];

    assert_eq!(embed["color"], 1942002);
    assert_eq!(embed["description"], "**Cairo**\n15 Mar 2024\n5 Ramaḍān 1445 AH");
    assert_eq!(embed["fields"].as_array().unwrap().len(), 6);
    assert_eq!(embed["fields"][3]["value"], "15:07 ▶️");
    assert_eq!(embed["fields"][3]["inline"], true);
    assert_eq!(embed["footer"]["text"], "Method: Egyptian General Authority of Survey");
    assert_eq!(embed["timestamp"], "2024-03-15T10:00:00Z");
  }
}
