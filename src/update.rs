//! Release checks against the GitHub releases API.

use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::http::{Deadline, HttpRequest, RetryConfig, RetryingClient};

pub const RELEASES_URL: &str = "https://api.github.com/repos/anashaat/pray-cli/releases/latest";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Deserialize)]
struct Release {
  tag_name: String,
  #[serde(default)]
  html_url: String,
  #[serde(default)]
  body: String,
  #[serde(default)]
  prerelease: bool,
  #[serde(default)]
  draft: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckResult {
  pub current: String,
  /// Empty when the latest release was a draft or prerelease
  pub latest: String,
  pub url: String,
  pub notes: String,
  pub update_available: bool,
}

impl CheckResult {
  /// Notice for stderr, or `None` when already up to date.
  pub fn message(&self) -> Option<String> {
    self.update_available.then(|| {
      format!(
        "📦 A new version of pray is available: {} → {}\n   Or visit: {}",
        self.current, self.latest, self.url
      )
    })
  }
}

pub struct Checker {
  http: RetryingClient,
  current: String,
  url: String,
  timeout: Duration,
}

impl Checker {
  /// A single attempt with a short timeout; update checks never retry.
  pub fn new(http: &RetryingClient, current: impl Into<String>) -> Self {
    Self {
      http: http.with_config(
        RetryConfig::default()
          .with_max_retries(0)
          .with_timeout(DEFAULT_TIMEOUT),
      ),
      current: current.into(),
      url: RELEASES_URL.to_string(),
      timeout: DEFAULT_TIMEOUT,
    }
  }

  #[cfg(test)]
  pub fn with_url(mut self, url: impl Into<String>) -> Self {
    self.url = url.into();
    self
  }

  pub fn with_timeout(mut self, timeout: Duration) -> Self {
    self.timeout = timeout;
    self
  }

  pub async fn check(&self) -> Result<CheckResult> {
    let request = HttpRequest::get(&self.url).header("Accept", "application/vnd.github.v3+json");
    let body = self
      .http
      .execute("release check", &request, Deadline::after(self.timeout))
      .await?;
    let release: Release =
      serde_json::from_slice(&body).map_err(|e| Error::decode("release info", e))?;

    if release.draft || release.prerelease {
      debug!(tag = %release.tag_name, "ignoring unpublished release");
      return Ok(CheckResult {
        current: self.current.clone(),
        latest: String::new(),
        url: String::new(),
        notes: String::new(),
        update_available: false,
      });
    }

    Ok(CheckResult {
      update_available: is_newer(&self.current, &release.tag_name),
      current: self.current.clone(),
      latest: release.tag_name,
      url: release.html_url,
      notes: crate::output::truncate(&release.body, 500),
    })
  }
}

fn normalize(version: &str) -> &str {
  let version = version.trim();
  version.strip_prefix('v').unwrap_or(version)
}

/// Major, minor and patch; pre-release suffixes and junk count as zero.
fn parse_version(version: &str) -> [u64; 3] {
  let core = normalize(version).split('-').next().unwrap_or_default();
  let mut parts = [0; 3];
  for (slot, part) in parts.iter_mut().zip(core.split('.')) {
    let digits: String = part.chars().take_while(|c| c.is_ascii_digit()).collect();
    *slot = digits.parse().unwrap_or(0);
  }
  parts
}

/// Whether `latest` is strictly newer than `current`. Development builds
/// never ask to be updated.
pub fn is_newer(current: &str, latest: &str) -> bool {
  let current = normalize(current);
  if current.is_empty() || current == "dev" {
    return false;
  }
  parse_version(latest) > parse_version(current)
}
