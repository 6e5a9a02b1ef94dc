use clap::ValueEnum;
use color_eyre::{eyre::eyre, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::api::{CacheTtls, CalendarParams, DEFAULT_BASE_URL, DEFAULT_METHOD, MAX_METHOD};
use crate::cache::ResponseCache;
use crate::http::RetryConfig;
use crate::location::Location;
use crate::output::Format;

const APP_DIR: &str = "pray";
const LOCAL_CONFIG: &str = "pray.yaml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
  pub location: Location,
  /// Calculation method (0-23)
  pub method: u8,
  /// Asr school: 0 = Shafi, 1 = Hanafi
  pub school: u8,
  /// "en" or "ar"
  pub language: String,
  pub output: OutputConfig,
  pub features: FeaturesConfig,
  pub calendar: CalendarConfig,
  pub jumuah: JumuahConfig,
  pub ramadan: RamadanConfig,
  pub iqama: IqamaConfig,
  pub cache: CacheConfig,
  pub api: ApiConfig,
  pub update_check: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
  pub format: Format,
  pub color: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum HijriDisplay {
  Title,
  #[default]
  Desc,
  Both,
  None,
}

impl HijriDisplay {
  pub fn as_str(&self) -> &'static str {
    match self {
      HijriDisplay::Title => "title",
      HijriDisplay::Desc => "desc",
      HijriDisplay::Both => "both",
      HijriDisplay::None => "none",
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeaturesConfig {
  /// Show the Qibla bearing alongside prayer times
  pub qibla: bool,
  pub dua: bool,
  pub hijri: HijriDisplay,
  pub hijri_holidays: bool,
  pub traveler_mode: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarConfig {
  /// Event duration in minutes
  pub duration: u32,
  pub months: u32,
  /// Comma-separated reminder offsets in minutes
  pub alarm: String,
  /// "all" or comma-separated prayer indices
  pub events: String,
  pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JumuahConfig {
  pub enabled: bool,
  pub duration: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RamadanConfig {
  pub enabled: bool,
  pub iftar_duration: u32,
  pub taraweeh_duration: u32,
  pub suhoor_duration: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IqamaConfig {
  pub enabled: bool,
  /// Minutes after each adhan, comma-separated
  pub offsets: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
  pub enabled: bool,
  /// Upper bound for cached daily timings
  pub ttl_hours: u64,
  pub qibla_ttl_days: u64,
  /// Defaults to $XDG_CACHE_HOME/pray
  #[serde(skip_serializing_if = "Option::is_none")]
  pub dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
  pub base_url: String,
  pub timeout_secs: u64,
  pub max_retries: u32,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      location: Location::default(),
      method: DEFAULT_METHOD,
      school: 0,
      language: "en".to_string(),
      output: OutputConfig::default(),
      features: FeaturesConfig::default(),
      calendar: CalendarConfig::default(),
      jumuah: JumuahConfig::default(),
      ramadan: RamadanConfig::default(),
      iqama: IqamaConfig::default(),
      cache: CacheConfig::default(),
      api: ApiConfig::default(),
      update_check: true,
    }
  }
}

impl Default for OutputConfig {
  fn default() -> Self {
    Self {
      format: Format::Table,
      color: true,
    }
  }
}

impl Default for FeaturesConfig {
  fn default() -> Self {
    Self {
      qibla: false,
      dua: false,
      hijri: HijriDisplay::Desc,
      hijri_holidays: false,
      traveler_mode: false,
    }
  }
}

impl Default for CalendarConfig {
  fn default() -> Self {
    let params = CalendarParams::default();
    Self {
      duration: params.duration,
      months: params.months,
      alarm: params.alarm,
      events: params.events,
      color: params.color,
    }
  }
}

impl Default for JumuahConfig {
  fn default() -> Self {
    Self {
      enabled: false,
      duration: 60,
    }
  }
}

impl Default for RamadanConfig {
  fn default() -> Self {
    Self {
      enabled: false,
      iftar_duration: 30,
      taraweeh_duration: 60,
      suhoor_duration: 30,
    }
  }
}

impl Default for IqamaConfig {
  fn default() -> Self {
    Self {
      enabled: false,
      offsets: "15,0,10,10,5,10,0".to_string(),
    }
  }
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      enabled: true,
      ttl_hours: 24,
      qibla_ttl_days: 365,
      dir: None,
    }
  }
}

impl Default for ApiConfig {
  fn default() -> Self {
    Self {
      base_url: DEFAULT_BASE_URL.to_string(),
      timeout_secs: 30,
      max_retries: 3,
    }
  }
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./pray.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/pray/config.yaml
  ///
  /// Without any file the defaults apply. `PRAY_*` environment variables
  /// override whatever was loaded.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    let mut config = match path {
      Some(p) => Self::load_from_path(&p)?,
      None => Config::default(),
    };
    config.apply_overrides(|name| std::env::var(name).ok())?;
    Ok(config)
  }

  /// Where `save` writes: the explicit path, an existing config file, or the
  /// default location under the user's config directory.
  pub fn path(explicit_path: Option<&Path>) -> Result<PathBuf> {
    if let Some(p) = explicit_path {
      return Ok(p.to_path_buf());
    }
    if let Some(found) = Self::find_config_file() {
      return Ok(found);
    }
    Self::default_path()
  }

  pub fn default_path() -> Result<PathBuf> {
    dirs::config_dir()
      .map(|dir| dir.join(APP_DIR).join("config.yaml"))
      .ok_or_else(|| eyre!("Could not determine the user config directory"))
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from(LOCAL_CONFIG);
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join(APP_DIR).join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    // An empty file is a valid, all-defaults config
    if contents.trim().is_empty() {
      return Ok(Config::default());
    }

    let config: Config = serde_yaml::from_str(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))?;

    Ok(config)
  }

  /// Apply `PRAY_METHOD`, `PRAY_CACHE_DIR` and `PRAY_NO_CACHE` from `lookup`.
  pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
    if let Some(method) = lookup("PRAY_METHOD").filter(|v| !v.is_empty()) {
      self.method = method
        .trim()
        .parse()
        .map_err(|_| eyre!("PRAY_METHOD must be a method number, got {:?}", method))?;
    }
    if let Some(dir) = lookup("PRAY_CACHE_DIR").filter(|v| !v.is_empty()) {
      self.cache.dir = Some(PathBuf::from(dir));
    }
    if let Some(flag) = lookup("PRAY_NO_CACHE") {
      if matches!(flag.trim(), "1" | "true" | "yes") {
        self.cache.enabled = false;
      }
    }
    Ok(())
  }

  /// Write the configuration as YAML, creating parent directories.
  pub fn save(&self, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
      std::fs::create_dir_all(dir)
        .map_err(|e| eyre!("Failed to create config directory {}: {}", dir.display(), e))?;
    }

    let contents =
      serde_yaml::to_string(self).map_err(|e| eyre!("Failed to serialize config: {}", e))?;

    std::fs::write(path, contents)
      .map_err(|e| eyre!("Failed to write config file {}: {}", path.display(), e))
  }

  /// Whether a location has been saved.
  pub fn is_configured(&self) -> bool {
    self.location.is_valid() || self.location.has_address()
  }

  pub fn validate(&self) -> Result<()> {
    if self.method > MAX_METHOD {
      return Err(eyre!(
        "method: invalid calculation method ID: {} (must be 0-{})",
        self.method,
        MAX_METHOD
      ));
    }
    if self.school > 1 {
      return Err(eyre!("school: must be 0 (Shafi) or 1 (Hanafi)"));
    }
    if !matches!(self.language.as_str(), "en" | "ar") {
      return Err(eyre!(
        "language: invalid language: {} (must be 'en' or 'ar')",
        self.language
      ));
    }
    if !(1..=120).contains(&self.calendar.duration) {
      return Err(eyre!("calendar.duration: must be between 1 and 120 minutes"));
    }
    if !(1..=12).contains(&self.calendar.months) {
      return Err(eyre!("calendar.months: must be between 1 and 12"));
    }
    if !(5..=120).contains(&self.api.timeout_secs) {
      return Err(eyre!("api.timeout_secs: must be between 5 and 120 seconds"));
    }
    if self.api.max_retries > 10 {
      return Err(eyre!("api.max_retries: must be at most 10"));
    }
    if self.cache.ttl_hours == 0 {
      return Err(eyre!("cache.ttl_hours: must be at least 1"));
    }
    let location = &self.location;
    if location.latitude != 0.0 || location.longitude != 0.0 {
      if !(-90.0..=90.0).contains(&location.latitude) {
        return Err(eyre!("location.latitude: must be between -90 and 90"));
      }
      if !(-180.0..=180.0).contains(&location.longitude) {
        return Err(eyre!("location.longitude: must be between -180 and 180"));
      }
    }
    Ok(())
  }

  pub fn retry_config(&self) -> RetryConfig {
    RetryConfig::default()
      .with_timeout(Duration::from_secs(self.api.timeout_secs))
      .with_max_retries(self.api.max_retries)
  }

  pub fn cache_ttls(&self) -> CacheTtls {
    CacheTtls {
      timings: Duration::from_secs(self.cache.ttl_hours.saturating_mul(60 * 60)),
      qibla: Duration::from_secs(self.cache.qibla_ttl_days.saturating_mul(24 * 60 * 60)),
    }
  }

  pub fn cache_dir(&self) -> Result<PathBuf> {
    match &self.cache.dir {
      Some(dir) => Ok(dir.clone()),
      None => ResponseCache::default_dir().map_err(|e| eyre!("{}", e)),
    }
  }

  /// Calendar parameters seeded from the saved preferences.
  pub fn calendar_params(&self) -> CalendarParams {
    CalendarParams {
      method: self.method,
      duration: self.calendar.duration,
      months: self.calendar.months,
      alarm: self.calendar.alarm.clone(),
      events: self.calendar.events.clone(),
      language: self.language.clone(),
      color: self.calendar.color.clone(),
      hijri: self.features.hijri.as_str().to_string(),
      jumuah: self.jumuah.enabled,
      jumuah_duration: if self.jumuah.enabled { self.jumuah.duration } else { 0 },
      qibla: self.features.qibla,
      dua: self.features.dua,
      traveler: self.features.traveler_mode,
      ramadan: self.ramadan.enabled,
      iftar_duration: if self.ramadan.enabled { self.ramadan.iftar_duration } else { 0 },
      taraweeh_duration: if self.ramadan.enabled { self.ramadan.taraweeh_duration } else { 0 },
      suhoor_duration: if self.ramadan.enabled { self.ramadan.suhoor_duration } else { 0 },
      hijri_holidays: self.features.hijri_holidays,
      iqama: self.iqama.enabled.then(|| self.iqama.offsets.clone()),
      ..CalendarParams::default()
    }
  }
}
