use std::io::{IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{Days, Local, NaiveDate, Utc};
use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::execute;
use crossterm::style::Color;
use crossterm::terminal::{Clear, ClearType};
use serde_json::json;
use tracing::{debug, info, warn};
use url::Url;

use crate::api::{CachedPrayerClient, CalendarParams, PrayerClient, PrayerTimesParams, PrayerTimesResponse};
use crate::cache::{CacheSource, ResponseCache};
use crate::cli::{self, CacheCommand, CalendarArgs, Command, ConfigCommand, GlobalArgs};
use crate::config::{Config, HijriDisplay};
use crate::http::{Deadline, HttpRequest, RetryingClient};
use crate::location::{Location, Resolver};
use crate::methods;
use crate::output::{
  clean_time, format_diff, format_minutes_long, location_offset, parse_clock, truncate, CountdownFrame,
  Format, Painter, PrayerView, QiblaView,
};
use crate::update::Checker;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Upper bound on how long the release check may delay exit
const UPDATE_CHECK_TIMEOUT: Duration = Duration::from_secs(3);

const CALENDAR_TIMEOUT: Duration = Duration::from_secs(60);

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";

/// One command invocation: effective configuration plus the clients it needs
pub struct App {
  config: Config,
  args: GlobalArgs,
  http: RetryingClient,
  client: CachedPrayerClient,
  painter: Painter,
}

impl App {
  pub fn new(mut config: Config, args: GlobalArgs) -> Result<Self> {
    let format = args.output.unwrap_or(config.output.format);
    if args.webhook_url.is_some() && !format.is_structured() {
      return Err(eyre!(
        "--webhook-url needs a structured output format (json, webhook, slack or discord), got {}",
        format
      ));
    }
    if args.no_cache {
      config.cache.enabled = false;
    }

    let http = RetryingClient::new(config.retry_config(), &format!("pray/{}", VERSION))
      .wrap_err("Failed to create HTTP client")?;

    let storage = ResponseCache::new(config.cache_dir()?).with_enabled(config.cache.enabled);
    let client = CachedPrayerClient::new(
      PrayerClient::new(http.clone()).with_base_url(&config.api.base_url),
      storage,
    )
    .with_ttls(config.cache_ttls())
    .with_bypass(args.no_cache);

    let painter = Painter::new(
      config.output.color
        && !args.no_color
        && !format.is_structured()
        && args.output_file.is_none()
        && args.webhook_url.is_none()
        && std::env::var_os("NO_COLOR").is_none()
        && std::io::stdout().is_terminal(),
    );

    Ok(Self {
      config,
      args,
      http,
      client,
      painter,
    })
  }

  pub async fn run(&mut self, command: Command) -> Result<()> {
    let update_check = self.spawn_update_check(&command);

    match command {
      Command::Today => self.show_day(Local::now().date_naive()).await?,
      Command::Get { date } => {
        let date = cli::parse_date(&date, Local::now().date_naive()).wrap_err("Invalid --date")?;
        self.show_day(date).await?
      }
      Command::Next => self.show_next().await?,
      Command::Countdown => self.countdown().await?,
      Command::Diff { first, second } => self.show_diff(&first, &second).await?,
      Command::Qibla => self.show_qibla().await?,
      Command::Methods { filter } => self.show_methods(filter.as_deref()),
      Command::Calendar(calendar) => self.calendar(&calendar).await?,
      Command::Cache { command } => self.cache(command)?,
      Command::Config { command } => self.config_command(command).await?,
      Command::Version => show_version(),
    }

    if let Some(handle) = update_check {
      match tokio::time::timeout(UPDATE_CHECK_TIMEOUT, handle).await {
        Ok(Ok(Some(message))) => eprintln!("\n{}", message),
        Ok(_) => {}
        Err(_) => debug!("release check did not finish in time"),
      }
    }

    Ok(())
  }

  // ==========================================================================
  // Effective settings
  // ==========================================================================

  fn method(&self) -> u8 {
    self.args.method.unwrap_or(self.config.method)
  }

  fn school(&self) -> u8 {
    self.args.school.unwrap_or(self.config.school)
  }

  fn format(&self) -> Format {
    self.args.output.unwrap_or(self.config.output.format)
  }

  fn hijri(&self) -> HijriDisplay {
    self.args.hijri.unwrap_or(self.config.features.hijri)
  }

  fn show_qibla_with_times(&self) -> bool {
    self.args.qibla || self.config.features.qibla
  }

  /// Budget for one logical API operation including its retries.
  fn deadline(&self) -> Deadline {
    let attempts = self.config.api.max_retries.saturating_add(1);
    Deadline::after(Duration::from_secs(self.config.api.timeout_secs) * attempts)
  }

  fn spawn_update_check(&self, command: &Command) -> Option<tokio::task::JoinHandle<Option<String>>> {
    if !self.config.update_check || self.args.quiet || matches!(command, Command::Version) {
      return None;
    }

    let checker = Checker::new(&self.http, VERSION).with_timeout(UPDATE_CHECK_TIMEOUT);
    Some(tokio::spawn(async move {
      match checker.check().await {
        Ok(result) => result.message(),
        Err(e) => {
          debug!(error = %e, "release check failed");
          None
        }
      }
    }))
  }

  fn report_source(&self, what: &str, source: CacheSource) {
    debug!(what, %source, "response source");
    if self.args.verbose {
      eprintln!("{} {} served from {}", self.painter.dim("›"), what, source);
    }
  }

  // ==========================================================================
  // Location
  // ==========================================================================

  /// The location for this run: `--auto`, then `--address`, then
  /// `--lat/--lon`, then the configured one. `None` when nothing is set.
  async fn resolve_location(&self) -> Result<Option<Location>> {
    if self.args.auto {
      return self.detect_location().await.map(Some);
    }
    if let Some(address) = &self.args.address {
      return Ok(Some(Location::from_address(address.trim())));
    }
    if let (Some(lat), Some(lon)) = (self.args.lat, self.args.lon) {
      let location = Location::from_coordinates(lat, lon);
      location.validate().wrap_err("Invalid --lat/--lon")?;
      return Ok(Some(location));
    }
    if self.config.is_configured() {
      return Ok(Some(self.config.location.clone()));
    }
    Ok(None)
  }

  async fn detect_location(&self) -> Result<Location> {
    Resolver::new(&self.http)
      .resolve()
      .await
      .wrap_err("Failed to auto-detect location")
  }

  /// Like [`Self::resolve_location`], printing setup hints when unset.
  async fn require_location(&self) -> Result<Option<Location>> {
    let location = self.resolve_location().await?;
    if location.is_none() {
      println!("👋 Welcome! No location configured.");
      println!();
      println!("Set your location using one of these options:");
      println!("  pray config detect --save    Auto-detect from IP");
      println!("  pray --auto                  Auto-detect (one-time)");
      println!("  pray -a \"Cairo, Egypt\"       Specify a city");
      println!("  pray --lat 30.04 --lon 31.24 Specify coordinates");
    }
    Ok(location)
  }

  /// Persist the flags given on this run when `--save` was passed.
  fn save_settings(&mut self, location: &Location) -> Result<()> {
    if !self.args.save {
      return Ok(());
    }

    let mut config = self.config.clone();
    if self.args.has_location() {
      config.location = location.clone();
    }
    if let Some(method) = self.args.method {
      config.method = method;
    }
    if let Some(school) = self.args.school {
      config.school = school;
    }
    if let Some(language) = &self.args.language {
      config.language = language.clone();
    }
    if let Some(hijri) = self.args.hijri {
      config.features.hijri = hijri;
    }
    if let Some(format) = self.args.output {
      config.output.format = format;
    }
    if self.args.qibla {
      config.features.qibla = true;
    }
    config.validate()?;

    let path = Config::path(self.args.config.as_deref())?;
    config.save(&path)?;
    self.config = config;
    if !self.args.quiet {
      println!("{} Settings saved to {}", self.painter.color("✓", Color::Green), path.display());
    }
    Ok(())
  }

  // ==========================================================================
  // Fetching
  // ==========================================================================

  fn day_params(&self, location: &Location, date: NaiveDate) -> PrayerTimesParams {
    PrayerTimesParams::for_location(location)
      .with_date(date)
      .with_method(self.method())
      .with_school(self.school())
  }

  async fn fetch_day(&self, params: &PrayerTimesParams, label: &str) -> Result<PrayerTimesResponse> {
    let result = self
      .client
      .get_timings(params, self.deadline())
      .await
      .wrap_err_with(|| format!("Failed to fetch prayer times for {}", label))?;
    self.report_source("prayer times", result.source);
    Ok(result.data)
  }

  /// Coordinates to use for Qibla: the location's own, else the ones the
  /// API geocoded for an address.
  fn qibla_coordinates(location: &Location, response: &PrayerTimesResponse) -> Option<(f64, f64)> {
    if location.is_valid() {
      return Some((location.latitude, location.longitude));
    }
    let probe = Location::from_coordinates(response.data.meta.latitude, response.data.meta.longitude);
    probe.is_valid().then_some((probe.latitude, probe.longitude))
  }

  /// Qibla bearing, or `None` after logging when it can't be fetched.
  async fn qibla_direction(&self, latitude: f64, longitude: f64) -> Option<f64> {
    match self.client.get_qibla(latitude, longitude, self.deadline()).await {
      Ok(result) => {
        self.report_source("qibla", result.source);
        Some(result.data.data.direction)
      }
      Err(e) => {
        warn!(error = %e, "could not fetch Qibla direction");
        None
      }
    }
  }

  /// Send rendered output to the webhook, the output file or stdout.
  async fn emit(&self, text: &str) -> Result<()> {
    match &self.args.webhook_url {
      Some(url) => self.deliver(url, text).await,
      None => self.write_output(text),
    }
  }

  fn write_output(&self, text: &str) -> Result<()> {
    match &self.args.output_file {
      Some(path) => {
        std::fs::write(path, format!("{}\n", text))
          .wrap_err_with(|| format!("Failed to write output file {}", path.display()))?;
        if !self.args.quiet {
          println!("✓ Output saved to: {}", path.display());
        }
      }
      None => println!("{}", text),
    }
    Ok(())
  }

  /// POST `text` once. A retried POST could deliver the message twice.
  async fn deliver(&self, url: &Url, text: &str) -> Result<()> {
    let request = HttpRequest::post_json(url.as_str(), text.as_bytes().to_vec());
    let http = self.http.with_config(self.config.retry_config().with_max_retries(0));
    http
      .execute("webhook", &request, self.deadline())
      .await
      .wrap_err_with(|| format!("Failed to deliver output to {}", webhook_host(url)))?;

    info!(host = %webhook_host(url), bytes = text.len(), "delivered output to webhook");
    if !self.args.quiet {
      println!("✓ Output delivered to {}", webhook_host(url));
    }
    Ok(())
  }

  // ==========================================================================
  // Commands
  // ==========================================================================

  async fn show_day(&mut self, date: NaiveDate) -> Result<()> {
    let Some(location) = self.require_location().await? else {
      return Ok(());
    };
    self.save_settings(&location)?;

    let label = location.display_address();
    let is_today = date == Local::now().date_naive();
    // Absolute instants are only needed to mark passed and next prayers
    let params = self.day_params(&location, date).with_iso8601(is_today);
    let response = self.fetch_day(&params, &label).await?;

    let qibla = match Self::qibla_coordinates(&location, &response) {
      Some((lat, lon)) if self.show_qibla_with_times() => self.qibla_direction(lat, lon).await,
      _ => None,
    };

    let now = is_today.then(Utc::now);
    let view = PrayerView::build(&response, label, self.hijri(), now).with_qibla(qibla);
    let text = self.format().render(&view, self.painter)?;
    self.emit(&text).await
  }

  async fn show_next(&mut self) -> Result<()> {
    let Some(location) = self.require_location().await? else {
      return Ok(());
    };
    self.save_settings(&location)?;

    let label = location.display_address();
    let today = Local::now().date_naive();
    let params = self.day_params(&location, today).with_iso8601(true);
    let response = self.fetch_day(&params, &label).await?;
    let view = PrayerView::build(&response, label.clone(), self.hijri(), Some(Utc::now()));

    if self.format().is_structured() {
      let payload = match &view.next_prayer {
        Some(next) => json!({
          "name": next.name,
          "time": next.time,
          "minutesUntil": next.minutes_until,
          "location": label,
        }),
        None => json!({ "name": null, "message": "All prayers for today have passed" }),
      };
      return self.emit(&serde_json::to_string_pretty(&payload)?).await;
    }

    let p = self.painter;
    let mut lines = vec![String::new()];
    match &view.next_prayer {
      Some(next) => {
        lines.push(p.color(&format!("Next Prayer: {}", next.name), Color::Cyan));
        lines.push(format!("   Time: {}", p.color(&next.time, Color::Green)));
        lines.push(format!(
          "   In:   {}",
          p.color(&format_minutes_long(next.minutes_until), Color::Yellow)
        ));
        lines.push(String::new());
        lines.push(format!("   {}", p.dim(&format!("Location: {}", label))));
        lines.push(format!("   {}", p.dim(&format!("Method: {}", methods::name(self.method())))));
      }
      None => {
        let tomorrow = today
          .checked_add_days(Days::new(1))
          .ok_or_else(|| eyre!("Date out of range"))?;
        let fajr = self
          .fetch_day(&self.day_params(&location, tomorrow), &label)
          .await?
          .data
          .timings
          .fajr;
        lines.push("🌙 All prayers for today have passed".to_string());
        lines.push(format!("   Tomorrow's Fajr: {}", clean_time(&fajr)));
      }
    }
    self.emit(&lines.join("\n")).await
  }

  async fn countdown(&mut self) -> Result<()> {
    let Some(location) = self.require_location().await? else {
      return Ok(());
    };
    self.save_settings(&location)?;

    let label = location.display_address();
    let method = methods::name(self.method());
    let mut day = Local::now().date_naive();
    let mut response = self
      .fetch_day(&self.day_params(&location, day).with_iso8601(true), &label)
      .await?;
    let mut tomorrow_fajr: Option<String> = None;
    let mut tomorrow_fetched = false;

    let mut stdout = std::io::stdout();
    let live = stdout.is_terminal() && self.args.output_file.is_none();

    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    if live {
      execute!(stdout, Hide, Clear(ClearType::All))?;
    }
    let outcome: Result<()> = loop {
      tokio::select! {
        result = &mut ctrl_c => {
          break result.wrap_err("Failed to listen for Ctrl+C");
        }
        _ = ticker.tick() => {
          let today = Local::now().date_naive();
          if today != day {
            day = today;
            tomorrow_fajr = None;
            tomorrow_fetched = false;
            match self.fetch_day(&self.day_params(&location, day).with_iso8601(true), &label).await {
              Ok(fresh) => response = fresh,
              Err(e) => warn!(error = %e, "could not refresh prayer times for the new day"),
            }
          }

          let now = Utc::now();
          let view = PrayerView::build(&response, label.as_str(), self.hijri(), Some(now));
          if view.next_prayer.is_none() && !tomorrow_fetched {
            tomorrow_fetched = true;
            tomorrow_fajr = self.tomorrow_fajr(&location, day, &label).await;
          }

          let frame = CountdownFrame {
            view: &view,
            now,
            offset: location_offset(&response),
            method,
            tomorrow_fajr: tomorrow_fajr.as_deref(),
          }
          .render(self.painter);

          if !live {
            break self.write_output(&frame);
          }
          if let Err(e) = draw_frame(&mut stdout, &frame) {
            break Err(e).wrap_err("Failed to draw countdown");
          }
        }
      }
    };

    if live {
      execute!(stdout, Show)?;
      if outcome.is_ok() {
        println!("\n👋 Goodbye!");
      }
    }
    outcome
  }

  /// Tomorrow's Fajr as "HH:MM", or `None` after logging when unavailable.
  async fn tomorrow_fajr(&self, location: &Location, today: NaiveDate, label: &str) -> Option<String> {
    let tomorrow = today.checked_add_days(Days::new(1))?;
    match self.fetch_day(&self.day_params(location, tomorrow), label).await {
      Ok(response) => Some(clean_time(&response.data.timings.fajr).to_string()),
      Err(e) => {
        warn!(error = %e, "could not fetch tomorrow's Fajr");
        None
      }
    }
  }

  async fn show_diff(&self, first: &str, second: &str) -> Result<()> {
    let today = Local::now().date_naive();
    let first_params = self.day_params(&Location::from_address(first), today);
    let second_params = self.day_params(&Location::from_address(second), today);

    let (a, b) = tokio::try_join!(
      self.fetch_day(&first_params, first),
      self.fetch_day(&second_params, second)
    )?;

    let rows: Vec<(&str, String, String, Option<i64>)> = a
      .data
      .timings
      .schedule()
      .iter()
      .zip(b.data.timings.schedule().iter())
      .map(|(&(name, t1), &(_, t2))| {
        let minutes = parse_clock(t1)
          .zip(parse_clock(t2))
          .map(|(t1, t2)| (t2 - t1).num_minutes());
        (name, clean_time(t1).to_string(), clean_time(t2).to_string(), minutes)
      })
      .collect();

    if self.format().is_structured() {
      let prayers: Vec<_> = rows
        .iter()
        .map(|(name, t1, t2, minutes)| {
          json!({ "name": name, "first": t1, "second": t2, "differenceMinutes": minutes })
        })
        .collect();
      let payload = json!({
        "date": a.data.date.readable,
        "first": first,
        "second": second,
        "method": methods::name(self.method()),
        "prayers": prayers,
      });
      return self.emit(&serde_json::to_string_pretty(&payload)?).await;
    }

    let p = self.painter;
    let first_col = truncate(first, 20);
    let second_col = truncate(second, 20);
    let mut lines = vec![
      String::new(),
      format!("📊 {}", p.color("Prayer Times Comparison", Color::Cyan)),
      RULE.to_string(),
      format!("📅 {}", a.data.date.readable),
      String::new(),
      p.bold(&format!("{:<10}{:<22}{:<22}{}", "Prayer", first_col, second_col, "Difference")),
    ];
    for (name, t1, t2, minutes) in &rows {
      let diff = match minutes {
        Some(m) if *m > 0 => p.color(&format_diff(*m), Color::Red),
        Some(m) if *m < 0 => p.color(&format_diff(*m), Color::Green),
        Some(_) => p.color("same", Color::Yellow),
        None => p.dim("n/a"),
      };
      lines.push(format!("{:<10}{:<22}{:<22}{}", name, t1, t2, diff));
    }
    lines.push(String::new());
    lines.push(format!("⚙️  Method: {}", methods::name(self.method())));
    lines.push(p.dim("Positive difference means the second location is later"));
    self.emit(&lines.join("\n")).await
  }

  async fn show_qibla(&mut self) -> Result<()> {
    let Some(location) = self.require_location().await? else {
      return Ok(());
    };
    self.save_settings(&location)?;

    let (latitude, longitude) = if location.is_valid() {
      (location.latitude, location.longitude)
    } else {
      let params = self.day_params(&location, Local::now().date_naive());
      let response = self.fetch_day(&params, &location.display_address()).await?;
      Self::qibla_coordinates(&location, &response)
        .ok_or_else(|| eyre!("Could not determine coordinates for {}", location.display_address()))?
    };

    let result = self
      .client
      .get_qibla(latitude, longitude, self.deadline())
      .await
      .wrap_err("Failed to fetch Qibla direction")?;
    self.report_source("qibla", result.source);
    let qibla = QiblaView::new(result.data.data.direction);

    if self.format().is_structured() {
      let payload = json!({
        "direction": qibla.direction,
        "compass": qibla.compass,
        "latitude": latitude,
        "longitude": longitude,
        "location": location.display_address(),
      });
      return self.emit(&serde_json::to_string_pretty(&payload)?).await;
    }

    let p = self.painter;
    let lines = [
      String::new(),
      format!("🧭 {}", p.color("Qibla Direction", Color::Cyan)),
      RULE.to_string(),
      format!(
        "   Direction: {} ({})",
        p.color(&format!("{:.1}°", qibla.direction), Color::Green),
        qibla.compass
      ),
      format!("   From:      {}", location.display_address()),
      p.dim(&format!("   Degrees clockwise from true north at {:.4}, {:.4}", latitude, longitude)),
    ];
    self.emit(&lines.join("\n")).await
  }

  fn show_methods(&self, filter: Option<&str>) {
    let found = methods::filter(filter.unwrap_or_default());
    if found.is_empty() {
      println!("No methods found matching the filter.");
      return;
    }

    let p = self.painter;
    let current = self.method();
    println!();
    println!("📐 Available Calculation Methods");
    println!("{}", RULE);
    println!();
    println!("{}", p.bold(&format!("{:>3}  {:<46}  {}", "ID", "Name", "Description")));
    for method in found {
      let marker = if method.id == current { " *" } else { "" };
      println!(
        "{}  {:<46}  {}{}",
        p.color(&format!("{:>3}", method.id), Color::Cyan),
        truncate(method.name, 46),
        method.description,
        marker
      );
    }
    println!();
    println!("Use -m or --method to select a method (* marks the current one):");
    println!("  pray -m 5           Egyptian General Authority of Survey");
    println!("  pray --method 2     Islamic Society of North America");
  }

  async fn calendar(&mut self, args: &CalendarArgs) -> Result<()> {
    let Some(location) = self.require_location().await? else {
      return Ok(());
    };
    self.save_settings(&location)?;

    let place = CalendarParams::for_location(&location);
    let mut params = CalendarParams {
      latitude: place.latitude,
      longitude: place.longitude,
      address: place.address,
      method: self.method(),
      ..self.config.calendar_params()
    };
    if let Some(language) = &self.args.language {
      params.language = language.clone();
    }
    if let Some(hijri) = self.args.hijri {
      params.hijri = hijri.as_str().to_string();
    }
    if self.args.qibla {
      params.qibla = true;
    }
    if let Some(months) = args.months {
      params.months = months;
    }
    if let Some(duration) = args.duration {
      params.duration = duration;
    }
    if let Some(alarm) = &args.alarm {
      params.alarm = alarm.clone();
    }
    if let Some(color) = &args.color {
      params.color = color.clone();
    }
    if let Some(events) = &args.events {
      params.events = events.clone();
    }
    params.validate().wrap_err("Invalid calendar options")?;

    let p = self.painter;
    if args.url_only {
      let url = params.ics_url(self.client.inner().ics_base_url())?;
      println!();
      println!("📅 Calendar Subscription URL");
      println!("{}", RULE);
      println!();
      println!("{}", p.color(&url, Color::Cyan));
      println!();
      println!("Use this URL to subscribe in your calendar app.");
      return Ok(());
    }

    let path = args
      .ics_file
      .clone()
      .unwrap_or_else(|| PathBuf::from(default_ics_filename(&location.display_address())));

    let body = self
      .client
      .download_ics(&params, Deadline::after(CALENDAR_TIMEOUT))
      .await
      .wrap_err("Failed to download calendar")?;
    write_file(&path, &body)?;

    if !self.args.quiet {
      println!("{} Calendar saved to: {}", p.color("✓", Color::Green), path.display());
      println!();
      println!("📍 Import this file into your calendar app:");
      println!("   - Google Calendar: Settings > Import & export > Import");
      println!("   - Apple Calendar: File > Import");
      println!("   - Outlook: File > Open > Import");
    }
    Ok(())
  }

  fn cache(&self, command: CacheCommand) -> Result<()> {
    let storage = self.client.storage();
    let p = self.painter;

    match command {
      CacheCommand::Path => println!("{}", storage.dir().display()),
      CacheCommand::Show => {
        let stats = storage.stats().wrap_err("Failed to read cache")?;
        let status = if storage.is_enabled() {
          "Enabled".to_string()
        } else {
          p.color("Disabled", Color::Yellow)
        };
        println!();
        println!("📦 {}", p.color("Cache Status", Color::Cyan));
        println!("{}", RULE);
        println!();
        println!("  Status:    {}", status);
        println!("  Location:  {}", storage.dir().display());
        println!("  Entries:   {}", stats.entries);
        println!("  Size:      {}", format_size(stats.total_bytes));
      }
      CacheCommand::Clear => {
        let removed = self.client.clear_cache().wrap_err("Failed to clear cache")?;
        println!("{} Cache cleared! Removed {} entries", p.color("✓", Color::Green), removed);
      }
      CacheCommand::Clean => {
        let removed = storage.clean_expired().wrap_err("Failed to clean cache")?;
        println!("{} Removed {} expired entries", p.color("✓", Color::Green), removed);
      }
    }
    Ok(())
  }

  async fn config_command(&mut self, command: ConfigCommand) -> Result<()> {
    let p = self.painter;

    match command {
      ConfigCommand::Path => println!("{}", Config::path(self.args.config.as_deref())?.display()),
      ConfigCommand::Show => {
        let yaml = serde_yaml::to_string(&self.config).wrap_err("Failed to serialize config")?;
        println!("Current configuration:");
        println!("{}", RULE);
        print!("{}", yaml);
      }
      ConfigCommand::Validate => {
        self.config.validate().wrap_err("Configuration is invalid")?;
        println!("✅ Configuration is valid");
      }
      ConfigCommand::Detect => {
        let location = self.detect_location().await?;
        println!(
          "{} Detected: {}",
          p.color("✓", Color::Green),
          p.color(&location.display_address(), Color::Cyan)
        );
        println!("  Coordinates: {:.4}, {:.4}", location.latitude, location.longitude);
        if let Some(timezone) = &location.timezone {
          println!("  Timezone: {}", timezone);
        }
        println!();

        if self.args.save {
          let mut config = self.config.clone();
          config.location = location;
          let path = Config::path(self.args.config.as_deref())?;
          config.save(&path)?;
          self.config = config;
          println!("{} Location saved to: {}", p.color("✓", Color::Green), path.display());
        } else {
          println!("Use --save to save this location to your config.");
        }
      }
    }
    Ok(())
  }
}

fn show_version() {
  println!("pray version {}", VERSION);
  println!("  OS/Arch:    {}/{}", std::env::consts::OS, std::env::consts::ARCH);
}

fn write_file(path: &Path, contents: &[u8]) -> Result<()> {
  if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
    std::fs::create_dir_all(dir)
      .wrap_err_with(|| format!("Failed to create directory {}", dir.display()))?;
  }
  std::fs::write(path, contents).wrap_err_with(|| format!("Failed to write {}", path.display()))
}

/// "prayer-times-cairo-egypt.ics" for "Cairo, Egypt".
fn default_ics_filename(label: &str) -> String {
  let mut slug = String::new();
  for c in label.chars().flat_map(char::to_lowercase) {
    if c.is_alphanumeric() {
      slug.push(c);
    } else if !slug.is_empty() && !slug.ends_with('-') {
      slug.push('-');
    }
  }
  let slug = slug.trim_end_matches('-');
  if slug.is_empty() {
    "prayer-times.ics".to_string()
  } else {
    format!("prayer-times-{}.ics", slug)
  }
}

fn draw_frame(out: &mut impl Write, frame: &str) -> std::io::Result<()> {
  execute!(out, MoveTo(0, 0), Clear(ClearType::All))?;
  writeln!(out, "{}", frame)?;
  out.flush()
}

/// Host part of a webhook URL; the path often embeds a secret token.
fn webhook_host(url: &Url) -> &str {
  url.host_str().unwrap_or("webhook")
}

fn format_size(bytes: u64) -> String {
  const KB: u64 = 1024;
  const MB: u64 = KB * 1024;

  match bytes {
    b if b >= MB => format!("{:.2} MB", b as f64 / MB as f64),
    b if b >= KB => format!("{:.2} KB", b as f64 / KB as f64),
    b => format!("{} bytes", b),
  }
}
