mod api;
mod app;
mod cache;
mod cli;
mod config;
mod error;
mod http;
mod location;
mod methods;
mod output;
mod update;

use std::path::Path;

use clap::Parser;
use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::cli::{Cli, Command, GlobalArgs};

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let cli = Cli::parse();

  // Held until exit so buffered log lines are flushed
  let _log_guard = init_tracing(&cli.global)?;

  let command = cli.command.unwrap_or(Command::Today);

  // Load configuration
  let config = config::Config::load(cli.global.config.as_deref())?;
  if !matches!(command, Command::Config { .. } | Command::Version) {
    config.validate().wrap_err("Invalid configuration")?;
  }

  let mut app = app::App::new(config, cli.global)?;
  app.run(command).await
}

/// Logs go to stderr, or to `--log-file`, so stdout carries only output.
fn init_tracing(args: &GlobalArgs) -> Result<Option<WorkerGuard>> {
  let default_filter = if args.verbose { "pray=debug" } else { "warn" };
  let filter =
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

  match &args.log_file {
    Some(path) => {
      let (dir, file_name) = split_log_path(path)?;
      let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name));
      tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .try_init()
        .map_err(|e| eyre!("Failed to initialize logging: {}", e))?;
      Ok(Some(guard))
    }
    None => {
      tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .map_err(|e| eyre!("Failed to initialize logging: {}", e))?;
      Ok(None)
    }
  }
}

fn split_log_path(path: &Path) -> Result<(&Path, &std::ffi::OsStr)> {
  let file_name = path
    .file_name()
    .ok_or_else(|| eyre!("Log file path has no file name: {}", path.display()))?;
  let dir = path
    .parent()
    .filter(|p| !p.as_os_str().is_empty())
    .unwrap_or_else(|| Path::new("."));
  Ok((dir, file_name))
}
