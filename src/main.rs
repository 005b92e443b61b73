mod app;
mod config;
mod constants;
mod display;
mod duration;
mod input;
mod pagination;
mod projection;
mod state;
mod theme;
mod thumbnail;
mod ui;
mod youtube;

use anyhow::{Context, Result};
use clap::Parser;
use ratatui::{
  DefaultTerminal,
  crossterm::event::{self, Event, KeyEventKind},
};
use std::time::Duration;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use app::App;
use config::{Config, Overrides, Settings};
use constants::constants;
use display::{CliThumbnailMode, resolve_thumbnail_mode};
use youtube::{ApiKey, YouTubeClient};

// --- CLI ---

#[derive(Parser, Debug)]
#[command(author, version = env!("CARGO_PKG_VERSION"), about, long_about = None)]
struct Args {
  /// YouTube Data API key
  #[arg(long, env = "YT_API_KEY", hide_env_values = true)]
  api_key: ApiKey,

  /// Category to open with, by label or query (e.g. 'yoga')
  #[arg(short, long)]
  category: Option<String>,

  /// Videos per page
  #[arg(long)]
  page_size: Option<u32>,

  /// Total number of results the pager spans
  #[arg(long)]
  total_results: Option<u32>,

  /// Thumbnail rendering: 'auto', 'blocks', 'ascii' or 'off' (default: auto-detect)
  #[arg(short, long, default_value = "auto")]
  thumbnails: CliThumbnailMode,
}

// --- Logging ---

/// Log to a daily file under the platform data dir; the terminal belongs to the UI.
fn init_logging() -> Option<WorkerGuard> {
  let dir = config::project_dirs()?.data_local_dir().join("logs");
  std::fs::create_dir_all(&dir).ok()?;
  let filter = EnvFilter::try_from_env("YFIT_LOG").unwrap_or_else(|_| EnvFilter::new("yfit=info"));
  let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, "yfit.log"));
  tracing_subscriber::fmt().with_env_filter(filter).with_writer(writer).with_ansi(false).try_init().ok()?;
  Some(guard)
}

// --- Main ---

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();
  let _log_guard = init_logging();

  let overrides =
    Overrides { category: args.category.clone(), page_size: args.page_size, total_results: args.total_results };
  let settings = Settings::resolve(Config::load(), &overrides).context("Invalid settings")?;
  let client = YouTubeClient::new(args.api_key)?;
  let thumbnail_mode = resolve_thumbnail_mode(args.thumbnails);
  info!(thumbnails = thumbnail_mode.label(), "yfit starting");

  let default_hook = std::panic::take_hook();
  std::panic::set_hook(Box::new(move |info| {
    ratatui::restore();
    default_hook(info);
  }));

  let mut terminal = ratatui::init();
  let result = run(&mut terminal, App::new(client, settings, thumbnail_mode)).await;
  ratatui::restore();
  result
}

async fn run(terminal: &mut DefaultTerminal, mut app: App) -> Result<()> {
  app.refresh();
  let poll = Duration::from_millis(constants().poll_interval_ms);

  loop {
    app.check_pending();
    app.ensure_thumbnail();
    app.expire_error();

    terminal.draw(|frame| ui::ui(frame, &mut app)).context("Failed to draw frame")?;

    if event::poll(poll).context("Failed to poll terminal events")? {
      match event::read().context("Failed to read terminal event")? {
        Event::Key(key) if key.kind == KeyEventKind::Press => {
          input::handle_key_event(&mut app, key);
        }
        _ => {}
      }
    }

    if app.should_quit {
      break;
    }
  }

  info!("yfit exiting");
  Ok(())
}
