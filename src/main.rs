mod app;
mod browser;
mod cache;
mod clipboard;
mod config;
mod event;
mod github;
mod list;
mod logging;
mod ui;

use cache::{Snapshot, SnapshotStore, Synchronizer};
use clap::builder::{OsStringValueParser, TypedValueParser};
use clap::Parser;
use color_eyre::Result;
use github::client::GitHubClient;
use github::types::Repo;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "gh-stars")]
#[command(about = "Browse your GitHub stars in the terminal")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/gh-stars/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Stars fetched per request (1-100)
  #[arg(long)]
  page_size: Option<usize>,

  /// Snapshot path; pass an empty string to disable caching
  #[arg(long, value_parser = OsStringValueParser::new().map(PathBuf::from))]
  cache: Option<PathBuf>,

  /// Fetch from GitHub even if the cache is fresh
  #[arg(short, long)]
  refresh: bool,

  /// Background refresh interval, e.g. 48h, 30m, 0 to disable
  #[arg(long, value_parser = parse_interval_arg)]
  sync_interval: Option<chrono::Duration>,
}

fn parse_interval_arg(s: &str) -> std::result::Result<chrono::Duration, String> {
  config::parse_interval(s)
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  // Load configuration, then apply command line overrides
  let mut config = config::Config::load(args.config.as_deref())?;
  if let Some(page_size) = args.page_size {
    config.page_size = page_size;
  }
  if let Some(cache) = args.cache {
    config.cache_path = Some(cache);
  }
  if let Some(interval) = args.sync_interval {
    config.sync_interval = interval;
  }
  config.validate()?;

  let _log_guard = logging::init()?;
  tracing::info!(
    page_size = config.page_size,
    cache = %config.resolved_cache_path().display(),
    "starting"
  );

  let store = SnapshotStore::new(config.resolved_cache_path());
  let legacy = config
    .uses_default_cache_path()
    .then(|| SnapshotStore::new(config::LEGACY_CACHE_PATH));
  let (snapshot, warning) = load_snapshot(&store, legacy.as_ref());

  let client = GitHubClient::new(&config)?;
  let startup = app::startup_sync(
    &snapshot,
    store.is_enabled(),
    args.refresh,
    config.sync_interval,
  );
  let sync = Synchronizer::new(client, config.page_size, store);

  // Initialize and run the app
  let mut app = app::App::new(sync, snapshot, config.api_url.clone());
  app.run(startup, warning).await?;

  Ok(())
}

/// Load the snapshot, falling back to an empty one when it is unreadable.
///
/// A snapshot that was never saved is replaced by the `legacy` one when that
/// has entries. Also returns a warning for the status line when the current
/// file had to be ignored.
fn load_snapshot(
  store: &SnapshotStore,
  legacy: Option<&SnapshotStore>,
) -> (Snapshot<Repo>, Option<String>) {
  let (snapshot, warning) = match store.load::<Repo>() {
    Ok(snapshot) => (snapshot, None),
    Err(e) => {
      tracing::warn!(error = %e, "ignoring unreadable cache");
      (Snapshot::default(), Some(format!("Cache ignored: {}", e)))
    }
  };

  let Some(legacy) = legacy else {
    return (snapshot, warning);
  };
  if snapshot.saved_at.is_some() {
    return (snapshot, warning);
  }

  match store.migrate_from::<Repo>(legacy) {
    Ok(Some(migrated)) => (migrated, None),
    Ok(None) => (snapshot, warning),
    Err(e) => {
      tracing::warn!(error = %e, "legacy cache migration failed");
      (snapshot, warning)
    }
  }
}
