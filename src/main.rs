mod actions;
mod app;
mod auth;
mod commands;
mod config;
mod event;
mod invoice;
mod logging;
mod model;
mod offline;
mod storage;
mod store;
mod task;
mod ui;

use app::AppContext;
use clap::{Parser, Subcommand};
use color_eyre::{eyre::eyre, Result};
use config::{Config, PIN_ENV};
use offline::{FetchOutcome, Request};
use std::io::Write;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "tradetrackr")]
#[command(about = "Offline job, client and invoice tracker for tradespeople")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/tradetrackr/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Directory for the database, cache and logs
  #[arg(short, long)]
  data_dir: Option<PathBuf>,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Write all data to a JSON file
  Export { path: PathBuf },
  /// Replace all data with the contents of a JSON file
  Import { path: PathBuf },
  /// Erase all data and the PIN
  Reset {
    /// Confirm the reset
    #[arg(long)]
    yes: bool,
  },
  /// Manage the offline asset cache
  Assets {
    #[command(subcommand)]
    command: AssetsCommand,
  },
}

#[derive(Subcommand, Debug)]
enum AssetsCommand {
  /// Download every shell asset into the current cache generation
  Install,
  /// Drop old cache generations
  Activate,
  /// Fetch a path through the cache and print the body
  Get {
    path: String,
    /// Treat the request as a page navigation
    #[arg(long)]
    navigate: bool,
  },
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  // Load configuration
  let mut config = Config::load(args.config.as_deref())?;
  if let Some(dir) = args.data_dir {
    config.data_dir = Some(dir);
  }

  // Keep the guard alive so buffered log lines are flushed on exit
  let _log_guard = logging::init(&config.log_dir()?)?;
  info!(version = env!("CARGO_PKG_VERSION"), "starting tradetrackr");

  let mut ctx = AppContext::open(config)?;

  match args.command {
    None => {
      let mut app = app::App::new(ctx)?;
      app.run().await?;
    }
    Some(Command::Export { path }) => {
      require_pin(&ctx)?;
      ctx.store.export_to(&path)?;
      println!("Exported to {}", path.display());
    }
    Some(Command::Import { path }) => {
      require_pin(&ctx)?;
      ctx.store.import_from(&path)?;
      println!("Imported");
    }
    Some(Command::Reset { yes }) => {
      if !yes {
        return Err(eyre!(
          "Reset will erase ALL local app data and remove the PIN. Re-run with --yes to continue."
        ));
      }
      ctx.reset()?;
      println!("App reset. Set a new PIN on next start.");
    }
    Some(Command::Assets { command }) => run_assets(&ctx, command).await?,
  }

  Ok(())
}

/// Check `TRADETRACKR_PIN` when a PIN has been set.
fn require_pin(ctx: &AppContext) -> Result<()> {
  if !ctx.gate.is_configured()? {
    return Ok(());
  }

  let pin = Config::get_pin()
    .ok_or_else(|| eyre!("A PIN is set. Provide it in the {} environment variable.", PIN_ENV))?;
  if !ctx.gate.verify(&pin)? {
    return Err(eyre!("Wrong PIN"));
  }
  Ok(())
}

async fn run_assets(ctx: &AppContext, command: AssetsCommand) -> Result<()> {
  let origin = ctx.config.asset_origin()?;
  let cache = ctx
    .assets
    .as_ref()
    .ok_or_else(|| eyre!("Offline cache for {} is unavailable", origin))?;

  match command {
    AssetsCommand::Install => {
      let report = cache.install().await?;
      println!(
        "Cached {} assets in {} ({:?})",
        report.assets,
        report.generation,
        cache.state()
      );
    }
    AssetsCommand::Activate => {
      let deleted = cache.activate().await?;
      if deleted.is_empty() {
        println!("{} is active; nothing to delete", cache.generation());
      } else {
        println!(
          "{} is active; deleted {}",
          cache.generation(),
          deleted.join(", ")
        );
      }
    }
    AssetsCommand::Get { path, navigate } => {
      let url = cache.asset_url(&path)?;
      let request = if navigate {
        Request::navigate(url)
      } else {
        Request::get(url)
      };

      let outcome = cache.fetch(&request).await?;
      let source = match &outcome {
        FetchOutcome::Cached(_) => "cache",
        FetchOutcome::Network(_) => "network",
        FetchOutcome::OfflineShell(_) => "offline shell",
        FetchOutcome::Passthrough => "passthrough",
      };
      eprintln!("[{}]", source);

      if let Some(response) = outcome.response() {
        std::io::stdout()
          .write_all(&response.body)
          .map_err(|e| eyre!("Failed to write response: {}", e))?;
      }
    }
  }

  Ok(())
}
