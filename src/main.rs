//! ticker-sync - tracked stock quotes from a remote REST source
//!
//! Lists the catalog, manages the tracked set and streams quote refreshes,
//! falling back to local data when the source is unreachable.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use ticker_sync::api::{ApiClientBuilder, InMemoryRemote};
use ticker_sync::config::{self, LoggingConfig};
use ticker_sync::state::AdvisoryLevel;
use ticker_sync::storage::FileMirror;
use ticker_sync::{Config, Quote, Result, SyncEngine};
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "ticker-sync")]
#[command(about = "Track stock quotes from a remote source with local fallback")]
struct Args {
    /// Path to configuration file (TOML)
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Serve the catalog and quotes from an in-process remote
    #[arg(long)]
    demo: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// List the catalog with current quotes
    Catalog,
    /// Show tracked symbols and their quotes
    Tracked,
    /// Start tracking a symbol
    Track { symbol: String },
    /// Stop tracking a symbol
    Untrack { symbol: String },
    /// Poll quotes for the tracked set until interrupted
    Watch {
        /// Stop after this many refreshes
        #[arg(long)]
        ticks: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let config = match args.config.clone() {
        Some(path) => Config::load(Some(path))?,
        None => Config::load_or_default()?,
    };

    // Keep the guard alive so buffered file logs are flushed on exit
    let _guard = init_logging(&config.logging);

    let engine = build_engine(&config, args.demo)?;
    engine.initialize().await;
    report_advisory(&engine).await;

    match args.command.unwrap_or(Command::Tracked) {
        Command::Catalog => {
            for listing in engine.get_catalog().await {
                print_quote(&listing.quote);
            }
            if let Some(updated) = engine.catalog_updated().await {
                println!("Catalog as of {}", updated.format("%Y-%m-%d %H:%M:%S UTC"));
            }
        }
        Command::Tracked => print_tracked(&engine).await,
        Command::Track { symbol } => {
            let quote = engine.add_tracked(&symbol).await?;
            print_quote(&quote);
        }
        Command::Untrack { symbol } => {
            engine.remove_tracked(&symbol).await?;
            println!("Removed {}", symbol.to_uppercase());
        }
        Command::Watch { ticks } => watch(&engine, &config, ticks).await,
    }

    engine.shutdown().await;
    Ok(())
}

fn init_logging(logging: &LoggingConfig) -> Option<WorkerGuard> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| logging.filter.as_str().into());
    let stderr = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    let (file_layer, guard) = match logging.file.then(config::log_dir) {
        Some(Ok(dir)) => {
            let appender = tracing_appender::rolling::daily(dir, "ticker-sync.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        Some(Err(e)) => {
            eprintln!("File logging disabled: {e}");
            (None, None)
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr)
        .with(file_layer)
        .init();

    guard
}

fn build_engine(config: &Config, demo: bool) -> Result<SyncEngine> {
    let mirror = Arc::new(FileMirror::new(config.storage.resolve_mirror_path()));
    info!("Tracked mirror at {}", mirror.path().display());
    let builder = SyncEngine::builder()
        .mirror(mirror)
        .config(config.sync.clone());

    if demo {
        info!("Using in-process demo remote");
        builder.remote(Arc::new(InMemoryRemote::new())).build()
    } else {
        let client = ApiClientBuilder::new()
            .config(config.remote.clone())
            .build()?;
        info!("Using remote at {}", client.base_url());
        builder.remote(Arc::new(client)).build()
    }
}

async fn watch(engine: &SyncEngine, config: &Config, ticks: Option<u64>) {
    let mut interval = tokio::time::interval(config.sync.poll_interval());
    let mut count = 0u64;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
            _ = interval.tick() => {
                // With auto polling the engine refreshes on its own schedule.
                if !config.sync.auto_poll {
                    engine.refresh().await;
                }
                print_tracked(engine).await;
                report_advisory(engine).await;

                count += 1;
                if ticks.is_some_and(|limit| count >= limit) {
                    break;
                }
            }
        }
    }
}

async fn print_tracked(engine: &SyncEngine) {
    let tracked = engine.tracked().await;
    if tracked.is_empty() {
        println!("No tracked stocks");
        return;
    }

    let quotes = engine.get_tracked_quotes().await;
    for symbol in tracked.iter() {
        match quotes.iter().find(|q| q.symbol == symbol) {
            Some(quote) => print_quote(quote),
            None => println!("{symbol:<10} {:>10}", "-"),
        }
    }
}

fn print_quote(quote: &Quote) {
    println!(
        "{:<10} {:>10} {:>8} {:>7}% {} {}",
        quote.symbol,
        quote.price,
        quote.change,
        quote.change_percent,
        quote.trend(),
        quote.name
    );
}

async fn report_advisory(engine: &SyncEngine) {
    let Some(advisory) = engine.advisory().await else {
        return;
    };
    let mode = engine.mode().await;
    let reason = advisory.reason.as_deref().unwrap_or("no details");
    match advisory.level {
        AdvisoryLevel::Warning => warn!("[{}] {} ({})", mode, advisory.message, reason),
        AdvisoryLevel::Error => error!("[{}] {} ({})", mode, advisory.message, reason),
    }
}
