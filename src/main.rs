use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use catalog_sentinel::config::LoggingConfig;
use catalog_sentinel::plugins::PluginManager;
use catalog_sentinel::plugins::fetchers::build_fetcher;
use catalog_sentinel::{AppConfig, PollScheduler, WatchState};

/// Watch catalog pages for stock changes and notify an operator.
#[derive(Debug, Parser)]
#[command(name = "catalog-sentinel", version, about)]
struct Args {
    /// Configuration file (TOML); defaults to config/default if present
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Extra catalog URL to track (repeatable)
    #[arg(short, long = "url")]
    urls: Vec<String>,

    /// Run a single poll cycle and exit
    #[arg(long)]
    once: bool,
}

fn init_tracing(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("catalog_sentinel=info"))?;

    let (file_layer, guard) = match &config.directory {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, &config.file_prefix);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .init();

    Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let config = AppConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    let _guard = init_tracing(&config.logging)?;

    info!("Starting Catalog Sentinel...");

    let state = Arc::new(WatchState::new());
    for url in config.watch.urls.iter().chain(args.urls.iter()) {
        state
            .add(url)
            .await
            .with_context(|| format!("Cannot track {}", url))?;
    }
    if state.is_empty().await {
        tracing::warn!("No catalog URLs configured; add some under [watch] or with --url");
    }

    let fetcher = build_fetcher(&config.scraper).context("Failed to build fetcher")?;

    let notifier = PluginManager::new();
    notifier
        .initialize_from_config(&config.notifications)
        .await
        .context("Failed to set up notifiers")?;

    let scheduler = PollScheduler::from_config(&config, state, fetcher, Arc::new(notifier))?;

    if args.once {
        let report = scheduler.run_cycle().await;
        info!(
            checked = report.checked(),
            baselined = report.baselined(),
            alerts = report.alerts(),
            failures = report.failures(),
            "Single cycle complete"
        );
        return Ok(());
    }

    scheduler
        .run(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await;

    let stats = scheduler.get_stats().await;
    info!(
        cycles = stats.cycles_run,
        alerts = stats.alerts_sent,
        failures = stats.scan_failures,
        "Shutting down..."
    );

    Ok(())
}
