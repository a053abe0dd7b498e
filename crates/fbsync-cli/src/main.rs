mod run;
mod scheduler;

use std::sync::Arc;

use clap::{CommandFactory, Parser, Subcommand};
use fbsync_core::{AppConfig, YamlCatalog};
use fbsync_sellercenter::{ClientSettings, SellerCenterClient};
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use crate::run::{run_sync, RunOptions};

#[derive(Debug, Parser)]
#[command(name = "fbsync")]
#[command(about = "Push product price and stock updates to Falabella Seller Center")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run one sync pass and exit
    Sync {
        /// Sync every product, not only those changed within the window
        #[arg(long)]
        full: bool,
        /// Print the products that would be sent without calling the API
        #[arg(long)]
        dry_run: bool,
        /// Sync at most this many products
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Run sync passes on the configured cron schedule until interrupted
    Schedule {
        /// Sync every product on each tick
        #[arg(long)]
        full: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    let config = Arc::new(fbsync_core::load_app_config()?);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    tracing::debug!(config = ?config, "configuration loaded");

    let client = Arc::new(SellerCenterClient::new(ClientSettings::from_app_config(
        &config,
    ))?);

    let (cancel_tx, cancel_rx) = watch::channel(false);

    match command {
        Commands::Sync {
            full,
            dry_run,
            limit,
        } => {
            tokio::spawn(async move {
                shutdown_signal().await;
                let _ = cancel_tx.send(true);
            });
            let options = RunOptions {
                full,
                dry_run,
                limit,
            };
            run_once(&config, &client, &options, &cancel_rx).await
        }
        Commands::Schedule { full } => {
            let options = RunOptions {
                full,
                ..RunOptions::default()
            };
            let scheduler = scheduler::build_scheduler(
                Arc::clone(&config),
                Arc::clone(&client),
                options,
                cancel_rx,
            )
            .await?;

            shutdown_signal().await;
            let _ = cancel_tx.send(true);
            scheduler.shutdown().await?;
            tracing::info!("scheduler stopped");
            Ok(())
        }
    }
}

async fn run_once(
    config: &AppConfig,
    client: &SellerCenterClient,
    options: &RunOptions,
    cancel: &watch::Receiver<bool>,
) -> anyhow::Result<()> {
    let mut catalog = YamlCatalog::load(&config.catalog_path)?;
    let summary = run_sync(config, client, &mut catalog, options, cancel).await?;

    println!(
        "sync complete: selected={} succeeded={} failed={} cancelled={}",
        summary.selected, summary.succeeded, summary.failed, summary.cancelled
    );

    if summary.failed > 0 && !options.dry_run {
        anyhow::bail!(
            "{} of {} products failed to sync",
            summary.failed,
            summary.selected
        );
    }
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, cancelling remaining work");
}
