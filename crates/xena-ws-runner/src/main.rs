/*
[INPUT]:  CLI arguments, YAML configuration file, OS shutdown signals
[OUTPUT]: Running market-data or trading session with graceful shutdown
[POS]:    Binary entry point
[UPDATE]: When changing CLI flags, startup flow, or shutdown handling
*/

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use xena_ws_runner::{MarketDataRunner, RunnerConfig, TradingRunner};

#[derive(Parser, Debug)]
#[command(name = "xena-ws-runner", version, about = "Xena streaming client runner")]
struct Cli {
    #[arg(long = "config", value_name = "PATH", global = true, default_value = "config.yaml")]
    config_path: PathBuf,
    #[arg(long = "log-level", value_name = "LEVEL", global = true, default_value = "info")]
    log_level: String,
    #[arg(long = "dry-run", global = true)]
    dry_run: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    /// Subscribe the configured market-data streams and log refreshes
    MarketData,
    /// Log in, request account state and log trading reports
    Trading,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(&args.log_level)?;

    info!(
        config_path = %args.config_path.display(),
        command = ?args.command,
        dry_run = args.dry_run,
        "starting xena-ws-runner"
    );

    let config = load_config(&args.config_path)?;
    match args.command {
        Command::MarketData => config.validate_market_data()?,
        Command::Trading => config.validate_trading()?,
    }
    info!("configuration loaded");

    if args.dry_run {
        info!("dry-run requested; configuration validated");
        return Ok(());
    }

    let shutdown = CancellationToken::new();
    setup_signal_handlers(shutdown.clone());

    match args.command {
        Command::MarketData => {
            let runner =
                MarketDataRunner::new(&config.market_data, config.reconnect, shutdown.clone());
            runner.run().await.context("market data runner")?;
        }
        Command::Trading => {
            let runner = TradingRunner::new(config.trading()?, config.reconnect, shutdown.clone())?;
            runner.run().await.context("trading runner")?;
        }
    }
    info!("shutdown complete");

    Ok(())
}

fn init_tracing(log_level: &str) -> Result<()> {
    let filter = EnvFilter::try_new(log_level).context("invalid log level")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|err| anyhow!(err))
        .context("initialize tracing subscriber")?;
    Ok(())
}

fn load_config(path: &PathBuf) -> Result<RunnerConfig> {
    let path_str = path
        .to_str()
        .context("config path must be valid utf-8")?;
    RunnerConfig::from_file(path_str).context("load config")
}

fn setup_signal_handlers(shutdown: CancellationToken) {
    let shutdown_clone = shutdown.clone();
    tokio::spawn(async move {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "failed to install SIGINT handler");
            return;
        }
        info!("received SIGINT");
        shutdown_clone.cancel();
    });

    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let shutdown_clone = shutdown.clone();
        tokio::spawn(async move {
            match signal(SignalKind::terminate()) {
                Ok(mut stream) => {
                    stream.recv().await;
                    info!("received SIGTERM");
                    shutdown_clone.cancel();
                }
                Err(err) => {
                    warn!(error = %err, "failed to install SIGTERM handler");
                }
            }
        });
    }
}
