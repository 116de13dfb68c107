/*
[INPUT]:  CLI arguments, optional YAML configuration file, environment
[OUTPUT]: ApiResponse JSON on stdout, logs on stderr, exit status
[POS]:    Binary entry point
[UPDATE]: When changing CLI commands, startup flow or output format
*/

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use pricewatch_adapter::{ApiResponse, Exchange};
use pricewatch_pipeline::AppConfig;
use pricewatch_pipeline::runtime::{Pipelines, connect_cache};

#[derive(Parser, Debug)]
#[command(
    name = "pricewatch",
    version,
    about = "Cached exchange market data and cross-exchange price comparison"
)]
struct Cli {
    #[arg(long = "config", value_name = "PATH", global = true)]
    config_path: Option<PathBuf>,
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info", global = true)]
    log_level: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Last traded price
    Price {
        symbol: String,
        #[arg(long)]
        exchange: Exchange,
    },
    /// Order book snapshot
    #[command(name = "orderbook")]
    OrderBook {
        symbol: String,
        #[arg(long)]
        exchange: Exchange,
        /// Levels per side; defaults to the exchange's configured depth
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Derived market statistics
    Stats {
        symbol: String,
        #[arg(long)]
        exchange: Exchange,
        /// Retry up to N attempts with exponential backoff
        #[arg(long, value_name = "N")]
        retry: Option<u32>,
    },
    /// Compare the configured sources A and B
    Compare {
        symbol: String,
        #[arg(long = "prices-only")]
        prices_only: bool,
    },
    /// Probe an exchange with the canary symbol
    Health {
        #[arg(long)]
        exchange: Exchange,
    },
    /// Drop cached entries for a symbol
    Invalidate {
        symbol: String,
        #[arg(long)]
        exchange: Exchange,
    },
    /// Print the effective configuration as YAML
    Config,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Invalidated {
    exchange: Exchange,
    symbol: String,
    removed: usize,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Cli::parse();
    init_tracing(&args.log_level)?;

    let config = AppConfig::load(args.config_path.as_deref()).context("load configuration")?;

    match args.command {
        Command::Config => {
            print!("{}", config.to_yaml().context("render configuration")?);
            Ok(ExitCode::SUCCESS)
        }
        command => run(command, &config).await,
    }
}

async fn run(command: Command, config: &AppConfig) -> Result<ExitCode> {
    let connect_timeout = Duration::from_secs(config.http.connect_timeout_secs);
    let cache = connect_cache(&config.cache, connect_timeout).await;
    let pipelines = Pipelines::new(config, cache).context("build exchange pipelines")?;
    info!(?command, "running command");

    match command {
        Command::Price { symbol, exchange } => {
            emit(pipelines.service(exchange).get_price(&symbol).await)
        }
        Command::OrderBook {
            symbol,
            exchange,
            limit,
        } => {
            let service = pipelines.service(exchange);
            let limit = limit.unwrap_or(service.settings().default_depth);
            emit(service.get_order_book(&symbol, limit).await)
        }
        Command::Stats {
            symbol,
            exchange,
            retry,
        } => {
            let service = pipelines.service(exchange);
            let result = match retry {
                Some(attempts) => service.get_market_stats_with_retry(&symbol, Some(attempts)).await,
                None => service.get_market_stats(&symbol).await,
            };
            emit(result)
        }
        Command::Compare {
            symbol,
            prices_only,
        } => {
            let engine = pipelines
                .comparison_engine(config)
                .context("build comparison engine")?;
            let result = if prices_only {
                engine.compare_prices(&symbol).await
            } else {
                engine.compare_market_stats(&symbol).await
            };
            emit(result)
        }
        Command::Health { exchange } => {
            let report = pipelines.service(exchange).health_probe().await;
            let healthy = report.healthy;
            print_json(&ApiResponse::success(report))?;
            Ok(if healthy {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Command::Invalidate { symbol, exchange } => {
            let result = pipelines
                .service(exchange)
                .invalidate(&symbol)
                .await
                .map(|removed| Invalidated {
                    exchange,
                    symbol: symbol.trim().to_ascii_uppercase(),
                    removed,
                });
            emit(result)
        }
        Command::Config => Err(anyhow!("config command is handled before startup")),
    }
}

fn emit<T: Serialize>(result: pricewatch_pipeline::Result<T>) -> Result<ExitCode> {
    match result {
        Ok(data) => {
            print_json(&ApiResponse::success(data))?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            error!(error = %err, "command failed");
            print_json(&ApiResponse::<T>::error(err.to_string()))?;
            Ok(ExitCode::FAILURE)
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("serialize response")?;
    println!("{rendered}");
    Ok(())
}

fn init_tracing(log_level: &str) -> Result<()> {
    let filter = EnvFilter::try_new(log_level).context("invalid log level")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow!(err))
        .context("initialize tracing subscriber")?;
    Ok(())
}
