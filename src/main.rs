//! btcwatch — terminal Bitcoin price ticker.
//!
//! Polls a JSON price endpoint on a fixed cadence and shows the latest
//! value with a countdown to the next update.
//!
//! Resilience:
//! - Transient failures (no response, 429, 5xx) retried with backoff
//! - Bad requests and undecodable bodies fail the cycle, not the process
//! - Stop with `q` + Enter or Ctrl-C at any point; always exits 0

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

mod cancel;
mod clock;
mod config;
mod countdown;
mod display;
mod fetch;
mod source;
mod ticker;
mod watch;

use cancel::CancellationToken;
use clock::{SystemClock, TokioSleeper};
use config::Config;
use display::ConsoleRenderer;
use source::coingecko::CoinGeckoSource;
use ticker::Ticker;
use watch::ExitWatcher;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// YAML config file (default: ~/.btcwatch/config.yaml if present)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Price API base URL
    #[arg(long)]
    api_base: Option<String>,
    /// Asset id, e.g. "bitcoin"
    #[arg(long)]
    coin: Option<String>,
    /// Quote currency, e.g. "usd"
    #[arg(long)]
    currency: Option<String>,
    /// Seconds between updates
    #[arg(long)]
    interval: Option<u32>,
}

impl Args {
    fn apply(self, config: &mut Config) {
        if let Some(api_base) = self.api_base {
            config.api_base = api_base;
        }
        if let Some(coin) = self.coin {
            config.coin = coin;
        }
        if let Some(currency) = self.currency {
            config.currency = currency;
        }
        if let Some(interval) = self.interval {
            config.interval_secs = interval;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout belongs to the price view.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "btcwatch=warn".into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let mut args = Args::parse();
    let config_path = args.config.take();

    let mut config =
        Config::load(config_path.as_deref()).context("Failed to load configuration")?;
    args.apply(&mut config);
    config.validate().context("Invalid configuration")?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        api_base = %config.api_base,
        coin = %config.coin,
        currency = %config.currency,
        interval_secs = config.interval_secs,
        "₿ btcwatch starting"
    );

    let token = CancellationToken::new();
    let watcher = ExitWatcher::start(&token);

    let ticker = Ticker::new(
        &config,
        Arc::new(CoinGeckoSource::new(&config)),
        Arc::new(ConsoleRenderer::new(&config)),
        Arc::new(SystemClock),
        Arc::new(TokioSleeper),
        token,
    );

    let summary = ticker.run(Some(watcher)).await;
    info!(
        cycles = summary.cycles,
        successes = summary.successes,
        "btcwatch stopped"
    );

    Ok(())
}
