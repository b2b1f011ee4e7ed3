//! Fetch daily prices from Bybit
//!
//! Usage: cargo run --bin fetch_prices -- --symbol BTCUSDT --days 1825 --output data/BTCUSDT_1d.csv

use anyhow::Result;
use chrono::{NaiveDate, Utc};
use clap::Parser;
use random_walk_analysis::api::{save_candles, BybitClient, Interval};
use random_walk_analysis::config::load_config_with_env;
use random_walk_analysis::init_logging;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about = "Fetch daily prices from Bybit")]
struct Args {
    /// Trading symbol (e.g., BTCUSDT, ETHUSDT)
    #[arg(short, long)]
    symbol: Option<String>,

    /// Kline interval (d, w, m)
    #[arg(short, long, default_value = "d")]
    interval: String,

    /// Number of days before the end date
    #[arg(short, long)]
    days: Option<i64>,

    /// First day (YYYY-MM-DD)
    #[arg(long)]
    start: Option<NaiveDate>,

    /// Last day (YYYY-MM-DD), today by default
    #[arg(long)]
    end: Option<NaiveDate>,

    /// Use the testnet API
    #[arg(long)]
    testnet: bool,

    /// Configuration file (TOML or JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output file path
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = load_config_with_env(args.config.as_deref())?;
    if let Some(symbol) = &args.symbol {
        config.data.symbol = symbol.clone();
    }
    if let Some(days) = args.days {
        config.data.lookback_days = days;
    }
    if args.start.is_some() {
        config.data.start = args.start;
    }
    if args.end.is_some() {
        config.data.end = args.end;
    }
    config.data.testnet |= args.testnet;
    config.validate()?;

    init_logging(&config.logging.level)?;

    let interval = Interval::parse(&args.interval)
        .ok_or_else(|| anyhow::anyhow!("Unsupported interval: {}", args.interval))?;
    let (start, end) = config.data.date_range(Utc::now());

    info!(
        "Fetching {} {} klines from {} to {}",
        config.data.symbol,
        interval.as_str(),
        start,
        end
    );

    let client = if config.data.testnet {
        BybitClient::testnet()
    } else {
        BybitClient::new()
    };

    let candles = client
        .get_historical_klines(&config.data.symbol, interval, start, end)
        .await?;

    if candles.is_empty() {
        anyhow::bail!("No data returned for {}", config.data.symbol);
    }

    println!("\nFirst 5 candles:");
    println!(
        "{:<25} {:>12} {:>12} {:>12} {:>12} {:>15}",
        "Timestamp", "Open", "High", "Low", "Close", "Volume"
    );
    println!("{}", "-".repeat(95));

    for candle in candles.iter().take(5) {
        println!(
            "{:<25} {:>12.2} {:>12.2} {:>12.2} {:>12.2} {:>15.2}",
            candle.timestamp.format("%Y-%m-%d %H:%M"),
            candle.open,
            candle.high,
            candle.low,
            candle.close,
            candle.volume
        );
    }

    let output = args.output.unwrap_or_else(|| {
        PathBuf::from(format!(
            "data/{}_{}.csv",
            config.data.symbol,
            interval.as_str().to_lowercase()
        ))
    });
    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    save_candles(&output, &candles)?;
    info!("Saved {} candles to {}", candles.len(), output.display());

    let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
    let min_price = closes.iter().cloned().fold(f64::INFINITY, f64::min);
    let max_price = closes.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

    println!("\nStatistics:");
    println!("-----------");
    println!("Candles:   {}", candles.len());
    println!("Min Price: {:.2}", min_price);
    println!("Max Price: {:.2}", max_price);

    Ok(())
}
