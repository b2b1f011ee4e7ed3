//! Variance ratio test of the random walk hypothesis
//!
//! Loads daily prices from CSV (or simulates them), sweeps the aggregation
//! length q and reports z-statistics, p-values and scaled volatility.
//!
//! Usage:
//! ```
//! cargo run --bin variance_ratio -- --file data/BTCUSDT_1d.csv
//! cargo run --bin variance_ratio -- --simulate 5000 --ar1 0.2
//! ```

use anyhow::Result;
use chrono::{TimeZone, Utc};
use clap::Parser;
use colored::Colorize;
use random_walk_analysis::analysis::{
    acf, confidence_bounds, cumulative_log_prices, ljung_box_test, sweep, DescriptiveStats,
};
use random_walk_analysis::api::{load_price_series, CsvFormat};
use random_walk_analysis::config::load_config_with_env;
use random_walk_analysis::report::{plot_series_text, save_sweep_csv, volatility_points, z_points};
use random_walk_analysis::simulation::{
    prices_from_log_path, simulate_ar1_returns, simulate_random_walk,
};
use random_walk_analysis::{init_logging, PriceSeries};
use std::path::PathBuf;
use tabled::{Table, Tabled};
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about = "Lo-MacKinlay variance ratio test")]
struct Args {
    /// Input CSV file with prices
    #[arg(short, long, conflicts_with = "simulate")]
    file: Option<PathBuf>,

    /// Simulate this many daily returns instead of reading a file
    #[arg(long)]
    simulate: Option<usize>,

    /// Lag-1 autocorrelation of simulated returns (0 = random walk)
    #[arg(long, default_value = "0.0")]
    ar1: f64,

    /// Seed of the simulation
    #[arg(long, default_value = "42")]
    seed: u64,

    /// Configuration file (TOML or JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Largest aggregation length
    #[arg(short = 'q', long)]
    max_q: Option<usize>,

    /// Annualization factor (252 daily, 12 monthly)
    #[arg(short, long)]
    periods_per_year: Option<f64>,

    /// Significance level
    #[arg(short, long)]
    significance: Option<f64>,

    /// Zero-based index of the price column
    #[arg(long)]
    price_column: Option<usize>,

    /// Aggregation lengths listed in the table
    #[arg(long, value_delimiter = ',', default_value = "2,4,8,16,32,64,100")]
    table_q: Vec<usize>,

    /// Plot every n-th aggregation length
    #[arg(long, default_value = "5")]
    chart_step: usize,

    /// Write the full sweep to this CSV file
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Tabled)]
struct SweepRow {
    #[tabled(rename = "q")]
    q: usize,
    #[tabled(rename = "VR(q)")]
    ratio: String,
    #[tabled(rename = "z(q)")]
    z: String,
    #[tabled(rename = "z*(q)")]
    z_star: String,
    #[tabled(rename = "P-Value")]
    p_value: String,
    #[tabled(rename = "Sigma(q)")]
    sigma: String,
    #[tabled(rename = "Result")]
    result: String,
}

fn fmt(value: Option<f64>) -> String {
    value.map(|v| format!("{:.4}", v)).unwrap_or_else(|| "n/a".to_string())
}

fn load_series(args: &Args, format: &CsvFormat) -> Result<PriceSeries> {
    if let Some(path) = &args.file {
        return Ok(load_price_series(path, format)?);
    }

    let n = args.simulate.unwrap_or(2520);
    let start = Utc
        .with_ymd_and_hms(2000, 1, 3, 0, 0, 0)
        .single()
        .ok_or_else(|| anyhow::anyhow!("invalid simulation start date"))?;
    let path = if args.ar1 == 0.0 {
        simulate_random_walk(n, 0.0003, 0.01, args.seed)?
    } else {
        let returns = simulate_ar1_returns(n, args.ar1, 0.01, args.seed)?;
        cumulative_log_prices(1.0, &returns)
    };
    Ok(prices_from_log_path("simulated", &path, 100.0, start)?)
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = load_config_with_env(args.config.as_deref())?;
    if let Some(max_q) = args.max_q {
        config.analysis.max_q = max_q;
    }
    if let Some(ppy) = args.periods_per_year {
        config.analysis.periods_per_year = ppy;
    }
    if let Some(significance) = args.significance {
        config.analysis.significance = significance;
    }
    if let Some(column) = args.price_column {
        config.data.csv.price_column = column;
    }
    config.validate()?;

    init_logging(&config.logging.level)?;

    println!("{}", "=".repeat(60).blue());
    println!("{}", "Variance Ratio Test".bold().blue());
    println!("{}", "=".repeat(60).blue());

    let series = load_series(&args, &config.data.csv)?;
    let returns = series.log_returns();
    println!(
        "\n{} {} prices ({})",
        "Loaded:".green(),
        series.len(),
        series.name()
    );
    if let (Some(first), Some(last)) = (series.points().first(), series.points().last()) {
        println!("Range: {} .. {}", first.timestamp.date_naive(), last.timestamp.date_naive());
    }

    if returns.len() < 3 {
        anyhow::bail!("Not enough data: need at least 3 log returns");
    }

    // Log return statistics
    println!("\n{}", "Log Return Statistics".bold());
    println!("{}", "-".repeat(40));
    let stats = DescriptiveStats::new(returns.values());
    println!("{}", stats.display());
    println!(
        "Annualized volatility: {:.4}\n",
        stats.annualized_volatility(config.analysis.periods_per_year)
    );

    // Serial correlation
    println!("{}", "Autocorrelation".bold());
    println!("{}", "-".repeat(40));
    let acf_values = acf(returns.values(), 10);
    let bound = confidence_bounds(returns.len(), 0.95);
    for (lag, rho) in acf_values.iter().enumerate().skip(1) {
        let marker = if rho.abs() > bound { "*".yellow() } else { " ".normal() };
        println!("  lag {:>2}: {:>8.4} {}", lag, rho, marker);
    }
    let lb = ljung_box_test(returns.values(), 10);
    println!(
        "Ljung-Box (lag={}): Q={:.2}, p-value={:.4}\n",
        lb.lags, lb.statistic, lb.p_value
    );

    // Sweep
    let sweep_config = config.analysis.sweep_config();
    info!(
        "Running sweep up to q={} with {} periods per year",
        sweep_config.max_q, sweep_config.periods_per_year
    );
    let report = sweep(&series.log_prices(), &sweep_config)?;

    println!("{}", "Variance Ratios".bold());
    println!("{}", "-".repeat(40));

    let rows: Vec<SweepRow> = args
        .table_q
        .iter()
        .filter_map(|&q| report.point(q))
        .map(|p| SweepRow {
            q: p.q,
            ratio: fmt(p.variance_ratio),
            z: fmt(p.z_statistic),
            z_star: fmt(p.z_star),
            p_value: fmt(p.p_value),
            sigma: fmt(p.scaled_volatility),
            result: match p.p_value {
                Some(pv) if pv < sweep_config.significance => "Reject RW".red().to_string(),
                Some(_) => "Random walk".green().to_string(),
                None => "n/a".yellow().to_string(),
            },
        })
        .collect();
    println!("{}\n", Table::new(rows));

    let step = args.chart_step.max(1);
    let z_chart: Vec<_> = z_points(&report)
        .into_iter()
        .filter(|(q, _)| q % step == 0 || *q == 2)
        .collect();
    let sigma_chart: Vec<_> = volatility_points(&report)
        .into_iter()
        .filter(|(q, _)| q % step == 0 || *q == 1)
        .collect();
    println!("{}", plot_series_text(&z_chart, "z(q)", 30));
    println!("{}", plot_series_text(&sigma_chart, "Annualized sigma(q)", 30));

    // Summary
    println!("{}", "Summary".bold());
    println!("{}", "-".repeat(40));
    let summary = report.summary();
    println!("{}\n", summary.display());

    println!("{}", "Interpretation:".bold());
    if summary.significant == 0 {
        println!(
            "  {} No aggregation length rejects the random walk at {}.",
            "✓".green(),
            sweep_config.significance
        );
    } else {
        println!(
            "  {} {} of {} aggregation lengths reject the random walk.",
            "✗".red(),
            summary.significant,
            summary.tested
        );
    }
    // Relative change of sigma(q) across the sweep implied by the slope
    let sigmas: Vec<f64> = report.scaled_volatilities().into_iter().flatten().collect();
    let mean_sigma = sigmas.iter().sum::<f64>() / sigmas.len().max(1) as f64;
    let drift = summary
        .volatility_slope
        .filter(|_| mean_sigma > 0.0)
        .map(|slope| slope * sweep_config.max_q as f64 / mean_sigma);
    match drift {
        Some(slope) if slope > 0.1 => println!(
            "  {} sigma(q) rises with q: positive serial correlation (trending).",
            "→".yellow()
        ),
        Some(slope) if slope < -0.1 => println!(
            "  {} sigma(q) falls with q: negative serial correlation (mean reversion).",
            "→".yellow()
        ),
        _ => println!("  {} sigma(q) is flat.", "→".yellow()),
    }

    if let Some(output) = &args.output {
        save_sweep_csv(output, &report)?;
        println!("\n{} {}", "Saved sweep to".green(), output.display());
    }

    println!("\n{}", "Done!".green().bold());
    Ok(())
}
