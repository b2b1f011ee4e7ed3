//! Monte Carlo calibration of the variance ratio z-statistic
//!
//! Under a Gaussian random walk z(q) should be close to N(0, 1): mean 0,
//! variance 1 and a 5% rejection rate at |z| > 1.96.
//!
//! Usage:
//! ```
//! cargo run --bin calibrate_z -- --trials 1000 --n 1000 --q 2,5,10,20
//! ```

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use random_walk_analysis::init_logging;
use random_walk_analysis::simulation::calibrate_z;
use tabled::{Table, Tabled};

#[derive(Parser, Debug)]
#[command(author, version, about = "Calibrate the variance ratio z-statistic")]
struct Args {
    /// Simulated paths per aggregation length
    #[arg(short, long, default_value = "500")]
    trials: usize,

    /// Increments per path
    #[arg(short, long, default_value = "1000")]
    n: usize,

    /// Aggregation lengths
    #[arg(short, long, value_delimiter = ',', default_value = "2,5,10,20")]
    q: Vec<usize>,

    /// Base seed
    #[arg(short, long, default_value = "42")]
    seed: u64,
}

#[derive(Tabled)]
struct CalibrationRow {
    #[tabled(rename = "q")]
    q: usize,
    #[tabled(rename = "Mean z")]
    mean: String,
    #[tabled(rename = "Var z")]
    variance: String,
    #[tabled(rename = "Rejection (5%)")]
    rejection: String,
}

fn main() -> Result<()> {
    init_logging("info")?;
    let args = Args::parse();

    println!("{}", "=".repeat(60).blue());
    println!("{}", "Z-Statistic Calibration".bold().blue());
    println!("{}", "=".repeat(60).blue());
    println!(
        "\n{} trials of {} increments\n",
        args.trials.to_string().cyan(),
        args.n.to_string().cyan()
    );

    let mut rows = Vec::with_capacity(args.q.len());
    for &q in &args.q {
        let calibration = calibrate_z(args.trials, args.n, q, args.seed)?;
        let rejection = format!("{:.3}", calibration.rejection_rate);
        rows.push(CalibrationRow {
            q,
            mean: format!("{:.4}", calibration.mean),
            variance: format!("{:.4}", calibration.variance),
            rejection: if (calibration.rejection_rate - 0.05).abs() > 0.03 {
                rejection.yellow().to_string()
            } else {
                rejection.green().to_string()
            },
        });
    }

    println!("{}", Table::new(rows));
    println!("\n{}", "Done!".green().bold());
    Ok(())
}
