//! Conversions between prices, log prices and log returns

/// Successive differences of a log-price path
pub fn log_differences(log_prices: &[f64]) -> Vec<f64> {
    log_prices.windows(2).map(|w| w[1] - w[0]).collect()
}

/// Cumulative log-price path starting at `ln(initial_price)`
///
/// The path has `returns.len() + 1` points.
pub fn cumulative_log_prices(initial_price: f64, returns: &[f64]) -> Vec<f64> {
    let mut path = Vec::with_capacity(returns.len() + 1);
    let mut level = initial_price.ln();
    path.push(level);
    for r in returns {
        level += r;
        path.push(level);
    }
    path
}

/// Rebuild prices from log returns by summing logs and exponentiating
pub fn reconstruct_prices(initial_price: f64, returns: &[f64]) -> Vec<f64> {
    cumulative_log_prices(initial_price, returns)
        .into_iter()
        .map(f64::exp)
        .collect()
}

/// Log returns over `q` periods taken from every q-th point of the path
///
/// Uses `X[0], X[q], X[2q], ...`; a trailing partial block is dropped.
pub fn sampled_returns(log_prices: &[f64], q: usize) -> Vec<f64> {
    if q == 0 {
        return vec![];
    }
    let sampled: Vec<f64> = log_prices.iter().step_by(q).copied().collect();
    log_differences(&sampled)
}
