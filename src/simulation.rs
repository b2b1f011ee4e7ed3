//! Synthetic price paths for checking the variance ratio test.
//!
//! All generators are seeded so results are reproducible.

use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use tracing::debug;

use crate::analysis::{mean, variance, z_statistic};
use crate::error::{AnalysisError, Result};
use crate::types::{PricePoint, PriceSeries};

/// Observations discarded before an AR(1) path is recorded
const BURN_IN: usize = 100;

fn increments(mean: f64, sigma: f64) -> Result<Normal<f64>> {
    if !(sigma.is_finite() && sigma >= 0.0) {
        return Err(AnalysisError::invalid(format!(
            "increment volatility must be finite and non-negative, got {}",
            sigma
        )));
    }
    Normal::new(mean, sigma)
        .map_err(|e| AnalysisError::invalid(format!("invalid increment distribution: {}", e)))
}

/// Gaussian random walk in log prices, `n + 1` points starting at 0.
pub fn simulate_random_walk(n: usize, drift: f64, sigma: f64, seed: u64) -> Result<Vec<f64>> {
    let normal = increments(drift, sigma)?;
    let mut rng = StdRng::seed_from_u64(seed);

    let mut path = Vec::with_capacity(n + 1);
    let mut level = 0.0;
    path.push(level);
    for _ in 0..n {
        level += normal.sample(&mut rng);
        path.push(level);
    }
    Ok(path)
}

/// Returns following `r[t] = φ·r[t-1] + ε[t]`, `ε ~ N(0, σ²)`.
///
/// `φ > 0` gives positive serial correlation at lag 1.
pub fn simulate_ar1_returns(n: usize, phi: f64, sigma: f64, seed: u64) -> Result<Vec<f64>> {
    if !(phi.abs() < 1.0) {
        return Err(AnalysisError::invalid(format!(
            "AR(1) coefficient must satisfy |phi| < 1, got {}",
            phi
        )));
    }
    let normal = increments(0.0, sigma)?;
    let mut rng = StdRng::seed_from_u64(seed);

    let mut previous = 0.0;
    let mut returns = Vec::with_capacity(n);
    for i in 0..n + BURN_IN {
        previous = phi * previous + normal.sample(&mut rng);
        if i >= BURN_IN {
            returns.push(previous);
        }
    }
    Ok(returns)
}

/// Turn a log-price path into a daily price series starting at `start_price`.
pub fn prices_from_log_path(
    name: &str,
    log_path: &[f64],
    start_price: f64,
    start: DateTime<Utc>,
) -> Result<PriceSeries> {
    let origin = log_path.first().copied().unwrap_or(0.0);
    let points = log_path
        .iter()
        .enumerate()
        .map(|(i, x)| {
            PricePoint::new(
                start + Duration::days(i as i64),
                start_price * (x - origin).exp(),
            )
        })
        .collect();
    PriceSeries::new(name, points)
}

/// Empirical distribution of z(q) over simulated random walks
#[derive(Debug, Clone, PartialEq)]
pub struct Calibration {
    pub trials: usize,
    pub increments: usize,
    pub q: usize,
    pub mean: f64,
    pub variance: f64,
    /// Share of trials with |z| > 1.96
    pub rejection_rate: f64,
}

impl Calibration {
    pub fn display(&self) -> String {
        format!(
            "Trials: {}\nIncrements: {}\nq: {}\nMean z: {:.4}\nVariance z: {:.4}\nRejection rate (5%): {:.4}",
            self.trials, self.increments, self.q, self.mean, self.variance, self.rejection_rate
        )
    }
}

/// Monte Carlo check that z(q) is close to N(0, 1) under the null.
pub fn calibrate_z(trials: usize, n: usize, q: usize, seed: u64) -> Result<Calibration> {
    if trials < 2 {
        return Err(AnalysisError::invalid("calibration needs at least 2 trials"));
    }

    let zs = (0..trials)
        .map(|i| {
            let path = simulate_random_walk(n, 0.0, 1.0, seed.wrapping_add(i as u64))?;
            z_statistic(&path, q)
        })
        .collect::<Result<Vec<f64>>>()?;

    let rejections = zs.iter().filter(|z| z.abs() > 1.96).count();
    debug!(trials, n, q, rejections, "Calibration finished");

    Ok(Calibration {
        trials,
        increments: n,
        q,
        mean: mean(&zs),
        variance: variance(&zs),
        rejection_rate: rejections as f64 / trials as f64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_random_walk_is_reproducible() {
        let a = simulate_random_walk(100, 0.0, 0.01, 42).unwrap();
        let b = simulate_random_walk(100, 0.0, 0.01, 42).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 101);
        assert_eq!(a[0], 0.0);
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(simulate_random_walk(10, 0.0, -1.0, 1).is_err());
        assert!(simulate_random_walk(10, 0.0, f64::NAN, 1).is_err());
        assert!(simulate_ar1_returns(10, 0.2, -0.01, 1).is_err());
        assert!(simulate_random_walk(10, 0.0, 0.0, 1).is_ok());
        assert!(simulate_ar1_returns(10, 1.0, 0.01, 1).is_err());
        assert!(calibrate_z(1, 100, 2, 1).is_err());
    }

    #[test]
    fn test_ar1_has_positive_lag_one_correlation() {
        let r = simulate_ar1_returns(5_000, 0.5, 0.01, 3).unwrap();
        let m = mean(&r);
        let num: f64 = r.windows(2).map(|w| (w[0] - m) * (w[1] - m)).sum();
        let den: f64 = r.iter().map(|x| (x - m).powi(2)).sum();
        assert!((num / den - 0.5).abs() < 0.05);
    }

    #[test]
    fn test_prices_from_log_path() {
        let start = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let series = prices_from_log_path("sim", &[0.5, 0.6, 0.4], 100.0, start).unwrap();
        assert_eq!(series.len(), 3);
        assert!((series.prices()[0] - 100.0).abs() < 1e-12);
        assert!((series.prices()[1] - 100.0 * 0.1f64.exp()).abs() < 1e-9);
        assert_eq!(series.points()[2].timestamp, start + Duration::days(2));
    }

    #[test]
    fn test_z_statistic_is_calibrated() {
        let calibration = calibrate_z(300, 1_000, 5, 2024).unwrap();
        assert!(calibration.mean.abs() < 0.3);
        assert!(calibration.variance > 0.6 && calibration.variance < 1.4);
        assert!(calibration.rejection_rate < 0.12);
    }
}
