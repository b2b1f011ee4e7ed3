//! Variance ratio sweep over aggregation lengths q = 1..=max_q

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::analysis::returns::sampled_returns;
use crate::analysis::statistics::{normal_two_sided_p_value, std_dev};
use crate::analysis::variance_ratio::{
    heteroskedastic_z_statistic, variance_c, variance_ratio, z_statistic,
};
use crate::error::{AnalysisError, Result};

/// Sweep parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepConfig {
    /// Largest aggregation length
    pub max_q: usize,
    /// Annualization factor: 252 for daily, 12 for monthly data
    pub periods_per_year: f64,
    /// Level below which a p-value rejects the random walk
    pub significance: f64,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            max_q: 100,
            periods_per_year: 252.0,
            significance: 0.05,
        }
    }
}

impl SweepConfig {
    pub fn new(max_q: usize, periods_per_year: f64) -> Self {
        Self {
            max_q,
            periods_per_year,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_q < 1 {
            return Err(AnalysisError::invalid("max_q must be at least 1"));
        }
        if !(self.periods_per_year.is_finite() && self.periods_per_year > 0.0) {
            return Err(AnalysisError::invalid(format!(
                "periods_per_year must be positive, got {}",
                self.periods_per_year
            )));
        }
        if !(self.significance > 0.0 && self.significance < 1.0) {
            return Err(AnalysisError::invalid(format!(
                "significance must lie in (0, 1), got {}",
                self.significance
            )));
        }
        Ok(())
    }
}

/// Results for one aggregation length. `None` marks a value that could not
/// be computed; `error` then holds the first reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepPoint {
    pub q: usize,
    pub variance: Option<f64>,
    pub variance_ratio: Option<f64>,
    pub z_statistic: Option<f64>,
    pub z_star: Option<f64>,
    pub p_value: Option<f64>,
    pub scaled_volatility: Option<f64>,
    pub error: Option<String>,
}

impl SweepPoint {
    pub fn is_significant(&self, significance: f64) -> bool {
        self.p_value.map_or(false, |p| p < significance)
    }
}

/// Annualized volatility of q-period returns, rescaled to one period
///
/// `sigma(q) = sqrt(periods_per_year / q) · stddev(X[q] - X[0], X[2q] - X[q], ...)`.
/// Flat in q for a random walk. `None` with fewer than two q-period returns.
pub fn scaled_volatility(log_prices: &[f64], q: usize, periods_per_year: f64) -> Option<f64> {
    let sampled = sampled_returns(log_prices, q);
    if sampled.len() < 2 {
        return None;
    }
    Some((periods_per_year / q as f64).sqrt() * std_dev(&sampled))
}

/// Keep a computed value, remembering the first failure of this q.
fn keep(what: &str, result: Result<f64>, error: &mut Option<String>) -> Option<f64> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            if error.is_none() {
                *error = Some(format!("{}: {}", what, err));
            }
            None
        }
    }
}

fn sweep_point(log_prices: &[f64], q: usize, config: &SweepConfig) -> SweepPoint {
    let mut error = None;

    let variance = keep("variance", variance_c(log_prices, q), &mut error);
    let ratio = keep("variance ratio", variance_ratio(log_prices, q), &mut error);

    // z is undefined at q = 1
    let (z, z_star) = if q >= 2 {
        (
            keep("z-statistic", z_statistic(log_prices, q), &mut error),
            keep(
                "z*-statistic",
                heteroskedastic_z_statistic(log_prices, q),
                &mut error,
            ),
        )
    } else {
        (None, None)
    };

    if let Some(reason) = &error {
        warn!(q, "Aggregation length has missing values: {}", reason);
    }

    SweepPoint {
        q,
        variance,
        variance_ratio: ratio,
        z_statistic: z,
        z_star,
        p_value: z.map(normal_two_sided_p_value),
        scaled_volatility: scaled_volatility(log_prices, q, config.periods_per_year),
        error,
    }
}

/// Run the test for every q in `1..=config.max_q`.
///
/// Fails only for a series shorter than two observations or an invalid
/// configuration; a q that cannot be evaluated yields a point with missing
/// values. Points are ordered by q.
pub fn sweep(log_prices: &[f64], config: &SweepConfig) -> Result<SweepReport> {
    config.validate()?;
    if log_prices.len() < 2 {
        return Err(AnalysisError::invalid(format!(
            "series needs at least 2 observations, got {}",
            log_prices.len()
        )));
    }

    let increments = log_prices.len() - 1;
    debug!(increments, max_q = config.max_q, "Starting variance ratio sweep");

    #[cfg(feature = "parallel")]
    let points: Vec<SweepPoint> = (1..=config.max_q)
        .into_par_iter()
        .map(|q| sweep_point(log_prices, q, config))
        .collect();

    #[cfg(not(feature = "parallel"))]
    let points: Vec<SweepPoint> = (1..=config.max_q)
        .map(|q| sweep_point(log_prices, q, config))
        .collect();

    let report = SweepReport {
        config: config.clone(),
        increments,
        points,
    };

    info!(
        "Sweep done: {} aggregation lengths, {} significant at {}",
        report.points.len(),
        report.significant_points().len(),
        config.significance
    );

    Ok(report)
}

/// Ordered sweep results with aligned accessors indexed by q
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepReport {
    pub config: SweepConfig,
    /// Number of single-period increments of the tested series
    pub increments: usize,
    pub points: Vec<SweepPoint>,
}

impl SweepReport {
    pub fn point(&self, q: usize) -> Option<&SweepPoint> {
        q.checked_sub(1).and_then(|i| self.points.get(i))
    }

    pub fn qs(&self) -> Vec<usize> {
        self.points.iter().map(|p| p.q).collect()
    }

    pub fn variances(&self) -> Vec<Option<f64>> {
        self.points.iter().map(|p| p.variance).collect()
    }

    pub fn z_statistics(&self) -> Vec<Option<f64>> {
        self.points.iter().map(|p| p.z_statistic).collect()
    }

    pub fn p_values(&self) -> Vec<Option<f64>> {
        self.points.iter().map(|p| p.p_value).collect()
    }

    pub fn scaled_volatilities(&self) -> Vec<Option<f64>> {
        self.points.iter().map(|p| p.scaled_volatility).collect()
    }

    pub fn significant_points(&self) -> Vec<&SweepPoint> {
        self.points
            .iter()
            .filter(|p| p.is_significant(self.config.significance))
            .collect()
    }

    /// OLS slope of sigma(q) against q over the available points.
    ///
    /// Positive for positively autocorrelated returns, about zero for a
    /// random walk.
    pub fn volatility_slope(&self) -> Option<f64> {
        let pairs: Vec<(f64, f64)> = self
            .points
            .iter()
            .filter_map(|p| p.scaled_volatility.map(|s| (p.q as f64, s)))
            .collect();
        if pairs.len() < 2 {
            return None;
        }

        let n = pairs.len() as f64;
        let mean_q = pairs.iter().map(|(q, _)| q).sum::<f64>() / n;
        let mean_s = pairs.iter().map(|(_, s)| s).sum::<f64>() / n;
        let num: f64 = pairs
            .iter()
            .map(|(q, s)| (q - mean_q) * (s - mean_s))
            .sum();
        let den: f64 = pairs.iter().map(|(q, _)| (q - mean_q).powi(2)).sum();

        if den == 0.0 {
            None
        } else {
            Some(num / den)
        }
    }

    pub fn summary(&self) -> SweepSummary {
        let tested = self.points.iter().filter(|p| p.p_value.is_some()).count();
        let missing = self.points.iter().filter(|p| p.error.is_some()).count();
        let min_p = self
            .points
            .iter()
            .filter_map(|p| p.p_value.map(|v| (p.q, v)))
            .fold(None, |best: Option<(usize, f64)>, (q, v)| match best {
                Some((_, b)) if b <= v => best,
                _ => Some((q, v)),
            });

        SweepSummary {
            tested,
            significant: self.significant_points().len(),
            missing,
            min_p_value: min_p,
            volatility_slope: self.volatility_slope(),
        }
    }
}

/// Headline numbers of a sweep
#[derive(Debug, Clone, PartialEq)]
pub struct SweepSummary {
    /// Aggregation lengths with a p-value
    pub tested: usize,
    pub significant: usize,
    /// Aggregation lengths with at least one missing value
    pub missing: usize,
    /// (q, p-value) of the strongest rejection
    pub min_p_value: Option<(usize, f64)>,
    pub volatility_slope: Option<f64>,
}

impl SweepSummary {
    pub fn display(&self) -> String {
        let min_p = match self.min_p_value {
            Some((q, p)) => format!("{:.4} (q={})", p, q),
            None => "n/a".to_string(),
        };
        let slope = match self.volatility_slope {
            Some(s) => format!("{:.6}", s),
            None => "n/a".to_string(),
        };
        format!(
            "Tested: {}\nSignificant: {}\nMissing: {}\nMin p-value: {}\nVolatility slope: {}",
            self.tested, self.significant, self.missing, min_p, slope
        )
    }
}
