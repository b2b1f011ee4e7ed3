//! Autocorrelation of returns
//!
//! Variance ratios above 1 come from positive autocorrelations, below 1
//! from negative ones. These helpers show which lags drive the result.

use crate::analysis::statistics::mean;

/// Sample autocorrelation for lags `0..=max_lag`
///
/// `ρ(k) = Σ (x[t] - m)(x[t-k] - m) / Σ (x[t] - m)²`
pub fn acf(data: &[f64], max_lag: usize) -> Vec<f64> {
    let n = data.len();
    if n < 2 {
        return vec![];
    }

    let max_lag = max_lag.min(n - 1);
    let m = mean(data);
    let c0: f64 = data.iter().map(|x| (x - m).powi(2)).sum();

    if c0 == 0.0 {
        return vec![1.0; max_lag + 1];
    }

    (0..=max_lag)
        .map(|lag| {
            let ck: f64 = data[lag..]
                .iter()
                .zip(data[..n - lag].iter())
                .map(|(a, b)| (a - m) * (b - m))
                .sum();
            ck / c0
        })
        .collect()
}

/// Half-width of the white-noise band for ACF values
pub fn confidence_bounds(n: usize, confidence: f64) -> f64 {
    let z = match confidence {
        c if c >= 0.99 => 2.576,
        c if c >= 0.95 => 1.96,
        c if c >= 0.90 => 1.645,
        _ => 1.96,
    };
    z / (n as f64).sqrt()
}

/// Ljung-Box test
///
/// H0: autocorrelations up to `lags` are all zero
pub fn ljung_box_test(data: &[f64], lags: usize) -> LjungBoxResult {
    let n = data.len();
    let acf_values = acf(data, lags);

    if acf_values.len() < 2 {
        return LjungBoxResult {
            statistic: f64::NAN,
            p_value: 1.0,
            lags,
            is_significant: false,
        };
    }

    let used_lags = acf_values.len() - 1;

    // Q = n(n+2) * Σ(ρ²_k / (n-k))
    let q: f64 = acf_values[1..]
        .iter()
        .enumerate()
        .map(|(k, rho)| rho * rho / (n - (k + 1)) as f64)
        .sum::<f64>()
        * n as f64
        * (n + 2) as f64;

    let p_value = chi2_survival(q, used_lags);

    LjungBoxResult {
        statistic: q,
        p_value,
        lags: used_lags,
        is_significant: p_value < 0.05,
    }
}

#[derive(Debug, Clone)]
pub struct LjungBoxResult {
    pub statistic: f64,
    pub p_value: f64,
    pub lags: usize,
    pub is_significant: bool,
}

fn chi2_survival(x: f64, df: usize) -> f64 {
    use statrs::distribution::{ChiSquared, ContinuousCDF};

    if let Ok(chi2) = ChiSquared::new(df as f64) {
        1.0 - chi2.cdf(x)
    } else {
        1.0
    }
}
