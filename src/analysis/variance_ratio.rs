//! Lo & MacKinlay (1988) variance ratio test
//!
//! All functions take the log-price path `X` of length `T + 1` (`T`
//! single-period increments) and an aggregation length `q`.
//!
//! H0: `X` is a random walk with uncorrelated increments, so the variance of
//! q-period increments is `q` times the single-period variance.

use crate::analysis::statistics::normal_two_sided_p_value;
use crate::error::{AnalysisError, Result};
use crate::types::PriceSeries;

/// Check the series and `q`, returning the number of increments `T`.
///
/// `q` must satisfy `1 <= q < T`: at `q = T` the normalizing constant of the
/// overlapping estimator is zero.
fn validate(log_prices: &[f64], q: usize) -> Result<usize> {
    if log_prices.len() < 2 {
        return Err(AnalysisError::invalid(format!(
            "series needs at least 2 observations, got {}",
            log_prices.len()
        )));
    }
    if let Some(i) = log_prices.iter().position(|x| !x.is_finite()) {
        return Err(AnalysisError::invalid(format!(
            "log price at index {} is not finite",
            i
        )));
    }

    let t = log_prices.len() - 1;
    if q < 1 {
        return Err(AnalysisError::invalid("aggregation length must be at least 1"));
    }
    if q >= t {
        return Err(AnalysisError::invalid(format!(
            "aggregation length {} must be smaller than the number of increments {}",
            q, t
        )));
    }
    Ok(t)
}

fn ensure_ratio_defined(q: usize) -> Result<()> {
    if q == 1 {
        return Err(AnalysisError::invalid(
            "z-statistic is undefined for q = 1 (scale factor divides by q - 1)",
        ));
    }
    Ok(())
}

/// Relative size below which the increments' spread counts as rounding noise
const DEGENERACY_TOLERANCE: f64 = 1e-12;

/// Reject a single-period variance that is zero up to floating-point noise.
///
/// Differencing log prices of magnitude `|X|` loses about `ε·|X|` per
/// increment, so a constant-growth path leaves `Vc(1)` at `ε²·|X|²`
/// instead of zero.
fn ensure_nondegenerate(log_prices: &[f64], v1: f64) -> Result<()> {
    let scale = log_prices.iter().fold(0.0_f64, |acc, x| acc.max(x.abs()));
    if !(v1.is_finite() && v1 > 0.0) || v1.sqrt() <= DEGENERACY_TOLERANCE * scale {
        return Err(AnalysisError::degenerate(format!(
            "single-period variance is {:e}, variance ratio undefined",
            v1
        )));
    }
    Ok(())
}

/// Average per-period drift `(X[T] - X[0]) / T`
fn drift(log_prices: &[f64], t: usize) -> f64 {
    (log_prices[t] - log_prices[0]) / t as f64
}

/// Overlapping q-period variance estimator `Vc(q)` (Lo & MacKinlay, eq. 12)
///
/// ```text
/// Vc(q) = Σ_{t=q}^{T} (X[t] - X[t-q] - q·μ)² / m,   m = (T-q)(T-q+1)q / T
/// ```
///
/// Windows start at every index, not every q-th one. With `q = 1` the
/// normalizer is `T - 1`, so `Vc(1)` is the Bessel-corrected sample
/// variance of the increments.
pub fn variance_c(log_prices: &[f64], q: usize) -> Result<f64> {
    let t = validate(log_prices, q)?;
    let (tf, qf) = (t as f64, q as f64);

    let mu = drift(log_prices, t);
    let m = (tf - qf) * (tf - qf + 1.0) * qf / tf;

    let sum_of_squares: f64 = log_prices
        .windows(q + 1)
        .map(|w| (w[q] - w[0] - qf * mu).powi(2))
        .sum();

    Ok(sum_of_squares / m)
}

/// `Vc(q) / Vc(1)`, equal to 1 at `q = 1`
pub fn variance_ratio(log_prices: &[f64], q: usize) -> Result<f64> {
    let vq = variance_c(log_prices, q)?;
    let v1 = variance_c(log_prices, 1)?;
    ensure_nondegenerate(log_prices, v1)?;
    Ok(vq / v1)
}

/// Homoskedastic test statistic `z(q) = c · (Vc(q)/Vc(1) - 1)`
///
/// `c = sqrt(T · 3q / (2(2q-1)(q-1)))`. Only defined for `q >= 2`; `q = 1`
/// is rejected with [`AnalysisError::InvalidParameter`].
pub fn z_statistic(log_prices: &[f64], q: usize) -> Result<f64> {
    let t = validate(log_prices, q)?;
    ensure_ratio_defined(q)?;
    let (tf, qf) = (t as f64, q as f64);

    let c = (tf * 3.0 * qf / (2.0 * (2.0 * qf - 1.0) * (qf - 1.0))).sqrt();
    let m = variance_ratio(log_prices, q)? - 1.0;

    Ok(c * m)
}

/// Heteroskedasticity-consistent statistic `z*(q) = sqrt(T) · M / sqrt(θ(q))`
///
/// ```text
/// θ(q) = Σ_{j=1}^{q-1} [2(q-j)/q]² δ(j)
/// δ(j) = T · Σ_{k=j+1}^{T} e²_k e²_{k-j} / (Σ_{k=1}^{T} e²_k)²
/// ```
///
/// with `e_k` the demeaned increments.
pub fn heteroskedastic_z_statistic(log_prices: &[f64], q: usize) -> Result<f64> {
    let t = validate(log_prices, q)?;
    ensure_ratio_defined(q)?;
    let (tf, qf) = (t as f64, q as f64);

    let m = variance_ratio(log_prices, q)? - 1.0;

    let mu = drift(log_prices, t);
    let squared: Vec<f64> = log_prices
        .windows(2)
        .map(|w| (w[1] - w[0] - mu).powi(2))
        .collect();
    let denominator = squared.iter().sum::<f64>().powi(2);

    let theta: f64 = (1..q)
        .map(|j| {
            let weight = (2.0 * (q - j) as f64 / qf).powi(2);
            let cross: f64 = squared[j..]
                .iter()
                .zip(squared.iter())
                .map(|(a, b)| a * b)
                .sum();
            weight * tf * cross / denominator
        })
        .sum();

    if !(theta.is_finite() && theta > 0.0) {
        return Err(AnalysisError::degenerate(format!(
            "asymptotic variance θ({}) is {}",
            q, theta
        )));
    }

    Ok(tf.sqrt() * m / theta.sqrt())
}

/// Outcome of the test at a single aggregation length
#[derive(Debug, Clone, PartialEq)]
pub struct VarianceRatioTest {
    pub q: usize,
    pub variance_ratio: f64,
    pub z_statistic: f64,
    pub z_star: f64,
    /// Two-sided p-value of `z_statistic`
    pub p_value: f64,
    pub is_significant: bool,
}

impl VarianceRatioTest {
    pub fn display(&self) -> String {
        format!(
            "q={}: VR={:.4}, z={:.4}, z*={:.4}, p-value={:.4}{}",
            self.q,
            self.variance_ratio,
            self.z_statistic,
            self.z_star,
            self.p_value,
            if self.is_significant { " *" } else { "" }
        )
    }
}

/// Variance ratio analysis of a single log-price path
#[derive(Debug, Clone)]
pub struct VarianceRatioAnalyzer {
    log_prices: Vec<f64>,
}

impl VarianceRatioAnalyzer {
    pub fn new(log_prices: Vec<f64>) -> Result<Self> {
        if log_prices.len() < 2 {
            return Err(AnalysisError::invalid(format!(
                "series needs at least 2 observations, got {}",
                log_prices.len()
            )));
        }
        Ok(Self { log_prices })
    }

    pub fn from_prices(series: &PriceSeries) -> Result<Self> {
        Self::new(series.log_prices())
    }

    pub fn log_prices(&self) -> &[f64] {
        &self.log_prices
    }

    /// Number of single-period increments `T`
    pub fn increments(&self) -> usize {
        self.log_prices.len() - 1
    }

    pub fn variance_c(&self, q: usize) -> Result<f64> {
        variance_c(&self.log_prices, q)
    }

    pub fn variance_ratio(&self, q: usize) -> Result<f64> {
        variance_ratio(&self.log_prices, q)
    }

    pub fn z_statistic(&self, q: usize) -> Result<f64> {
        z_statistic(&self.log_prices, q)
    }

    pub fn heteroskedastic_z_statistic(&self, q: usize) -> Result<f64> {
        heteroskedastic_z_statistic(&self.log_prices, q)
    }

    pub fn p_value(&self, q: usize) -> Result<f64> {
        self.z_statistic(q).map(normal_two_sided_p_value)
    }

    /// Full test at one aggregation length
    pub fn test(&self, q: usize, significance: f64) -> Result<VarianceRatioTest> {
        let z = self.z_statistic(q)?;
        let z_star = self.heteroskedastic_z_statistic(q)?;
        let p_value = normal_two_sided_p_value(z);

        Ok(VarianceRatioTest {
            q,
            variance_ratio: self.variance_ratio(q)?,
            z_statistic: z,
            z_star,
            p_value,
            is_significant: p_value < significance,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::returns::{cumulative_log_prices, log_differences};
    use crate::analysis::statistics::variance;

    fn example_path() -> Vec<f64> {
        cumulative_log_prices(1.0, &[0.01, -0.02, 0.015, 0.005, -0.01])
    }

    #[test]
    fn test_variance_c_hand_computed() {
        // Increments sum to zero, so μ = 0 and Vc(1) = Σr² / (T - 1)
        let x = example_path();
        let expected = (0.0001 + 0.0004 + 0.000225 + 0.000025 + 0.0001) / 4.0;
        let v1 = variance_c(&x, 1).unwrap();
        assert!((v1 - expected).abs() < 1e-9);
        assert!((v1 - 0.0002125).abs() < 1e-9);
    }

    #[test]
    fn test_variance_c_q2_hand_computed() {
        // 2-period sums: -0.01, -0.005, 0.02, -0.005; m = 3·4·2/5 = 4.8
        let x = example_path();
        let expected = (0.0001 + 0.000025 + 0.0004 + 0.000025) / 4.8;
        assert!((variance_c(&x, 2).unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_variance_c_one_is_sample_variance() {
        let x = cumulative_log_prices(50.0, &[0.03, 0.01, -0.004, 0.02, 0.007, -0.011, 0.015]);
        let increments = log_differences(&x);
        let v1 = variance_c(&x, 1).unwrap();
        assert!((v1 - variance(&increments)).abs() < 1e-12);
    }

    #[test]
    fn test_overlapping_windows_differ_from_disjoint_blocks() {
        let x = cumulative_log_prices(1.0, &[0.02, -0.01, 0.03, 0.0, -0.02, 0.01, 0.025, -0.015]);
        let t = x.len() - 1;
        let q = 2;
        let mu = (x[t] - x[0]) / t as f64;

        // Non-overlapping blocks X[0..2], X[2..4], ...
        let disjoint: f64 = (q..=t)
            .step_by(q)
            .map(|i| (x[i] - x[i - q] - q as f64 * mu).powi(2))
            .sum::<f64>()
            / (t / q - 1) as f64;

        let overlapping = variance_c(&x, q).unwrap();
        assert!((overlapping - disjoint).abs() > 1e-9);
    }

    #[test]
    fn test_constant_price_is_degenerate() {
        let x = vec![4.6; 20];
        for q in 1..10 {
            assert_eq!(variance_c(&x, q).unwrap(), 0.0);
        }
        assert!(matches!(
            z_statistic(&x, 2),
            Err(AnalysisError::NumericDegeneracy(_))
        ));
        assert!(matches!(
            heteroskedastic_z_statistic(&x, 3),
            Err(AnalysisError::NumericDegeneracy(_))
        ));
    }

    #[test]
    fn test_z_statistic_rejects_q_one() {
        let x = example_path();
        assert!(matches!(
            z_statistic(&x, 1),
            Err(AnalysisError::InvalidParameter(_))
        ));
        assert!(matches!(
            heteroskedastic_z_statistic(&x, 1),
            Err(AnalysisError::InvalidParameter(_))
        ));
        assert!((variance_ratio(&x, 1).unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_parameters() {
        let x = example_path();
        assert!(matches!(variance_c(&x, 0), Err(AnalysisError::InvalidParameter(_))));
        assert!(matches!(variance_c(&x, 5), Err(AnalysisError::InvalidParameter(_))));
        assert!(matches!(variance_c(&x, 6), Err(AnalysisError::InvalidParameter(_))));
        assert!(matches!(variance_c(&[0.0], 1), Err(AnalysisError::InvalidParameter(_))));
        assert!(matches!(variance_c(&[], 1), Err(AnalysisError::InvalidParameter(_))));
        assert!(matches!(
            variance_c(&[0.0, f64::NAN, 1.0], 1),
            Err(AnalysisError::InvalidParameter(_))
        ));
        assert!(VarianceRatioAnalyzer::new(vec![1.0]).is_err());
    }

    #[test]
    fn test_constant_growth_is_degenerate() {
        // 1% growth every period: increments are equal up to rounding
        let x: Vec<f64> = (0..60).map(|t| (100.0 * 1.01f64.powi(t)).ln()).collect();
        assert!(variance_c(&x, 1).unwrap() < 1e-20);

        for q in [2, 5, 10] {
            assert!(matches!(
                variance_ratio(&x, q),
                Err(AnalysisError::NumericDegeneracy(_))
            ));
            assert!(matches!(
                z_statistic(&x, q),
                Err(AnalysisError::NumericDegeneracy(_))
            ));
            assert!(matches!(
                heteroskedastic_z_statistic(&x, q),
                Err(AnalysisError::NumericDegeneracy(_))
            ));
        }
    }

    #[test]
    fn test_small_but_real_variance_is_kept() {
        // Daily moves of a basis point around a high log-price level
        let returns: Vec<f64> = (0..40).map(|i| if i % 3 == 0 { 1e-4 } else { -4e-5 }).collect();
        let x = cumulative_log_prices(1e6, &returns);
        assert!(variance_ratio(&x, 2).is_ok());
        assert!(z_statistic(&x, 2).is_ok());
    }

    #[test]
    fn test_z_statistic_matches_formula() {
        let x = cumulative_log_prices(1.0, &[0.02, -0.01, 0.03, 0.0, -0.02, 0.01, 0.025, -0.015]);
        let t: f64 = 8.0;
        let q: f64 = 3.0;
        let c = (t * 3.0 * q / (2.0 * (2.0 * q - 1.0) * (q - 1.0))).sqrt();
        let m = variance_c(&x, 3).unwrap() / variance_c(&x, 1).unwrap() - 1.0;
        assert!((z_statistic(&x, 3).unwrap() - c * m).abs() < 1e-12);
    }

    #[test]
    fn test_analyzer_test_result() {
        let x = cumulative_log_prices(
            1.0,
            &[0.02, -0.01, 0.03, 0.0, -0.02, 0.01, 0.025, -0.015, 0.004, -0.007],
        );
        let analyzer = VarianceRatioAnalyzer::new(x.clone()).unwrap();
        assert_eq!(analyzer.increments(), 10);

        let result = analyzer.test(2, 0.05).unwrap();
        assert_eq!(result.q, 2);
        assert!((result.z_statistic - z_statistic(&x, 2).unwrap()).abs() < 1e-12);
        assert!(result.p_value > 0.0 && result.p_value <= 1.0);
        assert_eq!(result.is_significant, result.p_value < 0.05);
    }
}
