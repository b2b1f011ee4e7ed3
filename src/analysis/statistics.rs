//! Descriptive statistics of return series

use statrs::function::erf::erfc;

/// Arithmetic mean, 0 for an empty slice
pub fn mean(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    data.iter().sum::<f64>() / data.len() as f64
}

/// Sample variance with the Bessel (n - 1) denominator
pub fn variance(data: &[f64]) -> f64 {
    let n = data.len();
    if n < 2 {
        return 0.0;
    }
    let m = mean(data);
    data.iter().map(|x| (x - m).powi(2)).sum::<f64>() / (n - 1) as f64
}

/// Sample standard deviation (n - 1)
pub fn std_dev(data: &[f64]) -> f64 {
    variance(data).sqrt()
}

/// Two-sided tail probability of a standard normal statistic: `2 * Φ(-|z|)`
pub fn normal_two_sided_p_value(z: f64) -> f64 {
    if !z.is_finite() {
        return if z.is_nan() { f64::NAN } else { 0.0 };
    }
    // 2·Φ(-|z|) = erfc(|z| / √2)
    erfc(z.abs() / std::f64::consts::SQRT_2)
}

/// Summary of a return series
#[derive(Debug, Clone)]
pub struct DescriptiveStats {
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
    pub skewness: f64,
    /// Excess kurtosis (0 for a normal distribution)
    pub kurtosis: f64,
}

impl DescriptiveStats {
    pub fn new(data: &[f64]) -> Self {
        let count = data.len();
        let m = mean(data);
        let std = std_dev(data);

        let min = data.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = data.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

        // Moment estimators around the mean, population denominator
        let (skewness, kurtosis) = if count > 2 {
            let n = count as f64;
            let m2 = data.iter().map(|x| (x - m).powi(2)).sum::<f64>() / n;
            let m3 = data.iter().map(|x| (x - m).powi(3)).sum::<f64>() / n;
            let m4 = data.iter().map(|x| (x - m).powi(4)).sum::<f64>() / n;
            if m2 > 0.0 {
                (m3 / m2.powf(1.5), m4 / (m2 * m2) - 3.0)
            } else {
                (0.0, 0.0)
            }
        } else {
            (f64::NAN, f64::NAN)
        };

        Self {
            count,
            mean: m,
            std,
            min,
            max,
            skewness,
            kurtosis,
        }
    }

    /// Standard deviation scaled to a yearly basis
    pub fn annualized_volatility(&self, periods_per_year: f64) -> f64 {
        self.std * periods_per_year.sqrt()
    }

    pub fn display(&self) -> String {
        format!(
            "Count: {}\nMean: {:.6}\nStd: {:.6}\nMin: {:.6}\nMax: {:.6}\nSkewness: {:.4}\nExcess kurtosis: {:.4}",
            self.count, self.mean, self.std, self.min, self.max, self.skewness, self.kurtosis
        )
    }
}
