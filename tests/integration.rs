//! Integration tests for the variance ratio pipeline

use chrono::{Duration, TimeZone, Utc};
use random_walk_analysis::analysis::{
    cumulative_log_prices, log_differences, reconstruct_prices, sweep, variance_c, z_statistic,
    SweepConfig, VarianceRatioAnalyzer,
};
use random_walk_analysis::api::{load_price_series, save_price_series, CsvFormat};
use random_walk_analysis::config::parse_config;
use random_walk_analysis::report::save_sweep_csv;
use random_walk_analysis::simulation::{prices_from_log_path, simulate_random_walk};
use random_walk_analysis::{AnalysisError, PricePoint, PriceSeries};
use tempfile::NamedTempFile;

#[test]
fn test_hand_computed_variance_from_prices() {
    let returns = [0.01, -0.02, 0.015, 0.005, -0.01];
    let prices = reconstruct_prices(100.0, &returns);
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let points = prices
        .iter()
        .enumerate()
        .map(|(i, p)| PricePoint::new(start + Duration::days(i as i64), *p))
        .collect();
    let series = PriceSeries::new("hand", points).unwrap();

    let analyzer = VarianceRatioAnalyzer::from_prices(&series).unwrap();
    assert_eq!(analyzer.increments(), 5);
    assert!((analyzer.variance_c(1).unwrap() - 0.0002125).abs() < 1e-9);

    // Re-differencing the log prices recovers the returns
    for (a, b) in series.log_returns().values().iter().zip(returns.iter()) {
        assert!((a - b).abs() < 1e-12);
    }
}

#[test]
fn test_csv_to_sweep_pipeline() {
    let start = Utc.with_ymd_and_hms(2015, 1, 1, 0, 0, 0).unwrap();
    let path = simulate_random_walk(1_500, 0.0002, 0.012, 99).unwrap();
    let series = prices_from_log_path("sim", &path, 250.0, start).unwrap();

    let file = NamedTempFile::new().unwrap();
    save_price_series(file.path(), &series).unwrap();
    let loaded = load_price_series(file.path(), &CsvFormat::price_file()).unwrap();
    assert_eq!(loaded.len(), series.len());

    let config = parse_config("[analysis]\nmax_q = 30\n").unwrap();
    let report = sweep(&loaded.log_prices(), &config.analysis.sweep_config()).unwrap();

    assert_eq!(report.points.len(), 30);
    assert_eq!(report.increments, 1_500);
    for point in &report.points[1..] {
        let p = point.p_value.unwrap();
        assert!((0.0..=1.0).contains(&p));
        assert!(point.scaled_volatility.is_some());
    }

    let out = NamedTempFile::new().unwrap();
    save_sweep_csv(out.path(), &report).unwrap();
    let written = std::fs::read_to_string(out.path()).unwrap();
    assert_eq!(written.lines().count(), 31);
}

#[test]
fn test_round_trip_through_cumulative_logs() {
    let returns: Vec<f64> = (0..50).map(|i| ((i * 37) % 11) as f64 / 1000.0 - 0.005).collect();
    let path = cumulative_log_prices(42.0, &returns);
    let recovered = log_differences(&path);
    assert_eq!(recovered.len(), returns.len());
    for (a, b) in recovered.iter().zip(returns.iter()) {
        assert!((a - b).abs() < 1e-12);
    }
}

#[test]
fn test_error_kinds() {
    let constant = vec![1.5; 30];
    assert!(matches!(
        z_statistic(&constant, 4),
        Err(AnalysisError::NumericDegeneracy(_))
    ));
    assert!(matches!(
        z_statistic(&constant, 1),
        Err(AnalysisError::InvalidParameter(_))
    ));
    assert!(matches!(
        variance_c(&constant, 30),
        Err(AnalysisError::InvalidParameter(_))
    ));
    assert!(matches!(
        sweep(&[0.0], &SweepConfig::default()),
        Err(AnalysisError::InvalidParameter(_))
    ));
}
