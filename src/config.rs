//! Configuration management
//!
//! Settings come from a TOML (or JSON) file, then environment variables,
//! then command-line flags, each layer overriding the previous one.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::analysis::SweepConfig;
use crate::api::CsvFormat;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(String),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub analysis: AnalysisSettings,

    #[serde(default)]
    pub data: DataSettings,

    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Variance ratio test settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSettings {
    /// Annualization factor (252 trading days, 12 for monthly data)
    #[serde(default = "default_periods_per_year")]
    pub periods_per_year: f64,

    /// Largest aggregation length of the sweep
    #[serde(default = "default_max_q")]
    pub max_q: usize,

    /// Significance level of the z-test
    #[serde(default = "default_significance")]
    pub significance: f64,
}

fn default_periods_per_year() -> f64 {
    252.0
}

fn default_max_q() -> usize {
    100
}

fn default_significance() -> f64 {
    0.05
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            periods_per_year: default_periods_per_year(),
            max_q: default_max_q(),
            significance: default_significance(),
        }
    }
}

impl AnalysisSettings {
    pub fn sweep_config(&self) -> SweepConfig {
        SweepConfig {
            max_q: self.max_q,
            periods_per_year: self.periods_per_year,
            significance: self.significance,
        }
    }
}

/// Data source settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSettings {
    /// Symbol requested from the market data API
    #[serde(default = "default_symbol")]
    pub symbol: String,

    /// First day of the requested range
    #[serde(default)]
    pub start: Option<NaiveDate>,

    /// Last day of the requested range, today when absent
    #[serde(default)]
    pub end: Option<NaiveDate>,

    /// Range length used when `start` is absent
    #[serde(default = "default_lookback_days")]
    pub lookback_days: i64,

    /// Use the provider's testnet
    #[serde(default)]
    pub testnet: bool,

    /// Column mapping of price files
    #[serde(default)]
    pub csv: CsvFormat,
}

fn default_symbol() -> String {
    "BTCUSDT".to_string()
}

fn default_lookback_days() -> i64 {
    1825
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            symbol: default_symbol(),
            start: None,
            end: None,
            lookback_days: default_lookback_days(),
            testnet: false,
            csv: CsvFormat::default(),
        }
    }
}

impl DataSettings {
    /// Resolve the requested range against `now`.
    pub fn date_range(&self, now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        let end = self
            .end
            .and_then(|d| d.and_hms_opt(23, 59, 59))
            .map(|d| d.and_utc())
            .unwrap_or(now);
        let start = self
            .start
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|d| d.and_utc())
            .unwrap_or(end - Duration::days(self.lookback_days));
        (start, end)
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Default filter directive for this crate
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.analysis
            .sweep_config()
            .validate()
            .map_err(|e| ConfigError::ValidationError(e.to_string()))?;

        if self.data.symbol.trim().is_empty() {
            return Err(ConfigError::ValidationError("symbol is empty".to_string()));
        }
        if let (Some(start), Some(end)) = (self.data.start, self.data.end) {
            if start >= end {
                return Err(ConfigError::ValidationError(format!(
                    "start {} must precede end {}",
                    start, end
                )));
            }
        }
        if self.data.lookback_days < 1 {
            return Err(ConfigError::ValidationError(
                "lookback_days must be positive".to_string(),
            ));
        }
        self.data
            .csv
            .delimiter_byte()
            .map_err(|e| ConfigError::ValidationError(e.to_string()))?;
        Ok(())
    }

    /// Override settings from `VR_PERIODS_PER_YEAR`, `VR_MAX_Q`,
    /// `VR_SIGNIFICANCE` and `VR_SYMBOL`.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(value) = std::env::var("VR_PERIODS_PER_YEAR") {
            self.analysis.periods_per_year = parse_env("VR_PERIODS_PER_YEAR", &value)?;
        }
        if let Ok(value) = std::env::var("VR_MAX_Q") {
            self.analysis.max_q = parse_env("VR_MAX_Q", &value)?;
        }
        if let Ok(value) = std::env::var("VR_SIGNIFICANCE") {
            self.analysis.significance = parse_env("VR_SIGNIFICANCE", &value)?;
        }
        if let Ok(symbol) = std::env::var("VR_SYMBOL") {
            self.data.symbol = symbol;
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| ConfigError::ParseError(format!("{}={}: {}", name, value, e)))
}

/// Parse configuration text: JSON when it starts with `{`, TOML otherwise.
pub fn parse_config(content: &str) -> Result<AppConfig, ConfigError> {
    let config: AppConfig = if content.trim_start().starts_with('{') {
        serde_json::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?
    } else {
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?
    };
    config.validate()?;
    Ok(config)
}

/// Load configuration from file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Defaults, or the given file, with environment overrides applied.
pub fn load_config_with_env(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut config = match path {
        Some(p) => load_config(p)?,
        None => AppConfig::default(),
    };
    config.apply_env_overrides()?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.analysis.periods_per_year, 252.0);
        assert_eq!(config.analysis.max_q, 100);
        assert_eq!(config.analysis.significance, 0.05);
        assert_eq!(config.data.symbol, "BTCUSDT");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_toml() {
        let content = r#"
            [analysis]
            periods_per_year = 12.0
            max_q = 24

            [data]
            symbol = "ETHUSDT"
            start = "2020-01-01"
            end = "2023-12-31"

            [data.csv]
            delimiter = ";"
            decimal_separator = ","
            price_column = 1
        "#;
        let config = parse_config(content).unwrap();
        assert_eq!(config.analysis.periods_per_year, 12.0);
        assert_eq!(config.analysis.max_q, 24);
        assert_eq!(config.analysis.significance, 0.05);
        assert_eq!(config.data.symbol, "ETHUSDT");
        assert_eq!(config.data.csv.delimiter, ';');
        assert_eq!(config.data.csv.decimal_separator, ',');
        assert_eq!(config.data.csv.price_column, 1);
        assert!(config.data.csv.has_header);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_parse_json() {
        let config = parse_config(r#"{"analysis": {"max_q": 10}}"#).unwrap();
        assert_eq!(config.analysis.max_q, 10);
        assert_eq!(config.analysis.periods_per_year, 252.0);
    }

    #[test]
    fn test_rejects_invalid_values() {
        assert!(matches!(
            parse_config("[analysis]\nmax_q = 0\n"),
            Err(ConfigError::ValidationError(_))
        ));
        assert!(matches!(
            parse_config("[data]\nstart = \"2024-01-01\"\nend = \"2023-01-01\"\n"),
            Err(ConfigError::ValidationError(_))
        ));
        assert!(matches!(
            parse_config("[analysis\n"),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_date_range() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let settings = DataSettings {
            lookback_days: 30,
            ..Default::default()
        };
        let (start, end) = settings.date_range(now);
        assert_eq!(end, now);
        assert_eq!(start, now - Duration::days(30));

        let settings = DataSettings {
            start: NaiveDate::from_ymd_opt(2024, 1, 1),
            end: NaiveDate::from_ymd_opt(2024, 2, 1),
            ..Default::default()
        };
        let (start, end) = settings.date_range(now);
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2024, 2, 1, 23, 59, 59).unwrap());
    }

    #[test]
    fn test_parse_env_value() {
        assert_eq!(parse_env::<usize>("VR_MAX_Q", " 20 ").unwrap(), 20);
        assert!(parse_env::<f64>("VR_PERIODS_PER_YEAR", "abc").is_err());
    }
}
