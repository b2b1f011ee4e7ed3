//! Price data in delimited text files

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use csv::{ReaderBuilder, Writer};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::info;

use crate::error::{AnalysisError, DataError, Result};
use crate::types::{Candle, PricePoint, PriceSeries};

/// Column mapping of a price file
///
/// The default reads the candle files written by [`save_candles`]:
/// comma separated, with header, date in column 0 and close in column 4.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CsvFormat {
    #[serde(default = "default_delimiter")]
    pub delimiter: char,

    #[serde(default = "default_has_header")]
    pub has_header: bool,

    /// Zero-based index of the date column
    #[serde(default)]
    pub date_column: usize,

    /// Zero-based index of the adjusted price column
    #[serde(default = "default_price_column")]
    pub price_column: usize,

    /// chrono format of dates that are not RFC 3339
    #[serde(default = "default_date_format")]
    pub date_format: String,

    #[serde(default = "default_decimal_separator")]
    pub decimal_separator: char,
}

fn default_delimiter() -> char {
    ','
}

fn default_has_header() -> bool {
    true
}

fn default_price_column() -> usize {
    4
}

fn default_date_format() -> String {
    "%Y-%m-%d".to_string()
}

fn default_decimal_separator() -> char {
    '.'
}

impl Default for CsvFormat {
    fn default() -> Self {
        Self {
            delimiter: default_delimiter(),
            has_header: default_has_header(),
            date_column: 0,
            price_column: default_price_column(),
            date_format: default_date_format(),
            decimal_separator: default_decimal_separator(),
        }
    }
}

impl CsvFormat {
    /// Layout written by [`save_price_series`]: `timestamp,price`
    pub fn price_file() -> Self {
        Self {
            price_column: 1,
            ..Default::default()
        }
    }

    pub fn delimiter_byte(&self) -> Result<u8> {
        if !self.delimiter.is_ascii() {
            return Err(AnalysisError::invalid(format!(
                "delimiter '{}' is not an ASCII character",
                self.delimiter
            )));
        }
        if self.delimiter == self.decimal_separator {
            return Err(AnalysisError::invalid(format!(
                "delimiter and decimal separator are both '{}'",
                self.delimiter
            )));
        }
        Ok(self.delimiter as u8)
    }

    fn parse_date(&self, value: &str) -> Option<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
            return Some(dt.with_timezone(&Utc));
        }
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, &self.date_format) {
            return Some(dt.and_utc());
        }
        NaiveDate::parse_from_str(value, &self.date_format)
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc())
    }

    fn parse_price(&self, value: &str) -> Option<f64> {
        let normalized: String = if self.decimal_separator == '.' {
            value.to_string()
        } else {
            value
                .chars()
                .filter(|c| *c != '.')
                .map(|c| if c == self.decimal_separator { '.' } else { c })
                .collect()
        };
        normalized.parse().ok()
    }
}

/// Read a price series from any reader using the given column mapping.
///
/// Rows must already be in increasing date order.
pub fn read_price_series<R: Read>(
    reader: R,
    name: &str,
    format: &CsvFormat,
) -> Result<PriceSeries> {
    let mut reader = ReaderBuilder::new()
        .delimiter(format.delimiter_byte()?)
        .has_headers(format.has_header)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let mut points = Vec::new();

    for (i, result) in reader.records().enumerate() {
        let record = result?;
        let line = record
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(i + 1);

        let field = |column: usize, what: &str| {
            record.get(column).ok_or_else(|| DataError::Parse {
                line,
                message: format!("missing {} column {}", what, column),
            })
        };

        let date_text = field(format.date_column, "date")?;
        let timestamp = format.parse_date(date_text).ok_or_else(|| DataError::Parse {
            line,
            message: format!("invalid date '{}'", date_text),
        })?;

        let price_text = field(format.price_column, "price")?;
        let price = format.parse_price(price_text).ok_or_else(|| DataError::Parse {
            line,
            message: format!("invalid price '{}'", price_text),
        })?;

        points.push(PricePoint::new(timestamp, price));
    }

    PriceSeries::new(name, points)
}

/// Load a price series from a file; the file stem names the series.
pub fn load_price_series(path: &Path, format: &CsvFormat) -> Result<PriceSeries> {
    let file = File::open(path)?;
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();

    let series = read_price_series(file, &name, format)?;
    info!("Loaded {} prices from {}", series.len(), path.display());
    Ok(series)
}

/// Save a price series as `timestamp,price`.
pub fn save_price_series(path: &Path, series: &PriceSeries) -> Result<()> {
    let mut writer = Writer::from_path(path)?;
    writer.write_record(["timestamp", "price"])?;

    for point in series.points() {
        writer.write_record([point.timestamp.to_rfc3339(), point.price.to_string()])?;
    }

    writer.flush()?;
    Ok(())
}

/// Save candles as `timestamp,open,high,low,close,volume`.
pub fn save_candles(path: &Path, candles: &[Candle]) -> Result<()> {
    let mut writer = Writer::from_path(path)?;
    writer.write_record(["timestamp", "open", "high", "low", "close", "volume"])?;

    for candle in candles {
        writer.write_record([
            candle.timestamp.to_rfc3339(),
            candle.open.to_string(),
            candle.high.to_string(),
            candle.low.to_string(),
            candle.close.to_string(),
            candle.volume.to_string(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_format_reads_candle_file() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let candles: Vec<Candle> = (0..3)
            .map(|i| Candle {
                timestamp: start + Duration::days(i),
                open: 100.0,
                high: 110.0,
                low: 90.0,
                close: 100.0 + i as f64,
                volume: 1.5,
            })
            .collect();

        let file = NamedTempFile::new().unwrap();
        save_candles(file.path(), &candles).unwrap();

        let series = load_price_series(file.path(), &CsvFormat::default()).unwrap();
        assert_eq!(series.prices(), vec![100.0, 101.0, 102.0]);
        assert_eq!(series.points()[1].timestamp, start + Duration::days(1));
    }

    #[test]
    fn test_price_file_round_trip() {
        let start = Utc.with_ymd_and_hms(2023, 3, 1, 0, 0, 0).unwrap();
        let series = PriceSeries::new(
            "x",
            vec![
                PricePoint::new(start, 10.5),
                PricePoint::new(start + Duration::days(1), 10.25),
            ],
        )
        .unwrap();

        let file = NamedTempFile::new().unwrap();
        save_price_series(file.path(), &series).unwrap();
        let loaded = load_price_series(file.path(), &CsvFormat::price_file()).unwrap();
        assert_eq!(loaded.points(), series.points());
    }

    #[test]
    fn test_custom_column_mapping() {
        let data = "02.01.2024;1.234,50\n03.01.2024;1.240,00\n04.01.2024;1.236,75\n";
        let format = CsvFormat {
            delimiter: ';',
            has_header: false,
            date_column: 0,
            price_column: 1,
            date_format: "%d.%m.%Y".to_string(),
            decimal_separator: ',',
        };
        let series = read_price_series(data.as_bytes(), "eu", &format).unwrap();
        assert_eq!(series.prices(), vec![1234.5, 1240.0, 1236.75]);
        assert_eq!(
            series.points()[0].timestamp,
            Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_invalid_rows_are_reported() {
        let format = CsvFormat::price_file();

        let bad_price = "date,price\n2024-01-01,10\n2024-01-02,abc\n";
        match read_price_series(bad_price.as_bytes(), "x", &format) {
            Err(AnalysisError::DataAcquisition(DataError::Parse { line, .. })) => assert_eq!(line, 3),
            other => panic!("unexpected result: {:?}", other),
        }

        let bad_date = "date,price\nyesterday,10\n";
        assert!(matches!(
            read_price_series(bad_date.as_bytes(), "x", &format),
            Err(AnalysisError::DataAcquisition(DataError::Parse { .. }))
        ));

        let unordered = "date,price\n2024-01-02,10\n2024-01-01,11\n";
        assert!(matches!(
            read_price_series(unordered.as_bytes(), "x", &format),
            Err(AnalysisError::InvalidParameter(_))
        ));

        let negative = "date,price\n2024-01-01,10\n2024-01-02,-1\n";
        assert!(matches!(
            read_price_series(negative.as_bytes(), "x", &format),
            Err(AnalysisError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_missing_file_is_acquisition_error() {
        let result = load_price_series(Path::new("/nonexistent/prices.csv"), &CsvFormat::default());
        assert!(matches!(
            result,
            Err(AnalysisError::DataAcquisition(DataError::Io(_)))
        ));
    }

    #[test]
    fn test_conflicting_separators() {
        let format = CsvFormat {
            decimal_separator: ',',
            ..Default::default()
        };
        assert!(format.delimiter_byte().is_err());
    }
}
