//! Core data types: candles, price series and log returns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};

/// OHLCV candle as returned by the market data API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// A single (timestamp, adjusted price) observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub timestamp: DateTime<Utc>,
    pub price: f64,
}

impl PricePoint {
    pub fn new(timestamp: DateTime<Utc>, price: f64) -> Self {
        Self { timestamp, price }
    }
}

/// Ordered price observations.
///
/// Timestamps are strictly increasing and every price is positive and
/// finite. The series cannot be mutated after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    name: String,
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Validate and wrap the observations.
    pub fn new(name: impl Into<String>, points: Vec<PricePoint>) -> Result<Self> {
        if let Some((i, p)) = points
            .iter()
            .enumerate()
            .find(|(_, p)| !(p.price.is_finite() && p.price > 0.0))
        {
            return Err(AnalysisError::invalid(format!(
                "price at index {} must be positive and finite, got {}",
                i, p.price
            )));
        }

        if let Some(i) = points
            .windows(2)
            .position(|w| w[1].timestamp <= w[0].timestamp)
        {
            return Err(AnalysisError::invalid(format!(
                "timestamps must be strictly increasing, {} follows {} at index {}",
                points[i + 1].timestamp,
                points[i].timestamp,
                i + 1
            )));
        }

        Ok(Self {
            name: name.into(),
            points,
        })
    }

    /// Build a series from candle closes.
    pub fn from_candles(name: impl Into<String>, candles: &[Candle]) -> Result<Self> {
        let points = candles
            .iter()
            .map(|c| PricePoint::new(c.timestamp, c.close))
            .collect();
        Self::new(name, points)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn prices(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.price).collect()
    }

    pub fn timestamps(&self) -> Vec<DateTime<Utc>> {
        self.points.iter().map(|p| p.timestamp).collect()
    }

    /// Natural log of every price: the `X` series of the variance ratio test.
    pub fn log_prices(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.price.ln()).collect()
    }

    pub fn log_returns(&self) -> LogReturnSeries {
        LogReturnSeries::from_prices(self)
    }
}

/// `ln(P[t]) - ln(P[t-1])` for every consecutive pair of prices.
///
/// Each return is stamped with the timestamp of its closing observation,
/// so the first price has no return.
#[derive(Debug, Clone, PartialEq)]
pub struct LogReturnSeries {
    timestamps: Vec<DateTime<Utc>>,
    values: Vec<f64>,
}

impl LogReturnSeries {
    pub fn from_prices(series: &PriceSeries) -> Self {
        let points = series.points();
        let timestamps = points.iter().skip(1).map(|p| p.timestamp).collect();
        let values = points
            .windows(2)
            .map(|w| w[1].price.ln() - w[0].price.ln())
            .collect();
        Self { timestamps, values }
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamps
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
