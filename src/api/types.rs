//! Type definitions for Bybit API responses

use serde::{Deserialize, Serialize};

/// Kline interval supported by the price fetcher
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Interval {
    #[default]
    #[serde(rename = "D")]
    Day1,
    #[serde(rename = "W")]
    Week1,
    #[serde(rename = "M")]
    Month1,
}

impl Interval {
    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::Day1 => "D",
            Interval::Week1 => "W",
            Interval::Month1 => "M",
        }
    }

    /// Interval duration in milliseconds (a month counts as 30 days)
    pub fn duration_ms(&self) -> i64 {
        match self {
            Interval::Day1 => 86_400_000,
            Interval::Week1 => 604_800_000,
            Interval::Month1 => 2_592_000_000,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "d" | "1d" | "day" => Some(Interval::Day1),
            "w" | "1w" | "week" => Some(Interval::Week1),
            "m" | "1mo" | "month" => Some(Interval::Month1),
            _ => None,
        }
    }
}

/// Raw kline response from Bybit API
#[derive(Debug, Deserialize)]
pub struct KlineResponse {
    #[serde(rename = "retCode")]
    pub ret_code: i32,
    #[serde(rename = "retMsg")]
    pub ret_msg: String,
    pub result: KlineResult,
}

#[derive(Debug, Default, Deserialize)]
pub struct KlineResult {
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub list: Vec<KlineData>,
}

/// Single kline data point
/// Format: [startTime, openPrice, highPrice, lowPrice, closePrice, volume, turnover]
#[derive(Debug, Deserialize)]
pub struct KlineData(
    pub String,
    pub String,
    pub String,
    pub String,
    pub String,
    pub String,
    pub String,
);
