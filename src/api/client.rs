//! Bybit API client implementation

use chrono::{DateTime, Duration, TimeZone, Utc};
use reqwest::Client;
use tracing::{debug, info};

use super::types::{Interval, KlineData, KlineResponse};
use crate::error::{DataError, Result};
use crate::types::{Candle, PriceSeries};

/// Bybit API base URLs
pub const BYBIT_MAINNET: &str = "https://api.bybit.com";
pub const BYBIT_TESTNET: &str = "https://api-testnet.bybit.com";

/// Maximum number of klines per request
const PAGE_LIMIT: u32 = 1000;

/// Bybit API client for fetching historical prices
#[derive(Clone)]
pub struct BybitClient {
    client: Client,
    base_url: String,
    category: String,
}

impl Default for BybitClient {
    fn default() -> Self {
        Self::new()
    }
}

impl BybitClient {
    pub fn new() -> Self {
        Self::with_base_url(BYBIT_MAINNET)
    }

    pub fn testnet() -> Self {
        Self::with_base_url(BYBIT_TESTNET)
    }

    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            category: "spot".to_string(),
        }
    }

    /// Market category: `spot` (default), `linear` or `inverse`
    pub fn with_category(mut self, category: &str) -> Self {
        self.category = category.to_string();
        self
    }

    fn kline_url(
        &self,
        symbol: &str,
        interval: Interval,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
        limit: Option<u32>,
    ) -> String {
        let mut url = format!(
            "{}/v5/market/kline?category={}&symbol={}&interval={}",
            self.base_url,
            self.category,
            symbol,
            interval.as_str()
        );
        if let Some(s) = start {
            url.push_str(&format!("&start={}", s.timestamp_millis()));
        }
        if let Some(e) = end {
            url.push_str(&format!("&end={}", e.timestamp_millis()));
        }
        if let Some(l) = limit {
            url.push_str(&format!("&limit={}", l.min(PAGE_LIMIT)));
        }
        url
    }

    /// Fetch one page of klines, oldest first.
    pub async fn get_klines(
        &self,
        symbol: &str,
        interval: Interval,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
        limit: Option<u32>,
    ) -> std::result::Result<Vec<Candle>, DataError> {
        let url = self.kline_url(symbol, interval, start, end, limit);
        debug!("Fetching klines from: {}", url);

        let response: KlineResponse = self.client.get(&url).send().await?.json().await?;
        candles_from_response(response)
    }

    /// Fetch every kline in `[start, end]`, paging backwards from `end`.
    pub async fn get_historical_klines(
        &self,
        symbol: &str,
        interval: Interval,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> std::result::Result<Vec<Candle>, DataError> {
        let mut all_candles = Vec::new();
        let mut current_end = end;

        loop {
            let candles = self
                .get_klines(symbol, interval, Some(start), Some(current_end), Some(PAGE_LIMIT))
                .await?;

            let oldest = match candles.first() {
                Some(c) => c.timestamp,
                None => break,
            };
            let page_len = candles.len();
            all_candles.extend(candles);

            if oldest <= start || page_len < PAGE_LIMIT as usize {
                break;
            }

            current_end = oldest - Duration::milliseconds(interval.duration_ms());

            tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
        }

        all_candles.sort_by_key(|c| c.timestamp);
        all_candles.dedup_by_key(|c| c.timestamp);
        all_candles.retain(|c| c.timestamp >= start && c.timestamp <= end);

        info!(
            "Fetched {} candles for {} from {} to {}",
            all_candles.len(),
            symbol,
            start,
            end
        );

        Ok(all_candles)
    }

    /// Daily closing prices of `symbol` between `start` and `end`.
    pub async fn get_daily_closes(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<PriceSeries> {
        let candles = self
            .get_historical_klines(symbol, Interval::Day1, start, end)
            .await?;
        if candles.is_empty() {
            return Err(DataError::NoData.into());
        }
        PriceSeries::from_candles(symbol, &candles)
    }
}

fn parse_field(value: &str, row: usize, name: &str) -> std::result::Result<f64, DataError> {
    value.parse().map_err(|_| DataError::Parse {
        line: row,
        message: format!("invalid {} '{}'", name, value),
    })
}

fn candle_from_kline(k: &KlineData, row: usize) -> std::result::Result<Candle, DataError> {
    let timestamp_ms: i64 = k.0.parse().map_err(|_| DataError::Parse {
        line: row,
        message: format!("invalid start time '{}'", k.0),
    })?;
    let timestamp = Utc
        .timestamp_millis_opt(timestamp_ms)
        .single()
        .ok_or_else(|| DataError::Parse {
            line: row,
            message: format!("start time {} out of range", timestamp_ms),
        })?;

    Ok(Candle {
        timestamp,
        open: parse_field(&k.1, row, "open")?,
        high: parse_field(&k.2, row, "high")?,
        low: parse_field(&k.3, row, "low")?,
        close: parse_field(&k.4, row, "close")?,
        volume: parse_field(&k.5, row, "volume")?,
    })
}

/// Convert an API response into candles sorted oldest first.
pub(crate) fn candles_from_response(
    response: KlineResponse,
) -> std::result::Result<Vec<Candle>, DataError> {
    if response.ret_code != 0 {
        return Err(DataError::Provider {
            code: response.ret_code,
            message: response.ret_msg,
        });
    }

    // Bybit returns newest first
    let mut candles = response
        .result
        .list
        .iter()
        .enumerate()
        .map(|(row, k)| candle_from_kline(k, row + 1))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    candles.sort_by_key(|c| c.timestamp);
    Ok(candles)
}
