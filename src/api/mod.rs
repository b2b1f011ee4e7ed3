//! # Data acquisition
//!
//! Async Bybit client for daily klines and CSV price files with an explicit
//! column mapping.

mod client;
mod storage;
mod types;

pub use client::{BybitClient, BYBIT_MAINNET, BYBIT_TESTNET};
pub use storage::*;
pub use types::{Interval, KlineData, KlineResponse, KlineResult};
