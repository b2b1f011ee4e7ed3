//! # Random Walk Analysis
//!
//! Tests the random walk hypothesis on daily prices with the Lo & MacKinlay
//! (1988) variance ratio statistics.
//!
//! ## Modules
//!
//! - `types` - Price series and log returns
//! - `analysis` - Variance ratio estimator, z-statistics, sweep over q, descriptive statistics
//! - `api` - Bybit client and CSV price files
//! - `simulation` - Seeded random walks for calibration
//! - `report` - Text charts and CSV export
//! - `config` - File and environment configuration

pub mod analysis;
pub mod api;
pub mod config;
pub mod error;
pub mod report;
pub mod simulation;
pub mod types;

pub use analysis::{
    sweep, variance_c, z_statistic, SweepConfig, SweepPoint, SweepReport, VarianceRatioAnalyzer,
};
pub use config::AppConfig;
pub use error::{AnalysisError, DataError, Result};
pub use types::{Candle, LogReturnSeries, PricePoint, PriceSeries};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::analysis::{
        heteroskedastic_z_statistic, sweep, variance_c, variance_ratio, z_statistic,
        DescriptiveStats, SweepConfig, SweepPoint, SweepReport, VarianceRatioAnalyzer,
    };
    pub use crate::api::{load_price_series, BybitClient, CsvFormat};
    pub use crate::error::{AnalysisError, Result};
    pub use crate::types::{LogReturnSeries, PricePoint, PriceSeries};
}

/// Install the `tracing` subscriber used by the binaries.
///
/// `level` applies to this crate; other targets follow `RUST_LOG`.
pub fn init_logging(level: &str) -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(format!("random_walk_analysis={}", level).parse()?);
    tracing_subscriber::fmt().with_env_filter(filter).init();
    Ok(())
}
