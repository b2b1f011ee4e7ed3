//! # Return analysis
//!
//! Variance ratio tests of the random walk hypothesis and the descriptive
//! statistics used to read them.

mod autocorrelation;
mod returns;
mod statistics;
mod sweep;
mod variance_ratio;

pub use autocorrelation::*;
pub use returns::*;
pub use statistics::*;
pub use sweep::*;
pub use variance_ratio::*;
