//! # tou-rates - Time-of-use electricity rate resolver
//!
//! Resolves a household's current electricity price from a published
//! time-of-use tariff in the OpenEI Utility Rate Database. The tariff is
//! fetched at most once per day; the current rate is re-evaluated every
//! minute against the cached schedule.
//!
//! ## Architecture
//!
//! - `config`: YAML configuration and validation
//! - `logging`: Structured logging and tracing
//! - `openei`: Rate database client with retry and backoff
//! - `tariff`: Normalized schedule model, parser and tier classifier
//! - `resolver`: Point-in-time rate and next-change resolution
//! - `refresh`: Fetch staleness gate and stale-data fallback
//! - `service`: Interval loop publishing the latest rate status
//! - `web`: HTTP status surface (feature `web`)

pub mod config;
pub mod error;
pub mod logging;
pub mod openei;
pub mod refresh;
pub mod resolver;
pub mod service;
pub mod tariff;
#[cfg(feature = "web")]
pub mod web;

#[cfg(all(test, feature = "web"))]
mod web_tests;

// Re-export commonly used types
pub use config::Config;
pub use error::{Result, TariffError};
pub use openei::{OpenEiClient, TariffSource};
pub use refresh::{RateCoordinator, RateSnapshot, RateStatus};
pub use resolver::{CurrentRate, resolve};
pub use tariff::RateSchedule;

/// Version string reported by the binary and the HTTP surface
pub const VERSION: &str = env!("APP_VERSION");
