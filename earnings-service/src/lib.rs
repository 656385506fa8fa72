//! HTTP-backed earnings service around `reward-engine`: ledger and price
//! clients, pool input files, a polling runner and Prometheus metrics.

pub mod config;
pub mod error;
pub mod http_client;
pub mod input;
pub mod ledger_api;
pub mod market_quotes;
pub mod metrics;
pub mod parse;
pub mod price_api;
pub mod runner;

pub use error::ServiceError;
pub use runner::{PoolReport, Runner};
