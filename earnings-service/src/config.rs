use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::Deserialize;

use crate::error::ServiceError;

pub const DEFAULT_PRICE_API_URL: &str = "https://api.coingecko.com/api/v3";
pub const DEFAULT_CHAIN_ID: u64 = 80001;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 5000;

/// Command line arguments
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional path to a configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Account whose earned rewards are looked up
    #[arg(long, global = true)]
    pub account: Option<String>,

    /// Override of the ledger/market API root
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Evaluate every pool of an input file once
    Pools {
        #[arg(short, long)]
        input: PathBuf,
        /// Evaluation instant in unix milliseconds (defaults to now)
        #[arg(long)]
        now_ms: Option<i64>,
    },
    /// Re-evaluate the pools of an input file on every poll interval
    Watch {
        #[arg(short, long)]
        input: PathBuf,
    },
    /// Print the current market premium quotes
    Markets,
}

/// Application configuration loaded from file and environment
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub api_url: String,
    #[serde(default = "default_price_api_url")]
    pub price_api_url: String,
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,
    #[serde(default)]
    pub account: Option<String>,
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
    #[serde(default = "default_max_concurrent_pools")]
    pub max_concurrent_pools: usize,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default)]
    pub metrics_addr: Option<SocketAddr>,
}

fn default_price_api_url() -> String {
    DEFAULT_PRICE_API_URL.into()
}

fn default_chain_id() -> u64 {
    DEFAULT_CHAIN_ID
}

fn default_fetch_timeout_secs() -> u64 {
    10
}

fn default_max_concurrent_pools() -> usize {
    4
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: String::new(),
            price_api_url: default_price_api_url(),
            chain_id: DEFAULT_CHAIN_ID,
            account: None,
            fetch_timeout_secs: default_fetch_timeout_secs(),
            max_concurrent_pools: default_max_concurrent_pools(),
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            metrics_addr: None,
        }
    }
}

impl Settings {
    pub fn load(cli: &Cli) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder()
            .set_default("api_url", "")?
            .set_default("price_api_url", DEFAULT_PRICE_API_URL)?
            .set_default("chain_id", DEFAULT_CHAIN_ID)?
            .set_default("fetch_timeout_secs", default_fetch_timeout_secs())?
            .set_default("max_concurrent_pools", default_max_concurrent_pools() as u64)?
            .set_default("poll_interval_ms", DEFAULT_POLL_INTERVAL_MS)?;
        if let Some(path) = &cli.config {
            builder = builder.add_source(config::File::with_name(path));
        }
        builder = builder.add_source(config::Environment::with_prefix("EARNINGS"));
        let cfg = builder.build()?;
        let mut settings: Settings = cfg.try_deserialize()?;
        if let Some(a) = &cli.account {
            settings.account = Some(a.clone());
        }
        if let Some(u) = &cli.api_url {
            settings.api_url = u.clone();
        }
        Ok(settings)
    }

    pub fn require_api_url(&self) -> Result<&str, ServiceError> {
        let url = self.api_url.trim();
        if url.is_empty() {
            return Err(ServiceError::Other(
                "api_url is not set (use --api-url, EARNINGS_API_URL or the config file)".into(),
            ));
        }
        Ok(url)
    }
}
