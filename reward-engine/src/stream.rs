use std::collections::BTreeMap;
use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// On-chain reward configuration for a single pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardStreamDescriptor {
    /// Pool the stream pays into.
    pub pool_id: String,
    /// Stable identity of the stream within its pool.
    pub stream_index: u64,
    pub reward_token_address: String,
    pub reward_token_symbol: String,
    pub reward_token_name: String,
    #[serde(default)]
    pub reward_token_decimals: u32,
    /// Emission rate in raw token units per second.
    pub rate_per_second: Decimal,
    /// Window start (unix seconds).
    pub started_at: i64,
    /// Window end (unix seconds).
    pub ended_at: i64,
}

impl RewardStreamDescriptor {
    /// Length of the emission window in seconds. Inverted windows count as zero.
    pub fn duration(&self) -> i64 {
        (self.ended_at - self.started_at).max(0)
    }

    /// Whether the stream emits at `now_ms` (milliseconds).
    pub fn is_active_at_ms(&self, now_ms: i64) -> bool {
        let start_ms = self.started_at.saturating_mul(1000);
        let end_ms = self.ended_at.saturating_mul(1000);
        start_ms <= now_ms && end_ms > now_ms
    }
}

/// Canonical identity of a reward token: its address, trimmed and lowercased.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenId(String);

impl TokenId {
    pub fn from_address(address: &str) -> Self {
        Self(address.trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Price API key derived from a token display name (`"USD Coin"` -> `"usd-coin"`).
pub fn coin_id(display_name: &str) -> String {
    display_name.trim().replace(' ', "-").to_lowercase()
}

/// All streams of one reward token folded together for a single evaluation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedRewardToken {
    pub id: TokenId,
    pub address: String,
    pub symbol: String,
    pub name: String,
    pub decimals: u32,
    /// Key used for the USD price lookup.
    pub coin_id: String,
    /// Sum of `rate * duration` over streams active at the evaluation instant.
    pub total_projected_amount: Decimal,
    /// Sum of the rates of the active streams.
    pub combined_rate_per_second: Decimal,
    pub earned_amount: Decimal,
    /// Streams with a positive ledger balance, in stream order.
    pub earned_stream_ids: Vec<u64>,
    /// Window of the first stream seen for this token.
    pub started_at: i64,
    pub ended_at: i64,
    pub usd_price: Decimal,
    /// Ledger fetch instant (ms) when this token matched a ledger entry.
    pub last_updated_at: Option<i64>,
}

impl AggregatedRewardToken {
    /// Seed a token record from the first stream that pays it.
    pub fn new(stream: &RewardStreamDescriptor) -> Self {
        Self {
            id: TokenId::from_address(&stream.reward_token_address),
            address: stream.reward_token_address.clone(),
            symbol: stream.reward_token_symbol.clone(),
            name: stream.reward_token_name.clone(),
            decimals: stream.reward_token_decimals,
            coin_id: coin_id(&stream.reward_token_name),
            total_projected_amount: Decimal::ZERO,
            combined_rate_per_second: Decimal::ZERO,
            earned_amount: Decimal::ZERO,
            earned_stream_ids: Vec::new(),
            started_at: stream.started_at,
            ended_at: stream.ended_at,
            usd_price: Decimal::ZERO,
            last_updated_at: None,
        }
    }

    /// Duration of the defining stream in seconds.
    pub fn duration(&self) -> i64 {
        (self.ended_at - self.started_at).max(0)
    }

    /// Whether `now_secs` falls in `[started_at, ended_at)`.
    pub fn is_active_at(&self, now_secs: i64) -> bool {
        self.started_at <= now_secs && now_secs < self.ended_at
    }
}

/// Aggregated tokens of one pool keyed by token identity.
pub type TokenMap = BTreeMap<TokenId, AggregatedRewardToken>;
