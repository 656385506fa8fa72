//! Per-pool orchestration: aggregation, ledger merge, pricing, yield and
//! current-reward selection in one evaluation.

use std::collections::{BTreeSet, HashMap};
use std::time::Duration;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::aggregate::aggregate;
use crate::amount::{normalize, POOL_TOKEN_DECIMALS};
use crate::error::EarningsError;
use crate::ledger::{merge, LedgerSnapshot};
use crate::projection::annualize;
use crate::source::{LedgerSource, PriceSource};
use crate::stream::{coin_id, AggregatedRewardToken, RewardStreamDescriptor, TokenId, TokenMap};
use crate::window::select_most_recent;

/// Upper bound for each collaborator call unless overridden.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

fn default_asset_decimals() -> u32 {
    POOL_TOKEN_DECIMALS
}

/// Everything needed to evaluate one pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolRequest {
    pub pool_id: String,
    /// Display name of the pool's capital asset, used for its price lookup.
    pub asset_name: String,
    #[serde(default = "default_asset_decimals")]
    pub asset_decimals: u32,
    /// Pool liquidity in raw asset units.
    pub total_liquidity: Decimal,
    #[serde(default)]
    pub streams: Vec<RewardStreamDescriptor>,
}

impl PoolRequest {
    pub fn asset_coin_id(&self) -> String {
        coin_id(&self.asset_name)
    }
}

/// Display-ready view of a token the account has earned.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EarnedTokenSummary {
    pub id: TokenId,
    pub address: String,
    pub symbol: String,
    pub decimals: u32,
    pub earned_amount: Decimal,
    /// Streams that can be passed to a claim.
    pub claimable_stream_ids: Vec<u64>,
    pub combined_rate_per_second: Decimal,
    pub usd_price: Decimal,
    pub started_at: i64,
    pub ended_at: i64,
    pub last_updated_at: Option<i64>,
}

impl From<&AggregatedRewardToken> for EarnedTokenSummary {
    fn from(token: &AggregatedRewardToken) -> Self {
        Self {
            id: token.id.clone(),
            address: token.address.clone(),
            symbol: if token.symbol.is_empty() {
                "?".to_string()
            } else {
                token.symbol.clone()
            },
            decimals: token.decimals,
            earned_amount: token.earned_amount,
            claimable_stream_ids: token.earned_stream_ids.clone(),
            combined_rate_per_second: token.combined_rate_per_second,
            usd_price: token.usd_price,
            started_at: token.started_at,
            ended_at: token.ended_at,
            last_updated_at: token.last_updated_at,
        }
    }
}

/// Annualized yield of a pool in percent.
///
/// `Unavailable` is reported when the pool's USD value is zero or unknown and
/// serializes as JSON `null`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Apy {
    Percent(Decimal),
    Unavailable,
}

impl Apy {
    pub fn value(&self) -> Option<Decimal> {
        match self {
            Apy::Percent(v) => Some(*v),
            Apy::Unavailable => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Apy::Percent(_))
    }
}

/// `annual_usd / (normalize(total_liquidity) * price) * 100`.
pub fn compute_apy(
    annual_usd: Decimal,
    total_liquidity: Decimal,
    asset_decimals: u32,
    asset_usd_price: Option<Decimal>,
) -> Apy {
    let Some(price) = asset_usd_price else {
        return Apy::Unavailable;
    };
    let pool_usd = match normalize(total_liquidity, asset_decimals).checked_mul(price) {
        Some(v) if !v.is_zero() => v,
        _ => return Apy::Unavailable,
    };
    annual_usd
        .checked_div(pool_usd)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .map_or(Apy::Unavailable, Apy::Percent)
}

/// Outcome of one pool evaluation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolEarnings {
    pub pool_id: String,
    /// Tokens with a positive earned balance.
    pub earnings: Vec<EarnedTokenSummary>,
    /// Most recently started reward that is running now.
    pub last_reward: Option<AggregatedRewardToken>,
    pub apy: Apy,
    /// Annual USD value of the pool's reward emissions.
    pub annual_reward_summary: Decimal,
    pub ledger_available: bool,
    pub prices_available: bool,
}

impl PoolEarnings {
    /// Every stream id with a claimable balance, across tokens.
    pub fn claimable_stream_ids(&self) -> Vec<u64> {
        self.earnings
            .iter()
            .flat_map(|e| e.claimable_stream_ids.iter().copied())
            .collect()
    }
}

/// Evaluates pools against a price source and an earned-reward ledger.
pub struct PoolEarningsCalculator<P, L> {
    prices: P,
    ledger: L,
    fetch_timeout: Duration,
}

impl<P, L> PoolEarningsCalculator<P, L>
where
    P: PriceSource,
    L: LedgerSource,
{
    pub fn new(prices: P, ledger: L) -> Self {
        Self {
            prices,
            ledger,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }

    pub fn with_fetch_timeout(mut self, fetch_timeout: Duration) -> Self {
        self.fetch_timeout = fetch_timeout;
        self
    }

    /// Evaluate `pool` at `now_ms`.
    ///
    /// Collaborator failures and timeouts never fail the evaluation: a missing
    /// ledger means nothing earned, missing prices mean zero value.
    pub async fn compute(&self, pool: &PoolRequest, now_ms: i64) -> PoolEarnings {
        let tokens = aggregate(&pool.streams, now_ms);

        let (ledger, ledger_available) = self.fetch_ledger(pool).await;
        let mut tokens = merge(&pool.streams, &ledger, tokens);

        let asset_coin = pool.asset_coin_id();
        let (prices, prices_available) = self.fetch_prices(pool, &tokens, &asset_coin).await;
        for token in tokens.values_mut() {
            if let Some(price) = prices.get(&token.coin_id) {
                token.usd_price = *price;
            }
        }

        let annual_reward_summary = annualize(&tokens);
        let apy = compute_apy(
            annual_reward_summary,
            pool.total_liquidity,
            pool.asset_decimals,
            prices.get(&asset_coin).copied(),
        );
        let last_reward = select_most_recent(&tokens, now_ms.div_euclid(1000)).cloned();
        let earnings: Vec<EarnedTokenSummary> = tokens
            .values()
            .filter(|t| t.earned_amount > Decimal::ZERO)
            .map(EarnedTokenSummary::from)
            .collect();

        debug!(
            pool_id = %pool.pool_id,
            tokens = tokens.len(),
            earning = earnings.len(),
            annual_usd = %annual_reward_summary,
            "pool evaluated"
        );

        PoolEarnings {
            pool_id: pool.pool_id.clone(),
            earnings,
            last_reward,
            apy,
            annual_reward_summary,
            ledger_available,
            prices_available,
        }
    }

    /// Like [`compute`](Self::compute), but gives up as soon as `cancel`
    /// fires. A cancelled evaluation returns no partial result.
    pub async fn compute_cancellable(
        &self,
        pool: &PoolRequest,
        now_ms: i64,
        cancel: &CancellationToken,
    ) -> Result<PoolEarnings, EarningsError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(EarningsError::Cancelled {
                pool_id: pool.pool_id.clone(),
            }),
            earnings = self.compute(pool, now_ms) => Ok(earnings),
        }
    }

    async fn fetch_ledger(&self, pool: &PoolRequest) -> (LedgerSnapshot, bool) {
        if pool.streams.is_empty() {
            return (LedgerSnapshot::unavailable(), true);
        }
        match timeout(self.fetch_timeout, self.ledger.earned(&pool.streams)).await {
            Ok(Ok(snapshot)) => (snapshot, true),
            Ok(Err(e)) => {
                warn!(pool_id = %pool.pool_id, error = %e, "ledger fetch failed; no earned rewards merged");
                (LedgerSnapshot::unavailable(), false)
            }
            Err(_) => {
                warn!(pool_id = %pool.pool_id, timeout = ?self.fetch_timeout, "ledger fetch timed out");
                (LedgerSnapshot::unavailable(), false)
            }
        }
    }

    async fn fetch_prices(
        &self,
        pool: &PoolRequest,
        tokens: &TokenMap,
        asset_coin: &str,
    ) -> (HashMap<String, Decimal>, bool) {
        let ids: BTreeSet<&str> = tokens
            .values()
            .map(|t| t.coin_id.as_str())
            .chain(std::iter::once(asset_coin))
            .collect();
        let ids: Vec<String> = ids.into_iter().map(str::to_string).collect();

        match timeout(self.fetch_timeout, self.prices.usd_prices(&ids)).await {
            Ok(Ok(prices)) => (prices, true),
            Ok(Err(e)) => {
                warn!(pool_id = %pool.pool_id, error = %e, "price fetch failed; rewards valued at zero");
                (HashMap::new(), false)
            }
            Err(_) => {
                warn!(pool_id = %pool.pool_id, timeout = ?self.fetch_timeout, "price fetch timed out");
                (HashMap::new(), false)
            }
        }
    }
}
