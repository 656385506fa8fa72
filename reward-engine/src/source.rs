use std::collections::HashMap;

use rust_decimal::Decimal;

use crate::ledger::LedgerSnapshot;
use crate::stream::RewardStreamDescriptor;

/// Failure of an external collaborator. The engine treats every variant as
/// "data unavailable for this evaluation".
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("unexpected status {0}")]
    Status(u16),
    #[error("parse error: {0}")]
    Parse(String),
}

/// USD price lookup keyed by coin id (see [`crate::coin_id`]).
#[async_trait::async_trait]
pub trait PriceSource: Send + Sync {
    /// Prices for as many of `coin_ids` as are known. Unknown ids are left out.
    async fn usd_prices(&self, coin_ids: &[String]) -> Result<HashMap<String, Decimal>, SourceError>;
}

/// Off-chain ledger of rewards already earned by the evaluated account.
#[async_trait::async_trait]
pub trait LedgerSource: Send + Sync {
    /// One batched lookup covering every stream of a pool.
    async fn earned(&self, streams: &[RewardStreamDescriptor]) -> Result<LedgerSnapshot, SourceError>;
}

#[async_trait::async_trait]
impl<T: PriceSource + ?Sized> PriceSource for std::sync::Arc<T> {
    async fn usd_prices(&self, coin_ids: &[String]) -> Result<HashMap<String, Decimal>, SourceError> {
        (**self).usd_prices(coin_ids).await
    }
}

#[async_trait::async_trait]
impl<T: LedgerSource + ?Sized> LedgerSource for std::sync::Arc<T> {
    async fn earned(&self, streams: &[RewardStreamDescriptor]) -> Result<LedgerSnapshot, SourceError> {
        (**self).earned(streams).await
    }
}
