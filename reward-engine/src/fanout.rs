use futures_util::stream::{self, StreamExt};
use tokio_util::sync::CancellationToken;

use crate::earnings::{PoolEarnings, PoolEarningsCalculator, PoolRequest};
use crate::error::EarningsError;
use crate::source::{LedgerSource, PriceSource};

/// Evaluate many pools with at most `max_concurrent` evaluations in flight.
///
/// Results come back in the order of `pools`; each pool succeeds or fails on
/// its own. Cancelling `cancel` turns every unfinished evaluation into
/// [`EarningsError::Cancelled`].
pub async fn evaluate_pools<P, L>(
    calculator: &PoolEarningsCalculator<P, L>,
    pools: &[PoolRequest],
    now_ms: i64,
    max_concurrent: usize,
    cancel: &CancellationToken,
) -> Vec<Result<PoolEarnings, EarningsError>>
where
    P: PriceSource,
    L: LedgerSource,
{
    stream::iter(pools)
        .map(|pool| calculator.compute_cancellable(pool, now_ms, cancel))
        .buffered(max_concurrent.max(1))
        .collect()
        .await
}
