use std::time::Duration;

use chrono::Utc;
use reward_engine::{
    evaluate_pools, value_position, LedgerSource, PoolEarnings, PoolEarningsCalculator,
    PositionValuation, PriceSource,
};
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::Settings;
use crate::error::ServiceError;
use crate::http_client;
use crate::input::PoolEntry;
use crate::ledger_api::LedgerApi;
use crate::metrics::{LAST_EVALUATION_TIMESTAMP, POOL_APY, POOL_EVALUATIONS};
use crate::price_api::CoinGeckoPrices;

/// One evaluated pool as printed by the binary.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolReport {
    #[serde(flatten)]
    pub earnings: PoolEarnings,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<PositionValuation>,
}

pub struct Runner<P, L> {
    calculator: PoolEarningsCalculator<P, L>,
    max_concurrent: usize,
    poll_interval: Duration,
}

impl Runner<CoinGeckoPrices, LedgerApi> {
    /// Wire the HTTP-backed price and ledger sources from `settings`.
    pub fn from_settings(settings: &Settings) -> Result<Self, ServiceError> {
        let api_url = settings.require_api_url()?;
        let fetch_timeout = Duration::from_secs(settings.fetch_timeout_secs);
        let client = http_client::builder(fetch_timeout)
            .build()
            .map_err(|e| ServiceError::Http {
                source: e,
                endpoint: "client",
            })?;
        let prices = CoinGeckoPrices::new(client.clone(), &settings.price_api_url);
        let ledger = LedgerApi::new(client, api_url, settings.account.clone(), settings.chain_id);
        let calculator = PoolEarningsCalculator::new(prices, ledger).with_fetch_timeout(fetch_timeout);
        Ok(Self::new(
            calculator,
            settings.max_concurrent_pools,
            Duration::from_millis(settings.poll_interval_ms),
        ))
    }
}

impl<P, L> Runner<P, L>
where
    P: PriceSource,
    L: LedgerSource,
{
    pub fn new(
        calculator: PoolEarningsCalculator<P, L>,
        max_concurrent: usize,
        poll_interval: Duration,
    ) -> Self {
        Self {
            calculator,
            max_concurrent,
            poll_interval,
        }
    }

    /// Evaluate every entry once. Cancelled pools are logged and left out.
    pub async fn evaluate(
        &self,
        entries: &[PoolEntry],
        now_ms: i64,
        cancel: &CancellationToken,
    ) -> Vec<PoolReport> {
        let requests: Vec<_> = entries.iter().map(|e| e.request.clone()).collect();
        let results = evaluate_pools(
            &self.calculator,
            &requests,
            now_ms,
            self.max_concurrent,
            cancel,
        )
        .await;
        LAST_EVALUATION_TIMESTAMP.set(now_ms);

        let mut reports = Vec::with_capacity(results.len());
        for (entry, result) in entries.iter().zip(results) {
            match result {
                Ok(earnings) => {
                    POOL_EVALUATIONS.with_label_values(&["ok"]).inc();
                    record_apy(&earnings);
                    let position = entry
                        .position
                        .as_ref()
                        .map(|inputs| value_position(inputs, &earnings));
                    reports.push(PoolReport { earnings, position });
                }
                Err(e) => {
                    POOL_EVALUATIONS.with_label_values(&["cancelled"]).inc();
                    warn!(error = %e, "pool evaluation dropped");
                }
            }
        }
        reports
    }

    /// Re-evaluate `entries` every poll interval until `cancel` fires, handing
    /// each batch of reports to `emit`.
    pub async fn watch<F>(&self, entries: &[PoolEntry], cancel: CancellationToken, mut emit: F)
    where
        F: FnMut(&[PoolReport]),
    {
        let mut intv = interval(self.poll_interval);
        intv.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(pools = entries.len(), interval_ms = self.poll_interval.as_millis() as u64, "watching pools");
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = intv.tick() => {
                    let now_ms = Utc::now().timestamp_millis();
                    let reports = self.evaluate(entries, now_ms, &cancel).await;
                    if cancel.is_cancelled() {
                        break;
                    }
                    emit(&reports);
                }
            }
        }
        info!("pool watch stopped");
    }
}

fn record_apy(earnings: &PoolEarnings) {
    match earnings.apy.value().and_then(|v| v.to_f64()) {
        Some(apy) => POOL_APY.with_label_values(&[&earnings.pool_id]).set(apy),
        None => {
            let _ = POOL_APY.remove_label_values(&[&earnings.pool_id]);
        }
    }
}
