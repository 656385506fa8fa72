//! Client for the off-chain earned-reward ledger.
//!
//! One `POST /pool/earned-reward-list` covers every stream of a pool. The
//! body lists `{poolId, chainId, rewardId}` items and the API answers with an
//! array of earned amounts in the same order.

use chrono::Utc;
use reward_engine::{LedgerEntry, LedgerSnapshot, LedgerSource, RewardStreamDescriptor, SourceError};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::ServiceError;
use crate::metrics::SOURCE_FAILURES;
use crate::parse::parse_decimal_value;

const ENDPOINT: &str = "earned-reward-list";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LedgerItem<'a> {
    pool_id: &'a str,
    chain_id: u64,
    reward_id: u64,
}

#[derive(Debug, Serialize)]
struct LedgerRequest<'a> {
    account: &'a str,
    items: Vec<LedgerItem<'a>>,
}

pub struct LedgerApi {
    client: reqwest::Client,
    url: String,
    account: Option<String>,
    chain_id: u64,
}

impl LedgerApi {
    /// `api_url` is the API root; the ledger path is appended to it.
    pub fn new(client: reqwest::Client, api_url: &str, account: Option<String>, chain_id: u64) -> Self {
        Self {
            client,
            url: format!("{}/pool/earned-reward-list", api_url.trim_end_matches('/')),
            account,
            chain_id,
        }
    }

    pub async fn fetch(&self, streams: &[RewardStreamDescriptor]) -> Result<LedgerSnapshot, ServiceError> {
        let Some(account) = self.account.as_deref() else {
            debug!("no account configured; skipping ledger lookup");
            return Ok(LedgerSnapshot::unavailable());
        };
        if streams.is_empty() {
            return Ok(LedgerSnapshot::unavailable());
        }

        let body = LedgerRequest {
            account,
            items: streams
                .iter()
                .map(|s| LedgerItem {
                    pool_id: &s.pool_id,
                    chain_id: self.chain_id,
                    reward_id: s.stream_index,
                })
                .collect(),
        };

        let resp = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ServiceError::Http {
                source: e,
                endpoint: ENDPOINT,
            })?;
        if !resp.status().is_success() {
            return Err(ServiceError::Status {
                status: resp.status().as_u16(),
                endpoint: ENDPOINT,
            });
        }
        let amounts: Vec<Value> = resp.json().await.map_err(|e| ServiceError::Http {
            source: e,
            endpoint: ENDPOINT,
        })?;
        let fetched_at = Utc::now().timestamp_millis();

        if amounts.len() != streams.len() {
            warn!(
                expected = streams.len(),
                received = amounts.len(),
                "ledger answered with a different number of items"
            );
        }

        let entries = streams
            .iter()
            .zip(amounts.iter())
            .map(|(stream, amount)| LedgerEntry {
                pool_id: stream.pool_id.clone(),
                stream_index: stream.stream_index,
                earned_amount: earned_amount(stream, amount),
            })
            .collect();
        Ok(LedgerSnapshot::new(entries, fetched_at))
    }
}

/// `null` means nothing earned; anything else unparsable is logged and
/// counted as zero.
fn earned_amount(stream: &RewardStreamDescriptor, amount: &Value) -> Decimal {
    if amount.is_null() {
        return Decimal::ZERO;
    }
    parse_decimal_value(amount).unwrap_or_else(|| {
        warn!(
            pool_id = %stream.pool_id,
            stream_index = stream.stream_index,
            %amount,
            "unparsable earned amount; counted as zero"
        );
        Decimal::ZERO
    })
}

#[async_trait::async_trait]
impl LedgerSource for LedgerApi {
    async fn earned(&self, streams: &[RewardStreamDescriptor]) -> Result<LedgerSnapshot, SourceError> {
        self.fetch(streams).await.map_err(|e| {
            SOURCE_FAILURES.with_label_values(&["ledger"]).inc();
            SourceError::from(e)
        })
    }
}
