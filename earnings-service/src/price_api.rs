use std::collections::HashMap;

use reward_engine::{PriceSource, SourceError};
use rust_decimal::Decimal;
use serde_json::Value;

use crate::error::ServiceError;
use crate::metrics::SOURCE_FAILURES;
use crate::parse::parse_decimal_value;

const ENDPOINT: &str = "simple/price";

/// USD prices from a CoinGecko-compatible `/simple/price` endpoint.
pub struct CoinGeckoPrices {
    client: reqwest::Client,
    base_url: String,
}

impl CoinGeckoPrices {
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn fetch(&self, coin_ids: &[String]) -> Result<HashMap<String, Decimal>, ServiceError> {
        if coin_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let resp = self
            .client
            .get(format!("{}/simple/price", self.base_url))
            .query(&[("ids", coin_ids.join(",").as_str()), ("vs_currencies", "usd")])
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
        let body: HashMap<String, Value> = resp.json().await.map_err(|e| ServiceError::Http {
            source: e,
            endpoint: ENDPOINT,
        })?;
        Ok(parse_prices(body))
    }
}

fn parse_prices(body: HashMap<String, Value>) -> HashMap<String, Decimal> {
    body.into_iter()
        .filter_map(|(id, quote)| {
            let usd = quote.get("usd").and_then(parse_decimal_value)?;
            Some((id, usd))
        })
        .collect()
}

#[async_trait::async_trait]
impl PriceSource for CoinGeckoPrices {
    async fn usd_prices(&self, coin_ids: &[String]) -> Result<HashMap<String, Decimal>, SourceError> {
        self.fetch(coin_ids).await.map_err(|e| {
            SOURCE_FAILURES.with_label_values(&["prices"]).inc();
            SourceError::from(e)
        })
    }
}
