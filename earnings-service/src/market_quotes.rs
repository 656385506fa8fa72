use serde::{Deserialize, Serialize};

use crate::error::ServiceError;

const ENDPOINT: &str = "markets/quote";

/// Premium quote of one market as published by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketApr {
    pub id: String,
    pub market_id: String,
    pub capital_token: String,
    pub premium_token: String,
    pub apy: String,
    pub quote_per_second: String,
}

#[derive(Debug, Deserialize)]
struct Deployment {
    #[serde(default)]
    markets: Vec<MarketApr>,
}

/// Fetch current market quotes. Only the first deployment is reported.
pub async fn fetch_market_aprs(
    client: &reqwest::Client,
    api_url: &str,
) -> Result<Vec<MarketApr>, ServiceError> {
    let url = format!(
        "{}/v1/deployments/all/products/all/markets/all/quote",
        api_url.trim_end_matches('/')
    );
    let resp = client.get(&url).send().await.map_err(|e| ServiceError::Http {
        source: e,
        endpoint: ENDPOINT,
    })?;
    if !resp.status().is_success() {
        return Err(ServiceError::Status {
            status: resp.status().as_u16(),
            endpoint: ENDPOINT,
        });
    }
    let deployments: Vec<Deployment> = resp.json().await.map_err(|e| ServiceError::Http {
        source: e,
        endpoint: ENDPOINT,
    })?;
    Ok(deployments
        .into_iter()
        .next()
        .map(|d| d.markets)
        .unwrap_or_default())
}
