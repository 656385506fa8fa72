use std::time::Duration;

use reqwest::ClientBuilder;

/// Build a `reqwest::ClientBuilder` for the ledger, price and market APIs.
///
/// Certificate verification is enabled by default.  To opt out (for example,
/// when working against a self-signed staging API), set the environment
/// variable `EARNINGS_ACCEPT_INVALID_CERTS` to a truthy value (`1`, `true`,
/// `yes`).  Disabling certificate verification is strongly discouraged for
/// production use.
pub fn builder(timeout: Duration) -> ClientBuilder {
    let mut builder = reqwest::Client::builder().timeout(timeout);
    let allow_invalid = std::env::var("EARNINGS_ACCEPT_INVALID_CERTS")
        .map(|v| matches!(v.as_str(), "1" | "true" | "yes"))
        .unwrap_or(false);
    if allow_invalid {
        builder = builder.danger_accept_invalid_certs(true);
    }
    builder
}
