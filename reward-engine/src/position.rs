//! Valuation of an account's position in a pool.
//!
//! Balances are read from the pool contract by the caller; this module only
//! turns those raw readings and a [`PoolEarnings`] into display values.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::amount::normalize;
use crate::earnings::PoolEarnings;

/// Raw on-chain readings for one account and pool (integer token units).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionInputs {
    /// Account's pool token balance.
    pub lp_balance: Decimal,
    pub pool_token_total_supply: Decimal,
    /// Capital held by the whole pool.
    pub capital_token_balance: Decimal,
    #[serde(default)]
    pub premium: Decimal,
    #[serde(default)]
    pub settlement: Decimal,
    pub capital_decimals: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionValuation {
    /// Account's share of the pool in percent; `None` for an empty pool.
    pub share_percent: Option<Decimal>,
    pub capital: Decimal,
    pub premium: Decimal,
    pub settlement: Decimal,
    pub total_interest: Decimal,
    pub available_withdraw: Decimal,
    /// Earned balance of the first earning token, raw units.
    pub currently_earned: Decimal,
    pub currently_earned_usd: Decimal,
    pub earning_decimals: Option<u32>,
}

pub fn value_position(inputs: &PositionInputs, earnings: &PoolEarnings) -> PositionValuation {
    let share = if inputs.pool_token_total_supply.is_zero() {
        None
    } else {
        inputs.lp_balance.checked_div(inputs.pool_token_total_supply)
    };

    let capital = share
        .and_then(|s| s.checked_mul(inputs.capital_token_balance))
        .map(|raw| normalize(raw, inputs.capital_decimals))
        .unwrap_or(Decimal::ZERO);
    let premium = normalize(inputs.premium, inputs.capital_decimals);
    let settlement = normalize(inputs.settlement, inputs.capital_decimals);
    let total_interest = add_or_zero(premium, settlement, "total interest");

    let first = earnings.earnings.first();
    let currently_earned = first.map_or(Decimal::ZERO, |e| e.earned_amount);
    let currently_earned_usd = first
        .and_then(|e| normalize(e.earned_amount, e.decimals).checked_mul(e.usd_price))
        .unwrap_or(Decimal::ZERO);

    PositionValuation {
        share_percent: share.and_then(|s| s.checked_mul(Decimal::ONE_HUNDRED)),
        capital,
        premium,
        settlement,
        total_interest,
        available_withdraw: add_or_zero(capital, total_interest, "withdrawable amount"),
        currently_earned,
        currently_earned_usd,
        earning_decimals: first.map(|e| e.decimals),
    }
}

fn add_or_zero(a: Decimal, b: Decimal, what: &str) -> Decimal {
    a.checked_add(b).unwrap_or_else(|| {
        warn!(what, "position value overflows; reported as zero");
        Decimal::ZERO
    })
}
