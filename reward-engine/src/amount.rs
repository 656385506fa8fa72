use rust_decimal::Decimal;

/// Seconds in a 365 day year, used to annualize per-second emissions.
pub const SECONDS_PER_YEAR: i64 = 31_536_000;

/// Decimals of the pool (LP) token.
pub const POOL_TOKEN_DECIMALS: u32 = 18;

/// Largest scale a [`Decimal`] can carry.
const MAX_SCALE: u32 = 28;

/// Convert a raw integer-unit amount into whole tokens (`amount * 10^-decimals`).
///
/// Scaling happens in steps of at most 28 places, so any `decimals` value is
/// accepted; digits that fall beyond the representable scale are rounded away.
pub fn normalize(amount: Decimal, decimals: u32) -> Decimal {
    let mut out = amount;
    let mut left = decimals;
    while left > 0 {
        let step = left.min(MAX_SCALE);
        out *= Decimal::new(1, step);
        left -= step;
    }
    out
}
