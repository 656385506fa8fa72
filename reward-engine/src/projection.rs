use rust_decimal::Decimal;
use tracing::warn;

use crate::amount::{normalize, SECONDS_PER_YEAR};
use crate::stream::{AggregatedRewardToken, TokenMap};

/// Annual USD value of the rewards a pool pays out, summed over its tokens.
///
/// A token whose value would overflow the running total is counted as zero.
pub fn annualize(tokens: &TokenMap) -> Decimal {
    tokens.values().fold(Decimal::ZERO, |total, token| {
        total
            .checked_add(token_annual_usd(token))
            .unwrap_or_else(|| {
                warn!(token = %token.id, "annual reward total overflows; token counted as zero");
                total
            })
    })
}

/// Annual USD run-rate of a single token's projected emission.
///
/// Tokens without a price or with an empty window contribute zero.
pub fn token_annual_usd(token: &AggregatedRewardToken) -> Decimal {
    let duration = token.duration();
    if token.usd_price.is_zero() || duration == 0 {
        return Decimal::ZERO;
    }

    let annual = normalize(token.total_projected_amount, token.decimals)
        .checked_mul(token.usd_price)
        .and_then(|usd| usd.checked_div(Decimal::from(duration)))
        .and_then(|per_sec| per_sec.checked_mul(Decimal::from(SECONDS_PER_YEAR)));

    annual.unwrap_or_else(|| {
        warn!(token = %token.id, "annual reward value overflows; counted as zero");
        Decimal::ZERO
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::{RewardStreamDescriptor, TokenId};
    use rust_decimal_macros::dec;

    fn token(
        address: &str,
        projected: Decimal,
        decimals: u32,
        price: Decimal,
        started_at: i64,
        ended_at: i64,
    ) -> AggregatedRewardToken {
        let mut token = AggregatedRewardToken::new(&RewardStreamDescriptor {
            pool_id: "0xpool".into(),
            stream_index: 0,
            reward_token_address: address.into(),
            reward_token_symbol: "RWD".into(),
            reward_token_name: "Reward".into(),
            reward_token_decimals: decimals,
            rate_per_second: Decimal::ZERO,
            started_at,
            ended_at,
        });
        token.total_projected_amount = projected;
        token.usd_price = price;
        token
    }

    fn map(list: Vec<AggregatedRewardToken>) -> TokenMap {
        list.into_iter().map(|t| (t.id.clone(), t)).collect()
    }

    #[test]
    fn one_year_emission_at_unit_price() {
        let t = token("0xa", dec!(315360000), 0, dec!(1), 0, 31_536_000);
        assert_eq!(token_annual_usd(&t), dec!(315360000));
    }

    #[test]
    fn short_stream_is_scaled_to_a_year() {
        // 864 tokens (18 decimals) over 10 days at $2
        let t = token("0xa", dec!(864000000000000000000), 18, dec!(2), 0, 864_000);
        assert_eq!(token_annual_usd(&t), dec!(63072));
    }

    #[test]
    fn zero_duration_contributes_zero() {
        let t = token("0xa", dec!(500), 0, dec!(3), 0, 0);
        assert_eq!(token_annual_usd(&t), Decimal::ZERO);
    }

    #[test]
    fn unpriced_token_contributes_zero() {
        let t = token("0xa", dec!(500), 0, Decimal::ZERO, 0, 100);
        assert_eq!(token_annual_usd(&t), Decimal::ZERO);
    }

    #[test]
    fn sums_across_tokens() {
        let tokens = map(vec![
            token("0xa", dec!(315360000), 0, dec!(1), 0, 31_536_000),
            token("0xb", dec!(31536000), 0, dec!(0.5), 0, 31_536_000),
            token("0xc", dec!(10), 0, Decimal::ZERO, 0, 10),
        ]);
        assert_eq!(annualize(&tokens), dec!(315360000) + dec!(15768000));
        assert!(tokens.contains_key(&TokenId::from_address("0xc")));
    }

    #[test]
    fn empty_pool_is_zero() {
        assert_eq!(annualize(&TokenMap::new()), Decimal::ZERO);
    }

    #[test]
    fn overflowing_annual_value_counts_as_zero() {
        // 7e28 tokens over one second cannot be scaled to a year
        let t = token("0xa", dec!(70000000000000000000000000000), 0, dec!(1), 0, 1);
        assert_eq!(token_annual_usd(&t), Decimal::ZERO);
    }

    #[test]
    fn overflowing_total_drops_the_late_token() {
        let tokens = map(vec![
            token("0xa", dec!(50457600000000000000000000000), 0, dec!(1), 0, 31_536_000),
            token("0xb", dec!(50457600000000000000000000000), 0, dec!(1), 0, 31_536_000),
            token("0xc", dec!(31536000), 0, dec!(1), 0, 31_536_000),
        ]);
        assert_eq!(annualize(&tokens), dec!(50457600000000000000031536000));
    }
}
