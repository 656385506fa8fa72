use rust_decimal::Decimal;
use tracing::warn;

use crate::stream::{AggregatedRewardToken, RewardStreamDescriptor, TokenId, TokenMap};

/// Fold a pool's reward streams into one record per reward token.
///
/// `now_ms` is the evaluation instant in milliseconds. Only streams whose
/// window contains it add to the projected amount and the combined rate;
/// inactive streams still register their token so ledger balances can be
/// merged onto it later.
pub fn aggregate(streams: &[RewardStreamDescriptor], now_ms: i64) -> TokenMap {
    let mut tokens = TokenMap::new();
    for stream in streams {
        let token = tokens
            .entry(TokenId::from_address(&stream.reward_token_address))
            .or_insert_with(|| AggregatedRewardToken::new(stream));

        if !stream.is_active_at_ms(now_ms) {
            continue;
        }

        let totals = projected_amount(stream).and_then(|amount| {
            Some((
                token.total_projected_amount.checked_add(amount)?,
                token
                    .combined_rate_per_second
                    .checked_add(stream.rate_per_second)?,
            ))
        });
        match totals {
            Some((projected, rate)) => {
                token.total_projected_amount = projected;
                token.combined_rate_per_second = rate;
            }
            None => warn!(
                pool_id = %stream.pool_id,
                stream_index = stream.stream_index,
                "projected reward amount overflows; stream skipped"
            ),
        }
    }
    tokens
}

fn projected_amount(stream: &RewardStreamDescriptor) -> Option<Decimal> {
    stream
        .rate_per_second
        .checked_mul(Decimal::from(stream.duration()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn stream(
        index: u64,
        token: &str,
        rate: Decimal,
        started_at: i64,
        ended_at: i64,
    ) -> RewardStreamDescriptor {
        RewardStreamDescriptor {
            pool_id: "0xpool".into(),
            stream_index: index,
            reward_token_address: token.into(),
            reward_token_symbol: token.to_uppercase(),
            reward_token_name: format!("{token} token"),
            reward_token_decimals: 0,
            rate_per_second: rate,
            started_at,
            ended_at,
        }
    }

    #[test]
    fn one_year_stream_at_mid_year() {
        let streams = vec![stream(0, "0xa", dec!(10), 0, 31_536_000)];
        let tokens = aggregate(&streams, 15_768_000 * 1000);
        let token = tokens.get(&TokenId::from_address("0xa")).unwrap();
        assert_eq!(token.total_projected_amount, dec!(315360000));
        assert_eq!(token.combined_rate_per_second, dec!(10));
    }

    #[test]
    fn combined_rate_is_order_independent() {
        let mut streams = vec![
            stream(0, "0xa", dec!(1.25), 0, 1000),
            stream(1, "0xa", dec!(2.5), 100, 2000),
            stream(2, "0xa", dec!(0.125), 400, 600),
        ];
        let forward = aggregate(&streams, 500_000);
        streams.reverse();
        let backward = aggregate(&streams, 500_000);

        let id = TokenId::from_address("0xa");
        assert_eq!(forward[&id].combined_rate_per_second, dec!(3.875));
        assert_eq!(
            forward[&id].combined_rate_per_second,
            backward[&id].combined_rate_per_second
        );
        assert_eq!(
            forward[&id].total_projected_amount,
            backward[&id].total_projected_amount
        );
        assert_eq!(forward[&id].total_projected_amount, dec!(1250) + dec!(4750) + dec!(25));
    }

    #[test]
    fn inactive_streams_register_without_contributing() {
        let streams = vec![
            stream(0, "0xa", dec!(5), 0, 100),
            stream(1, "0xb", dec!(7), 1000, 2000),
        ];
        let tokens = aggregate(&streams, 500_000);
        assert_eq!(tokens.len(), 2);
        for token in tokens.values() {
            assert_eq!(token.total_projected_amount, Decimal::ZERO);
            assert_eq!(token.combined_rate_per_second, Decimal::ZERO);
        }
    }

    #[test]
    fn window_end_is_exclusive_and_start_inclusive() {
        let streams = vec![stream(0, "0xa", dec!(1), 100, 200)];
        let id = TokenId::from_address("0xa");
        assert_eq!(aggregate(&streams, 100_000)[&id].combined_rate_per_second, dec!(1));
        assert_eq!(aggregate(&streams, 200_000)[&id].combined_rate_per_second, Decimal::ZERO);
    }

    #[test]
    fn token_window_comes_from_first_stream() {
        let streams = vec![
            stream(0, "0xa", dec!(1), 0, 100),
            stream(1, "0xA", dec!(1), 50, 5000),
        ];
        let tokens = aggregate(&streams, 60_000);
        assert_eq!(tokens.len(), 1);
        let token = &tokens[&TokenId::from_address("0xa")];
        assert_eq!((token.started_at, token.ended_at), (0, 100));
        assert_eq!(token.combined_rate_per_second, dec!(2));
    }

    #[test]
    fn same_display_name_different_address_stay_apart() {
        let mut a = stream(0, "0xa", dec!(1), 0, 100);
        let mut b = stream(1, "0xb", dec!(1), 0, 100);
        a.reward_token_name = "Reward".into();
        b.reward_token_name = "reward".into();
        assert_eq!(aggregate(&[a, b], 10_000).len(), 2);
    }

    #[test]
    fn zero_length_stream_adds_nothing() {
        let streams = vec![stream(0, "0xa", dec!(3), 0, 0)];
        let tokens = aggregate(&streams, 0);
        let token = &tokens[&TokenId::from_address("0xa")];
        assert_eq!(token.total_projected_amount, Decimal::ZERO);
        assert_eq!(token.duration(), 0);
    }

    #[test]
    fn overflowing_projection_skips_only_that_stream() {
        let streams = vec![
            stream(0, "0xa", dec!(1000000000000000000000000000), 0, 100),
            stream(1, "0xa", dec!(2), 0, 100),
        ];
        let tokens = aggregate(&streams, 50_000);
        let token = &tokens[&TokenId::from_address("0xa")];
        assert_eq!(token.total_projected_amount, dec!(200));
        assert_eq!(token.combined_rate_per_second, dec!(2));
    }

    #[test]
    fn overflowing_token_total_keeps_earlier_streams() {
        let streams = vec![
            stream(0, "0xa", dec!(1000000000000000000000000000), 0, 50),
            stream(1, "0xa", dec!(1000000000000000000000000000), 0, 50),
        ];
        let tokens = aggregate(&streams, 10_000);
        let token = &tokens[&TokenId::from_address("0xa")];
        assert_eq!(token.total_projected_amount, dec!(50000000000000000000000000000));
        assert_eq!(token.combined_rate_per_second, dec!(1000000000000000000000000000));
    }
}
