use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::stream::{RewardStreamDescriptor, TokenId, TokenMap};

/// Amount an account has earned on one reward stream, as tracked off-chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    pub pool_id: String,
    pub stream_index: u64,
    pub earned_amount: Decimal,
}

/// Result of one batched ledger lookup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LedgerSnapshot {
    pub entries: Vec<LedgerEntry>,
    /// When the ledger answered (ms). `None` when nothing was fetched.
    pub fetched_at_ms: Option<i64>,
}

impl LedgerSnapshot {
    pub fn new(entries: Vec<LedgerEntry>, fetched_at_ms: i64) -> Self {
        Self {
            entries,
            fetched_at_ms: Some(fetched_at_ms),
        }
    }

    /// Empty snapshot standing in for a ledger that could not be reached.
    pub fn unavailable() -> Self {
        Self::default()
    }

    fn index(&self) -> HashMap<(&str, u64), &LedgerEntry> {
        let mut index = HashMap::with_capacity(self.entries.len());
        for entry in &self.entries {
            index
                .entry((entry.pool_id.as_str(), entry.stream_index))
                .or_insert(entry);
        }
        index
    }
}

/// Join ledger balances onto the aggregated tokens of a pool.
///
/// Each stream is matched by `(pool_id, stream_index)`; a positive balance is
/// added to the stream's token and the stream becomes claimable. The
/// aggregation is taken by value and returned, so merging the same snapshot
/// into the same input twice yields the same result.
pub fn merge(
    streams: &[RewardStreamDescriptor],
    ledger: &LedgerSnapshot,
    mut tokens: TokenMap,
) -> TokenMap {
    let index = ledger.index();
    for stream in streams {
        let Some(entry) = index.get(&(stream.pool_id.as_str(), stream.stream_index)) else {
            continue;
        };
        let Some(token) = tokens.get_mut(&TokenId::from_address(&stream.reward_token_address))
        else {
            continue;
        };

        token.last_updated_at = ledger.fetched_at_ms;
        if entry.earned_amount <= Decimal::ZERO {
            continue;
        }
        match token.earned_amount.checked_add(entry.earned_amount) {
            Some(total) => {
                token.earned_amount = total;
                token.earned_stream_ids.push(stream.stream_index);
            }
            None => warn!(
                pool_id = %stream.pool_id,
                stream_index = stream.stream_index,
                "earned balance overflows; ledger entry skipped"
            ),
        }
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::aggregate;
    use rust_decimal_macros::dec;

    fn stream(index: u64, token: &str) -> RewardStreamDescriptor {
        RewardStreamDescriptor {
            pool_id: "0xpool".into(),
            stream_index: index,
            reward_token_address: token.into(),
            reward_token_symbol: "RWD".into(),
            reward_token_name: "Reward".into(),
            reward_token_decimals: 18,
            rate_per_second: dec!(1),
            started_at: 0,
            ended_at: 1000,
        }
    }

    fn entry(index: u64, earned: Decimal) -> LedgerEntry {
        LedgerEntry {
            pool_id: "0xpool".into(),
            stream_index: index,
            earned_amount: earned,
        }
    }

    #[test]
    fn accumulates_positive_balances_per_token() {
        let streams = vec![stream(1, "0xa"), stream(2, "0xa"), stream(3, "0xb")];
        let ledger = LedgerSnapshot::new(
            vec![entry(1, dec!(10)), entry(2, dec!(5.5)), entry(3, Decimal::ZERO)],
            1_234,
        );
        let tokens = merge(&streams, &ledger, aggregate(&streams, 0));

        let a = &tokens[&TokenId::from_address("0xa")];
        assert_eq!(a.earned_amount, dec!(15.5));
        assert_eq!(a.earned_stream_ids, vec![1, 2]);
        assert_eq!(a.last_updated_at, Some(1_234));

        let b = &tokens[&TokenId::from_address("0xb")];
        assert_eq!(b.earned_amount, Decimal::ZERO);
        assert!(b.earned_stream_ids.is_empty());
        assert_eq!(b.last_updated_at, Some(1_234));
    }

    #[test]
    fn missing_entries_earn_nothing() {
        let streams = vec![stream(1, "0xa")];
        let ledger = LedgerSnapshot::new(vec![entry(9, dec!(3))], 1);
        let tokens = merge(&streams, &ledger, aggregate(&streams, 0));
        let a = &tokens[&TokenId::from_address("0xa")];
        assert_eq!(a.earned_amount, Decimal::ZERO);
        assert_eq!(a.last_updated_at, None);
    }

    #[test]
    fn entries_of_other_pools_are_ignored() {
        let streams = vec![stream(1, "0xa")];
        let mut other = entry(1, dec!(3));
        other.pool_id = "0xother".into();
        let tokens = merge(&streams, &LedgerSnapshot::new(vec![other], 1), aggregate(&streams, 0));
        assert_eq!(tokens[&TokenId::from_address("0xa")].earned_amount, Decimal::ZERO);
    }

    #[test]
    fn remerging_from_fresh_aggregation_does_not_double_count() {
        let streams = vec![stream(1, "0xa")];
        let ledger = LedgerSnapshot::new(vec![entry(1, dec!(7))], 1);
        let base = aggregate(&streams, 0);
        let first = merge(&streams, &ledger, base.clone());
        let second = merge(&streams, &ledger, base);
        assert_eq!(first, second);
        assert_eq!(second[&TokenId::from_address("0xa")].earned_amount, dec!(7));
    }

    #[test]
    fn repeated_ledger_key_uses_first_entry() {
        let streams = vec![stream(1, "0xa")];
        let ledger = LedgerSnapshot::new(vec![entry(1, dec!(2)), entry(1, dec!(100))], 1);
        let tokens = merge(&streams, &ledger, aggregate(&streams, 0));
        assert_eq!(tokens[&TokenId::from_address("0xa")].earned_amount, dec!(2));
    }

    #[test]
    fn unavailable_ledger_leaves_tokens_untouched() {
        let streams = vec![stream(1, "0xa")];
        let base = aggregate(&streams, 0);
        let merged = merge(&streams, &LedgerSnapshot::unavailable(), base.clone());
        assert_eq!(merged, base);
    }

    #[test]
    fn overflowing_balance_keeps_earlier_streams() {
        let streams = vec![stream(1, "0xa"), stream(2, "0xa")];
        let ledger = LedgerSnapshot::new(
            vec![
                entry(1, dec!(50000000000000000000000000000)),
                entry(2, dec!(50000000000000000000000000000)),
            ],
            1,
        );
        let tokens = merge(&streams, &ledger, aggregate(&streams, 0));
        let a = &tokens[&TokenId::from_address("0xa")];
        assert_eq!(a.earned_amount, dec!(50000000000000000000000000000));
        assert_eq!(a.earned_stream_ids, vec![1]);
    }
}
