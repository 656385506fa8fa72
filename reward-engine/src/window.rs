use crate::stream::{AggregatedRewardToken, TokenMap};

/// Pick the reward shown as the pool's current reward.
///
/// Among tokens whose `[started_at, ended_at)` window contains `now_secs`, the
/// most recently started one wins. Equal starts keep the earlier token in map
/// order. Returns `None` when no reward is running.
pub fn select_most_recent(tokens: &TokenMap, now_secs: i64) -> Option<&AggregatedRewardToken> {
    let mut result: Option<&AggregatedRewardToken> = None;
    for token in tokens.values().filter(|t| t.is_active_at(now_secs)) {
        if result.map_or(true, |best| best.started_at < token.started_at) {
            result = Some(token);
        }
    }
    result
}
