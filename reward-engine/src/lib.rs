//! Reward accrual and yield computation for liquidity pools.
//!
//! A pool pays rewards through time-bounded, constant-rate streams. The
//! engine folds those streams into one record per reward token
//! ([`aggregate`]), joins the account's off-chain earned balances
//! ([`merge`]), values emissions in USD and annualizes them ([`annualize`]),
//! and picks the reward currently running ([`select_most_recent`]).
//! [`PoolEarningsCalculator`] runs the whole evaluation against a
//! [`PriceSource`] and a [`LedgerSource`]; [`evaluate_pools`] fans it out over
//! many pools.
//!
//! Every evaluation starts from scratch. Collaborator failures degrade to
//! zero values instead of errors, and a pool without a USD value reports
//! [`Apy::Unavailable`].

pub mod aggregate;
pub mod amount;
pub mod earnings;
pub mod error;
pub mod fanout;
pub mod ledger;
pub mod position;
pub mod projection;
pub mod source;
pub mod stream;
pub mod window;

pub use aggregate::aggregate;
pub use amount::{normalize, POOL_TOKEN_DECIMALS, SECONDS_PER_YEAR};
pub use earnings::{
    compute_apy, Apy, EarnedTokenSummary, PoolEarnings, PoolEarningsCalculator, PoolRequest,
    DEFAULT_FETCH_TIMEOUT,
};
pub use error::EarningsError;
pub use fanout::evaluate_pools;
pub use ledger::{merge, LedgerEntry, LedgerSnapshot};
pub use position::{value_position, PositionInputs, PositionValuation};
pub use projection::{annualize, token_annual_usd};
pub use source::{LedgerSource, PriceSource, SourceError};
pub use stream::{coin_id, AggregatedRewardToken, RewardStreamDescriptor, TokenId, TokenMap};
pub use window::select_most_recent;
