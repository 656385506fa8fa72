use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EarningsError {
    #[error("evaluation of pool {pool_id} was cancelled")]
    Cancelled { pool_id: String },
}
