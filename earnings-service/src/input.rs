//! Pool input files.
//!
//! ```json
//! {"pools": [{"poolId": "0x..", "assetName": "USD Coin", "totalLiquidity": "1000000",
//!             "streams": [], "position": {"lpBalance": "10", ...}}]}
//! ```

use std::path::Path;

use reward_engine::{PoolRequest, PositionInputs};
use serde::Deserialize;

use crate::error::ServiceError;

#[derive(Debug, Clone, Deserialize)]
pub struct PoolFile {
    #[serde(default)]
    pub pools: Vec<PoolEntry>,
}

/// One pool to evaluate, optionally with the account's raw position readings.
#[derive(Debug, Clone, Deserialize)]
pub struct PoolEntry {
    #[serde(flatten)]
    pub request: PoolRequest,
    #[serde(default)]
    pub position: Option<PositionInputs>,
}

pub fn load_pools(path: &Path) -> Result<Vec<PoolEntry>, ServiceError> {
    let raw = std::fs::read_to_string(path)?;
    let file: PoolFile = serde_json::from_str(&raw)?;
    Ok(file.pools)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use rust_decimal_macros::dec;

    #[test]
    fn loads_pools_with_and_without_position() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"pools": [
                {{"poolId": "0xpool", "assetName": "USD Coin", "assetDecimals": 6,
                  "totalLiquidity": "5000000",
                  "streams": [{{"poolId": "0xpool", "streamIndex": 1,
                                "rewardTokenAddress": "0xAA", "rewardTokenSymbol": "RWD",
                                "rewardTokenName": "Reward", "rewardTokenDecimals": 18,
                                "ratePerSecond": "10", "startedAt": 0, "endedAt": 100}}],
                  "position": {{"lpBalance": "1", "poolTokenTotalSupply": "4",
                                "capitalTokenBalance": "4000000", "capitalDecimals": 6}}}},
                {{"poolId": "0xother", "assetName": "Dai", "totalLiquidity": "0"}}
            ]}}"#
        )
        .unwrap();

        let pools = load_pools(file.path()).unwrap();
        assert_eq!(pools.len(), 2);
        assert_eq!(pools[0].request.asset_decimals, 6);
        assert_eq!(pools[0].request.streams.len(), 1);
        assert_eq!(pools[0].position.as_ref().unwrap().lp_balance, dec!(1));
        assert_eq!(pools[1].request.asset_decimals, 18);
        assert!(pools[1].request.streams.is_empty());
        assert!(pools[1].position.is_none());
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_pools(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, ServiceError::Io(_)));
    }
}
