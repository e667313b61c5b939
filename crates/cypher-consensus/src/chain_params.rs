//! Chain parameters for the Cypher network.
//!
//! Network-specific consensus parameters for the proof-of-stake rules.
//! - `ChainParams::mainnet()` for mainnet
//! - `ChainParams::from_config()` for testnet/devnet/private networks
//!
//! The protocol-v3 switch is expressed twice because the rules consult it
//! in two domains: timestamp rules key on the block time, kernel dispatch
//! keys on the height of the block being validated.

use std::fmt;

/// Satoshi per coin.
pub const COIN: i64 = 100_000_000;

/// Satoshi per cent.
pub const CENT: i64 = 1_000_000;

/// Ratio of selection-section length between the last group and the
/// first group of the stake-modifier selection interval.
pub const MODIFIER_INTERVAL_RATIO: i64 = 3;

/// Error when constructing ChainParams from configuration.
#[derive(Debug, Clone)]
pub struct ChainParamsError {
    /// The field that is missing or invalid.
    pub field: &'static str,
    /// Description of the error.
    pub message: String,
}

impl fmt::Display for ChainParamsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChainParams error for '{}': {}", self.field, self.message)
    }
}

impl std::error::Error for ChainParamsError {}

/// Configuration for loading ChainParams from TOML/JSON.
///
/// All fields are optional so partial configs can be validated with
/// clear errors.
#[derive(Debug, Clone, Default)]
pub struct ChainParamsConfig {
    /// Minimum coin age in seconds before a UTXO can stake.
    pub stake_min_age: Option<i64>,
    /// Cap on coin-age weight, in seconds.
    pub stake_max_age: Option<i64>,
    /// Stake-modifier epoch length in seconds.
    pub modifier_interval: Option<i64>,
    /// Expected block interval in seconds.
    pub target_spacing: Option<i64>,
    /// Bitmask for the v3 coinstake timestamp grid.
    pub stake_timestamp_mask: Option<i64>,
    /// Minimum confirmations before a coinbase/coinstake output can stake.
    pub coinbase_maturity: Option<u32>,
    /// Block time from which the v3 timestamp rules apply.
    pub protocol_v3_time: Option<i64>,
    /// Block height from which the v2 kernel applies.
    pub protocol_v3_height: Option<u32>,
}

/// Network-specific proof-of-stake consensus parameters.
///
/// NOT hardcoded - different networks (mainnet, testnet) have different
/// values, and the tests drive the rules with compressed intervals.
#[derive(Debug, Clone)]
pub struct ChainParams {
    /// Minimum coin age in seconds before a UTXO can stake.
    pub stake_min_age: i64,

    /// Cap on coin-age weight, in seconds.
    pub stake_max_age: i64,

    /// Stake-modifier epoch length in seconds.
    pub modifier_interval: i64,

    /// Expected block interval in seconds.
    pub target_spacing: i64,

    /// Bitmask valid v3 coinstake timestamps must clear.
    pub stake_timestamp_mask: i64,

    /// Minimum confirmations before a staked output counts.
    pub coinbase_maturity: u32,

    /// Block time from which the v3 timestamp rules apply.
    pub protocol_v3_time: i64,

    /// Block height from which the v2 kernel applies.
    pub protocol_v3_height: u32,
}

impl ChainParams {
    /// Create mainnet parameters.
    pub fn mainnet() -> Self {
        Self {
            stake_min_age: 8 * 60 * 60,
            stake_max_age: 365 * 24 * 60 * 60,
            modifier_interval: 10 * 60,
            target_spacing: 64,
            stake_timestamp_mask: 0x0f, // 16-second grid
            coinbase_maturity: 500,
            protocol_v3_time: 1_444_028_400,
            protocol_v3_height: 500_000,
        }
    }

    /// Create ChainParams from configuration.
    ///
    /// Returns an error naming the specific field if any required field
    /// is missing or invalid.
    pub fn from_config(config: &ChainParamsConfig) -> Result<Self, ChainParamsError> {
        fn require<T: Copy>(
            value: Option<T>,
            field: &'static str,
        ) -> Result<T, ChainParamsError> {
            value.ok_or(ChainParamsError {
                field,
                message: "required field missing".to_string(),
            })
        }

        let modifier_interval = require(config.modifier_interval, "modifier_interval")?;
        if modifier_interval <= 0 {
            return Err(ChainParamsError {
                field: "modifier_interval",
                message: "must be positive".to_string(),
            });
        }
        let target_spacing = require(config.target_spacing, "target_spacing")?;
        if target_spacing <= 0 {
            return Err(ChainParamsError {
                field: "target_spacing",
                message: "must be positive".to_string(),
            });
        }

        Ok(Self {
            stake_min_age: require(config.stake_min_age, "stake_min_age")?,
            stake_max_age: require(config.stake_max_age, "stake_max_age")?,
            modifier_interval,
            target_spacing,
            stake_timestamp_mask: require(config.stake_timestamp_mask, "stake_timestamp_mask")?,
            coinbase_maturity: require(config.coinbase_maturity, "coinbase_maturity")?,
            protocol_v3_time: require(config.protocol_v3_time, "protocol_v3_time")?,
            protocol_v3_height: require(config.protocol_v3_height, "protocol_v3_height")?,
        })
    }

    /// True once the v3 timestamp rules are active at `block_time`.
    pub fn is_protocol_v3(&self, block_time: i64) -> bool {
        block_time >= self.protocol_v3_time
    }

    /// True once the v2 kernel is active for a block at `height`.
    pub fn is_protocol_v3_height(&self, height: u32) -> bool {
        height >= self.protocol_v3_height
    }
}
