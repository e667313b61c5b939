//! # cypher-consensus
//!
//! Proof-of-stake consensus rules for the Cypher blockchain.
//!
//! This crate provides:
//! - Coin-age weight (PoSV aging curve) and the coin-age accumulator
//! - Stake modifier v1 selection and the v2 hash-chain transition
//! - Kernel hash checks v1 (coin-age weighted) and v2 (value weighted)
//! - The coinstake validator (`check_proof_of_stake`) and the staker's
//!   kernel probe (`check_kernel`)
//! - Compact (nBits) target codec and network chain parameters
//!
//! Everything here is a deterministic, single-threaded, read-only
//! function of its inputs: the chain index, transaction store, script
//! engine, and clock all arrive as capability traits from
//! `cypher-chain`, never as process-wide state.

mod chain_params;
mod coinage;
mod compact;
mod error;
mod kernel;
mod modifier;
mod stake;

pub use chain_params::{
    ChainParams, ChainParamsConfig, ChainParamsError, CENT, COIN, MODIFIER_INTERVAL_RATIO,
};
pub use coinage::{coin_age_weight, transaction_get_coin_age};
pub use compact::{compact_to_target, target_to_compact};
pub use error::{ConsensusError, ConsensusResult};
pub use kernel::{check_stake_kernel_hash, check_stake_kernel_hash_v1, check_stake_kernel_hash_v2};
pub use modifier::{
    compute_next_stake_modifier, compute_stake_modifier_v2, kernel_stake_modifier,
    selection_interval, selection_interval_section,
};
pub use stake::{
    cache_kernel, check_coinstake_timestamp, check_kernel, check_kernel_cached,
    check_proof_of_stake, check_stake_block_timestamp, verify_signature, StakeCache,
};
