//! Stake kernel hashes.
//!
//! A coinstake's first input must meet a coin-weighted hash target:
//!
//! v1 (pre-protocol-v3, coin-age weighted):
//! `SHA256d(modifier ‖ block_from.time ‖ tx_prev_offset ‖ tx_prev.time ‖
//! prevout.n ‖ tx_time) ≤ target · coin_day_weight`
//!
//! v2 (protocol-v3, value weighted):
//! `SHA256d(modifier_v2 ‖ tx_prev.time ‖ prevout.txid ‖ prevout.n ‖
//! tx_time) ≤ target · value_in`
//!
//! The fields are chosen so a txout owner cannot precompute future
//! proofs: the stake modifier is unknown at confirmation time, and the
//! remaining fields spread otherwise-simultaneous staking attempts
//! apart. Block and transaction hashes are deliberately absent since
//! they can be ground in vast quantities, which would degrade the scheme
//! back into proof-of-work.

use crate::chain_params::{ChainParams, COIN};
use crate::coinage::coin_age_weight;
use crate::compact::compact_to_target;
use crate::error::{ConsensusError, ConsensusResult};
use crate::modifier::kernel_stake_modifier;
use cypher_chain::{
    BlockRecord, ChainIndex, DoubleSha256, Hash256, NetworkClock, OutPoint, Transaction,
};
use num_bigint::BigUint;
use tracing::debug;

/// Check a v1 (coin-age weighted) kernel. Returns the proof hash.
#[allow(clippy::too_many_arguments)]
pub fn check_stake_kernel_hash_v1<I, C>(
    params: &ChainParams,
    index: &I,
    clock: &C,
    tip: &BlockRecord,
    n_bits: u32,
    block_from: &BlockRecord,
    tx_prev_offset: u32,
    tx_prev: &Transaction,
    prevout: &OutPoint,
    tx_time: u32,
) -> ConsensusResult<Hash256>
where
    I: ChainIndex,
    C: NetworkClock,
{
    let time_block_from = block_from.time;
    // Deal with missing timestamps in PoW blocks.
    let time_tx_prev = if tx_prev.time == 0 {
        time_block_from
    } else {
        tx_prev.time
    };

    if tx_time < time_tx_prev {
        return Err(ConsensusError::TimestampViolation {
            tx_time,
            prev_time: time_tx_prev,
        });
    }
    if time_block_from as i64 + params.stake_min_age > tx_time as i64 {
        return Err(ConsensusError::MinAgeViolation {
            block_time: time_block_from,
            tx_time,
        });
    }

    let target_per_coin_day = compact_to_target(n_bits);
    let value_in = stake_value(tx_prev, prevout)?;
    let weight = coin_age_weight(params, time_tx_prev as i64, tx_time as i64);
    let coin_day_weight = BigUint::from(value_in as u64) * BigUint::from(weight as u64)
        / BigUint::from(COIN as u64)
        / BigUint::from(24u64 * 60 * 60);

    let modifier = kernel_stake_modifier(params, index, clock, tip, &block_from.hash)?;

    let mut ss = DoubleSha256::new();
    ss.write_u64_le(modifier);
    ss.write_u32_le(time_block_from);
    ss.write_u32_le(tx_prev_offset);
    ss.write_u32_le(time_tx_prev);
    ss.write_u32_le(prevout.n);
    ss.write_u32_le(tx_time);
    let proof_hash = ss.finalize();

    debug!(
        modifier = format_args!("{modifier:#018x}"),
        time_block_from,
        tx_prev_offset,
        time_tx_prev,
        prevout_n = prevout.n,
        tx_time,
        proof = %proof_hash,
        "kernel v1"
    );

    if proof_hash.to_biguint() > coin_day_weight * target_per_coin_day {
        return Err(ConsensusError::KernelNotMet);
    }
    Ok(proof_hash)
}

/// Check a v2 (value weighted) kernel. Returns the proof hash.
pub fn check_stake_kernel_hash_v2(
    tip: &BlockRecord,
    n_bits: u32,
    tx_prev: &Transaction,
    prevout: &OutPoint,
    tx_time: u32,
) -> ConsensusResult<Hash256> {
    if tx_time < tx_prev.time {
        return Err(ConsensusError::TimestampViolation {
            tx_time,
            prev_time: tx_prev.time,
        });
    }

    // Weighted target.
    let value_in = stake_value(tx_prev, prevout)?;
    if value_in <= 0 {
        return Err(ConsensusError::ZeroStakeValue(value_in));
    }
    let target = compact_to_target(n_bits) * BigUint::from(value_in as u64);

    let mut ss = DoubleSha256::new();
    ss.write_hash(&tip.stake_modifier_v2);
    ss.write_u32_le(tx_prev.time);
    ss.write_hash(&prevout.txid);
    ss.write_u32_le(prevout.n);
    ss.write_u32_le(tx_time);
    let proof_hash = ss.finalize();

    debug!(
        modifier_v2 = %tip.stake_modifier_v2,
        time_tx_prev = tx_prev.time,
        prevout_txid = %prevout.txid,
        prevout_n = prevout.n,
        tx_time,
        proof = %proof_hash,
        "kernel v2"
    );

    if proof_hash.to_biguint() > target {
        return Err(ConsensusError::KernelNotMet);
    }
    Ok(proof_hash)
}

/// Check the kernel of a coinstake, dispatching on the protocol version
/// active at the block being validated (`tip.height + 1`).
#[allow(clippy::too_many_arguments)]
pub fn check_stake_kernel_hash<I, C>(
    params: &ChainParams,
    index: &I,
    clock: &C,
    tip: &BlockRecord,
    n_bits: u32,
    block_from: &BlockRecord,
    tx_prev_offset: u32,
    tx_prev: &Transaction,
    prevout: &OutPoint,
    tx_time: u32,
) -> ConsensusResult<Hash256>
where
    I: ChainIndex,
    C: NetworkClock,
{
    if params.is_protocol_v3_height(tip.height + 1) {
        check_stake_kernel_hash_v2(tip, n_bits, tx_prev, prevout, tx_time)
    } else {
        check_stake_kernel_hash_v1(
            params,
            index,
            clock,
            tip,
            n_bits,
            block_from,
            tx_prev_offset,
            tx_prev,
            prevout,
            tx_time,
        )
    }
}

fn stake_value(tx_prev: &Transaction, prevout: &OutPoint) -> ConsensusResult<i64> {
    Ok(tx_prev
        .outputs
        .get(prevout.n as usize)
        .ok_or(ConsensusError::BadPrevoutIndex {
            n: prevout.n,
            outputs: tx_prev.outputs.len(),
        })?
        .value)
}
