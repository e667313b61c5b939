//! Proof-of-stake validation.
//!
//! `check_proof_of_stake` is the block-acceptance entry point: it checks
//! the coinstake's shape, resolves the staked output, verifies the
//! spending signature, enforces maturity, and finally checks the kernel
//! hash against the coin-weighted target. `check_kernel` is the lighter
//! probe the staker uses while searching for a valid kernel.

use crate::chain_params::ChainParams;
use crate::error::{ConsensusError, ConsensusResult};
use crate::kernel::check_stake_kernel_hash;
use cypher_chain::{
    BlockRecord, ChainIndex, Hash256, NetworkClock, OutPoint, ScriptVerifier, StoredTransaction,
    Transaction, TransactionStore,
};
use std::collections::HashMap;
use tracing::{debug, instrument};

/// Check whether a coinstake timestamp meets protocol.
///
/// Coinstake and block timestamps must coincide; under protocol v3 they
/// must additionally sit on the `stake_timestamp_mask` grid.
pub fn check_coinstake_timestamp(params: &ChainParams, block_time: i64, tx_time: i64) -> bool {
    if params.is_protocol_v3(block_time) {
        block_time == tx_time && (tx_time & params.stake_timestamp_mask) == 0
    } else {
        block_time == tx_time
    }
}

/// Header-only form of [`check_coinstake_timestamp`].
pub fn check_stake_block_timestamp(params: &ChainParams, block_time: i64) -> bool {
    check_coinstake_timestamp(params, block_time, block_time)
}

/// Check a coinstake's signature on its kernel input.
///
/// Structural prevout checks are done here; the script execution itself
/// is delegated to the script engine with no verification flags, as the
/// kernel check predates P2SH-style rules.
pub fn verify_signature<V: ScriptVerifier>(
    scripts: &V,
    tx_from: &Transaction,
    tx_to: &Transaction,
    input_index: usize,
) -> bool {
    let Some(txin) = tx_to.inputs.get(input_index) else {
        return false;
    };
    let Some(txout) = tx_from.outputs.get(txin.prevout.n as usize) else {
        return false;
    };
    if txin.prevout.txid != tx_from.txid() {
        return false;
    }
    scripts.verify_script(&txin.script_sig, &txout.script_pub_key, tx_to, input_index)
}

/// Check kernel hash target and coinstake signature.
///
/// On success returns the kernel (proof) hash, which the caller stores
/// in the block index and feeds into the v2 modifier transition. Every
/// rejection carries its denial-of-service severity; kernel failures
/// score 1 because an honest node behind on sync produces them too.
#[instrument(skip_all, fields(tip_height = tip.height))]
pub fn check_proof_of_stake<I, S, V, C>(
    params: &ChainParams,
    index: &I,
    store: &S,
    scripts: &V,
    clock: &C,
    tip: &BlockRecord,
    tx: &Transaction,
    n_bits: u32,
) -> ConsensusResult<Hash256>
where
    I: ChainIndex,
    S: TransactionStore,
    V: ScriptVerifier,
    C: NetworkClock,
{
    if !tx.is_coin_stake() {
        return Err(ConsensusError::NotCoinStake(tx.txid()));
    }

    // Kernel (input 0) must match the stake hash target per coin age.
    let txin = &tx.inputs[0];

    let stored = store
        .transaction(&txin.prevout.txid)
        .ok_or(ConsensusError::TxPrevNotFound(txin.prevout.txid))?;
    let block_from = index
        .block(&stored.block_hash)
        .ok_or(ConsensusError::BlockNotFound(stored.block_hash))?;

    if txin.prevout.txid != stored.tx.txid() {
        return Err(ConsensusError::PrevoutMismatch(txin.prevout.txid));
    }

    if !verify_signature(scripts, &stored.tx, tx, 0) {
        return Err(ConsensusError::SignatureFailed(tx.txid()));
    }

    let confirmations = tip.height as i64 + 1 - block_from.height as i64;
    if confirmations < params.coinbase_maturity as i64 {
        return Err(ConsensusError::ImmatureStake {
            required: params.coinbase_maturity,
            actual: confirmations.max(0) as u32,
        });
    }

    check_stake_kernel_hash(
        params,
        index,
        clock,
        tip,
        n_bits,
        block_from,
        stored.offset,
        &stored.tx,
        &txin.prevout,
        tx.time,
    )
}

/// Memoized staked-output lookups, keyed by prevout.
///
/// Caches only the transaction-store fetch; kernel results are always
/// recomputed, so the cache can never influence a consensus outcome.
pub type StakeCache = HashMap<OutPoint, StoredTransaction>;

/// Prime `cache` with the staked output behind `prevout`.
pub fn cache_kernel<S: TransactionStore>(
    cache: &mut StakeCache,
    store: &S,
    prevout: &OutPoint,
) -> ConsensusResult<()> {
    if cache.contains_key(prevout) {
        return Ok(());
    }
    let stored = store
        .transaction(&prevout.txid)
        .ok_or(ConsensusError::TxPrevNotFound(prevout.txid))?;
    cache.insert(*prevout, stored);
    Ok(())
}

/// Probe whether `prevout` can stake at `tx_time`. Returns the proof
/// hash a coinstake built on it would carry.
pub fn check_kernel<I, S, C>(
    params: &ChainParams,
    index: &I,
    store: &S,
    clock: &C,
    tip: &BlockRecord,
    n_bits: u32,
    tx_time: u32,
    prevout: &OutPoint,
) -> ConsensusResult<Hash256>
where
    I: ChainIndex,
    S: TransactionStore,
    C: NetworkClock,
{
    let stored = store
        .transaction(&prevout.txid)
        .ok_or(ConsensusError::TxPrevNotFound(prevout.txid))?;
    check_kernel_stored(params, index, clock, tip, n_bits, tx_time, prevout, &stored)
}

/// [`check_kernel`] against a pre-fetched cache; falls back to the store
/// for outpoints the cache does not hold.
#[allow(clippy::too_many_arguments)]
pub fn check_kernel_cached<I, S, C>(
    params: &ChainParams,
    index: &I,
    store: &S,
    clock: &C,
    tip: &BlockRecord,
    n_bits: u32,
    tx_time: u32,
    prevout: &OutPoint,
    cache: &StakeCache,
) -> ConsensusResult<Hash256>
where
    I: ChainIndex,
    S: TransactionStore,
    C: NetworkClock,
{
    match cache.get(prevout) {
        Some(stored) => {
            debug!(prevout = %prevout.txid, "using cached stake");
            check_kernel_stored(params, index, clock, tip, n_bits, tx_time, prevout, stored)
        }
        None => check_kernel(params, index, store, clock, tip, n_bits, tx_time, prevout),
    }
}

#[allow(clippy::too_many_arguments)]
fn check_kernel_stored<I, C>(
    params: &ChainParams,
    index: &I,
    clock: &C,
    tip: &BlockRecord,
    n_bits: u32,
    tx_time: u32,
    prevout: &OutPoint,
    stored: &StoredTransaction,
) -> ConsensusResult<Hash256>
where
    I: ChainIndex,
    C: NetworkClock,
{
    let block_from = index
        .block(&stored.block_hash)
        .ok_or(ConsensusError::BlockNotFound(stored.block_hash))?;

    let confirmations = tip.height as i64 + 1 - block_from.height as i64;
    if confirmations < params.coinbase_maturity as i64 {
        return Err(ConsensusError::ImmatureStake {
            required: params.coinbase_maturity,
            actual: confirmations.max(0) as u32,
        });
    }

    check_stake_kernel_hash(
        params,
        index,
        clock,
        tip,
        n_bits,
        block_from,
        stored.offset,
        &stored.tx,
        prevout,
        tx_time,
    )
}
