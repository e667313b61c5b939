//! Kernel hash tests against pinned vectors.

use crate::generators::{funding_tx, test_hash};
use crate::harness::FixedClock;
use cypher_chain::{BlockRecord, ChainView, DoubleSha256, Hash256, OutPoint};
use cypher_consensus::{
    check_stake_kernel_hash, check_stake_kernel_hash_v1, check_stake_kernel_hash_v2,
    selection_interval, ChainParams, ConsensusError, COIN,
};

/// Proof hash for the pinned v1 vector below, computed independently
/// from the 28-byte stream layout.
const V1_VECTOR_PROOF: &str = "48bd727db028b46e1e426b52bed44a9ca1d9453b6bb29ae2e63baecf6e9dcba7";

/// A permissive compact target (0xffff · 2^240): any coin-weighted
/// kernel passes, so the returned proof hash can be inspected.
const EASY_BITS: u32 = 0x2100_ffff;

struct V1Fixture {
    params: ChainParams,
    index: ChainView,
    tip: BlockRecord,
    block_from: BlockRecord,
}

/// Chain for the v1 vector: the staked output confirms in `block_from`,
/// and the first modifier generated a selection interval later carries
/// the fixed test modifier.
fn v1_fixture() -> V1Fixture {
    let params = ChainParams::mainnet();
    let interval = selection_interval(&params);

    let from_hash = test_hash(1);
    let block_from = BlockRecord {
        hash: from_hash,
        height: 1,
        time: 1_500_000_000,
        prev: None,
        proof_of_stake: false,
        proof_hash: from_hash,
        stake_modifier: 0x1111,
        generated_stake_modifier: true,
        stake_modifier_v2: Hash256::ZERO,
    };
    let tip_hash = test_hash(2);
    let tip = BlockRecord {
        hash: tip_hash,
        height: 2,
        time: (block_from.time() + interval) as u32,
        prev: Some(from_hash),
        proof_of_stake: false,
        proof_hash: tip_hash,
        stake_modifier: 0xDEAD_BEEF_DEAD_BEEF,
        generated_stake_modifier: true,
        stake_modifier_v2: Hash256::ZERO,
    };

    let mut index = ChainView::new();
    index.insert(block_from.clone());
    index.insert(tip.clone());
    V1Fixture {
        params,
        index,
        tip,
        block_from,
    }
}

#[test]
fn v1_kernel_matches_pinned_vector() {
    let fixture = v1_fixture();
    let clock = FixedClock(1_600_000_000);
    let tx_prev = funding_tx(1_500_000_000, 10 * COIN);
    let prevout = OutPoint::new(tx_prev.txid(), 0);

    // modifier 0xDEADBEEFDEADBEEF, block time 1_500_000_000, offset 81,
    // prev tx time 1_500_000_000, output 0, tx time 1_500_100_000.
    let proof = check_stake_kernel_hash_v1(
        &fixture.params,
        &fixture.index,
        &clock,
        &fixture.tip,
        EASY_BITS,
        &fixture.block_from,
        81,
        &tx_prev,
        &prevout,
        1_500_100_000,
    )
    .unwrap();
    assert_eq!(proof.to_hex(), V1_VECTOR_PROOF);

    // At 0x1d00ffff the coin-day weight (8 coin-days) leaves the target
    // eight orders of magnitude short of this hash.
    let err = check_stake_kernel_hash_v1(
        &fixture.params,
        &fixture.index,
        &clock,
        &fixture.tip,
        0x1d00_ffff,
        &fixture.block_from,
        81,
        &tx_prev,
        &prevout,
        1_500_100_000,
    )
    .unwrap_err();
    assert_eq!(err, ConsensusError::KernelNotMet);
    assert_eq!(err.dos_score(), 1);
}

#[test]
fn v1_kernel_enforces_minimum_age() {
    let fixture = v1_fixture();
    let clock = FixedClock(1_600_000_000);
    let tx_prev = funding_tx(1_500_000_000, 10 * COIN);
    let prevout = OutPoint::new(tx_prev.txid(), 0);

    // One second short of stake_min_age past the block timestamp.
    let too_soon = 1_500_000_000 + fixture.params.stake_min_age as u32 - 1;
    let err = check_stake_kernel_hash_v1(
        &fixture.params,
        &fixture.index,
        &clock,
        &fixture.tip,
        EASY_BITS,
        &fixture.block_from,
        81,
        &tx_prev,
        &prevout,
        too_soon,
    )
    .unwrap_err();
    assert!(matches!(err, ConsensusError::MinAgeViolation { .. }));
}

#[test]
fn v1_kernel_substitutes_block_time_for_missing_tx_time() {
    let fixture = v1_fixture();
    let clock = FixedClock(1_600_000_000);
    // PoW-era outputs carry no transaction timestamp.
    let tx_prev = funding_tx(0, 10 * COIN);
    let prevout = OutPoint::new(tx_prev.txid(), 0);

    let proof = check_stake_kernel_hash_v1(
        &fixture.params,
        &fixture.index,
        &clock,
        &fixture.tip,
        EASY_BITS,
        &fixture.block_from,
        81,
        &tx_prev,
        &prevout,
        1_500_100_000,
    )
    .unwrap();

    // The stream must commit to the block timestamp in the prev-time slot.
    let mut ss = DoubleSha256::new();
    ss.write_u64_le(0xDEAD_BEEF_DEAD_BEEF);
    ss.write_u32_le(1_500_000_000);
    ss.write_u32_le(81);
    ss.write_u32_le(1_500_000_000);
    ss.write_u32_le(0);
    ss.write_u32_le(1_500_100_000);
    assert_eq!(proof, ss.finalize());
}

#[test]
fn dispatch_follows_protocol_v3_height() {
    let fixture = v1_fixture();
    let clock = FixedClock(1_600_000_000);
    let tx_prev = funding_tx(1_500_000_000, 10 * COIN);
    let prevout = OutPoint::new(tx_prev.txid(), 0);
    let tx_time = 1_500_100_000;

    // Mainnet's v3 height is far above this tip: the dispatcher must
    // produce the v1 proof.
    let dispatched = check_stake_kernel_hash(
        &fixture.params,
        &fixture.index,
        &clock,
        &fixture.tip,
        EASY_BITS,
        &fixture.block_from,
        81,
        &tx_prev,
        &prevout,
        tx_time,
    )
    .unwrap();
    assert_eq!(dispatched.to_hex(), V1_VECTOR_PROOF);

    // With v3 active from genesis the same call is a v2 check.
    let v3_params = ChainParams {
        protocol_v3_height: 0,
        ..ChainParams::mainnet()
    };
    let dispatched = check_stake_kernel_hash(
        &v3_params,
        &fixture.index,
        &clock,
        &fixture.tip,
        EASY_BITS,
        &fixture.block_from,
        81,
        &tx_prev,
        &prevout,
        tx_time,
    )
    .unwrap();
    let direct =
        check_stake_kernel_hash_v2(&fixture.tip, EASY_BITS, &tx_prev, &prevout, tx_time).unwrap();
    assert_eq!(dispatched, direct);
    assert_ne!(dispatched.to_hex(), V1_VECTOR_PROOF);
}

#[test]
fn v2_kernel_commits_to_tip_modifier() {
    let fixture = v1_fixture();
    let tx_prev = funding_tx(1_500_000_000, 10 * COIN);
    let prevout = OutPoint::new(tx_prev.txid(), 0);
    let tx_time = 1_500_100_000;

    let base =
        check_stake_kernel_hash_v2(&fixture.tip, EASY_BITS, &tx_prev, &prevout, tx_time).unwrap();

    let mut other_tip = fixture.tip.clone();
    other_tip.stake_modifier_v2 = Hash256::from_low_u64(0x77);
    let moved =
        check_stake_kernel_hash_v2(&other_tip, EASY_BITS, &tx_prev, &prevout, tx_time).unwrap();
    assert_ne!(base, moved);
}
