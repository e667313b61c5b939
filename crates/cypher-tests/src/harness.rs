//! Test harness for integration tests.
//!
//! Builds synthetic chains through the real stake-modifier code so every
//! block record carries the modifier fields a connected node would have
//! stored for it.

use crate::generators::test_hash;
use cypher_chain::{
    BlockRecord, ChainIndex, ChainView, Hash256, MemoryTxStore, NetworkClock, ScriptVerifier,
    Transaction,
};
use cypher_consensus::{
    compute_next_stake_modifier, compute_stake_modifier_v2, ChainParams, ChainParamsConfig,
};

/// A clock pinned to a fixed adjusted time.
pub struct FixedClock(pub i64);

impl NetworkClock for FixedClock {
    fn adjusted_time(&self) -> i64 {
        self.0
    }
}

/// Script engine stand-in that accepts every signature.
pub struct AcceptAllScripts;

impl ScriptVerifier for AcceptAllScripts {
    fn verify_script(&self, _: &[u8], _: &[u8], _: &Transaction, _: usize) -> bool {
        true
    }
}

/// Script engine stand-in that rejects every signature.
pub struct RejectAllScripts;

impl ScriptVerifier for RejectAllScripts {
    fn verify_script(&self, _: &[u8], _: &[u8], _: &Transaction, _: usize) -> bool {
        false
    }
}

/// Compressed parameters for fast synthetic chains, protocol v3 active
/// from genesis.
pub fn test_params() -> ChainParams {
    ChainParams::from_config(&ChainParamsConfig {
        stake_min_age: Some(3_200),
        stake_max_age: Some(90 * 24 * 60 * 60),
        modifier_interval: Some(2_048),
        target_spacing: Some(64),
        stake_timestamp_mask: Some(0x0f),
        coinbase_maturity: Some(10),
        protocol_v3_time: Some(0),
        protocol_v3_height: Some(0),
    })
    .expect("valid test params")
}

/// Same chain geometry with protocol v3 never activating, for the v1
/// kernel and modifier-lookup paths.
pub fn legacy_params() -> ChainParams {
    ChainParams {
        protocol_v3_time: i64::MAX,
        protocol_v3_height: u32::MAX,
        ..test_params()
    }
}

/// A synthetic chain plus its transaction store.
pub struct ChainHarness {
    /// Consensus parameters driving the harness chain.
    pub params: ChainParams,
    /// The block index arena.
    pub chain: ChainView,
    /// Confirmed transactions.
    pub store: MemoryTxStore,
}

impl ChainHarness {
    /// An empty harness.
    pub fn new(params: ChainParams) -> Self {
        Self {
            params,
            chain: ChainView::new(),
            store: MemoryTxStore::new(),
        }
    }

    /// The current tip.
    pub fn tip(&self) -> &BlockRecord {
        self.chain.tip().expect("harness chain has a tip")
    }

    /// Append a block, running the real modifier transition for it.
    ///
    /// `kernel` is the proof hash to record; PoW blocks default to their
    /// own hash.
    pub fn add_block(&mut self, time: u32, proof_of_stake: bool, kernel: Option<Hash256>) -> Hash256 {
        let prev = self.chain.tip().cloned();
        let (stake_modifier, generated_stake_modifier) =
            compute_next_stake_modifier(&self.params, &self.chain, prev.as_ref())
                .expect("stake modifier over harness chain");

        let height = prev.as_ref().map(|p| p.height + 1).unwrap_or(0);
        let hash = test_hash(((height as u64) << 32) | time as u64);
        let proof_hash = kernel.unwrap_or(hash);
        let stake_modifier_v2 = compute_stake_modifier_v2(prev.as_ref(), &proof_hash);

        self.chain.insert(BlockRecord {
            hash,
            height,
            time,
            prev: prev.map(|p| p.hash),
            proof_of_stake,
            proof_hash,
            stake_modifier,
            generated_stake_modifier,
            stake_modifier_v2,
        });
        hash
    }

    /// Append a proof-of-work block.
    pub fn add_pow_block(&mut self, time: u32) -> Hash256 {
        self.add_block(time, false, None)
    }

    /// Append a proof-of-stake block with the given kernel hash.
    pub fn add_pos_block(&mut self, time: u32, kernel: Hash256) -> Hash256 {
        self.add_block(time, true, Some(kernel))
    }

    /// Append `count` PoW blocks at the target spacing.
    pub fn extend_pow(&mut self, count: u32) {
        let spacing = self.params.target_spacing as u32;
        for _ in 0..count {
            let time = self.tip().time + spacing;
            self.add_pow_block(time);
        }
    }

    /// Record a confirmed transaction in `block_hash` at `offset`.
    pub fn confirm_transaction(&mut self, tx: Transaction, block_hash: Hash256, offset: u32) -> Hash256 {
        self.store.insert(tx, block_hash, offset)
    }

    /// Heights of the blocks that regenerated the v1 modifier.
    pub fn generator_heights(&self) -> Vec<u32> {
        let mut heights = Vec::new();
        let mut walk = self.chain.tip();
        while let Some(record) = walk {
            if record.generated_stake_modifier {
                heights.push(record.height);
            }
            walk = record.prev.as_ref().and_then(|h| self.chain.block(h));
        }
        heights.reverse();
        heights
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn harness_builds_a_linked_chain() {
        let mut harness = ChainHarness::new(test_params());
        harness.add_pow_block(1_433_600_000);
        harness.extend_pow(5);
        assert_eq!(harness.tip().height, 5);
        assert_eq!(harness.chain.len(), 6);
        assert_eq!(harness.generator_heights()[0], 0);
    }
}
