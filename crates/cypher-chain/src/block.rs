//! Block index records.

use crate::hash::Hash256;
use serde::{Deserialize, Serialize};

/// One entry of the block index, as the consensus core sees it.
///
/// The index is append-only from this subsystem's point of view; the stake
/// modifier fields are filled in by the caller once a block is connected.
/// `stake_modifier` is meaningful only on records whose
/// `generated_stake_modifier` flag is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockRecord {
    /// Block hash.
    pub hash: Hash256,
    /// Height in the chain; genesis is 0.
    pub height: u32,
    /// Block timestamp (Unix seconds, wire-width 32 bits).
    pub time: u32,
    /// Hash of the preceding block, `None` for genesis.
    pub prev: Option<Hash256>,
    /// True for proof-of-stake blocks.
    pub proof_of_stake: bool,
    /// Kernel hash for a PoS block, the block hash itself for PoW.
    pub proof_hash: Hash256,
    /// Stake modifier active from this block on (v1).
    pub stake_modifier: u64,
    /// True iff the v1 modifier was recomputed at this block.
    pub generated_stake_modifier: bool,
    /// Stake modifier v2.
    pub stake_modifier_v2: Hash256,
}

impl BlockRecord {
    /// Block time widened to the signed arithmetic the consensus code uses.
    pub fn time(&self) -> i64 {
        self.time as i64
    }

    /// The bit this block contributes to a future stake modifier: the
    /// least-significant bit of its own hash.
    pub fn entropy_bit(&self) -> u64 {
        self.hash.low_bit()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entropy_bit_follows_hash() {
        let mut bytes = [0u8; 32];
        bytes[0] = 0x05;
        let record = BlockRecord {
            hash: Hash256::from_bytes(bytes),
            height: 0,
            time: 0,
            prev: None,
            proof_of_stake: false,
            proof_hash: Hash256::ZERO,
            stake_modifier: 0,
            generated_stake_modifier: false,
            stake_modifier_v2: Hash256::ZERO,
        };
        assert_eq!(record.entropy_bit(), 1);
    }
}
