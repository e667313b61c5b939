//! Error types for consensus validation.

use cypher_chain::Hash256;
use thiserror::Error;

/// Consensus validation errors.
///
/// Errors fall into three classes. Consensus-fatal rejections carry a
/// denial-of-service score ([`dos_score`](ConsensusError::dos_score)):
/// 100 for unambiguously invalid data, 1 where an honest peer behind on
/// sync could produce the same failure. Lookup-pending outcomes
/// ([`is_pending`](ConsensusError::is_pending)) mean the chain has not
/// caught up yet and the caller should retry once it extends. The rest
/// are internal invariant breaches: the chain index handed out a
/// dangling reference, and the caller's transaction must abort.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConsensusError {
    /// The transaction is not a coinstake.
    #[error("Not a coinstake: {0}")]
    NotCoinStake(Hash256),

    /// The staked output's transaction is not in the store.
    #[error("Previous transaction not found: {0}")]
    TxPrevNotFound(Hash256),

    /// The block containing the staked output is not indexed.
    #[error("Block of previous transaction not found: {0}")]
    BlockNotFound(Hash256),

    /// The coinstake input does not reference the fetched transaction.
    #[error("Coinstake input does not match previous output {0}")]
    PrevoutMismatch(Hash256),

    /// Script signature verification failed on input 0.
    #[error("Signature verification failed on coinstake {0}")]
    SignatureFailed(Hash256),

    /// The staked output has fewer confirmations than required.
    #[error("Stake prevout is not mature: expected {required}, only matured to {actual}")]
    ImmatureStake { required: u32, actual: u32 },

    /// Coinstake timestamp precedes the staked output's timestamp.
    #[error("Timestamp violation: tx time {tx_time} before prev tx time {prev_time}")]
    TimestampViolation { tx_time: u32, prev_time: u32 },

    /// The staked output is younger than the minimum stake age.
    #[error("Min age violation: block from {block_time}, tx time {tx_time}")]
    MinAgeViolation { block_time: u32, tx_time: u32 },

    /// The staked output has zero or negative value.
    #[error("Stake value must be positive, got {0}")]
    ZeroStakeValue(i64),

    /// The prevout index exceeds the previous transaction's outputs.
    #[error("Prevout index {n} out of range ({outputs} outputs)")]
    BadPrevoutIndex { n: u32, outputs: usize },

    /// The kernel hash exceeds the weighted target.
    #[error("Kernel hash does not meet stake target")]
    KernelNotMet,

    /// The stake modifier a selection interval past the staked output is
    /// not available yet; the node is still syncing.
    #[error("Stake modifier not yet available, chain still syncing")]
    StakeModifierPending,

    /// The chain tip is too far behind the staked output's required
    /// selection interval.
    #[error("Block chain is behind: best block at height {best_height} from block at height {from_height}")]
    BlockChainBehind { best_height: u32, from_height: u32 },

    /// The chain index referenced a hash it cannot resolve.
    #[error("Block index missing entry for {0}")]
    MissingBlockIndex(Hash256),

    /// A stake-modifier selection round found no eligible candidate.
    #[error("Unable to select stake modifier block at round {0}")]
    SelectionFailed(u32),

    /// A block's ancestry ended before the expected record was reached.
    #[error("Broken ancestry below block {0}")]
    BrokenAncestry(Hash256),
}

impl ConsensusError {
    /// Denial-of-service severity of a consensus-fatal rejection.
    ///
    /// 100 marks unambiguously invalid data; 1 marks failures an honest
    /// but desynchronized peer could produce. Pending and internal
    /// errors score 0.
    pub fn dos_score(&self) -> u32 {
        match self {
            ConsensusError::TxPrevNotFound(_)
            | ConsensusError::BlockNotFound(_)
            | ConsensusError::PrevoutMismatch(_)
            | ConsensusError::SignatureFailed(_)
            | ConsensusError::ImmatureStake { .. } => 100,
            ConsensusError::TimestampViolation { .. }
            | ConsensusError::MinAgeViolation { .. }
            | ConsensusError::ZeroStakeValue(_)
            | ConsensusError::BadPrevoutIndex { .. }
            | ConsensusError::KernelNotMet => 1,
            _ => 0,
        }
    }

    /// True for non-fatal outcomes the caller should retry after the
    /// chain extends.
    pub fn is_pending(&self) -> bool {
        matches!(self, ConsensusError::StakeModifierPending)
    }
}

/// Result type for consensus operations.
pub type ConsensusResult<T> = Result<T, ConsensusError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dos_scores_follow_error_class() {
        assert_eq!(ConsensusError::TxPrevNotFound(Hash256::ZERO).dos_score(), 100);
        assert_eq!(ConsensusError::KernelNotMet.dos_score(), 1);
        assert_eq!(ConsensusError::StakeModifierPending.dos_score(), 0);
        assert_eq!(ConsensusError::MissingBlockIndex(Hash256::ZERO).dos_score(), 0);
    }

    #[test]
    fn pending_is_distinct_from_fatal() {
        assert!(ConsensusError::StakeModifierPending.is_pending());
        assert!(!ConsensusError::KernelNotMet.is_pending());
        assert!(!ConsensusError::MissingBlockIndex(Hash256::ZERO).is_pending());
    }
}
