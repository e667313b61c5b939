//! Read-only capability traits consumed by the consensus core, plus
//! in-memory implementations backing tools and tests.
//!
//! The core never touches process-wide state: every function takes the
//! chain index, transaction store, script engine, and clock it needs as a
//! parameter. This keeps the kernel computation a pure function of its
//! inputs and allows mock implementations in tests.

use crate::block::BlockRecord;
use crate::hash::Hash256;
use crate::transaction::Transaction;
use std::collections::HashMap;

/// Snapshot view of the block index.
///
/// Callers must hold the records referenced by the current tip alive for
/// the duration of a consensus call; the core only reads.
pub trait ChainIndex {
    /// Look up a block record by hash.
    fn block(&self, hash: &Hash256) -> Option<&BlockRecord>;

    /// The record preceding `record`, if any.
    fn ancestor(&self, record: &BlockRecord) -> Option<&BlockRecord> {
        record.prev.as_ref().and_then(|h| self.block(h))
    }
}

/// A transaction as returned by the store: the transaction itself plus
/// where it sits in the chain.
#[derive(Debug, Clone)]
pub struct StoredTransaction {
    /// The transaction.
    pub tx: Transaction,
    /// Hash of the block containing it.
    pub block_hash: Hash256,
    /// Byte offset of the transaction within its block's serialized body.
    pub offset: u32,
}

/// Lookup of confirmed transactions by id.
pub trait TransactionStore {
    /// Fetch a transaction and its chain position.
    fn transaction(&self, txid: &Hash256) -> Option<StoredTransaction>;
}

/// Script signature verification, provided by the script engine.
pub trait ScriptVerifier {
    /// Check `script_sig` against `script_pub_key` for input
    /// `input_index` of `tx_to`.
    fn verify_script(
        &self,
        script_sig: &[u8],
        script_pub_key: &[u8],
        tx_to: &Transaction,
        input_index: usize,
    ) -> bool;
}

/// Adjusted network time. Advisory only: it gates retry classification,
/// never the kernel arithmetic itself.
pub trait NetworkClock {
    /// Current adjusted time (Unix seconds).
    fn adjusted_time(&self) -> i64;
}

/// In-memory block index arena keyed by hash.
///
/// Back-pointers are plain hashes, so chains of any shape (including
/// forks) can be held without aliasing.
#[derive(Debug, Default)]
pub struct ChainView {
    blocks: HashMap<Hash256, BlockRecord>,
    tip: Option<Hash256>,
}

impl ChainView {
    /// An empty view.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record; the newest insert becomes the tip.
    pub fn insert(&mut self, record: BlockRecord) {
        self.tip = Some(record.hash);
        self.blocks.insert(record.hash, record);
    }

    /// Replace a record in place (e.g. to fill in modifier fields).
    pub fn update<F: FnOnce(&mut BlockRecord)>(&mut self, hash: &Hash256, f: F) -> bool {
        match self.blocks.get_mut(hash) {
            Some(record) => {
                f(record);
                true
            }
            None => false,
        }
    }

    /// The current tip record.
    pub fn tip(&self) -> Option<&BlockRecord> {
        self.tip.as_ref().and_then(|h| self.blocks.get(h))
    }

    /// Number of records held.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// True if no records are held.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

impl ChainIndex for ChainView {
    fn block(&self, hash: &Hash256) -> Option<&BlockRecord> {
        self.blocks.get(hash)
    }
}

/// In-memory transaction store keyed by txid.
#[derive(Debug, Default)]
pub struct MemoryTxStore {
    txs: HashMap<Hash256, StoredTransaction>,
}

impl MemoryTxStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a transaction at its chain position.
    pub fn insert(&mut self, tx: Transaction, block_hash: Hash256, offset: u32) -> Hash256 {
        let txid = tx.txid();
        self.txs.insert(
            txid,
            StoredTransaction {
                tx,
                block_hash,
                offset,
            },
        );
        txid
    }
}

impl TransactionStore for MemoryTxStore {
    fn transaction(&self, txid: &Hash256) -> Option<StoredTransaction> {
        self.txs.get(txid).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(seed: u8, prev: Option<Hash256>) -> BlockRecord {
        let mut bytes = [0u8; 32];
        bytes[0] = seed;
        BlockRecord {
            hash: Hash256::from_bytes(bytes),
            height: seed as u32,
            time: 1000 + seed as u32,
            prev,
            proof_of_stake: false,
            proof_hash: Hash256::from_bytes(bytes),
            stake_modifier: 0,
            generated_stake_modifier: false,
            stake_modifier_v2: Hash256::ZERO,
        }
    }

    #[test]
    fn ancestor_follows_prev_links() {
        let mut view = ChainView::new();
        let genesis = record(1, None);
        let child = record(2, Some(genesis.hash));
        view.insert(genesis.clone());
        view.insert(child.clone());

        let tip = view.tip().unwrap();
        assert_eq!(tip.hash, child.hash);
        let parent = view.ancestor(tip).unwrap();
        assert_eq!(parent.hash, genesis.hash);
        assert!(view.ancestor(parent).is_none());
    }

    #[test]
    fn update_rewrites_in_place() {
        let mut view = ChainView::new();
        let genesis = record(1, None);
        let hash = genesis.hash;
        view.insert(genesis);
        assert!(view.update(&hash, |r| r.stake_modifier = 7));
        assert_eq!(view.block(&hash).unwrap().stake_modifier, 7);
        assert!(!view.update(&Hash256::ZERO, |_| {}));
    }

    #[test]
    fn tx_store_returns_chain_position() {
        let mut store = MemoryTxStore::new();
        let tx = Transaction::new(42);
        let block_hash = Hash256::from_low_u64(9);
        let txid = store.insert(tx, block_hash, 81);
        let stored = store.transaction(&txid).unwrap();
        assert_eq!(stored.block_hash, block_hash);
        assert_eq!(stored.offset, 81);
        assert!(store.transaction(&Hash256::ZERO).is_none());
    }
}
