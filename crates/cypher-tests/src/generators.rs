//! Test data generators.
//!
//! Deterministic builders for hashes, transactions, and outpoints so
//! every test chain is reproducible run to run.

use cypher_chain::{double_sha256, Hash256, OutPoint, Transaction, TxInput, TxOutput};

/// A deterministic 32-byte id derived from a seed.
pub fn test_hash(seed: u64) -> Hash256 {
    let mut data = *b"cypher-test-hash................";
    data[16..24].copy_from_slice(&seed.to_le_bytes());
    double_sha256(&data)
}

/// A funding transaction paying `value` to a trivial script.
pub fn funding_tx(time: u32, value: i64) -> Transaction {
    let mut tx = Transaction::new(time);
    tx.inputs.push(TxInput::new(OutPoint::null(), vec![0x00]));
    tx.outputs.push(TxOutput::new(value, vec![0x51]));
    tx
}

/// A coinstake spending `prevout`: empty marker output first, then the
/// stake plus reward.
pub fn coinstake_tx(time: u32, prevout: OutPoint, reward_value: i64) -> Transaction {
    let mut tx = Transaction::new(time);
    tx.inputs.push(TxInput::new(prevout, vec![0x51]));
    tx.outputs.push(TxOutput::empty());
    tx.outputs.push(TxOutput::new(reward_value, vec![0x51]));
    tx
}
