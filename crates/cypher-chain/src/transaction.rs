//! Transaction primitives and their canonical wire encoding.
//!
//! The txid is the double-SHA-256 of the little-endian wire form
//! (version, timestamp, inputs, outputs, lock time). Scripts are opaque
//! byte strings here; interpreting them belongs to the script engine.

use crate::hash::{double_sha256, Hash256};
use serde::{Deserialize, Serialize};

/// Reference to a specific output of a previous transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutPoint {
    /// Transaction id of the referenced transaction.
    pub txid: Hash256,
    /// Output index within that transaction.
    pub n: u32,
}

impl OutPoint {
    /// Index value marking a null outpoint (coinbase input).
    pub const NULL_INDEX: u32 = u32::MAX;

    /// Create an outpoint.
    pub fn new(txid: Hash256, n: u32) -> Self {
        Self { txid, n }
    }

    /// The null outpoint used by coinbase inputs.
    pub fn null() -> Self {
        Self {
            txid: Hash256::ZERO,
            n: Self::NULL_INDEX,
        }
    }

    /// True for the coinbase sentinel.
    pub fn is_null(&self) -> bool {
        self.txid.is_zero() && self.n == Self::NULL_INDEX
    }
}

/// Transaction input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxInput {
    /// The output being spent.
    pub prevout: OutPoint,
    /// Unlocking script.
    pub script_sig: Vec<u8>,
    /// Sequence number.
    pub sequence: u32,
}

impl TxInput {
    /// Input spending `prevout` with the given unlocking script.
    pub fn new(prevout: OutPoint, script_sig: Vec<u8>) -> Self {
        Self {
            prevout,
            script_sig,
            sequence: u32::MAX,
        }
    }
}

/// Transaction output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOutput {
    /// Value in satoshi.
    pub value: i64,
    /// Locking script.
    pub script_pub_key: Vec<u8>,
}

impl TxOutput {
    /// Output paying `value` to `script_pub_key`.
    pub fn new(value: i64, script_pub_key: Vec<u8>) -> Self {
        Self {
            value,
            script_pub_key,
        }
    }

    /// The empty marker output that opens a coinstake.
    pub fn empty() -> Self {
        Self {
            value: 0,
            script_pub_key: Vec::new(),
        }
    }

    /// True for the coinstake marker output.
    pub fn is_empty(&self) -> bool {
        self.value == 0 && self.script_pub_key.is_empty()
    }
}

/// A timestamped transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Transaction format version.
    pub version: i32,
    /// Transaction timestamp (Unix seconds, wire-width 32 bits).
    pub time: u32,
    /// Inputs.
    pub inputs: Vec<TxInput>,
    /// Outputs.
    pub outputs: Vec<TxOutput>,
    /// Lock time.
    pub lock_time: u32,
}

impl Transaction {
    /// Current transaction version.
    pub const CURRENT_VERSION: i32 = 1;

    /// A transaction with no inputs or outputs at the given timestamp.
    pub fn new(time: u32) -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            time,
            inputs: Vec::new(),
            outputs: Vec::new(),
            lock_time: 0,
        }
    }

    /// True if this is a coinbase: exactly one input and it is null.
    pub fn is_coin_base(&self) -> bool {
        self.inputs.len() == 1 && self.inputs[0].prevout.is_null()
    }

    /// True if this is a coinstake: a real first input plus the empty
    /// marker output in front of the reward outputs.
    pub fn is_coin_stake(&self) -> bool {
        !self.inputs.is_empty()
            && !self.inputs[0].prevout.is_null()
            && self.outputs.len() >= 2
            && self.outputs[0].is_empty()
    }

    /// Canonical wire encoding.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(64);
        buf.extend_from_slice(&self.version.to_le_bytes());
        buf.extend_from_slice(&self.time.to_le_bytes());
        write_compact_size(&mut buf, self.inputs.len() as u64);
        for input in &self.inputs {
            buf.extend_from_slice(input.prevout.txid.as_bytes());
            buf.extend_from_slice(&input.prevout.n.to_le_bytes());
            write_compact_size(&mut buf, input.script_sig.len() as u64);
            buf.extend_from_slice(&input.script_sig);
            buf.extend_from_slice(&input.sequence.to_le_bytes());
        }
        write_compact_size(&mut buf, self.outputs.len() as u64);
        for output in &self.outputs {
            buf.extend_from_slice(&output.value.to_le_bytes());
            write_compact_size(&mut buf, output.script_pub_key.len() as u64);
            buf.extend_from_slice(&output.script_pub_key);
        }
        buf.extend_from_slice(&self.lock_time.to_le_bytes());
        buf
    }

    /// Transaction id: double-SHA-256 of the wire encoding.
    pub fn txid(&self) -> Hash256 {
        double_sha256(&self.encode())
    }
}

/// Append a Satoshi compact-size length prefix.
fn write_compact_size(buf: &mut Vec<u8>, n: u64) {
    if n < 0xfd {
        buf.push(n as u8);
    } else if n <= 0xffff {
        buf.push(0xfd);
        buf.extend_from_slice(&(n as u16).to_le_bytes());
    } else if n <= 0xffff_ffff {
        buf.push(0xfe);
        buf.extend_from_slice(&(n as u32).to_le_bytes());
    } else {
        buf.push(0xff);
        buf.extend_from_slice(&n.to_le_bytes());
    }
}
