//! # cypher-chain
//!
//! Chain data model for the Cypher Rust Node.
//!
//! This crate provides:
//! - The 256-bit hash type with little-endian integer ordering and the
//!   double-SHA-256 stream hasher every consensus hash is built from
//! - Transaction primitives with their canonical wire encoding and txid
//! - Block index records ([`BlockRecord`])
//! - The read-only capability traits the consensus core consumes
//!   ([`ChainIndex`], [`TransactionStore`], [`ScriptVerifier`],
//!   [`NetworkClock`]) together with in-memory implementations

mod block;
mod error;
mod hash;
mod index;
mod transaction;

pub use block::BlockRecord;
pub use error::ChainError;
pub use hash::{double_sha256, DoubleSha256, Hash256};
pub use index::{
    ChainIndex, ChainView, MemoryTxStore, NetworkClock, ScriptVerifier, StoredTransaction,
    TransactionStore,
};
pub use transaction::{OutPoint, Transaction, TxInput, TxOutput};
