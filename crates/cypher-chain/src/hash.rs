//! 256-bit hashes and the double-SHA-256 stream hasher.
//!
//! Hashes are stored in internal (little-endian) byte order and compare as
//! 256-bit little-endian integers, which is the ordering the kernel and
//! stake-modifier code relies on. Display reverses the bytes (RPC order).

use crate::error::ChainError;
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::cmp::Ordering;
use std::fmt;
use std::ops::Shr;

/// A 256-bit hash in internal (little-endian) byte order.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Hash256([u8; 32]);

impl Hash256 {
    /// The all-zero hash.
    pub const ZERO: Hash256 = Hash256([0u8; 32]);

    /// Wrap raw little-endian bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Hash256(bytes)
    }

    /// A hash whose low 64 bits are `v` and whose upper bits are zero.
    pub fn from_low_u64(v: u64) -> Self {
        let mut bytes = [0u8; 32];
        bytes[..8].copy_from_slice(&v.to_le_bytes());
        Hash256(bytes)
    }

    /// Raw little-endian bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// True if every byte is zero.
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&b| b == 0)
    }

    /// Least-significant bit of the 256-bit little-endian integer.
    ///
    /// This is the entropy bit a block contributes to the stake modifier.
    pub fn low_bit(&self) -> u64 {
        (self.0[0] & 1) as u64
    }

    /// The hash as an arbitrary-precision unsigned integer.
    pub fn to_biguint(&self) -> BigUint {
        BigUint::from_bytes_le(&self.0)
    }

    /// Parse from display (byte-reversed) hex.
    pub fn from_hex(s: &str) -> Result<Self, ChainError> {
        let raw = hex::decode(s).map_err(|_| ChainError::InvalidHex(s.to_string()))?;
        if raw.len() != 32 {
            return Err(ChainError::InvalidLength {
                expected: 32,
                actual: raw.len(),
            });
        }
        let mut bytes = [0u8; 32];
        for (i, b) in raw.iter().rev().enumerate() {
            bytes[i] = *b;
        }
        Ok(Hash256(bytes))
    }

    /// Display (byte-reversed) hex string.
    pub fn to_hex(&self) -> String {
        let mut reversed = self.0;
        reversed.reverse();
        hex::encode(reversed)
    }
}

impl Ord for Hash256 {
    fn cmp(&self, other: &Self) -> Ordering {
        // Most significant byte last in little-endian order.
        for i in (0..32).rev() {
            match self.0[i].cmp(&other.0[i]) {
                Ordering::Equal => continue,
                ord => return ord,
            }
        }
        Ordering::Equal
    }
}

impl PartialOrd for Hash256 {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Shr<u32> for Hash256 {
    type Output = Hash256;

    fn shr(self, shift: u32) -> Hash256 {
        if shift >= 256 {
            return Hash256::ZERO;
        }
        let byte_shift = (shift / 8) as usize;
        let bit_shift = shift % 8;
        let mut out = [0u8; 32];
        for i in 0..32 - byte_shift {
            let mut v = self.0[i + byte_shift] >> bit_shift;
            if bit_shift > 0 && i + byte_shift + 1 < 32 {
                v |= self.0[i + byte_shift + 1] << (8 - bit_shift);
            }
            out[i] = v;
        }
        Hash256(out)
    }
}

impl fmt::Display for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash256({})", self.to_hex())
    }
}

/// Incremental double-SHA-256 writer.
///
/// Integers are appended little-endian and hashes in internal byte order,
/// matching the wire form of every consensus hash stream.
#[derive(Clone)]
pub struct DoubleSha256 {
    inner: Sha256,
}

impl DoubleSha256 {
    /// Start an empty stream.
    pub fn new() -> Self {
        Self {
            inner: Sha256::new(),
        }
    }

    /// Append raw bytes.
    pub fn write(&mut self, bytes: &[u8]) {
        self.inner.update(bytes);
    }

    /// Append a `u32` little-endian.
    pub fn write_u32_le(&mut self, v: u32) {
        self.inner.update(v.to_le_bytes());
    }

    /// Append a `u64` little-endian.
    pub fn write_u64_le(&mut self, v: u64) {
        self.inner.update(v.to_le_bytes());
    }

    /// Append a hash in internal byte order.
    pub fn write_hash(&mut self, h: &Hash256) {
        self.inner.update(h.as_bytes());
    }

    /// SHA-256 of the SHA-256 of everything written.
    pub fn finalize(self) -> Hash256 {
        let first = self.inner.finalize();
        let second = Sha256::digest(first);
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&second);
        Hash256(bytes)
    }
}

impl Default for DoubleSha256 {
    fn default() -> Self {
        Self::new()
    }
}

/// Double-SHA-256 of a byte slice.
pub fn double_sha256(data: &[u8]) -> Hash256 {
    let mut hasher = DoubleSha256::new();
    hasher.write(data);
    hasher.finalize()
}
