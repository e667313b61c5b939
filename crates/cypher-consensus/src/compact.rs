//! Compact (nBits) target encoding.
//!
//! The standard Satoshi packed representation: one byte of exponent
//! (byte length of the target) and a 3-byte mantissa, with bit 23 as a
//! sign bit. Negative or zero-mantissa encodings decode to the zero
//! target.

use num_bigint::BigUint;
use num_traits::Zero;

/// Decode a compact target to a 256-bit unsigned integer.
pub fn compact_to_target(n_bits: u32) -> BigUint {
    let size = (n_bits >> 24) as usize;
    let word = n_bits & 0x007f_ffff;

    // Sign bit: negative targets never validate anything.
    if word == 0 || (n_bits & 0x0080_0000) != 0 {
        return BigUint::zero();
    }

    if size <= 3 {
        BigUint::from(word >> (8 * (3 - size)))
    } else {
        BigUint::from(word) << (8 * (size - 3))
    }
}

/// Encode a target into compact form.
pub fn target_to_compact(target: &BigUint) -> u32 {
    if target.is_zero() {
        return 0;
    }

    let bytes = target.to_bytes_be();
    let mut size = bytes.len();
    let mut word: u32 = 0;
    for &b in bytes.iter().take(3) {
        word = (word << 8) | b as u32;
    }
    if size < 3 {
        word <<= 8 * (3 - size);
    }

    // A set mantissa MSB would read back as negative; shift it out.
    if word & 0x0080_0000 != 0 {
        word >>= 8;
        size += 1;
    }

    (size as u32) << 24 | word
}
