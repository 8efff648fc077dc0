//! BN254 Field Element Validation and Encoding
//!
//! Strict canonical validation for scalar field (Fr) and base field (Fp)
//! elements plus the fixed encodings used to lift ledger values (amounts,
//! indices, public keys, hashes) into Fr.
//!
//! # Encoding
//! All field elements are 32 bytes, BIG-ENDIAN (most significant byte first).
//! Elements equal to or above the modulus are rejected, never reduced.

use crate::error::PoolError;
use anchor_lang::prelude::*;

/// Scalar field element: 32 bytes, big-endian Fr
pub type Scalar = [u8; 32];

/// BN254 base field modulus (Fp) - for point coordinates
/// p = 21888242871839275222246405745257275088696311157297823662689037894645226208583
pub const BN254_FP_MODULUS: [u8; 32] = [
    0x30, 0x64, 0x4e, 0x72, 0xe1, 0x31, 0xa0, 0x29,
    0xb8, 0x50, 0x45, 0xb6, 0x81, 0x81, 0x58, 0x5d,
    0x97, 0x81, 0x6a, 0x91, 0x68, 0x71, 0xca, 0x8d,
    0x3c, 0x20, 0x8c, 0x16, 0xd8, 0x7c, 0xfd, 0x47,
];

/// BN254 scalar field modulus (Fr) - for public inputs and Poseidon
/// r = 21888242871839275222246405745257275088548364400416034343698204186575808495617
pub const BN254_FR_MODULUS: [u8; 32] = [
    0x30, 0x64, 0x4e, 0x72, 0xe1, 0x31, 0xa0, 0x29,
    0xb8, 0x50, 0x45, 0xb6, 0x81, 0x81, 0x58, 0x5d,
    0x28, 0x33, 0xe8, 0x48, 0x79, 0xb9, 0x70, 0x91,
    0x43, 0xe1, 0xf5, 0x93, 0xf0, 0x00, 0x00, 0x01,
];

/// Returns true if value < modulus, comparing big-endian bytes.
#[inline]
fn is_less_than(value: &[u8; 32], modulus: &[u8; 32]) -> bool {
    for i in 0..32 {
        if value[i] < modulus[i] {
            return true;
        }
        if value[i] > modulus[i] {
            return false;
        }
    }
    false // equal to modulus is not canonical
}

/// Check if a 32-byte value is a canonical Fr element (< Fr modulus).
#[inline]
pub fn is_valid_fr(value: &[u8; 32]) -> bool {
    is_less_than(value, &BN254_FR_MODULUS)
}

/// Check if a 32-byte value is a canonical Fp element (< Fp modulus).
#[inline]
pub fn is_valid_fp(value: &[u8; 32]) -> bool {
    is_less_than(value, &BN254_FP_MODULUS)
}

/// Validate Fr element, returning `InvalidScalar` if non-canonical.
pub fn validate_fr(value: &[u8; 32]) -> Result<()> {
    if !is_valid_fr(value) {
        msg!("Non-canonical scalar: {}", hex::encode(value));
        return Err(error!(PoolError::InvalidScalar));
    }
    Ok(())
}

/// Validate every element of a slice of Fr elements.
pub fn validate_fr_all(values: &[Scalar]) -> Result<()> {
    values.iter().try_for_each(validate_fr)
}

/// Check if 32-byte value is all zeros.
#[inline]
pub fn is_zero(value: &[u8; 32]) -> bool {
    value.iter().all(|&b| b == 0)
}

/// Subtract two 32-byte big-endian numbers: result = a - b.
/// Caller must ensure a >= b.
pub fn be_subtract(a: &[u8; 32], b: &[u8; 32]) -> [u8; 32] {
    let mut result = [0u8; 32];
    let mut borrow: u16 = 0;

    for i in (0..32).rev() {
        let diff = (a[i] as u16).wrapping_sub(b[i] as u16).wrapping_sub(borrow);
        result[i] = diff as u8;
        borrow = if diff > 255 { 1 } else { 0 };
    }

    result
}

/// Convert u64 to a 32-byte big-endian scalar. Always canonical.
#[inline]
pub fn u64_to_scalar(value: u64) -> Scalar {
    let mut result = [0u8; 32];
    result[24..32].copy_from_slice(&value.to_be_bytes());
    result
}

/// Lift 32 arbitrary bytes into Fr by dropping the last byte and
/// right-aligning the remaining 31 (the top byte is always zero).
///
/// Used for public keys and keccak digests that must become public inputs.
#[inline]
pub fn truncate_to_scalar(bytes: &[u8; 32]) -> Scalar {
    let mut out = [0u8; 32];
    out[1..32].copy_from_slice(&bytes[0..31]);
    out
}

/// Field encoding of a public key.
#[inline]
pub fn pubkey_to_scalar(pubkey: &Pubkey) -> Scalar {
    truncate_to_scalar(&pubkey.to_bytes())
}
