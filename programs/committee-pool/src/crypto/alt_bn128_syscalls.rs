//! alt_bn128 Wrappers for Groth16 Verification
//!
//! Thin wrappers around `solana_program::alt_bn128`. On a Solana target these
//! route to the `sol_alt_bn128_group_op` syscall; on a host they run the same
//! arithmetic natively, so verification results are identical everywhere.
//!
//! # Encoding
//! - G1: 64 bytes, x || y, big-endian Fp coordinates
//! - G2: 128 bytes, x_c1 || x_c0 || y_c1 || y_c0 (imaginary part first)
//! - The all-zero encoding is the point at infinity
//!
//! # Field vs Scalar Modulus
//! G1 coordinates live in Fp; multiplication scalars and public inputs in Fr.

use anchor_lang::prelude::*;
use solana_program::alt_bn128::prelude::{
    alt_bn128_addition, alt_bn128_multiplication, alt_bn128_pairing,
};

use crate::crypto::field::{be_subtract, is_valid_fp, is_valid_fr, Scalar, BN254_FP_MODULUS};
use crate::error::PoolError;

// ============================================================================
// TYPE DEFINITIONS
// ============================================================================

/// G1 point: 64 bytes (x: 32 bytes, y: 32 bytes), big-endian Fp coordinates
pub type G1Point = [u8; 64];

/// G2 point: 128 bytes (x: 2x32 bytes, y: 2x32 bytes), big-endian Fp2 coordinates
pub type G2Point = [u8; 128];

/// Pairing element: G1 point concatenated with G2 point (192 bytes)
pub type PairingElement = [u8; 192];

// ============================================================================
// CONSTANTS
// ============================================================================

/// G1 identity point (point at infinity)
pub const G1_IDENTITY: G1Point = [0u8; 64];

/// G2 identity point (point at infinity)
pub const G2_IDENTITY: G2Point = [0u8; 128];

/// G1 generator (1, 2)
pub const G1_GENERATOR: G1Point = {
    let mut g = [0u8; 64];
    g[31] = 1;
    g[63] = 2;
    g
};

const PAIRING_SUCCESS: [u8; 32] = {
    let mut r = [0u8; 32];
    r[31] = 1;
    r
};

// ============================================================================
// PUBLIC API
// ============================================================================

/// Check if a G1 point is the identity (point at infinity)
#[inline]
pub fn is_g1_identity(point: &G1Point) -> bool {
    point.iter().all(|&b| b == 0)
}

/// G1 point addition: result = a + b
pub fn g1_add(a: &G1Point, b: &G1Point) -> Result<G1Point> {
    if is_g1_identity(a) {
        return Ok(*b);
    }
    if is_g1_identity(b) {
        return Ok(*a);
    }

    let mut input = [0u8; 128];
    input[0..64].copy_from_slice(a);
    input[64..128].copy_from_slice(b);

    let out = alt_bn128_addition(&input).map_err(|e| {
        msg!("G1 addition failed: {:?}", e);
        error!(PoolError::CryptographyError)
    })?;
    to_g1(&out)
}

/// G1 scalar multiplication: result = scalar * point
///
/// The scalar must be a canonical Fr element.
pub fn g1_mul(point: &G1Point, scalar: &Scalar) -> Result<G1Point> {
    require!(is_valid_fr(scalar), PoolError::InvalidScalar);

    if is_g1_identity(point) || scalar.iter().all(|&b| b == 0) {
        return Ok(G1_IDENTITY);
    }

    let mut input = [0u8; 96];
    input[0..64].copy_from_slice(point);
    input[64..96].copy_from_slice(scalar);

    let out = alt_bn128_multiplication(&input).map_err(|e| {
        msg!("G1 scalar multiplication failed: {:?}", e);
        error!(PoolError::CryptographyError)
    })?;
    to_g1(&out)
}

/// Negate a G1 point: result = (x, p - y)
///
/// Uses the Fp modulus because G1 coordinates are in the base field.
pub fn g1_negate(point: &G1Point) -> Result<G1Point> {
    if is_g1_identity(point) {
        return Ok(G1_IDENTITY);
    }

    let mut y = [0u8; 32];
    y.copy_from_slice(&point[32..64]);
    require!(is_valid_fp(&y), PoolError::CryptographyError);

    let mut result = *point;
    result[32..64].copy_from_slice(&be_subtract(&BN254_FP_MODULUS, &y));
    Ok(result)
}

/// Verify a 4-element pairing (Groth16 standard).
///
/// Checks: e(a1, b1) * e(a2, b2) * e(a3, b3) * e(a4, b4) == 1
///
/// * `Ok(true)` - pairing equation holds
/// * `Ok(false)` - pairing equation does not hold
/// * `Err` - a point failed to decode (not on the curve / subgroup)
pub fn verify_pairing_4(elements: &[PairingElement; 4]) -> Result<bool> {
    let mut input = [0u8; 768];
    for (i, elem) in elements.iter().enumerate() {
        input[i * 192..(i + 1) * 192].copy_from_slice(elem);
    }

    let out = alt_bn128_pairing(&input).map_err(|e| {
        msg!("Pairing check failed: {:?}", e);
        error!(PoolError::CryptographyError)
    })?;

    Ok(out.as_slice() == PAIRING_SUCCESS)
}

/// Create a pairing element from G1 and G2 points.
#[inline]
pub fn make_pairing_element(g1: &G1Point, g2: &G2Point) -> PairingElement {
    let mut element = [0u8; 192];
    element[0..64].copy_from_slice(g1);
    element[64..192].copy_from_slice(g2);
    element
}

/// Validate that a G1 point has canonical coordinates and lies on the curve.
pub fn validate_g1_point(point: &G1Point) -> Result<()> {
    if is_g1_identity(point) {
        return Ok(());
    }

    let mut x = [0u8; 32];
    let mut y = [0u8; 32];
    x.copy_from_slice(&point[0..32]);
    y.copy_from_slice(&point[32..64]);
    require!(is_valid_fp(&x) && is_valid_fp(&y), PoolError::CryptographyError);

    // Adding the identity forces a decode, which rejects off-curve points
    let mut input = [0u8; 128];
    input[0..64].copy_from_slice(point);
    alt_bn128_addition(&input).map_err(|_| {
        msg!("Invalid G1 point");
        error!(PoolError::CryptographyError)
    })?;

    Ok(())
}

/// Validate that every G2 coordinate is a canonical Fp element.
///
/// Curve membership of G2 points is enforced by the pairing itself.
pub fn validate_g2_encoding(point: &G2Point) -> Result<()> {
    for chunk in point.chunks_exact(32) {
        let mut c = [0u8; 32];
        c.copy_from_slice(chunk);
        require!(is_valid_fp(&c), PoolError::CryptographyError);
    }
    Ok(())
}

// ============================================================================
// INTERNAL HELPERS
// ============================================================================

fn to_g1(out: &[u8]) -> Result<G1Point> {
    if out.len() != 64 {
        msg!("Unexpected G1 output length: {}", out.len());
        return Err(error!(PoolError::CryptographyError));
    }
    let mut point = G1_IDENTITY;
    point.copy_from_slice(out);
    Ok(point)
}
