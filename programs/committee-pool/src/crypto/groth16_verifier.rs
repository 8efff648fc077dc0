//! Groth16 Proof Verifier
//!
//! Groth16 zkSNARK verification over BN254 using the alt_bn128 operations.
//! Membership, transfer and balance proofs all go through the same engine;
//! they differ only in the verifying key and the public-input layout.
//!
//! # Verification Equation
//!
//! ```text
//! e(-A, B) · e(α, β) · e(vk_x, γ) · e(C, δ) = 1
//! ```
//!
//! Where `vk_x = IC[0] + Σ(public_input[i] × IC[i+1])`
//!
//! # Security Considerations
//!
//! - Verification is fail-closed: any error results in rejection
//! - Proof G1 points are validated before use
//! - Invalid proofs never return `Ok(true)`
//! - Scalars must be canonical (< Fr modulus)

use anchor_lang::prelude::*;

use crate::crypto::alt_bn128_syscalls::{
    g1_add, g1_mul, g1_negate, make_pairing_element, validate_g1_point, validate_g2_encoding,
    verify_pairing_4, G1Point, G2Point,
};
use crate::crypto::field::{is_valid_fr, Scalar};
use crate::error::PoolError;
use crate::state::VerifyingKey;

// ============================================================================
// CONSTANTS
// ============================================================================

/// Groth16 proof size in bytes (A: 64 + B: 128 + C: 64 = 256)
pub const PROOF_DATA_LEN: usize = 256;

// ============================================================================
// PROOF SYSTEM SEAM
// ============================================================================

/// Pluggable proof verification engine.
///
/// Returns `Ok(false)` for a well-formed proof that does not verify and
/// `Err` for malformed input; callers treat both as rejection.
pub trait ProofSystem {
    fn verify(&self, vk: &VerifyingKey, proof: &[u8], public_inputs: &[Scalar]) -> Result<bool>;
}

/// Groth16 over BN254, the production proof system.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Groth16;

impl ProofSystem for Groth16 {
    fn verify(&self, vk: &VerifyingKey, proof: &[u8], public_inputs: &[Scalar]) -> Result<bool> {
        verify_proof_bytes(vk, proof, public_inputs)
    }
}

// ============================================================================
// PROOF STRUCTURE
// ============================================================================

/// Groth16 proof: A (G1) || B (G2) || C (G1)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Groth16Proof {
    pub a: G1Point,
    pub b: G2Point,
    pub c: G1Point,
}

impl Groth16Proof {
    /// Total size of serialized proof
    pub const SIZE: usize = PROOF_DATA_LEN;

    /// Deserialize proof from raw bytes (exactly 256 bytes).
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() != Self::SIZE {
            msg!(
                "Invalid proof size: expected {}, got {}",
                Self::SIZE,
                data.len()
            );
            return Err(error!(PoolError::InvalidProofFormat));
        }

        let mut a = [0u8; 64];
        let mut b = [0u8; 128];
        let mut c = [0u8; 64];

        a.copy_from_slice(&data[0..64]);
        b.copy_from_slice(&data[64..192]);
        c.copy_from_slice(&data[192..256]);

        Ok(Self { a, b, c })
    }

    /// Serialize proof to bytes.
    pub fn to_bytes(&self) -> [u8; PROOF_DATA_LEN] {
        let mut bytes = [0u8; PROOF_DATA_LEN];
        bytes[0..64].copy_from_slice(&self.a);
        bytes[64..192].copy_from_slice(&self.b);
        bytes[192..256].copy_from_slice(&self.c);
        bytes
    }

    /// Validate that A and C are curve points and B is canonically encoded.
    /// G2 curve membership is enforced by the pairing.
    pub fn validate(&self) -> Result<()> {
        validate_g1_point(&self.a).map_err(|_| {
            msg!("Proof point A is not on curve");
            error!(PoolError::InvalidProofFormat)
        })?;

        validate_g2_encoding(&self.b).map_err(|_| {
            msg!("Proof point B has non-canonical coordinates");
            error!(PoolError::InvalidProofFormat)
        })?;

        validate_g1_point(&self.c).map_err(|_| {
            msg!("Proof point C is not on curve");
            error!(PoolError::InvalidProofFormat)
        })?;

        Ok(())
    }
}

// ============================================================================
// VERIFICATION FUNCTIONS
// ============================================================================

/// Compute the public input accumulator `IC[0] + Σ(input[i] × IC[i+1])`.
pub fn compute_vk_x(ic: &[G1Point], public_inputs: &[Scalar]) -> Result<G1Point> {
    require!(
        ic.len() == public_inputs.len() + 1,
        PoolError::InvalidVerifyingKey
    );

    let mut acc = ic[0];
    for (input, point) in public_inputs.iter().zip(ic[1..].iter()) {
        let term = g1_mul(point, input)?;
        acc = g1_add(&acc, &term)?;
    }
    Ok(acc)
}

/// Verify a Groth16 proof against a verifying key and public inputs.
///
/// * `Ok(true)` - proof is valid
/// * `Ok(false)` - pairing check failed
/// * `Err(...)` - malformed proof, key or inputs
pub fn verify_groth16_proof(
    vk: &VerifyingKey,
    proof: &Groth16Proof,
    public_inputs: &[Scalar],
) -> Result<bool> {
    // Step 1: Validate proof points
    proof.validate()?;

    // Step 2: Check public input count and canonicity
    let expected_inputs = vk.ic.len().saturating_sub(1);
    if vk.ic.is_empty() || public_inputs.len() != expected_inputs {
        msg!(
            "Public inputs count mismatch: expected {}, got {}",
            expected_inputs,
            public_inputs.len()
        );
        return Err(error!(PoolError::InvalidPublicData));
    }

    for (i, input) in public_inputs.iter().enumerate() {
        if !is_valid_fr(input) {
            msg!("Public input {} is not a valid scalar (>= Fr modulus)", i);
            return Err(error!(PoolError::InvalidScalar));
        }
    }

    // Step 3: vk_x
    let vk_x = compute_vk_x(&vk.ic, public_inputs)?;

    // Step 4: e(-A, B) · e(α, β) · e(vk_x, γ) · e(C, δ) = 1
    let neg_a = g1_negate(&proof.a)?;

    let pairing_elements = [
        make_pairing_element(&neg_a, &proof.b),
        make_pairing_element(&vk.alpha_g1, &vk.beta_g2),
        make_pairing_element(&vk_x, &vk.gamma_g2),
        make_pairing_element(&proof.c, &vk.delta_g2),
    ];

    let is_valid = verify_pairing_4(&pairing_elements)?;

    if !is_valid {
        msg!("Proof verification failed: pairing check returned false");
    }

    Ok(is_valid)
}

/// Parse the proof bytes and delegate to [`verify_groth16_proof`].
pub fn verify_proof_bytes(
    vk: &VerifyingKey,
    proof_bytes: &[u8],
    public_inputs: &[Scalar],
) -> Result<bool> {
    let proof = Groth16Proof::from_bytes(proof_bytes)?;
    verify_groth16_proof(vk, &proof, public_inputs)
}

// ============================================================================
// TESTS
// ============================================================================
