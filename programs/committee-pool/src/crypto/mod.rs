//! Cryptographic primitives for the committee pool
//!
//! - **Poseidon**: circom-compatible hash for leaves, commitments and nullifiers
//! - **Keccak**: domain-tagged digests (signed payloads, ext data, salts)
//! - **Alt BN128**: G1 arithmetic and the pairing check
//! - **Groth16**: the production [`ProofSystem`]
//! - **Ed25519**: signature checks for relayer-submitted calls
//! - **Encoding**: verifying-key and proof JSON from the trusted-setup tooling
//!
//! # Security Notes
//!
//! - All scalar inputs are validated to be < field modulus
//! - Invalid inputs are REJECTED, never silently reduced

pub mod alt_bn128_syscalls;
pub mod ed25519;
pub mod encoding;
pub mod field;
pub mod groth16_verifier;
pub mod keccak;
pub mod poseidon;
pub mod public_inputs;

// ============================================================================
// RE-EXPORTS
// ============================================================================

pub use alt_bn128_syscalls::{G1Point, G2Point, G1_GENERATOR, G1_IDENTITY, G2_IDENTITY};

pub use ed25519::verify_signature;

pub use encoding::{
    parse_balance_keys, parse_transfer_keys, parse_verifying_key, snarkjs_proof_to_bytes,
};

pub use field::{is_valid_fr, pubkey_to_scalar, u64_to_scalar, Scalar, BN254_FR_MODULUS};

pub use groth16_verifier::{
    verify_groth16_proof, verify_proof_bytes, Groth16, Groth16Proof, ProofSystem, PROOF_DATA_LEN,
};

pub use keccak::{derive_nullifying_key, keccak256, keccak256_concat, positional_salt, token_field};

pub use poseidon::{
    compute_commitment, compute_nullifier, hash_two_to_one, member_leaf_hash, poseidon_hash,
    registry_leaf_hash,
};

pub use public_inputs::{BalancePublicInputs, MembershipPublicInputs, TransferPublicInputs};
