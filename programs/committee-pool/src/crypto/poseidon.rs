//! Poseidon Hash
//!
//! Circom-compatible Poseidon over BN254 (x^5 S-box) via
//! `solana_program::poseidon`. Every leaf and node hash in the ledger goes
//! through this module, so circuits, clients and the ledger agree on:
//!
//! - Merkle node: `H(left, right)`
//! - Member leaf: `H(public_key, roles)`
//! - Account-registry leaf: `H(committee_root, quorum)`
//! - Commitment: `H(receiver_hash, token, identifier, amount, salt)`
//! - Nullifier: `H(commitment, leaf_index, nullifying_key)`

use anchor_lang::prelude::*;
use solana_program::poseidon::{hashv, Endianness, Parameters};

use crate::crypto::field::{u64_to_scalar, Scalar};
use crate::error::PoolError;

/// Maximum arity supported by the BN254 x5 parameter set.
pub const MAX_POSEIDON_INPUTS: usize = 12;

/// Hash an arbitrary number (1..=12) of field elements.
///
/// Inputs must be canonical Fr elements; the hasher rejects anything else
/// with `CryptographyError` instead of reducing it.
pub fn poseidon_hash(inputs: &[Scalar]) -> Result<Scalar> {
    require!(
        !inputs.is_empty() && inputs.len() <= MAX_POSEIDON_INPUTS,
        PoolError::CryptographyError
    );

    let slices: Vec<&[u8]> = inputs.iter().map(|i| i.as_slice()).collect();
    let result = hashv(Parameters::Bn254X5, Endianness::BigEndian, &slices).map_err(|e| {
        msg!("Poseidon hash of {} inputs failed: {:?}", inputs.len(), e);
        error!(PoolError::CryptographyError)
    })?;

    Ok(result.to_bytes())
}

/// Hash two field elements. Used for Merkle tree internal nodes.
pub fn hash_two_to_one(left: &Scalar, right: &Scalar) -> Result<Scalar> {
    let result = hashv(
        Parameters::Bn254X5,
        Endianness::BigEndian,
        &[left.as_slice(), right.as_slice()],
    )
    .map_err(|e| {
        msg!("Poseidon hash_two_to_one failed: {:?}", e);
        error!(PoolError::CryptographyError)
    })?;

    Ok(result.to_bytes())
}

/// Leaf of a committee tree: one registered member and its role bitmask.
pub fn member_leaf_hash(public_key: &Scalar, roles: u64) -> Result<Scalar> {
    hash_two_to_one(public_key, &u64_to_scalar(roles))
}

/// Leaf of the global account registry.
pub fn registry_leaf_hash(committee_root: &Scalar, quorum: u64) -> Result<Scalar> {
    hash_two_to_one(committee_root, &u64_to_scalar(quorum))
}

/// Note commitment.
pub fn compute_commitment(
    receiver_hash: &Scalar,
    token_field: &Scalar,
    identifier: u64,
    amount: u64,
    salt: &Scalar,
) -> Result<Scalar> {
    poseidon_hash(&[
        *receiver_hash,
        *token_field,
        u64_to_scalar(identifier),
        u64_to_scalar(amount),
        *salt,
    ])
}

/// Nullifier for the note committed at `leaf_index`.
pub fn compute_nullifier(
    commitment: &Scalar,
    leaf_index: u64,
    nullifying_key: &Scalar,
) -> Result<Scalar> {
    poseidon_hash(&[*commitment, u64_to_scalar(leaf_index), *nullifying_key])
}
