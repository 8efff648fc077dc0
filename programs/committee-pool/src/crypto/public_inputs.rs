//! Public Inputs for the Committee Circuits
//!
//! Public input layouts for the three proof kinds:
//! - Membership: a committee member with a role signed a message
//! - Transfer: a committee-authorized join-split (also used for withdrawals)
//! - Balance: unspent notes of a token sum to at least a threshold
//!
//! # Field Element Encoding
//! All values are encoded as 32-byte big-endian field elements
//! in the BN254 scalar field.

use anchor_lang::prelude::*;

use crate::crypto::field::{u64_to_scalar, validate_fr, validate_fr_all, Scalar};

// ============================================================================
// MEMBERSHIP PUBLIC INPUTS
// ============================================================================

/// Public inputs for the membership circuit.
///
/// # Fields (3 inputs)
/// 1. committee_root - Root of the account's committee tree
/// 2. message - Message field element signed by the member
/// 3. role - Role bitmask the member must hold
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MembershipPublicInputs {
    pub committee_root: Scalar,
    pub message: Scalar,
    pub role: u64,
}

impl MembershipPublicInputs {
    /// Number of public inputs for membership verification
    pub const COUNT: usize = 3;

    pub fn new(committee_root: Scalar, message: Scalar, role: u64) -> Self {
        Self {
            committee_root,
            message,
            role,
        }
    }

    pub fn validate(&self) -> Result<()> {
        validate_fr(&self.committee_root)?;
        validate_fr(&self.message)
    }

    pub fn to_field_elements(&self) -> Vec<Scalar> {
        vec![self.committee_root, self.message, u64_to_scalar(self.role)]
    }
}

// ============================================================================
// TRANSFER PUBLIC INPUTS
// ============================================================================

/// Public inputs for the transfer circuit.
///
/// The circuit proves membership of every input note under `commitment_root`,
/// correct nullifier derivation, value conservation per token, and a quorum
/// of committee signatures under an account whose leaf is in `registry_root`.
///
/// # Fields (3 + inputs + outputs)
/// 1. commitment_root
/// 2. registry_root
/// 3. ext_data_hash - binds chain, pool, recipient and token data
/// 4. nullifiers...
/// 5. commitments...
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransferPublicInputs {
    pub commitment_root: Scalar,
    pub registry_root: Scalar,
    pub ext_data_hash: Scalar,
    pub nullifiers: Vec<Scalar>,
    pub commitments: Vec<Scalar>,
}

impl TransferPublicInputs {
    /// Inputs preceding the nullifier list
    pub const BASE_COUNT: usize = 3;

    pub fn count(&self) -> usize {
        Self::BASE_COUNT + self.nullifiers.len() + self.commitments.len()
    }

    pub fn validate(&self) -> Result<()> {
        validate_fr(&self.commitment_root)?;
        validate_fr(&self.registry_root)?;
        validate_fr(&self.ext_data_hash)?;
        validate_fr_all(&self.nullifiers)?;
        validate_fr_all(&self.commitments)
    }

    pub fn to_field_elements(&self) -> Vec<Scalar> {
        let mut inputs = Vec::with_capacity(self.count());
        inputs.push(self.commitment_root);
        inputs.push(self.registry_root);
        inputs.push(self.ext_data_hash);
        inputs.extend_from_slice(&self.nullifiers);
        inputs.extend_from_slice(&self.commitments);
        inputs
    }
}

// ============================================================================
// BALANCE PUBLIC INPUTS
// ============================================================================

/// Public inputs for the balance circuit.
///
/// # Fields (4 + inputs)
/// 1. commitment_root
/// 2. registry_root
/// 3. token - field encoding of the token address
/// 4. min_balance
/// 5. nullifiers...
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BalancePublicInputs {
    pub commitment_root: Scalar,
    pub registry_root: Scalar,
    pub token: Scalar,
    pub min_balance: u64,
    pub nullifiers: Vec<Scalar>,
}

impl BalancePublicInputs {
    pub const BASE_COUNT: usize = 4;

    pub fn count(&self) -> usize {
        Self::BASE_COUNT + self.nullifiers.len()
    }

    pub fn validate(&self) -> Result<()> {
        validate_fr(&self.commitment_root)?;
        validate_fr(&self.registry_root)?;
        validate_fr(&self.token)?;
        validate_fr_all(&self.nullifiers)
    }

    pub fn to_field_elements(&self) -> Vec<Scalar> {
        let mut inputs = Vec::with_capacity(self.count());
        inputs.push(self.commitment_root);
        inputs.push(self.registry_root);
        inputs.push(self.token);
        inputs.push(u64_to_scalar(self.min_balance));
        inputs.extend_from_slice(&self.nullifiers);
        inputs
    }
}
