//! Verifying Key storage and shape-keyed dispatch
//!
//! Each proof kind (membership, transfer, balance) owns one
//! [`VerifyingKeyDispatch`]: an explicit map from a structural *shape* to the
//! Groth16 key compiled for that shape. Circuits are compiled per shape
//! (number of input notes, output notes, authorizing signatures), so the
//! shape of a submitted proof selects the key it must verify against.
//!
//! # Security
//! - Keys must come from a properly executed trusted setup
//! - Only the configured authority may register or overwrite keys
//! - The stored keccak hash is re-checked before every verification

use std::collections::BTreeMap;
use std::fmt::Debug;

use anchor_lang::prelude::*;
use solana_program::keccak;

use crate::crypto::alt_bn128_syscalls::{G1Point, G2Point};
use crate::crypto::field::Scalar;
use crate::crypto::groth16_verifier::ProofSystem;
use crate::crypto::public_inputs::{BalancePublicInputs, MembershipPublicInputs, TransferPublicInputs};
use crate::error::PoolError;

/// Groth16 verifying key
///
/// # Point Encodings
/// - G1 points: 64 bytes (32 bytes x, 32 bytes y) - uncompressed
/// - G2 points: 128 bytes, imaginary part first
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct VerifyingKey {
    /// α ∈ G1
    pub alpha_g1: G1Point,
    /// β ∈ G2
    pub beta_g2: G2Point,
    /// γ ∈ G2 - used for public input accumulation
    pub gamma_g2: G2Point,
    /// δ ∈ G2
    pub delta_g2: G2Point,
    /// IC points ∈ G1, one more than the number of public inputs
    pub ic: Vec<G1Point>,
}

impl VerifyingKey {
    /// Number of public inputs this key accepts
    pub fn public_input_count(&self) -> usize {
        self.ic.len().saturating_sub(1)
    }

    /// Keccak hash of the key for integrity verification
    pub fn hash(&self) -> [u8; 32] {
        let mut data = Vec::with_capacity(448 + self.ic.len() * 64);
        data.extend_from_slice(&self.alpha_g1);
        data.extend_from_slice(&self.beta_g2);
        data.extend_from_slice(&self.gamma_g2);
        data.extend_from_slice(&self.delta_g2);
        for ic in &self.ic {
            data.extend_from_slice(ic);
        }

        keccak::hash(&data).to_bytes()
    }
}

/// A registered key together with the hash computed when it was set.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct VerifyingKeyRecord {
    pub vk: VerifyingKey,
    pub vk_hash: [u8; 32],
}

impl VerifyingKeyRecord {
    pub fn new(vk: VerifyingKey) -> Self {
        let vk_hash = vk.hash();
        Self { vk, vk_hash }
    }

    pub fn verify_integrity(&self) -> bool {
        self.vk.hash() == self.vk_hash
    }
}

// ============================================================================
// SHAPES
// ============================================================================

/// Structural key selecting a verifying key.
pub trait ShapeKey: Ord + Copy + Debug {
    /// Proof kind, used in logs and events
    const KIND: &'static str;

    /// Public inputs a proof of this shape carries
    fn public_input_count(&self) -> usize;

    /// Shape dimensions, used in logs and events
    fn dimensions(&self) -> Vec<u32>;
}

/// Membership proofs have a single fixed shape.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MembershipShape;

impl ShapeKey for MembershipShape {
    const KIND: &'static str = "membership";

    fn public_input_count(&self) -> usize {
        MembershipPublicInputs::COUNT
    }

    fn dimensions(&self) -> Vec<u32> {
        Vec::new()
    }
}

/// Transfer shape: (input notes, output notes, committee authorizers).
#[derive(
    AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
pub struct TransferShape {
    pub inputs: u32,
    pub outputs: u32,
    pub authorizers: u32,
}

impl TransferShape {
    pub fn new(inputs: u32, outputs: u32, authorizers: u32) -> Self {
        Self {
            inputs,
            outputs,
            authorizers,
        }
    }
}

impl ShapeKey for TransferShape {
    const KIND: &'static str = "transfer";

    fn public_input_count(&self) -> usize {
        TransferPublicInputs::BASE_COUNT + self.inputs as usize + self.outputs as usize
    }

    fn dimensions(&self) -> Vec<u32> {
        vec![self.inputs, self.outputs, self.authorizers]
    }
}

/// Balance shape: number of notes summed.
#[derive(
    AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
pub struct BalanceShape {
    pub inputs: u32,
}

impl BalanceShape {
    pub fn new(inputs: u32) -> Self {
        Self { inputs }
    }
}

impl ShapeKey for BalanceShape {
    const KIND: &'static str = "balance";

    fn public_input_count(&self) -> usize {
        BalancePublicInputs::BASE_COUNT + self.inputs as usize
    }

    fn dimensions(&self) -> Vec<u32> {
        vec![self.inputs]
    }
}

// ============================================================================
// DISPATCH
// ============================================================================

/// Shape-keyed verifying key table guarded by an administrative authority.
#[derive(Clone, Debug)]
pub struct VerifyingKeyDispatch<S: ShapeKey> {
    authority: Pubkey,
    keys: BTreeMap<S, VerifyingKeyRecord>,
}

impl<S: ShapeKey> VerifyingKeyDispatch<S> {
    pub fn new(authority: Pubkey) -> Self {
        Self {
            authority,
            keys: BTreeMap::new(),
        }
    }

    pub fn authority(&self) -> &Pubkey {
        &self.authority
    }

    pub fn get(&self, shape: &S) -> Option<&VerifyingKeyRecord> {
        self.keys.get(shape)
    }

    pub fn contains(&self, shape: &S) -> bool {
        self.keys.contains_key(shape)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn shapes(&self) -> impl Iterator<Item = &S> {
        self.keys.keys()
    }

    fn check_authority(&self, caller: &Pubkey) -> Result<()> {
        if caller != &self.authority {
            msg!("Caller {} is not the {} key authority", caller, S::KIND);
            return Err(error!(PoolError::Unauthorized));
        }
        Ok(())
    }

    fn check_key(shape: &S, vk: &VerifyingKey) -> Result<()> {
        let expected = shape.public_input_count() + 1;
        if vk.ic.len() != expected {
            msg!(
                "IC length mismatch for {} shape {:?}: expected {}, got {}",
                S::KIND,
                shape,
                expected,
                vk.ic.len()
            );
            return Err(error!(PoolError::InvalidVerifyingKey));
        }
        Ok(())
    }

    /// Register or overwrite the key for `shape`. Returns the stored key hash.
    pub fn set_verifying_key(
        &mut self,
        caller: &Pubkey,
        shape: S,
        vk: VerifyingKey,
    ) -> Result<[u8; 32]> {
        self.check_authority(caller)?;
        Self::check_key(&shape, &vk)?;

        let record = VerifyingKeyRecord::new(vk);
        let vk_hash = record.vk_hash;
        self.keys.insert(shape, record);
        Ok(vk_hash)
    }

    /// Register several keys at once. The whole batch is validated before
    /// any entry is written.
    pub fn set_verifying_keys(
        &mut self,
        caller: &Pubkey,
        shapes: &[S],
        vks: Vec<VerifyingKey>,
    ) -> Result<Vec<[u8; 32]>> {
        self.check_authority(caller)?;
        require!(shapes.len() == vks.len(), PoolError::InvalidVerifyingKey);
        for (shape, vk) in shapes.iter().zip(vks.iter()) {
            Self::check_key(shape, vk)?;
        }

        let mut hashes = Vec::with_capacity(vks.len());
        for (shape, vk) in shapes.iter().zip(vks) {
            let record = VerifyingKeyRecord::new(vk);
            hashes.push(record.vk_hash);
            self.keys.insert(*shape, record);
        }
        Ok(hashes)
    }

    /// Verify `proof` against the key registered for `shape`.
    pub fn verify_proof(
        &self,
        system: &dyn ProofSystem,
        shape: &S,
        proof: &[u8],
        public_inputs: &[Scalar],
    ) -> Result<bool> {
        let record = self.keys.get(shape).ok_or_else(|| {
            msg!("No {} verifying key for shape {:?}", S::KIND, shape);
            error!(PoolError::UnsupportedShape)
        })?;

        if !record.verify_integrity() {
            msg!("{} verifying key integrity check failed", S::KIND);
            return Err(error!(PoolError::InvalidVerifyingKey));
        }

        system.verify(&record.vk, proof, public_inputs)
    }
}
