//! Shielded pool state
//!
//! The pool keeps only what makes spend proofs meaningful:
//! - the commitment tree (append-only, one leaf per note)
//! - the spent-nullifier set
//! - the transfer and balance verifying keys
//!
//! Notes themselves, and their encryption, live off-ledger.

use anchor_lang::prelude::*;

use crate::crypto::field::Scalar;
use crate::crypto::keccak::positional_salt;
use crate::crypto::poseidon;
use crate::error::PoolError;
use crate::state::merkle_tree::{MerkleAccumulator, MerkleProof};
use crate::state::pool_config::PoolConfig;
use crate::state::spent_nullifier::NullifierSet;
use crate::state::verification_key::{BalanceShape, TransferShape, VerifyingKeyDispatch};
use crate::types::{DepositData, ExtData, TokenData, TransferType};

#[derive(Clone, Debug)]
pub struct ShieldedPool {
    config: PoolConfig,
    tree: MerkleAccumulator,
    nullifiers: NullifierSet,
    transfer_keys: VerifyingKeyDispatch<TransferShape>,
    balance_keys: VerifyingKeyDispatch<BalanceShape>,
    nullifying_key: Scalar,
}

impl ShieldedPool {
    pub fn new(config: PoolConfig) -> Result<Self> {
        config.validate()?;
        let tree = MerkleAccumulator::new(config.tree_depth, config.root_history_size)?;
        let nullifying_key = config.nullifying_key();

        msg!(
            "Shielded pool {} initialized on domain {}: depth {}, root history {}",
            config.pool_index,
            config.chain_domain,
            config.tree_depth,
            config.root_history_size
        );

        Ok(Self {
            transfer_keys: VerifyingKeyDispatch::new(config.authority),
            balance_keys: VerifyingKeyDispatch::new(config.authority),
            config,
            tree,
            nullifiers: NullifierSet::new(),
            nullifying_key,
        })
    }

    // ------------------------------------------------------------------
    // Read accessors
    // ------------------------------------------------------------------

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    pub fn tree(&self) -> &MerkleAccumulator {
        &self.tree
    }

    pub fn nullifiers(&self) -> &NullifierSet {
        &self.nullifiers
    }

    pub fn root(&self) -> Scalar {
        self.tree.current_root()
    }

    pub fn is_recent_root(&self, root: &Scalar) -> bool {
        self.tree.is_recent_root(root)
    }

    pub fn is_spent(&self, nullifier: &Scalar) -> bool {
        self.nullifiers.is_spent(nullifier)
    }

    pub fn merkle_proof(&self, index: u64) -> Result<MerkleProof> {
        self.tree.merkle_proof(index)
    }

    /// Pool-wide key every nullifier is derived with.
    pub fn nullifying_key(&self) -> Scalar {
        self.nullifying_key
    }

    pub fn transfer_keys(&self) -> &VerifyingKeyDispatch<TransferShape> {
        &self.transfer_keys
    }

    pub fn transfer_keys_mut(&mut self) -> &mut VerifyingKeyDispatch<TransferShape> {
        &mut self.transfer_keys
    }

    pub fn balance_keys(&self) -> &VerifyingKeyDispatch<BalanceShape> {
        &self.balance_keys
    }

    pub fn balance_keys_mut(&mut self) -> &mut VerifyingKeyDispatch<BalanceShape> {
        &mut self.balance_keys
    }

    // ------------------------------------------------------------------
    // Client helpers
    // ------------------------------------------------------------------

    pub fn compute_commitment(
        &self,
        receiver_hash: &Scalar,
        token_data: &TokenData,
        salt: &Scalar,
    ) -> Result<Scalar> {
        poseidon::compute_commitment(
            receiver_hash,
            &token_data.token_field(),
            token_data.identifier,
            token_data.amount,
            salt,
        )
    }

    pub fn compute_nullifier(&self, commitment: &Scalar, leaf_index: u64) -> Result<Scalar> {
        poseidon::compute_nullifier(commitment, leaf_index, &self.nullifying_key)
    }

    /// Digest a deposit must be signed over by its sender.
    pub fn deposit_digest(&self, data: &DepositData) -> Result<[u8; 32]> {
        data.digest(self.config.chain_domain, self.config.pool_index)
    }

    /// Commitment the deposit entry at `position` will be inserted as.
    pub fn deposit_commitment(
        &self,
        digest: &[u8; 32],
        data: &DepositData,
        position: usize,
    ) -> Result<Scalar> {
        let entry = data.entries.get(position).ok_or_else(|| {
            msg!("Deposit has no entry at position {}", position);
            error!(PoolError::InvalidTokenData)
        })?;
        let salt = positional_salt(digest, position as u32);
        self.compute_commitment(&entry.receiver_hash, &entry.token_data, &salt)
    }

    pub fn ext_data_hash(&self, ext_data: &ExtData) -> Result<Scalar> {
        ext_data.hash()
    }

    // ------------------------------------------------------------------
    // Mutations (callers run every check first)
    // ------------------------------------------------------------------

    pub(crate) fn ensure_capacity(&self, count: u64) -> Result<()> {
        self.tree.ensure_capacity(count)
    }

    /// Append commitments in order, returning the index of each.
    pub(crate) fn insert_commitments(&mut self, commitments: &[Scalar]) -> Result<Vec<u64>> {
        self.tree.ensure_capacity(commitments.len() as u64)?;
        commitments
            .iter()
            .map(|c| self.tree.insert_next(*c))
            .collect()
    }

    pub(crate) fn spend(&mut self, nullifiers: &[Scalar], spend_type: TransferType) -> Result<()> {
        self.nullifiers.mark_spent(nullifiers, spend_type)
    }
}
