//! Account registry
//!
//! Each account is controlled by a committee: a set of member keys with role
//! bitmasks, hashed into a committee tree built off-ledger. The registry
//! stores one leaf per account in a global tree:
//!
//! ```text
//! registry root
//! └── leaf = H(committee_root, quorum)        (one per account)
//!      └── committee root
//!           └── member leaf = H(public_key, roles)
//! ```
//!
//! Updating a committee replaces the account's leaf in place, so the global
//! tree never holds two leaves for one account.

use std::collections::BTreeMap;

use anchor_lang::prelude::*;

use crate::crypto::field::Scalar;
use crate::crypto::poseidon::{member_leaf_hash, registry_leaf_hash};
use crate::error::PoolError;
use crate::state::merkle_tree::{MerkleAccumulator, MerkleProof};
use crate::state::pool_config::RegistryConfig;
use crate::state::verification_key::{MembershipShape, VerifyingKeyDispatch};
use crate::types::AccountData;

/// Per-account state.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct AccountRecord {
    pub identifier: Pubkey,
    pub committee_root: Scalar,
    pub quorum: u64,
    /// Last accepted nonce
    pub nonce: u64,
    /// Position of the account's leaf in the registry tree
    pub leaf_index: u64,
}

impl AccountRecord {
    pub fn leaf_hash(&self) -> Result<Scalar> {
        registry_leaf_hash(&self.committee_root, self.quorum)
    }
}

/// One committee member, as hashed into a committee tree.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct MemberLeaf {
    pub public_key: Scalar,
    pub roles: u64,
}

impl MemberLeaf {
    /// May authorize spends
    pub const SPENDER: u64 = 1;
    /// May decrypt notes
    pub const VIEWER: u64 = 2;
    /// May change the committee
    pub const ADMIN: u64 = 4;

    pub fn new(public_key: Scalar, roles: u64) -> Self {
        Self { public_key, roles }
    }

    pub fn has_role(&self, role: u64) -> bool {
        self.roles & role == role
    }

    pub fn hash(&self) -> Result<Scalar> {
        member_leaf_hash(&self.public_key, self.roles)
    }
}

#[derive(Clone, Debug)]
pub struct AccountRegistry {
    config: RegistryConfig,
    tree: MerkleAccumulator,
    accounts: BTreeMap<Pubkey, AccountRecord>,
    membership_keys: VerifyingKeyDispatch<MembershipShape>,
}

impl AccountRegistry {
    pub fn new(config: RegistryConfig) -> Result<Self> {
        config.validate()?;
        let tree = MerkleAccumulator::new(config.tree_depth, config.root_history_size)?;
        let membership_keys = VerifyingKeyDispatch::new(config.authority);

        msg!(
            "Account registry initialized: depth {}, root history {}",
            config.tree_depth,
            config.root_history_size
        );

        Ok(Self {
            config,
            tree,
            accounts: BTreeMap::new(),
            membership_keys,
        })
    }

    // ------------------------------------------------------------------
    // Read accessors
    // ------------------------------------------------------------------

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    pub fn tree(&self) -> &MerkleAccumulator {
        &self.tree
    }

    pub fn root(&self) -> Scalar {
        self.tree.current_root()
    }

    pub fn is_recent_root(&self, root: &Scalar) -> bool {
        self.tree.is_recent_root(root)
    }

    pub fn account(&self, identifier: &Pubkey) -> Option<&AccountRecord> {
        self.accounts.get(identifier)
    }

    /// Last accepted nonce; 0 for unknown accounts.
    pub fn nonce(&self, identifier: &Pubkey) -> u64 {
        self.accounts.get(identifier).map_or(0, |a| a.nonce)
    }

    pub fn committee_root(&self, identifier: &Pubkey) -> Option<Scalar> {
        self.accounts.get(identifier).map(|a| a.committee_root)
    }

    pub fn account_count(&self) -> usize {
        self.accounts.len()
    }

    /// Digest a relayer-submitted `manage_account` call must be signed over.
    pub fn account_digest(&self, data: &AccountData) -> [u8; 32] {
        data.digest(self.config.chain_domain)
    }

    /// Path authenticating `identifier`'s current leaf.
    pub fn registry_proof(&self, identifier: &Pubkey) -> Option<MerkleProof> {
        let record = self.accounts.get(identifier)?;
        self.tree.merkle_proof(record.leaf_index).ok()
    }

    pub fn membership_keys(&self) -> &VerifyingKeyDispatch<MembershipShape> {
        &self.membership_keys
    }

    pub fn membership_keys_mut(&mut self) -> &mut VerifyingKeyDispatch<MembershipShape> {
        &mut self.membership_keys
    }

    // ------------------------------------------------------------------
    // Mutations (callers validate nonce and authorization first)
    // ------------------------------------------------------------------

    /// Append a leaf for a new account. Returns the stored record.
    pub fn register(
        &mut self,
        identifier: Pubkey,
        committee_root: Scalar,
        quorum: u64,
        nonce: u64,
    ) -> Result<AccountRecord> {
        let leaf = registry_leaf_hash(&committee_root, quorum)?;
        let leaf_index = self.tree.insert_next(leaf)?;

        let record = AccountRecord {
            identifier,
            committee_root,
            quorum,
            nonce,
            leaf_index,
        };
        self.accounts.insert(identifier, record);
        Ok(record)
    }

    /// Replace the leaf of an existing account in place.
    /// Returns the previous and the new record.
    pub fn update(
        &mut self,
        identifier: &Pubkey,
        proof: &MerkleProof,
        committee_root: Scalar,
        quorum: u64,
        nonce: u64,
    ) -> Result<(AccountRecord, AccountRecord)> {
        let previous = *self.accounts.get(identifier).ok_or_else(|| {
            msg!("Account {} is not registered", identifier);
            error!(PoolError::InvalidAccountData)
        })?;

        let old_leaf = previous.leaf_hash()?;
        let new_leaf = registry_leaf_hash(&committee_root, quorum)?;
        self.tree
            .replace_at(previous.leaf_index, &old_leaf, proof, new_leaf)?;

        let record = AccountRecord {
            committee_root,
            quorum,
            nonce,
            ..previous
        };
        self.accounts.insert(*identifier, record);
        Ok((previous, record))
    }
}
