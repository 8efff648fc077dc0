use anchor_lang::prelude::*;

use crate::crypto::field::Scalar;
use crate::crypto::keccak::derive_nullifying_key;
use crate::error::PoolError;
use crate::state::merkle_tree::{
    DEFAULT_ROOT_HISTORY_SIZE, DEFAULT_TREE_DEPTH, MAX_TREE_DEPTH, MIN_ROOT_HISTORY_SIZE,
    MIN_TREE_DEPTH,
};

fn validate_tree(tree_depth: u8, root_history_size: u16) -> Result<()> {
    require!(
        (MIN_TREE_DEPTH..=MAX_TREE_DEPTH).contains(&tree_depth),
        PoolError::InvalidTreeDepth
    );
    require!(
        root_history_size >= MIN_ROOT_HISTORY_SIZE,
        PoolError::InvalidRootHistorySize
    );
    Ok(())
}

/// Account registry configuration, immutable after construction.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct RegistryConfig {
    /// May register membership verifying keys
    pub authority: Pubkey,
    /// Separates signed account digests between deployments
    pub chain_domain: u64,
    pub tree_depth: u8,
    pub root_history_size: u16,
}

impl RegistryConfig {
    pub fn new(authority: Pubkey, chain_domain: u64) -> Self {
        Self {
            authority,
            chain_domain,
            tree_depth: DEFAULT_TREE_DEPTH,
            root_history_size: DEFAULT_ROOT_HISTORY_SIZE,
        }
    }

    pub fn with_tree(mut self, tree_depth: u8, root_history_size: u16) -> Self {
        self.tree_depth = tree_depth;
        self.root_history_size = root_history_size;
        self
    }

    pub fn validate(&self) -> Result<()> {
        validate_tree(self.tree_depth, self.root_history_size)
    }
}

/// Shielded pool configuration, immutable after construction.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct PoolConfig {
    /// May register transfer and balance verifying keys
    pub authority: Pubkey,
    pub chain_domain: u64,
    pub pool_index: u32,
    pub tree_depth: u8,
    pub root_history_size: u16,
    /// Seed the pool-wide nullifying key is derived from
    pub nullifying_seed: [u8; 32],
}

impl PoolConfig {
    pub fn new(authority: Pubkey, chain_domain: u64, pool_index: u32, nullifying_seed: [u8; 32]) -> Self {
        Self {
            authority,
            chain_domain,
            pool_index,
            tree_depth: DEFAULT_TREE_DEPTH,
            root_history_size: DEFAULT_ROOT_HISTORY_SIZE,
            nullifying_seed,
        }
    }

    pub fn with_tree(mut self, tree_depth: u8, root_history_size: u16) -> Self {
        self.tree_depth = tree_depth;
        self.root_history_size = root_history_size;
        self
    }

    pub fn validate(&self) -> Result<()> {
        validate_tree(self.tree_depth, self.root_history_size)
    }

    pub fn nullifying_key(&self) -> Scalar {
        derive_nullifying_key(&self.nullifying_seed)
    }

    /// True if `chain_domain`/`pool_index` name this deployment.
    pub fn targets(&self, chain_domain: u64, pool_index: u32) -> bool {
        self.chain_domain == chain_domain && self.pool_index == pool_index
    }
}
