//! Ledger state for the committee pool
//!
//! ```text
//! CommitteePool
//! ├── AccountRegistry
//! │   ├── MerkleAccumulator (one leaf per account)
//! │   └── VerifyingKeyDispatch<MembershipShape>
//! └── ShieldedPool
//!     ├── MerkleAccumulator (note commitments)
//!     ├── NullifierSet
//!     ├── VerifyingKeyDispatch<TransferShape>
//!     └── VerifyingKeyDispatch<BalanceShape>
//! ```

pub mod account_registry;
pub mod merkle_tree;
pub mod pool_config;
pub mod shielded_pool;
pub mod spent_nullifier;
pub mod verification_key;

pub use account_registry::{AccountRecord, AccountRegistry, MemberLeaf};
pub use merkle_tree::{merkle_root_of, MerkleAccumulator, MerkleProof};
pub use pool_config::{PoolConfig, RegistryConfig};
pub use shielded_pool::ShieldedPool;
pub use spent_nullifier::{NullifierSet, SpentNullifier};
pub use verification_key::{
    BalanceShape, MembershipShape, ShapeKey, TransferShape, VerifyingKey, VerifyingKeyDispatch,
    VerifyingKeyRecord,
};

// Re-export constants
pub use merkle_tree::{
    DEFAULT_ROOT_HISTORY_SIZE, DEFAULT_TREE_DEPTH, MAX_TREE_DEPTH, MIN_ROOT_HISTORY_SIZE,
    MIN_TREE_DEPTH,
};
