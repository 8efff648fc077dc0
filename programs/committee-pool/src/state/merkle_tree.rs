//! Fixed-depth Merkle accumulator
//!
//! One primitive backs both ledgers:
//! - the global account registry (one leaf per account, replaced in place
//!   when a committee changes)
//! - the pool's commitment tree (append-only)
//!
//! Committee trees are built client-side with [`merkle_root_of`].
//!
//! # Storage
//! Nodes live in a flat arena keyed by `(level, index)`; level 0 holds the
//! leaves and level `depth` the root. Absent nodes are the zero hash of their
//! level:
//! - zeros[0] = 0 (empty leaf)
//! - zeros[i] = H(zeros[i-1], zeros[i-1])
//!
//! # Root history
//! Every root the tree takes is pushed into a ring buffer of the last `K`
//! roots, so proofs built against a slightly stale root still verify.
//! The buffer holds only roots the tree actually had.

use std::collections::BTreeMap;

use anchor_lang::prelude::*;

use crate::crypto::field::Scalar;
use crate::crypto::poseidon;
use crate::error::PoolError;

/// Maximum supported tree depth (2^32 leaves)
pub const MAX_TREE_DEPTH: u8 = 32;

/// Minimum supported tree depth
pub const MIN_TREE_DEPTH: u8 = 4;

/// Default tree depth
pub const DEFAULT_TREE_DEPTH: u8 = 20;

/// Minimum root history size
pub const MIN_ROOT_HISTORY_SIZE: u16 = 30;

/// Default root history size
pub const DEFAULT_ROOT_HISTORY_SIZE: u16 = 100;

/// Sibling path authenticating one leaf.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct MerkleProof {
    pub leaf_index: u64,
    /// Siblings from the leaf level up, one per level
    pub siblings: Vec<Scalar>,
}

impl MerkleProof {
    /// Recompute the root `leaf` hashes to along this path.
    pub fn compute_root(&self, leaf: &Scalar, depth: u8) -> Result<Scalar> {
        require!(
            self.siblings.len() == depth as usize,
            PoolError::InvalidMerkleProof
        );
        require!(
            depth >= 64 || self.leaf_index >> depth == 0,
            PoolError::InvalidMerkleProof
        );

        let mut current = *leaf;
        let mut index = self.leaf_index;
        for sibling in &self.siblings {
            current = if index & 1 == 1 {
                poseidon::hash_two_to_one(sibling, &current)?
            } else {
                poseidon::hash_two_to_one(&current, sibling)?
            };
            index >>= 1;
        }
        Ok(current)
    }
}

/// Zero hash for each level (length = depth + 1)
pub fn compute_zero_values(depth: u8) -> Result<Vec<Scalar>> {
    let mut zeros = Vec::with_capacity(depth as usize + 1);
    zeros.push([0u8; 32]);

    for i in 1..=depth as usize {
        let prev = zeros[i - 1];
        zeros.push(poseidon::hash_two_to_one(&prev, &prev)?);
    }

    Ok(zeros)
}

/// Root of a tree of `depth` whose first leaves are `leaves` and the rest empty.
pub fn merkle_root_of(leaves: &[Scalar], depth: u8) -> Result<Scalar> {
    require!(
        (MIN_TREE_DEPTH..=MAX_TREE_DEPTH).contains(&depth),
        PoolError::InvalidTreeDepth
    );
    require!(
        (leaves.len() as u64) <= 1u64 << depth,
        PoolError::CapacityExceeded
    );

    let zeros = compute_zero_values(depth)?;
    let mut layer = leaves.to_vec();

    for zero in zeros.iter().take(depth as usize) {
        if layer.is_empty() {
            break;
        }
        if layer.len() % 2 == 1 {
            layer.push(*zero);
        }
        layer = layer
            .chunks_exact(2)
            .map(|pair| poseidon::hash_two_to_one(&pair[0], &pair[1]))
            .collect::<Result<Vec<_>>>()?;
    }

    match layer.first() {
        Some(root) if layer.len() == 1 && !leaves.is_empty() => Ok(*root),
        _ => Ok(zeros[depth as usize]),
    }
}

/// Fixed-depth binary Merkle accumulator with a bounded root history.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug)]
pub struct MerkleAccumulator {
    /// Tree depth (immutable after construction)
    depth: u8,

    /// Next leaf index to be filled (also = total leaves inserted)
    next_index: u64,

    /// Zero hash per level
    zeros: Vec<Scalar>,

    /// Non-empty nodes keyed by (level, index)
    nodes: BTreeMap<(u8, u64), Scalar>,

    /// Ring buffer of recent roots
    root_history: Vec<Scalar>,

    /// Next write position once the ring buffer is full
    root_history_index: u16,

    /// Ring buffer capacity
    root_history_size: u16,
}

impl MerkleAccumulator {
    /// # Errors
    /// - `InvalidTreeDepth` if depth is outside 4..=32
    /// - `InvalidRootHistorySize` if history size < 30
    pub fn new(depth: u8, root_history_size: u16) -> Result<Self> {
        require!(
            (MIN_TREE_DEPTH..=MAX_TREE_DEPTH).contains(&depth),
            PoolError::InvalidTreeDepth
        );
        require!(
            root_history_size >= MIN_ROOT_HISTORY_SIZE,
            PoolError::InvalidRootHistorySize
        );

        let zeros = compute_zero_values(depth)?;
        let empty_root = zeros[depth as usize];

        let mut root_history = Vec::with_capacity(root_history_size as usize);
        root_history.push(empty_root);

        Ok(Self {
            depth,
            next_index: 0,
            zeros,
            nodes: BTreeMap::new(),
            root_history,
            root_history_index: 0,
            root_history_size,
        })
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    #[inline]
    pub fn depth(&self) -> u8 {
        self.depth
    }

    #[inline]
    pub fn next_index(&self) -> u64 {
        self.next_index
    }

    /// Tree capacity (2^depth)
    #[inline]
    pub fn capacity(&self) -> u64 {
        1u64 << self.depth
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.next_index >= self.capacity()
    }

    #[inline]
    pub fn available_space(&self) -> u64 {
        self.capacity().saturating_sub(self.next_index)
    }

    /// Fill percentage (0-100)
    pub fn fill_percentage(&self) -> u8 {
        ((self.next_index as u128 * 100) / self.capacity() as u128) as u8
    }

    pub fn current_root(&self) -> Scalar {
        self.node(self.depth, 0)
    }

    pub fn zero_at_level(&self, level: u8) -> Option<Scalar> {
        self.zeros.get(level as usize).copied()
    }

    /// Leaf at `index`, or `None` past the last inserted leaf.
    pub fn leaf_at(&self, index: u64) -> Option<Scalar> {
        (index < self.next_index).then(|| self.node(0, index))
    }

    /// All inserted leaves in index order.
    pub fn leaves(&self) -> Vec<Scalar> {
        (0..self.next_index).map(|i| self.node(0, i)).collect()
    }

    pub fn root_history(&self) -> &[Scalar] {
        &self.root_history
    }

    pub fn root_history_size(&self) -> u16 {
        self.root_history_size
    }

    /// Check if a root is current or in recent history
    pub fn is_recent_root(&self, root: &Scalar) -> bool {
        *root == self.current_root() || self.root_history.iter().any(|r| r == root)
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    /// Pre-flight check that `count` more leaves fit.
    pub fn ensure_capacity(&self, count: u64) -> Result<()> {
        let needed = self
            .next_index
            .checked_add(count)
            .ok_or(error!(PoolError::ArithmeticOverflow))?;
        if needed > self.capacity() {
            msg!(
                "Tree capacity exceeded: {} leaves used, {} requested, capacity {}",
                self.next_index,
                count,
                self.capacity()
            );
            return Err(error!(PoolError::CapacityExceeded));
        }
        Ok(())
    }

    /// Append `leaf` at the next free index. Returns that index.
    ///
    /// # Errors
    /// - `CapacityExceeded` if the tree is full
    /// - `CryptographyError` if Poseidon hash fails
    pub fn insert_next(&mut self, leaf: Scalar) -> Result<u64> {
        self.ensure_capacity(1)?;

        let index = self.next_index;
        let updates = self.path_updates(index, leaf)?;
        self.apply(updates);
        self.next_index += 1;

        Ok(index)
    }

    /// Replace the leaf at `index` after checking `proof` authenticates
    /// `old_leaf` there under the current root. Returns the new root.
    pub fn replace_at(
        &mut self,
        index: u64,
        old_leaf: &Scalar,
        proof: &MerkleProof,
        new_leaf: Scalar,
    ) -> Result<Scalar> {
        require!(index < self.next_index, PoolError::InvalidMerkleProof);
        require!(proof.leaf_index == index, PoolError::InvalidMerkleProof);

        let claimed_root = proof.compute_root(old_leaf, self.depth)?;
        if claimed_root != self.current_root() || self.node(0, index) != *old_leaf {
            msg!(
                "Merkle proof for leaf {} does not match root {}",
                index,
                hex::encode(self.current_root())
            );
            return Err(error!(PoolError::InvalidMerkleProof));
        }

        let updates = self.path_updates(index, new_leaf)?;
        self.apply(updates);

        Ok(self.current_root())
    }

    /// Sibling path for the leaf at `index` under the current root.
    pub fn merkle_proof(&self, index: u64) -> Result<MerkleProof> {
        require!(index < self.next_index, PoolError::InvalidMerkleProof);

        let siblings = (0..self.depth)
            .map(|level| self.node(level, (index >> level) ^ 1))
            .collect();

        Ok(MerkleProof {
            leaf_index: index,
            siblings,
        })
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn node(&self, level: u8, index: u64) -> Scalar {
        self.nodes
            .get(&(level, index))
            .copied()
            .unwrap_or(self.zeros[level as usize])
    }

    /// Every node that changes when `leaf` is written at `index`, leaf first.
    /// Nothing is written, so a hashing failure leaves the tree untouched.
    fn path_updates(&self, index: u64, leaf: Scalar) -> Result<Vec<((u8, u64), Scalar)>> {
        let mut updates = Vec::with_capacity(self.depth as usize + 1);
        let mut current = leaf;
        let mut current_index = index;
        updates.push(((0u8, index), leaf));

        for level in 0..self.depth {
            let sibling = self.node(level, current_index ^ 1);
            current = if current_index & 1 == 1 {
                poseidon::hash_two_to_one(&sibling, &current)?
            } else {
                poseidon::hash_two_to_one(&current, &sibling)?
            };
            current_index >>= 1;
            updates.push(((level + 1, current_index), current));
        }

        Ok(updates)
    }

    fn apply(&mut self, updates: Vec<((u8, u64), Scalar)>) {
        for (key, value) in updates {
            self.nodes.insert(key, value);
        }
        let root = self.current_root();
        self.push_root(root);
    }

    fn push_root(&mut self, root: Scalar) {
        if self.root_history.len() < self.root_history_size as usize {
            self.root_history.push(root);
            return;
        }
        self.root_history[self.root_history_index as usize] = root;
        self.root_history_index = (self.root_history_index + 1) % self.root_history_size;
    }
}
