//! Spent nullifier set
//!
//! A nullifier, once spent, is never removed and never reused. Checks run
//! over the whole batch of a call before any entry is inserted, so a call
//! that repeats a nullifier (against the set or within itself) changes
//! nothing.

use std::collections::{BTreeMap, BTreeSet};

use anchor_lang::prelude::*;

use crate::crypto::field::Scalar;
use crate::error::PoolError;
use crate::types::TransferType;

/// Record kept for each spent nullifier
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, PartialEq, Eq, Debug)]
pub struct SpentNullifier {
    /// Operation that spent the nullifier
    pub spend_type: TransferType,
    /// Position in spend order
    pub sequence: u64,
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, Default)]
pub struct NullifierSet {
    spent: BTreeMap<Scalar, SpentNullifier>,
}

impl NullifierSet {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_spent(&self, nullifier: &Scalar) -> bool {
        self.spent.contains_key(nullifier)
    }

    pub fn get(&self, nullifier: &Scalar) -> Option<&SpentNullifier> {
        self.spent.get(nullifier)
    }

    pub fn len(&self) -> usize {
        self.spent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spent.is_empty()
    }

    /// True if any of `nullifiers` is already spent.
    pub fn any_spent(&self, nullifiers: &[Scalar]) -> bool {
        nullifiers.iter().any(|n| self.is_spent(n))
    }

    /// First nullifier that appears more than once in `nullifiers`.
    pub fn first_repeat(nullifiers: &[Scalar]) -> Option<&Scalar> {
        let mut seen = BTreeSet::new();
        nullifiers.iter().find(|n| !seen.insert(**n))
    }

    /// Fails with `DoubleSpend` if a nullifier is already spent or repeats
    /// inside `nullifiers`.
    pub fn check_unspent(&self, nullifiers: &[Scalar]) -> Result<()> {
        if let Some(spent) = nullifiers.iter().find(|n| self.is_spent(n)) {
            msg!("Nullifier already spent: {}", hex::encode(spent));
            return Err(error!(PoolError::DoubleSpend));
        }
        if let Some(repeat) = Self::first_repeat(nullifiers) {
            msg!("Nullifier repeated within call: {}", hex::encode(repeat));
            return Err(error!(PoolError::DoubleSpend));
        }
        Ok(())
    }

    /// Mark every nullifier spent, all or none.
    pub fn mark_spent(&mut self, nullifiers: &[Scalar], spend_type: TransferType) -> Result<()> {
        self.check_unspent(nullifiers)?;

        for nullifier in nullifiers {
            let sequence = self.spent.len() as u64;
            self.spent.insert(
                *nullifier,
                SpentNullifier {
                    spend_type,
                    sequence,
                },
            );
        }
        Ok(())
    }
}
