//! Asset Ledger collaborator
//!
//! The pool never holds assets itself. Value moves through an
//! [`AssetLedger`]: deposits pull from the depositor into custody,
//! withdrawals push from custody to the recipient. Both calls may fail; the
//! pool maps any failure to `AssetTransferFailed` and leaves its own state
//! untouched.

use std::collections::BTreeMap;

use anchor_lang::prelude::*;

use crate::error::PoolError;

/// Custody interface the pool moves value through.
pub trait AssetLedger {
    /// Move `amount` of `token/identifier` from `from` into pool custody.
    fn transfer_in(&mut self, token: &Pubkey, identifier: u64, from: &Pubkey, amount: u64)
        -> Result<()>;

    /// Move `amount` of `token/identifier` from pool custody to `to`.
    fn transfer_out(&mut self, token: &Pubkey, identifier: u64, to: &Pubkey, amount: u64)
        -> Result<()>;
}

/// Balances keyed by (token, identifier, owner); custody is held by a
/// dedicated custody key.
#[derive(Clone, Debug)]
pub struct InMemoryAssetLedger {
    custody: Pubkey,
    balances: BTreeMap<(Pubkey, u64, Pubkey), u64>,
}

impl InMemoryAssetLedger {
    pub fn new(custody: Pubkey) -> Self {
        Self {
            custody,
            balances: BTreeMap::new(),
        }
    }

    pub fn custody(&self) -> &Pubkey {
        &self.custody
    }

    pub fn balance_of(&self, token: &Pubkey, identifier: u64, owner: &Pubkey) -> u64 {
        self.balances
            .get(&(*token, identifier, *owner))
            .copied()
            .unwrap_or(0)
    }

    pub fn custody_balance(&self, token: &Pubkey, identifier: u64) -> u64 {
        self.balance_of(token, identifier, &self.custody)
    }

    /// Credit `owner` out of thin air (host setup and tests).
    pub fn mint(&mut self, token: &Pubkey, identifier: u64, owner: &Pubkey, amount: u64) -> Result<()> {
        self.credit(token, identifier, owner, amount)
    }

    /// Move between two arbitrary owners.
    pub fn transfer(
        &mut self,
        token: &Pubkey,
        identifier: u64,
        from: &Pubkey,
        to: &Pubkey,
        amount: u64,
    ) -> Result<()> {
        let from_balance = self.balance_of(token, identifier, from);
        let remaining = from_balance.checked_sub(amount).ok_or_else(|| {
            msg!(
                "Insufficient balance for {}: has {}, needs {}",
                from,
                from_balance,
                amount
            );
            error!(PoolError::InsufficientBalance)
        })?;

        // Check the credit side before touching either balance
        let to_balance = self.balance_of(token, identifier, to);
        if from != to {
            to_balance
                .checked_add(amount)
                .ok_or(error!(PoolError::ArithmeticOverflow))?;
        }

        self.balances.insert((*token, identifier, *from), remaining);
        self.credit(token, identifier, to, amount)
    }

    fn credit(&mut self, token: &Pubkey, identifier: u64, owner: &Pubkey, amount: u64) -> Result<()> {
        let entry = self.balances.entry((*token, identifier, *owner)).or_insert(0);
        *entry = entry
            .checked_add(amount)
            .ok_or(error!(PoolError::ArithmeticOverflow))?;
        Ok(())
    }
}

impl AssetLedger for InMemoryAssetLedger {
    fn transfer_in(
        &mut self,
        token: &Pubkey,
        identifier: u64,
        from: &Pubkey,
        amount: u64,
    ) -> Result<()> {
        let custody = self.custody;
        self.transfer(token, identifier, from, &custody, amount)
    }

    fn transfer_out(
        &mut self,
        token: &Pubkey,
        identifier: u64,
        to: &Pubkey,
        amount: u64,
    ) -> Result<()> {
        let custody = self.custody;
        self.transfer(token, identifier, &custody, to, amount)
    }
}
