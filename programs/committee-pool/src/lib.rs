//! Committee Pool - committee-controlled shielded asset pool
//!
//! Accounts are controlled by a quorum of registered committee members.
//! Value is held as shielded notes known to the ledger only by their
//! commitments; spends are authorized by zero-knowledge proofs that attest
//! committee approval without revealing which notes were spent or by whom.
//!
//! # Features
//!
//! - Nested Merkle account registry: one leaf per account, embedding the
//!   root of that account's committee tree
//! - Commitment tree and spent-nullifier set for shielded notes
//! - Signed deposits (relayable), proof-authorized transfers and withdrawals
//! - Read-only membership and balance proofs
//! - Shape-keyed verifying keys for every proof kind
//!
//! # Architecture
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                         CommitteePool                            │
//! │          (single writer: every instruction takes &mut self)      │
//! └──────────────────────────────────────────────────────────────────┘
//!            │                        │                      │
//!            ▼                        ▼                      ▼
//! ┌────────────────────┐   ┌─────────────────────┐   ┌──────────────┐
//! │  AccountRegistry   │◄──│    ShieldedPool     │──►│ AssetLedger  │
//! │ (registry tree,    │   │ (commitment tree,   │   │ (custody)    │
//! │  membership keys)  │   │  nullifiers, keys)  │   └──────────────┘
//! └────────────────────┘   └─────────────────────┘
//!            │                        │
//!            └──────────┬─────────────┘
//!                       ▼
//!              ┌─────────────────┐
//!              │   ProofSystem   │  (Groth16 over BN254)
//!              └─────────────────┘
//! ```
//!
//! Every instruction validates roots, nullifiers, shape, proof and capacity
//! before its first mutation, then appends its events to the [`EventLog`].
//! An instruction that returns `Err` changes nothing.
//!
//! # Proof Kinds
//! - Membership: a committee member holding a role signed a message
//! - Transfer: committee-authorized join-split (also used by withdrawals)
//! - Balance: unspent notes of a token sum to at least a threshold

use anchor_lang::prelude::*;

pub mod asset_ledger;
pub mod crypto;
pub mod error;
pub mod events;
pub mod instructions;
pub mod state;
pub mod types;

#[cfg(test)]
mod test_utils;
#[cfg(test)]
mod tests;

use asset_ledger::AssetLedger;
use crypto::field::Scalar;
use crypto::groth16_verifier::{Groth16, ProofSystem};
use events::EventLog;
use instructions::{
    DepositNotes, LedgerContext, ManageAccount, SetVerifyingKey, ShieldedTransfer, VerifyBalance,
    VerifyMembership, Withdraw,
};
use state::{
    AccountRegistry, BalanceShape, MembershipShape, PoolConfig, RegistryConfig, ShieldedPool,
    TransferShape, VerifyingKey,
};
use types::{AccountData, DepositData, ExtData, PublicData};

/// The ledger: one account registry, one shielded pool, the proof engine
/// both dispatch to, and the log of every event they produced.
pub struct CommitteePool {
    registry: AccountRegistry,
    pool: ShieldedPool,
    proof_system: Box<dyn ProofSystem>,
    events: EventLog,
}

impl CommitteePool {
    pub fn new(
        registry_config: RegistryConfig,
        pool_config: PoolConfig,
        proof_system: Box<dyn ProofSystem>,
    ) -> Result<Self> {
        Ok(Self {
            registry: AccountRegistry::new(registry_config)?,
            pool: ShieldedPool::new(pool_config)?,
            proof_system,
            events: EventLog::new(),
        })
    }

    /// Ledger verifying proofs with Groth16 over BN254.
    pub fn with_groth16(registry_config: RegistryConfig, pool_config: PoolConfig) -> Result<Self> {
        Self::new(registry_config, pool_config, Box::new(Groth16))
    }

    pub fn registry(&self) -> &AccountRegistry {
        &self.registry
    }

    pub fn pool(&self) -> &ShieldedPool {
        &self.pool
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    // =========================================================================
    // ACCOUNT REGISTRY
    // =========================================================================

    /// Register an account's committee, or replace it.
    ///
    /// `signature` is only checked when `caller` is not the account itself.
    pub fn manage_account(
        &mut self,
        caller: &Pubkey,
        data: AccountData,
        signature: &[u8],
    ) -> Result<()> {
        let ctx = LedgerContext::new(
            ManageAccount {
                caller: *caller,
                registry: &mut self.registry,
            },
            &*self.proof_system,
        );
        let events = instructions::manage_account::handler(ctx, data, signature)?;
        self.events.record_all(events);
        Ok(())
    }

    /// Check a membership proof for `identifier`'s current committee.
    pub fn verify(
        &self,
        identifier: &Pubkey,
        message: Scalar,
        role: u64,
        proof: &[u8],
    ) -> Result<bool> {
        let ctx = LedgerContext::new(
            VerifyMembership {
                registry: &self.registry,
            },
            &*self.proof_system,
        );
        instructions::verify_membership::handler(ctx, identifier, message, role, proof)
    }

    // =========================================================================
    // SHIELDED POOL
    // =========================================================================

    pub fn is_valid_deposit(&self, data: &DepositData, signature: &[u8]) -> bool {
        instructions::deposit::is_valid_deposit(&self.pool, data, signature)
    }

    /// Pull every entry from the sender and commit one note per entry.
    pub fn deposit(
        &mut self,
        assets: &mut dyn AssetLedger,
        data: DepositData,
        signature: &[u8],
    ) -> Result<()> {
        let ctx = LedgerContext::new(
            DepositNotes {
                pool: &mut self.pool,
                assets,
            },
            &*self.proof_system,
        );
        let events = instructions::deposit::handler(ctx, data, signature)?;
        self.events.record_all(events);
        Ok(())
    }

    pub fn transfer(
        &mut self,
        proof: &[u8],
        public_data: PublicData,
        ext_data: ExtData,
    ) -> Result<()> {
        let ctx = LedgerContext::new(
            ShieldedTransfer {
                pool: &mut self.pool,
                registry: &self.registry,
            },
            &*self.proof_system,
        );
        let events = instructions::transfer::handler(ctx, proof, public_data, ext_data)?;
        self.events.record_all(events);
        Ok(())
    }

    pub fn withdraw(
        &mut self,
        assets: &mut dyn AssetLedger,
        proof: &[u8],
        public_data: PublicData,
        ext_data: ExtData,
    ) -> Result<()> {
        let ctx = LedgerContext::new(
            Withdraw {
                pool: &mut self.pool,
                registry: &self.registry,
                assets,
            },
            &*self.proof_system,
        );
        let events = instructions::withdraw::handler(ctx, proof, public_data, ext_data)?;
        self.events.record_all(events);
        Ok(())
    }

    /// Check a balance proof over the notes named by `nullifiers`.
    pub fn verify_balance_of(
        &self,
        token: &Pubkey,
        min_balance: u64,
        commitment_root: Scalar,
        registry_root: Scalar,
        nullifiers: &[Scalar],
        proof: &[u8],
    ) -> Result<bool> {
        let ctx = LedgerContext::new(
            VerifyBalance {
                pool: &self.pool,
                registry: &self.registry,
            },
            &*self.proof_system,
        );
        instructions::verify_balance::handler(
            ctx,
            token,
            min_balance,
            commitment_root,
            registry_root,
            nullifiers,
            proof,
        )
    }

    // =========================================================================
    // VERIFYING KEY ADMINISTRATION
    // =========================================================================

    pub fn set_membership_verifying_key(&mut self, caller: &Pubkey, vk: VerifyingKey) -> Result<()> {
        let accounts = SetVerifyingKey {
            authority: *caller,
            dispatch: self.registry.membership_keys_mut(),
        };
        let events = instructions::set_verifying_key::handler(accounts, MembershipShape, vk)?;
        self.events.record_all(events);
        Ok(())
    }

    /// Batch form for symmetry with the other tables. The membership table
    /// has a single fixed shape, so every entry of `shapes` is
    /// [`MembershipShape`] and the last key written wins.
    pub fn set_membership_verifying_keys(
        &mut self,
        caller: &Pubkey,
        shapes: &[MembershipShape],
        vks: Vec<VerifyingKey>,
    ) -> Result<()> {
        let accounts = SetVerifyingKey {
            authority: *caller,
            dispatch: self.registry.membership_keys_mut(),
        };
        let events = instructions::set_verifying_key::batch_handler(accounts, shapes, vks)?;
        self.events.record_all(events);
        Ok(())
    }

    pub fn set_transfer_verifying_key(
        &mut self,
        caller: &Pubkey,
        shape: TransferShape,
        vk: VerifyingKey,
    ) -> Result<()> {
        let accounts = SetVerifyingKey {
            authority: *caller,
            dispatch: self.pool.transfer_keys_mut(),
        };
        let events = instructions::set_verifying_key::handler(accounts, shape, vk)?;
        self.events.record_all(events);
        Ok(())
    }

    pub fn set_transfer_verifying_keys(
        &mut self,
        caller: &Pubkey,
        shapes: &[TransferShape],
        vks: Vec<VerifyingKey>,
    ) -> Result<()> {
        let accounts = SetVerifyingKey {
            authority: *caller,
            dispatch: self.pool.transfer_keys_mut(),
        };
        let events = instructions::set_verifying_key::batch_handler(accounts, shapes, vks)?;
        self.events.record_all(events);
        Ok(())
    }

    pub fn set_balance_verifying_key(
        &mut self,
        caller: &Pubkey,
        shape: BalanceShape,
        vk: VerifyingKey,
    ) -> Result<()> {
        let accounts = SetVerifyingKey {
            authority: *caller,
            dispatch: self.pool.balance_keys_mut(),
        };
        let events = instructions::set_verifying_key::handler(accounts, shape, vk)?;
        self.events.record_all(events);
        Ok(())
    }

    pub fn set_balance_verifying_keys(
        &mut self,
        caller: &Pubkey,
        shapes: &[BalanceShape],
        vks: Vec<VerifyingKey>,
    ) -> Result<()> {
        let accounts = SetVerifyingKey {
            authority: *caller,
            dispatch: self.pool.balance_keys_mut(),
        };
        let events = instructions::set_verifying_key::batch_handler(accounts, shapes, vks)?;
        self.events.record_all(events);
        Ok(())
    }
}
