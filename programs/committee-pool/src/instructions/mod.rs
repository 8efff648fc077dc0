//! Instruction handlers for the committee pool
//!
//! Each handler runs one ledger instruction against the accounts it is
//! given. Handlers validate everything before the first mutation and return
//! the events the instruction produced; the facade records them only once
//! the handler has returned `Ok`.
//!
//! # Module Organization
//!
//! - **Registry**: account management, membership proofs
//! - **Pool**: deposit, transfer, withdraw, balance proofs
//! - **Admin**: verifying key registration

// Registry
pub mod manage_account;
pub mod verify_membership;

// Pool
pub mod deposit;
pub mod transfer;
pub mod verify_balance;
pub mod withdraw;

// Admin
pub mod set_verifying_key;

use anchor_lang::prelude::*;

use crate::crypto::groth16_verifier::ProofSystem;
use crate::error::{error_code_of, PoolError};

pub use deposit::DepositNotes;
pub use manage_account::ManageAccount;
pub use set_verifying_key::SetVerifyingKey;
pub use transfer::ShieldedTransfer;
pub use verify_balance::VerifyBalance;
pub use verify_membership::VerifyMembership;
pub use withdraw::Withdraw;

/// Accounts plus the proof engine an instruction runs with.
pub struct LedgerContext<'a, T> {
    pub accounts: T,
    pub proof_system: &'a dyn ProofSystem,
}

impl<'a, T> LedgerContext<'a, T> {
    pub fn new(accounts: T, proof_system: &'a dyn ProofSystem) -> Self {
        Self {
            accounts,
            proof_system,
        }
    }
}

fn is_error(err: &Error, code: PoolError) -> bool {
    error_code_of(err) == Some(code.into())
}

/// Outcome of a read-only proof check: a proof that does not verify, or is
/// malformed, is `false`. Only a missing key or a stale root aborts.
pub(crate) fn query_outcome(kind: &str, result: Result<bool>) -> Result<bool> {
    match result {
        Ok(valid) => Ok(valid),
        Err(err)
            if is_error(&err, PoolError::UnsupportedShape)
                || is_error(&err, PoolError::StaleRoot) =>
        {
            Err(err)
        }
        Err(err) => {
            msg!("{} proof rejected: {}", kind, err);
            Ok(false)
        }
    }
}

/// Outcome of a proof check guarding a mutation: anything but `Ok(true)`
/// aborts with `InvalidProof`.
pub(crate) fn require_valid_proof(kind: &str, result: Result<bool>) -> Result<()> {
    match result {
        Ok(true) => Ok(()),
        Ok(false) => {
            msg!("{} proof did not verify", kind);
            Err(error!(PoolError::InvalidProof))
        }
        Err(err) => {
            msg!("{} proof rejected: {}", kind, err);
            Err(error!(PoolError::InvalidProof))
        }
    }
}
