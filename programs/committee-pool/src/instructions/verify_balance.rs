//! Balance proof check
//!
//! Read-only: answers whether unspent notes of `token` held under a
//! registered account sum to at least `min_balance`. The notes are named by
//! their nullifiers so the check can tell whether any was already spent or
//! is counted twice; the nullifiers are not locked.

use anchor_lang::prelude::*;

use crate::crypto::field::Scalar;
use crate::crypto::keccak::token_field;
use crate::crypto::public_inputs::BalancePublicInputs;
use crate::error::PoolError;
use crate::instructions::{query_outcome, LedgerContext};
use crate::state::{AccountRegistry, BalanceShape, NullifierSet, ShieldedPool};

pub struct VerifyBalance<'a> {
    pub pool: &'a ShieldedPool,
    pub registry: &'a AccountRegistry,
}

pub fn handler(
    ctx: LedgerContext<VerifyBalance>,
    token: &Pubkey,
    min_balance: u64,
    commitment_root: Scalar,
    registry_root: Scalar,
    nullifiers: &[Scalar],
    proof: &[u8],
) -> Result<bool> {
    let VerifyBalance { pool, registry } = ctx.accounts;

    if !pool.is_recent_root(&commitment_root) || !registry.is_recent_root(&registry_root) {
        msg!(
            "Balance proof against stale roots: commitment {}, registry {}",
            hex::encode(commitment_root),
            hex::encode(registry_root)
        );
        return Err(error!(PoolError::StaleRoot));
    }

    let shape = BalanceShape::new(nullifiers.len() as u32);
    if !pool.balance_keys().contains(&shape) {
        msg!("No balance verifying key for shape {:?}", shape);
        return Err(error!(PoolError::UnsupportedShape));
    }

    if pool.nullifiers().any_spent(nullifiers) {
        msg!("Balance proof references a spent note");
        return Ok(false);
    }
    if let Some(repeat) = NullifierSet::first_repeat(nullifiers) {
        msg!("Balance proof names note {} twice", hex::encode(repeat));
        return Ok(false);
    }

    let public_inputs = BalancePublicInputs {
        commitment_root,
        registry_root,
        token: token_field(token),
        min_balance,
        nullifiers: nullifiers.to_vec(),
    };
    let result = public_inputs.validate().and_then(|_| {
        pool.balance_keys().verify_proof(
            ctx.proof_system,
            &shape,
            proof,
            &public_inputs.to_field_elements(),
        )
    });

    query_outcome("Balance", result)
}
