//! Membership proof check
//!
//! Read-only: answers whether a member of `identifier`'s committee holding
//! `role` signed `message`. The proof is checked against the account's
//! current committee root.

use anchor_lang::prelude::*;

use crate::crypto::field::Scalar;
use crate::crypto::public_inputs::MembershipPublicInputs;
use crate::error::PoolError;
use crate::instructions::{query_outcome, LedgerContext};
use crate::state::{AccountRegistry, MembershipShape};

pub struct VerifyMembership<'a> {
    pub registry: &'a AccountRegistry,
}

pub fn handler(
    ctx: LedgerContext<VerifyMembership>,
    identifier: &Pubkey,
    message: Scalar,
    role: u64,
    proof: &[u8],
) -> Result<bool> {
    let registry = ctx.accounts.registry;

    let Some(record) = registry.account(identifier) else {
        msg!("Membership check for unknown account {}", identifier);
        return Ok(false);
    };

    if !registry.membership_keys().contains(&MembershipShape) {
        msg!("No membership verifying key registered");
        return Err(error!(PoolError::UnsupportedShape));
    }

    let public_inputs = MembershipPublicInputs::new(record.committee_root, message, role);
    let result = public_inputs.validate().and_then(|_| {
        registry.membership_keys().verify_proof(
            ctx.proof_system,
            &MembershipShape,
            proof,
            &public_inputs.to_field_elements(),
        )
    });

    query_outcome("Membership", result)
}
