//! Manage Account Instruction
//!
//! Registers an account's committee, or replaces it.
//!
//! # Security Model
//!
//! 1. Every call carries `nonce == stored nonce + 1`, so a signed request
//!    can be applied once
//! 2. The account key either submits the call itself or signs the account
//!    digest for a relayer to submit
//! 3. An update must prove the account's current leaf, so the registry
//!    replaces it in place instead of appending a second leaf

use anchor_lang::prelude::*;

use crate::crypto::ed25519::verify_signature;
use crate::crypto::field::{is_valid_fr, is_zero};
use crate::crypto::poseidon::registry_leaf_hash;
use crate::error::PoolError;
use crate::events::{LedgerEvent, RegisterEvent, UpdateEvent};
use crate::instructions::LedgerContext;
use crate::state::AccountRegistry;
use crate::types::AccountData;

pub struct ManageAccount<'a> {
    /// Submitter of the call
    pub caller: Pubkey,
    pub registry: &'a mut AccountRegistry,
}

pub fn handler(
    ctx: LedgerContext<ManageAccount>,
    data: AccountData,
    signature: &[u8],
) -> Result<Vec<LedgerEvent>> {
    let ManageAccount { caller, registry } = ctx.accounts;

    // =========================================================================
    // INPUT VALIDATION
    // =========================================================================

    if data.quorum == 0 || is_zero(&data.committee_root) || !is_valid_fr(&data.committee_root) {
        msg!(
            "Account {} rejected: quorum {}, committee root {}",
            data.identifier,
            data.quorum,
            hex::encode(data.committee_root)
        );
        return Err(error!(PoolError::InvalidAccountData));
    }

    let stored_nonce = registry.nonce(&data.identifier);
    let expected_nonce = stored_nonce
        .checked_add(1)
        .ok_or(error!(PoolError::ArithmeticOverflow))?;
    if data.nonce != expected_nonce {
        msg!(
            "Account {} nonce {} replayed (expected {})",
            data.identifier,
            data.nonce,
            expected_nonce
        );
        return Err(error!(PoolError::ReplayedNonce));
    }

    // =========================================================================
    // AUTHORIZATION
    // =========================================================================

    if caller != data.identifier {
        let digest = registry.account_digest(&data);
        if !verify_signature(&data.identifier, &digest, signature) {
            msg!(
                "Caller {} holds no valid signature from {}",
                caller,
                data.identifier
            );
            return Err(error!(PoolError::InvalidSignature));
        }
    }

    // =========================================================================
    // STATE CHANGES
    // =========================================================================

    let new_leaf_hash = registry_leaf_hash(&data.committee_root, data.quorum)?;

    let event = match (registry.account(&data.identifier).copied(), &data.registry_proof) {
        (None, Some(_)) => {
            msg!("New account {} must not carry a registry proof", data.identifier);
            return Err(error!(PoolError::InvalidMerkleProof));
        }
        (Some(_), None) => {
            msg!("Account {} update requires a registry proof", data.identifier);
            return Err(error!(PoolError::InvalidMerkleProof));
        }
        (None, None) => {
            let record =
                registry.register(data.identifier, data.committee_root, data.quorum, data.nonce)?;

            msg!(
                "Account {} registered at index {}, quorum {} ({} accounts)",
                data.identifier,
                record.leaf_index,
                data.quorum,
                registry.account_count()
            );

            LedgerEvent::from(RegisterEvent {
                account_index: record.leaf_index,
                account_id: data.identifier,
                leaf_hash: new_leaf_hash,
            })
        }
        (Some(existing), Some(proof)) => {
            let old_leaf_hash = existing.leaf_hash()?;
            registry.update(
                &data.identifier,
                proof,
                data.committee_root,
                data.quorum,
                data.nonce,
            )?;

            msg!(
                "Account {} committee updated at index {}, quorum {} -> {}",
                data.identifier,
                existing.leaf_index,
                existing.quorum,
                data.quorum
            );

            LedgerEvent::from(UpdateEvent {
                account_index: existing.leaf_index,
                account_id: data.identifier,
                old_leaf_hash,
                new_leaf_hash,
            })
        }
    };

    Ok(vec![event])
}
