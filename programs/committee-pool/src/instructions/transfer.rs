//! Shielded Transfer Instruction
//!
//! Spends input notes and commits output notes inside the pool. The proof
//! attests, without revealing which notes are spent:
//! - every input note is in the commitment tree under `commitment_root`
//! - every nullifier is derived from its note and the pool nullifying key
//! - value is conserved per token between inputs and outputs
//! - `count` members of the owning account's committee signed the spend,
//!   under an account leaf in `registry_root`
//!
//! The checks in [`validate_spend`] are shared with withdrawals.

use anchor_lang::prelude::*;

use crate::crypto::field::is_valid_fr;
use crate::crypto::groth16_verifier::ProofSystem;
use crate::crypto::public_inputs::TransferPublicInputs;
use crate::error::PoolError;
use crate::events::{CommitmentEvent, LedgerEvent, NullifierEvent};
use crate::instructions::{require_valid_proof, LedgerContext};
use crate::state::{AccountRegistry, ShieldedPool, TransferShape};
use crate::types::{ExtData, PublicData, TransferType};

pub struct ShieldedTransfer<'a> {
    pub pool: &'a mut ShieldedPool,
    pub registry: &'a AccountRegistry,
}

/// Every check a transfer or withdrawal must pass, in order. Nothing is
/// mutated.
pub(crate) fn validate_spend(
    pool: &ShieldedPool,
    registry: &AccountRegistry,
    proof_system: &dyn ProofSystem,
    proof: &[u8],
    public_data: &PublicData,
    ext_data: &ExtData,
    transfer_type: TransferType,
) -> Result<()> {
    // =========================================================================
    // INPUT VALIDATION
    // =========================================================================

    let config = pool.config();
    if !config.targets(ext_data.chain_domain, ext_data.pool_index)
        || ext_data.transfer_type != transfer_type
    {
        msg!(
            "Ext data targets domain {} pool {} as {:?}, expected domain {} pool {} as {:?}",
            ext_data.chain_domain,
            ext_data.pool_index,
            ext_data.transfer_type,
            config.chain_domain,
            config.pool_index,
            transfer_type
        );
        return Err(error!(PoolError::InvalidExtData));
    }
    if transfer_type == TransferType::Withdrawal && !ext_data.token_data.is_valid() {
        msg!("Withdrawal token data is malformed");
        return Err(error!(PoolError::InvalidExtData));
    }

    require!(
        !public_data.in_nullifiers.is_empty() && public_data.count >= 1,
        PoolError::InvalidPublicData
    );
    if transfer_type == TransferType::Transfer
        && public_data.encrypted_notes.len() != public_data.out_commitments.len()
    {
        msg!(
            "{} output commitments but {} encrypted notes",
            public_data.out_commitments.len(),
            public_data.encrypted_notes.len()
        );
        return Err(error!(PoolError::InvalidPublicData));
    }
    let canonical = public_data
        .in_nullifiers
        .iter()
        .chain(public_data.out_commitments.iter())
        .all(is_valid_fr);
    require!(canonical, PoolError::InvalidPublicData);

    msg!(
        "{:?}: {} in, {} out, {} authorizers from committee slot {}",
        transfer_type,
        public_data.in_nullifiers.len(),
        public_data.out_commitments.len(),
        public_data.count,
        public_data.start_index
    );

    // =========================================================================
    // ROOT FRESHNESS
    // =========================================================================

    if !pool.is_recent_root(&public_data.commitment_root) {
        msg!(
            "Commitment root {} is not recent",
            hex::encode(public_data.commitment_root)
        );
        return Err(error!(PoolError::StaleRoot));
    }
    if !registry.is_recent_root(&public_data.registry_root) {
        msg!(
            "Registry root {} is not recent",
            hex::encode(public_data.registry_root)
        );
        return Err(error!(PoolError::StaleRoot));
    }

    // =========================================================================
    // DOUBLE-SPEND CHECK
    // =========================================================================

    pool.nullifiers().check_unspent(&public_data.in_nullifiers)?;

    // =========================================================================
    // PROOF VERIFICATION
    // =========================================================================

    let shape = TransferShape::new(
        public_data.in_nullifiers.len() as u32,
        public_data.out_commitments.len() as u32,
        public_data.count,
    );
    if !pool.transfer_keys().contains(&shape) {
        msg!("No transfer verifying key for shape {:?}", shape);
        return Err(error!(PoolError::UnsupportedShape));
    }

    let public_inputs = TransferPublicInputs {
        commitment_root: public_data.commitment_root,
        registry_root: public_data.registry_root,
        ext_data_hash: ext_data.hash()?,
        nullifiers: public_data.in_nullifiers.clone(),
        commitments: public_data.out_commitments.clone(),
    };
    let result = public_inputs.validate().and_then(|_| {
        pool.transfer_keys().verify_proof(
            proof_system,
            &shape,
            proof,
            &public_inputs.to_field_elements(),
        )
    });

    require_valid_proof("Transfer", result)
}

pub fn handler(
    ctx: LedgerContext<ShieldedTransfer>,
    proof: &[u8],
    public_data: PublicData,
    ext_data: ExtData,
) -> Result<Vec<LedgerEvent>> {
    let ShieldedTransfer { pool, registry } = ctx.accounts;

    validate_spend(
        pool,
        registry,
        ctx.proof_system,
        proof,
        &public_data,
        &ext_data,
        TransferType::Transfer,
    )?;
    pool.ensure_capacity(public_data.out_commitments.len() as u64)?;

    // =========================================================================
    // STATE CHANGES (only after proof verification succeeds)
    // =========================================================================

    pool.spend(&public_data.in_nullifiers, TransferType::Transfer)?;
    let indices = pool.insert_commitments(&public_data.out_commitments)?;

    let mut events: Vec<LedgerEvent> = public_data
        .in_nullifiers
        .iter()
        .map(|value| NullifierEvent { value: *value }.into())
        .collect();
    for ((commitment, encrypted_note), index) in public_data
        .out_commitments
        .iter()
        .zip(public_data.encrypted_notes)
        .zip(indices)
    {
        events.push(
            CommitmentEvent {
                index,
                commitment: *commitment,
                encrypted_note,
            }
            .into(),
        );
    }

    msg!(
        "Transfer spent {} nullifiers, pool root {}",
        public_data.in_nullifiers.len(),
        hex::encode(pool.root())
    );

    Ok(events)
}
